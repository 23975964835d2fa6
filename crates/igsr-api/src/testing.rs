//! In-memory backend for router and pipeline tests

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

use async_trait::async_trait;
use igsr_backend::{BackendError, Result, SearchBackend};
use serde_json::{json, Value};

pub(crate) struct StubBackend {
    hits: Vec<Value>,
    document: Option<Value>,
    failure: Option<fn() -> BackendError>,
    healthy: bool,
    calls: AtomicUsize,
    searches: Mutex<Vec<(String, Value)>>,
}

impl StubBackend {
    pub(crate) fn with_hits(hits: Vec<Value>) -> Self {
        Self {
            hits,
            document: None,
            failure: None,
            healthy: true,
            calls: AtomicUsize::new(0),
            searches: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_document(mut self, document: Value) -> Self {
        self.document = Some(document);
        self
    }

    pub(crate) fn failing(failure: fn() -> BackendError) -> Self {
        Self {
            failure: Some(failure),
            ..Self::with_hits(vec![])
        }
    }

    pub(crate) fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    /// Searches plus document fetches
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_search(&self) -> Option<(String, Value)> {
        self.searches.lock().unwrap().last().cloned()
    }

    fn check(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failure {
            Some(failure) => Err(failure()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SearchBackend for StubBackend {
    async fn search(&self, index: &str, body: &Value) -> Result<Value> {
        self.searches
            .lock()
            .unwrap()
            .push((index.to_string(), body.clone()));
        self.check()?;
        Ok(json!({
            "took": 1,
            "timed_out": false,
            "_shards": {"total": 1, "successful": 1, "failed": 0},
            "hits": {
                "total": {"value": self.hits.len(), "relation": "eq"},
                "max_score": 1.0,
                "hits": self.hits
            }
        }))
    }

    async fn get_document(&self, _index: &str, _id: &str) -> Result<Option<Value>> {
        self.check()?;
        Ok(self.document.clone())
    }

    async fn ping(&self) -> bool {
        self.healthy
    }
}
