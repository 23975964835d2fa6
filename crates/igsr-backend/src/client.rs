//! Elasticsearch client implementation

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::{
    config::{BackendAuth, BackendConfig},
    error::{BackendError, Result},
    middleware::{RetryPolicy, RetryingBackend},
};

/// Mockable search engine trait
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Run a search body against an index and return the raw engine response
    async fn search(&self, index: &str, body: &Value) -> Result<Value>;

    /// Fetch a document by id; `None` when the engine reports it missing
    async fn get_document(&self, index: &str, id: &str) -> Result<Option<Value>>;

    /// Cheap liveness check
    async fn ping(&self) -> bool;
}

/// Production Elasticsearch client over a pooled reqwest client
pub struct ElasticClient {
    inner: reqwest::Client,
    base_url: Url,
    config: BackendConfig,
}

impl ElasticClient {
    /// Create a new client with configuration
    pub fn new(config: BackendConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| BackendError::Config(format!("base url {}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(BackendError::Config(format!(
                "base url {} cannot carry a path",
                config.base_url
            )));
        }

        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .build()
            .map_err(|e| BackendError::Config(e.to_string()))?;

        Ok(Self {
            inner,
            base_url,
            config,
        })
    }

    /// Get configuration
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Append percent-encoded path segments to the base URL
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::Config("base url cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.auth {
            Some(BackendAuth::ApiKey { key }) => {
                request.header(AUTHORIZATION, format!("ApiKey {key}"))
            }
            Some(BackendAuth::Basic { username, password }) => {
                request.basic_auth(username, Some(password))
            }
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        self.authorize(request)
            .send()
            .await
            .map_err(|e| BackendError::from_transport(e, self.config.timeout))
    }

    async fn read_json(&self, response: Response) -> Result<Value> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(BackendError::from_status(status, body));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| BackendError::from_transport(e, self.config.timeout))?;
        serde_json::from_slice(&bytes).map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl SearchBackend for ElasticClient {
    async fn search(&self, index: &str, body: &Value) -> Result<Value> {
        let mut url = self.endpoint(&[index, "_search"])?;
        url.query_pairs_mut().append_pair("ignore_unavailable", "true");
        debug!(index, "engine search");

        let response = self.send(self.inner.post(url).json(body)).await?;
        self.read_json(response).await
    }

    async fn get_document(&self, index: &str, id: &str) -> Result<Option<Value>> {
        let url = self.endpoint(&[index, "_doc", id])?;
        debug!(index, id, "engine document get");

        let response = self.send(self.inner.get(url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let document = self.read_json(response).await?;
        let found = document
            .get("found")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        Ok(found.then_some(document))
    }

    async fn ping(&self) -> bool {
        let url = match self.endpoint(&[]) {
            Ok(url) => url,
            Err(_) => return false,
        };

        match self.send(self.inner.head(url)).await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!(error = %e, "engine ping failed");
                false
            }
        }
    }
}

/// Build the production backend: pooled client behind the retry wrapper
pub fn shared_backend(config: BackendConfig) -> Result<Arc<dyn SearchBackend>> {
    let policy = if config.retry_enabled {
        RetryPolicy::new(1, config.retry_backoff)
    } else {
        RetryPolicy::disabled()
    };
    let client = ElasticClient::new(config)?;
    Ok(Arc::new(RetryingBackend::new(client, policy)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendErrorKind;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::{
        matchers::{header, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    fn client_for(server: &MockServer) -> ElasticClient {
        ElasticClient::new(BackendConfig::new().with_base_url(server.uri())).unwrap()
    }

    #[test]
    fn test_client_creation_with_defaults() {
        assert!(ElasticClient::new(BackendConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_base_url() {
        let result = ElasticClient::new(BackendConfig::new().with_base_url("not a url"));
        assert!(matches!(result, Err(BackendError::Config(_))));
    }

    #[test]
    fn test_endpoint_keeps_base_path_and_encodes_ids() {
        let client =
            ElasticClient::new(BackendConfig::new().with_base_url("http://es.local:9200/es/"))
                .unwrap();
        let url = client.endpoint(&["sample", "_doc", "HG 00096/x"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://es.local:9200/es/sample/_doc/HG%2000096%2Fx"
        );
    }

    #[tokio::test]
    async fn test_search_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sample/_search"))
            .and(query_param("ignore_unavailable", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "took": 3,
                "hits": {"total": {"value": 1, "relation": "eq"}, "hits": []}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client_for(&server)
            .search("sample", &json!({"query": {"match_all": {}}}))
            .await
            .unwrap();
        assert_eq!(response["hits"]["total"]["value"], 1);
    }

    #[tokio::test]
    async fn test_search_rejected_keeps_engine_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({"error": {"type": "parsing_exception"}})),
            )
            .mount(&server)
            .await;

        let error = client_for(&server)
            .search("sample", &json!({}))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), BackendErrorKind::BadRequestRejectedByEngine);
        assert!(error.engine_body().unwrap().contains("parsing_exception"));
    }

    #[tokio::test]
    async fn test_search_engine_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let error = client_for(&server)
            .search("sample", &json!({}))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), BackendErrorKind::InternalEngineError);
    }

    #[tokio::test]
    async fn test_search_missing_index() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let error = client_for(&server)
            .search("nope", &json!({}))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), BackendErrorKind::ResourceNotFound);
    }

    #[tokio::test]
    async fn test_search_non_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
            .mount(&server)
            .await;

        let error = client_for(&server)
            .search("sample", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(error, BackendError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_search_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = ElasticClient::new(
            BackendConfig::new()
                .with_base_url(server.uri())
                .with_timeout(Duration::from_millis(100)),
        )
        .unwrap();

        let error = client.search("sample", &json!({})).await.unwrap_err();
        assert_eq!(error.kind(), BackendErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_search_unreachable() {
        let client =
            ElasticClient::new(BackendConfig::new().with_base_url("http://127.0.0.1:1")).unwrap();
        let error = client.search("sample", &json!({})).await.unwrap_err();
        assert_eq!(error.kind(), BackendErrorKind::Unreachable);
    }

    #[tokio::test]
    async fn test_api_key_header_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "ApiKey s3cret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hits": {"hits": []}})))
            .expect(1)
            .mount(&server)
            .await;

        let client = ElasticClient::new(
            BackendConfig::new()
                .with_base_url(server.uri())
                .with_auth(BackendAuth::ApiKey {
                    key: "s3cret".to_string(),
                }),
        )
        .unwrap();
        assert!(client.search("sample", &json!({})).await.is_ok());
    }

    #[tokio::test]
    async fn test_get_document_found_and_missing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sample/_doc/HG00096"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_index": "sample", "_id": "HG00096", "found": true,
                "_source": {"name": "HG00096"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sample/_doc/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "_index": "sample", "_id": "missing", "found": false
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let document = client.get_document("sample", "HG00096").await.unwrap();
        assert_eq!(document.unwrap()["_source"]["name"], "HG00096");
        assert!(client.get_document("sample", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ping() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        assert!(client_for(&server).ping().await);

        let down =
            ElasticClient::new(BackendConfig::new().with_base_url("http://127.0.0.1:1")).unwrap();
        assert!(!down.ping().await);
    }

    #[test]
    fn test_shared_backend_creation() {
        assert!(shared_backend(BackendConfig::default()).is_ok());
    }
}
