//! Resource registry
//!
//! Maps the names the frontend uses (`sample`, `data-collection`, ...) to an
//! engine index and everything the gateway does differently per resource.

use std::collections::BTreeMap;

use igsr_query::{FieldMap, RewriteRule, Rewriter};

use crate::error::{ConfigError, Result};

/// Free-text queries shorter than this match nothing.
const MIN_FREE_TEXT_LEN: usize = 2;

/// Engine index backing each resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexNames {
    pub sample: String,
    pub population: String,
    pub superpopulation: String,
    pub file: String,
    pub analysis_group: String,
    pub data_collections: String,
    pub sitemap: String,
}

impl Default for IndexNames {
    fn default() -> Self {
        Self {
            sample: "sample".to_string(),
            population: "population".to_string(),
            superpopulation: "superpopulation".to_string(),
            file: "file".to_string(),
            analysis_group: "analysis_group".to_string(),
            data_collections: "data_collections".to_string(),
            sitemap: "sitemap".to_string(),
        }
    }
}

/// Post-processing applied to hit sources before they are returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoration {
    /// Fill `shortTitle` (and an empty `title`) with the best human label:
    /// description, then title, shortTitle, code
    HumanLabel,
}

/// Everything the gateway knows about one resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSpec {
    /// Canonical external name
    pub name: String,
    /// Alternative external names
    pub aliases: Vec<String>,
    /// Engine index
    pub index: String,
    /// Rewrites applied to `_search` bodies
    pub search_rewrites: Rewriter,
    /// Rewrites applied to TSV export bodies
    pub export_rewrites: Rewriter,
    /// `_source` inserted when a search body has none
    pub default_source: Vec<String>,
    /// TSV columns when the body names no `_source`; `None` disables export
    pub export_columns: Option<Vec<String>>,
    /// Exact-match field tried when a detail lookup by `_id` misses
    pub lookup_field: Option<String>,
    /// Detail document fields removed when blank
    pub prune_fields: Vec<String>,
    pub decoration: Option<Decoration>,
}

impl ResourceSpec {
    /// Resource with no rewrites or extras
    pub fn new(name: impl Into<String>, index: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            index: index.into(),
            search_rewrites: Rewriter::identity(),
            export_rewrites: Rewriter::identity(),
            default_source: Vec::new(),
            export_columns: None,
            lookup_field: None,
            prune_fields: Vec::new(),
            decoration: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn with_search_rewrites(mut self, rules: Vec<RewriteRule>) -> Self {
        self.search_rewrites = Rewriter::new(rules);
        self
    }

    pub fn with_export(mut self, columns: &[&str], rules: Vec<RewriteRule>) -> Self {
        self.export_columns = Some(strings(columns));
        self.export_rewrites = Rewriter::new(rules);
        self
    }

    pub fn with_default_source(mut self, fields: &[&str]) -> Self {
        self.default_source = strings(fields);
        self
    }

    pub fn with_lookup(mut self, lookup_field: &str, prune_fields: &[&str]) -> Self {
        self.lookup_field = Some(lookup_field.to_string());
        self.prune_fields = strings(prune_fields);
        self
    }

    pub fn with_decoration(mut self, decoration: Decoration) -> Self {
        self.decoration = Some(decoration);
        self
    }

    pub fn is_exportable(&self) -> bool {
        self.export_columns.is_some()
    }
}

/// Immutable lookup from external resource names to [`ResourceSpec`]s
#[derive(Debug, Clone)]
pub struct ResourceRegistry {
    resources: Vec<ResourceSpec>,
    names: BTreeMap<String, usize>,
}

impl ResourceRegistry {
    /// Build from specs; every name and alias must be unique.
    pub fn new(resources: Vec<ResourceSpec>) -> Result<Self> {
        let mut names = BTreeMap::new();
        for (position, resource) in resources.iter().enumerate() {
            for name in std::iter::once(&resource.name).chain(&resource.aliases) {
                if names.insert(name.clone(), position).is_some() {
                    return Err(ConfigError::DuplicateResource(name.clone()));
                }
            }
        }
        Ok(Self { resources, names })
    }

    /// The IGSR resources with their production rewrites
    pub fn builtin(indices: &IndexNames) -> Result<Self> {
        Self::new(builtin_resources(indices))
    }

    /// Look up a resource by canonical name or alias
    pub fn resolve(&self, name: &str) -> Option<&ResourceSpec> {
        self.names
            .get(name)
            .and_then(|&position| self.resources.get(position))
    }

    pub fn resources(&self) -> &[ResourceSpec] {
        &self.resources
    }

    /// Every accepted name, aliases included, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

fn gate() -> RewriteRule {
    RewriteRule::GateShortText {
        min_len: MIN_FREE_TEXT_LEN,
    }
}

fn keyword(fields: FieldMap) -> RewriteRule {
    RewriteRule::KeywordFields { fields }
}

fn sample_fields() -> FieldMap {
    FieldMap::from_pairs([
        ("dataCollections.title", "dataCollections.title.keyword"),
        ("dataCollections.title.std", "dataCollections.title.keyword"),
        ("populations.elasticId", "populations.elasticId.keyword"),
        ("populations.code", "populations.code.keyword"),
        ("populations.name", "populations.name.keyword"),
        (
            "populations.superpopulationCode",
            "populations.superpopulationCode.keyword",
        ),
        (
            "populations.superpopulationName",
            "populations.superpopulationName.keyword",
        ),
    ])
}

fn population_fields() -> FieldMap {
    FieldMap::from_pairs([
        ("dataCollections.title", "dataCollections.title.keyword"),
        ("dataCollections.title.std", "dataCollections.title.keyword"),
    ])
}

fn file_fields() -> FieldMap {
    FieldMap::from_pairs([
        ("dataCollections", "dataCollections.keyword"),
        ("dataCollections.title", "dataCollections.keyword"),
        ("dataCollections.title.std", "dataCollections.keyword"),
        ("analysisGroup", "analysisGroup.keyword"),
        ("dataType", "dataType.keyword"),
        ("samples", "samples.keyword"),
        ("populations", "populations.keyword"),
        ("url", "url.keyword"),
        ("url.keywords", "url.keyword"),
    ])
}

fn data_collection_fields() -> FieldMap {
    FieldMap::from_pairs([
        ("title", "title.keyword"),
        ("title.std", "title.keyword"),
        ("shortTitle", "shortTitle.keyword"),
        ("shortTitle.std", "shortTitle.keyword"),
    ])
}

fn builtin_resources(indices: &IndexNames) -> Vec<ResourceSpec> {
    vec![
        ResourceSpec::new("sample", &indices.sample)
            .with_search_rewrites(vec![
                gate(),
                keyword(sample_fields()),
                RewriteRule::MatchFallback,
            ])
            .with_export(&["_id", "name", "sex"], vec![keyword(sample_fields())])
            .with_lookup("name.keyword", &["sharedSamples"]),
        ResourceSpec::new("population", &indices.population)
            .with_search_rewrites(vec![
                gate(),
                keyword(population_fields()),
                RewriteRule::MatchFallback,
            ])
            .with_export(
                &[
                    "elasticId",
                    "name",
                    "superpopulation.name",
                    "latitude",
                    "longitude",
                ],
                vec![keyword(population_fields())],
            )
            .with_lookup("elasticId.keyword", &["overlappingPopulations"]),
        ResourceSpec::new("superpopulation", &indices.superpopulation),
        ResourceSpec::new("file", &indices.file)
            .with_search_rewrites(vec![
                gate(),
                keyword(file_fields()),
                RewriteRule::MatchFallback,
            ])
            .with_default_source(&[
                "url",
                "md5",
                "dataType",
                "analysisGroup",
                "dataCollections",
                "samples",
            ])
            .with_export(
                &[
                    "url",
                    "md5",
                    "dataType",
                    "analysisGroup",
                    "dataCollections",
                    "samples",
                    "populations",
                ],
                vec![keyword(file_fields()), RewriteRule::MatchFallback],
            ),
        ResourceSpec::new("analysis_group", &indices.analysis_group)
            .with_alias("analysis-group")
            .with_decoration(Decoration::HumanLabel),
        ResourceSpec::new("data_collections", &indices.data_collections)
            .with_alias("data-collection")
            .with_search_rewrites(vec![
                gate(),
                RewriteRule::MatchFallback,
                keyword(data_collection_fields()),
            ]),
        ResourceSpec::new("sitemap", &indices.sitemap)
            .with_search_rewrites(vec![gate(), RewriteRule::MatchFallback]),
    ]
}
