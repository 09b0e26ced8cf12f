//! Answer lookup against a remote SPARQL endpoint.
//!
//! Results are stored verbatim on each entry as
//! `{"query_result": ..., "is_error": bool, "error": ...}`. A failed lookup
//! is recorded on the entry and never stops the batch.

use crate::config::EndpointConfig;
use crate::dataset::entry::Entry;
use crate::parsing::query_normalizer::QueryNormalizer;
use crate::sources::{BatchReport, EntryFailure};
use crate::{Error, Result};
use log::{debug, error};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

/// Runs an escaped pure SPARQL query somewhere and returns its raw result.
#[allow(async_fn_in_trait)]
pub trait AnswerLookup {
    async fn lookup(&self, query: &str) -> Result<Value>;
}

/// HTTP SPARQL endpoint, queried with GET and JSON results.
pub struct SparqlEndpoint {
    config: EndpointConfig,
    client: Client,
}

impl SparqlEndpoint {
    pub fn new(config: EndpointConfig) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }
}

impl AnswerLookup for SparqlEndpoint {
    async fn lookup(&self, query: &str) -> Result<Value> {
        debug!("Querying {} with {}", self.config.url, query);
        let mut params = vec![("query", query)];
        if !self.config.default_graph.is_empty() {
            params.push(("default-graph-uri", self.config.default_graph.as_str()));
        }

        let response = self
            .client
            .get(&self.config.url)
            .query(&params)
            .header("Accept", SPARQL_RESULTS_JSON)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<Value>().await?)
    }
}

fn success(result: Value) -> Value {
    json!({ "query_result": result, "is_error": false })
}

fn failure(message: &str) -> Value {
    json!({ "query_result": Value::Null, "is_error": true, "error": message })
}

/// Looks up the answer of every entry's pure query. Entries that already
/// hold a result are skipped unless `force` is set.
pub async fn fetch_answers<L: AnswerLookup>(
    lookup: &L,
    normalizer: &QueryNormalizer,
    entries: &mut [Entry],
    force: bool,
) -> BatchReport {
    let mut report = BatchReport::default();

    for entry in entries.iter_mut() {
        if entry.answer.is_some() && !force {
            continue;
        }

        let outcome = match entry.query.pure_sparql.as_deref() {
            None => Err(Error::MissingField("query.pure_sparql".to_string())),
            Some(pure) => match normalizer.escape_for_remote_query(pure) {
                Ok(escaped) => lookup.lookup(&escaped).await,
                Err(e) => Err(e),
            },
        };

        match outcome {
            Ok(result) => {
                entry.answer = Some(success(result));
                report.record_success();
            }
            Err(e) => {
                error!("Answer lookup failed for entry {}: {}", entry.id, e);
                entry.answer = Some(failure(&e.to_string()));
                report.failures.push(EntryFailure { entry_id: entry.id.clone(), error: e.to_string() });
            }
        }
    }

    report
}

/// Whether two stored lookups hold the same successful result.
pub fn answers_match(a: &Value, b: &Value) -> bool {
    let is_error = |v: &Value| v.get("is_error").and_then(Value::as_bool).unwrap_or(true);
    if is_error(a) || is_error(b) {
        return false;
    }
    a.get("query_result") == b.get("query_result")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answers_match() {
        let a = success(json!({"boolean": true}));
        let b = success(json!({"boolean": true}));
        let c = success(json!({"boolean": false}));
        assert!(answers_match(&a, &b));
        assert!(!answers_match(&a, &c));
        assert!(!answers_match(&failure("timeout"), &failure("timeout")));
    }

    #[test]
    fn test_endpoint_from_config() {
        let endpoint = SparqlEndpoint::new(EndpointConfig::default()).unwrap();
        assert_eq!(endpoint.config().url, "http://dbpedia.org/sparql");
    }
}
