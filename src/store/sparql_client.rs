use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::{GraphStore, Row};
use crate::config::SparqlConfig;
use crate::error::{HierarchyError, Result};

const RESULTS_JSON: &str = "application/sparql-results+json";

/// SPARQL 1.1 query results, JSON serialization
#[derive(Deserialize)]
struct SparqlResults {
    #[serde(default)]
    head: SparqlHead,
    results: SparqlBindings,
}

#[derive(Deserialize, Default)]
struct SparqlHead {
    #[serde(default)]
    vars: Vec<String>,
}

#[derive(Deserialize)]
struct SparqlBindings {
    bindings: Vec<HashMap<String, SparqlValue>>,
}

/// A single bound value; only the lexical form is kept
#[derive(Deserialize)]
struct SparqlValue {
    value: String,
}

/// SPARQL protocol client
///
/// Sends queries as form-encoded POST requests and reads the JSON results
/// format. No retries; a request timeout is applied only when configured.
pub struct SparqlClient {
    client: Client,
    endpoint: String,
}

impl SparqlClient {
    /// Create a new client for `config.endpoint`
    pub fn new(config: &SparqlConfig) -> Result<Self> {
        url::Url::parse(&config.endpoint).map_err(|e| {
            HierarchyError::Config(format!("Invalid SPARQL endpoint {}: {}", config.endpoint, e))
        })?;

        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl GraphStore for SparqlClient {
    async fn query(&self, query: &str) -> Result<Vec<Row>> {
        let start = Instant::now();
        log::debug!("SPARQL query:\n{}", query);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Accept", RESULTS_JSON)
            .form(&[("query", query)])
            .send()
            .await
            .map_err(|e| HierarchyError::Store(format!("Network error: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            return Err(HierarchyError::Store(format!(
                "SPARQL endpoint error {}: {}",
                status, body
            )));
        }

        let body = response.text().await?;
        let rows = parse_results(&body)?;
        log::debug!("SPARQL query returned {} rows in {:?}", rows.len(), start.elapsed());
        Ok(rows)
    }
}

/// Turn a SPARQL JSON results document into rows.
///
/// Bindings are emitted in the order of `head.vars`; variables unbound in a
/// solution are simply absent from its row.
fn parse_results(body: &str) -> Result<Vec<Row>> {
    let results: SparqlResults = serde_json::from_str(body)
        .map_err(|e| HierarchyError::Parse(format!("Failed to parse SPARQL results: {}", e)))?;

    let vars = results.head.vars;
    let rows = results
        .results
        .bindings
        .into_iter()
        .map(|mut solution| {
            let mut row = Row::new();
            for var in &vars {
                if let Some(value) = solution.remove(var) {
                    row.bind(var.clone(), value.value);
                }
            }
            // bindings for variables missing from head, in name order
            let mut rest: Vec<_> = solution.into_iter().collect();
            rest.sort_by(|a, b| a.0.cmp(&b.0));
            for (var, value) in rest {
                row.bind(var, value.value);
            }
            row
        })
        .collect();

    Ok(rows)
}
