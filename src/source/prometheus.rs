//! Prometheus-backed graph source

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{GraphSource, QueryWindow};
use crate::config::{ERRS_LABEL, REQS_LABEL};
use crate::error::{Result, ServiceGraphError};
use crate::types::{DynamicGraph, Edge};

const REQUEST_METRIC: &str = "istio_request_count";
const GROUP_BY: &str = "source_service, destination_service, source_version, destination_version";
const UNKNOWN: &str = "unknown";

#[derive(Debug, Deserialize)]
struct QueryResponse {
    status: String,
    #[serde(default)]
    data: Option<QueryData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    #[serde(rename = "resultType")]
    result_type: String,
    #[serde(default)]
    result: Vec<Sample>,
}

/// One instant-vector sample: labels plus `[timestamp, "value"]`
#[derive(Debug, Clone, Deserialize)]
struct Sample {
    #[serde(default)]
    metric: HashMap<String, String>,
    value: (f64, String),
}

impl Sample {
    fn node(&self, service: &str, version: &str) -> String {
        let label = |key: &str| {
            self.metric
                .get(key)
                .filter(|v| !v.is_empty())
                .map(String::as_str)
                .unwrap_or(UNKNOWN)
        };
        format!("{} ({})", label(service), label(version))
    }

    fn source(&self) -> String {
        self.node("source_service", "source_version")
    }

    fn target(&self) -> String {
        self.node("destination_service", "destination_version")
    }
}

/// Queries request and error rates from a Prometheus server
#[derive(Debug, Clone)]
pub struct PrometheusSource {
    addr: String,
    client: Client,
}

impl PrometheusSource {
    pub fn new(addr: impl Into<String>) -> Result<Self> {
        Self::with_timeout(addr, Duration::from_secs(10))
    }

    pub fn with_timeout(addr: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            addr: addr.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    #[instrument(skip(self), fields(addr = %self.addr))]
    async fn run_query(&self, query: &str) -> Result<Vec<Sample>> {
        let url = format!("{}/api/v1/query", self.addr);
        let response = self
            .client
            .get(&url)
            .query(&[("query", query)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ServiceGraphError::BackendStatus {
                status: status.as_u16(),
                body,
            });
        }
        parse_response(&body)
    }
}

/// Request-rate query, optionally restricted to failed requests
fn rate_query(window: &QueryWindow, errors_only: bool) -> String {
    let selector = if errors_only {
        r#"{response_code!="200"}"#
    } else {
        ""
    };
    let mut query = format!(
        "sum(rate({}{}[{}])) by ({})",
        REQUEST_METRIC, selector, window.time_horizon, GROUP_BY
    );
    if window.filter_empty {
        query.push_str(" > 0");
    }
    query
}

fn parse_response(body: &str) -> Result<Vec<Sample>> {
    let response: QueryResponse = serde_json::from_str(body)
        .map_err(|e| ServiceGraphError::Backend(format!("malformed response: {}", e)))?;

    if response.status != "success" {
        return Err(ServiceGraphError::Backend(
            response
                .error
                .unwrap_or_else(|| format!("query status '{}'", response.status)),
        ));
    }

    match response.data {
        None => Ok(Vec::new()),
        Some(data) if data.result_type == "vector" => Ok(data.result),
        Some(data) => Err(ServiceGraphError::Backend(format!(
            "unexpected result type '{}'",
            data.result_type
        ))),
    }
}

/// Fold request and error samples into one graph.
///
/// Error rates land on the request edge for the same pair when there is
/// one, otherwise on an edge of their own.
fn build_graph(requests: Vec<Sample>, errors: Vec<Sample>) -> DynamicGraph {
    let mut builder = DynamicGraph::builder();
    for sample in &requests {
        builder.add_edge(
            Edge::new(sample.source(), sample.target()).with_label(REQS_LABEL, sample.value.1.as_str()),
        );
    }
    for sample in &errors {
        let (source, target) = (sample.source(), sample.target());
        match builder.edge_labels_mut(&source, &target) {
            Some(labels) => {
                labels.insert(ERRS_LABEL.to_string(), sample.value.1.clone());
            }
            None => {
                builder.add_edge(
                    Edge::new(source, target).with_label(ERRS_LABEL, sample.value.1.as_str()),
                );
            }
        }
    }
    builder.build()
}

#[async_trait]
impl GraphSource for PrometheusSource {
    async fn query(&self, window: &QueryWindow) -> Result<DynamicGraph> {
        let requests = self.run_query(&rate_query(window, false)).await?;
        let errors = self.run_query(&rate_query(window, true)).await?;
        debug!(
            requests = requests.len(),
            errors = errors.len(),
            "prometheus query complete"
        );
        Ok(build_graph(requests, errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VECTOR_BODY: &str = r#"{
        "status": "success",
        "data": {
            "resultType": "vector",
            "result": [
                {"metric": {"source_service": "productpage.default", "source_version": "v1",
                            "destination_service": "reviews.default", "destination_version": "v2"},
                 "value": [1500000000.123, "12.4"]},
                {"metric": {"destination_service": "productpage.default", "destination_version": "v1"},
                 "value": [1500000000.123, "3"]}
            ]
        }
    }"#;

    #[test]
    fn test_rate_query() {
        let window = QueryWindow::new("5m");
        assert_eq!(
            rate_query(&window, false),
            "sum(rate(istio_request_count[5m])) by (source_service, destination_service, source_version, destination_version)"
        );
        let filtered = rate_query(&window.filter_empty(true), true);
        assert!(filtered.contains(r#"istio_request_count{response_code!="200"}[5m]"#));
        assert!(filtered.ends_with(" > 0"));
    }

    #[test]
    fn test_parse_vector_response() {
        let samples = parse_response(VECTOR_BODY).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].source(), "productpage.default (v1)");
        assert_eq!(samples[0].target(), "reviews.default (v2)");
        assert_eq!(samples[1].source(), "unknown (unknown)");
        assert_eq!(samples[0].value.1, "12.4");
    }

    #[test]
    fn test_error_status_is_backend_error() {
        let body = r#"{"status": "error", "errorType": "bad_data", "error": "parse error"}"#;
        match parse_response(body) {
            Err(ServiceGraphError::Backend(msg)) => assert_eq!(msg, "parse error"),
            other => panic!("expected backend error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_body_is_backend_error() {
        assert!(parse_response("<html>").unwrap_err().is_backend());
    }

    #[test]
    fn test_empty_result_is_empty_graph() {
        let body = r#"{"status": "success", "data": {"resultType": "vector", "result": []}}"#;
        let graph = build_graph(parse_response(body).unwrap(), Vec::new());
        assert!(graph.is_empty());
    }

    #[test]
    fn test_errors_fold_into_request_edges() {
        let requests = parse_response(VECTOR_BODY).unwrap();
        let errors = vec![
            requests[0].clone(),
            Sample {
                metric: HashMap::from([
                    ("source_service".to_string(), "a".to_string()),
                    ("destination_service".to_string(), "b".to_string()),
                ]),
                value: (0.0, "1".to_string()),
            },
        ];
        let graph = build_graph(requests, errors);

        assert_eq!(graph.edge_count(), 3);
        let first = &graph.edges()[0];
        assert_eq!(first.labels.get(REQS_LABEL).unwrap(), "12.4");
        assert_eq!(first.labels.get(ERRS_LABEL).unwrap(), "12.4");
        assert!(graph.contains_node("a (unknown)"));
        assert!(graph.validate().is_ok());
    }
}
