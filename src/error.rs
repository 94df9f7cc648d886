//! Error types for graph rendering and streaming

use thiserror::Error;

/// Errors produced while building, rendering or streaming a service graph
#[derive(Error, Debug)]
pub enum ServiceGraphError {
    /// An edge references a node that is not part of the graph's node set
    #[error("invalid graph: node '{node}' is referenced by an edge but not present in the node set")]
    InvalidGraph { node: String },

    #[error("node name must not be empty")]
    EmptyNodeName,

    /// The graph source could not produce a graph
    #[error("backend query failed: {0}")]
    Backend(String),

    #[error("backend returned status {status}: {body}")]
    BackendStatus { status: u16, body: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Read or write failure on a streaming connection
    #[error("transport error: {0}")]
    Transport(String),
}

impl ServiceGraphError {
    pub fn invalid_graph(node: impl Into<String>) -> Self {
        Self::InvalidGraph { node: node.into() }
    }

    /// True for failures that originate in the graph source
    pub fn is_backend(&self) -> bool {
        matches!(self, Self::Backend(_) | Self::BackendStatus { .. })
    }
}

impl From<reqwest::Error> for ServiceGraphError {
    fn from(err: reqwest::Error) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, ServiceGraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_graph_names_node() {
        let err = ServiceGraphError::invalid_graph("C");
        assert!(err.to_string().contains("'C'"));
        assert!(!err.is_backend());
    }

    #[test]
    fn test_backend_classification() {
        assert!(ServiceGraphError::Backend("down".into()).is_backend());
        assert!(ServiceGraphError::BackendStatus {
            status: 503,
            body: String::new()
        }
        .is_backend());
    }

    #[test]
    fn test_invalid_config_message() {
        let err = ServiceGraphError::InvalidConfig("publish_interval must be positive".into());
        assert_eq!(
            err.to_string(),
            "invalid configuration: publish_interval must be positive"
        );
        assert!(!err.is_backend());
    }
}
