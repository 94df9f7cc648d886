//! Runtime configuration

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ServiceGraphError};
use crate::types::MetricField;

/// Label carrying the request rate
pub const REQS_LABEL: &str = "reqs/sec";

/// Label carrying the error rate
pub const ERRS_LABEL: &str = "errs/sec";

/// Tunables shared by the aggregator, the serializers and the stream publisher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceGraphConfig {
    /// Multiplier applied to every raw metric value before aggregation
    pub scale_factor: f64,
    /// Recognized label keys and the metric field each one feeds
    pub metric_fields: BTreeMap<String, MetricField>,
    /// Node treated as the traffic entry point
    pub ingress_node: String,
    /// Name of the regional node in the nested schema
    pub region_name: String,
    /// Name of the synthetic external node in the nested schema
    pub external_node: String,
    pub max_volume: f64,
    #[serde(with = "millis")]
    pub publish_interval: Duration,
    /// Default query window, Prometheus duration syntax
    pub time_horizon: String,
    /// Frame body for the heartbeat stream format
    pub heartbeat_payload: String,
}

impl Default for ServiceGraphConfig {
    fn default() -> Self {
        Self {
            scale_factor: 100.0,
            metric_fields: default_metric_fields(),
            ingress_node: "istio-ingress.istio-system (unknown)".to_string(),
            region_name: "k8s-ist-1".to_string(),
            external_node: "INTERNET".to_string(),
            max_volume: 1000.0,
            publish_interval: Duration::from_secs(1),
            time_horizon: "5m".to_string(),
            heartbeat_payload: "NGK2..".to_string(),
        }
    }
}

impl ServiceGraphConfig {
    /// Load from a JSON file; missing keys keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.publish_interval.is_zero() {
            return Err(ServiceGraphError::InvalidConfig(
                "publish_interval must be positive".to_string(),
            ));
        }
        if !self.scale_factor.is_finite() {
            return Err(ServiceGraphError::InvalidConfig(format!(
                "scale_factor must be finite, got {}",
                self.scale_factor
            )));
        }
        Ok(())
    }
}

fn default_metric_fields() -> BTreeMap<String, MetricField> {
    BTreeMap::from([
        (REQS_LABEL.to_string(), MetricField::Normal),
        (ERRS_LABEL.to_string(), MetricField::Danger),
    ])
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
