//! Combined metric record for one visual connection

use serde::{Deserialize, Serialize};

/// Which numeric field of [`Metrics`] a label feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricField {
    Normal,
    Danger,
}

/// Normal (request) and danger (error) rates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub normal: f64,
    pub danger: f64,
}

impl Metrics {
    pub fn new(normal: f64, danger: f64) -> Self {
        Self { normal, danger }
    }

    pub fn get(&self, field: MetricField) -> f64 {
        match field {
            MetricField::Normal => self.normal,
            MetricField::Danger => self.danger,
        }
    }

    pub fn set(&mut self, field: MetricField, value: f64) {
        match field {
            MetricField::Normal => self.normal = value,
            MetricField::Danger => self.danger = value,
        }
    }

    /// Field-wise maximum; commutative, associative and idempotent
    pub fn merge_max(&mut self, other: &Metrics) {
        self.normal = self.normal.max(other.normal);
        self.danger = self.danger.max(other.danger);
    }

    pub fn is_zero(&self) -> bool {
        self.normal == 0.0 && self.danger == 0.0
    }
}
