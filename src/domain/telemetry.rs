// Raw zone telemetry as delivered by the remote source
use crate::error::TransformError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Zone name carrying run-duration metadata. Never plotted.
pub const RESERVED_ZONE: &str = "SÜRE";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub time_ms: i64,
    pub value: f64,
}

impl TimeSeriesPoint {
    pub fn new(time_ms: i64, value: f64) -> Self {
        Self { time_ms, value }
    }
}

/// One zone's samples, validated at the boundary. Samples are kept in delivery order.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub name: String,
    pub samples: Vec<TimeSeriesPoint>,
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    values: Option<Vec<Value>>,
}

impl RawRecord {
    pub fn new(name: impl Into<String>, samples: Vec<TimeSeriesPoint>) -> Self {
        Self {
            name: name.into(),
            samples,
        }
    }

    /// Decode one document of the shape `{name, values: [{time, value}]}`.
    /// Individual samples without a usable time or finite value are dropped.
    pub fn decode(document: Value) -> Result<Self, TransformError> {
        if !document.is_object() {
            return Err(TransformError::NotAnObject);
        }
        let doc: RawDocument =
            serde_json::from_value(document).map_err(|_| TransformError::NotAnObject)?;

        let name = doc
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or(TransformError::MissingName)?;
        let values = doc
            .values
            .ok_or_else(|| TransformError::MissingValues(name.clone()))?;

        let total = values.len();
        let samples: Vec<TimeSeriesPoint> = values.iter().filter_map(decode_sample).collect();
        if samples.len() < total {
            tracing::debug!(
                "Dropped {} malformed samples from zone {}",
                total - samples.len(),
                name
            );
        }

        Ok(Self { name, samples })
    }

    pub fn sort_by_time(&mut self) {
        self.samples.sort_by_key(|s| s.time_ms);
    }
}

fn decode_sample(sample: &Value) -> Option<TimeSeriesPoint> {
    let time_ms = match sample.get("time")? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?,
        Value::String(s) => chrono::DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| t.timestamp_millis())?,
        _ => return None,
    };
    let value = match sample.get("value")? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok()?,
        _ => return None,
    };
    value.is_finite().then(|| TimeSeriesPoint::new(time_ms, value))
}

/// Decode a list of documents, skipping the ones that fail validation.
pub fn decode_documents(documents: Vec<Value>) -> Vec<RawRecord> {
    documents
        .into_iter()
        .enumerate()
        .filter_map(|(idx, doc)| match RawRecord::decode(doc) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Skipping raw record #{}: {}", idx, e);
                None
            }
        })
        .collect()
}
