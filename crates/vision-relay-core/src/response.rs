use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error object reported by the annotation API inside an otherwise successful response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpstreamError {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.code, &self.status) {
            (Some(code), Some(status)) => write!(f, "{code} {status}")?,
            (Some(code), None) => write!(f, "{code}")?,
            (None, Some(status)) => f.write_str(status)?,
            (None, None) => f.write_str("unknown")?,
        }
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

/// Inspect a raw annotation response for a top-level `error` field.
///
/// Only the batch-level field counts. Per-image errors under
/// `responses[i].error` are part of a normal result and are forwarded.
/// Bodies that are not a JSON object carry no embedded error.
pub fn upstream_error(body: &[u8]) -> Option<UpstreamError> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let error = value.as_object()?.get("error")?;
    match error {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Object(_) => Some(
            serde_json::from_value(error.clone()).unwrap_or_else(|_| UpstreamError {
                message: Some(error.to_string()),
                ..Default::default()
            }),
        ),
        Value::String(s) => Some(UpstreamError {
            message: Some(s.clone()),
            ..Default::default()
        }),
        other => Some(UpstreamError {
            message: Some(other.to_string()),
            ..Default::default()
        }),
    }
}
