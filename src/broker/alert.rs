// src/broker/alert.rs
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{FinkError, Result};

/// One alert as returned by the Fink API: `{column name: value}`.
pub type RawAlert = Map<String, Value>;

/// Alert columns displayed by the TOM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericAlert {
    /// Julian Date of the detection.
    pub timestamp: f64,
    pub id: i64,
    /// Object page in the Fink Science Portal.
    pub url: String,
    pub name: String,
    pub ra: f64,
    pub dec: f64,
    pub mag: f64,
    pub score: f64,
}

/// Subset of columns read from a raw alert.
#[derive(Debug, Deserialize)]
struct FinkColumns {
    #[serde(rename = "i:jd")]
    jd: f64,
    #[serde(rename = "i:candid")]
    candid: i64,
    #[serde(rename = "i:objectId")]
    object_id: String,
    #[serde(rename = "i:ra")]
    ra: f64,
    #[serde(rename = "i:dec")]
    dec: f64,
    #[serde(rename = "i:magpsf")]
    magpsf: f64,
    #[serde(rename = "d:rfscore")]
    rfscore: f64,
}

/// Project a raw alert onto [`GenericAlert`].
///
/// Missing or mistyped columns are reported as [`FinkError::MalformedRecord`].
pub fn to_generic_alert(alert: &RawAlert, base_url: &str) -> Result<GenericAlert> {
    let cols: FinkColumns = serde_json::from_value(Value::Object(alert.clone()))
        .map_err(|e| FinkError::MalformedRecord(e.to_string()))?;

    Ok(GenericAlert {
        timestamp: cols.jd,
        id: cols.candid,
        url: format!("{}/{}", base_url, cols.object_id),
        name: cols.object_id,
        ra: cols.ra,
        dec: cols.dec,
        mag: cols.magpsf,
        score: cols.rfscore,
    })
}

/// Single-pass cursor over the alerts of one response.
///
/// Not restartable: run the query again to iterate again.
#[derive(Debug)]
pub struct AlertStream {
    inner: std::vec::IntoIter<Value>,
}

impl AlertStream {
    pub(crate) fn new(items: Vec<Value>) -> Self {
        Self {
            inner: items.into_iter(),
        }
    }

    /// Decode a bulk response body; anything but a JSON array is rejected.
    pub fn from_payload(payload: Value) -> Result<Self> {
        match payload {
            Value::Array(items) => Ok(Self::new(items)),
            other => Err(FinkError::UnexpectedPayload(format!(
                "expected a JSON array, got {}",
                json_kind(&other)
            ))),
        }
    }
}

impl Iterator for AlertStream {
    type Item = Result<RawAlert>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|v| match v {
            Value::Object(map) => Ok(map),
            other => Err(FinkError::MalformedRecord(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for AlertStream {}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
