use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A corpus item: a stable external id plus its pre-normalized text fields.
///
/// Fields live in a JSON object payload so callers can hand over whatever
/// their ingestion step produced. Only string values count as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub payload: Value,
}

impl Document {
    pub fn new(id: impl Into<String>, payload: Value) -> Self {
        Self {
            id: id.into(),
            payload,
        }
    }

    /// Build a document from `(field, text)` pairs.
    pub fn from_fields<I, K, V>(id: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: Map<String, Value> = fields
            .into_iter()
            .map(|(k, v)| (k.into(), Value::String(v.into())))
            .collect();
        Self::new(id, Value::Object(map))
    }

    /// Text of `field`, or `None` when the field is missing or not a string.
    #[inline]
    pub fn text(&self, field: &str) -> Option<&str> {
        self.payload.get(field).and_then(Value::as_str)
    }
}
