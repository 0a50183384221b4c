use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Loosely-typed transaction record as returned by the transaction store.
///
/// Every field may be missing or carry an unexpected JSON type; the normalizer
/// in `rule-core` turns these into canonical [`crate::Transaction`] values.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawTransaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, rename = "_id", skip_serializing_if = "Option::is_none")]
    pub object_id: Option<Value>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<Value>,
    #[serde(default, rename = "budgetType", skip_serializing_if = "Option::is_none")]
    pub budget_type: Option<Value>,
}

impl RawTransaction {
    /// Identifier supplied by the store: `id` first, then `_id`.
    ///
    /// Accepts plain strings, numbers and `{"$oid": "..."}` objects. Blank
    /// values count as missing.
    pub fn record_id(&self) -> Option<String> {
        self.id
            .as_ref()
            .and_then(id_text)
            .or_else(|| self.object_id.as_ref().and_then(id_text))
    }
}

fn id_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        Value::Object(map) => return map.get("$oid").and_then(id_text),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}
