use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single catalog item: an untyped field -> value mapping.
///
/// Records come out of the store already materialized; the engine never
/// writes them back, it only mutates its own working copies during
/// enrichment and projection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Record {
    pub fields: Map<String, Value>,
}

impl Record {
    #[inline]
    #[must_use]
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    #[inline]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    #[inline]
    pub fn set(&mut self, field: &str, value: Value) {
        self.fields.insert(field.to_string(), value);
    }

    /// Field value rendered as text; null and missing both come back empty.
    pub fn text(&self, field: &str) -> String {
        match self.fields.get(field) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    /// Numeric view of a field. Strings holding numbers coerce, anything
    /// else is `None`.
    pub fn number(&self, field: &str) -> Option<f64> {
        match self.fields.get(field)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// True when the field is missing, null, or a blank string.
    pub fn is_blank(&self, field: &str) -> bool {
        match self.fields.get(field) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Restrict the record to the given fields, in place.
    pub fn project(&mut self, keep: &[String]) {
        self.fields.retain(|k, _| keep.iter().any(|f| f == k));
    }
}

impl From<Value> for Record {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self { fields },
            _ => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: Value) -> Record {
        Record::from(v)
    }

    #[test]
    fn number_coerces_strings() {
        let r = record(json!({"weight": "220.5", "width": 150, "name": "jersey"}));
        assert_eq!(r.number("weight"), Some(220.5));
        assert_eq!(r.number("width"), Some(150.0));
        assert_eq!(r.number("name"), None);
        assert_eq!(r.number("missing"), None);
    }

    #[test]
    fn blank_detection() {
        let r = record(json!({"a": "", "b": "  ", "c": null, "d": 0}));
        assert!(r.is_blank("a"));
        assert!(r.is_blank("b"));
        assert!(r.is_blank("c"));
        assert!(r.is_blank("missing"));
        assert!(!r.is_blank("d"));
    }

    #[test]
    fn projection_drops_unrequested_fields() {
        let mut r = record(json!({"code": "6228", "price": 12, "notes": "x"}));
        r.project(&["code".to_string(), "price".to_string()]);
        assert_eq!(r.fields.len(), 2);
        assert!(r.get("notes").is_none());
    }
}
