// Operator grammar for raw criterion values
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::fields::FieldCatalog;

static RANGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+(?:\.\d+)?)-(\d+(?:\.\d+)?)$").unwrap());
static COMPARE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(>=|<=|>|<|=)(\d+(?:\.\d+)?)$").unwrap());

/// Numeric comparison operators accepted by the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
}

impl CompareOp {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            ">" => Some(Self::Gt),
            "<" => Some(Self::Lt),
            ">=" => Some(Self::Ge),
            "<=" => Some(Self::Le),
            "=" => Some(Self::Eq),
            _ => None,
        }
    }

    #[inline]
    pub fn matches(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Self::Gt => lhs > rhs,
            Self::Lt => lhs < rhs,
            Self::Ge => lhs >= rhs,
            Self::Le => lhs <= rhs,
            Self::Eq => lhs == rhs,
        }
    }
}

/// Normalized form of one field's raw criterion value.
///
/// `Contains` keeps the caller's text untouched: explicit `%` wildcard
/// markers survive, and the coarse compiler decides whether to wrap.
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    Between { min: f64, max: f64 },
    Compare { op: CompareOp, value: f64 },
    Equals(String),
    Contains(String),
    InList(Vec<String>),
    AnyOf(Vec<Criterion>),
    AllOf(Vec<Criterion>),
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn value_to_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(
            items
                .iter()
                .map(value_to_text)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        ),
        _ => None,
    }
}

/// Parse a numeric criterion: `A-B` (inclusive range) or `{op}{N}`.
///
/// Everything except digits, `.`, `-`, `<`, `>`, `=` is stripped first, so
/// inputs like `">300g"` still parse. Any other shape means "no filter",
/// never an error.
pub fn parse_numeric(value: &Value) -> Option<Criterion> {
    let raw = value_to_text(value);
    if raw.is_empty() {
        return None;
    }
    let clean: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '<' | '>' | '='))
        .collect();

    if let Some(caps) = RANGE_RE.captures(&clean) {
        let min = caps[1].parse::<f64>().ok()?;
        let max = caps[2].parse::<f64>().ok()?;
        return Some(Criterion::Between { min, max });
    }
    if let Some(caps) = COMPARE_RE.captures(&clean) {
        let op = CompareOp::parse(&caps[1])?;
        let value = caps[2].parse::<f64>().ok()?;
        return Some(Criterion::Compare { op, value });
    }
    None
}

/// Parse a text criterion according to the field's classification.
///
/// `/` builds OR groups, `+` and `,` build AND groups; a value mixing both
/// is left unfiltered here and handed entirely to the refinement pass.
/// The exact-match-only field never degrades to substring matching.
pub fn parse_text(catalog: &FieldCatalog, field: &str, value: &Value) -> Option<Criterion> {
    let exact_only = field == catalog.exact_match_field;

    let val = match value_to_list(value) {
        Some(items) if items.is_empty() => return None,
        // IN-lists keep index-friendly lookups on the exact-match field;
        // everywhere else a list is just OR semantics.
        Some(items) if exact_only => return Some(Criterion::InList(items)),
        Some(items) => items.join("/"),
        None => value_to_text(value),
    };
    let val = val.trim().to_string();
    if val.is_empty() {
        return None;
    }

    let has_or = val.contains('/');
    let has_and = val.contains('+') || val.contains(',');

    if !has_or && !has_and {
        if exact_only {
            return Some(Criterion::Equals(val));
        }
        return Some(Criterion::Contains(val));
    }

    if has_or && !has_and {
        let parts: Vec<String> = val
            .split('/')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        if parts.is_empty() {
            return None;
        }
        if exact_only {
            return Some(Criterion::InList(parts));
        }
        return Some(Criterion::AnyOf(
            parts.into_iter().map(Criterion::Contains).collect(),
        ));
    }

    if has_and && !has_or {
        let parts: Vec<String> = val
            .split(['+', ','])
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        if parts.is_empty() {
            return None;
        }
        return Some(Criterion::AllOf(
            parts.into_iter().map(Criterion::Contains).collect(),
        ));
    }

    // Both delimiters present: unsupported combination at this level.
    None
}

/// Parse a raw criterion value for a classified field.
pub fn parse_criterion(catalog: &FieldCatalog, field: &str, value: &Value) -> Option<Criterion> {
    if catalog.is_numeric(field) {
        parse_numeric(value)
    } else {
        parse_text(catalog, field, value)
    }
}
