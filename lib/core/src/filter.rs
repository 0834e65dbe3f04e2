// Coarse storage-level filter: compilation and in-memory evaluation
use ahash::AHashSet;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::criterion::{parse_numeric, parse_text, CompareOp, Criterion};
use crate::fields::FieldCatalog;
use crate::record::Record;
use crate::textmatch::query_text;

/// Ingredient names are runs of CJK or latin letters; digits, `%` and
/// operators around them are ignored at the coarse level.
static KEYWORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\p{Han}a-zA-Z]+").unwrap());

/// One storage-level predicate over a single field (or a boolean group).
#[derive(Debug, Clone, PartialEq)]
pub enum FieldPredicate {
    Between { field: String, min: f64, max: f64 },
    Compare { field: String, op: CompareOp, value: f64 },
    Eq { field: String, value: String },
    Like { field: String, pattern: String },
    In { field: String, values: Vec<String> },
    AnyOf(Vec<FieldPredicate>),
    AllOf(Vec<FieldPredicate>),
}

impl FieldPredicate {
    /// Evaluate against a materialized record. Missing fields never match.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            FieldPredicate::Between { field, min, max } => record
                .number(field)
                .map(|v| v >= *min && v <= *max)
                .unwrap_or(false),
            FieldPredicate::Compare { field, op, value } => record
                .number(field)
                .map(|v| op.matches(v, *value))
                .unwrap_or(false),
            FieldPredicate::Eq { field, value } => record.text(field) == *value,
            FieldPredicate::Like { field, pattern } => {
                like_match(&record.text(field), pattern)
            }
            FieldPredicate::In { field, values } => {
                let v = record.text(field);
                values.iter().any(|candidate| *candidate == v)
            }
            FieldPredicate::AnyOf(preds) => preds.iter().any(|p| p.matches(record)),
            FieldPredicate::AllOf(preds) => preds.iter().all(|p| p.matches(record)),
        }
    }
}

/// SQL-style `LIKE` matching, case-insensitive, `%` as the only wildcard.
fn like_match(text: &str, pattern: &str) -> bool {
    let text = text.to_lowercase();
    let pattern = pattern.to_lowercase();
    if !pattern.contains('%') {
        return text == pattern;
    }

    let segments: Vec<&str> = pattern.split('%').collect();
    let last = segments.len() - 1;
    let mut pos = 0usize;
    for (i, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            continue;
        }
        if i == 0 {
            if !text.starts_with(segment) {
                return false;
            }
            pos = segment.len();
        } else if i == last {
            return text.len() >= pos + segment.len() && text[pos..].ends_with(segment);
        } else {
            match text[pos..].find(segment) {
                Some(idx) => pos += idx + segment.len(),
                None => return false,
            }
        }
    }
    true
}

/// Conjunctive storage filter: every predicate must hold. The store also
/// honors the projection and the row cap, which is independent of the
/// final page size.
#[derive(Debug, Clone, Default)]
pub struct CoarseFilter {
    pub predicates: Vec<FieldPredicate>,
    pub projection: Vec<String>,
    pub row_cap: usize,
}

impl CoarseFilter {
    pub fn matches(&self, record: &Record) -> bool {
        self.predicates.iter().all(|p| p.matches(record))
    }
}

/// Output of the coarse compiler: the predicate conjunction plus the set
/// of fields it resolved exactly, which the refinement pass may skip.
#[derive(Debug, Clone, Default)]
pub struct CompiledFilter {
    pub predicates: Vec<FieldPredicate>,
    pub resolved: AHashSet<String>,
}

fn criterion_to_predicate(field: &str, criterion: &Criterion) -> FieldPredicate {
    match criterion {
        Criterion::Between { min, max } => FieldPredicate::Between {
            field: field.to_string(),
            min: *min,
            max: *max,
        },
        Criterion::Compare { op, value } => FieldPredicate::Compare {
            field: field.to_string(),
            op: *op,
            value: *value,
        },
        Criterion::Equals(v) => FieldPredicate::Eq {
            field: field.to_string(),
            value: v.clone(),
        },
        Criterion::Contains(v) => FieldPredicate::Like {
            field: field.to_string(),
            // explicit wildcard markers from the caller win
            pattern: if v.contains('%') {
                v.clone()
            } else {
                format!("%{v}%")
            },
        },
        Criterion::InList(values) => FieldPredicate::In {
            field: field.to_string(),
            values: values.clone(),
        },
        Criterion::AnyOf(subs) => FieldPredicate::AnyOf(
            subs.iter().map(|c| criterion_to_predicate(field, c)).collect(),
        ),
        Criterion::AllOf(subs) => FieldPredicate::AllOf(
            subs.iter().map(|c| criterion_to_predicate(field, c)).collect(),
        ),
    }
}

/// Coarse keyword-existence check for the composition field.
///
/// Percentages and comparison direction are intentionally ignored here:
/// "棉>95%" narrows to records whose composition text mentions 棉 at all,
/// and the composition evaluator re-checks the threshold in memory.
fn composition_predicate(field: &str, raw: &str) -> Option<FieldPredicate> {
    let keywords: Vec<String> = KEYWORD_RE
        .find_iter(raw)
        .map(|m| m.as_str().to_string())
        .collect();
    if keywords.is_empty() {
        return None;
    }
    let likes: Vec<FieldPredicate> = keywords
        .into_iter()
        .map(|kw| FieldPredicate::Like {
            field: field.to_string(),
            pattern: format!("%{kw}%"),
        })
        .collect();
    if raw.contains('/') {
        Some(FieldPredicate::AnyOf(likes))
    } else if likes.len() == 1 {
        likes.into_iter().next()
    } else {
        Some(FieldPredicate::AllOf(likes))
    }
}

/// Compile strict criteria into the storage-level conjunction.
///
/// Numeric and plain text fields compile to precise predicates; the
/// composition field only gets the over-approximating keyword check and
/// is never marked resolved. Text values mixing `/` and `+` compile to
/// nothing and are left to the in-memory pass.
pub fn compile_strict(catalog: &FieldCatalog, strict: &Map<String, Value>) -> CompiledFilter {
    let mut out = CompiledFilter::default();

    for (field, value) in strict {
        if value.is_null() {
            continue;
        }
        if catalog.is_numeric(field) {
            if let Some(criterion) = parse_numeric(value) {
                out.predicates.push(criterion_to_predicate(field, &criterion));
            }
            continue;
        }
        if catalog.is_composition(field) {
            let raw = query_text(value);
            if let Some(pred) = composition_predicate(field, &raw) {
                out.predicates.push(pred);
            }
            continue;
        }
        if catalog.is_strict_text(field) {
            if let Some(criterion) = parse_text(catalog, field, value) {
                out.predicates.push(criterion_to_predicate(field, &criterion));
                out.resolved.insert(field.clone());
            }
        }
    }

    out
}
