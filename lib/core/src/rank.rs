// Default multi-key ranking for result ordering
use ordered_float::OrderedFloat;
use serde_json::{Map, Value};

use crate::fields::FieldCatalog;
use crate::record::Record;

/// Exact identifier match.
pub const TIER_EXACT: u8 = 0;
/// Identifier starts with the searched value.
pub const TIER_PREFIX: u8 = 1;
/// Searched value appears somewhere in the identifier.
pub const TIER_SUBSTRING: u8 = 2;
/// No search value, or no overlap at all.
pub const TIER_UNMATCHED: u8 = 10;

/// Fixed-arity sort key; lower sorts first. Sales are negated so higher
/// sellers come first within equal tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RankKey {
    pub match_tier: u8,
    pub soft_score: i32,
    pub series_tier: u8,
    pub neg_sales: OrderedFloat<f64>,
}

fn match_tier(code: &str, search_code: &str) -> u8 {
    if search_code.is_empty() {
        return TIER_UNMATCHED;
    }
    let clean = search_code.trim().replace('%', "");
    if code == clean {
        TIER_EXACT
    } else if code.starts_with(&clean) {
        TIER_PREFIX
    } else if code.contains(&clean) {
        TIER_SUBSTRING
    } else {
        TIER_UNMATCHED
    }
}

/// Count soft-field keywords found in the record's text values.
fn soft_match_count(record: &Record, soft_criteria: &Map<String, Value>) -> i32 {
    let mut count = 0;
    for (field, query_val) in soft_criteria {
        if query_val.is_null() {
            continue;
        }
        let target = record.text(field).to_lowercase();

        let keywords: Vec<String> = match query_val {
            Value::Array(items) => items
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
            Value::String(s) => s
                .split(['/', ',', '，', '、', '+'])
                .map(str::to_string)
                .collect(),
            other => vec![other.to_string()],
        };

        for kw in keywords {
            let kw = kw.trim().to_lowercase();
            if !kw.is_empty() && target.contains(&kw) {
                count += 1;
            }
        }
    }
    count
}

/// Compute the default sort key for a record.
///
/// `search_code` is the raw value the caller searched the identifier
/// field with (wildcards are stripped before comparison). `soft_base`
/// is the score all records start from; every matched soft keyword
/// subtracts one, so better matches sort earlier.
pub fn rank_key(
    catalog: &FieldCatalog,
    record: &Record,
    search_code: &str,
    soft_criteria: &Map<String, Value>,
    soft_base: i32,
) -> RankKey {
    let code = record.text(&catalog.code_field);
    let sales = record.number(&catalog.sales_field).unwrap_or(0.0);

    RankKey {
        match_tier: match_tier(&code, search_code),
        soft_score: soft_base - soft_match_count(record, soft_criteria),
        series_tier: catalog.series_tier(&code),
        neg_sales: OrderedFloat(-sales),
    }
}
