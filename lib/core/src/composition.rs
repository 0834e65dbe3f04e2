// Ingredient-percentage parsing and composition query evaluation
use ahash::AHashMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::criterion::CompareOp;

/// Both production spellings are accepted: "65%cotton" and "cotton65%".
/// Names are runs of CJK or latin letters.
static INGREDIENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(\d+(?:\.\d+)?)%\s*([\p{Han}a-zA-Z]+)|([\p{Han}a-zA-Z]+)\s*(\d+(?:\.\d+)?)%",
    )
    .unwrap()
});

static CONDITION_OP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(>=|<=|>|<|=)([\d.]+)").unwrap());

/// Parse a composition string into ingredient -> percentage.
///
/// Parsing is lenient: unparseable fragments are skipped, and on duplicate
/// ingredient names the last occurrence wins. Names are lowercased.
pub fn parse_composition(text: &str) -> AHashMap<String, f64> {
    let lower = text.to_lowercase();
    let mut out = AHashMap::new();
    for caps in INGREDIENT_RE.captures_iter(&lower) {
        if let (Some(pct), Some(name)) = (caps.get(1), caps.get(2)) {
            if let Ok(v) = pct.as_str().parse::<f64>() {
                out.insert(name.as_str().to_string(), v);
            }
        } else if let (Some(name), Some(pct)) = (caps.get(3), caps.get(4)) {
            if let Ok(v) = pct.as_str().parse::<f64>() {
                out.insert(name.as_str().to_string(), v);
            }
        }
    }
    out
}

/// One atomic condition: a threshold comparison or a bare keyword.
fn condition_matches(
    cond: &str,
    ingredients: &AHashMap<String, f64>,
    raw_text_lower: &str,
) -> bool {
    if let Some(caps) = CONDITION_OP_RE.captures(cond) {
        let op = CompareOp::parse(&caps[1]);
        let threshold = caps[2].parse::<f64>().ok();
        if let (Some(op), Some(threshold)) = (op, threshold) {
            let name = cond.replacen(&caps[0], "", 1).trim().to_lowercase();
            let share = ingredients.get(&name).copied().unwrap_or(0.0);
            return op.matches(share, threshold);
        }
    }
    // Bare keyword: present as a parsed ingredient, or anywhere in the raw
    // text for compositions the percentage parser could not structure.
    let kw = cond.to_lowercase();
    ingredients.contains_key(&kw) || raw_text_lower.contains(&kw)
}

/// Evaluate an ingredient query against a composition string.
///
/// The query is an OR of `/`-separated groups, each an AND of
/// `+`-separated conditions. `%` inside conditions is cosmetic and
/// stripped. An absent or empty query constrains nothing.
pub fn evaluate(composition_text: &str, query: &str) -> bool {
    if query.trim().is_empty() {
        return true;
    }
    let raw_lower = composition_text.to_lowercase();
    let ingredients = parse_composition(composition_text);

    for group in query.split('/') {
        let mut group_pass = true;
        for cond in group.split('+') {
            let cond = cond.replace('%', "");
            let cond = cond.trim();
            if cond.is_empty() {
                continue;
            }
            if !condition_matches(cond, &ingredients, &raw_lower) {
                group_pass = false;
                break;
            }
        }
        if group_pass {
            return true;
        }
    }
    false
}
