// Query orchestration: parse -> compile -> fetch -> refine -> rank -> page
use std::cmp::Ordering;
use std::sync::Arc;

use futures_util::future::join_all;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use fabx_core::{
    compile_strict, composition, rank, textmatch, CoarseFilter, FieldCatalog, FieldPredicate,
    Record,
};
use fabx_store::RecordStore;

use crate::enrich;

/// A loosely structured query: field name -> criterion value, plus the
/// reserved execution keys (`limit`, `sort`, `fields`, `mode`, `title`).
pub type Query = Map<String, Value>;

/// Policy knobs for the orchestrator. These are business rules, not
/// algorithmic necessities, so they live in configuration.
#[derive(Debug, Clone)]
pub struct SearchPolicy {
    /// Hard ceiling on the page size, whatever the caller asks for.
    pub page_cap: usize,
    /// Row cap passed to the store fetch, independent of the page size.
    pub fetch_cap: usize,
    /// Maximum entries kept in array-typed media fields at serialization.
    pub attachment_cap: usize,
    /// Base soft score; each matched soft keyword subtracts one.
    pub soft_base_score: i32,
    /// Under the primary operating mode, drop records with a null, blank
    /// or non-positive weight after fetch.
    pub drop_blank_weight_in_primary_mode: bool,
}

impl Default for SearchPolicy {
    fn default() -> Self {
        Self {
            page_cap: 100,
            fetch_cap: 5000,
            attachment_cap: 3,
            soft_base_score: 100,
            drop_blank_weight_in_primary_mode: true,
        }
    }
}

/// Coarse operating mode carried on the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingMode {
    /// Adds the identifier-prefix and stocking-status allow-lists and the
    /// post-fetch weight drop.
    Primary,
    /// Reserved: no extra predicates attached.
    Secondary,
}

impl OperatingMode {
    fn from_query(value: Option<&Value>) -> Self {
        let text = match value {
            None | Some(Value::Null) => return Self::Primary,
            Some(Value::String(s)) => s.trim().to_string(),
            Some(other) => other.to_string(),
        };
        match text.as_str() {
            "2" => Self::Secondary,
            _ => Self::Primary,
        }
    }
}

/// Result page for one query. `total` is the refined match count capped
/// at the page limit - a display cap, not a true total.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub title: String,
    pub total: usize,
    pub list: Vec<Record>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchResponse {
    fn empty(title: String, error: Option<String>) -> Self {
        Self {
            title,
            total: 0,
            list: Vec::new(),
            error,
        }
    }
}

/// Detail lookup result. An unknown identifier is a structured miss,
/// never an error.
#[derive(Debug, Clone, Serialize)]
pub struct DetailResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: Option<Map<String, Value>>,
}

/// The query orchestrator. Stateless per invocation: every search builds
/// its own filter, working copies and rank keys, so concurrent calls
/// cannot observe each other.
pub struct SearchEngine {
    store: Arc<dyn RecordStore>,
    catalog: FieldCatalog,
    policy: SearchPolicy,
}

impl SearchEngine {
    pub fn new(store: Arc<dyn RecordStore>, catalog: FieldCatalog, policy: SearchPolicy) -> Self {
        Self {
            store,
            catalog,
            policy,
        }
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    /// Single-query entry point.
    pub async fn search(&self, query: &Query) -> SearchResponse {
        let title = query
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let limit = self.parse_limit(query.get("limit"));
        let user_sort = parse_sort_spec(query.get("sort").or_else(|| query.get("sort_by")));
        let requested = self.requested_fields(query.get("fields"));
        let mode = OperatingMode::from_query(query.get("mode"));

        // Reserved keys never filter; everything else splits into strict
        // criteria (can exclude) and soft criteria (rank only).
        let mut strict: Map<String, Value> = Map::new();
        let mut soft: Map<String, Value> = Map::new();
        for (key, value) in query {
            if value.is_null() || self.catalog.is_reserved(key) {
                continue;
            }
            if self.catalog.is_soft(key) {
                soft.insert(key.clone(), value.clone());
            } else {
                strict.insert(key.clone(), value.clone());
            }
        }
        let search_code = strict
            .get(&self.catalog.code_field)
            .map(textmatch::query_text)
            .unwrap_or_default();

        let (filter, resolved) = self.build_filter(&strict, &soft, mode, &requested);

        let rows = match self.store.fetch_candidates(&filter).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "candidate fetch failed, returning empty result");
                return SearchResponse::empty(title, Some(format!("Store error: {e}")));
            }
        };
        info!(
            candidates = rows.len(),
            predicates = filter.predicates.len(),
            "coarse fetch complete"
        );

        let mut refined: Vec<Record> = rows
            .into_iter()
            .filter(|row| self.refine(row, &strict, &resolved, mode))
            .collect();
        let total = refined.len();

        match user_sort {
            Some(spec) => self.sort_explicit(&mut refined, &spec),
            None => {
                let catalog = &self.catalog;
                let base = self.policy.soft_base_score;
                refined.sort_by_cached_key(|r| rank::rank_key(catalog, r, &search_code, &soft, base));
            }
        }

        refined.truncate(limit);

        self.enrich_page(&mut refined, &requested).await;
        let list = self.finalize(refined, &requested);

        SearchResponse {
            title,
            total: total.min(limit),
            list,
            error: None,
        }
    }

    /// Batch entry point: one concurrent unit of work per query, results
    /// in input order, one slot per query even when a fetch fails.
    pub async fn search_batch(&self, queries: &[Query]) -> Vec<SearchResponse> {
        join_all(queries.iter().map(|q| self.search(q))).await
    }

    /// Direct identifier lookup bypassing the filter/rank pipeline.
    pub async fn detail(&self, code: &str) -> DetailResponse {
        if code.trim().is_empty() {
            return DetailResponse {
                success: false,
                message: Some("identifier is required".to_string()),
                data: None,
            };
        }

        let fields = self.catalog.all_detail_fields();
        let found = match self.store.fetch_by_code(code, &fields).await {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, code, "detail fetch failed");
                return DetailResponse {
                    success: false,
                    message: Some(format!("Store error: {e}")),
                    data: None,
                };
            }
        };

        let Some(mut record) = found else {
            return DetailResponse {
                success: false,
                message: Some(format!("Product with code '{code}' not found")),
                data: None,
            };
        };

        match self.store.fetch_attachments(&[code.to_string()]).await {
            Ok(attachments) => enrich::merge_attachments(
                std::slice::from_mut(&mut record),
                &attachments,
                &self.catalog.code_field,
            ),
            Err(e) => warn!(error = %e, code, "attachment fetch failed, detail continues"),
        }

        let mut data = Map::new();
        for (category, fields) in &self.catalog.detail_categories {
            let mut section = Map::new();
            for field in fields {
                if let Some(v) = record.get(field) {
                    section.insert(field.clone(), v.clone());
                }
            }
            data.insert((*category).to_string(), Value::Object(section));
        }

        DetailResponse {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    fn parse_limit(&self, value: Option<&Value>) -> usize {
        let requested = match value {
            Some(Value::Number(n)) => n.as_u64().map(|v| v as usize),
            Some(Value::String(s)) if !s.trim().is_empty() => {
                let t = s.trim();
                t.chars()
                    .all(|c| c.is_ascii_digit())
                    .then(|| t.parse::<usize>().ok())
                    .flatten()
            }
            _ => None,
        };
        requested
            .filter(|&v| v > 0)
            .unwrap_or(self.policy.page_cap)
            .min(self.policy.page_cap)
    }

    fn requested_fields(&self, value: Option<&Value>) -> Vec<String> {
        let fields: Vec<String> = match value {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            Some(Value::String(s)) => s
                .split(['/', ',', '|', '+'])
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };
        if fields.is_empty() {
            self.catalog.default_return_fields.clone()
        } else {
            fields
        }
    }

    /// Assemble the storage filter: compiled strict predicates, the
    /// primary-mode allow-lists, the widened projection and the row cap.
    /// Also reports which fields the coarse filter resolved exactly.
    fn build_filter(
        &self,
        strict: &Map<String, Value>,
        soft: &Map<String, Value>,
        mode: OperatingMode,
        requested: &[String],
    ) -> (CoarseFilter, ahash::AHashSet<String>) {
        let compiled = compile_strict(&self.catalog, strict);
        for field in strict.keys() {
            if self.catalog.is_numeric(field) && !predicate_on_field(&compiled.predicates, field) {
                debug!(field, "numeric criterion did not parse, field left unconstrained");
            }
        }

        let mut predicates = compiled.predicates;
        if mode == OperatingMode::Primary {
            predicates.push(FieldPredicate::In {
                field: self.catalog.exact_match_field.clone(),
                values: self.catalog.primary_code_starts.clone(),
            });
            predicates.push(FieldPredicate::In {
                field: "type_notes".to_string(),
                values: self.catalog.primary_type_notes.clone(),
            });
        }

        // ranking and refinement always need the mandatory fields, and any
        // classified field mentioned by the query
        let mut projection: Vec<String> = requested.to_vec();
        for field in self.catalog.mandatory_fields() {
            if !projection.contains(&field) {
                projection.push(field);
            }
        }
        for field in strict.keys().chain(soft.keys()) {
            if self.catalog.is_classified(field) && !projection.contains(field) {
                projection.push(field.clone());
            }
        }

        let filter = CoarseFilter {
            predicates,
            projection,
            row_cap: self.policy.fetch_cap,
        };
        (filter, compiled.resolved)
    }

    /// The precise in-memory pass over one candidate record.
    fn refine(
        &self,
        row: &Record,
        strict: &Map<String, Value>,
        resolved: &ahash::AHashSet<String>,
        mode: OperatingMode,
    ) -> bool {
        if mode == OperatingMode::Primary && self.policy.drop_blank_weight_in_primary_mode {
            let weight_field = &self.catalog.weight_field;
            if row.is_blank(weight_field) || row.number(weight_field).unwrap_or(0.0) <= 0.0 {
                return false;
            }
        }

        for (field, value) in strict {
            // numeric criteria are fully handled by the coarse filter
            if self.catalog.is_numeric(field) || resolved.contains(field) {
                continue;
            }
            if self.catalog.is_composition(field) {
                let q = textmatch::query_text(value);
                if !composition::evaluate(&row.text(field), &q) {
                    return false;
                }
            } else if self.catalog.is_strict_text(field)
                && !textmatch::matches_value(&row.text(field), value)
            {
                return false;
            }
        }
        true
    }

    fn sort_explicit(&self, rows: &mut Vec<Record>, spec: &SortSpec) {
        if self.catalog.price_fields.contains(&spec.field) {
            rows.retain(|r| r.number(&spec.field).map(|v| v > 0.0).unwrap_or(false));
        }

        let all_numeric = rows
            .iter()
            .all(|r| r.is_blank(&spec.field) || r.number(&spec.field).is_some());

        if all_numeric {
            rows.sort_by(|a, b| {
                let av = a.number(&spec.field).unwrap_or(0.0);
                let bv = b.number(&spec.field).unwrap_or(0.0);
                let ord = av.partial_cmp(&bv).unwrap_or(Ordering::Equal);
                if spec.ascending { ord } else { ord.reverse() }
            });
        } else {
            rows.sort_by(|a, b| {
                let ord = a.text(&spec.field).cmp(&b.text(&spec.field));
                if spec.ascending { ord } else { ord.reverse() }
            });
        }
    }

    async fn enrich_page(&self, rows: &mut [Record], requested: &[String]) {
        if !requested.iter().any(|f| f == enrich::IMAGE_FIELD) || rows.is_empty() {
            return;
        }
        let codes: Vec<String> = rows
            .iter()
            .map(|r| r.text(&self.catalog.code_field))
            .filter(|c| !c.is_empty())
            .collect();
        match self.store.fetch_attachments(&codes).await {
            Ok(attachments) => {
                enrich::merge_attachments(rows, &attachments, &self.catalog.code_field)
            }
            Err(e) => warn!(error = %e, "attachment fetch failed, page returned without media"),
        }
    }

    /// Final serialization: normalize media fields, project to the
    /// requested set, cap array-typed attachment lists.
    fn finalize(&self, rows: Vec<Record>, requested: &[String]) -> Vec<Record> {
        rows.into_iter()
            .map(|mut record| {
                if enrich::has_media_fields(&record) {
                    enrich::reclassify_media(&mut record, Vec::new());
                }
                record.project(requested);
                for field in [enrich::IMAGE_FIELD, enrich::REPORT_FIELD] {
                    if let Some(Value::Array(items)) = record.get(field) {
                        if items.len() > self.policy.attachment_cap {
                            let capped = items[..self.policy.attachment_cap].to_vec();
                            record.set(field, Value::Array(capped));
                        }
                    }
                }
                record
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
struct SortSpec {
    field: String,
    ascending: bool,
}

/// Parse `"price ASC"` style sort specs; descending is the default.
fn parse_sort_spec(value: Option<&Value>) -> Option<SortSpec> {
    let text = match value {
        Some(Value::String(s)) => s.trim().to_string(),
        _ => return None,
    };
    if text.is_empty() {
        return None;
    }
    let mut parts = text.split_whitespace();
    let field = parts.next()?.to_string();
    let ascending = parts
        .next()
        .map(|t| t.eq_ignore_ascii_case("asc"))
        .unwrap_or(false);
    Some(SortSpec { field, ascending })
}

fn predicate_on_field(predicates: &[FieldPredicate], field: &str) -> bool {
    predicates.iter().any(|p| match p {
        FieldPredicate::Between { field: f, .. }
        | FieldPredicate::Compare { field: f, .. }
        | FieldPredicate::Eq { field: f, .. }
        | FieldPredicate::Like { field: f, .. }
        | FieldPredicate::In { field: f, .. } => f == field,
        FieldPredicate::AnyOf(subs) | FieldPredicate::AllOf(subs) => {
            predicate_on_field(subs, field)
        }
    })
}
