// Integration tests for fabx
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use fabx::prelude::*;
use fabx::CoarseFilter;

fn record(code: &str, weight: Value, sales: f64, elem: &str) -> Record {
    let code_start: String = code.chars().take(1).collect();
    Record::from(json!({
        "code": code,
        "code_start": code_start,
        "type_notes": "现货",
        "name": format!("fabric {code}"),
        "weight": weight,
        "sale_num_year": sales,
        "elem": elem,
        "price": 25.0,
    }))
}

fn engine_with(records: Vec<Record>) -> SearchEngine {
    let store = Arc::new(MemoryStore::default());
    store.load_records(records);
    SearchEngine::new(store, FieldCatalog::default(), SearchPolicy::default())
}

fn query(v: Value) -> Map<String, Value> {
    v.as_object().expect("query must be an object").clone()
}

#[tokio::test]
async fn weight_range_is_inclusive_both_ends() {
    let engine = engine_with(vec![
        record("6001", json!(150), 10.0, "100%cotton"),
        record("6002", json!(220), 10.0, "100%cotton"),
        record("6003", json!(300), 10.0, "100%cotton"),
        record("6004", json!(310), 10.0, "100%cotton"),
    ]);

    let res = engine.search(&query(json!({"weight": "200-300"}))).await;
    assert_eq!(res.total, 2);
    let codes: Vec<String> = res.list.iter().map(|r| r.text("code")).collect();
    assert_eq!(codes, vec!["6002", "6003"]);
}

#[tokio::test]
async fn composition_threshold_is_rechecked_in_memory() {
    let engine = engine_with(vec![
        record("6001", json!(200), 10.0, "65%cotton 35%polyester"),
        record("6002", json!(200), 10.0, "40%cotton 60%polyester"),
    ]);

    let res = engine.search(&query(json!({"elem": "cotton>50%"}))).await;
    assert_eq!(res.total, 1);
    assert_eq!(res.list[0].text("code"), "6001");
}

#[tokio::test]
async fn composition_or_matches_either_ingredient() {
    let engine = engine_with(vec![
        record("6001", json!(200), 10.0, "100%silk"),
        record("6002", json!(200), 10.0, "100%wool"),
    ]);

    let res = engine.search(&query(json!({"elem": "cotton / silk"}))).await;
    assert_eq!(res.total, 1);
    assert_eq!(res.list[0].text("code"), "6001");
}

#[tokio::test]
async fn composition_and_requires_every_condition() {
    let engine = engine_with(vec![
        record("6001", json!(200), 10.0, "65%cotton 30%polyester 5%spandex"),
        record("6002", json!(200), 10.0, "65%cotton 35%polyester"),
    ]);

    let res = engine
        .search(&query(json!({"elem": "cotton>30% + spandex"})))
        .await;
    assert_eq!(res.total, 1);
    assert_eq!(res.list[0].text("code"), "6001");
}

#[tokio::test]
async fn prefix_match_ranks_ahead_of_substring_match() {
    // mode 2: no identifier-prefix allow-list, so "16228" stays in play
    let engine = engine_with(vec![
        record("16228", json!(200), 9999.0, "100%cotton"),
        record("6228A", json!(200), 1.0, "100%cotton"),
    ]);

    let res = engine
        .search(&query(json!({"code": "6228", "mode": "2"})))
        .await;
    assert_eq!(res.total, 2);
    let codes: Vec<String> = res.list.iter().map(|r| r.text("code")).collect();
    assert_eq!(codes, vec!["6228A", "16228"]);
}

#[tokio::test]
async fn exact_match_ranks_first() {
    let engine = engine_with(vec![
        record("6228A", json!(200), 9999.0, "100%cotton"),
        record("6228", json!(200), 1.0, "100%cotton"),
    ]);

    let res = engine.search(&query(json!({"code": "6228"}))).await;
    assert_eq!(res.list[0].text("code"), "6228");
}

#[tokio::test]
async fn limit_is_capped_and_total_never_exceeds_cap() {
    let records: Vec<Record> = (0..150)
        .map(|i| record(&format!("6{i:03}"), json!(200), i as f64, "100%cotton"))
        .collect();
    let engine = engine_with(records);

    let res = engine.search(&query(json!({"limit": 10000}))).await;
    assert_eq!(res.list.len(), 100);
    assert_eq!(res.total, 100);
}

#[tokio::test]
async fn primary_mode_drops_blank_weight_records() {
    let engine = engine_with(vec![
        record("6001", json!(null), 10.0, "100%cotton"),
        record("6002", json!(""), 10.0, "100%cotton"),
        record("6003", json!(0), 10.0, "100%cotton"),
        record("6004", json!(200), 10.0, "100%cotton"),
    ]);

    let res = engine.search(&query(json!({}))).await;
    assert_eq!(res.total, 1);
    assert_eq!(res.list[0].text("code"), "6004");

    let res = engine.search(&query(json!({"mode": "2"}))).await;
    assert_eq!(res.total, 4);
}

#[tokio::test]
async fn primary_mode_applies_series_and_status_allow_lists() {
    let mut other_series = record("1001", json!(200), 10.0, "100%cotton");
    other_series.set("code_start", json!("1"));
    let mut discontinued = record("6002", json!(200), 10.0, "100%cotton");
    discontinued.set("type_notes", json!("停产"));
    let engine = engine_with(vec![
        other_series,
        discontinued,
        record("6003", json!(200), 10.0, "100%cotton"),
    ]);

    let res = engine.search(&query(json!({}))).await;
    assert_eq!(res.total, 1);
    assert_eq!(res.list[0].text("code"), "6003");
}

#[tokio::test]
async fn explicit_price_sort_drops_unpriced_and_orders_ascending() {
    let mut unpriced = record("6001", json!(200), 10.0, "100%cotton");
    unpriced.set("price", json!(null));
    let mut cheap = record("6002", json!(200), 10.0, "100%cotton");
    cheap.set("price", json!(10.0));
    let mut dear = record("6003", json!(200), 10.0, "100%cotton");
    dear.set("price", json!(40.0));
    let engine = engine_with(vec![unpriced, dear, cheap]);

    let res = engine
        .search(&query(json!({"sort": "price ASC", "fields": ["code", "price"]})))
        .await;
    let codes: Vec<String> = res.list.iter().map(|r| r.text("code")).collect();
    assert_eq!(codes, vec!["6002", "6003"]);
}

#[tokio::test]
async fn explicit_sort_defaults_to_descending() {
    let engine = engine_with(vec![
        record("6001", json!(180), 10.0, "100%cotton"),
        record("6002", json!(320), 10.0, "100%cotton"),
    ]);

    let res = engine.search(&query(json!({"sort": "weight"}))).await;
    let codes: Vec<String> = res.list.iter().map(|r| r.text("code")).collect();
    assert_eq!(codes, vec!["6002", "6001"]);
}

#[tokio::test]
async fn equal_rank_keys_preserve_input_order() {
    let engine = engine_with(vec![
        record("6010", json!(200), 50.0, "100%cotton"),
        record("6020", json!(200), 50.0, "100%cotton"),
    ]);

    let res = engine.search(&query(json!({}))).await;
    let codes: Vec<String> = res.list.iter().map(|r| r.text("code")).collect();
    assert_eq!(codes, vec!["6010", "6020"]);
}

#[tokio::test]
async fn soft_criteria_rank_without_excluding() {
    let mut plain = record("6001", json!(200), 10.0, "100%cotton");
    plain.set("introduce", json!("classic weave"));
    let mut matching = record("6002", json!(200), 10.0, "100%cotton");
    matching.set("introduce", json!("soft and warm handfeel"));
    let engine = engine_with(vec![plain, matching]);

    let res = engine
        .search(&query(json!({"introduce": "soft / warm"})))
        .await;
    // both records survive; the better soft match sorts first
    assert_eq!(res.total, 2);
    assert_eq!(res.list[0].text("code"), "6002");
}

#[tokio::test]
async fn requested_fields_are_projected_and_mandatory_set_stripped() {
    let engine = engine_with(vec![record("6001", json!(200), 10.0, "100%cotton")]);

    let res = engine
        .search(&query(json!({"fields": ["code", "name"]})))
        .await;
    let row = &res.list[0];
    assert!(row.get("code").is_some());
    assert!(row.get("name").is_some());
    // fetched for ranking, but not requested
    assert!(row.get("sale_num_year").is_none());
    assert!(row.get("weight").is_none());
}

#[tokio::test]
async fn batch_returns_one_slot_per_query_in_order() {
    let engine = engine_with(vec![
        record("6001", json!(200), 10.0, "100%cotton"),
        record("6002", json!(300), 10.0, "100%silk"),
    ]);

    let queries = vec![
        query(json!({"elem": "cotton", "title": "first"})),
        query(json!({"weight": ">250", "title": "second"})),
        query(json!({"elem": "wool", "title": "third"})),
    ];
    let results = engine.search_batch(&queries).await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].title, "first");
    assert_eq!(results[0].total, 1);
    assert_eq!(results[1].list[0].text("code"), "6002");
    assert_eq!(results[2].total, 0);
}

struct FailingStore;

#[async_trait]
impl RecordStore for FailingStore {
    async fn fetch_candidates(&self, _filter: &CoarseFilter) -> Result<Vec<Record>> {
        Err(Error::Store("connection refused".to_string()))
    }

    async fn fetch_by_code(&self, _code: &str, _fields: &[String]) -> Result<Option<Record>> {
        Err(Error::Store("connection refused".to_string()))
    }

    async fn fetch_attachments(&self, _codes: &[String]) -> Result<Vec<Attachment>> {
        Err(Error::Store("connection refused".to_string()))
    }
}

#[tokio::test]
async fn store_failure_degrades_to_empty_result_with_error() {
    let engine = SearchEngine::new(
        Arc::new(FailingStore),
        FieldCatalog::default(),
        SearchPolicy::default(),
    );

    let results = engine
        .search_batch(&[query(json!({"title": "a"})), query(json!({"title": "b"}))])
        .await;
    assert_eq!(results.len(), 2);
    for res in &results {
        assert_eq!(res.total, 0);
        assert!(res.list.is_empty());
        assert!(res.error.as_deref().unwrap_or("").contains("connection refused"));
    }
}

#[tokio::test]
async fn detail_returns_categorized_data() {
    let store = Arc::new(MemoryStore::default());
    store.load_records(vec![record("6228", json!(220), 10.0, "65%cotton 35%polyester")]);
    store.load_attachments(vec![Attachment {
        name: "6228 studio".into(),
        url: "/m/6228.jpg".into(),
        kind: AttachmentKind::Image,
    }]);
    let engine = SearchEngine::new(store, FieldCatalog::default(), SearchPolicy::default());

    let res = engine.detail("6228").await;
    assert!(res.success);
    let data = res.data.expect("detail data");
    assert_eq!(data["basic"]["code"], json!("6228"));
    assert_eq!(data["specs"]["elem"], json!("65%cotton 35%polyester"));
    assert_eq!(data["basic"]["image_urls"], json!(["素材:/m/6228.jpg"]));
}

#[tokio::test]
async fn detail_for_unknown_code_is_a_structured_miss() {
    let engine = engine_with(vec![record("6228", json!(220), 10.0, "100%cotton")]);

    let res = engine.detail("9999").await;
    assert!(!res.success);
    assert!(res.data.is_none());
    assert!(res.message.unwrap_or_default().contains("9999"));
}

#[tokio::test]
async fn attachment_lists_are_capped_in_search_results() {
    let store = Arc::new(MemoryStore::default());
    store.load_records(vec![record("6228", json!(220), 10.0, "100%cotton")]);
    store.load_attachments(
        (0..6)
            .map(|i| Attachment {
                name: "6228 studio".into(),
                url: format!("/m/6228-{i}.jpg"),
                kind: AttachmentKind::Image,
            })
            .collect(),
    );
    let engine = SearchEngine::new(store, FieldCatalog::default(), SearchPolicy::default());

    let res = engine
        .search(&query(json!({"code": "6228", "fields": ["code", "image_urls"]})))
        .await;
    match res.list[0].get("image_urls") {
        Some(Value::Array(items)) => assert_eq!(items.len(), 3),
        other => panic!("expected image list, got {other:?}"),
    }
}

#[tokio::test]
async fn lot_code_prefix_list_filters_exactly() {
    let engine = engine_with(vec![
        record("6001", json!(200), 10.0, "100%cotton"),
        record("9001", json!(200), 10.0, "100%cotton"),
        record("3001", json!(200), 10.0, "100%cotton"),
    ]);

    let res = engine
        .search(&query(json!({"code_start": ["6", "3"]})))
        .await;
    assert_eq!(res.total, 2);
    let codes: Vec<String> = res.list.iter().map(|r| r.text("code")).collect();
    assert!(codes.contains(&"6001".to_string()));
    assert!(codes.contains(&"3001".to_string()));
}
