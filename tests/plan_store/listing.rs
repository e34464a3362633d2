//! Listing and Search Tests

use crate::*;
use planstore::{MemorySearchIndex, SearchIndex};

#[test]
fn test_list_returns_roots_only() {
    let fx = fixture();
    fx.service.create_plan(&sample_plan()).unwrap();
    fx.service
        .create_plan(&plan_with_services("plan-b", &["b1", "b2"]))
        .unwrap();

    let mut ids: Vec<String> = fx
        .service
        .list_plans()
        .unwrap()
        .into_iter()
        .map(|p| p.object_id)
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["12xvxc345ssdsds-508", "plan-b"]);
}

#[test]
fn test_list_skips_unreadable_records() {
    let fx = fixture();
    fx.service.create_plan(&sample_plan()).unwrap();
    fx.store.set("corrupt", "{not json".into(), None).unwrap();
    fx.store
        .set("array", "[1, 2, 3]".into(), None)
        .unwrap();

    assert_eq!(fx.service.list_plans().unwrap().len(), 1);
}

#[test]
fn test_list_excludes_plans_without_cost_shares() {
    let fx = fixture();
    let mut bare = plan_with_services("bare", &[]);
    bare.plan_cost_shares = None;
    fx.service.create_plan(&bare).unwrap();

    assert!(fx.service.plan_store().exists("bare").unwrap());
    assert!(fx.service.list_plans().unwrap().is_empty());
}

#[test]
fn test_list_honours_configured_pattern() {
    init_tracing();
    let config = PlanStoreConfig::from_toml_str("list_pattern = \"plan-*\"").unwrap();
    let service = PlanService::builder().config(config).build();

    service.create_plan(&plan_with_services("plan-a", &[])).unwrap();
    service.create_plan(&sample_plan()).unwrap();

    let plans = service.list_plans().unwrap();
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].object_id, "plan-a");
}

#[test]
fn test_list_on_empty_store() {
    let fx = fixture();
    assert!(fx.service.list_plans().unwrap().is_empty());
}

#[test]
fn test_search_passthrough() {
    init_tracing();
    let index = Arc::new(MemorySearchIndex::new("plans"));
    let service = PlanService::builder().search_index(index.clone()).build();

    let plan = sample_plan();
    service.create_plan(&plan).unwrap();
    index.index_plan(&plan).unwrap();

    let hits = service.search(&MatchQuery::new("name", "well baby")).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["objectId"], "12xvxc345ssdsds-508");

    assert!(service
        .search(&MatchQuery::new("name", "orthodontics"))
        .unwrap()
        .is_empty());
}

#[test]
fn test_search_query_body() {
    let body = MatchQuery::new("_org", "example.com").to_query_body();
    assert_eq!(body, json!({"query": {"match": {"_org": "example.com"}}}));
}
