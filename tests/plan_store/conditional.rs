//! Conditional Request Tests
//!
//! ETags are content fingerprints. If-None-Match short-circuits reads,
//! If-Match guards writes, and a rejected write changes nothing.

use crate::*;
use planstore::{Operation, UpsertOutcome};

fn create_sample(fx: &Fixture) -> ETag {
    fx.service.create_plan(&sample_plan()).unwrap().etag
}

const ROOT: &str = "12xvxc345ssdsds-508";

// =============================================================================
// READS
// =============================================================================

#[test]
fn test_etag_is_stable_across_reads() {
    let fx = fixture();
    let created = create_sample(&fx);

    for _ in 0..3 {
        let read = fx
            .service
            .get_object(ROOT, &Preconditions::none())
            .unwrap()
            .applied()
            .unwrap();
        assert_eq!(read.etag, created);
    }
}

#[test]
fn test_if_none_match_current_is_not_modified() {
    let fx = fixture();
    let etag = create_sample(&fx);

    let result = fx
        .service
        .get_object(ROOT, &Preconditions::none().if_none_match(etag.clone()))
        .unwrap();
    assert_eq!(result, Conditional::NotModified(etag));
}

#[test]
fn test_if_none_match_on_sub_object() {
    let fx = fixture();
    create_sample(&fx);

    let first = fx
        .service
        .get_object("1234520xvc30asdf-502", &Preconditions::none())
        .unwrap()
        .applied()
        .unwrap();
    let again = fx
        .service
        .get_object(
            "1234520xvc30asdf-502",
            &Preconditions::none().if_none_match(first.etag),
        )
        .unwrap();
    assert!(!again.is_applied());
}

#[test]
fn test_if_none_match_stale_returns_document() {
    let fx = fixture();
    let old = create_sample(&fx);

    let partial = Plan {
        creation_date: "01-01-2020".into(),
        ..Plan::default()
    };
    fx.service
        .patch_plan(ROOT, &partial, &Preconditions::none())
        .unwrap();

    let read = fx
        .service
        .get_object(ROOT, &Preconditions::none().if_none_match(old.clone()))
        .unwrap()
        .applied()
        .unwrap();
    assert_ne!(read.etag, old);
}

#[test]
fn test_quoted_header_tokens_match() {
    let fx = fixture();
    let etag = create_sample(&fx);

    let header = format!("\"{}\"", etag);
    let result = fx
        .service
        .get_object(ROOT, &Preconditions::from_headers(None, Some(&header)))
        .unwrap();
    assert!(!result.is_applied());
}

#[test]
fn test_get_stale_if_match_is_412() {
    let fx = fixture();
    create_sample(&fx);

    let err = fx
        .service
        .get_object(ROOT, &Preconditions::from_headers(Some("stale"), None))
        .unwrap_err();
    assert_eq!(err.status_code(), 412);
    assert_eq!(err.error_code(), "PreconditionFailed");
}

// =============================================================================
// WRITES
// =============================================================================

#[test]
fn test_stale_if_match_patch_writes_nothing() {
    let fx = fixture();
    create_sample(&fx);
    let before = snapshot(fx.store.as_ref());

    let partial = Plan {
        org: "other.org".into(),
        ..Plan::default()
    };
    let err = fx
        .service
        .patch_plan(ROOT, &partial, &Preconditions::from_headers(Some("stale"), None))
        .unwrap_err();

    assert_eq!(err.status_code(), 412);
    assert_eq!(snapshot(fx.store.as_ref()), before);
    assert_eq!(fx.notifier.operations(), vec![Operation::Create]);
}

#[test]
fn test_lost_update_is_prevented() {
    let fx = fixture();
    let etag = create_sample(&fx);

    // Two clients read the same version
    let alice = Preconditions::none().if_match(etag.clone());
    let bob = Preconditions::none().if_match(etag);

    let first = Plan {
        org: "alice.org".into(),
        ..Plan::default()
    };
    let patched = fx
        .service
        .patch_plan(ROOT, &first, &alice)
        .unwrap()
        .applied()
        .unwrap();

    let second = Plan {
        org: "bob.org".into(),
        ..Plan::default()
    };
    let err = fx.service.patch_plan(ROOT, &second, &bob).unwrap_err();
    match err {
        Error::PreconditionFailed { current } => assert_eq!(current, patched.etag),
        other => panic!("expected PreconditionFailed, got {:?}", other),
    }

    let stored = fx.service.plan_store().get_plan(ROOT).unwrap();
    assert_eq!(stored.org, "alice.org");
}

#[test]
fn test_patch_etag_matches_subsequent_read() {
    let fx = fixture();
    create_sample(&fx);

    let partial = Plan {
        creation_date: "01-01-2020".into(),
        ..Plan::default()
    };
    let patched = fx
        .service
        .patch_plan(ROOT, &partial, &Preconditions::none())
        .unwrap()
        .applied()
        .unwrap();
    let read = fx
        .service
        .get_object(ROOT, &Preconditions::none())
        .unwrap()
        .applied()
        .unwrap();
    assert_eq!(patched.etag, read.etag);
}

#[test]
fn test_delete_with_stale_token_is_rejected() {
    let fx = fixture();
    let etag = create_sample(&fx);

    let err = fx
        .service
        .delete_plan(ROOT, &Preconditions::from_headers(Some("stale"), None))
        .unwrap_err();
    assert_eq!(err.status_code(), 412);
    assert_eq!(fx.store.len(), SAMPLE_KEYS.len());

    let header = format!("W/\"{}\"", etag);
    fx.service
        .delete_plan(ROOT, &Preconditions::from_headers(Some(&header), None))
        .unwrap();
    assert!(fx.store.is_empty());
}

#[test]
fn test_if_match_star_requires_existing_plan() {
    let fx = fixture();
    let star = Preconditions::from_headers(Some("*"), None);

    assert!(fx.service.delete_plan(ROOT, &star).unwrap_err().is_not_found());
    create_sample(&fx);
    assert!(fx.service.delete_plan(ROOT, &star).unwrap().is_applied());
}

#[test]
fn test_create_twice_is_conflict() {
    let fx = fixture();
    create_sample(&fx);

    let err = fx.service.create_plan(&sample_plan()).unwrap_err();
    assert_eq!(err.status_code(), 409);
    assert_eq!(fx.notifier.operations(), vec![Operation::Create]);
}

#[test]
fn test_put_creates_then_replaces() {
    let fx = fixture();

    let created = fx
        .service
        .update_plan(&sample_plan(), &Preconditions::none())
        .unwrap()
        .applied()
        .unwrap();
    assert!(matches!(created, UpsertOutcome::Created(_)));

    let mut replacement = sample_plan();
    replacement.linked_plan_services.truncate(1);
    let replaced = fx
        .service
        .update_plan(
            &replacement,
            &Preconditions::none().if_match(created.etag().clone()),
        )
        .unwrap()
        .applied()
        .unwrap();
    assert!(!replaced.is_created());

    // Children the replacement dropped are gone
    assert!(!fx.store.contains("27283xvx9sdf-507"));
    assert!(!fx.store.contains("1234520xvc30sfs-505"));
    assert_eq!(fx.store.len(), 5);
}

#[test]
fn test_put_with_current_if_none_match_is_skipped() {
    let fx = fixture();
    let etag = create_sample(&fx);

    let result = fx
        .service
        .update_plan(&sample_plan(), &Preconditions::none().if_none_match(etag))
        .unwrap();
    assert!(!result.is_applied());
    assert_eq!(fx.notifier.operations(), vec![Operation::Create]);
}
