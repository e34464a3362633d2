//! Patch Merge Tests
//!
//! Service entries merge by id, cost shares are identity-checked, and a
//! rejected patch leaves the store untouched.

use crate::*;
use planstore::Operation;

const ROOT: &str = "12xvxc345ssdsds-508";

fn patch(fx: &Fixture, partial: &Plan) -> Result<Plan> {
    fx.service
        .patch_plan(ROOT, partial, &Preconditions::none())
        .map(|c| c.applied().expect("no preconditions").value)
}

// =============================================================================
// MERGE
// =============================================================================

#[test]
fn test_patch_with_only_object_id_is_identity() {
    let fx = fixture();
    let created = fx.service.create_plan(&sample_plan()).unwrap();

    let partial = Plan {
        object_id: ROOT.into(),
        ..Plan::default()
    };
    let merged = fx
        .service
        .patch_plan(ROOT, &partial, &Preconditions::none())
        .unwrap()
        .applied()
        .unwrap();

    assert_eq!(merged.value, sample_plan());
    assert_eq!(merged.etag, created.etag);
}

#[test]
fn test_patch_appends_new_service_entry() {
    let fx = fixture();
    fx.service.create_plan(&sample_plan()).unwrap();

    let partial = Plan {
        linked_plan_services: vec![service_entry("lps-new", "Dental cleaning")],
        ..Plan::default()
    };
    let merged = patch(&fx, &partial).unwrap();

    assert_eq!(merged.linked_plan_services.len(), 3);
    assert_eq!(merged.linked_plan_services[2].object_id, "lps-new");
    for key in ["lps-new", "lps-new-ls", "lps-new-cs"] {
        assert!(fx.store.contains(key), "missing {}", key);
    }
}

#[test]
fn test_successive_patches_keep_both_entries() {
    let fx = fixture();
    fx.service
        .create_plan(&plan_with_services(ROOT, &[]))
        .unwrap();

    for id in ["lps1", "lps2"] {
        let partial = Plan {
            linked_plan_services: vec![service_entry(id, "svc")],
            ..Plan::default()
        };
        patch(&fx, &partial).unwrap();
    }

    let stored = fx.service.plan_store().get_plan(ROOT).unwrap();
    let ids: Vec<&str> = stored
        .linked_plan_services
        .iter()
        .map(|l| l.object_id.as_str())
        .collect();
    assert_eq!(ids, vec!["lps1", "lps2"]);
}

#[test]
fn test_patch_replaces_entry_with_same_id() {
    let fx = fixture();
    fx.service.create_plan(&sample_plan()).unwrap();

    let mut entry = sample_plan().linked_plan_services[0].clone();
    entry.linked_service.name = "Annual physical".into();
    entry.plan_service_cost_shares.copay = 50;
    let partial = Plan {
        linked_plan_services: vec![entry],
        ..Plan::default()
    };
    let merged = patch(&fx, &partial).unwrap();

    assert_eq!(merged.linked_plan_services.len(), 2);
    assert_eq!(merged.linked_plan_services[0].linked_service.name, "Annual physical");

    match fx.service.plan_store().get("1234512xvc1314asdfs-503").unwrap() {
        StoredObject::PlanCostShares(cs) => assert_eq!(cs.copay, 50),
        other => panic!("expected cost shares, got {:?}", other),
    }
    assert_eq!(fx.service.plan_store().resolve(ROOT).unwrap(), merged);
}

#[test]
fn test_patch_updates_cost_shares_in_place() {
    let fx = fixture();
    fx.service.create_plan(&sample_plan()).unwrap();

    let partial = Plan {
        plan_cost_shares: Some(cost_shares("1234vxc2324sdf-501", 3000)),
        ..Plan::default()
    };
    let merged = patch(&fx, &partial).unwrap();
    assert_eq!(merged.plan_cost_shares.as_ref().unwrap().deductible, 3000);

    match fx.service.plan_store().get("1234vxc2324sdf-501").unwrap() {
        StoredObject::PlanCostShares(cs) => assert_eq!(cs.deductible, 3000),
        other => panic!("expected cost shares, got {:?}", other),
    }
}

#[test]
fn test_patch_event_carries_merged_plan() {
    let fx = fixture();
    fx.service.create_plan(&sample_plan()).unwrap();

    let partial = Plan {
        org: "other.org".into(),
        ..Plan::default()
    };
    let merged = patch(&fx, &partial).unwrap();

    let events = fx.notifier.events();
    assert_eq!(events.last().unwrap().operation, Operation::Patch);
    assert_eq!(events.last().unwrap().plan, merged);
}

// =============================================================================
// IDENTITY CONFLICTS
// =============================================================================

#[test]
fn test_cost_shares_conflict_writes_nothing() {
    let fx = fixture();
    fx.service.create_plan(&sample_plan()).unwrap();
    let before = snapshot(fx.store.as_ref());

    let partial = Plan {
        plan_cost_shares: Some(cost_shares("someone-else", 1)),
        linked_plan_services: vec![service_entry("lps-new", "svc")],
        org: "other.org".into(),
        ..Plan::default()
    };
    let err = patch(&fx, &partial).unwrap_err();

    assert_eq!(err.status_code(), 400);
    assert!(err.to_string().contains("objectId mismatch"));
    assert_eq!(snapshot(fx.store.as_ref()), before);
    assert_eq!(fx.notifier.operations(), vec![Operation::Create]);
}

#[test]
fn test_plan_id_conflict() {
    let fx = fixture();
    fx.service.create_plan(&sample_plan()).unwrap();

    let partial = Plan {
        object_id: "another-plan".into(),
        ..Plan::default()
    };
    match patch(&fx, &partial) {
        Err(Error::IdentityConflict { relation, .. }) => assert_eq!(relation, "plan"),
        other => panic!("expected IdentityConflict, got {:?}", other),
    }
}

#[test]
fn test_patch_missing_plan() {
    let fx = fixture();
    let err = patch(&fx, &Plan::default()).unwrap_err();
    assert_eq!(err.status_code(), 404);
}
