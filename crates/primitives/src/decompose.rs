//! Document decomposition
//!
//! Splits a [`Plan`] into one flat record per addressable object, keyed by
//! the object's own `objectId`, and puts a plan back together from those
//! records. Pure functions; the only I/O is through the caller's fetch closure
//! in [`reassemble`].
//!
//! ## Record Order
//!
//! ```text
//! plan
//! planCostShares
//! linkedPlanServices[0]
//! linkedPlanServices[0].linkedService
//! linkedPlanServices[0].planserviceCostShares
//! linkedPlanServices[1]
//! ...
//! ```
//!
//! Cascading deletes visit keys in the same order.

use planstore_core::{CostShares, Error, LinkedPlanService, ObjectKind, Plan, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// One flat record produced by decomposition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Store key (the object's `objectId`)
    pub key: String,
    /// Relationship of the object within its plan
    pub kind: ObjectKind,
    /// Serialized object
    pub value: String,
}

fn record<T: Serialize>(path: &str, id: &str, kind: ObjectKind, doc: &T) -> Result<Record> {
    if id.is_empty() {
        return Err(Error::MissingObjectId {
            path: path.to_string(),
        });
    }
    Ok(Record {
        key: id.to_string(),
        kind,
        value: serde_json::to_string(doc)?,
    })
}

/// Decompose a plan into its ordered flat records
///
/// The root record holds the whole document; every embedded object is also
/// emitted on its own. A plan without cost shares emits no cost-shares record.
///
/// # Errors
///
/// `MissingObjectId` if any emitted object has an empty `objectId`.
pub fn decompose(plan: &Plan) -> Result<Vec<Record>> {
    let mut records = Vec::with_capacity(2 + 3 * plan.linked_plan_services.len());

    records.push(root_record(plan)?);

    if let Some(cs) = &plan.plan_cost_shares {
        records.push(cost_shares_record(cs)?);
    }

    for (i, lps) in plan.linked_plan_services.iter().enumerate() {
        records.extend(decompose_service(i, lps)?);
    }

    Ok(records)
}

/// The root record alone
pub fn root_record(plan: &Plan) -> Result<Record> {
    record("plan", &plan.object_id, ObjectKind::Plan, plan)
}

/// The plan-level cost shares record
pub fn cost_shares_record(cs: &CostShares) -> Result<Record> {
    record("planCostShares", &cs.object_id, ObjectKind::PlanCostShares, cs)
}

/// Records for one linked plan service: the entry, its service, its cost shares
pub fn decompose_service(index: usize, lps: &LinkedPlanService) -> Result<[Record; 3]> {
    let base = format!("linkedPlanServices[{}]", index);
    Ok([
        record(&base, &lps.object_id, ObjectKind::LinkedPlanService, lps)?,
        record(
            &format!("{}.linkedService", base),
            &lps.linked_service.object_id,
            ObjectKind::LinkedService,
            &lps.linked_service,
        )?,
        record(
            &format!("{}.planserviceCostShares", base),
            &lps.plan_service_cost_shares.object_id,
            ObjectKind::PlanServiceCostShares,
            &lps.plan_service_cost_shares,
        )?,
    ])
}

/// Keys a cascading delete of `plan` removes, in deletion order
pub fn cascade_keys(plan: &Plan) -> Result<Vec<String>> {
    Ok(decompose(plan)?.into_iter().map(|r| r.key).collect())
}

/// Rebuild a plan from its independently stored records
///
/// Loads the root record at `root_key`, then replaces every embedded object
/// with the record stored under that object's id.
///
/// # Errors
///
/// * `NotFound` - the root or any referenced record is absent
/// * `Serialization` - a record does not decode to the expected shape
pub fn reassemble<F>(root_key: &str, mut fetch: F) -> Result<Plan>
where
    F: FnMut(&str) -> Result<Option<String>>,
{
    let mut plan: Plan = load(&mut fetch, root_key)?;

    if let Some(cs) = plan.plan_cost_shares.as_mut() {
        let id = cs.object_id.clone();
        *cs = load(&mut fetch, &id)?;
    }

    for lps in plan.linked_plan_services.iter_mut() {
        let id = lps.object_id.clone();
        *lps = load(&mut fetch, &id)?;

        let service_id = lps.linked_service.object_id.clone();
        lps.linked_service = load(&mut fetch, &service_id)?;

        let cost_shares_id = lps.plan_service_cost_shares.object_id.clone();
        lps.plan_service_cost_shares = load(&mut fetch, &cost_shares_id)?;
    }

    Ok(plan)
}

fn load<T, F>(fetch: &mut F, key: &str) -> Result<T>
where
    T: DeserializeOwned,
    F: FnMut(&str) -> Result<Option<String>>,
{
    let raw = fetch(key)?.ok_or_else(|| Error::not_found(key))?;
    Ok(serde_json::from_str(&raw)?)
}
