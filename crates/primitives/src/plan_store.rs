//! PlanStore: decomposed plan storage primitive
//!
//! ## Design: STATELESS FACADE
//!
//! PlanStore holds only its collaborators: an `Arc<dyn KeyValueStore>`, an
//! `Arc<dyn ChangeNotifier>` and the record TTL. No caches, no locks, no
//! in-memory indexes. Every call reads what it needs from the store, so any
//! number of PlanStore instances over the same store are safe.
//!
//! ## Storage Layout
//!
//! A plan is written as one root record holding the full document plus one
//! record per embedded object, all keyed by `objectId` in a single flat
//! namespace (see [`crate::decompose`]). Every record carries the same TTL.
//!
//! ## Consistency
//!
//! Multi-record writes are sequential single-key writes. A failure part-way
//! leaves the earlier records in place; the error names the failing step.
//! Concurrent mutations of the same plan are not serialized here. Callers
//! that need lost-update protection go through fingerprint preconditions.
//!
//! ## Events
//!
//! After the writes of a create, patch or delete complete, one event is
//! published. A publish failure is returned to the caller; the writes stay.

use crate::batch::WriteBatch;
use crate::decompose::{
    cascade_keys, cost_shares_record, decompose, decompose_service, reassemble, root_record,
};
use crate::notify::{ChangeEvent, ChangeNotifier, Operation};
use planstore_core::{Error, ObjectKind, Plan, Result, StoredObject};
use planstore_storage::KeyValueStore;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

/// Default lifetime of every record written (7 hours)
pub const DEFAULT_RECORD_TTL: Duration = Duration::from_secs(7 * 60 * 60);

/// Plan storage primitive
///
/// # Example
///
/// ```
/// use planstore_primitives::{NoopNotifier, PlanStore};
/// use planstore_storage::MemoryStore;
/// use planstore_core::{CostShares, Plan};
/// use std::sync::Arc;
///
/// let plans = PlanStore::new(Arc::new(MemoryStore::new()), Arc::new(NoopNotifier));
/// let plan = Plan {
///     plan_cost_shares: Some(CostShares {
///         object_id: "cs1".into(),
///         object_type: "membercostshare".into(),
///         ..CostShares::default()
///     }),
///     object_id: "plan1".into(),
///     object_type: "plan".into(),
///     ..Plan::default()
/// };
///
/// plans.create(&plan).unwrap();
/// assert_eq!(plans.get_plan("plan1").unwrap(), plan);
/// assert!(plans.exists("cs1").unwrap());
/// ```
#[derive(Clone)]
pub struct PlanStore {
    store: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn ChangeNotifier>,
    ttl: Option<Duration>,
}

impl fmt::Debug for PlanStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlanStore").field("ttl", &self.ttl).finish()
    }
}

impl PlanStore {
    /// Create a plan store writing records with [`DEFAULT_RECORD_TTL`]
    ///
    /// # Arguments
    ///
    /// * `store` - Key-value backend
    /// * `notifier` - Sink for change events
    pub fn new(store: Arc<dyn KeyValueStore>, notifier: Arc<dyn ChangeNotifier>) -> Self {
        Self {
            store,
            notifier,
            ttl: Some(DEFAULT_RECORD_TTL),
        }
    }

    /// Override the record TTL (`None` keeps records until deleted)
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    /// TTL applied to every write
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Underlying key-value backend
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    // ========== Reads ==========

    /// Check if any record is stored under `object_id`
    pub fn exists(&self, object_id: &str) -> Result<bool> {
        Ok(self.store.get(object_id)?.is_some())
    }

    /// Read any stored object by id
    ///
    /// The record's `objectType` tag selects the returned variant.
    ///
    /// # Errors
    ///
    /// * `NotFound` - no record under `object_id`
    /// * `Serialization` - the record is not valid JSON of its tagged shape
    pub fn get(&self, object_id: &str) -> Result<StoredObject> {
        let raw = self
            .store
            .get(object_id)?
            .ok_or_else(|| Error::not_found(object_id))?;
        StoredObject::decode(&raw)
    }

    /// Read a root plan by id
    ///
    /// Returns the root record as stored, without consulting child records.
    ///
    /// # Errors
    ///
    /// `NotFound` if nothing is stored under `object_id` or the record there is
    /// a sub-object rather than a plan.
    pub fn get_plan(&self, object_id: &str) -> Result<Plan> {
        match self.get(object_id)? {
            StoredObject::Plan(plan) => Ok(plan),
            other => {
                debug!(key = %object_id, kind = %other.kind(), "record is not a plan");
                Err(Error::not_found(object_id))
            }
        }
    }

    /// Rebuild a plan from its independently stored records
    ///
    /// Each embedded object is replaced by the record stored under its id, so
    /// the result reflects child records even if the root copy is stale.
    ///
    /// # Errors
    ///
    /// `NotFound` if the root or any child record is missing.
    pub fn resolve(&self, object_id: &str) -> Result<Plan> {
        let plan = reassemble(object_id, |key| Ok(self.store.get(key)?))?;
        if ObjectKind::from_tag(&plan.object_type) != ObjectKind::Plan {
            return Err(Error::not_found(object_id));
        }
        Ok(plan)
    }

    /// List every stored root plan whose key matches `pattern`
    ///
    /// Best-effort: records that fail to decode, sub-object records and
    /// records that expire mid-scan are skipped.
    ///
    /// # Errors
    ///
    /// `StoreUnavailable` if listing keys or reading a record fails.
    pub fn list_plans(&self, pattern: &str) -> Result<Vec<Plan>> {
        let keys = self.store.keys(pattern)?;
        let mut plans = Vec::new();

        for key in keys {
            let Some(raw) = self.store.get(&key)? else {
                continue;
            };
            match serde_json::from_str::<Plan>(&raw) {
                Ok(plan) if plan.is_root_record() => plans.push(plan),
                Ok(_) => trace!(key = %key, "skipping non-root record"),
                Err(e) => warn!(key = %key, error = %e, "skipping unreadable record"),
            }
        }

        debug!(pattern = %pattern, count = plans.len(), "listed plans");
        Ok(plans)
    }

    // ========== Writes ==========

    /// Store a plan and every embedded object, then publish `create`
    ///
    /// Overwrites any records already under the same ids; the existence check
    /// belongs to the caller.
    ///
    /// # Errors
    ///
    /// * `MissingObjectId` - an object lacks an id (nothing is written)
    /// * `PartialWrite` - a write failed; lists the records already written
    /// * `NotificationFailed` - writes completed but the event was not published
    ///
    /// # Returns
    ///
    /// The plan as written.
    pub fn create(&self, plan: &Plan) -> Result<Plan> {
        let records = decompose(plan)?;
        let count = records.len();

        let mut batch = WriteBatch::new();
        batch.set_records(records);
        batch.execute(self.store.as_ref(), self.ttl)?;

        info!(plan = %plan.object_id, records = count, "plan created");
        self.publish(Operation::Create, plan)?;
        Ok(plan.clone())
    }

    /// Delete a plan and every record it references, then publish `delete`
    ///
    /// Records are removed root first, then cost shares, then each service
    /// entry with its service and cost shares. Children already gone are
    /// logged and skipped.
    ///
    /// # Returns
    ///
    /// The plan as it was before deletion (also the event payload).
    pub fn delete(&self, object_id: &str) -> Result<Plan> {
        let plan = self.get_plan(object_id)?;

        let mut batch = WriteBatch::new();
        for key in cascade_keys(&plan)? {
            batch.delete(key);
        }
        let report = batch.execute(self.store.as_ref(), self.ttl)?;

        if !report.missing.is_empty() {
            warn!(plan = %object_id, missing = ?report.missing, "cascade delete skipped absent records");
        }
        info!(plan = %object_id, records = report.applied, "plan deleted");

        self.publish(Operation::Delete, &plan)?;
        Ok(plan)
    }

    /// Merge a partial document into a stored plan
    ///
    /// # Merge Rules
    ///
    /// - `planCostShares` in the partial replaces the stored cost-share fields;
    ///   its id must equal the stored one. Adopted as-is if none is stored.
    /// - Each `linkedPlanServices` entry replaces the stored entry with the same
    ///   id, or is appended (in partial order) if none matches.
    /// - Non-empty `_org` and `creationDate` overwrite the stored values.
    /// - Everything absent from the partial is left alone.
    ///
    /// All identity checks run before the first write, so a rejected patch
    /// writes nothing.
    ///
    /// # Returns
    ///
    /// The merged plan, as now stored.
    ///
    /// # Errors
    ///
    /// * `NotFound` - no plan under `object_id`
    /// * `IdentityConflict` - the partial's plan or cost-shares id differs
    /// * `MissingObjectId` - a supplied service entry lacks an id
    pub fn patch(&self, object_id: &str, partial: &Plan) -> Result<Plan> {
        let mut merged = self.get_plan(object_id)?;

        if !partial.object_id.is_empty() && partial.object_id != merged.object_id {
            return Err(Error::IdentityConflict {
                relation: "plan",
                stored: merged.object_id,
                supplied: partial.object_id.clone(),
            });
        }

        let mut batch = WriteBatch::new();

        if let Some(supplied) = &partial.plan_cost_shares {
            match merged.plan_cost_shares.as_mut() {
                Some(stored) if stored.object_id != supplied.object_id => {
                    return Err(Error::IdentityConflict {
                        relation: "planCostShares",
                        stored: stored.object_id.clone(),
                        supplied: supplied.object_id.clone(),
                    });
                }
                Some(stored) => stored.update_from(supplied),
                None => merged.plan_cost_shares = Some(supplied.clone()),
            }
            if let Some(cs) = &merged.plan_cost_shares {
                batch.set_records([cost_shares_record(cs)?]);
            }
        }

        // Rebuilt per call from the stored entries
        let mut positions: HashMap<String, usize> = merged
            .linked_plan_services
            .iter()
            .enumerate()
            .map(|(i, lps)| (lps.object_id.clone(), i))
            .collect();

        for (i, incoming) in partial.linked_plan_services.iter().enumerate() {
            let records = decompose_service(i, incoming)?;
            match positions.get(&incoming.object_id) {
                Some(&pos) => merged.linked_plan_services[pos] = incoming.clone(),
                None => {
                    positions.insert(
                        incoming.object_id.clone(),
                        merged.linked_plan_services.len(),
                    );
                    merged.linked_plan_services.push(incoming.clone());
                }
            }
            batch.set_records(records);
        }

        if !partial.org.is_empty() {
            merged.org = partial.org.clone();
        }
        if !partial.creation_date.is_empty() {
            merged.creation_date = partial.creation_date.clone();
        }

        batch.set_records([root_record(&merged)?]);
        let writes = batch.len();
        batch.execute(self.store.as_ref(), self.ttl)?;

        info!(plan = %object_id, records = writes, "plan patched");
        self.publish(Operation::Patch, &merged)?;
        Ok(merged)
    }

    /// Replace a stored plan wholesale
    ///
    /// Deletes the old plan (publishing `delete`) and creates the new one
    /// (publishing `create`). Children the new document no longer references
    /// are removed. The new document is decomposed before anything is deleted,
    /// so a malformed replacement leaves the old plan intact.
    ///
    /// # Errors
    ///
    /// * `NotFound` - no plan under `object_id`
    /// * `IdentityConflict` - `plan.objectId` names a different plan
    ///
    /// # Returns
    ///
    /// The replacement plan as written.
    pub fn update(&self, object_id: &str, plan: &Plan) -> Result<Plan> {
        if !plan.object_id.is_empty() && plan.object_id != object_id {
            return Err(Error::IdentityConflict {
                relation: "plan",
                stored: object_id.to_string(),
                supplied: plan.object_id.clone(),
            });
        }
        decompose(plan)?;

        self.delete(object_id)?;
        self.create(plan)
    }

    fn publish(&self, operation: Operation, plan: &Plan) -> Result<()> {
        let event = ChangeEvent::new(operation, plan.clone());
        self.notifier.publish(&event).map_err(|e| {
            error!(operation = %operation, plan = %plan.object_id, error = %e, "failed to publish change");
            Error::from(e)
        })
    }
}
