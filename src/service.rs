//! Plan service: the conditional-request layer a transport calls.
//!
//! This module provides [`PlanService`], the entry point for every plan
//! operation, and [`PlanStoreBuilder`] for assembling one.

use crate::config::PlanStoreConfig;
use crate::types::{UpsertOutcome, Versioned};
use planstore_concurrency::{Conditional, Evaluation, Preconditions};
use planstore_core::{Error, Plan, Result, StoredObject};
use planstore_primitives::{ChangeNotifier, ChannelNotifier, NoopNotifier, PlanStore};
use planstore_search::{MatchQuery, MemorySearchIndex, SearchIndex};
use planstore_storage::{KeyValueStore, MemoryStore};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

/// The plan service.
///
/// Wraps a [`PlanStore`] with request validation, existence checks and
/// `If-Match` / `If-None-Match` evaluation. Every successful read or write
/// returns the fingerprint of the document involved.
///
/// Preconditions are evaluated against the document currently stored, then
/// the operation runs. Nothing is locked in between: two writers holding the
/// same fingerprint can both pass their checks.
///
/// # Example
///
/// ```
/// use planstore::prelude::*;
///
/// let service = PlanService::in_memory();
/// let plan: Plan = serde_json::from_value(json!({
///     "planCostShares": {"deductible": 2000, "_org": "example.com", "copay": 23,
///                        "objectId": "cs1", "objectType": "membercostshare"},
///     "_org": "example.com",
///     "objectId": "plan1",
///     "objectType": "plan",
///     "creationDate": "12-12-2017"
/// })).unwrap();
///
/// let created = service.create_plan(&plan).unwrap();
///
/// // A client that already holds this version gets NotModified
/// let read = service
///     .get_object("plan1", &Preconditions::none().if_none_match(created.etag.clone()))
///     .unwrap();
/// assert!(!read.is_applied());
/// ```
#[derive(Clone)]
pub struct PlanService {
    plans: PlanStore,
    search: Arc<dyn SearchIndex>,
    config: PlanStoreConfig,
}

impl fmt::Debug for PlanService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlanService")
            .field("plans", &self.plans)
            .field("config", &self.config)
            .finish()
    }
}

impl PlanService {
    /// Create a builder.
    pub fn builder() -> PlanStoreBuilder {
        PlanStoreBuilder::new()
    }

    /// Create a service over fresh in-memory collaborators with default config.
    ///
    /// Events are dropped; the search index starts empty.
    pub fn in_memory() -> Self {
        PlanStoreBuilder::new().build()
    }

    /// The underlying plan store.
    pub fn plan_store(&self) -> &PlanStore {
        &self.plans
    }

    /// The search index queried by [`PlanService::search`].
    pub fn search_index(&self) -> &Arc<dyn SearchIndex> {
        &self.search
    }

    /// Active configuration.
    pub fn config(&self) -> &PlanStoreConfig {
        &self.config
    }

    /// Read any stored object by id.
    ///
    /// # Returns
    ///
    /// * `Applied(versioned)` - the object and its fingerprint
    /// * `NotModified(etag)` - If-None-Match names the current version
    ///
    /// # Errors
    ///
    /// * `NotFound` - nothing stored under `object_id`
    /// * `PreconditionFailed` - If-Match names another version
    pub fn get_object(
        &self,
        object_id: &str,
        preconditions: &Preconditions,
    ) -> Result<Conditional<Versioned<StoredObject>>> {
        let object = self.plans.get(object_id)?;
        let (etag, evaluation) = preconditions.check(&object)?;

        Ok(match evaluation {
            Evaluation::NotModified => Conditional::NotModified(etag),
            Evaluation::Proceed => Conditional::Applied(Versioned {
                value: object,
                etag,
            }),
        })
    }

    /// Create a new plan.
    ///
    /// # Errors
    ///
    /// * `InvalidDocument` - a required field is missing
    /// * `AlreadyExists` - a record is already stored under `plan.objectId`
    pub fn create_plan(&self, plan: &Plan) -> Result<Versioned<Plan>> {
        plan.validate()?;

        if self.plans.exists(&plan.object_id)? {
            debug!(plan = %plan.object_id, "create rejected, id in use");
            return Err(Error::AlreadyExists {
                key: plan.object_id.clone(),
            });
        }

        Versioned::new(self.plans.create(plan)?)
    }

    /// Replace a plan wholesale, creating it if absent (PUT).
    ///
    /// Preconditions apply only when a plan already exists.
    ///
    /// # Errors
    ///
    /// * `InvalidDocument` - a required field is missing
    /// * `AlreadyExists` - the id belongs to a sub-object, not a plan
    /// * `PreconditionFailed` - If-Match names another version
    pub fn update_plan(
        &self,
        plan: &Plan,
        preconditions: &Preconditions,
    ) -> Result<Conditional<UpsertOutcome>> {
        plan.validate()?;
        let object_id = plan.object_id.as_str();

        let existing = match self.plans.get(object_id) {
            Ok(StoredObject::Plan(existing)) => existing,
            Ok(other) => {
                debug!(key = %object_id, kind = %other.kind(), "update rejected, id in use");
                return Err(Error::AlreadyExists {
                    key: object_id.to_string(),
                });
            }
            Err(e) if e.is_not_found() => {
                let created = self.plans.create(plan)?;
                info!(plan = %object_id, "plan created by update");
                return Ok(Conditional::Applied(UpsertOutcome::Created(Versioned::new(
                    created,
                )?)));
            }
            Err(e) => return Err(e),
        };

        let (etag, evaluation) = preconditions.check(&existing)?;
        if evaluation == Evaluation::NotModified {
            return Ok(Conditional::NotModified(etag));
        }

        let replaced = self.plans.update(object_id, plan)?;
        Ok(Conditional::Applied(UpsertOutcome::Replaced(Versioned::new(
            replaced,
        )?)))
    }

    /// Merge a partial document into a stored plan.
    ///
    /// # Returns
    ///
    /// * `Applied(versioned)` - the merged plan and its new fingerprint
    /// * `NotModified(etag)` - If-None-Match names the current version
    ///
    /// # Errors
    ///
    /// * `NotFound` - no plan under `object_id`
    /// * `PreconditionFailed` - If-Match names another version
    /// * `IdentityConflict` - the partial names a different plan or cost shares
    pub fn patch_plan(
        &self,
        object_id: &str,
        partial: &Plan,
        preconditions: &Preconditions,
    ) -> Result<Conditional<Versioned<Plan>>> {
        let existing = self.plans.get_plan(object_id)?;
        let (etag, evaluation) = preconditions.check(&existing)?;
        if evaluation == Evaluation::NotModified {
            return Ok(Conditional::NotModified(etag));
        }

        let merged = self.plans.patch(object_id, partial)?;
        Ok(Conditional::Applied(Versioned::new(merged)?))
    }

    /// Delete a plan and everything it references.
    ///
    /// # Returns
    ///
    /// * `Applied(plan)` - the plan as it was before deletion
    /// * `NotModified(etag)` - If-None-Match names the current version
    ///
    /// # Errors
    ///
    /// * `NotFound` - no plan under `object_id`
    /// * `PreconditionFailed` - If-Match names another version
    pub fn delete_plan(
        &self,
        object_id: &str,
        preconditions: &Preconditions,
    ) -> Result<Conditional<Plan>> {
        let existing = self.plans.get_plan(object_id)?;
        let (etag, evaluation) = preconditions.check(&existing)?;
        if evaluation == Evaluation::NotModified {
            return Ok(Conditional::NotModified(etag));
        }

        Ok(Conditional::Applied(self.plans.delete(object_id)?))
    }

    /// Every stored plan matching the configured list pattern.
    pub fn list_plans(&self) -> Result<Vec<Plan>> {
        self.plans.list_plans(&self.config.list_pattern)
    }

    /// Run a field/value match query against the search index.
    pub fn search(&self, query: &MatchQuery) -> Result<Vec<Value>> {
        debug!(index = %self.config.search_index, key = %query.key, "search");
        Ok(self.search.search(query)?)
    }
}

/// Builder for a [`PlanService`].
///
/// Collaborators not supplied fall back to in-process defaults:
/// [`MemoryStore`], [`NoopNotifier`] and a [`MemorySearchIndex`] named after
/// the configured index.
///
/// # Example
///
/// ```
/// use planstore::prelude::*;
///
/// let config = PlanStoreConfig::from_toml_str("ttl_secs = 0").unwrap();
/// let (builder, mut events) = PlanService::builder().config(config).channel_notifier();
/// let service = builder.build();
///
/// assert_eq!(service.plan_store().ttl(), None);
/// assert!(events.try_recv().is_err());
/// ```
#[derive(Default)]
pub struct PlanStoreBuilder {
    config: PlanStoreConfig,
    store: Option<Arc<dyn KeyValueStore>>,
    notifier: Option<Arc<dyn ChangeNotifier>>,
    search: Option<Arc<dyn SearchIndex>>,
}

impl PlanStoreBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this configuration.
    pub fn config(mut self, config: PlanStoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Use this key-value store.
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Publish change events to this notifier.
    pub fn notifier(mut self, notifier: Arc<dyn ChangeNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Publish change events on a channel named after the configured topic.
    ///
    /// Returns the receiving half; each message is one JSON-encoded event.
    /// Set the config first, the topic is read here.
    pub fn channel_notifier(self) -> (Self, UnboundedReceiver<String>) {
        let (notifier, receiver) = ChannelNotifier::new(self.config.topic.clone());
        (self.notifier(Arc::new(notifier)), receiver)
    }

    /// Query this search index.
    pub fn search_index(mut self, search: Arc<dyn SearchIndex>) -> Self {
        self.search = Some(search);
        self
    }

    /// Assemble the service.
    pub fn build(self) -> PlanService {
        let store: Arc<dyn KeyValueStore> = match self.store {
            Some(store) => store,
            None => Arc::new(MemoryStore::new()),
        };
        let notifier: Arc<dyn ChangeNotifier> = match self.notifier {
            Some(notifier) => notifier,
            None => Arc::new(NoopNotifier),
        };
        let search: Arc<dyn SearchIndex> = match self.search {
            Some(search) => search,
            None => Arc::new(MemorySearchIndex::new(self.config.search_index.clone())),
        };

        let plans = PlanStore::new(store, notifier).with_ttl(self.config.ttl());
        debug!(ttl = ?plans.ttl(), topic = %self.config.topic, "plan service built");

        PlanService {
            plans,
            search,
            config: self.config,
        }
    }
}
