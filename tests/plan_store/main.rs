//! Plan Store Integration Test Suite
//!
//! Exercises the full stack (service -> plan store -> key-value store ->
//! notifier) through the public `planstore` API.
//!
//! ## Key Verification Points
//!
//! 1. Every embedded object is stored and addressable under its own id
//! 2. Deletes cascade to every record a plan references
//! 3. Patch merges by id and rejects identity conflicts without writing
//! 4. ETags follow content; stale tokens never mutate
//! 5. Partial failures leave exactly the records written before the failure
//! 6. Operations on different plans run in parallel without interference
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test plan_store
//!
//! # Conditional request tests only
//! cargo test --test plan_store conditional::
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use parking_lot::Mutex;
use planstore::prelude::*;
use planstore::{KeyValueStore, MemoryStore, RecordingNotifier, StoreError, StoreResult};

pub mod conditional;
pub mod listing;
pub mod patch;

// =============================================================================
// SHARED TEST UTILITIES
// =============================================================================

static TRACING: Once = Once::new();

/// Route tracing output through the test harness
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// Service plus handles on its store and notifier
pub struct Fixture {
    pub service: PlanService,
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
}

/// Create a service over an in-memory store with a recording notifier
pub fn fixture() -> Fixture {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let service = PlanService::builder()
        .store(store.clone())
        .notifier(notifier.clone())
        .build();
    Fixture {
        service,
        store,
        notifier,
    }
}

/// Create a service over an arbitrary key-value store
pub fn service_over(store: Arc<dyn KeyValueStore>) -> (PlanService, Arc<RecordingNotifier>) {
    init_tracing();
    let notifier = Arc::new(RecordingNotifier::new());
    let service = PlanService::builder()
        .store(store)
        .notifier(notifier.clone())
        .build();
    (service, notifier)
}

/// The reference client document
pub fn sample_plan() -> Plan {
    serde_json::from_value(json!({
        "planCostShares": {
            "deductible": 2000,
            "_org": "example.com",
            "copay": 23,
            "objectId": "1234vxc2324sdf-501",
            "objectType": "membercostshare"
        },
        "linkedPlanServices": [
            {
                "linkedService": {
                    "_org": "example.com",
                    "objectId": "1234520xvc30asdf-502",
                    "objectType": "service",
                    "name": "Yearly physical"
                },
                "planserviceCostShares": {
                    "deductible": 10,
                    "_org": "example.com",
                    "copay": 0,
                    "objectId": "1234512xvc1314asdfs-503",
                    "objectType": "membercostshare"
                },
                "_org": "example.com",
                "objectId": "27283xvx9asdff-504",
                "objectType": "planservice"
            },
            {
                "linkedService": {
                    "_org": "example.com",
                    "objectId": "1234520xvc30sfs-505",
                    "objectType": "service",
                    "name": "well baby"
                },
                "planserviceCostShares": {
                    "deductible": 10,
                    "_org": "example.com",
                    "copay": 175,
                    "objectId": "1234512xvc1314sdfsd-506",
                    "objectType": "membercostshare"
                },
                "_org": "example.com",
                "objectId": "27283xvx9sdf-507",
                "objectType": "planservice"
            }
        ],
        "_org": "example.com",
        "objectId": "12xvxc345ssdsds-508",
        "objectType": "plan",
        "planType": "inNetwork",
        "creationDate": "12-12-2017"
    }))
    .expect("sample plan decodes")
}

/// Every key the sample plan occupies
pub const SAMPLE_KEYS: [&str; 8] = [
    "12xvxc345ssdsds-508",
    "1234vxc2324sdf-501",
    "27283xvx9asdff-504",
    "1234520xvc30asdf-502",
    "1234512xvc1314asdfs-503",
    "27283xvx9sdf-507",
    "1234520xvc30sfs-505",
    "1234512xvc1314sdfsd-506",
];

/// A linked plan service whose child ids derive from `id`
pub fn service_entry(id: &str, name: &str) -> LinkedPlanService {
    LinkedPlanService {
        linked_service: LinkedService {
            name: name.to_string(),
            object_id: format!("{}-ls", id),
            object_type: "service".into(),
            org: "example.com".into(),
            plan_join: None,
        },
        plan_service_cost_shares: cost_shares(&format!("{}-cs", id), 10),
        object_id: id.to_string(),
        object_type: "planservice".into(),
        org: "example.com".into(),
        plan_join: None,
    }
}

/// Cost shares with the given id and deductible
pub fn cost_shares(id: &str, deductible: i64) -> CostShares {
    CostShares {
        deductible,
        copay: 23,
        object_id: id.to_string(),
        object_type: "membercostshare".into(),
        org: "example.com".into(),
        plan_join: None,
    }
}

/// A plan with the given id and service entries
pub fn plan_with_services(id: &str, services: &[&str]) -> Plan {
    Plan {
        plan_cost_shares: Some(cost_shares(&format!("{}-cs", id), 2000)),
        linked_plan_services: services
            .iter()
            .map(|s| service_entry(s, "Yearly physical"))
            .collect(),
        creation_date: "12-12-2017".into(),
        object_id: id.to_string(),
        object_type: "plan".into(),
        org: "example.com".into(),
        plan_join: None,
    }
}

/// Every key/value pair in the store, sorted by key
pub fn snapshot(store: &dyn KeyValueStore) -> Vec<(String, Option<String>)> {
    store
        .keys("*")
        .unwrap()
        .into_iter()
        .map(|k| {
            let v = store.get(&k).unwrap();
            (k, v)
        })
        .collect()
}

// =============================================================================
// FAILURE INJECTION
// =============================================================================

/// Key-value store that starts failing mutations on demand
///
/// Reads and listing always pass through. Mutations fail once the budget set
/// by [`FailingStore::fail_after`] is spent, or when they touch a poisoned key.
pub struct FailingStore {
    inner: MemoryStore,
    budget: Mutex<Option<usize>>,
    poisoned: Mutex<Vec<String>>,
    mutations: AtomicUsize,
}

impl FailingStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            budget: Mutex::new(None),
            poisoned: Mutex::new(Vec::new()),
            mutations: AtomicUsize::new(0),
        }
    }

    /// Allow `n` more successful mutations, then fail every one after
    pub fn fail_after(&self, n: usize) {
        *self.budget.lock() = Some(n);
    }

    /// Fail every mutation of `key`
    pub fn poison(&self, key: &str) {
        self.poisoned.lock().push(key.to_string());
    }

    /// Stop injecting failures
    pub fn heal(&self) {
        *self.budget.lock() = None;
        self.poisoned.lock().clear();
    }

    /// Number of successful mutations so far
    pub fn mutations(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    fn gate(&self, op: &'static str, key: &str) -> StoreResult<()> {
        if self.poisoned.lock().iter().any(|k| k == key) {
            return Err(StoreError::unavailable(op, key, "injected failure"));
        }
        let mut budget = self.budget.lock();
        if let Some(remaining) = budget.as_mut() {
            if *remaining == 0 {
                return Err(StoreError::unavailable(op, key, "injected failure"));
            }
            *remaining -= 1;
        }
        self.mutations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl KeyValueStore for FailingStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> StoreResult<()> {
        self.gate("set", key)?;
        self.inner.set(key, value, ttl)
    }

    fn delete(&self, key: &str) -> StoreResult<u64> {
        self.gate("delete", key)?;
        self.inner.delete(key)
    }

    fn keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        self.inner.keys(pattern)
    }
}
