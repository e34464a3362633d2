//! Ordered multi-key writes
//!
//! A [`WriteBatch`] is the explicit, ordered list of key operations one plan
//! mutation performs. Execution runs the operations one by one against the
//! store. The store has no multi-key transactions, so a failure part-way leaves
//! the earlier operations applied; [`BatchFailure`] reports exactly which ones.

use crate::decompose::Record;
use planstore_storage::{KeyValueStore, StoreError};
use std::time::Duration;
use thiserror::Error;
use tracing::{trace, warn};

/// One key operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    /// Write `value` under `key`
    Set {
        /// Target key
        key: String,
        /// Serialized document
        value: String,
    },
    /// Remove `key`
    Delete {
        /// Target key
        key: String,
    },
}

impl BatchOp {
    /// Key this operation touches
    pub fn key(&self) -> &str {
        match self {
            BatchOp::Set { key, .. } | BatchOp::Delete { key } => key,
        }
    }
}

/// Ordered list of key operations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

/// What a completed batch did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Number of operations executed
    pub applied: usize,
    /// Deleted keys that were already absent
    pub missing: Vec<String>,
}

/// A batch that stopped part-way
#[derive(Debug, Error)]
#[error("write batch stopped at step {step} ('{key}') after {} applied: {source}", .applied.len())]
pub struct BatchFailure {
    /// Index of the failing operation
    pub step: usize,
    /// Key of the failing operation
    pub key: String,
    /// Operations that completed before the failure
    pub applied: Vec<BatchOp>,
    /// Store error that stopped the batch
    #[source]
    pub source: StoreError,
}

impl BatchFailure {
    /// Keys of the operations that completed, in order
    pub fn applied_keys(&self) -> Vec<String> {
        self.applied.iter().map(|op| op.key().to_string()).collect()
    }
}

impl From<BatchFailure> for planstore_core::Error {
    fn from(e: BatchFailure) -> Self {
        planstore_core::Error::PartialWrite {
            applied: e.applied_keys(),
            step: e.step,
            key: e.key,
            reason: e.source.to_string(),
        }
    }
}

impl WriteBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a write
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.ops.push(BatchOp::Set {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Append a delete
    pub fn delete(&mut self, key: impl Into<String>) -> &mut Self {
        self.ops.push(BatchOp::Delete { key: key.into() });
        self
    }

    /// Append a write per record, in record order
    pub fn set_records<I: IntoIterator<Item = Record>>(&mut self, records: I) -> &mut Self {
        for record in records {
            self.set(record.key, record.value);
        }
        self
    }

    /// Operations in execution order
    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    /// Number of operations
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Check if the batch is empty
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Run every operation in order
    ///
    /// Writes carry `ttl`. A delete of an absent key is not an error; it is
    /// logged and listed in [`BatchReport::missing`].
    ///
    /// # Errors
    ///
    /// [`BatchFailure`] at the first store error. Nothing after it runs and
    /// nothing before it is undone.
    pub fn execute(
        self,
        store: &dyn KeyValueStore,
        ttl: Option<Duration>,
    ) -> Result<BatchReport, BatchFailure> {
        let mut report = BatchReport::default();
        let mut applied: Vec<BatchOp> = Vec::with_capacity(self.ops.len());

        for (step, op) in self.ops.into_iter().enumerate() {
            let outcome = match &op {
                BatchOp::Set { key, value } => {
                    trace!(key = %key, "set");
                    store.set(key, value.clone(), ttl)
                }
                BatchOp::Delete { key } => {
                    trace!(key = %key, "delete");
                    store.delete(key).map(|removed| {
                        if removed == 0 {
                            warn!(key = %key, "delete found no record");
                            report.missing.push(key.clone());
                        }
                    })
                }
            };

            if let Err(source) = outcome {
                return Err(BatchFailure {
                    step,
                    key: op.key().to_string(),
                    applied,
                    source,
                });
            }
            applied.push(op);
        }

        report.applied = applied.len();
        Ok(report)
    }
}
