//! Per-owner generation workspace.
//!
//! Each `(company, report_type, owner)` owns one slot. A slot holds the
//! observable [`GenerationState`] and, behind an async mutex, the last
//! successfully materialized statement. Generations hold the mutex for their
//! whole run, so readers of the same slot see either the previous result or
//! the new one, never a partial one. The lock is owned by the generation
//! task rather than by its caller, so a caller that goes away does not leave
//! the slot half-built.

use std::sync::Arc;

use balanza_shared::types::GenerationId;
use chrono::NaiveDate;
use dashmap::DashMap;
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard, watch};

use super::types::{
    FamilyBalance, GenerationState, GenerationSummary, GroupResolution, PositionResult,
    ReportScope, StatementDocument,
};

/// Identifies a workspace slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkspaceKey {
    /// Company schema.
    pub company: String,
    /// Balance-sheet variant.
    pub report_type: String,
    /// Requesting identity.
    pub owner: String,
}

impl WorkspaceKey {
    /// Key of `owner`'s slot for `scope`.
    #[must_use]
    pub fn new(scope: &ReportScope, owner: &str) -> Self {
        Self {
            company: scope.company.clone(),
            report_type: scope.report_type.clone(),
            owner: owner.to_string(),
        }
    }
}

/// Output of one successful generation.
#[derive(Debug, Clone)]
pub struct MaterializedStatement {
    /// Generation run.
    pub generation_id: GenerationId,
    /// Scope that was generated.
    pub scope: ReportScope,
    /// Requesting identity.
    pub owner: String,
    /// Report date.
    pub as_of: NaiveDate,
    /// Comparison date.
    pub prior_as_of: NaiveDate,
    /// Movements collected for the report date.
    pub current_movements: usize,
    /// Movements collected for the comparison date.
    pub prior_movements: usize,
    /// Unsigned family totals.
    pub balances: Vec<FamilyBalance>,
    /// Exception group outcomes.
    pub groups: Vec<GroupResolution>,
    /// Rows in display order.
    pub rows: Vec<PositionResult>,
}

impl MaterializedStatement {
    /// Summary returned to the caller of a generation.
    #[must_use]
    pub fn summary(&self) -> GenerationSummary {
        GenerationSummary {
            generation_id: self.generation_id,
            as_of: self.as_of,
            prior_as_of: self.prior_as_of,
            current_movements: self.current_movements,
            prior_movements: self.prior_movements,
            rows: self.rows.len(),
            groups: self.groups.clone(),
        }
    }

    /// Document handed to renderers.
    #[must_use]
    pub fn document(&self) -> StatementDocument {
        StatementDocument {
            scope: self.scope.clone(),
            owner: self.owner.clone(),
            as_of: self.as_of,
            prior_as_of: self.prior_as_of,
            rows: self.rows.clone(),
        }
    }
}

/// One owner's workspace.
#[derive(Debug)]
pub struct WorkspaceSlot {
    state: watch::Sender<GenerationState>,
    result: Arc<Mutex<Option<Arc<MaterializedStatement>>>>,
}

impl Default for WorkspaceSlot {
    fn default() -> Self {
        Self {
            state: watch::Sender::new(GenerationState::Pending),
            result: Arc::new(Mutex::new(None)),
        }
    }
}

impl WorkspaceSlot {
    /// Current state.
    #[must_use]
    pub fn state(&self) -> GenerationState {
        *self.state.borrow()
    }

    /// Records a state transition.
    pub fn set_state(&self, state: GenerationState) {
        self.state.send_replace(state);
    }

    /// Receiver that observes every state transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<GenerationState> {
        self.state.subscribe()
    }

    /// Waits for exclusive access to the slot's result.
    pub async fn lock(&self) -> MutexGuard<'_, Option<Arc<MaterializedStatement>>> {
        self.result.lock().await
    }

    /// Waits for exclusive access, returning a guard that can move into a task.
    pub async fn lock_owned(&self) -> OwnedMutexGuard<Option<Arc<MaterializedStatement>>> {
        Arc::clone(&self.result).lock_owned().await
    }
}

/// Registry of workspace slots.
#[derive(Debug, Default)]
pub struct WorkspaceStore {
    slots: DashMap<WorkspaceKey, Arc<WorkspaceSlot>>,
}

impl WorkspaceStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot for `key`, created on first use.
    #[must_use]
    pub fn slot(&self, key: &WorkspaceKey) -> Arc<WorkspaceSlot> {
        if let Some(slot) = self.slots.get(key) {
            return Arc::clone(&slot);
        }
        Arc::clone(&self.slots.entry(key.clone()).or_default())
    }

    /// Slot for `key`, if one was ever created.
    #[must_use]
    pub fn get(&self, key: &WorkspaceKey) -> Option<Arc<WorkspaceSlot>> {
        self.slots.get(key).map(|slot| Arc::clone(&slot))
    }

    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` when no slot exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
