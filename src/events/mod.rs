//! Change notifications emitted by the stores.
//!
//! An event is sent only after the mutation it describes has been durably
//! saved, so a subscriber (e.g. a publish scheduler) can reload from the
//! store and always see the new state.

use serde::Serialize;

use crate::model::{WorkflowId, WorkflowStatus};

/// Capacity of the store event queue; slow subscribers observe `Lagged`.
pub(crate) const EVENT_QUEUE_SIZE: usize = 256;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    WorkflowCreated {
        id: WorkflowId,
    },
    WorkflowUpdated {
        id: WorkflowId,
    },
    /// Only the ids that were actually present.
    WorkflowsDeleted {
        ids: Vec<WorkflowId>,
    },
    /// Only the ids that were actually present.
    WorkflowStatusChanged {
        ids: Vec<WorkflowId>,
        status: WorkflowStatus,
    },
    CredentialUpdated,
}
