//! Notifications that data changed in some execution context.
//!
//! These are hints for observers, not a replication log: a context that was
//! not listening when an event went out never sees it.

use serde::{Deserialize, Serialize};

use crate::id::PatientId;

/// Default channel name.
pub const DEFAULT_CHANNEL: &str = "medtrack.patients";

/// Something changed in the patient store.
///
/// Serializes as `{"type": "patient-added", "id": 1}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ChangeEvent {
    PatientAdded { id: PatientId },
}

impl ChangeEvent {
    /// Return the wire name of the event type.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PatientAdded { .. } => "patient-added",
        }
    }
}
