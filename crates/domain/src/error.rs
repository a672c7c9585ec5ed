//! Common error types used across the workspace.
//!
//! Every data operation fails with one of three conditions:
//! - [`NotInitializedError`] when the data layer is not `Ready`;
//! - [`InitializationError`] when engine creation or schema bootstrap failed;
//! - [`QueryError`] for anything the engine rejects while executing.
//!
//! Each layer defines its own typed errors and converts via `#[from]`.

use std::sync::Arc;
use std::time::Duration;

use crate::lifecycle::LifecycleState;

/// Boxed source error coming from an adapter.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error for medtrack data operations.
#[derive(Debug, thiserror::Error)]
pub enum MedTrackError {
    #[error(transparent)]
    NotInitialized(#[from] NotInitializedError),

    #[error(transparent)]
    Initialization(#[from] Arc<InitializationError>),

    #[error(transparent)]
    Query(#[from] QueryError),
}

impl From<InitializationError> for MedTrackError {
    fn from(err: InitializationError) -> Self {
        Self::Initialization(Arc::new(err))
    }
}

/// A data operation was attempted before the data layer reached `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("data layer is not initialized (state: {state})")]
pub struct NotInitializedError {
    /// State the lifecycle controller was in when the operation was refused.
    pub state: LifecycleState,
}

/// Engine creation or schema bootstrap failed.
#[derive(Debug, thiserror::Error)]
pub enum InitializationError {
    /// The embedded engine could not be opened.
    #[error("failed to open embedded engine: {0}")]
    Engine(#[source] BoxError),

    /// The schema statements were rejected.
    #[error("failed to bootstrap schema: {0}")]
    Schema(#[source] BoxError),

    /// Opening the engine or creating the schema did not finish in time.
    #[error("initialization timed out after {after:?}")]
    Timeout { after: Duration },

    /// The caller stopped waiting before initialization finished.
    #[error("initialization was cancelled before completing")]
    Cancelled,

    /// `start` was called after initialization had already begun.
    #[error("initialization already started (state: {state})")]
    AlreadyStarted { state: LifecycleState },
}

/// Failure reported while executing a statement.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The engine rejected the statement (constraint, syntax, type mismatch, ...).
    #[error("query failed: {0}")]
    Engine(#[source] BoxError),

    /// A stored value could not be mapped onto a domain type.
    #[error("failed to decode row: {0}")]
    Decode(#[source] BoxError),

    /// The engine did not answer within the configured bound.
    #[error("query timed out after {after:?}")]
    Timeout { after: Duration },

    /// The statement text was empty.
    #[error("statement is empty")]
    EmptyStatement,
}
