//! Engine port — opening the embedded engine and creating the schema.

use std::future::Future;

use medtrack_domain::error::InitializationError;

/// Creates the schema on an open engine.
pub trait SchemaBootstrapper {
    /// Issue the idempotent "create if missing" statements.
    fn bootstrap(&self) -> impl Future<Output = Result<(), InitializationError>> + Send;
}

/// Opens an embedded engine instance.
pub trait EngineProvider {
    type Engine: SchemaBootstrapper + Send + Sync + 'static;

    /// Acquire or create the engine. The schema is not touched yet.
    fn open(&self) -> impl Future<Output = Result<Self::Engine, InitializationError>> + Send;
}
