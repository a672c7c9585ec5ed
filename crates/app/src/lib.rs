//! # medtrack-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `EngineProvider` / `SchemaBootstrapper` — open the embedded engine, create the schema
//!   - `PatientRepository` — insert, list, and count patient rows
//!   - `QueryExecutor` — run caller-supplied statements with positional parameters
//!   - `ChangePublisher` — announce changes to other execution contexts
//! - Gate every data operation on the **lifecycle controller**
//! - Provide **in-process infrastructure** (change notifier) that doesn't need IO
//! - Expose the `DataLayer` handle that collaborators share
//!
//! ## Dependency rule
//! Depends on `medtrack-domain` only (plus `tokio::sync` for channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod change_notifier;
pub mod data_layer;
pub mod lifecycle;
pub mod ports;
pub mod services;

mod deadline;
#[cfg(test)]
mod fakes;
