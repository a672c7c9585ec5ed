//! # medtrack-adapter-storage-sqlite-sqlx
//!
//! Embedded `SQLite` engine adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Open the embedded engine (`EngineProvider`) and own its connection pool
//! - Create the patient schema idempotently (`SchemaBootstrapper`)
//! - Execute caller-supplied statements with bound parameters (`QueryExecutor`)
//! - Implement the `PatientRepository` port and map rows to domain types
//!
//! ## Dependency rule
//! Depends on `medtrack-app` (for port traits) and `medtrack-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod error;
mod executor;
mod patient_repo;
mod pool;
mod schema;

pub use error::StorageError;
pub use pool::{Config, Database};
pub use schema::{CREATE_INDEXES, CREATE_PATIENTS_TABLE};
