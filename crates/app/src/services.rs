//! Application services — use-case implementations.
//!
//! Each service reaches the engine through the shared lifecycle controller,
//! so nothing runs before the schema is in place.

pub mod patient_service;
pub mod query_service;
