//! # medtrack-domain
//!
//! Pure domain model for the medtrack patient registry.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Patients** (registered rows) and **`NewPatient`** (insert input)
//! - Define **`PatientStats`** (aggregates derived on demand, never stored)
//! - Define **Change events** (cross-context notifications)
//! - Define the raw **query** vocabulary (`SqlValue`, `QueryResult`)
//! - Define the **lifecycle** states that gate data access
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod event;
pub mod lifecycle;
pub mod patient;
pub mod query;
pub mod stats;
