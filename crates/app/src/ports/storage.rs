//! Storage port — the patient repository.

use std::future::Future;

use medtrack_domain::error::MedTrackError;
use medtrack_domain::id::PatientId;
use medtrack_domain::patient::{NewPatient, Patient};
use medtrack_domain::time::Timestamp;

/// Persistence for [`Patient`] rows.
///
/// Counting methods return `None` when the aggregate query yields no row.
pub trait PatientRepository {
    /// Insert a row stamped with `created_at` and return the engine-assigned id.
    fn insert(
        &self,
        patient: NewPatient,
        created_at: Timestamp,
    ) -> impl Future<Output = Result<PatientId, MedTrackError>> + Send;

    /// All rows, most recently registered first.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Patient>, MedTrackError>> + Send;

    /// Number of rows.
    fn count_all(&self) -> impl Future<Output = Result<Option<u64>, MedTrackError>> + Send;

    /// Number of rows with `created_at >= since`.
    fn count_created_since(
        &self,
        since: Timestamp,
    ) -> impl Future<Output = Result<Option<u64>, MedTrackError>> + Send;

    /// Number of rows whose gender equals `gender` exactly.
    fn count_by_gender(
        &self,
        gender: &str,
    ) -> impl Future<Output = Result<Option<u64>, MedTrackError>> + Send;
}
