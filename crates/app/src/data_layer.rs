//! The shared data-layer handle.
//!
//! Constructed once by the composition root and cloned into every
//! collaborator. Every clone sees the same lifecycle, so readiness can be
//! checked before use.

use std::sync::Arc;
use std::time::Duration;

use medtrack_domain::error::{InitializationError, MedTrackError};
use medtrack_domain::id::PatientId;
use medtrack_domain::lifecycle::LifecycleState;
use medtrack_domain::patient::{NewPatient, Patient};
use medtrack_domain::query::{QueryResult, SqlValue};
use medtrack_domain::stats::PatientStats;

use crate::lifecycle::LifecycleController;
use crate::ports::{
    ChangePublisher, EngineProvider, PatientRepository, QueryExecutor, SchemaBootstrapper,
};
use crate::services::patient_service::PatientService;
use crate::services::query_service::QueryService;

/// Handle to the embedded store, generic over the engine and the publisher.
///
/// `Clone` is implemented manually so the underlying types themselves do not
/// need to be `Clone`; only the `Arc` wrappers are cloned.
pub struct DataLayer<E, P> {
    lifecycle: Arc<LifecycleController<E>>,
    patients: Arc<PatientService<E, P>>,
    queries: Arc<QueryService<E>>,
}

impl<E, P> Clone for DataLayer<E, P> {
    fn clone(&self) -> Self {
        Self {
            lifecycle: Arc::clone(&self.lifecycle),
            patients: Arc::clone(&self.patients),
            queries: Arc::clone(&self.queries),
        }
    }
}

impl<E, P> DataLayer<E, P>
where
    E: SchemaBootstrapper + PatientRepository + QueryExecutor + Send + Sync + 'static,
    P: ChangePublisher + Send + Sync,
{
    /// Build an uninitialized handle.
    ///
    /// `query_timeout` bounds every engine call, initialization included;
    /// `None` waits indefinitely.
    pub fn new(publisher: P, query_timeout: Option<Duration>) -> Self {
        let mut lifecycle = LifecycleController::new();
        if let Some(limit) = query_timeout {
            lifecycle = lifecycle.with_init_timeout(limit);
        }
        let lifecycle = Arc::new(lifecycle);
        let patients = PatientService::new(Arc::clone(&lifecycle), publisher)
            .with_query_timeout(query_timeout);
        let queries = QueryService::new(Arc::clone(&lifecycle)).with_query_timeout(query_timeout);
        Self {
            lifecycle,
            patients: Arc::new(patients),
            queries: Arc::new(queries),
        }
    }

    /// Open the engine and create the schema. See [`LifecycleController::start`].
    ///
    /// # Errors
    ///
    /// Returns the initialization error; the handle then stays `Failed`.
    pub async fn start<Pr>(&self, provider: &Pr) -> Result<(), MedTrackError>
    where
        Pr: EngineProvider<Engine = E>,
    {
        self.lifecycle.start(provider).await.map(|_| ())
    }

    /// Suspend until the handle is `Ready` or `Failed`.
    ///
    /// # Errors
    ///
    /// Returns the retained initialization error when startup failed.
    pub async fn wait_ready(&self) -> Result<(), MedTrackError> {
        self.lifecycle.wait_ready().await.map(|_| ())
    }

    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state() == LifecycleState::Ready
    }

    /// The error retained by a failed startup.
    #[must_use]
    pub fn failure(&self) -> Option<Arc<InitializationError>> {
        self.lifecycle.failure()
    }

    #[must_use]
    pub fn patients(&self) -> &PatientService<E, P> {
        &self.patients
    }

    #[must_use]
    pub fn queries(&self) -> &QueryService<E> {
        &self.queries
    }

    /// See [`PatientService::add_patient`].
    ///
    /// # Errors
    ///
    /// Not-ready and query errors from the patient service.
    pub async fn add_patient(&self, patient: NewPatient) -> Result<PatientId, MedTrackError> {
        self.patients.add_patient(patient).await
    }

    /// See [`PatientService::get_patients`].
    ///
    /// # Errors
    ///
    /// Not-ready and query errors from the patient service.
    pub async fn get_patients(&self) -> Result<Vec<Patient>, MedTrackError> {
        self.patients.get_patients().await
    }

    /// See [`PatientService::get_patient_stats`].
    ///
    /// # Errors
    ///
    /// Not-ready and query errors from the patient service.
    pub async fn get_patient_stats(&self) -> Result<PatientStats, MedTrackError> {
        self.patients.get_patient_stats().await
    }

    /// See [`QueryService::execute`].
    ///
    /// # Errors
    ///
    /// Not-ready and query errors from the query service.
    pub async fn execute(
        &self,
        statement: &str,
        params: Vec<SqlValue>,
    ) -> Result<QueryResult, MedTrackError> {
        self.queries.execute(statement, params).await
    }
}
