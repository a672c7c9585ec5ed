//! In-memory port implementations shared by the unit tests.

use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use medtrack_domain::error::{InitializationError, MedTrackError, QueryError};
use medtrack_domain::id::PatientId;
use medtrack_domain::patient::{NewPatient, Patient};
use medtrack_domain::query::{QueryResult, SqlValue};
use medtrack_domain::time::Timestamp;

use crate::ports::{EngineProvider, PatientRepository, QueryExecutor, SchemaBootstrapper};

#[derive(Default)]
pub(crate) struct InMemoryEngine {
    rows: Mutex<Vec<Patient>>,
    pub(crate) executed: Mutex<Vec<(String, Vec<SqlValue>)>>,
    pub(crate) calls: AtomicUsize,
    reject_inserts: bool,
    hang: bool,
}

impl InMemoryEngine {
    /// Every insert fails with an engine error.
    pub(crate) fn rejecting() -> Self {
        Self {
            reject_inserts: true,
            ..Self::default()
        }
    }

    /// Inserts never complete.
    pub(crate) fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }

    /// Store a row with an explicit `created_at`, bypassing the service.
    pub(crate) fn seed(&self, patient: NewPatient, created_at: Timestamp) -> PatientId {
        let mut rows = self.rows.lock().unwrap();
        let id = PatientId::from_raw(i64::try_from(rows.len()).unwrap() + 1);
        rows.push(to_row(id, patient, created_at));
        id
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn count(&self, pred: impl Fn(&Patient) -> bool) -> Option<u64> {
        let rows = self.rows.lock().unwrap();
        Some(rows.iter().filter(|p| pred(p)).count() as u64)
    }
}

fn to_row(id: PatientId, patient: NewPatient, created_at: Timestamp) -> Patient {
    Patient {
        id,
        first_name: patient.first_name,
        last_name: patient.last_name,
        gender: patient.gender,
        date_of_birth: patient.date_of_birth,
        email: patient.email,
        phone: patient.phone,
        address: patient.address,
        blood_group: patient.blood_group,
        emergency_contact: patient.emergency_contact,
        medical_history: patient.medical_history,
        created_at,
    }
}

impl SchemaBootstrapper for InMemoryEngine {
    async fn bootstrap(&self) -> Result<(), InitializationError> {
        Ok(())
    }
}

impl PatientRepository for InMemoryEngine {
    fn insert(
        &self,
        patient: NewPatient,
        created_at: Timestamp,
    ) -> impl Future<Output = Result<PatientId, MedTrackError>> + Send {
        self.touch();
        let result = if self.reject_inserts {
            Err(QueryError::Engine("NOT NULL constraint failed: patients.first_name".into()).into())
        } else {
            Ok(self.seed(patient, created_at))
        };
        let hang = self.hang;
        async move {
            if hang {
                std::future::pending::<()>().await;
            }
            result
        }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Patient>, MedTrackError>> + Send {
        self.touch();
        let mut rows = self.rows.lock().unwrap().clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        async { Ok(rows) }
    }

    fn count_all(&self) -> impl Future<Output = Result<Option<u64>, MedTrackError>> + Send {
        self.touch();
        let result = self.count(|_| true);
        async move { Ok(result) }
    }

    fn count_created_since(
        &self,
        since: Timestamp,
    ) -> impl Future<Output = Result<Option<u64>, MedTrackError>> + Send {
        self.touch();
        let result = self.count(|p| p.created_at >= since);
        async move { Ok(result) }
    }

    fn count_by_gender(
        &self,
        gender: &str,
    ) -> impl Future<Output = Result<Option<u64>, MedTrackError>> + Send {
        self.touch();
        let result = self.count(|p| p.gender.as_str() == gender);
        async move { Ok(result) }
    }
}

impl QueryExecutor for InMemoryEngine {
    fn execute(
        &self,
        statement: &str,
        params: Vec<SqlValue>,
    ) -> impl Future<Output = Result<QueryResult, MedTrackError>> + Send {
        self.touch();
        self.executed
            .lock()
            .unwrap()
            .push((statement.to_string(), params));
        let result = if statement.starts_with("SELECT") {
            Ok(QueryResult {
                columns: vec!["answer".to_string()],
                rows: vec![vec![42.into()]],
            })
        } else {
            Err(QueryError::Engine(format!("near \"{statement}\": syntax error").into()).into())
        };
        async move { result }
    }
}

/// Hands out a fresh [`InMemoryEngine`] configured by the closure.
pub(crate) struct InMemoryProvider(pub(crate) fn() -> InMemoryEngine);

impl Default for InMemoryProvider {
    fn default() -> Self {
        Self(InMemoryEngine::default)
    }
}

impl EngineProvider for InMemoryProvider {
    type Engine = InMemoryEngine;

    async fn open(&self) -> Result<InMemoryEngine, InitializationError> {
        Ok((self.0)())
    }
}
