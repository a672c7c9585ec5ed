//! Patient service — registering, listing, and summarizing patients.

use std::sync::Arc;
use std::time::Duration;

use medtrack_domain::error::MedTrackError;
use medtrack_domain::event::ChangeEvent;
use medtrack_domain::id::PatientId;
use medtrack_domain::patient::{Gender, NewPatient, Patient};
use medtrack_domain::stats::PatientStats;
use medtrack_domain::time::{now, week_before};

use crate::deadline::bounded;
use crate::lifecycle::LifecycleController;
use crate::ports::{ChangePublisher, PatientRepository};

/// Application service for patient use-cases.
///
/// Field validation is the caller's job; this service only owns `id` and
/// `created_at` assignment and the change announcement.
pub struct PatientService<E, P> {
    lifecycle: Arc<LifecycleController<E>>,
    publisher: P,
    query_timeout: Option<Duration>,
}

impl<E, P> PatientService<E, P>
where
    E: PatientRepository + Send + Sync + 'static,
    P: ChangePublisher + Send + Sync,
{
    /// Create a service reaching the engine through `lifecycle`.
    pub fn new(lifecycle: Arc<LifecycleController<E>>, publisher: P) -> Self {
        Self {
            lifecycle,
            publisher,
            query_timeout: None,
        }
    }

    /// Bound every engine call made by this service.
    #[must_use]
    pub fn with_query_timeout(mut self, limit: Option<Duration>) -> Self {
        self.query_timeout = limit;
        self
    }

    /// Insert a patient stamped with the current time and announce it.
    ///
    /// Nothing is announced when the insert fails.
    ///
    /// # Errors
    ///
    /// Returns [`MedTrackError::NotInitialized`] before the engine is ready,
    /// or the engine's [`QueryError`](medtrack_domain::error::QueryError)
    /// unchanged.
    #[tracing::instrument(skip(self, patient), fields(gender = %patient.gender))]
    pub async fn add_patient(&self, patient: NewPatient) -> Result<PatientId, MedTrackError> {
        let engine = self.lifecycle.engine()?;
        let created_at = now();
        let id = bounded(self.query_timeout, engine.insert(patient, created_at)).await?;
        tracing::debug!(%id, "patient registered");

        if let Err(err) = self.publisher.publish(ChangeEvent::PatientAdded { id }).await {
            tracing::warn!(%err, %id, "failed to publish patient-added event");
        }
        Ok(id)
    }

    /// All patients, most recently registered first.
    ///
    /// # Errors
    ///
    /// Returns [`MedTrackError::NotInitialized`] before the engine is ready,
    /// or a query error from the engine.
    #[tracing::instrument(skip(self))]
    pub async fn get_patients(&self) -> Result<Vec<Patient>, MedTrackError> {
        let engine = self.lifecycle.engine()?;
        bounded(self.query_timeout, engine.get_all()).await
    }

    /// Recompute the aggregate counts from the current rows.
    ///
    /// Runs four independent counts; a count that yields no row is `0`.
    ///
    /// # Errors
    ///
    /// Returns [`MedTrackError::NotInitialized`] before the engine is ready,
    /// or the first query error from the engine.
    #[tracing::instrument(skip(self))]
    pub async fn get_patient_stats(&self) -> Result<PatientStats, MedTrackError> {
        let engine = self.lifecycle.engine()?;
        let since = week_before(now());
        let limit = self.query_timeout;

        let total = bounded(limit, engine.count_all()).await?;
        let new_this_week = bounded(limit, engine.count_created_since(since)).await?;
        let male_count = bounded(limit, engine.count_by_gender(Gender::MALE)).await?;
        let female_count = bounded(limit, engine.count_by_gender(Gender::FEMALE)).await?;

        Ok(PatientStats {
            total: total.unwrap_or(0),
            new_this_week: new_this_week.unwrap_or(0),
            male_count: male_count.unwrap_or(0),
            female_count: female_count.unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change_notifier::ChangeNotifier;
    use crate::fakes::{InMemoryEngine, InMemoryProvider};
    use chrono::TimeDelta;
    use medtrack_domain::error::QueryError;
    use medtrack_domain::lifecycle::LifecycleState;
    use std::sync::atomic::Ordering;

    async fn ready(
        provider: InMemoryProvider,
    ) -> (
        PatientService<InMemoryEngine, crate::change_notifier::NotifierHandle>,
        Arc<InMemoryEngine>,
        ChangeNotifier,
    ) {
        let lifecycle = Arc::new(LifecycleController::new());
        let engine = lifecycle.start(&provider).await.unwrap();
        let notifier = ChangeNotifier::new("test", 16);
        let service = PatientService::new(lifecycle, notifier.attach());
        (service, engine, notifier)
    }

    fn ada() -> NewPatient {
        NewPatient::new("Ada", "Lovelace", Gender::Female, "1990-01-01")
    }

    fn alan() -> NewPatient {
        NewPatient::new("Alan", "Turing", Gender::Male, "1912-06-23")
    }

    #[tokio::test]
    async fn should_refuse_every_operation_before_ready() {
        let lifecycle = Arc::new(LifecycleController::<InMemoryEngine>::new());
        let notifier = ChangeNotifier::new("test", 16);
        let service = PatientService::new(lifecycle, notifier.attach());
        let mut rx = notifier.attach().subscribe();

        let insert = service.add_patient(ada()).await;
        let list = service.get_patients().await;
        let stats = service.get_patient_stats().await;

        for result in [insert.map(|_| ()), list.map(|_| ()), stats.map(|_| ())] {
            assert!(matches!(
                result,
                Err(MedTrackError::NotInitialized(err)) if err.state == LifecycleState::Uninitialized
            ));
        }
        notifier.close();
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn should_assign_id_and_created_at_on_insert() {
        let (service, _engine, _notifier) = ready(InMemoryProvider::default()).await;

        let before = now();
        let id = service.add_patient(ada()).await.unwrap();
        let after = now();

        assert_eq!(id, PatientId::from_raw(1));
        let patients = service.get_patients().await.unwrap();
        assert_eq!(patients.len(), 1);
        assert_eq!(patients[0].id, id);
        assert!(patients[0].created_at >= before);
        assert!(patients[0].created_at <= after);
    }

    #[tokio::test]
    async fn should_announce_successful_insert_to_other_contexts() {
        let (service, _engine, notifier) = ready(InMemoryProvider::default()).await;
        let mut rx = notifier.attach().subscribe();

        let id = service.add_patient(ada()).await.unwrap();

        assert_eq!(rx.recv().await, Some(ChangeEvent::PatientAdded { id }));
    }

    #[tokio::test]
    async fn should_propagate_insert_failure_without_announcing() {
        let (service, _engine, notifier) = ready(InMemoryProvider(InMemoryEngine::rejecting)).await;
        let mut rx = notifier.attach().subscribe();

        let result = service.add_patient(ada()).await;

        assert!(matches!(
            result,
            Err(MedTrackError::Query(QueryError::Engine(_)))
        ));
        notifier.close();
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn should_still_return_id_when_channel_is_closed() {
        let (service, _engine, notifier) = ready(InMemoryProvider::default()).await;
        notifier.close();

        let id = service.add_patient(ada()).await.unwrap();
        assert_eq!(id, PatientId::from_raw(1));
    }

    #[tokio::test]
    async fn should_time_out_when_engine_hangs() {
        let (service, _engine, _notifier) = ready(InMemoryProvider(InMemoryEngine::hanging)).await;
        let service = service.with_query_timeout(Some(Duration::from_millis(10)));

        let result = service.add_patient(ada()).await;
        assert!(matches!(
            result,
            Err(MedTrackError::Query(QueryError::Timeout { .. }))
        ));
    }

    #[tokio::test]
    async fn should_list_newest_first() {
        let (service, engine, _notifier) = ready(InMemoryProvider::default()).await;
        let old = engine.seed(alan(), now() - TimeDelta::days(3));
        let new = service.add_patient(ada()).await.unwrap();

        let ids: Vec<PatientId> = service
            .get_patients()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![new, old]);
    }

    #[tokio::test]
    async fn should_return_empty_list_when_no_patients() {
        let (service, _engine, _notifier) = ready(InMemoryProvider::default()).await;
        assert!(service.get_patients().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_compute_stats_from_current_rows() {
        let (service, engine, _notifier) = ready(InMemoryProvider::default()).await;
        service.add_patient(ada()).await.unwrap();
        service.add_patient(alan()).await.unwrap();
        service
            .add_patient(NewPatient::new("Sam", "Doe", "Other", "2000-02-29"))
            .await
            .unwrap();
        engine.seed(alan(), now() - TimeDelta::days(8));

        let stats = service.get_patient_stats().await.unwrap();

        assert_eq!(
            stats,
            PatientStats {
                total: 4,
                new_this_week: 3,
                male_count: 2,
                female_count: 1,
            }
        );
        assert!(stats.male_count + stats.female_count < stats.total);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 3 + 4);
    }

    #[tokio::test]
    async fn should_count_patient_registered_exactly_a_week_ago_boundary() {
        let (service, engine, _notifier) = ready(InMemoryProvider::default()).await;
        engine.seed(ada(), now() - TimeDelta::days(6));
        engine.seed(alan(), now() - TimeDelta::days(8));

        let stats = service.get_patient_stats().await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.new_this_week, 1);
    }

    #[tokio::test]
    async fn should_report_zero_stats_for_empty_store() {
        let (service, _engine, _notifier) = ready(InMemoryProvider::default()).await;
        let stats = service.get_patient_stats().await.unwrap();
        assert_eq!(stats, PatientStats::default());
    }
}
