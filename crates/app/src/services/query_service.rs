//! Query service — the raw statement surface used by the SQL console.

use std::sync::Arc;
use std::time::Duration;

use medtrack_domain::error::{MedTrackError, QueryError};
use medtrack_domain::query::{QueryResult, SqlValue};

use crate::deadline::bounded;
use crate::lifecycle::LifecycleController;
use crate::ports::QueryExecutor;

/// Runs caller-supplied statements once the engine is ready.
///
/// Statement text is passed through unchanged; only parameter values are
/// bound by the engine.
pub struct QueryService<E> {
    lifecycle: Arc<LifecycleController<E>>,
    query_timeout: Option<Duration>,
}

impl<E> QueryService<E>
where
    E: QueryExecutor + Send + Sync + 'static,
{
    pub fn new(lifecycle: Arc<LifecycleController<E>>) -> Self {
        Self {
            lifecycle,
            query_timeout: None,
        }
    }

    #[must_use]
    pub fn with_query_timeout(mut self, limit: Option<Duration>) -> Self {
        self.query_timeout = limit;
        self
    }

    /// Execute `statement` with positional `params`.
    ///
    /// # Errors
    ///
    /// Returns [`MedTrackError::NotInitialized`] before the engine is ready
    /// (the engine is not touched), [`QueryError::EmptyStatement`] for blank
    /// input, or the engine's error unchanged.
    #[tracing::instrument(skip(self, params), fields(params = params.len()))]
    pub async fn execute(
        &self,
        statement: &str,
        params: Vec<SqlValue>,
    ) -> Result<QueryResult, MedTrackError> {
        let engine = self.lifecycle.engine()?;
        if statement.trim().is_empty() {
            return Err(QueryError::EmptyStatement.into());
        }
        let result = bounded(self.query_timeout, engine.execute(statement, params)).await;
        if let Err(err) = &result {
            tracing::debug!(error = %err, "statement failed");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{InMemoryEngine, InMemoryProvider};
    use medtrack_domain::lifecycle::LifecycleState;

    async fn ready() -> (QueryService<InMemoryEngine>, Arc<InMemoryEngine>) {
        let lifecycle = Arc::new(LifecycleController::new());
        let engine = lifecycle.start(&InMemoryProvider::default()).await.unwrap();
        (QueryService::new(lifecycle), engine)
    }

    #[tokio::test]
    async fn should_refuse_before_ready() {
        let service = QueryService::new(Arc::new(LifecycleController::<InMemoryEngine>::new()));
        let result = service.execute("SELECT 1", vec![]).await;
        assert!(matches!(
            result,
            Err(MedTrackError::NotInitialized(err)) if err.state == LifecycleState::Uninitialized
        ));
    }

    #[tokio::test]
    async fn should_pass_statement_and_params_through_unchanged() {
        let (service, engine) = ready().await;
        let statement = "SELECT * FROM patients WHERE gender = ?";

        let result = service
            .execute(statement, vec![SqlValue::from("Robert'); DROP TABLE patients;--")])
            .await
            .unwrap();

        assert_eq!(result.columns, vec!["answer"]);
        let executed = engine.executed.lock().unwrap();
        assert_eq!(executed.len(), 1);
        assert_eq!(executed[0].0, statement);
        assert_eq!(
            executed[0].1,
            vec![SqlValue::Text("Robert'); DROP TABLE patients;--".to_string())]
        );
    }

    #[tokio::test]
    async fn should_reject_blank_statement_without_reaching_engine() {
        let (service, engine) = ready().await;
        let result = service.execute("   ", vec![]).await;
        assert!(matches!(
            result,
            Err(MedTrackError::Query(QueryError::EmptyStatement))
        ));
        assert!(engine.executed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_propagate_engine_error() {
        let (service, _engine) = ready().await;
        let result = service.execute("SELEC nonsense", vec![]).await;
        assert!(matches!(
            result,
            Err(MedTrackError::Query(QueryError::Engine(_)))
        ));
    }
}
