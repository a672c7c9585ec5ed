//! Lifecycle controller — gates data access until the engine and schema are ready.
//!
//! ```text
//! Uninitialized ──start──▶ Initializing ──ok──▶ Ready
//!                                      └─err──▶ Failed
//! ```
//!
//! `Ready` and `Failed` are terminal. Dropping the `start` future while it is
//! `Initializing` counts as a failure. The current phase lives in a tokio
//! [`watch`] channel so callers can either poll [`LifecycleController::state`]
//! or suspend on [`LifecycleController::wait_ready`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use medtrack_domain::error::{InitializationError, MedTrackError, NotInitializedError};
use medtrack_domain::lifecycle::LifecycleState;

use crate::ports::{EngineProvider, SchemaBootstrapper};

enum Phase<E> {
    Uninitialized,
    Initializing,
    Ready(Arc<E>),
    Failed(Arc<InitializationError>),
}

impl<E> Phase<E> {
    fn state(&self) -> LifecycleState {
        match self {
            Self::Uninitialized => LifecycleState::Uninitialized,
            Self::Initializing => LifecycleState::Initializing,
            Self::Ready(_) => LifecycleState::Ready,
            Self::Failed(_) => LifecycleState::Failed,
        }
    }
}

/// Owns the engine once it is ready and hands it out to services.
pub struct LifecycleController<E> {
    phase: watch::Sender<Phase<E>>,
    init_timeout: Option<Duration>,
}

impl<E> Default for LifecycleController<E> {
    fn default() -> Self {
        let (phase, _) = watch::channel(Phase::Uninitialized);
        Self {
            phase,
            init_timeout: None,
        }
    }
}

impl<E> LifecycleController<E> {
    /// Create a controller in the `Uninitialized` state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the time `start` may spend opening the engine and creating the schema.
    #[must_use]
    pub fn with_init_timeout(mut self, limit: Duration) -> Self {
        self.init_timeout = Some(limit);
        self
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.phase.borrow().state()
    }

    /// The error that moved the controller to `Failed`, if any.
    #[must_use]
    pub fn failure(&self) -> Option<Arc<InitializationError>> {
        match &*self.phase.borrow() {
            Phase::Failed(err) => Some(Arc::clone(err)),
            _ => None,
        }
    }

    /// The engine, if the controller is `Ready`.
    ///
    /// # Errors
    ///
    /// Returns [`NotInitializedError`] in every other state. Never blocks.
    pub fn engine(&self) -> Result<Arc<E>, NotInitializedError> {
        match &*self.phase.borrow() {
            Phase::Ready(engine) => Ok(Arc::clone(engine)),
            other => Err(NotInitializedError {
                state: other.state(),
            }),
        }
    }

    /// Suspend until the controller reaches a terminal state.
    ///
    /// # Errors
    ///
    /// Returns [`MedTrackError::Initialization`] with the retained error when
    /// initialization failed.
    pub async fn wait_ready(&self) -> Result<Arc<E>, MedTrackError> {
        let mut rx = self.phase.subscribe();
        let phase = rx
            .wait_for(|phase| phase.state().is_terminal())
            .await
            .map_err(|_| NotInitializedError {
                state: self.state(),
            })?;
        match &*phase {
            Phase::Ready(engine) => Ok(Arc::clone(engine)),
            Phase::Failed(err) => Err(MedTrackError::Initialization(Arc::clone(err))),
            other => Err(NotInitializedError {
                state: other.state(),
            }
            .into()),
        }
    }
}

impl<E: SchemaBootstrapper + Send + Sync + 'static> LifecycleController<E> {
    /// Open the engine through `provider`, create the schema, and become `Ready`.
    ///
    /// Runs at most once per controller.
    ///
    /// # Errors
    ///
    /// Returns [`InitializationError::AlreadyStarted`] (without changing state)
    /// when called outside `Uninitialized`, or the engine/schema error that
    /// moved the controller to `Failed`.
    #[tracing::instrument(skip_all)]
    pub async fn start<P>(&self, provider: &P) -> Result<Arc<E>, MedTrackError>
    where
        P: EngineProvider<Engine = E>,
    {
        let mut previous = LifecycleState::Uninitialized;
        let claimed = self.phase.send_if_modified(|phase| {
            previous = phase.state();
            if matches!(phase, Phase::Uninitialized) {
                *phase = Phase::Initializing;
                true
            } else {
                false
            }
        });
        if !claimed {
            return Err(InitializationError::AlreadyStarted { state: previous }.into());
        }
        let guard = InitGuard {
            phase: &self.phase,
            armed: true,
        };
        tracing::info!("initializing embedded engine");

        let outcome = match self.init_timeout {
            None => open_and_bootstrap(provider).await,
            Some(after) => tokio::time::timeout(after, open_and_bootstrap(provider))
                .await
                .unwrap_or(Err(InitializationError::Timeout { after })),
        };

        match outcome {
            Ok(engine) => {
                let engine = Arc::new(engine);
                guard.settle(Phase::Ready(Arc::clone(&engine)));
                tracing::info!("embedded engine ready");
                Ok(engine)
            }
            Err(err) => {
                let err = Arc::new(err);
                tracing::error!(error = %err, "embedded engine initialization failed");
                guard.settle(Phase::Failed(Arc::clone(&err)));
                Err(MedTrackError::Initialization(err))
            }
        }
    }
}

/// Moves a claimed `Initializing` phase to `Failed` if `start` is dropped
/// before settling it.
struct InitGuard<'a, E> {
    phase: &'a watch::Sender<Phase<E>>,
    armed: bool,
}

impl<E> InitGuard<'_, E> {
    fn settle(mut self, outcome: Phase<E>) {
        self.armed = false;
        self.phase.send_replace(outcome);
    }
}

impl<E> Drop for InitGuard<'_, E> {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!("embedded engine initialization cancelled");
            self.phase
                .send_replace(Phase::Failed(Arc::new(InitializationError::Cancelled)));
        }
    }
}

async fn open_and_bootstrap<P: EngineProvider>(
    provider: &P,
) -> Result<P::Engine, InitializationError> {
    let engine = provider.open().await?;
    engine.bootstrap().await?;
    Ok(engine)
}
