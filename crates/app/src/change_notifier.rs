//! Device-local change notifier with one unbounded queue per subscriber.
//!
//! One [`ChangeNotifier`] exists per process and is injected wherever it is
//! needed. Each execution context attaches to it and gets a
//! [`NotifierHandle`]; events published through a handle are queued for
//! every *other* context's subscriptions, in publish order per sender. A slow
//! subscriber never loses events, it only falls behind.
//!
//! There is no replay: a subscription only sees events published after it
//! was created. The channel informs observers, it does not coordinate writes.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::Stream;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::UnboundedReceiverStream;

use medtrack_domain::event::ChangeEvent;
use medtrack_domain::id::ContextId;

use crate::ports::{ChangePublisher, NotifyError};

struct Subscriber {
    context: ContextId,
    sender: mpsc::UnboundedSender<ChangeEvent>,
    pending: Arc<AtomicUsize>,
}

struct Shared {
    channel: String,
    backlog_warning: usize,
    /// `None` once the channel is closed.
    subscribers: RwLock<Option<Vec<Subscriber>>>,
}

impl Shared {
    /// Queue `event` for every live subscriber outside `origin`, dropping
    /// the ones whose receiving side is gone.
    fn fan_out(&self, origin: ContextId, event: ChangeEvent) -> Result<usize, NotifyError> {
        let mut subscribers = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(subscribers) = subscribers.as_mut() else {
            return Err(NotifyError::Closed {
                channel: self.channel.clone(),
            });
        };

        let mut delivered = 0;
        subscribers.retain(|subscriber| {
            if subscriber.context == origin {
                return !subscriber.sender.is_closed();
            }
            if subscriber.sender.send(event).is_err() {
                return false;
            }
            delivered += 1;
            let backlog = subscriber.pending.fetch_add(1, Ordering::Relaxed) + 1;
            if backlog == self.backlog_warning.saturating_add(1) {
                tracing::warn!(
                    channel = %self.channel,
                    backlog,
                    "change subscriber is falling behind"
                );
            }
            true
        });
        Ok(delivered)
    }
}

/// Process-wide hub for change notifications on one named channel.
#[derive(Clone)]
pub struct ChangeNotifier {
    shared: Arc<Shared>,
}

impl ChangeNotifier {
    /// Create an open channel.
    ///
    /// Queues are unbounded; a subscriber holding more than
    /// `backlog_warning` undelivered events is reported once per crossing.
    #[must_use]
    pub fn new(channel: impl Into<String>, backlog_warning: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                channel: channel.into(),
                backlog_warning: backlog_warning.max(1),
                subscribers: RwLock::new(Some(Vec::new())),
            }),
        }
    }

    /// Channel name, used to label log output.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.shared.channel
    }

    /// Attach a new execution context to this channel.
    #[must_use]
    pub fn attach(&self) -> NotifierHandle {
        NotifierHandle {
            context: ContextId::new(),
            shared: Arc::clone(&self.shared),
        }
    }

    /// Number of live subscriptions across all contexts.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.shared
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map_or(0, |subscribers| {
                subscribers
                    .iter()
                    .filter(|subscriber| !subscriber.sender.is_closed())
                    .count()
            })
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Tear the channel down.
    ///
    /// Subscriptions drain what was already queued and then end; later
    /// publishes fail with [`NotifyError::Closed`].
    pub fn close(&self) {
        let previous = self
            .shared
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(subscribers) = previous {
            tracing::debug!(
                channel = %self.shared.channel,
                subscribers = subscribers.len(),
                "change channel closed"
            );
        }
    }
}

/// One execution context's view of a [`ChangeNotifier`].
///
/// Clones share the context, so they never see each other's events.
#[derive(Clone)]
pub struct NotifierHandle {
    context: ContextId,
    shared: Arc<Shared>,
}

impl NotifierHandle {
    /// Identifier of the context owning this handle.
    #[must_use]
    pub fn context(&self) -> ContextId {
        self.context
    }

    #[must_use]
    pub fn channel(&self) -> &str {
        &self.shared.channel
    }

    /// Listen for events published by other contexts from now on.
    ///
    /// On a closed channel the subscription ends immediately.
    #[must_use]
    pub fn subscribe(&self) -> ChangeSubscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));
        if let Some(subscribers) = self
            .shared
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .as_mut()
        {
            subscribers.push(Subscriber {
                context: self.context,
                sender,
                pending: Arc::clone(&pending),
            });
        }
        ChangeSubscription {
            channel: self.shared.channel.clone(),
            receiver,
            pending,
        }
    }

    /// Run `handler` on a background task for every event from other contexts.
    ///
    /// The handler never runs on the publisher's task; a panic inside it is
    /// logged and the subscription keeps going. Must be called from within a
    /// tokio runtime.
    pub fn on_change<F>(&self, mut handler: F) -> SubscriptionGuard
    where
        F: FnMut(ChangeEvent) + Send + 'static,
    {
        let mut subscription = self.subscribe();
        let task = tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| handler(event)));
                if outcome.is_err() {
                    tracing::warn!(
                        channel = %subscription.channel,
                        kind = event.kind(),
                        "change handler panicked"
                    );
                }
            }
        });
        SubscriptionGuard { task }
    }
}

impl ChangePublisher for NotifierHandle {
    async fn publish(&self, event: ChangeEvent) -> Result<(), NotifyError> {
        let delivered = self.shared.fan_out(self.context, event)?;
        tracing::trace!(
            channel = %self.shared.channel,
            kind = event.kind(),
            delivered,
            "change published"
        );
        Ok(())
    }
}

/// Receives events published by other contexts.
pub struct ChangeSubscription {
    channel: String,
    receiver: mpsc::UnboundedReceiver<ChangeEvent>,
    pending: Arc<AtomicUsize>,
}

impl ChangeSubscription {
    /// Wait for the next event from another context.
    ///
    /// Returns `None` once the channel is closed and drained.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        let event = self.receiver.recv().await?;
        self.pending.fetch_sub(1, Ordering::Relaxed);
        Some(event)
    }

    /// Turn the subscription into a [`Stream`] of events from other contexts.
    pub fn into_stream(self) -> impl Stream<Item = ChangeEvent> {
        let Self {
            receiver, pending, ..
        } = self;
        UnboundedReceiverStream::new(receiver).map(move |event| {
            pending.fetch_sub(1, Ordering::Relaxed);
            event
        })
    }
}

/// Keeps an [`NotifierHandle::on_change`] handler registered.
///
/// Dropping the guard deregisters the handler.
#[must_use = "dropping the guard deregisters the handler"]
pub struct SubscriptionGuard {
    task: JoinHandle<()>,
}

impl SubscriptionGuard {
    /// Deregister the handler.
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Whether the handler task has stopped (channel closed or deregistered).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.task.abort();
    }
}
