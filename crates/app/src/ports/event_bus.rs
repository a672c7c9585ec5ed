//! Event bus port — announcing changes to other execution contexts.

use std::future::Future;

use medtrack_domain::event::ChangeEvent;

/// Why an event could not be handed to the channel.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("change channel {channel} is closed")]
    Closed { channel: String },
}

/// Publishes change events to subscribers in other execution contexts.
pub trait ChangePublisher {
    /// Publish an event to all current subscribers.
    fn publish(&self, event: ChangeEvent) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

impl<T: ChangePublisher + Send + Sync> ChangePublisher for std::sync::Arc<T> {
    fn publish(&self, event: ChangeEvent) -> impl Future<Output = Result<(), NotifyError>> + Send {
        (**self).publish(event)
    }
}
