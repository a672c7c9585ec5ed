//! Bounded waits on engine calls.

use std::future::Future;
use std::time::Duration;

use medtrack_domain::error::{MedTrackError, QueryError};

/// Await `fut`, failing with [`QueryError::Timeout`] once `limit` elapses.
///
/// `None` waits indefinitely. A timed-out call is abandoned, not rolled back:
/// the engine may still complete it.
pub(crate) async fn bounded<T, F>(limit: Option<Duration>, fut: F) -> Result<T, MedTrackError>
where
    F: Future<Output = Result<T, MedTrackError>>,
{
    match limit {
        None => fut.await,
        Some(after) => tokio::time::timeout(after, fut)
            .await
            .map_err(|_| QueryError::Timeout { after })?,
    }
}
