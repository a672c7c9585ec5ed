//! Query port — raw statement execution.

use std::future::Future;

use medtrack_domain::error::MedTrackError;
use medtrack_domain::query::{QueryResult, SqlValue};

/// Runs free-form statements with positional parameters.
///
/// Implementations must bind `params` through the engine and never splice
/// them into the statement text.
pub trait QueryExecutor {
    fn execute(
        &self,
        statement: &str,
        params: Vec<SqlValue>,
    ) -> impl Future<Output = Result<QueryResult, MedTrackError>> + Send;
}
