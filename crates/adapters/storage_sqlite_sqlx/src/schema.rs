//! Schema bootstrap — idempotent "create if missing" statements.
//!
//! The indexes back the listing order (`created_at`) and the statistics
//! filters (`gender`, `created_at`), plus date-of-birth lookups from the
//! console.

use std::future::Future;

use medtrack_app::ports::SchemaBootstrapper;
use medtrack_domain::error::InitializationError;

use crate::error::StorageError;
use crate::pool::Database;

pub const CREATE_PATIENTS_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS patients (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        gender TEXT NOT NULL,
        date_of_birth TEXT NOT NULL,
        email TEXT,
        phone TEXT,
        address TEXT,
        blood_group TEXT,
        emergency_contact TEXT,
        medical_history TEXT,
        created_at TEXT NOT NULL
    )
";

pub const CREATE_INDEXES: [&str; 3] = [
    "CREATE INDEX IF NOT EXISTS idx_patients_gender ON patients(gender)",
    "CREATE INDEX IF NOT EXISTS idx_patients_date_of_birth ON patients(date_of_birth)",
    "CREATE INDEX IF NOT EXISTS idx_patients_created_at ON patients(created_at)",
];

impl SchemaBootstrapper for Database {
    fn bootstrap(&self) -> impl Future<Output = Result<(), InitializationError>> + Send {
        let pool = self.pool.clone();
        async move {
            let schema_error = |err: sqlx::Error| StorageError::from(err).into_schema_error();

            // One transaction, so a failure never leaves a partial schema behind.
            let mut tx = pool.begin().await.map_err(schema_error)?;
            for statement in std::iter::once(CREATE_PATIENTS_TABLE).chain(CREATE_INDEXES) {
                sqlx::query(statement)
                    .execute(&mut *tx)
                    .await
                    .map_err(schema_error)?;
            }
            tx.commit().await.map_err(schema_error)?;

            tracing::debug!("patient schema ready");
            Ok(())
        }
    }
}
