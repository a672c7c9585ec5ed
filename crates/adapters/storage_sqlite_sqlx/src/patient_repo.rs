//! `SQLite` implementation of [`PatientRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use medtrack_app::ports::PatientRepository;
use medtrack_domain::error::MedTrackError;
use medtrack_domain::id::PatientId;
use medtrack_domain::patient::{NewPatient, Patient};
use medtrack_domain::time::{Timestamp, to_storage_string};

use crate::error::StorageError;
use crate::pool::Database;

/// Wrapper for converting database rows into domain [`Patient`].
struct Wrapper(Patient);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: i64 = row.try_get("id")?;
        let gender: String = row.try_get("gender")?;
        let created_at: String = row.try_get("created_at")?;

        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?
            .to_utc();

        Ok(Self(Patient {
            id: PatientId::from_raw(id),
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            gender: gender.into(),
            date_of_birth: row.try_get("date_of_birth")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            address: row.try_get("address")?,
            blood_group: row.try_get("blood_group")?,
            emergency_contact: row.try_get("emergency_contact")?,
            medical_history: row.try_get("medical_history")?,
            created_at,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO patients (
        first_name, last_name, gender, date_of_birth,
        email, phone, address, blood_group, emergency_contact, medical_history,
        created_at
    )
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
    RETURNING id
";

const SELECT_ALL: &str = "SELECT * FROM patients ORDER BY created_at DESC, id DESC";
const COUNT_ALL: &str = "SELECT COUNT(*) AS count FROM patients";
const COUNT_CREATED_SINCE: &str = "SELECT COUNT(*) AS count FROM patients WHERE created_at >= ?";
const COUNT_BY_GENDER: &str = "SELECT COUNT(*) AS count FROM patients WHERE gender = ?";

fn to_count(raw: Option<i64>) -> Result<Option<u64>, StorageError> {
    raw.map(|n| u64::try_from(n).map_err(|_| StorageError::InvalidCount(n)))
        .transpose()
}

async fn count(
    pool: &SqlitePool,
    statement: &'static str,
    param: Option<String>,
) -> Result<Option<u64>, MedTrackError> {
    let mut query = sqlx::query_scalar::<_, i64>(statement);
    if let Some(param) = param {
        query = query.bind(param);
    }
    let raw = query
        .fetch_optional(pool)
        .await
        .map_err(StorageError::from)?;
    Ok(to_count(raw)?)
}

impl PatientRepository for Database {
    fn insert(
        &self,
        patient: NewPatient,
        created_at: Timestamp,
    ) -> impl Future<Output = Result<PatientId, MedTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            let id: i64 = sqlx::query_scalar(INSERT)
                .bind(patient.first_name)
                .bind(patient.last_name)
                .bind(String::from(patient.gender))
                .bind(patient.date_of_birth)
                .bind(patient.email)
                .bind(patient.phone)
                .bind(patient.address)
                .bind(patient.blood_group)
                .bind(patient.emergency_contact)
                .bind(patient.medical_history)
                .bind(to_storage_string(created_at))
                .fetch_one(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(PatientId::from_raw(id))
        }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Patient>, MedTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn count_all(&self) -> impl Future<Output = Result<Option<u64>, MedTrackError>> + Send {
        let pool = self.pool.clone();
        async move { count(&pool, COUNT_ALL, None).await }
    }

    fn count_created_since(
        &self,
        since: Timestamp,
    ) -> impl Future<Output = Result<Option<u64>, MedTrackError>> + Send {
        let pool = self.pool.clone();
        async move { count(&pool, COUNT_CREATED_SINCE, Some(to_storage_string(since))).await }
    }

    fn count_by_gender(
        &self,
        gender: &str,
    ) -> impl Future<Output = Result<Option<u64>, MedTrackError>> + Send {
        let pool = self.pool.clone();
        let gender = gender.to_string();
        async move { count(&pool, COUNT_BY_GENDER, Some(gender)).await }
    }
}
