//! A registered person, and the input used to register one.
//!
//! The data layer validates nothing about the fields it stores; form-level
//! rules belong to the caller. The only normalization is that blank optional
//! fields are recorded as absent rather than as empty strings.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::PatientId;
use crate::time::Timestamp;

/// Gender as recorded on registration.
///
/// Only the exact literals `"Male"` and `"Female"` count toward the gender
/// statistics; anything else is kept verbatim as [`Gender::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Gender {
    Male,
    Female,
    Other(String),
}

impl Gender {
    pub const MALE: &'static str = "Male";
    pub const FEMALE: &'static str = "Female";

    /// Return the stored text form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Male => Self::MALE,
            Self::Female => Self::FEMALE,
            Self::Other(value) => value,
        }
    }
}

impl From<String> for Gender {
    fn from(value: String) -> Self {
        match value.as_str() {
            Self::MALE => Self::Male,
            Self::FEMALE => Self::Female,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for Gender {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<Gender> for String {
    fn from(value: Gender) -> Self {
        match value {
            Gender::Other(value) => value,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted patient row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: PatientId,
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    /// ISO-8601 calendar date (`YYYY-MM-DD`), stored as given.
    pub date_of_birth: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub blood_group: Option<String>,
    pub emergency_contact: Option<String>,
    pub medical_history: Option<String>,
    /// Set once by the data layer at insertion.
    pub created_at: Timestamp,
}

impl Patient {
    /// `"first last"`, as shown in listings.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Case-insensitive substring match over full name, email and phone.
    ///
    /// A blank query matches every patient.
    #[must_use]
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        [
            Some(self.full_name()),
            self.email.clone(),
            self.phone.clone(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&query))
    }
}

/// Fields supplied by the caller when registering a patient.
///
/// `id` and `created_at` are deliberately absent: the repository assigns both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPatient {
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub date_of_birth: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub blood_group: Option<String>,
    #[serde(default)]
    pub emergency_contact: Option<String>,
    #[serde(default)]
    pub medical_history: Option<String>,
}

impl NewPatient {
    /// Start from the four required fields; optional fields begin absent.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        gender: impl Into<Gender>,
        date_of_birth: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            gender: gender.into(),
            date_of_birth: date_of_birth.into(),
            email: None,
            phone: None,
            address: None,
            blood_group: None,
            emergency_contact: None,
            medical_history: None,
        }
    }

    #[must_use]
    pub fn email(mut self, value: impl Into<String>) -> Self {
        self.email = non_blank(value.into());
        self
    }

    #[must_use]
    pub fn phone(mut self, value: impl Into<String>) -> Self {
        self.phone = non_blank(value.into());
        self
    }

    #[must_use]
    pub fn address(mut self, value: impl Into<String>) -> Self {
        self.address = non_blank(value.into());
        self
    }

    #[must_use]
    pub fn blood_group(mut self, value: impl Into<String>) -> Self {
        self.blood_group = non_blank(value.into());
        self
    }

    #[must_use]
    pub fn emergency_contact(mut self, value: impl Into<String>) -> Self {
        self.emergency_contact = non_blank(value.into());
        self
    }

    #[must_use]
    pub fn medical_history(mut self, value: impl Into<String>) -> Self {
        self.medical_history = non_blank(value.into());
        self
    }

    /// Normalize optional fields deserialized from caller input.
    ///
    /// Blank strings become `None`; required fields are left untouched.
    #[must_use]
    pub fn normalized(self) -> Self {
        let blank = |value: Option<String>| value.and_then(non_blank);
        Self {
            email: blank(self.email),
            phone: blank(self.phone),
            address: blank(self.address),
            blood_group: blank(self.blood_group),
            emergency_contact: blank(self.emergency_contact),
            medical_history: blank(self.medical_history),
            ..self
        }
    }
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
