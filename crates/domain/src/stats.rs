//! Aggregate statistics over the patient table.

use serde::{Deserialize, Serialize};

/// Counts derived from the current rows, built fresh per request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientStats {
    pub total: u64,
    /// Rows whose `created_at` falls within the trailing seven days.
    pub new_this_week: u64,
    pub male_count: u64,
    pub female_count: u64,
}

impl PatientStats {
    /// Rows whose gender is neither `"Male"` nor `"Female"`.
    #[must_use]
    pub fn other_count(&self) -> u64 {
        self.total
            .saturating_sub(self.male_count)
            .saturating_sub(self.female_count)
    }
}
