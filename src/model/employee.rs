use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// The names a recognition result may legitimately carry for an employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EmployeeIdentity {
    pub id: u64,
    /// Canonical identifier, also the label faces are enrolled under.
    pub employee_code: String,
    /// Full name as recorded on the personal info sheet.
    pub full_name: Option<String>,
    pub first_name: String,
    pub last_name: String,
}

#[inline]
fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

impl EmployeeIdentity {
    /// Case-normalized identities accepted for this employee.
    pub fn acceptable_identities(&self) -> HashSet<String> {
        let account_name = format!("{} {}", self.first_name.trim(), self.last_name.trim());

        [
            Some(self.employee_code.as_str()),
            self.full_name.as_deref(),
            Some(account_name.as_str()),
        ]
        .into_iter()
        .flatten()
        .map(normalize)
        .filter(|name| !name.is_empty())
        .collect()
    }

    pub fn matches(&self, recognized: &str) -> bool {
        let recognized = normalize(recognized);
        !recognized.is_empty() && self.acceptable_identities().contains(&recognized)
    }
}
