use serde::{Deserialize, Serialize};

/// One contact read from the input file.
///
/// `email` is the natural key: reply-to address if present, otherwise the
/// sender address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub email: String,
    pub name: String,
    pub phone: String,
}

impl ContactRecord {
    pub fn new(email: impl Into<String>, name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            phone: phone.into(),
        }
    }

    /// Resolve the key from the two address columns.
    pub fn from_columns(reply_to: &str, from: &str, name: &str, phone: &str) -> Self {
        let email = if reply_to.is_empty() { from } else { reply_to };
        Self::new(email, name, phone)
    }
}

/// A persisted row of the `contacts` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ContactRow {
    pub email: String,
    pub name: String,
    pub phone: String,
}

impl From<&ContactRecord> for ContactRow {
    fn from(record: &ContactRecord) -> Self {
        Self {
            email: record.email.clone(),
            name: record.name.clone(),
            phone: record.phone.clone(),
        }
    }
}
