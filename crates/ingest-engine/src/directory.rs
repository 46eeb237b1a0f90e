//! Contact correlation against the external directory
//!
//! The directory is owned by another system; this process only ever reads
//! it, keyed by the canonical 10-digit number.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use sqlx::PgPool;
use thiserror::Error;

use crate::types::ContactMatch;

/// Errors from a directory lookup
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The lookup query failed
    #[error("directory lookup failed: {0}")]
    Lookup(#[from] sqlx::Error),
}

/// Resolves canonical 10-digit numbers to known contacts
///
/// A number may map to several contacts; the first row in the directory's
/// natural order wins. No preferred tie-break is defined upstream, so
/// callers must not rely on which contact is returned in that case.
#[async_trait]
pub trait ContactDirectory: Send + Sync {
    async fn find_by_phone(&self, phone10: &str)
        -> Result<Option<ContactMatch>, DirectoryError>;
}

/// Directory backed by the external `contacts` table
pub struct PgContactDirectory {
    pool: PgPool,
}

impl PgContactDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ContactRow {
    id: i64,
    contract_id: Option<String>,
    first_name: String,
    last_name: Option<String>,
}

impl From<ContactRow> for ContactMatch {
    fn from(row: ContactRow) -> Self {
        let display_name = format!(
            "{} {}",
            row.first_name,
            row.last_name.as_deref().unwrap_or("")
        )
        .trim()
        .to_string();
        Self {
            contact_id: row.id,
            contract_id: row.contract_id,
            display_name,
        }
    }
}

#[async_trait]
impl ContactDirectory for PgContactDirectory {
    async fn find_by_phone(
        &self,
        phone10: &str,
    ) -> Result<Option<ContactMatch>, DirectoryError> {
        let row = sqlx::query_as::<_, ContactRow>(
            "SELECT id, contract_id, first_name, last_name \
             FROM contacts WHERE phone_10 = $1 LIMIT 1",
        )
        .bind(phone10)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(ContactMatch::from))
    }
}

/// In-memory directory for tests and local runs
#[derive(Debug, Default)]
pub struct MemoryContactDirectory {
    contacts: RwLock<HashMap<String, ContactMatch>>,
}

impl MemoryContactDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a contact under its canonical number
    pub fn insert(&self, phone10: impl Into<String>, contact: ContactMatch) {
        self.contacts.write().insert(phone10.into(), contact);
    }
}

#[async_trait]
impl ContactDirectory for MemoryContactDirectory {
    async fn find_by_phone(
        &self,
        phone10: &str,
    ) -> Result<Option<ContactMatch>, DirectoryError> {
        Ok(self.contacts.read().get(phone10).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_directory_hit_and_miss() {
        let directory = MemoryContactDirectory::new();
        directory.insert(
            "5512345678",
            ContactMatch {
                contact_id: 7,
                contract_id: Some("CT-0099".into()),
                display_name: "Ana Reyes".into(),
            },
        );

        let hit = directory.find_by_phone("5512345678").await.unwrap();
        assert_eq!(hit.unwrap().contact_id, 7);

        let miss = directory.find_by_phone("5599999999").await.unwrap();
        assert!(miss.is_none());
    }

    #[test]
    fn display_name_drops_missing_surname() {
        let with = ContactMatch::from(ContactRow {
            id: 1,
            contract_id: None,
            first_name: "Ana".into(),
            last_name: Some("Reyes".into()),
        });
        assert_eq!(with.display_name, "Ana Reyes");

        let without = ContactMatch::from(ContactRow {
            id: 2,
            contract_id: None,
            first_name: "Benito".into(),
            last_name: None,
        });
        assert_eq!(without.display_name, "Benito");
    }
}
