use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{Database, Iter, StoreError, TryFromKeyValue};
use crate::{
    analyzer::{analyze, content_hash, StringProperties},
    filter::StringFilter,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct StoredString {
    pub(crate) value: String,
    pub(crate) properties: StringProperties,
    pub(crate) created_at: DateTime<Utc>,
}

impl StoredString {
    pub(crate) fn id(&self) -> &str {
        &self.properties.sha256_hash
    }
}

impl TryFromKeyValue for StoredString {
    fn try_from_key_value(key: &[u8], value: &[u8]) -> Result<Self, StoreError> {
        let record: StoredString = bincode::deserialize(value)?;
        if record.id().as_bytes() != key {
            return Err(StoreError::InvalidKey(key.to_vec()));
        }
        Ok(record)
    }
}

impl Database {
    /// Analyzes `value` and stores it, unless the same string is already
    /// stored.
    pub(crate) fn insert_string(&self, value: &str) -> Result<StoredString, StoreError> {
        let record = StoredString {
            value: value.to_string(),
            properties: analyze(value),
            created_at: Utc::now(),
        };
        let encoded = bincode::serialize(&record)?;
        if self
            .strings
            .compare_and_swap(record.id(), None::<&[u8]>, Some(encoded))?
            .is_err()
        {
            return Err(StoreError::Conflict);
        }
        info!(id = record.id(), "stored string");
        Ok(record)
    }

    pub(crate) fn get_string(&self, value: &str) -> Result<Option<StoredString>, StoreError> {
        let key = content_hash(value);
        self.strings
            .get(&key)?
            .map(|raw| StoredString::try_from_key_value(key.as_bytes(), &raw))
            .transpose()
    }

    pub(crate) fn remove_string(&self, value: &str) -> Result<Option<StoredString>, StoreError> {
        let key = content_hash(value);
        let removed = self
            .strings
            .remove(&key)?
            .map(|raw| StoredString::try_from_key_value(key.as_bytes(), &raw))
            .transpose()?;
        if removed.is_some() {
            info!(id = %key, "removed string");
        }
        Ok(removed)
    }

    /// All stored strings, ordered by id.
    pub(crate) fn strings(&self) -> Iter<StoredString> {
        Iter::new(self.strings.iter())
    }

    /// Every stored string that satisfies all predicates of `filter`.
    pub(crate) fn find_strings(
        &self,
        filter: &StringFilter,
    ) -> Result<Vec<StoredString>, StoreError> {
        let mut found = Vec::new();
        for record in self.strings() {
            let record = record?;
            if filter.matches(&record) {
                found.push(record);
            }
        }
        Ok(found)
    }
}
