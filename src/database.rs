mod string;

use std::{marker::PhantomData, path::Path};

use anyhow::{Context, Result};
use sled::{Db, Tree};
use thiserror::Error;

pub(crate) use self::string::StoredString;

const STRING_TREE: &str = "strings";

#[derive(Debug, Error)]
pub(crate) enum StoreError {
    #[error("String already exists in the system")]
    Conflict,

    #[error("invalid key in database: {0:02x?}")]
    InvalidKey(Vec<u8>),

    #[error("storage failure: {0}")]
    Storage(#[from] sled::Error),

    #[error("failed to encode or decode a stored string: {0}")]
    Codec(#[from] bincode::Error),
}

#[derive(Clone)]
pub(crate) struct Database {
    db: Db,
    strings: Tree,
}

impl Database {
    pub(crate) fn connect(path: &Path) -> Result<Database> {
        let db = sled::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;
        let strings = db
            .open_tree(STRING_TREE)
            .context("failed to open the string tree")?;
        Ok(Database { db, strings })
    }

    /// Writes every dirty buffer to disk.
    pub(crate) fn flush(&self) -> Result<usize> {
        Ok(self.db.flush()?)
    }
}

/// Decodes a record from a raw key/value pair of a tree.
pub(crate) trait TryFromKeyValue: Sized {
    fn try_from_key_value(key: &[u8], value: &[u8]) -> Result<Self, StoreError>;
}

/// Iterator over the decoded records of a tree.
pub(crate) struct Iter<T> {
    inner: sled::Iter,
    phantom: PhantomData<T>,
}

impl<T> Iter<T> {
    fn new(inner: sled::Iter) -> Self {
        Self {
            inner,
            phantom: PhantomData,
        }
    }
}

impl<T: TryFromKeyValue> Iterator for Iter<T> {
    type Item = Result<T, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.inner.next()?;
        Some(item.map_err(StoreError::from).and_then(|(key, value)| {
            T::try_from_key_value(&key, &value)
        }))
    }
}
