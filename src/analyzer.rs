use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Properties derived from a stored string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct StringProperties {
    pub(crate) length: usize,
    pub(crate) is_palindrome: bool,
    pub(crate) unique_characters: usize,
    pub(crate) word_count: usize,
    pub(crate) sha256_hash: String,
    pub(crate) character_frequency_map: BTreeMap<char, usize>,
}

pub(crate) fn analyze(value: &str) -> StringProperties {
    let mut character_frequency_map = BTreeMap::new();
    for c in value.chars() {
        *character_frequency_map.entry(c).or_insert(0) += 1;
    }

    StringProperties {
        length: value.chars().count(),
        is_palindrome: is_palindrome(value),
        unique_characters: value.chars().collect::<HashSet<_>>().len(),
        word_count: value.split_whitespace().count(),
        sha256_hash: content_hash(value),
        character_frequency_map,
    }
}

/// Hex-encoded SHA-256 of the UTF-8 bytes of `value`.
///
/// This is also the key of the string in the database.
pub(crate) fn content_hash(value: &str) -> String {
    format!("{:x}", Sha256::digest(value.as_bytes()))
}

// Case-insensitive and blind to whitespace, so "Never odd or even" counts.
fn is_palindrome(value: &str) -> bool {
    let normalized: Vec<char> = value
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    normalized.iter().eq(normalized.iter().rev())
}
