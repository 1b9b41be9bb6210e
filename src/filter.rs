//! Structured filters over stored strings.
//!
//! A [`StringFilter`] is a set of predicates combined with AND. It is built
//! either from explicit query parameters or by the natural-language
//! interpreter in [`crate::semantic_parsing`], and evaluated by the database.

use serde::Serialize;

use crate::database::StoredString;

/// Inclusive bounds on the length of a string.
///
/// The bounds are signed and never cross-checked, so `max: -1` or `min > max`
/// are representable and simply match nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub(crate) struct LengthRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) max: Option<i64>,
}

impl LengthRange {
    fn contains(&self, length: usize) -> bool {
        let length = i64::try_from(length).unwrap_or(i64::MAX);
        self.min.is_none_or(|min| length >= min) && self.max.is_none_or(|max| length <= max)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub(crate) struct StringFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) is_palindrome: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) word_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) length: Option<LengthRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) contains_character: Option<char>,
}

impl StringFilter {
    /// Returns `true` if no predicate is set.
    pub(crate) fn is_empty(&self) -> bool {
        self.is_palindrome.is_none()
            && self.word_count.is_none()
            && self.length.is_none()
            && self.contains_character.is_none()
    }

    pub(crate) fn with_min_length(mut self, min: i64) -> Self {
        self.length.get_or_insert_with(LengthRange::default).min = Some(min);
        self
    }

    pub(crate) fn with_max_length(mut self, max: i64) -> Self {
        self.length.get_or_insert_with(LengthRange::default).max = Some(max);
        self
    }

    /// Checks every present predicate against `record`.
    ///
    /// An empty filter matches every record.
    pub(crate) fn matches(&self, record: &StoredString) -> bool {
        let props = &record.properties;
        if self
            .is_palindrome
            .is_some_and(|expected| props.is_palindrome != expected)
        {
            return false;
        }
        if self
            .word_count
            .is_some_and(|expected| props.word_count != expected)
        {
            return false;
        }
        if self
            .length
            .is_some_and(|range| !range.contains(props.length))
        {
            return false;
        }
        if let Some(c) = self.contains_character {
            let needle: String = c.to_lowercase().collect();
            if !record.value.to_lowercase().contains(&needle) {
                return false;
            }
        }
        true
    }
}
