//! Interprets free-text queries such as "palindromic strings longer than 5
//! characters" as a [`StringFilter`].
//!
//! The interpreter lowercases the query and runs every rule in [`rules::RULES`]
//! over it. Rules are independent: each one looks for its own phrase and
//! contributes at most one predicate, so several may fire on the same query.
//! A query that no rule recognizes is rejected rather than treated as "match
//! everything".

mod rules;

use thiserror::Error;
use tracing::debug;

use self::rules::{Clause, RULES};
use crate::filter::StringFilter;

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum InterpretError {
    #[error("Query parameter is required")]
    EmptyQuery,

    #[error("Unable to parse natural language query")]
    NoIntent { original: String },
}

pub(crate) fn interpret(query: &str) -> Result<StringFilter, InterpretError> {
    if query.is_empty() {
        return Err(InterpretError::EmptyQuery);
    }

    let normalized = query.to_lowercase();
    let mut filter = StringFilter::default();
    for (name, rule) in RULES {
        if let Some(clause) = rule(&normalized) {
            debug!(rule = name, ?clause, "natural language rule matched");
            filter = merge(filter, clause);
        }
    }

    if filter.is_empty() {
        return Err(InterpretError::NoIntent {
            original: query.to_string(),
        });
    }
    Ok(filter)
}

fn merge(mut filter: StringFilter, clause: Clause) -> StringFilter {
    match clause {
        Clause::Palindrome => filter.is_palindrome = Some(true),
        Clause::WordCount(count) => filter.word_count = Some(count),
        Clause::MinLength(min) => return filter.with_min_length(min),
        Clause::MaxLength(max) => return filter.with_max_length(max),
        Clause::ContainsCharacter(c) => filter.contains_character = Some(c),
    }
    filter
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::filter::LengthRange;

    fn parsed(query: &str) -> serde_json::Value {
        serde_json::to_value(interpret(query).unwrap()).unwrap()
    }

    #[test]
    fn palindrome_in_any_case() {
        for query in ["palindrome", "PALINDROME", "Palindromic strings", "show me PalinDromes"] {
            assert_eq!(interpret(query).unwrap().is_palindrome, Some(true), "{query}");
        }
        assert_eq!(interpret("PALINDROME"), interpret("palindrome"));
    }

    #[test]
    fn single_word() {
        assert_eq!(parsed("single word strings"), json!({ "word_count": 1 }));
    }

    #[test]
    fn numbered_word_count() {
        assert_eq!(parsed("3 word phrases"), json!({ "word_count": 3 }));
    }

    #[test]
    fn longer_than() {
        assert_eq!(
            parsed("strings longer than 5 characters"),
            json!({ "length": { "min": 6 } })
        );
    }

    #[test]
    fn shorter_than() {
        assert_eq!(
            parsed("strings shorter than 10 characters"),
            json!({ "length": { "max": 9 } })
        );
    }

    #[test]
    fn shorter_than_zero_is_kept_as_is() {
        assert_eq!(
            parsed("strings shorter than 0 characters"),
            json!({ "length": { "max": -1 } })
        );
    }

    #[test]
    fn both_bounds_share_the_character_count() {
        let filter = interpret("longer than 3 characters but less than 3 characters").unwrap();
        assert_eq!(
            filter.length,
            Some(LengthRange {
                min: Some(4),
                max: Some(2),
            })
        );
    }

    #[test]
    fn containing_letter() {
        assert_eq!(
            parsed("strings containing the letter a"),
            json!({ "contains_character": "a" })
        );
    }

    #[test]
    fn combined_clauses() {
        assert_eq!(
            parsed("palindromic strings containing a longer than 3 characters"),
            json!({
                "is_palindrome": true,
                "contains_character": "a",
                "length": { "min": 4 },
            })
        );
        assert_eq!(
            parsed("palindromic words containing the letter a longer than 5 characters"),
            json!({
                "is_palindrome": true,
                "contains_character": "a",
                "length": { "min": 6 },
            })
        );
    }

    #[test]
    fn unrecognized_query() {
        assert_eq!(
            interpret("hello world"),
            Err(InterpretError::NoIntent {
                original: "hello world".to_string(),
            })
        );
    }

    #[test]
    fn no_intent_keeps_original_casing() {
        let Err(InterpretError::NoIntent { original }) = interpret("Hello World") else {
            panic!("expected no intent");
        };
        assert_eq!(original, "Hello World");
    }

    #[test]
    fn ignored_clause_alone_is_no_intent() {
        assert!(matches!(
            interpret("strings containing xyz"),
            Err(InterpretError::NoIntent { .. })
        ));
    }

    #[test]
    fn empty_query() {
        assert_eq!(interpret(""), Err(InterpretError::EmptyQuery));
    }

    #[test]
    fn interpretation_is_idempotent() {
        let query = "Single word palindromes containing the letter k shorter than 8 characters";
        let first = interpret(query).unwrap();
        for _ in 0..3 {
            assert_eq!(interpret(query).unwrap(), first);
        }
    }
}
