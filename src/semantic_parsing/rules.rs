use std::sync::LazyLock;

use regex::Regex;

static WORD_COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+)\s+word").expect("valid word count regex"));
static CHARACTER_COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+)\s+character").expect("valid character count regex"));
static CONTAINS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"contain(?:s|ing)?\s+(?:the\s+)?(?:letter\s+)?(\S+)")
        .expect("valid containment regex")
});

/// A single predicate recognized by one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Clause {
    Palindrome,
    WordCount(usize),
    MinLength(i64),
    MaxLength(i64),
    ContainsCharacter(char),
}

/// A matcher over lowercased query text.
pub(crate) type Rule = fn(&str) -> Option<Clause>;

/// Every rule the interpreter applies, in evaluation order.
pub(crate) const RULES: &[(&str, Rule)] = &[
    ("palindrome", palindrome),
    ("word_count", word_count),
    ("min_length", min_length),
    ("max_length", max_length),
    ("contains_character", contains_character),
];

fn palindrome(text: &str) -> Option<Clause> {
    (text.contains("palindrome") || text.contains("palindromic")).then_some(Clause::Palindrome)
}

fn word_count(text: &str) -> Option<Clause> {
    if text.contains("single word") || text.contains("one word") {
        return Some(Clause::WordCount(1));
    }
    if !text.contains("word") {
        return None;
    }
    first_number(&WORD_COUNT_RE, text).map(Clause::WordCount)
}

fn min_length(text: &str) -> Option<Clause> {
    if !(text.contains("longer than") || text.contains("more than")) {
        return None;
    }
    let count: i64 = first_number(&CHARACTER_COUNT_RE, text)?;
    count.checked_add(1).map(Clause::MinLength)
}

fn max_length(text: &str) -> Option<Clause> {
    if !(text.contains("shorter than") || text.contains("less than")) {
        return None;
    }
    // "shorter than 0 characters" yields -1 and matches nothing.
    let count: i64 = first_number(&CHARACTER_COUNT_RE, text)?;
    count.checked_sub(1).map(Clause::MaxLength)
}

fn contains_character(text: &str) -> Option<Clause> {
    let token = CONTAINS_RE.captures(text)?.get(1)?.as_str();
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_lowercase() => Some(Clause::ContainsCharacter(c)),
        _ => None,
    }
}

/// Parses the first capture of `re` in `text`.
///
/// Numbers that overflow `T` count as no match.
fn first_number<T: std::str::FromStr>(re: &Regex, text: &str) -> Option<T> {
    re.captures(text)?.get(1)?.as_str().parse().ok()
}
