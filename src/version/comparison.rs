//! Maven version ordering.
//!
//! Versions are split into numeric and qualifier tokens at `.`, `-`, `_`, `+`
//! and at every transition between digits and letters, so `1.10.0-rc2` becomes
//! `[1, 10, 0, "rc", 2]`. Tokens are compared pairwise:
//!
//! - two numbers compare numerically (`1.10` > `1.9`), with any number of digits
//! - a missing trailing token counts as `0` against a number and as the release
//!   marker against a qualifier, so `1.0` == `1.0.0` and `1.0-alpha` < `1.0`
//! - a number is greater than a qualifier at the same position
//! - qualifiers rank `alpha` < `beta` < `milestone` < `rc` < `snapshot` <
//!   release (`""`, `ga`, `final`, `release`) < `sp`; unknown qualifiers rank
//!   after `sp` and compare case-insensitively among themselves
//!
//! Single letters `a`, `b` and `m` directly followed by a digit are aliases of
//! `alpha`, `beta` and `milestone`, and `cr` is an alias of `rc`.
//!
//! # Examples
//!
//! ```rust
//! use depgraph_cli::version::VersionComparator;
//! use std::cmp::Ordering;
//!
//! assert_eq!(VersionComparator::compare("1.10", "1.9"), Ordering::Greater);
//! assert_eq!(VersionComparator::compare("2.0-rc1", "2.0"), Ordering::Less);
//! assert_eq!(VersionComparator::compare("1.0", "1.0.0"), Ordering::Equal);
//!
//! let versions = ["1.2", "1.10", "1.9.3"];
//! assert_eq!(VersionComparator::get_latest(versions), Some("1.10"));
//! ```

use std::cmp::Ordering;
use std::fmt;

/// One comparable piece of a version string.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    /// Digits with leading zeros stripped (`"0"` for zero).
    Number(String),
    /// Lower-cased qualifier with aliases applied.
    Qualifier(String),
}

/// A parsed Maven version.
#[derive(Debug, Clone)]
pub struct MavenVersion {
    raw: String,
    tokens: Vec<Token>,
}

impl MavenVersion {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            tokens: tokenize(raw),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for MavenVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl PartialEq for MavenVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MavenVersion {}

impl PartialOrd for MavenVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MavenVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.tokens.len().max(other.tokens.len());
        for i in 0..len {
            let ord = match (self.tokens.get(i), other.tokens.get(i)) {
                (Some(a), Some(b)) => compare_tokens(a, b),
                (Some(a), None) => compare_to_missing(a),
                (None, Some(b)) => compare_to_missing(b).reverse(),
                (None, None) => Ordering::Equal,
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

fn tokenize(raw: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut current_is_digit = false;

    let flush = |current: &mut String, is_digit: bool, tokens: &mut Vec<Token>| {
        if current.is_empty() {
            return;
        }
        if is_digit {
            let trimmed = current.trim_start_matches('0');
            let number = if trimmed.is_empty() { "0" } else { trimmed };
            tokens.push(Token::Number(number.to_string()));
        } else {
            tokens.push(Token::Qualifier(current.to_ascii_lowercase()));
        }
        current.clear();
    };

    for ch in raw.trim().chars() {
        if matches!(ch, '.' | '-' | '_' | '+') {
            flush(&mut current, current_is_digit, &mut tokens);
            continue;
        }
        let is_digit = ch.is_ascii_digit();
        if !current.is_empty() && is_digit != current_is_digit {
            flush(&mut current, current_is_digit, &mut tokens);
        }
        current_is_digit = is_digit;
        current.push(ch);
    }
    flush(&mut current, current_is_digit, &mut tokens);

    apply_aliases(&mut tokens);
    tokens
}

fn apply_aliases(tokens: &mut [Token]) {
    for i in 0..tokens.len() {
        let followed_by_number = matches!(tokens.get(i + 1), Some(Token::Number(_)));
        if let Token::Qualifier(q) = &mut tokens[i] {
            let alias = match q.as_str() {
                "a" if followed_by_number => Some("alpha"),
                "b" if followed_by_number => Some("beta"),
                "m" if followed_by_number => Some("milestone"),
                "cr" => Some("rc"),
                "ga" | "final" | "release" => Some(""),
                _ => None,
            };
            if let Some(alias) = alias {
                *q = alias.to_string();
            }
        }
    }
}

fn qualifier_rank(q: &str) -> usize {
    match q {
        "alpha" => 0,
        "beta" => 1,
        "milestone" => 2,
        "rc" => 3,
        "snapshot" => 4,
        "" => 5,
        "sp" => 6,
        _ => 7,
    }
}

fn compare_numbers(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn compare_qualifiers(a: &str, b: &str) -> Ordering {
    qualifier_rank(a)
        .cmp(&qualifier_rank(b))
        .then_with(|| a.cmp(b))
}

fn compare_tokens(a: &Token, b: &Token) -> Ordering {
    match (a, b) {
        (Token::Number(a), Token::Number(b)) => compare_numbers(a, b),
        (Token::Qualifier(a), Token::Qualifier(b)) => compare_qualifiers(a, b),
        (Token::Number(_), Token::Qualifier(_)) => Ordering::Greater,
        (Token::Qualifier(_), Token::Number(_)) => Ordering::Less,
    }
}

fn compare_to_missing(token: &Token) -> Ordering {
    match token {
        Token::Number(n) => compare_numbers(n, "0"),
        Token::Qualifier(q) => compare_qualifiers(q, ""),
    }
}

/// Static helpers over version strings.
pub struct VersionComparator;

impl VersionComparator {
    /// Compares two version strings with Maven ordering.
    #[must_use]
    pub fn compare(a: &str, b: &str) -> Ordering {
        MavenVersion::parse(a).cmp(&MavenVersion::parse(b))
    }

    /// Total order used to pick a winner: Maven ordering, then the raw text so
    /// that equivalent spellings (`1.0` and `1.0.0`) still resolve the same way
    /// on every run.
    #[must_use]
    pub fn compare_strict(a: &str, b: &str) -> Ordering {
        Self::compare(a, b).then_with(|| a.cmp(b))
    }

    /// Returns true if any of `versions` is newer than `current`.
    pub fn has_newer_version<'a>(current: &str, versions: impl IntoIterator<Item = &'a str>) -> bool {
        let current = MavenVersion::parse(current);
        versions
            .into_iter()
            .any(|v| MavenVersion::parse(v) > current)
    }

    /// Highest version of the input, or `None` for an empty input.
    pub fn get_latest<'a>(versions: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
        versions
            .into_iter()
            .max_by(|a, b| Self::compare_strict(a, b))
    }
}
