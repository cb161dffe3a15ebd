//! Student search semantics.
//!
//! A free-text search is either a roll-number prefix (when it starts with a
//! digit) or a case-insensitive name fragment. Stores evaluate the resulting
//! [`StudentQuery`]; the in-memory store uses [`StudentQuery::matches`]
//! directly, database-backed stores translate [`SearchFilter`] into their own
//! query language.

use serde::{Deserialize, Serialize};

use gatekeep_core::{DomainError, DomainResult};

use crate::store::StudentEntry;
use crate::student::StudentRecord;

/// Number of digits in a roll number.
pub const ROLL_NUMBER_DIGITS: usize = 8;

/// Inclusive roll-number range covered by a numeric search prefix.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollNumberBounds {
    pub lower: i64,
    pub upper: i64,
}

impl RollNumberBounds {
    /// Bounds for a digit-only search string.
    ///
    /// Shorter inputs are padded to [`ROLL_NUMBER_DIGITS`] with `0` for the
    /// lower bound and `9` for the upper bound (`"123"` covers
    /// `12300000..=12399999`). Inputs of eight or more digits match the first
    /// eight digits exactly.
    pub fn from_search(digits: &str) -> DomainResult<Self> {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::validation(format!(
                "roll number search must be numeric, got {digits:?}"
            )));
        }

        if digits.len() >= ROLL_NUMBER_DIGITS {
            let exact = parse_digits(&digits[..ROLL_NUMBER_DIGITS])?;
            return Ok(Self {
                lower: exact,
                upper: exact,
            });
        }

        let padding = ROLL_NUMBER_DIGITS - digits.len();
        let lower = parse_digits(&format!("{digits}{}", "0".repeat(padding)))?;
        let upper = parse_digits(&format!("{digits}{}", "9".repeat(padding)))?;
        Ok(Self { lower, upper })
    }

    pub fn contains(&self, roll_no: i64) -> bool {
        (self.lower..=self.upper).contains(&roll_no)
    }
}

fn parse_digits(s: &str) -> DomainResult<i64> {
    s.parse::<i64>()
        .map_err(|e| DomainError::validation(format!("invalid roll number {s:?}: {e}")))
}

/// What a search matches on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchFilter {
    All,
    RollNumber(RollNumberBounds),
    /// Case-insensitive substring of first or last name, stored lowercased.
    Name(String),
}

/// 1-based page selection.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Pagination {
    /// Pagination is applied only when both values are non-zero.
    pub fn new(page: u32, per_page: u32) -> Option<Self> {
        (page != 0 && per_page != 0).then_some(Self { page, per_page })
    }

    pub fn skip(&self) -> usize {
        (self.page as usize - 1).saturating_mul(self.per_page as usize)
    }

    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.skip())
            .take(self.per_page as usize)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentQuery {
    pub filter: SearchFilter,
    pub pagination: Option<Pagination>,
}

impl StudentQuery {
    pub fn all() -> Self {
        Self {
            filter: SearchFilter::All,
            pagination: None,
        }
    }

    /// Interpret a free-text search plus page parameters.
    pub fn parse(search: &str, page: u32, per_page: u32) -> DomainResult<Self> {
        let search = search.trim();
        let filter = match search.chars().next() {
            None => SearchFilter::All,
            Some(c) if c.is_ascii_digit() => {
                SearchFilter::RollNumber(RollNumberBounds::from_search(search)?)
            }
            Some(_) => SearchFilter::Name(search.to_lowercase()),
        };

        Ok(Self {
            filter,
            pagination: Pagination::new(page, per_page),
        })
    }

    pub fn matches(&self, student: &StudentRecord) -> bool {
        match &self.filter {
            SearchFilter::All => true,
            SearchFilter::RollNumber(bounds) => bounds.contains(student.roll_no),
            SearchFilter::Name(fragment) => {
                student.first_name.to_lowercase().contains(fragment)
                    || student
                        .last_name
                        .as_deref()
                        .is_some_and(|last| last.to_lowercase().contains(fragment))
            }
        }
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentPage {
    pub students: Vec<StudentEntry>,
    /// Number of matches before pagination.
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatekeep_core::RecordId;

    #[test]
    fn short_prefix_is_padded() {
        let b = RollNumberBounds::from_search("123").unwrap();
        assert_eq!(b, RollNumberBounds { lower: 12300000, upper: 12399999 });
    }

    #[test]
    fn eight_or_more_digits_match_exactly() {
        let b = RollNumberBounds::from_search("21075001").unwrap();
        assert_eq!(b, RollNumberBounds { lower: 21075001, upper: 21075001 });

        let b = RollNumberBounds::from_search("2107500199").unwrap();
        assert_eq!(b, RollNumberBounds { lower: 21075001, upper: 21075001 });
    }

    #[test]
    fn digit_led_search_must_be_numeric() {
        let err = StudentQuery::parse("21abc", 0, 0).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn letter_led_search_matches_names_case_insensitively() {
        let q = StudentQuery::parse("RAO", 0, 0).unwrap();
        assert_eq!(q.filter, SearchFilter::Name("rao".into()));

        let mut s = StudentRecord::new(RecordId::new(), "a@iitbhu.ac.in", "Asha");
        assert!(!q.matches(&s));
        s.last_name = Some("Rao".into());
        assert!(q.matches(&s));
    }

    #[test]
    fn empty_search_matches_everything() {
        let q = StudentQuery::parse("  ", 1, 10).unwrap();
        assert_eq!(q.filter, SearchFilter::All);
        assert_eq!(q.pagination, Some(Pagination { page: 1, per_page: 10 }));
    }

    #[test]
    fn pagination_requires_both_values() {
        assert_eq!(Pagination::new(0, 10), None);
        assert_eq!(Pagination::new(2, 0), None);

        let p = Pagination::new(2, 3).unwrap();
        assert_eq!(p.apply((1..=10).collect::<Vec<i32>>()), vec![4, 5, 6]);
        assert_eq!(Pagination::new(5, 3).unwrap().apply((1..=10).collect::<Vec<i32>>()), Vec::<i32>::new());
    }
}
