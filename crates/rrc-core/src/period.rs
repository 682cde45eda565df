//! Class periods - the atomic unit of booking.

use crate::error::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Label suffix used on period strings shown to users ("3교시").
pub const PERIOD_LABEL_SUFFIX: &str = "교시";

/// First bookable period of the day.
pub const FIRST_PERIOD: u8 = 1;

/// Last bookable period of the day.
pub const LAST_PERIOD: u8 = 9;

/// A fixed one-hour class slot, numbered 1-9.
///
/// Periods are the atomic unit of booking: a multi-hour reservation is
/// submitted to the server as one request per covered period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Period(u8);

impl Period {
    /// Creates a period from its number. Valid numbers are 1..=9.
    pub fn new(number: u8) -> DomainResult<Self> {
        if (FIRST_PERIOD..=LAST_PERIOD).contains(&number) {
            Ok(Self(number))
        } else {
            Err(DomainError::InvalidPeriod {
                value: number.to_string(),
            })
        }
    }

    /// Parses a period from a user-facing label.
    ///
    /// Accepts both the localized label form ("3교시") and a bare
    /// number ("3"), since combo boxes and wire fields use either.
    pub fn from_label(label: &str) -> DomainResult<Self> {
        let trimmed = label.trim();
        let digits = trimmed.strip_suffix(PERIOD_LABEL_SUFFIX).unwrap_or(trimmed);
        let number: u8 = digits
            .trim()
            .parse()
            .map_err(|_| DomainError::InvalidPeriod {
                value: label.to_string(),
            })?;
        Self::new(number)
    }

    /// Returns the period number (1-9).
    pub fn number(&self) -> u8 {
        self.0
    }

    /// Returns the user-facing label ("3교시").
    pub fn label(&self) -> String {
        format!("{}{}", self.0, PERIOD_LABEL_SUFFIX)
    }

    /// Iterates every period in the inclusive range `start..=end`.
    ///
    /// Returns an empty iterator when `start > end`; the workflow rejects
    /// that ordering before ever asking for the range.
    pub fn range(start: Period, end: Period) -> impl Iterator<Item = Period> {
        (start.0..=end.0).map(Period)
    }

    /// Duration in hours of the inclusive range `start..=end`.
    pub fn duration(start: Period, end: Period) -> u8 {
        end.0.saturating_sub(start.0).saturating_add(1)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.0, PERIOD_LABEL_SUFFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_accepts_bookable_range() {
        assert!(Period::new(1).is_ok());
        assert!(Period::new(9).is_ok());
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(Period::new(0).is_err());
        assert!(Period::new(10).is_err());
    }

    #[test]
    fn test_from_label_localized() {
        let period = Period::from_label("3교시").unwrap();
        assert_eq!(period.number(), 3);
    }

    #[test]
    fn test_from_label_bare_number() {
        let period = Period::from_label(" 7 ").unwrap();
        assert_eq!(period.number(), 7);
    }

    #[test]
    fn test_from_label_garbage() {
        assert!(Period::from_label("third").is_err());
        assert!(Period::from_label("").is_err());
    }

    #[test]
    fn test_display_matches_label() {
        let period = Period::new(5).unwrap();
        assert_eq!(period.to_string(), "5교시");
        assert_eq!(period.label(), "5교시");
    }

    #[test]
    fn test_range_inclusive() {
        let start = Period::new(2).unwrap();
        let end = Period::new(4).unwrap();
        let numbers: Vec<u8> = Period::range(start, end).map(|p| p.number()).collect();
        assert_eq!(numbers, vec![2, 3, 4]);
    }

    #[test]
    fn test_range_empty_when_reversed() {
        let start = Period::new(4).unwrap();
        let end = Period::new(2).unwrap();
        assert_eq!(Period::range(start, end).count(), 0);
    }

    #[test]
    fn test_duration() {
        let one = Period::new(1).unwrap();
        let three = Period::new(3).unwrap();
        assert_eq!(Period::duration(one, one), 1);
        assert_eq!(Period::duration(one, three), 3);
    }

    #[test]
    fn test_serde_transparent() {
        let period = Period::new(6).unwrap();
        let json = serde_json::to_string(&period).unwrap();
        assert_eq!(json, "6");
    }
}
