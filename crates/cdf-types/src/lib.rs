//! Validated primitive types shared across the CDF workspace.
//!
//! Responsibilities:
//! - Represent FHIR-style partial dates (`YYYY`, `YYYY-MM`, `YYYY-MM-DD`) so that a derived onset
//!   or collection date can never carry a raw cohort-format date
//! - Represent the administrative gender used by gender-dependent reference ranges

use chrono::{Datelike, NaiveDate};
use std::cmp::Ordering;

/// Errors that can occur when creating validated types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TypeError {
    /// The input text was empty or contained only whitespace
    #[error("text cannot be empty")]
    Empty,

    /// The input text is not a `YYYY`, `YYYY-MM` or `YYYY-MM-DD` date
    #[error("invalid partial date: {0}")]
    InvalidPartialDate(String),
}

/// Type alias for Results that can fail with a [`TypeError`].
pub type TypeResult<T> = Result<T, TypeError>;

const MIN_YEAR: i32 = 1;
const MAX_YEAR: i32 = 9999;

// ============================================================================
// Partial dates
// ============================================================================

/// Granularity of a [`PartialDate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum DatePrecision {
    Year,
    Month,
    Day,
}

/// A date known to year, year-month or full-day granularity.
///
/// Ordering compares the first day each value covers, then precision, so `2001` sorts before
/// `2001-01` which sorts before `2001-01-01`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PartialDate {
    Year(i32),
    YearMonth { year: i32, month: u32 },
    Date(NaiveDate),
}

impl PartialDate {
    /// Creates a year-only date.
    pub fn from_year(year: i32) -> TypeResult<Self> {
        check_year(year)?;
        Ok(Self::Year(year))
    }

    /// Creates a year-month date. `month` is 1-based.
    pub fn from_year_month(year: i32, month: u32) -> TypeResult<Self> {
        check_year(year)?;
        if !(1..=12).contains(&month) {
            return Err(TypeError::InvalidPartialDate(format!("{year}-{month}")));
        }
        Ok(Self::YearMonth { year, month })
    }

    /// Creates a full calendar date, rejecting impossible days such as 31 February.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> TypeResult<Self> {
        check_year(year)?;
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self::Date)
            .ok_or_else(|| TypeError::InvalidPartialDate(format!("{year}-{month}-{day}")))
    }

    /// Parses the FHIR partial-date lexical form.
    ///
    /// Year must have four digits; month and day must have two.
    pub fn parse(text: &str) -> TypeResult<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(TypeError::Empty);
        }

        let invalid = || TypeError::InvalidPartialDate(trimmed.to_owned());
        let parts: Vec<&str> = trimmed.split('-').collect();
        let numeric = |part: &str, width: usize| -> TypeResult<u32> {
            if part.len() != width || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            part.parse::<u32>().map_err(|_| invalid())
        };

        match parts.as_slice() {
            [year] => Self::from_year(numeric(year, 4)? as i32),
            [year, month] => Self::from_year_month(numeric(year, 4)? as i32, numeric(month, 2)?),
            [year, month, day] => Self::from_ymd(
                numeric(year, 4)? as i32,
                numeric(month, 2)?,
                numeric(day, 2)?,
            ),
            _ => Err(invalid()),
        }
    }

    pub fn year(&self) -> i32 {
        match self {
            Self::Year(year) => *year,
            Self::YearMonth { year, .. } => *year,
            Self::Date(date) => date.year(),
        }
    }

    pub fn month(&self) -> Option<u32> {
        match self {
            Self::Year(_) => None,
            Self::YearMonth { month, .. } => Some(*month),
            Self::Date(date) => Some(date.month()),
        }
    }

    pub fn day(&self) -> Option<u32> {
        match self {
            Self::Date(date) => Some(date.day()),
            _ => None,
        }
    }

    pub fn precision(&self) -> DatePrecision {
        match self {
            Self::Year(_) => DatePrecision::Year,
            Self::YearMonth { .. } => DatePrecision::Month,
            Self::Date(_) => DatePrecision::Day,
        }
    }

    /// First calendar day covered by this date.
    pub fn first_day(&self) -> NaiveDate {
        match self {
            Self::Date(date) => *date,
            // Years and months were range-checked on construction.
            _ => NaiveDate::from_ymd_opt(self.year(), self.month().unwrap_or(1), 1)
                .unwrap_or(NaiveDate::MIN),
        }
    }

    /// Drops the day component, leaving year-only dates untouched.
    pub fn truncate_to_month(self) -> Self {
        match self {
            Self::Date(date) => Self::YearMonth {
                year: date.year(),
                month: date.month(),
            },
            other => other,
        }
    }
}

fn check_year(year: i32) -> TypeResult<()> {
    if (MIN_YEAR..=MAX_YEAR).contains(&year) {
        Ok(())
    } else {
        Err(TypeError::InvalidPartialDate(year.to_string()))
    }
}

impl Ord for PartialDate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.first_day()
            .cmp(&other.first_day())
            .then_with(|| self.precision().cmp(&other.precision()))
    }
}

impl PartialOrd for PartialDate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for PartialDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Year(year) => write!(f, "{year:04}"),
            Self::YearMonth { year, month } => write!(f, "{year:04}-{month:02}"),
            Self::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

impl std::str::FromStr for PartialDate {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for PartialDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for PartialDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PartialDate::parse(&s).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Gender
// ============================================================================

/// Administrative gender as recorded by the cohorts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Case-insensitive `male` / `female`; anything else is unrecognised.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "male" => Some(Self::Male),
            "female" => Some(Self::Female),
            _ => None,
        }
    }
}
