//! Cohort date helpers.
//!
//! Each cohort has its own native date format and its own `to_iso` parser. Both produce
//! [`PartialDate`] values, so derived onset and collection dates can never leak a raw cohort
//! format into a document.

pub mod lifelines;
pub mod rotterdam;

use crate::values::parse_number;
use cdf_types::PartialDate;

/// Project the calendar year of an event from an age reported at a survey.
///
/// `survey_year - survey_age + event_age`, floored to a whole year.
pub fn project_year(survey_year: i32, survey_age: f64, event_age: f64) -> Option<PartialDate> {
    let year = (f64::from(survey_year) - survey_age + event_age).floor();
    if !year.is_finite() || year < 1.0 || year > 9999.0 {
        return None;
    }
    PartialDate::from_year(year as i32).ok()
}

/// [`project_year`] over raw reported ages; either age absent or non-numeric yields `None`.
pub fn project_reported_year(
    survey_year: i32,
    survey_age: Option<&str>,
    event_age: Option<&str>,
) -> Option<PartialDate> {
    let survey_age = parse_number(survey_age?)?;
    let event_age = parse_number(event_age?)?;
    project_year(survey_year, survey_age, event_age)
}
