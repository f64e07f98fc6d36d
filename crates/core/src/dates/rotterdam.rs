//! Rotterdam dates: `DD-MM-YYYY`, as delivered by the registry linkage.

use cdf_types::PartialDate;

/// Parse a Rotterdam date into a full date.
///
/// Malformed text, a zero part or an impossible calendar date yields `None`.
pub fn to_iso(date: &str) -> Option<PartialDate> {
    let mut parts = date.trim().split('-');
    let day: u32 = parts.next()?.trim().parse().ok()?;
    let month: u32 = parts.next()?.trim().parse().ok()?;
    let year: i32 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() || day == 0 || month == 0 || year == 0 {
        return None;
    }
    PartialDate::from_ymd(year, month, day).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_registry_dates() {
        let date = to_iso("15-03-2005").expect("valid");
        assert_eq!(date.to_string(), "2005-03-15");
    }

    #[test]
    fn round_trip_preserves_day_and_month() {
        for text in ["01-01-1990", "29-02-2000", "31-12-2018"] {
            let date = to_iso(text).expect("valid");
            let (day, month, year) = (&text[0..2], &text[3..5], &text[6..]);
            assert_eq!(date.to_string(), format!("{year}-{month}-{day}"));
        }
    }

    #[test]
    fn malformed_dates_yield_nothing() {
        for text in ["", "2005-03-15x", "00-03-2005", "15-00-2005", "31-02-2005", "15-03", "a-b-c"] {
            assert_eq!(to_iso(text), None, "{text}");
        }
    }
}
