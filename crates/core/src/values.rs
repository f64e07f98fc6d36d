//! Scalar value coercions shared by both cohorts.

/// Trimmed decimal parse; non-numeric and non-finite text yields `None`.
pub fn parse_number(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Registry boolean: `true`, `1` and `yes` (case-insensitive) are true, anything else false.
pub fn parse_registry_flag(text: Option<&str>) -> bool {
    text.map(str::trim).is_some_and(|value| {
        ["true", "1", "yes"]
            .iter()
            .any(|truthy| value.eq_ignore_ascii_case(truthy))
    })
}
