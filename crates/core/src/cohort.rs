//! Cohort selection.
//!
//! A [`Cohort`] picks the concrete derivation family (self-report or registry-linked), the wave
//! ordering used by the accessors, and the default set of document targets.

use crate::constants::{LIFELINES_WAVES, ROTTERDAM_WAVES};
use crate::{DerivationError, DerivationResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A supported cohort study.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cohort {
    /// Multi-wave self-report cohort.
    Lifelines,
    /// Single-wave registry-linked cohort.
    Rotterdam,
}

impl Cohort {
    pub const ALL: [Cohort; 2] = [Cohort::Lifelines, Cohort::Rotterdam];

    pub fn as_str(self) -> &'static str {
        match self {
            Cohort::Lifelines => "lifelines",
            Cohort::Rotterdam => "rotterdam",
        }
    }

    /// Parse a cohort name, case-insensitively.
    pub fn parse(name: &str) -> DerivationResult<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|cohort| cohort.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                DerivationError::InvalidInput(format!(
                    "unknown cohort '{name}' (expected lifelines or rotterdam)"
                ))
            })
    }

    /// The wave holding retrospective questions and the participant's pseudo id.
    pub fn baseline_wave(self) -> &'static str {
        self.waves()[0]
    }

    /// All waves of the cohort, in chronological order.
    pub fn waves(self) -> &'static [&'static str] {
        match self {
            Cohort::Lifelines => &LIFELINES_WAVES,
            Cohort::Rotterdam => &ROTTERDAM_WAVES,
        }
    }

    /// Position of `wave` in the cohort ordering, if it belongs to the cohort.
    pub fn wave_rank(self, wave: &str) -> Option<usize> {
        self.waves().iter().position(|known| *known == wave)
    }
}

impl fmt::Display for Cohort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cohort {
    type Err = DerivationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!(Cohort::parse("Lifelines").expect("parse"), Cohort::Lifelines);
        assert_eq!(" rotterdam ".parse::<Cohort>().expect("parse"), Cohort::Rotterdam);
    }

    #[test]
    fn rejects_unknown_cohort() {
        let err = Cohort::parse("framingham").expect_err("should reject");
        match err {
            DerivationError::InvalidInput(msg) => assert!(msg.contains("framingham")),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn baseline_is_first_wave() {
        assert_eq!(Cohort::Lifelines.baseline_wave(), "1a");
        assert_eq!(Cohort::Rotterdam.baseline_wave(), "a1");
    }

    #[test]
    fn wave_rank_follows_chronology() {
        assert_eq!(Cohort::Lifelines.wave_rank("1a"), Some(0));
        assert_eq!(Cohort::Lifelines.wave_rank("3b"), Some(6));
        assert_eq!(Cohort::Lifelines.wave_rank("global"), None);
        assert_eq!(Cohort::Rotterdam.wave_rank("1a"), None);
    }
}
