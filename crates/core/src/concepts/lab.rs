//! Laboratory panel derivations shared by both cohorts.
//!
//! A panel is a [`PanelDefinition`] (codes, unit and reference rule) plus a cohort-specific way
//! of finding the measured waves. Flagging and the static metadata are identical for every
//! panel, so they live here as trait defaults.

use crate::input::Participant;
use crate::values::parse_number;
use crate::{DerivationError, DerivationResult};
use cdf_types::{Gender, PartialDate};
use fhir::{CodeProperties, LabPanelData, LabResultEntry};

const DIAGNOSTIC_CATEGORY: [&str; 2] = ["4241000179101", "19851009"];
const OBSERVATION_CATEGORY: [&str; 2] = ["49581000146104", "275711006"];
const BLOOD_SPECIMEN: &str = "119297000";

// ============================================================================
// Reference ranges
// ============================================================================

/// Result outside the reference range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultFlag {
    AboveReferenceRange,
    BelowReferenceRange,
}

impl ResultFlag {
    pub fn snomed_id(self) -> &'static str {
        match self {
            ResultFlag::AboveReferenceRange => "281302008",
            ResultFlag::BelowReferenceRange => "281300000",
        }
    }
}

/// When a result is flagged. Bounds themselves are within range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ReferenceRule {
    /// Flagged above the limit.
    Above(f64),
    /// Flagged below the limit.
    Below(f64),
    /// Flagged outside `lower..=upper`.
    Outside { lower: f64, upper: f64 },
    /// `(lower, upper)` per gender; no flag when the gender is unknown.
    ByGender { male: (f64, f64), female: (f64, f64) },
}

impl ReferenceRule {
    fn bounds(&self, gender: Option<Gender>) -> (Option<f64>, Option<f64>) {
        match *self {
            ReferenceRule::Above(upper) => (None, Some(upper)),
            ReferenceRule::Below(lower) => (Some(lower), None),
            ReferenceRule::Outside { lower, upper } => (Some(lower), Some(upper)),
            ReferenceRule::ByGender { male, female } => match gender {
                Some(Gender::Male) => (Some(male.0), Some(male.1)),
                Some(Gender::Female) => (Some(female.0), Some(female.1)),
                None => (None, None),
            },
        }
    }

    pub fn needs_gender(&self) -> bool {
        matches!(self, ReferenceRule::ByGender { .. })
    }

    /// Lower limit for documents; gender-dependent rules publish none.
    pub fn lower_limit(&self) -> Option<f64> {
        match *self {
            ReferenceRule::ByGender { .. } => None,
            _ => self.bounds(None).0,
        }
    }

    pub fn upper_limit(&self) -> Option<f64> {
        match *self {
            ReferenceRule::ByGender { .. } => None,
            _ => self.bounds(None).1,
        }
    }

    pub fn flag(&self, value: f64, gender: Option<Gender>) -> Option<ResultFlag> {
        let (lower, upper) = self.bounds(gender);
        if upper.is_some_and(|upper| value > upper) {
            Some(ResultFlag::AboveReferenceRange)
        } else if lower.is_some_and(|lower| value < lower) {
            Some(ResultFlag::BelowReferenceRange)
        } else {
            None
        }
    }
}

// ============================================================================
// Panels
// ============================================================================

/// Static description of a lab panel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PanelDefinition {
    /// Short name used in resource ids.
    pub lab_test_name: &'static str,
    pub loinc: &'static str,
    pub code_text: &'static str,
    pub unit: &'static str,
    pub rule: ReferenceRule,
}

/// Lab panel capability set.
pub trait LabPanelDerivation: Send + Sync {
    fn definition(&self) -> &PanelDefinition;

    /// One entry per measured wave, in wave order.
    fn results(&self, participant: &Participant<'_>) -> DerivationResult<Vec<LabResultEntry>>;

    fn lab_test_name(&self) -> &'static str {
        self.definition().lab_test_name
    }

    fn reference_range_lower_limit(&self) -> Option<f64> {
        self.definition().rule.lower_limit()
    }

    fn reference_range_upper_limit(&self) -> Option<f64> {
        self.definition().rule.upper_limit()
    }

    fn result_unit(&self, participant: &Participant<'_>) -> DerivationResult<CodeProperties> {
        participant.ucum(self.definition().unit)
    }

    fn diagnostic_category_coding(
        &self,
        participant: &Participant<'_>,
    ) -> DerivationResult<Vec<CodeProperties>> {
        DIAGNOSTIC_CATEGORY
            .iter()
            .map(|id| participant.snomed(id))
            .collect()
    }

    fn diagnostic_code_coding(
        &self,
        participant: &Participant<'_>,
    ) -> DerivationResult<Vec<CodeProperties>> {
        Ok(vec![participant.loinc(self.definition().loinc)?])
    }

    fn diagnostic_code_text(&self) -> &'static str {
        self.definition().code_text
    }

    fn observation_category_coding(
        &self,
        participant: &Participant<'_>,
    ) -> DerivationResult<Vec<CodeProperties>> {
        OBSERVATION_CATEGORY
            .iter()
            .map(|id| participant.snomed(id))
            .collect()
    }

    fn observation_code_coding(
        &self,
        participant: &Participant<'_>,
    ) -> DerivationResult<Vec<CodeProperties>> {
        self.diagnostic_code_coding(participant)
    }

    fn specimen_type(&self, participant: &Participant<'_>) -> DerivationResult<CodeProperties> {
        participant.snomed(BLOOD_SPECIMEN)
    }

    /// Everything the document generator needs besides the per-wave entries.
    fn panel_data(&self, participant: &Participant<'_>) -> DerivationResult<LabPanelData> {
        Ok(LabPanelData {
            lab_test_name: self.lab_test_name().to_owned(),
            diagnostic_category: self.diagnostic_category_coding(participant)?,
            diagnostic_code: self.diagnostic_code_coding(participant)?,
            diagnostic_code_text: self.diagnostic_code_text().to_owned(),
            observation_category: self.observation_category_coding(participant)?,
            observation_code: self.observation_code_coding(participant)?,
            result_unit: self.result_unit(participant)?,
            specimen_type: self.specimen_type(participant)?,
            reference_range_lower: self.reference_range_lower_limit(),
            reference_range_upper: self.reference_range_upper_limit(),
        })
    }
}

/// Build the entry for one measured wave.
///
/// A non-numeric value is kept as an entry without result or flag.
pub(crate) fn result_entry(
    participant: &Participant<'_>,
    definition: &PanelDefinition,
    wave: &str,
    value: &str,
    gender: Option<Gender>,
    collected: Option<PartialDate>,
) -> DerivationResult<LabResultEntry> {
    let collected = collected.ok_or_else(|| {
        DerivationError::precondition(format!(
            "{} measured at {wave} without a valid collection date",
            definition.lab_test_name
        ))
    })?;
    let test_result = parse_number(value);
    let result_flag = test_result
        .and_then(|v| definition.rule.flag(v, gender))
        .map(|flag| participant.snomed(flag.snomed_id()))
        .transpose()?;

    Ok(LabResultEntry {
        assessment: wave.to_owned(),
        result_flag,
        test_result,
        collected,
    })
}
