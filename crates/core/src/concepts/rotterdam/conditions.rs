//! Registry-linked conditions.

use super::WAVE;
use crate::concepts::{ConditionDerivation, snomed};
use crate::dates::rotterdam;
use crate::input::Participant;
use crate::values::parse_registry_flag;
use crate::DerivationResult;
use cdf_types::PartialDate;
use fhir::CodeProperties;

/// An incident condition with a linked event date.
pub struct RegistryCondition {
    name: &'static str,
    flag: &'static str,
    event_date: &'static str,
    code: &'static str,
}

impl RegistryCondition {
    pub const fn new(
        name: &'static str,
        flag: &'static str,
        event_date: &'static str,
        code: &'static str,
    ) -> Self {
        Self {
            name,
            flag,
            event_date,
            code,
        }
    }
}

impl ConditionDerivation for RegistryCondition {
    fn condition_name(&self) -> &'static str {
        self.name
    }

    fn is_present(&self, participant: &Participant<'_>) -> DerivationResult<bool> {
        Ok(parse_registry_flag(participant.value_at(self.flag, WAVE)?))
    }

    fn code(&self, participant: &Participant<'_>) -> DerivationResult<CodeProperties> {
        participant.snomed(self.code)
    }

    fn onset_date_time(
        &self,
        participant: &Participant<'_>,
    ) -> DerivationResult<Option<PartialDate>> {
        self.require_present(participant)?;
        Ok(participant
            .value_at(self.event_date, WAVE)?
            .and_then(rotterdam::to_iso))
    }
}

const DIABETES_FLAG: &str = "prev_DM_bool";
const DIABETES_TYPE: &str = "prev_DM_type";

/// Prevalent diabetes; the registry records no onset.
pub struct RotterdamDiabetes;

impl RotterdamDiabetes {
    /// Type 2 when the free-text type mentions it, unspecified otherwise.
    pub fn type_code_id(&self, participant: &Participant<'_>) -> DerivationResult<&'static str> {
        let mentions_type_2 = participant
            .value_at(DIABETES_TYPE, WAVE)?
            .map(str::to_ascii_lowercase)
            .is_some_and(|text| ["2", "type2", "type 2", "t2"].iter().any(|m| text.contains(m)));
        Ok(if mentions_type_2 {
            snomed::DIABETES_TYPE_2
        } else {
            snomed::DIABETES
        })
    }
}

impl ConditionDerivation for RotterdamDiabetes {
    fn condition_name(&self) -> &'static str {
        "diabetes"
    }

    fn is_present(&self, participant: &Participant<'_>) -> DerivationResult<bool> {
        Ok(parse_registry_flag(participant.value_at(DIABETES_FLAG, WAVE)?))
    }

    fn code(&self, participant: &Participant<'_>) -> DerivationResult<CodeProperties> {
        participant.snomed(self.type_code_id(participant)?)
    }

    fn onset_date_time(
        &self,
        participant: &Participant<'_>,
    ) -> DerivationResult<Option<PartialDate>> {
        self.require_present(participant)?;
        Ok(None)
    }
}

const HYPERTENSION_FLAG: &str = "prev_HT_bool";
const HYPERTENSION_CODED: &str = "prev_HT";

/// Prevalent hypertension; the registry records no onset.
pub struct RotterdamHypertension;

impl ConditionDerivation for RotterdamHypertension {
    fn condition_name(&self) -> &'static str {
        "hypertension"
    }

    /// The boolean flag decides when it is readable; otherwise the coded `prev_HT` is used.
    fn is_present(&self, participant: &Participant<'_>) -> DerivationResult<bool> {
        if let Some(flag) = participant.value_at(HYPERTENSION_FLAG, WAVE)? {
            match flag.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => return Ok(true),
                "false" | "0" | "no" => return Ok(false),
                _ => {}
            }
        }
        Ok(participant.value_at(HYPERTENSION_CODED, WAVE)? == Some("1"))
    }

    fn code(&self, participant: &Participant<'_>) -> DerivationResult<CodeProperties> {
        participant.snomed(snomed::HYPERTENSION)
    }

    fn onset_date_time(
        &self,
        participant: &Participant<'_>,
    ) -> DerivationResult<Option<PartialDate>> {
        self.require_present(participant)?;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cohort::Cohort;
    use crate::concepts::rotterdam::{
        CARDIOVASCULAR_DISEASE, DIABETES, HEART_FAILURE, HYPERTENSION, MYOCARDIAL_INFARCTION,
        STROKE,
    };
    use crate::concepts::test_support::codes;
    use crate::input::RawInput;
    use crate::DerivationError;

    fn outcomes() -> RawInput {
        RawInput::new()
            .with_value("incident_stroke_bool", "a1", "False")
            .with_absent("incident_stroke_date_derived", "a1")
            .with_value("incident_mi_bool", "a1", "True")
            .with_value("incident_mi_date_derived", "a1", "14-02-2001")
            .with_value("inc_hf_2018", "a1", "1")
            .with_value("enddat_hf", "a1", "03-05-2001")
    }

    #[test]
    fn linked_stroke_uses_exact_event_date() {
        let raw = RawInput::new()
            .with_value("incident_stroke_bool", "a1", "True")
            .with_value("incident_stroke_date_derived", "a1", "15-03-2005");
        let participant = Participant::new(&raw, Cohort::Rotterdam, codes());

        assert!(STROKE.is_present(&participant).expect("presence"));
        let onset = STROKE.onset_date_time(&participant).expect("onset");
        assert_eq!(onset.map(|d| d.to_string()).as_deref(), Some("2005-03-15"));
    }

    #[test]
    fn absent_registry_condition_refuses_onset() {
        let raw = outcomes();
        let participant = Participant::new(&raw, Cohort::Rotterdam, codes());
        assert!(!STROKE.is_present(&participant).expect("presence"));
        match STROKE.onset_date_time(&participant).expect_err("not present") {
            DerivationError::PreconditionViolation(_) => {}
            other => panic!("expected PreconditionViolation, got {other:?}"),
        }
    }

    #[test]
    fn composite_takes_earliest_linked_event() {
        let raw = outcomes();
        let participant = Participant::new(&raw, Cohort::Rotterdam, codes());

        assert!(MYOCARDIAL_INFARCTION.is_present(&participant).expect("mi"));
        assert!(HEART_FAILURE.is_present(&participant).expect("hf"));
        assert!(CARDIOVASCULAR_DISEASE.is_present(&participant).expect("cvd"));
        let onset = CARDIOVASCULAR_DISEASE.onset_date_time(&participant).expect("onset");
        assert_eq!(onset.map(|d| d.to_string()).as_deref(), Some("2001-02"));
    }

    #[test]
    fn diabetes_type_from_free_text() {
        for (text, expected) in [("Type 2", "44054006"), ("T2DM", "44054006"), ("type 1", "73211009")] {
            let raw = RawInput::new()
                .with_value("prev_DM_bool", "a1", "yes")
                .with_value("prev_DM_type", "a1", text);
            let participant = Participant::new(&raw, Cohort::Rotterdam, codes());
            assert!(DIABETES.is_present(&participant).expect("presence"));
            assert_eq!(DIABETES.code(&participant).expect("code").code, expected, "{text}");
            assert_eq!(DIABETES.onset_date_time(&participant).expect("onset"), None);
        }
    }

    #[test]
    fn hypertension_falls_back_to_coded_variable() {
        let raw = RawInput::new()
            .with_value("prev_HT_bool", "a1", "unknown")
            .with_value("prev_HT", "a1", "1");
        let participant = Participant::new(&raw, Cohort::Rotterdam, codes());
        assert!(HYPERTENSION.is_present(&participant).expect("presence"));

        let raw = RawInput::new().with_value("prev_HT_bool", "a1", "No");
        let participant = Participant::new(&raw, Cohort::Rotterdam, codes());
        assert!(!HYPERTENSION.is_present(&participant).expect("decided by flag"));
    }
}
