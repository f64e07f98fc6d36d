//! Composite cardiovascular disease over stroke, heart failure and myocardial infarction.

use super::{ConditionDerivation, snomed};
use crate::input::Participant;
use crate::DerivationResult;
use cdf_types::PartialDate;
use fhir::CodeProperties;

/// Present when any component is; onset is the earliest component onset.
pub struct CompositeCardiovascular {
    components: [&'static dyn ConditionDerivation; 3],
}

impl CompositeCardiovascular {
    pub const fn new(components: [&'static dyn ConditionDerivation; 3]) -> Self {
        Self { components }
    }
}

impl ConditionDerivation for CompositeCardiovascular {
    fn condition_name(&self) -> &'static str {
        "CVD"
    }

    fn is_present(&self, participant: &Participant<'_>) -> DerivationResult<bool> {
        for component in self.components {
            if component.is_present(participant)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn code(&self, participant: &Participant<'_>) -> DerivationResult<CodeProperties> {
        participant.snomed(snomed::CARDIOVASCULAR_DISEASE)
    }

    fn onset_date_time(
        &self,
        participant: &Participant<'_>,
    ) -> DerivationResult<Option<PartialDate>> {
        self.require_present(participant)?;

        let mut earliest: Option<PartialDate> = None;
        for component in self.components {
            if !component.is_present(participant)? {
                continue;
            }
            if let Some(onset) = component.onset_date_time(participant)? {
                earliest = Some(earliest.map_or(onset, |current| current.min(onset)));
            }
        }
        Ok(earliest.map(PartialDate::truncate_to_month))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cohort::Cohort;
    use crate::concepts::test_support::codes;
    use crate::input::RawInput;
    use crate::DerivationError;

    /// Reads `<name>_present` and `<name>_onset` at `a1`.
    struct Fixed(&'static str);

    impl ConditionDerivation for Fixed {
        fn condition_name(&self) -> &'static str {
            self.0
        }

        fn is_present(&self, participant: &Participant<'_>) -> DerivationResult<bool> {
            Ok(participant.value_at(&format!("{}_present", self.0), "a1")? == Some("1"))
        }

        fn code(&self, participant: &Participant<'_>) -> DerivationResult<CodeProperties> {
            participant.snomed(snomed::STROKE)
        }

        fn onset_date_time(
            &self,
            participant: &Participant<'_>,
        ) -> DerivationResult<Option<PartialDate>> {
            self.require_present(participant)?;
            Ok(participant
                .value_at(&format!("{}_onset", self.0), "a1")?
                .and_then(|text| PartialDate::parse(text).ok()))
        }
    }

    static STROKE: Fixed = Fixed("stroke");
    static MI: Fixed = Fixed("mi");
    static HF: Fixed = Fixed("hf");
    static CVD: CompositeCardiovascular = CompositeCardiovascular::new([&STROKE, &HF, &MI]);

    fn input(present: [(&str, bool, Option<&str>); 3]) -> RawInput {
        let mut raw = RawInput::new();
        for (name, is_present, onset) in present {
            raw.insert(&format!("{name}_present"), "a1", Some(if is_present { "1" } else { "0" }));
            raw.insert(&format!("{name}_onset"), "a1", onset);
        }
        raw
    }

    #[test]
    fn earliest_present_onset_wins() {
        let raw = input([
            ("stroke", false, Some("1990-01")),
            ("mi", true, Some("2001-02")),
            ("hf", true, Some("2001-05")),
        ]);
        let participant = Participant::new(&raw, Cohort::Rotterdam, codes());
        assert!(CVD.is_present(&participant).expect("presence"));
        let onset = CVD.onset_date_time(&participant).expect("onset");
        assert_eq!(onset.map(|d| d.to_string()).as_deref(), Some("2001-02"));
    }

    #[test]
    fn full_dates_are_reported_at_month_granularity() {
        let raw = input([
            ("stroke", true, Some("2005-03-15")),
            ("mi", false, None),
            ("hf", true, Some("2006")),
        ]);
        let participant = Participant::new(&raw, Cohort::Rotterdam, codes());
        let onset = CVD.onset_date_time(&participant).expect("onset").expect("date");
        assert_eq!(onset.to_string(), "2005-03");
    }

    #[test]
    fn year_only_onset_compares_as_first_of_january() {
        let raw = input([
            ("stroke", true, Some("2005-03-15")),
            ("mi", false, None),
            ("hf", true, Some("2005")),
        ]);
        let participant = Participant::new(&raw, Cohort::Rotterdam, codes());
        let onset = CVD.onset_date_time(&participant).expect("onset").expect("date");
        assert_eq!(onset.to_string(), "2005");
    }

    #[test]
    fn undated_components_give_no_onset() {
        let raw = input([("stroke", true, None), ("mi", false, None), ("hf", false, None)]);
        let participant = Participant::new(&raw, Cohort::Rotterdam, codes());
        assert_eq!(CVD.onset_date_time(&participant).expect("onset"), None);
        assert!(CVD.clinical_status(&participant).expect("status").is_some());
    }

    #[test]
    fn onset_without_any_component_is_a_precondition_violation() {
        let raw = input([("stroke", false, None), ("mi", false, None), ("hf", false, None)]);
        let participant = Participant::new(&raw, Cohort::Rotterdam, codes());
        assert!(!CVD.is_present(&participant).expect("presence"));
        assert_eq!(CVD.clinical_status(&participant).expect("status"), None);
        match CVD.onset_date_time(&participant).expect_err("not present") {
            DerivationError::PreconditionViolation(msg) => assert!(msg.contains("CVD")),
            other => panic!("expected PreconditionViolation, got {other:?}"),
        }
    }
}
