//! Lifelines laboratory panels, measured at baseline and at the second assessment.

use super::{GENDER, collected_at, DATE};
use crate::concepts::lab::{LabPanelDerivation, PanelDefinition, ReferenceRule, result_entry};
use crate::input::Participant;
use crate::DerivationResult;
use cdf_types::Gender;
use fhir::LabResultEntry;

const MEASURED_WAVES: [&str; 2] = ["1a", "2a"];

/// A lab panel read from one `*_result_all_m_1` variable.
pub struct LifelinesLabPanel {
    definition: PanelDefinition,
    variable: &'static str,
    waves: &'static [&'static str],
}

impl LifelinesLabPanel {
    pub const fn new(
        definition: PanelDefinition,
        variable: &'static str,
        waves: &'static [&'static str],
    ) -> Self {
        Self {
            definition,
            variable,
            waves,
        }
    }

    pub fn variable(&self) -> &'static str {
        self.variable
    }
}

impl LabPanelDerivation for LifelinesLabPanel {
    fn definition(&self) -> &PanelDefinition {
        &self.definition
    }

    fn results(&self, participant: &Participant<'_>) -> DerivationResult<Vec<LabResultEntry>> {
        let gender = if self.definition.rule.needs_gender() {
            let baseline = participant.cohort().baseline_wave();
            participant
                .value_at(GENDER, baseline)?
                .and_then(Gender::parse)
        } else {
            None
        };

        let mut entries = Vec::with_capacity(self.waves.len());
        for &wave in self.waves {
            if participant.value_at(DATE, wave)?.is_none() {
                tracing::debug!(panel = self.definition.lab_test_name, wave, "assessment missed");
                continue;
            }
            let Some(value) = participant.value_at(self.variable, wave)? else {
                tracing::debug!(panel = self.definition.lab_test_name, wave, "no measurement");
                continue;
            };
            let collected = collected_at(participant, wave, self.definition.lab_test_name)?;
            entries.push(result_entry(
                participant,
                &self.definition,
                wave,
                value,
                gender,
                Some(collected),
            )?);
        }
        Ok(entries)
    }
}

pub static CREATININE: LifelinesLabPanel = LifelinesLabPanel::new(
    PanelDefinition {
        lab_test_name: "creatinine",
        loinc: "14682-9",
        code_text: "Creatinine",
        unit: "umol/L",
        rule: ReferenceRule::ByGender {
            male: (50.0, 110.0),
            female: (50.0, 90.0),
        },
    },
    "creatinine_result_all_m_1",
    &MEASURED_WAVES,
);

pub static HAEMOGLOBIN: LifelinesLabPanel = LifelinesLabPanel::new(
    PanelDefinition {
        lab_test_name: "haemoglobin",
        loinc: "718-7",
        code_text: "Haemoglobin",
        unit: "mmol/L",
        rule: ReferenceRule::ByGender {
            male: (8.5, 11.0),
            female: (7.5, 10.0),
        },
    },
    "hemoglobin_result_all_m_1",
    &MEASURED_WAVES,
);

pub static PLASMA_ALBUMIN: LifelinesLabPanel = LifelinesLabPanel::new(
    PanelDefinition {
        lab_test_name: "plasma-albumin",
        loinc: "1751-7",
        code_text: "Albumin",
        unit: "g/L",
        rule: ReferenceRule::Outside {
            lower: 35.0,
            upper: 50.0,
        },
    },
    "albumin_result_all_m_1",
    &["1a"],
);

pub static HBA1C: LifelinesLabPanel = LifelinesLabPanel::new(
    PanelDefinition {
        lab_test_name: "hba1c",
        loinc: "4548-4",
        code_text: "HbA1c",
        unit: "mmol/mol",
        rule: ReferenceRule::Above(42.0),
    },
    "hba1cconc_result_all_m_1",
    &MEASURED_WAVES,
);

pub static HDL_CHOLESTEROL: LifelinesLabPanel = LifelinesLabPanel::new(
    PanelDefinition {
        lab_test_name: "hdl-chol",
        loinc: "14646-4",
        code_text: "HDL Cholesterol",
        unit: "mmol/L",
        rule: ReferenceRule::Below(1.0),
    },
    "hdlchol_result_all_m_1",
    &MEASURED_WAVES,
);

pub static LDL_CHOLESTEROL: LifelinesLabPanel = LifelinesLabPanel::new(
    PanelDefinition {
        lab_test_name: "ldl-chol",
        loinc: "22748-8",
        code_text: "LDL Cholesterol",
        unit: "mmol/L",
        rule: ReferenceRule::Above(3.0),
    },
    "ldlchol_result_all_m_1",
    &MEASURED_WAVES,
);

pub static TOTAL_CHOLESTEROL: LifelinesLabPanel = LifelinesLabPanel::new(
    PanelDefinition {
        lab_test_name: "total-chol",
        loinc: "14647-2",
        code_text: "Total Cholesterol",
        unit: "mmol/L",
        rule: ReferenceRule::Above(5.0),
    },
    "cholesterol_result_all_m_1",
    &MEASURED_WAVES,
);

/// Every Lifelines panel, in target order.
pub static PANELS: [&LifelinesLabPanel; 7] = [
    &CREATININE,
    &HAEMOGLOBIN,
    &PLASMA_ALBUMIN,
    &HBA1C,
    &HDL_CHOLESTEROL,
    &LDL_CHOLESTEROL,
    &TOTAL_CHOLESTEROL,
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cohort::Cohort;
    use crate::concepts::test_support::codes;
    use crate::input::RawInput;
    use crate::DerivationError;

    fn creatinine(gender: &str, at_1a: &str) -> RawInput {
        RawInput::new()
            .with_value("gender", "1a", gender)
            .with_value("date", "1a", "1992-5")
            .with_value("date", "2a", "2001-5")
            .with_value("creatinine_result_all_m_1", "1a", at_1a)
            .with_absent("creatinine_result_all_m_1", "2a")
    }

    #[test]
    fn high_male_creatinine_is_flagged_above() {
        let raw = creatinine("MALE", "111");
        let participant = Participant::new(&raw, Cohort::Lifelines, codes());

        let entries = CREATININE.results(&participant).expect("results");
        assert_eq!(entries.len(), 1, "2a has no measurement");
        let entry = &entries[0];
        assert_eq!(entry.assessment, "1a");
        assert_eq!(entry.test_result, Some(111.0));
        let flag = entry.result_flag.as_ref().expect("flag");
        assert_eq!(flag.code, "281302008");
        assert_eq!(flag.display, "Above reference range");
        assert_eq!(entry.collected.to_string(), "1992-05");
    }

    #[test]
    fn female_limits_apply_to_female_participants() {
        let raw = creatinine("FEMALE", "100");
        let participant = Participant::new(&raw, Cohort::Lifelines, codes());
        let entries = CREATININE.results(&participant).expect("results");
        assert!(entries[0].result_flag.is_some());

        let raw = creatinine("MALE", "100");
        let participant = Participant::new(&raw, Cohort::Lifelines, codes());
        let entries = CREATININE.results(&participant).expect("results");
        assert_eq!(entries[0].result_flag, None);
    }

    #[test]
    fn unrecognised_gender_yields_no_flag() {
        let raw = creatinine("UNKNOWN", "300");
        let participant = Participant::new(&raw, Cohort::Lifelines, codes());
        let entries = CREATININE.results(&participant).expect("results");
        assert_eq!(entries[0].test_result, Some(300.0));
        assert_eq!(entries[0].result_flag, None);
    }

    #[test]
    fn non_numeric_value_keeps_entry_without_result() {
        let raw = creatinine("MALE", "haemolysed");
        let participant = Participant::new(&raw, Cohort::Lifelines, codes());
        let entries = CREATININE.results(&participant).expect("results");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].test_result, None);
        assert_eq!(entries[0].result_flag, None);
    }

    #[test]
    fn missed_assessment_produces_no_entry() {
        let raw = RawInput::new()
            .with_absent("date", "1a")
            .with_value("date", "2a", "2001-5")
            .with_value("cholesterol_result_all_m_1", "1a", "6.1")
            .with_value("cholesterol_result_all_m_1", "2a", "4.0");
        let participant = Participant::new(&raw, Cohort::Lifelines, codes());

        let entries = TOTAL_CHOLESTEROL.results(&participant).expect("results");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].assessment, "2a");
        assert_eq!(entries[0].result_flag, None);
    }

    #[test]
    fn albumin_is_only_measured_at_baseline() {
        let raw = RawInput::new()
            .with_value("date", "1a", "1992-5")
            .with_value("albumin_result_all_m_1", "1a", "33");
        let participant = Participant::new(&raw, Cohort::Lifelines, codes());

        let entries = PLASMA_ALBUMIN.results(&participant).expect("results");
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].result_flag.as_ref().map(|f| f.code.as_str()),
            Some("281300000")
        );
        assert_eq!(PLASMA_ALBUMIN.reference_range_lower_limit(), Some(35.0));
        assert_eq!(PLASMA_ALBUMIN.reference_range_upper_limit(), Some(50.0));
    }

    #[test]
    fn malformed_collection_date_is_a_precondition_violation() {
        let raw = RawInput::new()
            .with_value("date", "1a", "May 1992")
            .with_absent("date", "2a")
            .with_value("hba1cconc_result_all_m_1", "1a", "40")
            .with_absent("hba1cconc_result_all_m_1", "2a");
        let participant = Participant::new(&raw, Cohort::Lifelines, codes());
        match HBA1C.results(&participant).expect_err("bad date") {
            DerivationError::PreconditionViolation(msg) => assert!(msg.contains("hba1c")),
            other => panic!("expected PreconditionViolation, got {other:?}"),
        }
    }

    #[test]
    fn panel_metadata_resolves_against_code_tables() {
        let raw = RawInput::new();
        let participant = Participant::new(&raw, Cohort::Lifelines, codes());
        for panel in PANELS {
            let data = panel.panel_data(&participant).expect("metadata");
            assert_eq!(data.diagnostic_category.len(), 2);
            assert_eq!(data.observation_code[0].system, "http://loinc.org");
            assert_eq!(data.lab_test_name, panel.lab_test_name());
        }
        assert_eq!(LDL_CHOLESTEROL.variable(), "ldlchol_result_all_m_1");
    }
}
