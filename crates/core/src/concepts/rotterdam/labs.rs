//! Rotterdam laboratory panels, all measured at the centre interview.

use super::{INTERVIEW_DATE, WAVE};
use crate::concepts::lab::{LabPanelDerivation, PanelDefinition, ReferenceRule, result_entry};
use crate::dates::rotterdam;
use crate::input::Participant;
use crate::DerivationResult;
use cdf_types::Gender;
use fhir::LabResultEntry;

/// A lab panel read from a single baseline variable.
pub struct RotterdamLabPanel {
    definition: PanelDefinition,
    variable: &'static str,
    gender_variable: Option<&'static str>,
    /// Also skip the panel when the interview date is missing.
    requires_date: bool,
}

impl RotterdamLabPanel {
    pub const fn new(
        definition: PanelDefinition,
        variable: &'static str,
        gender_variable: Option<&'static str>,
        requires_date: bool,
    ) -> Self {
        Self {
            definition,
            variable,
            gender_variable,
            requires_date,
        }
    }
}

impl LabPanelDerivation for RotterdamLabPanel {
    fn definition(&self) -> &PanelDefinition {
        &self.definition
    }

    fn results(&self, participant: &Participant<'_>) -> DerivationResult<Vec<LabResultEntry>> {
        let Some(value) = participant.value_at(self.variable, WAVE)? else {
            return Ok(Vec::new());
        };
        let date = participant.value_at(INTERVIEW_DATE, WAVE)?;
        if self.requires_date && date.is_none() {
            tracing::debug!(panel = self.definition.lab_test_name, "no interview date");
            return Ok(Vec::new());
        }

        let gender = match self.gender_variable {
            Some(variable) => participant.value_at(variable, WAVE)?.and_then(Gender::parse),
            None => None,
        };
        let collected = date.and_then(rotterdam::to_iso);
        let entry = result_entry(participant, &self.definition, WAVE, value, gender, collected)?;
        Ok(vec![entry])
    }
}

pub static CREATININE: RotterdamLabPanel = RotterdamLabPanel::new(
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
    "creat_umol",
    Some("sex_mapped"),
    false,
);

pub static EGFR: RotterdamLabPanel = RotterdamLabPanel::new(
    PanelDefinition {
        lab_test_name: "eGFR-2009",
        loinc: "62238-1",
        code_text: "eGFR (CKD-EPI 2009)",
        unit: "mL/min/{1.73_m2}",
        rule: ReferenceRule::Below(60.0),
    },
    "GFR",
    None,
    false,
);

pub static HDL_CHOLESTEROL: RotterdamLabPanel = RotterdamLabPanel::new(
    PanelDefinition {
        lab_test_name: "hdl-chol",
        loinc: "14646-4",
        code_text: "HDL Cholesterol",
        unit: "mmol/L",
        rule: ReferenceRule::Below(1.0),
    },
    "HDL_mmol",
    None,
    true,
);

pub static LDL_CHOLESTEROL: RotterdamLabPanel = RotterdamLabPanel::new(
    PanelDefinition {
        lab_test_name: "ldl-chol",
        loinc: "22748-8",
        code_text: "LDL Cholesterol",
        unit: "mmol/L",
        rule: ReferenceRule::Above(3.0),
    },
    "LDL_mmol_chosen",
    None,
    false,
);

pub static TOTAL_CHOLESTEROL: RotterdamLabPanel = RotterdamLabPanel::new(
    PanelDefinition {
        lab_test_name: "total-chol",
        loinc: "14647-2",
        code_text: "Total Cholesterol",
        unit: "mmol/L",
        rule: ReferenceRule::Above(5.0),
    },
    "TC_mmol",
    None,
    false,
);

pub static PANELS: [&RotterdamLabPanel; 5] = [
    &CREATININE,
    &EGFR,
    &HDL_CHOLESTEROL,
    &LDL_CHOLESTEROL,
    &TOTAL_CHOLESTEROL,
];
