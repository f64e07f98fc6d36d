//! Rotterdam: the registry-linked cohort, a single baseline assessment `a1`.
//!
//! Outcomes come from record linkage, so presence is a boolean flag and onset is an exact date
//! delivered with it. There is no follow-up search and no midpoint imputation.

pub mod blood_pressure;
pub mod conditions;
pub mod labs;
pub mod patient;
pub mod tobacco_use;

use crate::concepts::{CompositeCardiovascular, snomed};
use crate::dates::rotterdam;
use crate::input::Participant;
use crate::{DerivationError, DerivationResult};
use cdf_types::PartialDate;

pub use blood_pressure::RotterdamBloodPressure;
pub use conditions::{RegistryCondition, RotterdamDiabetes, RotterdamHypertension};
pub use labs::RotterdamLabPanel;
pub use patient::RotterdamPatient;
pub use tobacco_use::RotterdamTobaccoUse;

/// The only Rotterdam assessment.
pub(crate) const WAVE: &str = "a1";
/// Centre interview date, `DD-MM-YYYY`.
pub(crate) const INTERVIEW_DATE: &str = "date_int_cen";

pub static STROKE: RegistryCondition = RegistryCondition::new(
    "stroke",
    "incident_stroke_bool",
    "incident_stroke_date_derived",
    snomed::STROKE,
);

pub static MYOCARDIAL_INFARCTION: RegistryCondition = RegistryCondition::new(
    "MI",
    "incident_mi_bool",
    "incident_mi_date_derived",
    snomed::MYOCARDIAL_INFARCTION,
);

pub static HEART_FAILURE: RegistryCondition =
    RegistryCondition::new("heart-failure", "inc_hf_2018", "enddat_hf", snomed::HEART_FAILURE);

pub static DIABETES: RotterdamDiabetes = RotterdamDiabetes;
pub static HYPERTENSION: RotterdamHypertension = RotterdamHypertension;

pub static CARDIOVASCULAR_DISEASE: CompositeCardiovascular =
    CompositeCardiovascular::new([&STROKE, &HEART_FAILURE, &MYOCARDIAL_INFARCTION]);

pub static BLOOD_PRESSURE: RotterdamBloodPressure = RotterdamBloodPressure;
pub static TOBACCO_USE: RotterdamTobaccoUse = RotterdamTobaccoUse;
pub static PATIENT: RotterdamPatient = RotterdamPatient;

/// Interview date, required for every measurement taken at the centre.
pub(crate) fn interview_date(
    participant: &Participant<'_>,
    context: &str,
) -> DerivationResult<PartialDate> {
    let date = participant.value_at(INTERVIEW_DATE, WAVE)?.ok_or_else(|| {
        DerivationError::precondition(format!("missing {INTERVIEW_DATE} ({context})"))
    })?;
    rotterdam::to_iso(date).ok_or_else(|| {
        DerivationError::precondition(format!("malformed {INTERVIEW_DATE} '{date}' ({context})"))
    })
}
