//! Lifelines: the multi-wave self-report cohort.
//!
//! Concrete derivations are `static` values so targets can hold `&'static dyn` references.

pub mod blood_pressure;
pub mod conditions;
pub mod labs;
pub mod patient;
pub mod tobacco_use;

use crate::concepts::{CompositeCardiovascular, snomed};
use crate::dates::lifelines;
use crate::input::Participant;
use crate::{DerivationError, DerivationResult};
use cdf_types::PartialDate;

pub use blood_pressure::LifelinesBloodPressure;
pub use conditions::{Diabetes, Hypertension, SelfReportCondition};
pub use labs::LifelinesLabPanel;
pub use patient::{LifelinesPatient, LifelinesResearchSubject};
pub use tobacco_use::LifelinesTobaccoUse;

/// Assessment date, `YYYY-M`, per wave.
pub(crate) const DATE: &str = "date";
/// Age at the assessment, per wave.
pub(crate) const AGE: &str = "age";
/// `MALE` / `FEMALE`, at baseline.
pub(crate) const GENDER: &str = "gender";

pub static STROKE: SelfReportCondition = SelfReportCondition::new(
    "stroke",
    "stroke_presence_adu_q_1",
    "stroke_followup_adu_q_1",
    "stroke_startage_adu_q_1",
    snomed::STROKE,
);

pub static MYOCARDIAL_INFARCTION: SelfReportCondition = SelfReportCondition::new(
    "MI",
    "heartattack_presence_adu_q_1",
    "heartattack_followup_adu_q_1",
    "heartattack_startage_adu_q_1",
    snomed::MYOCARDIAL_INFARCTION,
);

pub static HEART_FAILURE: SelfReportCondition = SelfReportCondition::new(
    "heart-failure",
    "heartfailure_presence_adu_q_1",
    "heartfailure_followup_adu_q_1",
    "heartfailure_startage_adu_q_1",
    snomed::HEART_FAILURE,
);

pub static DIABETES: Diabetes = Diabetes::new(SelfReportCondition::new(
    "diabetes",
    "diabetes_presence_adu_q_1",
    "diabetes_followup_adu_q_1",
    "diabetes_startage_adu_q_1",
    snomed::DIABETES,
));

pub static HYPERTENSION: Hypertension = Hypertension;

pub static CARDIOVASCULAR_DISEASE: CompositeCardiovascular =
    CompositeCardiovascular::new([&STROKE, &HEART_FAILURE, &MYOCARDIAL_INFARCTION]);

pub static BLOOD_PRESSURE: LifelinesBloodPressure = LifelinesBloodPressure;
pub static TOBACCO_USE: LifelinesTobaccoUse = LifelinesTobaccoUse;
pub static PATIENT: LifelinesPatient = LifelinesPatient;
pub static RESEARCH_SUBJECT: LifelinesResearchSubject = LifelinesResearchSubject;

/// Baseline survey year and the age reported at it.
///
/// Every retrospective age question is anchored here, so the baseline date must be recorded.
pub(crate) fn baseline_survey<'a>(
    participant: &Participant<'a>,
    context: &str,
) -> DerivationResult<(i32, Option<&'a str>)> {
    let baseline = participant.cohort().baseline_wave();
    let date = participant.value_at(DATE, baseline)?.ok_or_else(|| {
        DerivationError::precondition(format!("non-null {DATE}@{baseline} expected ({context})"))
    })?;
    let year = lifelines::survey_year(date).ok_or_else(|| {
        DerivationError::precondition(format!("malformed {DATE}@{baseline} '{date}' ({context})"))
    })?;
    Ok((year, participant.value_at(AGE, baseline)?))
}

/// Collection date of a measured wave.
pub(crate) fn collected_at(
    participant: &Participant<'_>,
    wave: &str,
    context: &str,
) -> DerivationResult<PartialDate> {
    let date = participant.value_at(DATE, wave)?.ok_or_else(|| {
        DerivationError::precondition(format!("missing {DATE} in assessment {wave} ({context})"))
    })?;
    lifelines::to_iso(date).ok_or_else(|| {
        DerivationError::precondition(format!("malformed {DATE}@{wave} '{date}' ({context})"))
    })
}
