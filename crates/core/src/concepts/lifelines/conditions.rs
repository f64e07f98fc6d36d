//! Self-reported chronic conditions.
//!
//! Baseline asks "have you ever had X" with an age at onset; every follow-up asks whether X was
//! diagnosed since the previous assessment. A condition is present when either answer is yes.
//!
//! Onset:
//! - Baseline yes: project the onset year from the baseline survey year, age and reported onset age
//! - Follow-up yes: midpoint between the previous dated assessment and the first "yes" assessment

use super::{DATE, baseline_survey};
use crate::concepts::{ConditionDerivation, snomed};
use crate::constants::{CONDITION_WAVES, YES};
use crate::dates::{lifelines, project_reported_year};
use crate::input::Participant;
use crate::{DerivationError, DerivationResult};
use cdf_types::PartialDate;
use fhir::CodeProperties;

/// A condition asked with a baseline presence question and a follow-up question.
pub struct SelfReportCondition {
    name: &'static str,
    presence: &'static str,
    followup: &'static str,
    start_age: &'static str,
    code: &'static str,
}

impl SelfReportCondition {
    pub const fn new(
        name: &'static str,
        presence: &'static str,
        followup: &'static str,
        start_age: &'static str,
        code: &'static str,
    ) -> Self {
        Self {
            name,
            presence,
            followup,
            start_age,
            code,
        }
    }

    fn reported_at_baseline(&self, participant: &Participant<'_>) -> DerivationResult<bool> {
        let baseline = participant.cohort().baseline_wave();
        Ok(participant.value_at(self.presence, baseline)? == Some(YES))
    }
}

impl ConditionDerivation for SelfReportCondition {
    fn condition_name(&self) -> &'static str {
        self.name
    }

    fn is_present(&self, participant: &Participant<'_>) -> DerivationResult<bool> {
        if self.reported_at_baseline(participant)? {
            return Ok(true);
        }
        Ok(participant
            .values_across_waves(self.followup)?
            .any_equals(YES))
    }

    fn code(&self, participant: &Participant<'_>) -> DerivationResult<CodeProperties> {
        participant.snomed(self.code)
    }

    fn onset_date_time(
        &self,
        participant: &Participant<'_>,
    ) -> DerivationResult<Option<PartialDate>> {
        self.require_present(participant)?;

        if self.reported_at_baseline(participant)? {
            let (survey_year, survey_age) = baseline_survey(participant, self.name)?;
            let baseline = participant.cohort().baseline_wave();
            let start_age = participant.value_at(self.start_age, baseline)?;
            return Ok(project_reported_year(survey_year, survey_age, start_age));
        }
        follow_up_onset(participant, self.followup)
    }
}

/// Midpoint between the first "yes" on `followup` and the assessment before it.
///
/// `None` when the reporting assessment has no date. Waves without a date are skipped while
/// walking back.
pub(crate) fn follow_up_onset(
    participant: &Participant<'_>,
    followup: &str,
) -> DerivationResult<Option<PartialDate>> {
    let trigger = participant
        .values_across_waves(followup)?
        .first_wave_with(YES)
        .ok_or_else(|| {
            DerivationError::precondition(format!("a 'yes' value on {followup} was expected"))
        })?;

    let dates = participant.values_across_waves(DATE)?;
    let Some(trigger_date) = dates.get(trigger)? else {
        tracing::debug!(followup, wave = trigger, "reporting assessment has no date");
        return Ok(None);
    };

    let cohort = participant.cohort();
    let trigger_rank = cohort.wave_rank(trigger).ok_or_else(|| {
        DerivationError::precondition(format!("{followup} reported at unknown assessment {trigger}"))
    })?;
    let previous_date = CONDITION_WAVES
        .iter()
        .rev()
        .filter(|wave| cohort.wave_rank(wave).is_some_and(|rank| rank < trigger_rank))
        .find_map(|wave| dates.recorded(wave))
        .ok_or_else(|| {
            DerivationError::precondition(format!(
                "no dated assessment before {trigger}, where {followup} is reported"
            ))
        })?;

    Ok(lifelines::mean_date(previous_date, trigger_date).and_then(|mean| lifelines::to_iso(&mean)))
}

// ============================================================================
// Diabetes
// ============================================================================

const DIABETES_TYPE: &str = "diabetes_type_adu_q_1";
const T1D_FOLLOWUP: &str = "t1d_followup_adu_q_1";
const T2D_FOLLOWUP: &str = "t2d_followup_adu_q_1";

/// Diabetes: the shared presence and onset logic plus a type-specific code.
pub struct Diabetes {
    state: SelfReportCondition,
}

impl Diabetes {
    pub const fn new(state: SelfReportCondition) -> Self {
        Self { state }
    }

    /// Type 1, type 2, or unspecified.
    ///
    /// "Other type" (3) and "don't know" (4) both map to unspecified.
    pub fn type_code_id(&self, participant: &Participant<'_>) -> DerivationResult<&'static str> {
        if self.state.reported_at_baseline(participant)? {
            let baseline = participant.cohort().baseline_wave();
            return Ok(match participant.value_at(DIABETES_TYPE, baseline)? {
                Some("1") => snomed::DIABETES_TYPE_1,
                Some("2") => snomed::DIABETES_TYPE_2,
                _ => snomed::DIABETES,
            });
        }

        if participant.values_across_waves(T1D_FOLLOWUP)?.any_equals(YES) {
            Ok(snomed::DIABETES_TYPE_1)
        } else if participant.values_across_waves(T2D_FOLLOWUP)?.any_equals(YES) {
            Ok(snomed::DIABETES_TYPE_2)
        } else {
            Ok(snomed::DIABETES)
        }
    }
}

impl ConditionDerivation for Diabetes {
    fn condition_name(&self) -> &'static str {
        self.state.condition_name()
    }

    fn is_present(&self, participant: &Participant<'_>) -> DerivationResult<bool> {
        self.state.is_present(participant)
    }

    fn code(&self, participant: &Participant<'_>) -> DerivationResult<CodeProperties> {
        participant.snomed(self.type_code_id(participant)?)
    }

    fn onset_date_time(
        &self,
        participant: &Participant<'_>,
    ) -> DerivationResult<Option<PartialDate>> {
        self.state.onset_date_time(participant)
    }
}

// ============================================================================
// Hypertension
// ============================================================================

const HYPERTENSION_PRESENCE: &str = "hypertension_presence_adu_q_1";
const HYPERTENSION_START_AGE: &str = "hypertension_startage_adu_q_1";

/// Hypertension is asked the same way at every assessment, with an age at onset.
pub struct Hypertension;

impl ConditionDerivation for Hypertension {
    fn condition_name(&self) -> &'static str {
        "hypertension"
    }

    fn is_present(&self, participant: &Participant<'_>) -> DerivationResult<bool> {
        Ok(participant
            .values_across_waves(HYPERTENSION_PRESENCE)?
            .any_equals(YES))
    }

    fn code(&self, participant: &Participant<'_>) -> DerivationResult<CodeProperties> {
        participant.snomed(snomed::HYPERTENSION)
    }

    fn onset_date_time(
        &self,
        participant: &Participant<'_>,
    ) -> DerivationResult<Option<PartialDate>> {
        self.require_present(participant)?;
        let (survey_year, survey_age) = baseline_survey(participant, self.condition_name())?;

        let wave = participant
            .values_across_waves(HYPERTENSION_PRESENCE)?
            .first_wave_with(YES)
            .ok_or_else(|| {
                DerivationError::precondition(format!(
                    "a 'yes' value on {HYPERTENSION_PRESENCE} was expected"
                ))
            })?;
        let start_age = participant.value_at(HYPERTENSION_START_AGE, wave)?;
        Ok(project_reported_year(survey_year, survey_age, start_age))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cohort::Cohort;
    use crate::concepts::lifelines::{DIABETES, HYPERTENSION, STROKE};
    use crate::concepts::test_support::codes;
    use crate::input::RawInput;

    /// Dates for every condition wave, with `1c` administered but undated.
    fn dated() -> RawInput {
        RawInput::new()
            .with_value("date", "1a", "1992-5")
            .with_value("date", "1b", "1995-5")
            .with_absent("date", "1c")
            .with_value("date", "2a", "2001-5")
            .with_value("date", "3a", "2003-5")
            .with_absent("date", "3b")
            .with_value("age", "1a", "40")
    }

    fn diabetes_answers(raw: RawInput, baseline: &str, followup_2a: &str) -> RawInput {
        raw.with_value("diabetes_presence_adu_q_1", "1a", baseline)
            .with_absent("diabetes_followup_adu_q_1", "1b")
            .with_value("diabetes_followup_adu_q_1", "2a", followup_2a)
            .with_absent("diabetes_startage_adu_q_1", "1a")
            .with_absent("diabetes_type_adu_q_1", "1a")
            .with_absent("t1d_followup_adu_q_1", "2a")
            .with_absent("t2d_followup_adu_q_1", "2a")
    }

    #[test]
    fn follow_up_onset_is_midpoint_with_previous_dated_wave() {
        let raw = diabetes_answers(dated(), "2", "1");
        let participant = Participant::new(&raw, Cohort::Lifelines, codes());

        assert!(DIABETES.is_present(&participant).expect("presence"));
        let onset = DIABETES.onset_date_time(&participant).expect("onset");
        assert_eq!(onset.map(|d| d.to_string()).as_deref(), Some("1998-05"));
    }

    #[test]
    fn follow_up_onset_does_not_read_baseline_age() {
        let raw = diabetes_answers(
            RawInput::new()
                .with_value("date", "1a", "1992-5")
                .with_value("date", "1b", "1995-5")
                .with_absent("date", "1c")
                .with_value("date", "2a", "2001-5"),
            "2",
            "1",
        );
        assert!(!raw.contains_variable("age"));
        let participant = Participant::new(&raw, Cohort::Lifelines, codes());

        let onset = DIABETES.onset_date_time(&participant).expect("onset");
        assert_eq!(onset.map(|d| d.to_string()).as_deref(), Some("1998-05"));
    }

    #[test]
    fn undated_reporting_wave_gives_no_onset() {
        let raw = dated()
            .with_value("stroke_presence_adu_q_1", "1a", "2")
            .with_value("stroke_followup_adu_q_1", "3b", "1")
            .with_absent("stroke_startage_adu_q_1", "1a");
        let participant = Participant::new(&raw, Cohort::Lifelines, codes());

        assert!(STROKE.is_present(&participant).expect("presence"));
        assert_eq!(STROKE.onset_date_time(&participant).expect("onset"), None);
    }

    #[test]
    fn baseline_onset_projects_reported_age() {
        let raw = dated()
            .with_value("stroke_presence_adu_q_1", "1a", "1")
            .with_value("stroke_startage_adu_q_1", "1a", "35");
        let participant = Participant::new(&raw, Cohort::Lifelines, codes());

        let onset = STROKE.onset_date_time(&participant).expect("onset");
        assert_eq!(onset.map(|d| d.to_string()).as_deref(), Some("1987"));
    }

    #[test]
    fn baseline_onset_without_age_is_unknown() {
        let raw = dated()
            .with_value("stroke_presence_adu_q_1", "1a", "1")
            .with_absent("stroke_startage_adu_q_1", "1a");
        let participant = Participant::new(&raw, Cohort::Lifelines, codes());
        assert_eq!(STROKE.onset_date_time(&participant).expect("onset"), None);
    }

    #[test]
    fn absent_condition_has_no_status_and_refuses_onset() {
        let raw = diabetes_answers(dated(), "2", "2");
        let participant = Participant::new(&raw, Cohort::Lifelines, codes());

        assert!(!DIABETES.is_present(&participant).expect("presence"));
        assert_eq!(DIABETES.clinical_status(&participant).expect("status"), None);
        match DIABETES.onset_date_time(&participant).expect_err("not present") {
            DerivationError::PreconditionViolation(msg) => assert!(msg.contains("diabetes")),
            other => panic!("expected PreconditionViolation, got {other:?}"),
        }
    }

    #[test]
    fn missing_baseline_date_is_a_precondition_violation() {
        let raw = diabetes_answers(
            RawInput::new()
                .with_absent("date", "1a")
                .with_value("date", "2a", "2001-5")
                .with_value("age", "1a", "40"),
            "1",
            "2",
        );
        let participant = Participant::new(&raw, Cohort::Lifelines, codes());
        let err = DIABETES.onset_date_time(&participant).expect_err("no baseline date");
        assert!(err.is_fatal());
    }

    #[test]
    fn diabetes_type_from_baseline_selector() {
        for (selector, expected) in [
            ("1", "46635009"),
            ("2", "44054006"),
            ("3", "73211009"),
            ("4", "73211009"),
        ] {
            let raw = diabetes_answers(dated(), "1", "2").with_value(
                "diabetes_type_adu_q_1",
                "1a",
                selector,
            );
            let participant = Participant::new(&raw, Cohort::Lifelines, codes());
            let code = DIABETES.code(&participant).expect("code");
            assert_eq!(code.code, expected, "selector {selector}");
        }
    }

    #[test]
    fn diabetes_type_from_follow_up_flags() {
        let raw = diabetes_answers(dated(), "2", "1").with_value("t2d_followup_adu_q_1", "2a", "1");
        let participant = Participant::new(&raw, Cohort::Lifelines, codes());
        assert_eq!(DIABETES.code(&participant).expect("code").code, "44054006");

        let raw = diabetes_answers(dated(), "2", "1");
        let participant = Participant::new(&raw, Cohort::Lifelines, codes());
        assert_eq!(DIABETES.code(&participant).expect("code").code, "73211009");
    }

    #[test]
    fn hypertension_onset_uses_first_yes_wave_age() {
        let raw = dated()
            .with_value("hypertension_presence_adu_q_1", "1a", "2")
            .with_value("hypertension_presence_adu_q_1", "2a", "1")
            .with_value("hypertension_startage_adu_q_1", "2a", "45");
        let participant = Participant::new(&raw, Cohort::Lifelines, codes());

        assert!(HYPERTENSION.is_present(&participant).expect("presence"));
        let onset = HYPERTENSION.onset_date_time(&participant).expect("onset");
        assert_eq!(onset.map(|d| d.year()), Some(1997));
    }

    #[test]
    fn strict_access_surfaces_missing_follow_up_variable() {
        let raw = dated().with_value("stroke_presence_adu_q_1", "1a", "2");
        let participant = Participant::new(&raw, Cohort::Lifelines, codes());
        match STROKE.is_present(&participant).expect_err("no follow-up variable") {
            DerivationError::MissingVariable { variable } => {
                assert_eq!(variable, "stroke_followup_adu_q_1")
            }
            other => panic!("expected MissingVariable, got {other:?}"),
        }
    }
}
