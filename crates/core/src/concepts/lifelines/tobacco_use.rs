//! Lifelines tobacco use, asked at every assessment but the last.

use super::{DATE, baseline_survey, collected_at};
use crate::concepts::{TobaccoUseDerivation, TobaccoUseResult, TobaccoUseStatus};
use crate::constants::{TOBACCO_WAVES, YES};
use crate::dates::project_reported_year;
use crate::input::Participant;
use crate::values::parse_number;
use crate::{DerivationError, DerivationResult};
use cdf_types::PartialDate;

const EVER_SMOKER: &str = "ever_smoker_adu_c_2";
const EX_SMOKER: &str = "ex_smoker_adu_c_2";
const CURRENT_SMOKER: &str = "current_smoker_adu_c_2";
const AMOUNT_PER_DAY: &str = "total_frequency_adu_c_1";
const PACK_YEARS: &str = "packyears_cumulative_adu_c_2";
const START_AGE: &str = "smoking_startage_adu_c_2";
const END_AGE: &str = "smoking_endage_adu_c_2";

const NO: &str = "0";

/// Status from the three smoking flags, in priority order.
pub fn use_status(ever: Option<&str>, ex: Option<&str>, current: Option<&str>) -> TobaccoUseStatus {
    if ever == Some(NO) {
        TobaccoUseStatus::NonSmoker
    } else if ex == Some(YES) {
        TobaccoUseStatus::ExSmoker
    } else if current == Some(YES) {
        TobaccoUseStatus::Daily
    } else {
        TobaccoUseStatus::Other
    }
}

pub struct LifelinesTobaccoUse;

impl LifelinesTobaccoUse {
    /// Calendar year at which the smoker reported starting or stopping, at `wave`.
    ///
    /// The baseline survey is only consulted when an age was reported.
    fn smoking_year(
        &self,
        participant: &Participant<'_>,
        age_variable: &str,
        wave: &str,
    ) -> DerivationResult<Option<PartialDate>> {
        let Some(age) = participant.value_at(age_variable, wave)? else {
            return Ok(None);
        };
        let (survey_year, survey_age) = baseline_survey(participant, "tobacco use")?;
        Ok(project_reported_year(survey_year, survey_age, Some(age)))
    }

    fn wave_result(
        &self,
        participant: &Participant<'_>,
        wave: &str,
        ever: &str,
    ) -> DerivationResult<TobaccoUseResult> {
        let ex = participant.value_at(EX_SMOKER, wave)?;
        let current = participant.value_at(CURRENT_SMOKER, wave)?;
        let ex_smoker = ex.ok_or_else(|| {
            DerivationError::precondition(format!(
                "{EX_SMOKER}@{wave} expected when {EVER_SMOKER} is recorded"
            ))
        })? == YES;

        Ok(TobaccoUseResult {
            assessment: wave.to_owned(),
            use_status: use_status(Some(ever), ex, current),
            amount_per_day: participant
                .value_at(AMOUNT_PER_DAY, wave)?
                .and_then(parse_number),
            pack_years: participant.value_at(PACK_YEARS, wave)?.and_then(parse_number),
            smoking_start: self.smoking_year(participant, START_AGE, wave)?,
            smoking_end: self.smoking_year(participant, END_AGE, wave)?,
            ever_smoker: ever == YES,
            ex_smoker,
            collected: Some(collected_at(participant, wave, "tobacco use")?),
        })
    }
}

impl TobaccoUseDerivation for LifelinesTobaccoUse {
    fn results(&self, participant: &Participant<'_>) -> DerivationResult<Vec<TobaccoUseResult>> {
        let mut results = Vec::new();
        for wave in TOBACCO_WAVES {
            if participant.value_at(DATE, wave)?.is_none() {
                tracing::debug!(wave, "tobacco use assessment missed");
                continue;
            }
            let Some(ever) = participant.value_at(EVER_SMOKER, wave)? else {
                tracing::debug!(wave, "no ever-smoker answer");
                continue;
            };
            results.push(self.wave_result(participant, wave, ever)?);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cohort::Cohort;
    use crate::concepts::lifelines::TOBACCO_USE;
    use crate::concepts::test_support::codes;
    use crate::input::RawInput;

    /// Every tobacco wave administered and dated, all answers unrecorded.
    fn questionnaire() -> RawInput {
        let mut raw = RawInput::new().with_value("age", "1a", "30");
        for (i, wave) in TOBACCO_WAVES.iter().enumerate() {
            raw.insert("date", wave, Some(format!("{}-6", 1992 + i).as_str()));
            for variable in [
                EVER_SMOKER,
                EX_SMOKER,
                CURRENT_SMOKER,
                AMOUNT_PER_DAY,
                PACK_YEARS,
                START_AGE,
                END_AGE,
            ] {
                raw.insert(variable, wave, None);
            }
        }
        raw
    }

    #[test]
    fn never_smoked_wins_over_other_flags() {
        assert_eq!(
            use_status(Some("0"), Some("1"), Some("1")),
            TobaccoUseStatus::NonSmoker
        );
        assert_eq!(use_status(Some("1"), Some("1"), Some("1")), TobaccoUseStatus::ExSmoker);
        assert_eq!(use_status(Some("1"), Some("0"), Some("1")), TobaccoUseStatus::Daily);
        assert_eq!(use_status(Some("1"), Some("0"), Some("0")), TobaccoUseStatus::Other);
    }

    #[test]
    fn waves_without_ever_smoker_answer_are_skipped() {
        let mut raw = questionnaire();
        raw.insert(EVER_SMOKER, "1a", Some("0"));
        raw.insert(EX_SMOKER, "1a", Some("1"));
        let participant = Participant::new(&raw, Cohort::Lifelines, codes());

        let results = TOBACCO_USE.results(&participant).expect("results");
        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert_eq!(result.use_status, TobaccoUseStatus::NonSmoker);
        assert!(!result.ever_smoker);
        assert!(result.ex_smoker);
        assert_eq!(result.collected.map(|d| d.to_string()).as_deref(), Some("1992-06"));
    }

    #[test]
    fn smoking_period_is_projected_from_baseline_age() {
        let mut raw = questionnaire();
        raw.insert(EVER_SMOKER, "2a", Some("1"));
        raw.insert(EX_SMOKER, "2a", Some("1"));
        raw.insert(START_AGE, "2a", Some("16"));
        raw.insert(END_AGE, "2a", Some("26"));
        raw.insert(AMOUNT_PER_DAY, "2a", Some("12"));
        raw.insert(PACK_YEARS, "2a", Some("6.5"));
        let participant = Participant::new(&raw, Cohort::Lifelines, codes());

        let results = TOBACCO_USE.results(&participant).expect("results");
        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert_eq!(result.assessment, "2a");
        assert_eq!(result.use_status, TobaccoUseStatus::ExSmoker);
        assert_eq!(result.smoking_start.map(|d| d.year()), Some(1978));
        assert_eq!(result.smoking_end.map(|d| d.year()), Some(1988));
        assert_eq!(result.amount_per_day, Some(12.0));
        assert_eq!(result.pack_years, Some(6.5));
    }

    #[test]
    fn malformed_assessment_date_is_a_precondition_violation() {
        let mut raw = questionnaire();
        raw.insert("date", "1b", Some("spring 1993"));
        raw.insert(EVER_SMOKER, "1b", Some("0"));
        raw.insert(EX_SMOKER, "1b", Some("0"));
        let participant = Participant::new(&raw, Cohort::Lifelines, codes());
        match TOBACCO_USE.results(&participant).expect_err("malformed date") {
            DerivationError::PreconditionViolation(msg) => assert!(msg.contains("spring 1993")),
            other => panic!("expected PreconditionViolation, got {other:?}"),
        }
    }

    #[test]
    fn unreported_smoking_ages_do_not_need_the_baseline_survey() {
        let mut raw = questionnaire();
        raw.insert("date", "1a", None);
        raw.insert(EVER_SMOKER, "2a", Some("1"));
        raw.insert(EX_SMOKER, "2a", Some("0"));
        raw.insert(CURRENT_SMOKER, "2a", Some("1"));
        let participant = Participant::new(&raw, Cohort::Lifelines, codes());

        let results = TOBACCO_USE.results(&participant).expect("results");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].use_status, TobaccoUseStatus::Daily);
        assert_eq!(results[0].smoking_start, None);
    }

    #[test]
    fn missing_ex_smoker_flag_is_a_precondition_violation() {
        let mut raw = questionnaire();
        raw.insert(EVER_SMOKER, "1b", Some("1"));
        let participant = Participant::new(&raw, Cohort::Lifelines, codes());
        match TOBACCO_USE.results(&participant).expect_err("no ex-smoker flag") {
            DerivationError::PreconditionViolation(msg) => assert!(msg.contains("1b")),
            other => panic!("expected PreconditionViolation, got {other:?}"),
        }
    }
}
