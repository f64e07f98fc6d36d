//! Rotterdam tobacco use from the summarised smoking status.

use super::{INTERVIEW_DATE, WAVE};
use crate::concepts::{TobaccoUseDerivation, TobaccoUseResult, TobaccoUseStatus};
use crate::dates::rotterdam;
use crate::input::Participant;
use crate::DerivationResult;

const SMOKING_STATUS: &str = "smoking_status";

pub fn use_status(status: &str) -> TobaccoUseStatus {
    match status.to_ascii_lowercase().as_str() {
        "never" => TobaccoUseStatus::NonSmoker,
        "former" | "ex" | "ex-smoker" => TobaccoUseStatus::ExSmoker,
        "current" => TobaccoUseStatus::Daily,
        _ => TobaccoUseStatus::Other,
    }
}

/// Amounts and the smoking period are not available in this cohort.
pub struct RotterdamTobaccoUse;

impl TobaccoUseDerivation for RotterdamTobaccoUse {
    fn results(&self, participant: &Participant<'_>) -> DerivationResult<Vec<TobaccoUseResult>> {
        let Some(date) = participant.value_at(INTERVIEW_DATE, WAVE)? else {
            return Ok(Vec::new());
        };
        let Some(status) = participant.value_at(SMOKING_STATUS, WAVE)? else {
            return Ok(Vec::new());
        };

        let use_status = use_status(status);
        Ok(vec![TobaccoUseResult {
            assessment: WAVE.to_owned(),
            use_status,
            amount_per_day: None,
            pack_years: None,
            smoking_start: None,
            smoking_end: None,
            ever_smoker: use_status != TobaccoUseStatus::NonSmoker,
            ex_smoker: use_status == TobaccoUseStatus::ExSmoker,
            collected: rotterdam::to_iso(date),
        }])
    }
}
