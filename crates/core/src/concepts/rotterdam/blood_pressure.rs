//! Rotterdam blood pressure: one centre reading, mean arterial pressure derived.

use super::{WAVE, interview_date};
use crate::concepts::{BloodPressureDerivation, BloodPressureResult};
use crate::input::Participant;
use crate::values::parse_number;
use crate::DerivationResult;
use fhir::MeasuringLocation;

const SYSTOLIC: &str = "sbp";
const DIASTOLIC: &str = "dbp";

/// `dbp + (sbp - dbp) / 3`
pub fn mean_arterial_pressure(systolic: f64, diastolic: f64) -> f64 {
    diastolic + (systolic - diastolic) / 3.0
}

pub struct RotterdamBloodPressure;

impl BloodPressureDerivation for RotterdamBloodPressure {
    fn results(&self, participant: &Participant<'_>) -> DerivationResult<Vec<BloodPressureResult>> {
        let systolic = participant.value_at(SYSTOLIC, WAVE)?;
        let diastolic = participant.value_at(DIASTOLIC, WAVE)?;
        let (Some(systolic), Some(diastolic)) = (systolic, diastolic) else {
            tracing::debug!("blood pressure not measured");
            return Ok(Vec::new());
        };

        let systolic = parse_number(systolic);
        let diastolic = parse_number(diastolic);
        let mean_arterial = systolic
            .zip(diastolic)
            .map(|(sbp, dbp)| mean_arterial_pressure(sbp, dbp));

        Ok(vec![BloodPressureResult {
            assessment: WAVE.to_owned(),
            cuff_type: None,
            measuring_location: MeasuringLocation::Undetermined,
            systolic,
            diastolic,
            mean_arterial,
            collected: interview_date(participant, "blood pressure")?,
        }])
    }
}
