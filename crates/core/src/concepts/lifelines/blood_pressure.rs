//! Lifelines blood pressure: averaged readings at baseline and at the second assessment.

use super::{DATE, collected_at};
use crate::concepts::{BloodPressureDerivation, BloodPressureResult};
use crate::input::Participant;
use crate::values::parse_number;
use crate::DerivationResult;
use fhir::{CodeProperties, CodeSystem, MeasuringLocation};

const MEASURED_WAVES: [&str; 2] = ["1a", "2a"];
/// Assessments in which the arm used was recorded.
const ARM_RECORDED_WAVES: [&str; 1] = ["3a"];

const SYSTOLIC: &str = "bpavg_systolic_all_m_1";
const DIASTOLIC: &str = "bpavg_diastolic_all_m_1";
const MEAN_ARTERIAL: &str = "bpavg_arterial_all_m_1";
const BAND_SIZE: &str = "bp_bandsize_all_m_1";
const ARM: &str = "bp_arm_all_m_1";

const LEFT_UPPER_ARM: &str = "368208006";
const RIGHT_UPPER_ARM: &str = "368209003";

pub struct LifelinesBloodPressure;

impl LifelinesBloodPressure {
    /// Cuff size answer mapped to the cuff type code list.
    pub fn cuff_type(
        &self,
        participant: &Participant<'_>,
        wave: &str,
    ) -> DerivationResult<Option<CodeProperties>> {
        let id = match participant.value_at(BAND_SIZE, wave)? {
            Some("1") => "klein",
            Some("2") => "standard",
            Some("3") => "groot",
            Some("4") => "kind",
            Some("5") => "extra_groot",
            _ => return Ok(None),
        };
        Ok(Some(participant.code(CodeSystem::Manchet, id)?))
    }

    /// Arm used, where it was recorded; [`MeasuringLocation::Undetermined`] everywhere else.
    pub fn measuring_location(
        &self,
        participant: &Participant<'_>,
        wave: &str,
    ) -> DerivationResult<MeasuringLocation> {
        if !ARM_RECORDED_WAVES.contains(&wave) {
            return Ok(MeasuringLocation::Undetermined);
        }
        let site = match participant.value_at(ARM, wave)? {
            Some("1") => LEFT_UPPER_ARM,
            Some("2") => RIGHT_UPPER_ARM,
            _ => return Ok(MeasuringLocation::Undetermined),
        };
        Ok(MeasuringLocation::Site(participant.snomed(site)?))
    }

    fn reading(
        &self,
        participant: &Participant<'_>,
        variable: &str,
        wave: &str,
    ) -> DerivationResult<Option<f64>> {
        Ok(participant.value_at(variable, wave)?.and_then(parse_number))
    }
}

impl BloodPressureDerivation for LifelinesBloodPressure {
    fn results(&self, participant: &Participant<'_>) -> DerivationResult<Vec<BloodPressureResult>> {
        let mut results = Vec::new();
        for wave in MEASURED_WAVES {
            if participant.value_at(DATE, wave)?.is_none() {
                tracing::debug!(wave, "blood pressure assessment missed");
                continue;
            }
            results.push(BloodPressureResult {
                assessment: wave.to_owned(),
                cuff_type: self.cuff_type(participant, wave)?,
                measuring_location: self.measuring_location(participant, wave)?,
                systolic: self.reading(participant, SYSTOLIC, wave)?,
                diastolic: self.reading(participant, DIASTOLIC, wave)?,
                mean_arterial: self.reading(participant, MEAN_ARTERIAL, wave)?,
                collected: collected_at(participant, wave, "blood pressure")?,
            });
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cohort::Cohort;
    use crate::concepts::lifelines::BLOOD_PRESSURE;
    use crate::concepts::test_support::codes;
    use crate::input::RawInput;

    fn readings() -> RawInput {
        let mut raw = RawInput::new()
            .with_value("date", "1a", "1992-5")
            .with_absent("date", "2a");
        for (variable, value) in [
            (SYSTOLIC, "128"),
            (DIASTOLIC, "82"),
            (MEAN_ARTERIAL, "97.3"),
            (BAND_SIZE, "2"),
        ] {
            raw.insert(variable, "1a", Some(value));
            raw.insert(variable, "2a", None);
        }
        raw
    }

    #[test]
    fn one_result_per_dated_wave() {
        let raw = readings();
        let participant = Participant::new(&raw, Cohort::Lifelines, codes());

        let results = BLOOD_PRESSURE.results(&participant).expect("results");
        assert_eq!(results.len(), 1);
        let reading = &results[0];
        assert_eq!(reading.assessment, "1a");
        assert_eq!(reading.systolic, Some(128.0));
        assert_eq!(reading.mean_arterial, Some(97.3));
        assert_eq!(reading.cuff_type.as_ref().map(|c| c.code.as_str()), Some("STD"));
        assert_eq!(reading.measuring_location, MeasuringLocation::Undetermined);
        assert_eq!(reading.collected.to_string(), "1992-05");
    }

    #[test]
    fn unknown_band_size_has_no_cuff_type() {
        let raw = RawInput::new().with_value(BAND_SIZE, "1a", "9");
        let participant = Participant::new(&raw, Cohort::Lifelines, codes());
        assert_eq!(BLOOD_PRESSURE.cuff_type(&participant, "1a").expect("cuff"), None);
    }

    #[test]
    fn arm_is_only_read_where_recorded() {
        let raw = RawInput::new().with_value(ARM, "3a", "2");
        let participant = Participant::new(&raw, Cohort::Lifelines, codes());

        match BLOOD_PRESSURE.measuring_location(&participant, "3a").expect("location") {
            MeasuringLocation::Site(site) => assert_eq!(site.code, RIGHT_UPPER_ARM),
            other => panic!("expected a coded site, got {other:?}"),
        }
        // 1a never recorded the arm, so the variable is not even consulted
        assert_eq!(
            BLOOD_PRESSURE.measuring_location(&participant, "1a").expect("location"),
            MeasuringLocation::Undetermined
        );
    }
}
