//! Lifelines demographics and study enrolment.

use super::{AGE, DATE, GENDER};
use crate::concepts::{PatientDerivation, ResearchSubjectDerivation};
use crate::constants::GLOBAL_WAVE;
use crate::dates::{lifelines, project_year};
use crate::input::Participant;
use crate::values::parse_number;
use crate::{DerivationError, DerivationResult};
use cdf_types::{Gender, PartialDate};
use fhir::{CodeProperties, CodeSystem, StudyStatus};

const DATE_OF_DEATH: &str = "date_of_death";
const DATE_OF_INCLUSION: &str = "date_of_inclusion";

pub struct LifelinesPatient;

impl PatientDerivation for LifelinesPatient {
    /// Year only: baseline survey year minus the age reported at it.
    fn birth_date(&self, participant: &Participant<'_>) -> DerivationResult<Option<PartialDate>> {
        let baseline = participant.cohort().baseline_wave();
        let Some(date) = participant.value_at(DATE, baseline)? else {
            return Ok(None);
        };
        let age = participant.value_at(AGE, baseline)?.and_then(parse_number);
        Ok(lifelines::survey_year(date)
            .zip(age)
            .and_then(|(year, age)| project_year(year, age, 0.0)))
    }

    fn deceased_date_time(
        &self,
        participant: &Participant<'_>,
    ) -> DerivationResult<Option<PartialDate>> {
        Ok(participant
            .value_at(DATE_OF_DEATH, GLOBAL_WAVE)?
            .and_then(lifelines::to_iso))
    }

    fn gender(&self, participant: &Participant<'_>) -> DerivationResult<Option<CodeProperties>> {
        let baseline = participant.cohort().baseline_wave();
        let id = match participant.value_at(GENDER, baseline)?.and_then(Gender::parse) {
            Some(Gender::Male) => "male",
            Some(Gender::Female) => "female",
            None => return Ok(None),
        };
        Ok(Some(participant.code(CodeSystem::FhirV3, id)?))
    }
}

pub struct LifelinesResearchSubject;

impl ResearchSubjectDerivation for LifelinesResearchSubject {
    fn study_name(&self) -> &'static str {
        "Lifelines-Netherlands"
    }

    fn study_status(&self) -> StudyStatus {
        StudyStatus::Completed
    }

    fn date_of_inclusion(&self, participant: &Participant<'_>) -> DerivationResult<PartialDate> {
        let date = participant
            .value_at(DATE_OF_INCLUSION, GLOBAL_WAVE)?
            .ok_or_else(|| {
                DerivationError::precondition(format!(
                    "{DATE_OF_INCLUSION} is expected for every participant"
                ))
            })?;
        lifelines::to_iso(date).ok_or_else(|| {
            DerivationError::precondition(format!("malformed {DATE_OF_INCLUSION} '{date}'"))
        })
    }

    /// Date of the last assessment, in wave order, that has a date.
    fn date_of_last_response(
        &self,
        participant: &Participant<'_>,
    ) -> DerivationResult<PartialDate> {
        let (wave, date) = participant
            .values_across_waves(DATE)?
            .last_recorded()
            .ok_or_else(|| {
                DerivationError::precondition("at least one dated assessment is expected")
            })?;
        lifelines::to_iso(date).ok_or_else(|| {
            DerivationError::precondition(format!("malformed {DATE}@{wave} '{date}'"))
        })
    }
}
