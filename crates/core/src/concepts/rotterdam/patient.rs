//! Rotterdam demographics, with exact birth and death dates from the registry.

use super::WAVE;
use crate::concepts::PatientDerivation;
use crate::dates::rotterdam;
use crate::input::Participant;
use crate::{DerivationError, DerivationResult};
use cdf_types::PartialDate;
use fhir::{CodeProperties, CodeSystem};

const BIRTH_DATE: &str = "gebdatum";
const DEATH_DATE: &str = "fp_mortdat";
const SEX: &str = "sexe";

pub struct RotterdamPatient;

impl PatientDerivation for RotterdamPatient {
    fn birth_date(&self, participant: &Participant<'_>) -> DerivationResult<Option<PartialDate>> {
        let date = participant.value_at(BIRTH_DATE, WAVE)?.ok_or_else(|| {
            DerivationError::precondition(format!("non-null {BIRTH_DATE} expected"))
        })?;
        Ok(rotterdam::to_iso(date))
    }

    fn deceased_date_time(
        &self,
        participant: &Participant<'_>,
    ) -> DerivationResult<Option<PartialDate>> {
        Ok(participant
            .value_at(DEATH_DATE, WAVE)?
            .and_then(rotterdam::to_iso))
    }

    /// `1`/`MALE` and `2`/`FEMALE`.
    fn gender(&self, participant: &Participant<'_>) -> DerivationResult<Option<CodeProperties>> {
        let id = match participant
            .value_at(SEX, WAVE)?
            .map(str::to_ascii_uppercase)
            .as_deref()
        {
            Some("1" | "MALE") => "male",
            Some("2" | "FEMALE") => "female",
            _ => return Ok(None),
        };
        Ok(Some(participant.code(CodeSystem::FhirV3, id)?))
    }
}
