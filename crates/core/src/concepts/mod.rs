//! Clinical concept derivations.
//!
//! Every concept exposes one capability set as a trait. The self-report family
//! ([`lifelines`]) and the registry-linked family ([`rotterdam`]) provide concrete
//! implementations as `static` values, and the orchestrator picks them per cohort.
//!
//! Responsibilities:
//! - Define the capability sets: conditions, lab panels, blood pressure, tobacco use, patient
//!   demographics and study enrolment
//! - Define the derived records handed to the document generator
//!
//! Notes:
//! - Derivations are pure functions of the [`Participant`] handle; nothing is cached
//! - Strict accessor failures propagate unchanged so the orchestrator can abort the participant

pub mod composite;
pub mod lab;
pub mod lifelines;
pub mod rotterdam;

use crate::input::Participant;
use crate::{DerivationError, DerivationResult};
use cdf_types::PartialDate;
use fhir::{CodeProperties, MeasuringLocation, StudyStatus};

pub use composite::CompositeCardiovascular;
pub use lab::{LabPanelDerivation, PanelDefinition, ReferenceRule, ResultFlag};

/// SNOMED CT ids shared by the condition derivations.
pub(crate) mod snomed {
    pub const ACTIVE: &str = "55561003";
    pub const UNKNOWN: &str = "UNK";
    pub const DIABETES: &str = "73211009";
    pub const DIABETES_TYPE_1: &str = "46635009";
    pub const DIABETES_TYPE_2: &str = "44054006";
    pub const STROKE: &str = "230690007";
    pub const MYOCARDIAL_INFARCTION: &str = "22298006";
    pub const HEART_FAILURE: &str = "84114007";
    pub const CARDIOVASCULAR_DISEASE: &str = "49601007";
    pub const HYPERTENSION: &str = "38341003";
}

// ============================================================================
// Conditions
// ============================================================================

/// Chronic condition state: present (active) or absent (no clinical status at all).
pub trait ConditionDerivation: Send + Sync {
    /// Short name used in resource ids.
    fn condition_name(&self) -> &'static str;

    fn is_present(&self, participant: &Participant<'_>) -> DerivationResult<bool>;

    /// `Active` when present; absent conditions carry no status.
    fn clinical_status(
        &self,
        participant: &Participant<'_>,
    ) -> DerivationResult<Option<CodeProperties>> {
        if self.is_present(participant)? {
            Ok(Some(participant.snomed(snomed::ACTIVE)?))
        } else {
            Ok(None)
        }
    }

    /// Self-reported and registry diagnoses are never confirmed.
    fn verification_status(&self, participant: &Participant<'_>) -> DerivationResult<CodeProperties> {
        participant.snomed(snomed::UNKNOWN)
    }

    fn code(&self, participant: &Participant<'_>) -> DerivationResult<CodeProperties>;

    /// Onset of a present condition; `None` when it cannot be determined.
    ///
    /// # Errors
    ///
    /// [`DerivationError::PreconditionViolation`] when the condition is not present.
    fn onset_date_time(&self, participant: &Participant<'_>)
    -> DerivationResult<Option<PartialDate>>;

    /// Fails unless the condition is present.
    fn require_present(&self, participant: &Participant<'_>) -> DerivationResult<()> {
        if self.is_present(participant)? {
            Ok(())
        } else {
            Err(DerivationError::precondition(format!(
                "onset of {} requested while the condition is not present",
                self.condition_name()
            )))
        }
    }
}

// ============================================================================
// Patient and study enrolment
// ============================================================================

pub trait PatientDerivation: Send + Sync {
    fn birth_date(&self, participant: &Participant<'_>) -> DerivationResult<Option<PartialDate>>;

    fn deceased_date_time(
        &self,
        participant: &Participant<'_>,
    ) -> DerivationResult<Option<PartialDate>>;

    /// HL7 v3 administrative gender, when reported.
    fn gender(&self, participant: &Participant<'_>) -> DerivationResult<Option<CodeProperties>>;
}

pub trait ResearchSubjectDerivation: Send + Sync {
    fn study_name(&self) -> &'static str;

    fn study_status(&self) -> StudyStatus;

    fn date_of_inclusion(&self, participant: &Participant<'_>) -> DerivationResult<PartialDate>;

    fn date_of_last_response(&self, participant: &Participant<'_>)
    -> DerivationResult<PartialDate>;
}

// ============================================================================
// Repeated measures
// ============================================================================

/// One wave's blood pressure reading.
#[derive(Clone, Debug, PartialEq)]
pub struct BloodPressureResult {
    pub assessment: String,
    pub cuff_type: Option<CodeProperties>,
    pub measuring_location: MeasuringLocation,
    pub systolic: Option<f64>,
    pub diastolic: Option<f64>,
    pub mean_arterial: Option<f64>,
    pub collected: PartialDate,
}

pub trait BloodPressureDerivation: Send + Sync {
    /// One entry per measured wave, in wave order.
    fn results(&self, participant: &Participant<'_>) -> DerivationResult<Vec<BloodPressureResult>>;
}

/// Tobacco use status, in the priority order it is derived.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TobaccoUseStatus {
    NonSmoker,
    ExSmoker,
    Daily,
    Other,
}

impl TobaccoUseStatus {
    pub fn snomed_id(self) -> &'static str {
        match self {
            TobaccoUseStatus::NonSmoker => "8392000",
            TobaccoUseStatus::ExSmoker => "8517006",
            TobaccoUseStatus::Daily => "449868002",
            TobaccoUseStatus::Other => "74964007",
        }
    }
}

/// One wave's tobacco use.
#[derive(Clone, Debug, PartialEq)]
pub struct TobaccoUseResult {
    pub assessment: String,
    pub use_status: TobaccoUseStatus,
    pub amount_per_day: Option<f64>,
    pub pack_years: Option<f64>,
    pub smoking_start: Option<PartialDate>,
    pub smoking_end: Option<PartialDate>,
    pub ever_smoker: bool,
    pub ex_smoker: bool,
    pub collected: Option<PartialDate>,
}

pub trait TobaccoUseDerivation: Send + Sync {
    fn results(&self, participant: &Participant<'_>) -> DerivationResult<Vec<TobaccoUseResult>>;
}
