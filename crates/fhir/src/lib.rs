//! FHIR wire/boundary support for the CDF derivation engine.
//!
//! This crate provides the **code lookup service** and the **wire models and renderers** that
//! turn derived clinical records into FHIR-aligned resource documents:
//! - SNOMED CT / LOINC / UCUM / local code tables (YAML, embedded or loaded from a directory)
//! - Patient, Condition, laboratory result, blood pressure, tobacco use and research subject
//!   resources
//! - transaction bundle assembly with UUID v5 identifiers
//!
//! This crate focuses on:
//! - FHIR semantic alignment (zib 2017 profiles) without a FHIR REST transport
//! - serialisation of strictly shaped wire structs
//! - translation between domain carriers and wire structs
//!
//! Derivation logic lives in `cdf-core`; this crate never reads participant data.

pub mod blood_pressure;
pub mod codes;
pub mod condition;
pub mod document;
pub mod lab_result;
pub mod patient;
pub mod research_subject;
pub mod tobacco_use;

mod wire;

// Re-export facades
pub use blood_pressure::BloodPressure;
pub use condition::Condition;
pub use document::Bundle;
pub use lab_result::LabResult;
pub use patient::Patient;
pub use research_subject::ResearchSubject;
pub use tobacco_use::TobaccoUse;

// Re-export public domain-level types
pub use blood_pressure::{BloodPressureCodes, BloodPressureData, MeasuringLocation};
pub use codes::{CodeCollection, CodeProperties, CodeSystem};
pub use condition::ConditionData;
pub use document::{id_to_uuid, Document};
pub use lab_result::{LabPanelData, LabResourceIds, LabResultEntry};
pub use patient::PatientData;
pub use research_subject::{ResearchSubjectData, StudyStatus};
pub use tobacco_use::{TobaccoUseCodes, TobaccoUseData};

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("translation error: {0}")]
    Translation(String),

    #[error("unknown {system} code: {id}")]
    UnknownCode { system: CodeSystem, id: String },
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;
