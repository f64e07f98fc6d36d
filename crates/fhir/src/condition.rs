//! FHIR-aligned Condition (problem) wire model and renderer.
//!
//! Responsibilities:
//! - Define the domain-level carrier produced by condition derivations
//! - Render it as a `Condition` resource with coded status, verification and onset
//!
//! Notes:
//! - An absent clinical status is omitted rather than rendered as "inactive"

use crate::codes::CodeProperties;
use crate::document::Document;
use crate::wire::{CodeableConceptWire, ReferenceWire};
use crate::FhirResult;
use cdf_types::PartialDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// Public domain-level types
// ============================================================================

/// Domain-level carrier for one derived condition.
#[derive(Clone, Debug, PartialEq)]
pub struct ConditionData {
    /// Logical id of the Condition resource.
    pub id: String,

    /// Logical id of the Patient the condition belongs to.
    pub patient_id: String,

    /// Active status, or `None` when the condition is not present.
    pub clinical_status: Option<CodeProperties>,

    pub verification_status: CodeProperties,

    /// Condition code (SNOMED CT).
    pub code: CodeProperties,

    /// Onset at year, year-month or day granularity.
    pub onset: Option<PartialDate>,
}

// ============================================================================
// Wire model
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct ConditionWire {
    resource_type: String,
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    clinical_status: Option<CodeableConceptWire>,
    verification_status: CodeableConceptWire,
    code: CodeableConceptWire,
    subject: ReferenceWire,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    onset_date_time: Option<PartialDate>,
}

// ============================================================================
// Public Condition operations
// ============================================================================

/// Condition resource operations.
///
/// This is a zero-sized type used for namespacing condition-related operations.
pub struct Condition;

impl Condition {
    pub const RESOURCE_TYPE: &'static str = "Condition";

    /// Render a condition resource.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FhirError::InvalidInput`] if the id is empty.
    pub fn render(data: &ConditionData) -> FhirResult<Document> {
        let wire = ConditionWire {
            resource_type: Self::RESOURCE_TYPE.into(),
            id: data.id.clone(),
            clinical_status: data.clinical_status.as_ref().map(CodeableConceptWire::of),
            verification_status: CodeableConceptWire::of(&data.verification_status),
            code: CodeableConceptWire::of(&data.code),
            subject: ReferenceWire::to("Patient", &data.patient_id),
            onset_date_time: data.onset,
        };
        Document::from_wire(Self::RESOURCE_TYPE, &data.id, &wire)
    }
}
