//! FHIR-aligned patient wire model and renderer.
//!
//! This module provides the domain-level carrier and wire model for the cohort participant's
//! `Patient` resource, which holds the demographics derived from the survey data.
//!
//! Responsibilities:
//! - Define the public domain-level carrier for derived demographics
//! - Define a strict wire model for serialisation
//! - Translate the HL7 v3 gender coding into the FHIR administrative gender code
//!
//! Notes:
//! - The v3 coding is kept in a code-specification extension on `_gender`

use crate::codes::CodeProperties;
use crate::document::Document;
use crate::wire::{CodeableConceptWire, ExtensionWire};
use crate::FhirResult;
use cdf_types::PartialDate;
use serde::{Deserialize, Serialize};

const CODE_SPECIFICATION_EXTENSION: &str =
    "http://nictiz.nl/fhir/StructureDefinition/code-specification";

// ============================================================================
// Public domain-level types
// ============================================================================

/// Domain-level carrier for patient demographics.
#[derive(Clone, Debug, PartialEq)]
pub struct PatientData {
    /// Logical id of the Patient resource.
    pub id: String,

    /// Birth date, usually year-only for self-reported ages.
    pub birth_date: Option<PartialDate>,

    pub deceased: Option<PartialDate>,

    /// HL7 v3 administrative gender coding.
    pub gender: Option<CodeProperties>,
}

// ============================================================================
// Public Patient operations
// ============================================================================

/// Patient resource operations.
///
/// This is a zero-sized type used for namespacing patient-related operations.
/// All methods are associated functions.
pub struct Patient;

impl Patient {
    pub const RESOURCE_TYPE: &'static str = "Patient";

    /// Render a patient resource.
    ///
    /// # Errors
    ///
    /// Returns [`crate::FhirError`] if the id is empty or serialisation fails.
    pub fn render(data: &PatientData) -> FhirResult<Document> {
        let wire = domain_to_wire(data);
        Document::from_wire(Self::RESOURCE_TYPE, &data.id, &wire)
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct PatientWire {
    resource_type: String,

    id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    gender: Option<String>,

    #[serde(rename = "_gender", skip_serializing_if = "Option::is_none")]
    gender_element: Option<ElementWire>,

    #[serde(skip_serializing_if = "Option::is_none")]
    birth_date: Option<PartialDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    deceased_date_time: Option<PartialDate>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct ElementWire {
    extension: Vec<ExtensionWire>,
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

/// Map an HL7 v3 gender code onto the FHIR administrative gender value set.
fn administrative_gender(v3_code: &str) -> &'static str {
    match v3_code {
        "M" => "male",
        "F" => "female",
        "UN" => "other",
        _ => "unknown",
    }
}

fn domain_to_wire(data: &PatientData) -> PatientWire {
    PatientWire {
        resource_type: Patient::RESOURCE_TYPE.to_string(),
        id: data.id.clone(),
        gender: data
            .gender
            .as_ref()
            .map(|g| administrative_gender(&g.code).to_string()),
        gender_element: data.gender.as_ref().map(|g| ElementWire {
            extension: vec![ExtensionWire {
                url: CODE_SPECIFICATION_EXTENSION.into(),
                value_codeable_concept: Some(CodeableConceptWire::of(g)),
                value_boolean: None,
            }],
        }),
        birth_date: data.birth_date,
        deceased_date_time: data.deceased,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn female() -> CodeProperties {
        CodeProperties {
            system: "http://hl7.org/fhir/v3/AdministrativeGender".into(),
            code: "F".into(),
            display: "Female".into(),
        }
    }

    #[test]
    fn renders_demographics() {
        let data = PatientData {
            id: "patient-p1".into(),
            birth_date: Some(PartialDate::from_year(1952).expect("valid")),
            deceased: Some(PartialDate::from_year_month(2010, 7).expect("valid")),
            gender: Some(female()),
        };

        let document = Patient::render(&data).expect("render patient");
        let resource = &document.resource;
        assert_eq!(resource["resourceType"], "Patient");
        assert_eq!(resource["gender"], "female");
        assert_eq!(resource["birthDate"], "1952");
        assert_eq!(resource["deceasedDateTime"], "2010-07");
        assert_eq!(
            resource["_gender"]["extension"][0]["valueCodeableConcept"]["coding"][0]["code"],
            "F"
        );
    }

    #[test]
    fn unknown_demographics_are_omitted() {
        let data = PatientData {
            id: "patient-p1".into(),
            birth_date: None,
            deceased: None,
            gender: None,
        };

        let document = Patient::render(&data).expect("render patient");
        let object = document.resource.as_object().expect("object");
        assert_eq!(object.len(), 2, "only resourceType and id expected: {object:?}");
    }

    #[test]
    fn v3_codes_map_to_administrative_gender() {
        assert_eq!(administrative_gender("M"), "male");
        assert_eq!(administrative_gender("UN"), "other");
        assert_eq!(administrative_gender("UNK"), "unknown");
    }

    #[test]
    fn wire_model_rejects_unknown_keys() {
        let json = serde_json::json!({
            "resourceType": "Patient",
            "id": "patient-p1",
            "maritalStatus": "unknown"
        });
        let err = serde_json::from_value::<PatientWire>(json).expect_err("should reject unknown key");
        assert!(err.to_string().contains("maritalStatus"));
    }
}
