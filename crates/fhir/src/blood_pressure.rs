//! FHIR-aligned blood pressure observation wire model and renderer.
//!
//! Responsibilities:
//! - Define the domain-level carrier for one blood pressure reading
//! - Render it as a panel `Observation` with systolic, diastolic and mean arterial components
//!
//! Notes:
//! - A measuring location that was never collected is rendered as an explicit "undetermined"
//!   body site, never as a guessed arm

use crate::codes::CodeProperties;
use crate::document::Document;
use crate::wire::{CodeableConceptWire, ExtensionWire, QuantityWire, ReferenceWire};
use crate::FhirResult;
use cdf_types::PartialDate;
use serde::{Deserialize, Serialize};

const CUFF_TYPE_EXTENSION: &str =
    "http://nictiz.nl/fhir/StructureDefinition/zib-BloodPressure-CuffType";
const UNDETERMINED_LOCATION_TEXT: &str = "undetermined";

// ============================================================================
// Public domain-level types
// ============================================================================

/// Where on the body the reading was taken.
#[derive(Clone, Debug, PartialEq)]
pub enum MeasuringLocation {
    /// A coded body site.
    Site(CodeProperties),
    /// The location was not collected for this reading.
    Undetermined,
}

/// LOINC and UCUM codes used by every blood pressure rendering.
#[derive(Clone, Debug, PartialEq)]
pub struct BloodPressureCodes {
    pub panel: CodeProperties,
    pub systolic: CodeProperties,
    pub diastolic: CodeProperties,
    pub mean_arterial: CodeProperties,
    pub unit: CodeProperties,
}

/// Domain-level carrier for one blood pressure reading.
#[derive(Clone, Debug, PartialEq)]
pub struct BloodPressureData {
    pub id: String,
    pub patient_id: String,

    /// Wave code the reading belongs to.
    pub assessment: String,

    pub cuff_type: Option<CodeProperties>,
    pub measuring_location: MeasuringLocation,

    /// Systolic pressure in mm[Hg].
    pub systolic: Option<f64>,

    /// Diastolic pressure in mm[Hg].
    pub diastolic: Option<f64>,

    /// Mean arterial pressure in mm[Hg].
    pub mean_arterial: Option<f64>,

    pub collected: PartialDate,
}

// ============================================================================
// Wire model
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct BloodPressureWire {
    resource_type: String,
    id: String,
    status: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    extension: Vec<ExtensionWire>,
    code: CodeableConceptWire,
    subject: ReferenceWire,
    effective_date_time: PartialDate,
    body_site: CodeableConceptWire,
    component: Vec<ComponentWire>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct ComponentWire {
    code: CodeableConceptWire,
    value_quantity: QuantityWire,
}

// ============================================================================
// Public BloodPressure operations
// ============================================================================

/// Blood pressure resource operations.
pub struct BloodPressure;

impl BloodPressure {
    pub const RESOURCE_TYPE: &'static str = "Observation";

    /// Render one reading. Components without a value are left out.
    pub fn render(data: &BloodPressureData, codes: &BloodPressureCodes) -> FhirResult<Document> {
        let component = [
            (&codes.systolic, data.systolic),
            (&codes.diastolic, data.diastolic),
            (&codes.mean_arterial, data.mean_arterial),
        ]
        .into_iter()
        .filter_map(|(code, value)| {
            value.map(|value| ComponentWire {
                code: CodeableConceptWire::of(code),
                value_quantity: QuantityWire::new(value, &codes.unit),
            })
        })
        .collect();

        let extension = data
            .cuff_type
            .as_ref()
            .map(|cuff| ExtensionWire {
                url: CUFF_TYPE_EXTENSION.into(),
                value_codeable_concept: Some(CodeableConceptWire::of(cuff)),
                value_boolean: None,
            })
            .into_iter()
            .collect();

        let body_site = match &data.measuring_location {
            MeasuringLocation::Site(site) => CodeableConceptWire::of(site),
            MeasuringLocation::Undetermined => CodeableConceptWire::text(UNDETERMINED_LOCATION_TEXT),
        };

        let wire = BloodPressureWire {
            resource_type: Self::RESOURCE_TYPE.into(),
            id: data.id.clone(),
            status: "final".into(),
            extension,
            code: CodeableConceptWire::of(&codes.panel),
            subject: ReferenceWire::to("Patient", &data.patient_id),
            effective_date_time: data.collected,
            body_site,
            component,
        };
        Document::from_wire(Self::RESOURCE_TYPE, &data.id, &wire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(code: &str) -> CodeProperties {
        CodeProperties {
            system: "urn:test".into(),
            code: code.into(),
            display: code.into(),
        }
    }

    fn codes() -> BloodPressureCodes {
        BloodPressureCodes {
            panel: code("85354-9"),
            systolic: code("8480-6"),
            diastolic: code("8462-4"),
            mean_arterial: code("8478-0"),
            unit: code("mm[Hg]"),
        }
    }

    fn reading(location: MeasuringLocation) -> BloodPressureData {
        BloodPressureData {
            id: "bloodpressure-1a-p1".into(),
            patient_id: "patient-p1".into(),
            assessment: "1a".into(),
            cuff_type: Some(code("L")),
            measuring_location: location,
            systolic: Some(120.0),
            diastolic: Some(80.0),
            mean_arterial: None,
            collected: PartialDate::from_year_month(1992, 5).expect("valid"),
        }
    }

    #[test]
    fn renders_components_that_have_values() {
        let document = BloodPressure::render(&reading(MeasuringLocation::Undetermined), &codes())
            .expect("render");
        let components = document.resource["component"].as_array().expect("components");
        assert_eq!(components.len(), 2);
        assert_eq!(components[0]["code"]["coding"][0]["code"], "8480-6");
        assert_eq!(components[1]["valueQuantity"]["value"], 80.0);
        assert_eq!(document.resource["extension"][0]["valueCodeableConcept"]["coding"][0]["code"], "L");
    }

    #[test]
    fn undetermined_location_is_explicit() {
        let document = BloodPressure::render(&reading(MeasuringLocation::Undetermined), &codes())
            .expect("render");
        assert_eq!(document.resource["bodySite"]["text"], "undetermined");
        assert!(document.resource["bodySite"].get("coding").is_none());
    }

    #[test]
    fn coded_location_is_rendered_as_coding() {
        let document =
            BloodPressure::render(&reading(MeasuringLocation::Site(code("368209003"))), &codes())
                .expect("render");
        assert_eq!(document.resource["bodySite"]["coding"][0]["code"], "368209003");
    }
}
