//! FHIR-aligned tobacco use observation wire model and renderer.

use crate::codes::CodeProperties;
use crate::document::Document;
use crate::wire::{CodeableConceptWire, ExtensionWire, QuantityWire, ReferenceWire};
use crate::FhirResult;
use cdf_types::PartialDate;
use serde::{Deserialize, Serialize};

const EVER_SMOKER_EXTENSION: &str = "urn:cdf:tobacco-use:ever-smoker";
const EX_SMOKER_EXTENSION: &str = "urn:cdf:tobacco-use:ex-smoker";

// ============================================================================
// Public domain-level types
// ============================================================================

/// Codes used by every tobacco use rendering.
#[derive(Clone, Debug, PartialEq)]
pub struct TobaccoUseCodes {
    /// Observation code (LOINC tobacco smoking status).
    pub status: CodeProperties,
    pub per_day_unit: CodeProperties,
    pub pack_years_unit: CodeProperties,
}

/// Domain-level carrier for one wave's tobacco use.
#[derive(Clone, Debug, PartialEq)]
pub struct TobaccoUseData {
    pub id: String,
    pub patient_id: String,
    pub assessment: String,

    /// Non-smoker, ex-smoker, daily or other (SNOMED CT).
    pub use_status: CodeProperties,

    pub amount_per_day: Option<f64>,
    pub pack_years: Option<f64>,
    pub smoking_start: Option<PartialDate>,
    pub smoking_end: Option<PartialDate>,
    pub ever_smoker: bool,
    pub ex_smoker: bool,

    /// Date of the assessment the answers were given in.
    pub collected: Option<PartialDate>,
}

// ============================================================================
// Wire model
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct TobaccoUseWire {
    resource_type: String,
    id: String,
    status: String,
    extension: Vec<ExtensionWire>,
    code: CodeableConceptWire,
    subject: ReferenceWire,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    effective_date_time: Option<PartialDate>,
    value_codeable_concept: CodeableConceptWire,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    smoking_period: Option<PeriodWire>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    component: Vec<ComponentWire>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct PeriodWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start: Option<PartialDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end: Option<PartialDate>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct ComponentWire {
    code: CodeableConceptWire,
    value_quantity: QuantityWire,
}

// ============================================================================
// Public TobaccoUse operations
// ============================================================================

/// Tobacco use resource operations.
pub struct TobaccoUse;

impl TobaccoUse {
    pub const RESOURCE_TYPE: &'static str = "Observation";

    pub fn render(data: &TobaccoUseData, codes: &TobaccoUseCodes) -> FhirResult<Document> {
        let flag = |url: &str, value: bool| ExtensionWire {
            url: url.into(),
            value_codeable_concept: None,
            value_boolean: Some(value),
        };

        let smoking_period = if data.smoking_start.is_some() || data.smoking_end.is_some() {
            Some(PeriodWire {
                start: data.smoking_start,
                end: data.smoking_end,
            })
        } else {
            None
        };

        let component = [
            ("amount per day", data.amount_per_day, &codes.per_day_unit),
            ("pack years", data.pack_years, &codes.pack_years_unit),
        ]
        .into_iter()
        .filter_map(|(label, value, unit)| {
            value.map(|value| ComponentWire {
                code: CodeableConceptWire::text(label),
                value_quantity: QuantityWire::new(value, unit),
            })
        })
        .collect();

        let wire = TobaccoUseWire {
            resource_type: Self::RESOURCE_TYPE.into(),
            id: data.id.clone(),
            status: "final".into(),
            extension: vec![
                flag(EVER_SMOKER_EXTENSION, data.ever_smoker),
                flag(EX_SMOKER_EXTENSION, data.ex_smoker),
            ],
            code: CodeableConceptWire::of(&codes.status),
            subject: ReferenceWire::to("Patient", &data.patient_id),
            effective_date_time: data.collected,
            value_codeable_concept: CodeableConceptWire::of(&data.use_status),
            smoking_period,
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

    fn codes() -> TobaccoUseCodes {
        TobaccoUseCodes {
            status: code("72166-2"),
            per_day_unit: code("/d"),
            pack_years_unit: code("{PackYears}"),
        }
    }

    fn ex_smoker() -> TobaccoUseData {
        TobaccoUseData {
            id: "tobaccouse-1a-p1".into(),
            patient_id: "patient-p1".into(),
            assessment: "1a".into(),
            use_status: code("8517006"),
            amount_per_day: Some(10.0),
            pack_years: None,
            smoking_start: Some(PartialDate::from_year(1972).expect("valid")),
            smoking_end: Some(PartialDate::from_year(1982).expect("valid")),
            ever_smoker: true,
            ex_smoker: true,
            collected: Some(PartialDate::from_year_month(1992, 5).expect("valid")),
        }
    }

    #[test]
    fn renders_status_period_and_amount() {
        let document = TobaccoUse::render(&ex_smoker(), &codes()).expect("render");
        let resource = &document.resource;
        assert_eq!(resource["valueCodeableConcept"]["coding"][0]["code"], "8517006");
        assert_eq!(resource["smokingPeriod"]["start"], "1972");
        assert_eq!(resource["smokingPeriod"]["end"], "1982");
        let components = resource["component"].as_array().expect("components");
        assert_eq!(components.len(), 1);
        assert_eq!(components[0]["code"]["text"], "amount per day");
        assert_eq!(resource["extension"][0]["valueBoolean"], true);
    }

    #[test]
    fn omits_unknown_period() {
        let mut data = ex_smoker();
        data.smoking_start = None;
        data.smoking_end = None;
        data.amount_per_day = None;
        let document = TobaccoUse::render(&data, &codes()).expect("render");
        let object = document.resource.as_object().expect("object");
        assert!(!object.contains_key("smokingPeriod"));
        assert!(!object.contains_key("component"));
    }
}
