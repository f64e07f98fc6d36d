//! FHIR-aligned laboratory test result wire models and renderers.
//!
//! A lab panel result for one wave is rendered as three linked resources: the `Observation`
//! holding the value, the `DiagnosticReport` summarising it and the `Specimen` it was measured on.
//!
//! Responsibilities:
//! - Define the per-panel metadata carrier and the per-wave result entry
//! - Render report, observation and specimen resources that reference one another

use crate::codes::CodeProperties;
use crate::document::Document;
use crate::wire::{CodeableConceptWire, QuantityWire, ReferenceWire};
use crate::FhirResult;
use cdf_types::PartialDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// Public domain-level types
// ============================================================================

/// Static description of a lab panel, resolved from the code tables.
#[derive(Clone, Debug, PartialEq)]
pub struct LabPanelData {
    /// Short name used as the resource id prefix, e.g. `creatinine`.
    pub lab_test_name: String,
    pub diagnostic_category: Vec<CodeProperties>,
    pub diagnostic_code: Vec<CodeProperties>,
    pub diagnostic_code_text: String,
    pub observation_category: Vec<CodeProperties>,
    pub observation_code: Vec<CodeProperties>,
    pub result_unit: CodeProperties,
    pub specimen_type: CodeProperties,
    pub reference_range_lower: Option<f64>,
    pub reference_range_upper: Option<f64>,
}

/// One evaluated wave of a lab panel.
#[derive(Clone, Debug, PartialEq)]
pub struct LabResultEntry {
    /// Wave code the measurement belongs to.
    pub assessment: String,

    /// Above/below reference range flag; `None` when within range or not computable.
    pub result_flag: Option<CodeProperties>,

    /// Numeric result; `None` when the recorded value is not numeric.
    pub test_result: Option<f64>,

    pub collected: PartialDate,
}

/// Logical ids of the resources rendered for one result entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabResourceIds {
    pub patient: String,
    pub report: String,
    pub observation: String,
    pub specimen: String,
}

// ============================================================================
// Wire model
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct ObservationWire {
    resource_type: String,
    id: String,
    status: String,
    category: Vec<CodeableConceptWire>,
    code: CodeableConceptWire,
    subject: ReferenceWire,
    effective_date_time: PartialDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value_quantity: Option<QuantityWire>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    interpretation: Option<CodeableConceptWire>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    reference_range: Vec<ReferenceRangeWire>,
    specimen: ReferenceWire,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ReferenceRangeWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    low: Option<QuantityWire>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    high: Option<QuantityWire>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct DiagnosticReportWire {
    resource_type: String,
    id: String,
    status: String,
    category: CodeableConceptWire,
    code: CodeableConceptWire,
    subject: ReferenceWire,
    effective_date_time: PartialDate,
    result: Vec<ReferenceWire>,
    specimen: Vec<ReferenceWire>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct SpecimenWire {
    resource_type: String,
    id: String,
    #[serde(rename = "type")]
    specimen_type: CodeableConceptWire,
    subject: ReferenceWire,
    collection: SpecimenCollectionWire,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct SpecimenCollectionWire {
    collected_date_time: PartialDate,
}

// ============================================================================
// Public LabResult operations
// ============================================================================

/// Lab result resource operations.
///
/// This is a zero-sized type used for namespacing lab-result-related operations.
pub struct LabResult;

impl LabResult {
    pub const OBSERVATION: &'static str = "Observation";
    pub const DIAGNOSTIC_REPORT: &'static str = "DiagnosticReport";
    pub const SPECIMEN: &'static str = "Specimen";

    /// Render the `Observation` carrying the measured value and flag.
    pub fn render_observation(
        panel: &LabPanelData,
        entry: &LabResultEntry,
        ids: &LabResourceIds,
    ) -> FhirResult<Document> {
        let range = if panel.reference_range_lower.is_some() || panel.reference_range_upper.is_some()
        {
            vec![ReferenceRangeWire {
                low: panel
                    .reference_range_lower
                    .map(|value| QuantityWire::new(value, &panel.result_unit)),
                high: panel
                    .reference_range_upper
                    .map(|value| QuantityWire::new(value, &panel.result_unit)),
            }]
        } else {
            Vec::new()
        };

        let wire = ObservationWire {
            resource_type: Self::OBSERVATION.into(),
            id: ids.observation.clone(),
            status: "final".into(),
            category: vec![CodeableConceptWire::of_all(&panel.observation_category)],
            code: CodeableConceptWire::of_all(&panel.observation_code),
            subject: ReferenceWire::to("Patient", &ids.patient),
            effective_date_time: entry.collected,
            value_quantity: entry
                .test_result
                .map(|value| QuantityWire::new(value, &panel.result_unit)),
            interpretation: entry.result_flag.as_ref().map(CodeableConceptWire::of),
            reference_range: range,
            specimen: ReferenceWire::to(Self::SPECIMEN, &ids.specimen),
        };
        Document::from_wire(Self::OBSERVATION, &ids.observation, &wire)
    }

    /// Render the `DiagnosticReport` that groups the observation.
    pub fn render_diagnostic_report(
        panel: &LabPanelData,
        entry: &LabResultEntry,
        ids: &LabResourceIds,
    ) -> FhirResult<Document> {
        let wire = DiagnosticReportWire {
            resource_type: Self::DIAGNOSTIC_REPORT.into(),
            id: ids.report.clone(),
            status: "final".into(),
            category: CodeableConceptWire::of_all(&panel.diagnostic_category),
            code: CodeableConceptWire::of_all(&panel.diagnostic_code)
                .with_text(panel.diagnostic_code_text.clone()),
            subject: ReferenceWire::to("Patient", &ids.patient),
            effective_date_time: entry.collected,
            result: vec![ReferenceWire::to(Self::OBSERVATION, &ids.observation)],
            specimen: vec![ReferenceWire::to(Self::SPECIMEN, &ids.specimen)],
        };
        Document::from_wire(Self::DIAGNOSTIC_REPORT, &ids.report, &wire)
    }

    /// Render the `Specimen` the measurement was taken from.
    pub fn render_specimen(
        panel: &LabPanelData,
        entry: &LabResultEntry,
        ids: &LabResourceIds,
    ) -> FhirResult<Document> {
        let wire = SpecimenWire {
            resource_type: Self::SPECIMEN.into(),
            id: ids.specimen.clone(),
            specimen_type: CodeableConceptWire::of(&panel.specimen_type),
            subject: ReferenceWire::to("Patient", &ids.patient),
            collection: SpecimenCollectionWire {
                collected_date_time: entry.collected,
            },
        };
        Document::from_wire(Self::SPECIMEN, &ids.specimen, &wire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(system: &str, code: &str, display: &str) -> CodeProperties {
        CodeProperties {
            system: system.into(),
            code: code.into(),
            display: display.into(),
        }
    }

    fn hdl_panel() -> LabPanelData {
        let loinc = code("http://loinc.org", "14646-4", "HDL");
        LabPanelData {
            lab_test_name: "hdl-chol".into(),
            diagnostic_category: vec![code("http://snomed.info/sct", "4241000179101", "Lab")],
            diagnostic_code: vec![loinc.clone()],
            diagnostic_code_text: "Cholesterol in HDL [Moles/Vol]".into(),
            observation_category: vec![code("http://snomed.info/sct", "49581000146104", "Finding")],
            observation_code: vec![loinc],
            result_unit: code("http://unitsofmeasure.org", "mmol/L", "millimole per liter"),
            specimen_type: code("http://snomed.info/sct", "119297000", "Blood specimen"),
            reference_range_lower: Some(1.0),
            reference_range_upper: None,
        }
    }

    fn ids() -> LabResourceIds {
        LabResourceIds {
            patient: "patient-p1".into(),
            report: "hdl-chol-report-1a-p1".into(),
            observation: "hdl-chol-observation-1a-p1".into(),
            specimen: "hdl-chol-specimen-1a-p1".into(),
        }
    }

    fn entry(result: Option<f64>, flag: Option<CodeProperties>) -> LabResultEntry {
        LabResultEntry {
            assessment: "1a".into(),
            result_flag: flag,
            test_result: result,
            collected: PartialDate::from_year_month(1992, 5).expect("valid"),
        }
    }

    #[test]
    fn observation_carries_value_flag_and_range() {
        let below = code("http://snomed.info/sct", "281300000", "Below reference range");
        let document = LabResult::render_observation(&hdl_panel(), &entry(Some(0.9), Some(below)), &ids())
            .expect("render");

        let resource = &document.resource;
        assert_eq!(document.resource_type, "Observation");
        assert_eq!(resource["valueQuantity"]["value"], 0.9);
        assert_eq!(resource["valueQuantity"]["code"], "mmol/L");
        assert_eq!(resource["interpretation"]["coding"][0]["display"], "Below reference range");
        assert_eq!(resource["referenceRange"][0]["low"]["value"], 1.0);
        assert!(resource["referenceRange"][0].get("high").is_none());
        assert_eq!(resource["effectiveDateTime"], "1992-05");
        assert_eq!(resource["specimen"]["reference"], "Specimen/hdl-chol-specimen-1a-p1");
    }

    #[test]
    fn observation_without_numeric_result_has_no_quantity() {
        let document =
            LabResult::render_observation(&hdl_panel(), &entry(None, None), &ids()).expect("render");
        let object = document.resource.as_object().expect("object");
        assert!(!object.contains_key("valueQuantity"));
        assert!(!object.contains_key("interpretation"));
    }

    #[test]
    fn report_links_observation_and_specimen() {
        let document = LabResult::render_diagnostic_report(&hdl_panel(), &entry(Some(1.2), None), &ids())
            .expect("render");
        let resource = &document.resource;
        assert_eq!(resource["code"]["text"], "Cholesterol in HDL [Moles/Vol]");
        assert_eq!(resource["result"][0]["reference"], "Observation/hdl-chol-observation-1a-p1");
        assert_eq!(resource["specimen"][0]["reference"], "Specimen/hdl-chol-specimen-1a-p1");
    }

    #[test]
    fn specimen_records_collection_date() {
        let document =
            LabResult::render_specimen(&hdl_panel(), &entry(Some(1.2), None), &ids()).expect("render");
        assert_eq!(document.id, "hdl-chol-specimen-1a-p1");
        assert_eq!(document.resource["collection"]["collectedDateTime"], "1992-05");
        assert_eq!(document.resource["type"]["coding"][0]["code"], "119297000");
    }
}
