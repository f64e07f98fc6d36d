//! FHIR-aligned ResearchStudy / ResearchSubject wire models and renderers.
//!
//! Records the participant's enrolment in the cohort study: which study, when the participant
//! was included and when the last assessment was answered.

use crate::document::Document;
use crate::wire::ReferenceWire;
use crate::FhirResult;
use cdf_types::PartialDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// Public domain-level types
// ============================================================================

/// Study lifecycle status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StudyStatus {
    Active,
    Completed,
}

/// Domain-level carrier for a participant's study enrolment.
#[derive(Clone, Debug, PartialEq)]
pub struct ResearchSubjectData {
    /// Logical id of the ResearchSubject resource.
    pub id: String,

    /// Logical id of the ResearchStudy resource.
    pub study_id: String,

    pub patient_id: String,
    pub study_name: String,
    pub study_status: StudyStatus,
    pub date_of_inclusion: PartialDate,
    pub date_of_last_response: PartialDate,
}

// ============================================================================
// Wire model
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct ResearchStudyWire {
    resource_type: String,
    id: String,
    title: String,
    status: StudyStatus,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct ResearchSubjectWire {
    resource_type: String,
    id: String,
    status: String,
    period: PeriodWire,
    study: ReferenceWire,
    individual: ReferenceWire,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct PeriodWire {
    start: PartialDate,
    end: PartialDate,
}

// ============================================================================
// Public ResearchSubject operations
// ============================================================================

/// Research subject and study resource operations.
pub struct ResearchSubject;

impl ResearchSubject {
    pub const SUBJECT: &'static str = "ResearchSubject";
    pub const STUDY: &'static str = "ResearchStudy";

    /// Render the `ResearchSubject`, whose period spans inclusion to last response.
    pub fn render_subject(data: &ResearchSubjectData) -> FhirResult<Document> {
        let wire = ResearchSubjectWire {
            resource_type: Self::SUBJECT.into(),
            id: data.id.clone(),
            status: "on-study".into(),
            period: PeriodWire {
                start: data.date_of_inclusion,
                end: data.date_of_last_response,
            },
            study: ReferenceWire::to(Self::STUDY, &data.study_id),
            individual: ReferenceWire::to("Patient", &data.patient_id),
        };
        Document::from_wire(Self::SUBJECT, &data.id, &wire)
    }

    /// Render the `ResearchStudy` the subject is enrolled in.
    pub fn render_study(data: &ResearchSubjectData) -> FhirResult<Document> {
        let wire = ResearchStudyWire {
            resource_type: Self::STUDY.into(),
            id: data.study_id.clone(),
            title: data.study_name.clone(),
            status: data.study_status,
        };
        Document::from_wire(Self::STUDY, &data.study_id, &wire)
    }
}
