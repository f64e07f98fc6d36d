//! Target evaluation and participant transformation.
//!
//! Responsibilities:
//! - Pair document templates with concept modules ([`Target`]) and list a cohort's defaults
//! - Turn one target's derivations into rendered documents ([`DocumentGenerator`])
//! - Evaluate every target for one participant, aborting on data-integrity failures
//! - Serialise transformations through the shared [`InputStore`]
//!
//! Notes:
//! - Fatal errors (see [`DerivationError::is_fatal`]) abort the whole participant
//! - Any other error drops only the target that raised it

use crate::cohort::Cohort;
use crate::concepts::{
    BloodPressureDerivation, ConditionDerivation, LabPanelDerivation, PatientDerivation,
    ResearchSubjectDerivation, TobaccoUseDerivation, lifelines, rotterdam,
};
use crate::config::CoreConfig;
use crate::input::{InputStore, Participant, RawInput};
use crate::{DerivationError, DerivationResult};
use fhir::{
    BloodPressure, BloodPressureCodes, BloodPressureData, Bundle, CodeCollection, Condition,
    ConditionData, Document, LabResourceIds, LabResult, Patient, PatientData, ResearchSubject,
    ResearchSubjectData, TobaccoUse, TobaccoUseCodes, TobaccoUseData,
};
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Targets
// ============================================================================

/// Output document shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Template {
    Patient,
    ResearchSubject,
    ResearchStudy,
    Condition,
    BloodPressure,
    TobaccoUse,
    LabDiagnosticReport,
    LabObservation,
    LabSpecimen,
}

impl Template {
    pub fn as_str(self) -> &'static str {
        match self {
            Template::Patient => "Patient",
            Template::ResearchSubject => "ResearchSubject",
            Template::ResearchStudy => "ResearchStudy",
            Template::Condition => "Condition",
            Template::BloodPressure => "BloodPressure",
            Template::TobaccoUse => "TobaccoUse",
            Template::LabDiagnosticReport => "LabDiagnosticReport",
            Template::LabObservation => "LabObservation",
            Template::LabSpecimen => "LabSpecimen",
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concept module, by capability set.
#[derive(Clone, Copy)]
pub enum ConceptModule {
    Patient(&'static dyn PatientDerivation),
    ResearchSubject(&'static dyn ResearchSubjectDerivation),
    Condition(&'static dyn ConditionDerivation),
    BloodPressure(&'static dyn BloodPressureDerivation),
    TobaccoUse(&'static dyn TobaccoUseDerivation),
    LabPanel(&'static dyn LabPanelDerivation),
}

impl ConceptModule {
    /// Name used in resource ids and log lines.
    pub fn name(&self) -> &'static str {
        match self {
            ConceptModule::Patient(_) => "patient",
            ConceptModule::ResearchSubject(module) => module.study_name(),
            ConceptModule::Condition(module) => module.condition_name(),
            ConceptModule::BloodPressure(_) => "bloodpressure",
            ConceptModule::TobaccoUse(_) => "tobaccouse",
            ConceptModule::LabPanel(module) => module.lab_test_name(),
        }
    }
}

impl fmt::Debug for ConceptModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            ConceptModule::Patient(_) => "Patient",
            ConceptModule::ResearchSubject(_) => "ResearchSubject",
            ConceptModule::Condition(_) => "Condition",
            ConceptModule::BloodPressure(_) => "BloodPressure",
            ConceptModule::TobaccoUse(_) => "TobaccoUse",
            ConceptModule::LabPanel(_) => "LabPanel",
        };
        f.debug_tuple(kind).field(&self.name()).finish()
    }
}

/// One template to fill from one concept module.
#[derive(Clone, Copy, Debug)]
pub struct Target {
    pub template: Template,
    pub module: ConceptModule,
}

impl Target {
    pub fn new(template: Template, module: ConceptModule) -> Self {
        Self { template, module }
    }

    /// `{template}/{module}`, e.g. `Condition/stroke`.
    pub fn name(&self) -> String {
        format!("{}/{}", self.template, self.module.name())
    }
}

fn lab_targets(panel: &'static dyn LabPanelDerivation) -> [Target; 3] {
    let module = ConceptModule::LabPanel(panel);
    [
        Target::new(Template::LabDiagnosticReport, module),
        Target::new(Template::LabObservation, module),
        Target::new(Template::LabSpecimen, module),
    ]
}

impl Cohort {
    /// Default targets for the cohort, patient first.
    pub fn targets(self) -> Vec<Target> {
        let mut targets = Vec::new();
        match self {
            Cohort::Lifelines => {
                targets.push(Target::new(
                    Template::Patient,
                    ConceptModule::Patient(&lifelines::PATIENT),
                ));
                let enrolment = ConceptModule::ResearchSubject(&lifelines::RESEARCH_SUBJECT);
                targets.push(Target::new(Template::ResearchSubject, enrolment));
                targets.push(Target::new(Template::ResearchStudy, enrolment));

                let conditions: [&'static dyn ConditionDerivation; 6] = [
                    &lifelines::STROKE,
                    &lifelines::MYOCARDIAL_INFARCTION,
                    &lifelines::HEART_FAILURE,
                    &lifelines::DIABETES,
                    &lifelines::HYPERTENSION,
                    &lifelines::CARDIOVASCULAR_DISEASE,
                ];
                targets.extend(conditions.into_iter().map(|condition| {
                    Target::new(Template::Condition, ConceptModule::Condition(condition))
                }));
                targets.push(Target::new(
                    Template::BloodPressure,
                    ConceptModule::BloodPressure(&lifelines::BLOOD_PRESSURE),
                ));
                targets.push(Target::new(
                    Template::TobaccoUse,
                    ConceptModule::TobaccoUse(&lifelines::TOBACCO_USE),
                ));
                for panel in lifelines::labs::PANELS {
                    targets.extend(lab_targets(panel));
                }
            }
            Cohort::Rotterdam => {
                targets.push(Target::new(
                    Template::Patient,
                    ConceptModule::Patient(&rotterdam::PATIENT),
                ));

                let conditions: [&'static dyn ConditionDerivation; 6] = [
                    &rotterdam::STROKE,
                    &rotterdam::MYOCARDIAL_INFARCTION,
                    &rotterdam::HEART_FAILURE,
                    &rotterdam::DIABETES,
                    &rotterdam::HYPERTENSION,
                    &rotterdam::CARDIOVASCULAR_DISEASE,
                ];
                targets.extend(conditions.into_iter().map(|condition| {
                    Target::new(Template::Condition, ConceptModule::Condition(condition))
                }));
                targets.push(Target::new(
                    Template::BloodPressure,
                    ConceptModule::BloodPressure(&rotterdam::BLOOD_PRESSURE),
                ));
                targets.push(Target::new(
                    Template::TobaccoUse,
                    ConceptModule::TobaccoUse(&rotterdam::TOBACCO_USE),
                ));
                for panel in rotterdam::labs::PANELS {
                    targets.extend(lab_targets(panel));
                }
            }
        }
        targets
    }
}

// ============================================================================
// Document generation
// ============================================================================

/// Renders the documents of one target for one participant.
pub trait DocumentGenerator: Send + Sync {
    fn generate(
        &self,
        target: &Target,
        participant: &Participant<'_>,
    ) -> DerivationResult<Vec<Document>>;
}

/// Renders derived records through the `fhir` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct FhirDocumentGenerator;

const PATIENT_ID: &str = "patient";
const RESEARCH_SUBJECT_ID: &str = "researchsubject";
const RESEARCH_STUDY_ID: &str = "researchstudy";

impl FhirDocumentGenerator {
    fn patient(
        module: &dyn PatientDerivation,
        participant: &Participant<'_>,
    ) -> DerivationResult<Vec<Document>> {
        let data = PatientData {
            id: participant.resource_id(PATIENT_ID)?,
            birth_date: module.birth_date(participant)?,
            deceased: module.deceased_date_time(participant)?,
            gender: module.gender(participant)?,
        };
        Ok(vec![Patient::render(&data)?])
    }

    fn research_subject(
        template: Template,
        module: &dyn ResearchSubjectDerivation,
        participant: &Participant<'_>,
    ) -> DerivationResult<Vec<Document>> {
        let data = ResearchSubjectData {
            id: participant.resource_id(RESEARCH_SUBJECT_ID)?,
            study_id: participant.resource_id(RESEARCH_STUDY_ID)?,
            patient_id: participant.resource_id(PATIENT_ID)?,
            study_name: module.study_name().to_owned(),
            study_status: module.study_status(),
            date_of_inclusion: module.date_of_inclusion(participant)?,
            date_of_last_response: module.date_of_last_response(participant)?,
        };
        let document = if template == Template::ResearchStudy {
            ResearchSubject::render_study(&data)?
        } else {
            ResearchSubject::render_subject(&data)?
        };
        Ok(vec![document])
    }

    fn condition(
        module: &dyn ConditionDerivation,
        participant: &Participant<'_>,
    ) -> DerivationResult<Vec<Document>> {
        if !module.is_present(participant)? {
            tracing::debug!(condition = module.condition_name(), "condition not present");
            return Ok(Vec::new());
        }
        let data = ConditionData {
            id: participant.resource_id(module.condition_name())?,
            patient_id: participant.resource_id(PATIENT_ID)?,
            clinical_status: module.clinical_status(participant)?,
            verification_status: module.verification_status(participant)?,
            code: module.code(participant)?,
            onset: module.onset_date_time(participant)?,
        };
        Ok(vec![Condition::render(&data)?])
    }

    fn blood_pressure(
        module: &dyn BloodPressureDerivation,
        participant: &Participant<'_>,
    ) -> DerivationResult<Vec<Document>> {
        let results = module.results(participant)?;
        if results.is_empty() {
            return Ok(Vec::new());
        }

        let codes = BloodPressureCodes {
            panel: participant.loinc("85354-9")?,
            systolic: participant.loinc("8480-6")?,
            diastolic: participant.loinc("8462-4")?,
            mean_arterial: participant.loinc("8478-0")?,
            unit: participant.ucum("mm[Hg]")?,
        };
        let patient_id = participant.resource_id(PATIENT_ID)?;

        results
            .into_iter()
            .map(|result| {
                let data = BloodPressureData {
                    id: participant.wave_specific_resource_id("bloodpressure", &result.assessment)?,
                    patient_id: patient_id.clone(),
                    assessment: result.assessment,
                    cuff_type: result.cuff_type,
                    measuring_location: result.measuring_location,
                    systolic: result.systolic,
                    diastolic: result.diastolic,
                    mean_arterial: result.mean_arterial,
                    collected: result.collected,
                };
                Ok(BloodPressure::render(&data, &codes)?)
            })
            .collect()
    }

    fn tobacco_use(
        module: &dyn TobaccoUseDerivation,
        participant: &Participant<'_>,
    ) -> DerivationResult<Vec<Document>> {
        let results = module.results(participant)?;
        if results.is_empty() {
            return Ok(Vec::new());
        }

        let codes = TobaccoUseCodes {
            status: participant.loinc("72166-2")?,
            per_day_unit: participant.ucum("/d")?,
            pack_years_unit: participant.ucum("{PackYears}")?,
        };
        let patient_id = participant.resource_id(PATIENT_ID)?;

        results
            .into_iter()
            .map(|result| {
                let data = TobaccoUseData {
                    id: participant.wave_specific_resource_id("tobaccouse", &result.assessment)?,
                    patient_id: patient_id.clone(),
                    use_status: participant.snomed(result.use_status.snomed_id())?,
                    assessment: result.assessment,
                    amount_per_day: result.amount_per_day,
                    pack_years: result.pack_years,
                    smoking_start: result.smoking_start,
                    smoking_end: result.smoking_end,
                    ever_smoker: result.ever_smoker,
                    ex_smoker: result.ex_smoker,
                    collected: result.collected,
                };
                Ok(TobaccoUse::render(&data, &codes)?)
            })
            .collect()
    }

    fn lab_panel(
        template: Template,
        module: &dyn LabPanelDerivation,
        participant: &Participant<'_>,
    ) -> DerivationResult<Vec<Document>> {
        let entries = module.results(participant)?;
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let panel = module.panel_data(participant)?;
        let name = module.lab_test_name();
        let patient = participant.resource_id(PATIENT_ID)?;

        entries
            .iter()
            .map(|entry| {
                let wave = entry.assessment.as_str();
                let ids = LabResourceIds {
                    patient: patient.clone(),
                    report: participant.wave_specific_resource_id(&format!("{name}-report"), wave)?,
                    observation: participant
                        .wave_specific_resource_id(&format!("{name}-observation"), wave)?,
                    specimen: participant
                        .wave_specific_resource_id(&format!("{name}-specimen"), wave)?,
                };
                let document = match template {
                    Template::LabDiagnosticReport => {
                        LabResult::render_diagnostic_report(&panel, entry, &ids)?
                    }
                    Template::LabObservation => LabResult::render_observation(&panel, entry, &ids)?,
                    _ => LabResult::render_specimen(&panel, entry, &ids)?,
                };
                Ok(document)
            })
            .collect()
    }
}

impl DocumentGenerator for FhirDocumentGenerator {
    fn generate(
        &self,
        target: &Target,
        participant: &Participant<'_>,
    ) -> DerivationResult<Vec<Document>> {
        match (target.template, target.module) {
            (Template::Patient, ConceptModule::Patient(module)) => Self::patient(module, participant),
            (
                template @ (Template::ResearchSubject | Template::ResearchStudy),
                ConceptModule::ResearchSubject(module),
            ) => Self::research_subject(template, module, participant),
            (Template::Condition, ConceptModule::Condition(module)) => {
                Self::condition(module, participant)
            }
            (Template::BloodPressure, ConceptModule::BloodPressure(module)) => {
                Self::blood_pressure(module, participant)
            }
            (Template::TobaccoUse, ConceptModule::TobaccoUse(module)) => {
                Self::tobacco_use(module, participant)
            }
            (
                template @ (Template::LabDiagnosticReport
                | Template::LabObservation
                | Template::LabSpecimen),
                ConceptModule::LabPanel(module),
            ) => Self::lab_panel(template, module, participant),
            (template, module) => Err(DerivationError::InvalidInput(format!(
                "template {template} cannot be filled from {module:?}"
            ))),
        }
    }
}

// ============================================================================
// Evaluation
// ============================================================================

/// Evaluate `targets` for one participant and collect the rendered documents.
///
/// # Errors
///
/// Returns the first fatal error; non-fatal errors are logged and the target is skipped.
pub fn evaluate(
    participant: &Participant<'_>,
    targets: &[Target],
    generator: &dyn DocumentGenerator,
) -> DerivationResult<Vec<Document>> {
    let mut documents = Vec::new();
    for target in targets {
        match generator.generate(target, participant) {
            Ok(rendered) => {
                tracing::debug!(
                    concept = %target.name(),
                    documents = rendered.len(),
                    "target evaluated"
                );
                documents.extend(rendered);
            }
            Err(err) if err.is_fatal() => {
                tracing::debug!(concept = %target.name(), error = %err, "aborting participant");
                return Err(err);
            }
            Err(err) => {
                tracing::warn!(concept = %target.name(), error = %err, "target skipped");
            }
        }
    }
    Ok(documents)
}

/// Transforms participants of one cohort into documents and bundles.
pub struct Transformer {
    cfg: Arc<CoreConfig>,
    codes: CodeCollection,
    store: InputStore,
    targets: Vec<Target>,
    generator: Box<dyn DocumentGenerator>,
}

impl Transformer {
    /// Load the code tables and select the cohort's default targets.
    ///
    /// # Errors
    ///
    /// Returns [`DerivationError::CodeTables`] if the code tables cannot be loaded.
    pub fn new(cfg: Arc<CoreConfig>) -> DerivationResult<Self> {
        let codes = cfg.load_code_tables()?;
        let targets = cfg.cohort().targets();
        Ok(Self {
            cfg,
            codes,
            store: InputStore::new(),
            targets,
            generator: Box::new(FhirDocumentGenerator),
        })
    }

    pub fn with_generator(mut self, generator: impl DocumentGenerator + 'static) -> Self {
        self.generator = Box::new(generator);
        self
    }

    pub fn with_targets(mut self, targets: Vec<Target>) -> Self {
        self.targets = targets;
        self
    }

    pub fn cohort(&self) -> Cohort {
        self.cfg.cohort()
    }

    pub fn codes(&self) -> &CodeCollection {
        &self.codes
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Evaluate every target for `raw`.
    ///
    /// # Errors
    ///
    /// Fails when the participant has no pseudo id or a target raises a fatal error.
    pub fn transform(&self, raw: RawInput) -> DerivationResult<Vec<Document>> {
        let cohort = self.cfg.cohort();
        self.store.transform(raw, cohort, &self.codes, |participant| {
            let pseudo_id = participant.pseudo_id()?;
            let documents = evaluate(participant, &self.targets, self.generator.as_ref())?;
            tracing::info!(
                cohort = %cohort,
                participant = pseudo_id,
                documents = documents.len(),
                "participant transformed"
            );
            Ok(documents)
        })
    }

    /// Evaluate every target for `raw` and wrap the documents in a transaction bundle.
    pub fn transform_to_bundle(&self, raw: RawInput) -> DerivationResult<serde_json::Value> {
        let documents = self.transform(raw)?;
        Bundle::transaction(&documents, self.cfg.namespace()).map_err(DerivationError::Document)
    }
}
