//! # CDF Core
//!
//! Derivation engine that turns one cohort participant's raw survey or registry variables into
//! clinical records, and those records into FHIR documents.
//!
//! This crate contains:
//! - the participant input store and strict per-wave accessors
//! - cohort date helpers (survey dates, registry dates, year projection, month midpoints)
//! - concept derivations for the self-report and registry-linked cohorts
//! - the orchestrator that evaluates document targets and builds transaction bundles
//!
//! **No I/O policy**: configuration is resolved by the binaries and passed in as [`CoreConfig`];
//! derivations never read the environment or the filesystem.

pub mod cohort;
pub mod concepts;
pub mod config;
pub mod constants;
pub mod dates;
pub mod error;
pub mod input;
pub mod orchestrator;
pub mod values;

pub use cohort::Cohort;
pub use config::CoreConfig;
pub use error::{DerivationError, DerivationResult};
pub use input::{InputStore, Participant, RawInput, WaveValues};
pub use orchestrator::{
    ConceptModule, DocumentGenerator, FhirDocumentGenerator, Target, Template, Transformer,
    evaluate,
};

pub use cdf_types::{Gender, PartialDate};
pub use fhir::{CodeCollection, CodeProperties, CodeSystem, Document};
