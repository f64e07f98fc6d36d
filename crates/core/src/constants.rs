//! Constants used throughout the CDF core crate.
//!
//! Wave codes, sentinels and shared variable names. Variable names that belong to a single
//! concept live beside that concept's derivation module.

/// Self-report answer meaning "yes".
pub const YES: &str = "1";

/// Pseudo wave for participant-level values (date of death, date of inclusion).
pub const GLOBAL_WAVE: &str = "global";

/// Every Lifelines assessment, in order.
pub const LIFELINES_WAVES: [&str; 7] = ["1a", "1b", "1c", "2a", "2b", "3a", "3b"];

/// Rotterdam has a single baseline assessment.
pub const ROTTERDAM_WAVES: [&str; 1] = ["a1"];

/// Lifelines waves that carry the chronic condition questionnaires.
pub const CONDITION_WAVES: [&str; 6] = ["1a", "1b", "1c", "2a", "3a", "3b"];

/// Lifelines waves that carry the smoking questionnaire.
pub const TOBACCO_WAVES: [&str; 6] = ["1a", "1b", "1c", "2a", "2b", "3a"];

/// Variable holding the participant's pseudonymised id.
pub const PSEUDO_ID_VARIABLE: &str = "project_pseudo_id";

/// Name hashed into the default UUIDv5 namespace when none is configured.
pub const DEFAULT_NAMESPACE_NAME: &str = "urn:cdf:fhir-bundles";

/// Suffix of the bundle files written by the batch runner.
pub const BUNDLE_FILE_SUFFIX: &str = "bundle.json";
