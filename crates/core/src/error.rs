use fhir::{CodeSystem, FhirError};

#[derive(Debug, thiserror::Error)]
pub enum DerivationError {
    #[error("variable {variable} not provided in the input")]
    MissingVariable { variable: String },
    #[error("assessment {wave} not available for variable {variable}")]
    MissingWave { variable: String, wave: String },
    #[error("precondition failed: {0}")]
    PreconditionViolation(String),
    #[error("unknown {system} code: {id}")]
    UnknownCode { system: CodeSystem, id: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("document generation failed: {0}")]
    Document(FhirError),
    #[error("failed to load code tables: {0}")]
    CodeTables(FhirError),
    #[error("failed to read participant file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to parse participant file: {0}")]
    Deserialization(serde_json::Error),
}

impl DerivationError {
    pub(crate) fn precondition(message: impl Into<String>) -> Self {
        Self::PreconditionViolation(message.into())
    }

    /// Data-integrity failures that abort the whole participant.
    ///
    /// Everything else only drops the target that raised it.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MissingVariable { .. }
                | Self::MissingWave { .. }
                | Self::PreconditionViolation(_)
                | Self::UnknownCode { .. }
        )
    }
}

impl From<FhirError> for DerivationError {
    fn from(err: FhirError) -> Self {
        match err {
            FhirError::UnknownCode { system, id } => Self::UnknownCode { system, id },
            other => Self::Document(other),
        }
    }
}

pub type DerivationResult<T> = std::result::Result<T, DerivationError>;
