//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Derivation code never reads environment variables; binaries read
//! them and hand the parsed values to [`CoreConfig::new`].

use crate::cohort::Cohort;
use crate::constants::DEFAULT_NAMESPACE_NAME;
use crate::{DerivationError, DerivationResult};
use fhir::{CodeCollection, CodeSystem};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    cohort: Cohort,
    namespace: Uuid,
    code_tables_dir: Option<PathBuf>,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// `code_tables_dir` should already have been checked with [`resolve_code_tables_dir`].
    pub fn new(
        cohort: Cohort,
        namespace: Uuid,
        code_tables_dir: Option<PathBuf>,
    ) -> DerivationResult<Self> {
        if namespace.is_nil() {
            return Err(DerivationError::InvalidInput(
                "bundle namespace cannot be the nil UUID".into(),
            ));
        }

        Ok(Self {
            cohort,
            namespace,
            code_tables_dir,
        })
    }

    pub fn cohort(&self) -> Cohort {
        self.cohort
    }

    pub fn namespace(&self) -> &Uuid {
        &self.namespace
    }

    pub fn code_tables_dir(&self) -> Option<&Path> {
        self.code_tables_dir.as_deref()
    }

    /// Load the code lookup service: the external tables when configured, else the embedded ones.
    pub fn load_code_tables(&self) -> DerivationResult<CodeCollection> {
        let loaded = match self.code_tables_dir() {
            Some(dir) => CodeCollection::from_dir(dir),
            None => CodeCollection::embedded(),
        };
        loaded.map_err(DerivationError::CodeTables)
    }
}

/// The namespace used when none is configured.
pub fn default_namespace() -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, DEFAULT_NAMESPACE_NAME.as_bytes())
}

/// Parse the bundle namespace from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`default_namespace`].
pub fn namespace_from_env_value(value: Option<String>) -> DerivationResult<Uuid> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        Some(text) => Uuid::parse_str(&text).map_err(|e| {
            DerivationError::InvalidInput(format!("CDF_NAMESPACE is not a valid UUID: {e}"))
        }),
        None => Ok(default_namespace()),
    }
}

/// Resolve the external code tables directory without reading environment variables.
///
/// `None` selects the embedded tables. An override must be a directory holding one table file
/// per code system.
pub fn resolve_code_tables_dir(override_dir: Option<PathBuf>) -> DerivationResult<Option<PathBuf>> {
    let Some(dir) = override_dir else {
        return Ok(None);
    };

    if !dir.is_dir() {
        return Err(DerivationError::InvalidInput(format!(
            "code tables override {} is not a directory",
            dir.display()
        )));
    }

    let missing: Vec<String> = CodeSystem::ALL
        .into_iter()
        .map(CodeSystem::table_file_name)
        .filter(|name| !dir.join(name).is_file())
        .collect();
    if !missing.is_empty() {
        return Err(DerivationError::InvalidInput(format!(
            "code tables directory {} is missing {}",
            dir.display(),
            missing.join(", ")
        )));
    }

    Ok(Some(dir))
}
