//! Code lookup service for SNOMED CT, LOINC, UCUM and local code lists.
//!
//! Responsibilities:
//! - Load the static reference tables once (embedded in the crate or from a directory)
//! - Resolve a [`CodeProperties`] triple by `(system, id)`
//! - Fail loudly with [`FhirError::UnknownCode`] for ids that are not in the table
//!
//! Notes:
//! - The tables are read-only after loading
//! - An `id` is the lookup key used by derivations; it usually equals the code itself, but local
//!   code lists (cuff sizes, gender) are keyed by a readable name

use crate::{FhirError, FhirResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

// ============================================================================
// Public domain-level types
// ============================================================================

/// An immutable coding triple resolved from the code tables.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodeProperties {
    /// Code system URI.
    pub system: String,

    /// Code within the system.
    pub code: String,

    /// Human readable display text.
    pub display: String,
}

/// Code systems known to the lookup service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CodeSystem {
    Snomed,
    Loinc,
    Ucum,
    /// Dutch blood pressure cuff size list.
    Manchet,
    /// HL7 v3 administrative gender.
    FhirV3,
}

impl CodeSystem {
    pub const ALL: [CodeSystem; 5] = [
        CodeSystem::Snomed,
        CodeSystem::Loinc,
        CodeSystem::Ucum,
        CodeSystem::Manchet,
        CodeSystem::FhirV3,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CodeSystem::Snomed => "snomed",
            CodeSystem::Loinc => "loinc",
            CodeSystem::Ucum => "ucum",
            CodeSystem::Manchet => "manchet",
            CodeSystem::FhirV3 => "fhirv3",
        }
    }

    /// Parse the short system name used on the command line and in table file names.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|system| system.as_str() == name)
    }

    /// File name of this system's table inside a code table directory.
    pub fn table_file_name(self) -> String {
        format!("{}.yaml", self.as_str())
    }

    fn embedded_table(self) -> &'static str {
        match self {
            CodeSystem::Snomed => include_str!("../tables/snomed.yaml"),
            CodeSystem::Loinc => include_str!("../tables/loinc.yaml"),
            CodeSystem::Ucum => include_str!("../tables/ucum.yaml"),
            CodeSystem::Manchet => include_str!("../tables/manchet.yaml"),
            CodeSystem::FhirV3 => include_str!("../tables/fhirv3.yaml"),
        }
    }
}

impl std::fmt::Display for CodeSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Wire model
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CodeTableWire {
    system: String,
    codes: Vec<CodeEntryWire>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CodeEntryWire {
    id: String,
    /// Defaults to `id`.
    #[serde(default)]
    code: Option<String>,
    display: String,
    /// Overrides the table-level system for this entry.
    #[serde(default)]
    system: Option<String>,
}

// ============================================================================
// Public CodeCollection operations
// ============================================================================

/// All code tables, keyed by system and then by id.
#[derive(Clone, Debug)]
pub struct CodeCollection {
    tables: HashMap<CodeSystem, HashMap<String, CodeProperties>>,
}

impl CodeCollection {
    /// Load the tables compiled into this crate.
    pub fn embedded() -> FhirResult<Self> {
        Self::from_sources(|system| Ok(system.embedded_table().to_owned()))
    }

    /// Load `<system>.yaml` tables from `dir`.
    ///
    /// Every system must have a table; a missing file is an I/O error.
    pub fn from_dir(dir: &Path) -> FhirResult<Self> {
        Self::from_sources(|system| {
            let path = dir.join(system.table_file_name());
            Ok(std::fs::read_to_string(path)?)
        })
    }

    fn from_sources(read: impl Fn(CodeSystem) -> FhirResult<String>) -> FhirResult<Self> {
        let mut tables = HashMap::new();
        for system in CodeSystem::ALL {
            let yaml_text = read(system)?;
            tables.insert(system, parse_table(system, &yaml_text)?);
        }
        Ok(Self { tables })
    }

    /// Resolve a code by id.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::UnknownCode`] if `id` is not present in the `system` table.
    pub fn get(&self, system: CodeSystem, id: &str) -> FhirResult<&CodeProperties> {
        self.tables
            .get(&system)
            .and_then(|table| table.get(id))
            .ok_or_else(|| FhirError::UnknownCode {
                system,
                id: id.to_owned(),
            })
    }

    /// Number of entries loaded for `system`.
    pub fn len(&self, system: CodeSystem) -> usize {
        self.tables.get(&system).map_or(0, HashMap::len)
    }
}

fn parse_table(system: CodeSystem, yaml_text: &str) -> FhirResult<HashMap<String, CodeProperties>> {
    let deserializer = serde_yaml::Deserializer::from_str(yaml_text);
    let wire = match serde_path_to_error::deserialize::<_, CodeTableWire>(deserializer) {
        Ok(parsed) => parsed,
        Err(err) => {
            let path = err.path().to_string();
            let source = err.into_inner();
            let path = if path.is_empty() {
                "<root>"
            } else {
                path.as_str()
            };
            return Err(FhirError::Translation(format!(
                "{system} code table schema mismatch at {path}: {source}"
            )));
        }
    };

    let mut table = HashMap::with_capacity(wire.codes.len());
    for entry in wire.codes {
        if entry.id.trim().is_empty() {
            return Err(FhirError::InvalidInput(format!(
                "{system} code table contains an empty id"
            )));
        }
        let properties = CodeProperties {
            system: entry.system.unwrap_or_else(|| wire.system.clone()),
            code: entry.code.unwrap_or_else(|| entry.id.clone()),
            display: entry.display,
        };
        if table.insert(entry.id.clone(), properties).is_some() {
            return Err(FhirError::InvalidInput(format!(
                "{system} code table contains duplicate id '{}'",
                entry.id
            )));
        }
    }
    Ok(table)
}
