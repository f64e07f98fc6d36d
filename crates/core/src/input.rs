//! Participant input and strict accessors.
//!
//! This module owns the raw wave-indexed variable table of one participant and the read-only
//! [`Participant`] handle that every derivation reads through.
//!
//! Responsibilities:
//! - Normalise raw values at ingestion (trimmed; empty, whitespace and `null` become absent)
//! - Strict access: an unknown variable or wave key is an error, never a silent absence
//! - Serialise transformations through the single participant slot of an [`InputStore`]
//!
//! Notes:
//! - "Absent" (`None`) means the wave was administered but the value was not recorded
//! - A missing wave key means the wave was never part of the input, which is a data error

use crate::cohort::Cohort;
use crate::{DerivationError, DerivationResult};
use fhir::{CodeCollection, CodeProperties, CodeSystem};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use crate::constants::PSEUDO_ID_VARIABLE;

// ============================================================================
// Raw input
// ============================================================================

/// One participant's raw variables: variable name -> wave code -> value or absent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawInput {
    variables: BTreeMap<String, BTreeMap<String, Option<String>>>,
}

impl RawInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value, normalising empty or whitespace text to absent.
    pub fn insert(&mut self, variable: &str, wave: &str, value: Option<&str>) {
        let value = value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_owned);
        self.variables
            .entry(variable.to_owned())
            .or_default()
            .insert(wave.to_owned(), value);
    }

    /// Builder form of [`RawInput::insert`] for a recorded value.
    pub fn with_value(mut self, variable: &str, wave: &str, value: &str) -> Self {
        self.insert(variable, wave, Some(value));
        self
    }

    /// Builder form of [`RawInput::insert`] for an administered but unanswered wave.
    pub fn with_absent(mut self, variable: &str, wave: &str) -> Self {
        self.insert(variable, wave, None);
        self
    }

    pub fn contains_variable(&self, variable: &str) -> bool {
        self.variables.contains_key(variable)
    }

    /// Parse `{ "variable": { "wave": "value" | number | bool | null } }`.
    pub fn from_json_str(json: &str) -> DerivationResult<Self> {
        let root: Value = serde_json::from_str(json).map_err(DerivationError::Deserialization)?;
        Self::from_json_value(&root)
    }

    pub fn from_json_value(root: &Value) -> DerivationResult<Self> {
        let Value::Object(variables) = root else {
            return Err(DerivationError::InvalidInput(
                "participant input must be a JSON object keyed by variable".into(),
            ));
        };

        let mut input = Self::new();
        for (variable, waves) in variables {
            let Value::Object(waves) = waves else {
                return Err(DerivationError::InvalidInput(format!(
                    "variable {variable} must map wave codes to values"
                )));
            };
            // an empty wave map still declares the variable
            input.variables.entry(variable.clone()).or_default();
            for (wave, value) in waves {
                let text = match value {
                    Value::Null => None,
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    Value::Bool(b) => Some(b.to_string()),
                    Value::Array(_) | Value::Object(_) => {
                        return Err(DerivationError::InvalidInput(format!(
                            "{variable}@{wave} must be a scalar value"
                        )));
                    }
                };
                input.insert(variable, wave, text.as_deref());
            }
        }
        Ok(input)
    }

    /// Load a participant file.
    pub fn load(path: &Path) -> DerivationResult<Self> {
        let json = std::fs::read_to_string(path).map_err(DerivationError::FileRead)?;
        Self::from_json_str(&json)
    }

    fn waves_of(&self, variable: &str) -> DerivationResult<&BTreeMap<String, Option<String>>> {
        self.variables
            .get(variable)
            .ok_or_else(|| DerivationError::MissingVariable {
                variable: variable.to_owned(),
            })
    }
}

// ============================================================================
// Participant handle
// ============================================================================

/// Read-only view of the participant being transformed.
///
/// Carries the cohort and the code lookup service so derivations can resolve codes and ids
/// without any global state.
#[derive(Clone, Copy, Debug)]
pub struct Participant<'a> {
    input: &'a RawInput,
    cohort: Cohort,
    codes: &'a CodeCollection,
}

impl<'a> Participant<'a> {
    pub fn new(input: &'a RawInput, cohort: Cohort, codes: &'a CodeCollection) -> Self {
        Self {
            input,
            cohort,
            codes,
        }
    }

    pub fn cohort(&self) -> Cohort {
        self.cohort
    }

    /// Strictly read `variable` at `wave`.
    ///
    /// # Errors
    ///
    /// [`DerivationError::MissingVariable`] if the variable is not in the input,
    /// [`DerivationError::MissingWave`] if it has no key for `wave`.
    pub fn value_at(&self, variable: &str, wave: &str) -> DerivationResult<Option<&'a str>> {
        self.values_across_waves(variable)?.get(wave)
    }

    /// Strictly read the full per-wave map of `variable`.
    pub fn values_across_waves(&self, variable: &str) -> DerivationResult<WaveValues<'a>> {
        let values = self.input.waves_of(variable)?;
        Ok(WaveValues {
            variable: variable.to_owned(),
            cohort: self.cohort,
            values,
        })
    }

    /// Resolve a code by id.
    pub fn code(&self, system: CodeSystem, id: &str) -> DerivationResult<CodeProperties> {
        Ok(self.codes.get(system, id)?.clone())
    }

    pub fn snomed(&self, id: &str) -> DerivationResult<CodeProperties> {
        self.code(CodeSystem::Snomed, id)
    }

    pub fn loinc(&self, id: &str) -> DerivationResult<CodeProperties> {
        self.code(CodeSystem::Loinc, id)
    }

    pub fn ucum(&self, id: &str) -> DerivationResult<CodeProperties> {
        self.code(CodeSystem::Ucum, id)
    }

    /// The pseudonymised participant id, read at the baseline wave.
    pub fn pseudo_id(&self) -> DerivationResult<&'a str> {
        let wave = self.cohort.baseline_wave();
        self.value_at(PSEUDO_ID_VARIABLE, wave)?.ok_or_else(|| {
            DerivationError::InvalidInput(format!("{PSEUDO_ID_VARIABLE}@{wave} is not recorded"))
        })
    }

    /// `{name}-{pseudo id}`
    pub fn resource_id(&self, name: &str) -> DerivationResult<String> {
        Ok(format!("{name}-{}", self.pseudo_id()?))
    }

    /// `{name}-{wave}-{pseudo id}`
    pub fn wave_specific_resource_id(&self, name: &str, wave: &str) -> DerivationResult<String> {
        Ok(format!("{name}-{wave}-{}", self.pseudo_id()?))
    }
}

/// The per-wave values of one variable, with strict wave access.
#[derive(Clone, Debug)]
pub struct WaveValues<'a> {
    variable: String,
    cohort: Cohort,
    values: &'a BTreeMap<String, Option<String>>,
}

impl<'a> WaveValues<'a> {
    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// Strict read: fails with [`DerivationError::MissingWave`] when the wave key is absent.
    pub fn get(&self, wave: &str) -> DerivationResult<Option<&'a str>> {
        self.values
            .get(wave)
            .map(|value| value.as_deref())
            .ok_or_else(|| DerivationError::MissingWave {
                variable: self.variable.clone(),
                wave: wave.to_owned(),
            })
    }

    /// Lenient read: a missing wave key counts as not recorded.
    pub fn recorded(&self, wave: &str) -> Option<&'a str> {
        self.values.get(wave).and_then(|value| value.as_deref())
    }

    /// Waves in cohort order; wave keys outside the cohort ordering come last, lexically.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, Option<&'a str>)> + 'a {
        let cohort = self.cohort;
        let mut entries: Vec<(&'a str, Option<&'a str>)> = self
            .values
            .iter()
            .map(|(wave, value)| (wave.as_str(), value.as_deref()))
            .collect();
        entries.sort_by_key(|(wave, _)| (cohort.wave_rank(wave).unwrap_or(usize::MAX), *wave));
        entries.into_iter()
    }

    /// True when any wave recorded exactly `value`.
    pub fn any_equals(&self, value: &str) -> bool {
        self.values.values().any(|v| v.as_deref() == Some(value))
    }

    /// First wave, in cohort order, that recorded exactly `value`.
    pub fn first_wave_with(&self, value: &str) -> Option<&'a str> {
        self.iter()
            .find(|(_, recorded)| *recorded == Some(value))
            .map(|(wave, _)| wave)
    }

    /// Last wave, in cohort order, with a recorded value.
    pub fn last_recorded(&self) -> Option<(&'a str, &'a str)> {
        self.iter()
            .filter_map(|(wave, value)| value.map(|v| (wave, v)))
            .last()
    }
}

// ============================================================================
// Input store
// ============================================================================

/// Single participant slot shared by all transformations of one process.
///
/// The lock is held for the whole of one participant's evaluation, so overlapping calls are
/// serialised. Parallel fan-out needs one store per worker.
#[derive(Debug, Default)]
pub struct InputStore {
    slot: Mutex<RawInput>,
}

impl InputStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the slot with `raw` and run `f` against it while holding the lock.
    pub fn transform<T>(
        &self,
        raw: RawInput,
        cohort: Cohort,
        codes: &CodeCollection,
        f: impl FnOnce(&Participant<'_>) -> T,
    ) -> T {
        // the slot is always replaced wholesale, so a poisoned value is never read
        let mut guard = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = raw;
        let participant = Participant::new(&guard, cohort, codes);
        f(&participant)
    }
}
