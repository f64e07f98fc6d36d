//! Wire building blocks shared by the resource renderers.

use crate::codes::CodeProperties;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct CodingWire {
    pub system: String,
    pub code: String,
    pub display: String,
}

impl From<&CodeProperties> for CodingWire {
    fn from(properties: &CodeProperties) -> Self {
        Self {
            system: properties.system.clone(),
            code: properties.code.clone(),
            display: properties.display.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct CodeableConceptWire {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<CodingWire>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CodeableConceptWire {
    pub fn of(properties: &CodeProperties) -> Self {
        Self::of_all(std::slice::from_ref(properties))
    }

    pub fn of_all(properties: &[CodeProperties]) -> Self {
        Self {
            coding: properties.iter().map(CodingWire::from).collect(),
            text: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            coding: Vec::new(),
            text: Some(text.into()),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ReferenceWire {
    pub reference: String,
}

impl ReferenceWire {
    pub fn to(resource_type: &str, id: &str) -> Self {
        Self {
            reference: format!("{resource_type}/{id}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct QuantityWire {
    pub value: f64,
    pub unit: String,
    pub system: String,
    pub code: String,
}

impl QuantityWire {
    pub fn new(value: f64, unit: &CodeProperties) -> Self {
        Self {
            value,
            unit: unit.code.clone(),
            system: unit.system.clone(),
            code: unit.code.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub(crate) struct ExtensionWire {
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_codeable_concept: Option<CodeableConceptWire>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_boolean: Option<bool>,
}
