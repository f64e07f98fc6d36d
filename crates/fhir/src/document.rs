//! Rendered resource documents and transaction bundle assembly.
//!
//! Responsibilities:
//! - Carry one rendered FHIR resource together with its logical id and resource type
//! - Derive stable `urn:uuid` identifiers from logical ids (UUID v5)
//! - Wrap a participant's documents into a `transaction` bundle with `PUT` requests

use crate::{FhirError, FhirResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Public domain-level types
// ============================================================================

/// A single rendered resource.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Document {
    /// FHIR resource type, e.g. `Condition`.
    pub resource_type: String,

    /// Logical id, unique per participant and resource.
    pub id: String,

    /// The resource body as JSON.
    pub resource: serde_json::Value,
}

impl Document {
    /// Serialise a wire struct into a document.
    pub(crate) fn from_wire<T: Serialize>(resource_type: &str, id: &str, wire: &T) -> FhirResult<Self> {
        if id.trim().is_empty() {
            return Err(FhirError::InvalidInput(format!(
                "{resource_type} resource id cannot be empty"
            )));
        }
        Ok(Self {
            resource_type: resource_type.to_owned(),
            id: id.to_owned(),
            resource: serde_json::to_value(wire)?,
        })
    }
}

/// `urn:uuid:` form of the UUID v5 derived from `id` within `namespace`.
pub fn id_to_uuid(id: &str, namespace: &Uuid) -> String {
    format!("{URN_UUID_PREFIX}{}", Uuid::new_v5(namespace, id.as_bytes()))
}

const URN_UUID_PREFIX: &str = "urn:uuid:";

// ============================================================================
// Wire model
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct BundleWire {
    resource_type: String,
    #[serde(rename = "type")]
    bundle_type: String,
    entry: Vec<BundleEntryWire>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct BundleEntryWire {
    full_url: String,
    resource: serde_json::Value,
    request: BundleRequestWire,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct BundleRequestWire {
    method: String,
    url: String,
}

// ============================================================================
// Public Bundle operations
// ============================================================================

/// Bundle operations.
///
/// This is a zero-sized type used for namespacing bundle-related operations.
pub struct Bundle;

impl Bundle {
    /// Build a `transaction` bundle from a participant's documents.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::InvalidInput`] if a document has an empty id.
    pub fn transaction(documents: &[Document], namespace: &Uuid) -> FhirResult<serde_json::Value> {
        let mut entry = Vec::with_capacity(documents.len());
        for document in documents {
            if document.id.trim().is_empty() {
                return Err(FhirError::InvalidInput(format!(
                    "{} document without id encountered when building bundle",
                    document.resource_type
                )));
            }
            let full_url = id_to_uuid(&document.id, namespace);
            let url = format!(
                "{}/{}",
                document.resource_type,
                &full_url[URN_UUID_PREFIX.len()..]
            );
            entry.push(BundleEntryWire {
                full_url,
                resource: document.resource.clone(),
                request: BundleRequestWire {
                    method: "PUT".into(),
                    url,
                },
            });
        }

        let wire = BundleWire {
            resource_type: "Bundle".into(),
            bundle_type: "transaction".into(),
            entry,
        };
        Ok(serde_json::to_value(wire)?)
    }
}
