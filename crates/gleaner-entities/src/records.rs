//! Wire-shape records, one per entity kind
//!
//! Every record serializes to exactly the JSON the repository schema expects
//! for its kind. Keeping the shapes as explicit structs (instead of ad hoc
//! JSON maps) pins the key names in one place across all eight kinds.

use crate::kind::EntityKind;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A record that creates one entity of a fixed kind.
pub trait EntityRecord: Serialize {
    /// Repository type this record creates.
    const KIND: EntityKind;
}

/// A submitter of the run.
#[derive(Debug, Clone, Serialize)]
pub struct PersonRecord {
    /// Display name, when the annotations carried one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Stable identity (an ORCID or similar URL)
    pub identifier: String,
}

impl EntityRecord for PersonRecord {
    const KIND: EntityKind = EntityKind::Person;
}

/// One transferred artifact file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileObjectRecord {
    /// Final path segment of the resolved artifact path
    pub name: String,
    /// Staged size in bytes
    pub content_size: u64,
    /// Sniffed media type; absent when sniffing found nothing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding_format: Option<String>,
    /// Resolved artifact path the content was transferred from
    pub content_url: String,
}

impl EntityRecord for FileObjectRecord {
    const KIND: EntityKind = EntityKind::FileObject;
}

/// An aggregate of files, either a per-group dataset or the root.
///
/// Creation shape only; the containing-dataset backref (`partOf`) is
/// patched onto the stored object after the root exists, never at create
/// time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetRecord {
    /// Dataset name
    pub name: String,
    /// Free-text description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Keywords from the run annotations
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    /// License URL from the run annotations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    /// Person ids
    pub author: Vec<String>,
    /// Member entity ids
    pub has_part: Vec<String>,
    /// Action ids this dataset mentions (root only)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mentions: Vec<String>,
}

impl EntityRecord for DatasetRecord {
    const KIND: EntityKind = EntityKind::Dataset;
}

/// The run itself, as an action with a time window.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateActionRecord {
    /// When the run started
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    /// When the run finished; absent when no step reported a finish
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Designated submitter, when the annotations named one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    /// Created file and group-dataset ids
    pub result: Vec<String>,
    /// Bound parameter-value ids
    pub object: Vec<String>,
    /// The workflow entity that produced the result
    pub instrument: String,
}

impl EntityRecord for CreateActionRecord {
    const KIND: EntityKind = EntityKind::CreateAction;
}

/// A declared input parameter of the workflow.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormalParameterRecord {
    /// Parameter name
    pub name: String,
    /// Declared description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Value type marker
    pub additional_type: String,
}

impl FormalParameterRecord {
    /// Text-typed parameter; all workflow inputs are treated as text.
    #[inline]
    #[must_use]
    pub fn text(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            name: name.into(),
            description,
            additional_type: "Text".to_string(),
        }
    }
}

impl EntityRecord for FormalParameterRecord {
    const KIND: EntityKind = EntityKind::FormalParameter;
}

/// A concrete value bound to an input parameter.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyValueRecord {
    /// Parameter name the value binds
    pub name: String,
    /// The bound value
    pub value: String,
    /// The formal parameter this value is an example of
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example_of_work: Option<String>,
}

impl EntityRecord for PropertyValueRecord {
    const KIND: EntityKind = EntityKind::PropertyValue;
}

/// The language the workflow is written in.
#[derive(Debug, Clone, Serialize)]
pub struct ComputerLanguageRecord {
    /// Language name
    pub name: String,
    /// Canonical identifier URL
    pub identifier: String,
    /// Project URL
    pub url: String,
}

impl EntityRecord for ComputerLanguageRecord {
    const KIND: EntityKind = EntityKind::ComputerLanguage;
}

/// The reconstructed workflow definition.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRecord {
    /// Workflow name
    pub name: String,
    /// Formal parameter ids declared as inputs
    pub input: Vec<String>,
    /// ComputerLanguage entity id
    pub programming_language: String,
}

impl EntityRecord for WorkflowRecord {
    const KIND: EntityKind = EntityKind::Workflow;
}
