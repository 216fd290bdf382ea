//! Run document model
//!
//! The slice of an Argo run document the harvester reads. Node maps use
//! `IndexMap` so step iteration keeps the document order the engine
//! reported; everything else is carried as loose JSON.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// One run, as returned by the engine's get-workflow call.
#[derive(Debug, Clone, Deserialize)]
pub struct RunDocument {
    /// Run metadata
    pub metadata: RunMetadata,
    /// The run's own spec fields
    #[serde(default)]
    pub spec: Option<IndexMap<String, Value>>,
    /// Execution status
    #[serde(default)]
    pub status: RunStatus,
}

/// Metadata of a run.
#[derive(Debug, Clone, Deserialize)]
pub struct RunMetadata {
    /// Run name, unique within its namespace
    pub name: String,
    /// Namespace the run executed in
    #[serde(default)]
    pub namespace: Option<String>,
    /// Run annotations, the carrier of the provenance micro-protocol
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

/// Execution status of a run.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatus {
    /// Per-step status, in document order
    #[serde(default)]
    pub nodes: IndexMap<String, NodeStatus>,
    /// When the run started
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    /// When the run finished; absent while the engine still reports it running
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    /// Resolved spec of the referenced reusable template, when the run used one
    #[serde(default)]
    pub stored_workflow_template_spec: Option<IndexMap<String, Value>>,
}

/// Status of one step.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStatus {
    /// Outputs attached to the step
    #[serde(default)]
    pub outputs: Option<NodeOutputs>,
    /// When the step finished
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
}

/// Output records of one step.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeOutputs {
    /// Artifacts the step produced
    #[serde(default)]
    pub artifacts: Vec<ArtifactRecord>,
}

/// One artifact attached to a step's outputs.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactRecord {
    /// Artifact name
    pub name: String,
    /// Declared output path
    #[serde(default)]
    pub path: Option<String>,
    /// Marked deleted after the run completed
    #[serde(default)]
    pub deleted: bool,
    /// Garbage-collection declaration
    #[serde(default, rename = "artifactGC")]
    pub artifact_gc: Option<ArtifactGc>,
    /// Object-storage location
    #[serde(default)]
    pub s3: Option<S3Artifact>,
}

/// Garbage-collection declaration of one artifact.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactGc {
    /// GC strategy; anything but `Never` marks a transient artifact
    #[serde(default)]
    pub strategy: String,
}

/// Object-storage location of one artifact.
#[derive(Debug, Clone, Deserialize)]
pub struct S3Artifact {
    /// Storage key the artifact was written under
    #[serde(default)]
    pub key: String,
}
