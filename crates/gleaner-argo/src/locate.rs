//! Artifact Locator
//!
//! Scans a run's per-step output records and keeps the artifacts worth
//! harvesting: durable outputs of this run, not cache copies and not
//! transient inter-step hand-offs.

use crate::document::RunDocument;

/// Reserved name of the step-log artifact.
pub const LOG_ARTIFACT_NAME: &str = "main-logs";

/// Forced output path for the step-log artifact.
pub const LOG_FILE_NAME: &str = "main.log";

/// One artifact eligible for harvesting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDescriptor {
    /// Step the artifact is attached to
    pub step_id: String,
    /// Artifact name within the step's outputs
    pub artifact_name: String,
    /// Output path the artifact is harvested under
    pub declared_path: String,
}

/// List the eligible artifacts of a run, step order then artifact order.
///
/// Skipped artifacts: storage key missing or not containing the run's own
/// name (cache copies from other runs), marked deleted, or declaring a
/// garbage-collection strategy other than `Never` (transient inter-step
/// communication).
#[must_use]
pub fn locate_artifacts(run: &RunDocument) -> Vec<ArtifactDescriptor> {
    let run_name = &run.metadata.name;
    let mut descriptors = Vec::new();

    for (step_id, node) in &run.status.nodes {
        let Some(outputs) = &node.outputs else {
            continue;
        };
        for artifact in &outputs.artifacts {
            let Some(s3) = &artifact.s3 else {
                tracing::warn!(
                    "Artifact {} on step {} has no storage key, skipping",
                    artifact.name,
                    step_id
                );
                continue;
            };
            if !s3.key.contains(run_name.as_str()) {
                continue;
            }
            if artifact.deleted {
                continue;
            }
            if let Some(gc) = &artifact.artifact_gc {
                if gc.strategy != "Never" {
                    continue;
                }
            }

            let declared_path = if artifact.name == LOG_ARTIFACT_NAME {
                LOG_FILE_NAME.to_string()
            } else if let Some(path) = &artifact.path {
                path.clone()
            } else {
                tracing::warn!(
                    "Artifact {} on step {} has no declared path, skipping",
                    artifact.name,
                    step_id
                );
                continue;
            };

            descriptors.push(ArtifactDescriptor {
                step_id: step_id.clone(),
                artifact_name: artifact.name.clone(),
                declared_path,
            });
        }
    }

    descriptors
}
