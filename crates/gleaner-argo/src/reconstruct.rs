//! Workflow Reconstructor
//!
//! A run that referenced a reusable template carries only its override spec;
//! the template's resolved spec sits in the status. The reconstructor merges
//! the two into one self-contained definition, run-level keys winning, with
//! the template-reference key dropped on both sides.

use crate::document::RunDocument;
use crate::error::ArgoError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Spec key that references a reusable template; never part of the output.
pub const TEMPLATE_REF_KEY: &str = "workflowTemplateRef";

const WORKFLOW_KIND: &str = "Workflow";

/// Canonical self-contained workflow definition.
#[derive(Debug, Clone, Serialize)]
pub struct ReconstructedWorkflow {
    /// Always `Workflow`
    pub kind: String,
    /// Annotations only; nothing else of the run metadata survives
    pub metadata: ReconstructedMetadata,
    /// Merged spec fields
    pub spec: IndexMap<String, Value>,
}

/// Metadata carried by a reconstructed definition.
#[derive(Debug, Clone, Serialize)]
pub struct ReconstructedMetadata {
    /// Run annotations
    pub annotations: BTreeMap<String, String>,
}

/// One declared input parameter of a workflow spec.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct InputParameter {
    /// Parameter name
    pub name: String,
    /// Declared description
    #[serde(default)]
    pub description: Option<String>,
    /// Bound value, when the run supplied one
    #[serde(default)]
    pub value: Option<Value>,
}

impl ReconstructedWorkflow {
    /// Declared input parameters (`spec.arguments.parameters`).
    ///
    /// Entries that do not parse as parameters are skipped rather than
    /// failing the whole listing.
    #[must_use]
    pub fn input_parameters(&self) -> Vec<InputParameter> {
        let Some(parameters) = self
            .spec
            .get("arguments")
            .and_then(|arguments| arguments.get("parameters"))
            .and_then(Value::as_array)
        else {
            return Vec::new();
        };
        parameters
            .iter()
            .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
            .collect()
    }
}

/// Merge a run's spec with its stored template spec.
///
/// Fails when the run has no spec at all, or references a template whose
/// resolved spec the status does not carry.
pub fn reconstruct_workflow(run: &RunDocument) -> Result<ReconstructedWorkflow, ArgoError> {
    let run_spec = run
        .spec
        .as_ref()
        .ok_or_else(|| ArgoError::MalformedRun("run document has no spec".to_string()))?;

    let mut spec = IndexMap::new();

    // Template first, so run-level keys overwrite on conflict.
    if run_spec.contains_key(TEMPLATE_REF_KEY) {
        let template = run
            .status
            .stored_workflow_template_spec
            .as_ref()
            .ok_or_else(|| {
                ArgoError::MalformedRun(
                    "template reference without a stored template spec".to_string(),
                )
            })?;
        for (key, value) in template {
            if key == TEMPLATE_REF_KEY {
                continue;
            }
            spec.insert(key.clone(), value.clone());
        }
    }

    for (key, value) in run_spec {
        if key == TEMPLATE_REF_KEY {
            continue;
        }
        spec.insert(key.clone(), value.clone());
    }

    Ok(ReconstructedWorkflow {
        kind: WORKFLOW_KIND.to_string(),
        metadata: ReconstructedMetadata {
            annotations: run.metadata.annotations.clone(),
        },
        spec,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn run(value: Value) -> RunDocument {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn merges_template_under_run_spec() {
        let run = run(json!({
            "metadata": { "name": "run-1" },
            "spec": {
                "workflowTemplateRef": { "name": "shared" },
                "b": "from-run",
                "c": "run-only"
            },
            "status": {
                "storedWorkflowTemplateSpec": {
                    "a": "template-only",
                    "b": "from-template"
                }
            }
        }));
        let merged = reconstruct_workflow(&run).unwrap();

        assert_eq!(merged.kind, "Workflow");
        assert_eq!(
            serde_json::to_value(&merged.spec).unwrap(),
            json!({ "a": "template-only", "b": "from-run", "c": "run-only" })
        );
        assert!(!merged.spec.contains_key(TEMPLATE_REF_KEY));
    }

    #[test]
    fn template_ref_key_inside_template_is_dropped() {
        let run = run(json!({
            "metadata": { "name": "run-1" },
            "spec": { "workflowTemplateRef": { "name": "shared" } },
            "status": {
                "storedWorkflowTemplateSpec": {
                    "workflowTemplateRef": { "name": "nested" },
                    "entrypoint": "main"
                }
            }
        }));
        let merged = reconstruct_workflow(&run).unwrap();
        assert_eq!(
            serde_json::to_value(&merged.spec).unwrap(),
            json!({ "entrypoint": "main" })
        );
    }

    #[test]
    fn standalone_run_ignores_stored_template() {
        let run = run(json!({
            "metadata": { "name": "run-1" },
            "spec": { "entrypoint": "main" },
            "status": {
                "storedWorkflowTemplateSpec": { "entrypoint": "other" }
            }
        }));
        let merged = reconstruct_workflow(&run).unwrap();
        assert_eq!(merged.spec["entrypoint"], json!("main"));
    }

    #[test]
    fn metadata_keeps_only_annotations() {
        let run = run(json!({
            "metadata": {
                "name": "run-1",
                "namespace": "argo",
                "annotations": { "provenance.name": "My Dataset" }
            },
            "spec": { "entrypoint": "main" }
        }));
        let merged = reconstruct_workflow(&run).unwrap();
        let value = serde_json::to_value(&merged).unwrap();
        assert_eq!(
            value["metadata"],
            json!({ "annotations": { "provenance.name": "My Dataset" } })
        );
    }

    #[test]
    fn missing_spec_is_malformed() {
        let run = run(json!({ "metadata": { "name": "run-1" } }));
        assert!(matches!(
            reconstruct_workflow(&run),
            Err(ArgoError::MalformedRun(_))
        ));
    }

    #[test]
    fn dangling_template_ref_is_malformed() {
        let run = run(json!({
            "metadata": { "name": "run-1" },
            "spec": { "workflowTemplateRef": { "name": "shared" } }
        }));
        assert!(matches!(
            reconstruct_workflow(&run),
            Err(ArgoError::MalformedRun(_))
        ));
    }

    #[test]
    fn input_parameters_are_listed_in_order() {
        let run = run(json!({
            "metadata": { "name": "run-1" },
            "spec": {
                "arguments": {
                    "parameters": [
                        { "name": "species", "value": "Lupinus polyphyllus" },
                        { "name": "resolution", "description": "grid size" }
                    ]
                }
            }
        }));
        let merged = reconstruct_workflow(&run).unwrap();
        assert_eq!(
            merged.input_parameters(),
            vec![
                InputParameter {
                    name: "species".to_string(),
                    description: None,
                    value: Some(json!("Lupinus polyphyllus")),
                },
                InputParameter {
                    name: "resolution".to_string(),
                    description: Some("grid size".to_string()),
                    value: None,
                },
            ]
        );
    }

    #[test]
    fn malformed_parameter_entries_are_skipped() {
        let run = run(json!({
            "metadata": { "name": "run-1" },
            "spec": {
                "arguments": {
                    "parameters": [
                        "not-a-parameter",
                        { "name": "kept" }
                    ]
                }
            }
        }));
        let merged = reconstruct_workflow(&run).unwrap();
        let names: Vec<String> = merged
            .input_parameters()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, ["kept"]);
    }

    #[test]
    fn spec_without_arguments_has_no_parameters() {
        let run = run(json!({
            "metadata": { "name": "run-1" },
            "spec": { "entrypoint": "main" }
        }));
        let merged = reconstruct_workflow(&run).unwrap();
        assert!(merged.input_parameters().is_empty());
    }
}
