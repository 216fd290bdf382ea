//! Property tests for the artifact locator's eligibility rules.

use gleaner_argo::{locate_artifacts, RunDocument, LOG_ARTIFACT_NAME, LOG_FILE_NAME};
use proptest::prelude::*;
use serde_json::json;

#[derive(Debug, Clone)]
struct ArtifactCase {
    in_run_key: bool,
    deleted: bool,
    gc: Option<&'static str>,
    has_path: bool,
    is_log: bool,
}

impl ArtifactCase {
    fn eligible(&self) -> bool {
        self.in_run_key
            && !self.deleted
            && matches!(self.gc, None | Some("Never"))
            && (self.is_log || self.has_path)
    }
}

fn case() -> impl Strategy<Value = ArtifactCase> {
    (
        any::<bool>(),
        any::<bool>(),
        prop_oneof![
            Just(None),
            Just(Some("Never")),
            Just(Some("OnWorkflowCompletion")),
            Just(Some("OnWorkflowDeletion")),
        ],
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(in_run_key, deleted, gc, has_path, is_log)| ArtifactCase {
            in_run_key,
            deleted,
            gc,
            has_path,
            is_log,
        })
}

fn run_document(cases: &[ArtifactCase]) -> RunDocument {
    let artifacts: Vec<serde_json::Value> = cases
        .iter()
        .enumerate()
        .map(|(i, case)| {
            let name = if case.is_log {
                LOG_ARTIFACT_NAME.to_string()
            } else {
                format!("art-{i}")
            };
            let key = if case.in_run_key {
                format!("bucket/run-1/{name}.tgz")
            } else {
                format!("bucket/other-run/{name}.tgz")
            };
            let mut artifact = json!({
                "name": name,
                "deleted": case.deleted,
                "s3": { "key": key }
            });
            if case.has_path {
                artifact["path"] = json!(format!("/outputs/{i}/file.txt"));
            }
            if let Some(strategy) = case.gc {
                artifact["artifactGC"] = json!({ "strategy": strategy });
            }
            artifact
        })
        .collect();

    serde_json::from_value(json!({
        "metadata": { "name": "run-1" },
        "status": {
            "nodes": {
                "run-1-step": { "outputs": { "artifacts": artifacts } }
            }
        }
    }))
    .expect("generated run document must parse")
}

proptest! {
    #[test]
    fn locator_keeps_exactly_the_eligible_artifacts(
        cases in proptest::collection::vec(case(), 0..8)
    ) {
        let run = run_document(&cases);
        let located = locate_artifacts(&run);

        let expected: Vec<usize> = cases
            .iter()
            .enumerate()
            .filter(|(_, case)| case.eligible())
            .map(|(i, _)| i)
            .collect();
        prop_assert_eq!(located.len(), expected.len());

        for (descriptor, index) in located.iter().zip(&expected) {
            let case = &cases[*index];
            if case.is_log {
                prop_assert_eq!(&descriptor.artifact_name, LOG_ARTIFACT_NAME);
                prop_assert_eq!(&descriptor.declared_path, LOG_FILE_NAME);
            } else {
                prop_assert_eq!(&descriptor.artifact_name, &format!("art-{index}"));
                prop_assert_eq!(
                    &descriptor.declared_path,
                    &format!("/outputs/{index}/file.txt")
                );
            }
            prop_assert_eq!(&descriptor.step_id, "run-1-step");
        }
    }
}
