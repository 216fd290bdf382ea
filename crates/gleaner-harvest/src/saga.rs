//! Provenance graph saga
//!
//! One [`GraphBuilder::build`] call drives the whole ordered creation
//! sequence against the repository. Every successful creation is recorded
//! in the [`CreationRegistry`] before the saga moves on; any later failure
//! walks the registry and issues one best-effort delete per entry, then
//! re-raises the original error. The root dataset is always the last
//! object touched, so "newest object = root" holds for consumers.

use crate::annotations;
use crate::config::HarvestConfig;
use crate::error::HarvestError;
use crate::grouping::{partition_files, CreatedFile};
use crate::stage::{final_segment, stage_item, StagedOutcome};
use chrono::{DateTime, Utc};
use gleaner_argo::{reconstruct_workflow, ArtifactFeed, RunDocument};
use gleaner_entities::{
    create_record, create_record_with_payload, ComputerLanguageRecord, CreateActionRecord,
    DatasetRecord, EntityKind, FileObjectRecord, FormalParameterRecord, ObjectRepository,
    PayloadFile, PersonRecord, PropertyValueRecord, WorkflowRecord,
};
use serde_json::{json, Value};
use std::io::Write;
use std::sync::Arc;

const LANGUAGE_NAME: &str = "Argo Workflows";
const LANGUAGE_IDENTIFIER: &str = "https://argoproj.github.io/workflows/";
const LANGUAGE_URL: &str = "https://argoproj.github.io/workflows/";

/// Payload slot the serialized definition is attached under.
const WORKFLOW_PAYLOAD_NAME: &str = "workflow.yaml";

/// Ordered record of every entity created during one saga run.
///
/// Append-only while the saga runs; consumed in full by rollback. Never
/// outlives the builder invocation.
#[derive(Debug, Default)]
pub struct CreationRegistry {
    entries: Vec<(String, EntityKind)>,
}

impl CreationRegistry {
    fn record(&mut self, id: String, kind: EntityKind) {
        tracing::debug!("Recorded {kind} {id}");
        self.entries.push((id, kind));
    }

    /// Entries in creation order.
    #[must_use]
    pub fn entries(&self) -> &[(String, EntityKind)] {
        &self.entries
    }

    /// Number of recorded creations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was created yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Action time window of a run.
///
/// The engine may still report the run itself as running after every step
/// finished, so the end falls back to the latest step finish.
fn action_window(run: &RunDocument) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    let end = run.status.finished_at.or_else(|| {
        run.status
            .nodes
            .values()
            .filter_map(|node| node.finished_at)
            .max()
    });
    (run.status.started_at, end)
}

/// The saga orchestrator.
pub struct GraphBuilder {
    repository: Arc<dyn ObjectRepository>,
    config: HarvestConfig,
}

impl GraphBuilder {
    /// Builder over a repository, with the given limits.
    #[must_use]
    pub fn new(repository: Arc<dyn ObjectRepository>, config: HarvestConfig) -> Self {
        Self { repository, config }
    }

    /// Assemble the provenance graph of one run from its artifact feed.
    ///
    /// Returns the root dataset id. On failure everything already created
    /// is rolled back best-effort and the triggering error is returned.
    pub async fn build(
        &self,
        run: &RunDocument,
        feed: &mut dyn ArtifactFeed,
    ) -> Result<String, HarvestError> {
        let mut registry = CreationRegistry::default();
        match self.run_steps(run, feed, &mut registry).await {
            Ok(root_id) => Ok(root_id),
            Err(error) => {
                tracing::error!(
                    "Harvest of {} failed: {error}. Rolling back {} created objects",
                    run.metadata.name,
                    registry.len()
                );
                self.rollback(&registry).await;
                Err(error)
            }
        }
    }

    /// Delete every registry entry; individual failures are logged and do
    /// not stop the cleanup.
    async fn rollback(&self, registry: &CreationRegistry) {
        for (id, kind) in registry.entries() {
            if let Err(delete_error) = self.repository.delete(id).await {
                tracing::warn!("Rollback delete of {kind} {id} failed: {delete_error}");
            }
        }
    }

    async fn run_steps(
        &self,
        run: &RunDocument,
        feed: &mut dyn ArtifactFeed,
        registry: &mut CreationRegistry,
    ) -> Result<String, HarvestError> {
        let workflow = reconstruct_workflow(run)?;
        let run_annotations = &workflow.metadata.annotations;
        let repository = self.repository.as_ref();

        // 1. authors
        tracing::info!("Creating authors");
        let mut person_ids = Vec::new();
        for submitter in annotations::submitters(run_annotations) {
            let record = PersonRecord {
                name: submitter.name,
                identifier: submitter.identifier,
            };
            let id = create_record(repository, &record).await?;
            registry.record(id.clone(), EntityKind::Person);
            person_ids.push(id);
        }
        let agent_id = person_ids.first().cloned();

        // 2. files
        tracing::info!("Creating file objects");
        let mut files = Vec::new();
        while let Some(item) = feed.next_item().await {
            let item = item?;
            if self.config.skip_content {
                tracing::info!("Skip-content mode, discarding {}", item.resolved_path);
                continue;
            }
            let staged = match stage_item(item, self.config.max_file_bytes).await? {
                StagedOutcome::Staged(staged) => staged,
                StagedOutcome::TooLarge { .. } => continue,
            };
            let record = FileObjectRecord {
                name: final_segment(&staged.resolved_path).to_string(),
                content_size: staged.size,
                encoding_format: staged.media_type.clone(),
                content_url: staged.resolved_path.clone(),
            };
            let payload = PayloadFile::new(staged.resolved_path.clone(), staged.file.path());
            let id = create_record_with_payload(repository, &record, payload).await?;
            registry.record(id.clone(), EntityKind::FileObject);
            files.push(CreatedFile {
                id,
                content_path: staged.resolved_path.clone(),
            });
        }

        // 3. grouping
        let license = annotations::license(run_annotations);
        let keywords = annotations::keywords(run_annotations);
        let (groups, top_level_files) = partition_files(&files);
        let mut group_ids = Vec::new();
        for group in groups {
            tracing::info!("Creating group dataset {}", group.name);
            let record = DatasetRecord {
                name: group.name,
                description: None,
                keywords: keywords.clone(),
                license: license.clone(),
                author: person_ids.clone(),
                has_part: group.member_ids,
                mentions: Vec::new(),
            };
            let id = create_record(repository, &record).await?;
            registry.record(id.clone(), EntityKind::Dataset);
            group_ids.push(id);
        }

        // 4. parameters
        tracing::info!("Creating formal parameters");
        let mut parameter_ids = Vec::new();
        let mut value_ids = Vec::new();
        for parameter in workflow.input_parameters() {
            let record = FormalParameterRecord::text(&parameter.name, parameter.description);
            let parameter_id = create_record(repository, &record).await?;
            registry.record(parameter_id.clone(), EntityKind::FormalParameter);
            parameter_ids.push(parameter_id.clone());

            if let Some(value) = parameter.value {
                let value = match value {
                    Value::String(text) => text,
                    other => other.to_string(),
                };
                let record = PropertyValueRecord {
                    name: parameter.name,
                    value,
                    example_of_work: Some(parameter_id),
                };
                let value_id = create_record(repository, &record).await?;
                registry.record(value_id.clone(), EntityKind::PropertyValue);
                value_ids.push(value_id);
            }
        }

        // 5. language + workflow descriptor
        tracing::info!("Creating workflow descriptor");
        let language = ComputerLanguageRecord {
            name: LANGUAGE_NAME.to_string(),
            identifier: LANGUAGE_IDENTIFIER.to_string(),
            url: LANGUAGE_URL.to_string(),
        };
        let language_id = create_record(repository, &language).await?;
        registry.record(language_id.clone(), EntityKind::ComputerLanguage);

        let serialized = serde_yaml::to_string(&workflow)?;
        let mut descriptor = tempfile::Builder::new()
            .prefix("gleaner-workflow-")
            .tempfile()
            .map_err(HarvestError::Staging)?;
        descriptor
            .write_all(serialized.as_bytes())
            .map_err(HarvestError::Staging)?;
        descriptor.flush().map_err(HarvestError::Staging)?;
        let workflow_record = WorkflowRecord {
            name: run.metadata.name.clone(),
            input: parameter_ids,
            programming_language: language_id,
        };
        let workflow_id = create_record_with_payload(
            repository,
            &workflow_record,
            PayloadFile::new(WORKFLOW_PAYLOAD_NAME, descriptor.path()),
        )
        .await?;
        registry.record(workflow_id.clone(), EntityKind::Workflow);
        drop(descriptor);

        // 6. action
        tracing::info!("Creating action");
        let (start_time, end_time) = action_window(run);
        let mut result_ids: Vec<String> =
            top_level_files.iter().map(|file| file.id.clone()).collect();
        result_ids.extend(group_ids.iter().cloned());
        let action = CreateActionRecord {
            start_time,
            end_time,
            agent: agent_id,
            result: result_ids.clone(),
            object: value_ids.clone(),
            instrument: workflow_id.clone(),
        };
        let action_id = create_record(repository, &action).await?;
        registry.record(action_id.clone(), EntityKind::CreateAction);

        // 7. root dataset
        tracing::info!("Creating root dataset");
        let name = annotations::title(run_annotations)
            .unwrap_or_else(|| run.metadata.name.clone());
        let description = annotations::description(run_annotations)
            .unwrap_or_else(|| run.metadata.name.clone());
        let mut root_parts: Vec<String> =
            top_level_files.iter().map(|file| file.id.clone()).collect();
        root_parts.push(workflow_id);
        root_parts.extend(group_ids.iter().cloned());
        let root = DatasetRecord {
            name,
            description: Some(description),
            keywords,
            license,
            author: person_ids,
            has_part: root_parts,
            mentions: vec![action_id],
        };
        let root_id = create_record(repository, &root).await?;
        registry.record(root_id.clone(), EntityKind::Dataset);

        // 8. back-patch children to the root
        tracing::info!("Updating children backref to the root dataset");
        let children = files
            .iter()
            .map(|file| file.id.clone())
            .chain(group_ids.iter().cloned());
        for child_id in children {
            let mut object = self.repository.read(&child_id).await?;
            if let Some(map) = object.as_object_mut() {
                let missing = map.get("partOf").map_or(true, Value::is_null);
                if missing {
                    map.insert("partOf".to_string(), json!([root_id.clone()]));
                }
            }
            self.repository.update(&child_id, object).await?;
        }

        // 9. touch the root so it is provably the newest object
        let root_object = self.repository.read(&root_id).await?;
        self.repository.update(&root_id, root_object).await?;

        Ok(root_id)
    }
}
