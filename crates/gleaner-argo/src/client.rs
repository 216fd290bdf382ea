//! Argo Workflows REST client
//!
//! The engine is consumed through a handful of calls: fetch one run, list
//! runs, a minimal-page health probe, lint, and submit. Artifact bytes go
//! through [`ArtifactCrawler`] feeds built from the `artifact-files` URL
//! template; the generated API client gets that URL wrong, so the crawler
//! always builds it by hand.

use crate::crawl::{artifact_url_path, ArtifactCrawler, PendingEntry};
use crate::document::RunDocument;
use crate::error::{ensure_success, ArgoError};
use crate::locate::ArtifactDescriptor;
use reqwest::Url;
use serde_json::{json, Value};

/// Connection settings for the workflow engine.
#[derive(Debug, Clone)]
pub struct ArgoConfig {
    /// Engine base URL, without a trailing slash
    pub host: String,
    /// Bearer token sent with every request
    pub token: String,
    /// Namespace the harvested runs live in
    pub namespace: String,
    /// Skip TLS certificate verification (self-signed deployments)
    pub accept_invalid_certs: bool,
}

impl ArgoConfig {
    /// Settings with TLS verification on.
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        token: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into().trim_end_matches('/').to_string(),
            token: token.into(),
            namespace: namespace.into(),
            accept_invalid_certs: false,
        }
    }

    /// Allow self-signed certificates.
    #[must_use]
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }
}

/// REST surface of the workflow engine.
pub struct ArgoClient {
    http: reqwest::Client,
    config: ArgoConfig,
}

impl ArgoClient {
    /// Build a client from connection settings.
    pub fn new(config: ArgoConfig) -> Result<Self, ArgoError> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;
        Ok(Self { http, config })
    }

    fn workflows_url(&self) -> String {
        format!(
            "{}/api/v1/workflows/{}",
            self.config.host, self.config.namespace
        )
    }

    /// Probe the engine with a minimal-page list call.
    pub async fn check_health(&self) -> Result<(), ArgoError> {
        let response = self
            .http
            .get(self.workflows_url())
            .query(&[("listOptions.limit", "1")])
            .bearer_auth(&self.config.token)
            .send()
            .await?;
        ensure_success(response)?;
        Ok(())
    }

    /// Fetch one run's full status+spec document.
    pub async fn get_workflow(&self, name: &str) -> Result<RunDocument, ArgoError> {
        let url = format!("{}/{}", self.workflows_url(), name);
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.config.token)
            .send()
            .await?;
        let response = ensure_success(response)?;
        Ok(response.json().await?)
    }

    /// Names of the runs in the namespace.
    pub async fn list_workflows(&self) -> Result<Vec<String>, ArgoError> {
        let response = self
            .http
            .get(self.workflows_url())
            .bearer_auth(&self.config.token)
            .send()
            .await?;
        let response = ensure_success(response)?;
        let listing: Value = response.json().await?;
        let names = listing["items"]
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|item| item["metadata"]["name"].as_str())
            .map(str::to_string)
            .collect();
        Ok(names)
    }

    /// Ask the engine to validate a definition without running it.
    ///
    /// A rejection comes back as [`ArgoError::Validation`] carrying the
    /// engine's message.
    pub async fn lint_workflow(&self, definition: &Value) -> Result<Value, ArgoError> {
        let url = format!("{}/lint", self.workflows_url());
        let body = json!({
            "namespace": self.config.namespace,
            "workflow": definition,
        });
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.config.token)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ArgoError::Validation(message));
        }
        Ok(response.json().await?)
    }

    /// Submit a definition for execution.
    ///
    /// Any concrete `metadata.name` is scrubbed so resubmissions do not
    /// collide; when the definition carries no generate-name either, a
    /// random one is filled in.
    pub async fn submit_workflow(
        &self,
        definition: Value,
        dry_run: bool,
    ) -> Result<Value, ArgoError> {
        let definition = prepare_submission(definition);
        let body = json!({
            "namespace": self.config.namespace,
            "serverDryRun": dry_run,
            "workflow": definition,
        });
        let response = self
            .http
            .post(self.workflows_url())
            .bearer_auth(&self.config.token)
            .json(&body)
            .send()
            .await?;
        let response = ensure_success(response)?;
        Ok(response.json().await?)
    }

    /// Crawler feed over a run's eligible artifacts, in descriptor order.
    pub fn artifact_feed(
        &self,
        run_name: &str,
        descriptors: &[ArtifactDescriptor],
    ) -> Result<ArtifactCrawler, ArgoError> {
        let mut entries = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let raw = format!(
                "{}/artifact-files/{}/workflows/{}/{}/outputs/{}",
                self.config.host,
                self.config.namespace,
                run_name,
                descriptor.step_id,
                descriptor.artifact_name,
            );
            let url = Url::parse(&raw).map_err(|error| ArgoError::Url(format!("{raw}: {error}")))?;
            let path = artifact_url_path(&descriptor.step_id, &descriptor.declared_path);
            entries.push(PendingEntry { url, path });
        }
        Ok(ArtifactCrawler::new(
            self.http.clone(),
            self.config.token.clone(),
            entries,
        ))
    }
}

/// Scrub a definition for (re)submission.
fn prepare_submission(mut definition: Value) -> Value {
    let metadata = definition
        .as_object_mut()
        .map(|object| object.entry("metadata").or_insert_with(|| json!({})));
    if let Some(metadata) = metadata.and_then(Value::as_object_mut) {
        metadata.remove("name");
        if !metadata.contains_key("generateName") {
            metadata.insert(
                "name".to_string(),
                Value::String(uuid::Uuid::new_v4().to_string()),
            );
        }
    }
    definition
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn submission_scrubs_concrete_name() {
        let prepared = prepare_submission(json!({
            "metadata": { "name": "old-run", "generateName": "run-" },
            "spec": {}
        }));
        assert_eq!(
            prepared["metadata"],
            json!({ "generateName": "run-" })
        );
    }

    #[test]
    fn submission_without_generate_name_gets_a_random_one() {
        let prepared = prepare_submission(json!({
            "metadata": { "name": "old-run" },
            "spec": {}
        }));
        let name = prepared["metadata"]["name"].as_str().unwrap();
        assert_ne!(name, "old-run");
        assert!(uuid::Uuid::parse_str(name).is_ok());
    }

    #[test]
    fn submission_fills_in_missing_metadata() {
        let prepared = prepare_submission(json!({ "spec": {} }));
        assert!(prepared["metadata"]["name"].is_string());
    }

    #[test]
    fn config_trims_trailing_slash() {
        let config = ArgoConfig::new("http://engine/", "token", "argo");
        assert_eq!(config.host, "http://engine");
    }

    #[test]
    fn feed_entries_follow_the_url_template() {
        let client = ArgoClient::new(ArgoConfig::new("http://engine", "token", "argo")).unwrap();
        let feed = client
            .artifact_feed(
                "run-1",
                &[ArtifactDescriptor {
                    step_id: "run-1-step".to_string(),
                    artifact_name: "results".to_string(),
                    declared_path: "/outputs/results.csv".to_string(),
                }],
            )
            .unwrap();
        let entry = feed.pending().next().unwrap();
        assert_eq!(
            entry.url.as_str(),
            "http://engine/artifact-files/argo/workflows/run-1/run-1-step/outputs/results"
        );
        assert_eq!(entry.path, "run-1-step/outputs/results.csv");
    }
}
