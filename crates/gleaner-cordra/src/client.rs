//! REST client for the object repository

use async_trait::async_trait;
use gleaner_entities::{EntityKind, ObjectRepository, PayloadFile, RepositoryError};
use reqwest::multipart;
use serde_json::Value;
use tokio_util::io::ReaderStream;

/// Connection settings for the object repository.
#[derive(Debug, Clone)]
pub struct CordraConfig {
    /// Repository base URL, without a trailing slash
    pub host: String,
    /// Basic-auth username
    pub username: String,
    /// Basic-auth password
    pub password: String,
    /// Skip TLS certificate verification (self-signed deployments)
    pub accept_invalid_certs: bool,
}

impl CordraConfig {
    /// Settings with TLS verification on.
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
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

/// HTTP [`ObjectRepository`] over the repository's `/objects` endpoints.
pub struct CordraClient {
    http: reqwest::Client,
    config: CordraConfig,
}

impl CordraClient {
    /// Build a client from connection settings.
    pub fn new(config: CordraConfig) -> Result<Self, RepositoryError> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(transport)?;
        Ok(Self { http, config })
    }

    fn objects_url(&self) -> String {
        format!("{}/objects", self.config.host)
    }

    fn object_url(&self, id: &str) -> String {
        format!("{}/objects/{}", self.config.host, id)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.basic_auth(&self.config.username, Some(&self.config.password))
    }

    async fn send_create(
        &self,
        kind: EntityKind,
        request: reqwest::RequestBuilder,
    ) -> Result<String, RepositoryError> {
        let response = self.authorized(request).send().await.map_err(transport)?;
        let created: Value = into_json(response).await?;
        let id = extract_id(&created).ok_or(RepositoryError::MissingId)?;
        tracing::debug!("Created {kind} {id}");
        Ok(id)
    }
}

#[async_trait]
impl ObjectRepository for CordraClient {
    async fn create(&self, kind: EntityKind, object: Value) -> Result<String, RepositoryError> {
        let request = self
            .http
            .post(self.objects_url())
            .query(&[("type", kind.type_name()), ("full", "true")])
            .json(&object);
        self.send_create(kind, request).await
    }

    async fn create_with_payload(
        &self,
        kind: EntityKind,
        object: Value,
        payload: PayloadFile,
    ) -> Result<String, RepositoryError> {
        let content = serde_json::to_string(&object)?;
        // The payload streams from disk; the object is never buffered whole.
        let file = tokio::fs::File::open(&payload.path).await?;
        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
        let form = multipart::Form::new()
            .part(
                "content",
                multipart::Part::text(content)
                    .mime_str("application/json")
                    .map_err(transport)?,
            )
            .part(
                payload.name,
                multipart::Part::stream(body).file_name(payload.file_name),
            );
        let request = self
            .http
            .post(self.objects_url())
            .query(&[("type", kind.type_name()), ("full", "true")])
            .multipart(form);
        self.send_create(kind, request).await
    }

    async fn read(&self, id: &str) -> Result<Value, RepositoryError> {
        let response = self
            .authorized(self.http.get(self.object_url(id)))
            .send()
            .await
            .map_err(transport)?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(RepositoryError::NotFound(id.to_string()));
        }
        into_json(response).await
    }

    async fn update(&self, id: &str, object: Value) -> Result<(), RepositoryError> {
        let response = self
            .authorized(self.http.put(self.object_url(id)).json(&object))
            .send()
            .await
            .map_err(transport)?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        let response = self
            .authorized(self.http.delete(self.object_url(id)))
            .send()
            .await
            .map_err(transport)?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn find(&self, query: &str) -> Result<u64, RepositoryError> {
        let url = format!("{}/search", self.config.host);
        let response = self
            .authorized(
                self.http
                    .get(url)
                    .query(&[("query", query), ("pageSize", "0")]),
            )
            .send()
            .await
            .map_err(transport)?;
        let result: Value = into_json(response).await?;
        Ok(result["size"].as_u64().unwrap_or(0))
    }
}

fn transport(error: reqwest::Error) -> RepositoryError {
    RepositoryError::Unreachable(error.to_string())
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, RepositoryError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let message = response.text().await.unwrap_or_default();
        Err(RepositoryError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

async fn into_json(response: reqwest::Response) -> Result<Value, RepositoryError> {
    let response = ensure_success(response).await?;
    response.json().await.map_err(transport)
}

/// Assigned id of a creation response.
fn extract_id(created: &Value) -> Option<String> {
    created["@id"]
        .as_str()
        .or_else(|| created["id"].as_str())
        .map(str::to_string)
}
