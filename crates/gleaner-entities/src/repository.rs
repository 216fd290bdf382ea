//! Object-repository contract
//!
//! The narrow seam the graph builder creates entities through. Implemented
//! over HTTP by `gleaner-cordra` and in memory by [`crate::stubs`].

use crate::kind::EntityKind;
use crate::records::EntityRecord;
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;

/// Errors from repository interactions.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Repository could not be reached at all
    #[error("repository unreachable: {0}")]
    Unreachable(String),

    /// Repository answered with a non-success status
    #[error("repository rejected request ({status}): {message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body, as far as it could be read
        message: String,
    },

    /// Creation response carried no object id
    #[error("creation response carried no object id")]
    MissingId,

    /// No object stored under the id
    #[error("object not found: {0}")]
    NotFound(String),

    /// Staged payload could not be read
    #[error("payload staging failed: {0}")]
    Payload(#[from] std::io::Error),

    /// Record could not be serialized to the wire shape
    #[error("record serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A staged local file attached to a creation as a binary payload.
#[derive(Debug, Clone)]
pub struct PayloadFile {
    /// Payload slot name within the created object
    pub name: String,
    /// File name reported to the repository
    pub file_name: String,
    /// Local path of the staged bytes
    pub path: PathBuf,
}

impl PayloadFile {
    /// Payload named after its content path, the common case.
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let name = name.into();
        Self {
            file_name: name.clone(),
            name,
            path: path.into(),
        }
    }
}

/// Create/read/update/delete/find primitives of the object repository.
///
/// Ids are assigned by the repository on creation and opaque to callers.
#[async_trait]
pub trait ObjectRepository: Send + Sync {
    /// Create one object of `kind`; returns its assigned id.
    async fn create(&self, kind: EntityKind, object: Value) -> Result<String, RepositoryError>;

    /// Create one object with a binary payload streamed from local storage.
    async fn create_with_payload(
        &self,
        kind: EntityKind,
        object: Value,
        payload: PayloadFile,
    ) -> Result<String, RepositoryError>;

    /// Read one object back.
    async fn read(&self, id: &str) -> Result<Value, RepositoryError>;

    /// Replace one object's content.
    async fn update(&self, id: &str, object: Value) -> Result<(), RepositoryError>;

    /// Delete one object.
    async fn delete(&self, id: &str) -> Result<(), RepositoryError>;

    /// Count the objects matching a repository query.
    async fn find(&self, query: &str) -> Result<u64, RepositoryError>;
}

/// Create a typed record; the kind comes from the record type.
pub async fn create_record<R>(
    repository: &dyn ObjectRepository,
    record: &R,
) -> Result<String, RepositoryError>
where
    R: EntityRecord + Sync,
{
    let object = serde_json::to_value(record)?;
    repository.create(R::KIND, object).await
}

/// Create a typed record with a staged binary payload attached.
pub async fn create_record_with_payload<R>(
    repository: &dyn ObjectRepository,
    record: &R,
    payload: PayloadFile,
) -> Result<String, RepositoryError>
where
    R: EntityRecord + Sync,
{
    let object = serde_json::to_value(record)?;
    repository.create_with_payload(R::KIND, object, payload).await
}
