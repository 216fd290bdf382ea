//! In-memory repository stub
//!
//! Records every call in order, assigns sequential `test/{n}` ids, and can
//! inject failures at chosen points. Lives in the crate (not behind
//! `cfg(test)`) so downstream crates drive their sagas against it.

use crate::kind::EntityKind;
use crate::repository::{ObjectRepository, PayloadFile, RepositoryError};
use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::Value;

/// One recorded repository call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Successful creation
    Create {
        /// Assigned id
        id: String,
        /// Created kind
        kind: EntityKind,
    },
    /// Read of one object
    Read {
        /// Target id
        id: String,
    },
    /// Update of one object
    Update {
        /// Target id
        id: String,
    },
    /// Delete attempt, recorded whether or not it succeeds
    Delete {
        /// Target id
        id: String,
    },
    /// Query
    Find {
        /// Query string
        query: String,
    },
}

#[derive(Debug, Default)]
struct Inner {
    objects: IndexMap<String, Value>,
    kinds: IndexMap<String, EntityKind>,
    modified: IndexMap<String, u64>,
    payload_sizes: IndexMap<String, u64>,
    operations: Vec<Operation>,
    write_clock: u64,
    created_count: usize,
    fail_create_after: Option<usize>,
    fail_deletes: Vec<String>,
}

/// Recording in-memory [`ObjectRepository`].
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    inner: Mutex<Inner>,
}

impl InMemoryRepository {
    /// Empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every create once `successes` creations have gone through.
    pub fn fail_create_after(&self, successes: usize) {
        self.inner.lock().fail_create_after = Some(successes);
    }

    /// Fail delete calls for one id; the attempt is still recorded.
    pub fn fail_delete_of(&self, id: &str) {
        self.inner.lock().fail_deletes.push(id.to_string());
    }

    /// Every call recorded so far, in order.
    #[must_use]
    pub fn operations(&self) -> Vec<Operation> {
        self.inner.lock().operations.clone()
    }

    /// Number of delete attempts recorded.
    #[must_use]
    pub fn delete_attempts(&self) -> usize {
        self.inner
            .lock()
            .operations
            .iter()
            .filter(|op| matches!(op, Operation::Delete { .. }))
            .count()
    }

    /// Stored object, if present.
    #[must_use]
    pub fn object(&self, id: &str) -> Option<Value> {
        self.inner.lock().objects.get(id).cloned()
    }

    /// Number of stored objects.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.inner.lock().objects.len()
    }

    /// Ids of the stored objects of one kind, in creation order.
    #[must_use]
    pub fn ids_of_kind(&self, kind: EntityKind) -> Vec<String> {
        let inner = self.inner.lock();
        inner
            .kinds
            .iter()
            .filter(|(id, k)| **k == kind && inner.objects.contains_key(*id))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Logical write stamp of one object; later writes get larger stamps.
    #[must_use]
    pub fn modified_stamp(&self, id: &str) -> Option<u64> {
        self.inner.lock().modified.get(id).copied()
    }

    /// Size of the payload attached at creation, if any.
    #[must_use]
    pub fn payload_size(&self, id: &str) -> Option<u64> {
        self.inner.lock().payload_sizes.get(id).copied()
    }

    fn insert_object(inner: &mut Inner, kind: EntityKind, mut object: Value) -> String {
        inner.created_count += 1;
        let id = format!("test/{}", inner.created_count);
        if let Some(map) = object.as_object_mut() {
            map.insert("@id".to_string(), Value::String(id.clone()));
        }
        inner.write_clock += 1;
        let stamp = inner.write_clock;
        inner.objects.insert(id.clone(), object);
        inner.kinds.insert(id.clone(), kind);
        inner.modified.insert(id.clone(), stamp);
        id
    }

    fn check_create_failure(inner: &Inner) -> Result<(), RepositoryError> {
        if let Some(limit) = inner.fail_create_after {
            if inner.created_count >= limit {
                return Err(RepositoryError::Rejected {
                    status: 500,
                    message: format!("create disabled after {limit} objects"),
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectRepository for InMemoryRepository {
    async fn create(&self, kind: EntityKind, object: Value) -> Result<String, RepositoryError> {
        let mut inner = self.inner.lock();
        Self::check_create_failure(&inner)?;
        let id = Self::insert_object(&mut inner, kind, object);
        inner.operations.push(Operation::Create {
            id: id.clone(),
            kind,
        });
        Ok(id)
    }

    async fn create_with_payload(
        &self,
        kind: EntityKind,
        object: Value,
        payload: PayloadFile,
    ) -> Result<String, RepositoryError> {
        let size = std::fs::metadata(&payload.path)?.len();
        let mut inner = self.inner.lock();
        Self::check_create_failure(&inner)?;
        let id = Self::insert_object(&mut inner, kind, object);
        inner.payload_sizes.insert(id.clone(), size);
        inner.operations.push(Operation::Create {
            id: id.clone(),
            kind,
        });
        Ok(id)
    }

    async fn read(&self, id: &str) -> Result<Value, RepositoryError> {
        let mut inner = self.inner.lock();
        inner.operations.push(Operation::Read { id: id.to_string() });
        inner
            .objects
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }

    async fn update(&self, id: &str, object: Value) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock();
        inner
            .operations
            .push(Operation::Update { id: id.to_string() });
        if !inner.objects.contains_key(id) {
            return Err(RepositoryError::NotFound(id.to_string()));
        }
        inner.write_clock += 1;
        let stamp = inner.write_clock;
        inner.objects.insert(id.to_string(), object);
        inner.modified.insert(id.to_string(), stamp);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock();
        inner
            .operations
            .push(Operation::Delete { id: id.to_string() });
        if inner.fail_deletes.iter().any(|blocked| blocked == id) {
            return Err(RepositoryError::Rejected {
                status: 500,
                message: format!("delete disabled for {id}"),
            });
        }
        if inner.objects.shift_remove(id).is_none() {
            return Err(RepositoryError::NotFound(id.to_string()));
        }
        inner.kinds.shift_remove(id);
        inner.modified.shift_remove(id);
        inner.payload_sizes.shift_remove(id);
        Ok(())
    }

    async fn find(&self, query: &str) -> Result<u64, RepositoryError> {
        let mut inner = self.inner.lock();
        inner.operations.push(Operation::Find {
            query: query.to_string(),
        });
        Ok(inner.objects.len() as u64)
    }
}
