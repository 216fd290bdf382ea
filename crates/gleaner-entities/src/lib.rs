//! Provenance entity model
//!
//! Defines the eight entity kinds a harvested run is described with, the
//! wire-shape record types used to create them, and the repository contract
//! they are created against:
//! - `EntityKind` and one record struct per kind
//! - `ObjectRepository`, the async create/read/update/delete/find seam
//! - `InMemoryRepository`, a recording stub for tests

pub mod kind;
pub mod records;
pub mod repository;
pub mod stubs;

pub use kind::EntityKind;
pub use records::{
    ComputerLanguageRecord, CreateActionRecord, DatasetRecord, EntityRecord, FileObjectRecord,
    FormalParameterRecord, PersonRecord, PropertyValueRecord, WorkflowRecord,
};
pub use repository::{
    create_record, create_record_with_payload, ObjectRepository, PayloadFile, RepositoryError,
};
pub use stubs::{InMemoryRepository, Operation};
