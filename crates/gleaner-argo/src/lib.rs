//! Argo Workflows client
//!
//! Everything the harvester needs from the workflow engine:
//! - `ArgoClient`, the REST surface (fetch, list, health, lint, submit)
//! - the run document model, with step order preserved
//! - the Workflow Reconstructor (run spec merged over its template)
//! - the Artifact Locator (which artifacts are worth harvesting)
//! - the Artifact Crawler (streams nested artifact trees)

pub mod client;
pub mod crawl;
pub mod document;
pub mod error;
pub mod locate;
pub mod reconstruct;

pub use client::{ArgoClient, ArgoConfig};
pub use crawl::{ArtifactCrawler, ArtifactFeed, ArtifactStreamItem, ByteStream};
pub use document::{ArtifactRecord, NodeStatus, RunDocument, RunMetadata, RunStatus};
pub use error::ArgoError;
pub use locate::{locate_artifacts, ArtifactDescriptor, LOG_ARTIFACT_NAME, LOG_FILE_NAME};
pub use reconstruct::{
    reconstruct_workflow, InputParameter, ReconstructedWorkflow, TEMPLATE_REF_KEY,
};
