//! Error type of the harvest saga

use gleaner_argo::ArgoError;
use gleaner_entities::RepositoryError;

/// Errors that abort a harvest (and trigger rollback once anything was
/// created). Size-limit and sniffing failures are not here; those skip a
/// single artifact and let the saga continue.
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    /// Engine call or artifact crawl failed
    #[error("engine error: {0}")]
    Engine(#[from] ArgoError),

    /// Repository call failed
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Transient staging storage failed
    #[error("staging failed: {0}")]
    Staging(#[from] std::io::Error),

    /// Reconstructed definition could not be serialized
    #[error("workflow serialization failed: {0}")]
    WorkflowSerialization(#[from] serde_yaml::Error),
}
