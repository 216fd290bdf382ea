//! Provenance harvest saga
//!
//! Drives the ordered entity-creation sequence for one finished run:
//! authors, files, category groups, parameters, the workflow descriptor,
//! the action, the root dataset, back-patching, and the final touch. Every
//! creation lands in a [`saga::CreationRegistry`]; any failure rolls the
//! registry back best-effort and re-raises the original error.

pub mod annotations;
pub mod config;
pub mod error;
pub mod grouping;
pub mod saga;
pub mod stage;

pub use config::HarvestConfig;
pub use error::HarvestError;
pub use saga::{CreationRegistry, GraphBuilder};
