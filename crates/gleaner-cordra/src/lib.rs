//! Cordra object-repository client
//!
//! HTTP implementation of the `ObjectRepository` contract from
//! `gleaner-entities`: create (plain or with a payload streamed from local
//! storage), read, update, delete, and a count-only search.

pub mod client;

pub use client::{CordraClient, CordraConfig};
