//! Shared domain types and error taxonomy for the RES search enrichment pipeline

pub mod common;
pub mod domain;

pub use common::error::{EnrichError, Result};
