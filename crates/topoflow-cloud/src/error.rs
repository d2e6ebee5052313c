//! Engine contract error types

use thiserror::Error;
use topoflow_core::TopologyError;

#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Resource not found in state: {0}")]
    ResourceNotFound(String),

    #[error("Resource {resource} has no attribute '{attribute}'")]
    MissingAttribute { resource: String, attribute: String },

    #[error("State file error: {0}")]
    StateError(String),

    #[error("Topology error: {0}")]
    Topology(#[from] TopologyError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CloudError>;
