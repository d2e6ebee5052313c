//! TopoFlow Cloud
//!
//! The contract between a declared topology and the external provisioning
//! engine. The engine receives a [`ResourceSet`], creates resources in
//! `depends_on` order, and writes what it created back as a [`GlobalState`].
//!
//! ```text
//! Topology ──render──▶ ResourceSet ──▶ engine ──▶ GlobalState ──▶ outputs
//! ```

pub mod error;
pub mod outputs;
pub mod resource;
pub mod state;

// Re-exports
pub use error::{CloudError, Result};
pub use outputs::{ResolvedOutput, resolve_output, resolve_outputs};
pub use resource::{PROVIDER, ResourceConfig, ResourceSet};
pub use state::{GlobalState, ResourceState, ResourceStatus, StateManager};
