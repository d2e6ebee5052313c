//! Output resolution against a materialized state

use crate::error::Result;
use crate::state::GlobalState;
use serde::Serialize;
use topoflow_core::{Output, Topology};

/// One export with its resolved value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedOutput {
    pub name: String,
    pub value: String,
}

pub fn resolve_output(output: &Output, state: &GlobalState) -> Result<String> {
    state.attribute(&output.resource, output.attribute)
}

/// Resolve every export of `topology`, failing on the first one the state
/// cannot satisfy
pub fn resolve_outputs(topology: &Topology, state: &GlobalState) -> Result<Vec<ResolvedOutput>> {
    let mut resolved = Vec::with_capacity(topology.outputs().len());
    for output in topology.outputs() {
        resolved.push(ResolvedOutput {
            name: output.name.clone(),
            value: resolve_output(output, state)?,
        });
    }
    tracing::debug!(outputs = resolved.len(), "Resolved outputs");
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CloudError;
    use crate::state::{ResourceState, ResourceStatus};
    use serde_json::json;
    use topoflow_core::{ResourceKind, redis_topology};

    /// State as an engine would leave it after creating everything
    fn materialize(topology: &Topology) -> GlobalState {
        let mut state = GlobalState::new();
        for (i, key) in topology.resources().iter().enumerate() {
            let mut resource = ResourceState::new(format!("id-{i}"), key.kind.type_token())
                .with_status(ResourceStatus::Available);
            if key.kind == ResourceKind::ComputeInstance {
                resource = resource.with_attribute("publicIp", json!(format!("203.0.113.{i}")));
            }
            state.set_resource(key, resource);
        }
        state
    }

    #[test]
    fn test_resolve_all_outputs() {
        let topology = redis_topology().unwrap();
        let state = materialize(&topology);

        let outputs = resolve_outputs(&topology, &state).unwrap();
        assert_eq!(outputs.len(), 21);
        assert_eq!(outputs[0].name, "vpcId");
        assert_eq!(outputs[0].value, "id-0");

        let ip = outputs
            .iter()
            .find(|o| o.name == "nodejsInstancePublicIp")
            .unwrap();
        assert!(ip.value.starts_with("203.0.113."));
    }

    #[test]
    fn test_missing_resource_fails() {
        let topology = redis_topology().unwrap();
        let mut state = materialize(&topology);
        state.resources.remove("gateway:redis-igw");

        let err = resolve_outputs(&topology, &state).unwrap_err();
        match err {
            CloudError::ResourceNotFound(key) => assert_eq!(key, "gateway:redis-igw"),
            other => panic!("expected ResourceNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_public_ip_fails() {
        let topology = redis_topology().unwrap();
        let mut state = materialize(&topology);
        if let Some(instance) = state.resources.get_mut("instance:redis-instance-2") {
            instance.attributes.clear();
        }

        let err = resolve_outputs(&topology, &state).unwrap_err();
        assert!(matches!(err, CloudError::MissingAttribute { .. }));
    }
}
