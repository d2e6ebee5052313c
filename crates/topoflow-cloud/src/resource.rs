//! Rendered resources handed to the provisioning engine
//!
//! [`ResourceSet::from_topology`] turns a declared [`Topology`] into the flat,
//! ordered list of property bags the engine reconciles. References between
//! resources are written as `{"ref": "<kind>:<name>", "attr": "id"}` so the
//! engine can substitute the provider id once the target exists.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use topoflow_core::{
    Attribute, FirewallRule, ResourceHandle, ResourceKey, ResourceKind, Topology,
    TopologyError,
};
use tracing::debug;

/// Provider every rendered resource targets
pub const PROVIDER: &str = "aws";

/// Resources to be managed, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSet {
    pub topology: String,
    pub region: String,
    pub resources: Vec<ResourceConfig>,
}

impl ResourceSet {
    pub fn new(topology: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            topology: topology.into(),
            region: region.into(),
            resources: Vec::new(),
        }
    }

    /// Render every declared resource of `topology`
    pub fn from_topology(topology: &Topology) -> Result<Self> {
        let mut set = Self::new(topology.name(), topology.region());
        for key in topology.resources() {
            let config = render(topology, key)?;
            let depends_on = topology
                .depends_on(key)
                .iter()
                .map(|dep| dep.to_string())
                .collect();
            set.add(ResourceConfig {
                depends_on,
                ..ResourceConfig::new(key, config)
            });
        }
        debug!(
            topology = %set.topology,
            resources = set.resources.len(),
            "Rendered resource set"
        );
        Ok(set)
    }

    pub fn add(&mut self, resource: ResourceConfig) {
        self.resources.push(resource);
    }

    pub fn get(&self, kind: ResourceKind, id: &str) -> Option<&ResourceConfig> {
        self.resources.iter().find(|r| r.kind == kind && r.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceConfig> {
        self.resources.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Configuration for a single resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub kind: ResourceKind,

    /// Logical name
    pub id: String,

    /// Engine resource type (e.g. `aws:ec2/vpc:Vpc`)
    pub resource_type: String,

    /// Provider name
    pub provider: String,

    /// Resource properties, camelCase as the provider API names them
    pub config: Value,

    /// Keys of the resources this one references
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

impl ResourceConfig {
    pub fn new(key: &ResourceKey, config: Value) -> Self {
        Self {
            kind: key.kind,
            id: key.name.clone(),
            resource_type: key.kind.type_token().to_string(),
            provider: PROVIDER.to_string(),
            config,
            depends_on: Vec::new(),
        }
    }

    /// Full resource key (`kind:id`)
    pub fn key(&self) -> String {
        format!("{}:{}", self.kind, self.id)
    }

    /// Get a configuration value as a specific type
    pub fn get_config<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.config
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Reference to the provider id of another resource
fn reference<H: ResourceHandle>(topology: &Topology, handle: H) -> Result<Value> {
    let key = topology.key(handle)?;
    Ok(json!({ "ref": key.to_string(), "attr": Attribute::Id.as_str() }))
}

fn rules(rules: &[FirewallRule]) -> Value {
    rules
        .iter()
        .map(|rule| {
            json!({
                "protocol": rule.protocol.as_str(),
                "fromPort": rule.from_port,
                "toPort": rule.to_port,
                "cidrBlocks": rule
                    .cidr_blocks
                    .iter()
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>(),
            })
        })
        .collect()
}

fn not_found(key: &ResourceKey) -> TopologyError {
    TopologyError::UnknownReference {
        kind: key.kind,
        name: key.name.clone(),
    }
}

fn render(topology: &Topology, key: &ResourceKey) -> Result<Value> {
    let name = key.name.as_str();
    let config = match key.kind {
        ResourceKind::Network => {
            let network = topology.network(topology.network_by_name(name)?)?;
            json!({
                "cidrBlock": network.cidr.to_string(),
                "enableDnsSupport": network.dns.support,
                "enableDnsHostnames": network.dns.hostnames,
                "tags": network.tags,
            })
        }
        ResourceKind::Subnet => {
            let subnet = topology.subnet(topology.subnet_by_name(name)?)?;
            json!({
                "vpcId": reference(topology, subnet.network)?,
                "cidrBlock": subnet.cidr.to_string(),
                "availabilityZone": subnet.zone,
                "mapPublicIpOnLaunch": subnet.map_public_ip_on_launch,
                "tags": subnet.tags,
            })
        }
        ResourceKind::Gateway => {
            let gateway = topology.gateway(topology.gateway_by_name(name)?)?;
            json!({
                "vpcId": reference(topology, gateway.network)?,
                "tags": gateway.tags,
            })
        }
        ResourceKind::RouteTable => {
            let table = topology.route_table(topology.route_table_by_name(name)?)?;
            json!({
                "vpcId": reference(topology, table.network)?,
                "tags": table.tags,
            })
        }
        ResourceKind::Route => {
            let route = topology
                .routes()
                .find(|r| r.name == name)
                .ok_or_else(|| not_found(key))?;
            json!({
                "routeTableId": reference(topology, route.table)?,
                "destinationCidrBlock": route.destination.to_string(),
                "gatewayId": reference(topology, route.gateway)?,
            })
        }
        ResourceKind::RouteAssociation => {
            let association = topology
                .associations()
                .find(|a| a.name == name)
                .ok_or_else(|| not_found(key))?;
            json!({
                "subnetId": reference(topology, association.subnet)?,
                "routeTableId": reference(topology, association.table)?,
            })
        }
        ResourceKind::FirewallPolicy => {
            let policy = topology.firewall(topology.firewall_by_name(name)?)?;
            json!({
                "vpcId": reference(topology, policy.network)?,
                "description": policy.description,
                "ingress": rules(&policy.ingress),
                "egress": rules(&policy.egress),
                "tags": policy.tags,
            })
        }
        ResourceKind::ComputeInstance => {
            let instance = topology.instance(topology.instance_by_name(name)?)?;
            let mut groups = Vec::with_capacity(instance.firewall_policies.len());
            for policy in &instance.firewall_policies {
                groups.push(reference(topology, *policy)?);
            }
            json!({
                "instanceType": instance.instance_type,
                "ami": instance.image,
                "subnetId": reference(topology, instance.subnet)?,
                "vpcSecurityGroupIds": groups,
                "keyName": instance.key_name,
                "associatePublicIpAddress": instance.associate_public_ip,
                "tags": instance.tags,
            })
        }
    };
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use topoflow_core::{parse_kdl_string, redis_topology};

    fn rendered() -> ResourceSet {
        ResourceSet::from_topology(&redis_topology().unwrap()).unwrap()
    }

    #[test]
    fn test_render_order_follows_declaration() {
        let set = rendered();
        assert_eq!(set.len(), 18);
        assert_eq!(set.region, "ap-southeast-1");
        assert_eq!(set.resources[0].key(), "network:redis-vpc");
        assert_eq!(set.resources[17].key(), "instance:redis-instance-6");
        assert!(set.iter().all(|r| r.provider == PROVIDER));
    }

    #[test]
    fn test_network_properties() {
        let set = rendered();
        let vpc = set.get(ResourceKind::Network, "redis-vpc").unwrap();
        assert_eq!(vpc.resource_type, "aws:ec2/vpc:Vpc");
        assert_eq!(vpc.get_config::<String>("cidrBlock").unwrap(), "10.0.0.0/16");
        assert_eq!(vpc.get_config::<bool>("enableDnsHostnames"), Some(true));
        assert_eq!(vpc.config["tags"]["Name"], "redis-vpc");
        assert!(vpc.depends_on.is_empty());
    }

    #[test]
    fn test_references_encode_dependencies() {
        let set = rendered();
        let route = set.get(ResourceKind::Route, "igw-route").unwrap();
        assert_eq!(
            route.config["gatewayId"],
            json!({ "ref": "gateway:redis-igw", "attr": "id" })
        );
        assert_eq!(route.config["destinationCidrBlock"], "0.0.0.0/0");
        assert_eq!(
            route.depends_on,
            vec!["route-table:redis-rt", "gateway:redis-igw"]
        );
    }

    #[test]
    fn test_instance_properties() {
        let set = rendered();
        let instance = set
            .get(ResourceKind::ComputeInstance, "redis-instance-4")
            .unwrap();
        assert_eq!(instance.config["instanceType"], "t2.micro");
        assert_eq!(instance.config["subnetId"]["ref"], "subnet:subnet-3");
        assert_eq!(
            instance.config["vpcSecurityGroupIds"],
            json!([{ "ref": "firewall:redis-secgrp", "attr": "id" }])
        );
        assert_eq!(instance.config["tags"]["Project"], "RedisSetup");
    }

    #[test]
    fn test_firewall_rules() {
        let set = rendered();
        let sg = set.get(ResourceKind::FirewallPolicy, "redis-secgrp").unwrap();
        let ingress = sg.config["ingress"].as_array().unwrap();
        assert_eq!(ingress.len(), 4);
        assert_eq!(ingress[1]["fromPort"], 6379);
        assert_eq!(ingress[1]["cidrBlocks"], json!(["10.0.0.0/16"]));
        assert_eq!(sg.config["egress"][0]["protocol"], "-1");
    }

    #[test]
    fn test_dependencies_are_rendered_before_dependents() {
        let set = rendered();
        for (i, resource) in set.iter().enumerate() {
            for dep in &resource.depends_on {
                let position = set.iter().position(|r| &r.key() == dep).unwrap();
                assert!(position < i, "{} before {}", dep, resource.key());
            }
        }
    }

    #[test]
    fn test_bundled_file_renders_like_builtin() {
        let kdl = include_str!("../../../topologies/redis-setup.kdl");
        let from_file = ResourceSet::from_topology(&parse_kdl_string(kdl).unwrap()).unwrap();
        assert_eq!(from_file, rendered());
    }

    #[test]
    fn test_serializes_to_json() {
        let set = rendered();
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json["topology"], "redis-setup");
        assert_eq!(json["resources"][0]["kind"], "network");
        assert!(json["resources"][0].get("depends_on").is_none());
        assert_eq!(json["resources"][1]["depends_on"], json!(["network:redis-vpc"]));
    }
}
