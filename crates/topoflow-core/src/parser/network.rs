//! network / subnet / gateway / route-table / association ノードのパース

use super::{
    bool_arg, children, missing_field, node_name, parse_tags, string_arg, string_prop,
    unknown_field,
};
use crate::error::Result;
use crate::model::{NetworkSpec, SubnetSpec, Tags};
use crate::topology::Topology;
use kdl::KdlNode;

/// network "redis-vpc" { cidr "10.0.0.0/16"; dns-support #true; dns-hostnames #true }
pub fn parse_network(topology: &mut Topology, node: &KdlNode) -> Result<()> {
    let mut spec = NetworkSpec {
        name: node_name(node, "network")?,
        ..Default::default()
    };

    for child in children(node) {
        match child.name().value() {
            "cidr" => spec.cidr = string_arg(child)?,
            "dns-support" | "dns_support" => spec.dns.support = bool_arg(child)?,
            "dns-hostnames" | "dns_hostnames" => spec.dns.hostnames = bool_arg(child)?,
            "tags" => spec.tags = parse_tags(child)?,
            other => return Err(unknown_field("network", other)),
        }
    }

    if spec.cidr.is_empty() {
        return Err(missing_field("network", "cidr"));
    }
    topology.declare_network(spec)?;
    Ok(())
}

/// subnet "subnet-1" { network "redis-vpc"; cidr "10.0.1.0/24"; zone "ap-southeast-1a"; public-ip #true }
pub fn parse_subnet(topology: &mut Topology, node: &KdlNode) -> Result<()> {
    let mut spec = SubnetSpec {
        name: node_name(node, "subnet")?,
        ..Default::default()
    };
    let mut network = None;

    for child in children(node) {
        match child.name().value() {
            "network" => network = Some(string_arg(child)?),
            "cidr" => spec.cidr = string_arg(child)?,
            "zone" | "availability-zone" => spec.zone = string_arg(child)?,
            "public-ip" | "public_ip" => spec.map_public_ip_on_launch = bool_arg(child)?,
            "tags" => spec.tags = parse_tags(child)?,
            other => return Err(unknown_field("subnet", other)),
        }
    }

    let network = network.ok_or_else(|| missing_field("subnet", "network"))?;
    if spec.cidr.is_empty() {
        return Err(missing_field("subnet", "cidr"));
    }
    if spec.zone.is_empty() {
        return Err(missing_field("subnet", "zone"));
    }

    let network = topology.network_by_name(&network)?;
    topology.declare_subnet(network, spec)?;
    Ok(())
}

/// gateway と route-table に共通の本体: `network` と `tags`
fn network_and_tags(node: &KdlNode, what: &str) -> Result<(String, Tags)> {
    let mut network = None;
    let mut tags = Tags::new();

    for child in children(node) {
        match child.name().value() {
            "network" => network = Some(string_arg(child)?),
            "tags" => tags = parse_tags(child)?,
            "route" if what == "route-table" => {}
            other => return Err(unknown_field(what, other)),
        }
    }

    let network = network.ok_or_else(|| missing_field(what, "network"))?;
    Ok((network, tags))
}

/// gateway "redis-igw" { network "redis-vpc" }
pub fn parse_gateway(topology: &mut Topology, node: &KdlNode) -> Result<()> {
    let name = node_name(node, "gateway")?;
    let (network, tags) = network_and_tags(node, "gateway")?;
    let network = topology.network_by_name(&network)?;
    topology.declare_gateway(network, name, tags)?;
    Ok(())
}

/// ```kdl
/// route-table "redis-rt" {
///     network "redis-vpc"
///     route "igw-route" destination="0.0.0.0/0" gateway="redis-igw"
/// }
/// ```
pub fn parse_route_table(topology: &mut Topology, node: &KdlNode) -> Result<()> {
    let name = node_name(node, "route-table")?;
    let (network, tags) = network_and_tags(node, "route-table")?;
    let network = topology.network_by_name(&network)?;
    let table = topology.declare_route_table(network, name, tags)?;

    for route in children(node).iter().filter(|c| c.name().value() == "route") {
        let route_name = node_name(route, "route")?;
        let destination = string_prop(route, "destination")?;
        let gateway = topology.gateway_by_name(&string_prop(route, "gateway")?)?;
        topology.declare_route(table, route_name, &destination, gateway)?;
    }

    Ok(())
}

/// association "rt-association-1" subnet="subnet-1" route-table="redis-rt"
pub fn parse_association(topology: &mut Topology, node: &KdlNode) -> Result<()> {
    let name = node_name(node, "association")?;
    let subnet = topology.subnet_by_name(&string_prop(node, "subnet")?)?;
    let table = topology.route_table_by_name(&string_prop(node, "route-table")?)?;
    topology.declare_route_association(name, subnet, table)?;
    Ok(())
}
