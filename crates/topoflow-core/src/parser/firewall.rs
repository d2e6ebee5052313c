//! firewall ノードのパース

use super::{
    arg, children, missing_field, node_name, parse_tags, port_prop, prop, string_arg,
    string_args, unknown_field,
};
use crate::error::{Result, TopologyError};
use crate::model::{FirewallRule, FirewallSpec, Protocol};
use crate::topology::Topology;
use kdl::KdlNode;

/// ```kdl
/// firewall "redis-secgrp" {
///     network "redis-vpc"
///     description "Allow SSH, Redis, and Node.js traffic"
///     ingress "tcp" port=22 { source "0.0.0.0/0" }
///     egress "-1" from=0 to=0 { source "0.0.0.0/0" }
/// }
/// ```
pub fn parse_firewall(topology: &mut Topology, node: &KdlNode) -> Result<()> {
    let mut spec = FirewallSpec {
        name: node_name(node, "firewall")?,
        ..Default::default()
    };
    let mut network = None;

    for child in children(node) {
        match child.name().value() {
            "network" => network = Some(string_arg(child)?),
            "description" => spec.description = string_arg(child)?,
            "ingress" => spec.ingress.push(parse_rule(child)?),
            "egress" => spec.egress.push(parse_rule(child)?),
            "tags" => spec.tags = parse_tags(child)?,
            other => return Err(unknown_field("firewall", other)),
        }
    }

    let network = network.ok_or_else(|| missing_field("firewall", "network"))?;
    let network = topology.network_by_name(&network)?;
    topology.declare_firewall_policy(network, spec)?;
    Ok(())
}

/// ルールノード: 引数にプロトコル、`port=` または `from=`/`to=`、
/// 送信元は `source` 子ノードか `source=` プロパティ
fn parse_rule(node: &KdlNode) -> Result<FirewallRule> {
    let protocol = match arg(node, 0) {
        Some(value) => {
            let raw = value
                .as_string()
                .map(|s| s.to_string())
                .or_else(|| value.as_integer().map(|i| i.to_string()))
                .ok_or_else(|| {
                    TopologyError::InvalidConfig("rule protocol must be a string".to_string())
                })?;
            Protocol::parse(&raw)?
        }
        None => return Err(missing_field(node.name().value(), "protocol")),
    };

    let rule = node.name().value();
    let (from, to) = match (
        port_prop(node, "port")?,
        port_prop(node, "from")?,
        port_prop(node, "to")?,
    ) {
        (Some(port), None, None) => (port, port),
        (Some(_), _, _) => {
            return Err(TopologyError::InvalidConfig(format!(
                "{} takes either `port` or `from`/`to`, not both",
                rule
            )));
        }
        (None, Some(from), Some(to)) => (from, to),
        // "-1" は全ポートが対象
        (None, None, None) if protocol == Protocol::All => (0, 0),
        (None, None, None) => return Err(missing_field(rule, "port")),
        (None, None, Some(_)) => return Err(missing_field(rule, "from")),
        (None, Some(_), None) => return Err(missing_field(rule, "to")),
    };

    let mut sources: Vec<String> = prop(node, "source")
        .and_then(|v| v.as_string())
        .map(|s| vec![s.to_string()])
        .unwrap_or_default();
    for child in children(node) {
        match child.name().value() {
            "source" | "cidr" => sources.extend(string_args(child)),
            other => return Err(unknown_field("rule", other)),
        }
    }

    FirewallRule::new(protocol, from, to, &sources)
}
