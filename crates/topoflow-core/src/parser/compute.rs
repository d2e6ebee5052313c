//! instance / fleet / output ノードのパース

use super::{
    bool_arg, children, missing_field, node_name, parse_tags, prop, string_arg, string_args,
    string_prop, unknown_field,
};
use crate::error::{Result, TopologyError};
use crate::fleet::{InstanceTemplate, declare_fleet};
use crate::model::{Attribute, InstanceSpec, ResourceKey, ResourceKind, Tags};
use crate::topology::Topology;
use kdl::KdlNode;

/// `instance` と `fleet` に共通のフィールド
#[derive(Default)]
struct InstanceFields {
    subnet: Option<String>,
    firewalls: Vec<String>,
    size: Option<String>,
    image: Option<String>,
    key: Option<String>,
    public_ip: bool,
    tags: Tags,
}

impl InstanceFields {
    /// 子ノードを1つ適用する。対象外のノードなら false を返す
    fn apply(&mut self, child: &KdlNode) -> Result<bool> {
        match child.name().value() {
            "subnet" => self.subnet = Some(string_arg(child)?),
            "firewall" | "firewalls" | "security-group" => {
                self.firewalls.extend(string_args(child))
            }
            "size" | "instance-type" => self.size = Some(string_arg(child)?),
            "image" | "ami" => self.image = Some(string_arg(child)?),
            "key" | "key-name" => self.key = Some(string_arg(child)?),
            "public-ip" | "public_ip" => self.public_ip = bool_arg(child)?,
            "tags" => self.tags = parse_tags(child)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn into_template(self, topology: &Topology, what: &str) -> Result<InstanceTemplate> {
        let firewall_policies = self
            .firewalls
            .iter()
            .map(|name| topology.firewall_by_name(name))
            .collect::<Result<Vec<_>>>()?;

        Ok(InstanceTemplate {
            instance_type: self.size.ok_or_else(|| missing_field(what, "size"))?,
            image: self.image.ok_or_else(|| missing_field(what, "image"))?,
            firewall_policies,
            key_name: self.key.ok_or_else(|| missing_field(what, "key"))?,
            associate_public_ip: self.public_ip,
            tags: self.tags,
        })
    }
}

/// instance "nodejs-instance" { subnet "subnet-1"; firewall "redis-secgrp"; size "t2.micro"; ... }
pub fn parse_instance(topology: &mut Topology, node: &KdlNode) -> Result<()> {
    let name = node_name(node, "instance")?;
    let mut fields = InstanceFields::default();

    for child in children(node) {
        if !fields.apply(child)? {
            return Err(unknown_field("instance", child.name().value()));
        }
    }

    let subnet = fields
        .subnet
        .take()
        .ok_or_else(|| missing_field("instance", "subnet"))?;
    let subnet = topology.subnet_by_name(&subnet)?;
    let template = fields.into_template(topology, "instance")?;

    let mut spec: InstanceSpec = template.spec(&name, subnet);
    // 明示的な Name タグは論理名より優先
    if let Some(tag) = template.tags.name() {
        spec.tags.insert(crate::model::NAME_TAG, tag);
    }
    topology.declare_compute_instance(spec)?;
    Ok(())
}

/// ```kdl
/// fleet {
///     size "t2.micro"; image "ami-01811d4912b4ccb26"; key "MyKeyPair"
///     firewall "redis-secgrp"
///     member "redis-instance-1" subnet="subnet-2"
/// }
/// ```
pub fn parse_fleet(topology: &mut Topology, node: &KdlNode) -> Result<()> {
    let mut fields = InstanceFields::default();
    let mut members = Vec::new();

    for child in children(node) {
        if child.name().value() == "member" {
            let name = node_name(child, "member")?;
            let subnet = string_prop(child, "subnet")?;
            members.push((name, subnet));
        } else if !fields.apply(child)? {
            return Err(unknown_field("fleet", child.name().value()));
        }
    }

    if fields.subnet.is_some() {
        return Err(TopologyError::InvalidConfig(
            "fleet places members with `member ... subnet=`, not a top-level `subnet`"
                .to_string(),
        ));
    }
    if members.is_empty() {
        return Err(missing_field("fleet", "member"));
    }

    let template = fields.into_template(topology, "fleet")?;
    let mut placement = Vec::with_capacity(members.len());
    for (name, subnet) in &members {
        placement.push((name.as_str(), topology.subnet_by_name(subnet)?));
    }
    declare_fleet(topology, &template, &placement)?;
    Ok(())
}

/// output "vpcId" resource="redis-vpc" attribute="id" [kind="network"]
pub fn parse_output(topology: &mut Topology, node: &KdlNode) -> Result<()> {
    let name = node_name(node, "output")?;
    let resource = string_prop(node, "resource")?;

    let attribute = match prop(node, "attribute").and_then(|v| v.as_string()) {
        None => Attribute::Id,
        Some(raw) => Attribute::parse(raw).ok_or_else(|| {
            TopologyError::InvalidConfig(format!("output '{}': unknown attribute '{}'", name, raw))
        })?,
    };

    let key = match prop(node, "kind").and_then(|v| v.as_string()) {
        Some(raw) => {
            let kind = ResourceKind::parse(raw).ok_or_else(|| {
                TopologyError::InvalidConfig(format!("output '{}': unknown kind '{}'", name, raw))
            })?;
            ResourceKey::new(kind, resource)
        }
        None => topology.find_resource(&resource)?,
    };

    topology.export_key(name, key, attribute)
}
