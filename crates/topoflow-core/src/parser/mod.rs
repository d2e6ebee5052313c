//! KDLパーサー
//!
//! `topology` KDLドキュメントの各ノードを宣言ビルダーに順に流し込み、
//! [`Topology`] を組み立てる。参照は論理名で、ファイル内でそれより前に
//! 宣言されたノードを指す必要がある。

mod compute;
mod firewall;
mod network;


use crate::error::{Result, TopologyError};
use crate::model::Tags;
use crate::topology::Topology;
use kdl::{KdlDocument, KdlNode, KdlValue};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// トポロジーKDLファイルをパース
pub fn parse_kdl_file<P: AsRef<Path>>(path: P) -> Result<Topology> {
    debug!(path = %path.as_ref().display(), "Reading topology file");
    let content = fs::read_to_string(path.as_ref())?;
    parse_kdl_string(&content)
}

/// トポロジーKDLドキュメントをパース
pub fn parse_kdl_string(content: &str) -> Result<Topology> {
    let doc: KdlDocument = content.parse()?;

    let mut roots = doc.nodes().iter().filter(|n| n.name().value() == "topology");
    let root = roots.next().ok_or_else(|| {
        TopologyError::InvalidConfig("missing top-level `topology` node".to_string())
    })?;
    if roots.next().is_some() {
        return Err(TopologyError::InvalidConfig(
            "only one `topology` node is allowed per file".to_string(),
        ));
    }

    let name = node_name(root, "topology")?;
    let body = children(root);
    let region = body
        .iter()
        .find(|n| n.name().value() == "region")
        .map(string_arg)
        .transpose()?
        .ok_or_else(|| missing_field("topology", "region"))?;

    let mut topology = Topology::new(name, region);

    for node in body {
        match node.name().value() {
            "region" => {}
            "network" => network::parse_network(&mut topology, node)?,
            "subnet" => network::parse_subnet(&mut topology, node)?,
            "gateway" => network::parse_gateway(&mut topology, node)?,
            "route-table" | "route_table" => network::parse_route_table(&mut topology, node)?,
            "association" => network::parse_association(&mut topology, node)?,
            "firewall" | "security-group" => firewall::parse_firewall(&mut topology, node)?,
            "instance" => compute::parse_instance(&mut topology, node)?,
            "fleet" => compute::parse_fleet(&mut topology, node)?,
            "output" => compute::parse_output(&mut topology, node)?,
            other => {
                return Err(TopologyError::InvalidConfig(format!(
                    "unknown node `{}` in topology",
                    other
                )));
            }
        }
    }

    info!(
        topology = %topology.name(),
        resources = topology.len(),
        outputs = topology.outputs().len(),
        "Topology parsed"
    );
    Ok(topology)
}

// ── ノードヘルパー ──

/// `index` 番目の位置引数 (プロパティは無視)
fn arg(node: &KdlNode, index: usize) -> Option<&KdlValue> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .nth(index)
        .map(|e| e.value())
}

fn prop<'a>(node: &'a KdlNode, key: &str) -> Option<&'a KdlValue> {
    node.entries()
        .iter()
        .find(|e| e.name().map(|n| n.value()) == Some(key))
        .map(|e| e.value())
}

fn children(node: &KdlNode) -> &[KdlNode] {
    node.children().map(|d| d.nodes()).unwrap_or(&[])
}

fn missing_field(node: &str, field: &str) -> TopologyError {
    TopologyError::InvalidConfig(format!("{} requires `{}`", node, field))
}

fn unknown_field(node: &str, field: &str) -> TopologyError {
    TopologyError::InvalidConfig(format!("unknown field `{}` in {}", field, node))
}

/// 第1引数で与えられた論理名
fn node_name(node: &KdlNode, what: &str) -> Result<String> {
    arg(node, 0)
        .and_then(|v| v.as_string())
        .map(|s| s.to_string())
        .ok_or_else(|| TopologyError::InvalidConfig(format!("{} requires a name", what)))
}

fn string_arg(node: &KdlNode) -> Result<String> {
    arg(node, 0)
        .and_then(|v| v.as_string())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            TopologyError::InvalidConfig(format!(
                "`{}` expects a string argument",
                node.name().value()
            ))
        })
}

fn string_args(node: &KdlNode) -> Vec<String> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .filter_map(|e| e.value().as_string().map(|s| s.to_string()))
        .collect()
}

/// 真偽値フラグ。引数のないノードは `#true` とみなす
fn bool_arg(node: &KdlNode) -> Result<bool> {
    match arg(node, 0) {
        None => Ok(true),
        Some(value) => value.as_bool().ok_or_else(|| {
            TopologyError::InvalidConfig(format!(
                "`{}` expects #true or #false",
                node.name().value()
            ))
        }),
    }
}

fn string_prop(node: &KdlNode, key: &str) -> Result<String> {
    prop(node, key)
        .and_then(|v| v.as_string())
        .map(|s| s.to_string())
        .ok_or_else(|| missing_field(node.name().value(), key))
}

fn port_prop(node: &KdlNode, key: &str) -> Result<Option<u16>> {
    match prop(node, key) {
        None => Ok(None),
        Some(value) => value
            .as_integer()
            .and_then(|v| u16::try_from(v).ok())
            .map(Some)
            .ok_or_else(|| {
                TopologyError::InvalidConfig(format!(
                    "`{}` must be a port number between 0 and 65535",
                    key
                ))
            }),
    }
}

/// `tags { Key "value" ... }`
fn parse_tags(node: &KdlNode) -> Result<Tags> {
    let mut tags = Tags::new();
    for tag in children(node) {
        tags.insert(tag.name().value(), string_arg(tag)?);
    }
    Ok(tags)
}
