//! 同一構成のインスタンス群 (フリート)
//!
//! [`InstanceTemplate`] はインスタンス名とサブネット以外をすべて固定するので、
//! フリートは `(name, subnet)` の表から宣言できる。

use crate::error::Result;
use crate::model::{FirewallHandle, InstanceHandle, InstanceSpec, SubnetHandle, Tags};
use crate::topology::Topology;

/// フリートの全インスタンスに適用する共通設定
#[derive(Debug, Clone)]
pub struct InstanceTemplate {
    pub instance_type: String,
    pub image: String,
    pub firewall_policies: Vec<FirewallHandle>,
    pub key_name: String,
    pub associate_public_ip: bool,
    /// 全インスタンス共通のタグ。`Name` はインスタンスごとに設定
    pub tags: Tags,
}

impl InstanceTemplate {
    /// `subnet` に配置する `name` のインスタンス宣言
    pub fn spec(&self, name: &str, subnet: SubnetHandle) -> InstanceSpec {
        InstanceSpec {
            name: name.to_string(),
            instance_type: self.instance_type.clone(),
            image: self.image.clone(),
            subnet,
            firewall_policies: self.firewall_policies.clone(),
            key_name: self.key_name.clone(),
            associate_public_ip: self.associate_public_ip,
            tags: self.tags.clone().with(crate::model::NAME_TAG, name),
        }
    }

    pub fn stamp(
        &self,
        topology: &mut Topology,
        name: &str,
        subnet: SubnetHandle,
    ) -> Result<InstanceHandle> {
        topology.declare_compute_instance(self.spec(name, subnet))
    }
}

/// `(name, subnet)` のメンバーごとにインスタンスを表の順に宣言
pub fn declare_fleet(
    topology: &mut Topology,
    template: &InstanceTemplate,
    members: &[(&str, SubnetHandle)],
) -> Result<Vec<InstanceHandle>> {
    members
        .iter()
        .map(|(name, subnet)| template.stamp(topology, name, *subnet))
        .collect()
}
