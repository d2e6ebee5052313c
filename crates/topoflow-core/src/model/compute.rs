//! コンピュートインスタンスリソース

use super::{FirewallHandle, SubnetHandle, Tags};

/// `Topology::declare_compute_instance` の入力
#[derive(Debug, Clone)]
pub struct InstanceSpec {
    pub name: String,
    /// サイズ (例: `t2.micro`)
    pub instance_type: String,
    /// マシンイメージID
    pub image: String,
    pub subnet: SubnetHandle,
    pub firewall_policies: Vec<FirewallHandle>,
    /// リージョンに既に存在するキーペア名
    pub key_name: String,
    pub associate_public_ip: bool,
    pub tags: Tags,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeInstance {
    pub name: String,
    pub instance_type: String,
    pub image: String,
    pub subnet: SubnetHandle,
    pub firewall_policies: Vec<FirewallHandle>,
    pub key_name: String,
    pub associate_public_ip: bool,
    pub tags: Tags,
}
