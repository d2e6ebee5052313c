//! ネットワーク・サブネット・ルーティングのリソース

use super::{GatewayHandle, NetworkHandle, RouteTableHandle, SubnetHandle, Tags};
use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};

/// ネットワークのDNS設定
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsOptions {
    /// プロバイダーのDNSサーバーで名前解決する
    pub support: bool,
    /// インスタンスにDNSホスト名を付与する
    pub hostnames: bool,
}

impl DnsOptions {
    /// DNSサポートとDNSホスト名を両方有効化
    pub fn enabled() -> Self {
        Self {
            support: true,
            hostnames: true,
        }
    }
}

/// `Topology::declare_network` の入力
#[derive(Debug, Clone, Default)]
pub struct NetworkSpec {
    pub name: String,
    pub cidr: String,
    pub dns: DnsOptions,
    pub tags: Tags,
}

impl NetworkSpec {
    pub fn new(name: impl Into<String>, cidr: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cidr: cidr.into(),
            ..Default::default()
        }
    }

    pub fn with_dns(mut self, dns: DnsOptions) -> Self {
        self.dns = dns;
        self
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }
}

/// 仮想ネットワーク (VPC)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    pub name: String,
    pub cidr: Ipv4Net,
    pub dns: DnsOptions,
    pub tags: Tags,
}

/// `Topology::declare_subnet` の入力
#[derive(Debug, Clone, Default)]
pub struct SubnetSpec {
    pub name: String,
    pub cidr: String,
    /// アベイラビリティゾーン (例: `ap-southeast-1a`)
    pub zone: String,
    pub map_public_ip_on_launch: bool,
    pub tags: Tags,
}

impl SubnetSpec {
    pub fn new(name: impl Into<String>, cidr: impl Into<String>, zone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cidr: cidr.into(),
            zone: zone.into(),
            ..Default::default()
        }
    }

    /// このサブネットで起動したインスタンスにパブリックIPを割り当てる
    pub fn public(mut self) -> Self {
        self.map_public_ip_on_launch = true;
        self
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subnet {
    pub name: String,
    pub network: NetworkHandle,
    pub cidr: Ipv4Net,
    pub zone: String,
    pub map_public_ip_on_launch: bool,
    pub tags: Tags,
}

/// 1つのネットワークにアタッチされたインターネットゲートウェイ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gateway {
    pub name: String,
    pub network: NetworkHandle,
    pub tags: Tags,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    pub name: String,
    pub network: NetworkHandle,
    pub tags: Tags,
}

/// ルートテーブルのルーティングエントリ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub name: String,
    pub table: RouteTableHandle,
    pub destination: Ipv4Net,
    pub gateway: GatewayHandle,
}

/// サブネットとルートテーブルの関連付け
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteAssociation {
    pub name: String,
    pub subnet: SubnetHandle,
    pub table: RouteTableHandle,
}
