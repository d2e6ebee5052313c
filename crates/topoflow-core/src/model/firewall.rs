//! ファイアウォールポリシー (セキュリティグループ) リソース

use super::{NetworkHandle, Tags};
use crate::cidr::parse_block;
use crate::error::{Result, TopologyError};
use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};
use std::fmt;

/// ファイアウォールルールのプロトコル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    #[serde(rename = "tcp")]
    Tcp,
    #[serde(rename = "udp")]
    Udp,
    #[serde(rename = "icmp")]
    Icmp,
    /// 全プロトコル。ワイヤ上では `-1`
    #[serde(rename = "-1")]
    All,
}

impl Protocol {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "tcp" => Ok(Self::Tcp),
            "udp" => Ok(Self::Udp),
            "icmp" => Ok(Self::Icmp),
            "-1" | "all" => Ok(Self::All),
            _ => Err(TopologyError::UnknownProtocol(s.to_string())),
        }
    }

    /// エンジンが使うプロトコル文字列
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
            Self::Icmp => "icmp",
            Self::All => "-1",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 許可ルール1件
///
/// ポート範囲は閉区間 `from_port..=to_port`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirewallRule {
    pub protocol: Protocol,
    pub from_port: u16,
    pub to_port: u16,
    /// ingress なら送信元、egress なら宛先のブロック
    pub cidr_blocks: Vec<Ipv4Net>,
}

impl FirewallRule {
    pub fn new<S: AsRef<str>>(
        protocol: Protocol,
        from_port: u16,
        to_port: u16,
        cidr_blocks: &[S],
    ) -> Result<Self> {
        if from_port > to_port {
            return Err(TopologyError::InvalidPortRange {
                from: from_port,
                to: to_port,
            });
        }

        let cidr_blocks = cidr_blocks
            .iter()
            .map(|b| parse_block(b.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            protocol,
            from_port,
            to_port,
            cidr_blocks,
        })
    }

    /// 単一ポートのTCPルール
    pub fn tcp<S: AsRef<str>>(port: u16, cidr_blocks: &[S]) -> Result<Self> {
        Self::new(Protocol::Tcp, port, port, cidr_blocks)
    }

    /// 全プロトコル・全ポートに一致するルール
    pub fn allow_all<S: AsRef<str>>(cidr_blocks: &[S]) -> Result<Self> {
        Self::new(Protocol::All, 0, 0, cidr_blocks)
    }

    /// `port` がこのルールの範囲に入るか
    pub fn covers_port(&self, port: u16) -> bool {
        self.protocol == Protocol::All || (self.from_port..=self.to_port).contains(&port)
    }

    /// 任意の相手との全プロトコル通信
    pub fn permits_all_traffic(&self) -> bool {
        self.protocol == Protocol::All && self.cidr_blocks.iter().any(|b| b.prefix_len() == 0)
    }
}

/// `Topology::declare_firewall_policy` の入力
#[derive(Debug, Clone, Default)]
pub struct FirewallSpec {
    pub name: String,
    pub description: String,
    pub ingress: Vec<FirewallRule>,
    pub egress: Vec<FirewallRule>,
    pub tags: Tags,
}

impl FirewallSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn ingress(mut self, rule: FirewallRule) -> Self {
        self.ingress.push(rule);
        self
    }

    pub fn egress(mut self, rule: FirewallRule) -> Self {
        self.egress.push(rule);
        self
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }
}

/// コンピュートインスタンスに付与するステートフルな許可リスト
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirewallPolicy {
    pub name: String,
    pub network: NetworkHandle,
    pub description: String,
    pub ingress: Vec<FirewallRule>,
    pub egress: Vec<FirewallRule>,
    pub tags: Tags,
}

impl FirewallPolicy {
    /// 単一ポートの ingress ルールで開くポート (ルール順)
    pub fn ingress_ports(&self) -> Vec<u16> {
        self.ingress
            .iter()
            .filter(|r| r.from_port == r.to_port)
            .map(|r| r.from_port)
            .collect()
    }
}
