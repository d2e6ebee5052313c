//! リソースの識別子とエクスポートする出力

use serde::{Deserialize, Serialize};
use std::fmt;

/// 宣言されたリソースの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Network,
    Subnet,
    Gateway,
    RouteTable,
    Route,
    RouteAssociation,
    FirewallPolicy,
    ComputeInstance,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 8] = [
        ResourceKind::Network,
        ResourceKind::Subnet,
        ResourceKind::Gateway,
        ResourceKind::RouteTable,
        ResourceKind::Route,
        ResourceKind::RouteAssociation,
        ResourceKind::FirewallPolicy,
        ResourceKind::ComputeInstance,
    ];

    /// キー・エラー・KDLで使う短い名前
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Subnet => "subnet",
            Self::Gateway => "gateway",
            Self::RouteTable => "route-table",
            Self::Route => "route",
            Self::RouteAssociation => "association",
            Self::FirewallPolicy => "firewall",
            Self::ComputeInstance => "instance",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }

    /// プロビジョニングエンジンが解釈するリソース型トークン
    pub fn type_token(&self) -> &'static str {
        match self {
            Self::Network => "aws:ec2/vpc:Vpc",
            Self::Subnet => "aws:ec2/subnet:Subnet",
            Self::Gateway => "aws:ec2/internetGateway:InternetGateway",
            Self::RouteTable => "aws:ec2/routeTable:RouteTable",
            Self::Route => "aws:ec2/route:Route",
            Self::RouteAssociation => "aws:ec2/routeTableAssociation:RouteTableAssociation",
            Self::FirewallPolicy => "aws:ec2/securityGroup:SecurityGroup",
            Self::ComputeInstance => "aws:ec2/instance:Instance",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// トポロジー内でのリソースの識別子 (種類 + 論理名)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceKey {
    pub kind: ResourceKind,
    pub name: String,
}

impl ResourceKey {
    pub fn new(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)
    }
}

/// リソース作成時にエンジンが割り当てる属性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Attribute {
    /// プロバイダーが払い出すID
    #[serde(rename = "id")]
    Id,
    /// コンピュートインスタンスのパブリックIPv4アドレス
    #[serde(rename = "publicIp")]
    PublicIp,
}

impl Attribute {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::PublicIp => "publicIp",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "id" => Some(Self::Id),
            "publicIp" | "public-ip" | "public_ip" => Some(Self::PublicIp),
            _ => None,
        }
    }

    /// `kind` のリソースがこの属性を持つか
    pub fn applies_to(&self, kind: ResourceKind) -> bool {
        match self {
            Self::Id => true,
            Self::PublicIp => kind == ResourceKind::ComputeInstance,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 作成済みリソース属性の名前付きエクスポート
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub name: String,
    pub resource: ResourceKey,
    pub attribute: Attribute,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ResourceKind::parse("bucket"), None);
    }

    #[test]
    fn test_key_display() {
        let key = ResourceKey::new(ResourceKind::Subnet, "subnet-1");
        assert_eq!(key.to_string(), "subnet:subnet-1");
    }

    #[test]
    fn test_public_ip_only_on_instances() {
        assert!(Attribute::PublicIp.applies_to(ResourceKind::ComputeInstance));
        assert!(!Attribute::PublicIp.applies_to(ResourceKind::Network));
        assert!(Attribute::Id.applies_to(ResourceKind::Route));
    }
}
