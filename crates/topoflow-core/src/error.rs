use crate::model::{ResourceKey, ResourceKind};
use ipnet::Ipv4Net;
use thiserror::Error;

/// トポロジーの宣言・読み込みエラー
#[derive(Error, Debug)]
pub enum TopologyError {
    #[error("KDLパースエラー: {0}")]
    KdlParse(#[from] kdl::KdlError),

    #[error("ファイル読み込みエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("無効な設定: {0}")]
    InvalidConfig(String),

    #[error("無効なCIDRブロック '{value}': {reason}")]
    InvalidCidr { value: String, reason: String },

    #[error("サブネット '{subnet}' ({cidr}) がネットワーク '{network}' ({network_cidr}) の範囲外です")]
    SubnetOutsideNetwork {
        subnet: String,
        cidr: Ipv4Net,
        network: String,
        network_cidr: Ipv4Net,
    },

    #[error("サブネット '{subnet}' ({cidr}) がサブネット '{other}' ({other_cidr}) と重複しています")]
    SubnetOverlap {
        subnet: String,
        cidr: Ipv4Net,
        other: String,
        other_cidr: Ipv4Net,
    },

    #[error("リソースは既に宣言されています: {0}")]
    DuplicateResource(ResourceKey),

    #[error("{kind} '{name}' が見つかりません")]
    UnknownReference { kind: ResourceKind, name: String },

    #[error("{resource} がネットワーク '{found}' を参照しています (期待値: '{expected}')")]
    NetworkMismatch {
        resource: ResourceKey,
        expected: String,
        found: String,
    },

    #[error("無効なポート範囲 {from}-{to}: from は to 以下である必要があります")]
    InvalidPortRange { from: u16, to: u16 },

    #[error("不明なプロトコル: {0}")]
    UnknownProtocol(String),

    #[error("ルートテーブル '{table}' には既に {destination} へのルートがあります")]
    DuplicateRoute { table: String, destination: Ipv4Net },

    #[error("サブネット '{subnet}' は既にルートテーブル '{table}' に関連付けられています")]
    AlreadyAssociated { subnet: String, table: String },

    #[error("ルートテーブル '{0}' にデフォルトルート (0.0.0.0/0) がありません")]
    MissingDefaultRoute(String),

    #[error("サブネット '{0}' にルートテーブルが関連付けられていません")]
    UnassociatedSubnet(String),

    #[error("このトポロジーが発行したハンドルではありません: {0}")]
    InvalidHandle(ResourceKind),
}

pub type Result<T> = std::result::Result<T, TopologyError>;
