//! リファレンストポロジー: Redis クラスタと Node.js フロントインスタンス
//!
//! `ap-southeast-1{a,b,c}` にまたがる3つのパブリックサブネットを持つVPC、
//! インターネットゲートウェイとルートテーブル各1つ、全インスタンス共通の
//! セキュリティグループ、`t2.micro` インスタンス7台で構成される。

use crate::error::Result;
use crate::fleet::{InstanceTemplate, declare_fleet};
use crate::model::*;
use crate::topology::Topology;

pub const TOPOLOGY_NAME: &str = "redis-setup";
pub const REGION: &str = "ap-southeast-1";
/// Ubuntu 24.04 LTS
pub const AMI_ID: &str = "ami-01811d4912b4ccb26";
pub const KEY_NAME: &str = "MyKeyPair";
/// 最小の汎用サイズ
pub const INSTANCE_TYPE: &str = "t2.micro";
pub const ENVIRONMENT: &str = "Development";
pub const PROJECT: &str = "RedisSetup";

pub const VPC_CIDR: &str = "10.0.0.0/16";
pub const ANYWHERE: &str = "0.0.0.0/0";

pub const SSH_PORT: u16 = 22;
pub const REDIS_PORT: u16 = 6379;
pub const REDIS_CLUSTER_BUS_PORT: u16 = 16379;
pub const NODEJS_PORT: u16 = 3000;

/// 各パブリックサブネットの `(name, cidr, zone, output)`
pub const SUBNETS: [(&str, &str, &str, &str); 3] = [
    ("subnet-1", "10.0.1.0/24", "ap-southeast-1a", "publicSubnet1Id"),
    ("subnet-2", "10.0.2.0/24", "ap-southeast-1b", "publicSubnet2Id"),
    ("subnet-3", "10.0.3.0/24", "ap-southeast-1c", "publicSubnet3Id"),
];

/// Redis ノードと配置先サブネット
///
/// ノード1-3は subnet-2、4-6は subnet-3 に置く。subnet-1 には
/// Node.js インスタンスだけを置く。
pub const REDIS_FLEET: [(&str, &str); 6] = [
    ("redis-instance-1", "subnet-2"),
    ("redis-instance-2", "subnet-2"),
    ("redis-instance-3", "subnet-2"),
    ("redis-instance-4", "subnet-3"),
    ("redis-instance-5", "subnet-3"),
    ("redis-instance-6", "subnet-3"),
];

pub const NODEJS_INSTANCE: &str = "nodejs-instance";

/// 全インスタンス共通のタグ
pub fn instance_tags() -> Tags {
    Tags::new()
        .with(ENVIRONMENT_TAG, ENVIRONMENT)
        .with(PROJECT_TAG, PROJECT)
}

/// SSH・Redis・Redis クラスタバス・Node.js の通信を許可するセキュリティグループ
pub fn security_group() -> Result<FirewallSpec> {
    Ok(
        FirewallSpec::new("redis-secgrp", "Allow SSH, Redis, and Node.js traffic")
            .ingress(FirewallRule::tcp(SSH_PORT, &[ANYWHERE])?)
            .ingress(FirewallRule::tcp(REDIS_PORT, &[VPC_CIDR])?)
            .ingress(FirewallRule::tcp(REDIS_CLUSTER_BUS_PORT, &[VPC_CIDR])?)
            .ingress(FirewallRule::tcp(NODEJS_PORT, &[ANYWHERE])?)
            .egress(FirewallRule::allow_all(&[ANYWHERE])?),
    )
}

/// 出力を含むリファレンストポロジー全体を構築
pub fn redis_topology() -> Result<Topology> {
    let mut topology = Topology::new(TOPOLOGY_NAME, REGION);

    let vpc = topology.declare_network(
        NetworkSpec::new("redis-vpc", VPC_CIDR).with_dns(DnsOptions::enabled()),
    )?;
    topology.export("vpcId", vpc, Attribute::Id)?;

    let mut subnets = Vec::with_capacity(SUBNETS.len());
    for (name, cidr, zone, output) in SUBNETS {
        let subnet = topology.declare_subnet(vpc, SubnetSpec::new(name, cidr, zone).public())?;
        topology.export(output, subnet, Attribute::Id)?;
        subnets.push(subnet);
    }

    let igw = topology.declare_gateway(vpc, "redis-igw", Tags::new())?;
    topology.export("igwId", igw, Attribute::Id)?;

    let route_table = topology.declare_route_table(vpc, "redis-rt", Tags::new())?;
    topology.export("publicRouteTableId", route_table, Attribute::Id)?;
    topology.declare_route(route_table, "igw-route", ANYWHERE, igw)?;

    for (i, subnet) in subnets.iter().enumerate() {
        topology.declare_route_association(
            format!("rt-association-{}", i + 1),
            *subnet,
            route_table,
        )?;
    }

    let secgrp = topology.declare_firewall_policy(vpc, security_group()?)?;
    topology.export("redisSecurityGroupId", secgrp, Attribute::Id)?;

    let template = InstanceTemplate {
        instance_type: INSTANCE_TYPE.to_string(),
        image: AMI_ID.to_string(),
        firewall_policies: vec![secgrp],
        key_name: KEY_NAME.to_string(),
        associate_public_ip: true,
        tags: instance_tags(),
    };

    let nodejs = template.stamp(&mut topology, NODEJS_INSTANCE, subnets[0])?;
    topology.export("nodejsInstanceId", nodejs, Attribute::Id)?;
    topology.export("nodejsInstancePublicIp", nodejs, Attribute::PublicIp)?;

    let mut members = Vec::with_capacity(REDIS_FLEET.len());
    for (name, subnet) in REDIS_FLEET {
        members.push((name, topology.subnet_by_name(subnet)?));
    }
    let fleet = declare_fleet(&mut topology, &template, &members)?;

    for (i, instance) in fleet.into_iter().enumerate() {
        let n = i + 1;
        topology.export(format!("redisInstance{n}Id"), instance, Attribute::Id)?;
        topology.export(
            format!("redisInstance{n}PublicIp"),
            instance,
            Attribute::PublicIp,
        )?;
    }

    Ok(topology)
}
