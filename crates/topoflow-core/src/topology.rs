//! トポロジーグラフのビルダー
//!
//! [`Topology`] は呼び出し側が所有するリソースグラフ。`declare_*` は
//! それまでの宣言に対して入力を検証し、リソースを追加して型付きハンドルを返す。
//! ハンドルは常に先に宣言されたリソースを指すため、グラフは循環しない。

use crate::cidr::{is_default_route, overlaps, parse_block};
use crate::error::{Result, TopologyError};
use crate::model::*;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, instrument};

static NEXT_TOPOLOGY_ID: AtomicU64 = AtomicU64::new(1);

/// 1デプロイメント分の宣言済みリソースグラフ
///
/// 同じリソースを同じ順序で宣言していれば等しいとみなす。
/// ハンドルに刻まれるIDは比較しない。
#[derive(Debug, Clone)]
pub struct Topology {
    id: u64,
    name: String,
    region: String,
    networks: Vec<Network>,
    subnets: Vec<Subnet>,
    gateways: Vec<Gateway>,
    route_tables: Vec<RouteTable>,
    routes: Vec<Route>,
    associations: Vec<RouteAssociation>,
    firewalls: Vec<FirewallPolicy>,
    instances: Vec<ComputeInstance>,
    outputs: Vec<Output>,
    /// 宣言順の全リソースキー
    declared: Vec<ResourceKey>,
}

impl PartialEq for Topology {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.region == other.region
            && self.networks == other.networks
            && self.subnets == other.subnets
            && self.gateways == other.gateways
            && self.route_tables == other.route_tables
            && self.routes == other.routes
            && self.associations == other.associations
            && self.firewalls == other.firewalls
            && self.instances == other.instances
            && self.outputs == other.outputs
            && self.declared == other.declared
    }
}

/// 指し先リソースのキーに戻せるハンドル
pub trait ResourceHandle: Copy {
    const KIND: ResourceKind;

    fn resource_name(self, topology: &Topology) -> Result<&str>;
}

macro_rules! resource_handle {
    ($handle:ty, $kind:expr, $field:ident) => {
        impl ResourceHandle for $handle {
            const KIND: ResourceKind = $kind;

            fn resource_name(self, topology: &Topology) -> Result<&str> {
                topology
                    .slot(&topology.$field, self.owner, self.index, Self::KIND)
                    .map(|r| r.name.as_str())
            }
        }
    };
}

resource_handle!(NetworkHandle, ResourceKind::Network, networks);
resource_handle!(SubnetHandle, ResourceKind::Subnet, subnets);
resource_handle!(GatewayHandle, ResourceKind::Gateway, gateways);
resource_handle!(RouteTableHandle, ResourceKind::RouteTable, route_tables);
resource_handle!(RouteHandle, ResourceKind::Route, routes);
resource_handle!(AssociationHandle, ResourceKind::RouteAssociation, associations);
resource_handle!(FirewallHandle, ResourceKind::FirewallPolicy, firewalls);
resource_handle!(InstanceHandle, ResourceKind::ComputeInstance, instances);

fn position<T>(
    items: &[T],
    name: &str,
    kind: ResourceKind,
    name_of: impl Fn(&T) -> &str,
) -> Result<usize> {
    items
        .iter()
        .position(|item| name_of(item) == name)
        .ok_or_else(|| TopologyError::UnknownReference {
            kind,
            name: name.to_string(),
        })
}

impl Topology {
    pub fn new(name: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            id: NEXT_TOPOLOGY_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            region: region.into(),
            networks: Vec::new(),
            subnets: Vec::new(),
            gateways: Vec::new(),
            route_tables: Vec::new(),
            routes: Vec::new(),
            associations: Vec::new(),
            firewalls: Vec::new(),
            instances: Vec::new(),
            outputs: Vec::new(),
            declared: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// このトポロジーが発行したハンドルなら、その指し先リソース
    fn slot<'a, T>(
        &self,
        items: &'a [T],
        owner: u64,
        index: usize,
        kind: ResourceKind,
    ) -> Result<&'a T> {
        if owner != self.id {
            return Err(TopologyError::InvalidHandle(kind));
        }
        items.get(index).ok_or(TopologyError::InvalidHandle(kind))
    }

    fn ensure_new(&self, key: &ResourceKey) -> Result<()> {
        if self.declared.contains(key) {
            return Err(TopologyError::DuplicateResource(key.clone()));
        }
        Ok(())
    }

    fn record(&mut self, key: ResourceKey) {
        debug!(resource = %key, "Declared resource");
        self.declared.push(key);
    }

    // ── 宣言 ──

    #[instrument(skip(self, spec), fields(network = %spec.name))]
    pub fn declare_network(&mut self, spec: NetworkSpec) -> Result<NetworkHandle> {
        let cidr = parse_block(&spec.cidr)?;
        let key = ResourceKey::new(ResourceKind::Network, &spec.name);
        self.ensure_new(&key)?;

        let mut tags = spec.tags;
        tags.ensure_name(&spec.name);
        self.networks.push(Network {
            name: spec.name,
            cidr,
            dns: spec.dns,
            tags,
        });
        self.record(key);
        Ok(NetworkHandle::new(self.id, self.networks.len() - 1))
    }

    /// `network` 内にサブネットを宣言
    ///
    /// ブロックはネットワークの範囲内にあり、同じネットワークの既存サブネットと
    /// 重複してはならない。
    #[instrument(skip(self, spec), fields(subnet = %spec.name))]
    pub fn declare_subnet(
        &mut self,
        network: NetworkHandle,
        spec: SubnetSpec,
    ) -> Result<SubnetHandle> {
        let parent = self.network(network)?;
        let cidr = parse_block(&spec.cidr)?;

        if !parent.cidr.contains(&cidr) {
            return Err(TopologyError::SubnetOutsideNetwork {
                subnet: spec.name,
                cidr,
                network: parent.name.clone(),
                network_cidr: parent.cidr,
            });
        }

        if let Some(sibling) = self
            .subnets
            .iter()
            .find(|s| s.network == network && overlaps(&s.cidr, &cidr))
        {
            return Err(TopologyError::SubnetOverlap {
                subnet: spec.name,
                cidr,
                other: sibling.name.clone(),
                other_cidr: sibling.cidr,
            });
        }

        let key = ResourceKey::new(ResourceKind::Subnet, &spec.name);
        self.ensure_new(&key)?;

        let mut tags = spec.tags;
        tags.ensure_name(&spec.name);
        self.subnets.push(Subnet {
            name: spec.name,
            network,
            cidr,
            zone: spec.zone,
            map_public_ip_on_launch: spec.map_public_ip_on_launch,
            tags,
        });
        self.record(key);
        Ok(SubnetHandle::new(self.id, self.subnets.len() - 1))
    }

    pub fn declare_gateway(
        &mut self,
        network: NetworkHandle,
        name: impl Into<String>,
        tags: Tags,
    ) -> Result<GatewayHandle> {
        let name = name.into();
        self.network(network)?;
        let key = ResourceKey::new(ResourceKind::Gateway, &name);
        self.ensure_new(&key)?;

        let mut tags = tags;
        tags.ensure_name(&name);
        self.gateways.push(Gateway {
            name,
            network,
            tags,
        });
        self.record(key);
        Ok(GatewayHandle::new(self.id, self.gateways.len() - 1))
    }

    pub fn declare_route_table(
        &mut self,
        network: NetworkHandle,
        name: impl Into<String>,
        tags: Tags,
    ) -> Result<RouteTableHandle> {
        let name = name.into();
        self.network(network)?;
        let key = ResourceKey::new(ResourceKind::RouteTable, &name);
        self.ensure_new(&key)?;

        let mut tags = tags;
        tags.ensure_name(&name);
        self.route_tables.push(RouteTable {
            name,
            network,
            tags,
        });
        self.record(key);
        Ok(RouteTableHandle::new(self.id, self.route_tables.len() - 1))
    }

    /// `gateway` を次ホップとするルートを `table` に追加
    ///
    /// ゲートウェイはテーブルと同じネットワークにアタッチされている必要があり、
    /// 1つの宛先につきルートは1つまで。
    pub fn declare_route(
        &mut self,
        table: RouteTableHandle,
        name: impl Into<String>,
        destination: &str,
        gateway: GatewayHandle,
    ) -> Result<RouteHandle> {
        let name = name.into();
        let key = ResourceKey::new(ResourceKind::Route, &name);
        let route_table = self.route_table(table)?;
        let next_hop = self.gateway(gateway)?;

        if next_hop.network != route_table.network {
            return Err(TopologyError::NetworkMismatch {
                resource: key,
                expected: self.network(route_table.network)?.name.clone(),
                found: self.network(next_hop.network)?.name.clone(),
            });
        }

        let destination = parse_block(destination)?;
        if self.routes_of(table).any(|r| r.destination == destination) {
            return Err(TopologyError::DuplicateRoute {
                table: route_table.name.clone(),
                destination,
            });
        }
        self.ensure_new(&key)?;

        self.routes.push(Route {
            name,
            table,
            destination,
            gateway,
        });
        self.record(key);
        Ok(RouteHandle::new(self.id, self.routes.len() - 1))
    }

    /// `subnet` を `table` に関連付ける。関連付けはサブネットごとに1回だけ。
    pub fn declare_route_association(
        &mut self,
        name: impl Into<String>,
        subnet: SubnetHandle,
        table: RouteTableHandle,
    ) -> Result<AssociationHandle> {
        let name = name.into();
        let key = ResourceKey::new(ResourceKind::RouteAssociation, &name);
        let member = self.subnet(subnet)?;
        let route_table = self.route_table(table)?;

        if member.network != route_table.network {
            return Err(TopologyError::NetworkMismatch {
                resource: key,
                expected: self.network(member.network)?.name.clone(),
                found: self.network(route_table.network)?.name.clone(),
            });
        }

        if let Some(existing) = self.association_of(subnet) {
            return Err(TopologyError::AlreadyAssociated {
                subnet: member.name.clone(),
                table: self.route_table(existing.table)?.name.clone(),
            });
        }
        self.ensure_new(&key)?;

        self.associations.push(RouteAssociation {
            name,
            subnet,
            table,
        });
        self.record(key);
        Ok(AssociationHandle::new(self.id, self.associations.len() - 1))
    }

    #[instrument(skip(self, spec), fields(firewall = %spec.name))]
    pub fn declare_firewall_policy(
        &mut self,
        network: NetworkHandle,
        spec: FirewallSpec,
    ) -> Result<FirewallHandle> {
        self.network(network)?;
        let key = ResourceKey::new(ResourceKind::FirewallPolicy, &spec.name);
        self.ensure_new(&key)?;

        let mut tags = spec.tags;
        tags.ensure_name(&spec.name);
        self.firewalls.push(FirewallPolicy {
            name: spec.name,
            network,
            description: spec.description,
            ingress: spec.ingress,
            egress: spec.egress,
            tags,
        });
        self.record(key);
        Ok(FirewallHandle::new(self.id, self.firewalls.len() - 1))
    }

    /// コンピュートインスタンスを宣言。付与するファイアウォールポリシーはすべて
    /// サブネットと同じネットワークに属している必要がある。
    #[instrument(skip(self, spec), fields(instance = %spec.name))]
    pub fn declare_compute_instance(&mut self, spec: InstanceSpec) -> Result<InstanceHandle> {
        let key = ResourceKey::new(ResourceKind::ComputeInstance, &spec.name);
        let network = self.subnet(spec.subnet)?.network;

        for handle in &spec.firewall_policies {
            let policy = self.firewall(*handle)?;
            if policy.network != network {
                return Err(TopologyError::NetworkMismatch {
                    resource: key,
                    expected: self.network(network)?.name.clone(),
                    found: self.network(policy.network)?.name.clone(),
                });
            }
        }
        self.ensure_new(&key)?;

        let mut tags = spec.tags;
        tags.ensure_name(&spec.name);
        self.instances.push(ComputeInstance {
            name: spec.name,
            instance_type: spec.instance_type,
            image: spec.image,
            subnet: spec.subnet,
            firewall_policies: spec.firewall_policies,
            key_name: spec.key_name,
            associate_public_ip: spec.associate_public_ip,
            tags,
        });
        self.record(key);
        Ok(InstanceHandle::new(self.id, self.instances.len() - 1))
    }

    /// `handle` のリソースの `attribute` を出力 `name` としてエクスポート
    pub fn export<H: ResourceHandle>(
        &mut self,
        name: impl Into<String>,
        handle: H,
        attribute: Attribute,
    ) -> Result<()> {
        let key = self.key(handle)?;
        self.export_key(name, key, attribute)
    }

    pub fn export_key(
        &mut self,
        name: impl Into<String>,
        resource: ResourceKey,
        attribute: Attribute,
    ) -> Result<()> {
        let name = name.into();

        if !self.declared.contains(&resource) {
            return Err(TopologyError::UnknownReference {
                kind: resource.kind,
                name: resource.name,
            });
        }
        if !attribute.applies_to(resource.kind) {
            return Err(TopologyError::InvalidConfig(format!(
                "output '{}': {} has no attribute '{}'",
                name, resource, attribute
            )));
        }
        if self.outputs.iter().any(|o| o.name == name) {
            return Err(TopologyError::InvalidConfig(format!(
                "output '{}' is exported twice",
                name
            )));
        }

        self.outputs.push(Output {
            name,
            resource,
            attribute,
        });
        Ok(())
    }

    // ── 参照 ──

    pub fn key<H: ResourceHandle>(&self, handle: H) -> Result<ResourceKey> {
        Ok(ResourceKey::new(H::KIND, handle.resource_name(self)?))
    }

    pub fn network(&self, handle: NetworkHandle) -> Result<&Network> {
        self.slot(&self.networks, handle.owner, handle.index, ResourceKind::Network)
    }

    pub fn subnet(&self, handle: SubnetHandle) -> Result<&Subnet> {
        self.slot(&self.subnets, handle.owner, handle.index, ResourceKind::Subnet)
    }

    pub fn gateway(&self, handle: GatewayHandle) -> Result<&Gateway> {
        self.slot(&self.gateways, handle.owner, handle.index, ResourceKind::Gateway)
    }

    pub fn route_table(&self, handle: RouteTableHandle) -> Result<&RouteTable> {
        self.slot(&self.route_tables, handle.owner, handle.index, ResourceKind::RouteTable)
    }

    pub fn firewall(&self, handle: FirewallHandle) -> Result<&FirewallPolicy> {
        self.slot(&self.firewalls, handle.owner, handle.index, ResourceKind::FirewallPolicy)
    }

    pub fn instance(&self, handle: InstanceHandle) -> Result<&ComputeInstance> {
        self.slot(&self.instances, handle.owner, handle.index, ResourceKind::ComputeInstance)
    }

    pub fn network_by_name(&self, name: &str) -> Result<NetworkHandle> {
        position(&self.networks, name, ResourceKind::Network, |r| r.name.as_str())
            .map(|i| NetworkHandle::new(self.id, i))
    }

    pub fn subnet_by_name(&self, name: &str) -> Result<SubnetHandle> {
        position(&self.subnets, name, ResourceKind::Subnet, |r| r.name.as_str())
            .map(|i| SubnetHandle::new(self.id, i))
    }

    pub fn gateway_by_name(&self, name: &str) -> Result<GatewayHandle> {
        position(&self.gateways, name, ResourceKind::Gateway, |r| r.name.as_str())
            .map(|i| GatewayHandle::new(self.id, i))
    }

    pub fn route_table_by_name(&self, name: &str) -> Result<RouteTableHandle> {
        position(&self.route_tables, name, ResourceKind::RouteTable, |r| r.name.as_str())
            .map(|i| RouteTableHandle::new(self.id, i))
    }

    pub fn firewall_by_name(&self, name: &str) -> Result<FirewallHandle> {
        position(&self.firewalls, name, ResourceKind::FirewallPolicy, |r| r.name.as_str())
            .map(|i| FirewallHandle::new(self.id, i))
    }

    pub fn instance_by_name(&self, name: &str) -> Result<InstanceHandle> {
        position(&self.instances, name, ResourceKind::ComputeInstance, |r| r.name.as_str())
            .map(|i| InstanceHandle::new(self.id, i))
    }

    /// 全種類を通して一意な論理名を解決
    pub fn find_resource(&self, name: &str) -> Result<ResourceKey> {
        let mut matches = self.declared.iter().filter(|k| k.name == name);
        match (matches.next(), matches.next()) {
            (Some(key), None) => Ok(key.clone()),
            (None, _) => Err(TopologyError::InvalidConfig(format!(
                "no resource named '{}'",
                name
            ))),
            (Some(_), Some(_)) => Err(TopologyError::InvalidConfig(format!(
                "resource name '{}' is ambiguous, specify its kind",
                name
            ))),
        }
    }

    // ── 列挙 ──

    /// 宣言順の全リソースキー
    pub fn resources(&self) -> &[ResourceKey] {
        &self.declared
    }

    pub fn len(&self) -> usize {
        self.declared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declared.is_empty()
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    pub fn networks(&self) -> impl Iterator<Item = (NetworkHandle, &Network)> {
        let id = self.id;
        self.networks
            .iter()
            .enumerate()
            .map(move |(i, r)| (NetworkHandle::new(id, i), r))
    }

    pub fn subnets(&self) -> impl Iterator<Item = (SubnetHandle, &Subnet)> {
        let id = self.id;
        self.subnets
            .iter()
            .enumerate()
            .map(move |(i, r)| (SubnetHandle::new(id, i), r))
    }

    pub fn subnets_of(&self, network: NetworkHandle) -> impl Iterator<Item = &Subnet> {
        let owned = network.owner == self.id;
        self.subnets
            .iter()
            .filter(move |s| owned && s.network == network)
    }

    pub fn gateways(&self) -> impl Iterator<Item = (GatewayHandle, &Gateway)> {
        let id = self.id;
        self.gateways
            .iter()
            .enumerate()
            .map(move |(i, r)| (GatewayHandle::new(id, i), r))
    }

    pub fn route_tables(&self) -> impl Iterator<Item = (RouteTableHandle, &RouteTable)> {
        let id = self.id;
        self.route_tables
            .iter()
            .enumerate()
            .map(move |(i, r)| (RouteTableHandle::new(id, i), r))
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    /// `table` のルート (宣言順)
    pub fn routes_of(&self, table: RouteTableHandle) -> impl Iterator<Item = &Route> {
        let owned = table.owner == self.id;
        self.routes
            .iter()
            .filter(move |r| owned && r.table == table)
    }

    pub fn associations(&self) -> impl Iterator<Item = &RouteAssociation> {
        self.associations.iter()
    }

    pub fn association_of(&self, subnet: SubnetHandle) -> Option<&RouteAssociation> {
        if subnet.owner != self.id {
            return None;
        }
        self.associations.iter().find(|a| a.subnet == subnet)
    }

    pub fn firewalls(&self) -> impl Iterator<Item = (FirewallHandle, &FirewallPolicy)> {
        let id = self.id;
        self.firewalls
            .iter()
            .enumerate()
            .map(move |(i, r)| (FirewallHandle::new(id, i), r))
    }

    pub fn instances(&self) -> impl Iterator<Item = (InstanceHandle, &ComputeInstance)> {
        let id = self.id;
        self.instances
            .iter()
            .enumerate()
            .map(move |(i, r)| (InstanceHandle::new(id, i), r))
    }

    // ── グラフ ──

    /// `key` が直接参照するリソースのキー
    pub fn depends_on(&self, key: &ResourceKey) -> Vec<ResourceKey> {
        let mut deps = Vec::new();
        let mut push = |handle_key: Result<ResourceKey>| {
            if let Ok(k) = handle_key {
                deps.push(k);
            }
        };

        match key.kind {
            ResourceKind::Network => {}
            ResourceKind::Subnet => {
                if let Some(s) = self.subnets.iter().find(|s| s.name == key.name) {
                    push(self.key(s.network));
                }
            }
            ResourceKind::Gateway => {
                if let Some(g) = self.gateways.iter().find(|g| g.name == key.name) {
                    push(self.key(g.network));
                }
            }
            ResourceKind::RouteTable => {
                if let Some(t) = self.route_tables.iter().find(|t| t.name == key.name) {
                    push(self.key(t.network));
                }
            }
            ResourceKind::Route => {
                if let Some(r) = self.routes.iter().find(|r| r.name == key.name) {
                    push(self.key(r.table));
                    push(self.key(r.gateway));
                }
            }
            ResourceKind::RouteAssociation => {
                if let Some(a) = self.associations.iter().find(|a| a.name == key.name) {
                    push(self.key(a.subnet));
                    push(self.key(a.table));
                }
            }
            ResourceKind::FirewallPolicy => {
                if let Some(f) = self.firewalls.iter().find(|f| f.name == key.name) {
                    push(self.key(f.network));
                }
            }
            ResourceKind::ComputeInstance => {
                if let Some(i) = self.instances.iter().find(|i| i.name == key.name) {
                    push(self.key(i.subnet));
                    for policy in &i.firewall_policies {
                        push(self.key(*policy));
                    }
                }
            }
        }

        deps
    }

    /// グラフの全 `(dependent, dependency)` エッジ
    pub fn dependencies(&self) -> Vec<(ResourceKey, ResourceKey)> {
        self.declared
            .iter()
            .flat_map(|key| {
                self.depends_on(key)
                    .into_iter()
                    .map(move |dep| (key.clone(), dep))
            })
            .collect()
    }

    // ── 検証 ──

    /// 宣言完了後にのみ成り立つグラフ全体の不変条件
    ///
    /// 見つかった違反をすべて返す。空ならエンジンに渡せる状態。
    pub fn issues(&self) -> Vec<TopologyError> {
        let mut issues = Vec::new();

        for (handle, table) in self.route_tables() {
            let defaults = self
                .routes_of(handle)
                .filter(|r| is_default_route(&r.destination))
                .count();
            if defaults != 1 {
                issues.push(TopologyError::MissingDefaultRoute(table.name.clone()));
            }
        }

        for (handle, subnet) in self.subnets() {
            if self.association_of(handle).is_none() {
                issues.push(TopologyError::UnassociatedSubnet(subnet.name.clone()));
            }
        }

        let order = |key: &ResourceKey| self.declared.iter().position(|k| k == key);
        for (dependent, dependency) in self.dependencies() {
            if order(&dependency) >= order(&dependent) {
                issues.push(TopologyError::InvalidConfig(format!(
                    "{} depends on {} which is not declared before it",
                    dependent, dependency
                )));
            }
        }

        issues
    }

    /// グラフ全体の違反があれば最初の1件でエラーにする
    pub fn validate(&self) -> Result<()> {
        match self.issues().into_iter().next() {
            Some(issue) => Err(issue),
            None => {
                debug!(
                    topology = %self.name,
                    resources = self.declared.len(),
                    "Topology is valid"
                );
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vpc() -> (Topology, NetworkHandle) {
        let mut topology = Topology::new("test", "ap-southeast-1");
        let network = topology
            .declare_network(NetworkSpec::new("vpc", "10.0.0.0/16").with_dns(DnsOptions::enabled()))
            .unwrap();
        (topology, network)
    }

    #[test]
    fn test_disjoint_subnets_then_overlap_rejected() {
        let (mut topology, network) = vpc();
        for (i, cidr) in ["10.0.1.0/24", "10.0.2.0/24", "10.0.3.0/24"].iter().enumerate() {
            topology
                .declare_subnet(
                    network,
                    SubnetSpec::new(format!("subnet-{}", i + 1), *cidr, "ap-southeast-1a"),
                )
                .unwrap();
        }

        let err = topology
            .declare_subnet(
                network,
                SubnetSpec::new("subnet-4", "10.0.1.128/25", "ap-southeast-1a"),
            )
            .unwrap_err();
        match err {
            TopologyError::SubnetOverlap { subnet, other, .. } => {
                assert_eq!(subnet, "subnet-4");
                assert_eq!(other, "subnet-1");
            }
            other => panic!("expected SubnetOverlap, got {other:?}"),
        }

        // 拒否された宣言は何も残さない
        assert_eq!(topology.subnets().count(), 3);
        assert!(topology.subnet_by_name("subnet-4").is_err());
    }

    #[test]
    fn test_subnet_outside_network_rejected() {
        let (mut topology, network) = vpc();
        let err = topology
            .declare_subnet(network, SubnetSpec::new("far", "10.1.0.0/24", "ap-southeast-1a"))
            .unwrap_err();
        assert!(matches!(err, TopologyError::SubnetOutsideNetwork { .. }));
    }

    #[test]
    fn test_malformed_cidr_rejected_immediately() {
        let mut topology = Topology::new("test", "ap-southeast-1");
        let err = topology
            .declare_network(NetworkSpec::new("vpc", "10.0.0.0/99"))
            .unwrap_err();
        assert!(matches!(err, TopologyError::InvalidCidr { .. }));
        assert!(topology.is_empty());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let (mut topology, network) = vpc();
        topology
            .declare_gateway(network, "igw", Tags::new())
            .unwrap();
        let err = topology
            .declare_gateway(network, "igw", Tags::new())
            .unwrap_err();
        assert!(matches!(err, TopologyError::DuplicateResource(_)));
    }

    #[test]
    fn test_name_tag_defaults_to_logical_name() {
        let (topology, network) = vpc();
        assert_eq!(topology.network(network).unwrap().tags.name(), Some("vpc"));
    }

    #[test]
    fn test_second_default_route_rejected() {
        let (mut topology, network) = vpc();
        let igw = topology.declare_gateway(network, "igw", Tags::new()).unwrap();
        let rt = topology.declare_route_table(network, "rt", Tags::new()).unwrap();
        topology.declare_route(rt, "default", "0.0.0.0/0", igw).unwrap();

        let err = topology
            .declare_route(rt, "default-again", "0.0.0.0/0", igw)
            .unwrap_err();
        assert!(matches!(err, TopologyError::DuplicateRoute { .. }));
    }

    #[test]
    fn test_route_through_foreign_gateway_rejected() {
        let (mut topology, network) = vpc();
        let other = topology
            .declare_network(NetworkSpec::new("other", "172.16.0.0/16"))
            .unwrap();
        let foreign_igw = topology.declare_gateway(other, "igw", Tags::new()).unwrap();
        let rt = topology.declare_route_table(network, "rt", Tags::new()).unwrap();

        let err = topology
            .declare_route(rt, "default", "0.0.0.0/0", foreign_igw)
            .unwrap_err();
        assert!(matches!(err, TopologyError::NetworkMismatch { .. }));
    }

    #[test]
    fn test_subnet_associated_once() {
        let (mut topology, network) = vpc();
        let subnet = topology
            .declare_subnet(network, SubnetSpec::new("a", "10.0.1.0/24", "ap-southeast-1a"))
            .unwrap();
        let rt = topology.declare_route_table(network, "rt", Tags::new()).unwrap();
        let rt2 = topology.declare_route_table(network, "rt2", Tags::new()).unwrap();

        topology.declare_route_association("assoc", subnet, rt).unwrap();
        let err = topology
            .declare_route_association("assoc2", subnet, rt2)
            .unwrap_err();
        match err {
            TopologyError::AlreadyAssociated { subnet, table } => {
                assert_eq!(subnet, "a");
                assert_eq!(table, "rt");
            }
            other => panic!("expected AlreadyAssociated, got {other:?}"),
        }
    }

    #[test]
    fn test_association_across_networks_rejected() {
        let (mut topology, network) = vpc();
        let other = topology
            .declare_network(NetworkSpec::new("other", "172.16.0.0/16"))
            .unwrap();
        let subnet = topology
            .declare_subnet(network, SubnetSpec::new("a", "10.0.1.0/24", "ap-southeast-1a"))
            .unwrap();
        let foreign_rt = topology.declare_route_table(other, "rt", Tags::new()).unwrap();

        let err = topology
            .declare_route_association("assoc", subnet, foreign_rt)
            .unwrap_err();
        match err {
            TopologyError::NetworkMismatch {
                expected, found, ..
            } => {
                assert_eq!(expected, "vpc");
                assert_eq!(found, "other");
            }
            other => panic!("expected NetworkMismatch, got {other:?}"),
        }
        assert!(topology.association_of(subnet).is_none());
    }

    #[test]
    fn test_handle_from_other_topology_rejected() {
        let (_, network_a) = vpc();
        let mut b = Topology::new("b", "ap-southeast-1");
        let network_b = b
            .declare_network(NetworkSpec::new("vpc-b", "172.16.0.0/16"))
            .unwrap();
        assert_eq!(network_a.index(), network_b.index());

        let err = b
            .declare_subnet(
                network_a,
                SubnetSpec::new("a", "172.16.1.0/24", "ap-southeast-1a"),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            TopologyError::InvalidHandle(ResourceKind::Network)
        ));
        assert!(b.network(network_a).is_err());
        assert!(b.key(network_a).is_err());
        assert_eq!(b.subnets_of(network_a).count(), 0);
        assert_eq!(b.subnets().count(), 0);

        // クローンは元のハンドルをそのまま受け付ける
        let copy = b.clone();
        assert_eq!(copy.network(network_b).unwrap().name, "vpc-b");
    }

    #[test]
    fn test_issues_reports_missing_route_and_association() {
        let (mut topology, network) = vpc();
        topology
            .declare_subnet(network, SubnetSpec::new("a", "10.0.1.0/24", "ap-southeast-1a"))
            .unwrap();
        topology.declare_route_table(network, "rt", Tags::new()).unwrap();

        let issues = topology.issues();
        assert_eq!(issues.len(), 2);
        assert!(matches!(issues[0], TopologyError::MissingDefaultRoute(ref t) if t == "rt"));
        assert!(matches!(issues[1], TopologyError::UnassociatedSubnet(ref s) if s == "a"));
        assert!(topology.validate().is_err());
    }

    #[test]
    fn test_instance_with_foreign_firewall_rejected() {
        let (mut topology, network) = vpc();
        let other = topology
            .declare_network(NetworkSpec::new("other", "172.16.0.0/16"))
            .unwrap();
        let subnet = topology
            .declare_subnet(network, SubnetSpec::new("a", "10.0.1.0/24", "ap-southeast-1a"))
            .unwrap();
        let sg = topology
            .declare_firewall_policy(other, FirewallSpec::new("sg", "foreign"))
            .unwrap();

        let err = topology
            .declare_compute_instance(InstanceSpec {
                name: "vm".to_string(),
                instance_type: "t2.micro".to_string(),
                image: "ami-123".to_string(),
                subnet,
                firewall_policies: vec![sg],
                key_name: "key".to_string(),
                associate_public_ip: false,
                tags: Tags::new(),
            })
            .unwrap_err();
        assert!(matches!(err, TopologyError::NetworkMismatch { .. }));
    }

    #[test]
    fn test_export_rules() {
        let (mut topology, network) = vpc();
        topology.export("vpcId", network, Attribute::Id).unwrap();

        assert!(topology.export("vpcId", network, Attribute::Id).is_err());
        assert!(topology.export("vpcIp", network, Attribute::PublicIp).is_err());
        assert!(
            topology
                .export_key(
                    "ghost",
                    ResourceKey::new(ResourceKind::Gateway, "nope"),
                    Attribute::Id
                )
                .is_err()
        );
        assert_eq!(topology.outputs().len(), 1);
    }

    #[test]
    fn test_find_resource_ambiguity() {
        let (mut topology, network) = vpc();
        topology.declare_gateway(network, "shared", Tags::new()).unwrap();
        topology.declare_route_table(network, "shared", Tags::new()).unwrap();

        assert_eq!(
            topology.find_resource("vpc").unwrap(),
            ResourceKey::new(ResourceKind::Network, "vpc")
        );
        assert!(topology.find_resource("shared").is_err());
        assert!(topology.find_resource("missing").is_err());
    }
}
