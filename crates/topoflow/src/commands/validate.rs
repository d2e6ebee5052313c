use super::SourceArgs;
use colored::Colorize;
use topoflow_core::Topology;

pub fn handle(args: &SourceArgs) -> anyhow::Result<()> {
    let source = args.resolve()?;
    println!("{}", "トポロジーを検証中...".blue());
    println!("ソース: {}", source.describe().cyan());

    let topology = match super::load(&source) {
        Ok(topology) => topology,
        Err(e) => {
            eprintln!();
            eprintln!("{}", "✗ トポロジーエラー".red().bold());
            eprintln!("  {:#}", e);
            std::process::exit(1);
        }
    };

    let issues = topology.issues();
    if !issues.is_empty() {
        eprintln!();
        eprintln!(
            "{}",
            format!("✗ {}件の問題が見つかりました", issues.len()).red().bold()
        );
        for issue in &issues {
            eprintln!("  - {}", issue);
        }
        std::process::exit(1);
    }

    println!("{}", "✓ トポロジーは正常です！".green().bold());
    println!();
    print_summary(&topology);
    Ok(())
}

fn print_summary(topology: &Topology) {
    println!(
        "{} ({}, {}個のリソース)",
        topology.name().cyan(),
        topology.region(),
        topology.len()
    );

    for (handle, network) in topology.networks() {
        println!("  network {} {}", network.name.cyan(), network.cidr);
        for subnet in topology.subnets_of(handle) {
            let public = if subnet.map_public_ip_on_launch {
                ", public"
            } else {
                ""
            };
            println!(
                "    subnet {} {} ({}{})",
                subnet.name.cyan(),
                subnet.cidr,
                subnet.zone,
                public
            );
        }
    }

    for (_, gateway) in topology.gateways() {
        println!("  gateway {}", gateway.name.cyan());
    }
    for (handle, table) in topology.route_tables() {
        let routes: Vec<String> = topology
            .routes_of(handle)
            .map(|r| r.destination.to_string())
            .collect();
        println!("  route-table {} [{}]", table.name.cyan(), routes.join(", "));
    }

    for (_, policy) in topology.firewalls() {
        let ports: Vec<String> = policy
            .ingress_ports()
            .iter()
            .map(|p| p.to_string())
            .collect();
        println!(
            "  firewall {} ingress ポート [{}], egress ルール {}件",
            policy.name.cyan(),
            ports.join(", "),
            policy.egress.len()
        );
    }

    let instances: Vec<_> = topology.instances().collect();
    if !instances.is_empty() {
        println!("  インスタンス: {}個", instances.len());
        for (_, instance) in instances {
            let subnet = topology
                .subnet(instance.subnet)
                .map(|s| s.name.as_str())
                .unwrap_or("?");
            println!(
                "    - {} ({}, {})",
                instance.name.cyan(),
                instance.instance_type,
                subnet
            );
        }
    }

    println!("  出力: {}個", topology.outputs().len());
}
