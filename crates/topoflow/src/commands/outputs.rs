use super::SourceArgs;
use colored::Colorize;
use std::path::PathBuf;
use topoflow_cloud::{StateManager, resolve_output, resolve_outputs};

pub async fn handle(
    args: &SourceArgs,
    project_root: Option<PathBuf>,
    json: bool,
) -> anyhow::Result<()> {
    let source = args.resolve()?;
    let topology = super::load(&source)?;

    let project_root = match project_root {
        Some(root) => root,
        None => source.project_root()?,
    };
    let manager = StateManager::new(&project_root);
    let state = manager.load().await?;
    tracing::debug!(state = %manager.state_path().display(), "Loaded state");

    if json {
        let resolved: serde_json::Map<String, serde_json::Value> =
            resolve_outputs(&topology, &state)?
                .into_iter()
                .map(|o| (o.name, serde_json::Value::String(o.value)))
                .collect();
        println!("{}", serde_json::to_string_pretty(&resolved)?);
        return Ok(());
    }

    println!("{} {}", "出力:".blue(), topology.name().cyan());
    for output in topology.outputs() {
        match resolve_output(output, &state) {
            Ok(value) => println!("  {} = {}", output.name.cyan(), value),
            Err(e) => println!(
                "  {} = {}",
                output.name.cyan(),
                format!("(未解決: {})", e).dimmed()
            ),
        }
    }

    Ok(())
}
