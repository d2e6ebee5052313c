use super::SourceArgs;
use colored::Colorize;
use std::path::Path;
use topoflow_cloud::ResourceSet;

pub async fn handle(args: &SourceArgs, output: Option<&Path>) -> anyhow::Result<()> {
    let source = args.resolve()?;
    let topology = super::load(&source)?;
    topology.validate()?;

    let set = ResourceSet::from_topology(&topology)?;
    let json = serde_json::to_string_pretty(&set)?;

    match output {
        Some(path) => {
            tokio::fs::write(path, json).await?;
            println!(
                "{} {}個のリソースを {} に書き出しました",
                "✓".green().bold(),
                set.len(),
                path.display().to_string().cyan()
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}
