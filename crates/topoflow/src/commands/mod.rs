pub mod outputs;
pub mod render;
pub mod validate;

use anyhow::Context;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use topoflow_config::ConfigError;
use topoflow_core::Topology;

/// トポロジーの読み込み元
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// トポロジーKDLファイル (省略時はカレントディレクトリから探索)
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// 組み込みの redis-setup トポロジーを使う
    #[arg(long, conflicts_with = "file")]
    pub builtin: bool,
}

pub enum Source {
    File(PathBuf),
    Builtin,
}

impl Source {
    pub fn describe(&self) -> String {
        match self {
            Source::File(path) => path.display().to_string(),
            Source::Builtin => format!("builtin ({})", topoflow_core::redis::TOPOLOGY_NAME),
        }
    }

    /// このトポロジーの状態を `.topoflow/` に持つディレクトリ
    pub fn project_root(&self) -> anyhow::Result<PathBuf> {
        match self {
            Source::File(path) => Ok(topoflow_config::project_root_for(path)),
            Source::Builtin => Ok(std::env::current_dir()?),
        }
    }
}

impl SourceArgs {
    /// 読み込まずにソースだけ決定する
    pub fn resolve(&self) -> anyhow::Result<Source> {
        if self.builtin {
            return Ok(Source::Builtin);
        }
        if let Some(path) = &self.file {
            return Ok(Source::File(path.clone()));
        }

        match topoflow_config::find_topology_file() {
            Ok(path) => Ok(Source::File(path)),
            Err(ConfigError::TopologyFileNotFound) => {
                eprintln!(
                    "{}",
                    "トポロジーファイルが見つからないため、組み込みトポロジーを使用します".yellow()
                );
                Ok(Source::Builtin)
            }
            Err(e) => Err(e.into()),
        }
    }
}

pub fn load(source: &Source) -> anyhow::Result<Topology> {
    match source {
        Source::File(path) => topoflow_core::parse_kdl_file(path)
            .with_context(|| format!("{} の読み込みに失敗しました", path.display())),
        Source::Builtin => Ok(topoflow_core::redis_topology()?),
    }
}
