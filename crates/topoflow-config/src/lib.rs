pub mod error;

pub use error::*;

use std::path::{Path, PathBuf};

/// トポロジーファイルを直接指定する環境変数
pub const CONFIG_PATH_ENV: &str = "TOPOFLOW_CONFIG_PATH";

/// トポロジーファイルと状態ファイルを置くプロジェクトローカルのディレクトリ
pub const PROJECT_DIR: &str = ".topoflow";

/// 各ディレクトリで探すファイル名 (優先度順)
pub const CANDIDATES: [&str; 4] = [
    "topology.local.kdl",
    ".topology.local.kdl",
    "topology.kdl",
    ".topology.kdl",
];

/// カレントディレクトリのトポロジーファイルを探す
///
/// 以下の優先順位で検索:
/// 1. 環境変数 TOPOFLOW_CONFIG_PATH (直接パス指定)
/// 2. カレントディレクトリ: [`CANDIDATES`] の順
/// 3. ./.topoflow/ ディレクトリ内: 同様の順序
/// 4. ~/.config/topoflow/topology.kdl (グローバル設定)
pub fn find_topology_file() -> Result<PathBuf> {
    let current_dir = std::env::current_dir()?;
    find_topology_file_in(&current_dir)
}

/// [`find_topology_file`] と同じ。カレントディレクトリの代わりに `dir` から探す
pub fn find_topology_file_in(dir: &Path) -> Result<PathBuf> {
    // 1. 環境変数で直接指定
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
    }

    // 2. カレントディレクトリで検索
    if let Some(path) = first_candidate(dir) {
        return Ok(path);
    }

    // 3. ./.topoflow/ ディレクトリで検索
    let project_dir = dir.join(PROJECT_DIR);
    if project_dir.is_dir() {
        if let Some(path) = first_candidate(&project_dir) {
            return Ok(path);
        }
    }

    // 4. グローバル設定ファイル
    if let Some(config_dir) = dirs::config_dir() {
        let global = config_dir.join("topoflow").join("topology.kdl");
        if global.exists() {
            return Ok(global);
        }
    }

    Err(ConfigError::TopologyFileNotFound)
}

fn first_candidate(dir: &Path) -> Option<PathBuf> {
    CANDIDATES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}

/// トポロジーファイルのプロジェクトルート
///
/// ファイルのあるディレクトリ。`.topoflow/` 内にある場合はその親ディレクトリ
pub fn project_root_for(topology_file: &Path) -> PathBuf {
    let dir = topology_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    match (dir.file_name(), dir.parent()) {
        (Some(name), Some(parent)) if name == PROJECT_DIR => parent.to_path_buf(),
        _ => dir.to_path_buf(),
    }
}
