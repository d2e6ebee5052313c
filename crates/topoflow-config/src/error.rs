use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "トポロジーファイルが見つかりません。以下の場所を確認してください:\n\
        - カレントディレクトリ: topology.local.kdl, .topology.local.kdl, topology.kdl, .topology.kdl\n\
        - ./.topoflow/ ディレクトリ\n\
        - ~/.config/topoflow/topology.kdl\n\
        または TOPOFLOW_CONFIG_PATH 環境変数で直接指定できます"
    )]
    TopologyFileNotFound,

    #[error("IO エラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
