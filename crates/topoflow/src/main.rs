mod commands;

use clap::{Parser, Subcommand};
use commands::SourceArgs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "topo")]
#[command(about = "クラウドネットワークのトポロジーを宣言・検証・出力する", long_about = None)]
struct Cli {
    /// デバッグログを stderr に表示 (RUST_LOG が優先)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// トポロジーを検証してサマリーを表示
    Validate {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// プロビジョニングエンジンに渡すリソースセットを JSON で出力
    Render {
        #[command(flatten)]
        source: SourceArgs,
        /// stdout の代わりにこのファイルへ書き出す
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// 作成済みの状態からエクスポートされた出力を解決
    Outputs {
        #[command(flatten)]
        source: SourceArgs,
        /// `.topoflow/state.json` を置くディレクトリ
        #[arg(long, env = "TOPOFLOW_PROJECT_ROOT")]
        project_root: Option<PathBuf>,
        /// 解決済みの出力を JSON オブジェクトで表示 (未解決があればエラー)
        #[arg(long)]
        json: bool,
    },
    /// バージョン情報を表示
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match cli.command {
        Commands::Validate { source } => commands::validate::handle(&source),
        Commands::Render { source, output } => {
            commands::render::handle(&source, output.as_deref()).await
        }
        Commands::Outputs {
            source,
            project_root,
            json,
        } => commands::outputs::handle(&source, project_root, json).await,
        Commands::Version => {
            println!("topoflow {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
