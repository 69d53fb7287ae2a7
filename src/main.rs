//! Command line entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use rosey_sync::registry::TranslationKey;
use rosey_sync::runner::{
    self,
    RunOptions,
};
use rosey_sync::types::PageId;
use tracing_subscriber::EnvFilter;

/// Syncs Rosey translation files with inline translations in content pages.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Workspace root containing `.rosey-sync.json`
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Comma separated locales, overriding the configuration file
    #[arg(short, long, env = "LOCALES", value_delimiter = ',')]
    locales: Option<Vec<String>>,

    /// Only synchronize this translation key (repeatable)
    #[arg(short, long = "key", value_name = "KEY")]
    keys: Vec<String>,

    /// Report what would change without writing any file
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose logging (can be specified multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Pages to synchronize, relative to a locale directory (default: all)
    pages: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stderr());
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(writer).init();

    let options = RunOptions {
        workspace: cli.workspace,
        locales: cli.locales,
        keys: cli.keys.into_iter().map(TranslationKey::new).collect(),
        pages: cli.pages.into_iter().map(PageId::new).collect(),
        dry_run: cli.dry_run,
    };

    match runner::run(options).await {
        Ok(report) if report.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
