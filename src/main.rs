use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pkgref_migrate::config::AppConfig;
use pkgref_migrate::migration::Orchestrator;
use pkgref_migrate::platform::bridge::BridgeClient;
use pkgref_migrate::platform::launcher::TokioLauncher;
use pkgref_migrate::platform::{Automation, WindowSystem};
use pkgref_migrate::prompt::ConsolePrompt;
use pkgref_migrate::runner::{print_summary, Runner};

#[derive(Parser)]
#[command(
    name = "pkgref-migrate",
    about = "Migrate packages.config projects to PackageReference through the IDE"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Solution files, processed in the order given
    #[arg(value_name = "SLN_FILE")]
    solutions: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if cli.solutions.is_empty() {
        println!("Usage: {} SlnFile1 SlnFile2 ...", program_name());
        return Ok(());
    }

    let config = AppConfig::load(cli.config.as_deref())?;

    tracing::info!(
        solutions = cli.solutions.len(),
        ide = %config.ide.executable.display(),
        "Starting migration run"
    );

    let bridge = BridgeClient::spawn(config.host_command()?)?;
    let automation: Arc<dyn Automation> = Arc::new(bridge.clone());
    let windows: Arc<dyn WindowSystem> = Arc::new(bridge);

    let orchestrator = Orchestrator::new(&config, windows, Arc::new(ConsolePrompt));
    let runner = Runner::new(&config, automation, Arc::new(TokioLauncher), orchestrator);

    let entries = runner.run(&cli.solutions).await?;
    print_summary(&entries);

    Ok(())
}

fn program_name() -> String {
    std::env::args()
        .next()
        .as_deref()
        .and_then(|arg0| Path::new(arg0).file_stem())
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "pkgref-migrate".to_string())
}
