//! Vigil command line: HTTP trigger, one-shot runner and catalog listing

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vigil_core::ServiceConfig;
use vigil_engine::{ExecutionRequest, ScenarioCatalog};
use vigil_server::{build_service, load_config, local_capabilities, router, AppState, ConfigOverrides};

#[derive(Parser)]
#[command(name = "vigil")]
#[command(about = "Vigil - tag-selected scenario execution against cloud collaborators", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Scenario catalog root, overriding the configuration
    #[arg(long, global = true)]
    catalog_root: Option<PathBuf>,

    /// Store objects under this directory instead of in memory
    #[arg(long, global = true)]
    object_root: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP trigger (default)
    Serve {
        /// Bind address, overriding the configuration
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Run one selection and print the response as JSON
    Run(RunArgs),

    /// List catalog scenario paths
    List,
}

#[derive(Args)]
struct RunArgs {
    /// Tags to select (logical OR); repeat or separate with commas
    #[arg(short, long, value_delimiter = ',')]
    tags: Vec<String>,

    /// Single scenario path; wins over tags
    #[arg(short, long)]
    feature: Option<String>,

    /// Worker count, clamped to 1..=20
    #[arg(short = 'n', long, allow_negative_numbers = true)]
    threads: Option<i64>,

    /// Target environment
    #[arg(short, long)]
    environment: Option<String>,

    /// Outer deadline for the whole run
    #[arg(long)]
    timeout_ms: Option<u64>,
}

impl RunArgs {
    fn into_request(self) -> ExecutionRequest {
        ExecutionRequest {
            environment: self.environment,
            tags: (!self.tags.is_empty()).then_some(self.tags),
            feature: self.feature,
            threads: self.threads,
            timeout_ms: self.timeout_ms,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let bind_address = match &cli.command {
        Some(Commands::Serve { bind }) => bind.clone(),
        _ => None,
    };
    let overrides = ConfigOverrides {
        bind_address,
        catalog_root: cli.catalog_root.clone(),
        default_environment: None,
    };
    let config = load_config(cli.config.as_deref(), std::env::vars(), &overrides)?;

    match cli.command.unwrap_or(Commands::Serve { bind: None }) {
        Commands::Serve { .. } => {
            serve(config, cli.object_root).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run(args) => run(config, cli.object_root, args).await,
        Commands::List => {
            let catalog = ScenarioCatalog::load(&config.catalog.root, &config.catalog.extension)?;
            for path in catalog.paths() {
                println!("{path}");
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn serve(config: ServiceConfig, object_root: Option<PathBuf>) -> Result<()> {
    let addr: SocketAddr = config
        .server
        .bind_address
        .parse()
        .with_context(|| format!("invalid bind address {}", config.server.bind_address))?;
    let capabilities = local_capabilities(object_root.as_deref());
    let time = capabilities.time.clone();
    let service = build_service(config, capabilities)?;
    let app = router(AppState::new(service, time));

    info!(%addr, "vigil listening");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("vigil stopped");
    Ok(())
}

async fn run(config: ServiceConfig, object_root: Option<PathBuf>, args: RunArgs) -> Result<ExitCode> {
    let service = build_service(config, local_capabilities(object_root.as_deref()))?;
    let report = service.execute(args.into_request()).await;
    println!("{}", serde_json::to_string_pretty(&report.response)?);
    let code = u8::try_from(report.status.exit_code()).unwrap_or(2);
    Ok(ExitCode::from(code))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
