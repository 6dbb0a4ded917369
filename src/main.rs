//! Upskill coach worker - Main Entry Point
//!
//! Hosts the chat router and the course query service, either as a
//! long-lived HTTP worker or as a one-shot invocation against an event file.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, Instrument};
use upskill_coach::agent_runtime::BedrockAgentRuntime;
use upskill_coach::chat::AgentRouter;
use upskill_coach::config::{CoachConfig, ConfigError};
use upskill_coach::courses::{CourseQueryService, DynamoCourseStore};
use upskill_coach::error::{CoachError, CoachResult};
use upskill_coach::observability::{HealthService, LogSettings};
use upskill_coach::server::WorkerServer;

/// AI upskill coach: chat routing and course lookups over managed agents
#[derive(Parser)]
#[command(name = "upskill-coach")]
#[command(about = "Chat routing and course lookup handlers for the AI upskill coach")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP worker hosting both handlers
    Serve {
        /// Listen port (overrides configuration)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Run one handler once against a raw event document
    Invoke {
        /// Handler to run
        #[arg(value_enum)]
        handler: HandlerKind,

        /// Event JSON file, or `-` for stdin
        #[arg(short, long, value_name = "FILE")]
        event: PathBuf,
    },
    /// Validate configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum HandlerKind {
    /// Chat router (proxy-style events)
    Chat,
    /// Course query service (action-group events)
    Actions,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize observability system
    LogSettings::from_env().with_verbosity(cli.verbose).init();

    let config = match load_configuration(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Serve { port } => {
            serve(config, port)
                .instrument(upskill_coach::lifecycle_span!("serve"))
                .await
        }
        Commands::Invoke { handler, event } => invoke(config, handler, &event).await,
        Commands::Config { show } => handle_config_command(&config, show),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

fn load_configuration(config_path: Option<&Path>) -> Result<CoachConfig, ConfigError> {
    if let Some(path) = config_path {
        info!("Loading configuration from: {}", path.display());
        return CoachConfig::load_from_file(path);
    }

    // Try default locations, then fall back to the environment alone
    for candidate in ["upskill-coach.toml", "config/upskill-coach.toml"] {
        let path = Path::new(candidate);
        if path.exists() {
            info!("Loading configuration from: {}", path.display());
            return CoachConfig::load_from_file(path);
        }
    }

    info!("No configuration file found, using environment variables");
    CoachConfig::from_env()
}

async fn load_sdk_config(config: &CoachConfig) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.aws.region.clone()))
        .load()
        .await
}

/// Bootstrap: service clients are built once and shared by every invocation
fn build_chat_handler(config: &CoachConfig, sdk_config: &SdkConfig) -> CoachResult<AgentRouter> {
    let runtime = Arc::new(BedrockAgentRuntime::from_sdk_config(sdk_config));
    Ok(AgentRouter::new(config, runtime)?)
}

fn build_course_service(config: &CoachConfig, sdk_config: &SdkConfig) -> CourseQueryService {
    let store = DynamoCourseStore::from_sdk_config(sdk_config, config.courses.table_name.clone());
    CourseQueryService::new(Arc::new(store))
}

async fn serve(config: CoachConfig, port: Option<u16>) -> CoachResult<()> {
    info!(
        "Starting upskill coach worker v{} in region {}",
        env!("CARGO_PKG_VERSION"),
        config.aws.region
    );

    let sdk_config = load_sdk_config(&config).await;
    let chat = build_chat_handler(&config, &sdk_config)?;
    let courses = build_course_service(&config, &sdk_config);
    let health = Arc::new(HealthService::new("upskill-coach"));

    let server = WorkerServer::new(chat, courses, health);
    server
        .run(port.unwrap_or(config.server.port), shutdown_signal())
        .await?;

    info!("Application shutdown complete");
    Ok(())
}

async fn invoke(config: CoachConfig, handler: HandlerKind, event_path: &Path) -> CoachResult<()> {
    let event = read_event(event_path)?;
    let sdk_config = load_sdk_config(&config).await;

    let output = match handler {
        HandlerKind::Chat => {
            let chat = build_chat_handler(&config, &sdk_config)?;
            serde_json::to_string_pretty(&chat.handle(&event).await)?
        }
        HandlerKind::Actions => {
            let courses = build_course_service(&config, &sdk_config);
            serde_json::to_string_pretty(&courses.handle(&event).await)?
        }
    };

    println!("{output}");
    Ok(())
}

fn read_event(path: &Path) -> CoachResult<Value> {
    let raw = if path == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        std::fs::read_to_string(path)?
    };

    serde_json::from_str(&raw)
        .map_err(|e| CoachError::invalid_input(format!("Event is not valid JSON: {e}")))
}

fn handle_config_command(config: &CoachConfig, show: bool) -> CoachResult<()> {
    if show {
        let rendered = toml::to_string_pretty(config)
            .map_err(|e| CoachError::internal(format!("Failed to render configuration: {e}")))?;
        println!("Current configuration:");
        println!("{rendered}");
    }

    match config.agents.validate() {
        Ok(()) => info!("Configuration validation complete"),
        Err(e) => info!("Configuration valid for course lookups only: {}", e),
    }
    Ok(())
}

/// Resolve on SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down gracefully..."),
        _ = terminate => info!("Received SIGTERM, shutting down gracefully..."),
    }
}
