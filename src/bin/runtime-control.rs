//! # Runtime Control Operator Tool
//!
//! Validates the control-plane configuration and prints the views an operator
//! needs before starting an agent: the provider selection explanation and the
//! cognitive-state catalogue.

use anyhow::Context;
use clap::{Parser, Subcommand};
use runtime_control::config::ConfigManager;
use runtime_control::control::processor_state_catalogue;
use runtime_control::registry::ServiceSelectionRegistry;
use std::path::PathBuf;
use std::process;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "runtime-control")]
#[command(about = "Inspect and validate runtime control configuration")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Environment whose overrides are applied (development, test, production)
    #[arg(short, long, default_value = "development")]
    environment: String,

    /// Configuration directory path (default: config)
    #[arg(short, long)]
    config_dir: Option<PathBuf>,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load and validate the configuration
    Validate,

    /// Print the provider selection explanation as JSON
    Explain,

    /// Print the cognitive-state catalogue as JSON
    States {
        /// Flag this state as active (accepts WORK or AgentState.WORK)
        #[arg(short, long)]
        active: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let _subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .try_init();

    let result = match &cli.command {
        Some(Commands::Validate) | None => validate(&cli),
        Some(Commands::Explain) => explain(&cli),
        Some(Commands::States { active }) => states(active.as_deref()),
    };

    if let Err(e) = result {
        error!("runtime-control failed: {:#}", e);
        eprintln!("❌ {e:#}");
        process::exit(1);
    }
}

fn load(cli: &Cli) -> anyhow::Result<std::sync::Arc<ConfigManager>> {
    ConfigManager::load_from_directory_with_env(cli.config_dir.clone(), &cli.environment)
        .with_context(|| format!("loading configuration for '{}'", cli.environment))
}

fn validate(cli: &Cli) -> anyhow::Result<()> {
    println!("🔧 Validating runtime control configuration");
    println!("Environment: {}", cli.environment);

    let manager = load(cli)?;
    println!("✅ Configuration loaded from {}", manager.config_directory().display());

    let config = manager.config();
    config.validate().context("validating configuration")?;

    let breaker = &config.circuit_breakers.default_config;
    println!(
        "✅ Circuit breakers: threshold {}, reset timeout {}s, {} overrides",
        breaker.failure_threshold,
        breaker.reset_timeout_seconds,
        config.circuit_breakers.component_configs.len()
    );
    println!(
        "✅ Pipeline: history {}, conscience retries {}",
        config.pipeline.max_thought_history, config.pipeline.max_conscience_retries
    );

    let registry = ServiceSelectionRegistry::from_config(config)
        .context("registering configured providers")?;
    println!("✅ Registry: {} providers registered", registry.len());
    if !registry.is_ready() {
        println!(
            "⚠️  Not every required service type has a provider: {:?}",
            registry.required_service_types()
        );
    }

    info!("Configuration validation completed successfully");
    println!("\n🎉 All configuration validation checks passed!");
    Ok(())
}

fn explain(cli: &Cli) -> anyhow::Result<()> {
    let manager = load(cli)?;
    let registry = ServiceSelectionRegistry::from_config(manager.config())
        .context("registering configured providers")?;
    let explanation = registry.explain_selection();
    println!("{}", serde_json::to_string_pretty(&explanation)?);
    Ok(())
}

fn states(active: Option<&str>) -> anyhow::Result<()> {
    let catalogue = processor_state_catalogue(active);
    println!("{}", serde_json::to_string_pretty(&catalogue)?);
    Ok(())
}
