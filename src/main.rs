use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use solace_core::config;
use solace_core::pipeline::{Pipeline, PipelineOutcome};

#[derive(Parser)]
#[command(
    name = "solace",
    about = "solace - mental-health support chat gateway",
    version = solace_core::VERSION,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Bind host (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Bind port (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Run the decision pipeline on a message without calling the provider
    Check {
        /// Message text
        message: Vec<String>,
        /// Language hint (th, en, cn)
        #[arg(short, long)]
        language: Option<String>,
        /// Use premium mode
        #[arg(long)]
        premium: bool,
    },
    /// Write a default config file
    Init,
    /// Show configuration status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("solace=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port } => cmd_serve(host, port).await?,
        Commands::Check {
            message,
            language,
            premium,
        } => cmd_check(message, language, premium)?,
        Commands::Init => cmd_init()?,
        Commands::Status => cmd_status()?,
    }

    Ok(())
}

async fn cmd_serve(host: Option<String>, port: Option<u16>) -> Result<()> {
    use solace_core::service::http::{serve, AppState};

    let mut cfg = config::load_config_from_env();
    if let Some(host) = host {
        cfg.server.host = host;
    }
    if let Some(port) = port {
        cfg.server.port = port;
    }
    if cfg.get_api_key().is_none() {
        tracing::warn!("No API key configured; chat endpoints will return 503");
    }

    let addr = format!("{}:{}", cfg.server.host, cfg.server.port);
    println!("Starting solace HTTP API on {}...", addr);
    let state = Arc::new(AppState::from_config(cfg)?);
    serve(&addr, state).await
}

fn cmd_check(message: Vec<String>, language: Option<String>, premium: bool) -> Result<()> {
    let cfg = config::load_config_from_env();
    let pipeline = Pipeline::from_config(&cfg);
    let text = serde_json::Value::String(message.join(" "));

    let outcome = pipeline.process_text("cli", Some(&text), language.as_deref(), premium);
    let json = match outcome {
        PipelineOutcome::Proceed(decision) => serde_json::to_value(&decision)?,
        PipelineOutcome::Crisis(payload) => serde_json::to_value(&payload)?,
        PipelineOutcome::Invalid(e) => serde_json::json!({ "valid": false, "error": e.to_string() }),
        PipelineOutcome::RateLimited => serde_json::json!({ "error": "rate limited" }),
    };
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

fn cmd_init() -> Result<()> {
    let config_path = config::get_config_path();
    if config_path.exists() {
        println!("Config already exists at {}", config_path.display());
        return Ok(());
    }
    config::save_config(&config::Config::default(), None)?;
    println!("Created config at {}", config_path.display());
    println!("Set provider.apiKey (or OPENAI_API_KEY) before running `solace serve`.");
    Ok(())
}

fn cmd_status() -> Result<()> {
    let config_path = config::get_config_path();
    let cfg = config::load_config_from_env();

    println!("solace Status\n");
    println!(
        "Config: {} {}",
        config_path.display(),
        if config_path.exists() { "✓" } else { "✗" }
    );
    println!("Model: {}", cfg.provider.model);
    println!(
        "API key: {}",
        if cfg.get_api_key().is_some() { "✓" } else { "not set" }
    );
    println!(
        "Rate limit: {} requests / {}s",
        cfg.limits.max_requests, cfg.limits.window_secs
    );
    println!(
        "Max tokens: premium {}, free {}",
        cfg.modes.premium_max_tokens, cfg.modes.free_max_tokens
    );
    if let Err(e) = cfg.validate() {
        println!("Config problem: {}", e);
    }
    Ok(())
}
