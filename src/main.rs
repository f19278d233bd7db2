//! gemini-gateway: HTTP gateway for streaming Gemini answers
//!
//! A small axum server that accepts a question over HTTP, forwards it to
//! the Google Generative Language API, and streams the answer back to
//! the caller as server-sent events, recording a best-effort trace of
//! each call.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use gemini_gateway::{config::AppConfig, run_server};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

#[derive(Parser)]
#[command(name = "gemini-gateway")]
#[command(version = "0.1.0")]
#[command(about = "HTTP gateway that streams Gemini answers over SSE")]
#[command(long_about = "
gemini-gateway forwards questions to the Google Generative Language API
and streams the model's answer back as server-sent events:
  - POST /ask streams `data:` frames terminated by [DONE] or [ERROR]
  - GET /health reports gateway liveness
  - Calls are traced best-effort to a LangSmith-compatible endpoint

Example usage:
  gemini-gateway run --config config.yaml
  gemini-gateway check-config
  gemini-gateway test-upstream
")]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, default_value = "config.yaml")]
    config: PathBuf,

    /// Set logging level (trace, debug, info, warn, error)
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway server
    Run {
        /// Override listen port
        #[arg(short, long)]
        port: Option<u16>,
        /// Override model identifier (e.g., "gemini-2.0-flash")
        #[arg(long)]
        model: Option<String>,
    },

    /// Validate configuration file
    CheckConfig,

    /// Test connection to the upstream model API
    TestUpstream,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level_filter = if let Some(level) = cli.log_level {
        level.to_string()
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
            .to_string()
    };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&level_filter))
        .init();

    match cli.command {
        Commands::Run { port, model } => {
            run_gateway(cli.config, port, model).await?;
        }
        Commands::CheckConfig => {
            check_config(cli.config)?;
        }
        Commands::TestUpstream => {
            test_upstream(cli.config).await?;
        }
    }

    Ok(())
}

/// Run the gateway server
async fn run_gateway(
    config_path: PathBuf,
    port_override: Option<u16>,
    model_override: Option<String>,
) -> anyhow::Result<()> {
    let mut config = load_config_or_exit(&config_path);

    // Apply CLI overrides
    if let Some(port) = port_override {
        config.server.port = port;
    }
    if let Some(model) = model_override {
        config.upstream.model = model;
    }

    tracing::info!("Loading configuration from {:?}", config_path);

    config
        .validate()
        .context("configuration is not valid for serving")?;

    run_server(config).await.map_err(|e| anyhow::anyhow!(e.to_string()))?;

    Ok(())
}

/// Validate configuration file
fn check_config(config_path: PathBuf) -> anyhow::Result<()> {
    match AppConfig::from_file(&config_path) {
        Ok(config) => {
            match config.validate() {
                Ok(()) => println!("✓ Configuration file is valid\n"),
                Err(e) => println!("✗ Configuration is incomplete: {}\n", e),
            }
            println!("Server:");
            println!("  Listen: {}:{}", config.server.host, config.server.port);
            println!("\nUpstream:");
            println!("  URL: {}", config.upstream.base_url());
            println!("  Model: {}", config.upstream.model);
            println!(
                "  API key: {}",
                if config.upstream.api_key.is_empty() {
                    "(not set)"
                } else {
                    "(set)"
                }
            );
            println!("  Timeout: {}s", config.upstream.timeout_seconds);
            println!("\nCORS:");
            for origin in &config.cors.allowed_origins {
                println!("  {}", origin);
            }
            println!("\nTrace:");
            println!("  Enabled: {}", config.trace.enabled);
            println!("  Endpoint: {}", config.trace.endpoint);
            println!("  Project: {}", config.trace.project);
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Configuration error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Test connection to the Generative Language API
async fn test_upstream(config_path: PathBuf) -> anyhow::Result<()> {
    let config = load_config_or_exit(&config_path);
    let model_url = format!(
        "{}/v1beta/models/{}",
        config.upstream.base_url(),
        config.upstream.model
    );

    println!("Testing upstream model endpoint: {}", model_url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()?;

    match client
        .get(&model_url)
        .header("x-goog-api-key", &config.upstream.api_key)
        .send()
        .await
    {
        Ok(resp) => {
            if resp.status().is_success() {
                println!("✓ Upstream is reachable");
                println!("  Status: {}", resp.status());
                if let Ok(body) = resp.json::<serde_json::Value>().await {
                    if let Some(name) = body.get("displayName").and_then(|n| n.as_str()) {
                        println!("  Model: {}", name);
                    }
                }
            } else {
                println!("✗ Upstream returned error status: {}", resp.status());
                if let Ok(body) = resp.text().await {
                    println!("  Response: {}", body.trim());
                }
            }
        }
        Err(e) => {
            println!("✗ Failed to connect to upstream: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Load configuration or exit with error
fn load_config_or_exit(config_path: &PathBuf) -> AppConfig {
    match AppConfig::from_file(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            eprintln!("\nMake sure you have a config.yaml file.");
            eprintln!("You can copy config.yaml.default and modify it:");
            eprintln!("  cp config.yaml.default config.yaml");
            std::process::exit(1);
        }
    }
}
