use std::{path::Path, sync::Arc};

use async_trait::async_trait;
use axon_adapter::{
    HttpAdapter,
    config::{
        AdapterConfigValidator,
        loader::{DEFAULT_CONFIG_TOML, load_config, load_config_unchecked},
    },
    core::{CanonicalRequest, CanonicalResponse, FlowError, RouteDescriptor},
    metrics,
    ports::{Reply, RequestFlow},
    tracing_setup,
    utils::wait_for_signal,
};
use clap::Parser;
use color_eyre::{Result, eyre::WrapErr};
use serde_json::json;
use tracing::Instrument;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Option<Commands>,

    #[clap(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Validate configuration file
    Validate {
        /// Configuration file to validate
        #[clap(short, long, default_value = "config.toml")]
        config: String,
    },
    /// Initialize a new configuration file
    Init {
        /// Output path for the new config file
        #[clap(short, long, default_value = "config.toml")]
        config: String,
    },
    /// Start the adapter with the echo flow (default)
    Serve {
        /// Configuration file to use
        #[clap(short, long, default_value = "config.toml")]
        config: String,
    },
}

/// Answers every request with its own canonical form.
struct EchoFlow;

#[async_trait]
impl RequestFlow for EchoFlow {
    async fn handle(&self, route: Arc<RouteDescriptor>, request: CanonicalRequest, reply: Reply) {
        match serde_json::to_value(&request) {
            Ok(request) => reply.succeed(CanonicalResponse::ok(json!({
                "route": route.url(),
                "request": request,
            }))),
            Err(e) => reply.fail(FlowError::other(e)),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    match args.command {
        Some(Commands::Validate { config }) => validate_config_command(&config).await,
        Some(Commands::Init { config }) => init_config_command(&config).await,
        Some(Commands::Serve { config }) => serve_command(&config).await,
        None => serve_command(&args.config).await,
    }
}

async fn serve_command(config_path: &str) -> Result<()> {
    let config = load_config(config_path).await?;

    tracing_setup::init_tracing(&config.logging)?;
    metrics::init_metrics()?;

    let mut adapter = HttpAdapter::new(&config)?;
    adapter.set_request_flow(EchoFlow)?;

    let name = adapter.name().to_string();
    let addr = adapter
        .start()
        .instrument(tracing_setup::create_lifecycle_span(&name, "start"))
        .await
        .wrap_err("Failed to start adapter")?;
    tracing::info!(
        "Serving {} route(s) on http://{}",
        adapter.loaded_routes().len(),
        addr
    );

    let reason = wait_for_signal().await?;
    tracing::info!("Shutdown signal received: {:?}", reason);

    adapter
        .stop()
        .instrument(tracing_setup::create_lifecycle_span(&name, "stop"))
        .await
        .wrap_err("Failed to stop adapter")?;
    tracing::info!("Graceful shutdown completed");

    tracing_setup::shutdown_tracing();
    Ok(())
}

/// Validate configuration file and exit
async fn validate_config_command(config_path: &str) -> Result<()> {
    println!("🔍 Validating configuration file: {config_path}");

    if !Path::new(config_path).exists() {
        eprintln!("❌ Error: Configuration file '{config_path}' not found");
        std::process::exit(1);
    }

    let config = match load_config_unchecked(config_path).await {
        Ok(config) => {
            println!("✅ Configuration parsing: OK");
            config
        }
        Err(e) => {
            eprintln!("❌ Configuration parsing failed:");
            eprintln!("   {e:#}");
            std::process::exit(1);
        }
    };

    match AdapterConfigValidator::validate(&config) {
        Ok(()) => {
            println!("✅ Configuration validation: OK");
            println!();
            println!("📋 Configuration Summary:");
            println!("   • Adapter Name: {}", config.name);
            println!("   • Listen Address: {}", config.listen_addr);
            println!("   • Exit Code Header: {}", config.exit_code_header);
            println!("   • Routes: {}", config.routes.len());
            println!();
            println!("🎉 Configuration is valid and ready to use!");
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ Configuration validation failed:");
            eprintln!("{e}");
            println!();
            println!("💡 Common fixes:");
            println!("   • Ensure every route url starts with '/'");
            println!("   • Give every route at least one method");
            println!("   • Verify listen address format (e.g., '127.0.0.1:3000')");
            std::process::exit(1);
        }
    }
}

/// Initialize a new configuration file
async fn init_config_command(config_path: &str) -> Result<()> {
    let path = Path::new(config_path);
    if path.exists() {
        eprintln!("❌ Error: Configuration file '{config_path}' already exists");
        std::process::exit(1);
    }

    tokio::fs::write(path, DEFAULT_CONFIG_TOML)
        .await
        .wrap_err("Failed to write config file")?;
    println!("✅ Created default configuration at: {config_path}");
    println!("   Run 'axon-adapter serve --config {config_path}' to start the adapter");
    Ok(())
}
