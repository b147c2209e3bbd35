//! Chat relay server.
//!
//! Serves the relay over HTTP, or handles a single proxy event read from a
//! file or stdin and prints the proxy response.

use chatrelay_server::{
    ChatService, ProxyEvent, RelayConfig, handle_event, init_observability, serve,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Command-line arguments for the chat relay.
#[derive(Parser, Debug)]
#[command(name = "chatrelay-server")]
#[command(about = "Stateless chat relay in front of a text-generation backend")]
#[command(version)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true, env = "CHATRELAY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the relay over HTTP (default)
    Serve {
        /// Override the bind address, e.g. 127.0.0.1:3000
        #[arg(long)]
        bind: Option<String>,
    },
    /// Handle one proxy event and print the proxy response
    Invoke {
        /// Event JSON file; stdin when omitted
        #[arg(long)]
        event: Option<PathBuf>,
        /// ARN of the invoked function, used for region logging
        #[arg(long, env = "CHATRELAY_FUNCTION_ARN")]
        function_arn: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Failed to load .env: {}", e);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    info!(config_file = ?args.config, "Loading configuration");
    let mut config = RelayConfig::load(args.config.as_deref())?;

    if let Err(e) = init_observability("chatrelay", 60) {
        warn!(error = %e, "Metrics disabled");
    }

    match args.command.unwrap_or(Command::Serve { bind: None }) {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            serve(&config).await?;
        }
        Command::Invoke {
            event,
            function_arn,
        } => {
            let event = match event {
                Some(path) => ProxyEvent::from_file(path)?,
                None => ProxyEvent::from_reader(std::io::stdin().lock())?,
            };
            let service = ChatService::from_config(&config)?;
            let response = handle_event(&service, event, function_arn.as_deref()).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
