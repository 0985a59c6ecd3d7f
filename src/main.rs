use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;

use state_hub::config::HubConfig;
use state_hub::{logging, server, Event, HubClient};

#[derive(Parser)]
#[command(name = "state-hub")]
#[command(about = "Real-time device state hub with WebSocket fan-out and REST ingestion", version)]
#[command(after_help = "Endpoints:
   GET  /api/status     devices known, subscribers connected
   GET  /api/data       current device state
   POST /api/data       {\"device_id\": ..., \"value\": ...}
   POST /api/control    {\"target\": ..., \"command\": ..., \"args\": {...}}
   GET  /ws             bidirectional stream (telemetry, ping, control)

Configuration is read from HUB_HOST, HUB_PORT, HUB_OUTBOUND_BUFFER and RUST_LOG
(a .env file is honoured); flags override the environment.")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the hub server
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,

        /// Frames queued per subscriber
        #[arg(long)]
        buffer: Option<usize>,
    },

    /// Connect to a running hub and print every event it sends
    Tail {
        #[arg(short, long, default_value = "ws://127.0.0.1:8000/ws")]
        url: String,
    },
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = HubConfig::from_env()?;
    let _guard = logging::init(&config.log_filter)?;

    let command = cli.command.unwrap_or(Commands::Serve {
        host: None,
        port: None,
        buffer: None,
    });

    match command {
        Commands::Serve { host, port, buffer } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(buffer) = buffer {
                config.outbound_buffer = buffer;
            }

            println!(
                "{}",
                format!("🌐 Starting state hub on port {}...", config.port)
                    .cyan()
                    .bold()
            );
            server::start(config).await?;
        }

        Commands::Tail { url } => {
            let mut client = HubClient::connect(&url).await?;
            println!("{} Connected to {}", "✓".green(), client.url().as_str().bright_blue());

            while let Some(event) = client.next_event().await? {
                print_event(&event)?;
            }
            println!("{}", "Stream closed by hub".yellow());
        }
    }

    Ok(())
}

fn print_event(event: &Event) -> Result<()> {
    let time = event.timestamp().format("%H:%M:%S%.3f");
    let kind = match event {
        Event::DataUpdate { .. } => event.kind().green(),
        Event::Control { .. } => event.kind().bright_yellow(),
        Event::Error { .. } => event.kind().red(),
        _ => event.kind().bright_cyan(),
    };
    println!(
        "{} {} {}",
        format!("[{}]", time).bright_black(),
        kind.bold(),
        serde_json::to_string(event)?
    );
    Ok(())
}
