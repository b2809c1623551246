//! hug: huginn admin CLI
//!
//! Inspect and maintain the cache of a running hugd.

use clap::{Parser, Subcommand};
use huginn::client::AdminClient;
use huginn::server::convert::EntryView;

/// Huginn admin CLI
#[derive(Parser)]
#[command(name = "hug")]
#[command(version = huginn::PKG_VERSION)]
#[command(about = "Huginn caching proxy admin client")]
struct Args {
    /// Admin listener address
    #[arg(
        short,
        long,
        env = "HUG_ADDRESS",
        default_value = "http://127.0.0.1:8081"
    )]
    address: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check daemon health
    Health,

    /// Show the most popular entries
    Top {
        #[arg(default_value_t = 10)]
        n: usize,
    },

    /// Show the least popular entries
    Bottom {
        #[arg(default_value_t = 10)]
        n: usize,
    },

    /// List every cached entry
    All {
        /// Print payloads as well
        #[arg(short, long)]
        payload: bool,
    },

    /// Show the daemon's effective settings
    Settings,

    /// Delete every cached entry
    Clean,

    /// Re-fetch every cached key from upstream
    Refresh,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let client = AdminClient::new(&args.address);

    match args.command {
        Command::Health => {
            let health = client.health().await?;
            println!("hugd {}", health.version);
            println!("status:  {:?}", health.status);
            println!("storage: {}", health.storage);
            if let Some(error) = health.error {
                println!("error:   {error}");
            }
        }

        Command::Top { n } => print_stats(&client.top(n).await?),

        Command::Bottom { n } => print_stats(&client.bottom(n).await?),

        Command::All { payload } => {
            let entries = client.entries().await?;
            if entries.is_empty() {
                println!("cache is empty");
            }
            for entry in &entries {
                println!(
                    "{} [{}] refreshed {}",
                    entry.key,
                    entry.status_code,
                    entry.refreshed_at.to_rfc3339()
                );
                if payload {
                    println!("  {}", entry.payload);
                }
            }
        }

        Command::Settings => {
            for setting in client.settings().await? {
                println!("{}: {}", setting.name, setting.value);
            }
        }

        Command::Clean => {
            client.clean().await?;
            println!("cache cleaned");
        }

        Command::Refresh => {
            let report = client.refresh().await?;
            println!("refreshed {} entries", report.refreshed);
            for key in &report.failed {
                println!("failed: {key}");
            }
        }
    }

    Ok(())
}

/// Print popularity statistics, one entry per line.
fn print_stats(entries: &[EntryView]) {
    if entries.is_empty() {
        println!("cache is empty");
        return;
    }
    for entry in entries {
        let last = entry
            .last_accessed_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "never".to_string());
        println!("{:>8}  {}  (last access {last})", entry.access_count, entry.key);
    }
}
