mod config;
mod criteria;
mod extract;
mod fetch;
mod model;
mod monitor;
mod normalize;
mod notify;
mod seen;

use clap::{Parser, Subcommand};

use config::Config;
use notify::TelegramNotifier;
use seen::SeenStore;

#[derive(Parser)]
#[command(name = "wohnmon", about = "Berlin housing monitor: polls the state-owned portals and notifies on new matches")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// One full monitoring pass: fetch, extract, dedup, evaluate, notify
    Run {
        /// Evaluate and print matches without notifying or persisting
        #[arg(long)]
        dry_run: bool,
    },
    /// Seen-set size and last update
    Stats,
    /// List the configured sources
    Sources,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let cfg = Config::from_env();

    match cli.command {
        Commands::Run { dry_run } => {
            let extractors = extract::default_extractors();
            let notifier =
                TelegramNotifier::new(cfg.telegram_token.clone(), cfg.telegram_chat_id.clone());
            if !dry_run && !notifier.is_configured() {
                println!("Note: TELEGRAM_BOT_TOKEN / TELEGRAM_CHAT_ID not set, matches will only be logged.");
            }

            let mut store = SeenStore::load(&cfg.state_path);
            println!(
                "Checking {} sources ({} fingerprints already seen)...",
                extractors.len(),
                store.len()
            );

            let report =
                monitor::run(&cfg.criteria, &extractors, &notifier, &mut store, dry_run).await;

            println!(
                "Scan complete: {} listings checked, {} new matches, {} notifications sent.",
                report.checked, report.new_matches, report.notified
            );
        }
        Commands::Stats => {
            let store = SeenStore::load(&cfg.state_path);
            println!("State file: {}", cfg.state_path.display());
            println!("Seen fingerprints: {}", store.len());
            match SeenStore::last_updated(&cfg.state_path) {
                Some(ts) => println!("Last updated: {}", ts),
                None => println!("Last updated: never"),
            }
        }
        Commands::Sources => {
            for extractor in extract::default_extractors() {
                println!("{}", extractor.source());
            }
        }
    }

    Ok(())
}
