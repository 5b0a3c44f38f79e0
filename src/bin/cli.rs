//! Tipboard CLI
//!
//! Terminal front end over the tip client adapter: list, search, add
//! and remove bookmarks against a running tipboard server.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use tipboard::{
    client::TipClient,
    error::Result,
    models::{Config, Tip},
};

/// Tipboard - bookmark client
#[derive(Parser, Debug)]
#[command(name = "tipboard", version, about = "Tipboard bookmark client")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show every bookmarked tip, newest first
    List,

    /// Search tips by title keyword (blank shows everything)
    Search {
        /// Case-insensitive title substring
        #[arg(default_value = "")]
        keywords: String,
    },

    /// Bookmark a page; the server extracts title, description and image
    Add {
        /// The URL to bookmark
        url: String,
    },

    /// Remove a tip by its id (as shown by list)
    Remove {
        /// Store-assigned tip id
        id: String,
    },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn print_tips(tips: &[Tip]) {
    if tips.is_empty() {
        println!("(no tips)");
        return;
    }
    for tip in tips {
        println!("{}  {}", tip.id, tip.title);
        println!("    {}", tip.url);
        if !tip.description.is_empty() {
            println!("    {}", tip.description);
        }
        if !tip.image.is_empty() {
            println!("    image: {}", tip.image);
        }
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);
    config.validate()?;

    let client = TipClient::new(&config.client)?;
    client.wait_ready(3, Duration::from_millis(500)).await?;

    match cli.command {
        Command::List => {
            let tips = client.all_tips().await?;
            print_tips(&tips);
        }

        Command::Search { keywords } => {
            let tips = client.search_tips(&keywords).await?;
            print_tips(&tips);
        }

        Command::Add { url } => {
            let tip = client.create_tip(&url).await?;
            println!("New tip created!");
            print_tips(&[tip]);
        }

        Command::Remove { id } => {
            let deleted = client.delete_tip(&id).await?;
            println!("Deleted tip {deleted}");
        }
    }

    Ok(())
}
