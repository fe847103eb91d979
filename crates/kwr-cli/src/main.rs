mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "kwr")]
#[command(about = "Keyword research aggregator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Aggregate keywords for a seed term from every source
    Research {
        /// Seed term, e.g. "mime types"
        term: String,
        /// Print single-line JSON instead of pretty-printed
        #[arg(long)]
        compact: bool,
    },
    /// Fetch paid metrics for up to 100 keywords
    Enrich {
        #[arg(required = true, num_args = 1..)]
        keywords: Vec<String>,
        #[arg(long)]
        compact: bool,
    },
    /// Print the loaded configuration with secrets redacted
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = kwr_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Research { term, compact } => {
            commands::run_research(&config, &term, compact).await?;
        }
        Commands::Enrich { keywords, compact } => {
            commands::run_enrich(&config, &keywords, compact).await?;
        }
        Commands::Config => println!("{config:#?}"),
    }

    Ok(())
}

#[cfg(test)]
mod tests;
