mod crawl;
mod sites;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "velodb")]
#[command(about = "E-bike listing crawler and snapshot tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Crawl the configured sites and write one snapshot per site
    Crawl {
        /// Restrict the run to a single site key
        #[arg(long)]
        site: Option<String>,
    },
    /// List the configured sites
    Sites,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Crawl { site } => crawl::run(site.as_deref()).await,
        Commands::Sites => sites::run(),
    }
}
