use clap::Parser;

/// Periodically scrape headlines from configured news sites into a database.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the JSON source configuration
    #[arg(short, long, default_value = "config.json")]
    pub config: String,

    /// Database connection URL (postgresql://... or sqlite:...); overrides the config file
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Run a single cycle immediately and exit
    #[arg(long)]
    pub once: bool,
}
