use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(about, version, author)]
pub struct Cli {
    /// HTTP server port
    #[arg(short = 'p', long, env = "PORT")]
    pub port: Option<u16>,

    /// Address to bind the HTTP server to
    #[arg(long)]
    pub host: Option<String>,

    /// Path to the SQLite database file
    #[arg(long, env = "RUNLOG_DATABASE")]
    pub database: Option<PathBuf>,

    /// JSON file of runs to load when the database is empty
    #[arg(long)]
    pub seed: Option<PathBuf>,

    /// Path to a TOML config file
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Log fewer messages
    #[arg(short = 'q', long)]
    pub quiet: bool,
}
