mod cli;
mod config;
mod database;
mod http;
mod schema;
mod seed;

use crate::cli::Cli;
use crate::config::{get_data_dir, Config};
use crate::database::{Database, RunRepository, RunStore};
use actix_web::web::Data;
use anyhow::{Context, Result};
use clap::Parser;
use log::{info, LevelFilter};
use std::fs::create_dir_all;
use std::sync::Mutex;

#[actix_web::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    simple_logger::SimpleLogger::new()
        .with_module_level("actix_server", LevelFilter::Off)
        .with_module_level("mio", LevelFilter::Off)
        .with_level(if cli.quiet {
            LevelFilter::Warn
        } else {
            LevelFilter::Debug
        })
        .init()?;

    let config = Config::load(&cli, &get_data_dir()?)?;

    if let Some(parent) = config.database.parent() {
        create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let mut db = Database::open(&config.database)?;
    info!(
        "Opened database {} containing {} runs",
        config.database.display(),
        db.count()?
    );

    if let Some(seed_path) = &config.seed {
        seed::seed_runs(&mut db, seed_path)?;
    }

    let store: Data<RunStore> = Data::new(Mutex::new(Box::new(db) as Box<dyn RunRepository + Send>));
    http::create_server(store, &config.host, config.port)
        .with_context(|| format!("Failed to bind HTTP server to {}:{}", config.host, config.port))?
        .await
        .context("HTTP server failed")?;

    Ok(())
}
