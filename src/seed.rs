use crate::database::{NewRun, RunRepository};
use anyhow::{Context, Result};
use log::info;
use serde::Deserialize;
use std::fs::read_to_string;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedFile {
    runs: Vec<NewRun>,
}

/// Load the runs in a JSON seed file into the store, but only if the store is empty
/// Returns the number of runs loaded.
pub fn seed_runs(store: &mut dyn RunRepository, path: &Path) -> Result<usize> {
    if store.count()? > 0 {
        info!("Not loading runs from {} because the database already contains runs", path.display());
        return Ok(0);
    }

    let json = read_to_string(path)
        .with_context(|| format!("Failed to read seed file {}", path.display()))?;
    let seed: SeedFile = serde_json::from_str(&json)
        .with_context(|| format!("Failed to deserialize JSON seed file {}", path.display()))?;
    let runs = store.save_all(seed.runs)?;
    info!("Loaded {} runs from {}", runs.len(), path.display());
    Ok(runs.len())
}
