mod db;
mod models;

pub use self::db::Database;
pub use self::models::{Location, NewRun, Run};
use anyhow::Result;
use std::error::Error;
use std::fmt;

/// Persistence operations for runs
///
/// Reads report absence as `None` or an empty list rather than an error. Writes never compare or increment a run's
/// `version`, so the last write to a row wins.
pub trait RunRepository {
    /// Insert a new run, failing if it didn't affect exactly one row
    /// Fails with `DuplicateRun` if a run with the same id already exists.
    fn create(&mut self, new_run: NewRun) -> Result<Run>;

    /// Insert several runs atomically
    fn save_all(&mut self, new_runs: Vec<NewRun>) -> Result<Vec<Run>>;

    /// Return the number of stored runs
    fn count(&mut self) -> Result<i64>;

    fn find_all(&mut self) -> Result<Vec<Run>>;

    fn find_by_id(&mut self, id: i64) -> Result<Option<Run>>;

    fn find_all_by_location(&mut self, location: Location) -> Result<Vec<Run>>;

    /// Overwrite every column of the run with the given id except the id itself
    /// Returns `false` if no run has that id.
    fn update(&mut self, run: &Run, id: i64) -> Result<bool>;

    /// Insert the run or replace the existing run with the same id
    /// This is the full-overwrite update. The HTTP API merges instead, so only tests call it for now.
    #[allow(dead_code)]
    fn save(&mut self, run: &Run) -> Result<()>;

    /// Returns `false` if no run has that id
    fn delete(&mut self, id: i64) -> Result<bool>;
}

/// The run store shared between HTTP workers
pub type RunStore = std::sync::Mutex<Box<dyn RunRepository + Send>>;

/// A run could not be created because its id is already taken
#[derive(Debug)]
pub struct DuplicateRun(pub i64);

impl fmt::Display for DuplicateRun {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Run {} already exists", self.0)
    }
}

impl Error for DuplicateRun {}
