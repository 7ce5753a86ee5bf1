use super::models::{Location, NewRun, RawRun, Run};
use super::{DuplicateRun, RunRepository};
use crate::schema::run;
use anyhow::{anyhow, bail, Context, Result};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::{BigInt, Integer, Nullable, Text, Timestamp};
use diesel::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::path::Path;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

// Represents the SQL last_insert_rowid() function
diesel::sql_function!(fn last_insert_rowid() -> BigInt);

pub struct Database {
    connection: SqliteConnection,
}

impl Database {
    /// Open the SQLite database at the given path, creating it if necessary
    pub fn open(db_path: &Path) -> Result<Self> {
        let connection = SqliteConnection::establish(&db_path.to_string_lossy())
            .with_context(|| format!("Failed to open SQLite database {}", db_path.display()))?;
        Self::from_connection(connection)
    }

    /// Open a private database that only lives as long as the returned instance
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let connection = SqliteConnection::establish(":memory:")
            .context("Failed to open in-memory SQLite database")?;
        Self::from_connection(connection)
    }

    fn from_connection(mut connection: SqliteConnection) -> Result<Self> {
        // Wait for other processes writing to the same file instead of erroring
        connection
            .batch_execute("PRAGMA busy_timeout = 1000")
            .context("Failed to set busy timeout")?;
        connection
            .run_pending_migrations(MIGRATIONS)
            .map_err(|err| anyhow!("Failed to run SQLite migrations: {err}"))?;
        Ok(Self { connection })
    }
}

/// Insert a single run with hand-written SQL and return it with its final id
fn insert_run(conn: &mut SqliteConnection, new_run: NewRun) -> Result<Run> {
    let inserted = diesel::sql_query(
        "
INSERT INTO run (id, title, started_on, completed_on, miles, location, version)
VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind::<Nullable<BigInt>, _>(new_run.id)
    .bind::<Text, _>(new_run.title.as_str())
    .bind::<Timestamp, _>(new_run.started_on)
    .bind::<Timestamp, _>(new_run.completed_on)
    .bind::<Integer, _>(new_run.miles)
    .bind::<Text, _>(new_run.location.as_str())
    .bind::<Nullable<Integer>, _>(new_run.version)
    .execute(conn);

    let inserted = match inserted {
        Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
            // The primary key is the only unique column
            return Err(DuplicateRun(new_run.id.unwrap_or_default()).into());
        }
        result => result
            .with_context(|| format!("Failed to save run {} to the database", new_run.title))?,
    };
    if inserted != 1 {
        bail!("Failed to create run {}", new_run.title);
    }

    let id = match new_run.id {
        Some(id) => id,
        None => diesel::select(last_insert_rowid())
            .get_result::<i64>(conn)
            .context("Failed to get inserted run id from the database")?,
    };
    Ok(new_run.into_run(id))
}

/// Validate raw rows loaded from the run table
fn into_runs(raw_runs: Vec<RawRun>) -> Result<Vec<Run>> {
    raw_runs.into_iter().map(TryInto::try_into).collect()
}

impl RunRepository for Database {
    fn create(&mut self, new_run: NewRun) -> Result<Run> {
        insert_run(&mut self.connection, new_run)
    }

    fn save_all(&mut self, new_runs: Vec<NewRun>) -> Result<Vec<Run>> {
        self.connection.transaction::<_, anyhow::Error, _>(|conn| {
            new_runs
                .into_iter()
                .map(|new_run| insert_run(conn, new_run))
                .collect()
        })
    }

    fn count(&mut self) -> Result<i64> {
        run::table
            .count()
            .get_result(&mut self.connection)
            .context("Failed to count runs in the database")
    }

    fn find_all(&mut self) -> Result<Vec<Run>> {
        let raw_runs = run::table
            .order(run::id)
            .load::<RawRun>(&mut self.connection)
            .context("Failed to load runs from the database")?;
        into_runs(raw_runs)
    }

    fn find_by_id(&mut self, id: i64) -> Result<Option<Run>> {
        run::table
            .find(id)
            .first::<RawRun>(&mut self.connection)
            .optional()
            .with_context(|| format!("Failed to load run {id} from the database"))?
            .map(TryInto::try_into)
            .transpose()
    }

    fn find_all_by_location(&mut self, location: Location) -> Result<Vec<Run>> {
        let raw_runs = run::table
            .filter(run::location.eq(location.as_str()))
            .order(run::id)
            .load::<RawRun>(&mut self.connection)
            .with_context(|| format!("Failed to load {location} runs from the database"))?;
        into_runs(raw_runs)
    }

    fn update(&mut self, updated: &Run, id: i64) -> Result<bool> {
        let changed = diesel::update(run::table.find(id))
            .set((
                run::title.eq(updated.title.as_str()),
                run::started_on.eq(updated.started_on),
                run::completed_on.eq(updated.completed_on),
                run::miles.eq(updated.miles),
                run::location.eq(updated.location.as_str()),
                run::version.eq(updated.version),
            ))
            .execute(&mut self.connection)
            .with_context(|| format!("Failed to update run {id} in the database"))?;
        Ok(changed > 0)
    }

    fn save(&mut self, saved: &Run) -> Result<()> {
        diesel::replace_into(run::table)
            .values((
                run::id.eq(saved.id),
                run::title.eq(saved.title.as_str()),
                run::started_on.eq(saved.started_on),
                run::completed_on.eq(saved.completed_on),
                run::miles.eq(saved.miles),
                run::location.eq(saved.location.as_str()),
                run::version.eq(saved.version),
            ))
            .execute(&mut self.connection)
            .with_context(|| format!("Failed to save run {} to the database", saved.id))?;
        Ok(())
    }

    fn delete(&mut self, id: i64) -> Result<bool> {
        let deleted = diesel::delete(run::table.find(id))
            .execute(&mut self.connection)
            .with_context(|| format!("Failed to delete run {id} from the database"))?;
        Ok(deleted > 0)
    }
}
