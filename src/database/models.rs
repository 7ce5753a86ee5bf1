use anyhow::{bail, Error, Result};
use chrono::NaiveDateTime;
use diesel::Queryable;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where a run took place, stored in the database as its uppercase name
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Location {
    Indoor,
    Outdoor,
}

impl Location {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Indoor => "INDOOR",
            Self::Outdoor => "OUTDOOR",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Matching is case-sensitive, the same as the comparison SQLite performs on the stored text
impl FromStr for Location {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "INDOOR" => Ok(Self::Indoor),
            "OUTDOOR" => Ok(Self::Outdoor),
            _ => bail!("Invalid location {value}"),
        }
    }
}

/// A stored run
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub id: i64,
    pub title: String,
    pub started_on: NaiveDateTime,
    pub completed_on: NaiveDateTime,
    pub miles: i32,
    pub location: Location,
    pub version: Option<i32>,
}

/// A run that has not been stored yet
/// When `id` is `None`, the database assigns one.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRun {
    #[serde(default)]
    pub id: Option<i64>,
    pub title: String,
    pub started_on: NaiveDateTime,
    pub completed_on: NaiveDateTime,
    pub miles: i32,
    pub location: Location,
    #[serde(default)]
    pub version: Option<i32>,
}

impl NewRun {
    /// Attach the id the run was stored under
    pub fn into_run(self, id: i64) -> Run {
        Run {
            id,
            title: self.title,
            started_on: self.started_on,
            completed_on: self.completed_on,
            miles: self.miles,
            location: self.location,
            version: self.version,
        }
    }
}

/// A row of the run table before its location has been validated
#[derive(Queryable)]
pub struct RawRun {
    pub id: i64,
    pub title: String,
    pub started_on: NaiveDateTime,
    pub completed_on: NaiveDateTime,
    pub miles: i32,
    pub location: String,
    pub version: Option<i32>,
}

impl TryFrom<RawRun> for Run {
    type Error = Error;

    fn try_from(raw: RawRun) -> Result<Self> {
        Ok(Self {
            location: raw.location.parse()?,
            id: raw.id,
            title: raw.title,
            started_on: raw.started_on,
            completed_on: raw.completed_on,
            miles: raw.miles,
            version: raw.version,
        })
    }
}
