use crate::database::{Location, NewRun, Run};
use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt;

/// The request body of the create and update endpoints
/// Every field is optional at the JSON level so that missing fields can be reported by name, and so that updates
/// can leave fields out.
#[derive(Debug, Default)]
pub struct RunPayload {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub started_on: Option<NaiveDateTime>,
    pub completed_on: Option<NaiveDateTime>,
    pub miles: Option<i32>,
    pub location: Option<Location>,
    pub version: Option<i32>,
}

#[derive(Debug, Eq, PartialEq)]
pub struct InvalidRun(String);

impl fmt::Display for InvalidRun {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Error for InvalidRun {}

impl InvalidRun {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Remove a field from the body and deserialize it, treating `null` the same as a missing field
fn take_field<T: DeserializeOwned>(
    fields: &mut Map<String, Value>,
    name: &str,
) -> Result<Option<T>, InvalidRun> {
    match fields.remove(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|err| InvalidRun(format!("{name} is invalid: {err}"))),
    }
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, InvalidRun> {
    value.ok_or_else(|| InvalidRun(format!("{field} is required")))
}

/// Check the invariants shared by new and updated runs
fn validate(
    title: &str,
    started_on: NaiveDateTime,
    completed_on: NaiveDateTime,
    miles: i32,
) -> Result<(), InvalidRun> {
    if title.trim().is_empty() {
        return Err(InvalidRun("title must not be blank".to_owned()));
    }
    if miles <= 0 {
        return Err(InvalidRun("miles must be positive".to_owned()));
    }
    if completed_on < started_on {
        return Err(InvalidRun(
            "completedOn must not be before startedOn".to_owned(),
        ));
    }
    Ok(())
}

impl RunPayload {
    /// Read the payload from a JSON body, naming the first field whose value has the wrong shape
    /// Unknown fields are ignored.
    pub fn from_json(body: Value) -> Result<Self, InvalidRun> {
        let Value::Object(mut fields) = body else {
            return Err(InvalidRun("request body must be a JSON object".to_owned()));
        };
        Ok(Self {
            id: take_field(&mut fields, "id")?,
            title: take_field(&mut fields, "title")?,
            started_on: take_field(&mut fields, "startedOn")?,
            completed_on: take_field(&mut fields, "completedOn")?,
            miles: take_field(&mut fields, "miles")?,
            location: take_field(&mut fields, "location")?,
            version: take_field(&mut fields, "version")?,
        })
    }

    /// Convert the payload into a run to create
    pub fn into_new_run(self) -> Result<NewRun, InvalidRun> {
        let new_run = NewRun {
            id: self.id,
            title: required(self.title, "title")?,
            started_on: required(self.started_on, "startedOn")?,
            completed_on: required(self.completed_on, "completedOn")?,
            miles: required(self.miles, "miles")?,
            location: required(self.location, "location")?,
            version: self.version,
        };
        validate(
            &new_run.title,
            new_run.started_on,
            new_run.completed_on,
            new_run.miles,
        )?;
        Ok(new_run)
    }

    /// Apply the payload on top of an existing run
    /// The id and version always come from the existing run. Other fields come from the payload, falling back to the
    /// existing values for fields the payload leaves out.
    pub fn merge_into(self, existing: Run) -> Result<Run, InvalidRun> {
        let merged = Run {
            id: existing.id,
            version: existing.version,
            title: self.title.unwrap_or(existing.title),
            started_on: self.started_on.unwrap_or(existing.started_on),
            completed_on: self.completed_on.unwrap_or(existing.completed_on),
            miles: self.miles.unwrap_or(existing.miles),
            location: self.location.unwrap_or(existing.location),
        };
        validate(
            &merged.title,
            merged.started_on,
            merged.completed_on,
            merged.miles,
        )?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn existing() -> Run {
        Run {
            id: 1,
            title: "Morning Run".to_owned(),
            started_on: "2024-01-01T06:00:00".parse().unwrap(),
            completed_on: "2024-01-01T07:00:00".parse().unwrap(),
            miles: 5,
            location: Location::Indoor,
            version: Some(2),
        }
    }

    fn parse(json: &str) -> RunPayload {
        RunPayload::from_json(serde_json::from_str(json).unwrap()).unwrap()
    }

    fn parse_err(json: &str) -> String {
        RunPayload::from_json(serde_json::from_str(json).unwrap())
            .unwrap_err()
            .to_string()
    }

    #[test]
    fn test_into_new_run() {
        let new_run = parse(
            r#"{
  "title": "Evening Jog",
  "startedOn": "2024-01-01T18:00:00",
  "completedOn": "2024-01-01T18:30:00",
  "miles": 3,
  "location": "OUTDOOR"
}"#,
        )
        .into_new_run()
        .unwrap();

        assert_eq!(new_run.id, None);
        assert_eq!(new_run.version, None);
        assert_eq!(new_run.title, "Evening Jog");
        assert_eq!(new_run.location, Location::Outdoor);
    }

    #[test]
    fn test_from_json_names_bad_field() {
        assert_eq!(
            parse_err(r#"{"title": "Evening Jog", "location": "SIDEWAYS"}"#),
            "location is invalid: unknown variant `SIDEWAYS`, expected `INDOOR` or `OUTDOOR`"
        );
        assert!(parse_err(r#"{"miles": "five"}"#).starts_with("miles is invalid: "));
        assert!(parse_err(r#"{"startedOn": "yesterday"}"#).starts_with("startedOn is invalid: "));
        assert_eq!(parse_err("[]"), "request body must be a JSON object");
    }

    #[test]
    fn test_from_json_null_is_missing() {
        let payload = parse(r#"{"title": null, "miles": 3, "unknown": true}"#);
        assert_eq!(payload.title, None);
        assert_eq!(payload.miles, Some(3));
    }

    #[test]
    fn test_into_new_run_missing_field() {
        let payload = parse(r#"{"title": "Evening Jog", "miles": 3, "location": "OUTDOOR"}"#);
        assert_eq!(
            payload.into_new_run().unwrap_err().to_string(),
            "startedOn is required"
        );
    }

    #[test]
    fn test_invalid_fields() {
        let new_run = existing();
        let make_payload = || RunPayload {
            title: Some(new_run.title.clone()),
            started_on: Some(new_run.started_on),
            completed_on: Some(new_run.completed_on),
            miles: Some(new_run.miles),
            location: Some(new_run.location),
            ..RunPayload::default()
        };

        let blank_title = RunPayload {
            title: Some("  ".to_owned()),
            ..make_payload()
        };
        assert_eq!(
            blank_title.into_new_run().unwrap_err().to_string(),
            "title must not be blank"
        );

        let no_miles = RunPayload {
            miles: Some(0),
            ..make_payload()
        };
        assert_eq!(
            no_miles.into_new_run().unwrap_err().to_string(),
            "miles must be positive"
        );

        let backwards = RunPayload {
            completed_on: Some("2024-01-01T05:00:00".parse().unwrap()),
            ..make_payload()
        };
        assert_eq!(
            backwards.into_new_run().unwrap_err().to_string(),
            "completedOn must not be before startedOn"
        );

        assert!(make_payload().into_new_run().is_ok());
    }

    #[test]
    fn test_merge_preserves_id_and_version() {
        let payload = parse(
            r#"{
  "id": 99,
  "version": 42,
  "title": "Updated Run",
  "startedOn": "2024-01-02T06:00:00",
  "completedOn": "2024-01-02T07:30:00",
  "miles": 7,
  "location": "OUTDOOR"
}"#,
        );

        let merged = payload.merge_into(existing()).unwrap();
        assert_eq!(
            merged,
            Run {
                id: 1,
                title: "Updated Run".to_owned(),
                started_on: "2024-01-02T06:00:00".parse().unwrap(),
                completed_on: "2024-01-02T07:30:00".parse().unwrap(),
                miles: 7,
                location: Location::Outdoor,
                version: Some(2),
            }
        );
    }

    #[test]
    fn test_merge_partial_payload() {
        let payload = parse(r#"{"title": "Updated Run", "miles": 7, "location": "OUTDOOR"}"#);

        let merged = payload.merge_into(existing()).unwrap();
        assert_eq!(merged.title, "Updated Run");
        assert_eq!(merged.miles, 7);
        assert_eq!(merged.location, Location::Outdoor);
        assert_eq!(merged.started_on, existing().started_on);
        assert_eq!(merged.completed_on, existing().completed_on);
    }

    #[test]
    fn test_merge_validates_result() {
        let payload = parse(r#"{"completedOn": "2024-01-01T05:00:00"}"#);
        assert_matches!(payload.merge_into(existing()), Err(InvalidRun(_)));
    }
}
