//! Calendar actions and the validator that turns a model reply into
//! them.
//!
//! The model is asked for strict JSON of the shape
//! `{"actions": [{"type": "create", "title": ..., "start": ..., ...}]}`.
//! Optional fields the model leaves out are filled in here rather
//! than rejecting the whole batch:
//!
//! - `end` defaults to one hour after `start`
//! - `location` defaults to an empty string
//! - `repeat` defaults to `none`
//! - `count` defaults to 1

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, Offset, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::ExtractionError;

/// Length of an event when the model doesn't give an end time
pub const DEFAULT_DURATION_HOURS: i64 = 1;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum ActionType {
    #[serde(rename = "create")]
    Create,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Repeat {
    #[default]
    None,
    Daily,
    Weekly,
}

/// A single requested calendar entry with every default applied
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Action {
    pub r#type: ActionType,
    pub title: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub location: String,
    pub repeat: Repeat,
    // Ignored by consumers when `repeat` is `none`
    pub count: u32,
}

/// Actions in the order the model returned them
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct ActionBatch {
    pub actions: Vec<Action>,
}

// An action as the model wrote it. Every field is optional here so
// that missing fields can be reported or defaulted explicitly.
#[derive(Deserialize, Debug)]
struct RawAction {
    r#type: Option<ActionType>,
    title: Option<String>,
    start: Option<String>,
    end: Option<String>,
    location: Option<String>,
    repeat: Option<Repeat>,
    count: Option<i64>,
}

/// Checks the raw text returned by the model and converts it into an
/// `ActionBatch`. Timestamps without an offset are read in
/// `timezone`.
#[derive(Clone, Debug)]
pub struct ResponseValidator {
    timezone: Tz,
}

impl ResponseValidator {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub fn validate(&self, raw: &str) -> Result<ActionBatch, ExtractionError> {
        // Strict JSON only, a markdown fence around the reply is
        // treated the same as any other non-JSON text
        let value: Value = serde_json::from_str(raw.trim())
            .map_err(|e| ExtractionError::MalformedResponse(e.to_string()))?;

        let items = value
            .get("actions")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                ExtractionError::SchemaViolation(
                    "Missing 'actions' list in JSON output".to_string(),
                )
            })?;

        let actions = items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                self.fill_defaults(item).map_err(|msg| {
                    ExtractionError::SchemaViolation(format!("action {}: {}", idx, msg))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ActionBatch { actions })
    }

    fn fill_defaults(&self, item: &Value) -> Result<Action, String> {
        let raw = RawAction::deserialize(item).map_err(|e| e.to_string())?;

        let r#type = raw.r#type.ok_or("missing field `type`")?;
        let title = raw.title.ok_or("missing field `title`")?;
        let start = raw
            .start
            .ok_or("missing field `start`")
            .map_err(String::from)
            .and_then(|start| self.parse_timestamp("start", &start))?;
        let end = match raw.end {
            Some(end) => self.parse_timestamp("end", &end)?,
            None => start + Duration::hours(DEFAULT_DURATION_HOURS),
        };
        let count = match raw.count {
            None => 1,
            Some(count) if count >= 1 => {
                u32::try_from(count).map_err(|_| format!("count {} is too large", count))?
            }
            Some(count) => return Err(format!("count must be at least 1, got {}", count)),
        };

        Ok(Action {
            r#type,
            title,
            start,
            end,
            location: raw.location.unwrap_or_default(),
            repeat: raw.repeat.unwrap_or_default(),
            count,
        })
    }

    fn parse_timestamp(&self, field: &str, value: &str) -> Result<DateTime<FixedOffset>, String> {
        let value = value.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
            return Ok(ts);
        }
        if let Ok(ts) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z") {
            return Ok(ts);
        }

        // No offset so it's a wall clock time in the configured zone
        let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
            .map_err(|_| format!("{} is not an ISO-8601 timestamp: {:?}", field, value))?;
        let local = self
            .timezone
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(|| {
                format!(
                    "{} {:?} does not exist in {}",
                    field,
                    value,
                    self.timezone.name()
                )
            })?;

        Ok(local.with_timezone(&local.offset().fix()))
    }
}
