//! Wire representation of a task
//!
//! Dates travel as RFC 3339 strings. Normalizing a [`WireTask`] parses them
//! back into timestamps.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::model::{Priority, Task};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTask {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub due_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}

impl From<&Task> for WireTask {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            title: task.title.clone(),
            description: task.description.clone(),
            notes: task.notes.clone(),
            priority: task.priority,
            completed: task.completed,
            due_date: task.due_date.as_ref().map(format_timestamp),
            created_at: format_timestamp(&task.created_at),
            updated_at: format_timestamp(&task.updated_at),
        }
    }
}

impl From<Task> for WireTask {
    fn from(task: Task) -> Self {
        Self::from(&task)
    }
}

impl TryFrom<WireTask> for Task {
    type Error = Error;

    fn try_from(wire: WireTask) -> Result<Self> {
        let due_date = match wire.due_date.as_deref() {
            Some(raw) if !raw.is_empty() => Some(parse_timestamp(raw)?),
            _ => None,
        };

        Ok(Task {
            id: wire.id,
            title: wire.title,
            description: wire.description,
            notes: wire.notes,
            priority: wire.priority,
            completed: wire.completed,
            due_date,
            created_at: parse_timestamp(&wire.created_at)?,
            updated_at: parse_timestamp(&wire.updated_at)?,
        })
    }
}

impl WireTask {
    /// Convert into a [`Task`], parsing the date strings
    pub fn normalize(self) -> Result<Task> {
        Task::try_from(self)
    }
}
