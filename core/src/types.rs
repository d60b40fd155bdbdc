//! Domain DTOs for the client/project/task record store.
//!
//! # Design
//! These types mirror the backend's record schema but are defined
//! independently from the mock-store crate; the integration tests catch
//! schema drift. Two normalizations happen at this boundary rather than in
//! downstream code:
//!
//! - `ProjectId` accepts both a JSON number and a numeric string, because
//!   the source data carries both representations of the same id.
//! - A running timer is a structured optional `ActiveTimer` field, never a
//!   serialized JSON blob inside a string field.
//!
//! Durations are integer milliseconds in `u64` throughout. Accumulating
//! tracked time must be exact; floating point would drift across many
//! additions.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::error::StoreError;

/// Canonical numeric project identifier.
///
/// Deserializes from either a JSON number or a numeric string; anything
/// else is rejected at the model boundary so aggregation code can compare
/// ids with plain equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ProjectId(pub i64);

impl From<i64> for ProjectId {
    fn from(raw: i64) -> Self {
        ProjectId(raw)
    }
}

impl FromStr for ProjectId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(ProjectId)
            .map_err(|_| StoreError::Validation(format!("unparsable project id: {s:?}")))
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for ProjectId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(i64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Num(n) => Ok(ProjectId(n)),
            Raw::Text(s) => s
                .parse()
                .map_err(|_| de::Error::custom(format!("unparsable project id: {s:?}"))),
        }
    }
}

/// An in-progress time-tracking session attached to a task.
///
/// Exists only while the timer is running; cleared when it stops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveTimer {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "startTime")]
    pub start_time: DateTime<Utc>,
}

/// A task record as stored in the `task` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    /// Status vocabulary: "todo", "in-progress", "done"; the backend may
    /// extend it, so this stays a plain string.
    #[serde(default)]
    pub status: String,
    #[serde(rename = "dueDate", default)]
    pub due_date: Option<NaiveDate>,
    /// Accumulated tracked time in milliseconds.
    #[serde(rename = "totalTime", default)]
    pub total_time: u64,
    /// Present only while a timer is running; at most one per task.
    #[serde(rename = "activeTimer", default)]
    pub active_timer: Option<ActiveTimer>,
    #[serde(rename = "projectId", default)]
    pub project_id: Option<ProjectId>,
}

impl Task {
    /// Display title, falling back across the record's name fields.
    pub fn display_title(&self) -> String {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Task {}", self.id))
    }

    pub fn has_active_timer(&self) -> bool {
        self.active_timer.is_some()
    }
}

/// A completed timer session. Emitted by `TimerService::stop`; not durably
/// persisted — the backend has no time-log collection, only the task's
/// accumulated total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeLogEntry {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "startTime")]
    pub start_time: DateTime<Utc>,
    #[serde(rename = "endTime")]
    pub end_time: DateTime<Utc>,
    /// `end_time - start_time`, clamped to zero under clock skew.
    pub duration_ms: u64,
    /// Calendar date of the start instant.
    pub date: NaiveDate,
}
