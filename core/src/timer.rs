//! Task timer start/stop arithmetic.
//!
//! # Design
//! One `TimerService` instance wraps the injected store and notifier. The
//! clock is a trait so tests drive time by hand; elapsed-duration math is
//! exact integer milliseconds end to end.
//!
//! Policy decisions:
//! - `start` on a task that already has a running timer is rejected with
//!   `InvalidState` — overwriting would silently lose tracked time.
//! - `stop` clamps the duration to zero when the recorded start instant is
//!   in the future (clock skew); it never reports a negative duration.
//! - `stop` persists the new total and the cleared timer in a single update
//!   request, so the caller sees the two changes land together.
//!
//! Failures surface as `Err` and as an error notification; timer state is
//! never silently defaulted. There is no cross-call locking: concurrent
//! start/stop on one task is read-modify-write, last write wins.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::StoreError;
use crate::store::{collections, Notifier, RecordStore, TASK_FIELDS};
use crate::types::{ActiveTimer, Task, TimeLogEntry};

/// Source of the current instant.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Starts and stops task timers against the record store.
pub struct TimerService<S, N, C = SystemClock> {
    store: S,
    notifier: N,
    clock: C,
}

impl<S: RecordStore, N: Notifier> TimerService<S, N> {
    pub fn new(store: S, notifier: N) -> Self {
        Self {
            store,
            notifier,
            clock: SystemClock,
        }
    }
}

impl<S: RecordStore, N: Notifier, C: Clock> TimerService<S, N, C> {
    pub fn with_clock(store: S, notifier: N, clock: C) -> Self {
        Self {
            store,
            notifier,
            clock,
        }
    }

    /// Start a timer on the task. Fails with `NotFound` if the task does
    /// not exist and `InvalidState` if a timer is already running.
    pub fn start(&self, task_id: i64) -> Result<ActiveTimer, StoreError> {
        match self.start_inner(task_id) {
            Ok(timer) => {
                self.notifier.notify_success("Timer started");
                Ok(timer)
            }
            Err(err) => {
                self.notifier
                    .notify_error(&format!("Failed to start timer: {err}"));
                Err(err)
            }
        }
    }

    /// Stop the task's running timer, fold the elapsed duration into its
    /// accumulated total, and return the completed session.
    ///
    /// The returned `TimeLogEntry` is ephemeral: the backend has no
    /// time-log collection, only the task's running total survives.
    pub fn stop(&self, task_id: i64) -> Result<TimeLogEntry, StoreError> {
        match self.stop_inner(task_id) {
            Ok(entry) => {
                self.notifier.notify_success("Timer stopped");
                Ok(entry)
            }
            Err(err) => {
                self.notifier
                    .notify_error(&format!("Failed to stop timer: {err}"));
                Err(err)
            }
        }
    }

    fn start_inner(&self, task_id: i64) -> Result<ActiveTimer, StoreError> {
        let task = self.fetch_task(task_id)?;
        if task.active_timer.is_some() {
            return Err(StoreError::InvalidState("timer already running"));
        }

        let now = self.clock.now();
        let timer = ActiveTimer {
            id: now.timestamp_millis(),
            start_time: now,
        };

        let patch = serde_json::json!({ "Id": task.id, "activeTimer": timer });
        self.store.update(collections::TASK, vec![patch])?;
        Ok(timer)
    }

    fn stop_inner(&self, task_id: i64) -> Result<TimeLogEntry, StoreError> {
        let task = self.fetch_task(task_id)?;
        let timer = task
            .active_timer
            .clone()
            .ok_or(StoreError::InvalidState("no active timer"))?;

        let now = self.clock.now();
        // Clamp: a start instant ahead of `now` must not produce a negative
        // duration.
        let duration_ms = (now - timer.start_time).num_milliseconds().max(0) as u64;
        let new_total = task.total_time.saturating_add(duration_ms);

        let entry = TimeLogEntry {
            id: now.timestamp_millis(),
            start_time: timer.start_time,
            end_time: now,
            duration_ms,
            date: timer.start_time.date_naive(),
        };

        // Total and cleared timer travel in one update request.
        let patch = serde_json::json!({
            "Id": task.id,
            "activeTimer": Value::Null,
            "totalTime": new_total,
        });
        self.store.update(collections::TASK, vec![patch])?;
        Ok(entry)
    }

    fn fetch_task(&self, task_id: i64) -> Result<Task, StoreError> {
        let record = self
            .store
            .fetch_by_id(collections::TASK, task_id, TASK_FIELDS)?;
        serde_json::from_value(record).map_err(|e| StoreError::Deserialization(e.to_string()))
    }
}
