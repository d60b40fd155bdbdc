//! Time-tracking aggregation over task collections.
//!
//! # Design
//! `project_summary` and `overall_summary` are pure folds over an
//! in-memory slice — the caller fetches the collection once and hands it
//! in. The `*_from_store` wrappers do that fetch and fail soft: a
//! presentation layer asking for a summary always gets one, zeroed on
//! failure, with the error routed to the notifier.
//!
//! The backend keeps no per-session log, so entry counts are one per task
//! (the task's running total is the only durable trace of its sessions).

use serde::Serialize;

use crate::store::{fetch_tasks, Notifier, RecordStore};
use crate::types::{ProjectId, Task};

/// Aggregate totals over a set of tasks, with an optional per-task
/// breakdown ordered by descending tracked time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimeTrackingSummary {
    pub total_time_ms: u64,
    pub active_timers: u32,
    pub total_entries: u32,
    pub breakdown: Vec<TaskBreakdown>,
}

/// Per-task statistics within an overall summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskBreakdown {
    pub task_id: i64,
    pub title: String,
    pub project_id: Option<ProjectId>,
    pub total_time_ms: u64,
    pub has_active_timer: bool,
    pub entry_count: u32,
}

/// Totals for the tasks belonging to one project.
///
/// Association compares canonical ids only; `ProjectId` already normalized
/// numeric and string representations at the model boundary, so the number
/// 7 and the string "7" select the same tasks.
pub fn project_summary(tasks: &[Task], project_id: ProjectId) -> TimeTrackingSummary {
    let mut summary = TimeTrackingSummary::default();
    for task in tasks.iter().filter(|t| t.project_id == Some(project_id)) {
        fold_task(&mut summary, task);
    }
    summary
}

/// Global totals plus a breakdown of every task that has tracked time or a
/// running timer, sorted by descending total. The sort is stable, so ties
/// keep their input order.
pub fn overall_summary(tasks: &[Task]) -> TimeTrackingSummary {
    let mut summary = TimeTrackingSummary::default();
    for task in tasks {
        fold_task(&mut summary, task);

        if task.total_time > 0 || task.has_active_timer() {
            summary.breakdown.push(TaskBreakdown {
                task_id: task.id,
                title: task.display_title(),
                project_id: task.project_id,
                total_time_ms: task.total_time,
                has_active_timer: task.has_active_timer(),
                entry_count: 1,
            });
        }
    }

    summary
        .breakdown
        .sort_by(|a, b| b.total_time_ms.cmp(&a.total_time_ms));
    summary
}

fn fold_task(summary: &mut TimeTrackingSummary, task: &Task) {
    summary.total_time_ms = summary.total_time_ms.saturating_add(task.total_time);
    if task.has_active_timer() {
        summary.active_timers += 1;
    }
    summary.total_entries += 1;
}

/// Fetch the task collection and summarize one project. Fail-soft: any
/// store failure yields a zero summary and an error notification.
pub fn project_summary_from_store<S: RecordStore + ?Sized>(
    store: &S,
    notifier: &dyn Notifier,
    project_id: ProjectId,
) -> TimeTrackingSummary {
    match fetch_tasks(store) {
        Ok(tasks) => project_summary(&tasks, project_id),
        Err(err) => {
            notifier.notify_error(&format!("Failed to load time tracking: {err}"));
            TimeTrackingSummary::default()
        }
    }
}

/// Fetch the task collection and summarize everything. Fail-soft, like
/// `project_summary_from_store`.
pub fn overall_summary_from_store<S: RecordStore + ?Sized>(
    store: &S,
    notifier: &dyn Notifier,
) -> TimeTrackingSummary {
    match fetch_tasks(store) {
        Ok(tasks) => overall_summary(&tasks),
        Err(err) => {
            notifier.notify_error(&format!("Failed to load time tracking: {err}"));
            TimeTrackingSummary::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::{AggregateQuery, AggregateValue};
    use crate::types::ActiveTimer;
    use chrono::{TimeZone, Utc};
    use serde_json::Value;
    use std::cell::RefCell;

    fn task(id: i64, total_time: u64, running: bool, project: Option<i64>) -> Task {
        Task {
            id,
            name: None,
            title: Some(format!("Task {id}")),
            priority: None,
            status: "in-progress".to_string(),
            due_date: None,
            total_time,
            active_timer: running.then(|| ActiveTimer {
                id,
                start_time: Utc.with_ymd_and_hms(2026, 8, 1, 9, 0, 0).unwrap(),
            }),
            project_id: project.map(ProjectId),
        }
    }

    #[test]
    fn project_summary_matches_for_numeric_and_string_ids() {
        let tasks = vec![
            task(1, 1_000, false, Some(7)),
            task(2, 2_500, true, Some(7)),
            task(3, 9_000, false, Some(8)),
            task(4, 400, false, None),
        ];

        let from_number = project_summary(&tasks, ProjectId::from(7));
        let from_string = project_summary(&tasks, "7".parse().unwrap());

        assert_eq!(from_number, from_string);
        assert_eq!(from_number.total_time_ms, 3_500);
        assert_eq!(from_number.active_timers, 1);
        assert_eq!(from_number.total_entries, 2);
    }

    #[test]
    fn project_summary_normalizes_string_project_ids_in_records() {
        // Same record, project id as string on the wire.
        let raw = serde_json::json!({
            "Id": 5, "totalTime": 800, "projectId": "7"
        });
        let tasks = vec![serde_json::from_value::<Task>(raw).unwrap()];

        let summary = project_summary(&tasks, ProjectId::from(7));
        assert_eq!(summary.total_time_ms, 800);
    }

    #[test]
    fn overall_breakdown_is_sorted_descending() {
        let tasks = vec![
            task(1, 50, false, None),
            task(2, 200, false, None),
            task(3, 0, false, None), // no time, no timer: excluded
            task(4, 75, false, None),
        ];

        let summary = overall_summary(&tasks);
        let totals: Vec<u64> = summary.breakdown.iter().map(|b| b.total_time_ms).collect();
        assert_eq!(totals, vec![200, 75, 50]);
        assert_eq!(summary.total_time_ms, 325);
        assert_eq!(summary.total_entries, 4);
    }

    #[test]
    fn overall_breakdown_keeps_input_order_on_ties() {
        let tasks = vec![
            task(10, 100, false, None),
            task(11, 100, false, None),
            task(12, 100, false, None),
        ];

        let summary = overall_summary(&tasks);
        let ids: Vec<i64> = summary.breakdown.iter().map(|b| b.task_id).collect();
        assert_eq!(ids, vec![10, 11, 12]);
    }

    #[test]
    fn zero_time_task_with_running_timer_is_included() {
        let tasks = vec![task(1, 0, true, Some(3))];

        let summary = overall_summary(&tasks);
        assert_eq!(summary.breakdown.len(), 1);
        assert!(summary.breakdown[0].has_active_timer);
        assert_eq!(summary.active_timers, 1);
    }

    #[test]
    fn breakdown_title_falls_back_across_name_fields() {
        let raw = serde_json::json!({
            "Id": 6, "Name": "Record name", "totalTime": 10
        });
        let tasks = vec![serde_json::from_value::<Task>(raw).unwrap()];

        let summary = overall_summary(&tasks);
        assert_eq!(summary.breakdown[0].title, "Record name");
    }

    /// Store whose reads always fail.
    struct BrokenStore;

    impl RecordStore for BrokenStore {
        fn fetch_all(&self, _c: &str, _f: &[&str]) -> Result<Vec<Value>, StoreError> {
            Err(StoreError::Persistence {
                message: "backend offline".to_string(),
            })
        }
        fn fetch_by_id(&self, _c: &str, _id: i64, _f: &[&str]) -> Result<Value, StoreError> {
            Err(StoreError::NotFound)
        }
        fn create(&self, _c: &str, _r: Vec<Value>) -> Result<Vec<Value>, StoreError> {
            Err(StoreError::Persistence {
                message: "backend offline".to_string(),
            })
        }
        fn update(&self, _c: &str, _r: Vec<Value>) -> Result<Vec<Value>, StoreError> {
            Err(StoreError::Persistence {
                message: "backend offline".to_string(),
            })
        }
        fn delete(&self, _c: &str, _ids: &[i64]) -> Result<(), StoreError> {
            Err(StoreError::Persistence {
                message: "backend offline".to_string(),
            })
        }
        fn aggregate(
            &self,
            _c: &str,
            _q: &[AggregateQuery],
        ) -> Result<Vec<AggregateValue>, StoreError> {
            Err(StoreError::Persistence {
                message: "backend offline".to_string(),
            })
        }
    }

    struct CollectingNotifier(RefCell<Vec<String>>);

    impl Notifier for CollectingNotifier {
        fn notify_success(&self, message: &str) {
            self.0.borrow_mut().push(format!("ok: {message}"));
        }
        fn notify_error(&self, message: &str) {
            self.0.borrow_mut().push(format!("err: {message}"));
        }
    }

    #[test]
    fn store_failure_yields_zero_summary_and_notification() {
        let notifier = CollectingNotifier(RefCell::new(Vec::new()));

        let summary = overall_summary_from_store(&BrokenStore, &notifier);
        assert_eq!(summary, TimeTrackingSummary::default());

        let project = project_summary_from_store(&BrokenStore, &notifier, ProjectId::from(1));
        assert_eq!(project, TimeTrackingSummary::default());

        let messages = notifier.0.borrow();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].starts_with("err: Failed to load time tracking"));
    }
}
