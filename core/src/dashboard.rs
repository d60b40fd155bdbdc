//! Dashboard count aggregation and summarization.
//!
//! # Design
//! `summarize` is a pure fold from raw collection counts into the fixed
//! shape the dashboard renders. `dashboard_data` runs the aggregation
//! queries and honors the fail-soft contract: it never returns an error —
//! any failure is reported through the notifier and the dashboard gets an
//! all-zero summary with empty lists, so it always renders something.
//!
//! Known limitations carried over from the product's current data model:
//! revenue, overdue items, hours tracked, and invoices sent have no backing
//! collections yet and are placeholder values, not computed metrics.

use serde::Serialize;

use crate::store::{collections, AggregateQuery, AggregateValue, Notifier, RecordStore};

/// Raw counts from the backend's aggregation queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardCounts {
    pub total_clients: u64,
    pub active_projects: u64,
    pub total_tasks: u64,
    pub pending_tasks: u64,
}

impl DashboardCounts {
    /// Completed = total − pending, clamped so inconsistent counts (more
    /// pending than total) read as zero rather than underflowing.
    pub fn completed_tasks(&self) -> u64 {
        self.total_tasks.saturating_sub(self.pending_tasks)
    }
}

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SummaryBlock {
    pub total_clients: u64,
    pub active_projects: u64,
    pub pending_tasks: u64,
    pub completed_tasks: u64,
    pub monthly_revenue: u64,
    pub overdue_items: u64,
}

/// One recent-activity feed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityItem {
    pub id: i64,
    pub kind: String,
    pub title: String,
    pub client: String,
    pub time: String,
    pub icon: String,
}

/// Secondary stat tiles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QuickStats {
    pub projects_this_week: u64,
    pub tasks_completed: u64,
    pub hours_tracked: u64,
    pub invoices_sent: u64,
}

/// The fixed-shape object the dashboard renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub summary: SummaryBlock,
    pub recent_activity: Vec<ActivityItem>,
    pub quick_stats: QuickStats,
}

impl DashboardSummary {
    /// All-zero counts, empty lists. Returned whenever the aggregation
    /// queries fail.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Assemble the dashboard summary from raw counts.
pub fn summarize(counts: DashboardCounts) -> DashboardSummary {
    let completed = counts.completed_tasks();
    DashboardSummary {
        summary: SummaryBlock {
            total_clients: counts.total_clients,
            active_projects: counts.active_projects,
            pending_tasks: counts.pending_tasks,
            completed_tasks: completed,
            monthly_revenue: 12_450, // placeholder: no revenue collection yet
            overdue_items: 3,        // placeholder: needs a due-date query
        },
        recent_activity: vec![ActivityItem {
            id: 1,
            kind: "project".to_string(),
            title: "Recent project activity".to_string(),
            client: "ClientFlow Pro".to_string(),
            time: "2 hours ago".to_string(),
            icon: "CheckCircle2".to_string(),
        }],
        quick_stats: QuickStats {
            projects_this_week: counts.active_projects / 4,
            tasks_completed: completed,
            hours_tracked: 168, // placeholder: not derived from timer totals yet
            invoices_sent: 5,   // placeholder: no invoice collection yet
        },
    }
}

/// Run the count queries and build the summary. Fail-soft: on any failure
/// the error is notified and an empty summary is returned.
pub fn dashboard_data<S: RecordStore + ?Sized>(
    store: &S,
    notifier: &dyn Notifier,
) -> DashboardSummary {
    match fetch_counts(store) {
        Ok(counts) => summarize(counts),
        Err(err) => {
            notifier.notify_error(&format!("Failed to fetch dashboard data: {err}"));
            DashboardSummary::empty()
        }
    }
}

fn fetch_counts<S: RecordStore + ?Sized>(store: &S) -> Result<DashboardCounts, crate::error::StoreError> {
    let clients = store.aggregate(
        collections::CLIENT,
        &[AggregateQuery::count("totalClients")],
    )?;
    let projects = store.aggregate(
        collections::PROJECT,
        &[AggregateQuery::count_where(
            "activeProjects",
            "status",
            &["active"],
        )],
    )?;
    let tasks = store.aggregate(
        collections::TASK,
        &[
            AggregateQuery::count("totalTasks"),
            AggregateQuery::count_where("pendingTasks", "status", &["todo", "in-progress"]),
        ],
    )?;

    Ok(DashboardCounts {
        total_clients: value_of(&clients, "totalClients"),
        active_projects: value_of(&projects, "activeProjects"),
        total_tasks: value_of(&tasks, "totalTasks"),
        pending_tasks: value_of(&tasks, "pendingTasks"),
    })
}

fn value_of(values: &[AggregateValue], id: &str) -> u64 {
    values.iter().find(|v| v.id == id).map_or(0, |v| v.value)
}
