//! Computation core for a client/project/task workspace backed by a remote
//! record store.
//!
//! # Overview
//! Builds `StoreRequest` values and parses `StoreResponse` envelopes without
//! touching the network (host-does-IO pattern); the caller executes the
//! actual round trip. On top of that wire layer sit the pieces with real
//! logic: task timer start/stop arithmetic, time-tracking aggregation, and
//! dashboard summarization.
//!
//! # Design
//! - `StoreClient` is stateless — it holds only `base_url`. Each record-store
//!   operation is split into `build_*` / `parse_*`, so the I/O boundary is
//!   explicit and the core stays deterministic.
//! - Services consume the store through the `RecordStore` trait, injected
//!   once by the host rather than constructed per call.
//! - Timer operations fail loud (`Err` plus an error notification); the
//!   aggregation and dashboard reads fail soft (zeroed results), so
//!   presentation code always has something to render.
//! - Durations are integer milliseconds end to end; totals never pass
//!   through floating point.

pub mod client;
pub mod dashboard;
pub mod error;
pub mod store;
pub mod timer;
pub mod tracking;
pub mod transport;
pub mod types;

pub use client::StoreClient;
pub use dashboard::{dashboard_data, summarize, DashboardCounts, DashboardSummary};
pub use error::StoreError;
pub use store::{collections, AggregateQuery, AggregateValue, Notifier, NullNotifier, RecordStore};
pub use timer::{Clock, SystemClock, TimerService};
pub use tracking::{overall_summary, project_summary, TaskBreakdown, TimeTrackingSummary};
pub use transport::{Method, StoreRequest, StoreResponse};
pub use types::{ActiveTimer, ProjectId, Task, TimeLogEntry};
