//! Collaborator seams: the record store and the notifier.
//!
//! # Design
//! The record store is consumed through a trait so one instance can be
//! constructed by the host and injected everywhere — services never build
//! their own transport per call. Implementations live with the host (the
//! integration tests drive a real HTTP round trip through `StoreClient`);
//! unit tests use in-memory fakes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreError;
use crate::types::Task;

/// Collection names owned by the backend.
pub mod collections {
    pub const CLIENT: &str = "client";
    pub const PROJECT: &str = "project";
    pub const TASK: &str = "task";
}

/// Field spec requested when reading task records.
pub const TASK_FIELDS: &[&str] = &[
    "Name",
    "title",
    "priority",
    "status",
    "dueDate",
    "totalTime",
    "activeTimer",
    "projectId",
];

/// A single aggregation request, e.g. "count of tasks where status is
/// todo or in-progress".
#[derive(Debug, Clone, Serialize)]
pub struct AggregateQuery {
    pub id: String,
    pub function: String,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub filter: Option<EqualsFilter>,
}

/// Keep rows whose `field` equals any of the listed values.
#[derive(Debug, Clone, Serialize)]
pub struct EqualsFilter {
    pub field: String,
    pub equals: Vec<String>,
}

impl AggregateQuery {
    pub fn count(id: &str) -> Self {
        Self {
            id: id.to_string(),
            function: "Count".to_string(),
            filter: None,
        }
    }

    pub fn count_where(id: &str, field: &str, values: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            function: "Count".to_string(),
            filter: Some(EqualsFilter {
                field: field.to_string(),
                equals: values.iter().map(|v| v.to_string()).collect(),
            }),
        }
    }
}

/// One aggregation result, matched to its query by id.
#[derive(Debug, Clone, Deserialize)]
pub struct AggregateValue {
    pub id: String,
    #[serde(default)]
    pub value: u64,
}

/// The remote entity store, injected once and shared by all services.
///
/// Every operation maps to one wire round trip. Implementations must apply
/// the envelope rules from `StoreClient`: a write only succeeds when the
/// envelope flag and every per-record flag are set.
pub trait RecordStore {
    fn fetch_all(&self, collection: &str, fields: &[&str]) -> Result<Vec<Value>, StoreError>;

    fn fetch_by_id(
        &self,
        collection: &str,
        id: i64,
        fields: &[&str],
    ) -> Result<Value, StoreError>;

    fn create(&self, collection: &str, records: Vec<Value>) -> Result<Vec<Value>, StoreError>;

    fn update(&self, collection: &str, records: Vec<Value>) -> Result<Vec<Value>, StoreError>;

    fn delete(&self, collection: &str, ids: &[i64]) -> Result<(), StoreError>;

    fn aggregate(
        &self,
        collection: &str,
        queries: &[AggregateQuery],
    ) -> Result<Vec<AggregateValue>, StoreError>;
}

/// Fire-and-forget user-facing messages. Delivery is the host's concern;
/// nothing here consumes a return value.
pub trait Notifier {
    fn notify_success(&self, message: &str);
    fn notify_error(&self, message: &str);
}

/// Notifier that drops every message. Useful for hosts without a
/// presentation layer and for tests that don't assert on notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify_success(&self, _message: &str) {}
    fn notify_error(&self, _message: &str) {}
}

/// Fetch the whole task collection as typed records.
pub fn fetch_tasks<S: RecordStore + ?Sized>(store: &S) -> Result<Vec<Task>, StoreError> {
    let records = store.fetch_all(collections::TASK, TASK_FIELDS)?;
    records
        .into_iter()
        .map(|record| {
            serde_json::from_value(record).map_err(|e| StoreError::Deserialization(e.to_string()))
        })
        .collect()
}
