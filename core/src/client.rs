//! Stateless request builder and envelope parser for the record store.
//!
//! # Design
//! `StoreClient` holds only a `base_url` and carries no mutable state
//! between calls. Each record-store operation is split into a `build_*`
//! method that produces a `StoreRequest` and a `parse_*` method that
//! consumes a `StoreResponse`. The caller executes the actual HTTP round
//! trip, keeping the core deterministic and free of I/O dependencies.
//!
//! The backend answers application-level outcomes with HTTP 200 and a
//! uniform envelope: `{"success": bool, "message"?, "data" | "results" |
//! "aggregators"}`. Write results additionally carry a per-record success
//! flag and an optional field-level error list; both levels are checked
//! before a write counts as successful.

use serde::Deserialize;
use serde_json::Value;

use crate::error::StoreError;
use crate::store::{AggregateQuery, AggregateValue};
use crate::transport::{Method, StoreRequest, StoreResponse};

/// Synchronous, stateless client for the record-store wire protocol.
///
/// Builds `StoreRequest` values and parses `StoreResponse` values without
/// touching the network.
#[derive(Debug, Clone)]
pub struct StoreClient {
    base_url: String,
}

#[derive(Deserialize)]
struct FetchEnvelope {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Deserialize)]
struct WriteEnvelope {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    results: Vec<RecordResult>,
}

#[derive(Deserialize)]
struct AggregateEnvelope {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    aggregators: Vec<AggregateValue>,
}

/// Outcome of a single record within a create/update/delete request.
#[derive(Debug, Deserialize)]
pub struct RecordResult {
    pub success: bool,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Vec<FieldError>,
}

/// A field-level validation failure reported by the backend.
#[derive(Debug, Deserialize)]
pub struct FieldError {
    #[serde(rename = "fieldLabel")]
    pub field_label: String,
    pub message: String,
}

impl StoreClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn build_fetch_all(
        &self,
        collection: &str,
        fields: &[&str],
    ) -> Result<StoreRequest, StoreError> {
        let body = serde_json::to_string(&serde_json::json!({ "fields": fields }))
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(StoreRequest {
            method: Method::Post,
            url: format!("{}/{collection}/query", self.base_url),
            body: Some(body),
        })
    }

    pub fn build_fetch_by_id(&self, collection: &str, id: i64, fields: &[&str]) -> StoreRequest {
        let url = if fields.is_empty() {
            format!("{}/{collection}/{id}", self.base_url)
        } else {
            format!("{}/{collection}/{id}?fields={}", self.base_url, fields.join(","))
        };
        StoreRequest {
            method: Method::Get,
            url,
            body: None,
        }
    }

    pub fn build_create(
        &self,
        collection: &str,
        records: &[Value],
    ) -> Result<StoreRequest, StoreError> {
        let body = serde_json::to_string(&serde_json::json!({ "records": records }))
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(StoreRequest {
            method: Method::Post,
            url: format!("{}/{collection}", self.base_url),
            body: Some(body),
        })
    }

    pub fn build_update(
        &self,
        collection: &str,
        records: &[Value],
    ) -> Result<StoreRequest, StoreError> {
        let body = serde_json::to_string(&serde_json::json!({ "records": records }))
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(StoreRequest {
            method: Method::Put,
            url: format!("{}/{collection}", self.base_url),
            body: Some(body),
        })
    }

    pub fn build_delete(&self, collection: &str, ids: &[i64]) -> Result<StoreRequest, StoreError> {
        let body = serde_json::to_string(&serde_json::json!({ "ids": ids }))
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(StoreRequest {
            method: Method::Post,
            url: format!("{}/{collection}/delete", self.base_url),
            body: Some(body),
        })
    }

    pub fn build_aggregate(
        &self,
        collection: &str,
        queries: &[AggregateQuery],
    ) -> Result<StoreRequest, StoreError> {
        let body = serde_json::to_string(&serde_json::json!({ "aggregators": queries }))
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(StoreRequest {
            method: Method::Post,
            url: format!("{}/{collection}/aggregate", self.base_url),
            body: Some(body),
        })
    }

    pub fn parse_fetch_all(&self, response: StoreResponse) -> Result<Vec<Value>, StoreError> {
        let envelope: FetchEnvelope = decode(response)?;
        if !envelope.success {
            return Err(persistence(envelope.message));
        }
        match envelope.data {
            Some(Value::Array(records)) => Ok(records),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(other) => Err(StoreError::Deserialization(format!(
                "expected record array, got {other}"
            ))),
        }
    }

    /// The store reports a missing record as an unsuccessful fetch; that is
    /// the only failure mode of a read by id, so it maps to `NotFound`.
    pub fn parse_fetch_by_id(&self, response: StoreResponse) -> Result<Value, StoreError> {
        let envelope: FetchEnvelope = decode(response)?;
        if !envelope.success {
            return Err(StoreError::NotFound);
        }
        match envelope.data {
            Some(Value::Null) | None => Err(StoreError::NotFound),
            Some(record) => Ok(record),
        }
    }

    pub fn parse_create(&self, response: StoreResponse) -> Result<Vec<Value>, StoreError> {
        self.parse_write(response)
    }

    pub fn parse_update(&self, response: StoreResponse) -> Result<Vec<Value>, StoreError> {
        self.parse_write(response)
    }

    pub fn parse_delete(&self, response: StoreResponse) -> Result<(), StoreError> {
        self.parse_write(response).map(|_| ())
    }

    pub fn parse_aggregate(
        &self,
        response: StoreResponse,
    ) -> Result<Vec<AggregateValue>, StoreError> {
        let envelope: AggregateEnvelope = decode(response)?;
        if !envelope.success {
            return Err(persistence(envelope.message));
        }
        Ok(envelope.aggregators)
    }

    /// Shared write parser: checks the envelope flag, then every per-record
    /// flag, folding field errors into the failure message.
    fn parse_write(&self, response: StoreResponse) -> Result<Vec<Value>, StoreError> {
        let envelope: WriteEnvelope = decode(response)?;
        if !envelope.success {
            return Err(persistence(envelope.message));
        }

        let failed: Vec<&RecordResult> =
            envelope.results.iter().filter(|r| !r.success).collect();
        if !failed.is_empty() {
            let mut parts = Vec::new();
            for record in failed {
                if let Some(message) = &record.message {
                    parts.push(message.clone());
                }
                for err in &record.errors {
                    parts.push(format!("{}: {}", err.field_label, err.message));
                }
            }
            if parts.is_empty() {
                parts.push("record rejected by store".to_string());
            }
            return Err(StoreError::Persistence {
                message: parts.join("; "),
            });
        }

        Ok(envelope
            .results
            .into_iter()
            .filter_map(|r| r.data)
            .collect())
    }
}

fn decode<T: for<'de> Deserialize<'de>>(response: StoreResponse) -> Result<T, StoreError> {
    if response.status != 200 {
        return Err(StoreError::Persistence {
            message: format!("HTTP {}: {}", response.status, response.body),
        });
    }
    serde_json::from_str(&response.body).map_err(|e| StoreError::Deserialization(e.to_string()))
}

fn persistence(message: Option<String>) -> StoreError {
    StoreError::Persistence {
        message: message.unwrap_or_else(|| "store reported failure".to_string()),
    }
}
