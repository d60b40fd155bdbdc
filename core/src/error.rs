//! Error types for the record-store client and services.
//!
//! # Design
//! `NotFound` and `InvalidState` get dedicated variants because the timer
//! operations promise them to callers: "the task does not exist" and "stop
//! called with no running timer" are handled differently by presentation
//! code than a failed write. Everything the backend rejects — an
//! unsuccessful envelope, a per-record failure, an unexpected HTTP status —
//! lands in `Persistence` with the backend's message preserved for
//! debugging.

use std::fmt;

/// Errors returned by `StoreClient` parse methods and the timer service.
#[derive(Debug)]
pub enum StoreError {
    /// The referenced record does not exist in its collection.
    NotFound,

    /// The operation is not valid for the record's current state, e.g.
    /// stopping a timer that is not running.
    InvalidState(&'static str),

    /// The remote write failed: unsuccessful envelope, per-record failure,
    /// or a non-200 transport status.
    Persistence { message: String },

    /// Malformed input, e.g. a project identifier that is neither a number
    /// nor a numeric string.
    Validation(String),

    /// The request payload could not be serialized to JSON.
    Serialization(String),

    /// The response body could not be deserialized into the expected shape.
    Deserialization(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound => write!(f, "record not found"),
            StoreError::InvalidState(msg) => write!(f, "invalid state: {msg}"),
            StoreError::Persistence { message } => {
                write!(f, "store write failed: {message}")
            }
            StoreError::Validation(msg) => write!(f, "validation failed: {msg}"),
            StoreError::Serialization(msg) => {
                write!(f, "serialization failed: {msg}")
            }
            StoreError::Deserialization(msg) => {
                write!(f, "deserialization failed: {msg}")
            }
        }
    }
}

impl std::error::Error for StoreError {}
