//! Transport types for the host-does-IO pattern.
//!
//! # Design
//! The core never opens a socket. `StoreClient` builds `StoreRequest` values
//! and parses `StoreResponse` values; the host executes the round trip in
//! between. Every record-store request and response body is JSON, so the
//! request carries no header list — the executor sets `content-type:
//! application/json` whenever a body is present.
//!
//! All fields are owned (`String`) so values can be handed across thread or
//! process boundaries without lifetime concerns.

/// HTTP method for a record-store request. Deletion travels as a POST to
/// the collection's `delete` endpoint, so only three methods exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
}

/// A record-store request described as plain data.
///
/// Built by `StoreClient::build_*` methods; executed by the host.
#[derive(Debug, Clone)]
pub struct StoreRequest {
    pub method: Method,
    pub url: String,
    /// JSON payload, when the operation carries one.
    pub body: Option<String>,
}

/// A record-store response described as plain data.
///
/// Constructed by the host after executing a `StoreRequest`, then handed to
/// the matching `StoreClient::parse_*` method.
#[derive(Debug, Clone)]
pub struct StoreResponse {
    pub status: u16,
    pub body: String,
}
