//! Typed error hierarchy for scopectl.
//!
//! Two top-level enums cover the two failure surfaces:
//! - `ClientError` — calls to the platform microservices (session,
//!   organizations, companies, products, authorization)
//! - `StoreError` — the persisted active-context file
//!
//! Neither propagates out of [`crate::context::ActiveContextManager`]'s
//! operations; the manager catches, logs, and degrades. They surface only
//! from the client and store layers directly.

use thiserror::Error;

/// Errors from the platform microservice clients.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("No authenticated session; sign in and set the session token")]
    NoSession,

    #[error("Request to {service} service failed: {source}")]
    Request {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} service returned HTTP {status}")]
    Status { service: &'static str, status: u16 },

    #[error("Failed to decode {service} response: {source}")]
    Decode {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors from the durable active-context store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No state directory available on this platform")]
    NoStateDir,

    #[error("Failed to read context file at {path}: {source}")]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write context file at {path}: {source}")]
    Write {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Context file at {path} is not valid JSON: {source}")]
    Corrupt {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
