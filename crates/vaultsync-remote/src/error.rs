//! Error types for the transport layer

use thiserror::Error;

/// The manifest payload was malformed or missing required structure.
///
/// Protocol errors fail the entire planning pass: there is no partial
/// manifest to diff against.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The response body was not parseable JSON
    #[error("manifest body is not valid JSON: {0}")]
    InvalidJson(String),

    /// The response body parsed but is not a JSON object
    #[error("manifest body is not a JSON object")]
    NotAnObject,

    /// Neither a `files` array nor keyed file records were present
    #[error("manifest lacks a usable file list")]
    MissingFileList,
}

/// An HTTP-level failure on a single request.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The configured server URL could not be parsed or extended
    #[error("invalid server URL: {0}")]
    InvalidUrl(String),

    /// A response status ≥ 400 that is not allow-listed for the operation
    #[error("{method} {path} returned HTTP {status}")]
    Status {
        method: &'static str,
        path: String,
        status: u16,
    },

    /// The request exceeded the configured client-side timeout
    #[error("{method} {path} timed out after {timeout_secs}s")]
    Timeout {
        method: &'static str,
        path: String,
        timeout_secs: u64,
    },

    /// A connection-level failure (DNS, refused, reset, TLS)
    #[error("{method} {path} failed: {source}")]
    Network {
        method: &'static str,
        path: String,
        #[source]
        source: reqwest::Error,
    },

    /// The manifest endpoint answered but its payload was unusable
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
