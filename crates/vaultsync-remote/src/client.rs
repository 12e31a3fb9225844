//! Remote store client
//!
//! Provides a typed HTTP client for the vault store protocol: the manifest
//! endpoint, WebDAV-style file content endpoints under `/files/…`, and the
//! health probe. Handles Basic-Auth headers, per-request timeouts, and
//! endpoint construction.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use vaultsync_core::settings::ConnectionSettings;
//! use vaultsync_remote::RemoteClient;
//!
//! # async fn example() -> Result<(), vaultsync_remote::TransportError> {
//! let connection = ConnectionSettings {
//!     server_url: "https://vault.example.com".to_string(),
//!     ..ConnectionSettings::default()
//! };
//! let client = RemoteClient::new(&connection)?;
//! let manifest = client.fetch_manifest().await?;
//! println!("remote tracks {} files", manifest.len());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use vaultsync_core::domain::manifest::VaultManifest;
use vaultsync_core::settings::ConnectionSettings;

use crate::error::TransportError;
use crate::manifest::parse_manifest;

/// Path of the manifest resource relative to the server root.
const MANIFEST_PATH: &str = "manifest.json";

/// Path of the health probe relative to the server root.
const HEALTH_PATH: &str = "health";

/// Namespace prefix for file content endpoints.
const FILES_PREFIX: &str = "files";

/// Liveness/identity probe result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    /// Server-reported status string (typically `"ok"`)
    pub status: String,
    /// Name of the vault the server fronts, when reported
    pub vault_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    vault: Option<HealthVault>,
}

#[derive(Debug, Deserialize)]
struct HealthVault {
    #[serde(default)]
    name: Option<String>,
}

/// HTTP client for the remote vault store.
///
/// Wraps `reqwest::Client` with Basic-Auth credentials, a per-request
/// timeout raced client-side against every call, and URL construction
/// with per-segment encoding. The request path performs no retries.
pub struct RemoteClient {
    client: Client,
    base_url: Url,
    username: Option<String>,
    password: Option<String>,
    timeout: Duration,
}

impl RemoteClient {
    /// Creates a client from connection settings.
    ///
    /// # Errors
    /// Returns [`TransportError::InvalidUrl`] when the configured server
    /// URL cannot be parsed or cannot carry path segments.
    pub fn new(connection: &ConnectionSettings) -> Result<Self, TransportError> {
        let base_url = Url::parse(connection.server_url.trim_end_matches('/'))
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {e}", connection.server_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(TransportError::InvalidUrl(connection.server_url.clone()));
        }

        Ok(Self {
            client: Client::new(),
            base_url,
            username: connection.username.clone(),
            password: connection.password.clone(),
            timeout: Duration::from_secs(connection.request_timeout_secs),
        })
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds an authenticated request with the configured timeout.
    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let mut builder = self.client.request(method, url).timeout(self.timeout);
        if let Some(username) = &self.username {
            builder = builder.basic_auth(username, self.password.as_deref());
        }
        builder
    }

    /// Builds a URL from the base plus literal (pre-encoded-safe) segments.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        {
            let mut parts = url
                .path_segments_mut()
                .map_err(|_| TransportError::InvalidUrl(self.base_url.to_string()))?;
            parts.pop_if_empty();
            for segment in segments {
                parts.push(segment);
            }
        }
        Ok(url)
    }

    /// Builds a file content URL, URL-segment-encoding each path component.
    fn file_url(&self, path: &str) -> Result<Url, TransportError> {
        let mut segments = vec![FILES_PREFIX];
        segments.extend(path.split('/').filter(|c| !c.is_empty()));
        self.endpoint(&segments)
    }

    /// Sends a request, classifying connection failures and timeouts.
    async fn send(
        &self,
        method: &'static str,
        path: &str,
        builder: RequestBuilder,
    ) -> Result<Response, TransportError> {
        builder.send().await.map_err(|source| {
            if source.is_timeout() {
                TransportError::Timeout {
                    method,
                    path: path.to_string(),
                    timeout_secs: self.timeout.as_secs(),
                }
            } else {
                TransportError::Network {
                    method,
                    path: path.to_string(),
                    source,
                }
            }
        })
    }

    /// Rejects any status ≥ 400 that is not allow-listed for the operation.
    fn check_status(
        method: &'static str,
        path: &str,
        response: Response,
        allowed: &[StatusCode],
    ) -> Result<Response, TransportError> {
        let status = response.status();
        if status.as_u16() >= 400 && !allowed.contains(&status) {
            warn!(method, path, status = status.as_u16(), "request rejected");
            return Err(TransportError::Status {
                method,
                path: path.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    /// Fetches and normalizes the remote manifest.
    ///
    /// Accepts both the flat `{files: […]}` shape and the keyed-object
    /// shape. Fails with a [`ProtocolError`](crate::ProtocolError) when
    /// the body is not parseable JSON or lacks a usable file list.
    pub async fn fetch_manifest(&self) -> Result<VaultManifest, TransportError> {
        let url = self.endpoint(&[MANIFEST_PATH])?;
        debug!(url = %url, "fetching remote manifest");

        let response = self
            .send("GET", MANIFEST_PATH, self.request(Method::GET, url))
            .await?;
        let response = Self::check_status("GET", MANIFEST_PATH, response, &[])?;

        let body = response
            .text()
            .await
            .map_err(|source| TransportError::Network {
                method: "GET",
                path: MANIFEST_PATH.to_string(),
                source,
            })?;

        let manifest = parse_manifest(&body)?;
        debug!(files = manifest.len(), "remote manifest fetched");
        Ok(manifest)
    }

    /// Downloads one file's raw bytes.
    pub async fn get_file(&self, path: &str) -> Result<Vec<u8>, TransportError> {
        let url = self.file_url(path)?;
        debug!(path, "downloading file");

        let response = self.send("GET", path, self.request(Method::GET, url)).await?;
        let response = Self::check_status("GET", path, response, &[])?;

        let bytes = response
            .bytes()
            .await
            .map_err(|source| TransportError::Network {
                method: "GET",
                path: path.to_string(),
                source,
            })?;

        debug!(path, bytes = bytes.len(), "download complete");
        Ok(bytes.to_vec())
    }

    /// Uploads one file's raw bytes, creating ancestor collections first.
    pub async fn put_file(&self, path: &str, data: &[u8]) -> Result<(), TransportError> {
        self.ensure_collections(path).await?;

        let url = self.file_url(path)?;
        debug!(path, bytes = data.len(), "uploading file");

        let response = self
            .send(
                "PUT",
                path,
                self.request(Method::PUT, url).body(data.to_vec()),
            )
            .await?;
        Self::check_status("PUT", path, response, &[])?;

        debug!(path, "upload complete");
        Ok(())
    }

    /// Deletes one remote file. A 404 means the file is already absent,
    /// which is the desired end state and therefore success.
    pub async fn delete_file(&self, path: &str) -> Result<(), TransportError> {
        let url = self.file_url(path)?;
        debug!(path, "deleting file");

        let response = self
            .send("DELETE", path, self.request(Method::DELETE, url))
            .await?;
        Self::check_status("DELETE", path, response, &[StatusCode::NOT_FOUND])?;

        debug!(path, "delete complete");
        Ok(())
    }

    /// Issues an idempotent "create collection" call for every ancestor
    /// of `path`, shallowest first.
    ///
    /// Tolerated responses: 405 (collection already exists) and 409
    /// (parent missing temporarily — the next deeper MKCOL, or a server
    /// that creates intermediates on PUT, resolves it).
    async fn ensure_collections(&self, path: &str) -> Result<(), TransportError> {
        let components: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
        if components.len() < 2 {
            return Ok(());
        }

        let mkcol = Method::from_bytes(b"MKCOL").expect("MKCOL is a valid method token");

        for depth in 1..components.len() {
            let dir = components[..depth].join("/");
            let url = self.file_url(&dir)?;
            debug!(dir = %dir, "ensuring collection");

            let response = self
                .send("MKCOL", &dir, self.request(mkcol.clone(), url))
                .await?;
            Self::check_status(
                "MKCOL",
                &dir,
                response,
                &[StatusCode::METHOD_NOT_ALLOWED, StatusCode::CONFLICT],
            )?;
        }

        Ok(())
    }

    /// Probes the health endpoint for connectivity confirmation.
    ///
    /// Independent of manifest and file operations; a reachable, healthy
    /// server answers with its status and vault name.
    pub async fn health_check(&self) -> Result<HealthStatus, TransportError> {
        let url = self.endpoint(&[HEALTH_PATH])?;
        debug!(url = %url, "health check");

        let response = self
            .send("GET", HEALTH_PATH, self.request(Method::GET, url))
            .await?;
        let response = Self::check_status("GET", HEALTH_PATH, response, &[])?;

        let health: HealthResponse =
            response
                .json()
                .await
                .map_err(|source| TransportError::Network {
                    method: "GET",
                    path: HEALTH_PATH.to_string(),
                    source,
                })?;

        Ok(HealthStatus {
            status: health.status.unwrap_or_else(|| "unknown".to_string()),
            vault_name: health.vault.and_then(|v| v.name),
        })
    }
}

impl std::fmt::Debug for RemoteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteClient")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.username.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}
