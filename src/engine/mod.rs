//! # Engine Module
//!
//! Native request and response representations of the `may_minihttp` server engine.
//!
//! The engine owns socket I/O, HTTP framing and connection lifecycle. This module only
//! describes what the engine hands to the bridge ([`EngineRequest`]) and what the bridge
//! drives on the way out ([`ResponseSink`]).
//!
//! ## Server Variables
//!
//! Transport-level metadata travels as CGI-style server variables (`REQUEST_URI`,
//! `QUERY_STRING`, `HTTP_HOST`, ...). [`ServerVars`] keeps them in a homogeneous
//! string map whose keys are always uppercase, so `server.get("http_host")` and
//! `server.get("HTTP_HOST")` are the same lookup.
//!
//! ## Uploads
//!
//! `may_minihttp` does not parse request bodies. When a request arrives as
//! `multipart/form-data`, [`multipart::spool`] writes each file part to a temp file
//! and records a [`FileDescriptor`] for it. The temp files live as long as the
//! [`EngineRequest`] that owns them.

pub mod multipart;
pub mod request;
pub mod response;

pub use request::{EngineRequest, ParseError};
pub use response::{EngineResponse, MiniHttpSink, ResponseSink};

use std::collections::BTreeMap;
use std::path::PathBuf;

/// CGI-style server variables with uppercase keys.
///
/// Ordered by key, so iteration and `Debug` output are stable across requests.
///
/// # Example
///
/// ```
/// use brrtrouter_bridge::engine::ServerVars;
///
/// let mut vars = ServerVars::new();
/// vars.insert("server_port", "9501");
/// assert_eq!(vars.get("SERVER_PORT"), Some("9501"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerVars(BTreeMap<String, String>);

impl ServerVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a variable
    ///
    /// # Arguments
    ///
    /// * `key` - Variable name in any case; stored uppercase
    /// * `value` - Variable value, stored as-is
    ///
    /// # Returns
    ///
    /// The previous value for the same key, if any
    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<String>) -> Option<String> {
        self.0
            .insert(key.as_ref().to_ascii_uppercase(), value.into())
    }

    /// Look up a variable by name, ignoring case
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(&key.to_ascii_uppercase()).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(&key.to_ascii_uppercase())
    }

    /// Remove a variable, returning its value
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(&key.to_ascii_uppercase())
    }

    /// Iterate `(KEY, value)` pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for ServerVars {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut vars = ServerVars::new();
        for (k, v) in iter {
            vars.insert(k, v);
        }
        vars
    }
}

/// A file upload the engine already received and spooled to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    /// Temporary path the engine wrote the upload to
    pub tmp_name: PathBuf,
    /// Original filename sent by the client
    pub name: String,
    /// Media type sent by the client
    pub media_type: String,
    /// Size in bytes
    pub size: u64,
    /// Upload error code (`0` = success)
    pub error: i32,
}
