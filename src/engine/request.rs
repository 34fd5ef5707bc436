use super::multipart::{self, UploadError};
use super::{FileDescriptor, ServerVars};
use bytes::Bytes;
use may_minihttp::Request;
use std::io::{self, Read};
use std::sync::Arc;
use tempfile::TempPath;
use thiserror::Error;
use tracing::debug;

/// Header slots for raw request parsing; matches the server's `HttpServerWithHeaders<_, 32>`.
const MAX_HEADERS: usize = 32;

/// Errors produced while parsing a raw request message.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("request head is incomplete")]
    Incomplete,
    #[error("malformed request head: {0}")]
    Malformed(#[from] httparse::Error),
    #[error("request body truncated: expected {expected} bytes, got {actual}")]
    BodyTruncated { expected: usize, actual: usize },
    #[error(transparent)]
    Upload(#[from] UploadError),
}

/// Native inbound request as delivered by the engine.
///
/// Header names are lowercase. Cookies keep the order they had in the `Cookie` header.
#[derive(Debug, Clone)]
pub struct EngineRequest {
    /// HTTP method as sent by the client (GET, POST, etc.)
    pub method: String,
    /// CGI-style server variables
    pub server: ServerVars,
    /// Header bag (lowercase names, in arrival order)
    pub headers: Vec<(String, String)>,
    /// Cookie bag parsed from the `Cookie` header
    pub cookies: Vec<(String, String)>,
    /// Raw request body
    pub body: Bytes,
    /// Uploads the engine spooled to disk
    pub files: Vec<FileDescriptor>,
    /// Temp files backing `files`; each is deleted once the last clone of the request drops
    pub spooled: Vec<Arc<TempPath>>,
}

impl Default for EngineRequest {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            server: ServerVars::new(),
            headers: Vec::new(),
            cookies: Vec::new(),
            body: Bytes::new(),
            files: Vec::new(),
            spooled: Vec::new(),
        }
    }
}

impl EngineRequest {
    /// Capture a live `may_minihttp::Request`.
    ///
    /// `local_port` is the port the server is bound to; it becomes `SERVER_PORT`.
    /// File parts of a `multipart/form-data` body are spooled to temp files.
    ///
    /// # Errors
    ///
    /// Returns the engine's I/O error if the request body cannot be read, and
    /// `InvalidData` if a multipart body is malformed.
    pub fn from_minihttp(req: Request, local_port: Option<u16>) -> io::Result<Self> {
        let method = req.method().to_string();
        let target = req.path().to_string();
        let minor = req.version();
        let headers: Vec<(String, String)> = req
            .headers()
            .iter()
            .map(|h| {
                (
                    h.name.to_ascii_lowercase(),
                    String::from_utf8_lossy(h.value).to_string(),
                )
            })
            .collect();

        let mut body = Vec::new();
        req.body().read_to_end(&mut body)?;

        let mut request = Self::assemble(
            method,
            &target,
            minor,
            headers,
            Bytes::from(body),
            local_port,
        );
        request.spool_uploads()?;
        Ok(request)
    }

    /// Parse a raw HTTP/1.x request message.
    ///
    /// The body is `Content-Length` bytes when the header is present, otherwise
    /// everything after the head.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the head is malformed or incomplete, the body is
    /// shorter than `Content-Length` announces, or a multipart body cannot be spooled.
    pub fn parse(raw: &[u8]) -> Result<Self, ParseError> {
        let mut slots = [httparse::EMPTY_HEADER; MAX_HEADERS];
        let mut head = httparse::Request::new(&mut slots);
        let offset = match head.parse(raw)? {
            httparse::Status::Complete(offset) => offset,
            httparse::Status::Partial => return Err(ParseError::Incomplete),
        };

        let method = head.method.unwrap_or("GET").to_string();
        let target = head.path.unwrap_or("/").to_string();
        let minor = head.version.unwrap_or(1);
        let headers: Vec<(String, String)> = head
            .headers
            .iter()
            .map(|h| {
                (
                    h.name.to_ascii_lowercase(),
                    String::from_utf8_lossy(h.value).to_string(),
                )
            })
            .collect();

        let rest = &raw[offset..];
        let content_length = headers
            .iter()
            .find(|(name, _)| name == "content-length")
            .and_then(|(_, value)| value.trim().parse::<usize>().ok());
        let body = match content_length {
            Some(expected) if rest.len() < expected => {
                return Err(ParseError::BodyTruncated {
                    expected,
                    actual: rest.len(),
                })
            }
            Some(expected) => &rest[..expected],
            None => rest,
        };

        let mut request = Self::assemble(
            method,
            &target,
            minor,
            headers,
            Bytes::copy_from_slice(body),
            None,
        );
        request.spool_uploads()?;
        Ok(request)
    }

    /// Attach an upload descriptor.
    #[must_use]
    pub fn with_file(mut self, file: FileDescriptor) -> Self {
        self.files.push(file);
        self
    }

    /// Spool the file parts of a `multipart/form-data` body; other bodies are left alone.
    fn spool_uploads(&mut self) -> Result<(), UploadError> {
        let Some(content_type) = self
            .headers
            .iter()
            .find(|(name, _)| name == "content-type")
            .map(|(_, value)| value.as_str())
            .filter(|value| multipart::is_form_data(value))
        else {
            return Ok(());
        };
        let spooled = multipart::spool(content_type, self.body.clone())?;
        self.files.extend(spooled.files);
        self.spooled.extend(spooled.paths);
        Ok(())
    }

    fn assemble(
        method: String,
        target: &str,
        minor: u8,
        headers: Vec<(String, String)>,
        body: Bytes,
        local_port: Option<u16>,
    ) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        };

        let mut server = ServerVars::new();
        server.insert("REQUEST_METHOD", method.as_str());
        server.insert("REQUEST_URI", path);
        server.insert("PATH_INFO", path);
        if let Some(query) = query {
            server.insert("QUERY_STRING", query);
        }
        server.insert("SERVER_PROTOCOL", format!("HTTP/1.{minor}"));
        if let Some(port) = local_port {
            server.insert("SERVER_PORT", port.to_string());
        }
        for (name, value) in &headers {
            let key = format!("HTTP_{}", name.replace('-', "_"));
            // Repeated headers collapse into one comma-separated variable
            let joined = match server.get(&key) {
                Some(prev) => format!("{prev}, {value}"),
                None => value.clone(),
            };
            server.insert(key, joined);
        }

        let cookies = parse_cookies(&headers);

        debug!(
            method = %method,
            path = %path,
            header_count = headers.len(),
            cookie_count = cookies.len(),
            body_size_bytes = body.len(),
            "Engine request captured"
        );

        Self {
            method,
            server,
            headers,
            cookies,
            body,
            files: Vec::new(),
            spooled: Vec::new(),
        }
    }
}

/// Extract the cookie bag from every `cookie` header, in order.
pub fn parse_cookies(headers: &[(String, String)]) -> Vec<(String, String)> {
    headers
        .iter()
        .filter(|(name, _)| name == "cookie")
        .flat_map(|(_, value)| value.split(';'))
        .filter_map(|pair| {
            let mut parts = pair.trim().splitn(2, '=');
            let name = parts.next()?.trim();
            if name.is_empty() {
                return None;
            }
            let value = parts.next().unwrap_or("").trim();
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}
