use crate::engine::{EngineRequest, ServerVars};
use crate::message::uri::default_port;
use crate::message::{Params, ServerRequest, Stream, UploadedFile, Uri};
use http::header::{HeaderMap, HeaderName, HeaderValue, COOKIE};
use http::Method;
use tracing::{debug, warn};

/// Builds a [`ServerRequest`] from a native engine request.
pub trait ServerRequestFactory {
    /// Convert `request` without modifying it.
    fn create(&self, request: &EngineRequest) -> ServerRequest;
}

/// Request adapter for [`EngineRequest`].
///
/// Never fails: missing or malformed server variables fall back to documented
/// defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineRequestFactory {
    script_name: String,
}

impl EngineRequestFactory {
    /// `script_name` is exposed to applications as the `SCRIPT_NAME` server variable.
    pub fn new(script_name: impl Into<String>) -> Self {
        Self {
            script_name: script_name.into(),
        }
    }

    /// Use the process's invocation name (argv\[0\]) as `SCRIPT_NAME`, or empty
    /// when unavailable.
    pub fn from_process_args() -> Self {
        Self::new(std::env::args().next().unwrap_or_default())
    }

    pub fn script_name(&self) -> &str {
        &self.script_name
    }
}

impl ServerRequestFactory for EngineRequestFactory {
    fn create(&self, request: &EngineRequest) -> ServerRequest {
        let mut server = request.server.clone();
        server.insert("SCRIPT_NAME", self.script_name.as_str());

        let uri = create_uri(&server);
        let mut headers = collect_headers(&request.headers);

        if !request.cookies.is_empty() {
            let line = request
                .cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            match HeaderValue::from_str(&line) {
                Ok(value) => {
                    headers.insert(COOKIE, value);
                }
                Err(_) => debug!("Cookie bag is not a valid header value, keeping cookie header"),
            }
        }

        let method = Method::from_bytes(request.method.as_bytes()).unwrap_or_else(|_| {
            warn!(method = %request.method, "Invalid request method, using GET");
            Method::GET
        });
        let protocol_version = parse_protocol_version(&server);
        let query_params = Params::from_query(uri.query());
        let cookie_params: Params = request.cookies.iter().cloned().collect();
        let uploaded_files: Vec<UploadedFile> =
            request.files.iter().map(UploadedFile::from).collect();

        debug!(
            method = %method,
            uri = %uri,
            protocol_version = %protocol_version,
            header_count = headers.len(),
            query_param_count = query_params.len(),
            cookie_count = cookie_params.len(),
            file_count = uploaded_files.len(),
            "Server request created"
        );

        ServerRequest::new(
            method,
            uri,
            headers,
            Stream::from_bytes(request.body.clone()),
            protocol_version,
            server,
        )
        .with_query_params(query_params)
        .with_cookie_params(cookie_params)
        .with_uploaded_files(uploaded_files)
    }
}

/// Derive the request URI from server variables.
///
/// A `HTTP_HOST` of the form `host:port` is split on its only colon; any other
/// number of colons (IPv6 literals included) keeps the whole value as the host.
pub fn create_uri(server: &ServerVars) -> Uri {
    let scheme = if is_https(server) { "https" } else { "http" };
    let default = default_port(scheme);

    let mut port = match server.get("SERVER_PORT") {
        Some(raw) => raw.trim().parse::<u16>().ok().or(default),
        None => default,
    };

    let host = if let Some(host) = server.get("HTTP_HOST") {
        let parts: Vec<&str> = host.split(':').collect();
        if let [name, explicit] = parts.as_slice() {
            // An empty or garbled Host port keeps whatever SERVER_PORT gave
            port = explicit.trim().parse::<u16>().ok().or(port);
            name.to_string()
        } else {
            host.to_string()
        }
    } else {
        server.get("SERVER_NAME").unwrap_or_default().to_string()
    };

    Uri::new()
        .with_scheme(scheme)
        .with_port(port)
        .with_host(host)
        .with_path(server.get("REQUEST_URI").unwrap_or_default())
        .with_query(server.get("QUERY_STRING").unwrap_or_default())
}

/// `HTTPS` counts when set to anything but empty, `"0"` or `"off"`.
fn is_https(server: &ServerVars) -> bool {
    match server.get("HTTPS") {
        Some(value) => !value.is_empty() && value != "0" && value != "off",
        None => false,
    }
}

/// `SERVER_PROTOCOL` of the form `HTTP/<version>` yields `<version>`; anything else `1.1`.
pub fn parse_protocol_version(server: &ServerVars) -> String {
    server
        .get("SERVER_PROTOCOL")
        .and_then(|protocol| protocol.strip_prefix("HTTP/"))
        .unwrap_or("1.1")
        .to_string()
}

fn collect_headers(bag: &[(String, String)]) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(bag.len());
    for (name, value) in bag {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.append(name, value);
            }
            _ => debug!(header = %name, "Skipping invalid header"),
        }
    }
    headers
}
