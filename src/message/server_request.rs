use super::{Params, Stream, UploadedFile, Uri};
use crate::engine::ServerVars;
use http::header::{AsHeaderName, HeaderMap};
use http::Method;

/// Framework-agnostic server-side HTTP request.
///
/// Headers are multi-valued and case-insensitive. The `with_*` setters consume the
/// request and return the updated one.
#[derive(Debug)]
pub struct ServerRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Stream,
    protocol_version: String,
    server_params: ServerVars,
    query_params: Params,
    cookie_params: Params,
    uploaded_files: Vec<UploadedFile>,
}

impl ServerRequest {
    pub fn new(
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: Stream,
        protocol_version: impl Into<String>,
        server_params: ServerVars,
    ) -> Self {
        Self {
            method,
            uri,
            headers,
            body,
            protocol_version: protocol_version.into(),
            server_params,
            query_params: Params::new(),
            cookie_params: Params::new(),
            uploaded_files: Vec::new(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn has_header<K: AsHeaderName>(&self, name: K) -> bool {
        self.headers.contains_key(name)
    }

    /// Every value of a header; values that are not visible ASCII are skipped.
    pub fn header<K: AsHeaderName>(&self, name: K) -> Vec<&str> {
        self.headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect()
    }

    /// All values of a header joined with `, `; empty when absent.
    pub fn header_line<K: AsHeaderName>(&self, name: K) -> String {
        self.header(name).join(", ")
    }

    pub fn body(&self) -> &Stream {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Stream {
        &mut self.body
    }

    pub fn into_body(self) -> Stream {
        self.body
    }

    pub fn protocol_version(&self) -> &str {
        &self.protocol_version
    }

    pub fn server_params(&self) -> &ServerVars {
        &self.server_params
    }

    pub fn query_params(&self) -> &Params {
        &self.query_params
    }

    pub fn cookie_params(&self) -> &Params {
        &self.cookie_params
    }

    pub fn uploaded_files(&self) -> &[UploadedFile] {
        &self.uploaded_files
    }

    pub fn uploaded_files_mut(&mut self) -> &mut [UploadedFile] {
        &mut self.uploaded_files
    }

    #[must_use]
    pub fn with_query_params(mut self, params: Params) -> Self {
        self.query_params = params;
        self
    }

    #[must_use]
    pub fn with_cookie_params(mut self, params: Params) -> Self {
        self.cookie_params = params;
        self
    }

    #[must_use]
    pub fn with_uploaded_files(mut self, files: Vec<UploadedFile>) -> Self {
        self.uploaded_files = files;
        self
    }

    #[must_use]
    pub fn with_uri(mut self, uri: Uri) -> Self {
        self.uri = uri;
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Stream) -> Self {
        self.body = body;
        self
    }
}
