use std::fmt;

/// Request URI assembled from server variables.
///
/// Components are stored verbatim; the path and query are not re-encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Uri {
    scheme: String,
    host: String,
    port: Option<u16>,
    path: String,
    query: String,
}

/// Default port for a scheme, if it has one.
pub fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    }
}

impl Uri {
    /// Empty relative URI (no scheme, host, port, path or query)
    pub fn new() -> Self {
        Self::default()
    }

    /// Lowercase scheme, `"http"` or `"https"` for adapter-built URIs
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Host without the port; empty when neither `HTTP_HOST` nor `SERVER_NAME` was set
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port as derived, including the scheme default
    ///
    /// # Returns
    ///
    /// `Some(80)` for a plain-http URI with no explicit port; use
    /// [`authority`](Uri::authority) for the rendered form, which omits it.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Path exactly as received, still percent-encoded
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query string without the leading `?`
    pub fn query(&self) -> &str {
        &self.query
    }

    /// `host[:port]`, with the port left out when it is the scheme default.
    pub fn authority(&self) -> String {
        match self.port {
            Some(port) if !self.host.is_empty() && default_port(&self.scheme) != Some(port) => {
                format!("{}:{}", self.host, port)
            }
            _ => self.host.clone(),
        }
    }

    #[must_use]
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into().to_ascii_lowercase();
        self
    }

    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    #[must_use]
    pub fn with_port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Convert to an `http::Uri`. Without a host the result is origin-form
    /// (path and query only).
    ///
    /// # Errors
    ///
    /// Returns an error if a component is not valid for `http::Uri`.
    pub fn to_http(&self) -> Result<http::Uri, http::Error> {
        let mut path_and_query = if self.path.is_empty() {
            "/".to_string()
        } else {
            self.path.clone()
        };
        if !self.query.is_empty() {
            path_and_query.push('?');
            path_and_query.push_str(&self.query);
        }

        let mut builder = http::Uri::builder();
        if !self.host.is_empty() {
            let scheme = if self.scheme.is_empty() { "http" } else { self.scheme.as_str() };
            builder = builder.scheme(scheme).authority(self.authority());
        }
        builder.path_and_query(path_and_query).build()
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.scheme.is_empty() {
            write!(f, "{}:", self.scheme)?;
        }
        if !self.host.is_empty() {
            write!(f, "//{}", self.authority())?;
        }
        f.write_str(&self.path)?;
        if !self.query.is_empty() {
            write!(f, "?{}", self.query)?;
        }
        Ok(())
    }
}
