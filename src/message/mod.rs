//! # Message Module
//!
//! Framework-agnostic HTTP messages handed to application code.
//!
//! ## Overview
//!
//! - [`ServerRequest`] - server-side request with URI, multi-valued headers, body
//!   stream, server/query/cookie parameters and uploaded files
//! - [`Stream`] - body stream, seekable or not, read in bounded chunks
//! - [`UploadedFile`] - a received upload backed by a temporary file
//! - [`Uri`] - request URI with verbatim path and query
//! - [`Params`] - ordered query/cookie parameters
//!
//! Responses are plain `http::Response<Stream>` values. A custom reason phrase can be
//! attached as a [`ReasonPhrase`] extension:
//!
//! ```
//! use brrtrouter_bridge::message::{ReasonPhrase, Stream};
//!
//! let response = http::Response::builder()
//!     .status(200)
//!     .header("content-type", "text/plain")
//!     .extension(ReasonPhrase::new("Fine"))
//!     .body(Stream::from("hello"))
//!     .unwrap();
//! assert_eq!(ReasonPhrase::of(&response), "Fine");
//! ```

pub mod params;
pub mod server_request;
pub mod stream;
pub mod uploaded_file;
pub mod uri;

pub use params::Params;
pub use server_request::ServerRequest;
pub use stream::Stream;
pub use uploaded_file::{UploadedFile, UPLOAD_ERR_OK};
pub use uri::Uri;

use std::borrow::Cow;

/// Standard response type emitted back through the engine.
pub type Response = http::Response<Stream>;

/// Reason phrase override carried in response extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasonPhrase(Cow<'static, str>);

impl ReasonPhrase {
    pub fn new(reason: impl Into<Cow<'static, str>>) -> Self {
        Self(reason.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reason phrase for a response: the extension if present, otherwise the
    /// canonical phrase of its status, otherwise empty.
    pub fn of<B>(response: &http::Response<B>) -> &str {
        response
            .extensions()
            .get::<ReasonPhrase>()
            .map(ReasonPhrase::as_str)
            .or_else(|| response.status().canonical_reason())
            .unwrap_or("")
    }
}
