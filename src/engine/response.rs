use bytes::BytesMut;
use dashmap::DashSet;
use http::StatusCode;
use may_minihttp::Response;
use std::io;
use std::sync::OnceLock;
use tracing::debug;

/// `may_minihttp` keeps response headers in a fixed-size array.
const MAX_RESPONSE_HEADERS: usize = 16;

/// Outbound side of the engine: a mutable sink for one response.
///
/// Callers set the status line, add headers, write body chunks, and call
/// [`end`](ResponseSink::end) exactly once.
pub trait ResponseSink {
    /// Set the status code and reason phrase.
    fn status(&mut self, code: u16, reason: &str) -> io::Result<()>;

    /// Set a header; `values` holds every instance of the header, in order.
    fn header(&mut self, name: &str, values: &[&[u8]]) -> io::Result<()>;

    /// Append a body chunk.
    fn write(&mut self, chunk: &[u8]) -> io::Result<()>;

    /// Finish the response.
    fn end(&mut self) -> io::Result<()>;
}

impl<S: ResponseSink + ?Sized> ResponseSink for &mut S {
    fn status(&mut self, code: u16, reason: &str) -> io::Result<()> {
        (**self).status(code, reason)
    }

    fn header(&mut self, name: &str, values: &[&[u8]]) -> io::Result<()> {
        (**self).header(name, values)
    }

    fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
        (**self).write(chunk)
    }

    fn end(&mut self) -> io::Result<()> {
        (**self).end()
    }
}

/// The engine response object a [`MiniHttpSink`] drives.
///
/// `may_minihttp` only accepts `'static` status reasons and header lines, which the
/// sink provides through [`intern`].
pub trait EngineResponse {
    fn set_status(&mut self, code: usize, reason: &'static str);
    fn add_header(&mut self, line: &'static str);
    fn body_mut(&mut self) -> &mut BytesMut;
}

impl EngineResponse for Response<'_> {
    fn set_status(&mut self, code: usize, reason: &'static str) {
        self.status_code(code, reason);
    }

    fn add_header(&mut self, line: &'static str) {
        self.header(line);
    }

    fn body_mut(&mut self) -> &mut BytesMut {
        Response::body_mut(self)
    }
}

/// [`ResponseSink`] over a `may_minihttp::Response`.
///
/// The engine buffers the body and frames the response itself once the service
/// returns, so `content-length` and `transfer-encoding` from the standard response
/// are not forwarded.
///
/// # Failure modes
///
/// - more than 16 header lines: `Other`
/// - a header value containing CR or LF: `InvalidData`
/// - `write` or `end` after `end`: `Other`
pub struct MiniHttpSink<'r, R: ?Sized> {
    res: &'r mut R,
    header_count: usize,
    bytes_written: usize,
    ended: bool,
}

impl<'r, R: EngineResponse + ?Sized> MiniHttpSink<'r, R> {
    pub fn new(res: &'r mut R) -> Self {
        Self {
            res,
            header_count: 0,
            bytes_written: 0,
            ended: false,
        }
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Body bytes appended so far.
    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }
}

impl<R: EngineResponse + ?Sized> ResponseSink for MiniHttpSink<'_, R> {
    fn status(&mut self, code: u16, reason: &str) -> io::Result<()> {
        self.res.set_status(code as usize, static_reason(code, reason));
        Ok(())
    }

    fn header(&mut self, name: &str, values: &[&[u8]]) -> io::Result<()> {
        if name.eq_ignore_ascii_case("content-length")
            || name.eq_ignore_ascii_case("transfer-encoding")
        {
            debug!(header = %name, "Framing header left to the engine");
            return Ok(());
        }
        for value in values {
            if value.iter().any(|b| *b == b'\r' || *b == b'\n') {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("header {name} contains a line break"),
                ));
            }
            if self.header_count >= MAX_RESPONSE_HEADERS {
                return Err(io::Error::other(format!(
                    "response header limit of {MAX_RESPONSE_HEADERS} reached"
                )));
            }
            let line = format!("{name}: {}", String::from_utf8_lossy(value));
            self.res.add_header(intern(&line));
            self.header_count += 1;
        }
        Ok(())
    }

    fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
        if self.ended {
            return Err(io::Error::other("write after end"));
        }
        self.res.body_mut().extend_from_slice(chunk);
        self.bytes_written += chunk.len();
        Ok(())
    }

    fn end(&mut self) -> io::Result<()> {
        if self.ended {
            return Err(io::Error::other("response already ended"));
        }
        self.ended = true;
        Ok(())
    }
}

/// Process-wide table of leaked header lines and reason phrases.
static INTERNED: OnceLock<DashSet<&'static str>> = OnceLock::new();

/// Return a `'static` copy of `text`, leaking it only the first time it is seen.
///
/// Repeated lines (`content-type: application/json`, `cache-control: no-cache`) cost
/// one allocation for the life of the process. Values that differ on every response
/// (session cookies, `etag`, `date`) still add one entry each, so services emitting
/// them at high volume grow the table with traffic.
fn intern(text: &str) -> &'static str {
    let table = INTERNED.get_or_init(DashSet::new);
    if let Some(existing) = table.get(text) {
        return *existing;
    }
    let leaked: &'static str = Box::leak(text.to_owned().into_boxed_str());
    // Two racing callers may both leak; the first insert wins the slot.
    table.insert(leaked);
    leaked
}

/// The engine wants a `'static` reason phrase; canonical reasons are reused, custom
/// ones are interned like header lines.
fn static_reason(code: u16, reason: &str) -> &'static str {
    let canonical = StatusCode::from_u16(code)
        .ok()
        .and_then(|status| status.canonical_reason());
    match canonical {
        Some(canonical) if reason.is_empty() || canonical == reason => canonical,
        _ if reason.is_empty() => "",
        _ => intern(reason),
    }
}
