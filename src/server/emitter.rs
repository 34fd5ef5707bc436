use crate::engine::ResponseSink;
use crate::message::{ReasonPhrase, Response, Stream};
use std::io;
use tracing::{debug, info};

/// Default body chunk size: 8 MiB.
pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024 * 1024;

/// Writes a standard response to the engine.
pub trait ResponseEmitter {
    /// Emit `response`; with `without_body` only the status line and headers are sent.
    ///
    /// # Errors
    ///
    /// Sink and body stream errors propagate unchanged.
    fn emit(&mut self, response: &mut Response, without_body: bool) -> io::Result<()>;
}

/// Creates emitters bound to a sink.
pub trait EmitterFactory {
    fn create<S: ResponseSink>(&self, sink: S) -> Emitter<S>;
}

/// Emits responses into a [`ResponseSink`] in chunks of at most `buffer_size` bytes.
///
/// ```
/// use brrtrouter_bridge::server::{Emitter, DEFAULT_BUFFER_SIZE};
/// # use brrtrouter_bridge::engine::ResponseSink;
/// # struct Discard;
/// # impl ResponseSink for Discard {
/// #     fn status(&mut self, _: u16, _: &str) -> std::io::Result<()> { Ok(()) }
/// #     fn header(&mut self, _: &str, _: &[&[u8]]) -> std::io::Result<()> { Ok(()) }
/// #     fn write(&mut self, _: &[u8]) -> std::io::Result<()> { Ok(()) }
/// #     fn end(&mut self) -> std::io::Result<()> { Ok(()) }
/// # }
///
/// let emitter = Emitter::new(Discard);
/// assert_eq!(emitter.buffer_size(), DEFAULT_BUFFER_SIZE);
/// let emitter = emitter.with_buffer_size(4096);
/// assert_eq!(emitter.buffer_size(), 4096);
/// ```
#[derive(Debug, Clone)]
pub struct Emitter<S> {
    sink: S,
    buffer_size: usize,
}

impl<S: ResponseSink> Emitter<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Same emitter with a different chunk size; sizes below 1 become 1.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_inner(self) -> S {
        self.sink
    }

    fn emit_body(&mut self, body: &mut Stream) -> io::Result<(usize, usize)> {
        if body.is_seekable() {
            body.rewind()?;
        }

        let mut chunks = 0;
        let mut total = 0;
        while !body.eof() {
            let chunk = body.read(self.buffer_size)?;
            if chunk.is_empty() {
                continue;
            }
            self.sink.write(&chunk)?;
            chunks += 1;
            total += chunk.len();
        }
        Ok((chunks, total))
    }
}

impl<S: ResponseSink> ResponseEmitter for Emitter<S> {
    fn emit(&mut self, response: &mut Response, without_body: bool) -> io::Result<()> {
        let status = response.status().as_u16();
        self.sink.status(status, ReasonPhrase::of(response))?;

        for name in response.headers().keys() {
            let values: Vec<&[u8]> = response
                .headers()
                .get_all(name)
                .iter()
                .map(|v| v.as_bytes())
                .collect();
            self.sink.header(name.as_str(), &values)?;
        }

        let (chunks, total) = if without_body {
            (0, 0)
        } else {
            self.emit_body(response.body_mut())?
        };

        self.sink.end()?;

        debug!(chunks, buffer_size = self.buffer_size, "Response body emitted");
        info!(
            status = status,
            header_count = response.headers().len(),
            body_size_bytes = total,
            without_body = without_body,
            "Response emitted"
        );
        Ok(())
    }
}

/// Factory for [`Emitter`]s sharing one buffer size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultEmitterFactory {
    buffer_size: usize,
}

impl DefaultEmitterFactory {
    /// Sizes below 1 become 1.
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buffer_size: buffer_size.max(1),
        }
    }

    #[must_use]
    pub fn with_buffer_size(self, buffer_size: usize) -> Self {
        Self::new(buffer_size)
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }
}

impl Default for DefaultEmitterFactory {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SIZE)
    }
}

impl EmitterFactory for DefaultEmitterFactory {
    fn create<S: ResponseSink>(&self, sink: S) -> Emitter<S> {
        Emitter::new(sink).with_buffer_size(self.buffer_size)
    }
}
