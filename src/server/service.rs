use super::emitter::{DefaultEmitterFactory, EmitterFactory, ResponseEmitter};
use super::request::{EngineRequestFactory, ServerRequestFactory};
use crate::engine::{EngineRequest, MiniHttpSink};
use crate::message::{Response, ServerRequest};
use may_minihttp::{HttpService, Request, Response as MiniResponse};
use std::io;
use std::sync::Arc;
use tracing::debug;

/// `may_minihttp` service that runs every request through the bridge.
///
/// Each inbound request is captured as an [`EngineRequest`], converted into a
/// [`ServerRequest`], handed to `handler`, and the returned response is emitted back
/// into the engine. `HEAD` requests are emitted without a body.
pub struct BridgeService<H> {
    handler: Arc<H>,
    requests: EngineRequestFactory,
    emitters: DefaultEmitterFactory,
    local_port: Option<u16>,
}

impl<H> Clone for BridgeService<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            requests: self.requests.clone(),
            emitters: self.emitters,
            local_port: self.local_port,
        }
    }
}

impl<H> BridgeService<H>
where
    H: Fn(ServerRequest) -> Response + Send + Sync + 'static,
{
    pub fn new(handler: H) -> Self {
        Self {
            handler: Arc::new(handler),
            requests: EngineRequestFactory::default(),
            emitters: DefaultEmitterFactory::default(),
            local_port: None,
        }
    }

    #[must_use]
    pub fn with_request_factory(mut self, requests: EngineRequestFactory) -> Self {
        self.requests = requests;
        self
    }

    #[must_use]
    pub fn with_emitter_factory(mut self, emitters: DefaultEmitterFactory) -> Self {
        self.emitters = emitters;
        self
    }

    /// Port the server listens on, reported as `SERVER_PORT`.
    #[must_use]
    pub fn with_local_port(mut self, port: u16) -> Self {
        self.local_port = Some(port);
        self
    }
}

impl<H> HttpService for BridgeService<H>
where
    H: Fn(ServerRequest) -> Response + Send + Sync + 'static,
{
    fn call(&mut self, req: Request, res: &mut MiniResponse) -> io::Result<()> {
        let native = EngineRequest::from_minihttp(req, self.local_port)?;
        let head_only = native.method.eq_ignore_ascii_case("HEAD");

        let request = self.requests.create(&native);
        let mut response = (self.handler)(request);

        let mut emitter = self.emitters.create(MiniHttpSink::new(res));
        emitter.emit(&mut response, head_only)?;

        debug!(
            status = response.status().as_u16(),
            bytes_written = emitter.sink().bytes_written(),
            "Bridge call finished"
        );
        Ok(())
    }
}
