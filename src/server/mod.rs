//! # Server Module
//!
//! The two converters between `may_minihttp` and the standard messages, plus the
//! service and server wrappers that run them per request.
//!
//! - [`EngineRequestFactory`] - native request → [`ServerRequest`](crate::message::ServerRequest)
//! - [`Emitter`] - standard response → native response sink
//! - [`BridgeService`] - `may_minihttp::HttpService` wiring both around a handler
//! - [`HttpServer`] - server lifecycle (start, wait until ready, stop)

pub mod emitter;
pub mod http_server;
pub mod request;
pub mod service;

pub use emitter::{
    DefaultEmitterFactory, Emitter, EmitterFactory, ResponseEmitter, DEFAULT_BUFFER_SIZE,
};
pub use http_server::{HttpServer, ServerHandle};
pub use request::{create_uri, parse_protocol_version, EngineRequestFactory, ServerRequestFactory};
pub use service::BridgeService;
