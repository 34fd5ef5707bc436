//! # BRRTRouter Bridge
//!
//! Adapts `may_minihttp`'s native requests and responses to framework-agnostic HTTP
//! messages, so applications written against standard request/response types can run
//! on the `may` coroutine server.
//!
//! ## Overview
//!
//! The bridge is two stateless converters and their factories:
//!
//! - **Request adapter** ([`server::EngineRequestFactory`]) - turns an
//!   [`engine::EngineRequest`] (server variables, header and cookie bags, raw body,
//!   spooled uploads) into a [`message::ServerRequest`]
//! - **Response emitter** ([`server::Emitter`]) - writes an `http::Response<Stream>`
//!   onto an [`engine::ResponseSink`] in bounded chunks and ends it exactly once
//!
//! The engine does all socket I/O, HTTP framing and multipart parsing. The bridge
//! only copies fields across.
//!
//! ## Modules
//!
//! - **[`engine`]** - native request capture and the outbound response sink
//! - **[`message`]** - standard request, URI, body stream, parameters, uploaded files
//! - **[`server`]** - the converters, `BridgeService` and `HttpServer`
//! - **[`runtime_config`]** - environment/YAML configuration
//! - **[`logging`]** - `tracing` subscriber setup
//!
//! ## Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Engine as may_minihttp
//!     participant Adapter as EngineRequestFactory
//!     participant App as Handler
//!     participant Emitter
//!
//!     Client->>Engine: HTTP request
//!     Engine->>Adapter: EngineRequest
//!     Adapter->>App: ServerRequest
//!     App-->>Emitter: http::Response<Stream>
//!     Emitter->>Engine: status, headers, body chunks, end
//!     Engine-->>Client: HTTP response
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use brrtrouter_bridge::message::{Stream, ServerRequest};
//! use brrtrouter_bridge::runtime_config::BridgeConfig;
//! use brrtrouter_bridge::server::HttpServer;
//!
//! let config = BridgeConfig::from_env();
//!
//! let handle = HttpServer::serve(
//!     |req: ServerRequest| {
//!         let name = req.query_params().get("name").unwrap_or("world").to_string();
//!         http::Response::builder()
//!             .header("content-type", "text/plain")
//!             .body(Stream::from(format!("hello {name}")))
//!             .unwrap_or_default()
//!     },
//!     "0.0.0.0:8080",
//!     &config,
//! )
//! .unwrap();
//! handle.join().ok();
//! ```
//!
//! ## Header Representation
//!
//! Headers are multi-valued on both sides. The adapter appends every header from the
//! engine's bag to an `http::HeaderMap`; the cookie bag is re-serialized as a single
//! `cookie` value. The emitter hands each header name to the sink once, with all of
//! its values in order.

pub mod engine;
pub mod logging;
pub mod message;
pub mod runtime_config;
pub mod server;

pub use engine::{EngineRequest, FileDescriptor, ResponseSink, ServerVars};
pub use message::{Params, ReasonPhrase, ServerRequest, Stream, UploadedFile, Uri};
pub use server::{
    DefaultEmitterFactory, Emitter, EmitterFactory, EngineRequestFactory, ResponseEmitter,
    ServerRequestFactory,
};
