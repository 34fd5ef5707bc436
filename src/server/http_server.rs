use super::service::BridgeService;
use crate::message::{Response, ServerRequest};
use crate::runtime_config::BridgeConfig;
use may::coroutine::JoinHandle;
use may_minihttp::{HttpServerWithHeaders, HttpService};
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// Runs a `may_minihttp` service, typically a [`BridgeService`].
///
/// Requests may carry up to 32 headers, enough for traffic that passed through
/// gateways and proxies.
pub struct HttpServer<T>(pub T);

/// Handle to a running bridge server
///
/// Owns the accept coroutine. Dropping the handle leaves the server running; call
/// [`stop`](ServerHandle::stop) to shut it down.
pub struct ServerHandle {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ServerHandle {
    /// Address the server was bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Block until the server accepts TCP connections
    ///
    /// # Returns
    ///
    /// `Ok(())` once a TCP connection succeeds
    ///
    /// # Errors
    ///
    /// Returns `TimedOut` if no connection succeeds within ~250ms (50 attempts, 5ms apart).
    pub fn wait_ready(&self) -> io::Result<()> {
        for _ in 0..50 {
            if TcpStream::connect(self.addr).is_ok() {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(5));
        }
        Err(io::Error::new(io::ErrorKind::TimedOut, "server not ready"))
    }

    /// Cancel the accept coroutine and wait for it to exit
    pub fn stop(self) {
        // SAFETY: `cancel` is unsafe only because the coroutine may be observed after
        // cancellation; the handle is consumed here and joined right away.
        unsafe {
            self.handle.coroutine().cancel();
        }
        if self.handle.join().is_err() {
            debug!(addr = %self.addr, "Server coroutine ended by cancellation");
        }
    }

    /// Block until the accept coroutine finishes
    ///
    /// The server runs until it is cancelled, so this normally blocks for the life
    /// of the process.
    ///
    /// # Errors
    ///
    /// Returns the panic payload if the coroutine panicked.
    pub fn join(self) -> std::thread::Result<()> {
        self.handle.join()
    }
}

impl<T: HttpService + Clone + Send + Sync + 'static> HttpServer<T> {
    /// Bind and start serving
    ///
    /// # Arguments
    ///
    /// * `addr` - Address to bind to (e.g. `"0.0.0.0:9501"`)
    ///
    /// # Returns
    ///
    /// A [`ServerHandle`] for the running server
    ///
    /// # Errors
    ///
    /// Returns an error if the address does not resolve or cannot be bound.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        let addr = resolve(addr)?;
        let handle = HttpServerWithHeaders::<_, 32>(self.0).start(addr)?;
        info!(addr = %addr, "Bridge server listening");
        Ok(ServerHandle { addr, handle })
    }
}

impl<H> HttpServer<BridgeService<H>>
where
    H: Fn(ServerRequest) -> Response + Send + Sync + 'static,
{
    /// Serve `handler` through the bridge with settings from `config`
    ///
    /// Applies the coroutine stack size, builds the request and emitter factories,
    /// and reports the bound port to the application as `SERVER_PORT`.
    ///
    /// # Arguments
    ///
    /// * `handler` - Turns each converted request into a standard response
    /// * `addr` - Address to bind to; the port must be explicit (not `0`)
    /// * `config` - Buffer size, stack size and script name
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for port `0`, otherwise the errors of [`HttpServer::start`].
    pub fn serve<A: ToSocketAddrs>(
        handler: H,
        addr: A,
        config: &BridgeConfig,
    ) -> io::Result<ServerHandle> {
        let addr = resolve(addr)?;
        if addr.port() == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "bridge servers need an explicit port",
            ));
        }
        config.apply_runtime();
        let service = BridgeService::new(handler)
            .with_request_factory(config.request_factory())
            .with_emitter_factory(config.emitter_factory())
            .with_local_port(addr.port());
        debug!(
            buffer_size = config.buffer_size,
            stack_size = config.stack_size,
            "Bridge service configured"
        );
        HttpServer(service).start(addr)
    }
}

fn resolve<A: ToSocketAddrs>(addr: A) -> io::Result<SocketAddr> {
    addr.to_socket_addrs()?
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid address"))
}
