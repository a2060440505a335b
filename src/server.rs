//! HTTP server lifecycle: bind, serve, graceful stop.
//!
//! # Lifecycle
//!
//! ```text
//! Server::bind(addr)          Created
//!     .start(router).await?   Running — listener bound, accept loop spawned
//! handle.stop(grace).await?   Stopped — drained, or forced at the deadline
//! ```
//!
//! `start` fails fast with [`Error::Bind`] when the address is taken, so a
//! bootstrapper can abort before reporting the process ready. `stop`:
//!
//! 1. Immediately stops `listener.accept()` — no new connections.
//! 2. Asks every in-flight connection to finish its current exchange and
//!    close (idle keep-alive connections close right away).
//! 3. Waits up to `grace`; whatever is still open at the deadline is
//!    forcibly closed and [`Error::ShutdownTimeout`] is returned.
//!
//! Whoever owns the process lifecycle decides the grace period. Under
//! Kubernetes, keep it below `terminationGracePeriodSeconds` so the forced
//! close happens before SIGKILL does it for you.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{error, info};

use crate::error::Error;
use crate::request::Request;
use crate::response::{Body, Response};
use crate::router::Router;

/// A configured, not-yet-started HTTP server.
pub struct Server {
    addr: String,
}

impl Server {
    /// Configures the server to bind to `addr` when [`start`](Server::start)
    /// is called. Nothing is validated here — an unparsable address surfaces
    /// as [`Error::Bind`] from `start`.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use reverb::Server;
    /// let server = Server::bind("0.0.0.0:8080");
    /// ```
    pub fn bind(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    /// Binds the listener and starts accepting connections, dispatching
    /// them through `router` on a background task.
    ///
    /// Returns as soon as the listener is bound — serving happens
    /// asynchronously. The returned [`ServerHandle`] is the only way to
    /// reach the running server; stopping twice or stopping a server that
    /// never started is unrepresentable.
    ///
    /// # Errors
    ///
    /// [`Error::Bind`] if the address cannot be parsed or bound. No task is
    /// spawned on failure.
    pub async fn start(self, router: Router) -> Result<ServerHandle, Error> {
        let bind_err = |source: std::io::Error| Error::Bind {
            addr: self.addr.clone(),
            source,
        };

        let addr: SocketAddr = self.addr.parse().map_err(|e| {
            bind_err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
        })?;
        let listener = TcpListener::bind(addr).await.map_err(bind_err)?;
        let local_addr = listener.local_addr().map_err(bind_err)?;

        info!(addr = %local_addr, "server started");

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(accept_loop(listener, Arc::new(router), shutdown_rx));

        Ok(ServerHandle {
            local_addr,
            shutdown: shutdown_tx,
            task,
        })
    }
}

/// A running HTTP server.
///
/// Dropping the handle without calling [`stop`](ServerHandle::stop) also
/// shuts the server down (the accept loop notices the closed channel), but
/// without a deadline — call `stop` to bound the drain.
#[derive(Debug)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// The address the listener actually bound — useful when binding port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Gracefully stops the server, waiting up to `grace` for in-flight
    /// requests to finish.
    ///
    /// New connections are refused immediately. Each open connection
    /// completes its current exchange and closes; idle connections close at
    /// once.
    ///
    /// # Errors
    ///
    /// [`Error::ShutdownTimeout`] if the drain outlives `grace`. The
    /// remaining connections have been forcibly closed by the time this
    /// returns — `stop` never hangs past the deadline.
    pub async fn stop(mut self, grace: Duration) -> Result<(), Error> {
        // Receivers outlive this send only while draining; an Err here means
        // the accept loop is already gone, which is fine.
        let _ = self.shutdown.send(true);

        match tokio::time::timeout(grace, &mut self.task).await {
            Ok(_) => {
                info!("server stopped");
                Ok(())
            }
            Err(_) => {
                // Aborting the accept task drops its JoinSet, which aborts
                // every remaining connection task and closes their sockets.
                self.task.abort();
                let _ = (&mut self.task).await;
                error!(
                    grace = ?grace,
                    "graceful shutdown deadline exceeded, remaining connections closed"
                );
                Err(Error::ShutdownTimeout { grace })
            }
        }
    }
}

// ── Accept loop ───────────────────────────────────────────────────────────────

async fn accept_loop(
    listener: TcpListener,
    router: Arc<Router>,
    mut shutdown: watch::Receiver<bool>,
) {
    // JoinSet tracks every spawned connection task so the drain below can
    // wait for them all.
    let mut tasks = JoinSet::new();

    loop {
        // Cloned before the select because the shutdown arm holds a mutable
        // borrow of `shutdown` for the whole statement.
        let conn_shutdown = shutdown.clone();
        tokio::select! {
            // `biased` makes select! check arms top-to-bottom. Shutdown is
            // checked first so a stop request wins over queued connections.
            biased;

            _ = shutdown.wait_for(|&stop| stop) => {
                info!(in_flight = tasks.len(), "draining connections");
                break;
            }

            res = listener.accept() => {
                let (stream, remote_addr) = match res {
                    Ok(v) => v,
                    Err(e) => {
                        error!("accept error: {e}");
                        continue;
                    }
                };
                tasks.spawn(serve_connection(
                    stream,
                    remote_addr,
                    Arc::clone(&router),
                    conn_shutdown,
                ));
            }

            // Reap finished connection tasks so the JoinSet does not grow
            // without bound on long-running servers.
            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
        }
    }

    // Close the listening socket before draining so the port frees up even
    // if in-flight requests take a while.
    drop(listener);
    while tasks.join_next().await.is_some() {}
}

/// Serves one connection until it closes or shutdown asks it to wrap up.
async fn serve_connection(
    stream: TcpStream,
    remote_addr: SocketAddr,
    router: Arc<Router>,
    mut shutdown: watch::Receiver<bool>,
) {
    // TokioIo adapts tokio's AsyncRead/AsyncWrite to the hyper IO traits.
    let io = TokioIo::new(stream);

    // `service_fn` turns a plain async function into a hyper `Service`. The
    // closure runs once per request on the connection, not once per
    // connection.
    let svc = service_fn(move |req| {
        let router = Arc::clone(&router);
        async move { dispatch(router, req, remote_addr).await }
    });

    // `auto::Builder` transparently handles both HTTP/1.1 and HTTP/2 —
    // whatever the client negotiates.
    let builder = ConnBuilder::new(TokioExecutor::new());
    let conn = builder.serve_connection(io, svc);
    tokio::pin!(conn);

    tokio::select! {
        res = conn.as_mut() => {
            if let Err(e) = res {
                error!(peer = %remote_addr, "connection error: {e}");
            }
            return;
        }
        _ = shutdown.wait_for(|&stop| stop) => {
            // Finish the in-flight exchange, then close. An idle keep-alive
            // connection closes immediately.
            conn.as_mut().graceful_shutdown();
        }
    }

    if let Err(e) = conn.await {
        error!(peer = %remote_addr, "connection error: {e}");
    }
}

/// Core hot path: routes one request and produces one response.
///
/// The error type is [`Infallible`](std::convert::Infallible) — all failures
/// become HTTP responses (404, 500) so hyper never sees an error.
async fn dispatch(
    router: Arc<Router>,
    req: hyper::Request<hyper::body::Incoming>,
    remote_addr: SocketAddr,
) -> Result<http::Response<Body>, std::convert::Infallible> {
    let path = req.uri().path().to_owned();

    let response = match router.lookup(&path) {
        Some((handler, params)) => handler.call(Request::new(req, params, remote_addr)).await,
        None => Response::status(http::StatusCode::NOT_FOUND),
    };

    Ok(response.into_inner())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both **SIGTERM** (sent by process supervisors
/// and the Kubernetes control plane) and **SIGINT** (Ctrl-C, for local
/// dev). On Windows only Ctrl-C is available. The bootstrapper awaits this,
/// then calls [`ServerHandle::stop`]:
///
/// ```rust,no_run
/// # use std::time::Duration;
/// # use reverb::{Router, Server, echo, shutdown_signal};
/// # #[tokio::main] async fn main() -> Result<(), reverb::Error> {
/// let app = Router::new().route("/echo", echo::echo);
/// let handle = Server::bind("0.0.0.0:8080").start(app).await?;
/// shutdown_signal().await;
/// handle.stop(Duration::from_secs(30)).await
/// # }
/// ```
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    // `pending()` never resolves — on non-Unix platforms the SIGTERM arm is
    // effectively disabled.
    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c  => {}
        () = sigterm => {}
    }
}
