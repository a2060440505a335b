//! # reverb
//!
//! A minimal HTTP echo service with explicit lifecycle control.
//! Nothing more. Nothing less.
//!
//! ## The contract
//!
//! reverb does exactly three things:
//!
//! - **Echo** — `/echo` streams the request body back verbatim, bounded
//!   memory regardless of payload size. Any method, any content type.
//! - **Routing** — exact-path lookup via [`matchit`]; anything unmatched is
//!   a bodyless 404.
//! - **Lifecycle** — [`Server::start`] fails synchronously on a bind error,
//!   [`ServerHandle::stop`] drains in-flight requests up to a deadline and
//!   forcibly closes whatever remains.
//!
//! Everything a reverse proxy already owns — TLS, rate limiting, body-size
//! limits, slow-client protection — reverb intentionally ignores.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use reverb::{Router, Server, echo, shutdown_signal};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), reverb::Error> {
//!     let app = Router::new().route("/echo", echo::echo);
//!
//!     let handle = Server::bind("0.0.0.0:8080").start(app).await?;
//!     shutdown_signal().await;
//!     handle.stop(Duration::from_secs(30)).await
//! }
//! ```

mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod echo;

pub use error::Error;
pub use handler::Handler;
pub use request::Request;
pub use response::{BoxError, IntoResponse, Response};
pub use router::Router;
pub use server::{Server, ServerHandle, shutdown_signal};
