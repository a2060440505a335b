//! reverb: an HTTP echo server.
//!
//! Wiring happens here, in a fixed order: build the router, bind, start,
//! wait for a termination signal, stop with the configured grace period.
//!
//! ```text
//! reverb --addr 0.0.0.0:8080 --grace-period 30
//! curl -X POST http://localhost:8080/echo -d 'hello'
//! ```

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use reverb::{Router, Server, echo, shutdown_signal};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Address to bind, as host:port
    #[arg(long, default_value = "0.0.0.0:8080")]
    addr: String,

    /// Seconds to wait for in-flight requests on shutdown before forcibly
    /// closing connections
    #[arg(long, default_value_t = 30)]
    grace_period: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let app = Router::new().route("/echo", echo::echo);

    let handle = match Server::bind(args.addr.as_str()).start(app).await {
        Ok(handle) => handle,
        Err(e) => {
            error!("startup failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    shutdown_signal().await;

    match handle.stop(Duration::from_secs(args.grace_period)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
