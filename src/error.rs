//! Unified error type.

use std::fmt;
use std::time::Duration;

/// The error type returned by reverb's lifecycle operations.
///
/// Per-request failures (404, an echo stream cut short) are expressed as
/// HTTP responses or logged and abandoned — they never become an `Error`.
/// This type surfaces the two failures the bootstrapper must see: the
/// listener could not be bound, or a graceful shutdown ran out of time.
#[derive(Debug)]
pub enum Error {
    /// The configured address could not be bound — port in use, permission
    /// denied, or not a valid `host:port` string. Fatal to startup: the
    /// process must not report itself ready.
    Bind {
        addr: String,
        source: std::io::Error,
    },
    /// In-flight requests did not finish within the shutdown grace period.
    /// The remaining connections have already been forcibly closed by the
    /// time the caller sees this.
    ShutdownTimeout { grace: Duration },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bind { addr, source } => {
                write!(f, "failed to bind {addr}: {source}")
            }
            Self::ShutdownTimeout { grace } => {
                write!(
                    f,
                    "graceful shutdown did not complete within {grace:?}, connections forcibly closed"
                )
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Bind { source, .. } => Some(source),
            Self::ShutdownTimeout { .. } => None,
        }
    }
}
