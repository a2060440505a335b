//! The built-in echo handler.
//!
//! Register it on your router:
//!
//! ```rust,no_run
//! use reverb::{Router, echo};
//!
//! let app = Router::new().route("/echo", echo::echo);
//! ```

use http_body_util::BodyExt;
use tracing::error;

use crate::response::BoxError;
use crate::{Request, Response};

/// Streams the request body back as the response body, byte-for-byte.
///
/// Any method and any content type are accepted; the bytes are never
/// inspected. The copy is streaming, so memory usage is bounded no matter
/// how large the payload is. An empty body echoes as an empty `200 OK`.
///
/// If reading the body fails mid-stream (client disconnects, stream reset),
/// the error is logged and the exchange aborted. The `200` status is already
/// on the wire by then, so no error status is attempted; the client sees a
/// truncated response. Other in-flight requests are unaffected.
pub async fn echo(req: Request) -> Response {
    let peer = req.remote_addr();
    let body = req.into_body().map_err(move |e| {
        error!(peer = %peer, "failed to echo request body: {e}");
        Box::new(e) as BoxError
    });
    Response::stream(body)
}
