//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.
//!
//! A [`Response`] is a thin wrapper over `http::Response` with a boxed body,
//! so a handler can answer with a buffered payload ([`Response::text`]) or
//! forward a live stream ([`Response::stream`]) through the same type.

use bytes::Bytes;
use http::StatusCode;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full};

/// Boxed error type carried by streamed response bodies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub(crate) type Body = BoxBody<Bytes, BoxError>;

fn full(bytes: Vec<u8>) -> Body {
    Full::new(Bytes::from(bytes)).map_err(|e| match e {}).boxed()
}

fn empty() -> Body {
    Empty::new().map_err(|e| match e {}).boxed()
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// # Shortcuts (200 OK, no custom headers needed)
///
/// ```rust
/// use reverb::Response;
/// use http::StatusCode;
///
/// Response::text("hello");
/// Response::status(StatusCode::NO_CONTENT);
/// ```
///
/// # Builder (custom status or headers)
///
/// ```rust
/// use reverb::Response;
/// use http::StatusCode;
///
/// Response::builder()
///     .status(StatusCode::CREATED)
///     .header("location", "/users/42")
///     .text("created");
/// ```
pub struct Response {
    inner: http::Response<Body>,
}

impl Response {
    /// `200 OK` — `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::builder().text(body)
    }

    /// Response with the given status and no body.
    pub fn status(status: StatusCode) -> Self {
        Self::builder().status(status).no_body()
    }

    /// `200 OK` — the response body is the given stream, forwarded frame by
    /// frame. Memory usage stays bounded regardless of how many bytes flow
    /// through.
    ///
    /// Once the status line and headers are on the wire the status can no
    /// longer change; a mid-stream error aborts the exchange instead.
    pub fn stream<B>(body: B) -> Self
    where
        B: hyper::body::Body<Data = Bytes> + Send + Sync + 'static,
        B::Error: Into<BoxError>,
    {
        Self::builder().stream(body)
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { inner: http::Response::builder() }
    }

    pub(crate) fn into_inner(self) -> http::Response<Body> {
        self.inner
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `200 OK`. Terminated by a
/// body method; an invalid header name or value collapses the response to
/// `500 Internal Server Error` rather than panicking on the request path.
pub struct ResponseBuilder {
    inner: http::response::Builder,
}

impl ResponseBuilder {
    pub fn status(mut self, status: StatusCode) -> Self {
        self.inner = self.inner.status(status);
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.inner = self.inner.header(name, value);
        self
    }

    /// Terminate with a plain-text body (`text/plain; charset=utf-8`).
    pub fn text(self, body: impl Into<String>) -> Response {
        self.inner
            .header(http::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(full(body.into().into_bytes()))
            .map_or_else(|_| internal_error(), |inner| Response { inner })
    }

    /// Terminate with a streamed body. No content-type is set — the stream
    /// is forwarded as-is.
    pub fn stream<B>(self, body: B) -> Response
    where
        B: hyper::body::Body<Data = Bytes> + Send + Sync + 'static,
        B::Error: Into<BoxError>,
    {
        self.inner
            .body(body.map_err(Into::into).boxed())
            .map_or_else(|_| internal_error(), |inner| Response { inner })
    }

    /// Terminate with no body.
    pub fn no_body(self) -> Response {
        self.inner
            .body(empty())
            .map_or_else(|_| internal_error(), |inner| Response { inner })
    }
}

fn internal_error() -> Response {
    let mut inner = http::Response::new(empty());
    *inner.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    Response { inner }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
///
/// Implemented for `Response` itself, string types (200 text responses), and
/// bare [`StatusCode`]s, so all of these are valid handler return types:
///
/// ```rust,no_run
/// # use reverb::{Request, Response};
/// # use http::StatusCode;
/// async fn greet(_req: Request) -> &'static str { "hi" }
/// async fn gone(_req: Request) -> StatusCode { StatusCode::GONE }
/// async fn custom(_req: Request) -> Response { Response::text("hi") }
/// ```
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response {
        self
    }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response {
        Response::text(self)
    }
}

impl IntoResponse for String {
    fn into_response(self) -> Response {
        Response::text(self)
    }
}

impl IntoResponse for StatusCode {
    fn into_response(self) -> Response {
        Response::status(self)
    }
}
