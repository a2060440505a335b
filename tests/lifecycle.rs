//! End-to-end tests driving a real listener through a hyper client
//! connection: echo round-trips, routing misses, bind conflicts, and both
//! graceful and forced shutdown.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use reverb::{Error, Request, Response, Router, Server, echo};
use tokio::net::TcpStream;

fn echo_app() -> Router {
    Router::new().route("/echo", echo::echo)
}

async fn connect(addr: SocketAddr) -> http1::SendRequest<Full<Bytes>> {
    let stream = TcpStream::connect(addr).await.expect("connect");
    let (send, conn) = http1::handshake(TokioIo::new(stream)).await.expect("handshake");
    tokio::spawn(conn);
    send
}

/// One request on a fresh connection; returns status and collected body.
async fn request(
    addr: SocketAddr,
    method: &str,
    path: &str,
    body: impl Into<Bytes>,
) -> (StatusCode, Bytes) {
    let mut send = connect(addr).await;
    let req = http::Request::builder()
        .method(method)
        .uri(path)
        .header("host", "localhost")
        .body(Full::new(body.into()))
        .expect("request");
    let res = send.send_request(req).await.expect("response");
    let status = res.status();
    let body = res.into_body().collect().await.expect("body").to_bytes();
    (status, body)
}

#[tokio::test]
async fn echo_round_trips_the_body() {
    let handle = Server::bind("127.0.0.1:0")
        .start(echo_app())
        .await
        .expect("start");
    let addr = handle.local_addr();

    let (status, body) = request(addr, "POST", "/echo", "hello").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"hello");

    // Empty body echoes as an empty 200.
    let (status, body) = request(addr, "POST", "/echo", Bytes::new()).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());

    handle.stop(Duration::from_secs(5)).await.expect("stop");
}

#[tokio::test]
async fn echo_streams_large_bodies_exactly() {
    let handle = Server::bind("127.0.0.1:0")
        .start(echo_app())
        .await
        .expect("start");
    let addr = handle.local_addr();

    // Large enough to span many transport frames.
    let payload: Vec<u8> = (0..4 * 1024 * 1024).map(|i| (i % 251) as u8).collect();

    let (status, body) = request(addr, "POST", "/echo", payload.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], &payload[..]);

    handle.stop(Duration::from_secs(5)).await.expect("stop");
}

#[tokio::test]
async fn echo_accepts_any_method() {
    let handle = Server::bind("127.0.0.1:0")
        .start(echo_app())
        .await
        .expect("start");
    let addr = handle.local_addr();

    for method in ["GET", "PUT", "PATCH", "DELETE"] {
        let (status, body) = request(addr, method, "/echo", "ping").await;
        assert_eq!(status, StatusCode::OK, "method {method}");
        assert_eq!(&body[..], b"ping", "method {method}");
    }

    handle.stop(Duration::from_secs(5)).await.expect("stop");
}

#[tokio::test]
async fn unknown_route_is_404_with_empty_body() {
    let handle = Server::bind("127.0.0.1:0")
        .start(echo_app())
        .await
        .expect("start");
    let addr = handle.local_addr();

    for path in ["/nonexistent", "/", "/echo/extra"] {
        let (status, body) = request(addr, "GET", path, Bytes::new()).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "path {path}");
        assert!(body.is_empty(), "path {path}");
    }

    handle.stop(Duration::from_secs(5)).await.expect("stop");
}

#[tokio::test]
async fn second_bind_on_same_address_fails() {
    let first = Server::bind("127.0.0.1:0")
        .start(echo_app())
        .await
        .expect("start");
    let addr = first.local_addr();

    let err = Server::bind(addr.to_string())
        .start(echo_app())
        .await
        .expect_err("second bind must fail");
    assert!(matches!(err, Error::Bind { .. }), "got: {err}");

    // The first server is unaffected and keeps serving.
    let (status, body) = request(addr, "POST", "/echo", "still here").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"still here");

    first.stop(Duration::from_secs(5)).await.expect("stop");
}

#[tokio::test]
async fn unparsable_address_fails_with_bind_error() {
    let err = Server::bind("not-an-address")
        .start(echo_app())
        .await
        .expect_err("must fail");
    assert!(matches!(err, Error::Bind { .. }), "got: {err}");
}

async fn slow(_req: Request) -> Response {
    tokio::time::sleep(Duration::from_millis(300)).await;
    Response::text("done")
}

async fn hang(_req: Request) -> Response {
    tokio::time::sleep(Duration::from_secs(30)).await;
    Response::text("never")
}

#[tokio::test]
async fn stop_waits_for_in_flight_requests() {
    let app = Router::new().route("/slow", slow);
    let handle = Server::bind("127.0.0.1:0").start(app).await.expect("start");
    let addr = handle.local_addr();

    let mut send = connect(addr).await;
    let in_flight = tokio::spawn(async move {
        let req = http::Request::builder()
            .uri("/slow")
            .header("host", "localhost")
            .body(Full::new(Bytes::new()))
            .expect("request");
        let res = send.send_request(req).await.expect("response");
        let status = res.status();
        let body = res.into_body().collect().await.expect("body").to_bytes();
        (status, body)
    });

    // Let the request reach the handler before stopping.
    tokio::time::sleep(Duration::from_millis(100)).await;
    handle.stop(Duration::from_secs(5)).await.expect("stop");

    let (status, body) = in_flight.await.expect("client task");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"done");
}

#[tokio::test]
async fn stop_forces_close_at_the_deadline() {
    let app = Router::new().route("/hang", hang);
    let handle = Server::bind("127.0.0.1:0").start(app).await.expect("start");
    let addr = handle.local_addr();

    let mut send = connect(addr).await;
    let in_flight = tokio::spawn(async move {
        let req = http::Request::builder()
            .uri("/hang")
            .header("host", "localhost")
            .body(Full::new(Bytes::new()))
            .expect("request");
        send.send_request(req).await
    });

    tokio::time::sleep(Duration::from_millis(100)).await;

    let grace = Duration::from_millis(200);
    let started = Instant::now();
    let err = handle.stop(grace).await.expect_err("must time out");
    let elapsed = started.elapsed();

    assert!(matches!(err, Error::ShutdownTimeout { .. }), "got: {err}");
    assert!(elapsed >= grace, "returned before the deadline: {elapsed:?}");
    assert!(
        elapsed < Duration::from_secs(5),
        "forced close took too long: {elapsed:?}"
    );

    // The connection was cut, so the client never gets a response.
    assert!(in_flight.await.expect("client task").is_err());
}

#[tokio::test]
async fn stop_with_no_connections_returns_promptly() {
    let handle = Server::bind("127.0.0.1:0")
        .start(echo_app())
        .await
        .expect("start");

    let started = Instant::now();
    handle.stop(Duration::from_secs(5)).await.expect("stop");
    assert!(started.elapsed() < Duration::from_secs(1));
}
