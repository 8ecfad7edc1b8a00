//! End-to-end: real listener, raw TCP clients.

use std::net::SocketAddr;
use std::time::Duration;

use quay::db::QueryWorker;
use quay::{Server, handlers};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::{JoinHandle, JoinSet};

struct Running {
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
    served: JoinHandle<()>,
    worker: QueryWorker,
}

async fn start() -> Running {
    let worker = QueryWorker::open_in_memory().expect("in-memory database");
    let server = Server::bind("127.0.0.1:0").await.expect("bind");
    let addr = server.local_addr();
    let (stop, stopped) = oneshot::channel::<()>();
    let app = handlers::app(worker.handle());
    let served = tokio::spawn(async move {
        server
            .serve_with_shutdown(app, async {
                let _ = stopped.await;
            })
            .await;
    });
    Running { addr, stop, served, worker }
}

/// Writes `raw`, then reads until the server closes its write half.
async fn exchange(addr: SocketAddr, raw: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.expect("connect");
    stream.write_all(raw.as_bytes()).await.expect("write request");
    let mut out = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut out))
        .await
        .expect("server half-closed in time")
        .expect("read response");
    String::from_utf8(out).expect("utf-8 response")
}

fn body(response: &str) -> &str {
    response.split_once("\r\n\r\n").map_or("", |(_, body)| body)
}

fn has_header(response: &str, line: &str) -> bool {
    response.lines().any(|l| l.eq_ignore_ascii_case(line))
}

/// Every `name:` line in the response head.
fn header_lines<'a>(response: &'a str, name: &str) -> Vec<&'a str> {
    let head = response.split_once("\r\n\r\n").map_or(response, |(head, _)| head);
    head.lines()
        .filter(|l| l.split_once(':').is_some_and(|(k, _)| k.eq_ignore_ascii_case(name)))
        .collect()
}

#[tokio::test]
async fn hello_world_under_api_with_default_fields() {
    let app = start().await;

    let res = exchange(app.addr, "GET /api HTTP/1.1\r\nhost: quay\r\nuser-agent: it\r\n\r\n").await;
    assert!(res.starts_with("HTTP/1.1 200 OK\r\n"), "{res}");
    assert!(has_header(&res, "server: quay"), "{res}");
    assert!(has_header(&res, "content-type: application/json"), "{res}");
    assert_eq!(body(&res), r#"{"message":"Hello, World!"}"#);

    app.stop.send(()).expect("server running");
    app.served.await.expect("serve task");
    app.worker.shutdown();
}

#[tokio::test]
async fn unregistered_path_is_a_bodyless_404() {
    let app = start().await;

    let res = exchange(app.addr, "GET /nowhere HTTP/1.1\r\nhost: quay\r\n\r\n").await;
    assert!(res.starts_with("HTTP/1.1 404 Not Found\r\n"), "{res}");
    assert!(has_header(&res, "content-length: 0"), "{res}");
    assert_eq!(body(&res), "");

    app.stop.send(()).expect("server running");
    app.served.await.expect("serve task");
    app.worker.shutdown();
}

#[tokio::test]
async fn verbs_outside_the_set_are_501_and_missing_verbs_400() {
    let app = start().await;

    let res = exchange(app.addr, "TRACE /api HTTP/1.1\r\nhost: quay\r\n\r\n").await;
    assert!(res.starts_with("HTTP/1.1 501 Not Implemented\r\n"), "{res}");

    let res = exchange(
        app.addr,
        "POST /api HTTP/1.1\r\nhost: quay\r\ncontent-length: 2\r\n\r\n{}",
    )
    .await;
    assert!(res.starts_with("HTTP/1.1 400 Bad Request\r\n"), "{res}");

    app.stop.send(()).expect("server running");
    app.served.await.expect("serve task");
    app.worker.shutdown();
}

#[tokio::test]
async fn connection_header_is_a_single_close_token() {
    let app = start().await;

    let requests = [
        "GET /api HTTP/1.1\r\nhost: quay\r\n\r\n",
        "GET /api/ HTTP/1.1\r\nhost: quay\r\nconnection: keep-alive\r\n\r\n",
        "GET /api HTTP/1.1\r\nhost: quay\r\nconnection: close\r\n\r\n",
        "GET /api HTTP/1.0\r\nhost: quay\r\n\r\n",
        "HEAD /api HTTP/1.1\r\nhost: quay\r\n\r\n",
    ];
    for raw in requests {
        let res = exchange(app.addr, raw).await;
        let lines = header_lines(&res, "connection")
            .into_iter()
            .map(str::to_ascii_lowercase)
            .collect::<Vec<_>>();
        assert_eq!(lines, ["connection: close"], "{raw:?} -> {res}");
    }

    app.stop.send(()).expect("server running");
    app.served.await.expect("serve task");
    app.worker.shutdown();
}

#[tokio::test]
async fn readiness_goes_through_the_query_worker() {
    let app = start().await;

    let res = exchange(app.addr, "GET /readyz HTTP/1.1\r\nhost: quay\r\n\r\n").await;
    assert!(res.starts_with("HTTP/1.1 200 OK\r\n"), "{res}");
    assert_eq!(body(&res), r#"{"status":"ready"}"#);

    app.stop.send(()).expect("server running");
    app.served.await.expect("serve task");
    app.worker.shutdown();
}

#[tokio::test]
async fn only_one_request_is_served_per_connection() {
    let app = start().await;

    let pipelined = "GET /healthz HTTP/1.1\r\nhost: quay\r\n\r\n\
                     GET /api HTTP/1.1\r\nhost: quay\r\n\r\n";
    let res = exchange(app.addr, pipelined).await;
    assert_eq!(res.matches("HTTP/1.1 ").count(), 1, "{res}");
    assert_eq!(body(&res), r#"{"status":"ok"}"#);

    app.stop.send(()).expect("server running");
    app.served.await.expect("serve task");
    app.worker.shutdown();
}

#[tokio::test]
async fn sessions_run_concurrently() {
    let app = start().await;

    let mut clients = JoinSet::new();
    for _ in 0..8 {
        clients.spawn(exchange(app.addr, "GET /api/x HTTP/1.1\r\nhost: quay\r\n\r\n"));
    }
    let responses = clients.join_all().await;
    assert_eq!(responses.len(), 8);
    assert!(responses.iter().all(|res| res.starts_with("HTTP/1.1 200 OK\r\n")));

    app.stop.send(()).expect("server running");
    app.served.await.expect("serve task");
    app.worker.shutdown();
}

#[tokio::test]
async fn shutdown_stops_accepting() {
    let app = start().await;
    let addr = app.addr;

    app.stop.send(()).expect("server running");
    app.served.await.expect("serve task");
    app.worker.shutdown();

    assert!(TcpStream::connect(addr).await.is_err());
}
