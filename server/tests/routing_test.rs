// Integration tests: configuration-driven apps and the TCP serving loop
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::BodyExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use trellis_server::{App, Reply, Request, Resolution, Routes, TrellisConfig};

const CONFIG: &str = r#"{
    "routes": [
        { "method": "GET", "path": "/users/:id", "response": { "body": "user {id}" } },
        { "method": "GET", "path": "/users/new", "response": { "body": "new user form" } },
        { "method": "GET", "path": "/assets/*", "response": { "body": "asset {*}" } },
        { "path": "/health", "response": { "status": 204 } }
    ],
    "groups": [
        {
            "prefix": "/api/v1",
            "routes": [
                { "method": "POST", "path": "/items", "response": { "status": 201, "body": "{\"ok\":true}", "content_type": "application/json" } },
                { "method": "GET", "path": "/items/:id/tags/:tag", "response": { "body": "{id}:{tag}" } }
            ]
        }
    ]
}"#;

fn configured_app() -> App {
    let config = TrellisConfig::from_json(CONFIG).unwrap();
    App::from_config(&config).unwrap()
}

async fn call(app: &App, method: &str, uri: &str) -> (StatusCode, String) {
    let req = http::Request::builder()
        .method(method)
        .uri(uri)
        .body(Bytes::new())
        .unwrap();
    let response = app.dispatch(req).await;
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_configured_routes() {
    let app = configured_app();

    assert_eq!(
        call(&app, "GET", "/users/42").await,
        (StatusCode::OK, "user 42".to_string())
    );
    assert_eq!(
        call(&app, "GET", "/users/new").await,
        (StatusCode::OK, "new user form".to_string())
    );
    assert_eq!(
        call(&app, "GET", "/assets/css/site.css").await,
        (StatusCode::OK, "asset css/site.css".to_string())
    );
    assert_eq!(call(&app, "DELETE", "/health").await.0, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_configured_groups() {
    let app = configured_app();

    assert_eq!(
        call(&app, "POST", "/api/v1/items").await,
        (StatusCode::CREATED, r#"{"ok":true}"#.to_string())
    );
    assert_eq!(
        call(&app, "GET", "/api/v1/items/7/tags/red%20hot").await,
        (StatusCode::OK, "7:red hot".to_string())
    );
    assert_eq!(
        call(&app, "GET", "/api/v1/items").await.0,
        StatusCode::METHOD_NOT_ALLOWED
    );
}

#[tokio::test]
async fn test_configured_fallbacks() {
    let app = configured_app();

    assert_eq!(
        call(&app, "GET", "/nowhere").await,
        (StatusCode::NOT_FOUND, "Not Found\n".to_string())
    );

    let req = http::Request::get("/assets?v=3").body(Bytes::new()).unwrap();
    let response = app.dispatch(req).await;
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(response.headers()["location"], "/assets/?v=3");
}

#[test]
fn test_resolve_configured_routes() {
    let app = configured_app();

    assert_eq!(
        app.resolve("GET", "/api/v1/items/3/tags/x"),
        Resolution::Matched {
            method: "GET".to_string(),
            pattern: "/api/v1/items/:id/tags/:tag".to_string(),
            params: vec![
                ("id".to_string(), "3".to_string()),
                ("tag".to_string(), "x".to_string()),
            ],
        }
    );
    assert_eq!(app.resolve("PUT", "/users/1"), Resolution::MethodNotAllowed);
}

async fn start(app: App) -> (SocketAddr, oneshot::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown, signal) = oneshot::channel::<()>();
    tokio::spawn(app.serve(listener, async {
        let _ = signal.await;
    }));
    (addr, shutdown)
}

async fn raw_request(addr: SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8_lossy(&response).into_owned()
}

#[tokio::test]
async fn test_serves_over_tcp() {
    let mut app = configured_app();
    app.post("/echo/:name", |req: Request| async move {
        let name = req.param("name").unwrap_or_default().into_owned();
        Reply::Text(format!("{name}: {}", req.body_str().unwrap_or("")))
    })
    .unwrap();
    let (addr, shutdown) = start(app).await;

    let response = raw_request(
        addr,
        "GET /users/42 HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 200 OK"));
    assert!(response.ends_with("user 42"));

    let response = raw_request(
        addr,
        "POST /echo/bob HTTP/1.1\r\nHost: localhost\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 200 OK"));
    assert!(response.ends_with("bob: hello"));

    let response = raw_request(
        addr,
        "GET /missing HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 404 Not Found"));

    shutdown.send(()).unwrap();
}

#[tokio::test]
async fn test_rejects_oversized_body() {
    let mut app = App::new().max_request_body_size(16);
    app.post("/upload", |req: Request| async move { format!("{} bytes", req.body().len()) })
        .unwrap();
    let (addr, shutdown) = start(app).await;

    let response = raw_request(
        addr,
        "POST /upload HTTP/1.1\r\nHost: localhost\r\nContent-Length: 8\r\nConnection: close\r\n\r\nfits now",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 200 OK"));
    assert!(response.ends_with("8 bytes"));

    let body = "x".repeat(64);
    let request = format!(
        "POST /upload HTTP/1.1\r\nHost: localhost\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    let response = raw_request(addr, &request).await;
    assert!(response.starts_with("HTTP/1.1 413 Payload Too Large"));
    assert!(response.ends_with("Payload Too Large\n"));

    shutdown.send(()).unwrap();
}

#[tokio::test]
async fn test_times_out_slow_handlers() {
    let mut app = App::new().request_timeout(Duration::from_millis(100));
    app.get("/slow", |_req: Request| async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        "too late"
    })
    .unwrap();
    app.get("/fast", |_req: Request| async { "on time" }).unwrap();
    let (addr, shutdown) = start(app).await;

    let response = raw_request(
        addr,
        "GET /slow HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 504 Gateway Timeout"));
    assert!(!response.contains("too late"));

    let response = raw_request(
        addr,
        "GET /fast HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 200 OK"));
    assert!(response.ends_with("on time"));

    shutdown.send(()).unwrap();
}
