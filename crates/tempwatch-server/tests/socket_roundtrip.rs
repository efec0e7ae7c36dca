//! Real TCP round trips against a running server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::{header, Method, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use tempwatch_contract::ContractLoader;
use tempwatch_core::{BoundedErrorStore, ErrorStore, TimeDisplay};
use tempwatch_server::{Server, ServerConfig, ServerResult, ShutdownSignal};

async fn start(config: ServerConfig) -> (SocketAddr, ShutdownSignal, JoinHandle<ServerResult<()>>, Arc<BoundedErrorStore>) {
    let store = Arc::new(BoundedErrorStore::new());
    let server = Server::builder()
        .config(config)
        .contract(Arc::new(ContractLoader::builtin().unwrap()))
        .error_store(store.clone())
        .time_display(TimeDisplay::from_offset("-04:00").unwrap())
        .build()
        .unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = ShutdownSignal::new();
    let handle = tokio::spawn(server.run_on_listener(listener, shutdown.clone()));

    (addr, shutdown, handle, store)
}

async fn send(addr: SocketAddr, method: Method, path: &str, body: &str) -> (StatusCode, Bytes) {
    let stream = TcpStream::connect(addr).await.unwrap();
    let (mut sender, conn) = http1::handshake(TokioIo::new(stream)).await.unwrap();
    tokio::spawn(conn);

    let request = http::Request::builder()
        .method(method)
        .uri(path)
        .header(header::HOST, addr.to_string())
        .header(header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap();

    let response = sender.send_request(request).await.unwrap();
    let status = response.status();
    (status, response.into_body().collect().await.unwrap().to_bytes())
}

#[tokio::test]
async fn serves_requests_until_shutdown() {
    let (addr, shutdown, handle, store) = start(ServerConfig::default()).await;

    let body = json!({"data": "1234:1721964434:'Temperature':95.0"}).to_string();
    let (status, bytes) = send(addr, Method::POST, "/api/v1/temp", &body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        serde_json::from_slice::<Value>(&bytes).unwrap(),
        json!({"overtemp": true, "device_id": 1234, "formatted_time": "2024/07/25 23:27:14"})
    );

    let body = json!({"data": "1:2:'Humidity':3"}).to_string();
    let (status, _) = send(addr, Method::POST, "/api/v1/temp", &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        store.list(),
        vec!["temperature key is mislabelled: 'Humidity'".to_string()]
    );

    let (status, _) = send(addr, Method::GET, "/api/v1/missing", "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
    assert!(result.is_ok());
    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn oversized_body_is_rejected_at_the_edge() {
    let config = ServerConfig::builder().max_body_bytes(16).build();
    let (addr, shutdown, handle, store) = start(config).await;

    let body = json!({"data": "1234:1721964434:'Temperature':95.0"}).to_string();
    let (status, bytes) = send(addr, Method::POST, "/api/v1/temp", &body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(&bytes[..], br#"{"error":"Failed to parse request body"}"#);
    assert!(store.is_empty());

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}
