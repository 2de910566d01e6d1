//! Test fixtures shared by the integration tests.

#![allow(dead_code)]

use std::{
    net::TcpStream,
    process::{Child, Command, Stdio},
    thread,
    time::{Duration, Instant},
};

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream as TokioTcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

/// A running `hiroba-server` process, killed on drop
pub struct TestServer {
    port: u16,
    child: Child,
}

impl TestServer {
    /// Start the server binary on `port` and wait until it accepts connections.
    pub fn start(port: u16) -> Self {
        let child = Command::new(env!("CARGO_BIN_EXE_hiroba-server"))
            .args(["--host", "127.0.0.1", "--port", &port.to_string()])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("Failed to start server");

        let server = Self { port, child };
        server.wait_until_ready();
        server
    }

    fn wait_until_ready(&self) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while Instant::now() < deadline {
            if TcpStream::connect(("127.0.0.1", self.port)).is_ok() {
                return;
            }
            thread::sleep(Duration::from_millis(50));
        }
        panic!("Server did not start on port {}", self.port);
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://127.0.0.1:{}/ws", self.port)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

type Socket = WebSocketStream<MaybeTlsStream<TokioTcpStream>>;

/// A WebSocket client that reads JSON messages
pub struct TestClient {
    socket: Socket,
    /// The id announced in the welcome message
    pub id: u64,
}

impl TestClient {
    /// Connect and consume the welcome message.
    pub async fn connect(server: &TestServer) -> Self {
        let (socket, _) = connect_async(server.ws_url())
            .await
            .expect("Failed to connect");
        let mut client = Self { socket, id: 0 };
        let welcome = client.recv_type("welcome").await;
        client.id = welcome["clientId"].as_u64().expect("clientId missing");
        client
    }

    pub async fn send_json(&mut self, value: Value) {
        self.send_text(&value.to_string()).await;
    }

    pub async fn send_text(&mut self, text: &str) {
        self.socket
            .send(Message::Text(text.to_string().into()))
            .await
            .expect("Failed to send");
    }

    /// Next JSON message, or None after a quiet period.
    pub async fn try_recv(&mut self, wait: Duration) -> Option<Value> {
        loop {
            let msg = tokio::time::timeout(wait, self.socket.next())
                .await
                .ok()??
                .expect("WebSocket error");
            if let Message::Text(text) = msg {
                return Some(serde_json::from_str(text.as_str()).expect("Invalid JSON"));
            }
        }
    }

    /// Skip messages until one of the given type arrives.
    pub async fn recv_type(&mut self, kind: &str) -> Value {
        loop {
            let msg = self
                .try_recv(Duration::from_secs(5))
                .await
                .unwrap_or_else(|| panic!("Timed out waiting for '{kind}'"));
            if msg["type"] == kind {
                return msg;
            }
        }
    }

    /// Drain whatever is already queued.
    pub async fn drain(&mut self) {
        while self.try_recv(Duration::from_millis(200)).await.is_some() {}
    }

    pub async fn close(mut self) {
        let _ = self.socket.close(None).await;
    }
}
