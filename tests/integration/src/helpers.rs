//! Test helpers for integration tests
//!
//! Provides utilities for spawning test servers, making HTTP requests,
//! and driving WebSocket clients against the hub.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chat_common::AppConfig;
use chat_core::ConnectionId;
use chat_hub::protocol::{HubFrame, OpCode};
use chat_hub::{create_app, serve, Hub, HubState};
use futures_util::{SinkExt, StreamExt};
use reqwest::{Client, Response};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// Raw client-side WebSocket stream
pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long a test waits for a frame before giving up
pub const FRAME_TIMEOUT: Duration = Duration::from_secs(5);

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    hub: Arc<Hub>,
    config: AppConfig,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a new test server with default configuration
    pub async fn start() -> Result<Self> {
        Self::start_with_config(test_config()).await
    }

    /// Start a test server with custom config
    pub async fn start_with_config(config: AppConfig) -> Result<Self> {
        let state = HubState::new(config.clone());
        let hub = state.hub_handle();

        // Build application
        let app = create_app(state);

        // Bind to an ephemeral port
        let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
        let addr = listener.local_addr()?;

        // Spawn server task
        let handle = tokio::spawn(async move {
            serve(listener, app).await.ok();
        });

        // Create HTTP client
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            addr,
            client,
            hub,
            config,
            _handle: handle,
        })
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the WebSocket URL of the hub endpoint
    pub fn ws_url(&self) -> String {
        format!("ws://{}{}", self.addr, self.config.hub.path)
    }

    /// The hub behind this server
    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    /// Open a WebSocket without reading anything
    pub async fn connect_raw(&self) -> Result<WsStream> {
        let (stream, _response) = connect_async(self.ws_url()).await?;
        Ok(stream)
    }

    /// Open a WebSocket and consume the Hello frame
    pub async fn connect(&self) -> Result<HubClient> {
        let mut stream = self.connect_raw().await?;

        let hello = next_frame(&mut stream).await?;
        if hello.op != OpCode::Hello {
            bail!("Expected Hello, got {hello}");
        }
        let hello = hello.as_hello().context("Malformed Hello payload")?;

        Ok(HubClient {
            id: hello.connection_id,
            heartbeat_interval: hello.heartbeat_interval,
            stream,
        })
    }

    /// Wait until the hub holds exactly `expected` connections
    pub async fn wait_for_connections(&self, expected: usize) -> Result<()> {
        let deadline = tokio::time::Instant::now() + FRAME_TIMEOUT;
        while self.hub.connection_count() != expected {
            if tokio::time::Instant::now() >= deadline {
                bail!(
                    "Expected {} connections, hub has {}",
                    expected,
                    self.hub.connection_count()
                );
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        Ok(())
    }
}

/// A connected hub client
pub struct HubClient {
    /// Connection ID assigned by the hub
    pub id: ConnectionId,
    /// Heartbeat interval advertised in Hello
    pub heartbeat_interval: u64,
    stream: WsStream,
}

impl HubClient {
    /// Send a JSON frame
    pub async fn send_json(&mut self, frame: &Value) -> Result<()> {
        self.send_text(frame.to_string()).await
    }

    /// Send a raw text frame
    pub async fn send_text(&mut self, text: impl Into<String>) -> Result<()> {
        self.stream.send(Message::Text(text.into())).await?;
        Ok(())
    }

    /// Send a chat message
    pub async fn say(&mut self, user: &str, message: &str) -> Result<()> {
        self.send_json(&serde_json::json!({
            "op": 2,
            "d": { "user": user, "message": message }
        }))
        .await
    }

    /// Receive the next hub frame
    pub async fn next_frame(&mut self) -> Result<HubFrame> {
        next_frame(&mut self.stream).await
    }

    /// Receive the next frame if one arrives within `wait`
    pub async fn try_next_frame(&mut self, wait: Duration) -> Result<Option<HubFrame>> {
        match tokio::time::timeout(wait, next_frame(&mut self.stream)).await {
            Ok(frame) => frame.map(Some),
            Err(_) => Ok(None),
        }
    }

    /// Read until the server closes, returning the close code
    pub async fn expect_close(&mut self) -> Result<Option<u16>> {
        expect_close(&mut self.stream).await
    }

    /// Close the connection from the client side
    pub async fn close(mut self) -> Result<()> {
        self.stream.close(None).await?;
        Ok(())
    }
}

/// Read the next hub frame from a raw stream, skipping control frames
pub async fn next_frame(stream: &mut WsStream) -> Result<HubFrame> {
    loop {
        let msg = tokio::time::timeout(FRAME_TIMEOUT, stream.next())
            .await
            .context("Timed out waiting for frame")?;

        match msg {
            Some(Ok(Message::Text(text))) => return Ok(HubFrame::from_json(&text)?),
            Some(Ok(Message::Binary(bytes))) => return Ok(HubFrame::from_slice(&bytes)?),
            Some(Ok(Message::Close(frame))) => bail!("Connection closed: {frame:?}"),
            Some(Ok(_)) => {}
            Some(Err(e)) => return Err(e.into()),
            None => bail!("Connection ended"),
        }
    }
}

/// Read a raw stream until the close frame, returning its code
pub async fn expect_close(stream: &mut WsStream) -> Result<Option<u16>> {
    loop {
        let msg = tokio::time::timeout(FRAME_TIMEOUT, stream.next())
            .await
            .context("Timed out waiting for close")?;

        match msg {
            Some(Ok(Message::Close(frame))) => return Ok(frame.map(|f| u16::from(f.code))),
            Some(Ok(_)) => {}
            Some(Err(_)) | None => return Ok(None),
        }
    }
}

/// Create a test configuration
///
/// Built from defaults rather than the process environment so tests are hermetic.
pub fn test_config() -> AppConfig {
    AppConfig::default()
}
