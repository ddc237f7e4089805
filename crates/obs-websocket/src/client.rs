//! Request/response session over a single obs-websocket connection.

use std::fmt;
use std::net::Ipv6Addr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::error::{ObsError, Result};
use crate::protocol::{
    Identify, OpCode, RPC_VERSION, Request, ServerMessage, authentication_string, encode,
};
use crate::requests::{
    GetOutputList, GetOutputStatus, GetStats, GetVersion, ObsRequest, OutputList, OutputStatus,
    Stats, Version,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connection settings.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub host: String,
    pub port: u16,
    /// Shared secret; only used when the server asks for authentication.
    pub password: Option<String>,
    /// Bound on the handshake and on every single request.
    pub timeout: Duration,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 4455,
            password: None,
            timeout: Duration::from_secs(3),
        }
    }
}

impl ConnectOptions {
    pub fn url(&self) -> String {
        if self.host.parse::<Ipv6Addr>().is_ok() {
            format!("ws://[{}]:{}", self.host, self.port)
        } else {
            format!("ws://{}:{}", self.host, self.port)
        }
    }
}

/// An identified obs-websocket session.
///
/// Requests are serialized through an async mutex so concurrent callers never
/// interleave frames on the socket. Once a transport error or timeout is seen
/// the client is marked disconnected and every further request fails fast.
pub struct ObsClient {
    stream: Mutex<WsStream>,
    connected: AtomicBool,
    timeout: Duration,
    url: String,
    negotiated_rpc_version: u32,
}

impl fmt::Debug for ObsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObsClient")
            .field("url", &self.url)
            .field("connected", &self.is_connected())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ObsClient {
    /// Connect and complete the Hello/Identify/Identified handshake.
    pub async fn connect(options: &ConnectOptions) -> Result<Self> {
        let url = options.url();
        let timeout = options.timeout;

        let (stream, negotiated_rpc_version) =
            tokio::time::timeout(timeout, handshake(&url, options.password.as_deref()))
                .await
                .map_err(|_| ObsError::Timeout(timeout))??;

        debug!(url = %url, rpc_version = negotiated_rpc_version, "Identified with obs-websocket");

        Ok(Self {
            stream: Mutex::new(stream),
            connected: AtomicBool::new(true),
            timeout,
            url,
            negotiated_rpc_version,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn negotiated_rpc_version(&self) -> u32 {
        self.negotiated_rpc_version
    }

    /// Whether the session is still usable.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Send a typed request and decode its `responseData`.
    pub async fn request<R: ObsRequest>(&self, request: &R) -> Result<R::Response> {
        let data = self.execute(R::REQUEST_TYPE, request.request_data()).await?;
        serde_json::from_value(data).map_err(|e| {
            ObsError::protocol(format!("invalid {} response: {}", R::REQUEST_TYPE, e))
        })
    }

    pub async fn get_version(&self) -> Result<Version> {
        self.request(&GetVersion).await
    }

    pub async fn get_stats(&self) -> Result<Stats> {
        self.request(&GetStats).await
    }

    pub async fn get_output_list(&self) -> Result<OutputList> {
        self.request(&GetOutputList).await
    }

    pub async fn get_output_status(&self, output_name: &str) -> Result<OutputStatus> {
        self.request(&GetOutputStatus::new(output_name)).await
    }

    /// Close the socket. The client is unusable afterwards.
    pub async fn close(&self) {
        self.connected.store(false, Ordering::SeqCst);
        let mut stream = self.stream.lock().await;
        if let Err(e) = stream.close(None).await {
            trace!(error = %e, "Error while closing obs-websocket connection");
        }
    }

    async fn execute(
        &self,
        request_type: &str,
        request_data: Option<serde_json::Value>,
    ) -> Result<serde_json::Value> {
        if !self.is_connected() {
            return Err(ObsError::connection("session is disconnected"));
        }

        let mut stream = self.stream.lock().await;
        // Another caller may have lost the connection while we waited.
        if !self.is_connected() {
            return Err(ObsError::connection("session is disconnected"));
        }

        let request_id = Uuid::new_v4().to_string();
        let frame = encode(
            OpCode::Request,
            &Request {
                request_type,
                request_id: &request_id,
                request_data,
            },
        )?;

        let result = match tokio::time::timeout(
            self.timeout,
            exchange(&mut stream, frame, &request_id),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ObsError::Timeout(self.timeout)),
        };

        if let Err(e) = &result
            && e.is_connection()
        {
            debug!(url = %self.url, request_type, error = %e, "obs-websocket session lost");
            self.connected.store(false, Ordering::SeqCst);
        }

        result
    }
}

async fn handshake(url: &str, password: Option<&str>) -> Result<(WsStream, u32)> {
    let (mut stream, _) = connect_async(url)
        .await
        .map_err(|e| ObsError::connection(format!("failed to connect to {url}: {e}")))?;

    let hello = match next_message(&mut stream).await? {
        ServerMessage::Hello(hello) => hello,
        other => {
            return Err(ObsError::protocol(format!(
                "expected Hello, received {other:?}"
            )));
        }
    };
    trace!(version = %hello.obs_web_socket_version, "Received Hello");

    let authentication = hello
        .authentication
        .as_ref()
        .map(|auth| authentication_string(password.unwrap_or_default(), auth));

    let identify = encode(
        OpCode::Identify,
        &Identify {
            rpc_version: RPC_VERSION.min(hello.rpc_version),
            authentication,
            event_subscriptions: 0,
        },
    )?;
    stream.send(Message::text(identify)).await?;

    match next_message(&mut stream).await? {
        ServerMessage::Identified(identified) => {
            Ok((stream, identified.negotiated_rpc_version))
        }
        other => Err(ObsError::protocol(format!(
            "expected Identified, received {other:?}"
        ))),
    }
}

/// Send one request frame and wait for the response carrying `request_id`.
async fn exchange(
    stream: &mut WsStream,
    frame: String,
    request_id: &str,
) -> Result<serde_json::Value> {
    stream.send(Message::text(frame)).await?;

    loop {
        match next_message(stream).await? {
            ServerMessage::RequestResponse(response) if response.request_id == request_id => {
                if !response.request_status.result {
                    return Err(ObsError::Request {
                        request_type: response.request_type,
                        code: response.request_status.code,
                        comment: response.request_status.comment.unwrap_or_default(),
                    });
                }
                return Ok(response
                    .response_data
                    .unwrap_or_else(|| serde_json::Value::Object(Default::default())));
            }
            ServerMessage::RequestResponse(response) => {
                debug!(request_id = %response.request_id, "Skipping stale response");
            }
            ServerMessage::Event(event) => {
                trace!(event_type = %event.event_type, "Ignoring event");
            }
            other => {
                debug!(message = ?other, "Ignoring unexpected message");
            }
        }
    }
}

async fn next_message(stream: &mut WsStream) -> Result<ServerMessage> {
    loop {
        let Some(frame) = stream.next().await else {
            return Err(ObsError::connection("connection closed by server"));
        };

        match frame? {
            Message::Text(text) => return ServerMessage::parse(text.as_str()),
            Message::Close(close) => {
                let reason = match close {
                    Some(close) => format!(
                        "server closed connection ({}): {}",
                        u16::from(close.code),
                        close.reason.as_str()
                    ),
                    None => "server closed connection".to_string(),
                };
                return Err(ObsError::Connection(reason));
            }
            Message::Binary(_) => return Err(ObsError::protocol("unexpected binary frame")),
            // ping/pong are answered by tungstenite
            _ => continue,
        }
    }
}
