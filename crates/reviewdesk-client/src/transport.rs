//! Live connection transport
//!
//! [`Connector`] opens connections; [`Connection`] carries protocol frames.
//! [`WsConnector`] is the WebSocket implementation.

use crate::error::ClientError;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use reviewdesk_domain::{ClientMessage, ServerMessage};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// Opens live connections to the notification endpoint
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open one connection
    async fn connect(&self) -> Result<Box<dyn Connection>, ClientError>;
}

/// One open live connection
#[async_trait]
pub trait Connection: Send {
    /// Send a client frame
    async fn send(&mut self, message: &ClientMessage) -> Result<(), ClientError>;

    /// Next server frame; `None` once the peer closed cleanly
    ///
    /// Must be cancel-safe: it is polled inside `select!`.
    async fn recv(&mut self) -> Option<Result<ServerMessage, ClientError>>;

    /// Close the connection
    async fn close(&mut self);
}

/// WebSocket connector for `ws://host/ws/notifications`
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    /// Create a connector for a full WebSocket URL
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Endpoint URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self) -> Result<Box<dyn Connection>, ClientError> {
        let (stream, _) = connect_async(self.url.as_str()).await?;
        tracing::debug!("WebSocket connected to {}", self.url);
        Ok(Box::new(WsConnection { stream }))
    }
}

struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Connection for WsConnection {
    async fn send(&mut self, message: &ClientMessage) -> Result<(), ClientError> {
        let text = serde_json::to_string(message)?;
        self.stream.send(Message::Text(text)).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<ServerMessage, ClientError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => match serde_json::from_str::<ServerMessage>(&text) {
                    Ok(message) => return Some(Ok(message)),
                    Err(e) => {
                        tracing::debug!("ignoring unrecognized frame: {}", e);
                        continue;
                    }
                },
                Ok(Message::Close(_)) => return None,
                Ok(_) => continue,
                Err(e) => return Some(Err(ClientError::from(e))),
            }
        }
    }

    async fn close(&mut self) {
        let _ = self.stream.close(None).await;
    }
}
