//! WebSocket transport built on `tokio-tungstenite`.
//!
//! Both `ws://` and `wss://` URLs work; TLS goes through
//! [`MaybeTlsStream`](tokio_tungstenite::MaybeTlsStream).
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), battleship_client::BattleshipError> {
//! use battleship_client::{ServiceEndpoints, Transport, WebSocketTransport};
//!
//! let endpoints = ServiceEndpoints::default();
//! let mut transport = WebSocketTransport::connect_game(&endpoints, "R1", "alice").await?;
//!
//! if let Some(Ok(msg)) = transport.recv().await {
//!     println!("game service said: {msg}");
//! }
//!
//! transport.close().await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::{protocol::Message, Error as WsError};
use tracing::{debug, info, warn};

use crate::config::ServiceEndpoints;
use crate::error::BattleshipError;
use crate::transport::Transport;

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// One WebSocket connection to the game service.
///
/// Each text frame is one JSON event or command. Other data frames are
/// skipped and a close frame ends the stream. [`recv`](Transport::recv) is
/// cancel-safe.
#[derive(Debug)]
pub struct WebSocketTransport {
    stream: WsStream,
    closed: bool,
}

impl WebSocketTransport {
    /// Open the game socket of `room_id` for `player`.
    pub async fn connect_game(
        endpoints: &ServiceEndpoints,
        room_id: &str,
        player: &str,
    ) -> Result<Self, BattleshipError> {
        let url = endpoints.game_socket_url(room_id, player)?;
        Self::connect(url.as_str()).await
    }

    /// Open a WebSocket to `url`.
    ///
    /// # Errors
    ///
    /// [`BattleshipError::Io`] for a bad URL or a failed handshake, keeping
    /// the I/O error kind when there is one.
    pub async fn connect(url: &str) -> Result<Self, BattleshipError> {
        debug!(url, "opening game socket");
        let (stream, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| match e {
                WsError::Io(io) => BattleshipError::Io(io),
                other => BattleshipError::Io(std::io::Error::other(other)),
            })?;
        info!(url, "game socket open");
        Ok(Self {
            stream,
            closed: false,
        })
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn send(&mut self, message: String) -> Result<(), BattleshipError> {
        if self.closed {
            return Err(BattleshipError::TransportClosed);
        }
        let frame = Message::Text(message.into());
        if let Err(e) = self.stream.send(frame).await {
            return Err(BattleshipError::TransportSend(e.to_string()));
        }
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<String, BattleshipError>> {
        while let Some(frame) = self.stream.next().await {
            match frame {
                Ok(Message::Text(text)) => return Some(Ok(text.as_str().to_owned())),
                Ok(Message::Close(reason)) => {
                    debug!(?reason, "game service closed the socket");
                    return None;
                }
                Ok(Message::Binary(_)) => warn!("ignoring binary frame from game service"),
                // Pings are answered by tungstenite.
                Ok(_) => {}
                Err(e) => return Some(Err(BattleshipError::TransportReceive(e.to_string()))),
            }
        }
        None
    }

    async fn close(&mut self) -> Result<(), BattleshipError> {
        if std::mem::replace(&mut self.closed, true) {
            return Ok(());
        }
        self.stream
            .close(None)
            .await
            .map_err(|e| BattleshipError::TransportSend(e.to_string()))
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

    /// Accept one WebSocket connection on an ephemeral port and run `handler`
    /// on it. Returns the base `ws://` URL.
    async fn start_mock_server<F, Fut>(handler: F) -> String
    where
        F: FnOnce(tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>) -> Fut
            + Send
            + 'static,
        Fut: std::future::Future<Output = ()> + Send,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            handler(ws).await;
        });

        format!("ws://{addr}")
    }

    #[test]
    fn websocket_transport_is_send_and_debug() {
        fn assert_traits<T: Send + std::fmt::Debug>() {}
        assert_traits::<WebSocketTransport>();
    }

    #[tokio::test]
    async fn connect_fails_with_invalid_url() {
        let err = WebSocketTransport::connect("not-a-valid-url")
            .await
            .unwrap_err();
        assert!(matches!(err, BattleshipError::Io(_)));
    }

    #[tokio::test]
    async fn connect_fails_with_refused_port() {
        let err = WebSocketTransport::connect("ws://127.0.0.1:1")
            .await
            .unwrap_err();
        assert!(matches!(err, BattleshipError::Io(_)));
    }

    #[tokio::test]
    async fn connect_game_targets_room_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (path_tx, path_rx) = tokio::sync::oneshot::channel::<String>();

        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let callback = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                let _ = path_tx.send(req.uri().to_string());
                Ok(resp)
            };
            let mut ws = tokio_tungstenite::accept_hdr_async(tcp, callback)
                .await
                .unwrap();
            while let Some(Ok(_)) = ws.next().await {}
        });

        let endpoints = ServiceEndpoints {
            game: format!("ws://{addr}"),
            ..ServiceEndpoints::default()
        };
        let mut transport = WebSocketTransport::connect_game(&endpoints, "R1", "alice")
            .await
            .unwrap();
        assert_eq!(path_rx.await.unwrap(), "/ws/R1?player=alice");
        transport.close().await.unwrap();
    }

    #[tokio::test]
    async fn recv_yields_text_then_none_on_close() {
        let url = start_mock_server(|mut ws| async move {
            ws.send(Message::Text(r#"{"event":"connected"}"#.into()))
                .await
                .unwrap();
            ws.close(None).await.unwrap();
        })
        .await;

        let mut transport = WebSocketTransport::connect(&url).await.unwrap();
        let msg = transport.recv().await.unwrap().unwrap();
        assert_eq!(msg, r#"{"event":"connected"}"#);
        assert!(transport.recv().await.is_none());
    }

    #[tokio::test]
    async fn recv_skips_binary_frames() {
        let url = start_mock_server(|mut ws| async move {
            ws.send(Message::Binary(vec![0xDE, 0xAD].into()))
                .await
                .unwrap();
            ws.send(Message::Text("after_binary".into())).await.unwrap();
            ws.close(None).await.unwrap();
        })
        .await;

        let mut transport = WebSocketTransport::connect(&url).await.unwrap();
        assert_eq!(transport.recv().await.unwrap().unwrap(), "after_binary");
    }

    #[tokio::test]
    async fn send_reaches_server() {
        let url = start_mock_server(|mut ws| async move {
            if let Some(Ok(Message::Text(text))) = ws.next().await {
                ws.send(Message::Text(text)).await.unwrap();
            }
            ws.close(None).await.unwrap();
        })
        .await;

        let mut transport = WebSocketTransport::connect(&url).await.unwrap();
        let command = r#"{"action":"move","player_name":"alice","row":1,"col":2,"room_id":"R1"}"#;
        transport.send(command.to_string()).await.unwrap();
        assert_eq!(transport.recv().await.unwrap().unwrap(), command);
    }

    #[tokio::test]
    async fn send_after_close_fails_and_close_is_idempotent() {
        let url =
            start_mock_server(|mut ws| async move { while let Some(Ok(_)) = ws.next().await {} })
                .await;

        let mut transport = WebSocketTransport::connect(&url).await.unwrap();
        transport.close().await.unwrap();
        transport.close().await.unwrap();

        let err = transport.send("late".to_string()).await.unwrap_err();
        assert!(matches!(err, BattleshipError::TransportClosed));
    }
}
