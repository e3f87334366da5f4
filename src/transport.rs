//! Text-frame WebSocket link shared by the signaling and chat connections.

use futures::{SinkExt, StreamExt};
use reqwest::Url;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::error::{ClientError, Result};

/// Both directions of a text connection.
///
/// Dropping `outgoing` closes the socket; `incoming` yields `None` once the
/// remote side is gone.
pub struct TextLink {
    pub outgoing: mpsc::UnboundedSender<String>,
    pub incoming: mpsc::UnboundedReceiver<String>,
}

impl TextLink {
    /// Two links wired back to back, for in-process peers and tests.
    pub fn pair() -> (TextLink, TextLink) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();
        (
            TextLink {
                outgoing: a_tx,
                incoming: b_rx,
            },
            TextLink {
                outgoing: b_tx,
                incoming: a_rx,
            },
        )
    }
}

/// Build `base?key=value&...` with proper escaping
pub fn with_query(base: &str, params: &[(&str, &str)]) -> Result<String> {
    let mut url = Url::parse(base)
        .map_err(|e| ClientError::InvalidInput(format!("Invalid URL {}: {}", base, e)))?;
    {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in params {
            pairs.append_pair(key, value);
        }
    }
    Ok(url.to_string())
}

/// Open a WebSocket and pump text frames through a [`TextLink`]
pub async fn connect_text_link(url: &str) -> Result<TextLink> {
    let (ws_stream, _) = connect_async(url).await?;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
    let (in_tx, in_rx) = mpsc::unbounded_channel::<String>();

    // Task for sending frames to the server
    tokio::spawn(async move {
        while let Some(text) = out_rx.recv().await {
            if let Err(e) = ws_sender.send(Message::Text(text.into())).await {
                tracing::error!(error = %e, "WebSocket send failed");
                break;
            }
        }
        let _ = ws_sender.send(Message::Close(None)).await;
    });

    // Task for receiving frames from the server
    tokio::spawn(async move {
        while let Some(result) = ws_receiver.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    if in_tx.send(text.to_string()).is_err() {
                        break;
                    }
                }
                Ok(Message::Binary(_)) => {
                    tracing::warn!("Ignoring binary frame");
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("WebSocket close received");
                    break;
                }
                Err(e) => {
                    tracing::error!(error = %e, "WebSocket error");
                    break;
                }
                _ => {}
            }
        }
    });

    Ok(TextLink {
        outgoing: out_tx,
        incoming: in_rx,
    })
}
