use anyhow::{anyhow, Context, Result};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::event::Event;

/// Streaming client for a hub's `/ws` endpoint.
pub struct HubClient {
    url: Url,
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl HubClient {
    pub async fn connect(url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| anyhow!("invalid ws url: {e}"))?;
        let (ws, _) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .with_context(|| format!("failed to connect to {url}"))?;

        tracing::debug!(%url, "connected to hub");
        Ok(Self { url, ws })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub async fn send_json(&mut self, message: &Value) -> Result<()> {
        let text = serde_json::to_string(message)?;
        self.ws.send(Message::Text(text.into())).await?;
        Ok(())
    }

    /// Next event from the hub, or `None` once the hub closes the stream.
    pub async fn next_event(&mut self) -> Result<Option<Event>> {
        while let Some(msg) = self.ws.next().await {
            match msg? {
                Message::Text(text) => return Ok(Some(serde_json::from_str(text.as_str())?)),
                Message::Binary(bin) => return Ok(Some(serde_json::from_slice(&bin)?)),
                Message::Close(_) => return Ok(None),
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
        Ok(None)
    }

    pub async fn close(mut self) -> Result<()> {
        self.ws.close(None).await?;
        Ok(())
    }
}
