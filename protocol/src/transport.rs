//! 传输层抽象
//!
//! 提供 HttpTransport/EventStream traits 使上层协议与具体网络实现解耦，
//! 测试时可以替换为内存实现。

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{ProtocolError, Result};

/// REST 请求抽象
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// 发送 GET 请求，返回响应体
    ///
    /// `uri` 为相对站点根的路径，如 `/api/v1/me`；非 200 响应返回 [`ProtocolError::Http`]。
    async fn get(&self, uri: &str, token: &str, query: &[(String, String)]) -> Result<Vec<u8>>;
}

/// 实时事件流抽象（事件名 + JSON 负载）
#[async_trait]
pub trait EventStream: Send {
    /// 发送事件
    async fn emit(&mut self, event: &str, payload: Value) -> Result<()>;

    /// 接收下一个事件，流结束返回 [`ProtocolError::ConnectionClosed`]
    async fn next_event(&mut self) -> Result<(String, Value)>;

    /// 关闭事件流
    async fn close(&mut self) -> Result<()>;
}

/// 基于 mpsc 通道的内存事件流
///
/// 成对创建，一端发出的事件由另一端接收。
pub struct ChannelStream {
    tx: Option<mpsc::UnboundedSender<(String, Value)>>,
    rx: mpsc::UnboundedReceiver<(String, Value)>,
}

impl ChannelStream {
    /// 创建一对互联的事件流
    pub fn pair() -> (ChannelStream, ChannelStream) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();
        (
            ChannelStream {
                tx: Some(a_tx),
                rx: b_rx,
            },
            ChannelStream {
                tx: Some(b_tx),
                rx: a_rx,
            },
        )
    }
}

#[async_trait]
impl EventStream for ChannelStream {
    async fn emit(&mut self, event: &str, payload: Value) -> Result<()> {
        let tx = self.tx.as_ref().ok_or(ProtocolError::ConnectionClosed)?;
        debug!("emit {} {}", event, payload);
        tx.send((event.to_string(), payload))
            .map_err(|_| ProtocolError::ConnectionClosed)
    }

    async fn next_event(&mut self) -> Result<(String, Value)> {
        self.rx.recv().await.ok_or(ProtocolError::ConnectionClosed)
    }

    async fn close(&mut self) -> Result<()> {
        // 丢弃发送端后对端的 next_event 会返回 ConnectionClosed
        self.tx = None;
        self.rx.close();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_channel_stream() {
        let (mut client, mut server) = ChannelStream::pair();

        client
            .emit("game/connect", json!({"game_id": 1}))
            .await
            .unwrap();
        let (event, payload) = server.next_event().await.unwrap();
        assert_eq!(event, "game/connect");
        assert_eq!(payload["game_id"], 1);

        server.emit("game/1/clock", json!({})).await.unwrap();
        let (event, _) = client.next_event().await.unwrap();
        assert_eq!(event, "game/1/clock");
    }

    #[tokio::test]
    async fn test_channel_stream_close() {
        let (mut client, mut server) = ChannelStream::pair();
        client.close().await.unwrap();

        assert!(matches!(
            server.next_event().await,
            Err(ProtocolError::ConnectionClosed)
        ));
        assert!(matches!(
            client.emit("x", Value::Null).await,
            Err(ProtocolError::ConnectionClosed)
        ));
    }
}
