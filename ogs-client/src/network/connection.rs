//! 实时连接管理
//!
//! 使用 protocol 库的 EventStream 抽象

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use ogs_protocol::{ClientCommand, EventStream, GameId, ProtocolError, Result, ServerEvent};
use tokio::sync::Mutex;

/// 实时连接包装器
///
/// 同步代码只操作收发队列，实际 I/O 在 [`NetworkConnection::poll`] 中进行。
pub struct NetworkConnection<S> {
    /// 内部事件流（异步）
    inner: Arc<Mutex<Option<S>>>,
    /// 发送队列
    send_queue: Arc<StdMutex<Vec<ClientCommand>>>,
    /// 接收队列
    recv_queue: Arc<StdMutex<Vec<(GameId, ServerEvent)>>>,
}

impl<S: EventStream> NetworkConnection<S> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(None)),
            send_queue: Arc::new(StdMutex::new(Vec::new())),
            recv_queue: Arc::new(StdMutex::new(Vec::new())),
        }
    }

    /// 接管已建立的事件流
    pub async fn connect(&self, stream: S) {
        let mut inner = self.inner.lock().await;
        *inner = Some(stream);
        tracing::info!("Realtime stream attached");
    }

    /// 断开连接
    pub async fn disconnect(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if let Some(mut stream) = inner.take() {
            stream.close().await?;
            tracing::info!("Realtime stream closed");
        }
        Ok(())
    }

    /// 发送指令（加入发送队列）
    pub fn queue_send(&self, command: ClientCommand) {
        if let Ok(mut queue) = self.send_queue.lock() {
            queue.push(command);
        }
    }

    /// 取出已收到的事件
    pub fn drain_received(&self) -> Vec<(GameId, ServerEvent)> {
        if let Ok(mut queue) = self.recv_queue.lock() {
            std::mem::take(&mut *queue)
        } else {
            Vec::new()
        }
    }

    /// 处理网络 I/O：发出队列中的指令，并接收已到达的事件
    ///
    /// 发送失败时返回该错误，失败的指令及其后的指令留在发送队列中。
    pub async fn poll(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let Some(stream) = inner.as_mut() else {
            return Err(ProtocolError::NotConnected);
        };

        let commands: Vec<ClientCommand> = if let Ok(mut queue) = self.send_queue.lock() {
            std::mem::take(&mut *queue)
        } else {
            Vec::new()
        };
        let mut pending = commands.into_iter();
        while let Some(command) = pending.next() {
            if let Err(e) = stream.emit(command.event(), command.payload()).await {
                tracing::error!("Failed to send {}: {}", command.event(), e);
                // 未发出的指令放回队首，保持原有顺序
                if let Ok(mut queue) = self.send_queue.lock() {
                    let queued_later = std::mem::take(&mut *queue);
                    queue.push(command);
                    queue.extend(pending);
                    queue.extend(queued_later);
                }
                return Err(e);
            }
        }

        // 取完当前已到达的事件，等不到新事件即返回
        loop {
            match tokio::time::timeout(Duration::from_millis(1), stream.next_event()).await {
                Ok(Ok((event, payload))) => match ServerEvent::decode(&event, payload) {
                    Ok(Some(decoded)) => {
                        if let Ok(mut queue) = self.recv_queue.lock() {
                            queue.push(decoded);
                        }
                    }
                    Ok(None) => tracing::debug!("Ignored event {}", event),
                    Err(e) => tracing::warn!("Dropped malformed {} event: {}", event, e),
                },
                Ok(Err(ProtocolError::ConnectionClosed)) => {
                    tracing::info!("Realtime stream closed by peer");
                    inner.take();
                    return Err(ProtocolError::ConnectionClosed);
                }
                Ok(Err(e)) => {
                    tracing::warn!("Receive error: {}", e);
                    return Ok(());
                }
                Err(_) => return Ok(()),
            }
        }
    }

    /// 检查是否已连接
    pub async fn is_connected(&self) -> bool {
        let inner = self.inner.lock().await;
        inner.is_some()
    }
}

impl<S: EventStream> Default for NetworkConnection<S> {
    fn default() -> Self {
        Self::new()
    }
}
