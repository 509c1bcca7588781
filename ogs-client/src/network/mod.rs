//! 实时接口客户端
//!
//! 认证后按对局订阅 gamedata/move/clock 事件，并可提交落子、虚着和认输。

mod connection;

pub use connection::*;

use std::sync::Arc;

use ogs_protocol::{
    ClientCommand, EventStream, GameId, MoveInput, OriginCoordinate, ProtocolError, Result,
    ServerEvent, UserId,
};

/// 已认证的实时客户端
pub struct RealtimeClient<S> {
    connection: Arc<NetworkConnection<S>>,
    user_id: UserId,
}

impl<S: EventStream> RealtimeClient<S> {
    /// 接管事件流并使用 user_jwt 认证
    pub async fn connect(stream: S, user_jwt: &str, user_id: UserId) -> Result<Self> {
        let connection = Arc::new(NetworkConnection::new());
        connection.connect(stream).await;

        let client = Self {
            connection,
            user_id,
        };
        client
            .send(ClientCommand::Authenticate {
                jwt: user_jwt.to_string(),
            })
            .await?;
        Ok(client)
    }

    /// 共享的底层连接
    pub fn connection(&self) -> Arc<NetworkConnection<S>> {
        Arc::clone(&self.connection)
    }

    /// 订阅对局事件
    pub async fn game_connect(&self, game_id: GameId) -> Result<()> {
        self.send(ClientCommand::GameConnect {
            game_id,
            player_id: self.user_id,
            chat: false,
        })
        .await
    }

    /// 取消订阅
    pub async fn game_disconnect(&self, game_id: GameId) -> Result<()> {
        self.send(ClientCommand::GameDisconnect { game_id }).await
    }

    /// 落子（需先 game_connect）
    pub async fn game_move(&self, game_id: GameId, coordinate: OriginCoordinate) -> Result<()> {
        self.send(ClientCommand::GameMove {
            game_id,
            player_id: self.user_id,
            coordinate,
        })
        .await
    }

    pub async fn pass_turn(&self, game_id: GameId) -> Result<()> {
        self.send(ClientCommand::pass(game_id, self.user_id)).await
    }

    pub async fn game_resign(&self, game_id: GameId) -> Result<()> {
        self.send(ClientCommand::GameResign { game_id }).await
    }

    /// 提交玩家输入的一步操作
    pub async fn submit(&self, game_id: GameId, input: MoveInput) -> Result<()> {
        self.send(input.into_command(game_id, self.user_id)).await
    }

    /// 收取已到达的事件
    pub async fn poll_events(&self) -> Result<Vec<(GameId, ServerEvent)>> {
        self.connection.poll().await?;
        Ok(self.connection.drain_received())
    }

    pub async fn disconnect(&self) -> Result<()> {
        self.connection.disconnect().await
    }

    async fn send(&self, command: ClientCommand) -> Result<()> {
        if !self.connection.is_connected().await {
            return Err(ProtocolError::NotConnected);
        }
        tracing::debug!("queue {}", command.event());
        self.connection.queue_send(command);
        self.connection.poll().await
    }
}
