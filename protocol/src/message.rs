//! 实时接口消息定义
//!
//! 客户端发往服务端的指令为 `(事件名, JSON 负载)`；服务端按对局推送
//! `game/<id>/gamedata`、`game/<id>/move`、`game/<id>/clock` 三类事件。

use serde_json::{json, Value};

use crate::clock::Clock;
use crate::coordinate::{A1Coordinate, OriginCoordinate};
use crate::error::{ProtocolError, Result};
use crate::game::{Game, GameMove};

/// 用户 ID
pub type UserId = i64;

/// 对局 ID
pub type GameId = i64;

/// 客户端发送给服务端的指令
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCommand {
    /// 使用 user_jwt 认证
    Authenticate { jwt: String },
    /// 开始接收对局事件
    GameConnect {
        game_id: GameId,
        player_id: UserId,
        chat: bool,
    },
    /// 停止接收对局事件
    GameDisconnect { game_id: GameId },
    /// 落子（坐标为虚着时即为 pass）
    GameMove {
        game_id: GameId,
        player_id: UserId,
        coordinate: OriginCoordinate,
    },
    /// 认输
    GameResign { game_id: GameId },
}

impl ClientCommand {
    /// 虚着
    pub fn pass(game_id: GameId, player_id: UserId) -> Self {
        ClientCommand::GameMove {
            game_id,
            player_id,
            coordinate: OriginCoordinate::PASS,
        }
    }

    /// 事件名
    pub fn event(&self) -> &'static str {
        match self {
            ClientCommand::Authenticate { .. } => "authenticate",
            ClientCommand::GameConnect { .. } => "game/connect",
            ClientCommand::GameDisconnect { .. } => "game/disconnect",
            ClientCommand::GameMove { .. } => "game/move",
            ClientCommand::GameResign { .. } => "game/resign",
        }
    }

    /// JSON 负载
    pub fn payload(&self) -> Value {
        match self {
            ClientCommand::Authenticate { jwt } => json!({ "jwt": jwt }),
            ClientCommand::GameConnect {
                game_id,
                player_id,
                chat,
            } => json!({
                "game_id": game_id,
                "player_id": player_id,
                "chat": chat,
            }),
            ClientCommand::GameDisconnect { game_id } => json!({ "game_id": game_id }),
            ClientCommand::GameMove {
                game_id,
                player_id,
                coordinate,
            } => json!({
                "game_id": game_id,
                "player_id": player_id,
                "move": coordinate.to_sgf(),
            }),
            ClientCommand::GameResign { game_id } => json!({ "game_id": game_id }),
        }
    }
}

/// 服务端推送的对局事件
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// 对局数据（结果变化时推送）
    GameData(Box<Game>),
    /// 有人落子
    Move(GameMove),
    /// 时钟快照
    Clock(Clock),
}

impl ServerEvent {
    /// 解码服务端事件
    ///
    /// 不认识的事件名返回 `Ok(None)`，负载格式错误返回 Err。
    pub fn decode(event: &str, payload: Value) -> Result<Option<(GameId, ServerEvent)>> {
        let mut parts = event.split('/');
        let (Some("game"), Some(id), Some(kind), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Ok(None);
        };
        let Ok(game_id) = id.parse::<GameId>() else {
            return Ok(None);
        };

        let decoded = match kind {
            "gamedata" => ServerEvent::GameData(Box::new(serde_json::from_value(payload)?)),
            "move" => ServerEvent::Move(serde_json::from_value(payload)?),
            "clock" => ServerEvent::Clock(serde_json::from_value(payload)?),
            _ => return Ok(None),
        };
        Ok(Some((game_id, decoded)))
    }
}

/// 对局事件名
pub fn game_event(game_id: GameId, kind: &str) -> String {
    format!("game/{}/{}", game_id, kind)
}

/// 玩家输入的一步操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveInput {
    Play(OriginCoordinate),
    Pass,
    Resign,
}

impl MoveInput {
    /// 解析 "pass"、"resign" 或 A1 坐标（不区分大小写）
    pub fn parse(input: &str, board_size: i32) -> Result<Self> {
        let op = input.trim().to_ascii_uppercase();
        match op.as_str() {
            "PASS" => Ok(MoveInput::Pass),
            "RESIGN" => Ok(MoveInput::Resign),
            "" => Err(ProtocolError::InvalidMove {
                reason: "empty input".to_string(),
            }),
            _ => {
                let a1: A1Coordinate = op.parse()?;
                Ok(MoveInput::Play(a1.to_origin(board_size)?))
            }
        }
    }

    /// 转换为发送给服务端的指令
    pub fn into_command(self, game_id: GameId, player_id: UserId) -> ClientCommand {
        match self {
            MoveInput::Play(coordinate) => ClientCommand::GameMove {
                game_id,
                player_id,
                coordinate,
            },
            MoveInput::Pass => ClientCommand::pass(game_id, player_id),
            MoveInput::Resign => ClientCommand::GameResign { game_id },
        }
    }
}

/// 从对局 ID 或对局链接（如 https://online-go.com/game/123）中提取 ID
pub fn parse_game_id(input: &str) -> Result<GameId> {
    let last = input.trim().rsplit('/').next().unwrap_or_default();
    last.parse().map_err(|_| ProtocolError::InvalidGameId {
        input: input.to_string(),
    })
}
