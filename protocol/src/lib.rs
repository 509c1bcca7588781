//! OGS（online-go.com）共享协议库
//!
//! 包含:
//! - 时钟推算 (compute_clock)，支持 absolute/byoyomi/canadian/fischer/simple
//! - 坐标转换 (OriginCoordinate <-> A1Coordinate)
//! - 对局、局面、玩家等数据结构及状态文本
//! - 实时消息类型定义 (ClientCommand, ServerEvent)
//! - 传输层抽象 (HttpTransport, EventStream traits)

mod clock;
mod constants;
mod coordinate;
mod error;
mod game;
mod message;
mod player;
mod time_control;
mod timestamp;
mod transport;

pub use clock::{compute_clock, compute_clock_now, Clock, ComputedClock, Overtime, PlayerClock, PlayerTime};
pub use constants::*;
pub use coordinate::{A1Coordinate, OriginCoordinate};
pub use error::{CoordinateError, ProtocolError, Result};
pub use game::{Game, GameMove, GameOverview, GameState, Move, Overview};
pub use message::{
    game_event, parse_game_id, ClientCommand, GameId, MoveInput, ServerEvent, UserId,
};
pub use player::{Glicko2, Player, Players, Ratings, User};
pub use time_control::{SystemKind, TimeControl, TimeSystem};
pub use timestamp::{format_duration, Timestamp};
pub use transport::{ChannelStream, EventStream, HttpTransport};
