//! 对局数据与状态文本
//!
//! [`Game`] 为对局的静态信息（玩家、规则、时间控制），[`GameState`] 为某一手之后的
//! 局面快照。状态文本均由纯函数生成，不修改任何输入。

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::clock::{compute_clock, Clock, ComputedClock};
use crate::constants::{OGS_BASE_URL, PHASE_FINISHED};
use crate::coordinate::OriginCoordinate;
use crate::message::{GameId, UserId};
use crate::player::{Player, Players};
use crate::time_control::TimeControl;
use crate::timestamp::Timestamp;

/// 一手棋：`[x, y, time_delta, ...]`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Move {
    pub coordinate: OriginCoordinate,
    /// 本手用时（毫秒）
    pub time_delta: f64,
}

impl Serialize for Move {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.coordinate.x, self.coordinate.y, self.time_delta).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Move {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_seq(MoveVisitor)
    }
}

struct MoveVisitor;

impl<'de> Visitor<'de> for MoveVisitor {
    type Value = Move;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a move array [x, y, time_delta, ...]")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Move, A::Error> {
        let x: i32 = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        let y: i32 = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(1, &self))?;
        let time_delta: f64 = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(2, &self))?;

        // 之后可能还有附加信息（如落子者 ID），忽略
        while seq.next_element::<de::IgnoredAny>()?.is_some() {}

        Ok(Move {
            coordinate: OriginCoordinate::new(x, y),
            time_delta,
        })
    }
}

/// 实时推送的落子事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameMove {
    #[serde(default)]
    pub game_id: GameId,
    #[serde(rename = "move")]
    pub mv: Move,
    #[serde(default)]
    pub move_number: i32,
}

/// 对局信息，大部分字段在对局期间不变
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Game {
    pub game_id: GameId,
    pub game_name: String,
    pub black_player_id: UserId,
    pub white_player_id: UserId,
    pub players: Players,
    /// 键为玩家 ID 的字符串形式
    pub player_pool: HashMap<String, Player>,
    pub clock: Clock,
    pub time_control: TimeControl,
    pub moves: Vec<Move>,
    /// "play"、"stone removal"、"finished"
    pub phase: String,
    pub width: i32,
    pub height: i32,
    pub handicap: i32,
    pub komi: f32,
    pub rules: String,
    pub initial_player: String,
    pub private: bool,
    pub ranked: bool,
    pub rengo: bool,
    pub aga_handicap_scoring: bool,
    pub allow_self_capture: bool,
    pub allow_superko: bool,
    pub automatic_stone_removal: bool,
    pub handicap_rank_difference: f32,
    /// 可能是整数也可能是字符串
    pub group_ids: Vec<serde_json::Value>,
    /// 玩家 ID -> 延迟
    pub latencies: HashMap<String, i64>,
    pub opponent_plays_first_after_resume: bool,
    pub score_handicap: bool,
    pub score_passes: bool,
    pub score_prisoners: bool,
    pub score_stones: bool,
    pub score_territory: bool,
    pub score_territory_in_seki: bool,
    pub start_time: Option<Timestamp>,
    pub state_version: i32,
    pub strict_seki_mode: bool,
    pub superko_algorithm: String,
    pub white_must_pass_last: bool,
    /// 仅在对局结束后有意义
    #[serde(rename = "winner")]
    pub winner_id: UserId,
}

impl Game {
    /// 一行概要：ID、名称、双方、手数、轮到谁
    pub fn overview(&self) -> String {
        let whose_turn = if self.clock.current_player_id == self.players.white.id {
            "White"
        } else {
            "Black"
        };
        format!(
            "{} {:<10} {} vs {}, {} moves, {} to play",
            self.game_id,
            format!("{:?}", self.game_name),
            self.black_player_summary(),
            self.white_player_summary(),
            self.moves.len(),
            whose_turn
        )
    }

    pub fn url(&self) -> String {
        format!("{}/game/{}", OGS_BASE_URL, self.game_id)
    }

    /// 棋盘边长（拉取时已校验为正方形）
    pub fn board_size(&self) -> i32 {
        self.height
    }

    /// 接力棋的队员只出现在 player_pool 中
    pub fn is_my_game(&self, user_id: UserId) -> bool {
        self.player_pool
            .get(&user_id.to_string())
            .is_some_and(|p| p.id == user_id)
            || user_id == self.black_player_id
            || user_id == self.white_player_id
    }

    pub fn is_my_turn(&self, user_id: UserId) -> bool {
        self.clock.current_player_id == user_id
    }

    pub fn opponent(&self, user_id: UserId) -> &Player {
        if self.players.black.id == user_id {
            &self.players.white
        } else {
            &self.players.black
        }
    }

    pub fn player_by_id(&self, user_id: UserId) -> Option<&Player> {
        self.player_pool.get(&user_id.to_string())
    }

    pub fn black_player_summary(&self) -> String {
        format!("(B) {}", self.players.black)
    }

    pub fn white_player_summary(&self) -> String {
        format!("(W) {}", self.players.white)
    }

    pub fn is_finished(&self) -> bool {
        self.phase == PHASE_FINISHED
    }

    /// 对局结果，如 "(W) bob[2d] won by Resignation"；未结束返回 None
    pub fn result(&self, state: Option<&GameState>) -> Option<String> {
        if !self.is_finished() {
            return None;
        }
        Some(self.winner_text(state))
    }

    fn winner_text(&self, state: Option<&GameState>) -> String {
        let winner = if self.winner_id == self.white_player_id {
            self.white_player_summary()
        } else {
            self.black_player_summary()
        };
        let outcome = state
            .map(|s| s.outcome.as_str())
            .filter(|o| !o.is_empty())
            .unwrap_or("unknown outcome");
        format!("{} won by {}", winner, outcome)
    }

    /// 当前局面的状态文本
    ///
    /// `viewer` 为对局一方时使用 "you"/"opponent" 的说法，否则使用黑白。
    pub fn status(&self, state: Option<&GameState>, viewer: Option<UserId>) -> String {
        let Some(state) = state else {
            return "Unknown board state".to_string();
        };
        let viewer = viewer.filter(|&id| self.is_my_game(id));

        if state.move_number == 0 {
            return match viewer {
                Some(id) if id == self.black_player_id => {
                    "Game ready, your turn to start".to_string()
                }
                _ => format!("Game ready, {} to start", self.black_player_summary()),
            };
        }
        if state.is_finished() {
            // Game 可能还未收到结束推送，以 GameState 为准
            return format!("Game has finished, {}", self.winner_text(Some(state)));
        }

        let (who_played, turn) = match viewer {
            Some(id) if state.player_to_move == id => ("opponent", "your"),
            Some(_) => ("you", "opponent's"),
            None if state.player_to_move == self.black_player_id => ("White", "Black's"),
            None => ("Black", "White's"),
        };

        if state.last_move.is_pass() {
            return format!(
                "{} moves, {} passed, {} turn",
                state.move_number, who_played, turn
            );
        }
        let last_move = state
            .last_move
            .to_a1(self.board_size())
            .map(|a1| a1.to_string())
            .unwrap_or_else(|_| state.last_move.to_string());
        format!(
            "{} moves, {} played {}, {} turn",
            state.move_number, who_played, last_move, turn
        )
    }

    /// 指定玩家此刻的剩余时间
    pub fn clock_for(&self, player_id: UserId, now: DateTime<Utc>) -> Option<ComputedClock> {
        compute_clock(&self.clock, &self.time_control, player_id, now)
    }

    /// 指定玩家此刻剩余时间的显示文本
    pub fn clock_text(&self, player_id: UserId, now: DateTime<Utc>) -> Option<String> {
        self.clock_for(player_id, now).map(|c| c.render())
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.overview())
    }
}

/// 局面快照（`/termination-api/game/<id>/state`）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameState {
    /// "play"、"finished" 等
    pub phase: String,
    /// 已下手数
    pub move_number: i32,
    /// 上一手，`[-1, -1]` 表示虚着
    pub last_move: OriginCoordinate,
    /// 轮到走子的用户 ID
    pub player_to_move: UserId,
    /// 对局结果，如 "Resignation"、"2.5 points"
    pub outcome: String,
    /// 0 = 空，1 = 黑，2 = 白
    pub board: Vec<Vec<i32>>,
    pub removal: Vec<Vec<i32>>,
}

impl GameState {
    pub fn board_size(&self) -> i32 {
        self.board.len() as i32
    }

    pub fn is_my_turn(&self, user_id: UserId) -> bool {
        self.player_to_move == user_id
    }

    pub fn is_finished(&self) -> bool {
        self.phase == PHASE_FINISHED
    }
}

/// 登录后的首页概览
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Overview {
    pub active_games: Vec<GameOverview>,
}

/// 概览中的对局，数据包在 `json` 字段里
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameOverview {
    #[serde(rename = "json")]
    pub game: Game,
}
