//! 对局会话
//!
//! 缓存对局信息，时钟和局面快照每次整体替换；时钟剩余时间在显示时现算。

use chrono::{DateTime, Utc};
use ogs_protocol::{Game, GameId, GameState, HttpTransport, Result, ServerEvent, UserId};
use tracing::{debug, info};

use crate::rest::RestClient;

/// 单个对局的本地视图
#[derive(Debug, Clone)]
pub struct GameSession {
    game: Game,
    state: Option<GameState>,
    /// 收到落子后局面快照已过期，需要重新拉取
    state_stale: bool,
    /// 观看者（对局一方时状态文本使用 you/opponent）
    viewer: Option<UserId>,
}

impl GameSession {
    pub fn new(game: Game, viewer: Option<UserId>) -> Self {
        Self {
            game,
            state: None,
            state_stale: true,
            viewer,
        }
    }

    /// 拉取对局信息与局面，创建会话
    pub async fn open<T: HttpTransport>(
        rest: &RestClient<T>,
        game_id: GameId,
        viewer: Option<UserId>,
    ) -> Result<Self> {
        let game = rest.game(game_id).await?;
        info!("Opened game {}", game.overview());
        let mut session = Self::new(game, viewer);
        session.apply_state(rest.game_state(game_id).await?);
        Ok(session)
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn state(&self) -> Option<&GameState> {
        self.state.as_ref()
    }

    pub fn game_id(&self) -> GameId {
        self.game.game_id
    }

    pub fn needs_refresh(&self) -> bool {
        self.state_stale
    }

    pub fn is_finished(&self) -> bool {
        self.game.is_finished() || self.state.as_ref().is_some_and(GameState::is_finished)
    }

    /// 替换局面快照
    pub fn apply_state(&mut self, state: GameState) {
        self.state = Some(state);
        self.state_stale = false;
    }

    /// 处理实时事件，不属于本对局的事件被忽略
    pub fn apply_event(&mut self, game_id: GameId, event: ServerEvent) {
        if game_id != self.game.game_id {
            debug!("Ignored event for game {}", game_id);
            return;
        }
        match event {
            ServerEvent::GameData(game) => {
                self.replace_game(*game);
                self.state_stale = true;
            }
            ServerEvent::Clock(clock) => self.game.clock = clock,
            ServerEvent::Move(m) => {
                debug!("Move {} at {}", m.move_number, m.mv.coordinate);
                self.game.moves.push(m.mv);
                self.state_stale = true;
            }
        }
    }

    /// 通过 REST 接口刷新时钟与局面
    pub async fn refresh<T: HttpTransport>(&mut self, rest: &RestClient<T>) -> Result<()> {
        let game = rest.game(self.game.game_id).await?;
        let state = rest.game_state(self.game.game_id).await?;
        self.replace_game(game);
        self.apply_state(state);
        Ok(())
    }

    // 时间控制在对局期间不变，沿用首次拉取的配置
    fn replace_game(&mut self, game: Game) {
        let time_control = std::mem::take(&mut self.game.time_control);
        self.game = Game {
            time_control,
            ..game
        };
    }

    /// 状态文本
    pub fn status(&self) -> String {
        self.game.status(self.state.as_ref(), self.viewer)
    }

    /// 双方时钟文本，如 "(B) alice[3d]: 9:40 +0:30 (5)"
    pub fn clock_lines(&self, now: DateTime<Utc>) -> [String; 2] {
        let line = |summary: String, player_id: UserId| {
            let clock = self
                .game
                .clock_text(player_id, now)
                .unwrap_or_else(|| "-".to_string());
            format!("{}: {}", summary, clock)
        };
        [
            line(self.game.black_player_summary(), self.game.black_player_id),
            line(self.game.white_player_summary(), self.game.white_player_id),
        ]
    }

    /// 状态与时钟的完整显示
    pub fn render(&self, now: DateTime<Utc>) -> String {
        let [black, white] = self.clock_lines(now);
        format!("{}\n{}\n{}", self.status(), black, white)
    }
}
