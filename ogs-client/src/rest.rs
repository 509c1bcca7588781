//! OGS REST API 客户端
//!
//! 接口说明见 https://apidocs.online-go.com

use anyhow::Context;
use async_trait::async_trait;
use ogs_protocol::{
    Game, GameId, GameState, HttpTransport, Overview, ProtocolError, Result, User,
    MAX_BOARD_SIZE,
};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::ClientConfig;

/// 基于 reqwest 的 HTTP 传输
pub struct ReqwestTransport {
    base_url: String,
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// 创建新的 HTTP 传输
    pub fn new(config: &ClientConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, uri: &str, token: &str, query: &[(String, String)]) -> Result<Vec<u8>> {
        let url = format!("{}{}", self.base_url, uri);
        debug!("GET {}", url);

        let mut request = self
            .client
            .get(&url)
            .header(CONTENT_TYPE, "application/json")
            .query(query);
        if !token.is_empty() {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await.map_err(|e| ProtocolError::Request {
            url: url.clone(),
            reason: e.to_string(),
        })?;
        if resp.status() != StatusCode::OK {
            return Err(ProtocolError::Http {
                url,
                status: resp.status().as_u16(),
            });
        }

        let body = resp.bytes().await.map_err(|e| ProtocolError::Request {
            url: url.clone(),
            reason: e.to_string(),
        })?;
        Ok(body.to_vec())
    }
}

/// `/api/v1/games/<id>` 把对局数据包在 `gamedata` 字段里
#[derive(Deserialize)]
struct GameEnvelope {
    gamedata: Game,
}

/// REST 客户端
pub struct RestClient<T> {
    transport: T,
    access_token: String,
}

impl<T: HttpTransport> RestClient<T> {
    /// 创建 REST 客户端，`access_token` 为空时以匿名身份访问
    pub fn new(transport: T, access_token: impl Into<String>) -> Self {
        Self {
            transport,
            access_token: access_token.into(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !self.access_token.is_empty()
    }

    /// 发送 GET 请求并解码响应
    pub async fn get<D: DeserializeOwned>(&self, uri: &str, query: &[(String, String)]) -> Result<D> {
        let body = self.transport.get(uri, &self.access_token, query).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// 发送 GET 请求，返回原始 JSON
    pub async fn get_json(&self, uri: &str) -> Result<Value> {
        self.get(uri, &[]).await
    }

    /// 当前登录用户
    pub async fn about_me(&self) -> Result<User> {
        self.get("/api/v1/me", &[]).await
    }

    /// 进行中的对局
    pub async fn overview(&self) -> Result<Overview> {
        self.get("/api/v1/ui/overview", &[]).await
    }

    /// 对局信息（大部分字段在对局期间不变）
    ///
    /// `/termination-api/game/<id>` 不支持私有对局，这里使用 `/api/v1/games/<id>`。
    pub async fn game(&self, game_id: GameId) -> Result<Game> {
        let envelope: GameEnvelope = self.get(&format!("/api/v1/games/{}", game_id), &[]).await?;
        let game = envelope.gamedata;
        if game.width <= 0 || game.height <= 0 || game.width != game.height {
            return Err(ProtocolError::InvalidBoard {
                width: game.width.max(0) as usize,
                height: game.height.max(0) as usize,
            });
        }
        Ok(game)
    }

    /// 当前局面快照
    pub async fn game_state(&self, game_id: GameId) -> Result<GameState> {
        let state: GameState = self
            .get(&format!("/termination-api/game/{}/state", game_id), &[])
            .await?;

        let height = state.board.len();
        let width = state.board.first().map_or(0, Vec::len);
        if height == 0 || width == 0 {
            return Err(ProtocolError::EmptyBoard);
        }
        if height != width || height > MAX_BOARD_SIZE as usize {
            return Err(ProtocolError::InvalidBoard { width, height });
        }
        Ok(state)
    }
}
