//! 客户端配置
//!
//! 配置保存在 `<config dir>/ogs-client/config.json`，缺失或损坏时使用默认值。

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use ogs_protocol::OGS_BASE_URL;
use serde::{Deserialize, Serialize};

/// 客户端配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// REST 接口地址
    pub base_url: String,
    /// 请求超时（秒）
    pub request_timeout_secs: u64,
    /// watch 轮询间隔（毫秒）
    pub poll_interval_ms: u64,
    /// 默认日志过滤规则，可被 RUST_LOG 覆盖
    pub log_filter: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: OGS_BASE_URL.to_string(),
            request_timeout_secs: 30,
            poll_interval_ms: 2000,
            log_filter: "ogs_client=info".to_string(),
        }
    }
}

impl ClientConfig {
    /// 获取配置文件路径
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut path| {
            path.push("ogs-client");
            path.push("config.json");
            path
        })
    }

    /// 从默认路径加载配置
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            tracing::warn!("无法获取配置目录，使用默认配置");
            return Self::default();
        };
        Self::load_or_default(&path)
    }

    /// 从指定路径加载配置，失败时使用默认配置
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            tracing::info!("配置文件不存在，使用默认配置");
            return Self::default();
        }
        match Self::load_from(path) {
            Ok(config) => {
                tracing::info!("已加载配置: {:?}", path);
                config
            }
            Err(e) => {
                tracing::warn!("{:#}，使用默认配置", e);
                Self::default()
            }
        }
    }

    /// 从指定路径加载配置
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {:?}", path))?;
        serde_json::from_str(&content).with_context(|| format!("配置文件格式无效: {:?}", path))
    }

    /// 保存配置到指定路径
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("无法创建配置目录: {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(self).context("序列化配置失败")?;
        std::fs::write(path, content)
            .with_context(|| format!("写入配置文件失败: {:?}", path))?;

        tracing::info!("配置已保存: {:?}", path);
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
