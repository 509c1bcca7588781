//! 错误类型定义

use thiserror::Error;

/// 坐标错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoordinateError {
    /// 超出棋盘范围
    #[error("coordinate [{x},{y}] is out of board bounds [0-{max}]")]
    OutOfBounds { x: i32, y: i32, max: i32 },

    /// 无效的列字母
    #[error("invalid column letter '{col}' in coordinate {coord:?}: must be A-H or J-Z")]
    InvalidColumn { col: char, coord: String },

    /// 无效的行号
    #[error("invalid row number in coordinate {coord:?}: must be 1-25")]
    InvalidRow { coord: String },

    /// 棋盘尺寸超出支持范围
    #[error("board size {size} is outside the supported range [1-{max}]")]
    InvalidBoardSize { size: i32, max: i32 },

    /// 坐标字符串过短
    #[error("invalid coordinate string {coord:?}")]
    TooShort { coord: String },
}

/// 协议错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// JSON 序列化错误
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP 状态码异常
    #[error("{url} -> {status}")]
    Http { url: String, status: u16 },

    /// 请求失败（网络层）
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    /// 棋盘尺寸无效
    #[error("invalid board dimension {width} x {height}")]
    InvalidBoard { width: usize, height: usize },

    /// 空棋盘
    #[error("invalid empty board")]
    EmptyBoard,

    /// 时间戳格式错误
    #[error("expected a numeric Unix timestamp, but got {raw}")]
    InvalidTimestamp { raw: String },

    /// 无效的着手输入
    #[error("invalid move: {reason}")]
    InvalidMove { reason: String },

    /// 无法解析对局 ID
    #[error("failed to extract game id from {input:?}")]
    InvalidGameId { input: String },

    /// 连接已关闭
    #[error("Connection closed")]
    ConnectionClosed,

    /// 尚未连接
    #[error("Not connected")]
    NotConnected,

    /// 坐标错误
    #[error("Coordinate error: {0}")]
    Coordinate(#[from] CoordinateError),
}

/// 协议操作结果类型
pub type Result<T> = std::result::Result<T, ProtocolError>;
