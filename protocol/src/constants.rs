//! 协议常量定义

/// OGS 站点地址
pub const OGS_BASE_URL: &str = "https://online-go.com";

/// 棋盘最大边长
pub const MAX_BOARD_SIZE: i32 = 25;

/// 大于该值的时间戳按毫秒解析，否则按秒解析
pub const MILLIS_TIMESTAMP_THRESHOLD: i64 = 1_000_000_000_000;

/// 读秒阈值（秒）：剩余时间低于该值视为进入读秒
pub const SUDDEN_DEATH_SECS: f64 = 10.0;

/// 时间比较精度：小于该值视为时间耗尽
pub const TIME_EPSILON: f64 = 1e-7;

/// 对局结束阶段名
pub const PHASE_FINISHED: &str = "finished";
