//! 时间戳与时长格式化
//!
//! 服务端的时间戳有时以秒、有时以毫秒表示，按数值大小区分。

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::MILLIS_TIMESTAMP_THRESHOLD;
use crate::error::{ProtocolError, Result};

/// Unix 时间戳（秒或毫秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub DateTime<Utc>);

impl Timestamp {
    /// 从原始数值构造，超过阈值的按毫秒处理
    pub fn from_unix(ts: i64) -> Result<Self> {
        let parsed = if ts > MILLIS_TIMESTAMP_THRESHOLD {
            Utc.timestamp_millis_opt(ts).single()
        } else {
            Utc.timestamp_opt(ts, 0).single()
        };
        parsed.map(Timestamp).ok_or(ProtocolError::InvalidTimestamp {
            raw: ts.to_string(),
        })
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// 距离 `later` 经过的秒数，不会为负
    pub fn seconds_until(&self, later: DateTime<Utc>) -> f64 {
        let millis = (later - self.0).num_milliseconds();
        (millis.max(0) as f64) / 1000.0
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Timestamp(dt)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S UTC"))
    }
}

/// 与解码规则对称：毫秒值不超过阈值时写秒，否则写毫秒
impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let millis = self.0.timestamp_millis();
        if millis > MILLIS_TIMESTAMP_THRESHOLD {
            serializer.serialize_i64(millis)
        } else {
            serializer.serialize_i64(self.0.timestamp())
        }
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(TimestampVisitor)
    }
}

struct TimestampVisitor;

impl<'de> Visitor<'de> for TimestampVisitor {
    type Value = Timestamp;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a numeric Unix timestamp in seconds or milliseconds")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Timestamp, E> {
        Timestamp::from_unix(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Timestamp, E> {
        let v = i64::try_from(v).map_err(|_| {
            E::custom(ProtocolError::InvalidTimestamp { raw: v.to_string() })
        })?;
        Timestamp::from_unix(v).map_err(E::custom)
    }
}

/// 将秒数格式化为便于阅读的时长
///
/// - 不足一小时：`m:ss`
/// - 不足一天：`Nh`
/// - 一天以上：有零头小时为 `NdMh`，否则折算为小时 `Nh`（避免单独的 "1d"）
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };

    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let secs = total % 60;

    if days > 0 {
        if hours > 0 {
            format!("{}d{}h", days, hours)
        } else {
            format!("{}h", days * 24)
        }
    } else if hours > 0 {
        format!("{}h", hours)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}
