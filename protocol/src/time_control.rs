//! 时间控制配置
//!
//! 服务端下发的 `time_control` 是一个扁平结构，只有当前制式用到的字段有意义。
//! [`TimeControl::system`] 将其收敛为带数据的 [`TimeSystem`]。

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::timestamp::format_duration;

/// 服务端的时间控制配置（原始结构）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeControl {
    /// "absolute" / "byoyomi" / "canadian" / "fischer" / "simple" / "none"
    pub system: String,
    /// 部分接口只填这个字段，内容与 `system` 相同
    pub time_control: String,
    /// "blitz" / "live" / "correspondence"
    pub speed: String,
    pub pause_on_weekends: bool,

    // byoyomi / canadian
    pub main_time: f64,
    pub period_time: f64,
    pub periods: i32,
    pub periods_min: i32,
    pub periods_max: i32,
    pub stones_per_period: i32,

    // absolute
    pub total_time: f64,

    // fischer
    pub initial_time: f64,
    pub time_increment: f64,
    pub max_time: f64,

    // simple
    pub per_move: f64,
}

impl TimeControl {
    /// 制式名称
    pub fn system_name(&self) -> &str {
        if self.system.is_empty() {
            &self.time_control
        } else {
            &self.system
        }
    }

    /// 解析为具体制式，未知制式返回 None
    pub fn system(&self) -> Option<TimeSystem> {
        let system = match self.system_name() {
            "absolute" => TimeSystem::Absolute {
                total_time: self.total_time,
            },
            "byoyomi" => TimeSystem::Byoyomi {
                main_time: self.main_time,
                period_time: self.period_time,
                periods: self.periods,
            },
            "canadian" => TimeSystem::Canadian {
                main_time: self.main_time,
                period_time: self.period_time,
                stones_per_period: self.stones_per_period,
            },
            "fischer" => TimeSystem::Fischer {
                initial_time: self.initial_time,
                time_increment: self.time_increment,
                max_time: self.max_time,
            },
            "simple" => TimeSystem::Simple {
                per_move: self.per_move,
            },
            _ => return None,
        };
        Some(system)
    }
}

/// 计时制式
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeSystem {
    /// 包干
    Absolute { total_time: f64 },
    /// 日本读秒：主时间 + 若干次固定长度的读秒
    Byoyomi {
        main_time: f64,
        period_time: f64,
        periods: i32,
    },
    /// 加拿大读秒：主时间 + 一段需完成固定手数的时间
    Canadian {
        main_time: f64,
        period_time: f64,
        stones_per_period: i32,
    },
    /// 费舍尔加秒
    Fischer {
        initial_time: f64,
        time_increment: f64,
        max_time: f64,
    },
    /// 每手固定时间
    Simple { per_move: f64 },
}

impl TimeSystem {
    pub fn kind(&self) -> SystemKind {
        match self {
            TimeSystem::Absolute { .. } => SystemKind::Absolute,
            TimeSystem::Byoyomi { .. } => SystemKind::Byoyomi,
            TimeSystem::Canadian { .. } => SystemKind::Canadian,
            TimeSystem::Fischer { .. } => SystemKind::Fischer,
            TimeSystem::Simple { .. } => SystemKind::Simple,
        }
    }
}

impl fmt::Display for TimeSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            TimeSystem::Absolute { total_time } => {
                write!(f, "Absolute {}", format_duration(total_time))
            }
            TimeSystem::Byoyomi {
                main_time,
                period_time,
                periods,
            } => write!(
                f,
                "Byoyomi {} + {}x{}",
                format_duration(main_time),
                periods,
                format_duration(period_time)
            ),
            TimeSystem::Canadian {
                main_time,
                period_time,
                stones_per_period,
            } => write!(
                f,
                "Canadian {} + {}/{}",
                format_duration(main_time),
                format_duration(period_time),
                stones_per_period
            ),
            TimeSystem::Fischer {
                initial_time,
                time_increment,
                max_time,
            } => write!(
                f,
                "Fischer {} +{} up to {}",
                format_duration(initial_time),
                format_duration(time_increment),
                format_duration(max_time)
            ),
            TimeSystem::Simple { per_move } => {
                write!(f, "Simple {} per move", format_duration(per_move))
            }
        }
    }
}

/// 制式类别（不带参数）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemKind {
    Absolute,
    Byoyomi,
    Canadian,
    Fischer,
    Simple,
}
