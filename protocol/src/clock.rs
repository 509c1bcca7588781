//! 对局时钟
//!
//! 服务端推送的 [`Clock`] 只是某一时刻的快照。[`compute_clock`] 根据快照时刻到
//! `now` 之间经过的时间，按制式推算出该玩家此刻的剩余时间。计算是纯函数，
//! 不维护任何后台计时器，每次显示时重新计算即可。

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{SUDDEN_DEATH_SECS, TIME_EPSILON};
use crate::message::UserId;
use crate::time_control::{SystemKind, TimeControl, TimeSystem};
use crate::timestamp::{format_duration, Timestamp};

/// 单方剩余时间
///
/// 接力棋（rengo）中服务端直接给出一个截止时间戳；普通对局则是结构化的记录。
/// 解码时先尝试时间戳，失败再按结构体解析，顺序不可调换。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlayerTime {
    /// 截止时间（仅接力棋）
    Deadline(Timestamp),
    /// 结构化剩余时间（普通对局）
    Clock(PlayerClock),
}

impl Default for PlayerTime {
    fn default() -> Self {
        PlayerTime::Clock(PlayerClock::default())
    }
}

/// 结构化剩余时间，单位均为秒；当前制式用不到的字段为 0
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerClock {
    /// 主时间
    pub thinking_time: f64,
    /// 剩余读秒次数（byoyomi）
    pub periods: i32,
    /// 读秒长度（byoyomi）
    pub period_time: f64,
    /// 当前读秒剩余（byoyomi）
    pub period_time_left: f64,
    /// 本段剩余手数（canadian）
    pub moves_left: i32,
    /// 本段剩余时间（canadian）
    pub block_time: f64,
}

/// 时钟快照
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Clock {
    pub game_id: i64,
    pub title: String,
    pub black_player_id: i64,
    pub white_player_id: i64,
    /// 当前走子方的用户 ID
    #[serde(rename = "current_player")]
    pub current_player_id: i64,
    pub black_time: PlayerTime,
    pub white_time: PlayerTime,
    /// 上一手的时间，即快照中各方时间的基准时刻
    pub last_move: Option<Timestamp>,
    pub expiration: Option<Timestamp>,
    /// 服务端发送快照的时刻（仅实时推送中有）
    pub now: Option<Timestamp>,
    pub paused_since: Option<Timestamp>,
    /// 对局尚未开始计时
    pub start_mode: bool,
}

impl Clock {
    /// 获取指定玩家的剩余时间，非对局双方返回 None
    pub fn player_time(&self, player_id: UserId) -> Option<&PlayerTime> {
        if player_id == self.black_player_id {
            Some(&self.black_time)
        } else if player_id == self.white_player_id {
            Some(&self.white_time)
        } else {
            None
        }
    }

    /// 快照时刻：优先取上一手时间，缺失时取服务端 now
    pub fn snapshot_instant(&self) -> Option<Timestamp> {
        self.last_move.or(self.now)
    }

    pub fn is_on_turn(&self, player_id: UserId) -> bool {
        self.current_player_id == player_id
    }
}

/// 推算出的当前剩余时间，每次查询时重新计算
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedClock {
    pub kind: SystemKind,
    /// 主时间剩余（秒）
    pub main_time: f64,
    pub overtime: Overtime,
    pub sudden_death: bool,
    pub timed_out: bool,
}

/// 主时间之外的计时状态
#[derive(Debug, Clone, PartialEq)]
pub enum Overtime {
    /// 包干、费舍尔、每手固定时间
    None,
    /// 日本读秒
    Periods { periods_left: i32, period_time_left: f64 },
    /// 加拿大读秒
    Block { moves_left: i32, block_time_left: f64 },
    /// 接力棋的截止时间，原样透传
    Deadline(Timestamp),
}

/// 计算 `player_id` 在 `now` 时刻的剩余时间
///
/// 玩家不是对局双方、或制式无法识别时返回 None。
pub fn compute_clock(
    clock: &Clock,
    time_control: &TimeControl,
    player_id: UserId,
    now: DateTime<Utc>,
) -> Option<ComputedClock> {
    let player_time = clock.player_time(player_id)?;
    let system = time_control.system()?;

    let snapshot = match player_time {
        PlayerTime::Deadline(deadline) => {
            return Some(ComputedClock {
                kind: system.kind(),
                main_time: 0.0,
                overtime: Overtime::Deadline(*deadline),
                sudden_death: false,
                timed_out: false,
            })
        }
        PlayerTime::Clock(snapshot) => snapshot,
    };

    let on_turn = clock.is_on_turn(player_id);
    // 非走子方或尚未开始计时，时钟视为暂停
    let elapsed = match clock.snapshot_instant() {
        Some(instant) if on_turn && !clock.start_mode => instant.seconds_until(now),
        _ => 0.0,
    };

    let computed = match system {
        TimeSystem::Absolute { .. } | TimeSystem::Fischer { .. } => {
            plain(system.kind(), snapshot.thinking_time, on_turn, elapsed)
        }
        TimeSystem::Simple { per_move } => plain(system.kind(), per_move, on_turn, elapsed),
        TimeSystem::Byoyomi { period_time, .. } => {
            byoyomi(snapshot, period_time, on_turn, elapsed)
        }
        TimeSystem::Canadian { period_time, .. } => {
            canadian(snapshot, period_time, on_turn, elapsed)
        }
    };
    Some(computed)
}

/// 以当前系统时间计算
pub fn compute_clock_now(
    clock: &Clock,
    time_control: &TimeControl,
    player_id: UserId,
) -> Option<ComputedClock> {
    compute_clock(clock, time_control, player_id, Utc::now())
}

fn exhausted(seconds: f64) -> bool {
    seconds < TIME_EPSILON
}

/// 先扣主时间，返回 (主时间剩余, 溢出到读秒的时间)
fn deplete(thinking_time: f64, elapsed: f64) -> (f64, f64) {
    if thinking_time > 0.0 {
        let left = thinking_time - elapsed;
        if left < 0.0 {
            (0.0, -left)
        } else {
            (left, 0.0)
        }
    } else {
        (0.0, elapsed)
    }
}

fn plain(kind: SystemKind, thinking_time: f64, on_turn: bool, elapsed: f64) -> ComputedClock {
    let main_time = if on_turn {
        (thinking_time - elapsed).max(0.0)
    } else {
        thinking_time
    };
    ComputedClock {
        kind,
        main_time,
        overtime: Overtime::None,
        sudden_death: main_time < SUDDEN_DEATH_SECS,
        timed_out: exhausted(main_time),
    }
}

fn byoyomi(snapshot: &PlayerClock, period_time: f64, on_turn: bool, elapsed: f64) -> ComputedClock {
    let period_len = if period_time > 0.0 {
        period_time
    } else {
        snapshot.period_time
    };

    let (main_time, periods_left, period_time_left, remaining) = if on_turn {
        let (main_time, overtime) = deplete(snapshot.thinking_time, elapsed);
        // remaining 可以为负，表示所有读秒都已用完
        let (remaining, period_time_left) = if period_len > 0.0 {
            let used = (overtime / period_len).floor();
            (
                snapshot.periods.saturating_sub(used as i32),
                (period_len - (overtime - used * period_len)).max(0.0),
            )
        } else if overtime > TIME_EPSILON {
            (-1, 0.0)
        } else {
            (snapshot.periods, 0.0)
        };
        (main_time, remaining.max(0), period_time_left, remaining)
    } else {
        let period_time_left = if snapshot.period_time_left > 0.0 {
            snapshot.period_time_left
        } else {
            period_len
        };
        (
            snapshot.thinking_time,
            snapshot.periods,
            period_time_left,
            snapshot.periods,
        )
    };

    ComputedClock {
        kind: SystemKind::Byoyomi,
        main_time,
        overtime: Overtime::Periods {
            periods_left,
            period_time_left,
        },
        sudden_death: periods_left <= 1,
        timed_out: exhausted(main_time) && remaining < 0,
    }
}

fn canadian(snapshot: &PlayerClock, period_time: f64, on_turn: bool, elapsed: f64) -> ComputedClock {
    // 主时间未用完时服务端可能不填本段时间
    let block_time = if snapshot.block_time > 0.0 || exhausted(snapshot.thinking_time) {
        snapshot.block_time
    } else {
        period_time
    };

    let (main_time, block_time_left) = if on_turn {
        let (main_time, overtime) = deplete(snapshot.thinking_time, elapsed);
        (main_time, (block_time - overtime).max(0.0))
    } else {
        (snapshot.thinking_time, block_time)
    };
    // 手数由服务端在下一次快照中更新，这里不做递减
    let moves_left = snapshot.moves_left;

    let main_exhausted = exhausted(main_time);
    ComputedClock {
        kind: SystemKind::Canadian,
        main_time,
        overtime: Overtime::Block {
            moves_left,
            block_time_left,
        },
        sudden_death: main_exhausted
            && (block_time_left < SUDDEN_DEATH_SECS || moves_left < 2),
        timed_out: main_exhausted && exhausted(block_time_left),
    }
}

impl ComputedClock {
    /// 渲染为简短的显示文本
    pub fn render(&self) -> String {
        if self.timed_out {
            return "Timeout".to_string();
        }

        let sd = if self.sudden_death { " (SD)" } else { "" };
        match &self.overtime {
            Overtime::None => format!("{}{}", format_duration(self.main_time), sd),
            Overtime::Periods {
                periods_left,
                period_time_left,
            } => {
                if self.sudden_death {
                    format!("{} (SD)", format_duration(*period_time_left))
                } else if exhausted(self.main_time) {
                    format!("{} ({})", format_duration(*period_time_left), periods_left)
                } else {
                    format!(
                        "{} +{} ({})",
                        format_duration(self.main_time),
                        format_duration(*period_time_left),
                        periods_left
                    )
                }
            }
            Overtime::Block {
                moves_left,
                block_time_left,
            } => {
                if exhausted(self.main_time) {
                    format!("{}/{}{}", format_duration(*block_time_left), moves_left, sd)
                } else {
                    format!(
                        "{} +{}/{}{}",
                        format_duration(self.main_time),
                        format_duration(*block_time_left),
                        moves_left,
                        sd
                    )
                }
            }
            Overtime::Deadline(deadline) => format!("until {}", deadline),
        }
    }
}

impl fmt::Display for ComputedClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    const BLACK: UserId = 100;
    const WHITE: UserId = 200;

    fn base_time() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn after(secs: i64) -> DateTime<Utc> {
        base_time() + Duration::seconds(secs)
    }

    fn make_clock(black: PlayerClock, white: PlayerClock, current: UserId) -> Clock {
        Clock {
            game_id: 1,
            black_player_id: BLACK,
            white_player_id: WHITE,
            current_player_id: current,
            black_time: PlayerTime::Clock(black),
            white_time: PlayerTime::Clock(white),
            last_move: Some(Timestamp(base_time())),
            ..Default::default()
        }
    }

    fn thinking(secs: f64) -> PlayerClock {
        PlayerClock {
            thinking_time: secs,
            ..Default::default()
        }
    }

    fn tc(json: &str) -> TimeControl {
        serde_json::from_str(json).unwrap()
    }

    fn absolute() -> TimeControl {
        tc(r#"{"system":"absolute","total_time":600}"#)
    }

    fn byoyomi_tc() -> TimeControl {
        tc(r#"{"system":"byoyomi","main_time":600,"period_time":30,"periods":5}"#)
    }

    fn canadian_tc() -> TimeControl {
        tc(r#"{"system":"canadian","main_time":600,"period_time":300,"stones_per_period":10}"#)
    }

    #[test]
    fn test_absolute_on_turn() {
        let clock = make_clock(thinking(40.0), thinking(40.0), BLACK);

        let c = compute_clock(&clock, &absolute(), BLACK, after(10)).unwrap();
        assert!((c.main_time - 30.0).abs() < 1e-6);
        assert!(!c.sudden_death);
        assert!(!c.timed_out);

        let c = compute_clock(&clock, &absolute(), BLACK, after(35)).unwrap();
        assert!((c.main_time - 5.0).abs() < 1e-6);
        assert!(c.sudden_death);
        assert!(!c.timed_out);
        assert_eq!(c.render(), "0:05 (SD)");
    }

    #[test]
    fn test_absolute_timeout() {
        let clock = make_clock(thinking(40.0), thinking(40.0), BLACK);
        let c = compute_clock(&clock, &absolute(), BLACK, after(41)).unwrap();
        assert_eq!(c.main_time, 0.0);
        assert!(c.timed_out);
        assert_eq!(c.render(), "Timeout");
    }

    #[test]
    fn test_off_turn_never_depletes() {
        let clock = make_clock(thinking(40.0), thinking(125.0), BLACK);
        let first = compute_clock(&clock, &absolute(), WHITE, after(1)).unwrap();
        for secs in [10, 100, 10_000] {
            let again = compute_clock(&clock, &absolute(), WHITE, after(secs)).unwrap();
            assert_eq!(again, first);
        }
        assert_eq!(first.main_time, 125.0);
        assert_eq!(first.render(), "2:05");
    }

    #[test]
    fn test_deterministic_for_same_instant() {
        let clock = make_clock(thinking(40.0), thinking(40.0), WHITE);
        let a = compute_clock(&clock, &absolute(), WHITE, after(12));
        let b = compute_clock(&clock, &absolute(), WHITE, after(12));
        assert_eq!(a, b);
    }

    #[test]
    fn test_start_mode_pauses() {
        let mut clock = make_clock(thinking(40.0), thinking(40.0), BLACK);
        clock.start_mode = true;
        let c = compute_clock(&clock, &absolute(), BLACK, after(30)).unwrap();
        assert_eq!(c.main_time, 40.0);
    }

    #[test]
    fn test_now_before_snapshot_is_clamped() {
        let clock = make_clock(thinking(40.0), thinking(40.0), BLACK);
        let c = compute_clock(&clock, &absolute(), BLACK, after(-5)).unwrap();
        assert_eq!(c.main_time, 40.0);
    }

    #[test]
    fn test_unknown_player_and_system() {
        let clock = make_clock(thinking(40.0), thinking(40.0), BLACK);
        assert!(compute_clock(&clock, &absolute(), 999, after(1)).is_none());
        assert!(compute_clock(&clock, &tc(r#"{"system":"hourglass"}"#), BLACK, after(1)).is_none());
    }

    #[test]
    fn test_fischer_uses_thinking_time() {
        let fischer = tc(r#"{"system":"fischer","initial_time":120,"time_increment":10,"max_time":300}"#);
        let clock = make_clock(thinking(95.5), thinking(60.0), BLACK);
        let c = compute_clock(&clock, &fischer, BLACK, after(20)).unwrap();
        assert_eq!(c.kind, SystemKind::Fischer);
        assert!((c.main_time - 75.5).abs() < 1e-6);
        assert_eq!(c.render(), "1:15");
    }

    #[test]
    fn test_simple_uses_per_move() {
        let simple = tc(r#"{"system":"simple","per_move":30}"#);
        let clock = make_clock(PlayerClock::default(), PlayerClock::default(), BLACK);

        let on_turn = compute_clock(&clock, &simple, BLACK, after(12)).unwrap();
        assert!((on_turn.main_time - 18.0).abs() < 1e-6);
        assert!(!on_turn.sudden_death);

        let off_turn = compute_clock(&clock, &simple, WHITE, after(12)).unwrap();
        assert_eq!(off_turn.main_time, 30.0);

        let late = compute_clock(&clock, &simple, BLACK, after(31)).unwrap();
        assert!(late.timed_out);
    }

    #[test]
    fn test_byoyomi_in_last_period() {
        let black = PlayerClock {
            thinking_time: 0.0,
            periods: 1,
            period_time: 30.0,
            ..Default::default()
        };
        let clock = make_clock(black, thinking(600.0), BLACK);
        let c = compute_clock(&clock, &byoyomi_tc(), BLACK, after(10)).unwrap();

        assert_eq!(c.main_time, 0.0);
        match c.overtime {
            Overtime::Periods {
                periods_left,
                period_time_left,
            } => {
                assert_eq!(periods_left, 1);
                assert!((period_time_left - 20.0).abs() < 1e-6);
            }
            ref other => panic!("unexpected overtime {:?}", other),
        }
        assert!(c.sudden_death);
        assert!(!c.timed_out);
        assert_eq!(c.render(), "0:20 (SD)");
    }

    #[test]
    fn test_byoyomi_exhausting_periods() {
        let black = PlayerClock {
            periods: 1,
            period_time: 30.0,
            ..Default::default()
        };
        let clock = make_clock(black, thinking(600.0), BLACK);

        let c = compute_clock(&clock, &byoyomi_tc(), BLACK, after(45)).unwrap();
        assert_eq!(
            c.overtime,
            Overtime::Periods {
                periods_left: 0,
                period_time_left: 15.0
            }
        );
        assert!(!c.timed_out);

        let c = compute_clock(&clock, &byoyomi_tc(), BLACK, after(65)).unwrap();
        assert!(c.timed_out);
        assert_eq!(c.render(), "Timeout");
    }

    #[test]
    fn test_byoyomi_malformed_snapshot() {
        // 负的读秒次数配上极短的读秒长度，已用次数饱和到 i32::MAX
        let black = PlayerClock {
            periods: -5,
            period_time: 1e-9,
            ..Default::default()
        };
        let clock = make_clock(black, thinking(600.0), BLACK);
        let tc = tc(r#"{"system":"byoyomi","main_time":600,"periods":5}"#);

        let c = compute_clock(&clock, &tc, BLACK, after(10)).unwrap();
        assert!(c.timed_out);
        assert!(matches!(c.overtime, Overtime::Periods { periods_left: 0, .. }));
    }

    #[test]
    fn test_byoyomi_main_time_overflow() {
        let black = PlayerClock {
            thinking_time: 20.0,
            periods: 5,
            period_time: 30.0,
            ..Default::default()
        };
        let clock = make_clock(black, thinking(600.0), BLACK);

        let c = compute_clock(&clock, &byoyomi_tc(), BLACK, after(5)).unwrap();
        assert_eq!(c.render(), "0:15 +0:30 (5)");

        // 溢出 75 秒：用掉 2 次读秒，第 3 次剩 15 秒
        let c = compute_clock(&clock, &byoyomi_tc(), BLACK, after(95)).unwrap();
        assert_eq!(c.main_time, 0.0);
        assert_eq!(
            c.overtime,
            Overtime::Periods {
                periods_left: 3,
                period_time_left: 15.0
            }
        );
        assert!(!c.sudden_death);
        assert_eq!(c.render(), "0:15 (3)");
    }

    #[test]
    fn test_byoyomi_off_turn_reports_snapshot() {
        let white = PlayerClock {
            thinking_time: 0.0,
            periods: 3,
            period_time: 30.0,
            period_time_left: 30.0,
            ..Default::default()
        };
        let clock = make_clock(thinking(600.0), white, BLACK);
        let c = compute_clock(&clock, &byoyomi_tc(), WHITE, after(500)).unwrap();
        assert_eq!(
            c.overtime,
            Overtime::Periods {
                periods_left: 3,
                period_time_left: 30.0
            }
        );
        assert_eq!(c.render(), "0:30 (3)");
    }

    #[test]
    fn test_canadian() {
        let black = PlayerClock {
            thinking_time: 0.0,
            moves_left: 5,
            block_time: 120.0,
            ..Default::default()
        };
        let clock = make_clock(black, thinking(600.0), BLACK);

        let c = compute_clock(&clock, &canadian_tc(), BLACK, after(30)).unwrap();
        assert_eq!(
            c.overtime,
            Overtime::Block {
                moves_left: 5,
                block_time_left: 90.0
            }
        );
        assert!(!c.sudden_death);
        assert_eq!(c.render(), "1:30/5");

        let c = compute_clock(&clock, &canadian_tc(), BLACK, after(115)).unwrap();
        assert!(c.sudden_death);
        assert_eq!(c.render(), "0:05/5 (SD)");

        let c = compute_clock(&clock, &canadian_tc(), BLACK, after(121)).unwrap();
        assert!(c.timed_out);
    }

    #[test]
    fn test_canadian_last_move_is_sudden_death() {
        let black = PlayerClock {
            moves_left: 1,
            block_time: 200.0,
            ..Default::default()
        };
        let clock = make_clock(black, thinking(600.0), WHITE);
        let c = compute_clock(&clock, &canadian_tc(), BLACK, after(30)).unwrap();
        assert!(c.sudden_death);
        assert!(!c.timed_out);
    }

    #[test]
    fn test_canadian_main_time_remaining() {
        let clock = make_clock(thinking(600.0), thinking(600.0), WHITE);
        let c = compute_clock(&clock, &canadian_tc(), WHITE, after(60)).unwrap();
        assert!(!c.sudden_death);
        assert_eq!(c.render(), "9:00 +5:00/0");
    }

    #[test]
    fn test_rengo_deadline_passes_through() {
        let json = r#"{
            "black_player_id": 100, "white_player_id": 200, "current_player": 100,
            "black_time": 1700000300000,
            "white_time": {"thinking_time": 42.5, "periods": 2, "period_time": 30},
            "last_move": 1700000000000
        }"#;
        let clock: Clock = serde_json::from_str(json).unwrap();
        assert!(matches!(clock.black_time, PlayerTime::Deadline(_)));
        assert!(matches!(clock.white_time, PlayerTime::Clock(_)));

        let c = compute_clock(&clock, &byoyomi_tc(), BLACK, after(100)).unwrap();
        let expected = Timestamp::from_unix(1_700_000_300_000).unwrap();
        assert_eq!(c.overtime, Overtime::Deadline(expected));
        assert!(!c.timed_out);
        assert_eq!(c.render(), "until 2023-11-14 22:18:20 UTC");
    }

    #[test]
    fn test_clock_decode() {
        let json = r#"{
            "game_id": 7, "title": "Friendly", "black_player_id": 100,
            "white_player_id": 200, "current_player": 200,
            "black_time": {"thinking_time": 100, "periods": 5, "period_time": 30},
            "white_time": {"thinking_time": 95.25, "periods": 5, "period_time": 30},
            "last_move": 1700000000000, "expiration": 1700000125250,
            "now": 1700000001000, "paused_since": null, "start_mode": false
        }"#;
        let clock: Clock = serde_json::from_str(json).unwrap();
        assert_eq!(clock.current_player_id, WHITE);
        assert_eq!(clock.snapshot_instant(), Some(Timestamp(base_time())));
        assert!(clock.paused_since.is_none());
        match clock.white_time {
            PlayerTime::Clock(ref t) => assert_eq!(t.thinking_time, 95.25),
            _ => panic!("expected structured time"),
        }
    }
}
