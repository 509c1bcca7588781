//! 棋盘坐标
//!
//! - 原点坐标：从左上角开始的 0 基 `(x, y)`，`(-1, -1)` 表示虚着（pass）
//! - A1 坐标：列字母（跳过 `I`）加行号，行号从棋盘底部 1 开始向上计数

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::MAX_BOARD_SIZE;
use crate::error::CoordinateError;

/// 0 基原点坐标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct OriginCoordinate {
    pub x: i32,
    pub y: i32,
}

impl OriginCoordinate {
    /// 虚着
    pub const PASS: OriginCoordinate = OriginCoordinate { x: -1, y: -1 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// 是否为虚着
    pub fn is_pass(&self) -> bool {
        self.x == -1 || self.y == -1
    }

    /// 转换为 A1 坐标
    pub fn to_a1(&self, board_size: i32) -> Result<A1Coordinate, CoordinateError> {
        check_board_size(board_size)?;
        if !in_bounds(self.x, self.y, board_size) {
            return Err(CoordinateError::OutOfBounds {
                x: self.x,
                y: self.y,
                max: board_size - 1,
            });
        }

        // 第 9 列起跳过字母 I
        let skip = if self.x >= 8 { 1 } else { 0 };
        let col = (b'A' + (self.x + skip) as u8) as char;
        let row = board_size - self.y;
        Ok(A1Coordinate { col, row })
    }

    /// SGF 风格的两字母编码，实时接口提交着手时使用
    pub fn to_sgf(&self) -> String {
        format!("{}{}", sgf_char(self.x), sgf_char(self.y))
    }
}

impl fmt::Display for OriginCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.x, self.y)
    }
}

/// A1 坐标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct A1Coordinate {
    /// 'A', 'B', ...（跳过 'I'）
    pub col: char,
    /// 1, 2, ...
    pub row: i32,
}

impl A1Coordinate {
    pub fn new(col: char, row: i32) -> Self {
        Self { col, row }
    }

    /// 解析 "A1" 格式的坐标字符串（不区分大小写）
    pub fn parse(coord: &str) -> Result<Self, CoordinateError> {
        let mut chars = coord.chars();
        let (Some(first), Some(_)) = (chars.next(), chars.clone().next()) else {
            return Err(CoordinateError::TooShort {
                coord: coord.to_string(),
            });
        };

        let col = first.to_ascii_uppercase();
        if !col.is_ascii_uppercase() || col == 'I' {
            return Err(CoordinateError::InvalidColumn {
                col,
                coord: coord.to_string(),
            });
        }

        match chars.as_str().parse::<i32>() {
            Ok(row) if (1..=MAX_BOARD_SIZE).contains(&row) => Ok(Self { col, row }),
            _ => Err(CoordinateError::InvalidRow {
                coord: coord.to_string(),
            }),
        }
    }

    /// 转换为原点坐标
    pub fn to_origin(&self, board_size: i32) -> Result<OriginCoordinate, CoordinateError> {
        check_board_size(board_size)?;
        let col = self.col.to_ascii_uppercase();
        let x = match col {
            'A'..='H' => col as i32 - 'A' as i32,
            // 补回跳过的 I
            'J'..='Z' => col as i32 - 'A' as i32 - 1,
            _ => {
                return Err(CoordinateError::InvalidColumn {
                    col,
                    coord: self.to_string(),
                })
            }
        };

        let y = board_size.checked_sub(self.row);
        match y {
            Some(y) if in_bounds(x, y, board_size) => Ok(OriginCoordinate { x, y }),
            _ => Err(CoordinateError::OutOfBounds {
                x,
                y: y.unwrap_or(i32::MIN),
                max: board_size - 1,
            }),
        }
    }
}

impl FromStr for A1Coordinate {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for A1Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.col, self.row)
    }
}

fn check_board_size(board_size: i32) -> Result<(), CoordinateError> {
    if (1..=MAX_BOARD_SIZE).contains(&board_size) {
        Ok(())
    } else {
        Err(CoordinateError::InvalidBoardSize {
            size: board_size,
            max: MAX_BOARD_SIZE,
        })
    }
}

fn in_bounds(x: i32, y: i32, board_size: i32) -> bool {
    (0..board_size).contains(&x) && (0..board_size).contains(&y)
}

fn sgf_char(v: i32) -> char {
    char::from_u32(('a' as i32 + v) as u32).unwrap_or('?')
}
