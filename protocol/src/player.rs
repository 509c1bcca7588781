//! 玩家与用户资料

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::message::UserId;

/// 用户完整资料（`/api/v1/me`）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub country: String,
    pub professional: bool,
    pub about: String,
    pub ranking: f32,
    pub ratings: Ratings,
    pub is_bot: bool,
    pub is_friend: bool,
    pub ui_class: String,
}

/// Glicko-2 等级分
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Glicko2 {
    pub deviation: f32,
    pub games_played: i64,
    pub rating: f32,
    pub volatility: f32,
}

/// 按类别（"overall"、"19x19" 等）索引的等级分
///
/// 服务端在同一对象里附带 `"version": 5`，解码时丢弃。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Ratings(pub HashMap<String, Glicko2>);

impl Ratings {
    pub fn get(&self, category: &str) -> Option<&Glicko2> {
        self.0.get(category)
    }

    pub fn overall(&self) -> Option<&Glicko2> {
        self.get("overall")
    }
}

impl<'de> Deserialize<'de> for Ratings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut raw: HashMap<String, serde_json::Value> = HashMap::deserialize(deserializer)?;
        raw.remove("version");

        raw.into_iter()
            .map(|(key, value)| {
                serde_json::from_value(value)
                    .map(|rating| (key, rating))
                    .map_err(serde::de::Error::custom)
            })
            .collect::<Result<HashMap<_, _>, _>>()
            .map(Ratings)
    }
}

/// 对局中的玩家简要信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Player {
    pub id: UserId,
    pub username: String,
    pub professional: bool,
    pub rank: f32,
}

impl Player {
    /// 段级位，如 "1p"、"2d"、"3k"
    pub fn ranking(&self) -> String {
        if self.professional {
            return format!("{:.0}p", self.rank - 36.0);
        }
        if self.rank >= 1037.0 {
            format!("{:.0}p", self.rank - 1036.0)
        } else if self.rank >= 30.0 {
            format!("{:.0}d", self.rank - 29.0)
        } else if self.rank >= 1.0 {
            format!("{:.0}k", 30.0 - self.rank.floor())
        } else {
            "?".to_string()
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.username, self.ranking())
    }
}

/// 黑白双方
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Players {
    pub black: Player,
    pub white: Player,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(rank: f32, professional: bool) -> Player {
        Player {
            id: 1,
            username: "tester".to_string(),
            professional,
            rank,
        }
    }

    #[test]
    fn test_ranking() {
        assert_eq!(player(39.0, true).ranking(), "3p");
        assert_eq!(player(44.0, true).ranking(), "8p");
        assert_eq!(player(1037.1, false).ranking(), "1p");
        assert_eq!(player(30.0001, false).ranking(), "1d");
        assert_eq!(player(29.9999, false).ranking(), "1k");
        assert_eq!(player(0.9999, false).ranking(), "?");
        assert_eq!(player(25.3, false).ranking(), "5k");
    }

    #[test]
    fn test_player_display() {
        assert_eq!(player(33.0, false).to_string(), "tester[4d]");
    }

    #[test]
    fn test_user_ratings_drop_version() {
        let json = r#"{
            "id": 42, "username": "alice", "country": "nz", "professional": false,
            "ranking": 28.5, "is_bot": false, "is_friend": true, "ui_class": "",
            "ratings": {
                "version": 5,
                "overall": {"deviation": 62.1, "games_played": 310, "rating": 1803.5, "volatility": 0.06},
                "19x19": {"deviation": 70.0, "games_played": 200, "rating": 1790.0, "volatility": 0.06}
            }
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, 42);
        assert!(user.is_friend);
        assert_eq!(user.ratings.0.len(), 2);
        assert_eq!(user.ratings.overall().unwrap().games_played, 310);
        assert!(user.ratings.get("version").is_none());
    }

    #[test]
    fn test_ratings_reject_malformed_entry() {
        let json = r#"{"overall": "strong"}"#;
        assert!(serde_json::from_str::<Ratings>(json).is_err());
    }
}
