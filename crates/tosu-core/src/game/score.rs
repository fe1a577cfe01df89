use serde::{Deserialize, Serialize};

use super::mods::OsuMods;

/// Judgement counters of a score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    /// geki
    pub perfect: i32,
    /// 300
    pub great: i32,
    /// katu
    pub good: i32,
    /// 100
    pub ok: i32,
    /// 50
    pub meh: i32,
    pub miss: i32,
    pub slider_tail_hit: i32,
    pub small_tick_hit: i32,
    pub large_tick_hit: i32,
}

impl Statistics {
    /// Counters of a stable score (geki, 300, katu, 100, 50, miss).
    pub fn stable(geki: i32, h300: i32, katu: i32, h100: i32, h50: i32, miss: i32) -> Self {
        Self {
            perfect: geki,
            great: h300,
            good: katu,
            ok: h100,
            meh: h50,
            miss,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyOverlayButton {
    pub name: String,
    pub is_pressed: bool,
    pub count: i32,
}

impl KeyOverlayButton {
    pub fn new(name: &str, is_pressed: bool, count: i32) -> Self {
        Self {
            name: name.to_string(),
            is_pressed,
            count,
        }
    }
}

/// One row of the in-game scoreboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardPlayer {
    pub user_id: i32,
    pub name: String,
    pub score: i32,
    pub combo: i32,
    pub max_combo: i32,
    pub mods: OsuMods,
    pub statistics: Statistics,
    pub team: i32,
    pub position: i32,
    pub is_passing: bool,
    pub accuracy: f64,
}

impl Default for LeaderboardPlayer {
    fn default() -> Self {
        Self {
            user_id: 0,
            name: String::new(),
            score: 0,
            combo: 0,
            max_combo: 0,
            mods: OsuMods::NONE,
            statistics: Statistics::default(),
            team: 0,
            position: 0,
            is_passing: false,
            accuracy: 100.0,
        }
    }
}
