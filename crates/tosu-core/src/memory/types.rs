//! Raw values produced by one read of a client's memory.
//!
//! These are plain carriers; the state decoders copy them into snapshots.

use crate::error::Error;
use crate::game::{KeyOverlayButton, LeaderboardPlayer, OsuMods, Statistics};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalReadout {
    pub status: i32,
    pub is_watching_replay: bool,
    pub is_replay_ui_hidden: bool,
    pub is_multi_spectating: bool,
    pub show_interface: bool,
    pub chat_status: i32,
    pub game_time: i32,
    pub menu_mods: OsuMods,
    pub skin_folder: String,
    pub memory_songs_folder: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GlobalPreciseReadout {
    pub status: i32,
    pub play_time: i32,
}

/// Full beatmap metadata of the selected map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BeatmapReadout {
    pub gamemode: i32,
    pub checksum: String,
    pub filename: String,
    pub plays: i32,
    pub artist: String,
    pub artist_original: String,
    pub title: String,
    pub title_original: String,
    pub ar: f32,
    pub cs: f32,
    pub hp: f32,
    pub od: f32,
    pub audio_filename: String,
    pub background_filename: String,
    pub folder: String,
    pub creator: String,
    pub difficulty: String,
    pub map_id: i32,
    pub set_id: i32,
    pub ranked_status: i32,
    pub object_count: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MenuReadout {
    /// A different map than the one already committed.
    Beatmap(Box<BeatmapReadout>),
    /// Same map (or not a `.osu` file): only the cheap fields were read.
    Checksum { gamemode: i32, ranked_status: i32 },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultScreenReadout {
    pub online_id: i64,
    pub player_name: String,
    pub mods: OsuMods,
    pub mode: i32,
    pub max_combo: i32,
    pub score: i64,
    pub statistics: Statistics,
    pub accuracy: f64,
    /// Date the score was set, RFC 3339.
    pub date: String,
}

/// Values the gameplay reader needs from the rest of the instance.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GameplayContext {
    pub play_time: i32,
    pub first_object: i32,
    /// Cutting-edge builds store the score one field earlier.
    pub cutting_edge: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameplayReadout {
    pub retries: i32,
    pub player_name: String,
    pub mods: OsuMods,
    pub mode: i32,
    pub score: i64,
    pub player_hp_smooth: f64,
    pub player_hp: f64,
    pub accuracy: f64,
    pub statistics: Statistics,
    pub combo: i32,
    pub max_combo: i32,
    pub failed: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HitErrorsReadout {
    /// Index to continue from on the next read.
    pub next_index: usize,
    pub errors: Vec<i32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeaderboardReadout {
    pub is_visible: bool,
    pub player: Option<LeaderboardPlayer>,
    pub players: Vec<LeaderboardPlayer>,
}

pub type KeyOverlayReadout = Vec<KeyOverlayButton>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TourneyReadout {
    pub ipc_state: i32,
    pub left_stars: i32,
    pub right_stars: i32,
    pub best_of: i32,
    pub stars_visible: bool,
    pub score_visible: bool,
    pub first_team_name: String,
    pub second_team_name: String,
    pub first_team_score: i32,
    pub second_team_score: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChatMessage {
    pub time: String,
    pub name: String,
    pub content: String,
}

impl ChatMessage {
    /// Split a raw `"HH:MM name:"` header into time and sender.
    pub fn from_header(header: &str, content: String) -> Self {
        let time = header.split(' ').next().unwrap_or_default().trim();
        let name = header
            .strip_prefix(time)
            .unwrap_or(header)
            .trim_start();
        let name = name.strip_suffix(':').unwrap_or(name);

        Self {
            time: time.to_string(),
            name: name.to_string(),
            content,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TourneyUserReadout {
    pub id: i32,
    pub name: String,
    pub country: String,
    pub accuracy: f64,
    pub play_count: i32,
    pub ranked_score: i64,
    pub global_rank: i32,
    pub pp: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserReadout {
    pub name: String,
    pub accuracy: f64,
    pub ranked_score: i64,
    pub id: i32,
    pub level: f32,
    pub play_count: i32,
    pub play_mode: i32,
    pub rank: i32,
    pub country_code: i32,
    pub performance_points: i32,
    pub raw_bancho_status: i32,
    pub background_colour: u32,
    pub raw_login_status: i32,
}

impl UserReadout {
    /// Profile reported while nobody is logged in.
    pub fn guest() -> Self {
        Self {
            name: "Guest".to_string(),
            accuracy: 0.0,
            ranked_score: 0,
            id: 0,
            level: 0.0,
            play_count: 0,
            play_mode: 0,
            rank: 1,
            country_code: 0,
            performance_points: 0,
            raw_bancho_status: 0,
            background_colour: 0xFFFF_FFFF,
            raw_login_status: 0,
        }
    }
}

/// A typed configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Bool(bool),
    Byte(u8),
    Number(f64),
    Enum(i32),
    Text(String),
}

/// Decoded configuration entries, keyed by their setting path
/// (`audio.volume.master`, `skin.name`, ...).
#[derive(Debug, Default)]
pub struct SettingsReadout {
    pub values: Vec<(&'static str, ConfigValue)>,
    /// Dictionary positions whose entry could not be decoded this pass.
    pub failed: Vec<(usize, Error)>,
    /// Set when the per-beatmap mania speed could not be read and the
    /// configured speed was kept.
    pub mania_speed_error: Option<Error>,
}

impl SettingsReadout {
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_header_split() {
        let msg = ChatMessage::from_header("12:34 BanchoBot:", "hello".to_string());
        assert_eq!(msg.time, "12:34");
        assert_eq!(msg.name, "BanchoBot");
        assert_eq!(msg.content, "hello");
    }

    #[test]
    fn test_chat_header_without_name() {
        let msg = ChatMessage::from_header("12:34", String::new());
        assert_eq!(msg.time, "12:34");
        assert_eq!(msg.name, "");
    }
}
