use serde::{Deserialize, Serialize};
use strum::{Display, FromRepr, IntoStaticStr};

/// Which client build an instance is attached to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, IntoStaticStr, Display,
)]
#[serde(rename_all = "lowercase")]
pub enum ClientType {
    #[default]
    #[strum(serialize = "stable")]
    Stable,
    #[strum(serialize = "lazer")]
    Lazer,
}

impl ClientType {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Screen the client is currently on.
///
/// Values 0..=23 are the stable client's own status codes. `Spectating` and
/// `WatchingReplay` are only ever produced by the lazer reader.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, FromRepr, IntoStaticStr,
)]
#[repr(i32)]
#[strum(serialize_all = "camelCase")]
pub enum GameState {
    #[default]
    Menu = 0,
    Edit = 1,
    Play = 2,
    Exit = 3,
    SelectEdit = 4,
    SelectPlay = 5,
    SelectDrawings = 6,
    ResultScreen = 7,
    Update = 8,
    Busy = 9,
    Unknown = 10,
    Lobby = 11,
    MatchSetup = 12,
    SelectMulti = 13,
    RankingVs = 14,
    OnlineSelection = 15,
    OptionsOffsetWizard = 16,
    RankingTagCoop = 17,
    RankingTeam = 18,
    BeatmapImport = 19,
    PackageUpdater = 20,
    Benchmark = 21,
    Tourney = 22,
    Charts = 23,
    Spectating = 24,
    WatchingReplay = 25,
}

impl GameState {
    pub fn from_raw(value: i32) -> Option<Self> {
        Self::from_repr(value)
    }

    pub fn raw(self) -> i32 {
        self as i32
    }

    pub fn name(self) -> &'static str {
        self.into()
    }

    /// States in which the gameplay decoders run.
    pub fn is_playing(self, client: ClientType) -> bool {
        match self {
            Self::Play => true,
            Self::Spectating | Self::WatchingReplay => client == ClientType::Lazer,
            _ => false,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, FromRepr, IntoStaticStr,
)]
#[repr(i32)]
pub enum Ruleset {
    #[default]
    #[strum(serialize = "osu")]
    Osu = 0,
    #[strum(serialize = "taiko")]
    Taiko = 1,
    #[strum(serialize = "fruits")]
    Fruits = 2,
    #[strum(serialize = "mania")]
    Mania = 3,
}

impl Ruleset {
    pub fn from_raw(value: i32) -> Option<Self> {
        Self::from_repr(value)
    }

    pub fn name(&self) -> &'static str {
        self.into()
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, IntoStaticStr, Display,
)]
pub enum Grade {
    XH,
    X,
    SH,
    S,
    A,
    B,
    C,
    D,
    #[default]
    #[strum(serialize = "")]
    #[serde(rename = "")]
    None,
}

impl Grade {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Ranked status as reported by the stable client.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, FromRepr, IntoStaticStr,
)]
#[repr(i32)]
pub enum BeatmapStatus {
    #[default]
    Unknown = 0,
    NotSubmitted = 1,
    Pending = 2,
    Unused = 3,
    Ranked = 4,
    Approved = 5,
    Qualified = 6,
    Loved = 7,
}

impl BeatmapStatus {
    pub fn from_raw(value: i32) -> Self {
        Self::from_repr(value).unwrap_or_default()
    }

    /// Map a lazer online status onto the stable scale.
    pub fn from_lazer(value: i32) -> Self {
        match value {
            -4 | -3 => Self::NotSubmitted,
            -2 | -1 | 0 => Self::Pending,
            1 => Self::Ranked,
            2 => Self::Approved,
            3 => Self::Qualified,
            4 => Self::Loved,
            _ => Self::Unknown,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, FromRepr, IntoStaticStr,
)]
#[repr(i32)]
pub enum BanchoStatus {
    #[default]
    Idle = 0,
    Afk = 1,
    Playing = 2,
    Editing = 3,
    Modding = 4,
    Multiplayer = 5,
    Watching = 6,
    Unknown = 7,
    Testing = 8,
    Submitting = 9,
    Paused = 10,
    Lobby = 11,
    Multiplaying = 12,
    OsuDirect = 13,
}

impl BanchoStatus {
    pub fn from_raw(value: i32) -> Self {
        Self::from_repr(value).unwrap_or(Self::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_state_from_raw() {
        assert_eq!(GameState::from_raw(2), Some(GameState::Play));
        assert_eq!(GameState::from_raw(7), Some(GameState::ResultScreen));
        assert_eq!(GameState::from_raw(22), Some(GameState::Tourney));
        assert_eq!(GameState::from_raw(99), None);
        assert_eq!(GameState::ResultScreen.name(), "resultScreen");
    }

    #[test]
    fn test_playing_states_per_client() {
        assert!(GameState::Play.is_playing(ClientType::Stable));
        assert!(!GameState::Spectating.is_playing(ClientType::Stable));
        assert!(GameState::WatchingReplay.is_playing(ClientType::Lazer));
        assert!(!GameState::Menu.is_playing(ClientType::Lazer));
    }

    #[test]
    fn test_lazer_status_mapping() {
        assert_eq!(BeatmapStatus::from_lazer(-4), BeatmapStatus::NotSubmitted);
        assert_eq!(BeatmapStatus::from_lazer(-1), BeatmapStatus::Pending);
        assert_eq!(BeatmapStatus::from_lazer(1), BeatmapStatus::Ranked);
        assert_eq!(BeatmapStatus::from_lazer(4), BeatmapStatus::Loved);
        assert_eq!(BeatmapStatus::from_lazer(42), BeatmapStatus::Unknown);
    }

    #[test]
    fn test_names() {
        assert_eq!(ClientType::Lazer.as_str(), "lazer");
        assert_eq!(Ruleset::Mania.name(), "mania");
        assert_eq!(Grade::SH.as_str(), "SH");
        assert_eq!(Grade::None.as_str(), "");
    }
}
