//! Client configuration snapshot.
//!
//! The reader hands over a flat list of `path -> value` entries; this module
//! folds them into the nested shape the answers expose. Unknown paths and
//! values of the wrong type are ignored.

use serde::Serialize;
use tracing::debug;

use super::{Fetched, StateUpdate, fetch};
use crate::instance::{ErrorReporter, ErrorSite};
use crate::memory::{ConfigValue, GameMemory};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Volume {
    pub master: f64,
    pub music: f64,
    pub effect: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AudioOffset {
    pub universal: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioSettings {
    pub ignore_beatmap_sounds: bool,
    pub use_skin_samples: bool,
    pub volume: Volume,
    pub offset: AudioOffset,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BackgroundSettings {
    pub dim: f64,
    pub storyboard: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSettings {
    pub update_available: bool,
    pub branch: i32,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionSettings {
    pub fullscreen: bool,
    pub width: i32,
    pub height: i32,
    pub width_fullscreen: i32,
    pub height_fullscreen: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreMeterSettings {
    #[serde(rename = "type")]
    pub kind: i32,
    pub size: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorSettings {
    pub use_skin_cursor: bool,
    pub auto_size: bool,
    pub size: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MouseSettings {
    pub raw_input: bool,
    pub disable_buttons: bool,
    pub disable_wheel: bool,
    pub sensitivity: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManiaSettings {
    #[serde(rename = "speedBPMScale")]
    pub speed_bpm_scale: bool,
    pub use_per_beatmap_speed_scale: bool,
    pub scroll_speed: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkinSettings {
    pub use_default_skin_in_editor: bool,
    pub ignore_beatmap_skins: bool,
    pub tint_slider_ball: bool,
    pub use_taiko_skin: bool,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListSetting {
    #[serde(rename = "type")]
    pub kind: i32,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub audio: AudioSettings,
    pub background: BackgroundSettings,
    pub client: ClientSettings,
    pub resolution: ResolutionSettings,
    pub score_meter: ScoreMeterSettings,
    pub cursor: CursorSettings,
    pub mouse: MouseSettings,
    pub mania: ManiaSettings,
    pub sort: ListSetting,
    pub group: ListSetting,
    pub skin: SkinSettings,
    pub progress_bar_type: i32,
    pub leaderboard_type: i32,
}

fn as_bool(value: &ConfigValue) -> Option<bool> {
    match value {
        ConfigValue::Bool(v) => Some(*v),
        ConfigValue::Byte(v) => Some(*v != 0),
        _ => None,
    }
}

fn as_number(value: &ConfigValue) -> Option<f64> {
    match value {
        ConfigValue::Number(v) => Some(*v),
        ConfigValue::Byte(v) => Some(f64::from(*v)),
        ConfigValue::Enum(v) => Some(f64::from(*v)),
        _ => None,
    }
}

fn as_int(value: &ConfigValue) -> Option<i32> {
    match value {
        ConfigValue::Enum(v) => Some(*v),
        ConfigValue::Byte(v) => Some(i32::from(*v)),
        ConfigValue::Number(v) => Some(*v as i32),
        _ => None,
    }
}

fn as_text(value: &ConfigValue) -> Option<String> {
    match value {
        ConfigValue::Text(v) => Some(v.clone()),
        _ => None,
    }
}

fn set<T>(slot: &mut T, value: Option<T>) -> bool {
    match value {
        Some(value) => {
            *slot = value;
            true
        }
        None => false,
    }
}

impl Settings {
    /// Whether this is a cutting-edge build of stable.
    pub fn is_cutting_edge(&self) -> bool {
        self.client.version.contains("cuttingedge") || self.client.branch == 1
    }

    pub fn update(&mut self, memory: &mut dyn GameMemory, reporter: &mut ErrorReporter) -> StateUpdate {
        let readout = match fetch(reporter, ErrorSite::SettingsUpdate, memory.settings()) {
            Fetched::Value(readout) => readout,
            Fetched::Skip => return StateUpdate::Done,
            Fetched::NotReady => return StateUpdate::NotReady,
        };

        for (path, value) in &readout.values {
            if !self.apply(path, value) {
                debug!("Settings: ignoring {} = {:?}", path, value);
            }
        }

        if readout.failed.is_empty() {
            reporter.reset(ErrorSite::SettingsValue);
        }
        for (position, e) in &readout.failed {
            reporter.report(ErrorSite::SettingsValue, &format!("position {}: {}", position, e));
        }

        match &readout.mania_speed_error {
            Some(e) => reporter.report(ErrorSite::ManiaScrollSpeed, e),
            None => reporter.reset(ErrorSite::ManiaScrollSpeed),
        }

        reporter.reset(ErrorSite::SettingsUpdate);
        StateUpdate::Done
    }

    /// Store one entry. Returns false for unknown paths or mismatched types.
    pub fn apply(&mut self, path: &str, value: &ConfigValue) -> bool {
        match path {
            "audio.volume.master" => set(&mut self.audio.volume.master, as_number(value)),
            "audio.volume.music" => set(&mut self.audio.volume.music, as_number(value)),
            "audio.volume.effect" => set(&mut self.audio.volume.effect, as_number(value)),
            "audio.offset.universal" => set(&mut self.audio.offset.universal, as_number(value)),
            "audio.ignoreBeatmapSounds" => set(&mut self.audio.ignore_beatmap_sounds, as_bool(value)),
            "audio.useSkinSamples" => set(&mut self.audio.use_skin_samples, as_bool(value)),
            "background.dim" => set(&mut self.background.dim, as_number(value)),
            "background.storyboard" => set(&mut self.background.storyboard, as_bool(value)),
            "client.branch" => set(&mut self.client.branch, as_int(value)),
            "client.version" => set(&mut self.client.version, as_text(value)),
            "client.updateAvailable" => set(&mut self.client.update_available, as_bool(value)),
            "resolution.fullscreen" => set(&mut self.resolution.fullscreen, as_bool(value)),
            "resolution.width" => set(&mut self.resolution.width, as_int(value)),
            "resolution.height" => set(&mut self.resolution.height, as_int(value)),
            "resolution.widthFullscreen" => set(&mut self.resolution.width_fullscreen, as_int(value)),
            "resolution.heightFullscreen" => set(&mut self.resolution.height_fullscreen, as_int(value)),
            "scoreMeter.type" => set(&mut self.score_meter.kind, as_int(value)),
            "scoreMeter.size" => set(&mut self.score_meter.size, as_number(value)),
            "cursor.size" => set(&mut self.cursor.size, as_number(value)),
            "cursor.autoSize" => set(&mut self.cursor.auto_size, as_bool(value)),
            "cursor.useSkinCursor" => set(&mut self.cursor.use_skin_cursor, as_bool(value)),
            "mouse.sensitivity" => set(&mut self.mouse.sensitivity, as_number(value)),
            "mouse.disableButtons" => set(&mut self.mouse.disable_buttons, as_bool(value)),
            "mouse.disableWheel" => set(&mut self.mouse.disable_wheel, as_bool(value)),
            "mouse.rawInput" => set(&mut self.mouse.raw_input, as_bool(value)),
            "mania.scrollSpeed" => set(&mut self.mania.scroll_speed, as_number(value)),
            "mania.speedBPMScale" => set(&mut self.mania.speed_bpm_scale, as_bool(value)),
            "mania.usePerBeatmapSpeedScale" => {
                set(&mut self.mania.use_per_beatmap_speed_scale, as_bool(value))
            }
            "progressBarType" => set(&mut self.progress_bar_type, as_int(value)),
            "leaderboardType" => set(&mut self.leaderboard_type, as_int(value)),
            "groupType" => set(&mut self.group.kind, as_int(value)),
            "sortType" => set(&mut self.sort.kind, as_int(value)),
            "skin.useDefaultSkinInEditor" => set(&mut self.skin.use_default_skin_in_editor, as_bool(value)),
            "skin.tintSliderBall" => set(&mut self.skin.tint_slider_ball, as_bool(value)),
            "skin.ignoreBeatmapSkins" => set(&mut self.skin.ignore_beatmap_skins, as_bool(value)),
            "skin.name" => set(&mut self.skin.name, as_text(value)),
            "skin.useTaikoSkin" => set(&mut self.skin.use_taiko_skin, as_bool(value)),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::game::ClientType;
    use crate::memory::{Readout, SettingsReadout};
    use crate::memory::ScriptedMemory;

    #[test]
    fn test_apply_paths() {
        let mut settings = Settings::default();
        assert!(settings.apply("audio.volume.master", &ConfigValue::Number(80.0)));
        assert!(settings.apply("skin.name", &ConfigValue::Text("- Skin -".to_string())));
        assert!(settings.apply("resolution.fullscreen", &ConfigValue::Bool(false)));
        assert!(settings.apply("scoreMeter.type", &ConfigValue::Enum(2)));

        assert_eq!(settings.audio.volume.master, 80.0);
        assert_eq!(settings.skin.name, "- Skin -");
        assert!(!settings.resolution.fullscreen);
        assert_eq!(settings.score_meter.kind, 2);
    }

    #[test]
    fn test_apply_rejects_unknown_and_mismatched() {
        let mut settings = Settings::default();
        assert!(!settings.apply("keybindings.osu", &ConfigValue::Enum(1)));
        assert!(!settings.apply("skin.name", &ConfigValue::Number(1.0)));
        assert!(settings.skin.name.is_empty());
    }

    #[test]
    fn test_cutting_edge_detection() {
        let mut settings = Settings::default();
        assert!(!settings.is_cutting_edge());
        settings.client.version = "b20240820.1cuttingedge".to_string();
        assert!(settings.is_cutting_edge());
    }

    #[test]
    fn test_update_reports_failed_positions() {
        let mut memory = ScriptedMemory::stable();
        memory.settings.push_back(Ok(Readout::Ready(SettingsReadout {
            values: vec![("mania.scrollSpeed", ConfigValue::Number(24.0))],
            failed: vec![(7, Error::ResolutionFailed("bad entry".to_string()))],
            mania_speed_error: None,
        })));

        let mut settings = Settings::default();
        let mut reporter = ErrorReporter::new(ClientType::Stable, 1);
        assert_eq!(settings.update(&mut memory, &mut reporter), StateUpdate::Done);

        assert_eq!(settings.mania.scroll_speed, 24.0);
        assert_eq!(reporter.count(ErrorSite::SettingsValue), 1);
        assert_eq!(reporter.count(ErrorSite::SettingsUpdate), 0);
    }
}
