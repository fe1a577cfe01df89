use std::time::Instant;

use serde::Serialize;
use tracing::debug;

use super::{Fetched, StateUpdate, clean_path, fetch};
use crate::config::timing::TOURNEY_MAP_DEBOUNCE;
use crate::instance::{ErrorReporter, ErrorSite};
use crate::memory::{BeatmapReadout, GameMemory, MenuReadout};

/// The selected beatmap.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Menu {
    pub gamemode: i32,
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
    pub filename: String,
    pub difficulty: String,
    #[serde(rename = "mapID")]
    pub map_id: i32,
    #[serde(rename = "setID")]
    pub set_id: i32,
    pub ranked_status: i32,
    pub checksum: String,
    pub object_count: i32,
    pub mp3_length: f64,
    #[serde(skip)]
    pending_checksum: String,
    #[serde(skip)]
    map_change_time: Option<Instant>,
}

impl Menu {
    /// Whether the selected map is a regular `.osu` file.
    pub fn is_osu_file(&self) -> bool {
        self.filename.ends_with(".osu")
    }

    /// Read the selected map.
    ///
    /// Tournament clients flicker between maps while the lobby changes; with
    /// `debounce` set a new checksum is committed only once it has been stable
    /// for the debounce window.
    pub fn update(
        &mut self,
        memory: &mut dyn GameMemory,
        reporter: &mut ErrorReporter,
        debounce: bool,
    ) -> StateUpdate {
        let result = memory.menu(&self.checksum);
        match fetch(reporter, ErrorSite::MenuUpdate, result) {
            Fetched::Value(readout) => {
                self.apply(readout, debounce, Instant::now());
                reporter.reset(ErrorSite::MenuUpdate);
                StateUpdate::Done
            }
            Fetched::Skip => StateUpdate::Done,
            Fetched::NotReady => StateUpdate::NotReady,
        }
    }

    pub(crate) fn apply(&mut self, readout: MenuReadout, debounce: bool, now: Instant) {
        let beatmap = match readout {
            MenuReadout::Checksum {
                gamemode,
                ranked_status,
            } => {
                self.gamemode = gamemode;
                self.ranked_status = ranked_status;
                return;
            }
            MenuReadout::Beatmap(beatmap) => beatmap,
        };

        if debounce {
            if self.pending_checksum != beatmap.checksum {
                self.pending_checksum = beatmap.checksum.clone();
                self.map_change_time = Some(now);
                return;
            }
            if self
                .map_change_time
                .is_some_and(|changed| now.duration_since(changed) < TOURNEY_MAP_DEBOUNCE)
            {
                return;
            }
        }

        debug!("Menu map changed: {} -> {}", self.checksum, beatmap.checksum);
        self.commit(*beatmap);
    }

    fn commit(&mut self, beatmap: BeatmapReadout) {
        self.gamemode = beatmap.gamemode;
        self.checksum = beatmap.checksum;
        self.filename = clean_path(&beatmap.filename);
        self.plays = beatmap.plays;
        self.artist = beatmap.artist;
        self.artist_original = beatmap.artist_original;
        self.title = beatmap.title;
        self.title_original = beatmap.title_original;
        self.ar = beatmap.ar;
        self.cs = beatmap.cs;
        self.hp = beatmap.hp;
        self.od = beatmap.od;
        self.audio_filename = clean_path(&beatmap.audio_filename);
        self.background_filename = clean_path(&beatmap.background_filename);
        self.folder = clean_path(&beatmap.folder);
        self.creator = beatmap.creator;
        self.difficulty = beatmap.difficulty;
        self.map_id = beatmap.map_id;
        self.set_id = beatmap.set_id;
        self.ranked_status = beatmap.ranked_status;
        self.object_count = beatmap.object_count;
    }

    pub fn update_mp3_length(&mut self, memory: &mut dyn GameMemory, reporter: &mut ErrorReporter) {
        match memory.mp3_length() {
            Ok(length) => {
                self.mp3_length = length;
                reporter.reset(ErrorSite::MenuMp3Length);
            }
            Err(e) => reporter.report(ErrorSite::MenuMp3Length, &e),
        }
    }
}
