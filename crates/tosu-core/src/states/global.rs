use std::path::Path;

use serde::Serialize;

use super::{Fetched, StateUpdate, clean_path, fetch};
use crate::game::{ClientType, GameState, OsuMods};
use crate::instance::{ErrorReporter, ErrorSite};
use crate::memory::GameMemory;

/// Screen, clock and folders of the client.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Global {
    pub is_watching_replay: bool,
    pub is_replay_ui_hidden: bool,
    pub is_multi_spectating: bool,
    pub show_interface: bool,
    pub chat_status: i32,
    pub status: i32,
    pub paused: bool,
    pub game_time: i32,
    pub play_time: i32,
    #[serde(skip)]
    previous_play_time: i32,
    pub menu_mods: OsuMods,
    pub game_folder: String,
    pub skin_folder: String,
    pub songs_folder: String,
    pub memory_songs_folder: String,
}

impl Global {
    pub fn game_state(&self) -> Option<GameState> {
        GameState::from_raw(self.status)
    }

    pub fn is(&self, state: GameState) -> bool {
        self.status == state.raw()
    }

    pub fn update(&mut self, memory: &mut dyn GameMemory, reporter: &mut ErrorReporter) -> StateUpdate {
        let readout = match fetch(reporter, ErrorSite::GlobalUpdate, memory.global()) {
            Fetched::Value(readout) => readout,
            Fetched::Skip => return StateUpdate::Done,
            Fetched::NotReady => return StateUpdate::NotReady,
        };

        self.status = readout.status;
        self.is_watching_replay = readout.is_watching_replay;
        self.is_replay_ui_hidden = readout.is_replay_ui_hidden;
        self.is_multi_spectating = readout.is_multi_spectating;
        self.show_interface = readout.show_interface;
        self.chat_status = readout.chat_status;
        self.game_time = readout.game_time;
        self.menu_mods = readout.menu_mods;

        self.paused = self.previous_play_time == self.play_time;
        self.previous_play_time = self.play_time;

        self.skin_folder = clean_path(&readout.skin_folder);
        self.memory_songs_folder = clean_path(&readout.memory_songs_folder);

        reporter.reset(ErrorSite::GlobalUpdate);
        StateUpdate::Done
    }

    /// Status and play time, read at the precise rate.
    pub fn update_precise(
        &mut self,
        memory: &mut dyn GameMemory,
        reporter: &mut ErrorReporter,
    ) -> StateUpdate {
        let readout = match fetch(reporter, ErrorSite::GlobalPrecise, memory.global_precise()) {
            Fetched::Value(readout) => readout,
            Fetched::Skip => return StateUpdate::Done,
            Fetched::NotReady => return StateUpdate::NotReady,
        };

        self.play_time = readout.play_time;
        self.status = readout.status;

        reporter.reset(ErrorSite::GlobalPrecise);
        StateUpdate::Done
    }

    /// Set the game and songs folders the first time they are known.
    ///
    /// Stable may point its songs folder anywhere; a relative folder is
    /// resolved against the game folder. Lazer keeps its files under the
    /// data directory it reports.
    pub fn init_folders(&mut self, client: ClientType, game_folder: &Path) {
        if !self.game_folder.is_empty() {
            return;
        }

        self.game_folder = clean_path(&game_folder.to_string_lossy());
        self.songs_folder = match client {
            ClientType::Lazer => self.memory_songs_folder.clone(),
            ClientType::Stable if Path::new(&self.memory_songs_folder).is_dir() => {
                self.memory_songs_folder.clone()
            }
            ClientType::Stable => game_folder
                .join(&self.memory_songs_folder)
                .to_string_lossy()
                .into_owned(),
        };
    }
}
