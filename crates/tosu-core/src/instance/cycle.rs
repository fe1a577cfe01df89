//! One pass of each polling loop.
//!
//! The arena ([`InstanceCore`]) is locked for a whole pass, so a regular pass
//! and a precise pass never interleave inside each other.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use super::report::ErrorReporter;
use crate::calculator::DifficultyCalculator;
use crate::config::Config;
use crate::config::timing::PRECISE_GRACE_MS;
use crate::game::{ClientType, GameState};
use crate::memory::{GameMemory, GameplayContext};
use crate::states::{MapSource, States};

/// Static facts about an attached client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceInfo {
    pub pid: u32,
    pub client: ClientType,
    /// Directory of the client executable.
    pub game_folder: PathBuf,
    pub is_tourney_spectator: bool,
    pub ipc_id: i32,
    pub custom_server_endpoint: Option<String>,
}

/// What the loop should do after a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cycle {
    Continue,
    /// The client is shutting down.
    Exit,
}

/// Values remembered between regular passes.
#[derive(Debug, Default)]
struct Tracking {
    fingerprint: String,
    mp3_length: f64,
    previous_time: i32,
    previous_combo: i32,
}

/// Snapshots, reader and error counters of one instance.
pub struct InstanceCore {
    pub(crate) info: InstanceInfo,
    pub(crate) memory: Box<dyn GameMemory>,
    pub states: States,
    pub(crate) reporter: ErrorReporter,
    pub(crate) is_tourney_manager: bool,
    config: Config,
    calculator: Arc<dyn DifficultyCalculator>,
    tracking: Tracking,
}

impl InstanceCore {
    pub fn new(
        info: InstanceInfo,
        memory: Box<dyn GameMemory>,
        config: Config,
        calculator: Arc<dyn DifficultyCalculator>,
    ) -> Self {
        let reporter = ErrorReporter::new(info.client, info.pid);
        Self {
            info,
            memory,
            states: States::default(),
            reporter,
            is_tourney_manager: false,
            config,
            calculator,
            tracking: Tracking::default(),
        }
    }

    pub fn info(&self) -> &InstanceInfo {
        &self.info
    }

    pub fn is_tourney_manager(&self) -> bool {
        self.is_tourney_manager
    }

    pub fn reporter(&self) -> &ErrorReporter {
        &self.reporter
    }

    /// One pass of the regular loop.
    pub fn regular_cycle(&mut self) -> Cycle {
        let client = self.info.client;
        let lazer = client == ClientType::Lazer;
        let debounce = self.info.is_tourney_spectator || self.is_tourney_manager;

        let memory = self.memory.as_mut();
        let reporter = &mut self.reporter;
        let calculator = self.calculator.as_ref();
        let config = &self.config;
        let tracking = &mut self.tracking;
        let s = &mut self.states;

        let global = s.global.update(memory, reporter);
        if s.global.is(GameState::Exit) {
            return Cycle::Exit;
        }
        if lazer && global.is_not_ready() {
            return Cycle::Continue;
        }

        if s.menu.update(memory, reporter, debounce).is_not_ready() {
            return Cycle::Continue;
        }
        if lazer || !s.menu.folder.is_empty() {
            s.menu.update_mp3_length(memory, reporter);
        }

        s.global.init_folders(client, &self.info.game_folder);

        if s.global.is(GameState::ResultScreen)
            && s.result_screen.update(memory, reporter, client).is_not_ready()
        {
            return Cycle::Continue;
        }

        // Lazer has no configuration reader.
        if !lazer {
            s.settings.update(memory, reporter);
        }

        let state = s.global.game_state();
        let (mods, mode) = match state {
            Some(state) if state.is_playing(client) => (s.gameplay.mods, s.gameplay.mode),
            Some(GameState::ResultScreen) => (s.result_screen.mods, s.result_screen.mode),
            _ => (s.global.menu_mods, s.menu.gamemode),
        };

        let fingerprint = format!("{}:{}:{}", s.menu.checksum, mode, mods.bits());
        if (lazer || s.menu.is_osu_file()) && !s.global.game_folder.is_empty() {
            let changed = tracking.fingerprint != fingerprint;
            if changed {
                let source = MapSource {
                    songs_folder: &s.global.songs_folder,
                    folder: &s.menu.folder,
                    filename: &s.menu.filename,
                    ar: s.menu.ar,
                    cs: s.menu.cs,
                    od: s.menu.od,
                    hp: s.menu.hp,
                    mode,
                    mods,
                    lazer,
                    calculate_pp: config.calculate_pp,
                };
                if s.beatmap
                    .update_map_metadata(calculator, reporter, &source)
                    .is_not_ready()
                {
                    return Cycle::Continue;
                }
                if !lazer && !s.beatmap.background.is_empty() {
                    s.menu.background_filename = s.beatmap.background.clone();
                }
                tracking.fingerprint = fingerprint;
            }

            if changed || tracking.mp3_length != s.menu.mp3_length {
                s.beatmap
                    .update_graph(calculator, reporter, mods, s.menu.mp3_length, lazer);
                tracking.mp3_length = s.menu.mp3_length;
            }
        }

        s.beatmap.update_events_status(s.global.play_time, mods.rate());

        match state {
            Some(GameState::Menu) => {
                if !lazer {
                    s.bass_density.update(memory, reporter);
                }
            }
            Some(GameState::Edit) => {
                if tracking.previous_time != s.global.play_time {
                    tracking.previous_time = s.global.play_time;
                    s.beatmap
                        .update_editor_pp(calculator, reporter, s.global.play_time, lazer);
                }
            }
            Some(GameState::SelectPlay) | Some(GameState::SelectEdit)
                if !lazer || state == Some(GameState::SelectPlay) =>
            {
                if !s.gameplay.is_default {
                    s.gameplay.init(false, "song-select");
                    s.result_screen.init();
                    s.beatmap.reset_attributes();
                }
                if !s.result_screen.player_name.is_empty() {
                    s.result_screen.init();
                }
            }
            Some(state) if state.is_playing(client) => {
                let cutting_edge = s.settings.is_cutting_edge();
                play_pass(memory, reporter, calculator, config, tracking, s, client, cutting_edge);
            }
            Some(GameState::ResultScreen) => {
                s.result_screen
                    .update_performance(calculator, &s.beatmap, &s.menu.checksum, reporter, client);
            }
            Some(GameState::Tourney) if !lazer => {
                if !self.is_tourney_manager {
                    debug!("[{}] {} switched to tournament manager", client, self.info.pid);
                }
                self.is_tourney_manager = true;
                s.tourney.update(memory, reporter, config.show_mp_commands);
            }
            Some(GameState::Lobby | GameState::MatchSetup | GameState::OnlineSelection) => {}
            _ => {
                if !s.gameplay.is_default {
                    s.gameplay.init(false, &format!("default-{}", s.global.status));
                }
                s.result_screen.init();
            }
        }

        if self.info.is_tourney_spectator {
            s.tourney.update_user(memory, reporter, &mut s.gameplay);
        }

        s.user.update(memory, reporter);
        Cycle::Continue
    }

    /// One pass of the precise loop.
    pub fn precise_cycle(&mut self) -> Cycle {
        let client = self.info.client;
        let memory = self.memory.as_mut();
        let reporter = &mut self.reporter;
        let s = &mut self.states;

        s.global.update_precise(memory, reporter);
        if s.global.is(GameState::Exit) {
            return Cycle::Exit;
        }

        let playing = s.global.game_state().is_some_and(|state| state.is_playing(client));
        if playing && s.global.play_time >= PRECISE_GRACE_MS {
            if self.config.enable_key_overlay {
                s.gameplay.update_key_overlay(memory, reporter);
            }
            s.gameplay.update_hit_errors(memory, reporter);
        } else {
            s.gameplay.reset_key_overlay();
        }

        Cycle::Continue
    }
}

/// Gameplay part of a regular pass.
#[allow(clippy::too_many_arguments)]
fn play_pass(
    memory: &mut dyn GameMemory,
    reporter: &mut ErrorReporter,
    calculator: &dyn DifficultyCalculator,
    config: &Config,
    tracking: &mut Tracking,
    s: &mut States,
    client: ClientType,
    cutting_edge: bool,
) {
    let lazer = client == ClientType::Lazer;
    let play_time = s.global.play_time;
    let first_object = s.beatmap.timings.first_obj;

    // Time went backwards: the map was restarted.
    if tracking.previous_time > play_time {
        s.gameplay.init(true, "retry");
        s.beatmap.reset_attributes();
    }

    if lazer {
        if play_time <= first_object {
            s.gameplay.reset_quick();
        }
    } else if play_time < first_object && !s.gameplay.is_default {
        s.gameplay.reset_quick();
        s.gameplay.reset_hit_errors();
    }

    let context = GameplayContext {
        play_time,
        first_object,
        cutting_edge,
    };
    let update = s.gameplay.update(memory, reporter, &context, s.menu.object_count);
    if update.is_not_ready() && !lazer {
        return;
    }

    s.gameplay.update_stars_and_performance(
        calculator,
        &mut s.beatmap,
        &s.menu,
        &s.global,
        client,
        config.calculate_pp,
        reporter,
    );
    tracking.previous_time = play_time;

    // Lazer replays can be rewound; a combo drop restarts the pp progress.
    if lazer {
        if tracking.previous_combo > s.gameplay.combo {
            s.gameplay.reset_quick();
        }
        tracking.previous_combo = s.gameplay.combo;
    }
}
