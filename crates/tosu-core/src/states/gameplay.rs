use serde::Serialize;
use tracing::debug;

use super::beatmap::BeatmapPp;
use super::global::Global;
use super::menu::Menu;
use super::{Fetched, StateUpdate, fetch};
use crate::calculator::{DifficultyCalculator, ScoreState};
use crate::config::key_overlay::MAX_COUNT;
use crate::game::{
    ClientType, Grade, KeyOverlayButton, LeaderboardPlayer, OsuMods, Statistics, calculate_accuracy,
    calculate_grade, passed_objects, unstable_rate,
};
use crate::instance::{ErrorReporter, ErrorSite};
use crate::memory::{GameMemory, GameplayContext};

/// The play in progress.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Gameplay {
    pub retries: i32,
    pub player_name: String,
    pub mods: OsuMods,
    pub mode: i32,
    pub score: i64,
    #[serde(rename = "playerHPSmooth")]
    pub player_hp_smooth: f64,
    #[serde(rename = "playerHP")]
    pub player_hp: f64,
    pub accuracy: f64,
    pub statistics: Statistics,
    pub hit_errors: Vec<i32>,
    pub unstable_rate: f64,
    pub slider_breaks: i32,
    pub combo: i32,
    pub max_combo: i32,
    pub failed: bool,
    pub grade_current: Grade,
    pub grade_expected: Grade,
    pub key_overlay: Vec<KeyOverlayButton>,
    pub is_leaderboard_visible: bool,
    pub leaderboard_player: LeaderboardPlayer,
    pub leaderboard_scores: Vec<LeaderboardPlayer>,
    /// No gameplay data has been read since the last full reset.
    #[serde(skip)]
    pub is_default: bool,
    #[serde(skip)]
    key_overlay_default: bool,
    #[serde(skip)]
    cached_keys: String,
    #[serde(skip)]
    hit_error_index: usize,
    #[serde(skip)]
    previous_combo: i32,
    #[serde(skip)]
    previous_misses: i32,
    #[serde(skip)]
    previous_passed_objects: i32,
    #[serde(skip)]
    previous_map_key: String,
}

impl Default for Gameplay {
    fn default() -> Self {
        Self {
            retries: 0,
            player_name: String::new(),
            mods: OsuMods::NONE,
            mode: 0,
            score: 0,
            player_hp_smooth: 0.0,
            player_hp: 0.0,
            accuracy: 100.0,
            statistics: Statistics::default(),
            hit_errors: Vec::new(),
            unstable_rate: 0.0,
            slider_breaks: 0,
            combo: 0,
            max_combo: 0,
            failed: false,
            grade_current: Grade::None,
            grade_expected: Grade::None,
            key_overlay: Vec::new(),
            is_leaderboard_visible: false,
            leaderboard_player: LeaderboardPlayer::default(),
            leaderboard_scores: Vec::new(),
            is_default: true,
            key_overlay_default: true,
            cached_keys: String::new(),
            hit_error_index: 0,
            previous_combo: 0,
            previous_misses: 0,
            previous_passed_objects: 0,
            previous_map_key: String::new(),
        }
    }
}

impl Gameplay {
    /// Clear the attempt. A retry keeps the player, mods and scoreboard.
    pub fn init(&mut self, retry: bool, reason: &str) {
        debug!("Gameplay init (retry: {}, from: {})", retry, reason);

        self.hit_errors.clear();
        self.hit_error_index = 0;
        self.unstable_rate = 0.0;
        self.slider_breaks = 0;
        self.score = 0;
        self.combo = 0;
        self.max_combo = 0;
        self.previous_combo = 0;
        self.previous_misses = 0;
        self.statistics = Statistics::default();
        self.player_hp_smooth = 0.0;
        self.player_hp = 0.0;
        self.accuracy = 100.0;
        self.failed = false;
        self.grade_current = Grade::None;
        self.grade_expected = Grade::None;
        self.key_overlay.clear();
        self.key_overlay_default = true;
        self.previous_passed_objects = 0;
        self.previous_map_key.clear();

        if retry {
            return;
        }

        self.is_default = true;
        self.retries = 0;
        self.player_name.clear();
        self.mode = 0;
        self.mods = OsuMods::NONE;
        self.is_leaderboard_visible = false;
        self.leaderboard_player = LeaderboardPlayer::default();
        self.leaderboard_scores.clear();
    }

    /// Forget the pp progress so it is recomputed from the next read.
    pub fn reset_quick(&mut self) {
        debug!("Gameplay quick reset");
        self.previous_passed_objects = 0;
        self.previous_map_key.clear();
    }

    pub fn reset_hit_errors(&mut self) {
        if self.hit_errors.is_empty() && self.hit_error_index == 0 {
            return;
        }
        debug!("Gameplay hit errors reset");
        self.hit_errors.clear();
        self.hit_error_index = 0;
        self.unstable_rate = 0.0;
    }

    pub fn reset_key_overlay(&mut self) {
        if self.key_overlay_default {
            return;
        }
        debug!("Gameplay key overlay reset");
        for key in &mut self.key_overlay {
            key.is_pressed = false;
            key.count = 0;
        }
        self.key_overlay_default = true;
    }

    pub fn update(
        &mut self,
        memory: &mut dyn GameMemory,
        reporter: &mut ErrorReporter,
        context: &GameplayContext,
        object_count: i32,
    ) -> StateUpdate {
        let readout = match fetch(reporter, ErrorSite::GameplayUpdate, memory.gameplay(context)) {
            Fetched::Value(readout) => readout,
            Fetched::Skip => return StateUpdate::Done,
            Fetched::NotReady => return StateUpdate::NotReady,
        };
        let client = memory.client();

        self.is_default = false;
        self.retries = readout.retries;
        self.player_name = readout.player_name;
        self.mods = readout.mods;
        self.mode = readout.mode;
        self.score = readout.score;
        self.player_hp_smooth = readout.player_hp_smooth;
        self.player_hp = readout.player_hp;
        self.accuracy = readout.accuracy;
        self.statistics = readout.statistics;
        self.combo = readout.combo;
        self.max_combo = readout.max_combo;
        self.failed = readout.failed;

        if self.max_combo > 0 {
            self.unstable_rate = unstable_rate(&self.hit_errors, self.mods);
        }

        if self.previous_combo > self.max_combo {
            self.previous_combo = 0;
        }
        // Combo dropped without a new miss: a slider end or tick was missed.
        if self.combo < self.previous_combo && self.statistics.miss == self.previous_misses {
            self.slider_breaks += 1;
        }
        self.previous_misses = self.statistics.miss;
        self.previous_combo = self.combo;

        self.update_grade(client, object_count);
        self.update_leaderboard(memory, reporter);

        reporter.reset(ErrorSite::GameplayUpdate);
        StateUpdate::Done
    }

    fn update_grade(&mut self, client: ClientType, object_count: i32) {
        self.grade_current =
            calculate_grade(client, self.mode, self.mods, self.accuracy, &self.statistics);

        // Every object not judged yet counted as a 300.
        let judged = passed_objects(0, &self.statistics);
        let expected = Statistics {
            great: self
                .statistics
                .great
                .saturating_add(object_count.saturating_sub(judged).max(0)),
            ..self.statistics
        };
        let expected_accuracy = calculate_accuracy(client, self.mode, self.mods, &expected);
        self.grade_expected = calculate_grade(client, self.mode, self.mods, expected_accuracy, &expected);
    }

    fn update_leaderboard(&mut self, memory: &mut dyn GameMemory, reporter: &mut ErrorReporter) {
        match fetch(reporter, ErrorSite::GameplayLeaderboard, memory.leaderboard(self.mode)) {
            Fetched::Value(readout) => {
                self.is_leaderboard_visible = readout.is_visible;
                self.leaderboard_player = readout.player.unwrap_or_default();
                self.leaderboard_scores = readout.players;
                reporter.reset(ErrorSite::GameplayLeaderboard);
            }
            // The previous board stays until the next good read.
            Fetched::Skip | Fetched::NotReady => {}
        }
    }

    pub fn update_key_overlay(&mut self, memory: &mut dyn GameMemory, reporter: &mut ErrorReporter) {
        let mut keys = match fetch(reporter, ErrorSite::GameplayKeyOverlay, memory.key_overlay(self.mode)) {
            Fetched::Value(keys) => keys,
            Fetched::Skip | Fetched::NotReady => return,
        };

        for key in &mut keys {
            if !(0..=MAX_COUNT).contains(&key.count) {
                key.is_pressed = false;
                key.count = 0;
            }
        }

        let line = keys
            .iter()
            .map(|k| k.count.to_string())
            .collect::<Vec<_>>()
            .join(":");
        if self.cached_keys != line {
            debug!("Key overlay {}", line);
            self.cached_keys = line;
        }

        self.key_overlay = keys;
        self.key_overlay_default = false;
        reporter.reset(ErrorSite::GameplayKeyOverlay);
    }

    /// Append the hit errors recorded since the last read.
    pub fn update_hit_errors(&mut self, memory: &mut dyn GameMemory, reporter: &mut ErrorReporter) {
        let result = memory.hit_errors(self.hit_error_index);
        let readout = match fetch(reporter, ErrorSite::GameplayHitErrors, result) {
            Fetched::Value(readout) => readout,
            Fetched::Skip | Fetched::NotReady => return,
        };

        // The client rebuilt its list (retry or seek).
        if readout.next_index < self.hit_error_index {
            self.hit_errors.clear();
        }
        self.hit_errors.extend(readout.errors);
        self.hit_error_index = readout.next_index;
        reporter.reset(ErrorSite::GameplayHitErrors);
    }

    /// Live stars and pp for the judgements so far, plus the full-combo and
    /// best-case pp of the attempt.
    #[allow(clippy::too_many_arguments)]
    pub fn update_stars_and_performance(
        &mut self,
        calculator: &dyn DifficultyCalculator,
        beatmap: &mut BeatmapPp,
        menu: &Menu,
        global: &Global,
        client: ClientType,
        calculate_pp: bool,
        reporter: &mut ErrorReporter,
    ) {
        if !calculate_pp {
            return;
        }
        if global.game_folder.is_empty() {
            debug!("Gameplay pp: game folder not found");
            return;
        }

        let lazer = client == ClientType::Lazer;
        let Some(map) = beatmap.map_request(self.mode, self.mods, lazer) else {
            debug!("Gameplay pp: no beatmap loaded");
            return;
        };

        let map_key = format!(
            "{}:{}:{}:{}",
            menu.checksum,
            menu.gamemode,
            self.mods.bits(),
            menu.mp3_length
        );
        if self.previous_map_key != map_key {
            self.previous_passed_objects = 0;
            self.previous_map_key = map_key;
        }

        let passed = passed_objects(self.mode, &self.statistics);
        if passed <= self.previous_passed_objects {
            return;
        }

        let hits = self.statistics;
        let current = calculator.performance(
            &map,
            &ScoreState {
                statistics: Some(hits),
                combo: Some(self.max_combo),
                passed_objects: Some(passed),
                accuracy: None,
            },
        );

        let attributes = &beatmap.calculated_map_attributes;
        let max_judgements = attributes.max_judgements(self.mode, lazer, self.mods);
        let best_case = max_judgements
            .saturating_sub(hits.ok)
            .saturating_sub(hits.meh)
            .saturating_sub(hits.miss);
        let mania = self.mode == 3;

        let achievable = if mania {
            ScoreState {
                statistics: Some(Statistics {
                    perfect: best_case,
                    ..hits
                }),
                ..ScoreState::default()
            }
        } else {
            ScoreState {
                statistics: Some(Statistics {
                    great: best_case,
                    ..hits
                }),
                combo: Some(self.max_combo),
                ..ScoreState::default()
            }
        };
        let max_achievable = calculator.performance(&map, &achievable);

        let full_combo = if mania {
            ScoreState {
                statistics: Some(Statistics {
                    ok: hits.ok,
                    meh: hits.meh,
                    miss: hits.miss,
                    ..Statistics::default()
                }),
                accuracy: Some(self.accuracy),
                ..ScoreState::default()
            }
        } else {
            ScoreState {
                statistics: Some(Statistics {
                    great: hits.great.saturating_add(hits.miss),
                    miss: 0,
                    ..hits
                }),
                combo: Some(attributes.max_combo),
                ..ScoreState::default()
            }
        };
        let full_combo = calculator.performance(&map, &full_combo);

        let results = current.and_then(|c| Ok((c, max_achievable?, full_combo?)));
        match results {
            Ok((current, max_achievable, full_combo)) => {
                beatmap.update_current_attributes(current.stars, current.pp);
                beatmap.set_current_breakdown(&current);
                beatmap.curr_attributes.max_achievable = max_achievable.pp;
                beatmap.curr_attributes.fc_pp = full_combo.pp;
                beatmap.set_fc_breakdown(&full_combo);

                self.previous_passed_objects = passed;
                reporter.reset(ErrorSite::GameplayPerformance);
            }
            Err(e) => reporter.report(ErrorSite::GameplayPerformance, &format!("{:#}", e)),
        }
    }
}
