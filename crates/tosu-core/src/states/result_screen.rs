use serde::Serialize;
use tracing::debug;

use super::beatmap::BeatmapPp;
use super::{Fetched, StateUpdate, fetch};
use crate::calculator::{DifficultyCalculator, ScoreState};
use crate::game::{ClientType, Grade, OsuMods, Statistics, calculate_accuracy, calculate_grade};
use crate::instance::{ErrorReporter, ErrorSite};
use crate::memory::GameMemory;

/// The score shown on the ranking screen.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultScreen {
    pub online_id: i64,
    pub player_name: String,
    pub mods: OsuMods,
    pub mode: i32,
    pub max_combo: i32,
    pub score: i64,
    pub statistics: Statistics,
    pub grade: Grade,
    pub date: String,
    pub accuracy: f64,
    pub pp: f64,
    pub fc_pp: f64,
    #[serde(skip)]
    previous_key: String,
}

impl ResultScreen {
    pub fn init(&mut self) {
        debug!("Result screen reset");
        *self = Self::default();
    }

    pub fn update(
        &mut self,
        memory: &mut dyn GameMemory,
        reporter: &mut ErrorReporter,
        client: ClientType,
    ) -> StateUpdate {
        let readout = match fetch(reporter, ErrorSite::ResultScreenUpdate, memory.result_screen()) {
            Fetched::Value(readout) => readout,
            Fetched::Skip => return StateUpdate::Done,
            Fetched::NotReady => return StateUpdate::NotReady,
        };

        self.online_id = readout.online_id;
        self.player_name = readout.player_name;
        self.mods = readout.mods;
        self.mode = readout.mode;
        self.max_combo = readout.max_combo;
        self.score = readout.score;
        self.statistics = readout.statistics;
        self.date = readout.date;

        self.accuracy = calculate_accuracy(client, self.mode, self.mods, &self.statistics);
        self.grade = calculate_grade(client, self.mode, self.mods, self.accuracy, &self.statistics);

        reporter.reset(ErrorSite::ResultScreenUpdate);
        StateUpdate::Done
    }

    /// pp of the shown score and of its full-combo version, once per score.
    pub fn update_performance(
        &mut self,
        calculator: &dyn DifficultyCalculator,
        beatmap: &BeatmapPp,
        checksum: &str,
        reporter: &mut ErrorReporter,
        client: ClientType,
    ) {
        let key = format!("{}{}{}{}", checksum, self.mods.bits(), self.mode, self.player_name);
        if self.previous_key == key {
            return;
        }

        let Some(map) = beatmap.map_request(self.mode, self.mods, client == ClientType::Lazer) else {
            debug!("Result screen performance: no beatmap loaded");
            return;
        };

        let current = calculator.performance(
            &map,
            &ScoreState {
                statistics: Some(self.statistics),
                combo: Some(self.max_combo),
                ..ScoreState::default()
            },
        );
        let full_combo = calculator.performance(
            &map,
            &ScoreState {
                statistics: Some(Statistics {
                    miss: 0,
                    ..self.statistics
                }),
                accuracy: Some(self.accuracy),
                ..ScoreState::default()
            },
        );

        match current.and_then(|current| Ok((current, full_combo?))) {
            Ok((current, full_combo)) => {
                self.pp = current.pp;
                self.fc_pp = full_combo.pp;
                self.previous_key = key;
                reporter.reset(ErrorSite::ResultScreenPerformance);
            }
            Err(e) => reporter.report(ErrorSite::ResultScreenPerformance, &format!("{:#}", e)),
        }
    }
}
