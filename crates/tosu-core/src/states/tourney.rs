use serde::Serialize;
use tracing::debug;

use super::gameplay::Gameplay;
use super::{Fetched, StateUpdate, fetch};
use crate::instance::{ErrorReporter, ErrorSite};
use crate::memory::{ChatMessage, GameMemory};

/// Player a tournament spectator client is watching.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TourneyUser {
    pub id: i32,
    pub name: String,
    pub country: String,
    pub accuracy: f64,
    pub play_count: i32,
    pub ranked_score: i64,
    pub global_rank: i32,
    pub pp: i32,
}

/// Tournament manager panel, plus the watched player on spectator clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TourneyManager {
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
    pub messages: Vec<ChatMessage>,
    pub user: TourneyUser,
    #[serde(skip)]
    is_default_user: bool,
}

impl Default for TourneyManager {
    fn default() -> Self {
        Self {
            ipc_state: 0,
            left_stars: 0,
            right_stars: 0,
            best_of: 0,
            stars_visible: false,
            score_visible: false,
            first_team_name: String::new(),
            second_team_name: String::new(),
            first_team_score: 0,
            second_team_score: 0,
            messages: Vec::new(),
            user: TourneyUser::default(),
            is_default_user: true,
        }
    }
}

impl TourneyManager {
    pub fn reset_user(&mut self) {
        if self.is_default_user {
            return;
        }
        self.user = TourneyUser::default();
        self.is_default_user = true;
    }

    /// Read the manager panel and any chat messages posted since the last pass.
    pub fn update(
        &mut self,
        memory: &mut dyn GameMemory,
        reporter: &mut ErrorReporter,
        show_mp_commands: bool,
    ) -> StateUpdate {
        let readout = match fetch(reporter, ErrorSite::TourneyUpdate, memory.tourney()) {
            Fetched::Value(readout) => readout,
            Fetched::Skip => return StateUpdate::Done,
            Fetched::NotReady => return StateUpdate::NotReady,
        };

        self.ipc_state = readout.ipc_state;
        self.left_stars = readout.left_stars;
        self.right_stars = readout.right_stars;
        self.best_of = readout.best_of;
        self.stars_visible = readout.stars_visible;
        self.score_visible = readout.score_visible;
        self.first_team_name = readout.first_team_name;
        self.second_team_name = readout.second_team_name;
        self.first_team_score = readout.first_team_score;
        self.second_team_score = readout.second_team_score;

        match memory.tourney_chat(self.messages.len(), show_mp_commands) {
            Ok(Some(messages)) => {
                debug!("Tourney chat: {} messages", messages.len());
                self.messages = messages;
            }
            Ok(None) => {}
            Err(e) => {
                reporter.report(ErrorSite::TourneyUpdate, &e);
                return StateUpdate::Done;
            }
        }

        reporter.reset(ErrorSite::TourneyUpdate);
        StateUpdate::Done
    }

    /// Read the watched player. When nobody is watched the play on this
    /// client is stale and gets cleared.
    pub fn update_user(
        &mut self,
        memory: &mut dyn GameMemory,
        reporter: &mut ErrorReporter,
        gameplay: &mut Gameplay,
    ) {
        match fetch(reporter, ErrorSite::TourneyUser, memory.tourney_user()) {
            Fetched::Value(readout) => {
                self.user = TourneyUser {
                    id: readout.id,
                    name: readout.name,
                    country: readout.country,
                    accuracy: readout.accuracy,
                    play_count: readout.play_count,
                    ranked_score: readout.ranked_score,
                    global_rank: readout.global_rank,
                    pp: readout.pp,
                };
                self.is_default_user = false;
                reporter.reset(ErrorSite::TourneyUser);
            }
            Fetched::NotReady => {
                self.reset_user();
                if !gameplay.is_default {
                    gameplay.init(false, "tourney");
                }
            }
            Fetched::Skip => {}
        }
    }
}
