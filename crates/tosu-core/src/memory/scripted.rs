//! Scripted [`GameMemory`] for loop and decoder tests.
//!
//! Every capability pops its next answer from a queue. An empty queue answers
//! `Readout::Unchanged` (the snapshot stays as it is), `0.0` for the track
//! length and `None` for chat. Calls are recorded in order, in a log that
//! can be kept after the reader is boxed into an instance.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{
    ChatMessage, GameMemory, GameplayContext, GameplayReadout, GlobalPreciseReadout, GlobalReadout,
    HitErrorsReadout, KeyOverlayReadout, LeaderboardReadout, MenuReadout, Readout, ResultScreenReadout,
    SettingsReadout, TourneyReadout, TourneyUserReadout, UserReadout,
};
use crate::error::Result;
use crate::game::ClientType;

type Script<T> = VecDeque<Result<Readout<T>>>;

/// Shared list of the capabilities called, in order.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<&'static str>>>);

impl CallLog {
    fn push(&self, name: &'static str) {
        self.0.lock().push(name);
    }

    /// How many times `name` was called.
    pub fn count(&self, name: &str) -> usize {
        self.0.lock().iter().filter(|c| **c == name).count()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.0.lock().clone()
    }
}

#[derive(Debug, Default)]
pub struct ScriptedMemory {
    pub client: ClientType,
    pub pid: u32,
    pub resolve: VecDeque<Result<()>>,
    pub global: Script<GlobalReadout>,
    pub global_precise: Script<GlobalPreciseReadout>,
    pub menu: Script<MenuReadout>,
    pub mp3_length: VecDeque<Result<f64>>,
    pub result_screen: Script<ResultScreenReadout>,
    pub gameplay: Script<GameplayReadout>,
    pub key_overlay: Script<KeyOverlayReadout>,
    pub hit_errors: Script<HitErrorsReadout>,
    pub leaderboard: Script<LeaderboardReadout>,
    pub audio_velocity: Script<Vec<f32>>,
    pub settings: Script<SettingsReadout>,
    pub tourney: Script<TourneyReadout>,
    pub tourney_chat: VecDeque<Result<Option<Vec<ChatMessage>>>>,
    pub tourney_user: Script<TourneyUserReadout>,
    pub user: Script<UserReadout>,
    pub calls: CallLog,
    pub hit_error_requests: Vec<usize>,
    pub chat_requests: Vec<usize>,
    pub gameplay_contexts: Vec<GameplayContext>,
}

impl ScriptedMemory {
    pub fn new(client: ClientType, pid: u32) -> Self {
        Self {
            client,
            pid,
            ..Self::default()
        }
    }

    pub fn stable() -> Self {
        Self::new(ClientType::Stable, 1)
    }

    pub fn lazer() -> Self {
        Self::new(ClientType::Lazer, 2)
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls.count(name)
    }

    pub fn call_log(&self) -> CallLog {
        self.calls.clone()
    }
}

fn next<T>(script: &mut Script<T>) -> Result<Readout<T>> {
    script.pop_front().unwrap_or(Ok(Readout::Unchanged))
}

impl GameMemory for ScriptedMemory {
    fn client(&self) -> ClientType {
        self.client
    }

    fn pid(&self) -> u32 {
        self.pid
    }

    fn resolve(&mut self, _spectating: bool) -> Result<()> {
        self.calls.push("resolve");
        self.resolve.pop_front().unwrap_or(Ok(()))
    }

    fn global(&mut self) -> Result<Readout<GlobalReadout>> {
        self.calls.push("global");
        next(&mut self.global)
    }

    fn global_precise(&mut self) -> Result<Readout<GlobalPreciseReadout>> {
        self.calls.push("global_precise");
        next(&mut self.global_precise)
    }

    fn menu(&mut self, _previous_checksum: &str) -> Result<Readout<MenuReadout>> {
        self.calls.push("menu");
        next(&mut self.menu)
    }

    fn mp3_length(&mut self) -> Result<f64> {
        self.calls.push("mp3_length");
        self.mp3_length.pop_front().unwrap_or(Ok(0.0))
    }

    fn result_screen(&mut self) -> Result<Readout<ResultScreenReadout>> {
        self.calls.push("result_screen");
        next(&mut self.result_screen)
    }

    fn gameplay(&mut self, context: &GameplayContext) -> Result<Readout<GameplayReadout>> {
        self.calls.push("gameplay");
        self.gameplay_contexts.push(*context);
        next(&mut self.gameplay)
    }

    fn key_overlay(&mut self, _mode: i32) -> Result<Readout<KeyOverlayReadout>> {
        self.calls.push("key_overlay");
        next(&mut self.key_overlay)
    }

    fn hit_errors(&mut self, from: usize) -> Result<Readout<HitErrorsReadout>> {
        self.calls.push("hit_errors");
        self.hit_error_requests.push(from);
        next(&mut self.hit_errors)
    }

    fn leaderboard(&mut self, _mode: i32) -> Result<Readout<LeaderboardReadout>> {
        self.calls.push("leaderboard");
        next(&mut self.leaderboard)
    }

    fn audio_velocity_base(&mut self) -> Result<Readout<Vec<f32>>> {
        self.calls.push("audio_velocity_base");
        next(&mut self.audio_velocity)
    }

    fn settings(&mut self) -> Result<Readout<SettingsReadout>> {
        self.calls.push("settings");
        next(&mut self.settings)
    }

    fn tourney(&mut self) -> Result<Readout<TourneyReadout>> {
        self.calls.push("tourney");
        next(&mut self.tourney)
    }

    fn tourney_chat(
        &mut self,
        known_count: usize,
        _show_mp_commands: bool,
    ) -> Result<Option<Vec<ChatMessage>>> {
        self.calls.push("tourney_chat");
        self.chat_requests.push(known_count);
        self.tourney_chat.pop_front().unwrap_or(Ok(None))
    }

    fn tourney_user(&mut self) -> Result<Readout<TourneyUserReadout>> {
        self.calls.push("tourney_user");
        next(&mut self.tourney_user)
    }

    fn user(&mut self) -> Result<Readout<UserReadout>> {
        self.calls.push("user");
        next(&mut self.user)
    }
}
