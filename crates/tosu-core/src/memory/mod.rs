//! Client-specific memory readers.
//!
//! Both clients expose the same capability set through [`GameMemory`]; the
//! instance picks the implementation once, when the process is attached.

mod lazer;
mod stable;
mod types;

// Scripted reader for loop tests (always available for unit and integration tests)
#[doc(hidden)]
pub mod scripted;

pub use lazer::LazerMemory;
pub use stable::StableMemory;
pub use types::*;

#[doc(hidden)]
pub use scripted::{CallLog, ScriptedMemory};

use crate::error::Result;
use crate::game::ClientType;

/// Outcome of a read that succeeded at the memory level.
#[derive(Debug, Clone, PartialEq)]
pub enum Readout<T> {
    Ready(T),
    /// Nothing changed since the last read; the snapshot stays as it is.
    Unchanged,
    /// A required object is not allocated yet. Not an error.
    NotReady(&'static str),
}

impl<T> Readout<T> {
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Readout<U> {
        match self {
            Readout::Ready(value) => Readout::Ready(f(value)),
            Readout::Unchanged => Readout::Unchanged,
            Readout::NotReady(reason) => Readout::NotReady(reason),
        }
    }

    pub fn ready(self) -> Option<T> {
        match self {
            Readout::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// Reads one client's domain values out of its process.
///
/// Methods take `&mut self` because readers cache lazily discovered
/// addresses (chat engine, dictionary positions, object roots).
pub trait GameMemory: Send {
    fn client(&self) -> ClientType;

    fn pid(&self) -> u32;

    /// Scan the pattern table and keep the result. All-or-nothing.
    fn resolve(&mut self, spectating: bool) -> Result<()>;

    fn global(&mut self) -> Result<Readout<GlobalReadout>>;

    fn global_precise(&mut self) -> Result<Readout<GlobalPreciseReadout>>;

    /// Menu beatmap. Only the cheap fields are read when the selected map
    /// still has `previous_checksum`.
    fn menu(&mut self, previous_checksum: &str) -> Result<Readout<MenuReadout>>;

    /// Length of the playing track in milliseconds.
    fn mp3_length(&mut self) -> Result<f64>;

    fn result_screen(&mut self) -> Result<Readout<ResultScreenReadout>>;

    fn gameplay(&mut self, context: &GameplayContext) -> Result<Readout<GameplayReadout>>;

    fn key_overlay(&mut self, mode: i32) -> Result<Readout<KeyOverlayReadout>>;

    /// Hit errors appended since index `from`.
    fn hit_errors(&mut self, from: usize) -> Result<Readout<HitErrorsReadout>>;

    fn leaderboard(&mut self, mode: i32) -> Result<Readout<LeaderboardReadout>>;

    /// Spectrum samples of the menu music.
    fn audio_velocity_base(&mut self) -> Result<Readout<Vec<f32>>>;

    fn settings(&mut self) -> Result<Readout<SettingsReadout>>;

    fn tourney(&mut self) -> Result<Readout<TourneyReadout>>;

    /// New `#multiplayer` messages, or `None` when the channel still holds
    /// `known_count` messages.
    fn tourney_chat(
        &mut self,
        known_count: usize,
        show_mp_commands: bool,
    ) -> Result<Option<Vec<ChatMessage>>>;

    fn tourney_user(&mut self) -> Result<Readout<TourneyUserReadout>>;

    fn user(&mut self) -> Result<Readout<UserReadout>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readout_map_keeps_variant() {
        assert_eq!(Readout::Ready(2).map(|v| v * 2), Readout::Ready(4));
        assert_eq!(Readout::<i32>::Unchanged.map(|v| v * 2), Readout::Unchanged);
        assert_eq!(
            Readout::<i32>::NotReady("empty").map(|v| v * 2),
            Readout::NotReady("empty")
        );
        assert_eq!(Readout::<i32>::NotReady("empty").ready(), None);
    }
}
