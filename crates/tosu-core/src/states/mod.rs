//! Per-domain snapshots and the decoders that fill them.
//!
//! Every snapshot lives in the [`States`] arena owned by an instance. A
//! decoder only writes its own snapshot. Values it needs from another domain
//! are passed in by the polling loop.

mod bass_density;
mod beatmap;
mod gameplay;
mod global;
mod menu;
mod result_screen;
mod settings;
mod tourney;
mod user;

pub use bass_density::BassDensity;
pub use beatmap::{
    BeatmapPp, CurrentAttributes, Graph, GraphSeries, KiaiPoint, MapAttributes, MapSource, PpBreakdown,
    Timings,
};
pub(crate) use beatmap::fix_decimals;
pub use gameplay::Gameplay;
pub use global::Global;
pub use menu::Menu;
pub use result_screen::ResultScreen;
pub use settings::Settings;
pub use tourney::{TourneyManager, TourneyUser};
pub use user::User;

use std::path::MAIN_SEPARATOR;

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::instance::{ErrorReporter, ErrorSite};
use crate::memory::Readout;

/// Result of one decoder pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateUpdate {
    /// The snapshot is current, or the failure was reported and the cycle can go on.
    Done,
    /// A required object is missing; the caller should skip the rest of the cycle.
    NotReady,
}

impl StateUpdate {
    pub fn is_not_ready(self) -> bool {
        self == Self::NotReady
    }
}

/// A readout after error accounting.
pub(crate) enum Fetched<T> {
    Value(T),
    /// Nothing to apply: unchanged, or the error was reported.
    Skip,
    NotReady,
}

/// Route a raw read through the reporter.
///
/// The caller resets the site's counter once it has applied the value.
pub(crate) fn fetch<T>(
    reporter: &mut ErrorReporter,
    site: ErrorSite,
    result: Result<Readout<T>>,
) -> Fetched<T> {
    match result {
        Ok(Readout::Ready(value)) => Fetched::Value(value),
        Ok(Readout::Unchanged) => Fetched::Skip,
        Ok(Readout::NotReady(reason)) => {
            debug!("{} not ready: {}", site.name(), reason);
            Fetched::NotReady
        }
        Err(e) => {
            reporter.report(site, &e);
            Fetched::Skip
        }
    }
}

/// Normalize a path read from memory to the host separator.
pub(crate) fn clean_path(path: &str) -> String {
    path.trim()
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| if c == '\\' || c == '/' { MAIN_SEPARATOR } else { c })
        .collect()
}

/// All snapshots of one instance.
#[derive(Debug, Default)]
pub struct States {
    pub global: Global,
    pub menu: Menu,
    pub beatmap: BeatmapPp,
    pub gameplay: Gameplay,
    pub result_screen: ResultScreen,
    pub settings: Settings,
    pub tourney: TourneyManager,
    pub user: User,
    pub bass_density: BassDensity,
}

impl States {
    pub const DOMAINS: [&'static str; 9] = [
        "global",
        "menu",
        "beatmapPP",
        "gameplay",
        "resultScreen",
        "settings",
        "tourneyManager",
        "user",
        "bassDensity",
    ];

    /// Snapshot of one domain as JSON.
    pub fn domain(&self, name: &str) -> Result<serde_json::Value> {
        match name {
            "global" => to_value(&self.global),
            "menu" => to_value(&self.menu),
            "beatmapPP" => to_value(&self.beatmap),
            "gameplay" => to_value(&self.gameplay),
            "resultScreen" => to_value(&self.result_screen),
            "settings" => to_value(&self.settings),
            "tourneyManager" => to_value(&self.tourney),
            "user" => to_value(&self.user),
            "bassDensity" => to_value(&self.bass_density),
            _ => Err(Error::UnknownDomain(name.to_string())),
        }
    }
}

fn to_value<T: Serialize>(state: &T) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(state)?)
}
