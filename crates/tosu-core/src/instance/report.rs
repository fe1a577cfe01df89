//! Per-call-site error accounting.
//!
//! Transient read failures are normal while the client allocates or frees
//! objects, so each decoder call site gets its own counter. The first few
//! failures are logged at debug level and later ones at error level until the
//! site succeeds again.

use std::collections::HashMap;
use std::fmt::Display;

use strum::IntoStaticStr;
use tracing::{debug, error};

use crate::config::report::{DEFAULT_MAX_REPEATS, HIT_ERRORS_MAX_REPEATS};
use crate::game::ClientType;

/// Every place a decoder can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorSite {
    GlobalUpdate,
    GlobalPrecise,
    MenuUpdate,
    MenuMp3Length,
    ResultScreenUpdate,
    ResultScreenPerformance,
    SettingsUpdate,
    SettingsValue,
    ManiaScrollSpeed,
    BeatmapMetadata,
    BeatmapTimings,
    BeatmapGraph,
    BeatmapEditorPp,
    GameplayUpdate,
    GameplayKeyOverlay,
    GameplayHitErrors,
    GameplayLeaderboard,
    GameplayPerformance,
    BassDensity,
    TourneyUpdate,
    TourneyUser,
    UserUpdate,
}

impl ErrorSite {
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Failures logged at debug level before escalating.
    pub fn max_repeats(self) -> u32 {
        match self {
            Self::GameplayHitErrors => HIT_ERRORS_MAX_REPEATS,
            _ => DEFAULT_MAX_REPEATS,
        }
    }
}

#[derive(Debug)]
pub struct ErrorReporter {
    client: ClientType,
    pid: u32,
    counts: HashMap<ErrorSite, u32>,
}

impl ErrorReporter {
    pub fn new(client: ClientType, pid: u32) -> Self {
        Self {
            client,
            pid,
            counts: HashMap::new(),
        }
    }

    pub fn report(&mut self, site: ErrorSite, err: &dyn Display) {
        let count = self.counts.entry(site).or_insert(0);
        *count = count.saturating_add(1);

        if *count <= site.max_repeats() {
            debug!("[{}] {} {}: {}", self.client, self.pid, site.name(), err);
        } else {
            error!("[{}] {} {}: {}", self.client, self.pid, site.name(), err);
        }
    }

    pub fn reset(&mut self, site: ErrorSite) {
        self.counts.insert(site, 0);
    }

    pub fn count(&self, site: ErrorSite) -> u32 {
        self.counts.get(&site).copied().unwrap_or(0)
    }

    /// Whether the next failure of `site` would be logged at error level.
    pub fn is_escalated(&self, site: ErrorSite) -> bool {
        self.count(site) >= site.max_repeats()
    }
}
