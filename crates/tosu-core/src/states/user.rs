use serde::Serialize;

use super::{Fetched, fetch};
use crate::instance::{ErrorReporter, ErrorSite};
use crate::memory::GameMemory;

/// Logged-in profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub name: String,
    pub accuracy: f64,
    pub ranked_score: i64,
    pub id: i32,
    pub level: f32,
    pub play_count: i32,
    pub play_mode: i32,
    pub rank: i32,
    pub country_code: i32,
    pub performance_points: i32,
    pub raw_bancho_status: i32,
    pub background_colour: u32,
    pub raw_login_status: i32,
}

impl User {
    pub fn update(&mut self, memory: &mut dyn GameMemory, reporter: &mut ErrorReporter) {
        let Fetched::Value(profile) = fetch(reporter, ErrorSite::UserUpdate, memory.user()) else {
            return;
        };

        self.name = profile.name;
        self.accuracy = profile.accuracy;
        self.ranked_score = profile.ranked_score;
        self.id = profile.id;
        self.level = profile.level;
        self.play_count = profile.play_count;
        self.play_mode = profile.play_mode;
        self.rank = profile.rank;
        self.country_code = profile.country_code;
        self.performance_points = profile.performance_points;
        self.raw_bancho_status = profile.raw_bancho_status;
        self.background_colour = profile.background_colour;
        self.raw_login_status = profile.raw_login_status;

        reporter.reset(ErrorSite::UserUpdate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::ClientType;
    use crate::memory::{Readout, UserReadout};
    use crate::memory::ScriptedMemory;

    #[test]
    fn test_guest_profile() {
        let mut memory = ScriptedMemory::stable();
        memory.user.push_back(Ok(Readout::Ready(UserReadout::guest())));

        let mut user = User::default();
        let mut reporter = ErrorReporter::new(ClientType::Stable, 1);
        user.update(&mut memory, &mut reporter);

        assert_eq!(user.name, "Guest");
        assert_eq!(user.rank, 1);
        assert_eq!(user.background_colour, 0xFFFF_FFFF);
    }
}
