use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// Stable client mod bit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OsuMods(u32);

/// Acronym of each bit, lowest bit first.
const ACRONYMS: [&str; 31] = [
    "NF", "EZ", "TD", "HD", "HR", "SD", "DT", "RX", "HT", "NC", "FL", "AT", "SO", "AP", "PF",
    "4K", "5K", "6K", "7K", "8K", "FI", "RD", "CN", "TG", "9K", "10K", "1K", "3K", "2K", "V2",
    "MR",
];

impl OsuMods {
    pub const NONE: OsuMods = OsuMods(0);
    pub const NO_FAIL: OsuMods = OsuMods(1 << 0);
    pub const EASY: OsuMods = OsuMods(1 << 1);
    pub const TOUCH_DEVICE: OsuMods = OsuMods(1 << 2);
    pub const HIDDEN: OsuMods = OsuMods(1 << 3);
    pub const HARD_ROCK: OsuMods = OsuMods(1 << 4);
    pub const SUDDEN_DEATH: OsuMods = OsuMods(1 << 5);
    pub const DOUBLE_TIME: OsuMods = OsuMods(1 << 6);
    pub const RELAX: OsuMods = OsuMods(1 << 7);
    pub const HALF_TIME: OsuMods = OsuMods(1 << 8);
    pub const NIGHTCORE: OsuMods = OsuMods(1 << 9);
    pub const FLASHLIGHT: OsuMods = OsuMods(1 << 10);
    pub const AUTOPLAY: OsuMods = OsuMods(1 << 11);
    pub const SPUN_OUT: OsuMods = OsuMods(1 << 12);
    pub const AUTOPILOT: OsuMods = OsuMods(1 << 13);
    pub const PERFECT: OsuMods = OsuMods(1 << 14);
    pub const FADE_IN: OsuMods = OsuMods(1 << 20);
    pub const RANDOM: OsuMods = OsuMods(1 << 21);
    pub const CINEMA: OsuMods = OsuMods(1 << 22);
    pub const TARGET: OsuMods = OsuMods(1 << 23);
    pub const SCORE_V2: OsuMods = OsuMods(1 << 29);
    pub const MIRROR: OsuMods = OsuMods(1 << 30);

    pub const fn from_bits(bits: u32) -> Self {
        OsuMods(bits)
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub const fn contains(&self, other: OsuMods) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Build from lazer acronyms; unknown acronyms are ignored.
    pub fn from_acronyms<S: AsRef<str>>(acronyms: &[S]) -> Self {
        let mut mods = OsuMods::NONE;
        for acronym in acronyms {
            let acronym = acronym.as_ref();
            let acronym = if acronym.eq_ignore_ascii_case("SV2") {
                "V2"
            } else {
                acronym
            };
            if let Some(bit) = ACRONYMS.iter().position(|a| a.eq_ignore_ascii_case(acronym)) {
                mods |= OsuMods(1 << bit);
            }
        }
        // Nightcore and perfect imply their base mods on the bit level.
        if mods.contains(OsuMods::NIGHTCORE) {
            mods |= OsuMods::DOUBLE_TIME;
        }
        if mods.contains(OsuMods::PERFECT) {
            mods |= OsuMods::SUDDEN_DEATH;
        }
        mods
    }

    /// Enabled acronyms in display order.
    pub fn acronyms(&self) -> Vec<&'static str> {
        let mut enabled: Vec<(usize, usize, &'static str)> = ACRONYMS
            .iter()
            .enumerate()
            .filter(|(bit, _)| self.0 & (1 << bit) != 0)
            .filter(|(_, acronym)| match **acronym {
                "DT" => !self.contains(OsuMods::NIGHTCORE),
                "SD" => !self.contains(OsuMods::PERFECT),
                _ => true,
            })
            .map(|(bit, acronym)| (display_rank(acronym), bit, *acronym))
            .collect();
        enabled.sort_unstable();
        enabled.into_iter().map(|(_, _, acronym)| acronym).collect()
    }

    /// Concatenated acronyms, e.g. `HDDT`.
    pub fn name(&self) -> String {
        self.acronyms().concat()
    }

    /// Playback rate implied by the speed mods.
    pub fn rate(&self) -> f64 {
        if self.contains(OsuMods::DOUBLE_TIME) || self.contains(OsuMods::NIGHTCORE) {
            1.5
        } else if self.contains(OsuMods::HALF_TIME) {
            0.75
        } else {
            1.0
        }
    }

    /// Hidden or flashlight turn S/SS grades silver.
    pub fn is_silver(&self) -> bool {
        self.contains(OsuMods::HIDDEN) || self.contains(OsuMods::FLASHLIGHT)
    }
}

fn display_rank(acronym: &str) -> usize {
    match acronym {
        "NF" => 0,
        "EZ" => 1,
        "HD" => 2,
        "DT" | "NC" | "HT" => 3,
        "HR" => 4,
        "SO" | "SD" | "PF" => 5,
        "FL" => 6,
        "TD" => 7,
        _ => 8,
    }
}

impl BitOr for OsuMods {
    type Output = OsuMods;

    fn bitor(self, rhs: OsuMods) -> OsuMods {
        OsuMods(self.0 | rhs.0)
    }
}

impl BitOrAssign for OsuMods {
    fn bitor_assign(&mut self, rhs: OsuMods) {
        self.0 |= rhs.0;
    }
}

impl From<u32> for OsuMods {
    fn from(bits: u32) -> Self {
        OsuMods(bits)
    }
}

impl fmt::Display for OsuMods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "NM")
        } else {
            write!(f, "{}", self.name())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_uses_display_order() {
        let mods = OsuMods::HARD_ROCK | OsuMods::HIDDEN | OsuMods::DOUBLE_TIME;
        assert_eq!(mods.name(), "HDDTHR");
    }

    #[test]
    fn test_nightcore_hides_double_time() {
        let mods = OsuMods::from_bits(OsuMods::DOUBLE_TIME.bits() | OsuMods::NIGHTCORE.bits());
        assert_eq!(mods.name(), "NC");
        assert_eq!(mods.rate(), 1.5);
    }

    #[test]
    fn test_perfect_hides_sudden_death() {
        let mods = OsuMods::PERFECT | OsuMods::SUDDEN_DEATH;
        assert_eq!(mods.acronyms(), vec!["PF"]);
    }

    #[test]
    fn test_rate() {
        assert_eq!(OsuMods::NONE.rate(), 1.0);
        assert_eq!(OsuMods::HALF_TIME.rate(), 0.75);
        assert_eq!(OsuMods::DOUBLE_TIME.rate(), 1.5);
    }

    #[test]
    fn test_from_acronyms() {
        let mods = OsuMods::from_acronyms(&["HD", "nc", "SV2", "WG"]);
        assert!(mods.contains(OsuMods::HIDDEN));
        assert!(mods.contains(OsuMods::NIGHTCORE));
        assert!(mods.contains(OsuMods::DOUBLE_TIME));
        assert!(mods.contains(OsuMods::SCORE_V2));
        assert_eq!(mods.bits().count_ones(), 4);
    }

    #[test]
    fn test_display_nomod() {
        assert_eq!(OsuMods::NONE.to_string(), "NM");
        assert_eq!(OsuMods::from_bits(8).to_string(), "HD");
    }
}
