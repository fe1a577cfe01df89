//! Difficulty and performance calculation boundary.
//!
//! The pp engine is an external service. The instance only hands it the
//! beatmap text, the mods and the judgements of a score and copies the numbers
//! it gets back into the snapshots.

use crate::game::{OsuMods, Statistics};

/// A beatmap with the mods it is played with.
#[derive(Debug, Clone, Copy)]
pub struct MapRequest<'a> {
    /// Contents of the `.osu` file.
    pub content: &'a str,
    pub mode: i32,
    pub mods: OsuMods,
    pub lazer: bool,
}

/// Difficulty attributes of a whole map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Difficulty {
    pub stars: f64,
    pub max_combo: i32,
    pub aim: f64,
    pub speed: f64,
    pub flashlight: f64,
    pub slider_factor: f64,
    pub stamina: f64,
    pub rhythm: f64,
    pub color: f64,
    pub reading: f64,
    pub hit_window: f64,
}

/// One named strain curve.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrainSeries {
    pub name: String,
    pub values: Vec<f64>,
}

/// Strain curves sampled every `section_length` milliseconds.
///
/// The first series is the ruleset's primary skill (aim, color, movement or
/// plain strains for mania).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Strains {
    pub section_length: f64,
    pub series: Vec<StrainSeries>,
}

/// Score state handed to the performance calculation.
///
/// `None` fields are left for the calculator to fill in (full combo, all
/// objects, best-case judgements).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreState {
    pub statistics: Option<Statistics>,
    pub combo: Option<i32>,
    pub passed_objects: Option<i32>,
    pub accuracy: Option<f64>,
}

impl ScoreState {
    pub fn with_accuracy(accuracy: f64) -> Self {
        Self {
            accuracy: Some(accuracy),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Performance {
    pub stars: f64,
    pub pp: f64,
    pub pp_aim: f64,
    pub pp_speed: f64,
    pub pp_accuracy: f64,
    pub pp_flashlight: f64,
    pub pp_difficulty: f64,
}

/// A pp engine.
pub trait DifficultyCalculator: Send + Sync {
    fn difficulty(&self, map: &MapRequest<'_>) -> anyhow::Result<Difficulty>;

    fn strains(&self, map: &MapRequest<'_>) -> anyhow::Result<Strains>;

    fn performance(&self, map: &MapRequest<'_>, score: &ScoreState) -> anyhow::Result<Performance>;
}

/// Calculator used when no engine is plugged in. Every value is zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCalculator;

impl DifficultyCalculator for NoopCalculator {
    fn difficulty(&self, _map: &MapRequest<'_>) -> anyhow::Result<Difficulty> {
        Ok(Difficulty::default())
    }

    fn strains(&self, _map: &MapRequest<'_>) -> anyhow::Result<Strains> {
        Ok(Strains::default())
    }

    fn performance(&self, _map: &MapRequest<'_>, _score: &ScoreState) -> anyhow::Result<Performance> {
        Ok(Performance::default())
    }
}

/// Mods the engine should not see: they make a score harder without
/// changing the map.
pub fn without_debuff_mods(mods: OsuMods) -> OsuMods {
    const DEBUFFS: [OsuMods; 4] = [
        OsuMods::NO_FAIL,
        OsuMods::SUDDEN_DEATH,
        OsuMods::PERFECT,
        OsuMods::CINEMA,
    ];
    let mask = DEBUFFS.iter().fold(0, |acc, m| acc | m.bits());
    OsuMods::from_bits(mods.bits() & !mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_calculator_returns_zeroes() {
        let map = MapRequest {
            content: "",
            mode: 0,
            mods: OsuMods::NONE,
            lazer: false,
        };
        let calc = NoopCalculator;
        assert_eq!(calc.difficulty(&map).unwrap(), Difficulty::default());
        assert!(calc.strains(&map).unwrap().series.is_empty());
        assert_eq!(
            calc.performance(&map, &ScoreState::with_accuracy(100.0)).unwrap().pp,
            0.0
        );
    }

    #[test]
    fn test_debuff_mods_removed() {
        let mods = OsuMods::HIDDEN | OsuMods::NO_FAIL | OsuMods::SUDDEN_DEATH;
        assert_eq!(without_debuff_mods(mods), OsuMods::HIDDEN);
    }
}
