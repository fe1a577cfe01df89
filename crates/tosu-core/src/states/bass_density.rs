use serde::Serialize;

use super::{Fetched, fetch};
use crate::instance::{ErrorReporter, ErrorSite};
use crate::memory::GameMemory;

/// Low-frequency buckets of the spectrum that count as bass.
const BASS_BUCKETS: usize = 40;

/// Smoothed bass level of the menu music, used for background pulsing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BassDensity {
    pub current_audio_velocity: f64,
    pub density: f64,
}

impl BassDensity {
    pub fn update(&mut self, memory: &mut dyn GameMemory, reporter: &mut ErrorReporter) {
        let Fetched::Value(spectrum) = fetch(reporter, ErrorSite::BassDensity, memory.audio_velocity_base())
        else {
            return;
        };
        self.apply(&spectrum);
        reporter.reset(ErrorSite::BassDensity);
    }

    pub(crate) fn apply(&mut self, spectrum: &[f32]) {
        let mut bass = 0.0;
        for i in 0..BASS_BUCKETS {
            let value = spectrum.get(i).map_or(f64::NAN, |&v| f64::from(v));
            if value < 0.0 {
                self.density = 0.5;
                return;
            }
            bass += 2.0 * value * (BASS_BUCKETS - i) as f64 / BASS_BUCKETS as f64;
        }

        if self.current_audio_velocity.is_nan() || bass.is_nan() {
            self.current_audio_velocity = 0.0;
            self.density = 0.5;
            return;
        }

        let velocity = self.current_audio_velocity.max((bass * 1.5).min(6.0)) * 0.95;
        self.current_audio_velocity = velocity;
        self.density = (1.0 + velocity) * 0.5;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_decays() {
        let mut bass = BassDensity {
            current_audio_velocity: 1.0,
            density: 1.0,
        };
        bass.apply(&[0.0; 40]);
        assert!((bass.current_audio_velocity - 0.95).abs() < 1e-9);
        assert!((bass.density - 0.975).abs() < 1e-9);
    }

    #[test]
    fn test_loud_bass_is_capped() {
        let mut bass = BassDensity::default();
        bass.apply(&[1.0; 64]);
        assert!((bass.current_audio_velocity - 6.0 * 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_negative_or_short_spectrum() {
        let mut bass = BassDensity::default();
        let mut spectrum = [0.1; 40];
        spectrum[3] = -1.0;
        bass.apply(&spectrum);
        assert_eq!(bass.density, 0.5);

        bass.current_audio_velocity = 2.0;
        bass.apply(&[0.1; 10]);
        assert_eq!(bass.current_audio_velocity, 0.0);
        assert_eq!(bass.density, 0.5);
    }
}
