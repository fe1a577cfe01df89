//! Minimal `.osu` beatmap file reader.
//!
//! Only the sections the beatmap attributes need are decoded: general
//! settings, the slider multiplier, events (background and breaks), timing
//! points and hit objects. Malformed lines are skipped.

use serde::Serialize;

use crate::error::{Error, Result};

/// Breaks shorter than this are not shown by the client.
const MIN_BREAK_DURATION: f64 = 650.0;

pub const OBJECT_CIRCLE: u32 = 1;
pub const OBJECT_SLIDER: u32 = 1 << 1;
pub const OBJECT_SPINNER: u32 = 1 << 3;
pub const OBJECT_HOLD: u32 = 1 << 7;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingPoint {
    pub start_time: f64,
    pub beat_length: f64,
    pub bpm: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct VelocityPoint {
    start_time: f64,
    multiplier: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectPoint {
    pub start_time: f64,
    pub kiai: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakPeriod {
    pub has_effect: bool,
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitObject {
    pub start_time: f64,
    pub end_time: f64,
    pub kind: u32,
}

impl HitObject {
    pub fn is_spinner(&self) -> bool {
        self.kind & OBJECT_SPINNER != 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObjectCounts {
    pub circles: i32,
    pub sliders: i32,
    pub spinners: i32,
    pub holds: i32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OsuFile {
    pub mode: i32,
    pub preview_time: i32,
    pub audio_filename: String,
    pub background: String,
    pub slider_multiplier: f64,
    pub timing_points: Vec<TimingPoint>,
    /// Kiai toggles, without redundant points.
    pub effect_points: Vec<EffectPoint>,
    pub breaks: Vec<BreakPeriod>,
    pub hit_objects: Vec<HitObject>,
    velocity_points: Vec<VelocityPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    General,
    Difficulty,
    Events,
    TimingPoints,
    HitObjects,
    Other,
}

impl Section {
    fn from_header(header: &str) -> Self {
        match header {
            "General" => Self::General,
            "Difficulty" => Self::Difficulty,
            "Events" => Self::Events,
            "TimingPoints" => Self::TimingPoints,
            "HitObjects" => Self::HitObjects,
            _ => Self::Other,
        }
    }
}

impl OsuFile {
    pub fn parse(content: &str) -> Result<Self> {
        let mut lines = content.lines().map(str::trim).filter(|l| !l.is_empty());

        match lines.next() {
            Some(first) if first.trim_start_matches('\u{feff}').starts_with("osu file format") => {}
            _ => return Err(Error::EncodingError("not an osu! beatmap file".to_string())),
        }

        let mut file = OsuFile {
            slider_multiplier: 1.4,
            ..Self::default()
        };
        let mut section = Section::Other;
        let mut kiai = false;
        let mut hit_lines = Vec::new();

        for line in lines {
            if line.starts_with("//") {
                continue;
            }
            if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                section = Section::from_header(header);
                continue;
            }

            match section {
                Section::General => file.parse_general(line),
                Section::Difficulty => {
                    if let Some(("SliderMultiplier", value)) = key_value(line) {
                        file.slider_multiplier = value.parse().unwrap_or(1.4);
                    }
                }
                Section::Events => file.parse_event(line),
                Section::TimingPoints => file.parse_timing_point(line, &mut kiai),
                Section::HitObjects => hit_lines.push(line),
                Section::Other => {}
            }
        }

        // Slider lengths need every timing point, which may come after the objects.
        for line in hit_lines {
            if let Some(object) = file.parse_hit_object(line) {
                file.hit_objects.push(object);
            }
        }
        file.hit_objects
            .sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

        Ok(file)
    }

    fn parse_general(&mut self, line: &str) {
        match key_value(line) {
            Some(("Mode", value)) => self.mode = value.parse().unwrap_or(0),
            Some(("PreviewTime", value)) => self.preview_time = value.parse().unwrap_or(-1),
            Some(("AudioFilename", value)) => self.audio_filename = value.to_string(),
            _ => {}
        }
    }

    fn parse_event(&mut self, line: &str) {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        match fields.as_slice() {
            ["0", _, name, ..] if self.background.is_empty() => {
                self.background = name.trim_matches('"').to_string();
            }
            ["2" | "Break", start, end, ..] => {
                if let (Ok(start), Ok(end)) = (start.parse::<f64>(), end.parse::<f64>()) {
                    self.breaks.push(BreakPeriod {
                        has_effect: end - start >= MIN_BREAK_DURATION,
                        start,
                        end,
                    });
                }
            }
            _ => {}
        }
    }

    fn parse_timing_point(&mut self, line: &str, kiai: &mut bool) {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let (Some(time), Some(beat_length)) = (
            fields.first().and_then(|v| v.parse::<f64>().ok()),
            fields.get(1).and_then(|v| v.parse::<f64>().ok()),
        ) else {
            return;
        };
        let uninherited = fields.get(6).is_none_or(|v| *v != "0");
        let effects = fields.get(7).and_then(|v| v.parse::<u32>().ok()).unwrap_or(0);

        if uninherited {
            if beat_length > 0.0 {
                self.timing_points.push(TimingPoint {
                    start_time: time,
                    beat_length,
                    bpm: 60_000.0 / beat_length,
                });
            }
        } else if beat_length < 0.0 {
            self.velocity_points.push(VelocityPoint {
                start_time: time,
                multiplier: (-100.0 / beat_length).clamp(0.1, 10.0),
            });
        }

        let point_kiai = effects & 1 != 0;
        if point_kiai != *kiai {
            *kiai = point_kiai;
            self.effect_points.push(EffectPoint {
                start_time: time,
                kiai: point_kiai,
            });
        }
    }

    fn parse_hit_object(&self, line: &str) -> Option<HitObject> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let start_time: f64 = fields.get(2)?.parse().ok()?;
        let kind: u32 = fields.get(3)?.parse().ok()?;

        let end_time = if kind & OBJECT_SLIDER != 0 {
            let slides: f64 = fields.get(6).and_then(|v| v.parse().ok()).unwrap_or(1.0);
            let length: f64 = fields.get(7).and_then(|v| v.parse().ok()).unwrap_or(0.0);
            let velocity = 100.0 * self.slider_multiplier * self.velocity_at(start_time);
            if velocity > 0.0 {
                start_time + length / velocity * self.beat_length_at(start_time) * slides
            } else {
                start_time
            }
        } else if kind & OBJECT_SPINNER != 0 {
            fields.get(5).and_then(|v| v.parse().ok()).unwrap_or(start_time)
        } else if kind & OBJECT_HOLD != 0 {
            fields
                .get(5)
                .and_then(|v| v.split(':').next())
                .and_then(|v| v.parse().ok())
                .unwrap_or(start_time)
        } else {
            start_time
        };

        Some(HitObject {
            start_time,
            end_time,
            kind,
        })
    }

    /// Beat length of the timing point active at `time`.
    fn beat_length_at(&self, time: f64) -> f64 {
        self.timing_points
            .iter()
            .rev()
            .find(|p| p.start_time <= time)
            .or(self.timing_points.first())
            .map(|p| p.beat_length)
            .unwrap_or(500.0)
    }

    fn velocity_at(&self, time: f64) -> f64 {
        let timing = self
            .timing_points
            .iter()
            .rev()
            .find(|p| p.start_time <= time)
            .map(|p| p.start_time)
            .unwrap_or(f64::MIN);
        self.velocity_points
            .iter()
            .rev()
            .find(|p| p.start_time <= time && p.start_time >= timing)
            .map(|p| p.multiplier)
            .unwrap_or(1.0)
    }

    pub fn counts(&self) -> ObjectCounts {
        self.hit_objects
            .iter()
            .fold(ObjectCounts::default(), |mut counts, object| {
                if object.kind & OBJECT_CIRCLE != 0 {
                    counts.circles += 1;
                } else if object.kind & OBJECT_SLIDER != 0 {
                    counts.sliders += 1;
                } else if object.kind & OBJECT_SPINNER != 0 {
                    counts.spinners += 1;
                } else if object.kind & OBJECT_HOLD != 0 {
                    counts.holds += 1;
                }
                counts
            })
    }

    pub fn first_object_time(&self) -> f64 {
        self.hit_objects.first().map_or(0.0, |o| o.start_time)
    }

    pub fn first_non_spinner_time(&self) -> f64 {
        self.hit_objects
            .iter()
            .find(|o| !o.is_spinner())
            .map_or(0.0, |o| o.start_time)
    }

    /// End time of the last object.
    pub fn total_length(&self) -> f64 {
        self.hit_objects
            .iter()
            .map(|o| o.end_time)
            .fold(0.0, f64::max)
    }

    /// BPM held the longest, then the lowest and highest BPM.
    pub fn bpm_range(&self) -> (f64, f64, f64) {
        if self.timing_points.is_empty() {
            return (0.0, 0.0, 0.0);
        }

        let last_time = self.total_length().max(
            self.timing_points
                .last()
                .map_or(0.0, |p| p.start_time),
        );
        let mut durations: Vec<(f64, f64)> = Vec::new();
        for (i, point) in self.timing_points.iter().enumerate() {
            if point.start_time > last_time {
                break;
            }
            let end = self
                .timing_points
                .get(i + 1)
                .map_or(last_time, |next| next.start_time);
            let start = if i == 0 { 0.0 } else { point.start_time };
            let duration = (end - start).max(0.0);

            match durations
                .iter_mut()
                .find(|(bpm, _)| (bpm - point.bpm).abs() < 1e-3)
            {
                Some(entry) => entry.1 += duration,
                None => durations.push((point.bpm, duration)),
            }
        }

        let common = durations
            .iter()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map_or(0.0, |(bpm, _)| *bpm);
        let min = self.timing_points.iter().map(|p| p.bpm).fold(f64::MAX, f64::min);
        let max = self.timing_points.iter().map(|p| p.bpm).fold(0.0, f64::max);

        (common, min, max)
    }

    /// BPM of the last non-zero timing point at or before `time`.
    pub fn bpm_at(&self, time: f64) -> f64 {
        self.timing_points
            .iter()
            .rev()
            .find(|p| p.start_time <= time && p.bpm != 0.0)
            .or(self.timing_points.first())
            .map_or(0.0, |p| p.bpm)
    }
}

fn key_value(line: &str) -> Option<(&str, &str)> {
    line.split_once(':').map(|(k, v)| (k.trim(), v.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAP: &str = r#"osu file format v14

[General]
AudioFilename: audio.mp3
PreviewTime: 12000
Mode: 0

[Difficulty]
SliderMultiplier:1.0

[Events]
//Background and Video events
0,0,"bg.jpg",0,0
//Break Periods
2,5000,7000

[TimingPoints]
1000,500,4,2,0,100,1,0
3000,-50,4,2,0,100,0,1
4000,-100,4,2,0,100,0,0
8000,250,4,2,0,100,1,0

[HitObjects]
256,192,500,12,0,2000,0:0:0:0:
256,192,1000,1,0,0:0:0:0:
256,192,3000,2,0,L|300:192,1,100
256,192,9000,1,0,0:0:0:0:
"#;

    #[test]
    fn test_parse_sections() {
        let file = OsuFile::parse(MAP).unwrap();
        assert_eq!(file.mode, 0);
        assert_eq!(file.preview_time, 12000);
        assert_eq!(file.audio_filename, "audio.mp3");
        assert_eq!(file.background, "bg.jpg");
        assert_eq!(file.timing_points.len(), 2);
        assert_eq!(file.hit_objects.len(), 4);
        assert_eq!(
            file.breaks,
            vec![BreakPeriod {
                has_effect: true,
                start: 5000.0,
                end: 7000.0
            }]
        );
    }

    #[test]
    fn test_object_times() {
        let file = OsuFile::parse(MAP).unwrap();
        assert_eq!(file.first_object_time(), 500.0);
        assert_eq!(file.first_non_spinner_time(), 1000.0);
        assert_eq!(file.total_length(), 9000.0);

        let counts = file.counts();
        assert_eq!(counts.circles, 2);
        assert_eq!(counts.sliders, 1);
        assert_eq!(counts.spinners, 1);
    }

    #[test]
    fn test_slider_end_uses_velocity() {
        let file = OsuFile::parse(MAP).unwrap();
        let slider = file.hit_objects[2];
        // 100px at 2x velocity and 500ms beats.
        assert_eq!(slider.end_time, 3250.0);
    }

    #[test]
    fn test_kiai_toggles() {
        let file = OsuFile::parse(MAP).unwrap();
        assert_eq!(
            file.effect_points,
            vec![
                EffectPoint {
                    start_time: 3000.0,
                    kiai: true
                },
                EffectPoint {
                    start_time: 4000.0,
                    kiai: false
                },
            ]
        );
    }

    #[test]
    fn test_bpm_range() {
        let file = OsuFile::parse(MAP).unwrap();
        let (common, min, max) = file.bpm_range();
        assert_eq!(common, 120.0);
        assert_eq!(min, 120.0);
        assert_eq!(max, 240.0);
        assert_eq!(file.bpm_at(8500.0), 240.0);
        assert_eq!(file.bpm_at(0.0), 120.0);
    }

    #[test]
    fn test_rejects_other_files() {
        assert!(OsuFile::parse("hello").is_err());
        assert!(OsuFile::parse("").is_err());
    }
}
