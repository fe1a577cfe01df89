//! Beatmap attributes: difficulty, pp by accuracy, timings and the strain graph.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Instant;

use serde::Serialize;
use tracing::debug;

use super::StateUpdate;
use crate::calculator::{DifficultyCalculator, MapRequest, Performance, ScoreState, without_debuff_mods};
use crate::game::{BreakPeriod, OsuFile, OsuMods, TimingPoint, convert_beatmap_stats};
use crate::instance::{ErrorReporter, ErrorSite};

/// Accuracies the pp table is computed for.
const PP_ACCURACIES: [u32; 11] = [100, 99, 98, 97, 96, 95, 94, 93, 92, 91, 90];

/// Graph value of sections without objects.
const EMPTY_SECTION: f64 = -100.0;

/// Upper bound on padding sections on either side of the strains.
const MAX_PADDING_SECTIONS: usize = 100_000;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapAttributes {
    pub ar: f64,
    pub ar_converted: f64,
    pub cs: f64,
    pub cs_converted: f64,
    pub od: f64,
    pub od_converted: f64,
    pub hp: f64,
    pub hp_converted: f64,
    pub circles: i32,
    pub sliders: i32,
    pub spinners: i32,
    pub holds: i32,
    pub max_combo: i32,
    pub full_stars: f64,
    pub stars: f64,
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

impl MapAttributes {
    /// Judgements a full play produces. Mania on lazer (or with score v2)
    /// judges hold heads and tails separately.
    pub fn max_judgements(&self, mode: i32, lazer: bool, mods: OsuMods) -> i32 {
        if mode == 3 && (lazer || mods.contains(OsuMods::SCORE_V2)) {
            self.circles + 2 * self.sliders
        } else {
            self.circles + self.sliders + self.spinners + self.holds
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentAttributes {
    pub stars: f64,
    pub pp: f64,
    pub max_achieved: f64,
    pub max_achievable: f64,
    #[serde(rename = "fcPP")]
    pub fc_pp: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PpBreakdown {
    pub pp_accuracy: f64,
    pub pp_aim: f64,
    pub pp_difficulty: f64,
    pub pp_flashlight: f64,
    pub pp_speed: f64,
}

impl From<&Performance> for PpBreakdown {
    fn from(performance: &Performance) -> Self {
        Self {
            pp_accuracy: performance.pp_accuracy,
            pp_aim: performance.pp_aim,
            pp_difficulty: performance.pp_difficulty,
            pp_flashlight: performance.pp_flashlight,
            pp_speed: performance.pp_speed,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timings {
    pub first_obj: i32,
    pub first_non_spinner_obj: i32,
    pub full: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KiaiPoint {
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphSeries {
    pub name: String,
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Graph {
    pub series: Vec<GraphSeries>,
    pub xaxis: Vec<f64>,
}

/// Where the selected map lives and how it is played.
#[derive(Debug, Clone, Copy)]
pub struct MapSource<'a> {
    pub songs_folder: &'a str,
    pub folder: &'a str,
    pub filename: &'a str,
    pub ar: f32,
    pub cs: f32,
    pub od: f32,
    pub hp: f32,
    pub mode: i32,
    pub mods: OsuMods,
    pub lazer: bool,
    pub calculate_pp: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeatmapPp {
    pub pp_acc: BTreeMap<u32, f64>,
    pub calculated_map_attributes: MapAttributes,
    pub curr_attributes: CurrentAttributes,
    #[serde(rename = "currPPAttributes")]
    pub curr_pp_attributes: PpBreakdown,
    #[serde(rename = "fcPPAttributes")]
    pub fc_pp_attributes: PpBreakdown,
    pub timings: Timings,
    pub timing_points: Vec<TimingPoint>,
    pub breaks: Vec<BreakPeriod>,
    pub kiais: Vec<KiaiPoint>,
    pub strains: Vec<f64>,
    pub strains_all: Graph,
    #[serde(rename = "commonBPM")]
    pub common_bpm: i32,
    #[serde(rename = "minBPM")]
    pub min_bpm: i32,
    #[serde(rename = "maxBPM")]
    pub max_bpm: i32,
    #[serde(rename = "realtimeBPM")]
    pub realtime_bpm: i32,
    pub is_kiai: bool,
    pub is_break: bool,
    pub preview_time: i32,
    pub clock_rate: f64,
    pub mode: i32,
    /// Background named by the map file itself.
    pub background: String,
    #[serde(skip)]
    content: Option<String>,
    #[serde(skip)]
    file: Option<OsuFile>,
}

impl Default for BeatmapPp {
    fn default() -> Self {
        Self {
            pp_acc: PP_ACCURACIES.iter().map(|&acc| (acc, 0.0)).collect(),
            calculated_map_attributes: MapAttributes::default(),
            curr_attributes: CurrentAttributes::default(),
            curr_pp_attributes: PpBreakdown::default(),
            fc_pp_attributes: PpBreakdown::default(),
            timings: Timings::default(),
            timing_points: Vec::new(),
            breaks: Vec::new(),
            kiais: Vec::new(),
            strains: Vec::new(),
            strains_all: Graph::default(),
            common_bpm: 0,
            min_bpm: 0,
            max_bpm: 0,
            realtime_bpm: 0,
            is_kiai: false,
            is_break: false,
            preview_time: 0,
            clock_rate: 1.0,
            mode: 0,
            background: String::new(),
            content: None,
            file: None,
        }
    }
}

pub(crate) fn fix_decimals(value: f64) -> f64 {
    if value.is_finite() {
        (value * 100.0).round() / 100.0
    } else {
        0.0
    }
}

impl BeatmapPp {
    pub fn is_loaded(&self) -> bool {
        self.content.is_some()
    }

    /// The loaded map with the given play settings, ready for the calculator.
    pub fn map_request(&self, mode: i32, mods: OsuMods, lazer: bool) -> Option<MapRequest<'_>> {
        self.content.as_deref().map(|content| MapRequest {
            content,
            mode,
            mods: without_debuff_mods(mods),
            lazer,
        })
    }

    /// Load the selected map and compute its attributes.
    pub fn update_map_metadata(
        &mut self,
        calculator: &dyn DifficultyCalculator,
        reporter: &mut ErrorReporter,
        source: &MapSource<'_>,
    ) -> StateUpdate {
        let started = Instant::now();

        if source.folder == "." && !source.lazer {
            debug!("Skipping osu! music theme file");
            return StateUpdate::Done;
        }
        if source.filename.is_empty() {
            debug!("Skipping map without a file name");
            return StateUpdate::Done;
        }
        if source.folder.is_empty() && !source.lazer {
            return StateUpdate::NotReady;
        }

        let path = Path::new(source.songs_folder)
            .join(source.folder)
            .join(source.filename);
        if !path.is_file() {
            return StateUpdate::NotReady;
        }
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                debug!("Can't read map {}: {}", path.display(), e);
                return StateUpdate::NotReady;
            }
        };

        let file = match OsuFile::parse(&content) {
            Ok(file) => file,
            Err(e) => {
                reporter.report(ErrorSite::BeatmapTimings, &e);
                return StateUpdate::Done;
            }
        };
        reporter.reset(ErrorSite::BeatmapTimings);

        // Only standard maps convert to other rulesets.
        let mode = if file.mode == 0 { source.mode } else { file.mode };
        let map = MapRequest {
            content: &content,
            mode,
            mods: without_debuff_mods(source.mods),
            lazer: source.lazer,
        };

        let difficulty = match calculator.difficulty(&map) {
            Ok(difficulty) => difficulty,
            Err(e) => {
                reporter.report(ErrorSite::BeatmapMetadata, &format!("{:#}", e));
                return StateUpdate::Done;
            }
        };
        debug!("Opened {} in {:?}", path.display(), started.elapsed());

        if source.calculate_pp {
            let mut pp_acc = BTreeMap::new();
            for acc in PP_ACCURACIES {
                match calculator.performance(&map, &ScoreState::with_accuracy(f64::from(acc))) {
                    Ok(performance) => {
                        pp_acc.insert(acc, fix_decimals(performance.pp));
                    }
                    Err(e) => {
                        reporter.report(ErrorSite::BeatmapMetadata, &format!("{:#}", e));
                        return StateUpdate::Done;
                    }
                }
            }
            self.pp_acc = pp_acc;
        }

        self.clock_rate = source.mods.rate();
        let (common, min, max) = file.bpm_range();
        self.common_bpm = (common * self.clock_rate).round() as i32;
        self.min_bpm = (min * self.clock_rate).round() as i32;
        self.max_bpm = (max * self.clock_rate).round() as i32;

        self.preview_time = file.preview_time;
        self.background = file.background.clone();
        self.breaks = file.breaks.clone();
        self.timing_points = file.timing_points.clone();
        self.timings = Timings {
            first_obj: file.first_object_time().round() as i32,
            first_non_spinner_obj: file.first_non_spinner_time().round() as i32,
            full: file.total_length().round() as i32,
        };
        self.mode = mode;
        self.kiais = kiai_intervals(&file);

        let counts = file.counts();
        let converted = convert_beatmap_stats(
            f64::from(source.ar),
            f64::from(source.cs),
            f64::from(source.od),
            f64::from(source.hp),
            mode,
            source.mods,
        );
        self.calculated_map_attributes = MapAttributes {
            ar: f64::from(source.ar),
            ar_converted: converted.ar,
            cs: f64::from(source.cs),
            cs_converted: converted.cs,
            od: f64::from(source.od),
            od_converted: converted.od,
            hp: f64::from(source.hp),
            hp_converted: converted.hp,
            circles: counts.circles,
            sliders: counts.sliders,
            spinners: counts.spinners,
            holds: counts.holds,
            max_combo: difficulty.max_combo,
            full_stars: difficulty.stars,
            stars: difficulty.stars,
            aim: difficulty.aim,
            speed: difficulty.speed,
            flashlight: difficulty.flashlight,
            slider_factor: difficulty.slider_factor,
            stamina: difficulty.stamina,
            rhythm: difficulty.rhythm,
            color: difficulty.color,
            reading: difficulty.reading,
            hit_window: difficulty.hit_window,
        };

        self.content = Some(content);
        self.file = Some(file);

        debug!("Map attributes ready in {:?}", started.elapsed());
        reporter.reset(ErrorSite::BeatmapMetadata);
        StateUpdate::Done
    }

    /// Rebuild the strain graph, padded to cover the whole track.
    pub fn update_graph(
        &mut self,
        calculator: &dyn DifficultyCalculator,
        reporter: &mut ErrorReporter,
        mods: OsuMods,
        mp3_length: f64,
        lazer: bool,
    ) {
        let Some(map) = self.map_request(self.mode, mods, lazer) else {
            return;
        };
        let strains = match calculator.strains(&map) {
            Ok(strains) => strains,
            Err(e) => {
                reporter.report(ErrorSite::BeatmapGraph, &format!("{:#}", e));
                return;
            }
        };

        let Some(primary) = strains.series.first() else {
            self.strains.clear();
            self.strains_all = Graph::default();
            return;
        };
        let section = strains.section_length;
        if section <= 0.0 {
            self.strains.clear();
            self.strains_all = Graph::default();
            return;
        }

        let amount = primary.values.len();
        let first_object = f64::from(self.timings.first_non_spinner_obj) / self.clock_rate;
        let last_object = first_object + amount as f64 * section;
        let track_length = mp3_length / self.clock_rate;

        // The track length is read from memory and can be garbage.
        let left = ((first_object / section).floor().max(0.0) as usize).min(MAX_PADDING_SECTIONS);
        let right = if track_length >= last_object {
            (((track_length - last_object) / section).ceil() as usize).min(MAX_PADDING_SECTIONS)
        } else {
            0
        };

        let pad = |values: &[f64], fill: f64| {
            let mut data = vec![fill; left];
            data.extend_from_slice(values);
            data.extend(std::iter::repeat_n(fill, right));
            data
        };

        let series = strains
            .series
            .iter()
            .map(|s| GraphSeries {
                name: s.name.clone(),
                data: pad(&s.values, EMPTY_SECTION),
            })
            .collect();

        let mut xaxis = Vec::with_capacity(left + amount + right);
        xaxis.extend((0..left).map(|i| i as f64 * section));
        xaxis.extend((0..amount).map(|i| first_object + i as f64 * section));
        xaxis.extend((0..right).map(|i| last_object + i as f64 * section));

        self.strains = pad(&primary.values, 0.0);
        self.strains_all = Graph { series, xaxis };
        reporter.reset(ErrorSite::BeatmapGraph);
    }

    /// Stars and pp of the objects before the editor cursor.
    pub fn update_editor_pp(
        &mut self,
        calculator: &dyn DifficultyCalculator,
        reporter: &mut ErrorReporter,
        play_time: i32,
        lazer: bool,
    ) {
        let (Some(file), Some(map)) = (
            self.file.as_ref(),
            self.map_request(self.mode, OsuMods::NONE, lazer),
        ) else {
            return;
        };

        let passed = file
            .hit_objects
            .iter()
            .filter(|o| o.start_time <= f64::from(play_time))
            .count() as i32;

        let score = ScoreState {
            passed_objects: Some(passed),
            ..ScoreState::default()
        };
        match calculator.performance(&map, &score) {
            Ok(performance) => {
                self.curr_attributes.pp = performance.pp;
                self.curr_attributes.stars = if passed == 0 { 0.0 } else { performance.stars };
                reporter.reset(ErrorSite::BeatmapEditorPp);
            }
            Err(e) => reporter.report(ErrorSite::BeatmapEditorPp, &format!("{:#}", e)),
        }
    }

    /// Realtime BPM, kiai and break flags at `time`.
    pub fn update_events_status(&mut self, time: i32, rate: f64) {
        let Some(file) = self.file.as_ref() else {
            return;
        };
        let time = f64::from(time);

        self.realtime_bpm = (file.bpm_at(time) * rate).round() as i32;
        self.is_kiai = self.kiais.iter().any(|k| time >= k.start && time <= k.end);
        self.is_break = self.breaks.iter().any(|b| time >= b.start && time <= b.end);
    }

    pub fn update_current_attributes(&mut self, stars: f64, pp: f64) {
        let max_achieved = pp.max(self.curr_attributes.max_achieved);
        if fix_decimals(self.curr_attributes.pp) != fix_decimals(pp) {
            debug!(
                "maxAchieved -> {:.2} | currentPP -> {:.2} | stars -> {:.2}",
                self.curr_attributes.max_achieved, pp, stars
            );
        }

        self.curr_attributes.stars = stars;
        self.curr_attributes.pp = pp;
        self.curr_attributes.max_achieved = max_achieved;
    }

    pub fn set_current_breakdown(&mut self, performance: &Performance) {
        self.curr_pp_attributes = performance.into();
    }

    pub fn set_fc_breakdown(&mut self, performance: &Performance) {
        self.fc_pp_attributes = performance.into();
    }

    /// Clear the live pp of the current attempt.
    pub fn reset_attributes(&mut self) {
        self.curr_attributes = CurrentAttributes {
            fc_pp: self.pp_acc.get(&100).copied().unwrap_or(0.0),
            ..CurrentAttributes::default()
        };
        self.curr_pp_attributes = PpBreakdown::default();
        self.fc_pp_attributes = PpBreakdown::default();
    }
}

/// Kiai intervals from the kiai toggles. A kiai still open at the end of the
/// map lasts until the last object.
fn kiai_intervals(file: &OsuFile) -> Vec<KiaiPoint> {
    let mut kiais: Vec<KiaiPoint> = Vec::new();
    for point in &file.effect_points {
        match kiais.last_mut() {
            Some(last) if !point.kiai => last.end = point.start_time,
            _ if point.kiai => kiais.push(KiaiPoint {
                start: point.start_time,
                end: -1.0,
            }),
            _ => {}
        }
    }
    if let Some(last) = kiais.last_mut().filter(|k| k.end < 0.0) {
        last.end = file.total_length();
    }
    kiais
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::{Difficulty, StrainSeries, Strains};
    use crate::game::ClientType;

    const MAP: &str = "osu file format v14

[General]
PreviewTime: 5000
Mode: 0

[Events]
0,0,\"bg.png\",0,0
2,4000,6000

[TimingPoints]
0,500,4,2,0,100,1,0
2000,-100,4,2,0,100,0,1
3000,-100,4,2,0,100,0,0

[HitObjects]
256,192,1000,1,0,0:0:0:0:
256,192,2000,1,0,0:0:0:0:
256,192,3000,1,0,0:0:0:0:
256,192,8000,1,0,0:0:0:0:
";

    /// Calculator with fixed answers; pp grows with the requested accuracy
    /// and with passed objects.
    struct FixedCalculator;

    impl DifficultyCalculator for FixedCalculator {
        fn difficulty(&self, _map: &MapRequest<'_>) -> anyhow::Result<Difficulty> {
            Ok(Difficulty {
                stars: 5.5,
                max_combo: 4,
                ..Difficulty::default()
            })
        }

        fn strains(&self, _map: &MapRequest<'_>) -> anyhow::Result<Strains> {
            Ok(Strains {
                section_length: 400.0,
                series: vec![StrainSeries {
                    name: "aim".to_string(),
                    values: vec![1.0, 2.0, 3.0],
                }],
            })
        }

        fn performance(&self, _map: &MapRequest<'_>, score: &ScoreState) -> anyhow::Result<Performance> {
            let pp = match (score.accuracy, score.passed_objects) {
                (Some(acc), _) => acc * 2.0,
                (None, Some(passed)) => f64::from(passed) * 10.0,
                _ => 100.0,
            };
            Ok(Performance {
                stars: 5.5,
                pp,
                ..Performance::default()
            })
        }
    }

    fn loaded() -> (BeatmapPp, tempfile::TempDir) {
        let songs = tempfile::tempdir().unwrap();
        let folder = songs.path().join("1 Artist - Title");
        fs::create_dir(&folder).unwrap();
        fs::write(folder.join("map.osu"), MAP).unwrap();

        let mut beatmap = BeatmapPp::default();
        let mut reporter = ErrorReporter::new(ClientType::Stable, 1);
        let songs_folder = songs.path().to_string_lossy().into_owned();
        let update = beatmap.update_map_metadata(
            &FixedCalculator,
            &mut reporter,
            &MapSource {
                songs_folder: &songs_folder,
                folder: "1 Artist - Title",
                filename: "map.osu",
                ar: 9.0,
                cs: 4.0,
                od: 8.0,
                hp: 5.0,
                mode: 0,
                mods: OsuMods::HARD_ROCK,
                lazer: false,
                calculate_pp: true,
            },
        );
        assert_eq!(update, StateUpdate::Done);
        (beatmap, songs)
    }

    #[test]
    fn test_metadata_from_file() {
        let (beatmap, _songs) = loaded();
        assert!(beatmap.is_loaded());
        assert_eq!(beatmap.pp_acc[&100], 200.0);
        assert_eq!(beatmap.pp_acc[&90], 180.0);
        assert_eq!(beatmap.timings.first_obj, 1000);
        assert_eq!(beatmap.timings.full, 8000);
        assert_eq!(beatmap.common_bpm, 120);
        assert_eq!(beatmap.preview_time, 5000);
        assert_eq!(beatmap.background, "bg.png");
        assert_eq!(beatmap.calculated_map_attributes.circles, 4);
        assert_eq!(beatmap.calculated_map_attributes.max_combo, 4);
        assert_eq!(beatmap.calculated_map_attributes.cs_converted, 5.2);
        assert_eq!(beatmap.kiais, vec![KiaiPoint { start: 2000.0, end: 3000.0 }]);
    }

    #[test]
    fn test_missing_file_not_ready() {
        let songs = tempfile::tempdir().unwrap();
        let songs_folder = songs.path().to_string_lossy().into_owned();
        let mut beatmap = BeatmapPp::default();
        let mut reporter = ErrorReporter::new(ClientType::Stable, 1);
        let update = beatmap.update_map_metadata(
            &FixedCalculator,
            &mut reporter,
            &MapSource {
                songs_folder: &songs_folder,
                folder: "missing",
                filename: "map.osu",
                ar: 0.0,
                cs: 0.0,
                od: 0.0,
                hp: 0.0,
                mode: 0,
                mods: OsuMods::NONE,
                lazer: false,
                calculate_pp: true,
            },
        );
        assert_eq!(update, StateUpdate::NotReady);
        assert!(!beatmap.is_loaded());
    }

    #[test]
    fn test_graph_padding() {
        let (mut beatmap, _songs) = loaded();
        let mut reporter = ErrorReporter::new(ClientType::Stable, 1);
        // First object at 1000ms, sections of 400ms, track of 3000ms.
        beatmap.update_graph(&FixedCalculator, &mut reporter, OsuMods::NONE, 3000.0, false);

        let graph = &beatmap.strains_all;
        assert_eq!(graph.series[0].data, vec![-100.0, -100.0, 1.0, 2.0, 3.0, -100.0, -100.0]);
        assert_eq!(beatmap.strains, vec![0.0, 0.0, 1.0, 2.0, 3.0, 0.0, 0.0]);
        assert_eq!(graph.xaxis, vec![0.0, 400.0, 1000.0, 1400.0, 1800.0, 2200.0, 2600.0]);
    }

    #[test]
    fn test_graph_padding_is_bounded() {
        let (mut beatmap, _songs) = loaded();
        let mut reporter = ErrorReporter::new(ClientType::Stable, 1);
        beatmap.update_graph(&FixedCalculator, &mut reporter, OsuMods::NONE, f64::MAX, false);

        let graph = &beatmap.strains_all;
        assert_eq!(graph.series[0].data.len(), 2 + 3 + MAX_PADDING_SECTIONS);
        assert_eq!(graph.xaxis.len(), graph.series[0].data.len());
    }

    #[test]
    fn test_events_status() {
        let (mut beatmap, _songs) = loaded();
        beatmap.update_events_status(2500, 1.5);
        assert!(beatmap.is_kiai);
        assert!(!beatmap.is_break);
        assert_eq!(beatmap.realtime_bpm, 180);

        beatmap.update_events_status(5000, 1.0);
        assert!(!beatmap.is_kiai);
        assert!(beatmap.is_break);
    }

    #[test]
    fn test_editor_pp_counts_passed_objects() {
        let (mut beatmap, _songs) = loaded();
        let mut reporter = ErrorReporter::new(ClientType::Stable, 1);

        beatmap.update_editor_pp(&FixedCalculator, &mut reporter, 2500, false);
        assert_eq!(beatmap.curr_attributes.pp, 20.0);
        assert_eq!(beatmap.curr_attributes.stars, 5.5);

        beatmap.update_editor_pp(&FixedCalculator, &mut reporter, 0, false);
        assert_eq!(beatmap.curr_attributes.stars, 0.0);
    }

    #[test]
    fn test_current_attributes_track_max() {
        let mut beatmap = BeatmapPp::default();
        beatmap.update_current_attributes(3.0, 120.0);
        beatmap.update_current_attributes(3.1, 80.0);
        assert_eq!(beatmap.curr_attributes.pp, 80.0);
        assert_eq!(beatmap.curr_attributes.max_achieved, 120.0);

        beatmap.pp_acc.insert(100, 250.0);
        beatmap.reset_attributes();
        assert_eq!(beatmap.curr_attributes.max_achieved, 0.0);
        assert_eq!(beatmap.curr_attributes.fc_pp, 250.0);
    }

    #[test]
    fn test_max_judgements() {
        let attributes = MapAttributes {
            circles: 10,
            sliders: 5,
            spinners: 1,
            holds: 2,
            ..MapAttributes::default()
        };
        assert_eq!(attributes.max_judgements(0, false, OsuMods::NONE), 18);
        assert_eq!(attributes.max_judgements(3, true, OsuMods::NONE), 20);
        assert_eq!(attributes.max_judgements(3, false, OsuMods::SCORE_V2), 20);
    }
}
