//! Score math that does not need the difficulty calculator.

use chrono::{DateTime, Utc};

use super::enums::{ClientType, Grade, Ruleset};
use super::mods::OsuMods;
use super::score::Statistics;

/// Accuracy in percent (0..=100). Zero judgements give 0.
pub fn calculate_accuracy(client: ClientType, mode: i32, mods: OsuMods, hits: &Statistics) -> f64 {
    // Counts come straight from memory and may be garbage mid-transition.
    let [perfect, great, good, ok, meh, miss] =
        [hits.perfect, hits.great, hits.good, hits.ok, hits.meh, hits.miss].map(i64::from);

    let (numerator, denominator) = match Ruleset::from_raw(mode) {
        Some(Ruleset::Osu) => (6 * great + 2 * ok + meh, 6 * (great + ok + meh + miss)),
        Some(Ruleset::Taiko) => (2 * great + ok, 2 * (great + ok + miss)),
        Some(Ruleset::Fruits) => (great + ok + meh, great + ok + meh + good + miss),
        Some(Ruleset::Mania) => {
            let total = perfect + great + good + ok + meh + miss;
            let perfect_weight =
                if client == ClientType::Lazer || mods.contains(OsuMods::SCORE_V2) {
                    61
                } else {
                    60
                };
            (
                perfect_weight * perfect + 60 * great + 40 * good + 20 * ok + 10 * meh,
                total * perfect_weight,
            )
        }
        None => (0, 0),
    };

    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64 * 100.0
}

/// Grade for `accuracy` (percent) and judgements.
///
/// Stable grades osu! and taiko by the ratio of 300s; everything else is
/// graded on accuracy thresholds.
pub fn calculate_grade(
    client: ClientType,
    mode: i32,
    mods: OsuMods,
    accuracy: f64,
    hits: &Statistics,
) -> Grade {
    let silver = mods.is_silver();
    let top = |silver_grade: Grade, grade: Grade| if silver { silver_grade } else { grade };
    let accuracy = accuracy / 100.0;
    let Some(ruleset) = Ruleset::from_raw(mode) else {
        return Grade::None;
    };

    if client == ClientType::Lazer {
        let thresholds: [f64; 4] = match ruleset {
            Ruleset::Fruits => [0.98, 0.94, 0.9, 0.85],
            _ => [0.95, 0.9, 0.8, 0.7],
        };
        let s_allowed = !matches!(ruleset, Ruleset::Osu | Ruleset::Taiko) || hits.miss == 0;

        return if accuracy >= 1.0 {
            top(Grade::XH, Grade::X)
        } else if accuracy >= thresholds[0] && s_allowed {
            top(Grade::SH, Grade::S)
        } else if accuracy >= thresholds[1] {
            Grade::A
        } else if accuracy >= thresholds[2] {
            Grade::B
        } else if accuracy >= thresholds[3] {
            Grade::C
        } else {
            Grade::D
        };
    }

    match ruleset {
        Ruleset::Osu | Ruleset::Taiko => {
            let total = [hits.great, hits.ok, hits.meh, hits.miss]
                .into_iter()
                .map(i64::from)
                .sum::<i64>();
            if total == 0 {
                return top(Grade::XH, Grade::X);
            }

            let r300 = f64::from(hits.great) / total as f64;
            let r50 = f64::from(hits.meh) / total as f64;

            if r300 >= 1.0 {
                top(Grade::XH, Grade::X)
            } else if r300 > 0.9 && r50 < 0.01 && hits.miss == 0 {
                top(Grade::SH, Grade::S)
            } else if (r300 > 0.8 && hits.miss == 0) || r300 > 0.9 {
                Grade::A
            } else if (r300 > 0.7 && hits.miss == 0) || r300 > 0.8 {
                Grade::B
            } else if r300 > 0.6 {
                Grade::C
            } else {
                Grade::D
            }
        }
        Ruleset::Fruits | Ruleset::Mania => {
            let thresholds: [f64; 4] = if ruleset == Ruleset::Fruits {
                [0.98, 0.94, 0.9, 0.85]
            } else {
                [0.95, 0.9, 0.8, 0.7]
            };

            if accuracy >= 1.0 {
                top(Grade::XH, Grade::X)
            } else if accuracy > thresholds[0] {
                top(Grade::SH, Grade::S)
            } else if accuracy > thresholds[1] {
                Grade::A
            } else if accuracy > thresholds[2] {
                Grade::B
            } else if accuracy > thresholds[3] {
                Grade::C
            } else {
                Grade::D
            }
        }
    }
}

/// Number of judged objects so far.
pub fn passed_objects(mode: i32, hits: &Statistics) -> i32 {
    let sum = |counts: &[i32]| counts.iter().fold(0i32, |sum, &count| sum.saturating_add(count));
    match Ruleset::from_raw(mode) {
        Some(Ruleset::Taiko) => sum(&[hits.great, hits.ok, hits.miss]),
        Some(Ruleset::Fruits) => sum(&[hits.great, hits.ok, hits.meh, hits.miss, hits.good]),
        Some(Ruleset::Mania) => sum(&[hits.perfect, hits.great, hits.good, hits.ok, hits.meh, hits.miss]),
        _ => sum(&[hits.great, hits.ok, hits.meh, hits.miss]),
    }
}

/// Unstable rate of the recorded hit errors, adjusted for speed mods.
pub fn unstable_rate(hit_errors: &[i32], mods: OsuMods) -> f64 {
    if hit_errors.is_empty() {
        return 0.0;
    }

    let count = hit_errors.len() as f64;
    let average = hit_errors.iter().map(|&e| f64::from(e)).sum::<f64>() / count;
    let variance = hit_errors
        .iter()
        .map(|&e| (f64::from(e) - average).powi(2))
        .sum::<f64>()
        / count;
    let base = variance.sqrt() * 10.0;

    if mods.contains(OsuMods::DOUBLE_TIME) {
        base / 1.5
    } else if mods.contains(OsuMods::HALF_TIME) {
        base * 1.33
    } else {
        base
    }
}

const TICKS_MASK: i32 = 0x3FFF_FFFF;
const EPOCH_TICKS: i64 = 621_355_968_000_000_000;
const TICKS_PER_MILLISECOND: i64 = 10_000;

/// Decode a .NET `DateTime` stored as its two raw 32-bit halves.
pub fn net_date_from_binary(hi: i32, lo: i32) -> Option<DateTime<Utc>> {
    let ticks = (i64::from(hi & TICKS_MASK) << 32) | i64::from(lo as u32);
    let milliseconds = (ticks - EPOCH_TICKS) / TICKS_PER_MILLISECOND;
    DateTime::from_timestamp_millis(milliseconds)
}

/// Difficulty values after EZ/HR and the clock rate are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConvertedStats {
    pub ar: f64,
    pub cs: f64,
    pub od: f64,
    pub hp: f64,
}

pub fn convert_beatmap_stats(ar: f64, cs: f64, od: f64, hp: f64, mode: i32, mods: OsuMods) -> ConvertedStats {
    let hard_rock = mods.contains(OsuMods::HARD_ROCK);
    let multiplier = if hard_rock {
        1.4
    } else if mods.contains(OsuMods::EASY) {
        0.5
    } else {
        1.0
    };
    let scaled = |value: f64| {
        if hard_rock {
            (value * multiplier).min(10.0)
        } else {
            value * multiplier
        }
    };

    let mut converted = ConvertedStats {
        ar: scaled(ar),
        od: scaled(od),
        cs: if hard_rock { (cs * 1.3).min(10.0) } else { cs * multiplier },
        hp: scaled(hp),
    };

    let rate = mods.rate();
    if rate != 1.0 {
        converted.ar = if converted.ar <= 5.0 {
            15.0 - (15.0 - converted.ar) / rate
        } else {
            13.0 - (13.0 - converted.ar) / rate
        };

        match Ruleset::from_raw(mode) {
            Some(Ruleset::Osu) => converted.od = 13.33 - (13.33 - converted.od) / rate,
            Some(Ruleset::Taiko) => {
                converted.od = 16.666_666_666_666_67 - (16.666_666_666_666_67 - converted.od) / rate
            }
            _ => {}
        }
    }

    converted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hits(great: i32, ok: i32, meh: i32, miss: i32) -> Statistics {
        Statistics {
            great,
            ok,
            meh,
            miss,
            ..Statistics::default()
        }
    }

    #[test]
    fn test_accuracy_all_300_osu() {
        let acc = calculate_accuracy(ClientType::Stable, 0, OsuMods::NONE, &hits(100, 0, 0, 0));
        assert!((acc - 100.0).abs() < 1e-9);
        assert_eq!(format!("{:.2}", acc), "100.00");
    }

    #[test]
    fn test_accuracy_mixed_osu() {
        // (6*90 + 2*10) / (6*100)
        let acc = calculate_accuracy(ClientType::Stable, 0, OsuMods::NONE, &hits(90, 10, 0, 0));
        assert!((acc - 93.333_333).abs() < 1e-3);
    }

    #[test]
    fn test_accuracy_empty_is_zero() {
        for mode in 0..4 {
            assert_eq!(
                calculate_accuracy(ClientType::Stable, mode, OsuMods::NONE, &Statistics::default()),
                0.0
            );
        }
    }

    #[test]
    fn test_garbage_counts_do_not_overflow() {
        let stats = hits(400_000_000, 0, 0, 0);
        for mode in 0..4 {
            let acc = calculate_accuracy(ClientType::Lazer, mode, OsuMods::NONE, &stats);
            assert!(acc.is_finite());
        }
        let acc = calculate_accuracy(ClientType::Lazer, 0, OsuMods::NONE, &stats);
        assert!((acc - 100.0).abs() < 1e-9);

        let stats = hits(i32::MAX, i32::MAX, i32::MAX, i32::MAX);
        assert_eq!(
            calculate_grade(ClientType::Stable, 0, OsuMods::NONE, 0.0, &stats),
            Grade::D
        );
        assert_eq!(passed_objects(0, &stats), i32::MAX);
    }

    #[test]
    fn test_accuracy_mania_weights() {
        let stats = Statistics {
            perfect: 10,
            ..Statistics::default()
        };
        let stable = calculate_accuracy(ClientType::Stable, 3, OsuMods::NONE, &stats);
        let lazer = calculate_accuracy(ClientType::Lazer, 3, OsuMods::NONE, &stats);
        assert_eq!(stable, 100.0);
        assert_eq!(lazer, 100.0);

        let stats = Statistics {
            perfect: 1,
            great: 1,
            ..Statistics::default()
        };
        let lazer = calculate_accuracy(ClientType::Lazer, 3, OsuMods::NONE, &stats);
        assert!((lazer - 121.0 / 122.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_stable_grade_by_ratio() {
        let g = |s: Statistics| calculate_grade(ClientType::Stable, 0, OsuMods::NONE, 0.0, &s);
        assert_eq!(g(hits(100, 0, 0, 0)), Grade::X);
        assert_eq!(g(hits(95, 5, 0, 0)), Grade::S);
        assert_eq!(g(hits(95, 4, 0, 1)), Grade::A);
        assert_eq!(g(hits(50, 50, 0, 0)), Grade::D);
        assert_eq!(g(Statistics::default()), Grade::X);
    }

    #[test]
    fn test_silver_grades() {
        let grade = calculate_grade(ClientType::Stable, 0, OsuMods::HIDDEN, 100.0, &hits(10, 0, 0, 0));
        assert_eq!(grade, Grade::XH);
        let grade = calculate_grade(ClientType::Lazer, 3, OsuMods::FLASHLIGHT, 96.0, &hits(10, 1, 0, 0));
        assert_eq!(grade, Grade::SH);
    }

    #[test]
    fn test_lazer_grade_requires_no_miss_for_s() {
        let grade = calculate_grade(ClientType::Lazer, 0, OsuMods::NONE, 96.0, &hits(95, 0, 0, 1));
        assert_eq!(grade, Grade::A);
        let grade = calculate_grade(ClientType::Lazer, 0, OsuMods::NONE, 96.0, &hits(95, 5, 0, 0));
        assert_eq!(grade, Grade::S);
    }

    #[test]
    fn test_unstable_rate() {
        assert_eq!(unstable_rate(&[], OsuMods::NONE), 0.0);
        // mean 0, variance 100 -> 10 * 10
        let ur = unstable_rate(&[-10, 10, -10, 10], OsuMods::NONE);
        assert!((ur - 100.0).abs() < 1e-9);
        let ur = unstable_rate(&[-10, 10, -10, 10], OsuMods::DOUBLE_TIME);
        assert!((ur - 100.0 / 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_net_date_from_binary() {
        // 2024-01-01T00:00:00Z = 638396640000000000 ticks
        let ticks: i64 = 638_396_640_000_000_000;
        let hi = (ticks >> 32) as i32 | 0x4000_0000;
        let lo = ticks as u32 as i32;
        let date = net_date_from_binary(hi, lo).unwrap();
        assert_eq!(date.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_convert_hard_rock_double_time() {
        let stats = convert_beatmap_stats(9.0, 4.0, 8.0, 6.0, 0, OsuMods::HARD_ROCK | OsuMods::DOUBLE_TIME);
        assert_eq!(stats.cs, 5.2);
        assert!((stats.hp - 8.4).abs() < 1e-9);
        // AR 10 after HR, then 13 - 3/1.5
        assert!((stats.ar - 11.0).abs() < 1e-9);
        assert!((stats.od - (13.33 - (13.33 - 10.0) / 1.5)).abs() < 1e-9);
    }

    #[test]
    fn test_convert_easy() {
        let stats = convert_beatmap_stats(8.0, 4.0, 6.0, 5.0, 1, OsuMods::EASY);
        assert_eq!(stats, ConvertedStats { ar: 4.0, cs: 2.0, od: 3.0, hp: 2.5 });
    }

    #[test]
    fn test_passed_objects() {
        let stats = Statistics {
            perfect: 1,
            great: 2,
            good: 3,
            ok: 4,
            meh: 5,
            miss: 6,
            ..Statistics::default()
        };
        assert_eq!(passed_objects(0, &stats), 17);
        assert_eq!(passed_objects(1, &stats), 12);
        assert_eq!(passed_objects(2, &stats), 20);
        assert_eq!(passed_objects(3, &stats), 21);
    }
}
