//! JSON answers built from one instance's snapshots.
//!
//! `v1` keeps the legacy key layout, `v2` the structured one. Both are plain
//! `serde_json::Value`s so the caller can attach the tournament aggregate.

use std::path::Path;

use serde::Serialize;
use serde_json::{Value, json};

use super::InstanceCore;
use crate::game::{
    BanchoStatus, BeatmapStatus, ClientType, GameState, LeaderboardPlayer, OsuMods, Ruleset, Statistics,
    calculate_grade,
};
use crate::states::{Gameplay, States, TourneyUser, fix_decimals};

/// Answer for when no client is attached.
pub fn not_ready() -> Value {
    json!({ "error": "not_ready" })
}

fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_default()
}

fn mode_name(mode: i32) -> &'static str {
    Ruleset::from_raw(mode).map(|r| r.name()).unwrap_or("")
}

fn numbered(number: i32, name: &str) -> Value {
    json!({ "number": number, "name": name })
}

/// Mods in effect: the play's mods while playing or on the result screen,
/// otherwise the song select mods.
pub(crate) fn current_mods(states: &States) -> OsuMods {
    if states.global.is(GameState::Play) || states.global.is(GameState::ResultScreen) {
        states.gameplay.mods
    } else {
        states.global.menu_mods
    }
}

fn hits(statistics: &Statistics) -> Value {
    json!({
        "300": statistics.great,
        "geki": statistics.perfect,
        "100": statistics.ok,
        "katu": statistics.good,
        "50": statistics.meh,
        "0": statistics.miss,
    })
}

fn key_overlay(gameplay: &Gameplay) -> Value {
    let key = |name: &str| {
        gameplay
            .key_overlay
            .iter()
            .find(|k| k.name.eq_ignore_ascii_case(name))
            .map(|k| json!({ "isPressed": k.is_pressed, "count": k.count }))
            .unwrap_or_else(|| json!({ "isPressed": false, "count": 0 }))
    };
    json!({ "k1": key("k1"), "k2": key("k2"), "m1": key("m1"), "m2": key("m2") })
}

fn leaderboard_slot_v1(player: &LeaderboardPlayer) -> Value {
    json!({
        "name": player.name,
        "score": player.score,
        "combo": player.combo,
        "maxCombo": player.max_combo,
        "mods": player.mods.name(),
        "h300": player.statistics.great,
        "h100": player.statistics.ok,
        "h50": player.statistics.meh,
        "h0": player.statistics.miss,
        "team": player.team,
        "position": player.position,
        "isPassing": i32::from(player.is_passing),
    })
}

fn leaderboard_slot_v2(player: &LeaderboardPlayer, client: ClientType, mode: i32) -> Value {
    json!({
        "isFailed": !player.is_passing,
        "position": player.position,
        "team": player.team,
        "name": player.name,
        "score": player.score,
        "accuracy": player.accuracy,
        "hits": hits(&player.statistics),
        "combo": { "current": player.combo, "max": player.max_combo },
        "mods": { "number": player.mods.bits(), "name": player.mods.name() },
        "rank": calculate_grade(client, mode, player.mods, player.accuracy, &player.statistics),
    })
}

/// Gameplay block shared by the v1 answer and the tournament clients.
pub(crate) fn gameplay_v1(states: &States) -> Value {
    let gameplay = &states.gameplay;
    let mut hits = hits(&gameplay.statistics);
    hits["sliderBreaks"] = json!(gameplay.slider_breaks);
    hits["grade"] = json!({
        "current": gameplay.grade_current,
        "maxThisPlay": gameplay.grade_expected,
    });
    hits["unstableRate"] = json!(gameplay.unstable_rate);
    hits["hitErrorArray"] = json!(gameplay.hit_errors);

    json!({
        "gameMode": gameplay.mode,
        "name": gameplay.player_name,
        "score": gameplay.score,
        "accuracy": gameplay.accuracy,
        "combo": { "current": gameplay.combo, "max": gameplay.max_combo },
        "hp": { "normal": gameplay.player_hp, "smooth": gameplay.player_hp_smooth },
        "hits": hits,
    })
}

/// Spectated player block of a tournament client.
pub(crate) fn spectating(user: &TourneyUser) -> Value {
    json!({
        "name": user.name,
        "country": user.country,
        "userID": user.id,
        "accuracy": user.accuracy,
        "rankedScore": user.ranked_score,
        "playCount": user.play_count,
        "globalRank": user.global_rank,
        "totalPP": user.pp,
    })
}

/// Legacy answer.
pub fn v1(core: &InstanceCore) -> Value {
    let s = &core.states;
    let menu = &s.menu;
    let beatmap = &s.beatmap;
    let attributes = &beatmap.calculated_map_attributes;
    let mods = current_mods(s);

    let mut pp = to_json(&beatmap.pp_acc);
    pp["strains"] = json!(beatmap.strains);
    pp["strainsAll"] = to_json(&beatmap.strains_all);

    let mut gameplay = gameplay_v1(s);
    gameplay["pp"] = json!({
        "current": fix_decimals(beatmap.curr_attributes.pp),
        "fc": fix_decimals(beatmap.curr_attributes.fc_pp),
        "maxThisPlay": fix_decimals(beatmap.curr_attributes.max_achieved),
    });
    gameplay["keyOverlay"] = key_overlay(&s.gameplay);
    gameplay["leaderboard"] = json!({
        "hasLeaderboard": !s.gameplay.leaderboard_scores.is_empty(),
        "isVisible": s.gameplay.is_leaderboard_visible,
        "ourplayer": leaderboard_slot_v1(&s.gameplay.leaderboard_player),
        "slots": s.gameplay.leaderboard_scores.iter().map(leaderboard_slot_v1).collect::<Vec<_>>(),
    });
    gameplay["_isReplayUiHidden"] = json!(s.global.is_replay_ui_hidden);

    let result = &s.result_screen;
    let mut results_screen = hits(&result.statistics);
    results_screen["mode"] = json!(result.mode);
    results_screen["name"] = json!(result.player_name);
    results_screen["score"] = json!(result.score);
    results_screen["accuracy"] = json!(result.accuracy);
    results_screen["maxCombo"] = json!(result.max_combo);
    results_screen["mods"] = json!({ "num": result.mods.bits(), "str": result.mods.name() });
    results_screen["grade"] = json!(result.grade);
    results_screen["createdAt"] = json!(result.date);

    let user = &s.user;

    json!({
        "client": core.info.client,
        "settings": {
            "showInterface": s.global.show_interface,
            "folders": {
                "game": s.global.game_folder,
                "skin": s.global.skin_folder,
                "songs": s.global.songs_folder,
            },
        },
        "menu": {
            "mainMenu": { "bassDensity": s.bass_density.density },
            "state": s.global.status,
            "gameMode": menu.gamemode,
            "isChatEnabled": i32::from(s.global.chat_status != 0),
            "bm": {
                "time": {
                    "firstObj": beatmap.timings.first_obj,
                    "current": s.global.play_time,
                    "full": beatmap.timings.full,
                    "mp3": menu.mp3_length,
                },
                "id": menu.map_id,
                "set": menu.set_id,
                "md5": menu.checksum,
                "rankedStatus": menu.ranked_status,
                "metadata": {
                    "artist": menu.artist,
                    "artistOriginal": menu.artist_original,
                    "title": menu.title,
                    "titleOriginal": menu.title_original,
                    "mapper": menu.creator,
                    "difficulty": menu.difficulty,
                },
                "stats": {
                    "AR": fix_decimals(attributes.ar_converted),
                    "CS": fix_decimals(attributes.cs_converted),
                    "OD": fix_decimals(attributes.od_converted),
                    "HP": fix_decimals(attributes.hp_converted),
                    "SR": fix_decimals(beatmap.curr_attributes.stars),
                    "BPM": {
                        "realtime": beatmap.realtime_bpm,
                        "common": beatmap.common_bpm,
                        "min": beatmap.min_bpm,
                        "max": beatmap.max_bpm,
                    },
                    "circles": attributes.circles,
                    "sliders": attributes.sliders,
                    "spinners": attributes.spinners,
                    "holds": attributes.holds,
                    "maxCombo": attributes.max_combo,
                    "fullSR": fix_decimals(attributes.full_stars),
                    "memoryAR": fix_decimals(f64::from(menu.ar)),
                    "memoryCS": fix_decimals(f64::from(menu.cs)),
                    "memoryOD": fix_decimals(f64::from(menu.od)),
                    "memoryHP": fix_decimals(f64::from(menu.hp)),
                },
                "path": {
                    "full": Path::new(&menu.folder).join(&menu.background_filename).to_string_lossy(),
                    "folder": menu.folder,
                    "file": menu.filename,
                    "bg": menu.background_filename,
                    "audio": menu.audio_filename,
                },
            },
            "mods": { "num": mods.bits(), "str": mods.name() },
            "pp": pp,
        },
        "gameplay": gameplay,
        "resultsScreen": results_screen,
        "userProfile": {
            "rawLoginStatus": user.raw_login_status,
            "name": user.name,
            "accuracy": user.accuracy,
            "rankedScore": user.ranked_score,
            "id": user.id,
            "level": user.level,
            "playCount": user.play_count,
            "playMode": user.play_mode,
            "rank": user.rank,
            "countryCode": user.country_code,
            "performancePoints": user.performance_points,
            "rawBanchoStatus": user.raw_bancho_status,
            "backgroundColour": format!("{:x}", user.background_colour),
        },
    })
}

fn settings_v2(states: &States) -> Value {
    let settings = &states.settings;
    json!({
        "interfaceVisible": states.global.show_interface,
        "replayUIVisible": !states.global.is_replay_ui_hidden,
        "chatVisibilityStatus": { "number": states.global.chat_status },
        "leaderboard": {
            "visible": states.gameplay.is_leaderboard_visible,
            "type": { "number": settings.leaderboard_type },
        },
        "progressBar": { "number": settings.progress_bar_type },
        "bassDensity": states.bass_density.density,
        "resolution": to_json(&settings.resolution),
        "client": to_json(&settings.client),
        "scoreMeter": {
            "type": { "number": settings.score_meter.kind },
            "size": settings.score_meter.size,
        },
        "cursor": to_json(&settings.cursor),
        "mouse": to_json(&settings.mouse),
        "mania": to_json(&settings.mania),
        "sort": { "number": settings.sort.kind },
        "group": { "number": settings.group.kind },
        "skin": to_json(&settings.skin),
        "mode": numbered(states.menu.gamemode, mode_name(states.menu.gamemode)),
        "audio": to_json(&settings.audio),
        "background": to_json(&settings.background),
    })
}

fn beatmap_v2(states: &States, client: ClientType) -> Value {
    let menu = &states.menu;
    let beatmap = &states.beatmap;
    let attributes = &beatmap.calculated_map_attributes;
    let status = match client {
        ClientType::Stable => BeatmapStatus::from_raw(menu.ranked_status),
        ClientType::Lazer => BeatmapStatus::from_lazer(menu.ranked_status),
    };
    let status_name: &'static str = status.into();
    let stat = |value: f64| (value != 0.0).then(|| fix_decimals(value));

    json!({
        "isKiai": beatmap.is_kiai,
        "isBreak": beatmap.is_break,
        "time": {
            "live": states.global.play_time,
            "firstObject": beatmap.timings.first_obj,
            "lastObject": beatmap.timings.full,
            "mp3Length": menu.mp3_length,
        },
        "status": numbered(status as i32, status_name),
        "checksum": menu.checksum,
        "id": menu.map_id,
        "set": menu.set_id,
        "mode": numbered(beatmap.mode, mode_name(beatmap.mode)),
        "artist": menu.artist,
        "artistUnicode": menu.artist_original,
        "title": menu.title,
        "titleUnicode": menu.title_original,
        "mapper": menu.creator,
        "version": menu.difficulty,
        "stats": {
            "stars": {
                "live": fix_decimals(beatmap.curr_attributes.stars),
                "aim": stat(attributes.aim),
                "speed": stat(attributes.speed),
                "flashlight": stat(attributes.flashlight),
                "sliderFactor": stat(attributes.slider_factor),
                "stamina": stat(attributes.stamina),
                "rhythm": stat(attributes.rhythm),
                "color": stat(attributes.color),
                "reading": stat(attributes.reading),
                "hitWindow": stat(attributes.hit_window),
                "total": fix_decimals(attributes.full_stars),
            },
            "ar": { "original": fix_decimals(f64::from(menu.ar)), "converted": fix_decimals(attributes.ar_converted) },
            "cs": { "original": fix_decimals(f64::from(menu.cs)), "converted": fix_decimals(attributes.cs_converted) },
            "od": { "original": fix_decimals(f64::from(menu.od)), "converted": fix_decimals(attributes.od_converted) },
            "hp": { "original": fix_decimals(f64::from(menu.hp)), "converted": fix_decimals(attributes.hp_converted) },
            "bpm": {
                "realtime": beatmap.realtime_bpm,
                "common": beatmap.common_bpm,
                "min": beatmap.min_bpm,
                "max": beatmap.max_bpm,
            },
            "objects": {
                "circles": attributes.circles,
                "sliders": attributes.sliders,
                "spinners": attributes.spinners,
                "holds": attributes.holds,
                "total": attributes.circles + attributes.sliders + attributes.spinners + attributes.holds,
            },
            "maxCombo": attributes.max_combo,
        },
    })
}

fn play_v2(states: &States) -> Value {
    let gameplay = &states.gameplay;
    let beatmap = &states.beatmap;
    let mods = current_mods(states);
    let mut hits = hits(&gameplay.statistics);
    hits["sliderBreaks"] = json!(gameplay.slider_breaks);

    json!({
        "playerName": gameplay.player_name,
        "mode": numbered(gameplay.mode, mode_name(gameplay.mode)),
        "score": gameplay.score,
        "accuracy": gameplay.accuracy,
        "healthBar": {
            "normal": gameplay.player_hp / 200.0 * 100.0,
            "smooth": gameplay.player_hp_smooth / 200.0 * 100.0,
        },
        "hits": hits,
        "hitErrorArray": gameplay.hit_errors,
        "combo": { "current": gameplay.combo, "max": gameplay.max_combo },
        "mods": { "number": mods.bits(), "name": mods.name() },
        "rank": { "current": gameplay.grade_current, "maxThisPlay": gameplay.grade_expected },
        "pp": {
            "current": fix_decimals(beatmap.curr_attributes.pp),
            "fc": fix_decimals(beatmap.curr_attributes.fc_pp),
            "maxAchieved": fix_decimals(beatmap.curr_attributes.max_achieved),
            "maxAchievable": fix_decimals(beatmap.curr_attributes.max_achievable),
            "detailed": {
                "current": to_json(&beatmap.curr_pp_attributes),
                "fc": to_json(&beatmap.fc_pp_attributes),
            },
        },
        "unstableRate": gameplay.unstable_rate,
        "failed": gameplay.failed,
    })
}

/// Structured answer.
pub fn v2(core: &InstanceCore) -> Value {
    let s = &core.states;
    let client = core.info.client;
    let user = &s.user;
    let result = &s.result_screen;
    let bancho: &'static str = BanchoStatus::from_raw(user.raw_bancho_status).into();
    let state_name = s.global.game_state().map(GameState::name).unwrap_or("");

    let mut results_hits = hits(&result.statistics);
    results_hits["sliderBreaks"] = json!(0);

    json!({
        "client": client,
        "state": numbered(s.global.status, state_name),
        "session": { "playTime": s.global.game_time },
        "settings": settings_v2(s),
        "profile": {
            "userStatus": { "number": user.raw_login_status },
            "banchoStatus": numbered(user.raw_bancho_status, bancho),
            "id": user.id,
            "name": user.name,
            "mode": numbered(user.play_mode, mode_name(user.play_mode)),
            "rankedScore": user.ranked_score,
            "level": user.level,
            "accuracy": user.accuracy,
            "pp": user.performance_points,
            "playCount": user.play_count,
            "globalRank": user.rank,
            "countryCode": { "number": user.country_code },
            "backgroundColour": format!("{:x}", user.background_colour),
        },
        "beatmap": beatmap_v2(s, client),
        "play": play_v2(s),
        "leaderboard": s
            .gameplay
            .leaderboard_scores
            .iter()
            .map(|slot| leaderboard_slot_v2(slot, client, s.gameplay.mode))
            .collect::<Vec<_>>(),
        "performance": {
            "accuracy": to_json(&s.beatmap.pp_acc),
            "graph": to_json(&s.beatmap.strains_all),
        },
        "resultsScreen": {
            "scoreId": result.online_id,
            "playerName": result.player_name,
            "mode": numbered(result.mode, mode_name(result.mode)),
            "score": result.score,
            "accuracy": result.accuracy,
            "name": result.player_name,
            "hits": results_hits,
            "mods": { "number": result.mods.bits(), "name": result.mods.name() },
            "maxCombo": result.max_combo,
            "rank": result.grade,
            "pp": { "current": fix_decimals(result.pp), "fc": fix_decimals(result.fc_pp) },
            "createdAt": result.date,
        },
        "folders": {
            "game": s.global.game_folder,
            "skin": s.global.skin_folder,
            "songs": s.global.songs_folder,
            "beatmap": s.menu.folder,
        },
        "files": {
            "beatmap": s.menu.filename,
            "background": s.menu.background_filename,
            "audio": s.menu.audio_filename,
        },
        "directPath": {
            "beatmapFile": Path::new(&s.global.songs_folder).join(&s.menu.folder).join(&s.menu.filename).to_string_lossy(),
            "beatmapBackground": Path::new(&s.global.songs_folder).join(&s.menu.folder).join(&s.menu.background_filename).to_string_lossy(),
            "beatmapAudio": Path::new(&s.global.songs_folder).join(&s.menu.folder).join(&s.menu.audio_filename).to_string_lossy(),
            "beatmapFolder": Path::new(&s.global.songs_folder).join(&s.menu.folder).to_string_lossy(),
            "skinFolder": Path::new(&s.global.game_folder).join("Skins").join(&s.global.skin_folder).to_string_lossy(),
        },
    })
}

/// Key overlay and hit errors, refreshed at the precise rate.
pub fn precise(core: &InstanceCore) -> Value {
    let gameplay = &core.states.gameplay;
    json!({
        "keys": key_overlay(gameplay),
        "hitErrors": gameplay.hit_errors,
    })
}
