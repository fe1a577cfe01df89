//! 32-bit stable client reader.
//!
//! Most objects hang off the active ruleset, `[[rulesetsAddr - 0xB] + 0x4]`.
//! Offsets below are relative to the object named in each method.

use std::sync::Arc;

use tracing::debug;

use super::types::*;
use super::{GameMemory, Readout};
use crate::config::timing::HIT_ERROR_LIMIT;
use crate::error::{Error, Result};
use crate::game::{
    ClientType, GameState, KeyOverlayButton, LeaderboardPlayer, OsuMods, Statistics,
    calculate_accuracy, net_date_from_binary,
};
use crate::offset::{
    CHAT_AREA_PATTERN, MANIA_SCROLL_SPEED_PATTERN, PatternTable, ResolvedAddresses,
    parse_pattern, resolve_patterns,
};
use crate::process::pattern::scan_first;
use crate::process::{GameProcess, ManagedReader, ReadMemory, Signature};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigKind {
    Bool,
    Int,
    Double,
    Enum,
    /// Bindable string.
    BString,
}

/// Configuration keys that are decoded, with their value kind and setting path.
const CONFIG_LIST: &[(&str, ConfigKind, &str)] = &[
    ("VolumeUniversal", ConfigKind::Int, "audio.volume.master"),
    ("VolumeEffect", ConfigKind::Int, "audio.volume.effect"),
    ("VolumeMusic", ConfigKind::Int, "audio.volume.music"),
    ("_ReleaseStream", ConfigKind::Enum, "client.branch"),
    ("DimLevel", ConfigKind::Int, "background.dim"),
    ("ShowStoryboard", ConfigKind::Bool, "background.storyboard"),
    ("ScoreMeter", ConfigKind::Enum, "scoreMeter.type"),
    ("ScoreMeterScale", ConfigKind::Double, "scoreMeter.size"),
    ("Offset", ConfigKind::Int, "audio.offset.universal"),
    ("CursorSize", ConfigKind::Double, "cursor.size"),
    ("MouseSpeed", ConfigKind::Double, "mouse.sensitivity"),
    ("Fullscreen", ConfigKind::Bool, "resolution.fullscreen"),
    ("Width", ConfigKind::Int, "resolution.width"),
    ("Height", ConfigKind::Int, "resolution.height"),
    ("WidthFullscreen", ConfigKind::Int, "resolution.widthFullscreen"),
    ("HeightFullscreen", ConfigKind::Int, "resolution.heightFullscreen"),
    ("AutomaticCursorSizing", ConfigKind::Bool, "cursor.autoSize"),
    ("IgnoreBeatmapSamples", ConfigKind::Bool, "audio.ignoreBeatmapSounds"),
    ("SkinSamples", ConfigKind::Bool, "audio.useSkinSamples"),
    ("LastVersion", ConfigKind::BString, "client.version"),
    ("ManiaSpeed", ConfigKind::Int, "mania.scrollSpeed"),
    ("ManiaSpeedBPMScale", ConfigKind::Bool, "mania.speedBPMScale"),
    ("UsePerBeatmapManiaSpeed", ConfigKind::Bool, "mania.usePerBeatmapSpeedScale"),
    ("MouseDisableButtons", ConfigKind::Bool, "mouse.disableButtons"),
    ("MouseDisableWheel", ConfigKind::Bool, "mouse.disableWheel"),
    ("ProgressBarType", ConfigKind::Enum, "progressBarType"),
    ("RankType", ConfigKind::Enum, "leaderboardType"),
    ("UpdatePending", ConfigKind::Bool, "client.updateAvailable"),
    ("UseSkinCursor", ConfigKind::Bool, "cursor.useSkinCursor"),
    ("RawInput", ConfigKind::Bool, "mouse.rawInput"),
    ("TreeSortMode", ConfigKind::Enum, "groupType"),
    ("TreeSortMode2", ConfigKind::Enum, "sortType"),
    ("EditorDefaultSkin", ConfigKind::Bool, "skin.useDefaultSkinInEditor"),
    ("ComboColourSliderBall", ConfigKind::Bool, "skin.tintSliderBall"),
    ("IgnoreBeatmapSkins", ConfigKind::Bool, "skin.ignoreBeatmapSkins"),
    ("Skin", ConfigKind::BString, "skin.name"),
    ("UseTaikoSkin", ConfigKind::Bool, "skin.useTaikoSkin"),
];

fn config_entry(key: &str) -> Option<&'static (&'static str, ConfigKind, &'static str)> {
    CONFIG_LIST.iter().find(|(name, _, _)| *name == key)
}

/// Reader for the stable client.
pub struct StableMemory<P> {
    reader: ManagedReader<Arc<P>>,
    pid: u32,
    table: PatternTable,
    addresses: ResolvedAddresses,
    /// Chat engine, scanned on first tournament chat read.
    chat_area: u64,
    /// Mania speed setter, scanned on first mania play.
    mania_speed: u64,
    gameplay_mode: i32,
    config_positions: Vec<usize>,
}

impl<P: GameProcess> StableMemory<P> {
    pub fn new(process: Arc<P>, table: PatternTable) -> Self {
        let pid = process.pid();
        Self {
            reader: ManagedReader::x86(process),
            pid,
            table,
            addresses: ResolvedAddresses::new(),
            chat_area: 0,
            mania_speed: 0,
            gameplay_mode: 0,
            config_positions: Vec::new(),
        }
    }

    /// Build a reader over an already resolved address table.
    pub fn with_addresses(process: Arc<P>, addresses: ResolvedAddresses) -> Self {
        let mut memory = Self::new(process, crate::offset::stable_patterns());
        memory.addresses = addresses;
        memory
    }

    fn addr(&self, name: &str) -> Result<u64> {
        self.addresses.require(name)
    }

    /// 32-bit pointer at `address`.
    fn ptr(&self, address: u64) -> Result<u64> {
        self.reader.read_ptr(address)
    }

    fn int(&self, address: u64) -> Result<i32> {
        self.reader.read_i32(address)
    }

    fn short(&self, address: u64) -> Result<i32> {
        self.reader.read_i16(address).map(i32::from)
    }

    fn string(&self, address: u64) -> Result<String> {
        self.reader.read_string_at(address)
    }

    fn ruleset(&self) -> Result<u64> {
        let rulesets = self.addr("rulesetsAddr")?;
        let holder = self.ptr(rulesets.wrapping_sub(0xB))?;
        self.ptr(holder + 0x4)
    }

    /// Mods are stored xor-ed with a per-score key.
    fn mods_at(&self, holder: u64, value: u64, key: u64) -> Result<OsuMods> {
        let mods = self.ptr(holder)?;
        let a = self.int(mods + value)?;
        let b = self.int(mods + key)?;
        Ok(OsuMods::from_bits((a ^ b) as u32))
    }

    fn hits_at(&self, base: u64) -> Result<Statistics> {
        Ok(Statistics::stable(
            self.short(base + 0x8E)?,
            self.short(base + 0x8A)?,
            self.short(base + 0x90)?,
            self.short(base + 0x88)?,
            self.short(base + 0x8C)?,
            self.short(base + 0x92)?,
        ))
    }

    fn scan_signature(&self, pattern: &str) -> Result<u64> {
        let signature = Signature::new(parse_pattern(pattern)?);
        Ok(scan_first(self.reader.inner(), &signature)?.unwrap_or(0))
    }

    fn leaderboard_player(&self, base: u64, mode: i32) -> Result<Option<LeaderboardPlayer>> {
        let entry = self.ptr(base + 0x20)?;
        if entry == 0 {
            return Ok(None);
        }

        let mods = self.mods_at(entry + 0x1C, 0x8, 0xC)?;
        let user = self.ptr(entry + 0x48)?;
        let user_id = if user != 0 { self.int(user + 0x70)? } else { 0 };

        let statistics = Statistics {
            great: self.short(entry + 0x8A)?,
            ok: self.short(entry + 0x88)?,
            meh: self.short(entry + 0x8C)?,
            miss: self.short(entry + 0x92)?,
            ..Statistics::default()
        };

        Ok(Some(LeaderboardPlayer {
            user_id,
            name: self.string(base + 0x8)?,
            score: self.int(base + 0x30)?,
            combo: self.short(entry + 0x94)?,
            max_combo: self.short(entry + 0x68)?,
            mods,
            accuracy: calculate_accuracy(ClientType::Stable, mode, mods, &statistics),
            statistics,
            team: self.int(base + 0x40)?,
            position: self.int(base + 0x2C)?,
            is_passing: self.reader.read_bool(base + 0x4B)?,
        }))
    }

    fn find_config_positions(&self, dictionary: u64) -> Result<Vec<usize>> {
        let mut positions = Vec::new();
        for (i, entry) in self.reader.read_dictionary_entries(dictionary)?.iter().enumerate() {
            match self.string(*entry) {
                Ok(key) if config_entry(&key).is_some() => positions.push(i),
                Ok(_) => {}
                Err(e) => debug!("Failed to read config key at position {}: {}", i, e),
            }
        }
        Ok(positions)
    }

    fn config_value(&self, dictionary: u64, position: usize) -> Result<Option<(&'static str, ConfigValue)>> {
        let entries = self.ptr(dictionary + 0x8)?;
        let entry = self.reader.array_element(entries, position, 0x10)?;
        let key = self.string(entry)?;
        let Some((_, kind, path)) = config_entry(&key) else {
            return Ok(None);
        };

        let bindable = self.ptr(entry + 0x4)?;
        let value = match kind {
            ConfigKind::Bool => ConfigValue::Bool(self.reader.read_bool(bindable + 0xC)?),
            ConfigKind::Int | ConfigKind::Double => {
                ConfigValue::Number(self.reader.read_f64(bindable + 0x4)?)
            }
            ConfigKind::Enum => ConfigValue::Enum(self.int(bindable + 0xC)?),
            ConfigKind::BString => ConfigValue::Text(self.string(bindable + 0x4)?),
        };
        Ok(Some((*path, value)))
    }

    fn beatmap_scroll_speed(&mut self) -> Result<Option<i32>> {
        if self.mania_speed == 0 && self.gameplay_mode == 3 {
            self.mania_speed = self.scan_signature(MANIA_SCROLL_SPEED_PATTERN)?;
        }
        if self.mania_speed == 0 {
            return Ok(None);
        }

        let speed = self.ptr(self.mania_speed + 0x1)?;
        Ok(Some(self.int(speed)?))
    }
}

impl<P: GameProcess> GameMemory for StableMemory<P> {
    fn client(&self) -> ClientType {
        ClientType::Stable
    }

    fn pid(&self) -> u32 {
        self.pid
    }

    fn resolve(&mut self, spectating: bool) -> Result<()> {
        self.addresses = resolve_patterns(self.reader.inner(), &self.table, spectating)?;
        Ok(())
    }

    fn global(&mut self) -> Result<Readout<GlobalReadout>> {
        let status = self.reader.read_pointer(self.addr("statusPtr")?)? as i32;
        let menu_mods = self.reader.read_pointer(self.addr("menuModsPtr")?)? as u32;
        let chat_status = self.reader.read_u8(self.ptr(self.addr("chatCheckerPtr")?)?)?;
        let replay_flag = self.ptr(self.addr("canRunSlowlyAddr")? + 0x46)?;
        let is_watching_replay = self.reader.read_u8(replay_flag)? == 1;
        let game_time = self.reader.read_pointer(self.addr("gameTimePtr")?)? as i32;

        let settings_class = self.ptr(self.addr("settingsClassAddr")? + 0x8)?;
        let songs = self.ptr(settings_class + 0xB8)?;
        let memory_songs_folder = self.string(songs + 0x4)?;
        let interface = self.ptr(settings_class + 0x4)?;
        let show_interface = self.reader.read_bool(interface + 0xC)?;

        let mut is_replay_ui_hidden = false;
        if is_watching_replay {
            let ruleset = self.ruleset()?;
            if ruleset != 0 {
                is_replay_ui_hidden = self.reader.read_bool(ruleset + 0x1D8)?;
            }
        }

        let mut skin_folder = String::new();
        let skin_osu = self.ptr(self.addr("skinDataAddr")? + 0x7)?;
        if skin_osu != 0 {
            let skin_base = self.ptr(skin_osu)?;
            if skin_base != 0 {
                skin_folder = self.string(skin_base + 0x44)?;
            }
        }

        Ok(Readout::Ready(GlobalReadout {
            status,
            is_watching_replay,
            is_replay_ui_hidden,
            is_multi_spectating: false,
            show_interface,
            chat_status: i32::from(chat_status),
            game_time,
            menu_mods: OsuMods::from_bits(menu_mods),
            skin_folder,
            memory_songs_folder,
        }))
    }

    fn global_precise(&mut self) -> Result<Readout<GlobalPreciseReadout>> {
        let status = self.reader.read_pointer(self.addr("statusPtr")?)? as i32;
        if status == GameState::Exit.raw() {
            return Ok(Readout::Ready(GlobalPreciseReadout { status, play_time: 0 }));
        }

        let time = self.ptr(self.addr("playTimeAddr")? + 0x5)?;
        let play_time = self.int(time)?;
        Ok(Readout::Ready(GlobalPreciseReadout { status, play_time }))
    }

    fn menu(&mut self, previous_checksum: &str) -> Result<Readout<MenuReadout>> {
        let base = self.addr("baseAddr")?;
        let beatmap = self.reader.read_pointer(base - 0xC)?;
        if beatmap == 0 {
            return Ok(Readout::NotReady("beatmapAddr is 0"));
        }

        let gamemode = self.reader.read_pointer(base - 0x33)? as i32;
        let checksum = self.string(beatmap + 0x6C)?;
        let filename = self.string(beatmap + 0x90)?;
        let ranked_status = self.int(beatmap + 0x12C)?;

        if checksum == previous_checksum || !filename.ends_with(".osu") {
            return Ok(Readout::Ready(MenuReadout::Checksum {
                gamemode,
                ranked_status,
            }));
        }

        let plays_holder = self.ptr(base - 0x33)?;
        Ok(Readout::Ready(MenuReadout::Beatmap(Box::new(BeatmapReadout {
            gamemode,
            checksum,
            filename,
            plays: self.int(plays_holder + 0xC)?,
            artist: self.string(beatmap + 0x18)?,
            artist_original: self.string(beatmap + 0x1C)?,
            title: self.string(beatmap + 0x24)?,
            title_original: self.string(beatmap + 0x28)?,
            ar: self.reader.read_f32(beatmap + 0x2C)?,
            cs: self.reader.read_f32(beatmap + 0x30)?,
            hp: self.reader.read_f32(beatmap + 0x34)?,
            od: self.reader.read_f32(beatmap + 0x38)?,
            audio_filename: self.string(beatmap + 0x64)?,
            background_filename: self.string(beatmap + 0x68)?,
            folder: self.string(beatmap + 0x78)?,
            creator: self.string(beatmap + 0x7C)?,
            difficulty: self.string(beatmap + 0xAC)?,
            map_id: self.int(beatmap + 0xC8)?,
            set_id: self.int(beatmap + 0xCC)?,
            ranked_status,
            object_count: self.int(beatmap + 0xF8)?,
        }))))
    }

    fn mp3_length(&mut self) -> Result<f64> {
        let audio = self.reader.read_pointer(self.addr("getAudioLengthPtr")?)?;
        Ok(self.reader.read_f64(audio + 0x4)?.round())
    }

    fn result_screen(&mut self) -> Result<Readout<ResultScreenReadout>> {
        let ruleset = self.ruleset()?;
        if ruleset == 0 {
            return Ok(Readout::NotReady("rulesetAddr is zero"));
        }
        let base = self.ptr(ruleset + 0x38)?;
        if base == 0 {
            return Ok(Readout::NotReady("resultScreenBase is zero"));
        }

        let mods = self.mods_at(base + 0x1C, 0xC, 0x8)?;
        let mode = self.int(base + 0x64)?;
        let statistics = self.hits_at(base)?;
        let date = net_date_from_binary(self.int(base + 0xA4)?, self.int(base + 0xA0)?)
            .map(|date| date.to_rfc3339())
            .unwrap_or_default();

        Ok(Readout::Ready(ResultScreenReadout {
            online_id: self.reader.read_i64(base + 0x4)?,
            player_name: self.string(base + 0x28)?,
            mods,
            mode,
            max_combo: self.short(base + 0x68)?,
            score: i64::from(self.int(base + 0x78)?),
            accuracy: calculate_accuracy(ClientType::Stable, mode, mods, &statistics),
            statistics,
            date,
        }))
    }

    fn gameplay(&mut self, context: &GameplayContext) -> Result<Readout<GameplayReadout>> {
        let ruleset = self.ruleset()?;
        if ruleset == 0 {
            return Ok(Readout::NotReady("rulesetAddr is zero"));
        }
        let gameplay_base = self.ptr(ruleset + 0x68)?;
        if gameplay_base == 0 {
            return Ok(Readout::NotReady("gameplayBase is zero"));
        }
        let score_base = self.ptr(gameplay_base + 0x38)?;
        if score_base == 0 {
            return Ok(Readout::NotReady("scoreBase is zero"));
        }
        let hp_bar = self.ptr(gameplay_base + 0x40)?;
        if hp_bar == 0 {
            return Ok(Readout::NotReady("hpBarBase is zero"));
        }

        let retries_holder = self.ptr(self.addr("baseAddr")? - 0x33)?;
        let score_offset = if context.cutting_edge { 0xFC } else { 0x100 };
        let accuracy_base = self.ptr(gameplay_base + 0x48)?;

        let mut readout = GameplayReadout {
            retries: self.int(retries_holder + 0x8)?,
            player_name: self.string(score_base + 0x28)?,
            mods: self.mods_at(score_base + 0x1C, 0xC, 0x8)?,
            mode: self.int(score_base + 0x64)?,
            score: i64::from(self.int(ruleset + score_offset)?),
            player_hp_smooth: self.reader.read_f64(hp_bar + 0x14)?,
            player_hp: self.reader.read_f64(hp_bar + 0x1C)?,
            accuracy: self.reader.read_f64(accuracy_base + 0xC)?,
            ..GameplayReadout::default()
        };
        if readout.player_hp_smooth.is_nan() {
            readout.player_hp_smooth = 0.0;
        }

        // Counters hold stale values from the previous attempt until the map starts.
        if context.play_time >= context.first_object - 100 {
            readout.statistics = self.hits_at(score_base)?;
            readout.combo = self.short(score_base + 0x94)?;
            readout.max_combo = self.short(score_base + 0x68)?;
        }

        readout.failed = readout.player_hp <= 0.0;
        self.gameplay_mode = readout.mode;
        Ok(Readout::Ready(readout))
    }

    fn key_overlay(&mut self, mode: i32) -> Result<Readout<KeyOverlayReadout>> {
        let ruleset = self.ruleset()?;
        if ruleset == 0 {
            return Ok(Readout::NotReady("rulesetAddr is zero"));
        }

        let overlay = u64::from(self.reader.read_u32(ruleset + 0xB0)?);
        if overlay == 0 {
            // Taiko and mania have no key overlay.
            if mode == 3 || mode == 1 {
                return Ok(Readout::Unchanged);
            }
            return Ok(Readout::NotReady("keyOverlayPtr is zero"));
        }

        let holder = self.ptr(overlay + 0x10)?;
        let array = self.ptr(holder + 0x4)?;
        if array == 0 {
            return Ok(Readout::NotReady("keyOverlayAddr[] is zero"));
        }
        if self.int(array + 0x4)? < 4 {
            return Ok(Readout::Ready(Vec::new()));
        }

        let names: &[&str] = match mode {
            0 => &["K1", "K2", "M1", "M2"],
            2 => &["L", "R", "D"],
            _ => &["K1", "K2", "M1"],
        };

        let mut keys = Vec::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            let button = self.ptr(self.reader.array_element(array, i, 4)?)?;
            keys.push(KeyOverlayButton::new(
                name,
                self.reader.read_bool(button + 0x1C)?,
                self.int(button + 0x14)?,
            ));
        }
        Ok(Readout::Ready(keys))
    }

    fn hit_errors(&mut self, from: usize) -> Result<Readout<HitErrorsReadout>> {
        let ruleset = self.ruleset()?;
        if ruleset == 0 {
            return Ok(Readout::NotReady("rulesetAddr is zero"));
        }
        let gameplay_base = self.ptr(ruleset + 0x68)?;
        if gameplay_base == 0 {
            return Ok(Readout::NotReady("gameplayBase is zero"));
        }
        let score_base = self.ptr(gameplay_base + 0x38)?;
        if score_base == 0 {
            return Ok(Readout::NotReady("scoreBase is zero"));
        }

        let list = self.ptr(score_base + 0x38)?;
        let mut readout = HitErrorsReadout {
            next_index: from,
            errors: Vec::new(),
        };
        for (offset, error) in self.reader.read_i32_list(list, from)?.into_iter().enumerate() {
            // Values past the written part of the buffer are garbage.
            if !(-HIT_ERROR_LIMIT..=HIT_ERROR_LIMIT).contains(&error) {
                break;
            }
            readout.errors.push(error);
            readout.next_index = from + offset + 1;
        }
        Ok(Readout::Ready(readout))
    }

    fn leaderboard(&mut self, mode: i32) -> Result<Readout<LeaderboardReadout>> {
        let ruleset = self.ruleset()?;
        let base = self.ptr(ruleset + 0x7C)?;
        if base == 0 {
            return Ok(Readout::Ready(LeaderboardReadout::default()));
        }
        let address = self.ptr(base + 0x24)?;
        if address == 0 {
            return Ok(Readout::Ready(LeaderboardReadout::default()));
        }

        let player_base = self.ptr(address + 0x10)?;
        let visibility = self.ptr(player_base + 0x24)?;
        let is_visible = self.reader.read_bool(visibility + 0x20)?;
        let player = self.leaderboard_player(player_base, mode)?;

        let list = self.ptr(address + 0x4)?;
        let mut players = Vec::new();
        for row in self.reader.read_list_pointers(list)? {
            match self.leaderboard_player(row, mode)? {
                Some(entry) => players.push(entry),
                None => return Ok(Readout::NotReady("leaderboard is being rebuilt")),
            }
        }

        Ok(Readout::Ready(LeaderboardReadout {
            is_visible,
            player,
            players,
        }))
    }

    fn audio_velocity_base(&mut self) -> Result<Readout<Vec<f32>>> {
        let ruleset = self.ruleset()?;
        if ruleset == 0 {
            return Ok(Readout::NotReady("rulesetAddr is zero"));
        }

        let holder = self.ptr(ruleset + 0x44)?;
        let velocity = self.ptr(holder + 0x10)?;
        let mut samples = self.reader.read_f32_array(velocity)?;
        if samples.len() < 40 {
            return Ok(Readout::NotReady("bass density holds less than 40 samples"));
        }
        samples.truncate(40);
        Ok(Readout::Ready(samples))
    }

    fn settings(&mut self) -> Result<Readout<SettingsReadout>> {
        let dictionary = self.reader.read_pointer(self.addr("configurationAddr")?)?;
        if self.config_positions.is_empty() {
            self.config_positions = self.find_config_positions(dictionary)?;
        }

        let mut readout = SettingsReadout::default();
        for &position in &self.config_positions {
            match self.config_value(dictionary, position) {
                Ok(Some(value)) => readout.values.push(value),
                Ok(None) => {}
                Err(e) => readout.failed.push((position, e)),
            }
        }

        match self.beatmap_scroll_speed() {
            Ok(Some(speed)) => {
                readout.values.retain(|(path, _)| *path != "mania.scrollSpeed");
                readout
                    .values
                    .push(("mania.scrollSpeed", ConfigValue::Number(f64::from(speed))));
            }
            Ok(None) => {}
            Err(e) => readout.mania_speed_error = Some(e),
        }

        Ok(Readout::Ready(readout))
    }

    fn tourney(&mut self) -> Result<Readout<TourneyReadout>> {
        let ruleset = self.ruleset()?;
        if ruleset == 0 {
            return Ok(Readout::NotReady("rulesetAddr is zero"));
        }

        let left = self.ptr(ruleset + 0x1C)?;
        let right = self.ptr(ruleset + 0x20)?;
        let left_name = self.ptr(left + 0x20)?;
        let right_name = self.ptr(right + 0x20)?;

        Ok(Readout::Ready(TourneyReadout {
            ipc_state: self.int(ruleset + 0x54)?,
            left_stars: self.int(left + 0x2C)?,
            right_stars: self.int(right + 0x2C)?,
            best_of: self.int(right + 0x30)?,
            stars_visible: self.reader.read_bool(right + 0x38)?,
            score_visible: self.reader.read_bool(right + 0x39)?,
            first_team_name: self.string(left_name + 0x144)?,
            second_team_name: self.string(right_name + 0x144)?,
            first_team_score: self.int(left + 0x28)?,
            second_team_score: self.int(right + 0x28)?,
        }))
    }

    fn tourney_chat(
        &mut self,
        known_count: usize,
        show_mp_commands: bool,
    ) -> Result<Option<Vec<ChatMessage>>> {
        if self.chat_area == 0 {
            self.chat_area = self.scan_signature(CHAT_AREA_PATTERN)?;
            if self.chat_area == 0 {
                return Err(Error::PatternNotFound("tournament chat engine".to_string()));
            }
        }

        let channels = self.reader.read_pointer(self.chat_area + 0x1)?;
        let items = self.ptr(channels + 0x4)?;
        let length = self.int(items + 0x4)?.max(0) as usize;

        for i in (0..length).rev() {
            let channel = match self.reader.array_element(items, i, 4).and_then(|slot| self.ptr(slot)) {
                Ok(0) => continue,
                Ok(channel) => channel,
                Err(e) => {
                    debug!("Error reading chat channel {}: {}", i, e);
                    continue;
                }
            };
            match self.string(channel + 0x4) {
                Ok(tag) if tag == "#multiplayer" => {}
                Ok(_) => continue,
                Err(e) => {
                    debug!("Error reading chat channel {}: {}", i, e);
                    continue;
                }
            }

            let list = self.ptr(channel + 0x10)?;
            let messages = self.reader.read_list_pointers(list)?;
            if messages.len() == known_count {
                continue;
            }

            let mut result = Vec::with_capacity(messages.len());
            for (m, item) in messages.into_iter().enumerate() {
                let message = self.string(item + 0x4).and_then(|content| {
                    let header = self.string(item + 0x8)?;
                    Ok((content, header))
                });
                match message {
                    Ok((content, _)) if content.is_empty() => {}
                    Ok((content, _)) if !show_mp_commands && content.starts_with("!mp") => {}
                    Ok((content, header)) => result.push(ChatMessage::from_header(&header, content)),
                    Err(e) => {
                        // A partial chat is never published; keep the previous one.
                        debug!("Discarding chat rebuild, message {} unreadable: {}", m, e);
                        return Ok(None);
                    }
                }
            }
            return Ok(Some(result));
        }

        Ok(None)
    }

    fn tourney_user(&mut self) -> Result<Readout<TourneyUserReadout>> {
        let address = self.reader.read_pointer(self.addr("spectatingUserPtr")?)?;
        if address == 0 {
            return Ok(Readout::NotReady("Slot is not equiped"));
        }

        Ok(Readout::Ready(TourneyUserReadout {
            id: self.int(address + 0x70)?,
            name: self.string(address + 0x30)?,
            country: self.string(address + 0x2C)?,
            accuracy: self.reader.read_f64(address + 0x4)?,
            play_count: self.int(address + 0x7C)?,
            ranked_score: self.reader.read_i64(address + 0xC)?,
            global_rank: self.int(address + 0x84)?,
            pp: self.int(address + 0x9C)?,
        }))
    }

    fn user(&mut self) -> Result<Readout<UserReadout>> {
        let profile = self.reader.read_pointer(self.addr("userProfilePtr")?)?;
        let raw_login_status = self.reader.read_pointer(self.addr("rawLoginStatusPtr")?)? as i32;

        Ok(Readout::Ready(UserReadout {
            name: self.string(profile + 0x30)?,
            accuracy: self.reader.read_f64(profile + 0x4)?,
            ranked_score: self.reader.read_i64(profile + 0xC)?,
            id: self.int(profile + 0x70)?,
            level: self.reader.read_f32(profile + 0x74)?,
            play_count: self.int(profile + 0x7C)?,
            play_mode: self.int(profile + 0x80)?,
            rank: self.int(profile + 0x84)?,
            country_code: self.int(profile + 0x9C)?,
            performance_points: self.int(profile + 0x88)?,
            raw_bancho_status: i32::from(self.reader.read_u8(profile + 0x8C)?),
            background_colour: self.reader.read_u32(profile + 0xAC)?,
            raw_login_status,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ManagedLayout;
    use crate::process::mock::{MockMemoryBuilder, MockMemoryReader};

    const BASE: u64 = 0x1000;
    const X86: &ManagedLayout = &ManagedLayout::X86;

    /// Offset-relative addresses resolve to `BASE + offset`.
    fn at(offset: usize) -> u32 {
        (BASE + offset as u64) as u32
    }

    fn memory(reader: MockMemoryReader, entries: &[(&str, usize)]) -> StableMemory<MockMemoryReader> {
        let mut addresses = ResolvedAddresses::new();
        for (name, offset) in entries {
            addresses.insert(name, BASE + *offset as u64, false);
        }
        StableMemory::with_addresses(Arc::new(reader), addresses)
    }

    /// rulesetsAddr at 0x100, holder at 0x200, ruleset at 0x300.
    fn with_ruleset(builder: MockMemoryBuilder) -> MockMemoryBuilder {
        builder
            .write_u32(0x100 - 0xB, at(0x200))
            .write_u32(0x204, at(0x300))
    }

    #[test]
    fn test_menu_reads_full_beatmap_on_new_checksum() {
        // baseAddr at 0x80: beatmap slot at 0x74, gamemode slot at 0x4D.
        let reader = MockMemoryBuilder::new()
            .with_size(0x2000)
            .write_u32(0x80 - 0xC, at(0x10))
            .write_u32(0x10, at(0x400))
            .write_u32(0x80 - 0x33, at(0x20))
            .write_i32(0x20, 0)
            .write_i32(0x2C, 42)
            .write_u32(0x400 + 0x6C, at(0x800))
            .write_sharp_string(0x800, "abc123", X86)
            .write_u32(0x400 + 0x90, at(0x840))
            .write_sharp_string(0x840, "map.osu", X86)
            .write_u32(0x400 + 0x24, at(0x880))
            .write_sharp_string(0x880, "Title", X86)
            .write_f32(0x400 + 0x2C, 9.3)
            .write_i32(0x400 + 0xC8, 123)
            .write_i32(0x400 + 0x12C, 4)
            .write_i32(0x400 + 0xF8, 512)
            .build();
        let mut memory = memory(reader, &[("baseAddr", 0x80)]);

        match memory.menu("").unwrap() {
            Readout::Ready(MenuReadout::Beatmap(beatmap)) => {
                assert_eq!(beatmap.checksum, "abc123");
                assert_eq!(beatmap.filename, "map.osu");
                assert_eq!(beatmap.title, "Title");
                assert_eq!(beatmap.plays, 42);
                assert_eq!(beatmap.ar, 9.3);
                assert_eq!(beatmap.map_id, 123);
                assert_eq!(beatmap.ranked_status, 4);
                assert_eq!(beatmap.object_count, 512);
            }
            other => panic!("unexpected readout: {:?}", other),
        }

        match memory.menu("abc123").unwrap() {
            Readout::Ready(MenuReadout::Checksum { ranked_status, .. }) => {
                assert_eq!(ranked_status, 4)
            }
            other => panic!("unexpected readout: {:?}", other),
        }
    }

    #[test]
    fn test_menu_not_ready_without_beatmap() {
        let reader = MockMemoryBuilder::new()
            .with_size(0x200)
            .write_u32(0x80 - 0xC, at(0x10))
            .build();
        let mut memory = memory(reader, &[("baseAddr", 0x80)]);

        assert_eq!(memory.menu("").unwrap(), Readout::NotReady("beatmapAddr is 0"));
    }

    #[test]
    fn test_precise_skips_time_on_exit() {
        let reader = MockMemoryBuilder::new()
            .with_size(0x200)
            .write_u32(0x40, at(0x50))
            .write_i32(0x50, GameState::Exit.raw())
            .build();
        let mut memory = memory(reader, &[("statusPtr", 0x40), ("playTimeAddr", 0x60)]);

        let precise = memory.global_precise().unwrap().ready().unwrap();
        assert_eq!(precise.status, 3);
        assert_eq!(precise.play_time, 0);
    }

    #[test]
    fn test_gameplay_reads_score_and_hits() {
        let reader = with_ruleset(MockMemoryBuilder::new().with_size(0x1000))
            .write_u32(0x80 - 0x33, at(0x20))
            .write_i32(0x28, 3)
            .write_u32(0x300 + 0x68, at(0x400))
            .write_i32(0x300 + 0x100, 1_000_000)
            .write_u32(0x400 + 0x38, at(0x500))
            .write_u32(0x400 + 0x40, at(0x700))
            .write_u32(0x400 + 0x48, at(0x780))
            .write_f64(0x780 + 0xC, 100.0)
            .write_f64(0x700 + 0x1C, 200.0)
            .write_u32(0x500 + 0x1C, at(0x7C0))
            .write_i32(0x7C0 + 0xC, 0x55)
            .write_i32(0x7C0 + 0x8, 0x55 ^ 0x8)
            .write_i32(0x500 + 0x64, 0)
            .write_i16(0x500 + 0x8A, 100)
            .write_i16(0x500 + 0x94, 150)
            .write_i16(0x500 + 0x68, 150)
            .build();
        let mut memory = memory(reader, &[("rulesetsAddr", 0x100), ("baseAddr", 0x80)]);

        let context = GameplayContext {
            play_time: 5000,
            first_object: 1000,
            cutting_edge: false,
        };
        let gameplay = memory.gameplay(&context).unwrap().ready().unwrap();
        assert_eq!(gameplay.retries, 3);
        assert_eq!(gameplay.score, 1_000_000);
        assert_eq!(gameplay.mods, OsuMods::HIDDEN);
        assert_eq!(gameplay.statistics.great, 100);
        assert_eq!(gameplay.combo, 150);
        assert!(!gameplay.failed);

        let early = GameplayContext {
            play_time: 0,
            ..context
        };
        let gameplay = memory.gameplay(&early).unwrap().ready().unwrap();
        assert_eq!(gameplay.statistics.great, 0);
        assert_eq!(gameplay.combo, 0);
    }

    #[test]
    fn test_hit_errors_stop_at_garbage() {
        let reader = with_ruleset(MockMemoryBuilder::new().with_size(0x1000))
            .write_u32(0x300 + 0x68, at(0x400))
            .write_u32(0x400 + 0x38, at(0x500))
            .write_u32(0x500 + 0x38, at(0x600))
            .write_u32(0x604, at(0x700))
            .write_i32(0x60C, 4)
            .write_i32(0x708, -12)
            .write_i32(0x70C, 8)
            .write_i32(0x710, 1_000_000)
            .write_i32(0x714, 3)
            .build();
        let mut memory = memory(reader, &[("rulesetsAddr", 0x100)]);

        let errors = memory.hit_errors(0).unwrap().ready().unwrap();
        assert_eq!(errors.errors, vec![-12, 8]);
        assert_eq!(errors.next_index, 2);

        let errors = memory.hit_errors(1).unwrap().ready().unwrap();
        assert_eq!(errors.errors, vec![8]);
        assert_eq!(errors.next_index, 2);
    }

    #[test]
    fn test_key_overlay_missing_in_mania_is_unchanged() {
        let reader = with_ruleset(MockMemoryBuilder::new().with_size(0x1000)).build();
        let mut memory = memory(reader, &[("rulesetsAddr", 0x100)]);

        assert_eq!(memory.key_overlay(3).unwrap(), Readout::Unchanged);
        assert!(matches!(memory.key_overlay(0).unwrap(), Readout::NotReady(_)));
    }

    #[test]
    fn test_key_overlay_osu_has_four_keys() {
        let mut builder = with_ruleset(MockMemoryBuilder::new().with_size(0x1000))
            .write_u32(0x300 + 0xB0, at(0x400))
            .write_u32(0x410, at(0x480))
            .write_u32(0x484, at(0x500))
            .write_i32(0x504, 4);
        for i in 0..4 {
            let button = 0x600 + i * 0x40;
            builder = builder
                .write_u32(0x508 + i * 4, at(button))
                .write_u8(button + 0x1C, (i % 2) as u8)
                .write_i32(button + 0x14, 10 * i as i32);
        }
        let mut memory = memory(builder.build(), &[("rulesetsAddr", 0x100)]);

        let keys = memory.key_overlay(0).unwrap().ready().unwrap();
        let names: Vec<_> = keys.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(names, vec!["K1", "K2", "M1", "M2"]);
        assert!(keys[1].is_pressed);
        assert_eq!(keys[3].count, 30);

        let keys = memory.key_overlay(2).unwrap().ready().unwrap();
        let names: Vec<_> = keys.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(names, vec!["L", "R", "D"]);
    }

    fn leaderboard_row(
        builder: MockMemoryBuilder,
        base: usize,
        entry: Option<usize>,
        name: &str,
        score: i32,
    ) -> MockMemoryBuilder {
        let builder = builder
            .write_u32(base + 0x8, at(base + 0x100))
            .write_sharp_string(base + 0x100, name, X86)
            .write_i32(base + 0x30, score)
            .write_i32(base + 0x2C, 1);
        match entry {
            Some(entry) => builder
                .write_u32(base + 0x20, at(entry))
                .write_u32(entry + 0x1C, at(entry + 0x100))
                .write_i16(entry + 0x8A, 50),
            None => builder,
        }
    }

    #[test]
    fn test_leaderboard_reads_rows() {
        let builder = with_ruleset(MockMemoryBuilder::new().with_size(0x3000))
            .write_u32(0x300 + 0x7C, at(0x400))
            .write_u32(0x400 + 0x24, at(0x480))
            .write_u32(0x480 + 0x10, at(0x1000))
            .write_u32(0x1000 + 0x24, at(0x1800))
            .write_u8(0x1800 + 0x20, 1)
            .write_u32(0x484, at(0x500))
            .write_u32(0x504, at(0x580))
            .write_i32(0x50C, 2)
            .write_u32(0x588, at(0x1200))
            .write_u32(0x58C, at(0x1400));
        let builder = leaderboard_row(builder, 0x1000, Some(0x2000), "me", 10);
        let builder = leaderboard_row(builder, 0x1200, Some(0x2200), "first", 30);
        let builder = leaderboard_row(builder, 0x1400, Some(0x2400), "second", 20);
        let mut memory = memory(builder.build(), &[("rulesetsAddr", 0x100)]);

        let board = memory.leaderboard(0).unwrap().ready().unwrap();
        assert!(board.is_visible);
        assert_eq!(board.player.unwrap().name, "me");
        let names: Vec<_> = board.players.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert_eq!(board.players[0].statistics.great, 50);
    }

    #[test]
    fn test_leaderboard_discards_inconsistent_rebuild() {
        let builder = with_ruleset(MockMemoryBuilder::new().with_size(0x3000))
            .write_u32(0x300 + 0x7C, at(0x400))
            .write_u32(0x400 + 0x24, at(0x480))
            .write_u32(0x480 + 0x10, at(0x1000))
            .write_u32(0x1000 + 0x24, at(0x1800))
            .write_u32(0x484, at(0x500))
            .write_u32(0x504, at(0x580))
            .write_i32(0x50C, 2)
            .write_u32(0x588, at(0x1200))
            .write_u32(0x58C, at(0x1400));
        let builder = leaderboard_row(builder, 0x1000, Some(0x2000), "me", 10);
        let builder = leaderboard_row(builder, 0x1200, Some(0x2200), "first", 30);
        let builder = leaderboard_row(builder, 0x1400, None, "broken", 0);
        let mut memory = memory(builder.build(), &[("rulesetsAddr", 0x100)]);

        assert!(matches!(memory.leaderboard(0).unwrap(), Readout::NotReady(_)));
    }

    #[test]
    fn test_leaderboard_missing_base_is_empty() {
        let reader = with_ruleset(MockMemoryBuilder::new().with_size(0x1000)).build();
        let mut memory = memory(reader, &[("rulesetsAddr", 0x100)]);

        let board = memory.leaderboard(0).unwrap().ready().unwrap();
        assert!(!board.is_visible);
        assert!(board.player.is_none());
        assert!(board.players.is_empty());
    }

    #[test]
    fn test_tourney_user_slot_empty() {
        let reader = MockMemoryBuilder::new()
            .with_size(0x200)
            .write_u32(0x40, at(0x50))
            .build();
        let mut memory = memory(reader, &[("spectatingUserPtr", 0x40)]);

        assert_eq!(
            memory.tourney_user().unwrap(),
            Readout::NotReady("Slot is not equiped")
        );
    }

    #[test]
    fn test_settings_decodes_known_keys() {
        // configurationAddr at 0x40 -> slot 0x50 -> dictionary at 0x100.
        let reader = MockMemoryBuilder::new()
            .with_size(0x2000)
            .write_u32(0x40, at(0x50))
            .write_u32(0x50, at(0x100))
            .write_u32(0x108, at(0x200))
            .write_i32(0x11C, 3)
            // entry 0: VolumeMusic
            .write_u32(0x208, at(0x400))
            .write_sharp_string(0x400, "VolumeMusic", X86)
            .write_u32(0x20C, at(0x500))
            .write_f64(0x504, 70.0)
            // entry 1: unknown key
            .write_u32(0x218, at(0x440))
            .write_sharp_string(0x440, "SomethingElse", X86)
            // entry 2: Skin
            .write_u32(0x228, at(0x480))
            .write_sharp_string(0x480, "Skin", X86)
            .write_u32(0x22C, at(0x540))
            .write_u32(0x544, at(0x580))
            .write_sharp_string(0x580, "- Custom -", X86)
            .build();
        let mut memory = memory(reader, &[("configurationAddr", 0x40)]);

        let settings = memory.settings().unwrap().ready().unwrap();
        assert_eq!(
            settings.get("audio.volume.music"),
            Some(&ConfigValue::Number(70.0))
        );
        assert_eq!(
            settings.get("skin.name"),
            Some(&ConfigValue::Text("- Custom -".to_string()))
        );
        assert_eq!(settings.values.len(), 2);
        assert!(settings.failed.is_empty());
        assert!(settings.mania_speed_error.is_none());
    }

    #[test]
    fn test_unresolved_address_is_error() {
        let reader = MockMemoryBuilder::new().with_size(0x100).build();
        let mut memory = memory(reader, &[]);

        assert!(matches!(memory.user(), Err(Error::ResolutionFailed(_))));
    }
}
