//! 64-bit lazer client reader.
//!
//! Everything is reached from the game object, found once through the
//! spectator client. Lazer has no tournament client and its settings live
//! in a database, so those capabilities report `NotImplemented`.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;

use super::types::*;
use super::{GameMemory, Readout};
use crate::error::{Error, Result};
use crate::game::{BeatmapStatus, ClientType, GameState, KeyOverlayButton, OsuMods, Statistics};
use crate::offset::{PatternTable, ResolvedAddresses, lazer_patterns, resolve_patterns};
use crate::process::{GameProcess, ManagedReader, ReadMemory};

#[derive(Debug, Deserialize)]
struct ModAcronym {
    acronym: String,
}

fn not_implemented<T>(capability: &'static str) -> Result<T> {
    Err(Error::NotImplemented {
        client: ClientType::Lazer.as_str(),
        capability,
    })
}

/// Relative path of a file in lazer's hashed storage.
fn storage_path(hash: &str) -> String {
    match (hash.get(..1), hash.get(..2)) {
        (Some(first), Some(prefix)) => format!("{}\\{}\\{}", first, prefix, hash),
        _ => String::new(),
    }
}

struct CurrentBeatmap {
    info: u64,
    set_info: u64,
}

/// Reader for the lazer client.
pub struct LazerMemory<P> {
    reader: ManagedReader<Arc<P>>,
    pid: u32,
    table: PatternTable,
    addresses: ResolvedAddresses,
    game_base: u64,
    /// Status derived by the last regular read, reused by the precise loop.
    status: i32,
}

impl<P: GameProcess> LazerMemory<P> {
    pub fn new(process: Arc<P>, table: PatternTable) -> Self {
        let pid = process.pid();
        Self {
            reader: ManagedReader::x64(process),
            pid,
            table,
            addresses: ResolvedAddresses::new(),
            game_base: 0,
            status: GameState::Menu.raw(),
        }
    }

    /// Build a reader over an already resolved address table.
    pub fn with_addresses(process: Arc<P>, addresses: ResolvedAddresses) -> Self {
        let mut memory = Self::new(process, lazer_patterns());
        memory.addresses = addresses;
        memory
    }

    fn ptr(&self, address: u64) -> Result<u64> {
        self.reader.read_ptr(address)
    }

    fn string(&self, address: u64) -> Result<String> {
        self.reader.read_string_at(address)
    }

    fn game_base(&mut self) -> Result<u64> {
        if self.game_base == 0 {
            let spectator = self.addresses.require("spectatorClient")?;
            let client = self.ptr(spectator + 0x90)?;
            self.game_base = self.ptr(client + 0x90)?;
        }
        Ok(self.game_base)
    }

    fn is_player(&self, screen: u64) -> Result<bool> {
        Ok(self.reader.read_u8(screen + 0x318)? == 1
            && self.reader.read_u8(screen + 0x319)? == 1
            && self.ptr(screen + 0x360)? == 0
            && self.ptr(screen + 0x218)? == 0)
    }

    /// The player screen, when one is on top of the screen stack.
    fn player(&mut self) -> Result<u64> {
        let game = self.game_base()?;
        let screen_stack = self.ptr(game + 0x5F0)?;
        let stack = self.ptr(screen_stack + 0x320)?;
        let items = self.ptr(stack + 0x8)?;

        for slot in [0x30, 0x38] {
            let screen = self.ptr(items + slot)?;
            if screen != 0 && self.is_player(screen)? {
                return Ok(screen);
            }
        }
        Ok(0)
    }

    fn score_info(&mut self) -> Result<u64> {
        let player = self.player()?;
        if player == 0 {
            return Ok(0);
        }
        let score = self.ptr(player + 0x470)?;
        if score == 0 {
            return Ok(0);
        }
        self.ptr(score + 0x8)
    }

    fn mods(&self, score_info: u64) -> Result<OsuMods> {
        let json = self.string(score_info + 0x50)?;
        if json.is_empty() {
            return Ok(OsuMods::NONE);
        }
        let acronyms: Vec<ModAcronym> = serde_json::from_str(&json)?;
        let acronyms: Vec<&str> = acronyms.iter().map(|m| m.acronym.as_str()).collect();
        Ok(OsuMods::from_acronyms(&acronyms))
    }

    fn current_time(&mut self) -> Result<f64> {
        let game = self.game_base()?;
        let clock = self.ptr(game + 0x4C8)?;
        let source = self.ptr(clock + 0x210)?;
        self.reader.read_f64(source + 0x30)
    }

    fn base_path(&mut self) -> Result<String> {
        let game = self.game_base()?;
        let storage = self.ptr(game + 0x440)?;
        let underlying = self.ptr(storage + 0x10)?;
        self.string(underlying + 0x8)
    }

    fn current_beatmap(&mut self) -> Result<CurrentBeatmap> {
        let game = self.game_base()?;
        let bindable = self.ptr(game + 0x450)?;
        let working = self.ptr(bindable + 0x20)?;
        Ok(CurrentBeatmap {
            info: self.ptr(working + 0x8)?,
            set_info: self.ptr(working + 0x10)?,
        })
    }

    /// File name to storage hash for every file of a beatmap set.
    fn beatmap_files(&self, set_info: u64) -> Result<HashMap<String, String>> {
        let files = self.ptr(set_info + 0x20)?;
        let mut result = HashMap::new();
        for file in self.reader.read_list_pointers(files)? {
            let realm_file = self.ptr(file + 0x18)?;
            let hash = self.string(realm_file + 0x18)?;
            let name = self.string(file + 0x20)?;
            result.insert(name, hash);
        }
        Ok(result)
    }
}

impl<P: GameProcess> GameMemory for LazerMemory<P> {
    fn client(&self) -> ClientType {
        ClientType::Lazer
    }

    fn pid(&self) -> u32 {
        self.pid
    }

    fn resolve(&mut self, spectating: bool) -> Result<()> {
        self.addresses = resolve_patterns(self.reader.inner(), &self.table, spectating)?;
        self.game_base = 0;
        Ok(())
    }

    fn global(&mut self) -> Result<Readout<GlobalReadout>> {
        let files = std::path::Path::new(&self.base_path()?)
            .join("files")
            .to_string_lossy()
            .into_owned();

        self.status = if self.score_info()? != 0 {
            GameState::Play.raw()
        } else {
            GameState::Menu.raw()
        };

        Ok(Readout::Ready(GlobalReadout {
            status: self.status,
            skin_folder: files.clone(),
            memory_songs_folder: files,
            ..GlobalReadout::default()
        }))
    }

    fn global_precise(&mut self) -> Result<Readout<GlobalPreciseReadout>> {
        let play_time = self.current_time()?;
        Ok(Readout::Ready(GlobalPreciseReadout {
            status: self.status,
            play_time: play_time as i32,
        }))
    }

    fn menu(&mut self, previous_checksum: &str) -> Result<Readout<MenuReadout>> {
        let beatmap = self.current_beatmap()?;
        if beatmap.info == 0 {
            return Ok(Readout::NotReady("beatmap info is 0"));
        }

        let checksum = self.string(beatmap.info + 0x58)?;
        if checksum == previous_checksum {
            return Ok(Readout::Unchanged);
        }

        let ruleset_info = self.ptr(beatmap.info + 0x20)?;
        let metadata = self.ptr(beatmap.info + 0x30)?;
        let difficulty = self.ptr(beatmap.info + 0x28)?;
        let author = self.ptr(metadata + 0x38)?;
        let hash = self.string(beatmap.info + 0x50)?;

        let files = self.beatmap_files(beatmap.set_info)?;
        let file_path = |name: String| {
            files
                .get(&name)
                .map(|hash| storage_path(hash))
                .unwrap_or_default()
        };
        let audio_filename = file_path(self.string(metadata + 0x50)?);
        let background_filename = file_path(self.string(metadata + 0x58)?);
        let ranked_status = BeatmapStatus::from_lazer(self.reader.read_i32(beatmap.info + 0xA8)?);

        Ok(Readout::Ready(MenuReadout::Beatmap(Box::new(BeatmapReadout {
            gamemode: self.reader.read_i32(ruleset_info + 0x30)?,
            checksum,
            filename: storage_path(&hash),
            plays: 0,
            title: self.string(metadata + 0x18)?,
            title_original: self.string(metadata + 0x20)?,
            artist: self.string(metadata + 0x28)?,
            artist_original: self.string(metadata + 0x30)?,
            ar: self.reader.read_f32(difficulty + 0x34)?,
            cs: self.reader.read_f32(difficulty + 0x2C)?,
            hp: self.reader.read_f32(difficulty + 0x28)?,
            od: self.reader.read_f32(difficulty + 0x30)?,
            audio_filename,
            background_filename,
            folder: String::new(),
            creator: self.string(author + 0x18)?,
            difficulty: self.string(metadata + 0x18)?,
            map_id: self.reader.read_i32(beatmap.info + 0xAC)?,
            set_id: self.reader.read_i32(beatmap.set_info + 0x30)?,
            ranked_status: ranked_status as i32,
            object_count: self.reader.read_i32(beatmap.info + 0xB4)?,
        }))))
    }

    fn mp3_length(&mut self) -> Result<f64> {
        let beatmap = self.current_beatmap()?;
        self.reader.read_f64(beatmap.info + 0x78)
    }

    fn result_screen(&mut self) -> Result<Readout<ResultScreenReadout>> {
        Ok(Readout::Ready(ResultScreenReadout::default()))
    }

    fn gameplay(&mut self, _context: &GameplayContext) -> Result<Readout<GameplayReadout>> {
        let score_info = self.score_info()?;
        if score_info == 0 {
            return Ok(Readout::NotReady("No ScoreInfo found"));
        }

        let mods = self.mods(score_info)?;
        let user = self.ptr(score_info + 0x48)?;
        let ruleset = self.ptr(score_info + 0x30)?;
        let statistics = self.ptr(score_info + 0x78)?;
        if statistics == 0 {
            return Ok(Readout::NotReady("No Statistics"));
        }

        let entries = self.ptr(statistics + 0x10)?;
        let mut hits = Statistics::default();
        if entries != 0 {
            hits.miss = self.reader.read_i32(entries + 0x2C)?;
            hits.meh = self.reader.read_i32(entries + 0x3C)?;
            hits.ok = self.reader.read_i32(entries + 0x4C)?;
            hits.great = self.reader.read_i32(entries + 0x6C)?;
        }

        Ok(Readout::Ready(GameplayReadout {
            retries: 0,
            player_name: self.string(user + 0x18)?,
            mods,
            mode: self.reader.read_i32(ruleset + 0x30)?,
            score: self.reader.read_f64(score_info + 0x98)?.round() as i64,
            player_hp_smooth: 100.0,
            player_hp: 100.0,
            accuracy: self.reader.read_f64(score_info + 0xA8)?,
            statistics: hits,
            combo: self.reader.read_i32(score_info + 0xCC)?,
            max_combo: self.reader.read_i32(score_info + 0xC4)?,
            failed: false,
        }))
    }

    fn key_overlay(&mut self, _mode: i32) -> Result<Readout<KeyOverlayReadout>> {
        Ok(Readout::Ready(
            ["K1", "K2", "M1", "M2"]
                .iter()
                .map(|name| KeyOverlayButton::new(name, false, 0))
                .collect(),
        ))
    }

    fn hit_errors(&mut self, from: usize) -> Result<Readout<HitErrorsReadout>> {
        Ok(Readout::Ready(HitErrorsReadout {
            next_index: from,
            errors: Vec::new(),
        }))
    }

    fn leaderboard(&mut self, _mode: i32) -> Result<Readout<LeaderboardReadout>> {
        Ok(Readout::Ready(LeaderboardReadout::default()))
    }

    fn audio_velocity_base(&mut self) -> Result<Readout<Vec<f32>>> {
        Ok(Readout::Ready(Vec::new()))
    }

    fn settings(&mut self) -> Result<Readout<SettingsReadout>> {
        not_implemented("settings")
    }

    fn tourney(&mut self) -> Result<Readout<TourneyReadout>> {
        not_implemented("tourney")
    }

    fn tourney_chat(
        &mut self,
        _known_count: usize,
        _show_mp_commands: bool,
    ) -> Result<Option<Vec<ChatMessage>>> {
        not_implemented("tourney chat")
    }

    fn tourney_user(&mut self) -> Result<Readout<TourneyUserReadout>> {
        not_implemented("tourney user")
    }

    fn user(&mut self) -> Result<Readout<UserReadout>> {
        Ok(Readout::Ready(UserReadout::guest()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ManagedLayout;
    use crate::process::mock::{MockMemoryBuilder, MockMemoryReader};

    const BASE: u64 = 0x1000;
    const X64: &ManagedLayout = &ManagedLayout::X64;

    fn at(offset: usize) -> u64 {
        BASE + offset as u64
    }

    /// Store a pointer at `slot` to a new string object at `object`.
    fn string_ptr(builder: MockMemoryBuilder, slot: usize, object: usize, text: &str) -> MockMemoryBuilder {
        builder
            .write_u64(slot, at(object))
            .write_sharp_string(object, text, X64)
    }

    const GAME: usize = 0x1000;
    const PLAYER: usize = 0x3000;
    const SCORE_INFO: usize = 0x4000;
    const INFO: usize = 0x6200;
    const SET: usize = 0x6600;

    fn image(playing: bool) -> MockMemoryReader {
        let mut b = MockMemoryBuilder::new()
            .x64(true)
            .with_size(0x9000)
            // spectator client -> game base
            .write_u64(0x90, at(0x100))
            .write_u64(0x190, at(GAME))
            // screen stack
            .write_u64(GAME + 0x5F0, at(0x2000))
            .write_u64(0x2000 + 0x320, at(0x2400))
            .write_u64(0x2408, at(0x2500))
            // clock
            .write_u64(GAME + 0x4C8, at(0x5400))
            .write_u64(0x5400 + 0x210, at(0x5800))
            .write_f64(0x5830, 1234.5)
            // storage
            .write_u64(GAME + 0x440, at(0x5000))
            .write_u64(0x5010, at(0x5100));
        b = string_ptr(b, 0x5108, 0x5200, "C:\\osu");

        if playing {
            b = b
                .write_u64(0x2500 + 0x30, at(PLAYER))
                .write_u8(PLAYER + 0x318, 1)
                .write_u8(PLAYER + 0x319, 1)
                .write_u64(PLAYER + 0x470, at(0x3800))
                .write_u64(0x3808, at(SCORE_INFO))
                .write_u64(SCORE_INFO + 0x30, at(0x4C00))
                .write_i32(0x4C30, 0)
                .write_u64(SCORE_INFO + 0x48, at(0x4A00))
                .write_u64(SCORE_INFO + 0x78, at(0x4D00))
                .write_u64(0x4D10, at(0x4E00))
                .write_i32(0x4E2C, 1)
                .write_i32(0x4E3C, 2)
                .write_i32(0x4E4C, 3)
                .write_i32(0x4E6C, 100)
                .write_f64(SCORE_INFO + 0x98, 123_456.0)
                .write_f64(SCORE_INFO + 0xA8, 97.5)
                .write_i32(SCORE_INFO + 0xCC, 50)
                .write_i32(SCORE_INFO + 0xC4, 80);
            b = string_ptr(b, SCORE_INFO + 0x50, 0x4800, r#"[{"acronym":"HD"},{"acronym":"DT"}]"#);
            b = string_ptr(b, 0x4A18, 0x4B00, "peppy");
        }

        // beatmap
        b = b
            .write_u64(GAME + 0x450, at(0x6000))
            .write_u64(0x6020, at(0x6100))
            .write_u64(0x6108, at(INFO))
            .write_u64(0x6110, at(SET))
            .write_u64(INFO + 0x20, at(0x7100))
            .write_i32(0x7130, 1)
            .write_u64(INFO + 0x30, at(0x7200))
            .write_u64(INFO + 0x28, at(0x7400))
            .write_f32(0x7434, 9.0)
            .write_f64(INFO + 0x78, 90_000.0)
            .write_i32(INFO + 0xA8, 1)
            .write_i32(INFO + 0xAC, 77)
            .write_i32(INFO + 0xB4, 300)
            .write_i32(SET + 0x30, 55)
            .write_u64(0x7238, at(0x7700))
            // files list with two entries
            .write_u64(SET + 0x20, at(0x8000))
            .write_u64(0x8008, at(0x8100))
            .write_i32(0x8010, 2)
            .write_u64(0x8110, at(0x8200))
            .write_u64(0x8118, at(0x8400))
            .write_u64(0x8218, at(0x8280))
            .write_u64(0x8418, at(0x8480));
        b = string_ptr(b, INFO + 0x58, 0x7000, "md5sum");
        b = string_ptr(b, INFO + 0x50, 0x7500, "abcdef");
        b = string_ptr(b, 0x7218, 0x7600, "Song");
        b = string_ptr(b, 0x7718, 0x7780, "mapper");
        b = string_ptr(b, 0x7250, 0x7800, "audio.mp3");
        b = string_ptr(b, 0x7258, 0x7880, "bg.jpg");
        b = string_ptr(b, 0x8220, 0x8300, "audio.mp3");
        b = string_ptr(b, 0x8298, 0x8380, "1234hash");
        b = string_ptr(b, 0x8420, 0x8500, "bg.jpg");
        b = string_ptr(b, 0x8498, 0x8580, "9876hash");
        b.build()
    }

    fn memory(playing: bool) -> LazerMemory<MockMemoryReader> {
        let mut addresses = ResolvedAddresses::new();
        addresses.insert("spectatorClient", BASE, false);
        LazerMemory::with_addresses(Arc::new(image(playing)), addresses)
    }

    #[test]
    fn test_storage_path() {
        assert_eq!(storage_path("abcdef"), "a\\ab\\abcdef");
        assert_eq!(storage_path(""), "");
    }

    #[test]
    fn test_global_status_follows_score_info() {
        let mut idle = memory(false);
        let global = idle.global().unwrap().ready().unwrap();
        assert_eq!(global.status, GameState::Menu.raw());
        assert!(global.skin_folder.ends_with("files"));

        let mut playing = memory(true);
        let global = playing.global().unwrap().ready().unwrap();
        assert_eq!(global.status, GameState::Play.raw());

        let precise = playing.global_precise().unwrap().ready().unwrap();
        assert_eq!(precise.status, GameState::Play.raw());
        assert_eq!(precise.play_time, 1234);
    }

    #[test]
    fn test_menu_resolves_storage_paths() {
        let mut memory = memory(false);

        let Readout::Ready(MenuReadout::Beatmap(beatmap)) = memory.menu("").unwrap() else {
            panic!("expected a beatmap readout");
        };
        assert_eq!(beatmap.checksum, "md5sum");
        assert_eq!(beatmap.filename, "a\\ab\\abcdef");
        assert_eq!(beatmap.audio_filename, "1\\12\\1234hash");
        assert_eq!(beatmap.background_filename, "9\\98\\9876hash");
        assert_eq!(beatmap.title, "Song");
        assert_eq!(beatmap.creator, "mapper");
        assert_eq!(beatmap.gamemode, 1);
        assert_eq!(beatmap.ar, 9.0);
        assert_eq!(beatmap.map_id, 77);
        assert_eq!(beatmap.set_id, 55);
        assert_eq!(beatmap.ranked_status, BeatmapStatus::Ranked as i32);
        assert_eq!(beatmap.object_count, 300);

        assert_eq!(memory.menu("md5sum").unwrap(), Readout::Unchanged);
        assert_eq!(memory.mp3_length().unwrap(), 90_000.0);
    }

    #[test]
    fn test_gameplay_reads_score_info() {
        let mut memory = memory(true);

        let gameplay = memory
            .gameplay(&GameplayContext::default())
            .unwrap()
            .ready()
            .unwrap();
        assert_eq!(gameplay.player_name, "peppy");
        assert_eq!(gameplay.mods, OsuMods::HIDDEN | OsuMods::DOUBLE_TIME);
        assert_eq!(gameplay.score, 123_456);
        assert_eq!(gameplay.statistics.great, 100);
        assert_eq!(gameplay.statistics.ok, 3);
        assert_eq!(gameplay.statistics.meh, 2);
        assert_eq!(gameplay.statistics.miss, 1);
        assert_eq!(gameplay.combo, 50);
        assert_eq!(gameplay.max_combo, 80);
        assert_eq!(gameplay.player_hp, 100.0);
    }

    #[test]
    fn test_gameplay_not_ready_outside_player() {
        let mut memory = memory(false);
        assert_eq!(
            memory.gameplay(&GameplayContext::default()).unwrap(),
            Readout::NotReady("No ScoreInfo found")
        );
    }

    #[test]
    fn test_unsupported_capabilities() {
        let mut memory = memory(false);

        assert!(matches!(
            memory.settings(),
            Err(Error::NotImplemented { client: "lazer", .. })
        ));
        assert!(matches!(memory.tourney(), Err(Error::NotImplemented { .. })));
        assert!(matches!(memory.tourney_chat(0, false), Err(Error::NotImplemented { .. })));
        assert!(matches!(memory.tourney_user(), Err(Error::NotImplemented { .. })));
    }

    #[test]
    fn test_guest_user() {
        let mut memory = memory(false);
        let user = memory.user().unwrap().ready().unwrap();
        assert_eq!(user.name, "Guest");
        assert_eq!(user.rank, 1);
        assert_eq!(user.background_colour, 0xFFFF_FFFF);
    }
}
