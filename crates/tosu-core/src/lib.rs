pub mod calculator;
pub mod config;
pub mod error;
pub mod game;
pub mod instance;
pub mod manager;
pub mod memory;
pub mod offset;
pub mod process;
pub mod retry;
pub mod states;

pub use calculator::{DifficultyCalculator, NoopCalculator};
pub use config::Config;
pub use error::{Error, Result};
pub use game::{
    BanchoStatus, BeatmapStatus, ClientType, GameState, Grade, LeaderboardPlayer, OsuFile, OsuMods, Ruleset,
    Statistics,
};
pub use instance::{Instance, InstanceEvent, InstanceInfo};
pub use manager::{AnswerKind, ClientArgs, InstanceManager, PatternTables};
pub use memory::{GameMemory, LazerMemory, Readout, StableMemory};
pub use offset::{PatternTable, lazer_patterns, load_patterns, save_patterns, stable_patterns};
pub use process::{ProcessProvider, SystemProcessProvider};
pub use states::States;
