mod calculators;
mod enums;
mod mods;
mod osu_file;
mod score;

pub use calculators::*;
pub use enums::*;
pub use mods::*;
pub use osu_file::*;
pub use score::*;
