mod collection;
mod resolver;
mod signature;

pub use collection::ResolvedAddresses;
pub use resolver::resolve_patterns;
pub use signature::{
    CHAT_AREA_PATTERN, MANIA_SCROLL_SPEED_PATTERN, PatternEntry, PatternTable,
    lazer_patterns, load_patterns, parse_pattern, save_patterns, stable_patterns,
};
