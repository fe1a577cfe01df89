use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::process::Signature;

/// One named pattern to resolve.
///
/// The resolved address is `match_address + offset`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternEntry {
    pub name: String,
    pub pattern: String,
    #[serde(default)]
    pub offset: i64,
    /// Only required while the instance is a tournament spectator.
    #[serde(default)]
    pub tourney_only: bool,
    /// Wildcards must match a non-zero byte.
    #[serde(default)]
    pub non_zero_mask: bool,
}

impl PatternEntry {
    pub fn new(name: &str, pattern: &str, offset: i64) -> Self {
        Self {
            name: name.to_string(),
            pattern: pattern.to_string(),
            offset,
            tourney_only: false,
            non_zero_mask: false,
        }
    }

    pub fn tourney_only(mut self) -> Self {
        self.tourney_only = true;
        self
    }

    pub fn signature(&self) -> Result<Signature> {
        Ok(Signature::new(parse_pattern(&self.pattern)?).with_non_zero_mask(self.non_zero_mask))
    }

    /// Apply the signed offset to a match address.
    pub fn apply(&self, address: u64) -> u64 {
        address.wrapping_add_signed(self.offset)
    }
}

/// A complete pattern table for one client variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternTable {
    pub version: String,
    pub entries: Vec<PatternEntry>,
}

impl PatternTable {
    pub fn entry(&self, name: &str) -> Option<&PatternEntry> {
        self.entries
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
    }

    /// Reject tables with malformed patterns or duplicate names.
    pub fn validate(&self) -> Result<()> {
        for (i, entry) in self.entries.iter().enumerate() {
            entry.signature()?;
            if self.entries[..i]
                .iter()
                .any(|other| other.name.eq_ignore_ascii_case(&entry.name))
            {
                return Err(Error::InvalidSignature(format!(
                    "Duplicate pattern name '{}'",
                    entry.name
                )));
            }
        }
        Ok(())
    }
}

pub fn load_patterns<P: AsRef<Path>>(path: P) -> Result<PatternTable> {
    let content = fs::read_to_string(&path)?;
    let table: PatternTable = serde_json::from_str(&content)?;
    table.validate()?;
    Ok(table)
}

pub fn save_patterns<P: AsRef<Path>>(path: P, table: &PatternTable) -> Result<()> {
    let content = serde_json::to_string_pretty(table)?;
    fs::write(path, content)?;
    Ok(())
}

pub fn parse_pattern(pattern: &str) -> Result<Vec<Option<u8>>> {
    let mut bytes = Vec::new();
    for token in pattern.split_whitespace() {
        if token == "??" || token == "?" {
            bytes.push(None);
            continue;
        }

        let value = u8::from_str_radix(token, 16).map_err(|e| {
            Error::InvalidSignature(format!("Invalid signature token '{}': {}", token, e))
        })?;
        bytes.push(Some(value));
    }

    if bytes.is_empty() {
        return Err(Error::InvalidSignature(
            "Signature pattern is empty".to_string(),
        ));
    }

    Ok(bytes)
}

/// Pattern used for the tournament chat engine, scanned on first use.
pub const CHAT_AREA_PATTERN: &str = "A1 ?? ?? ?? ?? 89 45 F0 8B D1 85 C9 75";

/// Pattern used for the mania scroll speed, scanned on first use in mania.
pub const MANIA_SCROLL_SPEED_PATTERN: &str =
    "A3 ?? ?? ?? ?? EB ?? DD 45 08 DB 5D E8 8B 45 E8 83 F8 28";

/// Built-in table for the 32-bit stable client.
pub fn stable_patterns() -> PatternTable {
    PatternTable {
        version: "stable".to_string(),
        entries: vec![
            PatternEntry::new("baseAddr", "F8 01 74 04 83 65", 0),
            PatternEntry::new("playTimeAddr", "5E 5F 5D C3 A1 ?? ?? ?? ?? 89 ?? 04", 0),
            PatternEntry::new("chatCheckerPtr", "8B CE 83 3D ?? ?? ?? ?? 00 75 ?? 80", 0x4),
            PatternEntry::new(
                "skinDataAddr",
                "74 2C 85 FF 75 28 A1 ?? ?? ?? ?? 8D 15",
                0,
            ),
            PatternEntry::new("settingsClassAddr", "83 E0 20 85 C0 7E 2F", 0),
            PatternEntry::new(
                "configurationAddr",
                "8D 45 EC 50 8B 0D ?? ?? ?? ?? 8B D7 39 09 E8 ?? ?? ?? ?? 85 C0 74 ?? 8B 4D EC",
                0x6,
            ),
            PatternEntry::new(
                "bindingsAddr",
                "8D 7D D0 B9 08 00 00 00 33 C0 F3 AB 8B CE 89 4D DC B9",
                0x2A,
            ),
            PatternEntry::new("rulesetsAddr", "7D 15 A1 ?? ?? ?? ?? 85 C0", 0),
            PatternEntry::new(
                "canRunSlowlyAddr",
                "55 8B EC 80 3D ?? ?? ?? ?? 00 75 26 80 3D",
                0,
            ),
            PatternEntry::new("statusPtr", "48 83 F8 04 73 1E", -0x4),
            PatternEntry::new(
                "menuModsPtr",
                "C8 FF ?? ?? ?? ?? ?? 81 0D ?? ?? ?? ?? ?? 08 00 00",
                0x9,
            ),
            PatternEntry::new(
                "getAudioLengthPtr",
                "55 8B EC 83 EC 08 A1 ?? ?? ?? ?? 85 C0",
                0x7,
            ),
            PatternEntry::new(
                "userProfilePtr",
                "FF 15 ?? ?? ?? ?? A1 ?? ?? ?? ?? 8B 48 54 33 D2",
                0x7,
            ),
            PatternEntry::new("rawLoginStatusPtr", "B8 0B 00 00 8B 35", -0xB),
            PatternEntry::new(
                "spectatingUserPtr",
                "8B 0D ?? ?? ?? ?? 85 C0 74 05 8B 50 30",
                -0x4,
            )
            .tourney_only(),
            PatternEntry::new("gameTimePtr", "A1 ?? ?? ?? ?? 89 46 04 8B D6 E8", 0x1),
        ],
    }
}

const SPECTATOR_CLIENT_PATTERN: &str = "3F 00 00 80 3F 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 80 3F 00 00 80 3F 00 00 80 3F 00 00 80 3F 00 00 80 3F 00 00 80 3F 00 00 80 3F 00 00 80 3F 00 00 80 3F 00 00 80 3F 00 00 80 3F 00 00 80 3F 00 00 80 3F 00 00 80 3F 00 00 80 3F 00 00 80 3F 00 00 80 3F 01 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 ?? 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00";

/// Built-in table for the 64-bit lazer client.
pub fn lazer_patterns() -> PatternTable {
    PatternTable {
        version: "lazer".to_string(),
        entries: vec![PatternEntry::new(
            "spectatorClient",
            SPECTATOR_CLIENT_PATTERN,
            -0x16F,
        )],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pattern() {
        let bytes = parse_pattern("A1 ?? ? 89").unwrap();
        assert_eq!(bytes, vec![Some(0xA1), None, None, Some(0x89)]);
    }

    #[test]
    fn test_parse_pattern_invalid_token() {
        let result = parse_pattern("A1 ZZ");
        assert!(matches!(result, Err(Error::InvalidSignature(_))));
    }

    #[test]
    fn test_parse_pattern_empty() {
        assert!(parse_pattern("   ").is_err());
    }

    #[test]
    fn test_apply_negative_offset() {
        let entry = PatternEntry::new("statusPtr", "48 83 F8 04 73 1E", -0x4);
        assert_eq!(entry.apply(0x1000), 0x0FFC);
    }

    #[test]
    fn test_builtin_tables_are_valid() {
        stable_patterns().validate().unwrap();
        lazer_patterns().validate().unwrap();
        assert!(parse_pattern(CHAT_AREA_PATTERN).is_ok());
        assert!(parse_pattern(MANIA_SCROLL_SPEED_PATTERN).is_ok());
    }

    #[test]
    fn test_stable_table_shape() {
        let table = stable_patterns();
        assert_eq!(table.entries.len(), 16);

        let tourney: Vec<_> = table
            .entries
            .iter()
            .filter(|e| e.tourney_only)
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(tourney, vec!["spectatingUserPtr"]);
        assert_eq!(table.entry("BINDINGSADDR").unwrap().offset, 0x2A);
    }

    #[test]
    fn test_lazer_pattern_length() {
        let table = lazer_patterns();
        let sig = table.entries[0].signature().unwrap();
        assert_eq!(sig.len(), 161);
        assert_eq!(sig.bytes.iter().filter(|b| b.is_none()).count(), 1);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let table = PatternTable {
            version: "test".to_string(),
            entries: vec![
                PatternEntry::new("a", "01", 0),
                PatternEntry::new("A", "02", 0),
            ],
        };
        assert!(table.validate().is_err());
    }

    #[test]
    fn test_save_and_load_patterns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patterns.json");

        let table = stable_patterns();
        save_patterns(&path, &table).unwrap();
        let loaded = load_patterns(&path).unwrap();

        assert_eq!(loaded, table);
    }

    #[test]
    fn test_load_defaults_optional_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patterns.json");
        fs::write(
            &path,
            r#"{ "version": "custom", "entries": [ { "name": "baseAddr", "pattern": "F8 01" } ] }"#,
        )
        .unwrap();

        let table = load_patterns(&path).unwrap();
        let entry = &table.entries[0];
        assert_eq!(entry.offset, 0);
        assert!(!entry.tourney_only);
        assert!(!entry.non_zero_mask);
    }
}
