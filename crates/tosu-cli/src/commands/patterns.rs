//! Built-in pattern table export.

use std::fs;
use std::path::Path;

use anyhow::Result;
use tosu_core::{lazer_patterns, save_patterns, stable_patterns};

/// Write `stable.json` and `lazer.json` into `output`.
///
/// Edited copies can be passed back with `--stable-patterns` and
/// `--lazer-patterns`.
pub fn run(output: &Path) -> Result<()> {
    fs::create_dir_all(output)?;

    for (file, table) in [("stable.json", stable_patterns()), ("lazer.json", lazer_patterns())] {
        let path = output.join(file);
        save_patterns(&path, &table)?;
        println!("Wrote {} patterns to {}", table.entries.len(), path.display());
    }
    Ok(())
}
