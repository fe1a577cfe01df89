//! Pattern table resolution.
//!
//! All signatures of a table are scanned in one batched pass. The result is
//! all-or-nothing: an attempt that misses any required entry yields an error
//! and nothing from it is kept, so retries always start from scratch.

use tracing::debug;

use super::collection::ResolvedAddresses;
use super::signature::PatternTable;
use crate::error::{Error, Result};
use crate::process::pattern::{ScanMemory, scan_batch};

/// Resolve every entry of `table` against `memory`.
///
/// Tournament-only entries may stay unresolved when `spectating` is false.
pub fn resolve_patterns<S: ScanMemory + ?Sized>(
    memory: &S,
    table: &PatternTable,
    spectating: bool,
) -> Result<ResolvedAddresses> {
    let signatures = table
        .entries
        .iter()
        .map(|entry| entry.signature())
        .collect::<Result<Vec<_>>>()?;

    let found = scan_batch(memory, &signatures)?;

    let mut resolved = ResolvedAddresses::new();
    for (entry, address) in table.entries.iter().zip(found) {
        let address = address.map(|a| entry.apply(a)).unwrap_or(0);
        debug!("Pattern {}: {:#X}", entry.name, address);
        resolved.insert(&entry.name, address, entry.tourney_only);
    }

    let missing = resolved.missing(spectating);
    if !missing.is_empty() {
        return Err(Error::PatternNotFound(missing.join(", ")));
    }

    Ok(resolved)
}
