//! Pattern matching utilities for memory searching.
//!
//! Signatures are byte patterns with wildcards. A wildcard normally matches any
//! byte; signatures built with `non_zero_mask` require wildcard bytes to be
//! non-zero, which filters out matches inside zero-filled padding.

use std::sync::Arc;

use tracing::debug;

use super::ReadMemory;
use super::scan_window::{DEFAULT_CHUNK_SIZE, RegionWindows};
use crate::error::Result;

/// A contiguous readable range of process memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRegion {
    pub base: u64,
    pub size: usize,
}

impl MemoryRegion {
    pub fn new(base: u64, size: usize) -> Self {
        Self { base, size }
    }

    pub fn end(&self) -> u64 {
        self.base + self.size as u64
    }
}

/// Memory sources that can enumerate their readable regions.
pub trait ScanMemory: ReadMemory {
    fn regions(&self) -> Result<Vec<MemoryRegion>>;
}

impl<S: ScanMemory + ?Sized> ScanMemory for &S {
    fn regions(&self) -> Result<Vec<MemoryRegion>> {
        (**self).regions()
    }
}

impl<S: ScanMemory + ?Sized> ScanMemory for Arc<S> {
    fn regions(&self) -> Result<Vec<MemoryRegion>> {
        (**self).regions()
    }
}

/// A byte signature; `None` entries are wildcards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub bytes: Vec<Option<u8>>,
    pub non_zero_mask: bool,
}

impl Signature {
    pub fn new(bytes: Vec<Option<u8>>) -> Self {
        Self {
            bytes,
            non_zero_mask: false,
        }
    }

    pub fn with_non_zero_mask(mut self, enabled: bool) -> Self {
        self.non_zero_mask = enabled;
        self
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn matches_at(&self, window: &[u8]) -> bool {
        self.bytes.iter().zip(window).all(|(expected, &actual)| match expected {
            Some(byte) => *byte == actual,
            None => !self.non_zero_mask || actual != 0,
        })
    }

    /// Find the first match of this signature in `buffer`.
    ///
    /// # Example
    ///
    /// ```
    /// use tosu_core::process::pattern::Signature;
    ///
    /// let sig = Signature::new(vec![Some(1), None, Some(3)]);
    /// assert_eq!(sig.find_first(&[0, 1, 9, 3]), Some(1));
    /// ```
    pub fn find_first(&self, buffer: &[u8]) -> Option<usize> {
        if self.bytes.is_empty() || self.bytes.len() > buffer.len() {
            return None;
        }

        buffer
            .windows(self.bytes.len())
            .position(|window| self.matches_at(window))
    }
}

/// Scan every readable region once and report the first absolute address of
/// each signature, in input order.
///
/// Regions are read in chunks; consecutive chunks overlap by the longest
/// signature length so matches straddling a chunk boundary are not lost.
/// Regions that cannot be read are skipped.
pub fn scan_batch<S: ScanMemory + ?Sized>(
    memory: &S,
    signatures: &[Signature],
) -> Result<Vec<Option<u64>>> {
    scan_batch_with_chunk_size(memory, signatures, DEFAULT_CHUNK_SIZE)
}

pub fn scan_batch_with_chunk_size<S: ScanMemory + ?Sized>(
    memory: &S,
    signatures: &[Signature],
    chunk_size: usize,
) -> Result<Vec<Option<u64>>> {
    let mut found: Vec<Option<u64>> = vec![None; signatures.len()];
    let max_len = signatures.iter().map(Signature::len).max().unwrap_or(0);
    if max_len == 0 {
        return Ok(found);
    }

    let overlap = max_len.saturating_sub(1);
    let step = chunk_size.max(max_len);

    for region in memory.regions()? {
        if found.iter().all(Option::is_some) {
            break;
        }

        for window in RegionWindows::new(memory, region, step, overlap) {
            let window = match window {
                Ok(window) => window,
                Err(e) => {
                    debug!("Skipping unreadable window in region {:#x}: {}", region.base, e);
                    continue;
                }
            };

            for (slot, signature) in found.iter_mut().zip(signatures) {
                if slot.is_none()
                    && let Some(offset) = signature.find_first(&window.data)
                {
                    *slot = Some(window.address + offset as u64);
                }
            }
        }
    }

    Ok(found)
}

/// Scan for a single signature.
pub fn scan_first<S: ScanMemory + ?Sized>(memory: &S, signature: &Signature) -> Result<Option<u64>> {
    let found = scan_batch(memory, std::slice::from_ref(signature))?;
    Ok(found.into_iter().next().flatten())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::mock::MockMemoryBuilder;

    fn sig(bytes: &[Option<u8>]) -> Signature {
        Signature::new(bytes.to_vec())
    }

    #[test]
    fn test_signature_wildcard() {
        let s = sig(&[Some(0xA1), None, None, Some(0x89)]);
        let buffer = [0x00, 0xA1, 0x12, 0x34, 0x89];
        assert_eq!(s.find_first(&buffer), Some(1));
    }

    #[test]
    fn test_signature_not_found() {
        let s = sig(&[Some(0xFF), Some(0xEE)]);
        assert_eq!(s.find_first(&[0x00, 0xFF, 0x00, 0xEE]), None);
    }

    #[test]
    fn test_signature_longer_than_buffer() {
        let s = sig(&[Some(1), Some(2), Some(3)]);
        assert_eq!(s.find_first(&[1, 2]), None);
    }

    #[test]
    fn test_non_zero_mask_skips_zero_wildcards() {
        let buffer = [0xA1, 0x00, 0x89, 0xA1, 0x05, 0x89];
        let plain = sig(&[Some(0xA1), None, Some(0x89)]);
        let masked = plain.clone().with_non_zero_mask(true);

        assert_eq!(plain.find_first(&buffer), Some(0));
        assert_eq!(masked.find_first(&buffer), Some(3));
    }

    #[test]
    fn test_scan_batch_multiple_signatures() {
        let reader = MockMemoryBuilder::new()
            .with_size(0x100)
            .write_bytes(0x20, &[0xF8, 0x01, 0x74, 0x04, 0x83, 0x65])
            .write_bytes(0x80, &[0x48, 0x83, 0xF8, 0x04, 0x73, 0x1E])
            .build();

        let signatures = vec![
            sig(&[Some(0x48), Some(0x83), Some(0xF8), Some(0x04), Some(0x73), Some(0x1E)]),
            sig(&[Some(0xF8), Some(0x01), Some(0x74), None, Some(0x83), Some(0x65)]),
            sig(&[Some(0xDE), Some(0xAD)]),
        ];

        let found = scan_batch(&reader, &signatures).unwrap();
        assert_eq!(found, vec![Some(0x1080), Some(0x1020), None]);
    }

    #[test]
    fn test_scan_batch_match_across_chunk_boundary() {
        let reader = MockMemoryBuilder::new()
            .with_size(0x40)
            .write_bytes(0x0E, &[0xAA, 0xBB, 0xCC, 0xDD])
            .build();

        let signatures = vec![sig(&[Some(0xAA), Some(0xBB), Some(0xCC), Some(0xDD)])];
        let found = scan_batch_with_chunk_size(&reader, &signatures, 0x10).unwrap();
        assert_eq!(found, vec![Some(0x100E)]);
    }

    #[test]
    fn test_scan_first() {
        let reader = MockMemoryBuilder::new()
            .with_size(0x20)
            .write_bytes(0x10, &[0x11, 0x22])
            .build();

        let found = scan_first(&reader, &sig(&[Some(0x11), Some(0x22)])).unwrap();
        assert_eq!(found, Some(0x1010));
    }

    #[test]
    fn test_memory_region_end() {
        let region = MemoryRegion::new(0x1000, 0x200);
        assert_eq!(region.end(), 0x1200);
    }
}
