//! Overlapping windows over a memory region.
//!
//! Signature scans never load a whole region at once; they walk it in windows
//! that share a tail with the next window.

use super::ReadMemory;
use super::pattern::MemoryRegion;
use crate::error::Result;

/// Bytes advanced per window (4MB).
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024 * 1024;

#[derive(Debug)]
pub struct ScanWindow {
    pub address: u64,
    pub data: Vec<u8>,
}

/// Windows start `stride` bytes apart and extend `overlap` bytes into the next
/// one, clamped to the region end. Any byte run of at most `overlap + 1` bytes
/// lies entirely inside one window.
pub struct RegionWindows<'a, R: ReadMemory + ?Sized> {
    reader: &'a R,
    next: u64,
    end: u64,
    stride: usize,
    overlap: usize,
}

impl<'a, R: ReadMemory + ?Sized> RegionWindows<'a, R> {
    pub fn new(reader: &'a R, region: MemoryRegion, stride: usize, overlap: usize) -> Self {
        Self {
            reader,
            next: region.base,
            end: region.end(),
            stride: stride.max(1),
            overlap,
        }
    }
}

impl<R: ReadMemory + ?Sized> Iterator for RegionWindows<'_, R> {
    type Item = Result<ScanWindow>;

    fn next(&mut self) -> Option<Self::Item> {
        let left = self.end.checked_sub(self.next).filter(|&n| n > 0)? as usize;
        let address = self.next;
        self.next += left.min(self.stride) as u64;

        let len = left.min(self.stride + self.overlap);
        Some(
            self.reader
                .read_bytes(address, len)
                .map(|data| ScanWindow { address, data }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::mock::MockMemoryBuilder;

    fn image(len: u8) -> crate::process::MockMemoryReader {
        let bytes: Vec<u8> = (1..=len).collect();
        MockMemoryBuilder::new().write_bytes(0, &bytes).build()
    }

    fn collect(windows: RegionWindows<'_, crate::process::MockMemoryReader>) -> Vec<(u64, Vec<u8>)> {
        windows.map(|w| w.map(|w| (w.address, w.data)).unwrap()).collect()
    }

    #[test]
    fn test_region_smaller_than_stride() {
        let reader = image(6);
        let windows = collect(RegionWindows::new(&reader, MemoryRegion::new(0x1000, 6), 16, 3));
        assert_eq!(windows, vec![(0x1000, vec![1, 2, 3, 4, 5, 6])]);
    }

    #[test]
    fn test_windows_share_tail() {
        let reader = image(10);
        let windows = collect(RegionWindows::new(&reader, MemoryRegion::new(0x1000, 10), 4, 2));

        assert_eq!(
            windows,
            vec![
                (0x1000, vec![1, 2, 3, 4, 5, 6]),
                (0x1004, vec![5, 6, 7, 8, 9, 10]),
                (0x1008, vec![9, 10]),
            ]
        );
    }

    #[test]
    fn test_empty_region_yields_nothing() {
        let reader = image(4);
        let mut windows = RegionWindows::new(&reader, MemoryRegion::new(0x1002, 0), 4, 1);
        assert!(windows.next().is_none());
    }

    #[test]
    fn test_unreadable_window_is_an_error() {
        let reader = MockMemoryBuilder::new().with_size(4).build();
        let mut windows = RegionWindows::new(&reader, MemoryRegion::new(0x1000, 0x10), 8, 0);
        assert!(windows.next().unwrap().is_err());
    }
}
