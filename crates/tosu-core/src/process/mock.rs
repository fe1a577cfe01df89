//! Mock memory reader for testing
//!
//! Provides a configurable mock implementation of the process traits that
//! reads from an in-memory buffer instead of a real process.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};

use crate::error::{Error, Result};
use crate::process::managed::ManagedLayout;
use crate::process::pattern::{MemoryRegion, ScanMemory};
use crate::process::provider::{ProcessInfo, ProcessProvider};
use crate::process::ReadMemory;

/// Mock memory reader for testing
///
/// Reads from an in-memory buffer mapped at `base`. Clones share the buffer
/// and the liveness flag, so a test can keep a clone to mutate memory or kill
/// the "process" while an instance owns another clone.
#[derive(Debug, Clone)]
pub struct MockMemoryReader {
    data: Arc<RwLock<Vec<u8>>>,
    base: u64,
    pid: u32,
    alive: Arc<AtomicBool>,
    x64: bool,
    command_line: String,
    executable_path: PathBuf,
}

impl MockMemoryReader {
    /// Create a new mock reader with the given data at base address 0x1000
    pub fn new(data: Vec<u8>) -> Self {
        Self::with_base(data, 0x1000)
    }

    /// Create a new mock reader with custom base address
    pub fn with_base(data: Vec<u8>, base: u64) -> Self {
        Self {
            data: Arc::new(RwLock::new(data)),
            base,
            pid: 1,
            alive: Arc::new(AtomicBool::new(true)),
            x64: false,
            command_line: String::new(),
            executable_path: PathBuf::from("C:\\osu!\\osu!.exe"),
        }
    }

    pub fn base_address(&self) -> u64 {
        self.base
    }

    /// Get the size of the underlying buffer
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Mark the process as exited.
    pub fn kill(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    /// Overwrite bytes at an absolute address, growing the buffer if needed.
    pub fn set_bytes(&self, address: u64, bytes: &[u8]) {
        let offset = (address - self.base) as usize;
        let mut data = self.data.write();
        if data.len() < offset + bytes.len() {
            data.resize(offset + bytes.len(), 0);
        }
        data[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    pub fn set_i32(&self, address: u64, value: i32) {
        self.set_bytes(address, &value.to_le_bytes());
    }

    pub fn set_u32(&self, address: u64, value: u32) {
        self.set_bytes(address, &value.to_le_bytes());
    }

    pub fn set_f64(&self, address: u64, value: f64) {
        self.set_bytes(address, &value.to_le_bytes());
    }
}

impl ReadMemory for MockMemoryReader {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        if address < self.base {
            return Err(Error::MemoryReadFailed {
                address,
                message: format!("Address below base (base=0x{:X})", self.base),
            });
        }
        let data = self.data.read();
        let offset = (address - self.base) as usize;
        if offset + size > data.len() {
            return Err(Error::MemoryReadFailed {
                address,
                message: format!(
                    "Out of bounds: offset={}, size={}, len={}",
                    offset,
                    size,
                    data.len()
                ),
            });
        }
        Ok(data[offset..offset + size].to_vec())
    }
}

impl ScanMemory for MockMemoryReader {
    fn regions(&self) -> Result<Vec<MemoryRegion>> {
        Ok(vec![MemoryRegion::new(self.base, self.len())])
    }
}

impl ProcessInfo for MockMemoryReader {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn is_64bit(&self) -> Result<bool> {
        Ok(self.x64)
    }

    fn command_line(&self) -> Result<String> {
        Ok(self.command_line.clone())
    }

    fn executable_path(&self) -> Result<PathBuf> {
        Ok(self.executable_path.clone())
    }
}

/// Builder for creating test memory buffers
///
/// Provides a fluent API for constructing memory layouts for testing.
#[derive(Debug, Clone)]
pub struct MockMemoryBuilder {
    data: Vec<u8>,
    base: u64,
    pid: u32,
    x64: bool,
    command_line: String,
    executable_path: PathBuf,
}

impl Default for MockMemoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMemoryBuilder {
    /// Create a new builder with default base address (0x1000)
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            base: 0x1000,
            pid: 1,
            x64: false,
            command_line: String::new(),
            executable_path: PathBuf::from("C:\\osu!\\osu!.exe"),
        }
    }

    /// Set the base address for the mock reader
    pub fn base(mut self, base: u64) -> Self {
        self.base = base;
        self
    }

    pub fn pid(mut self, pid: u32) -> Self {
        self.pid = pid;
        self
    }

    pub fn x64(mut self, x64: bool) -> Self {
        self.x64 = x64;
        self
    }

    pub fn command_line(mut self, command_line: &str) -> Self {
        self.command_line = command_line.to_string();
        self
    }

    pub fn executable_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable_path = path.into();
        self
    }

    /// Pre-allocate buffer with zeros up to the specified size
    pub fn with_size(mut self, size: usize) -> Self {
        self.ensure_size(size);
        self
    }

    pub fn write_u8(self, offset: usize, value: u8) -> Self {
        self.write_bytes(offset, &[value])
    }

    pub fn write_i16(self, offset: usize, value: i16) -> Self {
        self.write_bytes(offset, &value.to_le_bytes())
    }

    /// Write a signed 32-bit integer at the specified offset from base
    pub fn write_i32(self, offset: usize, value: i32) -> Self {
        self.write_bytes(offset, &value.to_le_bytes())
    }

    /// Write an unsigned 32-bit integer at the specified offset from base
    pub fn write_u32(self, offset: usize, value: u32) -> Self {
        self.write_bytes(offset, &value.to_le_bytes())
    }

    /// Write a signed 64-bit integer at the specified offset from base
    pub fn write_i64(self, offset: usize, value: i64) -> Self {
        self.write_bytes(offset, &value.to_le_bytes())
    }

    /// Write an unsigned 64-bit integer at the specified offset from base
    pub fn write_u64(self, offset: usize, value: u64) -> Self {
        self.write_bytes(offset, &value.to_le_bytes())
    }

    pub fn write_f32(self, offset: usize, value: f32) -> Self {
        self.write_bytes(offset, &value.to_le_bytes())
    }

    pub fn write_f64(self, offset: usize, value: f64) -> Self {
        self.write_bytes(offset, &value.to_le_bytes())
    }

    /// Write raw bytes at the specified offset from base
    pub fn write_bytes(mut self, offset: usize, bytes: &[u8]) -> Self {
        self.ensure_size(offset + bytes.len());
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
        self
    }

    /// Write a managed string object at the specified offset
    ///
    /// Lays out the length field and UTF-16LE characters the way the runtime
    /// described by `layout` does. Pointers to it are `base + offset`.
    pub fn write_sharp_string(self, offset: usize, text: &str, layout: &ManagedLayout) -> Self {
        let units: Vec<u16> = text.encode_utf16().collect();
        let chars: Vec<u8> = units.iter().flat_map(|u| u.to_le_bytes()).collect();
        self.write_i32(offset + layout.string_length as usize, units.len() as i32)
            .write_bytes(offset + layout.string_chars as usize, &chars)
    }

    /// Build the MockMemoryReader
    pub fn build(self) -> MockMemoryReader {
        MockMemoryReader {
            data: Arc::new(RwLock::new(self.data)),
            base: self.base,
            pid: self.pid,
            alive: Arc::new(AtomicBool::new(true)),
            x64: self.x64,
            command_line: self.command_line,
            executable_path: self.executable_path,
        }
    }

    fn ensure_size(&mut self, required: usize) {
        if self.data.len() < required {
            self.data.resize(required, 0);
        }
    }
}

/// In-memory process table for discovery tests.
#[derive(Debug, Clone, Default)]
pub struct MockProcessProvider {
    processes: Arc<Mutex<Vec<(String, MockMemoryReader)>>>,
    focused: Arc<Mutex<Option<u32>>>,
    linux: bool,
}

impl MockProcessProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_process(self, name: &str, reader: MockMemoryReader) -> Self {
        self.add_process(name, reader);
        self
    }

    pub fn with_linux(mut self, linux: bool) -> Self {
        self.linux = linux;
        self
    }

    /// Register a process after construction (clones share the table).
    pub fn add_process(&self, name: &str, reader: MockMemoryReader) {
        self.processes.lock().push((name.to_string(), reader));
    }

    pub fn set_focused(&self, pid: Option<u32>) {
        *self.focused.lock() = pid;
    }
}

impl ProcessProvider for MockProcessProvider {
    type Process = MockMemoryReader;

    fn find_processes(&self, name: &str) -> Vec<u32> {
        self.processes
            .lock()
            .iter()
            .filter(|(n, reader)| n.eq_ignore_ascii_case(name) && reader.is_alive())
            .map(|(_, reader)| reader.pid)
            .collect()
    }

    fn process_exists(&self, pid: u32) -> bool {
        self.processes
            .lock()
            .iter()
            .any(|(_, reader)| reader.pid == pid && reader.is_alive())
    }

    fn open_process(&self, pid: u32) -> Result<Self::Process> {
        self.processes
            .lock()
            .iter()
            .find(|(_, reader)| reader.pid == pid && reader.is_alive())
            .map(|(_, reader)| reader.clone())
            .ok_or_else(|| Error::ProcessNotFound(format!("PID {} is not running", pid)))
    }

    fn focused_pid(&self) -> Option<u32> {
        *self.focused.lock()
    }

    fn is_linux(&self) -> bool {
        self.linux
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_reader_basic() {
        let data = vec![0x78, 0x56, 0x34, 0x12];
        let reader = MockMemoryReader::new(data);

        let value = reader.read_i32(0x1000).unwrap();
        assert_eq!(value, 0x12345678);
    }

    #[test]
    fn test_mock_reader_with_base() {
        let data = vec![0x01, 0x02, 0x03, 0x04];
        let reader = MockMemoryReader::with_base(data, 0x140000000);

        let bytes = reader.read_bytes(0x140000000, 4).unwrap();
        assert_eq!(bytes, vec![0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_mock_reader_out_of_bounds() {
        let reader = MockMemoryReader::new(vec![0x01, 0x02]);
        assert!(reader.read_u32(0x1000).is_err());
    }

    #[test]
    fn test_mock_reader_below_base() {
        let reader = MockMemoryReader::with_base(vec![0x01, 0x02, 0x03, 0x04], 0x2000);
        assert!(reader.read_bytes(0x1000, 4).is_err());
    }

    #[test]
    fn test_mock_reader_set_shared_between_clones() {
        let reader = MockMemoryBuilder::new().with_size(8).build();
        let clone = reader.clone();

        clone.set_i32(0x1004, 77);
        assert_eq!(reader.read_i32(0x1004).unwrap(), 77);
    }

    #[test]
    fn test_mock_reader_kill() {
        let reader = MockMemoryBuilder::new().build();
        let clone = reader.clone();

        assert!(reader.is_alive());
        clone.kill();
        assert!(!reader.is_alive());
    }

    #[test]
    fn test_mock_reader_single_region() {
        let reader = MockMemoryBuilder::new().with_size(0x40).build();
        assert_eq!(
            reader.regions().unwrap(),
            vec![MemoryRegion::new(0x1000, 0x40)]
        );
    }

    #[test]
    fn test_builder_basic() {
        let reader = MockMemoryBuilder::new()
            .write_i32(0, 0x12345678)
            .write_u64(4, 0xDEADBEEFCAFEBABE)
            .build();

        assert_eq!(reader.read_i32(0x1000).unwrap(), 0x12345678);
        assert_eq!(reader.read_u64(0x1004).unwrap(), 0xDEADBEEFCAFEBABE);
    }

    #[test]
    fn test_builder_with_base() {
        let reader = MockMemoryBuilder::new()
            .base(0x140000000)
            .write_i32(0, 42)
            .build();

        assert_eq!(reader.base_address(), 0x140000000);
        assert_eq!(reader.read_i32(0x140000000).unwrap(), 42);
    }

    #[test]
    fn test_builder_with_size() {
        let reader = MockMemoryBuilder::new()
            .with_size(100)
            .write_i32(96, 123)
            .build();

        assert_eq!(reader.len(), 100);
        assert_eq!(reader.read_i32(0x1000 + 96).unwrap(), 123);
    }

    #[test]
    fn test_builder_floats_and_short() {
        let reader = MockMemoryBuilder::new()
            .write_f32(0, 1.25)
            .write_f64(4, 98.5)
            .write_i16(12, -3)
            .write_u8(14, 9)
            .build();

        assert_eq!(reader.read_f32(0x1000).unwrap(), 1.25);
        assert_eq!(reader.read_f64(0x1004).unwrap(), 98.5);
        assert_eq!(reader.read_i16(0x100C).unwrap(), -3);
        assert_eq!(reader.read_u8(0x100E).unwrap(), 9);
    }

    #[test]
    fn test_builder_sharp_string_layout() {
        let reader = MockMemoryBuilder::new()
            .write_sharp_string(0, "ab", &ManagedLayout::X86)
            .build();

        assert_eq!(reader.read_i32(0x1004).unwrap(), 2);
        assert_eq!(reader.read_bytes(0x1008, 4).unwrap(), vec![b'a', 0, b'b', 0]);
    }

    #[test]
    fn test_builder_process_metadata() {
        let reader = MockMemoryBuilder::new()
            .pid(1234)
            .x64(true)
            .command_line("osulazer.exe")
            .executable_path("/games/osu/osulazer.exe")
            .build();

        assert_eq!(reader.pid(), 1234);
        assert!(reader.is_64bit().unwrap());
        assert_eq!(reader.command_line().unwrap(), "osulazer.exe");
        assert_eq!(
            reader.executable_path().unwrap(),
            PathBuf::from("/games/osu/osulazer.exe")
        );
    }
}
