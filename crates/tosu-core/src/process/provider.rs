//! Process provider abstraction for testability.
//!
//! This module provides traits that abstract process discovery and access,
//! enabling mock implementations for testing without a running game process.

use std::path::PathBuf;

use crate::error::Result;
use crate::process::handle::{self, ProcessHandle};
use crate::process::pattern::ScanMemory;

/// Trait for accessing process information.
pub trait ProcessInfo {
    /// Get the process ID.
    fn pid(&self) -> u32;

    /// Check if the process is still running.
    fn is_alive(&self) -> bool;

    /// Whether the process runs a 64-bit image.
    fn is_64bit(&self) -> Result<bool>;

    /// Full command line, arguments separated by spaces.
    fn command_line(&self) -> Result<String>;

    /// Path of the main executable.
    fn executable_path(&self) -> Result<PathBuf>;
}

/// Everything an instance needs from an attached process.
pub trait GameProcess: ProcessInfo + ScanMemory + Send + Sync + 'static {}

impl<T: ProcessInfo + ScanMemory + Send + Sync + 'static> GameProcess for T {}

/// Trait for finding and opening processes.
///
/// This trait abstracts process discovery, allowing mock implementations
/// that don't require actual system processes.
pub trait ProcessProvider: Send + Sync {
    /// The type of process returned by this provider.
    type Process: GameProcess;

    /// PIDs of running processes with the given executable name.
    fn find_processes(&self, name: &str) -> Vec<u32>;

    fn process_exists(&self, pid: u32) -> bool;

    /// Open a process by its PID.
    fn open_process(&self, pid: u32) -> Result<Self::Process>;

    /// PID owning the foreground window, when the platform exposes it.
    fn focused_pid(&self) -> Option<u32>;

    /// Whether discovery follows Linux naming rules.
    fn is_linux(&self) -> bool {
        cfg!(target_os = "linux")
    }
}

/// Provider backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessProvider;

impl ProcessProvider for SystemProcessProvider {
    type Process = ProcessHandle;

    fn find_processes(&self, name: &str) -> Vec<u32> {
        handle::find_processes(name)
    }

    fn process_exists(&self, pid: u32) -> bool {
        handle::process_exists(pid)
    }

    fn open_process(&self, pid: u32) -> Result<Self::Process> {
        handle::open_process(pid)
    }

    fn focused_pid(&self) -> Option<u32> {
        handle::focused_pid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::process::mock::{MockMemoryBuilder, MockProcessProvider};

    #[test]
    fn test_mock_provider_find_processes() {
        let provider = MockProcessProvider::new()
            .with_process("osu!.exe", MockMemoryBuilder::new().pid(10).build())
            .with_process("osulazer.exe", MockMemoryBuilder::new().pid(20).build())
            .with_process("osu!.exe", MockMemoryBuilder::new().pid(30).build());

        assert_eq!(provider.find_processes("osu!.exe"), vec![10, 30]);
        assert_eq!(provider.find_processes("osulazer.exe"), vec![20]);
        assert!(provider.find_processes("notepad.exe").is_empty());
    }

    #[test]
    fn test_mock_provider_open_process() {
        let provider = MockProcessProvider::new().with_process(
            "osu!.exe",
            MockMemoryBuilder::new()
                .pid(42)
                .command_line("osu!.exe -spectateclient 1")
                .build(),
        );

        let process = provider.open_process(42).unwrap();
        assert_eq!(process.pid(), 42);
        assert!(process.is_alive());
        assert_eq!(process.command_line().unwrap(), "osu!.exe -spectateclient 1");
    }

    #[test]
    fn test_mock_provider_open_missing() {
        let provider = MockProcessProvider::new();
        let result = provider.open_process(99);
        assert!(matches!(result, Err(Error::ProcessNotFound(_))));
        assert!(!provider.process_exists(99));
    }

    #[test]
    fn test_mock_provider_killed_process() {
        let reader = MockMemoryBuilder::new().pid(7).build();
        let provider = MockProcessProvider::new().with_process("osu!.exe", reader.clone());

        assert!(provider.process_exists(7));
        reader.kill();
        assert!(!provider.process_exists(7));
    }
}
