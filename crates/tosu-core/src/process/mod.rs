mod handle;
pub mod managed;
pub mod pattern;
pub mod provider;
mod reader;
mod scan_window;

// Mock memory reader for testing (always available for unit and integration tests)
#[doc(hidden)]
pub mod mock;

pub use scan_window::{DEFAULT_CHUNK_SIZE, RegionWindows, ScanWindow};
pub use handle::{ProcessHandle, find_processes, focused_pid, open_process, process_exists};
pub use managed::{ManagedLayout, ManagedReader};
pub use pattern::{MemoryRegion, ScanMemory, Signature};
pub use provider::{GameProcess, ProcessInfo, ProcessProvider, SystemProcessProvider};
pub use reader::ReadMemory;

// Re-export mock for convenient access in tests
#[doc(hidden)]
pub use mock::{MockMemoryBuilder, MockMemoryReader, MockProcessProvider};
