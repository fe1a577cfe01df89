#![cfg_attr(
    not(any(target_os = "windows", target_os = "linux")),
    allow(dead_code, unused_variables)
)]

use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::process::ReadMemory;
use crate::process::pattern::{MemoryRegion, ScanMemory};
use crate::process::provider::ProcessInfo;

#[cfg(target_os = "windows")]
pub use windows_impl::{find_processes, focused_pid, process_exists};

#[cfg(target_os = "linux")]
pub use linux_impl::{find_processes, focused_pid, process_exists};

#[cfg(not(any(target_os = "windows", target_os = "linux")))]
pub use fallback_impl::{find_processes, focused_pid, process_exists};

/// An open, read-only handle to a running process.
pub struct ProcessHandle {
    pub pid: u32,
    #[cfg(target_os = "windows")]
    handle: windows::Win32::Foundation::HANDLE,
    #[cfg(target_os = "linux")]
    mem: std::fs::File,
}

// SAFETY: the raw process handle is only used for read-only queries
// (ReadProcessMemory, VirtualQueryEx, GetExitCodeProcess) which are safe to
// issue from any thread. The handle is closed exactly once in Drop.
#[cfg(target_os = "windows")]
unsafe impl Send for ProcessHandle {}
#[cfg(target_os = "windows")]
unsafe impl Sync for ProcessHandle {}

impl std::fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessHandle").field("pid", &self.pid).finish()
    }
}

impl ReadMemory for ProcessHandle {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        self.read_bytes_impl(address, size)
    }
}

impl ScanMemory for ProcessHandle {
    fn regions(&self) -> Result<Vec<MemoryRegion>> {
        self.regions_impl()
    }
}

impl ProcessInfo for ProcessHandle {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn is_alive(&self) -> bool {
        ProcessHandle::is_alive(self)
    }

    fn is_64bit(&self) -> Result<bool> {
        ProcessHandle::is_64bit(self)
    }

    fn command_line(&self) -> Result<String> {
        ProcessHandle::command_line(self)
    }

    fn executable_path(&self) -> Result<PathBuf> {
        ProcessHandle::executable_path(self)
    }
}

#[cfg(target_os = "windows")]
mod windows_impl {
    use std::ffi::OsString;
    use std::mem::size_of;
    use std::os::windows::ffi::OsStringExt;
    use std::path::PathBuf;

    use tracing::{debug, warn};
    use windows::Wdk::System::Threading::{NtQueryInformationProcess, PROCESSINFOCLASS};
    use windows::Win32::Foundation::{BOOL, CloseHandle, UNICODE_STRING};
    use windows::Win32::System::Diagnostics::Debug::ReadProcessMemory;
    use windows::Win32::System::Diagnostics::ToolHelp::{
        CreateToolhelp32Snapshot, PROCESSENTRY32W, Process32FirstW, Process32NextW,
        TH32CS_SNAPPROCESS,
    };
    use windows::Win32::System::Memory::{
        MEM_COMMIT, MEMORY_BASIC_INFORMATION, PAGE_GUARD, PAGE_NOACCESS, VirtualQueryEx,
    };
    use windows::Win32::System::Threading::{
        GetExitCodeProcess, IsWow64Process, OpenProcess, PROCESS_NAME_WIN32,
        PROCESS_QUERY_INFORMATION, PROCESS_QUERY_LIMITED_INFORMATION, PROCESS_VM_READ,
        QueryFullProcessImageNameW,
    };
    use windows::Win32::UI::WindowsAndMessaging::{GetForegroundWindow, GetWindowThreadProcessId};
    use windows::core::PWSTR;

    use super::ProcessHandle;
    use crate::error::{Error, Result};
    use crate::process::pattern::MemoryRegion;

    /// `ProcessCommandLineInformation` in the native process information classes.
    const PROCESS_COMMAND_LINE_INFORMATION: PROCESSINFOCLASS = PROCESSINFOCLASS(60);

    const STILL_ACTIVE: u32 = 259;

    impl ProcessHandle {
        pub fn open(pid: u32) -> Result<Self> {
            // SAFETY: OpenProcess is called with valid read-only access flags and a process
            // ID obtained from the process snapshot. The returned handle is owned by this
            // struct and closed in Drop.
            let handle = unsafe {
                OpenProcess(PROCESS_QUERY_INFORMATION | PROCESS_VM_READ, false, pid).map_err(
                    |e| {
                        debug!("OpenProcess failed for PID {}: {}", pid, e);
                        Error::ProcessOpenFailed(e.to_string())
                    },
                )?
            };

            Ok(Self { pid, handle })
        }

        pub(super) fn read_bytes_impl(&self, address: u64, size: usize) -> Result<Vec<u8>> {
            let mut buffer = vec![0u8; size];
            let mut bytes_read = 0;

            // SAFETY: ReadProcessMemory is called with:
            // - A valid process handle opened with PROCESS_VM_READ
            // - A properly allocated buffer of the requested size
            // - A pointer to receive the actual bytes read
            // Invalid target addresses make the call fail, which is handled via Result.
            unsafe {
                ReadProcessMemory(
                    self.handle,
                    address as *const _,
                    buffer.as_mut_ptr() as *mut _,
                    size,
                    Some(&mut bytes_read),
                )
                .map_err(|e| Error::MemoryReadFailed {
                    address,
                    message: e.to_string(),
                })?;
            }

            if bytes_read != size {
                return Err(Error::MemoryReadFailed {
                    address,
                    message: format!("Expected {} bytes, read {}", size, bytes_read),
                });
            }

            Ok(buffer)
        }

        pub(super) fn regions_impl(&self) -> Result<Vec<MemoryRegion>> {
            let mut regions = Vec::new();
            let mut address: usize = 0;
            let mut info = MEMORY_BASIC_INFORMATION::default();

            // SAFETY: VirtualQueryEx writes at most size_of::<MEMORY_BASIC_INFORMATION>() bytes
            // into `info`, and returns 0 once the address is past the user address space.
            while unsafe {
                VirtualQueryEx(
                    self.handle,
                    Some(address as *const _),
                    &mut info,
                    size_of::<MEMORY_BASIC_INFORMATION>(),
                )
            } != 0
            {
                let base = info.BaseAddress as usize;
                let next = base.saturating_add(info.RegionSize);
                if next <= address {
                    break;
                }
                address = next;

                let readable = info.State == MEM_COMMIT
                    && info.Protect.0 & PAGE_NOACCESS.0 == 0
                    && info.Protect.0 & PAGE_GUARD.0 == 0;
                if readable {
                    regions.push(MemoryRegion::new(base as u64, info.RegionSize));
                }
            }

            Ok(regions)
        }

        /// Check if the process is still running
        pub fn is_alive(&self) -> bool {
            let mut exit_code: u32 = 0;
            // SAFETY: GetExitCodeProcess is called with a valid process handle and a
            // properly initialized output variable.
            unsafe {
                if GetExitCodeProcess(self.handle, &mut exit_code).is_ok() {
                    exit_code == STILL_ACTIVE
                } else {
                    false
                }
            }
        }

        pub fn is_64bit(&self) -> Result<bool> {
            let mut wow64 = BOOL::default();
            // SAFETY: IsWow64Process only writes to the provided BOOL.
            unsafe {
                IsWow64Process(self.handle, &mut wow64)
                    .map_err(|e| Error::ProcessOpenFailed(e.to_string()))?;
            }
            Ok(!wow64.as_bool() && cfg!(target_pointer_width = "64"))
        }

        pub fn executable_path(&self) -> Result<PathBuf> {
            let mut buffer = vec![0u16; 1024];
            let mut size = buffer.len() as u32;
            // SAFETY: the buffer holds `size` UTF-16 units and the call writes at most that
            // many, updating `size` with the written length.
            unsafe {
                QueryFullProcessImageNameW(
                    self.handle,
                    PROCESS_NAME_WIN32,
                    PWSTR(buffer.as_mut_ptr()),
                    &mut size,
                )
                .map_err(|e| Error::ProcessOpenFailed(e.to_string()))?;
            }
            buffer.truncate(size as usize);
            Ok(PathBuf::from(OsString::from_wide(&buffer)))
        }

        pub fn command_line(&self) -> Result<String> {
            let mut length: u32 = 0;
            // SAFETY: probing with a null buffer of length 0 only writes the required
            // size into `length`.
            let _ = unsafe {
                NtQueryInformationProcess(
                    self.handle,
                    PROCESS_COMMAND_LINE_INFORMATION,
                    std::ptr::null_mut(),
                    0,
                    &mut length,
                )
            };
            if length == 0 {
                return Err(Error::ProcessOpenFailed(format!(
                    "Unable to query command line of PID {}",
                    self.pid
                )));
            }

            // u64 storage keeps the UNICODE_STRING header aligned.
            let mut buffer = vec![0u64; (length as usize).div_ceil(8)];
            // SAFETY: the buffer is at least `length` bytes long and 8-byte aligned.
            let status = unsafe {
                NtQueryInformationProcess(
                    self.handle,
                    PROCESS_COMMAND_LINE_INFORMATION,
                    buffer.as_mut_ptr() as *mut _,
                    length,
                    &mut length,
                )
            };
            if status.is_err() {
                return Err(Error::ProcessOpenFailed(format!(
                    "NtQueryInformationProcess failed with {:#x}",
                    status.0
                )));
            }

            // SAFETY: on success the buffer starts with a UNICODE_STRING whose Buffer points
            // into the same allocation, holding `Length` bytes of UTF-16 text.
            let text = unsafe {
                let header = &*(buffer.as_ptr() as *const UNICODE_STRING);
                if header.Buffer.is_null() {
                    return Ok(String::new());
                }
                let units =
                    std::slice::from_raw_parts(header.Buffer.0, header.Length as usize / 2);
                String::from_utf16_lossy(units)
            };
            Ok(text)
        }
    }

    impl Drop for ProcessHandle {
        fn drop(&mut self) {
            if !self.handle.is_invalid() {
                // SAFETY: self.handle is a valid handle obtained from OpenProcess and has
                // not been closed yet.
                if let Err(e) = unsafe { CloseHandle(self.handle) } {
                    warn!("Failed to close process handle: {}", e);
                }
            }
        }
    }

    /// Find all running processes whose executable name matches `name`.
    pub fn find_processes(name: &str) -> Vec<u32> {
        // SAFETY: CreateToolhelp32Snapshot with TH32CS_SNAPPROCESS is safe to call.
        // The returned handle is closed at the end of this function.
        let snapshot = match unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) } {
            Ok(snapshot) => snapshot,
            Err(e) => {
                debug!("CreateToolhelp32Snapshot failed: {}", e);
                return Vec::new();
            }
        };

        let mut entry = PROCESSENTRY32W {
            dwSize: size_of::<PROCESSENTRY32W>() as u32,
            ..Default::default()
        };

        let mut pids = Vec::new();
        // SAFETY: Process32FirstW and Process32NextW are called with a valid snapshot handle
        // and a properly initialized PROCESSENTRY32W structure.
        unsafe {
            if Process32FirstW(snapshot, &mut entry).is_ok() {
                loop {
                    let len = entry
                        .szExeFile
                        .iter()
                        .position(|&c| c == 0)
                        .unwrap_or(entry.szExeFile.len());
                    let exe_name = OsString::from_wide(&entry.szExeFile[..len]);

                    if exe_name.to_string_lossy().eq_ignore_ascii_case(name) {
                        pids.push(entry.th32ProcessID);
                    }

                    if Process32NextW(snapshot, &mut entry).is_err() {
                        break;
                    }
                }
            }
            let _ = CloseHandle(snapshot);
        }

        pids
    }

    pub fn process_exists(pid: u32) -> bool {
        // SAFETY: the handle is only used for GetExitCodeProcess and closed right after.
        unsafe {
            let Ok(handle) = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid) else {
                return false;
            };
            let mut exit_code: u32 = 0;
            let alive =
                GetExitCodeProcess(handle, &mut exit_code).is_ok() && exit_code == STILL_ACTIVE;
            let _ = CloseHandle(handle);
            alive
        }
    }

    /// PID owning the foreground window.
    pub fn focused_pid() -> Option<u32> {
        let mut pid: u32 = 0;
        // SAFETY: GetForegroundWindow has no preconditions; GetWindowThreadProcessId only
        // writes the owning PID into `pid`.
        unsafe {
            let window = GetForegroundWindow();
            if window.0.is_null() {
                return None;
            }
            GetWindowThreadProcessId(window, Some(&mut pid));
        }
        (pid != 0).then_some(pid)
    }
}

#[cfg(target_os = "linux")]
mod linux_impl {
    use std::fs::{self, File};
    use std::io::Read;
    use std::os::unix::fs::FileExt;
    use std::path::{Path, PathBuf};

    use tracing::debug;

    use super::ProcessHandle;
    use crate::error::{Error, Result};
    use crate::process::pattern::MemoryRegion;

    impl ProcessHandle {
        pub fn open(pid: u32) -> Result<Self> {
            let mem = File::open(format!("/proc/{}/mem", pid)).map_err(|e| {
                debug!("Opening /proc/{}/mem failed: {}", pid, e);
                Error::ProcessOpenFailed(e.to_string())
            })?;
            Ok(Self { pid, mem })
        }

        pub(super) fn read_bytes_impl(&self, address: u64, size: usize) -> Result<Vec<u8>> {
            let mut buffer = vec![0u8; size];
            self.mem
                .read_exact_at(&mut buffer, address)
                .map_err(|e| Error::MemoryReadFailed {
                    address,
                    message: e.to_string(),
                })?;
            Ok(buffer)
        }

        pub(super) fn regions_impl(&self) -> Result<Vec<MemoryRegion>> {
            let maps = fs::read_to_string(format!("/proc/{}/maps", self.pid))?;
            Ok(parse_maps(&maps))
        }

        /// Check if the process is still running
        pub fn is_alive(&self) -> bool {
            process_exists(self.pid)
        }

        pub fn is_64bit(&self) -> Result<bool> {
            let mut header = [0u8; 5];
            File::open(format!("/proc/{}/exe", self.pid))?.read_exact(&mut header)?;
            // EI_CLASS: 1 = 32-bit, 2 = 64-bit
            Ok(header[4] == 2)
        }

        pub fn executable_path(&self) -> Result<PathBuf> {
            Ok(fs::read_link(format!("/proc/{}/exe", self.pid))?)
        }

        pub fn command_line(&self) -> Result<String> {
            let raw = fs::read(format!("/proc/{}/cmdline", self.pid))?;
            let text = String::from_utf8_lossy(&raw);
            Ok(text.trim_end_matches('\0').replace('\0', " "))
        }
    }

    pub(super) fn parse_maps(maps: &str) -> Vec<MemoryRegion> {
        maps.lines()
            .filter_map(|line| {
                let mut fields = line.split_whitespace();
                let range = fields.next()?;
                let perms = fields.next()?;
                if !perms.starts_with('r') {
                    return None;
                }
                let (start, end) = range.split_once('-')?;
                let start = u64::from_str_radix(start, 16).ok()?;
                let end = u64::from_str_radix(end, 16).ok()?;
                (end > start).then(|| MemoryRegion::new(start, (end - start) as usize))
            })
            .collect()
    }

    /// Find all running processes whose command name matches `name`.
    pub fn find_processes(name: &str) -> Vec<u32> {
        let Ok(entries) = fs::read_dir("/proc") else {
            return Vec::new();
        };

        let mut pids: Vec<u32> = entries
            .flatten()
            .filter_map(|entry| {
                let pid: u32 = entry.file_name().to_str()?.parse().ok()?;
                let comm = fs::read_to_string(entry.path().join("comm")).ok()?;
                comm.trim().eq_ignore_ascii_case(name).then_some(pid)
            })
            .collect();
        pids.sort_unstable();
        pids
    }

    pub fn process_exists(pid: u32) -> bool {
        Path::new(&format!("/proc/{}", pid)).exists()
    }

    /// Foreground tracking is not available without a window system query.
    pub fn focused_pid() -> Option<u32> {
        None
    }
}

#[cfg(not(any(target_os = "windows", target_os = "linux")))]
mod fallback_impl {
    use std::path::PathBuf;

    use super::ProcessHandle;
    use crate::error::{Error, Result};
    use crate::process::pattern::MemoryRegion;

    fn unsupported() -> Error {
        Error::ProcessNotFound("process access not supported on this platform".to_string())
    }

    impl ProcessHandle {
        pub fn open(_pid: u32) -> Result<Self> {
            Err(unsupported())
        }

        pub(super) fn read_bytes_impl(&self, address: u64, _size: usize) -> Result<Vec<u8>> {
            Err(Error::MemoryReadFailed {
                address,
                message: "memory reading not supported on this platform".to_string(),
            })
        }

        pub(super) fn regions_impl(&self) -> Result<Vec<MemoryRegion>> {
            Err(unsupported())
        }

        pub fn is_alive(&self) -> bool {
            false
        }

        pub fn is_64bit(&self) -> Result<bool> {
            Err(unsupported())
        }

        pub fn executable_path(&self) -> Result<PathBuf> {
            Err(unsupported())
        }

        pub fn command_line(&self) -> Result<String> {
            Err(unsupported())
        }
    }

    pub fn find_processes(_name: &str) -> Vec<u32> {
        Vec::new()
    }

    pub fn process_exists(_pid: u32) -> bool {
        false
    }

    pub fn focused_pid() -> Option<u32> {
        None
    }
}

/// Fail early with a uniform error when a pid cannot be opened.
pub fn open_process(pid: u32) -> Result<ProcessHandle> {
    if !process_exists(pid) {
        return Err(Error::ProcessNotFound(format!("PID {} is not running", pid)));
    }
    ProcessHandle::open(pid)
}
