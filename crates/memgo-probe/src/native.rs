//! Direct Windows memory-management calls used as reclaim steps
//!
//! The calls are described by [`NativeCall`] on every platform so step lists
//! can be built and inspected anywhere. Invoking one off Windows fails like any
//! other broken step.

use std::fmt;

/// Command accepted by the memory-list information class
///
/// Values are the `SYSTEM_MEMORY_LIST_COMMAND` codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryListCommand {
    /// Capture and reset page accessed bits
    CaptureAndResetAccessedBits,
    /// Empty the working sets of all processes
    EmptyWorkingSets,
    /// Write the modified page list out to disk
    FlushModifiedList,
    /// Drop the standby list
    PurgeStandbyList,
}

impl MemoryListCommand {
    /// Every command, in the order they are issued
    pub fn all() -> [MemoryListCommand; 4] {
        [
            MemoryListCommand::CaptureAndResetAccessedBits,
            MemoryListCommand::EmptyWorkingSets,
            MemoryListCommand::FlushModifiedList,
            MemoryListCommand::PurgeStandbyList,
        ]
    }

    /// Numeric command code
    pub fn code(&self) -> u32 {
        match self {
            MemoryListCommand::CaptureAndResetAccessedBits => 1,
            MemoryListCommand::EmptyWorkingSets => 2,
            MemoryListCommand::FlushModifiedList => 3,
            MemoryListCommand::PurgeStandbyList => 4,
        }
    }

    /// Short name used for step names
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryListCommand::CaptureAndResetAccessedBits => "reset_accessed_bits",
            MemoryListCommand::EmptyWorkingSets => "empty_working_sets",
            MemoryListCommand::FlushModifiedList => "flush_modified_list",
            MemoryListCommand::PurgeStandbyList => "purge_standby_list",
        }
    }
}

/// An OS call made in-process rather than through a helper program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeCall {
    /// Trim the agent's own working set (`SetProcessWorkingSetSize(-1, -1)`)
    TrimWorkingSet,
    /// Shrink the system file cache working set
    FlushFileCache,
    /// Issue one memory-list command
    MemoryList(MemoryListCommand),
}

impl NativeCall {
    /// Make the call
    ///
    /// Returns a human-readable reason on failure.
    pub fn invoke(&self) -> Result<(), String> {
        imp::invoke(*self)
    }
}

impl fmt::Display for NativeCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeCall::TrimWorkingSet => write!(f, "SetProcessWorkingSetSize"),
            NativeCall::FlushFileCache => write!(f, "NtSetSystemInformation(file cache)"),
            NativeCall::MemoryList(command) => {
                write!(f, "NtSetSystemInformation(memory list {})", command.code())
            }
        }
    }
}

#[cfg(windows)]
mod imp {
    use super::NativeCall;
    use std::ffi::c_void;
    use std::mem::size_of;
    use windows_sys::Win32::System::Threading::{GetCurrentProcess, SetProcessWorkingSetSize};

    const SYSTEM_FILE_CACHE_INFORMATION: i32 = 21;
    const SYSTEM_MEMORY_LIST_INFORMATION: i32 = 80;

    #[repr(C)]
    #[derive(Default)]
    struct SystemCacheInformation {
        current_size: usize,
        peak_size: usize,
        page_fault_count: u32,
        minimum_working_set: usize,
        maximum_working_set: usize,
        unused: [usize; 4],
    }

    #[link(name = "ntdll")]
    extern "system" {
        fn NtSetSystemInformation(class: i32, information: *const c_void, length: u32) -> i32;
    }

    pub(super) fn invoke(call: NativeCall) -> Result<(), String> {
        match call {
            NativeCall::TrimWorkingSet => {
                // SAFETY: the pseudo-handle from GetCurrentProcess is always valid
                let ok = unsafe { SetProcessWorkingSetSize(GetCurrentProcess(), usize::MAX, usize::MAX) };
                if ok == 0 {
                    Err(format!("failed: {}", std::io::Error::last_os_error()))
                } else {
                    Ok(())
                }
            }
            NativeCall::FlushFileCache => {
                let info = SystemCacheInformation {
                    minimum_working_set: usize::MAX,
                    maximum_working_set: usize::MAX,
                    ..Default::default()
                };
                set_system_information(SYSTEM_FILE_CACHE_INFORMATION, &info)
            }
            NativeCall::MemoryList(command) => {
                let code = command.code() as usize;
                set_system_information(SYSTEM_MEMORY_LIST_INFORMATION, &code)
            }
        }
    }

    fn set_system_information<T>(class: i32, value: &T) -> Result<(), String> {
        // SAFETY: `value` is a live, correctly sized buffer for the duration of the call
        let status = unsafe {
            NtSetSystemInformation(class, value as *const T as *const c_void, size_of::<T>() as u32)
        };
        if status < 0 {
            Err(format!("NTSTATUS {:#010x}", status as u32))
        } else {
            Ok(())
        }
    }
}

#[cfg(not(windows))]
mod imp {
    use super::NativeCall;

    pub(super) fn invoke(call: NativeCall) -> Result<(), String> {
        Err(format!("{} is only available on Windows", call))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_list_codes() {
        let codes: Vec<u32> = MemoryListCommand::all().iter().map(|c| c.code()).collect();
        assert_eq!(codes, [1, 2, 3, 4]);
    }

    #[test]
    fn test_display() {
        assert_eq!(NativeCall::TrimWorkingSet.to_string(), "SetProcessWorkingSetSize");
        assert_eq!(
            NativeCall::MemoryList(MemoryListCommand::PurgeStandbyList).to_string(),
            "NtSetSystemInformation(memory list 4)"
        );
    }

    #[cfg(not(windows))]
    #[test]
    fn test_invoke_off_windows_fails() {
        let reason = NativeCall::FlushFileCache.invoke().unwrap_err();
        assert!(reason.contains("only available on Windows"));
    }

    #[cfg(windows)]
    #[test]
    fn test_trim_own_working_set() {
        NativeCall::TrimWorkingSet.invoke().unwrap();
    }
}
