//! Process enumeration and LoadLibrary injection for Windows.
//!
//! Two operations: [`list_processes`] captures a snapshot of every running
//! process, and [`inject`] loads a library inside a chosen target by
//! writing the library's path into the target's address space and running
//! the system loader on a remote thread. Both drive the OS through the
//! [`sys`] traits, so the same logic runs against the live Win32 surface
//! and against scripted fakes in tests.

pub mod error;
pub mod helpers;
pub mod sys;
#[cfg(windows)]
pub mod windows_wrapper;

use crate::{
	error::{Error, Result},
	helpers::wide_path_bytes,
	sys::{Os, RemoteBuffer, RemoteThread, TargetProcess},
};
use std::path::PathBuf;
use tracing::debug;

/// One running process as seen by a snapshot. The pid is unique only among
/// currently-live processes and is reused by the OS after exit; the name is
/// the executable file name, not a path, and not unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRecord {
	pub pid: u32,
	pub name: String,
}

/// A validated target/library pair. The injector performs no defaulting and
/// no re-validation; the caller guarantees a nonzero pid and a non-empty
/// absolute path.
#[derive(Debug, Clone)]
pub struct InjectionRequest {
	pub target_pid: u32,
	pub library_path: PathBuf,
}

/// Exit code of the remote loader thread: the loader's own verdict, not the
/// injection mechanism's. Nonzero is conventionally the loaded module's
/// handle; zero means the target's loader rejected the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderReturn(pub u32);

impl LoaderReturn {
	pub fn module_loaded(self) -> bool { self.0 != 0 }
}

/// Captures a point-in-time snapshot of every running process.
///
/// Records come back in enumeration order, unsorted, duplicates preserved;
/// an empty process table yields an empty list, not an error. A pid taken
/// from one snapshot may belong to an unrelated process by the time it is
/// used, so consumers re-validate against a fresh snapshot where that
/// matters.
pub fn list_processes_with<O: Os>(os: &O) -> Result<Vec<ProcessRecord>> {
	let records: Vec<ProcessRecord> =
		os.processes().map_err(Error::SnapshotUnavailable)?.collect();
	debug!(count = records.len(), "captured process snapshot");
	Ok(records)
}

/// [`list_processes_with`] against the live Win32 surface.
#[cfg(windows)]
pub fn list_processes() -> Result<Vec<ProcessRecord>> {
	list_processes_with(&windows_wrapper::NativeOs)
}

/// Loads `request.library_path` inside the target process: commit a buffer
/// in the target, write the path there as null-terminated UTF-16, then run
/// the system loader over it on a new remote thread.
///
/// Blocks, with no timeout, until the remote loader thread exits; a load
/// that hangs inside the target hangs this call with it, and nothing here
/// can cancel the remote thread once it is running. Every handle and the
/// remote buffer are released on every exit path. `Ok(LoaderReturn(0))`
/// means the mechanism worked and the target's own loader said no.
pub fn inject_with<O: Os>(os: &O, request: &InjectionRequest) -> Result<LoaderReturn> {
	let pid = request.target_pid;
	let process = os
		.open_process(pid)
		.map_err(|source| Error::ProcessOpenFailed { pid, source })?;

	let path = wide_path_bytes(&request.library_path);
	let buffer = process
		.alloc(path.len())
		.map_err(|source| Error::MemoryAllocationFailed {
			pid,
			size: path.len(),
			source,
		})?;

	let written = buffer
		.write(&path, 0)
		.map_err(|source| Error::MemoryWriteFailed {
			pid,
			source: Some(source),
		})?;
	if written == 0 {
		// A nominal success that moved nothing is still a failed write.
		return Err(Error::MemoryWriteFailed { pid, source: None });
	}

	let entry = os.loader_entry().map_err(Error::LoaderResolveFailed)?;
	debug!(pid, entry, "starting remote loader thread");

	let thread = process
		.spawn(entry, buffer.address())
		.map_err(|source| Error::RemoteThreadCreationFailed { pid, source })?;
	let exit_code = thread
		.join()
		.map_err(|source| Error::RemoteWaitFailed { pid, source })?;

	debug!(pid, exit_code, "remote loader thread finished");
	Ok(LoaderReturn(exit_code))
}

/// [`inject_with`] against the live Win32 surface.
#[cfg(windows)]
pub fn inject(request: &InjectionRequest) -> Result<LoaderReturn> {
	inject_with(&windows_wrapper::NativeOs, request)
}
