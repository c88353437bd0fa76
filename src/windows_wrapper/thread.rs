use crate::{
	sys::RemoteThread,
	windows_wrapper::{os_error, process::Process},
};
use std::{ffi::c_void, io, mem::transmute};
use tracing::warn;
use windows::Win32::{
	Foundation::{CloseHandle, HANDLE, WAIT_FAILED},
	System::Threading::{
		CreateRemoteThread, GetExitCodeThread, WaitForSingleObject, INFINITE,
		LPTHREAD_START_ROUTINE,
	},
};

pub type StartRoutine = LPTHREAD_START_ROUTINE;

/// A thread started inside another process; the local handle closes on
/// drop. The remote thread itself keeps running regardless.
pub struct Thread {
	handle: HANDLE,
}

impl Thread {
	/// Starts a thread in `process` at `entry` with `parameter`, running
	/// immediately with the default stack size.
	pub fn spawn_remote(process: &Process, entry: usize, parameter: usize) -> io::Result<Self> {
		let entry = unsafe { transmute::<usize, StartRoutine>(entry) };
		let handle = unsafe {
			CreateRemoteThread(
				process.handle(),
				None,
				0,
				entry,
				Some(parameter as *const c_void),
				0,
				None,
			)
		}
		.map_err(os_error)?;
		Ok(Self { handle })
	}

	/// Blocks, with no timeout, until the thread exits, then returns its
	/// exit code. A start routine that never returns blocks forever.
	pub fn wait_for_exit(self) -> io::Result<u32> {
		let cause = unsafe { WaitForSingleObject(self.handle, INFINITE) };
		if cause == WAIT_FAILED {
			return Err(io::Error::last_os_error());
		}
		let mut code = 0;
		unsafe { GetExitCodeThread(self.handle, &mut code) }.map_err(os_error)?;
		Ok(code)
	}
}

impl Drop for Thread {
	fn drop(&mut self) {
		if !self.handle.is_invalid() {
			if let Err(err) = unsafe { CloseHandle(self.handle) } {
				warn!(?err, "thread handle could not be closed");
			}
		}
	}
}

impl RemoteThread for Thread {
	fn join(self) -> io::Result<u32> { self.wait_for_exit() }
}
