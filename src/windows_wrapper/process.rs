use crate::{
	sys::TargetProcess,
	windows_wrapper::{os_error, thread::Thread, virtual_alloc::VirtualAlloc},
};
use std::io;
use tracing::warn;
use windows::Win32::{
	Foundation::{CloseHandle, HANDLE},
	System::{
		Diagnostics::Debug::WriteProcessMemory,
		Threading::{OpenProcess, PROCESS_ALL_ACCESS},
	},
};

/// An open handle to another process, closed on drop.
pub struct Process {
	handle: HANDLE,
	pid: u32,
}

impl Process {
	pub fn open(pid: u32) -> io::Result<Self> {
		let handle = unsafe { OpenProcess(PROCESS_ALL_ACCESS, false, pid) }.map_err(os_error)?;
		Ok(Self { handle, pid })
	}

	pub fn handle(&self) -> HANDLE { self.handle }

	pub fn pid(&self) -> u32 { self.pid }

	pub fn virtual_alloc(&self, size: usize) -> io::Result<VirtualAlloc<'_>> {
		VirtualAlloc::alloc(self, size)
	}

	pub fn write_memory(&self, data: &[u8], address: usize) -> io::Result<usize> {
		let mut bytes_written = 0;
		unsafe {
			WriteProcessMemory(
				self.handle,
				address as _,
				data.as_ptr() as _,
				data.len(),
				Some(&mut bytes_written),
			)
		}
		.map_err(os_error)?;
		Ok(bytes_written)
	}
}

impl Drop for Process {
	fn drop(&mut self) {
		if !self.handle.is_invalid() {
			if let Err(err) = unsafe { CloseHandle(self.handle) } {
				warn!(pid = self.pid, ?err, "process handle could not be closed");
			}
		}
	}
}

impl TargetProcess for Process {
	type Buffer<'a> = VirtualAlloc<'a> where Self: 'a;
	type Thread = Thread;

	fn alloc(&self, size: usize) -> io::Result<VirtualAlloc<'_>> { self.virtual_alloc(size) }

	fn spawn(&self, entry: usize, parameter: usize) -> io::Result<Thread> {
		Thread::spawn_remote(self, entry, parameter)
	}
}
