use crate::{
	sys::RemoteBuffer,
	windows_wrapper::process::Process,
};
use std::io;
use tracing::warn;
use windows::Win32::System::Memory::{
	VirtualAllocEx, VirtualFreeEx, MEM_COMMIT, MEM_RELEASE, MEM_RESERVE, PAGE_READWRITE,
};

/// Read/write memory committed inside another process, freed on drop.
pub struct VirtualAlloc<'a> {
	process: &'a Process,
	address: usize,
	size: usize,
}

impl<'a> VirtualAlloc<'a> {
	pub fn alloc(process: &'a Process, size: usize) -> io::Result<Self> {
		let address = unsafe {
			VirtualAllocEx(
				process.handle(),
				None,
				size,
				MEM_COMMIT | MEM_RESERVE,
				PAGE_READWRITE,
			)
		};
		if address.is_null() {
			return Err(io::Error::last_os_error());
		}
		Ok(Self {
			process,
			address: address as _,
			size,
		})
	}

	pub fn address(&self) -> usize { self.address }

	pub fn size(&self) -> usize { self.size }

	pub fn write_memory(&self, data: &[u8], offset: usize) -> io::Result<usize> {
		self.process.write_memory(data, self.address + offset)
	}
}

impl Drop for VirtualAlloc<'_> {
	fn drop(&mut self) {
		// MEM_RELEASE takes a zero size and frees the whole reservation.
		let address = self.address as *mut _;
		if let Err(err) = unsafe { VirtualFreeEx(self.process.handle(), address, 0, MEM_RELEASE) }
		{
			warn!(pid = self.process.pid(), ?err, "remote buffer could not be freed");
		}
	}
}

impl RemoteBuffer for VirtualAlloc<'_> {
	fn address(&self) -> usize { self.address }

	fn write(&self, data: &[u8], offset: usize) -> io::Result<usize> {
		self.write_memory(data, offset)
	}
}
