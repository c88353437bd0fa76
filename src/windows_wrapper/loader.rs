use crate::windows_wrapper::os_error;
use std::io;
use windows::{
	core::{s, w},
	Win32::System::LibraryLoader::{GetModuleHandleW, GetProcAddress},
};

/// Resolves the address of `LoadLibraryW` in the local `kernel32.dll`.
///
/// kernel32 is mapped at the same base in every process of a session, so
/// the local address is valid as a thread start routine inside any target.
pub fn load_library_entry() -> io::Result<usize> {
	let kernel32 = unsafe { GetModuleHandleW(w!("kernel32.dll")) }.map_err(os_error)?;
	let entry = unsafe { GetProcAddress(kernel32, s!("LoadLibraryW")) }
		.ok_or_else(io::Error::last_os_error)?;
	Ok(entry as usize)
}
