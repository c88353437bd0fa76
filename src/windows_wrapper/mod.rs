//! Thin RAII wrappers over the Win32 objects the tool touches, plus the
//! live [`Os`] implementation built from them.

pub mod loader;
pub mod process;
pub mod snapshot;
pub mod thread;
pub mod virtual_alloc;

use crate::sys::Os;
use std::io;

/// The live Win32 implementation of the OS surface.
pub struct NativeOs;

impl Os for NativeOs {
	type Process = process::Process;
	type Records = snapshot::ProcessRecords;

	fn processes(&self) -> io::Result<snapshot::ProcessRecords> {
		snapshot::Snapshot::processes().map(snapshot::Snapshot::into_records)
	}

	fn open_process(&self, pid: u32) -> io::Result<process::Process> {
		process::Process::open(pid)
	}

	fn loader_entry(&self) -> io::Result<usize> { loader::load_library_entry() }
}

pub(crate) fn os_error(err: windows::core::Error) -> io::Error {
	let hresult = err.code().0 as u32;
	// Win32 codes travel as HRESULT 0x8007xxxx; unwrap back to the raw code
	// so io::Error renders the familiar message.
	match hresult & 0xffff_0000 {
		0x8007_0000 => io::Error::from_raw_os_error((hresult & 0xffff) as i32),
		_ => io::Error::other(err),
	}
}
