use crate::{windows_wrapper::os_error, ProcessRecord};
use std::{io, mem::size_of};
use tracing::warn;
use windows::Win32::{
	Foundation::{CloseHandle, HANDLE},
	System::Diagnostics::ToolHelp::{
		CreateToolhelp32Snapshot, Process32FirstW, Process32NextW, PROCESSENTRY32W,
		TH32CS_SNAPPROCESS,
	},
};

/// A point-in-time toolhelp capture of the process table, closed on drop.
pub struct Snapshot {
	handle: HANDLE,
}

impl Snapshot {
	pub fn processes() -> io::Result<Self> {
		let handle =
			unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) }.map_err(os_error)?;
		Ok(Self { handle })
	}

	pub fn handle(&self) -> HANDLE { self.handle }

	pub fn into_records(self) -> ProcessRecords { ProcessRecords::new(self) }
}

impl Drop for Snapshot {
	fn drop(&mut self) {
		if !self.handle.is_invalid() {
			if let Err(err) = unsafe { CloseHandle(self.handle) } {
				warn!(?err, "snapshot handle could not be closed");
			}
		}
	}
}

/// Walks a snapshot front to back with the first/next protocol, owning the
/// snapshot for as long as the walk lives. Exhaustion and a failed step
/// both end the walk.
pub struct ProcessRecords {
	snapshot: Snapshot,
	entry: PROCESSENTRY32W,
	done_first: bool,
}

impl ProcessRecords {
	fn new(snapshot: Snapshot) -> Self {
		// dwSize has to be set before the first call or the walk refuses to
		// start.
		let entry = PROCESSENTRY32W {
			dwSize: size_of::<PROCESSENTRY32W>() as _,
			..PROCESSENTRY32W::default()
		};

		Self {
			snapshot,
			entry,
			done_first: false,
		}
	}

	fn record(&self) -> ProcessRecord {
		ProcessRecord {
			pid: self.entry.th32ProcessID,
			name: exe_file_name(&self.entry),
		}
	}
}

impl Iterator for ProcessRecords {
	type Item = ProcessRecord;

	fn next(&mut self) -> Option<Self::Item> {
		match self.done_first {
			false => {
				self.done_first = true;
				unsafe { Process32FirstW(self.snapshot.handle(), &mut self.entry) }
					.ok()
					.map(|_| self.record())
			}
			true => unsafe { Process32NextW(self.snapshot.handle(), &mut self.entry) }
				.ok()
				.map(|_| self.record()),
		}
	}
}

fn exe_file_name(entry: &PROCESSENTRY32W) -> String {
	let len = entry
		.szExeFile
		.iter()
		.position(|&unit| unit == 0)
		.unwrap_or(entry.szExeFile.len());
	String::from_utf16_lossy(&entry.szExeFile[..len])
}
