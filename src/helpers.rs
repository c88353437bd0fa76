use crate::ProcessRecord;
use std::{ffi::OsStr, path::Path};

/// Encodes `path` as the null-terminated UTF-16 the remote `LoadLibraryW`
/// expects. The terminator is load-bearing: without it the remote loader
/// reads past the end of the string.
pub fn wide_path(path: &Path) -> Vec<u16> {
	let mut units = encode_units(path.as_os_str());
	units.push(0);
	units
}

/// [`wide_path`] flattened to the little-endian bytes written into the
/// target process.
pub fn wide_path_bytes(path: &Path) -> Vec<u8> {
	wide_path(path)
		.into_iter()
		.flat_map(u16::to_le_bytes)
		.collect()
}

#[cfg(windows)]
fn encode_units(s: &OsStr) -> Vec<u16> {
	use std::os::windows::ffi::OsStrExt;
	s.encode_wide().collect()
}

#[cfg(not(windows))]
fn encode_units(s: &OsStr) -> Vec<u16> {
	s.to_string_lossy().encode_utf16().collect()
}

/// Records whose executable name matches `name`, ignoring ASCII case the
/// way Windows file names do. Several processes may share one executable;
/// the caller disambiguates by pid.
pub fn find_by_name<'a>(records: &'a [ProcessRecord], name: &str) -> Vec<&'a ProcessRecord> {
	records
		.iter()
		.filter(|record| record.name.eq_ignore_ascii_case(name))
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn wide_path_is_terminated() {
		let units = wide_path(Path::new(r"C:\tools\probe.dll"));
		assert_eq!(units.last(), Some(&0));
		assert_eq!(units.iter().filter(|&&unit| unit == 0).count(), 1);
		assert_eq!(units.len(), r"C:\tools\probe.dll".encode_utf16().count() + 1);
	}

	#[test]
	fn wide_path_bytes_are_little_endian_pairs() {
		let bytes = wide_path_bytes(Path::new("ab"));
		assert_eq!(bytes, vec![b'a', 0, b'b', 0, 0, 0]);
	}

	#[test]
	fn find_by_name_ignores_case_and_keeps_duplicates() {
		let records = vec![
			ProcessRecord {
				pid: 100,
				name: "notepad.exe".into(),
			},
			ProcessRecord {
				pid: 200,
				name: "Notepad.exe".into(),
			},
			ProcessRecord {
				pid: 300,
				name: "calc.exe".into(),
			},
		];
		let found = find_by_name(&records, "NOTEPAD.EXE");
		let pids: Vec<u32> = found.iter().map(|record| record.pid).collect();
		assert_eq!(pids, vec![100, 200]);
	}
}
