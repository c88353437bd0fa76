use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Stage-tagged failures; every variant names the step that failed and none
/// is retried. A loader that runs but returns zero is not an error here,
/// that verdict travels in [`crate::LoaderReturn`].
#[derive(Debug, Error)]
pub enum Error {
	#[error("process snapshot unavailable")]
	SnapshotUnavailable(#[source] io::Error),
	#[error("could not open process {pid}")]
	ProcessOpenFailed {
		pid: u32,
		#[source]
		source: io::Error,
	},
	#[error("could not allocate {size} bytes in process {pid}")]
	MemoryAllocationFailed {
		pid: u32,
		size: usize,
		#[source]
		source: io::Error,
	},
	/// Also raised when the write call nominally succeeds but reports zero
	/// bytes written; `source` is `None` in that case.
	#[error("could not write the library path into process {pid}")]
	MemoryWriteFailed {
		pid: u32,
		#[source]
		source: Option<io::Error>,
	},
	#[error("could not resolve the library loader entry point")]
	LoaderResolveFailed(#[source] io::Error),
	#[error("could not create a remote thread in process {pid}")]
	RemoteThreadCreationFailed {
		pid: u32,
		#[source]
		source: io::Error,
	},
	#[error("failed waiting on the remote loader thread in process {pid}")]
	RemoteWaitFailed {
		pid: u32,
		#[source]
		source: io::Error,
	},
}
