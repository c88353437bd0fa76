//! The operating-system surface the enumerator and the injector drive.
//!
//! The live implementation lives in `windows_wrapper`; tests run the same
//! operations against scripted fakes that account for every resource
//! acquire and release. Implementations speak `std::io::Error`; the
//! operations in the crate root own the stage-tagged taxonomy in
//! [`crate::error`].

use crate::ProcessRecord;
use std::io;

pub trait Os {
	type Records: Iterator<Item = ProcessRecord>;
	type Process: TargetProcess;

	/// Point-in-time capture of every running process, in enumeration order.
	fn processes(&self) -> io::Result<Self::Records>;

	/// Opens `pid` with enough rights to allocate, write and start threads.
	fn open_process(&self, pid: u32) -> io::Result<Self::Process>;

	/// Address of the system's wide-path module loader. The loader module is
	/// mapped at one address for every process in a session, so the local
	/// address is a valid start routine inside any target.
	fn loader_entry(&self) -> io::Result<usize>;
}

/// An open handle to another process's address space; dropping it releases
/// the handle.
pub trait TargetProcess {
	type Buffer<'a>: RemoteBuffer
	where
		Self: 'a;
	type Thread: RemoteThread;

	/// Commits `size` bytes of read/write memory inside the target.
	fn alloc(&self, size: usize) -> io::Result<Self::Buffer<'_>>;

	/// Starts a thread inside the target at `entry` with `parameter`.
	fn spawn(&self, entry: usize, parameter: usize) -> io::Result<Self::Thread>;
}

/// Memory committed inside the target; dropping it frees the remote region.
pub trait RemoteBuffer {
	/// Address of the region inside the target's address space.
	fn address(&self) -> usize;

	/// Copies `data` into the region, returning the number of bytes the OS
	/// reports written.
	fn write(&self, data: &[u8], offset: usize) -> io::Result<usize>;
}

/// A thread running inside the target. Dropping it closes the local handle;
/// the thread itself cannot be cancelled from here.
pub trait RemoteThread {
	/// Blocks, with no timeout, until the thread exits, then returns its
	/// exit code. A start routine that never returns blocks forever.
	fn join(self) -> io::Result<u32>;
}

#[cfg(test)]
pub(crate) mod fake {
	use super::{Os, RemoteBuffer, RemoteThread, TargetProcess};
	use crate::ProcessRecord;
	use std::{
		cell::{Ref, RefCell},
		io,
		rc::Rc,
	};

	#[derive(Clone, Copy)]
	pub enum WriteOutcome {
		All,
		Zero,
		Err,
	}

	/// What the fake OS is instructed to do at each stage.
	pub struct Script {
		pub records: Vec<ProcessRecord>,
		pub snapshot_fails: bool,
		pub open_fails: bool,
		pub alloc_fails: bool,
		pub write_outcome: WriteOutcome,
		pub loader_missing: bool,
		pub spawn_fails: bool,
		pub exit_code: u32,
		pub buffer_address: usize,
	}

	impl Script {
		pub fn healthy() -> Self {
			Self {
				records: vec![
					ProcessRecord {
						pid: 4,
						name: "System".into(),
					},
					ProcessRecord {
						pid: 1184,
						name: "explorer.exe".into(),
					},
					ProcessRecord {
						pid: 4420,
						name: "notepad.exe".into(),
					},
				],
				snapshot_fails: false,
				open_fails: false,
				alloc_fails: false,
				write_outcome: WriteOutcome::All,
				loader_missing: false,
				spawn_fails: false,
				exit_code: 0x7ffb_0000,
				buffer_address: 0x0002_0000,
			}
		}
	}

	/// Every acquire and release crossing the OS surface, counted from the
	/// same `Drop` impls that release resources in the live implementation.
	#[derive(Debug, Default)]
	pub struct Ledger {
		pub processes_opened: usize,
		pub processes_closed: usize,
		pub buffers_allocated: usize,
		pub buffers_freed: usize,
		pub threads_spawned: usize,
		pub threads_closed: usize,
		pub last_alloc_size: Option<usize>,
		pub written: Vec<u8>,
		pub spawned_with: Option<(usize, usize)>,
	}

	pub struct ScriptedOs {
		script: Rc<Script>,
		ledger: Rc<RefCell<Ledger>>,
	}

	impl ScriptedOs {
		pub fn new(script: Script) -> Self {
			Self {
				script: Rc::new(script),
				ledger: Rc::default(),
			}
		}

		pub fn ledger(&self) -> Ref<'_, Ledger> {
			self.ledger.borrow()
		}
	}

	fn refused(what: &str) -> io::Error {
		io::Error::new(io::ErrorKind::PermissionDenied, what.to_string())
	}

	impl Os for ScriptedOs {
		type Process = ScriptedProcess;
		type Records = std::vec::IntoIter<ProcessRecord>;

		fn processes(&self) -> io::Result<Self::Records> {
			if self.script.snapshot_fails {
				return Err(refused("snapshot refused"));
			}
			Ok(self.script.records.clone().into_iter())
		}

		fn open_process(&self, pid: u32) -> io::Result<ScriptedProcess> {
			// Pid 0 is the idle pseudo-process; opening it always fails.
			if self.script.open_fails || pid == 0 {
				return Err(refused("open refused"));
			}
			self.ledger.borrow_mut().processes_opened += 1;
			Ok(ScriptedProcess {
				script: Rc::clone(&self.script),
				ledger: Rc::clone(&self.ledger),
			})
		}

		fn loader_entry(&self) -> io::Result<usize> {
			if self.script.loader_missing {
				return Err(io::Error::new(io::ErrorKind::NotFound, "no loader export"));
			}
			Ok(0x7ff8_0001_0000)
		}
	}

	pub struct ScriptedProcess {
		script: Rc<Script>,
		ledger: Rc<RefCell<Ledger>>,
	}

	impl Drop for ScriptedProcess {
		fn drop(&mut self) {
			self.ledger.borrow_mut().processes_closed += 1;
		}
	}

	impl TargetProcess for ScriptedProcess {
		type Buffer<'a> = ScriptedBuffer where Self: 'a;
		type Thread = ScriptedThread;

		fn alloc(&self, size: usize) -> io::Result<ScriptedBuffer> {
			if self.script.alloc_fails {
				return Err(refused("alloc refused"));
			}
			let mut ledger = self.ledger.borrow_mut();
			ledger.buffers_allocated += 1;
			ledger.last_alloc_size = Some(size);
			Ok(ScriptedBuffer {
				script: Rc::clone(&self.script),
				ledger: Rc::clone(&self.ledger),
			})
		}

		fn spawn(&self, entry: usize, parameter: usize) -> io::Result<ScriptedThread> {
			if self.script.spawn_fails {
				return Err(refused("spawn refused"));
			}
			let mut ledger = self.ledger.borrow_mut();
			ledger.threads_spawned += 1;
			ledger.spawned_with = Some((entry, parameter));
			Ok(ScriptedThread {
				script: Rc::clone(&self.script),
				ledger: Rc::clone(&self.ledger),
			})
		}
	}

	pub struct ScriptedBuffer {
		script: Rc<Script>,
		ledger: Rc<RefCell<Ledger>>,
	}

	impl Drop for ScriptedBuffer {
		fn drop(&mut self) {
			self.ledger.borrow_mut().buffers_freed += 1;
		}
	}

	impl RemoteBuffer for ScriptedBuffer {
		fn address(&self) -> usize {
			self.script.buffer_address
		}

		fn write(&self, data: &[u8], _offset: usize) -> io::Result<usize> {
			match self.script.write_outcome {
				WriteOutcome::All => {
					self.ledger.borrow_mut().written.extend_from_slice(data);
					Ok(data.len())
				}
				WriteOutcome::Zero => Ok(0),
				WriteOutcome::Err => Err(refused("write refused")),
			}
		}
	}

	pub struct ScriptedThread {
		script: Rc<Script>,
		ledger: Rc<RefCell<Ledger>>,
	}

	impl Drop for ScriptedThread {
		fn drop(&mut self) {
			self.ledger.borrow_mut().threads_closed += 1;
		}
	}

	impl RemoteThread for ScriptedThread {
		fn join(self) -> io::Result<u32> {
			Ok(self.script.exit_code)
		}
	}
}
