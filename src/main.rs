use std::process::ExitCode;

#[cfg(windows)]
mod cli {
	use clap::{Parser, Subcommand};
	use std::{path::PathBuf, process::ExitCode};
	use tracing_subscriber::EnvFilter;
	use winload::{helpers::find_by_name, inject, list_processes, InjectionRequest};

	#[derive(Parser)]
	#[command(version, about = "List processes and load a library into one of them")]
	struct Cli {
		#[command(subcommand)]
		command: Command,
	}

	#[derive(Subcommand)]
	enum Command {
		/// List running processes in snapshot order
		List {
			/// Only show processes whose executable name contains this
			#[arg(long)]
			name: Option<String>,
		},
		/// Load a library into a target process and wait for its loader
		/// to finish
		Inject {
			/// Target process id
			#[arg(long, conflicts_with = "process_name")]
			pid: Option<u32>,
			/// Target executable name; must match exactly one running
			/// process
			#[arg(long)]
			process_name: Option<String>,
			/// Path to the library to load inside the target
			dll: PathBuf,
		},
	}

	pub fn main() -> ExitCode {
		tracing_subscriber::fmt()
			.with_env_filter(
				EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
			)
			.with_target(false)
			.init();

		let cli = Cli::parse();
		match run(cli.command) {
			Ok(code) => code,
			Err(err) => {
				report(err.as_ref());
				ExitCode::FAILURE
			}
		}
	}

	fn run(command: Command) -> Result<ExitCode, Box<dyn std::error::Error>> {
		match command {
			Command::List { name } => {
				let records = list_processes()?;
				let filter = name.map(|name| name.to_ascii_lowercase());
				for record in records {
					if let Some(filter) = &filter {
						if !record.name.to_ascii_lowercase().contains(filter) {
							continue;
						}
					}
					println!("{:>8}  {}", record.pid, record.name);
				}
				Ok(ExitCode::SUCCESS)
			}
			Command::Inject {
				pid,
				process_name,
				dll,
			} => {
				let target_pid = resolve_target(pid, process_name)?;
				if dll.as_os_str().is_empty() {
					return Err("library path must not be empty".into());
				}
				// The path is read by the target's loader, so it must stay
				// meaningful outside this process's working directory.
				let library_path = std::path::absolute(&dll)?;

				let outcome = inject(&InjectionRequest {
					target_pid,
					library_path,
				})?;
				if outcome.module_loaded() {
					println!(
						"library loaded into process {target_pid} (loader returned {:#x})",
						outcome.0
					);
					Ok(ExitCode::SUCCESS)
				} else {
					// The mechanism ran to completion; the target's own
					// loader said no.
					eprintln!(
						"the target's loader rejected the library (returned 0); \
						 check the path is reachable from the target and the \
						 architectures match"
					);
					Ok(ExitCode::FAILURE)
				}
			}
		}
	}

	fn resolve_target(
		pid: Option<u32>,
		process_name: Option<String>,
	) -> Result<u32, Box<dyn std::error::Error>> {
		match (pid, process_name) {
			(Some(0), _) => Err("target pid must be nonzero".into()),
			(Some(pid), _) => Ok(pid),
			(None, Some(name)) => {
				let records = list_processes()?;
				let found = find_by_name(&records, &name);
				match found.as_slice() {
					[] => Err(format!("no running process named {name:?}").into()),
					[only] => Ok(only.pid),
					many => {
						let pids: Vec<String> =
							many.iter().map(|record| record.pid.to_string()).collect();
						Err(format!(
							"{name:?} matches several processes (pids {}); pick one with --pid",
							pids.join(", ")
						)
						.into())
					}
				}
			}
			(None, None) => Err("one of --pid or --process-name is required".into()),
		}
	}

	fn report(err: &dyn std::error::Error) {
		eprintln!("error: {err}");
		let mut source = err.source();
		while let Some(cause) = source {
			eprintln!("  caused by: {cause}");
			source = cause.source();
		}
	}
}

#[cfg(windows)]
fn main() -> ExitCode { cli::main() }

#[cfg(not(windows))]
fn main() -> ExitCode {
	eprintln!("winload drives the Windows process and loader APIs and only runs on Windows");
	ExitCode::FAILURE
}
