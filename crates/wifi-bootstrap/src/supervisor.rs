// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Foreground supervision of the authentication daemon.
//!
//! The daemon's stdout and stderr are relayed by two independent tasks while
//! the supervisor waits for it to exit. Both relays are joined before the
//! exit status is reported, so trailing output written just before exit is
//! never lost.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::error::SupervisorError;

const RELAY_BUFFER_BYTES: usize = 8 * 1024;

/// How to launch the daemon.
///
/// `leading_args` come before the interface and configuration arguments.
#[derive(Debug, Clone)]
pub struct DaemonCommand {
	pub program: PathBuf,
	pub leading_args: Vec<String>,
}

impl DaemonCommand {
	pub fn new(program: impl Into<PathBuf>) -> Self {
		Self {
			program: program.into(),
			leading_args: Vec::new(),
		}
	}

	pub fn with_leading_args(mut self, args: Vec<String>) -> Self {
		self.leading_args = args;
		self
	}

	fn build(&self, iface: &str, config_path: &Path) -> Command {
		let mut cmd = Command::new(&self.program);
		cmd.args(&self.leading_args)
			.arg("-i")
			.arg(iface)
			.arg("-c")
			.arg(config_path)
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.kill_on_drop(true);
		cmd
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonState {
	NotStarted,
	Running { pid: Option<u32> },
	Exited(ExitStatus),
	FailedToStart,
}

impl DaemonState {
	pub fn is_success(&self) -> bool {
		matches!(self, DaemonState::Exited(status) if status.success())
	}
}

/// A sink handed back after its stream reached end-of-file.
#[derive(Debug)]
pub struct Relayed<W> {
	pub sink: W,
	pub bytes: u64,
	pub error: Option<std::io::Error>,
}

/// Final report of a supervised run.
#[derive(Debug)]
pub struct DaemonReport<O, E> {
	pub status: ExitStatus,
	pub stdout: Relayed<O>,
	pub stderr: Relayed<E>,
}

impl<O, E> DaemonReport<O, E> {
	pub fn success(&self) -> bool {
		self.status.success()
	}
}

/// Copies `reader` into `sink` chunk by chunk, flushing each chunk, until
/// end-of-file or a read error.
///
/// After the first sink error the rest of the stream is drained and
/// discarded, so the daemon never writes into a closed pipe.
async fn relay<R, W>(mut reader: R, mut sink: W) -> Relayed<W>
where
	R: AsyncRead + Unpin,
	W: AsyncWrite + Unpin,
{
	let mut buf = vec![0u8; RELAY_BUFFER_BYTES];
	let mut bytes = 0u64;
	loop {
		let n = match reader.read(&mut buf).await {
			Ok(0) => break,
			Ok(n) => n,
			Err(e) => {
				return Relayed {
					sink,
					bytes,
					error: Some(e),
				}
			}
		};
		let written = match sink.write_all(&buf[..n]).await {
			Ok(()) => sink.flush().await,
			Err(e) => Err(e),
		};
		if let Err(e) = written {
			if let Err(drain) = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await {
				debug!(error = %drain, "draining after sink failure stopped");
			}
			return Relayed {
				sink,
				bytes,
				error: Some(e),
			};
		}
		bytes += n as u64;
	}
	Relayed {
		sink,
		bytes,
		error: None,
	}
}

async fn join_relay<W>(
	stream: &'static str,
	handle: JoinHandle<Relayed<W>>,
) -> Result<Relayed<W>, SupervisorError> {
	let relayed = handle.await.map_err(|e| SupervisorError::Relay {
		stream,
		message: e.to_string(),
	})?;
	if let Some(e) = &relayed.error {
		warn!(stream, error = %e, "relay stopped early");
	}
	Ok(relayed)
}

pub struct Supervisor {
	command: DaemonCommand,
	state: DaemonState,
}

impl Supervisor {
	pub fn new(command: DaemonCommand) -> Self {
		Self {
			command,
			state: DaemonState::NotStarted,
		}
	}

	pub fn state(&self) -> DaemonState {
		self.state
	}

	/// Runs the daemon with its output relayed to this process's stdout and
	/// stderr.
	pub async fn run(
		&mut self,
		iface: &str,
		config_path: &Path,
	) -> Result<DaemonReport<tokio::io::Stdout, tokio::io::Stderr>, SupervisorError> {
		self
			.supervise(iface, config_path, tokio::io::stdout(), tokio::io::stderr())
			.await
	}

	/// Launches the daemon and blocks until it exits. There is no restart.
	#[instrument(
		skip(self, config_path, stdout, stderr),
		fields(program = %self.command.program.display(), config = %config_path.display())
	)]
	pub async fn supervise<O, E>(
		&mut self,
		iface: &str,
		config_path: &Path,
		stdout: O,
		stderr: E,
	) -> Result<DaemonReport<O, E>, SupervisorError>
	where
		O: AsyncWrite + Unpin + Send + 'static,
		E: AsyncWrite + Unpin + Send + 'static,
	{
		let mut child = match self.command.build(iface, config_path).spawn() {
			Ok(child) => child,
			Err(source) => {
				self.state = DaemonState::FailedToStart;
				error!(error = %source, "failed to start daemon");
				return Err(SupervisorError::Launch {
					program: self.command.program.display().to_string(),
					source,
				});
			}
		};
		self.state = DaemonState::Running { pid: child.id() };
		info!(pid = ?child.id(), "daemon started");

		let out_pipe = child
			.stdout
			.take()
			.ok_or(SupervisorError::MissingPipe { stream: "stdout" })?;
		let err_pipe = child
			.stderr
			.take()
			.ok_or(SupervisorError::MissingPipe { stream: "stderr" })?;

		let out_task = tokio::spawn(relay(out_pipe, stdout));
		let err_task = tokio::spawn(relay(err_pipe, stderr));

		let status = child.wait().await.map_err(SupervisorError::Wait)?;
		debug!(%status, "daemon exited, draining output");

		let stdout = join_relay("stdout", out_task).await?;
		let stderr = join_relay("stderr", err_task).await?;

		self.state = DaemonState::Exited(status);
		if status.success() {
			info!("daemon finished successfully");
		} else {
			error!(%status, "daemon exited with error");
		}

		Ok(DaemonReport {
			status,
			stdout,
			stderr,
		})
	}
}

impl std::fmt::Debug for Supervisor {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Supervisor")
			.field("program", &self.command.program)
			.field("state", &self.state)
			.finish()
	}
}
