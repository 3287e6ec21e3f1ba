use std::ffi::{CString, NulError};
use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd, OwnedFd, RawFd};

use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::unistd::{self, ForkResult};
use tracing::{debug, warn};

use crate::config::Limits;
use crate::job::{ExitCode, Job, JobBuilder};
use crate::parser::{self, ParseError};
use crate::types::*;

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
	#[error("cannot open file: {path}: {source}")]
	Open { path: String, source: io::Error },
	#[error("cannot create pipe: {0}")]
	Pipe(#[source] nix::Error),
	#[error("cannot create process: {0}")]
	Fork(#[source] nix::Error),
	#[error("cannot wait for child process: {0}")]
	Wait(#[source] nix::Error),
	#[error("argument contains a NUL byte: {0}")]
	Nul(#[from] NulError),
}

#[derive(Debug, thiserror::Error)]
pub enum EvalError {
	#[error(transparent)]
	Parse(#[from] ParseError),
	#[error(transparent)]
	Exec(#[from] ExecError),
}

impl EvalError {
	/// Status recorded for a line that failed before anything could run.
	pub fn status(&self) -> ExitCode {
		match *self {
			EvalError::Parse(_) => 2,
			EvalError::Exec(_) => 1,
		}
	}
}

/// Runs a parsed line to completion.
///
/// [`ForkExec`] is the real implementation; tests swap in one that only
/// records what it was asked to run.
pub trait Launcher {
	/// `line` is the text `invocation` was parsed from. It is what gets
	/// reported when the program cannot be executed.
	fn launch(&mut self, invocation: &Invocation, line: &[u8]) -> Result<ExitCode, ExecError>;
}

#[derive(Debug, PartialEq, Eq)]
pub enum EvalResult {
	/// Blank line, nothing was run.
	Empty,
	Done(ExitCode),
}

pub fn eval(line: &[u8], limits: &Limits, launcher: &mut dyn Launcher) -> Result<EvalResult, EvalError> {
	let invocation = match parser::parse(line, limits)? {
		Some(invocation) => invocation,
		None => return Ok(EvalResult::Empty),
	};
	debug!(kind = ?parser::classify(line), line = %String::from_utf8_lossy(line), "dispatch");
	let code = launcher.launch(&invocation, line)?;
	Ok(EvalResult::Done(code))
}

/// Opens the target of a redirection: read-only for input, created or
/// truncated with mode 0666 for output.
pub fn open_redirect(redirect: &Redirect) -> Result<File, ExecError> {
	let mut oopt = OpenOptions::new();
	let _ = match redirect.typ {
		RedirectType::Input => oopt.read(true),
		RedirectType::Output => oopt.write(true).create(true).truncate(true).mode(0o666),
	};
	let path = redirect.path();
	oopt.open(path).map_err(|e| ExecError::Open { path: path.display().to_string(), source: e })
}

/// Both ends are close-on-exec. `dup2` clears the flag on the copy bound to
/// a standard stream, so only that copy survives into the program.
fn cloexec_pipe() -> Result<(OwnedFd, OwnedFd), ExecError> {
	unistd::pipe2(OFlag::O_CLOEXEC).map_err(ExecError::Pipe)
}

/// Everything one child needs, built before the fork.
struct Stage {
	argv: Vec<CString>,
	bindings: Vec<(RawFd, RawFd)>,
	close: Vec<RawFd>,
}

impl Stage {
	fn new(argv: Vec<CString>) -> Stage {
		Stage { argv, bindings: vec![], close: vec![] }
	}

	/// Duplicates `fd` onto the standard stream `to`, then closes `fd`.
	fn bind(mut self, fd: RawFd, to: RawFd) -> Stage {
		self.bindings.push((fd, to));
		self.close.push(fd);
		self
	}

	fn closing(mut self, fd: RawFd) -> Stage {
		self.close.push(fd);
		self
	}
}

fn bind_and_exec(stage: &Stage) -> nix::Result<std::convert::Infallible> {
	for &(fd, to) in &stage.bindings {
		unistd::dup2(fd, to)?;
	}
	for &fd in &stage.close {
		// never close a standard stream that was just bound
		if fd > libc::STDERR_FILENO {
			let _ = unistd::close(fd);
		}
	}
	unistd::execvp(&stage.argv[0], &stage.argv)
}

fn exec_stage(stage: &Stage, failure: &[u8]) -> ! {
	let errno = match bind_and_exec(stage) {
		Ok(never) => match never {},
		Err(e) => e,
	};
	let status = if errno == Errno::ENOENT { 127 } else { 126 };
	unsafe {
		libc::write(libc::STDERR_FILENO, failure.as_ptr() as *const libc::c_void, failure.len());
		libc::_exit(status)
	}
}

/// Forks one child per stage. Stops at the first failed fork; the children
/// forked so far are still in the returned job.
fn spawn_stages(stages: &[Stage], failure: &[u8]) -> (Job, nix::Result<()>) {
	let mut job_builder = JobBuilder::new(stages.len());
	for stage in stages {
		match job_builder.push_fork() {
			Ok(ForkResult::Parent { .. }) => {},
			Ok(ForkResult::Child) => exec_stage(stage, failure),
			Err(e) => {
				warn!(error = %e, forked = !job_builder.is_empty(), "fork failed");
				return (job_builder.build(), Err(e));
			},
		}
	}
	(job_builder.build(), Ok(()))
}

/// Reaps whatever was forked, then reports the first failure.
fn finish(job: Job, spawned: nix::Result<()>) -> Result<ExitCode, ExecError> {
	let waited = job.wait();
	if let Err(ref e) = waited {
		warn!(error = %e, "wait failed");
	}
	spawned.map_err(ExecError::Fork)?;
	waited.map_err(ExecError::Wait)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ForkExec;

impl ForkExec {
	fn launch_command(&self, command: &Command, failure: &[u8]) -> Result<ExitCode, ExecError> {
		let argv = command.argv()?;
		let opened = match command.redirect {
			Some(ref redirect) => Some((open_redirect(redirect)?, redirect.typ)),
			None => None,
		};
		let stage = match opened {
			Some((ref file, typ)) => Stage::new(argv).bind(file.as_raw_fd(), typ.fd()),
			None => Stage::new(argv),
		};
		let (job, spawned) = spawn_stages(&[stage], failure);
		drop(opened);
		finish(job, spawned)
	}

	fn launch_pipeline(&self, pipeline: &Pipeline, failure: &[u8]) -> Result<ExitCode, ExecError> {
		let left = Stage::new(pipeline.left.argv()?);
		let right = Stage::new(pipeline.right.argv()?);
		let (pipe_read, pipe_write) = cloexec_pipe()?;
		let stages = [
			left.bind(pipe_write.as_raw_fd(), libc::STDOUT_FILENO).closing(pipe_read.as_raw_fd()),
			right.bind(pipe_read.as_raw_fd(), libc::STDIN_FILENO).closing(pipe_write.as_raw_fd()),
		];
		let (job, spawned) = spawn_stages(&stages, failure);
		// both ends must be gone before waiting, or the reader never sees EOF
		drop(pipe_read);
		drop(pipe_write);
		finish(job, spawned)
	}
}

impl Launcher for ForkExec {
	fn launch(&mut self, invocation: &Invocation, line: &[u8]) -> Result<ExitCode, ExecError> {
		let mut failure = b"cannot execute command: \"".to_vec();
		failure.extend_from_slice(line);
		failure.extend_from_slice(b"\"\n");
		match *invocation {
			Invocation::Command(ref command) => self.launch_command(command, &failure),
			Invocation::Pipeline(ref pipeline) => self.launch_pipeline(pipeline, &failure),
		}
	}
}
