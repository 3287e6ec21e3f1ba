use nix::errno::Errno;
use nix::sys::wait::{self, WaitStatus};
use nix::unistd::{self, Pid};
use tracing::debug;

/// Shell convention for an exit status: 0 is success.
pub type ExitCode = i32;

pub trait WaitStatusExt {
	fn code(self) -> ExitCode;
}

impl WaitStatusExt for WaitStatus {
	/// Exit code for a normal exit, `128 + signal` for a killed process.
	fn code(self) -> ExitCode {
		match self {
			WaitStatus::Exited(_, code) => code,
			WaitStatus::Signaled(_, signal, _) => 128 + signal as i32,
			WaitStatus::Stopped(_, signal) => 128 + signal as i32,
			_ => 0,
		}
	}
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Proccess {
	pub pid: Pid,
	pub status: WaitStatus,
}

/// The processes forked for one line, in pipeline order.
#[derive(Debug)]
pub struct Job {
	pub proccesses: Vec<Proccess>,
}

impl Job {
	pub fn is_empty(&self) -> bool {
		self.proccesses.is_empty()
	}

	/// Blocks until every process of the job has terminated and returns the
	/// exit code of the last one. All processes are reaped even when waiting
	/// on one of them fails.
	pub fn wait(mut self) -> nix::Result<ExitCode> {
		let mut first_err = None;
		for pr in self.proccesses.iter_mut() {
			match waitpid_retry(pr.pid) {
				Ok(status) => {
					debug!(pid = pr.pid.as_raw(), ?status, "reaped");
					pr.status = status;
				},
				Err(e) => { first_err.get_or_insert(e); },
			}
		}
		if let Some(e) = first_err {
			return Err(e);
		}
		Ok(self.proccesses.last().map_or(0, |pr| pr.status.code()))
	}
}

fn waitpid_retry(pid: Pid) -> nix::Result<WaitStatus> {
	loop {
		match wait::waitpid(pid, None) {
			Err(Errno::EINTR) => (),
			result => return result,
		}
	}
}

#[derive(Debug)]
pub struct JobBuilder {
	imp: Job,
}

impl JobBuilder {
	pub fn new(size_hint: usize) -> JobBuilder {
		JobBuilder {
			imp: Job { proccesses: Vec::with_capacity(size_hint) }
		}
	}

	/// Forks and records the child on the parent side.
	///
	/// The caller must keep the child to async-signal-safe calls until it
	/// execs or exits.
	pub fn push_fork(&mut self) -> nix::Result<unistd::ForkResult> {
		// SAFETY: the child side only runs dup2/close/execvp/write/_exit.
		let r = unsafe { unistd::fork() }?;
		if let unistd::ForkResult::Parent { child } = r {
			debug!(pid = child.as_raw(), "forked");
			self.imp.proccesses.push(Proccess { pid: child, status: WaitStatus::StillAlive });
		}
		Ok(r)
	}

	pub fn is_empty(&self) -> bool {
		self.imp.is_empty()
	}

	pub fn build(self) -> Job {
		self.imp
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use nix::sys::signal::Signal;

	#[test]
	fn exit_code_of_normal_exit() {
		let pid = Pid::from_raw(42);
		assert_eq!(WaitStatus::Exited(pid, 0).code(), 0);
		assert_eq!(WaitStatus::Exited(pid, 3).code(), 3);
	}

	#[test]
	fn exit_code_of_signal_death() {
		let pid = Pid::from_raw(42);
		assert_eq!(WaitStatus::Signaled(pid, Signal::SIGKILL, false).code(), 137);
		assert_eq!(WaitStatus::Signaled(pid, Signal::SIGPIPE, false).code(), 141);
	}

	#[test]
	fn empty_job_waits_to_success() {
		let job = JobBuilder::new(0).build();
		assert!(job.is_empty());
		assert_eq!(job.wait(), Ok(0));
	}
}
