use std::ffi::{CString, NulError, OsStr};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::RawFd;
use std::path::Path;

/// What the first special character of a line asks for.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum OperationKind { Plain, InputRedirect, OutputRedirect, Pipeline }

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RedirectType { Input, Output }

impl RedirectType {
	pub fn operator(self) -> char {
		match self {
			RedirectType::Input => '<',
			RedirectType::Output => '>',
		}
	}

	/// Standard stream the target file is bound to.
	pub fn fd(self) -> RawFd {
		match self {
			RedirectType::Input => libc::STDIN_FILENO,
			RedirectType::Output => libc::STDOUT_FILENO,
		}
	}
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Redirect {
	pub target: Vec<u8>,
	pub typ: RedirectType,
}

impl Redirect {
	/// The target as entered, byte for byte.
	pub fn path(&self) -> &Path {
		Path::new(OsStr::from_bytes(&self.target))
	}
}

/// An argument vector. `name` is never empty. Words are kept as raw bytes
/// and reach `execvp` unchanged.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Command {
	pub name: Vec<u8>,
	pub arguments: Vec<Vec<u8>>,
	pub redirect: Option<Redirect>,
}

impl Command {
	/// Argument vector in the shape `execvp` wants, program name first.
	pub fn argv(&self) -> Result<Vec<CString>, NulError> {
		let mut argv = Vec::with_capacity(self.arguments.len() + 1);
		argv.push(CString::new(self.name.clone())?);
		for arg in &self.arguments {
			argv.push(CString::new(arg.clone())?);
		}
		Ok(argv)
	}
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Pipeline {
	pub left: Command,
	pub right: Command,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Invocation {
	Command(Command),
	Pipeline(Pipeline),
}
