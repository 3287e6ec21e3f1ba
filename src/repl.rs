use std::io::{self, BufRead, Read, Write};

use tracing::debug;

use crate::builtin::{self, Builtin};
use crate::config::Config;
use crate::eval::{self, EvalResult, Launcher};
use crate::global::{Recall, State};
use crate::job::ExitCode;
use crate::parser::ParseError;

#[derive(Debug, PartialEq, Eq)]
enum Flow { Continue, Exit }

#[derive(Debug, PartialEq, Eq)]
enum Input {
	Eof,
	Line,
	/// The line went past the limit and was dropped; this is its length.
	TooLong(usize),
}

/// The interactive loop: prompt, read a line, resolve history, run it.
pub struct Shell<L> {
	config: Config,
	state: State,
	launcher: L,
}

fn strip_newline(line: &[u8]) -> &[u8] {
	let line = line.strip_suffix(b"\n").unwrap_or(line);
	line.strip_suffix(b"\r").unwrap_or(line)
}

/// Reads one line into `buf`, holding at most `max_line` bytes plus the line
/// ending in memory. The rest of a longer line is consumed and counted.
fn read_line<R: BufRead>(input: &mut R, buf: &mut Vec<u8>, max_line: usize) -> io::Result<Input> {
	buf.clear();
	let limit = max_line as u64 + 2;
	if input.by_ref().take(limit).read_until(b'\n', buf)? == 0 {
		return Ok(Input::Eof);
	}
	if buf.last() == Some(&b'\n') || (buf.len() as u64) < limit {
		return Ok(Input::Line);
	}

	let mut len = buf.len();
	let mut last = buf.last().copied();
	loop {
		let (used, done) = {
			let available = input.fill_buf()?;
			match available.iter().position(|&c| c == b'\n') {
				Some(end) => {
					if end > 0 {
						last = Some(available[end - 1]);
					}
					len += end;
					(end + 1, true)
				},
				None => {
					last = available.last().copied().or(last);
					len += available.len();
					(available.len(), available.is_empty())
				},
			}
		};
		input.consume(used);
		if done {
			break;
		}
	}
	if last == Some(b'\r') {
		len -= 1;
	}
	Ok(Input::TooLong(len))
}

impl<L: Launcher> Shell<L> {
	pub fn new(config: Config, launcher: L) -> Shell<L> {
		Shell { config, state: State::new(), launcher }
	}

	pub fn state(&self) -> &State {
		&self.state
	}

	pub fn launcher(&self) -> &L {
		&self.launcher
	}

	/// Runs until the exit directive or end of input and returns the exit
	/// code of the last command that ran.
	///
	/// Lines are handled as raw bytes; nothing is decoded. Only I/O errors on
	/// the shell's own streams end the loop early; every other failure is
	/// reported on `errors` and the prompt comes back.
	pub fn run<R, W, E>(&mut self, mut input: R, mut output: W, mut errors: E) -> io::Result<ExitCode>
		where R: BufRead, W: Write, E: Write
	{
		let max_line = self.config.limits.max_line;
		let mut buf: Vec<u8> = vec![];
		loop {
			output.write_all(self.config.prompt.as_bytes())?;
			output.flush()?;
			match read_line(&mut input, &mut buf, max_line)? {
				Input::Eof => {
					debug!("end of input");
					break;
				},
				Input::TooLong(len) => {
					writeln!(errors, "osh: {}", ParseError::LineTooLong { len, max: max_line })?;
				},
				Input::Line => {
					if self.step(strip_newline(&buf), &mut output, &mut errors)? == Flow::Exit {
						break;
					}
				},
			}
		}
		Ok(self.state.last_status)
	}

	fn step<W: Write, E: Write>(&mut self, line: &[u8], output: &mut W, errors: &mut E) -> io::Result<Flow> {
		let max_line = self.config.limits.max_line;
		if line.len() > max_line {
			writeln!(errors, "osh: {}", ParseError::LineTooLong { len: line.len(), max: max_line })?;
			return Ok(Flow::Continue);
		}

		let line = match self.state.history.resolve(line) {
			Recall::NoHistory => {
				writeln!(output, "no commands in history")?;
				return Ok(Flow::Continue);
			},
			Recall::Run { line, recalled } => {
				if recalled {
					output.write_all(b"Command entered: \"")?;
					output.write_all(&line)?;
					output.write_all(b"\"\n")?;
				}
				line
			},
		};

		if let Some(Builtin::Exit) = builtin::match_builtin(&line) {
			return Ok(Flow::Exit);
		}

		// children inherit the descriptor, not our buffer
		output.flush()?;
		match eval::eval(&line, &self.config.limits, &mut self.launcher) {
			Ok(EvalResult::Empty) => {},
			Ok(EvalResult::Done(code)) => {
				debug!(code, "line finished");
				self.state.last_status = code;
			},
			Err(e) => {
				writeln!(errors, "osh: {}", e)?;
				errors.flush()?;
				self.state.last_status = e.status();
			},
		}
		Ok(Flow::Continue)
	}
}
