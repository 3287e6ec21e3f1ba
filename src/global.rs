use crate::job::ExitCode;

/// Entering exactly this re-runs the previous line.
pub const RECALL_TOKEN: &[u8] = b"!!";

/// Outcome of passing a fresh line through the history.
#[derive(Debug, PartialEq, Eq)]
pub enum Recall {
	/// Run this line. `recalled` is set when it came out of the history.
	Run { line: Vec<u8>, recalled: bool },
	/// The recall token was entered before anything was stored.
	NoHistory,
}

/// One-slot history holding the most recent non-recall line.
#[derive(Debug, Default, Clone)]
pub struct History {
	last: Option<Vec<u8>>,
}

impl History {
	pub fn new() -> History {
		History::default()
	}

	pub fn last(&self) -> Option<&[u8]> {
		self.last.as_deref()
	}

	/// Substitutes the stored line for the recall token; any other non-blank
	/// line replaces what is stored. Blank lines leave the slot alone.
	pub fn resolve(&mut self, line: &[u8]) -> Recall {
		if line == RECALL_TOKEN {
			return match self.last {
				Some(ref last) => Recall::Run { line: last.clone(), recalled: true },
				None => Recall::NoHistory,
			};
		}
		if !line.iter().all(u8::is_ascii_whitespace) {
			self.last = Some(line.to_vec());
		}
		Recall::Run { line: line.to_vec(), recalled: false }
	}
}

pub struct State {
	pub history: History,
	pub last_status: ExitCode,
}

impl State {
	pub fn new() -> State {
		State { history: History::new(), last_status: 0 }
	}
}

impl Default for State {
	fn default() -> State {
		State::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn run(line: &[u8], recalled: bool) -> Recall {
		Recall::Run { line: line.to_vec(), recalled }
	}

	#[test]
	fn recall_with_empty_history() {
		let mut history = History::new();
		assert_eq!(history.resolve(b"!!"), Recall::NoHistory);
		assert_eq!(history.last(), None);
	}

	#[test]
	fn recall_returns_previous_line() {
		let mut history = History::new();
		assert_eq!(history.resolve(b"ls -l"), run(b"ls -l", false));
		assert_eq!(history.resolve(b"!!"), run(b"ls -l", true));
		assert_eq!(history.last(), Some(&b"ls -l"[..]));
	}

	#[test]
	fn recall_keeps_raw_bytes() {
		let mut history = History::new();
		history.resolve(b"printf \xff");
		assert_eq!(history.resolve(b"!!"), run(b"printf \xff", true));
	}

	#[test]
	fn storing_the_same_line_twice_keeps_it() {
		let mut history = History::new();
		history.resolve(b"echo one");
		history.resolve(b"echo two");
		history.resolve(b"echo two");
		assert_eq!(history.last(), Some(&b"echo two"[..]));
	}

	#[test]
	fn blank_lines_do_not_clobber_history() {
		let mut history = History::new();
		history.resolve(b"pwd");
		assert_eq!(history.resolve(b""), run(b"", false));
		history.resolve(b"  \t ");
		assert_eq!(history.last(), Some(&b"pwd"[..]));
	}

	#[test]
	fn recall_token_must_match_exactly() {
		let mut history = History::new();
		history.resolve(b"!! ");
		assert_eq!(history.last(), Some(&b"!! "[..]));
	}
}
