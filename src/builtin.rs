#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Builtin {
	Exit,
}

/// Built-ins are recognised on the raw line, before any parsing. `exit` is a
/// prefix match, so `exit 3` and `exitnow` both end the shell.
pub fn match_builtin(line: &[u8]) -> Option<Builtin> {
	if line.starts_with(b"exit") {
		Some(Builtin::Exit)
	} else {
		None
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn exit_is_a_prefix_match() {
		assert_eq!(match_builtin(b"exit"), Some(Builtin::Exit));
		assert_eq!(match_builtin(b"exit 3"), Some(Builtin::Exit));
		assert_eq!(match_builtin(b"exitnow"), Some(Builtin::Exit));
	}

	#[test]
	fn other_lines_are_not_builtins() {
		assert_eq!(match_builtin(b""), None);
		assert_eq!(match_builtin(b" exit"), None);
		assert_eq!(match_builtin(b"echo exit"), None);
		assert_eq!(match_builtin(b"cd /tmp"), None);
	}
}
