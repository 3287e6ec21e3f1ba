use crate::config::Limits;
use crate::types::*;

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
	#[error("line too long ({len} bytes, limit is {max})")]
	LineTooLong { len: usize, max: usize },
	#[error("too many arguments ({count}, limit is {max})")]
	TooManyArguments { count: usize, max: usize },
	#[error("missing command before redirection")]
	EmptyCommand,
	#[error("missing command in pipeline")]
	EmptyPipelineStage,
	#[error("missing file name after '{0}'")]
	MissingRedirectTarget(char),
	#[error("unexpected tokens after redirection target: {0}")]
	TrailingTokens(String),
	#[error("unsupported operator '{0}': one redirection or one two-stage pipeline per line")]
	UnsupportedOperator(char),
}

const OPERATORS: [u8; 3] = [b'<', b'>', b'|'];

struct Parser<'a> {
	line: &'a [u8],
	i: usize,
}

impl<'a> Parser<'a> {
	fn proceed_while<F>(&mut self, f: F) where F: Fn(u8) -> bool {
		while let Some(c) = self.line.get(self.i) {
			if !f(*c) { break; }
			self.i += 1;
		}
	}

	fn is_whitespace(c: u8) -> bool {
		matches!(c, b' ' | b'\t' | b'\n' | b'\r')
	}

	fn is_letter(c: u8) -> bool {
		!Parser::is_whitespace(c)
	}

	fn skip_whitespaces(&mut self) {
		self.proceed_while(Parser::is_whitespace);
	}

	fn read_word(&mut self) -> &'a [u8] {
		let orig = self.i;
		self.proceed_while(Parser::is_letter);
		&self.line[orig .. self.i]
	}
}

fn operation_of(c: u8) -> Option<OperationKind> {
	match c {
		b'<' => Some(OperationKind::InputRedirect),
		b'>' => Some(OperationKind::OutputRedirect),
		b'|' => Some(OperationKind::Pipeline),
		_ => None,
	}
}

fn find_operator(text: &[u8]) -> Option<char> {
	text.iter().find(|c| OPERATORS.contains(c)).map(|&c| c as char)
}

fn split_at_byte(line: &[u8], c: u8) -> Option<(&[u8], &[u8])> {
	let i = line.iter().position(|&b| b == c)?;
	Some((&line[.. i], &line[i + 1 ..]))
}

/// Kind of the first `<`, `>` or `|` in the whole line, `Plain` when there is none.
pub fn classify(line: &[u8]) -> OperationKind {
	line.iter().copied().find_map(operation_of).unwrap_or(OperationKind::Plain)
}

/// Whitespace-separated tokens in order. Blank input gives an empty vector.
pub fn tokenize(text: &[u8]) -> Vec<&[u8]> {
	let mut parser = Parser { line: text, i: 0 };
	let mut tokens = vec![];
	loop {
		parser.skip_whitespaces();
		let word = parser.read_word();
		if word.is_empty() {
			break;
		}
		tokens.push(word);
	}
	tokens
}

/// Splits at the first `|`. Later `|` characters stay in the right half.
pub fn split_pipeline(line: &[u8]) -> Option<(&[u8], &[u8])> {
	split_at_byte(line, b'|')
}

/// Splits at the first redirection operator of `typ` into the command text and
/// the target file name.
pub fn split_redirect(line: &[u8], typ: RedirectType) -> ParseResult<(&[u8], &[u8])> {
	let op = typ.operator();
	let (command, rest) = split_at_byte(line, op as u8).ok_or(ParseError::MissingRedirectTarget(op))?;
	if let Some(c) = find_operator(rest) {
		return Err(ParseError::UnsupportedOperator(c));
	}
	let mut words = tokenize(rest).into_iter();
	let target = words.next().ok_or(ParseError::MissingRedirectTarget(op))?;
	let trailing: Vec<&[u8]> = words.collect();
	if !trailing.is_empty() {
		return Err(ParseError::TrailingTokens(String::from_utf8_lossy(&trailing.join(&b' ')).into_owned()));
	}
	Ok((command, target))
}

fn make_command(tokens: &[&[u8]], limits: &Limits, redirect: Option<Redirect>) -> ParseResult<Option<Command>> {
	let (name, arguments) = match tokens.split_first() {
		Some(split) => split,
		None => return Ok(None),
	};
	if tokens.len() > limits.max_args {
		return Err(ParseError::TooManyArguments { count: tokens.len(), max: limits.max_args });
	}
	Ok(Some(Command {
		name: name.to_vec(),
		arguments: arguments.iter().map(|s| s.to_vec()).collect(),
		redirect,
	}))
}

fn parse_redirect(line: &[u8], typ: RedirectType, limits: &Limits) -> ParseResult<Option<Invocation>> {
	let (command, target) = split_redirect(line, typ)?;
	let redirect = Redirect { target: target.to_vec(), typ };
	let command = make_command(&tokenize(command), limits, Some(redirect))?.ok_or(ParseError::EmptyCommand)?;
	Ok(Some(Invocation::Command(command)))
}

fn parse_pipeline(line: &[u8], limits: &Limits) -> ParseResult<Option<Invocation>> {
	let (left, right) = split_pipeline(line).ok_or(ParseError::EmptyPipelineStage)?;
	if let Some(c) = find_operator(right) {
		return Err(ParseError::UnsupportedOperator(c));
	}
	let left = make_command(&tokenize(left), limits, None)?.ok_or(ParseError::EmptyPipelineStage)?;
	let right = make_command(&tokenize(right), limits, None)?.ok_or(ParseError::EmptyPipelineStage)?;
	Ok(Some(Invocation::Pipeline(Pipeline { left, right })))
}

/// Parses one line into what should be run. `Ok(None)` means there is nothing to do.
pub fn parse(line: &[u8], limits: &Limits) -> ParseResult<Option<Invocation>> {
	if line.len() > limits.max_line {
		return Err(ParseError::LineTooLong { len: line.len(), max: limits.max_line });
	}
	match classify(line) {
		OperationKind::Plain => Ok(make_command(&tokenize(line), limits, None)?.map(Invocation::Command)),
		OperationKind::InputRedirect => parse_redirect(line, RedirectType::Input, limits),
		OperationKind::OutputRedirect => parse_redirect(line, RedirectType::Output, limits),
		OperationKind::Pipeline => parse_pipeline(line, limits),
	}
}
