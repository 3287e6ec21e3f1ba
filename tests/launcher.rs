use std::fs;

use osh::config::Limits;
use osh::eval::{self, EvalResult, ExecError};
use osh::job::ExitCode;
use osh::parser;
use osh::{ForkExec, Launcher};

fn launch(line: &str) -> Result<ExitCode, ExecError> {
	let invocation = parser::parse(line.as_bytes(), &Limits::default()).unwrap().expect("a command");
	ForkExec.launch(&invocation, line.as_bytes())
}

#[test]
fn redirected_output_lands_in_the_file() {
	let dir = tempfile::tempdir().unwrap();
	let out = dir.path().join("out.txt");
	let line = format!("echo one two > {}", out.display());
	let code = launch(&line).unwrap();
	assert_eq!(code, 0);
	assert_eq!(fs::read_to_string(&out).unwrap(), "one two\n");
}

#[test]
fn exit_code_of_the_child_is_returned() {
	assert_eq!(launch("true").unwrap(), 0);
	assert_eq!(launch("false").unwrap(), 1);
}

#[test]
fn exec_failure_is_fatal_to_the_child_only() {
	assert_eq!(launch("no-such-program-osh").unwrap(), 127);
}

#[test]
fn pipeline_status_is_the_right_stage() {
	assert_eq!(launch("true | false").unwrap(), 1);
	assert_eq!(launch("false | true").unwrap(), 0);
}

#[test]
fn input_and_output_redirections() {
	let dir = tempfile::tempdir().unwrap();
	let input = dir.path().join("words.txt");
	fs::write(&input, "b\na\nc\n").unwrap();
	let out = dir.path().join("copy.txt");

	let line = format!("sort < {}", input.display());
	assert_eq!(launch(&line).unwrap(), 0);

	let line = format!("cat {} > {}", input.display(), out.display());
	launch(&line).unwrap();
	assert_eq!(fs::read_to_string(&out).unwrap(), "b\na\nc\n");
}

#[test]
fn unopenable_input_fails_before_forking() {
	let dir = tempfile::tempdir().unwrap();
	let line = format!("cat < {}", dir.path().join("missing").display());
	match launch(&line) {
		Err(ExecError::Open { .. }) => {},
		other => panic!("unexpected {:?}", other),
	}
}

#[test]
fn eval_runs_through_the_real_launcher() {
	let dir = tempfile::tempdir().unwrap();
	let out = dir.path().join("ls.txt");
	fs::write(dir.path().join("marker"), "").unwrap();
	let line = format!("ls {} > {}", dir.path().display(), out.display());
	let result = eval::eval(line.as_bytes(), &Limits::default(), &mut ForkExec).unwrap();
	assert_eq!(result, EvalResult::Done(0));
	assert!(fs::read_to_string(&out).unwrap().contains("marker"));
}
