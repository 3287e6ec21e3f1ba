use std::io;
use std::process;

use osh::{logging, Config, ForkExec, Shell};

fn main() {
	logging::init();

	let config = match Config::from_env() {
		Ok(config) => config,
		Err(e) => {
			eprintln!("osh: {}", e);
			process::exit(2);
		},
	};

	let stdin = io::stdin();
	let mut shell = Shell::new(config, ForkExec);
	match shell.run(stdin.lock(), io::stdout(), io::stderr()) {
		Ok(code) => process::exit(code),
		Err(e) => {
			eprintln!("osh: {}", e);
			process::exit(1);
		},
	}
}
