//! `osh`, a small interactive shell.
//!
//! A line is either a plain command, a command with its standard input or
//! output redirected to a file (`<`, `>`), or a two-stage pipeline (`|`).
//! Whichever of those characters comes first decides. Commands run as forked
//! children found through `PATH`, and the shell waits for each of them before
//! it reads the next line.

pub mod builtin;
pub mod config;
pub mod eval;
pub mod global;
pub mod job;
pub mod logging;
pub mod parser;
pub mod repl;
pub mod types;

pub use config::Config;
pub use eval::{EvalError, ExecError, ForkExec, Launcher};
pub use repl::Shell;
