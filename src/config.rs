use std::env;

const DEFAULT_PROMPT: &str = "osh>";
const DEFAULT_MAX_LINE: usize = 4096;
const DEFAULT_MAX_ARGS: usize = 256;

const MAX_LINE_KEY: &str = "OSH_MAX_LINE";
const MAX_ARGS_KEY: &str = "OSH_MAX_ARGS";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
	#[error("invalid value for {key}: {value:?} (expected a positive integer)")]
	Invalid { key: &'static str, value: String },
}

/// Bounds applied to every line before anything is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
	/// Longest accepted line in bytes, newline excluded.
	pub max_line: usize,
	/// Most arguments (program name included) in one argument vector.
	pub max_args: usize,
}

impl Default for Limits {
	fn default() -> Limits {
		Limits { max_line: DEFAULT_MAX_LINE, max_args: DEFAULT_MAX_ARGS }
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
	pub prompt: String,
	pub limits: Limits,
}

impl Default for Config {
	fn default() -> Config {
		Config { prompt: DEFAULT_PROMPT.to_string(), limits: Limits::default() }
	}
}

impl Config {
	/// Defaults, overridden by `OSH_MAX_LINE` and `OSH_MAX_ARGS`.
	pub fn from_env() -> Result<Config, ConfigError> {
		Config::from_lookup(|key| env::var(key).ok())
	}

	pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError> where F: Fn(&str) -> Option<String> {
		let mut config = Config::default();
		if let Some(value) = lookup(MAX_LINE_KEY) {
			config.limits.max_line = parse_positive(MAX_LINE_KEY, value)?;
		}
		if let Some(value) = lookup(MAX_ARGS_KEY) {
			config.limits.max_args = parse_positive(MAX_ARGS_KEY, value)?;
		}
		Ok(config)
	}
}

fn parse_positive(key: &'static str, value: String) -> Result<usize, ConfigError> {
	match value.trim().parse::<usize>() {
		Ok(n) if n > 0 => Ok(n),
		_ => Err(ConfigError::Invalid { key, value }),
	}
}
