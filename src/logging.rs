use std::io;

use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "OSH_LOG";
const DEFAULT_FILTER: &str = "warn";

/// Installs the global subscriber. Diagnostics go to stderr so they never mix
/// with what commands write to stdout. `OSH_LOG` takes the usual filter syntax,
/// e.g. `OSH_LOG=osh=debug`.
pub fn init() {
	let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(true)
		.with_writer(io::stderr)
		.try_init();
}
