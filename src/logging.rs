use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

use crate::stderr_buffer::BufferedStderr;

/// Environment variable holding an `EnvFilter` directive, e.g. `fpl_net=trace`
pub const LOG_ENV_VAR: &str = "FPL_NET_LOG";

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "fpl_net=debug"
    } else {
        "fpl_net=warn"
    }
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(BufferedStderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_raises_level() {
        assert_eq!(default_directive(true), "fpl_net=debug");
        assert_eq!(default_directive(false), "fpl_net=warn");
    }
}
