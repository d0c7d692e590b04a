use tracing_subscriber::EnvFilter;

use crate::error::{PoetError, Result};

/// Install a stderr fmt subscriber. `RUST_LOG` wins over `default_level` so
/// stdout stays free for the exchange transcript.
pub fn init_tracing(default_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|err| PoetError::Config(format!("invalid log filter `{default_level}`: {err}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| PoetError::Config(format!("failed installing tracing subscriber: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_is_an_error() {
        let _ = init_tracing("debug");
        assert!(init_tracing("debug").is_err());
    }
}
