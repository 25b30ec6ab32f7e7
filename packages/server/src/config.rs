//! Server configuration.

use std::time::Duration;

/// Default listening port
pub const DEFAULT_PORT: u16 = 3000;
/// Default session lifetime (24 hours)
pub const DEFAULT_SESSION_TTL_SECS: u64 = 86_400;
/// Default interval between expired-session sweeps
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Runtime configuration of the chat server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Session lifetime; `None` keeps sessions forever
    pub session_ttl: Option<Duration>,
    /// How long a random-match search may wait; `None` waits forever
    pub search_timeout: Option<Duration>,
    pub sweep_interval: Duration,
}

impl ServerConfig {
    /// Build a config from second counts, where `0` disables the TTL and the
    /// search timeout.
    pub fn from_secs(
        host: String,
        port: u16,
        session_ttl_secs: u64,
        search_timeout_secs: u64,
        sweep_interval_secs: u64,
    ) -> Self {
        Self {
            host,
            port,
            session_ttl: non_zero_secs(session_ttl_secs),
            search_timeout: non_zero_secs(search_timeout_secs),
            sweep_interval: Duration::from_secs(sweep_interval_secs.max(1)),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_secs(
            "127.0.0.1".to_string(),
            DEFAULT_PORT,
            DEFAULT_SESSION_TTL_SECS,
            0,
            DEFAULT_SWEEP_INTERVAL_SECS,
        )
    }
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
