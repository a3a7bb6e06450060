use crate::types::WordDecoding;
use ethers::types::Address;
use rand::Rng;
use std::env;
use std::time::Duration;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Fail if `key` is set to something `T` cannot parse.
///
/// `env_or` falls back to the default on a bad value; this is the check that
/// stops such a value from being silently replaced.
fn check_setting<T>(key: &str, raw: Option<&str>) -> eyre::Result<()>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) if !value.is_empty() => value
            .parse::<T>()
            .map(|_| ())
            .map_err(|e| eyre::eyre!("Invalid {} '{}': {}", key, value, e)),
        _ => Ok(()),
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("SERVER_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .or_else(|| env::var("PORT").ok().and_then(|p| p.parse().ok()))
                .unwrap_or(8080),
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Upstream RPC endpoints and the oracle they are read through
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// L1 (settlement) JSON-RPC URL
    pub l1_rpc_url: String,
    /// L2 (execution) JSON-RPC URL
    pub l2_rpc_url: String,
    /// Output oracle contract address, 20-byte hex
    pub oracle_address: String,
    /// Upper bound for every outbound call
    pub request_timeout: Duration,
    /// Accepted for compatibility with existing deployments; never opened
    pub database_url: Option<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            l1_rpc_url: env::var("L1_RPC_URL")
                .or_else(|_| env::var("L1_RPC"))
                .unwrap_or_else(|_| "http://localhost:8545".to_string()),
            l2_rpc_url: env::var("L2_RPC_URL")
                .or_else(|_| env::var("L2_RPC"))
                .unwrap_or_else(|_| "http://localhost:9545".to_string()),
            oracle_address: env::var("L2OO_ADDRESS")
                .unwrap_or_else(|_| "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string()),
            request_timeout: Duration::from_millis(env_or("RPC_TIMEOUT_MS", 5000)),
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
        }
    }
}

impl UpstreamConfig {
    /// Parse the configured oracle address
    pub fn oracle_address(&self) -> eyre::Result<Address> {
        self.oracle_address
            .trim()
            .parse()
            .map_err(|e| eyre::eyre!("Invalid L2OO_ADDRESS '{}': {}", self.oracle_address, e))
    }
}

/// Constants driving commitment resolution
#[derive(Debug, Clone)]
pub struct CommitmentConfig {
    /// L2 blocks between consecutive output proposals
    pub submission_interval: u64,
    /// Trailing L2 blocks treated as not yet committed
    pub commitment_lag_blocks: u64,
    /// How oracle return words are decoded
    pub word_decoding: WordDecoding,
}

impl Default for CommitmentConfig {
    fn default() -> Self {
        Self {
            submission_interval: env_or("SUBMISSION_INTERVAL", 1800),
            commitment_lag_blocks: env_or("COMMITMENT_LAG_BLOCKS", 10),
            word_decoding: env_or("ORACLE_WORD_DECODING", WordDecoding::LowByte),
        }
    }
}

/// Retry policy for connector calls
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Extra attempts after the first failure
    pub max_retries: u32,
    /// Base backoff duration
    pub base_backoff: Duration,
    /// Maximum backoff duration
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: env_or("RPC_RETRY_MAX", 2),
            base_backoff: Duration::from_millis(env_or("RPC_RETRY_BASE_MS", 100)),
            max_backoff: Duration::from_millis(env_or("RPC_RETRY_MAX_BACKOFF_MS", 2000)),
        }
    }
}

impl RetryConfig {
    /// No retries at all
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            base_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Calculate backoff duration for a given attempt (exponential backoff)
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.base_backoff.as_millis() as u64;
        let backoff = base.saturating_mul(2u64.saturating_pow(attempt));
        Duration::from_millis(backoff.min(self.max_backoff.as_millis() as u64))
    }

    /// Backoff for `attempt` plus up to 50% random jitter, still capped
    pub fn jittered_backoff(&self, attempt: u32) -> Duration {
        let backoff = self.backoff_for_attempt(attempt);
        let spread = backoff.as_millis() as u64 / 2;
        if spread == 0 {
            return backoff;
        }
        let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..=spread));
        (backoff + jitter).min(self.max_backoff)
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub commitment: CommitmentConfig,
    pub retry: RetryConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> eyre::Result<()> {
        let raw = |key: &str| env::var(key).ok();
        for key in [
            "RPC_TIMEOUT_MS",
            "RPC_RETRY_BASE_MS",
            "RPC_RETRY_MAX_BACKOFF_MS",
            "SUBMISSION_INTERVAL",
            "COMMITMENT_LAG_BLOCKS",
        ] {
            check_setting::<u64>(key, raw(key).as_deref())?;
        }
        check_setting::<u32>("RPC_RETRY_MAX", raw("RPC_RETRY_MAX").as_deref())?;
        check_setting::<WordDecoding>(
            "ORACLE_WORD_DECODING",
            raw("ORACLE_WORD_DECODING").as_deref(),
        )?;

        if self.upstream.request_timeout.is_zero() {
            eyre::bail!("RPC_TIMEOUT_MS must be greater than zero");
        }
        self.upstream.oracle_address()?;
        Ok(())
    }
}
