use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::config::Config;
use crate::connector::EthersConnector;
use crate::error::ResolveError;
use crate::health::HealthReport;
use crate::metadata::StaticMetadata;
use crate::resolver::CommitmentResolver;
use crate::types::{Chain, CommitmentStatus, OracleReference, TransactionStatus};

/// Owns the resolver for the lifetime of the process and hands its
/// operations to the transport. Cheap to clone.
#[derive(Clone)]
pub struct StatusService {
    resolver: Arc<CommitmentResolver>,
}

impl StatusService {
    pub fn new(resolver: CommitmentResolver) -> Self {
        Self {
            resolver: Arc::new(resolver),
        }
    }

    /// Wire HTTP connectors for both chains from configuration
    pub fn from_config(config: &Config) -> eyre::Result<Self> {
        config.validate()?;

        let upstream = &config.upstream;
        let l1 = EthersConnector::new(
            Chain::L1,
            &upstream.l1_rpc_url,
            upstream.request_timeout,
            config.retry.clone(),
        )?;
        let l2 = EthersConnector::new(
            Chain::L2,
            &upstream.l2_rpc_url,
            upstream.request_timeout,
            config.retry.clone(),
        )?;

        let oracle = OracleReference {
            l1_endpoint: upstream.l1_rpc_url.clone(),
            address: upstream.oracle_address()?,
        };

        tracing::info!(
            oracle = ?oracle.address,
            submission_interval = config.commitment.submission_interval,
            commitment_lag_blocks = config.commitment.commitment_lag_blocks,
            word_decoding = ?config.commitment.word_decoding,
            "Commitment resolver configured"
        );

        Ok(Self::new(CommitmentResolver::new(
            oracle,
            Box::new(l1),
            Box::new(l2),
            Box::new(StaticMetadata::default()),
            config.commitment.clone(),
        )))
    }

    pub fn resolver(&self) -> &CommitmentResolver {
        &self.resolver
    }

    pub async fn commitment_status(&self) -> Result<CommitmentStatus, ResolveError> {
        self.resolver.resolve_commitment_status().await
    }

    pub async fn transaction_status(&self, tx_hash: &str) -> Result<TransactionStatus, ResolveError> {
        self.resolver.resolve_transaction_status(tx_hash).await
    }

    pub async fn health_report(&self) -> HealthReport {
        HealthReport::from_probe(self.resolver.probe_upstreams().await, Utc::now())
    }

    pub async fn is_healthy(&self) -> bool {
        self.resolver.check_health().await
    }

    pub fn uptime(&self) -> Duration {
        self.resolver.uptime()
    }
}
