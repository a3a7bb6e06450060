//! Commitment Status - Track L2 output commitments on Ethereum L1
//!
//! This library resolves the commitment frontier recorded by an L2 output
//! oracle and tells whether individual L2 transactions have been committed,
//! reading live state from an L1 and an L2 JSON-RPC endpoint.

pub mod api;
pub mod config;
pub mod connector;
pub mod error;
pub mod health;
pub mod metadata;
pub mod resolver;
pub mod retry;
pub mod service;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::{CommitmentConfig, Config, RetryConfig, ServerConfig, UpstreamConfig};
pub use connector::{EthersConnector, Receipt, RpcConnector, TxDetails};
pub use error::ResolveError;
pub use health::{ConnectionState, HealthReport, HealthStatus};
pub use metadata::{ChainMetadata, CommitmentMetadata, ProposalMetadata, StaticMetadata};
pub use resolver::CommitmentResolver;
pub use service::StatusService;
pub use types::{
    Chain, CommitmentStatus, OracleReference, TransactionStatus, TxState, UpstreamHealth,
    WordDecoding,
};
