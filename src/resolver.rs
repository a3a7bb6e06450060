//! Commitment resolution: the commitment frontier read from the output
//! oracle on L1, and the standing of individual L2 transactions against it.
//!
//! The resolver holds no mutable state. Every call issues fresh upstream
//! requests and returns a new snapshot, so one instance can be shared across
//! concurrent requests behind an `Arc` without locking.

use std::time::{Duration, Instant};

use ethers::types::{Bytes, H256, U256};
use futures_util::future::join3;

use crate::config::CommitmentConfig;
use crate::connector::RpcConnector;
use crate::error::ResolveError;
use crate::metadata::ChainMetadata;
use crate::types::{
    CommitmentStatus, OracleReference, TransactionStatus, TxState, UpstreamHealth, WordDecoding,
};

/// Oracle getter for the latest committed L2 block number
pub const LATEST_BLOCK_NUMBER: &str = "latestBlockNumber()";
/// Oracle getter for the latest output index
pub const LATEST_OUTPUT_INDEX: &str = "latestOutputIndex()";

/// 4-byte selector of a Solidity function signature
pub fn function_selector(signature: &str) -> [u8; 4] {
    ethers::utils::id(signature)
}

/// Decode an oracle return word.
///
/// Inputs shorter than one 32-byte word are rejected. With
/// [`WordDecoding::LowByte`] only byte 31 is read, so values above 255 wrap.
pub fn decode_word(data: &[u8], decoding: WordDecoding) -> Result<u64, ResolveError> {
    if data.len() < 32 {
        return Err(ResolveError::OracleQuery(format!(
            "expected a 32-byte word, got {} bytes",
            data.len()
        )));
    }

    match decoding {
        WordDecoding::LowByte => Ok(u64::from(data[31])),
        WordDecoding::Full => {
            let value = U256::from_big_endian(&data[..32]);
            if value > U256::from(u64::MAX) {
                return Err(ResolveError::OracleQuery(format!(
                    "oracle value {value} does not fit in 64 bits"
                )));
            }
            Ok(value.as_u64())
        }
    }
}

/// Highest L2 block treated as committed for a given chain head
pub fn committed_frontier(l2_height: u64, lag_blocks: u64) -> u64 {
    if l2_height > lag_blocks {
        l2_height - lag_blocks
    } else {
        0
    }
}

/// Parse a 32-byte transaction hash, with or without `0x`
pub fn parse_tx_hash(input: &str) -> Result<H256, ResolveError> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if digits.len() != 64 {
        return Err(ResolveError::InvalidInput(format!(
            "transaction hash must be 64 hex digits, got {}",
            digits.len()
        )));
    }

    let bytes = hex::decode(digits)
        .map_err(|e| ResolveError::InvalidInput(format!("transaction hash is not hex: {e}")))?;
    Ok(H256::from_slice(&bytes))
}

/// Render an uptime the way operators read it, e.g. `1h2m3s`
pub fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    match (h, m) {
        (0, 0) => format!("{s}s"),
        (0, _) => format!("{m}m{s}s"),
        _ => format!("{h}h{m}m{s}s"),
    }
}

pub struct CommitmentResolver {
    oracle: OracleReference,
    l1: Box<dyn RpcConnector>,
    l2: Box<dyn RpcConnector>,
    metadata: Box<dyn ChainMetadata>,
    config: CommitmentConfig,
    started_at: Instant,
}

impl CommitmentResolver {
    /// Take ownership of both connectors. Uptime is measured from here.
    pub fn new(
        oracle: OracleReference,
        l1: Box<dyn RpcConnector>,
        l2: Box<dyn RpcConnector>,
        metadata: Box<dyn ChainMetadata>,
        config: CommitmentConfig,
    ) -> Self {
        Self {
            oracle,
            l1,
            l2,
            metadata,
            config,
            started_at: Instant::now(),
        }
    }

    pub fn oracle(&self) -> &OracleReference {
        &self.oracle
    }

    pub fn config(&self) -> &CommitmentConfig {
        &self.config
    }

    /// Snapshot of the commitment frontier.
    ///
    /// Both oracle reads and the health probe are issued together. A failure
    /// of either read aborts the snapshot; the block-number error is reported
    /// first. Reverts and unusable answers become `OracleQuery`, while
    /// transport failures stay `Connectivity` so callers can tell "L1 down"
    /// from "oracle misbehaving".
    pub async fn resolve_commitment_status(&self) -> Result<CommitmentStatus, ResolveError> {
        let (latest_block_number, latest_output_index, is_service_healthy) = join3(
            self.query_oracle(LATEST_BLOCK_NUMBER),
            self.query_oracle(LATEST_OUTPUT_INDEX),
            self.check_health(),
        )
        .await;
        let latest_block_number = latest_block_number?;
        let latest_output_index = latest_output_index?;

        let next_block_number = latest_block_number.saturating_add(self.config.submission_interval);
        let total_commitments = latest_output_index.saturating_add(1);
        let proposal = self
            .metadata
            .latest_proposal(&self.oracle, latest_block_number)
            .await;

        Ok(CommitmentStatus {
            latest_block_number,
            latest_output_index,
            next_block_number,
            last_proposal_time: proposal.proposed_at,
            total_commitments,
            is_service_healthy,
            last_commitment_hash: proposal.commitment_hash,
            proof_generation_time: proposal.proof_generation_time,
            uptime: format_uptime(self.uptime()),
        })
    }

    /// Standing of one L2 transaction against the committed block.
    ///
    /// Malformed hashes fail before any upstream call. Receipt and body
    /// lookups propagate their errors; a failed chain-head probe only lowers
    /// the committed block to 0.
    pub async fn resolve_transaction_status(
        &self,
        tx_hash: &str,
    ) -> Result<TransactionStatus, ResolveError> {
        let hash = parse_tx_hash(tx_hash)?;

        let (receipt, details, latest_committed) = tokio::join!(
            self.l2.transaction_receipt(hash),
            self.l2.transaction_details(hash),
            self.latest_committed_block(),
        );
        let receipt = receipt?;
        let details = details?;

        let committed = receipt.block_number <= latest_committed;
        let status = TxState::classify(receipt.succeeded, committed);
        let commitment = self.metadata.commitment_for(receipt.block_number).await;
        let gas_price = details
            .gas_price
            .or(receipt.effective_gas_price)
            .unwrap_or_default();

        Ok(TransactionStatus {
            tx_hash: format!("{hash:?}"),
            block_number: receipt.block_number,
            status,
            committed,
            commitment_at: commitment.committed_at,
            proof_hash: commitment.proof_hash,
            gas_used: receipt.gas_used,
            effective_gas_price: gas_price.to_string(),
        })
    }

    /// One height probe per upstream, issued together
    pub async fn probe_upstreams(&self) -> UpstreamHealth {
        let (l1, l2) = tokio::join!(self.l1.block_height(), self.l2.block_height());
        UpstreamHealth {
            l1: l1.is_ok(),
            l2: l2.is_ok(),
        }
    }

    /// True only if both upstreams answer. Never fails.
    pub async fn check_health(&self) -> bool {
        self.probe_upstreams().await.is_healthy()
    }

    /// Time since construction
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    async fn query_oracle(&self, signature: &str) -> Result<u64, ResolveError> {
        let call_data = Bytes::from(function_selector(signature).to_vec());
        let result = self
            .l1
            .call_contract(self.oracle.address, call_data)
            .await
            .map_err(|e| match e {
                ResolveError::Revert(reason) => {
                    ResolveError::OracleQuery(format!("{signature} reverted: {reason}"))
                }
                other => other,
            })?;

        decode_word(&result, self.config.word_decoding).map_err(|e| match e {
            ResolveError::OracleQuery(msg) => ResolveError::OracleQuery(format!("{signature}: {msg}")),
            other => other,
        })
    }

    async fn latest_committed_block(&self) -> u64 {
        match self.l2.block_height().await {
            Ok(height) => committed_frontier(height, self.config.commitment_lag_blocks),
            Err(_) => 0,
        }
    }
}
