use chrono::{DateTime, Utc};
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which side of the deployment an upstream serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    /// Settlement chain hosting the output oracle
    L1,
    /// Execution chain whose blocks get committed
    L2,
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chain::L1 => f.write_str("l1"),
            Chain::L2 => f.write_str("l2"),
        }
    }
}

/// The oracle contract queried for the commitment frontier.
///
/// Fixed at resolver construction and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleReference {
    /// Identity of the L1 endpoint the oracle is read through
    pub l1_endpoint: String,
    /// Address of the output oracle contract
    pub address: Address,
}

/// Point-in-time snapshot of the commitment frontier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommitmentStatus {
    /// Latest L2 block number recorded by the oracle
    pub latest_block_number: u64,
    /// Latest output index recorded by the oracle
    pub latest_output_index: u64,
    /// Expected L2 block of the next proposal
    pub next_block_number: u64,
    /// When the last output was proposed
    pub last_proposal_time: DateTime<Utc>,
    /// Number of outputs accepted so far
    pub total_commitments: u64,
    /// Whether both upstreams answered a liveness probe
    pub is_service_healthy: bool,
    pub last_commitment_hash: String,
    pub proof_generation_time: String,
    /// Resolver uptime, e.g. `1h2m3s`
    pub uptime: String,
}

/// Lifecycle of an L2 transaction relative to the commitment frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxState {
    /// Receipt not yet available. Never produced by the resolver: a missing
    /// receipt surfaces as `ResolveError::NotFound` instead.
    Pending,
    /// Executed successfully on L2 but not yet behind the committed block
    Confirmed,
    /// Executed successfully and at or behind the committed block
    Committed,
    /// Execution reverted on L2
    Failed,
}

impl TxState {
    /// Execution failure wins over the block-number comparison.
    pub fn classify(succeeded: bool, committed: bool) -> Self {
        if !succeeded {
            TxState::Failed
        } else if committed {
            TxState::Committed
        } else {
            TxState::Confirmed
        }
    }
}

/// Status of a single L2 transaction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStatus {
    pub tx_hash: String,
    pub block_number: u64,
    pub status: TxState,
    /// `block_number <= latest committed block`, independent of `status`
    pub committed: bool,
    pub commitment_at: DateTime<Utc>,
    pub proof_hash: String,
    pub gas_used: u64,
    /// Decimal wei amount
    pub effective_gas_price: String,
}

/// Outcome of one liveness probe against each upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpstreamHealth {
    pub l1: bool,
    pub l2: bool,
}

impl UpstreamHealth {
    /// Healthy only if both upstreams answered
    pub fn is_healthy(&self) -> bool {
        self.l1 && self.l2
    }
}

/// How a 32-byte oracle return word is turned into an integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WordDecoding {
    /// Only the trailing byte is read; values above 255 are truncated.
    /// Matches the deployed behaviour byte for byte.
    #[default]
    LowByte,
    /// Full big-endian decode, rejected if it does not fit in a u64
    Full,
}

impl FromStr for WordDecoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low_byte" | "lowbyte" | "byte" => Ok(WordDecoding::LowByte),
            "full" | "u256" => Ok(WordDecoding::Full),
            other => Err(format!("unknown word decoding '{other}'")),
        }
    }
}
