//! Descriptive commitment data that is not read from the oracle's storage
//! slots: proposal timestamps, output roots, proof hashes.
//!
//! The resolver only depends on [`ChainMetadata`]. [`StaticMetadata`] serves
//! fixed placeholder values until event-log lookups replace it.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use crate::types::OracleReference;

/// Details of the most recent output proposal
#[derive(Debug, Clone, PartialEq)]
pub struct ProposalMetadata {
    pub proposed_at: DateTime<Utc>,
    pub commitment_hash: String,
    pub proof_generation_time: String,
}

/// Details of the commitment covering a given L2 block
#[derive(Debug, Clone, PartialEq)]
pub struct CommitmentMetadata {
    pub committed_at: DateTime<Utc>,
    pub proof_hash: String,
}

#[async_trait]
pub trait ChainMetadata: Send + Sync {
    /// Metadata of the proposal that produced `latest_block_number`
    async fn latest_proposal(
        &self,
        oracle: &OracleReference,
        latest_block_number: u64,
    ) -> ProposalMetadata;

    /// Metadata of the commitment that includes `l2_block_number`
    async fn commitment_for(&self, l2_block_number: u64) -> CommitmentMetadata;
}

/// Placeholder provider: fixed hashes, timestamps relative to the call time
#[derive(Debug, Clone)]
pub struct StaticMetadata {
    pub proposal_age: TimeDelta,
    pub commitment_age: TimeDelta,
    pub commitment_hash: String,
    pub proof_hash: String,
    pub proof_generation_time: String,
}

impl Default for StaticMetadata {
    fn default() -> Self {
        Self {
            proposal_age: TimeDelta::minutes(10),
            commitment_age: TimeDelta::minutes(5),
            commitment_hash: "0xabc123...".to_string(),
            proof_hash: "0xdef456...".to_string(),
            proof_generation_time: "5 minutes".to_string(),
        }
    }
}

#[async_trait]
impl ChainMetadata for StaticMetadata {
    async fn latest_proposal(&self, _oracle: &OracleReference, _latest: u64) -> ProposalMetadata {
        ProposalMetadata {
            proposed_at: Utc::now() - self.proposal_age,
            commitment_hash: self.commitment_hash.clone(),
            proof_generation_time: self.proof_generation_time.clone(),
        }
    }

    async fn commitment_for(&self, _l2_block_number: u64) -> CommitmentMetadata {
        CommitmentMetadata {
            committed_at: Utc::now() - self.commitment_age,
            proof_hash: self.proof_hash.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::Address;

    #[tokio::test]
    async fn test_static_metadata_placeholders() {
        let metadata = StaticMetadata::default();
        let oracle = OracleReference {
            l1_endpoint: "http://localhost:8545".to_string(),
            address: Address::zero(),
        };

        let before = Utc::now();
        let proposal = metadata.latest_proposal(&oracle, 100).await;
        assert_eq!(proposal.commitment_hash, "0xabc123...");
        assert_eq!(proposal.proof_generation_time, "5 minutes");
        assert!(proposal.proposed_at <= before - TimeDelta::minutes(10) + TimeDelta::seconds(1));

        let commitment = metadata.commitment_for(100).await;
        assert_eq!(commitment.proof_hash, "0xdef456...");
        assert!(commitment.committed_at > proposal.proposed_at);
    }
}
