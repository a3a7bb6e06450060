//! Scripted in-memory connector for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ethers::types::{Address, Bytes, H256, U256};

use crate::connector::{Receipt, RpcConnector, TxDetails};
use crate::error::ResolveError;
use crate::types::Chain;

#[derive(Clone)]
pub struct MockConnector {
    chain: Chain,
    height: Result<u64, ResolveError>,
    receipts: HashMap<H256, Receipt>,
    details: HashMap<H256, TxDetails>,
    calls: HashMap<Vec<u8>, Result<Bytes, ResolveError>>,
    requests: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl MockConnector {
    pub fn new(chain: Chain) -> Self {
        Self {
            chain,
            height: Ok(0),
            receipts: HashMap::new(),
            details: HashMap::new(),
            calls: HashMap::new(),
            requests: Arc::new(AtomicUsize::new(0)),
            delay: None,
        }
    }

    pub fn with_height(mut self, height: u64) -> Self {
        self.height = Ok(height);
        self
    }

    pub fn failing_height(mut self) -> Self {
        self.height = Err(ResolveError::connectivity(self.chain, "connection refused"));
        self
    }

    pub fn with_receipt(mut self, hash: H256, block_number: u64, succeeded: bool) -> Self {
        self.receipts.insert(
            hash,
            Receipt {
                block_number,
                succeeded,
                gas_used: 21_000,
                effective_gas_price: Some(U256::from(1_500_000_000u64)),
            },
        );
        self.details.insert(
            hash,
            TxDetails {
                gas_price: Some(U256::from(2_000_000_000u64)),
            },
        );
        self
    }

    /// Respond to calls whose data starts with `selector`
    pub fn with_call(mut self, selector: [u8; 4], result: Result<Bytes, ResolveError>) -> Self {
        self.calls.insert(selector.to_vec(), result);
        self
    }

    /// Hold every height probe and contract call for `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Shared counter of every request this connector has served
    pub fn request_counter(&self) -> Arc<AtomicUsize> {
        self.requests.clone()
    }

    fn record(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }

    async fn settle(&self) {
        match self.delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => tokio::task::yield_now().await,
        }
    }
}

/// 32-byte big-endian word holding `value`
pub fn word(value: u64) -> Bytes {
    let mut out = [0u8; 32];
    U256::from(value).to_big_endian(&mut out);
    Bytes::from(out.to_vec())
}

#[async_trait]
impl RpcConnector for MockConnector {
    fn chain(&self) -> Chain {
        self.chain
    }

    fn endpoint(&self) -> &str {
        match self.chain {
            Chain::L1 => "mock://l1",
            Chain::L2 => "mock://l2",
        }
    }

    async fn block_height(&self) -> Result<u64, ResolveError> {
        self.record();
        self.settle().await;
        self.height.clone()
    }

    async fn transaction_receipt(&self, hash: H256) -> Result<Receipt, ResolveError> {
        self.record();
        tokio::task::yield_now().await;
        self.receipts
            .get(&hash)
            .cloned()
            .ok_or_else(|| ResolveError::NotFound(format!("no receipt for {hash:?}")))
    }

    async fn transaction_details(&self, hash: H256) -> Result<TxDetails, ResolveError> {
        self.record();
        self.details
            .get(&hash)
            .cloned()
            .ok_or_else(|| ResolveError::NotFound(format!("no transaction {hash:?}")))
    }

    async fn call_contract(
        &self,
        _address: Address,
        call_data: Bytes,
    ) -> Result<Bytes, ResolveError> {
        self.record();
        self.settle().await;
        let selector = call_data.get(..4).unwrap_or_default().to_vec();
        self.calls
            .get(&selector)
            .cloned()
            .unwrap_or_else(|| Err(ResolveError::Revert("unknown selector".into())))
    }
}
