//! Read-only handles to the L1 and L2 JSON-RPC endpoints.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider, ProviderError, RpcError};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TransactionReceipt, TransactionRequest, H256, U256};

use crate::config::RetryConfig;
use crate::error::ResolveError;
use crate::retry::call_with_retry;
use crate::types::Chain;

/// Execution outcome of a mined transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub block_number: u64,
    pub succeeded: bool,
    pub gas_used: u64,
    pub effective_gas_price: Option<U256>,
}

/// The parts of a transaction body the resolver reads
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TxDetails {
    pub gas_price: Option<U256>,
}

/// Capabilities the resolver needs from a chain endpoint.
///
/// Implementations are responsible for bounding every call in time and for
/// any retry policy; callers treat each method as a single attempt.
#[async_trait]
pub trait RpcConnector: Send + Sync {
    /// Which chain this connector talks to
    fn chain(&self) -> Chain;

    /// Identity of the remote endpoint
    fn endpoint(&self) -> &str;

    /// Current chain head height
    async fn block_height(&self) -> Result<u64, ResolveError>;

    /// Receipt of a mined transaction, `NotFound` if unknown or still pending
    async fn transaction_receipt(&self, hash: H256) -> Result<Receipt, ResolveError>;

    /// Transaction body, `NotFound` if unknown
    async fn transaction_details(&self, hash: H256) -> Result<TxDetails, ResolveError>;

    /// Raw `eth_call` against the latest block, result left undecoded
    async fn call_contract(&self, address: Address, call_data: Bytes)
        -> Result<Bytes, ResolveError>;
}

/// `RpcConnector` over an ethers HTTP provider
#[derive(Debug, Clone)]
pub struct EthersConnector {
    chain: Chain,
    endpoint: String,
    provider: Provider<Http>,
    timeout: Duration,
    retry: RetryConfig,
}

impl EthersConnector {
    /// Create a connector for `url`. No request is made until first use.
    pub fn new(chain: Chain, url: &str, timeout: Duration, retry: RetryConfig) -> eyre::Result<Self> {
        let provider = Provider::<Http>::try_from(url)
            .map_err(|e| eyre::eyre!("Invalid {} RPC URL '{}': {}", chain, url, e))?;

        tracing::info!(
            chain = %chain,
            rpc_url = url,
            timeout_ms = timeout.as_millis() as u64,
            max_retries = retry.max_retries,
            "Created RPC connector"
        );

        Ok(Self {
            chain,
            endpoint: url.to_string(),
            provider,
            timeout,
            retry,
        })
    }

    /// One attempt, bounded by the configured timeout
    async fn bounded<T, Fut>(&self, method: &str, fut: Fut) -> Result<T, ResolveError>
    where
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(classify_provider_error(self.chain, method, &e)),
            Err(_) => Err(ResolveError::connectivity(
                self.chain,
                format!("{} timed out after {}ms", method, self.timeout.as_millis()),
            )),
        }
    }
}

/// Map an ethers provider failure onto the resolver taxonomy
fn classify_provider_error(chain: Chain, method: &str, err: &ProviderError) -> ResolveError {
    if let Some(resp) = err.as_error_response() {
        if resp.code == 3 || resp.message.to_ascii_lowercase().contains("revert") {
            return ResolveError::Revert(resp.message.clone());
        }
        return ResolveError::connectivity(
            chain,
            format!("{} returned error {}: {}", method, resp.code, resp.message),
        );
    }
    ResolveError::connectivity(chain, format!("{}: {}", method, err))
}

fn receipt_from_ethers(hash: H256, receipt: TransactionReceipt) -> Result<Receipt, ResolveError> {
    // Receipts without a block number belong to pending transactions
    let block_number = receipt
        .block_number
        .ok_or_else(|| ResolveError::NotFound(format!("receipt for {hash:?} is pending")))?;

    Ok(Receipt {
        block_number: block_number.as_u64(),
        succeeded: receipt.status.map_or(true, |s| !s.is_zero()),
        gas_used: receipt.gas_used.unwrap_or_default().low_u64(),
        effective_gas_price: receipt.effective_gas_price,
    })
}

#[async_trait]
impl RpcConnector for EthersConnector {
    fn chain(&self) -> Chain {
        self.chain
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn block_height(&self) -> Result<u64, ResolveError> {
        let height = call_with_retry(self.chain, "eth_blockNumber", &self.retry, || {
            self.bounded("eth_blockNumber", self.provider.get_block_number())
        })
        .await?;
        Ok(height.as_u64())
    }

    async fn transaction_receipt(&self, hash: H256) -> Result<Receipt, ResolveError> {
        let receipt = call_with_retry(self.chain, "eth_getTransactionReceipt", &self.retry, || {
            self.bounded(
                "eth_getTransactionReceipt",
                self.provider.get_transaction_receipt(hash),
            )
        })
        .await?
        .ok_or_else(|| ResolveError::NotFound(format!("no receipt for {hash:?}")))?;

        receipt_from_ethers(hash, receipt)
    }

    async fn transaction_details(&self, hash: H256) -> Result<TxDetails, ResolveError> {
        let tx = call_with_retry(self.chain, "eth_getTransactionByHash", &self.retry, || {
            self.bounded("eth_getTransactionByHash", self.provider.get_transaction(hash))
        })
        .await?
        .ok_or_else(|| ResolveError::NotFound(format!("no transaction {hash:?}")))?;

        Ok(TxDetails {
            gas_price: tx.gas_price.or(tx.max_fee_per_gas),
        })
    }

    async fn call_contract(
        &self,
        address: Address,
        call_data: Bytes,
    ) -> Result<Bytes, ResolveError> {
        let request: TypedTransaction = TransactionRequest::new().to(address).data(call_data).into();

        call_with_retry(self.chain, "eth_call", &self.retry, || {
            self.bounded("eth_call", self.provider.call(&request, None))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::U64;

    fn receipt(block: Option<u64>, status: Option<u64>) -> TransactionReceipt {
        TransactionReceipt {
            block_number: block.map(U64::from),
            status: status.map(U64::from),
            gas_used: Some(U256::from(21_000u64)),
            effective_gas_price: Some(U256::from(1_000_000_000u64)),
            ..Default::default()
        }
    }

    #[test]
    fn test_receipt_success_and_failure() {
        let ok = receipt_from_ethers(H256::zero(), receipt(Some(120), Some(1))).unwrap();
        assert_eq!(ok.block_number, 120);
        assert!(ok.succeeded);
        assert_eq!(ok.gas_used, 21_000);

        let failed = receipt_from_ethers(H256::zero(), receipt(Some(120), Some(0))).unwrap();
        assert!(!failed.succeeded);
    }

    #[test]
    fn test_receipt_without_status_counts_as_success() {
        let r = receipt_from_ethers(H256::zero(), receipt(Some(5), None)).unwrap();
        assert!(r.succeeded);
    }

    #[test]
    fn test_pending_receipt_is_not_found() {
        let err = receipt_from_ethers(H256::zero(), receipt(None, Some(1))).unwrap_err();
        assert!(matches!(err, ResolveError::NotFound(_)));
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let result = EthersConnector::new(
            Chain::L1,
            "not a url",
            Duration::from_secs(1),
            RetryConfig::disabled(),
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_connectivity_error() {
        // Port 9 (discard) is closed on test hosts; the call must fail fast, not hang
        let connector = EthersConnector::new(
            Chain::L2,
            "http://127.0.0.1:9",
            Duration::from_millis(500),
            RetryConfig::disabled(),
        )
        .unwrap();

        let err = connector.block_height().await.unwrap_err();
        assert!(matches!(err, ResolveError::Connectivity { chain: Chain::L2, .. }));
    }

    #[tokio::test]
    async fn test_silent_endpoint_times_out_as_connectivity_error() {
        // Accepts connections and never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let timeout = Duration::from_millis(200);
        let connector = EthersConnector::new(
            Chain::L2,
            &format!("http://{addr}"),
            timeout,
            RetryConfig::disabled(),
        )
        .unwrap();

        let started = std::time::Instant::now();
        let err = connector.block_height().await.unwrap_err();
        let elapsed = started.elapsed();

        match err {
            ResolveError::Connectivity { chain, message } => {
                assert_eq!(chain, Chain::L2);
                assert!(message.contains("timed out"), "unexpected message: {message}");
            }
            other => panic!("expected connectivity error, got {other:?}"),
        }
        assert!(elapsed >= timeout);
        assert!(elapsed < Duration::from_secs(2), "took {elapsed:?}");
    }
}
