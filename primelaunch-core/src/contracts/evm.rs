//! EVM implementations of the read and write boundaries over `ethers`.

use std::sync::Arc;

use async_trait::async_trait;
use ethers::{
    prelude::*,
    types::transaction::{eip2718::TypedTransaction, eip712::TypedData},
};
use tracing::{debug, info};

use super::{abi, LaunchpadCall, LaunchpadReader, ReadError};
use crate::types::{EncryptedHandle, TokenRecord, TxReceipt};
use crate::wallet::{SignerError, WalletSigner};

/// Registry and balance reads through an HTTP JSON-RPC provider.
#[derive(Clone, Debug)]
pub struct EvmLaunchpad {
    provider: Arc<Provider<Http>>,
}

impl EvmLaunchpad {
    pub fn new(rpc_url: &str) -> Result<Self, ReadError> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| ReadError::Rpc(format!("invalid RPC URL {}: {}", rpc_url, e)))?;
        Ok(Self {
            provider: Arc::new(provider),
        })
    }

    async fn eth_call(&self, to: Address, data: Bytes) -> Result<Bytes, ReadError> {
        let tx: TypedTransaction = TransactionRequest::new().to(to).data(data).into();
        self.provider
            .call(&tx, None)
            .await
            .map_err(|e| ReadError::Rpc(e.to_string()))
    }
}

#[async_trait]
impl LaunchpadReader for EvmLaunchpad {
    async fn all_tokens(&self, factory: Address) -> Result<Vec<TokenRecord>, ReadError> {
        let data = self.eth_call(factory, abi::encode_get_all_tokens()).await?;
        let tokens = abi::decode_token_list(&data)?;
        debug!("getAllTokens returned {} entries", tokens.len());
        Ok(tokens)
    }

    async fn token_at(&self, factory: Address, index: u64) -> Result<TokenRecord, ReadError> {
        let data = self
            .eth_call(factory, abi::encode_get_token(index))
            .await
            .map_err(|e| match e {
                // The factory reverts on out-of-range indices.
                ReadError::Rpc(msg) if msg.contains("revert") => ReadError::IndexOutOfRange(index),
                other => other,
            })?;
        abi::decode_token(&data)
    }

    async fn confidential_balance_of(
        &self,
        token: Address,
        owner: Address,
    ) -> Result<EncryptedHandle, ReadError> {
        let data = self
            .eth_call(token, abi::encode_confidential_balance_of(owner))
            .await?;
        abi::decode_handle(&data)
    }
}

type SigningClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Local-key signer submitting launchpad calls over HTTP.
#[derive(Clone, Debug)]
pub struct EvmSigner {
    client: Arc<SigningClient>,
}

impl EvmSigner {
    /// Connect a private key to `rpc_url`, binding it to the node's chain id.
    pub async fn connect(rpc_url: &str, private_key: &str) -> Result<Self, SignerError> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| SignerError::Transport(format!("invalid RPC URL {}: {}", rpc_url, e)))?;

        let chain_id = provider
            .get_chainid()
            .await
            .map_err(|e| SignerError::Transport(e.to_string()))?;

        let wallet = private_key
            .trim_start_matches("0x")
            .parse::<LocalWallet>()
            .map_err(|e| SignerError::Signing(format!("invalid private key: {}", e)))?
            .with_chain_id(chain_id.as_u64());

        info!("Signer {:?} connected to chain {}", wallet.address(), chain_id);

        Ok(Self {
            client: Arc::new(SignerMiddleware::new(provider, wallet)),
        })
    }
}

#[async_trait]
impl WalletSigner for EvmSigner {
    fn address(&self) -> Address {
        self.client.address()
    }

    async fn sign_typed_data(&self, payload: &TypedData) -> Result<Signature, SignerError> {
        self.client
            .signer()
            .sign_typed_data(payload)
            .await
            .map_err(|e| SignerError::Signing(e.to_string()))
    }

    async fn send_call(&self, call: &LaunchpadCall) -> Result<TxHash, SignerError> {
        let tx = TransactionRequest::new()
            .to(call.target())
            .data(call.calldata());

        debug!("Sending {} to {:?}", call.describe(), call.target());

        let pending_tx = self
            .client
            .send_transaction(tx, None)
            .await
            .map_err(|e| SignerError::Reverted(e.to_string()))?;
        let tx_hash = pending_tx.tx_hash();

        info!("Transaction submitted: {:?}", tx_hash);
        Ok(tx_hash)
    }

    async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
        confirmations: usize,
    ) -> Result<TxReceipt, SignerError> {
        let receipt = PendingTransaction::new(tx_hash, self.client.provider())
            .confirmations(confirmations)
            .await
            .map_err(|e| SignerError::Transport(e.to_string()))?
            .ok_or_else(|| SignerError::Reverted("transaction dropped from mempool".into()))?;

        if receipt.status == Some(U64::zero()) {
            return Err(SignerError::Reverted(format!(
                "transaction {:?} reverted",
                tx_hash
            )));
        }

        Ok(TxReceipt {
            tx_hash,
            block_number: receipt.block_number.map(|n| n.as_u64()),
        })
    }
}
