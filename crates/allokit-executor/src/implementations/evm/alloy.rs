//! Chain access implementation over the Alloy library.
//!
//! This module provides the production implementation of the ChainInterface
//! trait for EVM-compatible chains: eth_call dry-runs, signed submission
//! through the wallet filler, and receipt retrieval with the emitted logs
//! preserved in log order.

use crate::{codec, ChainError, ChainFactory, ChainInterface, ChainRegistry, PreparedCall};
use allokit_types::{
	with_0x_prefix, without_0x_prefix, ConfigSchema, Confirmation, Field, FieldType, LogEntry,
	NetworksConfig, Schema, SecretString, TransactionHash,
};
use alloy_consensus::TxReceipt;
use alloy_network::EthereumWallet;
use alloy_primitives::{Address, FixedBytes};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use alloy_transport::TransportError;
use alloy_transport_http::Http;
use std::sync::Arc;

/// Alloy-based EVM chain access.
///
/// One instance serves one network: the executor is parameterized by chain
/// ID at construction and every lookup it performs is scoped to that chain.
/// The provider's wallet filler signs submissions with the configured key.
pub struct AlloyChain {
	/// Alloy provider for the configured network.
	provider: Arc<dyn Provider<Http<reqwest::Client>> + Send + Sync>,
	/// The chain ID this instance serves.
	chain_id: u64,
}

impl AlloyChain {
	/// Creates a new AlloyChain instance for the given network.
	///
	/// Looks up the network's RPC URL in the networks configuration and
	/// binds the signer to the chain ID so signatures are replay-protected.
	pub async fn new(
		chain_id: u64,
		networks: &NetworksConfig,
		signer: PrivateKeySigner,
	) -> Result<Self, ChainError> {
		let network = networks.get(&chain_id).ok_or_else(|| {
			ChainError::Network(format!("Network {} not found in configuration", chain_id))
		})?;

		let url = network.rpc_url.parse().map_err(|e| {
			ChainError::Network(format!("Invalid RPC URL for network {}: {}", chain_id, e))
		})?;

		let chain_signer = signer.with_chain_id(Some(chain_id));
		let wallet = EthereumWallet::from(chain_signer);

		let provider = ProviderBuilder::new()
			.with_recommended_fillers()
			.wallet(wallet)
			.on_http(url);

		provider
			.client()
			.set_poll_interval(std::time::Duration::from_secs(7));

		Ok(Self {
			provider: Arc::new(provider),
			chain_id,
		})
	}

	/// Converts a prepared call into an RPC transaction request.
	fn request(&self, call: &PreparedCall) -> Result<TransactionRequest, ChainError> {
		if call.from.0.len() != 20 {
			return Err(ChainError::Network(format!(
				"Invalid sender address: {}",
				call.from
			)));
		}
		if call.to.0.len() != 20 {
			return Err(ChainError::Network(format!(
				"Invalid target address: {}",
				call.to
			)));
		}

		let mut request = TransactionRequest::default()
			.from(Address::from_slice(&call.from.0))
			.to(Address::from_slice(&call.to.0))
			.input(call.data.clone().into());
		if let Some(value) = call.value {
			request = request.value(value);
		}

		Ok(request)
	}
}

/// Extracts and decodes the revert payload from an eth_call error, if the
/// node attached one.
fn revert_reason(error: &TransportError) -> Option<String> {
	let payload = error.as_error_resp()?;
	let raw = payload.data.as_ref()?.get();
	let bytes = hex::decode(without_0x_prefix(raw.trim_matches('"'))).ok()?;
	codec::decode_revert_reason(&bytes)
}

/// Maps an RPC receipt into the chain-agnostic confirmation record.
fn map_receipt(receipt: alloy_rpc_types::TransactionReceipt) -> Confirmation {
	let logs = receipt
		.inner
		.logs()
		.iter()
		.map(|log| LogEntry {
			address: allokit_types::Address(log.address().as_slice().to_vec()),
			topics: log.topics().iter().map(|topic| topic.0.to_vec()).collect(),
			data: log.data().data.to_vec(),
		})
		.collect();

	Confirmation {
		hash: TransactionHash(receipt.transaction_hash.0.to_vec()),
		block_number: receipt.block_number.unwrap_or(0),
		success: receipt.status(),
		logs,
	}
}

/// Configuration schema for the Alloy chain access implementation.
pub struct AlloyChainSchema;

impl AlloyChainSchema {
	/// Static validation method for use before instance creation
	pub fn validate_config(config: &toml::Value) -> Result<(), allokit_types::ValidationError> {
		let instance = Self;
		instance.validate(config)
	}
}

impl ConfigSchema for AlloyChainSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), allokit_types::ValidationError> {
		let schema = Schema::new(
			// Required fields
			vec![Field::new(
				"chain_id",
				FieldType::Integer {
					min: Some(1),
					max: None,
				},
			)],
			// Optional fields
			vec![],
		);

		schema.validate(config)
	}
}

#[async_trait::async_trait]
impl ChainInterface for AlloyChain {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(AlloyChainSchema)
	}

	async fn simulate(&self, call: &PreparedCall) -> Result<(), ChainError> {
		let request = self.request(call)?;

		match self.provider.call(&request).await {
			Ok(_) => Ok(()),
			Err(e) => {
				if let Some(reason) = revert_reason(&e) {
					Err(ChainError::Revert { reason })
				} else if let Some(payload) = e.as_error_resp() {
					// The node rejected the call without structured revert
					// data; its message is the best reason available.
					Err(ChainError::Revert {
						reason: payload.message.to_string(),
					})
				} else {
					Err(ChainError::Network(format!("Simulation failed: {}", e)))
				}
			},
		}
	}

	async fn submit(&self, call: &PreparedCall) -> Result<TransactionHash, ChainError> {
		let request = self.request(call)?;

		// Send transaction - the provider's wallet will handle signing
		let pending_tx = self
			.provider
			.send_transaction(request)
			.await
			.map_err(|e| ChainError::Rejected(format!("Failed to send transaction: {}", e)))?;

		let tx_hash = *pending_tx.tx_hash();
		let hash_str = with_0x_prefix(&hex::encode(tx_hash.0));
		tracing::info!(tx_hash = %hash_str, chain_id = self.chain_id, "Submitted transaction");

		Ok(TransactionHash(tx_hash.0.to_vec()))
	}

	async fn get_receipt(
		&self,
		hash: &TransactionHash,
	) -> Result<Option<Confirmation>, ChainError> {
		if hash.0.len() != 32 {
			return Err(ChainError::Network(format!(
				"Invalid transaction hash: {}",
				hash
			)));
		}
		let tx_hash = FixedBytes::<32>::from_slice(&hash.0);

		match self.provider.get_transaction_receipt(tx_hash).await {
			Ok(Some(receipt)) => Ok(Some(map_receipt(receipt))),
			Ok(None) => Ok(None),
			Err(e) => Err(ChainError::Network(format!("Failed to get receipt: {}", e))),
		}
	}

	async fn latest_block(&self) -> Result<u64, ChainError> {
		self.provider
			.get_block_number()
			.await
			.map_err(|e| ChainError::Network(format!("Failed to get block number: {}", e)))
	}
}

/// Factory function to create an HTTP-based chain access from configuration.
///
/// # Parameters
/// - `config`: TOML configuration containing:
///   - `chain_id` (required): The chain ID to serve
/// - `networks`: Network configuration containing RPC URLs and contract addresses
/// - `private_key`: Private key used for transaction signing
///
/// # Returns
/// A boxed implementation of ChainInterface configured for the network
pub fn create_http_chain(
	config: &toml::Value,
	networks: &NetworksConfig,
	private_key: &SecretString,
) -> Result<Box<dyn ChainInterface>, ChainError> {
	// Validate configuration first
	AlloyChainSchema::validate_config(config)
		.map_err(|e| ChainError::Network(format!("Invalid configuration: {}", e)))?;

	let chain_id = config
		.get("chain_id")
		.and_then(|v| v.as_integer())
		.ok_or_else(|| ChainError::Network("chain_id is required".to_string()))? as u64;

	let signer: PrivateKeySigner = private_key.with_exposed(|key| {
		key.parse()
			.map_err(|_| ChainError::Network("Invalid private key format".to_string()))
	})?;

	// Create chain access synchronously, but the actual connection happens async
	let chain = tokio::task::block_in_place(|| {
		tokio::runtime::Handle::current()
			.block_on(async { AlloyChain::new(chain_id, networks, signer).await })
	})?;

	Ok(Box::new(chain))
}

/// Registry for the HTTP/Alloy chain access implementation.
pub struct Registry;

impl allokit_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "evm_alloy";
	type Factory = ChainFactory;

	fn factory() -> Self::Factory {
		create_http_chain
	}
}

impl ChainRegistry for Registry {}
