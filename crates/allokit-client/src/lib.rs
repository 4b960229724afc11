//! Caller-facing SDK for the grant-pool platform.
//!
//! Wraps the transaction executor with one named method per platform
//! operation. Every mutating operation runs the same simulate, submit,
//! confirm, decode sequence; the wrappers only supply the target contract,
//! the function, and the event that carries the operation's result.

use allokit_executor::{CallSpec, DecodedEvent, Executor, ExecutorError};
use allokit_types::{AddressRegistry, Confirmation, DeployedContracts, TransactionHash};
use alloy_dyn_abi::DynSolValue;
use alloy_json_abi::JsonAbi;
use alloy_primitives::{Address, Bytes, U256};
use std::sync::Arc;
use thiserror::Error;

pub mod contracts;

/// Errors that can occur during client operations.
#[derive(Debug, Error)]
pub enum ClientError {
	/// Error from the underlying transaction executor.
	#[error(transparent)]
	Executor(#[from] ExecutorError),
	/// The configured chain has no registry entry.
	#[error("Chain {0} not present in the address registry")]
	UnknownChain(u64),
	/// Error in the contract interface or call construction.
	#[error("Interface error: {0}")]
	Interface(String),
	/// The expected event decoded, but its payload is missing a field the
	/// operation needs.
	#[error("Malformed '{event}' payload: {message}")]
	MalformedEvent { event: String, message: String },
}

/// Review outcome for a pool registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewStatus {
	/// Application received, not yet decided.
	Pending,
	/// Application accepted into the pool.
	Approved,
	/// Application rejected.
	Rejected,
}

impl ReviewStatus {
	/// The on-chain status code.
	pub fn code(&self) -> u8 {
		match self {
			ReviewStatus::Pending => 0,
			ReviewStatus::Approved => 1,
			ReviewStatus::Rejected => 2,
		}
	}
}

/// Strategy configuration for a pool.
///
/// Passed to the factory on deployment and to `initialize` when a pool is
/// (re)configured.
#[derive(Debug, Clone)]
pub struct PoolConfig {
	/// Pool owner.
	pub owner: Address,
	/// Additional administrators.
	pub admins: Vec<Address>,
	/// Token used for allocations into the pool.
	pub allocation_token: Address,
	/// Token used for distributions out of the pool.
	pub distribution_token: Address,
	/// Maximum amount the pool accepts.
	pub max_amount: U256,
	/// Schedule boundaries (registration/allocation/distribution windows).
	pub timestamps: Vec<u64>,
	/// Pool metadata location.
	pub metadata_uri: String,
}

impl PoolConfig {
	/// Encodes the configuration as the contract's config tuple.
	fn to_value(&self) -> DynSolValue {
		DynSolValue::Tuple(vec![
			DynSolValue::Address(self.owner),
			DynSolValue::Array(
				self.admins
					.iter()
					.copied()
					.map(DynSolValue::Address)
					.collect(),
			),
			DynSolValue::Address(self.allocation_token),
			DynSolValue::Address(self.distribution_token),
			DynSolValue::Uint(self.max_amount, 256),
			DynSolValue::Array(
				self.timestamps
					.iter()
					.map(|t| DynSolValue::Uint(U256::from(*t), 64))
					.collect(),
			),
			DynSolValue::String(self.metadata_uri.clone()),
		])
	}
}

/// Client for the grant-pool platform contracts on one chain.
///
/// Holds the executor, the chain's registry entry, and the parsed contract
/// interfaces. All state is immutable after construction, so the client can
/// be shared across concurrent callers.
pub struct AlloKitClient {
	executor: Executor,
	contracts: DeployedContracts,
	factory_abi: Arc<JsonAbi>,
	pool_abi: Arc<JsonAbi>,
}

impl AlloKitClient {
	/// Creates a client for the given chain.
	///
	/// Fails if the chain has no registry entry or an interface fails to
	/// parse.
	pub fn new(
		executor: Executor,
		chain_id: u64,
		registry: &AddressRegistry,
	) -> Result<Self, ClientError> {
		let contracts = registry
			.get(chain_id)
			.cloned()
			.ok_or(ClientError::UnknownChain(chain_id))?;

		Ok(Self {
			executor,
			contracts,
			factory_abi: Arc::new(contracts::pool_factory_interface()?),
			pool_abi: Arc::new(contracts::pool_interface()?),
		})
	}

	/// The address this client submits as.
	pub fn sender(&self) -> Result<Address, ClientError> {
		let sender = self.executor.sender();
		if sender.0.len() != 20 {
			return Err(ClientError::Interface(format!(
				"Invalid sender address: {}",
				sender
			)));
		}
		Ok(Address::from_slice(&sender.0))
	}

	/// Deploys a new pool through the factory and returns its address,
	/// taken from the factory's `Created` event.
	pub async fn deploy_pool(
		&self,
		implementation: Address,
		config: &PoolConfig,
		data: Bytes,
	) -> Result<Address, ClientError> {
		let spec = CallSpec {
			abi: self.factory_abi.clone(),
			to: self.contracts.pool_factory.clone(),
			function: "deploy".to_string(),
			args: vec![
				DynSolValue::Address(implementation),
				config.to_value(),
				DynSolValue::Bytes(data.to_vec()),
			],
			value: None,
			expected_event: Some("Created".to_string()),
		};

		let event = self.execute_expecting(spec, "Created").await?;
		let pool = event
			.arg("pool")
			.and_then(|value| value.as_address())
			.ok_or_else(|| ClientError::MalformedEvent {
				event: "Created".to_string(),
				message: "missing pool address".to_string(),
			})?;
		tracing::info!(pool = %pool, "Pool deployed");
		Ok(pool)
	}

	/// Initializes (or reconfigures) a pool. Emits no marker event, so a
	/// successful confirmation is the whole result.
	pub async fn initialize_pool(
		&self,
		pool: Address,
		config: &PoolConfig,
		data: Bytes,
	) -> Result<(), ClientError> {
		let spec = self.pool_spec(
			pool,
			"initialize",
			vec![config.to_value(), DynSolValue::Bytes(data.to_vec())],
			None,
		);
		self.executor.execute(&spec).await?;
		Ok(())
	}

	/// Registers a project with a pool.
	pub async fn register(
		&self,
		pool: Address,
		project: Address,
		metadata_uri: &str,
		data: Bytes,
	) -> Result<DecodedEvent, ClientError> {
		let spec = self.pool_spec(
			pool,
			"register",
			vec![
				DynSolValue::Address(project),
				DynSolValue::String(metadata_uri.to_string()),
				DynSolValue::Bytes(data.to_vec()),
			],
			Some("Register"),
		);
		self.execute_expecting(spec, "Register").await
	}

	/// Reviews a registration, setting its status.
	pub async fn review(
		&self,
		pool: Address,
		project: Address,
		status: ReviewStatus,
		metadata_uri: &str,
		data: Bytes,
	) -> Result<DecodedEvent, ClientError> {
		let spec = self.pool_spec(
			pool,
			"review",
			vec![
				DynSolValue::Address(project),
				DynSolValue::Uint(U256::from(status.code()), 8),
				DynSolValue::String(metadata_uri.to_string()),
				DynSolValue::Bytes(data.to_vec()),
			],
			Some("Review"),
		);
		self.execute_expecting(spec, "Review").await
	}

	/// Updates a registration's metadata.
	pub async fn update(
		&self,
		pool: Address,
		project: Address,
		metadata_uri: &str,
		data: Bytes,
	) -> Result<DecodedEvent, ClientError> {
		let spec = self.pool_spec(
			pool,
			"update",
			vec![
				DynSolValue::Address(project),
				DynSolValue::String(metadata_uri.to_string()),
				DynSolValue::Bytes(data.to_vec()),
			],
			Some("Update"),
		);
		self.execute_expecting(spec, "Update").await
	}

	/// Allocates tokens to recipients through a pool.
	///
	/// A batch emits one `Allocate` event per recipient; the returned event
	/// is the first. Callers that need every entry read the confirmation
	/// logs via [`AlloKitClient::transaction_status`].
	pub async fn allocate(
		&self,
		pool: Address,
		recipients: Vec<Address>,
		amounts: Vec<U256>,
		token: Address,
		data: Vec<Bytes>,
	) -> Result<DecodedEvent, ClientError> {
		let args = Self::transfer_args(recipients, amounts, token, data)?;
		let spec = self.pool_spec(pool, "allocate", args, Some("Allocate"));
		self.execute_expecting(spec, "Allocate").await
	}

	/// Distributes tokens from a pool to recipients.
	///
	/// Same batch semantics as [`AlloKitClient::allocate`].
	pub async fn distribute(
		&self,
		pool: Address,
		recipients: Vec<Address>,
		amounts: Vec<U256>,
		token: Address,
		data: Vec<Bytes>,
	) -> Result<DecodedEvent, ClientError> {
		let args = Self::transfer_args(recipients, amounts, token, data)?;
		let spec = self.pool_spec(pool, "distribute", args, Some("Distribute"));
		self.execute_expecting(spec, "Distribute").await
	}

	/// Funds a pool: an allocation with the pool itself as recipient.
	pub async fn deposit(
		&self,
		pool: Address,
		amount: U256,
		token: Address,
	) -> Result<DecodedEvent, ClientError> {
		self.allocate(pool, vec![pool], vec![amount], token, vec![Bytes::new()])
			.await
	}

	/// Withdraws pool funds to the caller: a distribution to the sender.
	pub async fn withdraw(
		&self,
		pool: Address,
		amount: U256,
		token: Address,
	) -> Result<DecodedEvent, ClientError> {
		let recipient = self.sender()?;
		self.distribute(pool, vec![recipient], vec![amount], token, vec![Bytes::new()])
			.await
	}

	/// Looks up the confirmation for a submitted transaction, if any.
	///
	/// The recovery path after a confirmation timeout, and the way to read
	/// the full log set of a batch operation.
	pub async fn transaction_status(
		&self,
		hash: &TransactionHash,
	) -> Result<Option<Confirmation>, ClientError> {
		Ok(self.executor.status(hash).await?)
	}

	fn pool_spec(
		&self,
		pool: Address,
		function: &str,
		args: Vec<DynSolValue>,
		expected_event: Option<&str>,
	) -> CallSpec {
		CallSpec {
			abi: self.pool_abi.clone(),
			to: allokit_types::Address::from(pool),
			function: function.to_string(),
			args,
			value: None,
			expected_event: expected_event.map(str::to_string),
		}
	}

	fn transfer_args(
		recipients: Vec<Address>,
		amounts: Vec<U256>,
		token: Address,
		data: Vec<Bytes>,
	) -> Result<Vec<DynSolValue>, ClientError> {
		if recipients.len() != amounts.len() {
			return Err(ClientError::Interface(
				"recipients and amounts must have matching lengths".to_string(),
			));
		}

		Ok(vec![
			DynSolValue::Array(recipients.into_iter().map(DynSolValue::Address).collect()),
			DynSolValue::Array(
				amounts
					.into_iter()
					.map(|amount| DynSolValue::Uint(amount, 256))
					.collect(),
			),
			DynSolValue::Address(token),
			DynSolValue::Array(
				data.into_iter()
					.map(|entry| DynSolValue::Bytes(entry.to_vec()))
					.collect(),
			),
		])
	}

	async fn execute_expecting(
		&self,
		spec: CallSpec,
		event: &str,
	) -> Result<DecodedEvent, ClientError> {
		match self.executor.execute(&spec).await? {
			Some(decoded) => Ok(decoded),
			None => Err(ClientError::MalformedEvent {
				event: event.to_string(),
				message: "operation completed without an event payload".to_string(),
			}),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use allokit_executor::testing::{confirmation, log_for_event, MockChain};
	use allokit_executor::ExecutorSettings;
	use alloy_dyn_abi::JsonAbiExt;

	const CHAIN_ID: u64 = 31337;

	fn fixture_registry() -> AddressRegistry {
		let mut registry = AddressRegistry::default();
		registry.insert(
			CHAIN_ID,
			DeployedContracts {
				pool_factory: allokit_types::Address(vec![0xfa; 20]),
			},
		);
		registry
	}

	fn client(chain: Arc<MockChain>) -> AlloKitClient {
		let executor = Executor::new(
			chain,
			allokit_types::Address(vec![0x33; 20]),
			ExecutorSettings::default(),
		);
		AlloKitClient::new(executor, CHAIN_ID, &fixture_registry()).unwrap()
	}

	fn pool_config() -> PoolConfig {
		PoolConfig {
			owner: Address::repeat_byte(0x01),
			admins: vec![Address::repeat_byte(0x02)],
			allocation_token: Address::repeat_byte(0x03),
			distribution_token: Address::repeat_byte(0x03),
			max_amount: U256::from(1_000_000u64),
			timestamps: vec![100, 200],
			metadata_uri: "ipfs://pool".to_string(),
		}
	}

	#[tokio::test]
	async fn test_deploy_pool_returns_created_address() {
		let factory_abi = contracts::pool_factory_interface().unwrap();
		let pool = Address::repeat_byte(0x77);
		let log = log_for_event(
			&factory_abi,
			&allokit_types::Address(vec![0xfa; 20]),
			"Created",
			&[
				DynSolValue::Address(pool),
				DynSolValue::Address(Address::repeat_byte(0x55)),
				DynSolValue::Address(Address::repeat_byte(0x01)),
			],
		);
		let chain = Arc::new(MockChain::with_receipt(confirmation(true, vec![log])));
		let client = client(chain.clone());

		let deployed = client
			.deploy_pool(Address::repeat_byte(0x55), &pool_config(), Bytes::new())
			.await
			.unwrap();

		assert_eq!(deployed, pool);
		// The call went to the factory from the registry entry.
		assert_eq!(chain.submissions()[0].to.0, vec![0xfa; 20]);
	}

	#[tokio::test]
	async fn test_register_targets_pool_and_decodes_event() {
		let pool_abi = contracts::pool_interface().unwrap();
		let pool = Address::repeat_byte(0x77);
		let project = Address::repeat_byte(0x88);
		let log = log_for_event(
			&pool_abi,
			&allokit_types::Address(pool.as_slice().to_vec()),
			"Register",
			&[
				DynSolValue::Address(project),
				DynSolValue::String("ipfs://project".to_string()),
				DynSolValue::Bytes(vec![]),
			],
		);
		let chain = Arc::new(MockChain::with_receipt(confirmation(true, vec![log])));
		let client = client(chain.clone());

		let event = client
			.register(pool, project, "ipfs://project", Bytes::new())
			.await
			.unwrap();

		assert_eq!(event.arg("project"), Some(&DynSolValue::Address(project)));
		assert_eq!(chain.submissions()[0].to.0, pool.as_slice().to_vec());
	}

	#[tokio::test]
	async fn test_review_encodes_status_code() {
		let pool_abi = contracts::pool_interface().unwrap();
		let pool = Address::repeat_byte(0x77);
		let project = Address::repeat_byte(0x88);
		let log = log_for_event(
			&pool_abi,
			&allokit_types::Address(pool.as_slice().to_vec()),
			"Review",
			&[
				DynSolValue::Address(project),
				DynSolValue::Uint(U256::from(1u8), 8),
				DynSolValue::String(String::new()),
				DynSolValue::Bytes(vec![]),
			],
		);
		let chain = Arc::new(MockChain::with_receipt(confirmation(true, vec![log])));
		let client = client(chain.clone());

		client
			.review(pool, project, ReviewStatus::Approved, "", Bytes::new())
			.await
			.unwrap();

		// Decode the submitted calldata and check the status argument.
		let submitted = chain.submissions()[0].clone();
		let function = pool_abi.function("review").unwrap().first().unwrap();
		assert_eq!(&submitted.data[..4], function.selector().as_slice());
		let args = function.abi_decode_input(&submitted.data[4..], true).unwrap();
		assert_eq!(args[1], DynSolValue::Uint(U256::from(1u8), 8));
	}

	#[tokio::test]
	async fn test_pool_config_round_trips_through_initialize() {
		let pool_abi = contracts::pool_interface().unwrap();
		let chain = Arc::new(MockChain::with_receipt(confirmation(true, vec![])));
		let client = client(chain.clone());
		let config = pool_config();

		client
			.initialize_pool(Address::repeat_byte(0x77), &config, Bytes::new())
			.await
			.unwrap();

		let submitted = chain.submissions()[0].clone();
		let function = pool_abi.function("initialize").unwrap().first().unwrap();
		let args = function.abi_decode_input(&submitted.data[4..], true).unwrap();
		assert_eq!(args[0], config.to_value());
	}

	#[tokio::test]
	async fn test_allocate_rejects_mismatched_lengths() {
		let chain = Arc::new(MockChain::with_receipt(confirmation(true, vec![])));
		let client = client(chain.clone());

		let result = client
			.allocate(
				Address::repeat_byte(0x77),
				vec![Address::repeat_byte(0x88)],
				vec![],
				Address::repeat_byte(0x03),
				vec![],
			)
			.await;

		assert!(matches!(result, Err(ClientError::Interface(_))));
		// Rejected before any chain interaction.
		assert!(chain.stages().is_empty());
	}

	#[tokio::test]
	async fn test_unknown_chain_rejected_at_construction() {
		let chain = Arc::new(MockChain::new());
		let executor = Executor::new(
			chain,
			allokit_types::Address(vec![0x33; 20]),
			ExecutorSettings::default(),
		);
		let result = AlloKitClient::new(executor, 1, &fixture_registry());
		assert!(matches!(result, Err(ClientError::UnknownChain(1))));
	}
}
