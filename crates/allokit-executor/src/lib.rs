//! Transaction execution module for the AlloKit client.
//!
//! Every mutating platform operation follows the same shape: validate the
//! call against current state, submit it, wait until the network reports it
//! durably included, then read the outcome back out of the emitted event
//! logs. This module implements that sequence once, over a chain-access
//! trait so the sequencing logic can be exercised against a scripted chain.

use allokit_types::{
	Address, ConfigSchema, Confirmation, ImplementationRegistry, NetworksConfig, SecretString,
	TransactionHash,
};
use alloy_dyn_abi::DynSolValue;
use alloy_json_abi::JsonAbi;
use alloy_primitives::U256;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

mod codec;

/// Re-export implementations
pub mod implementations {
	pub mod evm {
		pub mod alloy;
	}
}

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Errors that can occur during transaction execution.
///
/// Each stage of the sequence fails with its own kind so callers can tell
/// a rejected dry-run from a refused submission from an ambiguous timeout.
#[derive(Debug, Error)]
pub enum ExecutorError {
	/// The dry-run predicted the call would revert. No submission was made
	/// and no fees were spent; the decoded revert reason is preserved.
	#[error("Simulation reverted: {reason}")]
	Simulation { reason: String },
	/// The call failed after the dry-run but before the network accepted
	/// it (signing refused, connectivity lost).
	#[error("Submission failed: {0}")]
	Submission(String),
	/// The submission was accepted but inclusion was not observed within
	/// the configured window. The outcome is ambiguous: the transaction
	/// may still land, so callers must verify via [`Executor::status`]
	/// before re-invoking the operation.
	#[error("No confirmation for {hash} after {waited_secs}s")]
	ConfirmationTimeout {
		hash: TransactionHash,
		waited_secs: u64,
	},
	/// The transaction confirmed but the event the operation expected is
	/// absent from its logs. This signals a mismatch between expected and
	/// actual contract behavior and is never treated as success.
	#[error("Expected event '{event}' not found in confirmed logs")]
	EventNotFound { event: String },
	/// The transaction was included but its execution failed on-chain.
	#[error("Transaction {hash} reverted on-chain")]
	Reverted { hash: TransactionHash },
	/// Error that occurs during network communication.
	#[error("Network error: {0}")]
	Network(String),
	/// Error in the supplied interface schema or argument encoding.
	#[error("Interface error: {0}")]
	Abi(String),
}

/// Errors produced by chain-access implementations.
#[derive(Debug, Error)]
pub enum ChainError {
	/// The node predicts the call would revert; carries the decoded reason.
	#[error("Execution would revert: {reason}")]
	Revert { reason: String },
	/// The transaction was refused before the network accepted it.
	#[error("Submission rejected: {0}")]
	Rejected(String),
	/// Error that occurs during network communication.
	#[error("Network error: {0}")]
	Network(String),
}

/// Specification of a single contract call.
///
/// Immutable; constructed per call and never persisted. The interface
/// schema travels with the call because both argument encoding and event
/// decoding are driven by it.
#[derive(Debug, Clone)]
pub struct CallSpec {
	/// Interface of the target contract.
	pub abi: Arc<JsonAbi>,
	/// Address of the target contract.
	pub to: Address,
	/// Name of the function to call.
	pub function: String,
	/// Ordered call arguments.
	pub args: Vec<DynSolValue>,
	/// Native value to attach to the call, if any.
	pub value: Option<U256>,
	/// Name of the event whose arguments are the operation's logical
	/// return value. Operations that emit no marker leave this unset.
	pub expected_event: Option<String>,
}

/// A call with its arguments encoded, ready for chain access.
#[derive(Debug, Clone)]
pub struct PreparedCall {
	/// The sender identity, used for dry-run validation.
	pub from: Address,
	/// Address of the target contract.
	pub to: Address,
	/// ABI-encoded calldata.
	pub data: Vec<u8>,
	/// Native value to attach, if any.
	pub value: Option<U256>,
}

/// An event decoded from a confirmation's logs.
///
/// Parameter values are keyed by name, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEvent {
	/// The event's name.
	pub name: String,
	/// Named parameter values in declaration order.
	pub args: Vec<(String, DynSolValue)>,
}

impl DecodedEvent {
	/// Returns the value of the named parameter, if present.
	pub fn arg(&self, name: &str) -> Option<&DynSolValue> {
		self.args
			.iter()
			.find(|(param, _)| param == name)
			.map(|(_, value)| value)
	}
}

impl fmt::Display for DecodedEvent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}(", self.name)?;
		for (i, (name, value)) in self.args.iter().enumerate() {
			if i > 0 {
				write!(f, ", ")?;
			}
			write!(f, "{}: {:?}", name, value)?;
		}
		write!(f, ")")
	}
}

/// Trait defining the interface for chain-access implementations.
///
/// This trait must be implemented by any chain access provider that wants
/// to integrate with the executor. Each method is one network round-trip;
/// the executor owns the sequencing between them.
#[async_trait]
pub trait ChainInterface: Send + Sync {
	/// Returns the configuration schema for this chain-access implementation.
	///
	/// This allows each implementation to define its own configuration
	/// requirements with specific validation rules. The schema is used to
	/// validate TOML configuration before initializing the provider.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Validates the call against current chain state without submitting it.
	///
	/// Fails with [`ChainError::Revert`] when the node predicts the call
	/// would revert, carrying the decoded revert reason.
	async fn simulate(&self, call: &PreparedCall) -> Result<(), ChainError>;

	/// Signs and submits the call, returning its transaction hash once the
	/// network has accepted it.
	async fn submit(&self, call: &PreparedCall) -> Result<TransactionHash, ChainError>;

	/// Retrieves the confirmation for a transaction if it has been mined.
	///
	/// Returns immediately; `None` means the transaction is not (yet) known
	/// to be included.
	async fn get_receipt(&self, hash: &TransactionHash)
		-> Result<Option<Confirmation>, ChainError>;

	/// Gets the current block number.
	async fn latest_block(&self) -> Result<u64, ChainError>;
}

/// Type alias for chain-access factory functions.
///
/// This is the function signature that all chain-access implementations
/// must provide to create instances of their interface.
pub type ChainFactory = fn(
	&toml::Value,
	&NetworksConfig,
	&SecretString,
) -> Result<Box<dyn ChainInterface>, ChainError>;

/// Registry trait for chain-access implementations.
pub trait ChainRegistry: ImplementationRegistry<Factory = ChainFactory> {}

/// Get all registered chain-access implementations.
///
/// Returns a vector of (name, factory) tuples for all available
/// implementations.
pub fn get_all_implementations() -> Vec<(&'static str, ChainFactory)> {
	use implementations::evm::alloy;

	vec![(alloy::Registry::NAME, alloy::Registry::factory())]
}

/// Timing and finality settings for the executor.
#[derive(Debug, Clone)]
pub struct ExecutorSettings {
	/// Number of blocks a transaction must be buried under before its
	/// confirmation is treated as durable.
	pub min_confirmations: u64,
	/// Upper bound on waiting for a confirmation. Expiry does not imply
	/// the submission failed.
	pub confirmation_timeout: Duration,
	/// Interval between receipt polls while awaiting confirmation.
	pub poll_interval: Duration,
}

impl Default for ExecutorSettings {
	fn default() -> Self {
		Self {
			min_confirmations: 1,
			confirmation_timeout: Duration::from_secs(300),
			poll_interval: Duration::from_secs(7),
		}
	}
}

/// Executes contract calls as a simulate, submit, confirm, decode sequence.
///
/// Holds no mutable state: the chain handle, sender identity, and settings
/// are fixed at construction, so concurrent `execute` calls are independent.
/// The executor never retries a stage; blockchain submissions are not safely
/// idempotent, so retry policy belongs to the caller.
pub struct Executor {
	/// Chain access used for all stages.
	chain: Arc<dyn ChainInterface>,
	/// Identity the executor acts as; used as the dry-run sender.
	sender: Address,
	/// Timing and finality settings.
	settings: ExecutorSettings,
}

impl Executor {
	/// Creates a new Executor over the given chain access.
	pub fn new(chain: Arc<dyn ChainInterface>, sender: Address, settings: ExecutorSettings) -> Self {
		Self {
			chain,
			sender,
			settings,
		}
	}

	/// The identity this executor submits as.
	pub fn sender(&self) -> &Address {
		&self.sender
	}

	/// Executes a contract call end to end.
	///
	/// Stages run strictly in order: dry-run, submit, await confirmation,
	/// decode. A failed dry-run means no submission was attempted. When
	/// `expected_event` is set, the first log entry (in log order) decoding
	/// to that event name becomes the result; its absence is an error, not
	/// an empty success. Without `expected_event` the call resolves to
	/// `None` on success.
	pub async fn execute(&self, spec: &CallSpec) -> Result<Option<DecodedEvent>, ExecutorError> {
		let function = codec::resolve_function(&spec.abi, &spec.function)?;
		let data = codec::encode_call(function, &spec.args)?;
		let call = PreparedCall {
			from: self.sender.clone(),
			to: spec.to.clone(),
			data,
			value: spec.value,
		};

		self.chain.simulate(&call).await.map_err(|e| match e {
			ChainError::Revert { reason } => ExecutorError::Simulation { reason },
			other => ExecutorError::Network(other.to_string()),
		})?;

		let hash = self
			.chain
			.submit(&call)
			.await
			.map_err(|e| ExecutorError::Submission(e.to_string()))?;
		tracing::info!(tx_hash = %hash, function = %spec.function, "Submitted transaction");

		let confirmation = self.await_confirmation(&hash).await?;
		if !confirmation.success {
			return Err(ExecutorError::Reverted { hash });
		}
		tracing::info!(
			tx_hash = %hash,
			block_number = confirmation.block_number,
			"Transaction confirmed"
		);

		match &spec.expected_event {
			None => Ok(None),
			Some(expected) => match codec::find_event(&spec.abi, &confirmation.logs, expected) {
				Some(event) => Ok(Some(event)),
				None => Err(ExecutorError::EventNotFound {
					event: expected.clone(),
				}),
			},
		}
	}

	/// Looks up the current confirmation for a submission, if any.
	///
	/// This is the verification path after a [`ExecutorError::ConfirmationTimeout`]:
	/// the submission may still have landed, and callers must check here
	/// before re-invoking an operation to avoid duplicate effects.
	pub async fn status(
		&self,
		hash: &TransactionHash,
	) -> Result<Option<Confirmation>, ExecutorError> {
		self.chain
			.get_receipt(hash)
			.await
			.map_err(|e| ExecutorError::Network(e.to_string()))
	}

	/// Polls for the transaction's receipt until it is buried under the
	/// configured confirmation depth or the timeout window expires.
	///
	/// Abandoning this future does not affect the submission; once the
	/// network has accepted a transaction it cannot be recalled from here.
	async fn await_confirmation(
		&self,
		hash: &TransactionHash,
	) -> Result<Confirmation, ExecutorError> {
		let start = tokio::time::Instant::now();

		loop {
			if start.elapsed() > self.settings.confirmation_timeout {
				return Err(ExecutorError::ConfirmationTimeout {
					hash: hash.clone(),
					waited_secs: start.elapsed().as_secs(),
				});
			}

			let receipt = self
				.chain
				.get_receipt(hash)
				.await
				.map_err(|e| ExecutorError::Network(e.to_string()))?;

			if let Some(confirmation) = receipt {
				let latest = self
					.chain
					.latest_block()
					.await
					.map_err(|e| ExecutorError::Network(e.to_string()))?;
				let depth = latest.saturating_sub(confirmation.block_number);
				if depth >= self.settings.min_confirmations {
					return Ok(confirmation);
				}
				tracing::debug!(
					tx_hash = %hash,
					"Waiting for {} more confirmations",
					self.settings.min_confirmations.saturating_sub(depth)
				);
			}

			tokio::time::sleep(self.settings.poll_interval).await;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{confirmation, log_for_event, MockChain};
	use alloy_primitives::Address as AlloyAddress;

	fn test_abi() -> Arc<JsonAbi> {
		Arc::new(
			JsonAbi::parse([
				"function register(address project, string metadataURI, bytes data)",
				"event Register(address indexed project, string metadataURI, bytes data)",
				"event Review(address indexed project, uint8 status, string metadataURI, bytes data)",
			])
			.unwrap(),
		)
	}

	fn register_spec(abi: Arc<JsonAbi>) -> CallSpec {
		CallSpec {
			abi,
			to: Address(vec![0x11; 20]),
			function: "register".to_string(),
			args: vec![
				DynSolValue::Address(AlloyAddress::repeat_byte(0x22)),
				DynSolValue::String("ipfs://project".to_string()),
				DynSolValue::Bytes(vec![]),
			],
			value: None,
			expected_event: Some("Register".to_string()),
		}
	}

	fn executor(chain: Arc<MockChain>, settings: ExecutorSettings) -> Executor {
		Executor::new(chain, Address(vec![0x33; 20]), settings)
	}

	fn register_log(abi: &JsonAbi, project: u8, uri: &str) -> allokit_types::LogEntry {
		log_for_event(
			abi,
			&Address(vec![0x11; 20]),
			"Register",
			&[
				DynSolValue::Address(AlloyAddress::repeat_byte(project)),
				DynSolValue::String(uri.to_string()),
				DynSolValue::Bytes(vec![]),
			],
		)
	}

	#[tokio::test]
	async fn test_returns_first_matching_event() {
		let abi = test_abi();
		let logs = vec![
			register_log(&abi, 0xaa, "ipfs://first"),
			log_for_event(
				&abi,
				&Address(vec![0x11; 20]),
				"Review",
				&[
					DynSolValue::Address(AlloyAddress::repeat_byte(0xbb)),
					DynSolValue::Uint(U256::from(1u8), 8),
					DynSolValue::String("ipfs://review".to_string()),
					DynSolValue::Bytes(vec![]),
				],
			),
			register_log(&abi, 0xcc, "ipfs://second"),
		];
		let chain = Arc::new(MockChain::with_receipt(confirmation(true, logs)));
		let executor = executor(chain, ExecutorSettings::default());

		let event = executor
			.execute(&register_spec(abi))
			.await
			.unwrap()
			.unwrap();

		assert_eq!(event.name, "Register");
		assert_eq!(
			event.arg("project"),
			Some(&DynSolValue::Address(AlloyAddress::repeat_byte(0xaa)))
		);
		assert_eq!(
			event.arg("metadataURI"),
			Some(&DynSolValue::String("ipfs://first".to_string()))
		);
	}

	#[tokio::test]
	async fn test_simulated_revert_blocks_submission() {
		let chain = Arc::new(MockChain::with_revert("Already registered"));
		let executor = executor(chain.clone(), ExecutorSettings::default());

		let err = executor.execute(&register_spec(test_abi())).await.unwrap_err();

		match err {
			ExecutorError::Simulation { reason } => assert_eq!(reason, "Already registered"),
			other => panic!("expected Simulation error, got {:?}", other),
		}
		assert_eq!(chain.stages(), vec!["simulate"]);
		assert!(chain.submissions().is_empty());
	}

	#[tokio::test]
	async fn test_submission_failure_is_distinct() {
		let chain = Arc::new(MockChain::with_submission_failure("user rejected signing"));
		let executor = executor(chain.clone(), ExecutorSettings::default());

		let err = executor.execute(&register_spec(test_abi())).await.unwrap_err();

		match err {
			ExecutorError::Submission(message) => {
				assert!(message.contains("user rejected signing"))
			},
			other => panic!("expected Submission error, got {:?}", other),
		}
		// The dry-run ran and passed before the submission was refused.
		assert_eq!(chain.stages(), vec!["simulate", "submit"]);
	}

	#[tokio::test]
	async fn test_missing_expected_event_is_an_error() {
		let abi = test_abi();
		let logs = vec![log_for_event(
			&abi,
			&Address(vec![0x11; 20]),
			"Review",
			&[
				DynSolValue::Address(AlloyAddress::repeat_byte(0xbb)),
				DynSolValue::Uint(U256::from(2u8), 8),
				DynSolValue::String("ipfs://review".to_string()),
				DynSolValue::Bytes(vec![]),
			],
		)];
		let chain = Arc::new(MockChain::with_receipt(confirmation(true, logs)));
		let executor = executor(chain, ExecutorSettings::default());

		let err = executor.execute(&register_spec(abi)).await.unwrap_err();

		match err {
			ExecutorError::EventNotFound { event } => assert_eq!(event, "Register"),
			other => panic!("expected EventNotFound error, got {:?}", other),
		}
	}

	#[tokio::test]
	async fn test_no_expected_event_returns_none() {
		let abi = test_abi();
		let chain = Arc::new(MockChain::with_receipt(confirmation(true, vec![])));
		let executor = executor(chain, ExecutorSettings::default());

		let mut spec = register_spec(abi);
		spec.expected_event = None;

		assert!(executor.execute(&spec).await.unwrap().is_none());
	}

	#[tokio::test]
	async fn test_reverted_inclusion_is_an_error() {
		let abi = test_abi();
		let chain = Arc::new(MockChain::with_receipt(confirmation(false, vec![])));
		let executor = executor(chain, ExecutorSettings::default());

		let err = executor.execute(&register_spec(abi)).await.unwrap_err();
		assert!(matches!(err, ExecutorError::Reverted { .. }));
	}

	#[tokio::test(start_paused = true)]
	async fn test_confirmation_timeout_after_single_submission() {
		let chain = Arc::new(MockChain::new());
		let settings = ExecutorSettings {
			min_confirmations: 1,
			confirmation_timeout: Duration::from_secs(5),
			poll_interval: Duration::from_secs(2),
		};
		let executor = executor(chain.clone(), settings);

		let err = executor.execute(&register_spec(test_abi())).await.unwrap_err();
		assert!(matches!(err, ExecutorError::ConfirmationTimeout { .. }));

		// The timeout itself must not resubmit.
		let submissions = chain
			.stages()
			.into_iter()
			.filter(|stage| *stage == "submit")
			.count();
		assert_eq!(submissions, 1);

		// The submission may still land later; a direct lookup keeps working.
		chain.set_receipt(confirmation(true, vec![]));
		let hash = TransactionHash(vec![0xab; 32]);
		assert!(executor.status(&hash).await.unwrap().is_some());
	}

	#[tokio::test(start_paused = true)]
	async fn test_shallow_confirmation_is_not_final() {
		let abi = test_abi();
		// Included at block 100, chain tip at 102: only 2 confirmations deep.
		let chain = Arc::new(
			MockChain::with_receipt(confirmation(true, vec![])).with_latest_block(102),
		);
		let settings = ExecutorSettings {
			min_confirmations: 5,
			confirmation_timeout: Duration::from_secs(5),
			poll_interval: Duration::from_secs(2),
		};
		let executor = executor(chain, settings);

		let err = executor.execute(&register_spec(abi)).await.unwrap_err();
		assert!(matches!(err, ExecutorError::ConfirmationTimeout { .. }));
	}

	#[tokio::test]
	async fn test_attached_value_forwarded() {
		let abi = test_abi();
		let chain = Arc::new(MockChain::with_receipt(confirmation(true, vec![])));
		let executor = executor(chain.clone(), ExecutorSettings::default());

		let mut spec = register_spec(abi);
		spec.expected_event = None;
		spec.value = Some(U256::from(1_000u64));

		executor.execute(&spec).await.unwrap();
		assert_eq!(chain.submissions()[0].value, Some(U256::from(1_000u64)));
	}
}
