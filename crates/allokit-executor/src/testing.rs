//! Scripted chain access for tests.
//!
//! `MockChain` records the stage sequence the executor drives it through
//! and returns pre-scripted results, so the execution sequence can be
//! asserted without a node. The log builders construct raw log entries the
//! same way a node would serve them.

use crate::{ChainError, ChainInterface, PreparedCall};
use allokit_types::{
	Address, ConfigSchema, Confirmation, LogEntry, Schema, TransactionHash, ValidationError,
};
use alloy_dyn_abi::DynSolValue;
use alloy_json_abi::JsonAbi;
use async_trait::async_trait;
use std::sync::Mutex;

/// Hash every scripted submission resolves to.
pub const MOCK_TX_HASH: [u8; 32] = [0xab; 32];

/// Chain access implementation driven entirely by scripted results.
pub struct MockChain {
	/// When set, simulation fails with this revert reason.
	revert_reason: Option<String>,
	/// When set, submission fails with this message.
	submission_failure: Option<String>,
	/// What receipt lookups return.
	receipt: Mutex<Option<Confirmation>>,
	/// Every call passed to submit.
	submissions: Mutex<Vec<PreparedCall>>,
	/// Stage names in invocation order.
	stages: Mutex<Vec<&'static str>>,
	/// Fixed chain tip.
	latest_block: u64,
}

impl MockChain {
	/// A chain that accepts submissions but never reports a receipt.
	pub fn new() -> Self {
		Self {
			revert_reason: None,
			submission_failure: None,
			receipt: Mutex::new(None),
			submissions: Mutex::new(Vec::new()),
			stages: Mutex::new(Vec::new()),
			latest_block: 1_000,
		}
	}

	/// A chain whose receipt lookups resolve to the given confirmation.
	pub fn with_receipt(confirmation: Confirmation) -> Self {
		let chain = Self::new();
		*chain.receipt.lock().unwrap() = Some(confirmation);
		chain
	}

	/// A chain whose simulations revert with the given reason.
	pub fn with_revert(reason: &str) -> Self {
		Self {
			revert_reason: Some(reason.to_string()),
			..Self::new()
		}
	}

	/// A chain whose submissions are refused with the given message.
	pub fn with_submission_failure(message: &str) -> Self {
		Self {
			submission_failure: Some(message.to_string()),
			..Self::new()
		}
	}

	/// Overrides the scripted chain tip.
	pub fn with_latest_block(mut self, latest_block: u64) -> Self {
		self.latest_block = latest_block;
		self
	}

	/// Replaces the scripted receipt mid-test.
	pub fn set_receipt(&self, confirmation: Confirmation) {
		*self.receipt.lock().unwrap() = Some(confirmation);
	}

	/// Calls passed to submit so far.
	pub fn submissions(&self) -> Vec<PreparedCall> {
		self.submissions.lock().unwrap().clone()
	}

	/// Stage names in invocation order.
	pub fn stages(&self) -> Vec<&'static str> {
		self.stages.lock().unwrap().clone()
	}

	fn record(&self, stage: &'static str) {
		self.stages.lock().unwrap().push(stage);
	}
}

impl Default for MockChain {
	fn default() -> Self {
		Self::new()
	}
}

/// Schema for the mock: accepts any configuration.
pub struct MockChainSchema;

impl ConfigSchema for MockChainSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![], vec![]).validate(config)
	}
}

#[async_trait]
impl ChainInterface for MockChain {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MockChainSchema)
	}

	async fn simulate(&self, _call: &PreparedCall) -> Result<(), ChainError> {
		self.record("simulate");
		match &self.revert_reason {
			Some(reason) => Err(ChainError::Revert {
				reason: reason.clone(),
			}),
			None => Ok(()),
		}
	}

	async fn submit(&self, call: &PreparedCall) -> Result<TransactionHash, ChainError> {
		self.record("submit");
		if let Some(message) = &self.submission_failure {
			return Err(ChainError::Rejected(message.clone()));
		}
		self.submissions.lock().unwrap().push(call.clone());
		Ok(TransactionHash(MOCK_TX_HASH.to_vec()))
	}

	async fn get_receipt(
		&self,
		_hash: &TransactionHash,
	) -> Result<Option<Confirmation>, ChainError> {
		self.record("get_receipt");
		Ok(self.receipt.lock().unwrap().clone())
	}

	async fn latest_block(&self) -> Result<u64, ChainError> {
		Ok(self.latest_block)
	}
}

/// Builds a confirmation for the scripted submission hash.
pub fn confirmation(success: bool, logs: Vec<LogEntry>) -> Confirmation {
	Confirmation {
		hash: TransactionHash(MOCK_TX_HASH.to_vec()),
		block_number: 100,
		success,
		logs,
	}
}

/// Builds the raw log entry a node would serve for the given event.
///
/// `values` are the event's parameters in declaration order; indexed
/// parameters become topics, the rest are ABI-encoded into the data field.
pub fn log_for_event(
	abi: &JsonAbi,
	emitter: &Address,
	event_name: &str,
	values: &[DynSolValue],
) -> LogEntry {
	let event = abi
		.event(event_name)
		.and_then(|overloads| overloads.first())
		.unwrap_or_else(|| panic!("event '{}' not in interface", event_name));
	assert_eq!(
		event.inputs.len(),
		values.len(),
		"value count must match '{}' parameters",
		event_name
	);

	let mut topics = vec![event.selector().0.to_vec()];
	let mut body = Vec::new();
	for (param, value) in event.inputs.iter().zip(values) {
		if param.indexed {
			topics.push(topic_word(value));
		} else {
			body.push(value.clone());
		}
	}

	LogEntry {
		address: emitter.clone(),
		topics,
		data: DynSolValue::Tuple(body).abi_encode_params(),
	}
}

/// Encodes a word-representable value as a 32-byte topic.
fn topic_word(value: &DynSolValue) -> Vec<u8> {
	match value {
		DynSolValue::Address(address) => {
			let mut word = vec![0u8; 12];
			word.extend_from_slice(address.as_slice());
			word
		},
		DynSolValue::Uint(value, _) => value.to_be_bytes::<32>().to_vec(),
		DynSolValue::FixedBytes(word, _) => word.0.to_vec(),
		other => panic!("unsupported indexed value: {:?}", other),
	}
}
