//! Schema-driven encoding and decoding.
//!
//! Calldata is produced from the interface supplied with each call spec,
//! and confirmed log entries are decoded back against the same interface.
//! Revert payloads from failed dry-runs are decoded here too, covering the
//! standard `Error(string)` and `Panic(uint256)` encodings.

use crate::{DecodedEvent, ExecutorError};
use allokit_types::LogEntry;
use alloy_dyn_abi::{DynSolType, DynSolValue, EventExt, JsonAbiExt};
use alloy_json_abi::{Event, Function, JsonAbi};
use alloy_primitives::{B256, U256};

// Standard Solidity revert selectors.
const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];
const PANIC_SELECTOR: [u8; 4] = [0x4e, 0x48, 0x7b, 0x71];

/// Looks up a function by name in the interface.
///
/// Overloads are not part of the platform contract surface; the first
/// declaration wins if an interface ever carries one.
pub(crate) fn resolve_function<'a>(
	abi: &'a JsonAbi,
	name: &str,
) -> Result<&'a Function, ExecutorError> {
	abi.function(name)
		.and_then(|overloads| overloads.first())
		.ok_or_else(|| ExecutorError::Abi(format!("Function '{}' not found in interface", name)))
}

/// ABI-encodes the arguments for a function call, selector included.
pub(crate) fn encode_call(
	function: &Function,
	args: &[DynSolValue],
) -> Result<Vec<u8>, ExecutorError> {
	function.abi_encode_input(args).map_err(|e| {
		ExecutorError::Abi(format!(
			"Failed to encode arguments for '{}': {}",
			function.name, e
		))
	})
}

/// Decodes the log entries against the interface and selects the first one
/// (in log order) whose event name matches.
///
/// Entries that do not correspond to an event in the interface (e.g. token
/// transfers emitted by other contracts in the same transaction) are
/// skipped, mirroring how indexers filter logs by schema.
pub(crate) fn find_event(
	abi: &JsonAbi,
	logs: &[LogEntry],
	expected: &str,
) -> Option<DecodedEvent> {
	logs.iter()
		.filter_map(|log| decode_log(abi, log))
		.find(|event| event.name == expected)
}

/// Decodes a single log entry against the interface, if it matches one of
/// the interface's events.
fn decode_log(abi: &JsonAbi, log: &LogEntry) -> Option<DecodedEvent> {
	let selector_bytes = log.topics.first()?;
	if log.topics.iter().any(|topic| topic.len() != 32) {
		return None;
	}
	let selector = B256::from_slice(selector_bytes);

	let event = abi
		.events()
		.find(|event| !event.anonymous && event.selector() == selector)?;

	let topics: Vec<B256> = log.topics.iter().map(|topic| B256::from_slice(topic)).collect();
	let decoded = event.decode_log_parts(topics, &log.data, true).ok()?;
	named_arguments(event, decoded.indexed, decoded.body)
}

/// Reassembles indexed and non-indexed values into declaration order,
/// keyed by parameter name.
fn named_arguments(
	event: &Event,
	indexed: Vec<DynSolValue>,
	body: Vec<DynSolValue>,
) -> Option<DecodedEvent> {
	let mut indexed = indexed.into_iter();
	let mut body = body.into_iter();
	let mut args = Vec::with_capacity(event.inputs.len());

	for param in &event.inputs {
		let value = if param.indexed {
			indexed.next()?
		} else {
			body.next()?
		};
		args.push((param.name.clone(), value));
	}

	Some(DecodedEvent {
		name: event.name.clone(),
		args,
	})
}

/// Decodes a revert payload into a human-readable reason.
///
/// Returns `None` for empty or undecodable payloads; callers fall back to
/// the node's error message in that case.
pub(crate) fn decode_revert_reason(data: &[u8]) -> Option<String> {
	if data.len() < 4 {
		return None;
	}
	let (selector, payload) = data.split_at(4);

	if selector == ERROR_STRING_SELECTOR {
		match DynSolType::String.abi_decode(payload) {
			Ok(DynSolValue::String(reason)) => Some(reason),
			_ => None,
		}
	} else if selector == PANIC_SELECTOR {
		match DynSolType::Uint(256).abi_decode(payload) {
			Ok(DynSolValue::Uint(code, _)) => Some(format!("panic: {}", panic_description(code))),
			_ => None,
		}
	} else {
		// Contract-defined error: surface the selector so callers can match
		// it against their contract's error definitions.
		Some(format!("custom error 0x{}", hex::encode(selector)))
	}
}

fn panic_description(code: U256) -> &'static str {
	if code == U256::from(0x01u64) {
		"assertion failed"
	} else if code == U256::from(0x11u64) {
		"arithmetic overflow or underflow"
	} else if code == U256::from(0x12u64) {
		"division by zero"
	} else if code == U256::from(0x32u64) {
		"array index out of bounds"
	} else {
		"unknown panic code"
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::log_for_event;
	use allokit_types::Address;
	use alloy_primitives::Address as AlloyAddress;

	fn test_abi() -> JsonAbi {
		JsonAbi::parse([
			"function register(address project, string metadataURI, bytes data)",
			"event Register(address indexed project, string metadataURI, bytes data)",
		])
		.unwrap()
	}

	fn register_args() -> Vec<DynSolValue> {
		vec![
			DynSolValue::Address(AlloyAddress::repeat_byte(0x22)),
			DynSolValue::String("ipfs://project".to_string()),
			DynSolValue::Bytes(vec![0xde, 0xad]),
		]
	}

	#[test]
	fn test_calldata_round_trip() {
		let abi = test_abi();
		let function = resolve_function(&abi, "register").unwrap();
		let args = register_args();

		let calldata = encode_call(function, &args).unwrap();
		assert_eq!(&calldata[..4], function.selector().as_slice());

		let decoded = function.abi_decode_input(&calldata[4..], true).unwrap();
		assert_eq!(decoded, args);
	}

	#[test]
	fn test_log_round_trip_preserves_named_values() {
		let abi = test_abi();
		let args = register_args();
		let log = log_for_event(&abi, &Address(vec![0x11; 20]), "Register", &args);

		let event = find_event(&abi, &[log], "Register").unwrap();
		assert_eq!(event.name, "Register");
		assert_eq!(event.arg("project"), Some(&args[0]));
		assert_eq!(event.arg("metadataURI"), Some(&args[1]));
		assert_eq!(event.arg("data"), Some(&args[2]));
	}

	#[test]
	fn test_unknown_function_rejected() {
		let abi = test_abi();
		assert!(resolve_function(&abi, "renounce").is_err());
	}

	#[test]
	fn test_foreign_logs_skipped() {
		let abi = test_abi();
		// A log whose selector matches nothing in the interface.
		let foreign = LogEntry {
			address: Address(vec![0x99; 20]),
			topics: vec![vec![0x42; 32]],
			data: vec![],
		};
		assert!(find_event(&abi, &[foreign], "Register").is_none());
	}

	#[test]
	fn test_error_string_revert_decoded() {
		let mut data = ERROR_STRING_SELECTOR.to_vec();
		data.extend(DynSolValue::String("Already registered".to_string()).abi_encode());

		assert_eq!(
			decode_revert_reason(&data).as_deref(),
			Some("Already registered")
		);
	}

	#[test]
	fn test_panic_revert_decoded() {
		let mut data = PANIC_SELECTOR.to_vec();
		data.extend(DynSolValue::Uint(U256::from(0x11u64), 256).abi_encode());

		assert_eq!(
			decode_revert_reason(&data).as_deref(),
			Some("panic: arithmetic overflow or underflow")
		);
	}

	#[test]
	fn test_custom_error_surfaces_selector() {
		let data = vec![0xcc, 0x9c, 0x44, 0x04];
		assert_eq!(
			decode_revert_reason(&data).as_deref(),
			Some("custom error 0xcc9c4404")
		);
	}

	#[test]
	fn test_empty_revert_data_yields_none() {
		assert!(decode_revert_reason(&[]).is_none());
	}
}
