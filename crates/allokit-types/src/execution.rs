//! Transaction confirmation types.
//!
//! This module defines the record returned once a submitted transaction has
//! been durably included in a block. The confirmation carries the emitted
//! log entries in log order because events are the only off-chain-visible
//! signal of what a call actually did.

use crate::Address;
use crate::TransactionHash;

/// A single log entry emitted during transaction execution.
///
/// Stored as raw topics and data; schema-driven decoding happens in the
/// executor against the interface supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LogEntry {
	/// Address of the contract that emitted the log.
	pub address: Address,
	/// Indexed topics, each 32 bytes; topic zero is the event selector.
	pub topics: Vec<Vec<u8>>,
	/// ABI-encoded non-indexed event parameters.
	pub data: Vec<u8>,
}

/// Finalized record of a submitted transaction.
///
/// Produced only once the network reports the transaction as durably
/// included with the configured confirmation depth. Read-only once obtained.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Confirmation {
	/// The hash of the transaction.
	pub hash: TransactionHash,
	/// The block number where the transaction was included.
	pub block_number: u64,
	/// Whether the transaction executed successfully.
	pub success: bool,
	/// Log entries emitted by the execution, in log order.
	pub logs: Vec<LogEntry>,
}
