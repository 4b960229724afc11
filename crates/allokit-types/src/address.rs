//! Address and transaction-hash newtypes.
//!
//! Both types store raw bytes so they stay agnostic of any particular
//! chain library; conversion to concrete address types happens at the
//! chain-access boundary. Serialization uses 0x-prefixed hex strings so
//! the types round-trip through TOML configuration and JSON output.

use crate::utils::{with_0x_prefix, without_0x_prefix};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// On-chain account or contract address, stored as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(pub Vec<u8>);

/// Hash identifying a submitted transaction.
///
/// Returned once a call has been accepted by the network and used
/// afterwards to look up its confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransactionHash(pub Vec<u8>);

impl fmt::Display for Address {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", with_0x_prefix(&hex::encode(&self.0)))
	}
}

impl fmt::Display for TransactionHash {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", with_0x_prefix(&hex::encode(&self.0)))
	}
}

impl From<alloy_primitives::Address> for Address {
	fn from(address: alloy_primitives::Address) -> Self {
		Self(address.as_slice().to_vec())
	}
}

impl Serialize for Address {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&self.to_string())
	}
}

impl<'de> Deserialize<'de> for Address {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?;
		let bytes = hex::decode(without_0x_prefix(&s))
			.map_err(|e| serde::de::Error::custom(format!("Invalid address '{}': {}", s, e)))?;
		Ok(Address(bytes))
	}
}

impl Serialize for TransactionHash {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&self.to_string())
	}
}

impl<'de> Deserialize<'de> for TransactionHash {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?;
		let bytes = hex::decode(without_0x_prefix(&s))
			.map_err(|e| serde::de::Error::custom(format!("Invalid hash '{}': {}", s, e)))?;
		Ok(TransactionHash(bytes))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_address_display_roundtrip() {
		let address = Address(vec![0x5f, 0xbd, 0xb2, 0x31]);
		assert_eq!(address.to_string(), "0x5fbdb231");
	}

	#[test]
	fn test_address_deserializes_with_and_without_prefix() {
		let with_prefix: Address = serde_json::from_str("\"0x5fbdb231\"").unwrap();
		let without_prefix: Address = serde_json::from_str("\"5fbdb231\"").unwrap();
		assert_eq!(with_prefix, without_prefix);
		assert_eq!(with_prefix.0, vec![0x5f, 0xbd, 0xb2, 0x31]);
	}

	#[test]
	fn test_address_rejects_invalid_hex() {
		let result: Result<Address, _> = serde_json::from_str("\"0xzz\"");
		assert!(result.is_err());
	}

	#[test]
	fn test_from_alloy_address() {
		let alloy = alloy_primitives::Address::repeat_byte(0xaa);
		let address = Address::from(alloy);
		assert_eq!(address.0.len(), 20);
		assert!(address.0.iter().all(|&b| b == 0xaa));
	}
}
