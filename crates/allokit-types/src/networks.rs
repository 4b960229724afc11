//! Network configuration and the deployed-contract address registry.
//!
//! This module defines per-chain settings (RPC endpoint, deployed factory
//! address) and the read-only registry the client uses to resolve contract
//! addresses for its configured chain.

use crate::Address;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Configuration for a single blockchain network.
///
/// Contains the settings required to reach a network and locate the
/// platform contracts deployed on it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
	/// The HTTP(S) RPC endpoint for chain interaction.
	pub rpc_url: String,
	/// Address of the pool factory deployed on this network.
	pub pool_factory_address: Address,
}

/// Networks configuration mapping chain IDs to their configurations.
///
/// TOML does not support numeric table keys, so chain IDs are written as
/// string keys and converted during deserialization.
pub type NetworksConfig = HashMap<u64, NetworkConfig>;

/// Deployed contract addresses for a single chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedContracts {
	/// The pool factory address.
	pub pool_factory: Address,
}

/// Read-only registry of deployed contract addresses, indexed by chain ID.
///
/// Built once from the networks configuration at startup and passed into
/// the client explicitly, so tests can substitute fixture registries.
#[derive(Debug, Clone, Default)]
pub struct AddressRegistry {
	entries: HashMap<u64, DeployedContracts>,
}

impl AddressRegistry {
	/// Derives a registry from the networks configuration.
	pub fn from_networks(networks: &NetworksConfig) -> Self {
		let entries = networks
			.iter()
			.map(|(chain_id, network)| {
				(
					*chain_id,
					DeployedContracts {
						pool_factory: network.pool_factory_address.clone(),
					},
				)
			})
			.collect();
		Self { entries }
	}

	/// Returns the deployed contracts for the given chain, if known.
	pub fn get(&self, chain_id: u64) -> Option<&DeployedContracts> {
		self.entries.get(&chain_id)
	}

	/// Inserts an entry, replacing any existing one for the chain.
	///
	/// Intended for fixture registries in tests and tooling.
	pub fn insert(&mut self, chain_id: u64, contracts: DeployedContracts) {
		self.entries.insert(chain_id, contracts);
	}
}

/// Helper function to deserialize network configurations from TOML.
///
/// Chain IDs arrive as string keys (TOML limitation) and are parsed into
/// u64 keys for internal use.
///
/// # Errors
///
/// Returns a deserialization error if:
/// - A chain ID key cannot be parsed as a u64
/// - The underlying network configuration is invalid
pub fn deserialize_networks<'de, D>(deserializer: D) -> Result<NetworksConfig, D::Error>
where
	D: Deserializer<'de>,
{
	let string_map: HashMap<String, NetworkConfig> = HashMap::deserialize(deserializer)?;
	let mut result = HashMap::new();

	for (key, value) in string_map {
		let chain_id = key
			.parse::<u64>()
			.map_err(|e| serde::de::Error::custom(format!("Invalid chain_id '{}': {}", key, e)))?;
		result.insert(chain_id, value);
	}

	Ok(result)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Deserialize)]
	struct Wrapper {
		#[serde(deserialize_with = "deserialize_networks")]
		networks: NetworksConfig,
	}

	#[test]
	fn test_networks_deserialize_string_keys() {
		let toml = r#"
			[networks.31337]
			rpc_url = "http://localhost:8545"
			pool_factory_address = "0x5fbdb2315678afecb367f032d93f642f64180aa3"
		"#;
		let wrapper: Wrapper = toml::from_str(toml).unwrap();
		let network = wrapper.networks.get(&31337).unwrap();
		assert_eq!(network.rpc_url, "http://localhost:8545");
		assert_eq!(network.pool_factory_address.0.len(), 20);
	}

	#[test]
	fn test_networks_reject_non_numeric_chain_id() {
		let toml = r#"
			[networks.mainnet]
			rpc_url = "http://localhost:8545"
			pool_factory_address = "0x5fbdb2315678afecb367f032d93f642f64180aa3"
		"#;
		let result: Result<Wrapper, _> = toml::from_str(toml);
		assert!(result.is_err());
	}

	#[test]
	fn test_registry_from_networks() {
		let mut networks = NetworksConfig::new();
		networks.insert(
			31337,
			NetworkConfig {
				rpc_url: "http://localhost:8545".to_string(),
				pool_factory_address: Address(vec![0xaa; 20]),
			},
		);
		let registry = AddressRegistry::from_networks(&networks);
		assert_eq!(
			registry.get(31337).unwrap().pool_factory,
			Address(vec![0xaa; 20])
		);
		assert!(registry.get(1).is_none());
	}
}
