//! Contract interfaces for the grant-pool platform.
//!
//! The executor is schema-driven, so the platform contracts are described
//! as human-readable signature sets parsed into interfaces at client
//! construction. These must track the deployed contract versions.

use crate::ClientError;
use alloy_json_abi::JsonAbi;

/// Interface of the pool factory contract.
pub fn pool_factory_interface() -> Result<JsonAbi, ClientError> {
	parse_interface(&[
		"function deploy(address implementation, (address,address[],address,address,uint256,uint64[],string) config, bytes data) returns (address)",
		"event Created(address indexed pool, address indexed implementation, address indexed owner)",
	])
}

/// Interface of a pool (strategy) contract instance.
pub fn pool_interface() -> Result<JsonAbi, ClientError> {
	parse_interface(&[
		"function initialize((address,address[],address,address,uint256,uint64[],string) config, bytes data)",
		"function register(address project, string metadataURI, bytes data)",
		"function review(address project, uint8 status, string metadataURI, bytes data)",
		"function update(address project, string metadataURI, bytes data)",
		"function allocate(address[] recipients, uint256[] amounts, address token, bytes[] data)",
		"function distribute(address[] recipients, uint256[] amounts, address token, bytes[] data)",
		"event Register(address indexed project, string metadataURI, bytes data)",
		"event Review(address indexed project, uint8 status, string metadataURI, bytes data)",
		"event Update(address indexed project, string metadataURI, bytes data)",
		"event Allocate(address indexed from, address indexed to, uint256 amount, address token)",
		"event Distribute(address indexed from, address indexed to, uint256 amount, address token)",
	])
}

fn parse_interface(signatures: &[&str]) -> Result<JsonAbi, ClientError> {
	JsonAbi::parse(signatures.iter().copied())
		.map_err(|e| ClientError::Interface(format!("Invalid contract interface: {}", e)))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_interfaces_parse() {
		let factory = pool_factory_interface().unwrap();
		assert!(factory.function("deploy").is_some());
		assert!(factory.event("Created").is_some());

		let pool = pool_interface().unwrap();
		for function in [
			"initialize",
			"register",
			"review",
			"update",
			"allocate",
			"distribute",
		] {
			assert!(pool.function(function).is_some(), "missing {}", function);
		}
		for event in ["Register", "Review", "Update", "Allocate", "Distribute"] {
			assert!(pool.event(event).is_some(), "missing {}", event);
		}
	}
}
