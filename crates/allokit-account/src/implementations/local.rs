//! Local private-key account implementation.
//!
//! Holds a secp256k1 private key in process memory. Suitable for
//! development chains and operator-managed deployments; key custody
//! beyond that (HSMs, remote signers) would be a separate implementation.

use crate::{AccountError, AccountFactory, AccountInterface, AccountRegistry};
use allokit_types::{
	with_0x_prefix, without_0x_prefix, Address, ConfigSchema, Field, FieldType, Schema,
	SecretString,
};
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;

/// Account backed by a locally held private key.
pub struct LocalAccount {
	/// The signing key, wrapped by the alloy local signer.
	signer: PrivateKeySigner,
}

impl LocalAccount {
	/// Creates a new LocalAccount from a private key.
	pub fn new(private_key: &SecretString) -> Result<Self, AccountError> {
		let signer: PrivateKeySigner = private_key.with_exposed(|key| {
			key.parse()
				.map_err(|_| AccountError::InvalidKey("Invalid private key format".to_string()))
		})?;

		Ok(Self { signer })
	}
}

/// Configuration schema for the local account implementation.
pub struct LocalAccountSchema;

impl ConfigSchema for LocalAccountSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), allokit_types::ValidationError> {
		let schema = Schema::new(
			// Required fields
			vec![
				Field::new("private_key", FieldType::String).with_validator(|value| {
					match value.as_str() {
						Some(key) => {
							let stripped = without_0x_prefix(key);
							if stripped.len() == 64
								&& stripped.chars().all(|c| c.is_ascii_hexdigit())
							{
								Ok(())
							} else {
								Err("private_key must be 32 bytes of hex".to_string())
							}
						},
						None => Err("Expected string value for private_key".to_string()),
					}
				}),
			],
			// Optional fields
			vec![],
		);

		schema.validate(config)
	}
}

#[async_trait]
impl AccountInterface for LocalAccount {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(LocalAccountSchema)
	}

	async fn address(&self) -> Result<Address, AccountError> {
		Ok(Address::from(self.signer.address()))
	}

	fn private_key(&self) -> SecretString {
		SecretString::new(with_0x_prefix(&hex::encode(self.signer.to_bytes())))
	}
}

/// Factory function to create a local account from configuration.
///
/// Required configuration parameters:
/// - `private_key`: The signing key as a hex string
pub fn create_account(config: &toml::Value) -> Result<Box<dyn AccountInterface>, AccountError> {
	LocalAccountSchema
		.validate(config)
		.map_err(|e| AccountError::InvalidKey(format!("Invalid configuration: {}", e)))?;

	let private_key = config
		.get("private_key")
		.and_then(|v| v.as_str())
		.ok_or_else(|| AccountError::InvalidKey("private_key is required".to_string()))?;

	let account = LocalAccount::new(&SecretString::from(private_key))?;
	Ok(Box::new(account))
}

/// Registry for the local account implementation.
pub struct Registry;

impl allokit_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "local";
	type Factory = AccountFactory;

	fn factory() -> Self::Factory {
		create_account
	}
}

impl AccountRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;

	// First default account of the hardhat/anvil development mnemonic.
	const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
	const DEV_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

	#[tokio::test]
	async fn test_address_derived_from_key() {
		let account = LocalAccount::new(&SecretString::from(DEV_KEY)).unwrap();
		let address = account.address().await.unwrap();
		assert_eq!(address.to_string(), DEV_ADDRESS);
	}

	#[test]
	fn test_private_key_round_trip() {
		let account = LocalAccount::new(&SecretString::from(DEV_KEY)).unwrap();
		account
			.private_key()
			.with_exposed(|key| assert_eq!(key, DEV_KEY));
	}

	#[test]
	fn test_factory_rejects_malformed_key() {
		let config: toml::Value = toml::from_str(r#"private_key = "0x1234""#).unwrap();
		assert!(create_account(&config).is_err());
	}

	#[test]
	fn test_factory_creates_account() {
		let config: toml::Value =
			toml::from_str(&format!("private_key = \"{}\"", DEV_KEY)).unwrap();
		assert!(create_account(&config).is_ok());
	}
}
