//! Account management module for the AlloKit client.
//!
//! This module provides abstractions for the identity the client acts as.
//! An account implementation supplies the sender address used for dry-run
//! validation and custody of the signing key consumed by the chain-access
//! layer.

use allokit_types::{Address, ConfigSchema, ImplementationRegistry, SecretString};
use async_trait::async_trait;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod local;
}

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
	/// Error that occurs when a cryptographic key is invalid or malformed.
	#[error("Invalid key: {0}")]
	InvalidKey(String),
	/// Error that occurs when interacting with the account implementation.
	#[error("Implementation error: {0}")]
	Implementation(String),
}

/// Trait defining the interface for account implementations.
///
/// This trait must be implemented by any account implementation that wants
/// to integrate with the client. Signing itself happens inside the
/// chain-access layer; the account supplies the identity and key material.
#[async_trait]
pub trait AccountInterface: Send + Sync {
	/// Returns the configuration schema for this account implementation.
	///
	/// This allows each implementation to define its own configuration
	/// requirements with specific validation rules. The schema is used to
	/// validate TOML configuration before initializing the implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Retrieves the address associated with this account.
	async fn address(&self) -> Result<Address, AccountError>;

	/// Returns the private key as a SecretString with 0x prefix.
	///
	/// Consumed by chain-access implementations to construct their signing
	/// wallet.
	fn private_key(&self) -> SecretString;
}

/// Type alias for account factory functions.
///
/// This is the function signature that all account implementations must
/// provide to create instances of their account interface.
pub type AccountFactory = fn(&toml::Value) -> Result<Box<dyn AccountInterface>, AccountError>;

/// Registry trait for account implementations.
///
/// This trait extends the base ImplementationRegistry to specify that
/// account implementations must provide an AccountFactory.
pub trait AccountRegistry: ImplementationRegistry<Factory = AccountFactory> {}

/// Get all registered account implementations.
///
/// Returns a vector of (name, factory) tuples for all available account
/// implementations.
pub fn get_all_implementations() -> Vec<(&'static str, AccountFactory)> {
	use implementations::local;

	vec![(local::Registry::NAME, local::Registry::factory())]
}

/// Service that manages account operations.
///
/// This struct provides a high-level interface for account management,
/// wrapping an underlying account implementation.
pub struct AccountService {
	/// The underlying account implementation.
	implementation: Box<dyn AccountInterface>,
}

impl AccountService {
	/// Creates a new AccountService with the specified implementation.
	pub fn new(implementation: Box<dyn AccountInterface>) -> Self {
		Self { implementation }
	}

	/// Retrieves the address associated with the managed account.
	pub async fn address(&self) -> Result<Address, AccountError> {
		self.implementation.address().await
	}

	/// Returns the private key as a SecretString.
	///
	/// This is used by chain-access implementations for transaction signing.
	pub fn private_key(&self) -> SecretString {
		self.implementation.private_key()
	}
}
