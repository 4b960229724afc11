//! Configuration module for the AlloKit client.
//!
//! This module provides structures and utilities for managing client
//! configuration. It supports loading configuration from TOML files and
//! provides validation to ensure all required configuration values are
//! properly set.
//!
//! ## Modular Configuration Support
//!
//! Configurations can be split into multiple files for better organization:
//! - Use `include = ["file1.toml", "file2.toml"]` to include other config files
//! - Each top-level section must be unique across all files (no duplicates allowed)

mod loader;

use allokit_types::{networks::deserialize_networks, NetworksConfig};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		let message = err.message().to_string();
		ConfigError::Parse(message)
	}
}

/// Main configuration structure for the AlloKit client.
///
/// Contains all sections required to construct the client: the target
/// chain, network settings, account management, and executor behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Configuration for the client instance.
	pub client: ClientConfig,
	/// Network configurations keyed by chain ID.
	#[serde(deserialize_with = "deserialize_networks")]
	pub networks: NetworksConfig,
	/// Configuration for account management.
	pub account: AccountConfig,
	/// Configuration for the transaction executor.
	pub executor: ExecutorSection,
}

/// Configuration for the client instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
	/// Chain ID the client operates against.
	///
	/// All address and interface lookups are scoped to this chain.
	pub chain_id: u64,
}

/// Configuration for account management.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of account implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the transaction executor.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExecutorSection {
	/// Which chain-access implementation to use as primary.
	pub primary: String,
	/// Map of chain-access implementation names to their configurations.
	/// Each implementation has its own configuration format stored as raw TOML values.
	pub implementations: HashMap<String, toml::Value>,
	/// Number of blocks a transaction must be buried under before it is
	/// treated as durably confirmed.
	#[serde(default = "default_confirmations")]
	pub min_confirmations: u64,
	/// Upper bound in seconds on waiting for a confirmation before the
	/// executor reports a timeout.
	#[serde(default = "default_confirmation_timeout_secs")]
	pub confirmation_timeout_secs: u64,
	/// Interval in seconds between receipt polls while awaiting confirmation.
	#[serde(default = "default_poll_interval_secs")]
	pub poll_interval_secs: u64,
}

/// Returns the default confirmation depth.
///
/// The platform targets app chains and L2s with fast finality, so a single
/// confirmation is the default; raise it for probabilistic-finality chains.
fn default_confirmations() -> u64 {
	1
}

/// Returns the default confirmation-await timeout in seconds.
fn default_confirmation_timeout_secs() -> u64 {
	300 // 5 minutes
}

/// Returns the default receipt poll interval in seconds.
fn default_poll_interval_secs() -> u64 {
	7
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB to prevent ReDoS attacks.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024; // 1MB
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = input.to_string();
	let mut replacements = Vec::new();

	for cap in re.captures_iter(input) {
		let full_match = cap.get(0).unwrap();
		let var_name = cap.get(1).unwrap().as_str();
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name) {
			Ok(v) => v,
			Err(_) => {
				if let Some(default) = default_value {
					default.to_string()
				} else {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name
					)));
				}
			},
		};

		replacements.push((full_match.start(), full_match.end(), value));
	}

	// Apply replacements in reverse order to maintain positions
	for (start, end, value) in replacements.iter().rev() {
		result.replace_range(start..end, value);
	}

	Ok(result)
}

impl Config {
	/// Loads configuration from a file.
	///
	/// This method supports modular configuration through include directives:
	/// - `include = ["file1.toml", "file2.toml"]` - Include specific files
	///
	/// Each top-level section must be unique across all configuration files.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = loader::ConfigLoader::new(base_dir);
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;
		loader.load_config(file_name).await
	}

	/// Validates the configuration to ensure all required fields are properly set.
	///
	/// This method checks:
	/// - The configured chain ID has a network entry
	/// - Every network has an RPC URL and a well-formed factory address
	/// - Account and executor sections name a configured primary implementation
	/// - Executor timing values are usable
	fn validate(&self) -> Result<(), ConfigError> {
		// Validate networks config
		if self.networks.is_empty() {
			return Err(ConfigError::Validation(
				"Networks configuration cannot be empty".into(),
			));
		}
		if !self.networks.contains_key(&self.client.chain_id) {
			return Err(ConfigError::Validation(format!(
				"Client chain ID {} has no [networks] entry",
				self.client.chain_id
			)));
		}
		for (chain_id, network) in &self.networks {
			if network.rpc_url.is_empty() {
				return Err(ConfigError::Validation(format!(
					"Network {} must have an rpc_url",
					chain_id
				)));
			}
			if network.pool_factory_address.0.len() != 20 {
				return Err(ConfigError::Validation(format!(
					"Network {} pool_factory_address must be 20 bytes",
					chain_id
				)));
			}
		}

		// Validate account config
		if self.account.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Account primary implementation cannot be empty".into(),
			));
		}
		if !self
			.account
			.implementations
			.contains_key(&self.account.primary)
		{
			return Err(ConfigError::Validation(format!(
				"Account primary implementation '{}' is not configured",
				self.account.primary
			)));
		}

		// Validate executor config
		if self.executor.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Executor primary implementation cannot be empty".into(),
			));
		}
		if !self
			.executor
			.implementations
			.contains_key(&self.executor.primary)
		{
			return Err(ConfigError::Validation(format!(
				"Executor primary implementation '{}' is not configured",
				self.executor.primary
			)));
		}
		if self.executor.poll_interval_secs == 0 {
			return Err(ConfigError::Validation(
				"Executor poll_interval_secs must be greater than zero".into(),
			));
		}
		if self.executor.confirmation_timeout_secs < self.executor.poll_interval_secs {
			return Err(ConfigError::Validation(
				"Executor confirmation_timeout_secs must be at least the poll interval".into(),
			));
		}

		Ok(())
	}
}

impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
