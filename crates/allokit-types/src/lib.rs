//! Common types module for the AlloKit client.
//!
//! This module defines the core data types shared across the client crates.
//! It provides a centralized location for shared types to ensure consistency
//! between the executor, configuration, and account components.

/// Address and transaction-hash newtypes.
pub mod address;
/// Confirmation and log-entry types produced by transaction execution.
pub mod execution;
/// Network configuration and the deployed-contract address registry.
pub mod networks;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Secure string type for private keys and other secrets.
pub mod secret_string;
/// Utility functions for hex formatting.
pub mod utils;
/// Configuration validation framework for TOML config blocks.
pub mod validation;

// Re-export all types for convenient access
pub use address::*;
pub use execution::*;
pub use networks::{
	deserialize_networks, AddressRegistry, DeployedContracts, NetworkConfig, NetworksConfig,
};
pub use registry::*;
pub use secret_string::*;
pub use utils::{with_0x_prefix, without_0x_prefix};
pub use validation::*;
