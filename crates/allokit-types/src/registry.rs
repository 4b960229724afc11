//! Registry trait for self-registering implementations.
//!
//! This module provides the base trait that pluggable implementations
//! (chain access, accounts) implement to declare their configuration name
//! and factory function.

/// Base trait for implementation registries.
///
/// Each implementation module must provide a Registry struct that
/// implements this trait, tying the name used in configuration files to
/// the factory that constructs the implementation.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation.
	///
	/// This should match the key used in the TOML configuration, for example:
	/// - "evm_alloy" for executor.implementations.evm_alloy
	/// - "local" for account.implementations.local
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
