//! Command-line entry point for the AlloKit client.
//!
//! One invocation performs one platform operation: it loads configuration,
//! constructs the account, chain access, and executor, runs the requested
//! operation, and prints the structured result.

use allokit_account::AccountService;
use allokit_client::{AlloKitClient, PoolConfig, ReviewStatus};
use allokit_config::Config;
use allokit_executor::{Executor, ExecutorSettings};
use allokit_types::{without_0x_prefix, AddressRegistry, TransactionHash};
use alloy_primitives::{Address, Bytes, U256};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Command-line arguments for the AlloKit client.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	#[command(subcommand)]
	command: Command,
}

/// Registration review outcome.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum StatusArg {
	Pending,
	Approved,
	Rejected,
}

impl From<StatusArg> for ReviewStatus {
	fn from(status: StatusArg) -> Self {
		match status {
			StatusArg::Pending => ReviewStatus::Pending,
			StatusArg::Approved => ReviewStatus::Approved,
			StatusArg::Rejected => ReviewStatus::Rejected,
		}
	}
}

/// Pool configuration flags shared by deploy-pool and initialize-pool.
#[derive(ClapArgs, Debug)]
struct PoolConfigArgs {
	/// Pool owner; defaults to the configured account
	#[arg(long)]
	owner: Option<Address>,

	/// Additional administrators, comma separated
	#[arg(long, value_delimiter = ',')]
	admins: Vec<Address>,

	/// Token accepted for allocations
	#[arg(long)]
	allocation_token: Address,

	/// Token paid out on distribution
	#[arg(long)]
	distribution_token: Address,

	/// Maximum amount the pool accepts
	#[arg(long, default_value = "0")]
	max_amount: U256,

	/// Schedule boundaries as unix timestamps, comma separated
	#[arg(long, value_delimiter = ',')]
	timestamps: Vec<u64>,

	/// Pool metadata location
	#[arg(long)]
	metadata_uri: String,
}

impl PoolConfigArgs {
	fn into_config(self, default_owner: Address) -> PoolConfig {
		PoolConfig {
			owner: self.owner.unwrap_or(default_owner),
			admins: self.admins,
			allocation_token: self.allocation_token,
			distribution_token: self.distribution_token,
			max_amount: self.max_amount,
			timestamps: self.timestamps,
			metadata_uri: self.metadata_uri,
		}
	}
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Deploy a new pool through the factory
	DeployPool {
		/// Strategy implementation the factory clones
		#[arg(long)]
		implementation: Address,
		#[command(flatten)]
		config: PoolConfigArgs,
		/// Extra initialization data
		#[arg(long, default_value = "0x")]
		data: Bytes,
	},
	/// Initialize (or reconfigure) a deployed pool
	InitializePool {
		#[arg(long)]
		pool: Address,
		#[command(flatten)]
		config: PoolConfigArgs,
		#[arg(long, default_value = "0x")]
		data: Bytes,
	},
	/// Register a project with a pool
	Register {
		#[arg(long)]
		pool: Address,
		#[arg(long)]
		project: Address,
		#[arg(long)]
		metadata_uri: String,
	},
	/// Review a registration
	Review {
		#[arg(long)]
		pool: Address,
		#[arg(long)]
		project: Address,
		#[arg(long, value_enum)]
		status: StatusArg,
		#[arg(long, default_value = "")]
		metadata_uri: String,
	},
	/// Update a registration's metadata
	Update {
		#[arg(long)]
		pool: Address,
		#[arg(long)]
		project: Address,
		#[arg(long)]
		metadata_uri: String,
	},
	/// Allocate tokens to recipients through a pool
	Allocate {
		#[arg(long)]
		pool: Address,
		#[arg(long, value_delimiter = ',')]
		recipients: Vec<Address>,
		#[arg(long, value_delimiter = ',')]
		amounts: Vec<U256>,
		#[arg(long)]
		token: Address,
	},
	/// Distribute tokens from a pool to recipients
	Distribute {
		#[arg(long)]
		pool: Address,
		#[arg(long, value_delimiter = ',')]
		recipients: Vec<Address>,
		#[arg(long, value_delimiter = ',')]
		amounts: Vec<U256>,
		#[arg(long)]
		token: Address,
	},
	/// Fund a pool
	Deposit {
		#[arg(long)]
		pool: Address,
		#[arg(long)]
		amount: U256,
		#[arg(long)]
		token: Address,
	},
	/// Withdraw pool funds to the configured account
	Withdraw {
		#[arg(long)]
		pool: Address,
		#[arg(long)]
		amount: U256,
		#[arg(long)]
		token: Address,
	},
	/// Look up the confirmation for a submitted transaction
	Status {
		/// Transaction hash
		hash: String,
	},
}

/// Main entry point for the AlloKit client.
///
/// This function:
/// 1. Parses command-line arguments
/// 2. Initializes logging infrastructure
/// 3. Loads configuration from file
/// 4. Builds the client with the configured implementations
/// 5. Runs the requested operation and prints its result
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let cli = Cli::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = cli.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt().with_env_filter(env_filter).init();

	// Load configuration
	let config_path = cli
		.config
		.to_str()
		.ok_or("Configuration path is not valid UTF-8")?;
	let config = Config::from_file(config_path).await?;
	tracing::info!(chain_id = config.client.chain_id, "Loaded configuration");

	let client = build_client(&config).await?;

	run_command(&client, cli.command).await
}

/// Builds the client from configuration: account, chain access, executor.
async fn build_client(config: &Config) -> Result<AlloKitClient, Box<dyn std::error::Error>> {
	// Account
	let account_factories: HashMap<_, _> =
		allokit_account::get_all_implementations().into_iter().collect();
	let account_factory = account_factories
		.get(config.account.primary.as_str())
		.ok_or_else(|| format!("Unknown account implementation '{}'", config.account.primary))?;
	let account_config = config
		.account
		.implementations
		.get(&config.account.primary)
		.ok_or_else(|| {
			format!(
				"Account implementation '{}' is not configured",
				config.account.primary
			)
		})?;
	let account = AccountService::new(account_factory(account_config)?);
	let sender = account.address().await?;
	tracing::info!(sender = %sender, "Using account");

	// Chain access
	let chain_factories: HashMap<_, _> =
		allokit_executor::get_all_implementations().into_iter().collect();
	let chain_factory = chain_factories
		.get(config.executor.primary.as_str())
		.ok_or_else(|| format!("Unknown executor implementation '{}'", config.executor.primary))?;
	let chain_config = config
		.executor
		.implementations
		.get(&config.executor.primary)
		.ok_or_else(|| {
			format!(
				"Executor implementation '{}' is not configured",
				config.executor.primary
			)
		})?;
	let chain = chain_factory(chain_config, &config.networks, &account.private_key())?;

	// Executor and client
	let settings = ExecutorSettings {
		min_confirmations: config.executor.min_confirmations,
		confirmation_timeout: Duration::from_secs(config.executor.confirmation_timeout_secs),
		poll_interval: Duration::from_secs(config.executor.poll_interval_secs),
	};
	let executor = Executor::new(Arc::from(chain), sender, settings);
	let registry = AddressRegistry::from_networks(&config.networks);

	Ok(AlloKitClient::new(
		executor,
		config.client.chain_id,
		&registry,
	)?)
}

/// Dispatches one operation and prints its result.
async fn run_command(
	client: &AlloKitClient,
	command: Command,
) -> Result<(), Box<dyn std::error::Error>> {
	match command {
		Command::DeployPool {
			implementation,
			config,
			data,
		} => {
			let pool_config = config.into_config(client.sender()?);
			let pool = client.deploy_pool(implementation, &pool_config, data).await?;
			println!("pool: {}", pool);
		},
		Command::InitializePool { pool, config, data } => {
			let pool_config = config.into_config(client.sender()?);
			client.initialize_pool(pool, &pool_config, data).await?;
			println!("pool {} initialized", pool);
		},
		Command::Register {
			pool,
			project,
			metadata_uri,
		} => {
			let event = client
				.register(pool, project, &metadata_uri, Bytes::new())
				.await?;
			println!("{}", event);
		},
		Command::Review {
			pool,
			project,
			status,
			metadata_uri,
		} => {
			let event = client
				.review(pool, project, status.into(), &metadata_uri, Bytes::new())
				.await?;
			println!("{}", event);
		},
		Command::Update {
			pool,
			project,
			metadata_uri,
		} => {
			let event = client
				.update(pool, project, &metadata_uri, Bytes::new())
				.await?;
			println!("{}", event);
		},
		Command::Allocate {
			pool,
			recipients,
			amounts,
			token,
		} => {
			let event = client
				.allocate(pool, recipients, amounts, token, vec![])
				.await?;
			println!("{}", event);
		},
		Command::Distribute {
			pool,
			recipients,
			amounts,
			token,
		} => {
			let event = client
				.distribute(pool, recipients, amounts, token, vec![])
				.await?;
			println!("{}", event);
		},
		Command::Deposit { pool, amount, token } => {
			let event = client.deposit(pool, amount, token).await?;
			println!("{}", event);
		},
		Command::Withdraw { pool, amount, token } => {
			let event = client.withdraw(pool, amount, token).await?;
			println!("{}", event);
		},
		Command::Status { hash } => {
			let bytes = hex::decode(without_0x_prefix(&hash))?;
			match client.transaction_status(&TransactionHash(bytes)).await? {
				Some(confirmation) => {
					println!("{}", serde_json::to_string_pretty(&confirmation)?)
				},
				None => println!("not yet included (or unknown to this network)"),
			}
		},
	}

	Ok(())
}
