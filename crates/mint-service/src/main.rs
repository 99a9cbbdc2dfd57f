//! Main entry point for the signature mint service.
//!
//! Loads configuration, deploys the token and the signature-mint protocol on
//! the local execution environment and, when enabled, serves the HTTP API for
//! issuing and submitting mint authorizations.

use clap::Parser;
use mint_config::Config;
use std::path::PathBuf;
use std::sync::Arc;

mod apis;
mod factory_registry;
mod server;

/// Command-line arguments for the signature mint service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml", env = "MINT_CONFIG")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started signature mint service");

	let config_path = args.config.to_string_lossy();
	let config = Config::from_file(&config_path).await?;
	tracing::info!(
		chain_id = config.protocol.chain_id,
		token = %config.token.symbol,
		"Loaded configuration [{}]",
		config_path
	);

	let engine = Arc::new(factory_registry::build_engine_from_config(config.clone()).await?);
	let event_logger = engine.spawn_event_logger();

	match config.api.filter(|api| api.enabled) {
		Some(api_config) => {
			tokio::select! {
				result = server::start_server(api_config, Arc::clone(&engine)) => {
					tracing::info!("API server finished");
					result?;
				}
				_ = tokio::signal::ctrl_c() => {
					tracing::info!("Received shutdown signal");
				}
			}
		},
		None => {
			tracing::info!("API disabled, running until interrupted");
			tokio::signal::ctrl_c().await?;
		},
	}

	event_logger.abort();
	tracing::info!("Stopped signature mint service");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::tempdir;

	#[test]
	fn test_args_default_values() {
		let args = Args::parse_from(["signature-mint"]);

		assert_eq!(args.config, PathBuf::from("config.toml"));
		assert_eq!(args.log_level, "info");
	}

	#[test]
	fn test_args_custom_values() {
		let args = Args::parse_from(["signature-mint", "-c", "custom.toml", "-l", "debug"]);

		assert_eq!(args.config, PathBuf::from("custom.toml"));
		assert_eq!(args.log_level, "debug");
	}

	#[tokio::test]
	async fn test_build_engine_from_file_config() {
		let temp_dir = tempdir().expect("Failed to create temp dir");
		let config_path = temp_dir.path().join("test_config.toml");
		let storage_path = temp_dir.path().join("storage");

		let config_content = format!(
			r#"
[protocol]
chain_id = 31337
deployer = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"

[token]
name = "Test Token"
symbol = "TST"

[storage]
primary = "file"
[storage.implementations.file]
storage_path = "{}"

[account]
primary = "local"
[account.implementations.local]
private_key = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d"
"#,
			storage_path.display()
		);
		std::fs::write(&config_path, config_content).expect("Failed to write config");

		let config = Config::from_file(config_path.to_str().unwrap())
			.await
			.expect("Failed to load config");
		let engine = factory_registry::build_engine_from_config(config)
			.await
			.expect("Failed to build engine");

		assert_eq!(engine.token().symbol(), "TST");
		assert!(engine.issuer().is_some());
	}
}
