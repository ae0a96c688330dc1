/// Wallet Mock Server
///
/// A lightweight stand-in for a browser wallet: accounts, chain switching
/// and a ChronoLog contract, all in memory. Point `CHRONOLOG_PROVIDER_URL`
/// at it for local development.

use alloy_primitives::Address;
use anyhow::{Context, Result};
use std::env;

use wallet_mock::{run_server, shared, MockChain, CONTRACT_CHAIN_ID};

#[derive(Debug)]
struct Config {
    accounts: Vec<Address>,
    chain_id: u64,
    contract: Option<Address>,

    // Server
    server_host: String,
    server_port: u16,
}

impl Config {
    fn from_env() -> Result<Self> {
        dotenv::dotenv().ok(); // Load .env file if present

        let accounts = env::var("MOCK_ACCOUNTS")
            .unwrap_or_else(|_| {
                "0xa1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1,0xb0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0"
                    .to_string()
            })
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<Address>().with_context(|| format!("Invalid account '{}'", s)))
            .collect::<Result<Vec<_>>>()?;

        let chain_id = env::var("MOCK_CHAIN_ID")
            .unwrap_or_else(|_| CONTRACT_CHAIN_ID.to_string())
            .parse()
            .context("Invalid MOCK_CHAIN_ID")?;

        let contract = match env::var("MOCK_CONTRACT_ADDRESS") {
            Ok(raw) => Some(raw.parse().context("Invalid MOCK_CONTRACT_ADDRESS")?),
            Err(_) => None,
        };

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8545".to_string())
            .parse()
            .context("Invalid SERVER_PORT")?;

        Ok(Self {
            accounts,
            chain_id,
            contract,
            server_host,
            server_port,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting Wallet Mock Server...");

    let config = Config::from_env().context("Failed to load configuration")?;

    log::info!("Accounts: {:?}", config.accounts);
    log::info!("Starting chain: {}", config.chain_id);

    let mut chain = MockChain::new(config.accounts, config.chain_id);
    if let Some(contract) = config.contract {
        chain = chain.with_contract(contract);
    }

    run_server(shared(chain), config.server_host, config.server_port)
        .await
        .context("Server error")?;

    Ok(())
}
