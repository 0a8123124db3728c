//! Environment-driven settings, resolved once at startup.
//!
//! A missing or unparseable required variable is fatal before the loop
//! starts; nothing here is re-read mid-run.

use alloy_primitives::Address;
use anyhow::{bail, Context, Result};
use std::env;
use std::time::Duration;
use vaultward_engine::EngineConfig;
use vaultward_oracle::client::OracleConfig;
use vaultward_venue::VenueAuth;

#[derive(Debug, Clone)]
pub struct Settings {
    pub rpc_url: String,
    pub engine: EngineConfig,
    pub oracle: OracleConfig,
    pub venue_url: String,
    pub venue_auth: VenueAuth,
    pub venue_max_attempts: u32,
    pub venue_retry_delay: Duration,
}

fn required(name: &str) -> Result<String> {
    env::var(name).with_context(|| format!("{name} must be set"))
}

fn required_address(name: &str) -> Result<Address> {
    required(name)?
        .parse()
        .with_context(|| format!("{name} is not a valid address"))
}

fn optional_parse<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => match raw.parse() {
            Ok(value) => Ok(value),
            Err(err) => bail!("{name} is not valid: {err}"),
        },
        Err(_) => Ok(default),
    }
}

fn tracked_assets() -> Result<Vec<Address>> {
    let Ok(raw) = env::var("VAULTWARD_TRACKED_ASSETS") else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry
                .parse()
                .with_context(|| format!("VAULTWARD_TRACKED_ASSETS entry {entry} is not a valid address"))
        })
        .collect()
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let engine = EngineConfig {
            vault: required_address("VAULTWARD_VAULT")?,
            module: required_address("VAULTWARD_MODULE")?,
            signer: required_address("VAULTWARD_SIGNER")?,
            tracked_assets: tracked_assets()?,
            watch_native: optional_parse("VAULTWARD_WATCH_NATIVE", true)?,
            router: required_address("VAULTWARD_ROUTER")?,
            conditional_tokens: required_address("VAULTWARD_CONDITIONAL_TOKENS")?,
            max_cycles: optional_parse("VAULTWARD_MAX_CYCLES", 0u32)?,
            cycle_delay: Duration::from_secs(optional_parse("VAULTWARD_CYCLE_DELAY_SECS", 30u64)?),
            reconciliation_timeout_secs: optional_parse(
                "VAULTWARD_RECONCILIATION_TIMEOUT_SECS",
                3_600u64,
            )?,
        };
        Ok(Self {
            rpc_url: required("VAULTWARD_RPC_URL")?,
            engine,
            oracle: OracleConfig {
                url: required("VAULTWARD_ORACLE_URL")?,
                api_key: required("VAULTWARD_ORACLE_API_KEY")?,
                model: required("VAULTWARD_ORACLE_MODEL")?,
            },
            venue_url: required("VAULTWARD_VENUE_URL")?,
            venue_auth: VenueAuth {
                api_key: required("VAULTWARD_VENUE_API_KEY")?,
                secret: required("VAULTWARD_VENUE_SECRET")?,
                passphrase: required("VAULTWARD_VENUE_PASSPHRASE")?,
            },
            venue_max_attempts: optional_parse("VAULTWARD_VENUE_MAX_ATTEMPTS", 3u32)?,
            venue_retry_delay: Duration::from_millis(optional_parse(
                "VAULTWARD_VENUE_RETRY_DELAY_MS",
                1_000u64,
            )?),
        })
    }
}
