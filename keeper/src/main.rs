//! Parasol Expiry Keeper
//!
//! Off-chain service that watches pool clocks and submits purge
//! transactions once a tick boundary passes, so expired covers are
//! released even when no user instruction touches the pool.

mod config;
mod expiry_queue;
mod mirror;
mod tx_builder;

use anyhow::{Context, Result};
use config::Config;
use expiry_queue::{ExpiryQueue, PoolDeadline};
use mirror::PoolClock;
use solana_client::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting Parasol Expiry Keeper");

    // Load configuration
    let config = Config::load().unwrap_or_else(|_| {
        log::warn!("Failed to load config, using default devnet config");
        Config::default_devnet()
    });

    log::info!("Connected to RPC: {}", config.rpc_url);
    log::info!("Monitoring manager program: {}", config.manager_program);

    // Initialize RPC client
    let client = RpcClient::new_with_commitment(
        config.rpc_url.clone(),
        CommitmentConfig::confirmed(),
    );

    // Load keeper wallet
    let keeper = load_keypair(&config.keypair_path)?;
    log::info!("Keeper wallet: {}", keeper.pubkey());

    // The registry is a PDA, so its address follows from the program id
    let (registry, _bump) =
        Pubkey::find_program_address(&[b"registry"], &config.manager_program);
    log::info!("Registry account: {}", registry);

    // Initialize expiry queue
    let mut queue = ExpiryQueue::new();
    let mut pool_keys: Vec<Pubkey> = Vec::new();
    let mut last_directory_refresh: i64 = 0;

    log::info!("Keeper service started. Watching pool clocks...");

    // Main event loop
    let mut interval = time::interval(Duration::from_secs(config.poll_interval_secs));

    loop {
        interval.tick().await;

        let now = unix_now();

        // Refresh the pool directory from the registry
        if now - last_directory_refresh >= config.directory_refresh_secs as i64 {
            match fetch_pool_directory(&client, &registry) {
                Ok(keys) => {
                    log::debug!("Registry lists {} pools", keys.len());
                    pool_keys = keys;
                    last_directory_refresh = now;
                }
                Err(e) => log::error!("Error refreshing pool directory: {}", e),
            }
        }

        // Re-read pool clocks
        if let Err(e) = refresh_clocks(&mut queue, &client, &pool_keys) {
            log::error!("Error refreshing pool clocks: {}", e);
        }

        // Purge pools whose boundary has passed
        if let Err(e) = process_due_pools(&mut queue, &client, &config, &keeper, &registry, now) {
            log::error!("Error processing purges: {}", e);
        }

        // Log queue status
        if !queue.is_empty() {
            log::debug!("Tracked pools: {}", queue.len());

            if let Some(next) = queue.peek() {
                log::debug!(
                    "Next crossing: pool {} at {}",
                    next.pool_id,
                    next.next_crossing
                );
            }
        }
    }
}

/// Fetch the pool directory out of the registry account
fn fetch_pool_directory(client: &RpcClient, registry: &Pubkey) -> Result<Vec<Pubkey>> {
    let account = client
        .get_account(registry)
        .context("Failed to fetch registry account")?;

    let state = parasol_manager::decode_registry(&account.data)
        .map_err(|e| anyhow::anyhow!("Failed to decode registry: {:?}", e))?;

    Ok(state
        .pools
        .iter()
        .map(|entry| Pubkey::new_from_array(entry.key))
        .collect())
}

/// Re-read every pool clock and reschedule its deadline
fn refresh_clocks(
    queue: &mut ExpiryQueue,
    client: &RpcClient,
    pool_keys: &[Pubkey],
) -> Result<()> {
    for chunk in pool_keys.chunks(100) {
        let accounts = client
            .get_multiple_accounts(chunk)
            .context("Failed to fetch pool accounts")?;

        for (key, maybe_account) in chunk.iter().zip(accounts) {
            let Some(account) = maybe_account else {
                log::warn!("Pool account {} not found", key);
                queue.remove(key);
                continue;
            };

            let clock = match PoolClock::parse(&account.data) {
                Ok(clock) => clock,
                Err(e) => {
                    log::warn!("Failed to parse pool {}: {}", key, e);
                    continue;
                }
            };

            match clock.next_crossing() {
                Some(at) => queue.push(PoolDeadline {
                    pool: *key,
                    pool_id: clock.pool_id,
                    next_crossing: at,
                    remaining_covers: clock.remaining_covers,
                    last_update: clock.last_update,
                }),
                // Nothing left to expire
                None => {
                    queue.remove(key);
                }
            }
        }
    }

    Ok(())
}

/// Submit purges for pools past their boundary
fn process_due_pools(
    queue: &mut ExpiryQueue,
    client: &RpcClient,
    config: &Config,
    keeper: &Keypair,
    registry: &Pubkey,
    now: i64,
) -> Result<()> {
    let due = queue.get_due(now, config.crossing_grace_secs);

    if due.is_empty() {
        log::debug!("No pools due for a purge");
        return Ok(());
    }

    log::info!("Found {} pools past a tick boundary", due.len());

    // Process up to max batch size
    let batch_size = config.max_purges_per_batch.min(due.len());

    for deadline in due.iter().take(batch_size) {
        log::info!(
            "Purging pool {} ({} covers outstanding, boundary at {})",
            deadline.pool_id,
            deadline.remaining_covers,
            deadline.next_crossing
        );

        match execute_purge(client, config, keeper, registry, &deadline.pool) {
            Ok(signature) => {
                log::info!("Purge submitted: {}", signature);

                // Rescheduled from the fresh clock on the next pass
                queue.remove(&deadline.pool);
            }
            Err(e) => {
                log::error!("Failed to purge pool {}: {}", deadline.pool_id, e);
            }
        }
    }

    Ok(())
}

/// Execute a single purge
fn execute_purge(
    client: &RpcClient,
    config: &Config,
    keeper: &Keypair,
    registry: &Pubkey,
    pool: &Pubkey,
) -> Result<String> {
    let recent_blockhash = client
        .get_latest_blockhash()
        .context("Failed to fetch recent blockhash")?;

    let transaction = tx_builder::build_purge_transaction(
        &config.manager_program,
        registry,
        pool,
        config.max_crossings_per_purge,
        keeper,
        recent_blockhash,
    );

    let signature = client
        .send_and_confirm_transaction(&transaction)
        .context("Failed to submit purge transaction")?;

    Ok(signature.to_string())
}

/// Load keeper keypair from file
fn load_keypair(path: &str) -> Result<Keypair> {
    let expanded_path = shellexpand::tilde(path);
    let bytes = std::fs::read(expanded_path.as_ref())
        .context(format!("Failed to read keypair from {}", path))?;

    let keypair = if bytes[0] == b'[' {
        // JSON format
        let json_data: Vec<u8> = serde_json::from_slice(&bytes)
            .context("Failed to parse keypair JSON")?;
        Keypair::try_from(&json_data[..])
            .context("Failed to create keypair from bytes")?
    } else {
        // Binary format
        Keypair::try_from(&bytes[..])
            .context("Failed to create keypair from bytes")?
    };

    Ok(keypair)
}

/// Current unix time from the system clock
fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
