//! Mini Cache soak runner
//!
//! Hammers a cache built from environment configuration with concurrent
//! readers and writers, then prints the final statistics as JSON.

use std::env;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mini_cache::{BackgroundPruner, Cache, CacheConfig, RemovalCause};

/// Main entry point for the soak runner.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load cache configuration from environment variables
/// 3. Create the cache and attach a counting removal listener
/// 4. Start the background pruner if an interval is configured
/// 5. Run worker threads until the duration elapses or Ctrl+C
/// 6. Stop the pruner and print statistics
///
/// # Environment Variables
/// All `CACHE_*` variables read by [`CacheConfig::from_env`], plus:
/// - `SOAK_WORKERS` - Number of worker threads (default: 4)
/// - `SOAK_SECONDS` - Run time in seconds (default: 10)
/// - `SOAK_KEY_SPACE` - Number of distinct keys (default: 4x capacity)
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mini_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Mini Cache soak run");

    let config = CacheConfig::from_env().context("invalid cache configuration")?;
    let workers: usize = env_or("SOAK_WORKERS", 4)?;
    let seconds: u64 = env_or("SOAK_SECONDS", 10)?;
    let key_space: u64 = env_or("SOAK_KEY_SPACE", (config.capacity.max(1) as u64) * 4)?;
    info!(
        "Configuration loaded: capacity={}, default_ttl={:?}, policy={}, listener={}, workers={}, seconds={}",
        config.capacity, config.default_ttl, config.eviction_policy, config.listener_mode, workers, seconds
    );

    let cache: Arc<Cache<u64, String>> = Arc::new(Cache::with_config(config)?);

    let notifications = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&notifications);
    cache.set_removal_listener(move |_key: u64, _value: String, _cause: RemovalCause| {
        counter.fetch_add(1, Ordering::Relaxed);
    });

    let pruner = BackgroundPruner::from_config(cache.clone());
    if pruner.is_some() {
        info!("Background pruner started");
    }

    let running = Arc::new(AtomicBool::new(true));
    let mut handles = Vec::with_capacity(workers);
    for worker in 0..workers {
        let cache = Arc::clone(&cache);
        let running = Arc::clone(&running);
        handles.push(tokio::task::spawn_blocking(move || {
            run_worker(worker as u64, &cache, &running, key_space)
        }));
    }

    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs(seconds)) => {
            info!("Soak duration elapsed");
        }
        _ = shutdown_signal() => {}
    }
    running.store(false, Ordering::Relaxed);

    let mut operations = 0u64;
    for handle in handles {
        operations += handle.await.context("worker panicked")?;
    }

    if let Some(pruner) = pruner {
        pruner.stop().await;
        info!("Background pruner stopped");
    }

    info!(
        "Completed {} operations, {} removal notifications",
        operations,
        notifications.load(Ordering::Relaxed)
    );
    println!("{}", serde_json::to_string_pretty(&cache.stats())?);

    Ok(())
}

/// One worker's read/write mix. Returns the number of operations performed.
fn run_worker(worker: u64, cache: &Cache<u64, String>, running: &AtomicBool, key_space: u64) -> u64 {
    let started = Instant::now();
    let mut ops = 0u64;
    // xorshift keeps the key stream cheap and distinct per worker
    let mut state = 0x9E37_79B9_7F4A_7C15u64 ^ (worker + 1);

    while running.load(Ordering::Relaxed) {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let key = state % key_space.max(1);

        // high bits pick the operation so it stays independent of the key
        match (state >> 32) % 10 {
            0..=5 => {
                cache.get(&key);
            }
            6..=8 => {
                cache.put(key, format!("w{worker}-{ops}"));
            }
            _ => {
                cache.remove(&key);
            }
        }
        ops += 1;
    }

    info!(
        "Worker {} finished {} ops in {:?}",
        worker,
        ops,
        started.elapsed()
    );
    ops
}

fn env_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {name}: {raw:?}")),
        Err(_) => Ok(default),
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, stopping soak run...");
        }
        _ = terminate => {
            info!("Received SIGTERM, stopping soak run...");
        }
    }
}
