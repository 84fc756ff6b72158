//! Resource Cache - command line front end
//!
//! Reads the files named on the command line through the file cache, each
//! one twice, and logs how the cache answered.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use resource_cache::{spawn_cleanup_task, Config, FileCache, SharedCache};

/// Entry point.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the in-memory cache and its cleanup task
/// 4. Serve each requested path twice through the file cache
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resource_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        bail!("usage: resource_cache <path under ROOT_DIRECTORY>...");
    }

    let config = Config::from_env();
    info!(
        "Configuration loaded: root={}, recheck={}, max_entries={}, default_ttl={}s",
        config.root_directory.display(),
        config.recheck_last_modified,
        config.cache_max_entries,
        config.cache_default_ttl
    );

    let cache = SharedCache::from_config(&config);
    let cleanup_handle = spawn_cleanup_task(cache.clone(), config.cleanup_interval);

    let files = FileCache::from_config(&config, Arc::new(cache.clone()))
        .with_context(|| format!("opening root {}", config.root_directory.display()))?;

    for path in &paths {
        for pass in 1..=2 {
            let started = Instant::now();
            match files.get_content(path, None).await {
                Ok(contents) => info!(
                    "{} (pass {}): {} bytes in {:?}",
                    path,
                    pass,
                    contents.len(),
                    started.elapsed()
                ),
                Err(e) => {
                    error!("{}: {}", path, e);
                    break;
                }
            }
        }
    }

    let stats = cache.stats().await;
    info!(
        "Cache stats: hits={}, misses={}, entries={}, bytes={}, hit_rate={:.2}",
        stats.hits,
        stats.misses,
        stats.total_entries,
        stats.total_bytes,
        stats.hit_rate()
    );

    cleanup_handle.abort();
    Ok(())
}
