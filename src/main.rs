//! Insights CLI: render every dashboard widget from an offline export.
//!
//! Usage: `insights <config.json> <snapshot.json>`
//!
//! Prints the widget snapshots as JSON on stdout. Logging goes to stderr and
//! is controlled by `RUST_LOG`.

use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::Utc;

use insights_lib::cache::TtlCache;
use insights_lib::widgets::{render_dashboard, WidgetContext};
use insights_lib::{DashboardInput, InMemorySampleStore, InsightsConfig};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [config_path, snapshot_path] = args.as_slice() else {
        bail!("usage: insights <config.json> <snapshot.json>");
    };

    let config = InsightsConfig::load(&PathBuf::from(config_path))
        .with_context(|| format!("Failed to load config {}", config_path))?;
    let input = DashboardInput::load(&PathBuf::from(snapshot_path))
        .with_context(|| format!("Failed to load snapshot {}", snapshot_path))?;

    let store = InMemorySampleStore::from_samples(input.samples);
    log::info!(
        "Loaded {} prefixes, {} devices, {} samples across {} entities",
        input.inventory.prefixes.len(),
        input.inventory.devices.len(),
        store.sample_count(),
        store.entity_count()
    );

    let ctx = WidgetContext {
        store: &store,
        config: &config,
        inventory: &input.inventory,
        now: input.generated_at.unwrap_or_else(Utc::now),
    };
    let cache = TtlCache::new(config.enable_caching);
    let snapshots = render_dashboard(&ctx, &cache);

    println!("{}", serde_json::to_string_pretty(&snapshots)?);

    let failed: Vec<&str> = snapshots
        .iter()
        .filter(|s| s.error.is_some())
        .map(|s| s.slug.as_str())
        .collect();
    if !failed.is_empty() {
        bail!("widgets failed: {}", failed.join(", "));
    }
    Ok(())
}
