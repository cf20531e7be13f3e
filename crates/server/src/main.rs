//! Simple test harness for the model manager.
//!
//! Loads a CSV interaction export, trains and evaluates every model, and
//! prints the best model's recommendations for a sample user.
//!
//! Usage: `server [path/to/interactions.csv]`

use std::env;
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use data_loader::CsvRepository;
use server::{reload_in_background, ManagerConfig, ModelManager};

const DEFAULT_DATA_FILE: &str = "data/interactions.csv";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,server=debug")),
        )
        .init();

    info!("Starting book recommendation server test harness");

    let data_file = env::args().nth(1).unwrap_or_else(|| DEFAULT_DATA_FILE.to_string());
    info!("Reading interactions from {}", data_file);

    let manager = Arc::new(ModelManager::new(
        CsvRepository::new(&data_file),
        ManagerConfig::default(),
    ));
    let snapshot = reload_in_background(Arc::clone(&manager)).await?;

    for (kind, record) in snapshot.metrics() {
        let line: Vec<String> = record
            .iter()
            .map(|(metric, value)| format!("{}={:.4}", metric, value))
            .collect();
        let weight = snapshot.weights().get(kind).copied().unwrap_or(0.0);
        info!("{:<8} weight={:.3} {}", kind, weight, line.join(" "));
    }
    info!("Best model: {}", snapshot.best());

    let Some(user) = snapshot.mf().users().first() else {
        warn!("No user has training data, nothing to recommend");
        return Ok(());
    };

    let limit = 10;
    let recommendations = snapshot.recommend_best(user, limit)?;
    info!(
        "Received {} recommendations for user {} from {}:",
        recommendations.len(),
        user,
        snapshot.best()
    );
    for (i, rec) in recommendations.iter().enumerate() {
        info!(
            "{}. {} ({}) - Score: {:.3}",
            i + 1,
            rec.item_id,
            snapshot.item_name(&rec.item_id).unwrap_or("Unknown"),
            rec.score
        );
    }

    // A second reload over the same file must reuse the snapshot
    let cached = reload_in_background(Arc::clone(&manager)).await?;
    info!(
        "Second reload served generation {} (retrained: {})",
        cached.generation(),
        !Arc::ptr_eq(&snapshot, &cached)
    );

    Ok(())
}
