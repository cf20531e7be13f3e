use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::{CsvRepository, ItemId, UserId};
use evaluation::Metric;
use models::{ModelKind, ScoredItem};
use server::{reload_in_background, ManagerConfig, ModelChoice, ModelManager, ModelSnapshot};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

/// BookRecs - Book Recommendation Engine
#[derive(Parser)]
#[command(name = "book-recs")]
#[command(about = "Book recommendations from collaborative filtering and matrix factorization", long_about = None)]
struct Cli {
    /// CSV export of user/book interactions (userId,itemId,rating,implicitScore)
    #[arg(short, long, default_value = "data/interactions.csv")]
    data_file: PathBuf,

    /// JSON file with retrain settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the metric the best model is chosen by (e.g. "NDCG@K", "RMSE")
    #[arg(long)]
    criterion: Option<Metric>,

    /// Override the ranking-metric cutoff
    #[arg(long)]
    top_k: Option<usize>,

    /// Override the split and factor-initialization seed
    #[arg(long)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get book recommendations for a user
    Recommend {
        /// User ID to get recommendations for
        #[arg(long)]
        user_id: UserId,

        /// Number of recommendations to return
        #[arg(long, default_value = "10")]
        limit: usize,

        /// best, ensemble, user_cf, item_cf or mf
        #[arg(long, default_value = "best")]
        model: ModelChoice,

        /// Explicit/implicit blend weight (CF models only)
        #[arg(long)]
        alpha: Option<f64>,
    },

    /// Predict the rating a user would give a book
    Predict {
        #[arg(long)]
        user_id: UserId,

        #[arg(long)]
        item_id: ItemId,

        /// best, user_cf, item_cf or mf
        #[arg(long, default_value = "best")]
        model: ModelChoice,
    },

    /// Show every model's metrics, the ensemble weights and the best model
    Evaluate,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    // Train and evaluate (this may take a moment)
    println!("Training models on {}...", cli.data_file.display());
    let start = Instant::now();
    let manager = Arc::new(ModelManager::new(
        CsvRepository::new(&cli.data_file),
        config,
    ));
    let snapshot = reload_in_background(manager)
        .await
        .context("Failed to train models")?;
    println!(
        "{} Trained on {} interactions in {:?}",
        "✓".green(),
        snapshot.rows(),
        start.elapsed()
    );

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Recommend {
            user_id,
            limit,
            model,
            alpha,
        } => handle_recommend(&snapshot, &user_id, limit, model, alpha)?,
        Commands::Predict {
            user_id,
            item_id,
            model,
        } => handle_predict(&snapshot, &user_id, &item_id, model)?,
        Commands::Evaluate => handle_evaluate(&snapshot),
    }

    Ok(())
}

/// Config file (if any) with command-line overrides applied
fn load_config(cli: &Cli) -> Result<ManagerConfig> {
    let mut config = match &cli.config {
        Some(path) => ManagerConfig::from_json_file(path)?,
        None => ManagerConfig::default(),
    };
    if let Some(criterion) = cli.criterion {
        config = config.with_criterion(criterion);
    }
    if let Some(top_k) = cli.top_k {
        config = config.with_top_k(top_k);
    }
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }
    Ok(config)
}

/// Handle the 'recommend' command
fn handle_recommend(
    snapshot: &ModelSnapshot,
    user_id: &str,
    limit: usize,
    model: ModelChoice,
    alpha: Option<f64>,
) -> Result<()> {
    let recommendations = match alpha {
        Some(alpha) => snapshot.recommend_with_alpha(model, user_id, limit, alpha)?,
        None => snapshot.recommend(model, user_id, limit)?,
    };

    if recommendations.is_empty() {
        warn!("No recommendations for user {}", user_id);
    }
    print_recommendations(snapshot, &recommendations, &served_by(snapshot, model), user_id);
    Ok(())
}

/// Handle the 'predict' command
fn handle_predict(
    snapshot: &ModelSnapshot,
    user_id: &str,
    item_id: &str,
    model: ModelChoice,
) -> Result<()> {
    let prediction = snapshot.predict(model, user_id, item_id)?;
    let served_by = served_by(snapshot, model);
    match prediction {
        Some(score) => println!(
            "{} {} -> {}: {:.3}",
            format!("[{}]", served_by).bold().blue(),
            user_id,
            item_id,
            score
        ),
        None => println!(
            "{} {} -> {}: {}",
            format!("[{}]", served_by).bold().blue(),
            user_id,
            item_id,
            "no prediction (unknown user or book)".yellow()
        ),
    }
    Ok(())
}

/// Handle the 'evaluate' command
fn handle_evaluate(snapshot: &ModelSnapshot) {
    println!("{}", "Model metrics:".bold().blue());
    print!("  {:<8}", "model");
    for metric in Metric::ALL {
        print!(" {:>12}", metric);
    }
    println!(" {:>8}", "weight");

    for kind in ModelKind::ALL {
        let record = snapshot.metrics().get(&kind);
        let name = format!("{:<8}", kind);
        if kind == snapshot.best() {
            print!("  {}", name.green().bold());
        } else {
            print!("  {}", name);
        }
        for metric in Metric::ALL {
            match record.and_then(|r| r.get(metric)) {
                Some(value) => print!(" {:>12.4}", value),
                None => print!(" {:>12}", "-"),
            }
        }
        let weight = snapshot.weights().get(&kind).copied().unwrap_or(0.0);
        println!(" {:>8.3}", weight);
    }

    println!(
        "{}Best model: {}",
        "• ".green(),
        snapshot.best().to_string().bold()
    );
    println!("{}Dataset fingerprint: {}", "• ".cyan(), snapshot.fingerprint());
}

fn served_by(snapshot: &ModelSnapshot, model: ModelChoice) -> String {
    match model {
        ModelChoice::Best => format!("best: {}", snapshot.best()),
        other => other.to_string(),
    }
}

/// Helper function to format and print recommendations
fn print_recommendations(
    snapshot: &ModelSnapshot,
    recommendations: &[ScoredItem],
    served_by: &str,
    user_id: &str,
) {
    println!(
        "{}",
        format!("Book recommendations for {} ({}):", user_id, served_by)
            .bold()
            .blue()
    );
    for (i, rec) in recommendations.iter().enumerate() {
        println!(
            "{}. {} {} - Score: {:.3}",
            (i + 1).to_string().green(),
            rec.item_id,
            snapshot.item_name(&rec.item_id).unwrap_or("Unknown").dimmed(),
            rec.score
        );
    }
}
