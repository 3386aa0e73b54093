//! custseg: customer segmentation CLI
//!
//! Entry point that wires command-line subcommands to the segmentation engine.

use anyhow::{Context, Result};
use clap::Parser;
use custseg::cli::{Args, Command};
use custseg::{CustomerRecord, KMeansParams, Segmenter};
use std::time::Instant;

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut segmenter = Segmenter::open(&args.db, KMeansParams::default())
        .with_context(|| format!("failed to open database {}", args.db.display()))?;

    match args.command {
        Command::Add {
            id,
            age,
            income,
            score,
        } => {
            segmenter
                .add_record(&id, age, income, score)
                .context("failed to add customer")?;
            println!("Customer added successfully.");
            print_records(segmenter.current_records());
        }
        Command::List => print_records(segmenter.current_records()),
        Command::Cluster { kmeans, export } => {
            *segmenter.params_mut() = kmeans.params();
            run_clustering(&mut segmenter, kmeans.clusters)?;
            if let Some(path) = export {
                segmenter
                    .save(&path)
                    .with_context(|| format!("failed to export to {}", path.display()))?;
                println!("Data saved to {}", path.display());
            }
        }
        Command::Save { path } => {
            segmenter
                .save(&path)
                .with_context(|| format!("failed to save to {}", path.display()))?;
            println!("Data saved to {}", path.display());
        }
        Command::Load { path } => {
            let imported = segmenter
                .load(&path)
                .with_context(|| format!("error loading data from {}", path.display()))?;
            println!("Loaded {} customers from {}", imported, path.display());
            print_records(segmenter.current_records());
        }
        Command::Predict {
            age,
            income,
            score,
            kmeans,
        } => {
            *segmenter.params_mut() = kmeans.params();
            run_clustering(&mut segmenter, kmeans.clusters)?;
            let cluster = segmenter.predict(age, income, score)?;
            println!("\n✓ Predicted Cluster: {}", cluster);
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Fit, label the table and print the statistics of the run
fn run_clustering(segmenter: &mut Segmenter, k: usize) -> Result<()> {
    let start_time = Instant::now();
    let score = segmenter
        .run_clustering(k)
        .with_context(|| format!("clustering with k={k} failed"))?;
    let elapsed = start_time.elapsed();

    print_records(segmenter.current_records());

    if let Some(summary) = segmenter.cluster_summary() {
        println!("\n=== Cluster Statistics ===");
        let total = segmenter.current_records().len();
        for (i, &size) in summary.sizes.iter().enumerate() {
            let percentage = (size as f64 / total as f64) * 100.0;
            let centroid = summary.centroids.row(i);
            println!(
                "Cluster {}: {} customers ({:.1}%)  centroid: age={:.1}, income={:.2}, score={:.1}",
                i, size, percentage, centroid[0], centroid[1], centroid[2]
            );
        }
        println!("Within-cluster sum of squares: {:.2}", summary.inertia);
        println!(
            "Iterations: {}{}",
            summary.iterations,
            if summary.converged { "" } else { " (not converged)" }
        );
    }

    println!("\nSilhouette Score: {:.2}", score);
    println!("Processing time: {:.2}s", elapsed.as_secs_f64());
    Ok(())
}

fn print_records(records: &[CustomerRecord]) {
    if records.is_empty() {
        println!("No customer data.");
        return;
    }

    println!(
        "{:<12} {:>5} {:>14} {:>14} {:>8}",
        "CustomerID", "Age", "AnnualIncome", "SpendingScore", "Cluster"
    );
    for r in records {
        let cluster = r.cluster.map_or_else(|| "-".to_string(), |c| c.to_string());
        println!(
            "{:<12} {:>5} {:>14.2} {:>14.2} {:>8}",
            r.customer_id, r.age, r.annual_income, r.spending_score, cluster
        );
    }
}
