//! Command-line interface definitions and argument parsing

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use crate::config::KMeansParams;
use crate::features::FeatureScaling;

/// Customer segmentation CLI using K-Means clustering
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the SQLite customer database
    #[arg(long, env = "CUSTSEG_DB", default_value = "customer_data.db")]
    pub db: PathBuf,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate and store a new customer
    Add {
        #[arg(long)]
        id: String,
        #[arg(long, allow_negative_numbers = true)]
        age: i64,
        #[arg(long, allow_negative_numbers = true)]
        income: f64,
        #[arg(long, allow_negative_numbers = true)]
        score: f64,
    },

    /// Print every stored customer
    List,

    /// Segment all customers and report the silhouette score
    Cluster {
        #[command(flatten)]
        kmeans: KMeansArgs,

        /// Also export the labelled table to this CSV file
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Export all customers to a CSV file
    Save { path: PathBuf },

    /// Merge customers from a CSV file into the database
    Load { path: PathBuf },

    /// Fit a model and report which segment a new customer would fall into
    Predict {
        #[arg(long, allow_negative_numbers = true)]
        age: i64,
        #[arg(long, allow_negative_numbers = true)]
        income: f64,
        #[arg(long, allow_negative_numbers = true)]
        score: f64,

        #[command(flatten)]
        kmeans: KMeansArgs,
    },
}

/// K-Means tuning flags shared by the clustering commands
#[derive(ClapArgs, Debug, Clone)]
pub struct KMeansArgs {
    /// Number of clusters for K-Means
    #[arg(short = 'k', long, default_value = "3")]
    pub clusters: usize,

    /// Maximum iterations for K-Means algorithm
    #[arg(long, default_value = "300")]
    pub max_iters: usize,

    /// Tolerance for K-Means convergence
    #[arg(long, default_value = "1e-4")]
    pub tolerance: f64,

    /// Seed for centroid initialization
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Cluster on raw values instead of standardized features
    #[arg(long)]
    pub raw: bool,
}

impl KMeansArgs {
    pub fn params(&self) -> KMeansParams {
        KMeansParams {
            n_clusters: self.clusters,
            max_iters: self.max_iters,
            tolerance: self.tolerance,
            seed: self.seed,
            scaling: if self.raw {
                FeatureScaling::Raw
            } else {
                FeatureScaling::Standard
            },
        }
    }
}
