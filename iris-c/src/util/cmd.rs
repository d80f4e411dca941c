use clap::{Parser, Subcommand};
use common::FeatureVector;
use std::path::PathBuf;

use crate::client::DEFAULT_BASE_URL;

#[derive(Parser, Debug)]
#[command(author, version, about = "Iris classifier client")]
pub struct Args {
    /// Base URL of the prediction service
    #[arg(short, long, env = "IRIS_API_URL", default_value = DEFAULT_BASE_URL)]
    pub url: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Classify one flower from its measurements (cm)
    Predict {
        #[arg(long)]
        sepal_length: f64,
        #[arg(long)]
        sepal_width: f64,
        #[arg(long)]
        petal_length: f64,
        #[arg(long)]
        petal_width: f64,
    },
    /// Classify every row of a CSV file
    Batch {
        input: PathBuf,
        /// Write the labeled CSV here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Rows per request; keep at or below the service's batch limit
        #[arg(long, default_value_t = 1000)]
        chunk_size: usize,
    },
    /// Show service metadata
    Info,
}

impl Command {
    pub fn features(&self) -> Option<FeatureVector> {
        match *self {
            Command::Predict {
                sepal_length,
                sepal_width,
                petal_length,
                petal_width,
            } => Some(FeatureVector::new(
                sepal_length,
                sepal_width,
                petal_length,
                petal_width,
            )),
            _ => None,
        }
    }
}
