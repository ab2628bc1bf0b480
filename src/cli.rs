use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "image-pipeline", version, about = "Enhance, classify and inspect corpus images")]
pub struct Cli {
    #[arg(long, global = true, help = "JSON config file (environment variables override it)")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List configured models and available images
    Info,
    /// Apply the enhancement chain and store the result
    Enhance {
        image_id: String,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        brightness: Option<String>,
        #[arg(long)]
        contrast: Option<String>,
        #[arg(long)]
        sharpness: Option<String>,
        #[arg(long, help = "Copy the transformed image here")]
        out: Option<PathBuf>,
    },
    /// Classify a corpus image
    Classify {
        model: String,
        image_id: String,
        #[arg(long, default_value_t = false, help = "Also write JSON and chart reports")]
        report: bool,
        #[arg(long, help = "Directory the reports are downloaded into")]
        out_dir: Option<PathBuf>,
    },
    /// Classify an image file that is not part of the corpus
    Upload { model: String, file: PathBuf },
    /// Pixel-value histogram of a corpus image
    Histogram {
        image_id: String,
        #[arg(long, help = "Write the decoded plot PNG here")]
        out: Option<PathBuf>,
    },
    /// Delete a previously generated artifact
    Delete { name: String },
}
