use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::*;

#[derive(Parser, Debug, Clone)]
#[command(name = "visearch", version, about = "Visual similarity search for the product catalog")]
pub struct Opts {
    #[command(subcommand)]
    pub subcmd: SubCommand,
    /// sqlite catalog database file
    #[arg(long, env = "VISEARCH_DB", value_name = "PATH", default_value = "fashion.db")]
    pub database: PathBuf,
    /// ONNX export of the CLIP vision encoder
    #[arg(
        long,
        env = "VISEARCH_MODEL",
        value_name = "PATH",
        default_value = "models/clip-vision.onnx"
    )]
    pub model: PathBuf,
    /// Root directory of the upload file store
    #[arg(long, env = "VISEARCH_UPLOADS", value_name = "DIR", default_value = "public/uploads")]
    pub uploads: PathBuf,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommand {
    /// Re-extract embeddings for every active catalog image
    Extract(ExtractCommand),
    /// Re-extract embeddings for a single product
    Refresh(RefreshCommand),
    /// Find products visually similar to a query image
    Search(SearchCommand),
}
