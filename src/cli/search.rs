use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, ValueEnum};
use log::info;
use ndarray::ArrayView1;
use serde::Serialize;
use tokio::task::block_in_place;

use super::SubCommandExtend;
use crate::config::Opts;
use crate::embed::{ClipEncoder, EMBED_DIM};
use crate::featdb::FeatureDb;
use crate::searcher::ProductIndex;

#[derive(Parser, Debug, Clone)]
pub struct SearchCommand {
    /// Query image path
    pub image: PathBuf,
    /// Maximum number of distinct products to return
    #[arg(long, value_name = "N", default_value_t = 10)]
    pub top_k: usize,
    /// Output format
    #[arg(long, value_name = "FORMAT", value_enum, default_value = "json")]
    pub output_format: OutputFormat,
}

#[derive(ValueEnum, Debug, Clone)]
pub enum OutputFormat {
    Json,
    Ids,
}

#[derive(Serialize)]
struct SearchOutput {
    success: bool,
    total: usize,
    product_ids: Vec<i64>,
}

impl SubCommandExtend for SearchCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        if !self.image.exists() {
            bail!("image not found: {}", self.image.display());
        }

        let mut encoder = block_in_place(|| ClipEncoder::load(&opts.model))?;

        let db = FeatureDb::open(&opts.database).await?;
        let features = db.load_features().await?;
        info!("loaded {} image features", features.len());

        let index = ProductIndex::build(&features, EMBED_DIM)?;

        let query = block_in_place(|| encoder.encode_file(&self.image))?;
        let results = index.search(ArrayView1::from(query.as_slice()), self.top_k);
        let product_ids: Vec<i64> = results.iter().map(|&(_, id)| id).collect();

        match self.output_format {
            OutputFormat::Json => {
                let output =
                    SearchOutput { success: true, total: product_ids.len(), product_ids };
                println!("{}", serde_json::to_string(&output)?);
            }
            OutputFormat::Ids => {
                for id in &product_ids {
                    println!("{id}");
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_matches_backend_contract() {
        let output = SearchOutput { success: true, total: 2, product_ids: vec![7, 3] };
        assert_eq!(
            serde_json::to_string(&output).unwrap(),
            r#"{"success":true,"total":2,"product_ids":[7,3]}"#
        );
    }
}
