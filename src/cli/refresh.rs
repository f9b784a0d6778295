use anyhow::{Result, bail};
use clap::Parser;
use log::{debug, info};
use serde::Serialize;
use tokio::task::block_in_place;

use super::{SubCommandExtend, embed_upload};
use crate::config::Opts;
use crate::embed::ClipEncoder;
use crate::featdb::{FeatureDb, ImageFeature};

#[derive(Parser, Debug, Clone)]
pub struct RefreshCommand {
    /// Product identifier
    pub product_id: i64,
}

/// Stdout document consumed by the calling backend.
#[derive(Serialize)]
struct RefreshOutput {
    success: bool,
    product_id: i64,
    features_count: usize,
}

impl SubCommandExtend for RefreshCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let db = FeatureDb::open(&opts.database).await?;

        // Image rows come first so a product without images never pays for
        // the model load. The backend treats empty stdout as a soft success.
        let images = db.product_images(self.product_id).await?;
        if images.is_empty() {
            info!("no images found for product {}", self.product_id);
            return Ok(());
        }
        info!("found {} images for product {}", images.len(), self.product_id);

        let mut encoder = block_in_place(|| ClipEncoder::load(&opts.model))?;

        let mut features = Vec::new();
        for image in &images {
            match block_in_place(|| embed_upload(&mut encoder, &opts.uploads, &image.image_url)) {
                Ok(embedding) => features.push(ImageFeature {
                    image_id: image.image_id,
                    product_id: image.product_id,
                    embedding,
                }),
                Err(e) => debug!("skipping image {}: {e:#}", image.image_id),
            }
        }

        if features.is_empty() {
            bail!("no features extracted for product {}", self.product_id);
        }

        db.replace_product(self.product_id, &features).await?;

        let output = RefreshOutput {
            success: true,
            product_id: self.product_id,
            features_count: features.len(),
        };
        println!("{}", serde_json::to_string(&output)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_matches_backend_contract() {
        let output = RefreshOutput { success: true, product_id: 42, features_count: 3 };
        assert_eq!(
            serde_json::to_string(&output).unwrap(),
            r#"{"success":true,"product_id":42,"features_count":3}"#
        );
    }
}
