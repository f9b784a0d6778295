use anyhow::Result;
use clap::Parser;
use indicatif::ProgressBar;
use log::{debug, info, warn};
use tokio::task::block_in_place;

use super::{SubCommandExtend, embed_upload};
use crate::config::Opts;
use crate::embed::ClipEncoder;
use crate::featdb::{FeatureDb, ImageFeature};
use crate::utils::pb_style;

#[derive(Parser, Debug, Clone)]
pub struct ExtractCommand {}

impl SubCommandExtend for ExtractCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        // The model artifact is checked before any database work begins.
        let mut encoder = block_in_place(|| ClipEncoder::load(&opts.model))?;

        let db = FeatureDb::open(&opts.database).await?;
        let images = db.active_images().await?;
        if images.is_empty() {
            info!("no catalog images found, nothing to do");
            return Ok(());
        }
        info!("loaded {} catalog images", images.len());

        let pb = ProgressBar::new(images.len() as u64).with_style(pb_style());
        let mut features = Vec::new();
        let mut failed = 0u64;

        for image in &images {
            pb.set_message(image.product_name.chars().take(30).collect::<String>());
            match block_in_place(|| embed_upload(&mut encoder, &opts.uploads, &image.image_url)) {
                Ok(embedding) => features.push(ImageFeature {
                    image_id: image.image_id,
                    product_id: image.product_id,
                    embedding,
                }),
                Err(e) => {
                    debug!("skipping image {}: {e:#}", image.image_id);
                    failed += 1;
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        if features.is_empty() {
            warn!("no features extracted, leaving the stored table untouched");
            return Ok(());
        }

        db.replace_all(&features).await?;
        info!("extraction complete: {} succeeded, {} failed", features.len(), failed);
        Ok(())
    }
}
