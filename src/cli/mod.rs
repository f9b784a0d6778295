use std::path::Path;

use anyhow::{Context, Result, bail};

mod extract;
mod refresh;
mod search;

pub use extract::*;
pub use refresh::*;
pub use search::*;

use crate::config::Opts;
use crate::embed::ClipEncoder;
use crate::utils::resolve_upload_path;

pub trait SubCommandExtend {
    fn run(&self, opts: &Opts) -> impl std::future::Future<Output = anyhow::Result<()>> + Send;
}

/// Resolve a catalog image URL against the upload store and embed it.
///
/// Every failure mode here (foreign URL, missing file, decode or inference
/// error) is one the batch commands turn into a skip.
pub(crate) fn embed_upload(
    encoder: &mut ClipEncoder,
    uploads: &Path,
    image_url: &str,
) -> Result<Vec<f32>> {
    let path = resolve_upload_path(uploads, image_url)
        .with_context(|| format!("image url outside the upload store: {image_url:?}"))?;
    if !path.exists() {
        bail!("image file missing: {}", path.display());
    }
    encoder.encode_file(&path)
}
