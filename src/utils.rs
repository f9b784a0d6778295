use std::path::{Path, PathBuf};

use indicatif::ProgressStyle;

/// URL prefix the backend stores for every uploaded product image.
pub const UPLOAD_PREFIX: &str = "/public/uploads/";

/// Map a stored image URL onto the local upload store.
///
/// Returns `None` when the URL does not follow the `/public/uploads/<file>`
/// convention; such rows are skipped rather than treated as errors.
pub fn resolve_upload_path(uploads: &Path, image_url: &str) -> Option<PathBuf> {
    let filename = image_url.strip_prefix(UPLOAD_PREFIX)?;
    // Uploads live flat in one directory; a separator or `..` means the URL
    // escapes the store rather than naming a file in it.
    if filename.is_empty() || filename.contains(['/', '\\']) || filename == ".." {
        return None;
    }
    Some(uploads.join(filename))
}

/// Shared progress bar style for batch operations.
pub fn pb_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta}) {msg}")
        .expect("failed to build progress style")
        .progress_chars("#>-")
}
