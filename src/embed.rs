use std::path::Path;

use anyhow::{Context, Result, bail, ensure};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use log::{debug, info};
use ndarray::Array4;
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::Tensor;

/// Output dimension of the CLIP ViT-B/32 vision encoder.
pub const EMBED_DIM: usize = 512;

/// Input resolution expected by the encoder.
const INPUT_SIZE: u32 = 224;

// Published normalization constants of the CLIP image processor.
const MEAN: [f32; 3] = [0.481_454_66, 0.457_827_5, 0.408_210_73];
const STD: [f32; 3] = [0.268_629_54, 0.261_302_58, 0.275_777_11];

/// Vision encoder over an ONNX export of the pretrained CLIP model.
///
/// Loading is fatal if the artifact is missing; everything after that point
/// returns ordinary errors that callers turn into per-image skips.
#[derive(Debug)]
pub struct ClipEncoder {
    session: Session,
}

impl ClipEncoder {
    /// Open the ONNX model at `model_path`.
    pub fn load(model_path: &Path) -> Result<Self> {
        if !model_path.exists() {
            bail!("model not found: {}", model_path.display());
        }

        info!("loading vision model from {}", model_path.display());
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(ort::Error::<()>::from)?
            .with_intra_threads(num_cpus::get())
            .map_err(ort::Error::<()>::from)?
            .commit_from_file(model_path)
            .with_context(|| format!("failed to load model {}", model_path.display()))?;

        Ok(Self { session })
    }

    /// Decode an image file and embed it.
    pub fn encode_file(&mut self, path: &Path) -> Result<Vec<f32>> {
        let image = image::open(path)
            .with_context(|| format!("failed to decode image {}", path.display()))?;
        self.encode_image(&image)
    }

    /// Embed a decoded image, returning a unit-length vector of [`EMBED_DIM`].
    pub fn encode_image(&mut self, image: &DynamicImage) -> Result<Vec<f32>> {
        let pixels = preprocess(image);

        let input_name = self
            .session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .unwrap_or_else(|| "pixel_values".to_string());
        let output_name = self
            .session
            .outputs()
            .first()
            .map(|o| o.name().to_string())
            .unwrap_or_else(|| "image_embeds".to_string());

        let tensor = Tensor::from_array(pixels)?;
        let outputs = self.session.run(ort::inputs![input_name => tensor])?;
        let (_shape, data) = outputs
            .get(&output_name)
            .with_context(|| format!("model returned no {output_name:?} output"))?
            .try_extract_tensor::<f32>()?;

        ensure!(
            data.len() == EMBED_DIM,
            "unexpected embedding size {} (expected {})",
            data.len(),
            EMBED_DIM
        );
        ensure!(data.iter().all(|v| v.is_finite()), "embedding contains non-finite values");

        let mut embedding = data.to_vec();
        ensure!(l2_normalize(&mut embedding), "embedding has zero norm");

        debug!("embedded image into {} dimensions", embedding.len());
        Ok(embedding)
    }
}

/// Apply the CLIP processor transform: bicubic resize of the shortest side
/// to 224, center crop, scale to `[0, 1]`, per-channel mean/std
/// normalization, NCHW layout.
fn preprocess(image: &DynamicImage) -> Array4<f32> {
    let (w, h) = image.dimensions();
    let scale = INPUT_SIZE as f32 / w.min(h).max(1) as f32;
    let new_w = ((w as f32) * scale).round().max(1.0) as u32;
    let new_h = ((h as f32) * scale).round().max(1.0) as u32;
    let resized = image.resize_exact(new_w, new_h, FilterType::CatmullRom).to_rgb8();

    let start_x = resized.width().saturating_sub(INPUT_SIZE) / 2;
    let start_y = resized.height().saturating_sub(INPUT_SIZE) / 2;

    let size = INPUT_SIZE as usize;
    let mut pixels = Array4::<f32>::zeros((1, 3, size, size));
    for y in 0..size {
        for x in 0..size {
            let p = resized.get_pixel(start_x + x as u32, start_y + y as u32);
            for c in 0..3 {
                pixels[[0, c, y, x]] = (p[c] as f32 / 255.0 - MEAN[c]) / STD[c];
            }
        }
    }
    pixels
}

/// Scale `v` to unit length in place. Returns false if the norm is zero or
/// not finite, in which case `v` is left untouched.
pub fn l2_normalize(v: &mut [f32]) -> bool {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if !norm.is_finite() || norm <= 0.0 {
        return false;
    }
    for x in v {
        *x /= norm;
    }
    true
}
