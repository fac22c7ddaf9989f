//! NaFlex image preprocessing for SigLIP 2.
//!
//! NaFlex keeps the native aspect ratio instead of squashing to a square:
//! - Resize so both sides are multiples of the patch size and the patch
//!   grid fits the patch budget
//! - Normalization: pixels scaled to [-1, 1] via (pixel/255 - 0.5) / 0.5
//! - Channel order: RGB
//! - Layout: one row per patch, flattened as [patch_y, patch_x, channel],
//!   zero-padded up to the patch budget

use image::DynamicImage;
use ndarray::{Array2, Array3};

/// Number of color channels (RGB).
const CHANNELS: usize = 3;

/// SigLIP normalization mean (per-channel).
const NORM_MEAN: f32 = 0.5;

/// SigLIP normalization std (per-channel).
const NORM_STD: f32 = 0.5;

/// Scale search precision.
const SCALE_EPS: f64 = 1e-5;

/// Vision encoder inputs for one image.
#[derive(Debug, Clone)]
pub struct PatchInput {
    /// `[1, max_num_patches, patch_size * patch_size * 3]`
    pub pixel_values: Array3<f32>,
    /// `[1, max_num_patches]`, 1 for real patches and 0 for padding
    pub attention_mask: Array2<i64>,
    /// Patch grid as (rows, cols)
    pub spatial_shape: (usize, usize),
}

impl PatchInput {
    /// Number of real (non-padding) patches.
    pub fn num_patches(&self) -> usize {
        self.spatial_shape.0 * self.spatial_shape.1
    }
}

fn scaled_side(scale: f64, side: u32, patch_size: u32) -> u32 {
    let patch = f64::from(patch_size);
    let scaled = (f64::from(side) * scale / patch).ceil() * patch;
    (scaled as u32).max(patch_size)
}

/// Largest (height, width) that keeps the aspect ratio, is patch-aligned,
/// and needs at most `max_num_patches` patches.
pub fn target_size(height: u32, width: u32, patch_size: u32, max_num_patches: usize) -> (u32, u32) {
    let mut scale_min = SCALE_EPS / 10.0;
    let mut scale_max = 100.0;

    while scale_max - scale_min >= SCALE_EPS {
        let scale = (scale_min + scale_max) / 2.0;
        let h = scaled_side(scale, height, patch_size);
        let w = scaled_side(scale, width, patch_size);
        let patches = (h / patch_size) as usize * (w / patch_size) as usize;
        if patches <= max_num_patches {
            scale_min = scale;
        } else {
            scale_max = scale;
        }
    }

    (
        scaled_side(scale_min, height, patch_size),
        scaled_side(scale_min, width, patch_size),
    )
}

/// Preprocess an image for the SigLIP 2 vision encoder under a patch budget.
///
/// A budget of zero is treated as one; every image yields at least one patch.
pub fn preprocess(image: &DynamicImage, patch_size: u32, max_num_patches: usize) -> PatchInput {
    let max_num_patches = max_num_patches.max(1);
    let (height, width) = target_size(image.height(), image.width(), patch_size, max_num_patches);
    let resized = image.resize_exact(width, height, image::imageops::FilterType::Triangle);
    let rgb = resized.to_rgb8();

    let p = patch_size as usize;
    let rows = height as usize / p;
    let cols = width as usize / p;
    let row_stride = width as usize * CHANNELS;
    let patch_dim = p * p * CHANNELS;

    let mut pixel_values = Array3::<f32>::zeros((1, max_num_patches, patch_dim));
    let mut attention_mask = Array2::<i64>::zeros((1, max_num_patches));

    let raw = rgb.as_raw();
    for row in 0..rows {
        for col in 0..cols {
            let patch = row * cols + col;
            attention_mask[[0, patch]] = 1;
            for py in 0..p {
                let line = (row * p + py) * row_stride + col * p * CHANNELS;
                for px in 0..p {
                    let src = line + px * CHANNELS;
                    let dst = (py * p + px) * CHANNELS;
                    for c in 0..CHANNELS {
                        pixel_values[[0, patch, dst + c]] =
                            (f32::from(raw[src + c]) / 255.0 - NORM_MEAN) / NORM_STD;
                    }
                }
            }
        }
    }

    PatchInput {
        pixel_values,
        attention_mask,
        spatial_shape: (rows, cols),
    }
}
