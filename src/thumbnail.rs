//! Thumbnail decoding for wheel items. Every entry gets a square image of the
//! same edge length; anything that cannot be decoded gets the fallback tile.

use egui::{Color32, ColorImage};
use image::imageops::FilterType;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum ThumbnailError {
    #[error("No thumbnail at {0}")]
    Missing(PathBuf),

    #[error("Failed to decode thumbnail {path}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
}

const FALLBACK_FILL: Color32 = Color32::from_rgb(50, 50, 50);
const FALLBACK_MARK: Color32 = Color32::from_rgb(200, 50, 20);

/// Decodes `path` and scales it to an `edge` x `edge` image
pub fn load(path: &Path, edge: u32) -> Result<ColorImage, ThumbnailError> {
    if !path.is_file() {
        return Err(ThumbnailError::Missing(path.to_path_buf()));
    }

    let decoded = image::open(path).map_err(|source| ThumbnailError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let edge = edge.max(1);
    let rgba = decoded.resize_exact(edge, edge, FilterType::Triangle).to_rgba8();

    Ok(ColorImage::from_rgba_unmultiplied(
        [edge as usize, edge as usize],
        rgba.as_raw(),
    ))
}

/// Placeholder tile: dark square, red border, red cross
pub fn fallback(edge: u32) -> ColorImage {
    let edge = edge.max(1) as usize;
    let border = (edge / 16).max(1);
    let mut image = ColorImage::new([edge, edge], FALLBACK_FILL);

    for y in 0..edge {
        for x in 0..edge {
            let on_border = x < border || y < border || x >= edge - border || y >= edge - border;
            let on_cross = x.abs_diff(y) < border || (x + y + 1).abs_diff(edge) < border;
            if on_border || on_cross {
                image.pixels[y * edge + x] = FALLBACK_MARK;
            }
        }
    }

    image
}

/// Thumbnail for an entry, never failing: problems are logged and the
/// fallback tile is returned instead
pub fn load_or_fallback(path: &Path, edge: u32) -> ColorImage {
    match load(path, edge) {
        Ok(image) => image,
        Err(ThumbnailError::Missing(path)) => {
            debug!("No thumbnail at {}, using fallback", path.display());
            fallback(edge)
        }
        Err(e) => {
            warn!("{}, using fallback", e);
            fallback(edge)
        }
    }
}
