use crate::{error::MenuError, layout::NormalizedBox};
use image::{DynamicImage, ImageFormat};
use std::path::Path;
use tracing::debug;

/// Cuts `bx` out of `image`.
///
/// Coordinates are truncated to whole pixels. A box that runs past the image edge
/// is clipped, so the result may be smaller than requested or even empty.
pub fn crop(image: &DynamicImage, bx: &NormalizedBox) -> DynamicImage {
    let px = bx.to_pixels(image.width(), image.height());
    debug!(
        "crop {}x{} at ({}, {}) from {}x{}",
        px.width,
        px.height,
        px.x,
        px.y,
        image.width(),
        image.height()
    );
    image.crop_imm(px.x, px.y, px.width, px.height)
}

/// Writes a crop as PNG, creating parent directories as needed.
pub fn save_crop(image: &DynamicImage, path: &Path) -> Result<(), MenuError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    image.save_with_format(path, ImageFormat::Png)?;
    debug!("saved crop {}", path.display());
    Ok(())
}

/// Fills `{day}` and `{slot}` in a crop path template.
pub fn crop_path(template: &str, day: &str, slot: &str) -> String {
    template
        .replace("{day}", &day.to_lowercase())
        .replace("{slot}", slot)
}
