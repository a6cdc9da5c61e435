pub mod poppler;
pub mod process;
pub mod tesseract;
pub mod types;

use anyhow::Result;
use image::DynamicImage;
use std::path::Path;

pub use types::ToolDiag;

/// Rasterizes the first page of a document.
pub trait PageRenderer {
    fn render_first_page(&self, document: &Path) -> Result<DynamicImage>;
    fn doctor(&self) -> Result<ToolDiag>;
}

/// Turns an image region into text.
pub trait TextRecognizer {
    fn recognize(&self, region: &DynamicImage) -> Result<String>;
    fn doctor(&self) -> Result<ToolDiag>;
}
