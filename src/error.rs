use thiserror::Error;

#[derive(Debug, Error)]
pub enum MenuError {
    #[error("weekday must be a string, got {0}")]
    InvalidInput(String),
    #[error("unrecognized weekday: '{0}'")]
    UnrecognizedWeekday(String),
    #[error("rendering failed: {0:#}")]
    Render(anyhow::Error),
    #[error("OCR failed: {0:#}")]
    Ocr(anyhow::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

impl MenuError {
    /// Errors caused by the caller's weekday argument rather than by the engines.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            MenuError::InvalidInput(_) | MenuError::UnrecognizedWeekday(_)
        )
    }
}
