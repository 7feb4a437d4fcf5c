use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("unsupported image format: {0}")]
    Unsupported(String),

    #[error("empty input")]
    EmptyInput,
}

pub type Result<T> = std::result::Result<T, MediaError>;
