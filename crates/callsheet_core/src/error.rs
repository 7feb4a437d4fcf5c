use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Item not found: {0}")]
    ItemNotFound(uuid::Uuid),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Invalid time of day: {0:?}")]
    InvalidTime(String),

    #[error("Shot source unavailable: {0}")]
    ShotSource(String),

    #[error("Unsupported image: {0}")]
    UnsupportedImage(String),

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,

    #[error("Autosave task is no longer running")]
    AutosaveStopped,

    #[error("Save failed: {0}")]
    Save(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
