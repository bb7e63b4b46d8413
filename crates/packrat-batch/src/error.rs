use thiserror::Error;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Archive(#[from] packrat_archive::Error),

    #[error("job {index} panicked: {message}")]
    Panicked { index: usize, message: String },
}

pub type Result<T> = std::result::Result<T, BatchError>;
