use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MentorError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Corrupt store data: {0}")]
    CorruptData(String),

    #[error("Model not loaded. Please train the model first.")]
    NotReady,

    #[error("Embedding error: {0:#}")]
    Embedding(anyhow::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl MentorError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::CorruptData(message.into())
    }
}

pub type Result<T> = std::result::Result<T, MentorError>;
