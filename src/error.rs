use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum SpecimenError {
    #[error("unknown target type '{value}', should be one of {{{valid}}}")]
    UnknownTargetType { value: String, valid: String },

    #[error("at least one target type is required")]
    NoTargetTypes,

    #[error("dataset not found at location: {0}")]
    DatasetNotFound(PathBuf),

    #[error("invalid category id {id} for {target_type}")]
    InvalidCategoryId { target_type: String, id: u32 },

    #[error("index {index} out of range for dataset of {len} specimens")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("dataset index inconsistent: {0}")]
    Inconsistent(String),

    #[error("failed to read metadata table at {0}")]
    MetadataRead(PathBuf),

    #[error("failed to parse metadata table {path}: {message}")]
    MetadataParse { path: PathBuf, message: String },

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("image request failed: {0}")]
    Http(String),

    #[error("image host returned status {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("failed to decode image {path}: {message}")]
    ImageDecode { path: PathBuf, message: String },

    #[error("transform failed: {0}")]
    Transform(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
