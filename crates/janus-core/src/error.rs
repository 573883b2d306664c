//! Engine-native errors and the outward error taxonomy they map onto.

use std::path::PathBuf;
use thiserror::Error;

use crate::codec::CodecError;

/// Errors raised by a recognition engine.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("models path is empty")]
    NullModelsPath,
    #[error("models path not found: {}", .0.display())]
    InvalidModelsPath(PathBuf),
    #[error("image buffer is empty")]
    NullImage,
    #[error("invalid raw image: expected {expected} bytes, got {actual}")]
    InvalidRawImage { expected: usize, actual: usize },
    #[error("inconsistent image dimensions {width}x{height}")]
    InconsistentImageDimensions { width: u32, height: u32 },
    #[error("engine has no face analyzer; detection unavailable")]
    DetectionUnavailable,
    #[error("face analyzer failed: {0}")]
    Analyzer(String),
    #[error("face record has no signature")]
    MissingSignature,
    #[error("corrupt face record set: {0}")]
    CorruptRecordSet(String),
    #[error("corrupt gallery: {0}")]
    CorruptGallery(String),
    #[error("unsupported {kind} blob version {version}")]
    UnsupportedVersion { kind: &'static str, version: u32 },
    #[error("invalid engine settings {}: {message}", path.display())]
    Settings { path: PathBuf, message: String },
    #[error("engine lock poisoned")]
    Poisoned,
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Outward error taxonomy reported by [`crate::Janus`] operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum JanusError {
    #[error("invalid SDK path")]
    InvalidSdkPath,
    #[error("invalid image")]
    InvalidImage,
    #[error("unknown error")]
    UnknownError,
    #[error("not implemented")]
    NotImplemented,
}

impl From<EngineError> for JanusError {
    fn from(err: EngineError) -> Self {
        tracing::warn!(error = %err, "engine error");
        match err {
            EngineError::NullModelsPath | EngineError::InvalidModelsPath(_) => {
                JanusError::InvalidSdkPath
            }
            EngineError::NullImage
            | EngineError::InvalidRawImage { .. }
            | EngineError::InconsistentImageDimensions { .. } => JanusError::InvalidImage,
            _ => JanusError::UnknownError,
        }
    }
}

impl From<CodecError> for JanusError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Engine(inner) => inner.into(),
            other => {
                tracing::warn!(error = %other, "template decode error");
                JanusError::UnknownError
            }
        }
    }
}

pub type JanusResult<T> = Result<T, JanusError>;
