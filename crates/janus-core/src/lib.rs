//! janus-core — vendor-neutral biometric templates over an opaque recognition engine.
//!
//! Detection passes accumulate into a [`Template`], which flattens into a
//! portable length-prefixed byte stream. Flat templates are enrolled into
//! galleries, compared 1:1 ([`Janus::verify`]) or ranked 1:N ([`Janus::search`]).

pub mod codec;
pub mod context;
pub mod cosine;
pub mod engine;
pub mod error;
pub mod gallery;
pub mod image;
pub mod search;
pub mod template;
pub mod types;
pub mod verify;

pub use codec::{ChunkSummary, CodecError, MAX_TEMPLATE_SIZE};
pub use context::Janus;
pub use cosine::{CosineEngine, EngineSettings, FaceAnalyzer};
pub use engine::RecognitionEngine;
pub use error::{EngineError, JanusError, JanusResult};
pub use image::{ColorSpace, Image};
pub use search::{Candidate, SearchResult};
pub use template::{FaceRecordSet, Template};
pub use types::{FaceId, FaceRegion, Signature, Similarity, SubjectId, REJECTION_SCORE};

#[cfg(test)]
pub(crate) mod test_support;
