//! Gallery enrollment bookkeeping.
//!
//! A flat gallery is the engine's own serialization of the whole gallery, with
//! no extra framing. It is not a flat template and the two must not be mixed.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::engine::RecognitionEngine;
use crate::error::EngineError;
use crate::template::Template;
use crate::types::{FaceId, SubjectId};

/// Face id source shared by every enroll call made through one context.
///
/// Never resets; concurrent callers never observe the same value.
#[derive(Debug, Default)]
pub struct FaceIdCounter {
    next: AtomicU64,
}

impl FaceIdCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> FaceId {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Next value that will be handed out.
    pub fn peek(&self) -> FaceId {
        self.next.load(Ordering::Relaxed)
    }
}

/// Add every signature-bearing face of `template` to `gallery` under
/// `subject_id`, drawing face ids from `counter`. Returns the number added.
pub fn enroll<E: RecognitionEngine>(
    engine: &E,
    counter: &FaceIdCounter,
    template: &Template<E::FaceRecord>,
    subject_id: SubjectId,
    gallery: &mut E::Gallery,
) -> Result<usize, EngineError> {
    let mut added = 0usize;
    for face in template.faces() {
        if !engine.has_signature(face) {
            continue;
        }
        engine.add_face(gallery, face, subject_id, counter.next_id())?;
        added += 1;
    }

    tracing::debug!(
        subject_id,
        added,
        subjects = engine.subject_ids(gallery).len(),
        "enroll: done"
    );
    Ok(added)
}

pub fn flatten_gallery<E: RecognitionEngine>(
    engine: &E,
    gallery: &E::Gallery,
) -> Result<Vec<u8>, EngineError> {
    let flat = engine.serialize_gallery(gallery)?;
    tracing::debug!(bytes = flat.len(), "flatten_gallery: done");
    Ok(flat)
}

pub fn unflatten_gallery<E: RecognitionEngine>(
    engine: &E,
    flat: &[u8],
) -> Result<E::Gallery, EngineError> {
    engine.deserialize_gallery(flat)
}
