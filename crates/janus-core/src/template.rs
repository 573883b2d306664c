//! Per-subject accumulation of detection passes.

use crate::engine::RecognitionEngine;
use crate::error::EngineError;
use crate::image::Image;

/// Face records produced by one detection pass over one image.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceRecordSet<F> {
    faces: Vec<F>,
}

impl<F> FaceRecordSet<F> {
    pub fn new(faces: Vec<F>) -> Self {
        Self { faces }
    }

    pub fn faces(&self) -> &[F] {
        &self.faces
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

/// Ordered record sets for one subject-in-progress.
///
/// Insertion order is augmentation order and fixes the flattened byte layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Template<F> {
    record_sets: Vec<FaceRecordSet<F>>,
}

impl<F> Default for Template<F> {
    fn default() -> Self {
        Self {
            record_sets: Vec::new(),
        }
    }
}

impl<F> Template<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_sets(&self) -> &[FaceRecordSet<F>] {
        &self.record_sets
    }

    /// Append a record set produced elsewhere (e.g. decoded from a flat template).
    pub fn push(&mut self, record_set: FaceRecordSet<F>) {
        self.record_sets.push(record_set);
    }

    pub fn len(&self) -> usize {
        self.record_sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.record_sets.is_empty()
    }

    /// Total face records across every record set.
    pub fn face_count(&self) -> usize {
        self.record_sets.iter().map(FaceRecordSet::len).sum()
    }

    pub fn faces(&self) -> impl Iterator<Item = &F> {
        self.record_sets.iter().flat_map(|set| set.faces.iter())
    }
}

/// Detect faces in `image`, extract every extractable signature and append the
/// whole record set to `template`.
///
/// Faces without an extractable signature are kept. Finding no face is a
/// normal outcome that appends an empty set.
pub fn augment<E: RecognitionEngine>(
    engine: &E,
    image: &Image,
    template: &mut Template<E::FaceRecord>,
) -> Result<(), EngineError> {
    let mut faces = engine.detect(image)?;

    let mut extracted = 0usize;
    for face in faces.iter_mut() {
        if !engine.is_extractable(face)? {
            continue;
        }
        engine.extract(image, face)?;
        extracted += 1;
    }

    tracing::debug!(
        faces = faces.len(),
        extracted,
        record_sets = template.len() + 1,
        "augment: record set appended"
    );

    template.push(FaceRecordSet::new(faces));
    Ok(())
}
