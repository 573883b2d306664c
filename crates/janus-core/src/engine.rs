//! Capability interface over an opaque, stateful recognition engine.
//!
//! The codec, enrollment, verification and search logic only ever talk to an
//! engine through this trait, so engines can be swapped without touching them.
//! Engine-native values are released by `Drop`.

use crate::error::EngineError;
use crate::image::Image;
use crate::types::{FaceId, Similarity, SubjectId};

pub trait RecognitionEngine: Send + Sync {
    /// One detected face, optionally carrying an extracted signature.
    type FaceRecord: Clone + Send + Sync;
    /// Engine-native collection of enrolled (subject id, face id, signature) entries.
    type Gallery: Send;
    /// Result of comparing every signature of one gallery against another.
    type Matrix;

    /// Run one detection pass over `image`.
    fn detect(&self, image: &Image) -> Result<Vec<Self::FaceRecord>, EngineError>;

    /// Whether a signature can be extracted for `face`.
    fn is_extractable(&self, face: &Self::FaceRecord) -> Result<bool, EngineError>;

    /// Extract the signature of `face` in place.
    fn extract(&self, image: &Image, face: &mut Self::FaceRecord) -> Result<(), EngineError>;

    fn has_signature(&self, face: &Self::FaceRecord) -> bool;

    fn serialize_record_set(&self, faces: &[Self::FaceRecord]) -> Result<Vec<u8>, EngineError>;

    fn deserialize_record_set(&self, blob: &[u8]) -> Result<Vec<Self::FaceRecord>, EngineError>;

    fn create_gallery(&self) -> Result<Self::Gallery, EngineError>;

    /// Store the signature of `face` under (`subject_id`, `face_id`).
    fn add_face(
        &self,
        gallery: &mut Self::Gallery,
        face: &Self::FaceRecord,
        subject_id: SubjectId,
        face_id: FaceId,
    ) -> Result<(), EngineError>;

    fn serialize_gallery(&self, gallery: &Self::Gallery) -> Result<Vec<u8>, EngineError>;

    fn deserialize_gallery(&self, blob: &[u8]) -> Result<Self::Gallery, EngineError>;

    /// Distinct subject ids present in `gallery`, in enumeration order.
    fn subject_ids(&self, gallery: &Self::Gallery) -> Vec<SubjectId>;

    fn compare(
        &self,
        probe: &Self::Gallery,
        target: &Self::Gallery,
    ) -> Result<Self::Matrix, EngineError>;

    /// Score for (`probe_subject`, `target_subject`) in `matrix`.
    fn subject_similarity(
        &self,
        matrix: &Self::Matrix,
        probe_subject: SubjectId,
        target_subject: SubjectId,
    ) -> Similarity;

    /// Tear down engine state. Called once by [`crate::Janus::finalize`].
    fn finalize(&self) -> Result<(), EngineError> {
        Ok(())
    }
}
