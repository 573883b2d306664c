//! The `Janus` context: one engine plus the enrollment face-id counter,
//! passed by reference to every operation.

use crate::codec::{self, MAX_TEMPLATE_SIZE};
use crate::engine::RecognitionEngine;
use crate::error::{JanusError, JanusResult};
use crate::gallery::{self, FaceIdCounter};
use crate::image::Image;
use crate::search::{self, SearchResult};
use crate::template::{self, Template};
use crate::types::{SubjectId, REJECTION_SCORE};
use crate::verify::{self, Verification};

pub struct Janus<E: RecognitionEngine> {
    engine: E,
    face_ids: FaceIdCounter,
}

impl<E: RecognitionEngine> Janus<E> {
    pub fn new(engine: E) -> Self {
        tracing::info!("janus context ready");
        Self {
            engine,
            face_ids: FaceIdCounter::new(),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Tear the context down, finalizing the engine.
    pub fn finalize(self) -> JanusResult<()> {
        tracing::info!(face_ids_issued = self.face_ids.peek(), "janus context finalizing");
        self.engine.finalize().map_err(JanusError::from)
    }

    pub fn max_template_size(&self) -> usize {
        MAX_TEMPLATE_SIZE
    }

    pub fn allocate_template(&self) -> Template<E::FaceRecord> {
        Template::new()
    }

    pub fn allocate_gallery(&self) -> JanusResult<E::Gallery> {
        Ok(self.engine.create_gallery()?)
    }

    /// Run one detection pass over `image` and append the record set to `template`.
    pub fn augment(
        &self,
        image: &Image,
        template: &mut Template<E::FaceRecord>,
    ) -> JanusResult<()> {
        Ok(template::augment(&self.engine, image, template)?)
    }

    /// Face tracking across frames is not supported.
    pub fn track(
        &self,
        _template: &mut Template<E::FaceRecord>,
        _enabled: bool,
    ) -> JanusResult<()> {
        Err(JanusError::NotImplemented)
    }

    /// Per-face attribute extraction is not supported.
    pub fn detect_attributes(&self, _image: &Image) -> JanusResult<()> {
        Err(JanusError::NotImplemented)
    }

    /// Serialize `template` into a flat template, truncating at the size limit.
    pub fn flatten_template(&self, template: &Template<E::FaceRecord>) -> JanusResult<Vec<u8>> {
        Ok(codec::flatten_template(&self.engine, template)?)
    }

    /// Decode a flat template back into a template, keeping every face.
    pub fn unflatten_template(&self, flat: &[u8]) -> JanusResult<Template<E::FaceRecord>> {
        Ok(codec::unflatten_template(&self.engine, flat)?)
    }

    pub fn flatten_gallery(&self, gallery: &E::Gallery) -> JanusResult<Vec<u8>> {
        Ok(gallery::flatten_gallery(&self.engine, gallery)?)
    }

    pub fn unflatten_gallery(&self, flat: &[u8]) -> JanusResult<E::Gallery> {
        Ok(gallery::unflatten_gallery(&self.engine, flat)?)
    }

    /// Enroll every signature of `template` into `gallery` under `subject_id`.
    ///
    /// Face ids come from a counter shared by every enroll call on this
    /// context; concurrent calls never receive the same id.
    pub fn enroll(
        &self,
        template: &Template<E::FaceRecord>,
        subject_id: SubjectId,
        gallery: &mut E::Gallery,
    ) -> JanusResult<usize> {
        Ok(gallery::enroll(
            &self.engine,
            &self.face_ids,
            template,
            subject_id,
            gallery,
        )?)
    }

    /// Compare two flat templates.
    ///
    /// Returns [`REJECTION_SCORE`] if either side has no signature, and
    /// `UnknownError` if the engine could not produce a score.
    pub fn verify(&self, a: &[u8], b: &[u8]) -> JanusResult<f32> {
        match verify::verify(&self.engine, a, b)? {
            Verification::Rejected => Ok(REJECTION_SCORE),
            Verification::Compared(similarity) => similarity.score().ok_or_else(|| {
                tracing::warn!("verify: engine produced no comparison");
                JanusError::UnknownError
            }),
        }
    }

    /// Rank every subject of a flat gallery against a flat probe template and
    /// return the best `min(k, subjects)`.
    pub fn search(&self, probe: &[u8], gallery: &[u8], k: usize) -> JanusResult<SearchResult> {
        Ok(search::search(&self.engine, probe, gallery, k)?)
    }
}
