//! Reference recognition engine: cosine similarity over L2-normalized signatures.
//!
//! Face localization and signature extraction come from a pluggable
//! [`FaceAnalyzer`]. Without one the engine can still decode, enroll and
//! compare, but cannot detect.

pub mod records;
pub mod settings;

use std::path::Path;
use std::sync::Mutex;

use crate::engine::RecognitionEngine;
use crate::error::EngineError;
use crate::image::Image;
use crate::types::{FaceId, FaceRegion, Signature, Similarity, SubjectId};

pub use records::{CosineGallery, EnrolledFace, FaceRecord, SimilarityMatrix};
pub use settings::EngineSettings;

const MODELS_DIR: &str = "models";

/// Locates faces in, and extracts raw signatures from, grayscale frames.
pub trait FaceAnalyzer: Send {
    fn locate(
        &mut self,
        gray: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<FaceRegion>, EngineError>;

    fn embed(
        &mut self,
        gray: &[u8],
        width: u32,
        height: u32,
        region: &FaceRegion,
    ) -> Result<Vec<f32>, EngineError>;
}

pub struct CosineEngine {
    settings: EngineSettings,
    /// Detection and extraction share the analyzer and are serialized through this lock.
    analyzer: Option<Mutex<Box<dyn FaceAnalyzer>>>,
}

impl CosineEngine {
    /// Open the engine from an SDK directory; settings are read from
    /// `<sdk_path>/models/engine.toml` when present.
    pub fn initialize(sdk_path: &Path) -> Result<Self, EngineError> {
        if sdk_path.as_os_str().is_empty() {
            return Err(EngineError::NullModelsPath);
        }
        let models_dir = sdk_path.join(MODELS_DIR);
        if !models_dir.is_dir() {
            return Err(EngineError::InvalidModelsPath(models_dir));
        }

        let settings = EngineSettings::load(&models_dir)?;
        tracing::info!(
            path = %models_dir.display(),
            best_face_only = settings.detect_best_face_only,
            min_face_size = settings.min_face_size,
            min_extractable_size = settings.min_extractable_size,
            "cosine engine initialized"
        );
        Ok(Self::with_settings(settings))
    }

    /// Matching-only engine with explicit settings.
    pub fn with_settings(settings: EngineSettings) -> Self {
        Self {
            settings,
            analyzer: None,
        }
    }

    pub fn with_analyzer(mut self, analyzer: impl FaceAnalyzer + 'static) -> Self {
        self.analyzer = Some(Mutex::new(Box::new(analyzer)));
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    fn with_locked_analyzer<T>(
        &self,
        f: impl FnOnce(&mut dyn FaceAnalyzer) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let lock = self
            .analyzer
            .as_ref()
            .ok_or(EngineError::DetectionUnavailable)?;
        let mut analyzer = lock.lock().map_err(|_| EngineError::Poisoned)?;
        f(&mut **analyzer)
    }
}

impl RecognitionEngine for CosineEngine {
    type FaceRecord = FaceRecord;
    type Gallery = CosineGallery;
    type Matrix = SimilarityMatrix;

    fn detect(&self, image: &Image) -> Result<Vec<FaceRecord>, EngineError> {
        let gray = image.to_grayscale()?;
        let mut regions =
            self.with_locked_analyzer(|a| a.locate(&gray, image.width, image.height))?;

        let min_size = self.settings.min_face_size as f32;
        regions.retain(|r| r.min_side() >= min_size);
        regions.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        if self.settings.detect_best_face_only {
            regions.truncate(1);
        }

        Ok(regions.into_iter().map(FaceRecord::detected).collect())
    }

    fn is_extractable(&self, face: &FaceRecord) -> Result<bool, EngineError> {
        let has_landmarks = !self.settings.require_landmarks || face.region.landmarks.is_some();
        let large_enough = face.region.min_side() >= self.settings.min_extractable_size as f32;
        Ok(has_landmarks && large_enough)
    }

    fn extract(&self, image: &Image, face: &mut FaceRecord) -> Result<(), EngineError> {
        let gray = image.to_grayscale()?;
        let raw = self
            .with_locked_analyzer(|a| a.embed(&gray, image.width, image.height, &face.region))?;
        if raw.is_empty() {
            return Err(EngineError::Analyzer("empty signature".into()));
        }
        face.signature = Some(Signature::normalized(raw)?);
        Ok(())
    }

    fn has_signature(&self, face: &FaceRecord) -> bool {
        face.signature.is_some()
    }

    fn serialize_record_set(&self, faces: &[FaceRecord]) -> Result<Vec<u8>, EngineError> {
        records::encode_record_set(faces)
    }

    fn deserialize_record_set(&self, blob: &[u8]) -> Result<Vec<FaceRecord>, EngineError> {
        records::decode_record_set(blob)
    }

    fn create_gallery(&self) -> Result<CosineGallery, EngineError> {
        Ok(CosineGallery::default())
    }

    fn add_face(
        &self,
        gallery: &mut CosineGallery,
        face: &FaceRecord,
        subject_id: SubjectId,
        face_id: FaceId,
    ) -> Result<(), EngineError> {
        let signature = face
            .signature
            .clone()
            .ok_or(EngineError::MissingSignature)?;
        gallery.push(EnrolledFace {
            subject_id,
            face_id,
            signature,
        });
        Ok(())
    }

    fn serialize_gallery(&self, gallery: &CosineGallery) -> Result<Vec<u8>, EngineError> {
        records::encode_gallery(gallery)
    }

    fn deserialize_gallery(&self, blob: &[u8]) -> Result<CosineGallery, EngineError> {
        records::decode_gallery(blob)
    }

    fn subject_ids(&self, gallery: &CosineGallery) -> Vec<SubjectId> {
        gallery.subject_ids()
    }

    fn compare(
        &self,
        probe: &CosineGallery,
        target: &CosineGallery,
    ) -> Result<SimilarityMatrix, EngineError> {
        Ok(SimilarityMatrix::build(probe, target))
    }

    fn subject_similarity(
        &self,
        matrix: &SimilarityMatrix,
        probe_subject: SubjectId,
        target_subject: SubjectId,
    ) -> Similarity {
        matrix.get(probe_subject, target_subject)
    }

    fn finalize(&self) -> Result<(), EngineError> {
        tracing::info!("cosine engine finalized");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ColorSpace;
    use crate::test_support::{landmarked, StubAnalyzer};
    use tempfile::TempDir;

    fn gray_image() -> Image {
        Image::new((0..64 * 64).map(|i| (i % 251) as u8).collect(), 64, 64, ColorSpace::Gray8)
    }

    #[test]
    fn test_initialize_empty_path() {
        assert!(matches!(
            CosineEngine::initialize(Path::new("")),
            Err(EngineError::NullModelsPath)
        ));
    }

    #[test]
    fn test_initialize_missing_models_dir() {
        let tmp = TempDir::new().unwrap();
        match CosineEngine::initialize(tmp.path()) {
            Err(EngineError::InvalidModelsPath(p)) => assert!(p.ends_with("models")),
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_initialize_reads_settings() {
        let tmp = TempDir::new().unwrap();
        let models = tmp.path().join("models");
        std::fs::create_dir(&models).unwrap();
        std::fs::write(models.join("engine.toml"), "min_extractable_size = 32\n").unwrap();

        let engine = CosineEngine::initialize(tmp.path()).unwrap();
        assert_eq!(engine.settings().min_extractable_size, 32);
    }

    #[test]
    fn test_detect_without_analyzer() {
        let engine = CosineEngine::with_settings(EngineSettings::default());
        assert!(matches!(
            engine.detect(&gray_image()),
            Err(EngineError::DetectionUnavailable)
        ));
    }

    #[test]
    fn test_detect_rejects_bad_image() {
        let engine = CosineEngine::with_settings(EngineSettings::default())
            .with_analyzer(StubAnalyzer::new(vec![]));
        let bad = Image::new(vec![0; 10], 64, 64, ColorSpace::Gray8);
        assert!(matches!(engine.detect(&bad), Err(EngineError::InvalidRawImage { .. })));
    }

    #[test]
    fn test_detect_best_face_only() {
        let engine = CosineEngine::with_settings(EngineSettings::default()).with_analyzer(
            StubAnalyzer::new(vec![
                landmarked(0.0, 0.0, 20.0, 0.6),
                landmarked(30.0, 30.0, 20.0, 0.9),
            ]),
        );
        let faces = engine.detect(&gray_image()).unwrap();
        assert_eq!(faces.len(), 1);
        assert!((faces[0].region.confidence - 0.9).abs() < 1e-6);
        assert!(faces[0].signature.is_none());
    }

    #[test]
    fn test_detect_drops_tiny_faces() {
        let settings = EngineSettings {
            detect_best_face_only: false,
            ..EngineSettings::default()
        };
        let engine = CosineEngine::with_settings(settings).with_analyzer(StubAnalyzer::new(vec![
            landmarked(0.0, 0.0, 3.0, 0.99),
            landmarked(10.0, 10.0, 20.0, 0.5),
            landmarked(30.0, 30.0, 8.0, 0.7),
        ]));
        let faces = engine.detect(&gray_image()).unwrap();
        let sizes: Vec<f32> = faces.iter().map(|f| f.region.width).collect();
        assert_eq!(sizes, vec![8.0, 20.0]);
    }

    #[test]
    fn test_extractable_rules() {
        let engine = CosineEngine::with_settings(EngineSettings::default());
        assert!(engine
            .is_extractable(&FaceRecord::detected(landmarked(0.0, 0.0, 20.0, 0.9)))
            .unwrap());
        assert!(!engine
            .is_extractable(&FaceRecord::detected(landmarked(0.0, 0.0, 8.0, 0.9)))
            .unwrap());

        let mut no_landmarks = landmarked(0.0, 0.0, 20.0, 0.9);
        no_landmarks.landmarks = None;
        assert!(!engine
            .is_extractable(&FaceRecord::detected(no_landmarks.clone()))
            .unwrap());

        let lenient = CosineEngine::with_settings(EngineSettings {
            require_landmarks: false,
            ..EngineSettings::default()
        });
        assert!(lenient.is_extractable(&FaceRecord::detected(no_landmarks)).unwrap());
    }

    #[test]
    fn test_extract_normalizes_signature() {
        let engine = CosineEngine::with_settings(EngineSettings::default())
            .with_analyzer(StubAnalyzer::new(vec![]));
        let mut face = FaceRecord::detected(landmarked(8.0, 8.0, 24.0, 0.9));
        engine.extract(&gray_image(), &mut face).unwrap();

        let sig = face.signature.expect("signature extracted");
        let norm: f32 = sig.values.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    struct InfiniteAnalyzer;

    impl FaceAnalyzer for InfiniteAnalyzer {
        fn locate(
            &mut self,
            _gray: &[u8],
            _width: u32,
            _height: u32,
        ) -> Result<Vec<FaceRegion>, EngineError> {
            Ok(vec![landmarked(8.0, 8.0, 24.0, 0.9)])
        }

        fn embed(
            &mut self,
            _gray: &[u8],
            _width: u32,
            _height: u32,
            _region: &FaceRegion,
        ) -> Result<Vec<f32>, EngineError> {
            Ok(vec![f32::INFINITY, 1.0, 0.0])
        }
    }

    #[test]
    fn test_extract_rejects_non_finite_embedding() {
        let engine = CosineEngine::with_settings(EngineSettings::default())
            .with_analyzer(InfiniteAnalyzer);
        let mut face = FaceRecord::detected(landmarked(8.0, 8.0, 24.0, 0.9));
        assert!(matches!(
            engine.extract(&gray_image(), &mut face),
            Err(EngineError::Analyzer(_))
        ));
        assert!(face.signature.is_none());
    }

    #[test]
    fn test_augment_fails_on_non_finite_embedding() {
        let janus = crate::Janus::new(
            CosineEngine::with_settings(EngineSettings::default()).with_analyzer(InfiniteAnalyzer),
        );
        let mut template = janus.allocate_template();
        assert_eq!(
            janus.augment(&gray_image(), &mut template),
            Err(crate::JanusError::UnknownError)
        );
        assert!(template.is_empty());
    }

    #[test]
    fn test_add_face_requires_signature() {
        let engine = CosineEngine::with_settings(EngineSettings::default());
        let mut gallery = engine.create_gallery().unwrap();
        let face = FaceRecord::detected(landmarked(0.0, 0.0, 20.0, 0.9));
        assert!(matches!(
            engine.add_face(&mut gallery, &face, 1, 0),
            Err(EngineError::MissingSignature)
        ));
        assert!(gallery.faces().is_empty());
    }
}
