use std::path::Path;

use janus_core::codec::{inspect_template, ChunkReader};
use janus_core::{
    ColorSpace, CosineEngine, EngineError, FaceAnalyzer, FaceRegion, Image, Janus, JanusError,
    REJECTION_SCORE,
};
use tempfile::TempDir;

#[test]
fn integration_enroll_verify_search() {
    let janus = open_janus(vec![face(8.0, 8.0, 40.0, 0.95)]);

    let mut alice = janus.allocate_template();
    janus.augment(&ramp_image(64, 0), &mut alice).unwrap();
    let alice_flat = janus.flatten_template(&alice).unwrap();

    let mut bob = janus.allocate_template();
    janus.augment(&ramp_image(64, 128), &mut bob).unwrap();

    let mut gallery = janus.allocate_gallery().unwrap();
    assert_eq!(janus.enroll(&alice, 42, &mut gallery).unwrap(), 1);
    assert_eq!(janus.enroll(&bob, 7, &mut gallery).unwrap(), 1);
    let gallery_flat = janus.flatten_gallery(&gallery).unwrap();

    // Self-verification is the engine maximum and reproducible.
    let first = janus.verify(&alice_flat, &alice_flat).unwrap();
    let second = janus.verify(&alice_flat, &alice_flat).unwrap();
    assert!((first - 1.0).abs() < 1e-5, "self score {first}");
    assert_eq!(first.to_bits(), second.to_bits());

    let result = janus.search(&alice_flat, &gallery_flat, 5).unwrap();
    assert_eq!(result.len(), 2);
    assert_eq!(result.ids()[0], 42);
    let scores = result.scores();
    assert!(scores[0].unwrap() >= scores[1].unwrap());

    assert_eq!(janus.finalize(), Ok(()));
}

#[test]
fn integration_roundtrip_counts_only_signatures() {
    // One extractable face and one too small for a signature in every pass.
    let janus = open_janus(vec![face(0.0, 0.0, 32.0, 0.9), face(40.0, 40.0, 12.0, 0.6)]);

    let mut template = janus.allocate_template();
    for offset in [0u8, 30, 60] {
        janus.augment(&ramp_image(64, offset), &mut template).unwrap();
    }
    assert_eq!(template.face_count(), 6);

    let flat = janus.flatten_template(&template).unwrap();
    assert!(flat.len() <= janus.max_template_size());

    let summary = inspect_template(janus.engine(), &flat).unwrap();
    assert_eq!(summary.len(), 3);
    assert!(summary.iter().all(|c| c.faces == 2 && c.signatures == 1));

    let restored = janus.unflatten_template(&flat).unwrap();
    let mut gallery = janus.allocate_gallery().unwrap();
    assert_eq!(janus.enroll(&restored, 1, &mut gallery).unwrap(), 3);
    assert_eq!(ChunkReader::new(&flat).count(), 3);
}

#[test]
fn integration_verify_without_faces_rejects() {
    let janus = open_janus(vec![]);
    let mut empty = janus.allocate_template();
    janus.augment(&ramp_image(32, 0), &mut empty).unwrap();
    let flat = janus.flatten_template(&empty).unwrap();
    assert!(!flat.is_empty());
    assert_eq!(janus.verify(&flat, &flat), Ok(REJECTION_SCORE));
}

#[test]
fn integration_initialize_invalid_sdk_path() {
    let tmp = TempDir::new().unwrap();
    let err = CosineEngine::initialize(&tmp.path().join("missing"))
        .map(|_| ())
        .map_err(JanusError::from);
    assert_eq!(err, Err(JanusError::InvalidSdkPath));
    assert_eq!(
        CosineEngine::initialize(Path::new("")).map(|_| ()).map_err(JanusError::from),
        Err(JanusError::InvalidSdkPath)
    );
}

fn open_janus(regions: Vec<FaceRegion>) -> Janus<CosineEngine> {
    let tmp = TempDir::new().unwrap();
    let models = tmp.path().join("models");
    std::fs::create_dir(&models).unwrap();
    std::fs::write(models.join("engine.toml"), "detect_best_face_only = false\n").unwrap();

    let engine = CosineEngine::initialize(tmp.path())
        .unwrap()
        .with_analyzer(FixedAnalyzer { regions });
    Janus::new(engine)
}

fn face(x: f32, y: f32, size: f32, confidence: f32) -> FaceRegion {
    FaceRegion {
        x,
        y,
        width: size,
        height: size,
        confidence,
        landmarks: Some([
            (x + 0.3 * size, y + 0.4 * size),
            (x + 0.7 * size, y + 0.4 * size),
            (x + 0.5 * size, y + 0.6 * size),
            (x + 0.35 * size, y + 0.8 * size),
            (x + 0.65 * size, y + 0.8 * size),
        ]),
    }
}

/// BGR image whose blue channel ramps left to right, shifted by `offset`.
fn ramp_image(size: u32, offset: u8) -> Image {
    let mut data = Vec::with_capacity((size * size * 3) as usize);
    for _y in 0..size {
        for x in 0..size {
            let v = ((x * 255 / size) as u8).wrapping_add(offset);
            data.extend_from_slice(&[v, v / 2, 255 - v]);
        }
    }
    Image::new(data, size, size, ColorSpace::Bgr24)
}

struct FixedAnalyzer {
    regions: Vec<FaceRegion>,
}

impl FaceAnalyzer for FixedAnalyzer {
    fn locate(
        &mut self,
        _gray: &[u8],
        _width: u32,
        _height: u32,
    ) -> Result<Vec<FaceRegion>, EngineError> {
        Ok(self.regions.clone())
    }

    fn embed(
        &mut self,
        gray: &[u8],
        width: u32,
        height: u32,
        region: &FaceRegion,
    ) -> Result<Vec<f32>, EngineError> {
        let x0 = region.x as u32;
        let y0 = region.y as u32;
        let x1 = ((region.x + region.width) as u32).min(width);
        let y1 = ((region.y + region.height) as u32).min(height);

        let mut bins = vec![1.0f32; 8];
        for y in y0..y1 {
            for x in x0..x1 {
                bins[(gray[(y * width + x) as usize] / 32) as usize] += 1.0;
            }
        }
        Ok(bins)
    }
}
