//! Feature files: one detection pass produced by an external extractor.
//!
//! ```json
//! { "faces": [ { "region": { "x": 0, "y": 0, "width": 80, "height": 80,
//!                            "confidence": 0.9, "landmarks": null },
//!                "signature": [0.1, 0.2, ...] } ] }
//! ```
//!
//! `signature` may be `null` for faces the extractor could not sign.

use anyhow::{Context, Result};
use janus_core::cosine::FaceRecord;
use janus_core::{FaceRecordSet, FaceRegion, Signature};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct FeatureFile {
    faces: Vec<FeatureFace>,
}

#[derive(Debug, Deserialize)]
struct FeatureFace {
    region: FaceRegion,
    #[serde(default)]
    signature: Option<Vec<f32>>,
}

pub fn parse_record_set(raw: &str) -> Result<FaceRecordSet<FaceRecord>> {
    let file: FeatureFile = serde_json::from_str(raw)?;
    let faces = file
        .faces
        .into_iter()
        .map(|f| {
            let signature = f
                .signature
                .filter(|values| !values.is_empty())
                .map(Signature::normalized)
                .transpose()?;
            Ok(FaceRecord {
                region: f.region,
                signature,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(FaceRecordSet::new(faces))
}

pub fn load_record_set(path: &Path) -> Result<FaceRecordSet<FaceRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading feature file {}", path.display()))?;
    parse_record_set(&raw).with_context(|| format!("parsing feature file {}", path.display()))
}
