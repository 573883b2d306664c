//! Native values of the cosine engine and their blob encodings.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::error::EngineError;
use crate::types::{FaceId, FaceRegion, Signature, Similarity, SubjectId};

const RECORD_SET_VERSION: u32 = 1;
const GALLERY_VERSION: u32 = 1;

/// A detected face and, once extracted, its signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceRecord {
    pub region: FaceRegion,
    pub signature: Option<Signature>,
}

impl FaceRecord {
    pub fn detected(region: FaceRegion) -> Self {
        Self {
            region,
            signature: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrolledFace {
    pub subject_id: SubjectId,
    pub face_id: FaceId,
    pub signature: Signature,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CosineGallery {
    faces: Vec<EnrolledFace>,
}

impl CosineGallery {
    pub fn faces(&self) -> &[EnrolledFace] {
        &self.faces
    }

    pub fn push(&mut self, face: EnrolledFace) {
        self.faces.push(face);
    }

    /// Distinct subject ids, ascending.
    pub fn subject_ids(&self) -> Vec<SubjectId> {
        self.faces
            .iter()
            .map(|f| f.subject_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Best pairwise score for every (probe subject, target subject) pair that
/// had at least one comparable signature pair.
#[derive(Debug, Clone, Default)]
pub struct SimilarityMatrix {
    scores: HashMap<(SubjectId, SubjectId), f32>,
}

impl SimilarityMatrix {
    pub fn build(probe: &CosineGallery, target: &CosineGallery) -> Self {
        let mut scores: HashMap<(SubjectId, SubjectId), f32> = HashMap::new();
        for p in probe.faces() {
            for t in target.faces() {
                let Some(score) = p.signature.similarity(&t.signature) else {
                    continue;
                };
                scores
                    .entry((p.subject_id, t.subject_id))
                    .and_modify(|best| *best = best.max(score))
                    .or_insert(score);
            }
        }
        Self { scores }
    }

    pub fn get(&self, probe: SubjectId, target: SubjectId) -> Similarity {
        self.scores
            .get(&(probe, target))
            .map_or(Similarity::NoComparison, |&s| Similarity::from_raw(s))
    }
}

#[derive(Serialize)]
struct RecordSetOut<'a> {
    version: u32,
    faces: &'a [FaceRecord],
}

#[derive(Deserialize)]
struct RecordSetIn {
    version: u32,
    faces: Vec<FaceRecord>,
}

#[derive(Serialize)]
struct GalleryOut<'a> {
    version: u32,
    faces: &'a [EnrolledFace],
}

#[derive(Deserialize)]
struct GalleryIn {
    version: u32,
    faces: Vec<EnrolledFace>,
}

pub fn encode_record_set(faces: &[FaceRecord]) -> Result<Vec<u8>, EngineError> {
    Ok(serde_json::to_vec(&RecordSetOut {
        version: RECORD_SET_VERSION,
        faces,
    })?)
}

pub fn decode_record_set(blob: &[u8]) -> Result<Vec<FaceRecord>, EngineError> {
    let parsed: RecordSetIn = serde_json::from_slice(blob)
        .map_err(|e| EngineError::CorruptRecordSet(e.to_string()))?;
    if parsed.version != RECORD_SET_VERSION {
        return Err(EngineError::UnsupportedVersion {
            kind: "record set",
            version: parsed.version,
        });
    }
    Ok(parsed.faces)
}

pub fn encode_gallery(gallery: &CosineGallery) -> Result<Vec<u8>, EngineError> {
    Ok(serde_json::to_vec(&GalleryOut {
        version: GALLERY_VERSION,
        faces: &gallery.faces,
    })?)
}

pub fn decode_gallery(blob: &[u8]) -> Result<CosineGallery, EngineError> {
    let parsed: GalleryIn =
        serde_json::from_slice(blob).map_err(|e| EngineError::CorruptGallery(e.to_string()))?;
    if parsed.version != GALLERY_VERSION {
        return Err(EngineError::UnsupportedVersion {
            kind: "gallery",
            version: parsed.version,
        });
    }
    Ok(CosineGallery {
        faces: parsed.faces,
    })
}
