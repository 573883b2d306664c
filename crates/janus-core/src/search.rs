//! 1:N ranked search of a probe template against a flat gallery.

use crate::codec::{unflatten_into, CodecError};
use crate::engine::RecognitionEngine;
use crate::types::{Similarity, SubjectId};

const PROBE_SUBJECT: SubjectId = 0;

/// One ranked search result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub subject_id: SubjectId,
    pub similarity: Similarity,
}

/// Ranked candidates, best first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResult {
    pub candidates: Vec<Candidate>,
}

impl SearchResult {
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn ids(&self) -> Vec<SubjectId> {
        self.candidates.iter().map(|c| c.subject_id).collect()
    }

    /// Scores parallel to [`ids`](Self::ids); `None` where no comparison was possible.
    pub fn scores(&self) -> Vec<Option<f32>> {
        self.candidates.iter().map(|c| c.similarity.score()).collect()
    }
}

/// Rank every subject of `gallery` against `probe` and keep the best `k`.
pub fn search<E: RecognitionEngine>(
    engine: &E,
    probe: &[u8],
    gallery: &[u8],
    k: usize,
) -> Result<SearchResult, CodecError> {
    let mut probe_gallery = engine.create_gallery()?;
    let probe_faces = unflatten_into(engine, probe, PROBE_SUBJECT, &mut probe_gallery)?;

    let target = engine.deserialize_gallery(gallery)?;
    let matrix = engine.compare(&probe_gallery, &target)?;

    let candidates: Vec<Candidate> = engine
        .subject_ids(&target)
        .into_iter()
        .map(|subject_id| Candidate {
            subject_id,
            similarity: engine.subject_similarity(&matrix, PROBE_SUBJECT, subject_id),
        })
        .collect();

    let ranked = rank(candidates, k);
    tracing::debug!(probe_faces, requested = k, returned = ranked.len(), "search: done");
    Ok(SearchResult { candidates: ranked })
}

/// Sort by descending similarity and keep the first `min(k, len)` candidates.
///
/// NaN scores are ranked as `NoComparison`. The sort is stable, so ties keep
/// the engine's subject enumeration order.
pub fn rank(mut candidates: Vec<Candidate>, k: usize) -> Vec<Candidate> {
    for candidate in candidates.iter_mut() {
        candidate.similarity = candidate.similarity.sanitized();
    }
    candidates.sort_by(|a, b| a.similarity.rank_cmp(&b.similarity));
    candidates.truncate(k);
    candidates
}
