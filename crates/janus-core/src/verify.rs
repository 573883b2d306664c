//! 1:1 verification of two flat templates.

use crate::codec::{unflatten_into, CodecError};
use crate::engine::RecognitionEngine;
use crate::types::{Similarity, SubjectId};

/// Subject id both sides are decoded under; single-template comparison
/// carries no external ids.
const VERIFY_SUBJECT: SubjectId = 0;

/// Result of a verification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verification {
    /// At least one side decoded to no signature-bearing face.
    Rejected,
    /// Both sides had faces and the engine compared them.
    Compared(Similarity),
}

/// Decode both templates into ephemeral galleries and compare them.
///
/// Does not touch any enrollment state.
pub fn verify<E: RecognitionEngine>(
    engine: &E,
    a: &[u8],
    b: &[u8],
) -> Result<Verification, CodecError> {
    let mut query = engine.create_gallery()?;
    let query_faces = unflatten_into(engine, a, VERIFY_SUBJECT, &mut query)?;

    let mut target = engine.create_gallery()?;
    let target_faces = unflatten_into(engine, b, VERIFY_SUBJECT, &mut target)?;

    if query_faces == 0 || target_faces == 0 {
        tracing::debug!(query_faces, target_faces, "verify: no signatures, rejecting");
        return Ok(Verification::Rejected);
    }

    let matrix = engine.compare(&query, &target)?;
    let similarity = engine
        .subject_similarity(&matrix, VERIFY_SUBJECT, VERIFY_SUBJECT)
        .sanitized();

    tracing::debug!(query_faces, target_faces, ?similarity, "verify: compared");
    Ok(Verification::Compared(similarity))
}
