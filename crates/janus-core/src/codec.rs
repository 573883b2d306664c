//! Flat template binary codec.
//!
//! A flat template is a sequence of chunks:
//!
//! ```text
//! repeat until the buffer is consumed:
//!     length : u64, little-endian
//!     blob   : `length` bytes, engine-native record set serialization
//! ```
//!
//! The encoder caps the total size at [`MAX_TEMPLATE_SIZE`] by dropping trailing
//! record sets; a chunk is never written partially. The decoder rejects buffers
//! that do not end exactly on a chunk boundary.
//!
//! Filtering is asymmetric: flattening keeps faces without a signature, while
//! unflattening into a gallery drops them.

use thiserror::Error;

use crate::engine::RecognitionEngine;
use crate::error::EngineError;
use crate::template::{FaceRecordSet, Template};
use crate::types::{FaceId, SubjectId};

/// Maximum size of a flat template in bytes (32 MiB).
pub const MAX_TEMPLATE_SIZE: usize = 33_554_432;

/// Size of the chunk length header.
pub const CHUNK_HEADER_LEN: usize = std::mem::size_of::<u64>();

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("truncated chunk header at offset {offset}: {remaining} bytes left")]
    TruncatedHeader { offset: usize, remaining: usize },
    #[error("truncated chunk at offset {offset}: declared {declared} bytes, {remaining} left")]
    TruncatedChunk {
        offset: usize,
        declared: u64,
        remaining: usize,
    },
    #[error("engine: {0}")]
    Engine(#[from] EngineError),
}

/// Accumulates length-prefixed chunks up to a byte limit.
pub struct ChunkWriter {
    buf: Vec<u8>,
    limit: usize,
    full: bool,
}

impl ChunkWriter {
    pub fn new() -> Self {
        Self::with_limit(MAX_TEMPLATE_SIZE)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            buf: Vec::new(),
            limit,
            full: false,
        }
    }

    /// Append one chunk. Returns `false` without writing anything if the chunk
    /// would push the buffer past the limit; every later push is refused too.
    pub fn push(&mut self, blob: &[u8]) -> bool {
        if self.full {
            return false;
        }
        let needed = CHUNK_HEADER_LEN.saturating_add(blob.len());
        if self.buf.len().saturating_add(needed) > self.limit {
            self.full = true;
            return false;
        }
        self.buf.extend_from_slice(&(blob.len() as u64).to_le_bytes());
        self.buf.extend_from_slice(blob);
        true
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

impl Default for ChunkWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterates the chunk bodies of a flat template.
///
/// Yields an error (and then stops) if the buffer does not end on a chunk boundary.
pub struct ChunkReader<'a> {
    data: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> ChunkReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: 0,
            failed: false,
        }
    }

    fn fail(&mut self, err: CodecError) -> Option<Result<&'a [u8], CodecError>> {
        self.failed = true;
        Some(Err(err))
    }
}

impl<'a> Iterator for ChunkReader<'a> {
    type Item = Result<&'a [u8], CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset == self.data.len() {
            return None;
        }

        let offset = self.offset;
        let rest = &self.data[offset..];
        if rest.len() < CHUNK_HEADER_LEN {
            return self.fail(CodecError::TruncatedHeader {
                offset,
                remaining: rest.len(),
            });
        }
        let (header, body) = rest.split_at(CHUNK_HEADER_LEN);
        let mut len_bytes = [0u8; CHUNK_HEADER_LEN];
        len_bytes.copy_from_slice(header);

        let declared = u64::from_le_bytes(len_bytes);
        let len = match usize::try_from(declared) {
            Ok(len) if len <= body.len() => len,
            _ => {
                return self.fail(CodecError::TruncatedChunk {
                    offset,
                    declared,
                    remaining: body.len(),
                })
            }
        };

        self.offset = offset + CHUNK_HEADER_LEN + len;
        Some(Ok(&body[..len]))
    }
}

/// Serialize every record set of `template`, in order, into a flat template.
///
/// Stops at the first record set that would exceed [`MAX_TEMPLATE_SIZE`] and
/// returns what fit; truncation is not an error.
pub fn flatten_template<E: RecognitionEngine>(
    engine: &E,
    template: &Template<E::FaceRecord>,
) -> Result<Vec<u8>, EngineError> {
    flatten_template_with_limit(engine, template, MAX_TEMPLATE_SIZE)
}

pub(crate) fn flatten_template_with_limit<E: RecognitionEngine>(
    engine: &E,
    template: &Template<E::FaceRecord>,
    limit: usize,
) -> Result<Vec<u8>, EngineError> {
    let mut writer = ChunkWriter::with_limit(limit);
    let mut written = 0usize;

    for set in template.record_sets() {
        let blob = engine.serialize_record_set(set.faces())?;
        if !writer.push(&blob) {
            tracing::warn!(
                kept = written,
                dropped = template.len() - written,
                bytes = writer.len(),
                limit,
                "flatten: template truncated at size limit"
            );
            break;
        }
        written += 1;
    }

    tracing::debug!(record_sets = written, bytes = writer.len(), "flatten: done");
    Ok(writer.into_bytes())
}

/// Decode a flat template into `gallery`, keeping only faces that carry a
/// signature, all under `subject_id`.
///
/// Face ids are assigned from a counter local to this call, starting at 0.
/// Returns the number of faces added.
pub fn unflatten_into<E: RecognitionEngine>(
    engine: &E,
    flat: &[u8],
    subject_id: SubjectId,
    gallery: &mut E::Gallery,
) -> Result<usize, CodecError> {
    let mut next_face_id: FaceId = 0;
    let mut dropped = 0usize;

    for chunk in ChunkReader::new(flat) {
        let faces = engine.deserialize_record_set(chunk?)?;
        for face in &faces {
            if !engine.has_signature(face) {
                dropped += 1;
                continue;
            }
            engine.add_face(gallery, face, subject_id, next_face_id)?;
            next_face_id += 1;
        }
    }

    tracing::debug!(
        subject_id,
        added = next_face_id,
        dropped,
        bytes = flat.len(),
        "unflatten: done"
    );
    Ok(next_face_id as usize)
}

/// Decode a flat template back into a [`Template`], without filtering.
pub fn unflatten_template<E: RecognitionEngine>(
    engine: &E,
    flat: &[u8],
) -> Result<Template<E::FaceRecord>, CodecError> {
    let mut template = Template::new();
    for chunk in ChunkReader::new(flat) {
        let faces = engine.deserialize_record_set(chunk?)?;
        template.push(FaceRecordSet::new(faces));
    }
    Ok(template)
}

/// Chunk-level summary of one record set in a flat template.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ChunkSummary {
    pub offset: usize,
    pub bytes: usize,
    pub faces: usize,
    pub signatures: usize,
}

/// Summarize every chunk of a flat template.
pub fn inspect_template<E: RecognitionEngine>(
    engine: &E,
    flat: &[u8],
) -> Result<Vec<ChunkSummary>, CodecError> {
    let mut summaries = Vec::new();
    let mut offset = 0usize;
    for chunk in ChunkReader::new(flat) {
        let chunk = chunk?;
        let faces = engine.deserialize_record_set(chunk)?;
        summaries.push(ChunkSummary {
            offset,
            bytes: chunk.len(),
            faces: faces.len(),
            signatures: faces.iter().filter(|f| engine.has_signature(f)).count(),
        });
        offset += CHUNK_HEADER_LEN + chunk.len();
    }
    Ok(summaries)
}
