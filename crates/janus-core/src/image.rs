//! Raw image buffers handed to the recognition engine.

use crate::error::EngineError;

/// Pixel layout of a raw image buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// Packed 8-bit blue, green, red (3 bytes/pixel).
    Bgr24,
    /// 8-bit grayscale (1 byte/pixel).
    Gray8,
}

impl ColorSpace {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            ColorSpace::Bgr24 => 3,
            ColorSpace::Gray8 => 1,
        }
    }
}

/// A caller-supplied image, rows packed without padding.
#[derive(Debug, Clone)]
pub struct Image {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub color_space: ColorSpace,
}

impl Image {
    pub fn new(data: Vec<u8>, width: u32, height: u32, color_space: ColorSpace) -> Self {
        Self {
            data,
            width,
            height,
            color_space,
        }
    }

    /// Row stride in bytes, or `None` if it does not fit in `usize`.
    pub fn bytes_per_line(&self) -> Option<usize> {
        self.color_space.bytes_per_pixel().checked_mul(self.width as usize)
    }

    /// Check the buffer against the declared geometry.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.data.is_empty() {
            return Err(EngineError::NullImage);
        }
        if self.width == 0 || self.height == 0 {
            return Err(EngineError::InconsistentImageDimensions {
                width: self.width,
                height: self.height,
            });
        }
        let expected = self
            .bytes_per_line()
            .and_then(|line| line.checked_mul(self.height as usize))
            .ok_or(EngineError::InconsistentImageDimensions {
                width: self.width,
                height: self.height,
            })?;
        if self.data.len() != expected {
            return Err(EngineError::InvalidRawImage {
                expected,
                actual: self.data.len(),
            });
        }
        Ok(())
    }

    /// Grayscale view of the image (width * height bytes).
    ///
    /// BGR24 uses integer BT.601 luma weights.
    pub fn to_grayscale(&self) -> Result<Vec<u8>, EngineError> {
        self.validate()?;
        match self.color_space {
            ColorSpace::Gray8 => Ok(self.data.clone()),
            ColorSpace::Bgr24 => Ok(self
                .data
                .chunks_exact(3)
                .map(|px| {
                    let (b, g, r) = (px[0] as u32, px[1] as u32, px[2] as u32);
                    ((299 * r + 587 * g + 114 * b + 500) / 1000) as u8
                })
                .collect()),
        }
    }
}
