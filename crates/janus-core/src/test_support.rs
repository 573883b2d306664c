use crate::cosine::FaceAnalyzer;
use crate::error::EngineError;
use crate::image::{ColorSpace, Image};
use crate::types::FaceRegion;

/// Square face region with landmarks placed inside it.
pub fn landmarked(x: f32, y: f32, size: f32, confidence: f32) -> FaceRegion {
    let at = |fx: f32, fy: f32| (x + fx * size, y + fy * size);
    FaceRegion {
        x,
        y,
        width: size,
        height: size,
        confidence,
        landmarks: Some([at(0.3, 0.4), at(0.7, 0.4), at(0.5, 0.6), at(0.35, 0.8), at(0.65, 0.8)]),
    }
}

/// Square grayscale image of vertical stripes `period` pixels wide.
pub fn striped_image(size: u32, period: u32) -> Image {
    let data = (0..size * size)
        .map(|i| if (i % size / period) % 2 == 0 { 40 } else { 220 })
        .collect();
    Image::new(data, size, size, ColorSpace::Gray8)
}

/// Reports a fixed list of regions and signs each with a 4-bin intensity
/// histogram of its pixels.
pub struct StubAnalyzer {
    regions: Vec<FaceRegion>,
}

impl StubAnalyzer {
    pub fn new(regions: Vec<FaceRegion>) -> Self {
        Self { regions }
    }
}

impl FaceAnalyzer for StubAnalyzer {
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
        let x0 = region.x.max(0.0) as u32;
        let y0 = region.y.max(0.0) as u32;
        let x1 = ((region.x + region.width) as u32).min(width);
        let y1 = ((region.y + region.height) as u32).min(height);

        let mut bins = vec![1.0f32; 4];
        for y in y0..y1 {
            for x in x0..x1 {
                let px = gray[(y * width + x) as usize];
                bins[(px / 64) as usize] += 1.0;
            }
        }
        Ok(bins)
    }
}
