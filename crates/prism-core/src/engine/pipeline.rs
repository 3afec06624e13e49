//! Pixel pipeline: one composed affine matrix, then the gamma table.

use crate::color::{ColorMatrix, GammaLut, TransformOptions};

use super::codec::PixelBuffer;

/// A compiled set of options, reusable across buffers.
#[derive(Debug, Clone)]
pub struct CompiledTransform {
    matrix: ColorMatrix,
    gamma: Option<GammaLut>,
}

impl CompiledTransform {
    pub fn new(options: &TransformOptions) -> Self {
        Self {
            matrix: ColorMatrix::from_options(options),
            gamma: GammaLut::for_options(options),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.matrix.is_identity() && self.gamma.is_none()
    }

    /// Apply to `input`, returning a new buffer of the same dimensions.
    pub fn apply(&self, input: &PixelBuffer) -> PixelBuffer {
        if self.is_identity() {
            return input.clone();
        }
        match &self.gamma {
            Some(lut) => input.map_pixels(|p| lut.apply(self.matrix.apply(p))),
            None => input.map_pixels(|p| self.matrix.apply(p)),
        }
    }
}

/// Apply validated options to a buffer. The input is never mutated.
pub fn apply_options(input: &PixelBuffer, options: &TransformOptions) -> PixelBuffer {
    CompiledTransform::new(options).apply(input)
}
