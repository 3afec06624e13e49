//! Color math: per-pixel operations, affine color matrices, and the
//! sparse option record that drives them.
//!
//! - **pixel**: total per-pixel functions (brightness, contrast, gamma, HSV ops)
//! - **matrix**: 4x5 affine matrices, composition, and the gamma lookup table
//! - **options**: `TransformOptions` with range validation, merging, and scaling

pub mod matrix;
pub mod options;
pub mod pixel;

pub use matrix::{ColorMatrix, GammaLut};
pub use options::{scale_gamma, TransformOptions};
pub use pixel::{HsvPixel, Pixel};
