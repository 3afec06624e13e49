//! The enhancement engine: resolve an adjustment into transform options
//! and apply them to a decoded bitmap.
//!
//! - **options**: `Adjustment` and its resolution into `TransformOptions`
//! - **pipeline**: composed matrix + gamma pass over a `PixelBuffer`
//! - **codec**: `BitmapCodec` seam and the `image`-crate implementation
//! - **planner**: `ConfigPlanner`, analysis to `EditingConfig`
//! - **batch**: bounded fan-out over many images

pub mod batch;
pub mod codec;
pub mod options;
pub mod pipeline;
pub mod planner;

pub use batch::{BatchItem, BatchOutcome};
pub use codec::{BitmapCodec, DecodedBitmap, ImageCodec, OutputFormat, PixelBuffer};
pub use options::{resolve_config, resolve_options, Adjustment, ResolvedOptions};
pub use pipeline::{apply_options, CompiledTransform};
pub use planner::{default_config, ConfigPlanner};

use serde::Serialize;
use std::sync::Arc;

use crate::catalog::AestheticCatalog;
use crate::color::TransformOptions;
use crate::config::Config;
use crate::error::EngineResult;
use crate::types::AnalysisResult;

/// Encoded output of one enhancement.
#[derive(Debug, Clone, Serialize)]
pub struct EnhancedImage {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    pub options: TransformOptions,
    pub preset_id: Option<String>,
}

/// An enhancement together with the buffers on either side of it.
#[derive(Debug, Clone)]
pub struct EnhancementOutput {
    pub image: EnhancedImage,
    pub before: PixelBuffer,
    pub after: PixelBuffer,
}

/// Decodes, transforms, and re-encodes images.
///
/// Cheap to clone; the codec is shared.
#[derive(Clone)]
pub struct EnhancementEngine {
    catalog: AestheticCatalog,
    codec: Arc<dyn BitmapCodec>,
    output_format: OutputFormat,
}

impl Default for EnhancementEngine {
    fn default() -> Self {
        Self::new(Arc::new(ImageCodec::default()))
    }
}

impl std::fmt::Debug for EnhancementEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnhancementEngine")
            .field("output_format", &self.output_format)
            .finish_non_exhaustive()
    }
}

impl EnhancementEngine {
    pub fn new(codec: Arc<dyn BitmapCodec>) -> Self {
        Self {
            catalog: AestheticCatalog::builtin(),
            codec,
            output_format: OutputFormat::default(),
        }
    }

    /// Engine configured from `[limits]` and `[enhancement]`.
    pub fn from_config(config: &Config) -> Self {
        let codec = ImageCodec::new(
            config.limits.max_image_dimension,
            config.enhancement.jpeg_quality,
        );
        Self::new(Arc::new(codec)).with_output_format(config.enhancement.output_format)
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    pub fn catalog(&self) -> &AestheticCatalog {
        &self.catalog
    }

    pub fn codec(&self) -> &dyn BitmapCodec {
        self.codec.as_ref()
    }

    pub fn resolve(
        &self,
        analysis: Option<&AnalysisResult>,
        adjustment: &Adjustment,
    ) -> EngineResult<ResolvedOptions> {
        resolve_options(&self.catalog, analysis, adjustment)
    }

    /// Transform an already decoded buffer.
    pub fn enhance_buffer(
        &self,
        buffer: &PixelBuffer,
        analysis: Option<&AnalysisResult>,
        adjustment: &Adjustment,
    ) -> EngineResult<(PixelBuffer, ResolvedOptions)> {
        let resolved = self.resolve(analysis, adjustment)?;
        Ok((apply_options(buffer, &resolved.options), resolved))
    }

    /// Decode, transform, and encode, keeping both buffers.
    ///
    /// Parameters are resolved before decoding so an invalid config fails
    /// without paying for the decode.
    pub fn process(
        &self,
        bytes: &[u8],
        analysis: Option<&AnalysisResult>,
        adjustment: &Adjustment,
    ) -> EngineResult<EnhancementOutput> {
        let resolved = self.resolve(analysis, adjustment)?;
        let decoded = self.codec.decode(bytes)?;
        let before = decoded.buffer;
        let after = apply_options(&before, &resolved.options);
        let encoded = self.codec.encode(&after, self.output_format)?;

        tracing::debug!(
            "Enhanced {}x{} image (preset {:?})",
            after.width,
            after.height,
            resolved.preset_id
        );

        Ok(EnhancementOutput {
            image: EnhancedImage {
                bytes: encoded,
                width: after.width,
                height: after.height,
                format: self.output_format,
                options: resolved.options,
                preset_id: resolved.preset_id,
            },
            before,
            after,
        })
    }

    /// Decode, transform, and encode.
    pub fn enhance(
        &self,
        bytes: &[u8],
        analysis: Option<&AnalysisResult>,
        adjustment: &Adjustment,
    ) -> EngineResult<EnhancedImage> {
        self.process(bytes, analysis, adjustment).map(|out| out.image)
    }
}
