//! Prism Core - photo color transforms, aesthetic presets, and the
//! orchestrator that drives images from upload to enhanced output.
//!
//! # Architecture
//!
//! ```text
//! bytes → submit → analyze (vision / local / static) → plan EditingConfig
//!       → resolve TransformOptions → color pipeline → encode → output store
//! ```
//!
//! The color engine ([`color`], [`engine`]) is pure and synchronous. The
//! [`orchestrator`] persists an [`ImageRecord`] per image and advances it one
//! idempotent stage at a time, so a crashed or concurrent run can resume.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use prism_core::{Config, EnhancementEngine, ImageId, LocalAnalyzer, Orchestrator};
//! use prism_core::storage::{MemoryBlobStore, MemoryRecordStore};
//!
//! #[tokio::main]
//! async fn main() -> prism_core::Result<()> {
//!     let config = Config::load()?;
//!     let orchestrator = Orchestrator::new(
//!         Arc::new(MemoryRecordStore::new()),
//!         Arc::new(MemoryBlobStore::new()),
//!         Arc::new(LocalAnalyzer::default()),
//!         EnhancementEngine::from_config(&config),
//!     );
//!
//!     let id = ImageId::new("beach");
//!     orchestrator.submit(id.clone(), &std::fs::read("beach.jpg")?).await?;
//!     let record = orchestrator.drive(&id).await?;
//!     println!("{}: {}", record.id, record.status);
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod cache;
pub mod catalog;
pub mod color;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod hash;
pub mod orchestrator;
pub mod output;
pub mod quality;
pub mod recommend;
pub mod storage;
pub mod types;

pub use analysis::{ContentAnalyzer, LocalAnalyzer, StaticAnalyzer, VisionAnalyzer};
pub use cache::AnalysisCache;
pub use catalog::AestheticCatalog;
pub use color::{Pixel, TransformOptions};
pub use config::Config;
pub use discovery::{DiscoveredFile, FileDiscovery};
pub use engine::{EnhancementEngine, OutputFormat, PixelBuffer};
pub use error::{AnalysisError, ConfigError, EngineError, PrismError, Result, StorageError};
pub use orchestrator::{ImageRecord, ImageStatus, Orchestrator, OrchestratorSettings};
pub use output::{ReportFormat, ReportWriter};
pub use quality::{QualityComparison, QualityMetrics};
pub use recommend::{recommend_filters, FilterRecommendation};
pub use types::{AnalysisResult, EditingConfig, ImageId, Intensity, Locator};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_gradient_round_trips_through_codec() {
        use crate::engine::{BitmapCodec, ImageCodec};
        let buffer = test_support::gradient(4, 3);
        let decoded = ImageCodec::default()
            .decode(&test_support::png_bytes(&buffer))
            .unwrap();
        assert_eq!(decoded.buffer, buffer);
    }
}
