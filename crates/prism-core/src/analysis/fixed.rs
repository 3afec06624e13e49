use async_trait::async_trait;
use std::path::Path;

use super::provider::ImageInput;
use super::ContentAnalyzer;
use crate::error::{AnalysisError, PrismError};
use crate::types::AnalysisResult;

/// Returns the same pre-computed analysis for every image.
#[derive(Debug, Clone)]
pub struct StaticAnalyzer {
    result: AnalysisResult,
}

impl StaticAnalyzer {
    pub fn new(result: AnalysisResult) -> Self {
        Self { result }
    }

    /// Load an analysis JSON file; scores are validated on load.
    pub fn from_file(path: &Path) -> Result<Self, PrismError> {
        let content = std::fs::read_to_string(path)?;
        let result: AnalysisResult = serde_json::from_str(&content)?;
        result.validate()?;
        Ok(Self::new(result))
    }

    pub fn result(&self) -> &AnalysisResult {
        &self.result
    }
}

#[async_trait]
impl ContentAnalyzer for StaticAnalyzer {
    fn name(&self) -> &str {
        "static"
    }

    async fn analyze(&self, _image: &ImageInput) -> Result<AnalysisResult, AnalysisError> {
        Ok(self.result.clone())
    }
}
