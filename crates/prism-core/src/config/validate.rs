//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

fn invalid(message: &str) -> ConfigError {
    ConfigError::ValidationError(message.into())
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.processing.parallel_workers == 0 {
            return Err(invalid("processing.parallel_workers must be > 0"));
        }
        if self.pipeline.buffer_size == 0 {
            return Err(invalid("pipeline.buffer_size must be > 0"));
        }
        if self.pipeline.max_analysis_attempts == 0 {
            return Err(invalid("pipeline.max_analysis_attempts must be > 0"));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(invalid("limits.max_file_size_mb must be > 0"));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(invalid("limits.max_image_dimension must be > 0"));
        }
        if self.limits.decode_timeout_ms == 0 {
            return Err(invalid("limits.decode_timeout_ms must be > 0"));
        }
        if self.limits.analysis_timeout_ms == 0 {
            return Err(invalid("limits.analysis_timeout_ms must be > 0"));
        }
        if self.limits.enhance_timeout_ms == 0 {
            return Err(invalid("limits.enhance_timeout_ms must be > 0"));
        }
        if !(1..=100).contains(&self.enhancement.jpeg_quality) {
            return Err(invalid("enhancement.jpeg_quality must be between 1 and 100"));
        }
        if self.cache.enabled && self.cache.capacity == 0 {
            return Err(invalid("cache.capacity must be > 0 when the cache is enabled"));
        }
        Ok(())
    }
}
