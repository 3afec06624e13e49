//! Sub-configuration structs and their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::engine::OutputFormat;
use crate::types::Intensity;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory for image records and blobs
    pub state_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from("~/.prism/state"),
        }
    }
}

/// Processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of images driven concurrently
    pub parallel_workers: usize,

    /// Input file extensions picked up by discovery
    pub supported_formats: Vec<String>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            parallel_workers: 4,
            supported_formats: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
                "webp".to_string(),
                "gif".to_string(),
                "tiff".to_string(),
                "bmp".to_string(),
            ],
        }
    }
}

/// Orchestrator settings for backpressure and retries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Capacity of the image event channel
    pub buffer_size: usize,

    /// In-place retries for transient analysis failures
    pub retry_attempts: u32,

    /// Base backoff delay between retries in milliseconds
    pub retry_delay_ms: u64,

    /// Analysis attempts (across deferrals) before an image is failed
    pub max_analysis_attempts: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            buffer_size: 100,
            retry_attempts: 3,
            retry_delay_ms: 1000,
            max_analysis_attempts: 5,
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,

    /// Decode timeout in milliseconds
    pub decode_timeout_ms: u64,

    /// Content analysis timeout in milliseconds
    pub analysis_timeout_ms: u64,

    /// Enhancement timeout in milliseconds
    pub enhance_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 100,
            max_image_dimension: 10000,
            decode_timeout_ms: 5000,
            analysis_timeout_ms: 60000,
            enhance_timeout_ms: 30000,
        }
    }
}

/// Analysis result cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,

    /// Maximum cached analyses
    pub capacity: usize,

    /// Entry lifetime in seconds
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 256,
            ttl_secs: 3600,
        }
    }
}

/// Enhancement output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhancementConfig {
    /// Intensity used when none is given on the command line
    pub default_intensity: Intensity,

    /// Encoded output format
    pub output_format: OutputFormat,

    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
}

impl Default for EnhancementConfig {
    fn default() -> Self {
        Self {
            default_intensity: Intensity::Medium,
            output_format: OutputFormat::Jpeg,
            jpeg_quality: 90,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default report format ("json" or "jsonl")
    pub format: String,

    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
            pretty: false,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Vision provider configurations for content analysis.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Ollama (local) configuration
    pub ollama: Option<OllamaConfig>,

    /// Hyperbolic (OpenAI-compatible cloud) configuration
    pub hyperbolic: Option<HyperbolicConfig>,

    /// Anthropic configuration
    pub anthropic: Option<AnthropicConfig>,

    /// OpenAI configuration
    pub openai: Option<OpenAiConfig>,
}

/// Ollama configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama API endpoint
    pub endpoint: String,

    /// Model name
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3.2-vision".to_string(),
        }
    }
}

/// Hyperbolic configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HyperbolicConfig {
    /// API endpoint
    pub endpoint: String,

    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Model name
    pub model: String,
}

impl Default for HyperbolicConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.hyperbolic.xyz/v1".to_string(),
            api_key: "${HYPERBOLIC_API_KEY}".to_string(),
            model: "Qwen/Qwen2.5-VL-7B-Instruct".to_string(),
        }
    }
}

/// Anthropic configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Model name
    pub model: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: "${ANTHROPIC_API_KEY}".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
        }
    }
}

/// OpenAI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Model name
    pub model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: "${OPENAI_API_KEY}".to_string(),
            model: "gpt-4o-mini".to_string(),
        }
    }
}
