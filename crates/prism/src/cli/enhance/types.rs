//! Value enums for the enhance command.

use clap::ValueEnum;
use prism_core::{Intensity, ReportFormat};

/// Report formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormatArg {
    /// One JSON array
    Json,
    /// One JSON object per line
    Jsonl,
}

impl From<ReportFormatArg> for ReportFormat {
    fn from(value: ReportFormatArg) -> Self {
        match value {
            ReportFormatArg::Json => ReportFormat::Json,
            ReportFormatArg::Jsonl => ReportFormat::JsonLines,
        }
    }
}

/// Vision providers for content analysis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ProviderArg {
    /// Local Ollama instance
    Ollama,
    /// Hyperbolic API
    Hyperbolic,
    /// Anthropic API
    Anthropic,
    /// OpenAI API
    Openai,
}

impl std::fmt::Display for ProviderArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderArg::Ollama => write!(f, "ollama"),
            ProviderArg::Hyperbolic => write!(f, "hyperbolic"),
            ProviderArg::Anthropic => write!(f, "anthropic"),
            ProviderArg::Openai => write!(f, "openai"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum IntensityArg {
    Light,
    Medium,
    Strong,
}

impl From<IntensityArg> for Intensity {
    fn from(value: IntensityArg) -> Self {
        match value {
            IntensityArg::Light => Intensity::Light,
            IntensityArg::Medium => Intensity::Medium,
            IntensityArg::Strong => Intensity::Strong,
        }
    }
}
