//! JSON / JSON Lines reports.
//!
//! Batch runs stream one record per image in JSONL mode, or collect
//! everything into a single array in JSON mode.

use serde::Serialize;
use std::io::{self, Write};
use std::str::FromStr;

use crate::config::OutputConfig;
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Json,
    /// One object per line
    JsonLines,
}

impl FromStr for ReportFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Ok(Self::JsonLines),
            other => Err(ConfigError::ValidationError(format!(
                "unknown report format '{other}' (expected json or jsonl)"
            ))),
        }
    }
}

/// Serializes report items to a writer.
pub struct ReportWriter<W: Write> {
    writer: W,
    format: ReportFormat,
    pretty: bool,
    pending: Vec<serde_json::Value>,
    items_written: usize,
}

impl<W: Write> ReportWriter<W> {
    /// `pretty` only affects JSON mode.
    pub fn new(writer: W, format: ReportFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
            pending: Vec::new(),
            items_written: 0,
        }
    }

    pub fn from_config(writer: W, config: &OutputConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(writer, config.format.parse()?, config.pretty))
    }

    /// JSONL items are written immediately; JSON items are held until
    /// [`finish`](Self::finish).
    pub fn push<T: Serialize>(&mut self, item: &T) -> io::Result<()> {
        match self.format {
            ReportFormat::JsonLines => {
                serde_json::to_writer(&mut self.writer, item).map_err(io::Error::other)?;
                writeln!(self.writer)?;
                self.writer.flush()?;
            }
            ReportFormat::Json => {
                self.pending
                    .push(serde_json::to_value(item).map_err(io::Error::other)?);
            }
        }
        self.items_written += 1;
        Ok(())
    }

    /// Write a single value outside the batch stream.
    pub fn write_one<T: Serialize>(&mut self, item: &T) -> io::Result<()> {
        if self.pretty && self.format == ReportFormat::Json {
            serde_json::to_writer_pretty(&mut self.writer, item).map_err(io::Error::other)?;
        } else {
            serde_json::to_writer(&mut self.writer, item).map_err(io::Error::other)?;
        }
        writeln!(self.writer)?;
        self.items_written += 1;
        Ok(())
    }

    pub fn items_written(&self) -> usize {
        self.items_written
    }

    /// Emit the JSON array (if any) and flush; returns the writer.
    pub fn finish(mut self) -> io::Result<W> {
        if self.format == ReportFormat::Json {
            let items = std::mem::take(&mut self.pending);
            if self.pretty {
                serde_json::to_writer_pretty(&mut self.writer, &items)
                    .map_err(io::Error::other)?;
            } else {
                serde_json::to_writer(&mut self.writer, &items).map_err(io::Error::other)?;
            }
            writeln!(self.writer)?;
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}
