//! Finding input images on disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::{LimitsConfig, ProcessingConfig};
use crate::types::ImageId;

/// Walks paths for supported image files.
pub struct FileDiscovery {
    supported_formats: Vec<String>,
    max_bytes: u64,
}

/// A file accepted for processing.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub size: u64,
    /// File stem, suffixed `-2`, `-3`, ... when stems collide.
    pub id: ImageId,
}

/// A file found but not accepted.
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct Discovery {
    pub files: Vec<DiscoveredFile>,
    pub skipped: Vec<SkippedFile>,
}

impl Discovery {
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }
}

impl FileDiscovery {
    pub fn new(processing: &ProcessingConfig, limits: &LimitsConfig) -> Self {
        Self {
            supported_formats: processing
                .supported_formats
                .iter()
                .map(|f| f.to_lowercase())
                .collect(),
            max_bytes: limits.max_file_size_mb.saturating_mul(1024 * 1024),
        }
    }

    /// Discover supported files at `path`, sorted by path.
    ///
    /// A file path is returned as-is if supported; directories are walked
    /// recursively. Files over the size limit are reported as skipped.
    pub fn discover(&self, path: &Path) -> Discovery {
        let candidates: Vec<(PathBuf, u64)> = if path.is_file() {
            std::fs::metadata(path)
                .map(|meta| vec![(path.to_path_buf(), meta.len())])
                .unwrap_or_default()
        } else {
            WalkDir::new(path)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .filter_map(|e| {
                    let size = e.metadata().ok()?.len();
                    Some((e.into_path(), size))
                })
                .collect()
        };

        let mut discovery = Discovery::default();
        let mut accepted = Vec::new();
        for (path, size) in candidates {
            if !self.is_supported(&path) {
                continue;
            }
            if size > self.max_bytes {
                tracing::warn!("Skipping {path:?}: {size} bytes exceeds limit");
                discovery.skipped.push(SkippedFile {
                    path,
                    reason: format!("file too large ({} MB)", size / (1024 * 1024)),
                });
                continue;
            }
            accepted.push((path, size));
        }
        accepted.sort();

        let mut seen: HashMap<String, usize> = HashMap::new();
        for (path, size) in accepted {
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("image")
                .replace(['/', '\\'], "_");
            let count = seen.entry(stem.clone()).or_insert(0);
            *count += 1;
            let id = if *count == 1 {
                stem
            } else {
                format!("{stem}-{count}")
            };
            discovery.files.push(DiscoveredFile {
                path,
                size,
                id: ImageId::new(id),
            });
        }
        discovery
    }

    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.supported_formats.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }
}
