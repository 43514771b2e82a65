//! Writing generated files to disk

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ReverseError, Result};

/// A rendered file, not yet written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub content: String,
}

impl GeneratedFile {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    /// Report what would change without touching the filesystem
    pub dry_run: bool,
    /// Fail if anything would change
    pub check: bool,
}

#[derive(Debug, Default)]
pub struct WriteSummary {
    pub changed: Vec<PathBuf>,
    pub written: Vec<PathBuf>,
}

impl WriteSummary {
    pub fn extend(&mut self, other: WriteSummary) {
        self.changed.extend(other.changed);
        self.written.extend(other.written);
    }
}

/// Write files whose content differs from what is on disk
pub fn write_files(files: &[GeneratedFile], opts: WriteOptions) -> Result<WriteSummary> {
    let mut summary = WriteSummary::default();

    for f in files {
        let existing = std::fs::read_to_string(&f.path).ok();
        if existing.as_deref() != Some(f.content.as_str()) {
            summary.changed.push(f.path.clone());
        } else {
            debug!("Unchanged: {}", f.path.display());
        }
    }

    if opts.dry_run {
        for p in &summary.changed {
            info!("Would write {}", p.display());
        }
        return Ok(summary);
    }

    if opts.check {
        if !summary.changed.is_empty() {
            let paths: Vec<String> = summary
                .changed
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            return Err(ReverseError::ValidationError(format!(
                "generated files are out of date: {}",
                paths.join(", ")
            )));
        }
        return Ok(summary);
    }

    for f in files {
        if !summary.changed.contains(&f.path) {
            continue;
        }
        write_atomic(&f.path, &f.content)?;
        info!("Wrote {}", f.path.display());
        summary.written.push(f.path.clone());
    }

    Ok(summary)
}

fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let tmp = tmp_path(path);
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => path.with_extension(format!("{ext}.tmp")),
        None => path.with_extension("tmp"),
    }
}
