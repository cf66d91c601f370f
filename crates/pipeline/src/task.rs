use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::EncodeConfig;
use crate::error::{PipelineError, Result};

/// Extension of the encoded output files.
pub const TARGET_EXTENSION: &str = "opus";

/// One unit of encoder work: a source file and its derived output path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeTask {
    pub source: PathBuf,
    pub dest: PathBuf,
}

impl EncodeTask {
    /// Derive the output path from the source: take the path relative to
    /// the source root, swap the extension for the target codec's, and
    /// re-root it under the destination directory. Deterministic per
    /// relative path, so distinct stems can never collide on output.
    pub fn new(source_root: &Path, dest_root: &Path, source: PathBuf) -> Result<Self> {
        let rel = source.strip_prefix(source_root).map_err(|_| {
            PipelineError::Config(format!(
                "{} is not under source root {}",
                source.display(),
                source_root.display()
            ))
        })?;
        let dest = dest_root.join(rel).with_extension(TARGET_EXTENSION);
        Ok(Self { source, dest })
    }
}

/// Map every candidate to an encode task.
pub fn plan_tasks(cfg: &EncodeConfig, candidates: Vec<PathBuf>) -> Result<Vec<EncodeTask>> {
    candidates
        .into_iter()
        .map(|path| EncodeTask::new(&cfg.source_dir, &cfg.dest_dir, path))
        .collect()
}

/// Decide whether a task must run: encode iff the source is strictly newer
/// than its destination. A missing destination counts as infinitely stale.
/// Entirely mtime based, so clock skew or a touch without modification can
/// fool it; that is the accepted cost of having no manifest.
pub fn needs_encode(task: &EncodeTask) -> Result<bool> {
    let source_mtime = fs::metadata(&task.source)
        .and_then(|m| m.modified())
        .map_err(|e| {
            PipelineError::io(format!("failed to stat {}", task.source.display()), e)
        })?;

    match fs::metadata(&task.dest).and_then(|m| m.modified()) {
        Ok(dest_mtime) => Ok(source_mtime > dest_mtime),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(PipelineError::io(
            format!("failed to stat {}", task.dest.display()),
            e,
        )),
    }
}
