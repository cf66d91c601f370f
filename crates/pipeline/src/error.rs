use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that terminate a pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("encoder capability check failed: {detail}\n{output}")]
    Capability { detail: String, output: String },

    #[error("{0}")]
    Conflict(ConflictReport),

    #[error("encoding failed for {}: {detail}", .path.display())]
    Encode { path: PathBuf, detail: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl PipelineError {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        PipelineError::Io {
            context: context.into(),
            source,
        }
    }
}

/// Source files that would collide on the same output name, grouped by
/// (parent directory, stem). Paths are relative to the source root.
#[derive(Debug, Clone, Default)]
pub struct ConflictReport {
    pub groups: Vec<Vec<PathBuf>>,
}

impl ConflictReport {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} group(s) of source files differ only by extension and would \
             overwrite each other's output; rename them before encoding:",
            self.groups.len()
        )?;
        for group in &self.groups {
            let names: Vec<String> = group.iter().map(|p| p.display().to_string()).collect();
            writeln!(f, "  {}", names.join(" <-> "))?;
        }
        Ok(())
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, PipelineError>;
