use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{PipelineError, Result};

/// Audio file extensions accepted for transcoding. Matching is an exact,
/// case-sensitive suffix comparison with no content sniffing.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav"];

/// List every regular file under `root`, in no guaranteed order.
///
/// Symlinks are not followed and non-regular entries are skipped. An
/// unreadable root fails the walk; read errors deeper in the tree are
/// logged and skipped. The whole tree is materialized up front because
/// conflict detection needs global visibility before any encoding starts.
pub fn walk_tree(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                if e.depth() == 0 {
                    let context = format!("failed to read directory {}", root.display());
                    let source = e
                        .into_io_error()
                        .unwrap_or_else(|| io::Error::other("unreadable root entry"));
                    return Err(PipelineError::io(context, source));
                }
                warn!("skipping unreadable entry: {e}");
                continue;
            }
        };

        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    debug!("walked {}: {} regular file(s)", root.display(), files.len());
    Ok(files)
}

/// Partition the file list into recognized audio candidates and rejects.
/// Every reject is reported; an unexpected file in the source tree is
/// usually a user mistake.
pub fn classify_audio(files: Vec<PathBuf>) -> Vec<PathBuf> {
    let total = files.len();
    let mut candidates = Vec::new();
    let mut rejected = 0usize;

    for path in files {
        let accepted = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| AUDIO_EXTENSIONS.contains(&ext))
            .unwrap_or(false);

        if accepted {
            candidates.push(path);
        } else {
            rejected += 1;
            warn!("unexpected file in audio source tree: {}", path.display());
        }
    }

    info!(
        "found {} audio file(s), rejected {} of {} entries",
        candidates.len(),
        rejected,
        total
    );
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;

    #[test]
    fn test_walk_tree_finds_all_regular_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.mp3"), b"x").unwrap();
        fs::create_dir_all(dir.path().join("b/c")).unwrap();
        fs::write(dir.path().join("b/track.wav"), b"x").unwrap();
        fs::write(dir.path().join("b/c/deep.mp3"), b"x").unwrap();

        let files: HashSet<PathBuf> = walk_tree(dir.path()).unwrap().into_iter().collect();
        let expected: HashSet<PathBuf> = [
            dir.path().join("a.mp3"),
            dir.path().join("b/track.wav"),
            dir.path().join("b/c/deep.mp3"),
        ]
        .into_iter()
        .collect();
        assert_eq!(files, expected);
    }

    #[test]
    fn test_walk_tree_skips_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("empty/nested")).unwrap();

        let files = walk_tree(dir.path()).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_walk_tree_fails_fast_on_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone");
        let err = walk_tree(&missing).unwrap_err();
        assert!(matches!(err, PipelineError::Io { .. }));
    }

    #[test]
    fn test_classify_accepts_only_known_extensions() {
        let files = vec![
            PathBuf::from("/src/a.mp3"),
            PathBuf::from("/src/b.wav"),
            PathBuf::from("/src/notes.txt"),
            PathBuf::from("/src/README"),
        ];
        let candidates = classify_audio(files);
        assert_eq!(
            candidates,
            vec![PathBuf::from("/src/a.mp3"), PathBuf::from("/src/b.wav")]
        );
    }

    #[test]
    fn test_classify_is_case_sensitive() {
        let files = vec![PathBuf::from("/src/LOUD.MP3"), PathBuf::from("/src/ok.mp3")];
        let candidates = classify_audio(files);
        assert_eq!(candidates, vec![PathBuf::from("/src/ok.mp3")]);
    }
}
