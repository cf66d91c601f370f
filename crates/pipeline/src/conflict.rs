use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::{ConflictReport, PipelineError, Result};

/// Gate against output-name collisions: two candidates that share a parent
/// directory and stem but differ in extension would both encode to the
/// same output file. One grouping pass keyed by (directory, stem); any
/// group of size two or more fails the run before any encoding starts,
/// naming each conflicting file exactly once.
pub fn ensure_unique_stems(source_root: &Path, candidates: &[PathBuf]) -> Result<()> {
    let mut groups: HashMap<(PathBuf, OsString), Vec<PathBuf>> = HashMap::new();

    for path in candidates {
        let Some(stem) = path.file_stem() else {
            continue;
        };
        let parent = path.parent().unwrap_or(Path::new("")).to_path_buf();
        let rel = path.strip_prefix(source_root).unwrap_or(path).to_path_buf();
        groups
            .entry((parent, stem.to_os_string()))
            .or_default()
            .push(rel);
    }

    let mut conflicts: Vec<Vec<PathBuf>> = groups
        .into_values()
        .filter(|group| group.len() > 1)
        .collect();

    if conflicts.is_empty() {
        info!("no output-name collisions among {} candidate(s)", candidates.len());
        return Ok(());
    }

    for group in &mut conflicts {
        group.sort();
    }
    conflicts.sort();

    Err(PipelineError::Conflict(ConflictReport { groups: conflicts }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn paths(root: &str, names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|n| Path::new(root).join(n)).collect()
    }

    #[test]
    fn test_no_conflict_on_distinct_stems() {
        let candidates = paths("/src", &["a.mp3", "b.wav", "sub/a.mp3"]);
        assert!(ensure_unique_stems(Path::new("/src"), &candidates).is_ok());
    }

    #[test]
    fn test_same_stem_different_dirs_is_fine() {
        let candidates = paths("/src", &["a.mp3", "one/a.mp3", "two/a.wav"]);
        assert!(ensure_unique_stems(Path::new("/src"), &candidates).is_ok());
    }

    #[test]
    fn test_pair_is_reported_once_with_both_paths() {
        let candidates = paths("/src", &["a.mp3", "a.wav", "other.mp3"]);
        let err = ensure_unique_stems(Path::new("/src"), &candidates).unwrap_err();
        let PipelineError::Conflict(report) = err else {
            panic!("expected a conflict");
        };
        assert_eq!(report.groups.len(), 1);
        assert_eq!(
            report.groups[0],
            vec![PathBuf::from("a.mp3"), PathBuf::from("a.wav")]
        );
    }

    #[test]
    fn test_triangle_yields_one_group_not_three_pairs() {
        let candidates = paths("/src", &["x/t.mp3", "x/t.wav", "x/t.flac"]);
        let err = ensure_unique_stems(Path::new("/src"), &candidates).unwrap_err();
        let PipelineError::Conflict(report) = err else {
            panic!("expected a conflict");
        };
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].len(), 3);
    }

    #[test]
    fn test_empty_candidate_list() {
        assert!(ensure_unique_stems(Path::new("/src"), &[]).is_ok());
    }

    proptest! {
        /// Candidate lists whose stems are all distinct never conflict,
        /// whatever the extensions.
        #[test]
        fn test_distinct_stems_never_conflict(
            stems in proptest::collection::hash_set("[a-z]{1,8}", 0..20),
            ext_picks in proptest::collection::vec(0usize..2, 20),
        ) {
            let candidates: Vec<PathBuf> = stems
                .iter()
                .zip(ext_picks.iter())
                .map(|(stem, pick)| {
                    let ext = ["mp3", "wav"][*pick];
                    Path::new("/src").join(format!("{stem}.{ext}"))
                })
                .collect();

            prop_assert!(ensure_unique_stems(Path::new("/src"), &candidates).is_ok());
        }

        /// Duplicating any candidate's stem under another extension is
        /// always caught, and the duplicated stem is named in the report.
        #[test]
        fn test_injected_collision_is_always_caught(
            stems in proptest::collection::hash_set("[a-z]{1,8}", 1..10),
            dup_index in 0usize..10,
        ) {
            let stems: Vec<String> = stems.into_iter().collect();
            let dup = &stems[dup_index % stems.len()];

            let mut candidates: Vec<PathBuf> = stems
                .iter()
                .map(|stem| Path::new("/src").join(format!("{stem}.mp3")))
                .collect();
            candidates.push(Path::new("/src").join(format!("{dup}.wav")));

            let err = ensure_unique_stems(Path::new("/src"), &candidates).unwrap_err();
            let PipelineError::Conflict(report) = err else {
                panic!("expected a conflict");
            };
            prop_assert_eq!(report.groups.len(), 1);
            let rendered = report.to_string();
            let expect_mp3 = format!("{}.mp3", dup);
            let expect_wav = format!("{}.wav", dup);
            prop_assert!(rendered.contains(&expect_mp3));
            prop_assert!(rendered.contains(&expect_wav));
        }
    }
}
