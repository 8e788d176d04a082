//! Input discovery and parallel per-file processing.
//!
//! Files are independent, so a batch is a `par_iter` over the input list.
//! Results come back in input order regardless of which worker finished
//! first, and one file failing never stops the others.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use walkdir::WalkDir;

use crate::error::TiercheckError;

/// Builds the work set from `--textgrid` and `--directory`.
///
/// Directories are scanned one level deep for files whose name ends in
/// `suffix` (case-insensitive), sorted by name. Paths that do not exist and
/// directories with no matches are warned about and skipped.
///
/// # Errors
/// [`TiercheckError::NoInputs`] if neither path is given, and
/// [`TiercheckError::EmptyWorkSet`] if nothing usable was found.
pub fn collect_input_paths(
    file: Option<&Path>,
    directory: Option<&Path>,
    suffix: &str,
) -> Result<Vec<PathBuf>, TiercheckError> {
    if file.is_none() && directory.is_none() {
        return Err(TiercheckError::NoInputs);
    }

    let mut paths = Vec::new();
    for path in [file, directory].into_iter().flatten() {
        if !path.exists() {
            tracing::warn!(path = %path.display(), "path does not exist, skipping");
            continue;
        }
        if path.is_dir() {
            let found = scan_directory(path, suffix);
            if found.is_empty() {
                tracing::warn!(
                    path = %path.display(),
                    suffix,
                    "directory contains no matching files"
                );
            }
            paths.extend(found);
        } else {
            paths.push(path.to_path_buf());
        }
    }

    // Spellings of the same file collapse to the first one given.
    let mut seen = HashSet::new();
    paths.retain(|p| seen.insert(std::fs::canonicalize(p).unwrap_or_else(|_| p.clone())));

    if paths.is_empty() {
        return Err(TiercheckError::EmptyWorkSet);
    }
    tracing::info!(files = paths.len(), "collected input files");
    Ok(paths)
}

fn scan_directory(dir: &Path, suffix: &str) -> Vec<PathBuf> {
    let suffix = suffix.to_lowercase();
    let mut found: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .file_name()
                .to_string_lossy()
                .to_lowercase()
                .ends_with(&suffix)
        })
        .map(|entry| entry.into_path())
        .collect();
    found.sort();
    found
}

/// What happened to one input file.
#[derive(Debug)]
pub struct FileOutcome<T> {
    pub path: PathBuf,
    pub result: Result<T, TiercheckError>,
}

/// Runs `f` on every path in parallel, returning outcomes in input order.
pub fn process_files<T, F>(paths: &[PathBuf], f: F) -> Vec<FileOutcome<T>>
where
    T: Send,
    F: Fn(&Path) -> Result<T, TiercheckError> + Sync,
{
    paths
        .par_iter()
        .map(|path| {
            let result = f(path);
            if let Err(err) = &result {
                tracing::error!(path = %path.display(), error = %err, "failed to process file");
            }
            FileOutcome {
                path: path.clone(),
                result,
            }
        })
        .collect()
}

/// Counts failed outcomes.
pub fn failure_count<T>(outcomes: &[FileOutcome<T>]) -> usize {
    outcomes.iter().filter(|o| o.result.is_err()).count()
}

/// Where the corrected copy of `input` goes: `_<name>` inside `out_dir`.
pub fn corrected_output_path(input: &Path, out_dir: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    out_dir.join(format!("_{}", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "").unwrap();
        path
    }

    #[test]
    fn nothing_given_is_an_error() {
        assert!(matches!(
            collect_input_paths(None, None, "textgrid"),
            Err(TiercheckError::NoInputs)
        ));
    }

    #[test]
    fn directory_scan_is_flat_sorted_and_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.TextGrid");
        touch(dir.path(), "a.textgrid");
        touch(dir.path(), "notes.txt");
        fs::create_dir(dir.path().join("nested")).unwrap();
        touch(&dir.path().join("nested"), "c.TextGrid");

        let paths = collect_input_paths(None, Some(dir.path()), "textgrid").unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.textgrid", "b.TextGrid"]);
    }

    #[test]
    fn missing_paths_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let file = touch(dir.path(), "rec.TextGrid");
        let missing = dir.path().join("missing");
        let paths = collect_input_paths(Some(&file), Some(&missing), "textgrid").unwrap();
        assert_eq!(paths, vec![file]);
    }

    #[test]
    fn file_and_directory_overlap_is_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        let file = touch(dir.path(), "rec.TextGrid");
        let paths = collect_input_paths(Some(&file), Some(dir.path()), "textgrid").unwrap();
        assert_eq!(paths.len(), 1);
    }

    #[test]
    fn differently_spelled_paths_are_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "rec.TextGrid");
        touch(dir.path(), "other.TextGrid");
        fs::create_dir(dir.path().join("sub")).unwrap();
        let roundabout = dir.path().join("sub").join("..").join("rec.TextGrid");

        let paths = collect_input_paths(Some(&roundabout), Some(dir.path()), ".textgrid").unwrap();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0], roundabout);
        assert!(paths[1].ends_with("other.TextGrid"));
    }

    #[test]
    fn empty_work_set_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "readme.md");
        assert!(matches!(
            collect_input_paths(None, Some(dir.path()), "textgrid"),
            Err(TiercheckError::EmptyWorkSet)
        ));
    }

    #[test]
    fn outcomes_keep_input_order() {
        let paths: Vec<PathBuf> = (0..50).map(|i| PathBuf::from(format!("{i}.TextGrid"))).collect();
        let outcomes = process_files(&paths, |path| {
            if path == Path::new("7.TextGrid") {
                Err(TiercheckError::EmptyWorkSet)
            } else {
                Ok(path.to_path_buf())
            }
        });
        assert_eq!(failure_count(&outcomes), 1);
        for (outcome, path) in outcomes.iter().zip(&paths) {
            assert_eq!(&outcome.path, path);
        }
    }

    #[test]
    fn corrected_copy_is_prefixed() {
        assert_eq!(
            corrected_output_path(Path::new("in/rec.TextGrid"), Path::new("out")),
            PathBuf::from("out/_rec.TextGrid")
        );
    }
}
