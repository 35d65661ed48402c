//! Merging cleaned per-source artifacts into one master table.
//!
//! The news and comment artifacts carry different schemas, so the combiner
//! supports two modes: `Union` reproduces the lenient concatenation the
//! pipeline has always done (header union, absent cells left empty), while
//! `Strict` refuses any header mismatch for callers that want drift caught
//! early.

use crate::outputs::csv::CsvTable;
use itertools::Itertools;
use std::error::Error;
use std::path::{Path, PathBuf};
use thiserror::Error as ThisError;
use tracing::{info, warn};

/// How the combiner treats header differences between input files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Header union in first-seen order; absent columns become empty cells.
    Union,
    /// Any header mismatch is an error.
    Strict,
}

#[derive(Debug, ThisError)]
pub enum CombineError {
    #[error("no *_cleaned.csv files found under the input folders")]
    NoInputFiles,
    #[error("header mismatch in strict mode: expected {expected:?}, found {found:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
}

/// Find every `*_cleaned.csv` under `folders`, sorted for a stable merge
/// order. A missing folder is skipped with a warning.
pub fn find_cleaned_files(folders: &[&str]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for folder in folders {
        let dir = Path::new(folder);
        if !dir.is_dir() {
            warn!(folder, "Input folder not found, skipping");
            continue;
        }
        let Ok(entries) = std::fs::read_dir(dir) else {
            warn!(folder, "Input folder not readable, skipping");
            continue;
        };
        let mut found = 0usize;
        for entry in entries.flatten() {
            let path = entry.path();
            let is_cleaned = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with("_cleaned.csv"));
            if is_cleaned {
                files.push(path);
                found += 1;
            }
        }
        info!(folder, count = found, "Scanned folder for cleaned files");
    }
    files.sort();
    files
}

/// Concatenate tables under the given merge mode.
pub fn combine_tables(tables: &[CsvTable], mode: MergeMode) -> Result<CsvTable, CombineError> {
    let Some(first) = tables.first() else {
        return Err(CombineError::NoInputFiles);
    };

    match mode {
        MergeMode::Strict => {
            let mut combined = CsvTable::new(first.headers.clone());
            for table in tables {
                if table.headers != combined.headers {
                    return Err(CombineError::SchemaMismatch {
                        expected: combined.headers.clone(),
                        found: table.headers.clone(),
                    });
                }
                combined.rows.extend(table.rows.iter().cloned());
            }
            Ok(combined)
        }
        MergeMode::Union => {
            let headers: Vec<String> = tables
                .iter()
                .flat_map(|table| table.headers.iter())
                .unique()
                .cloned()
                .collect();
            let mut combined = CsvTable::new(headers);
            for table in tables {
                let positions: Vec<Option<usize>> = combined
                    .headers
                    .iter()
                    .map(|header| table.column_index(header))
                    .collect();
                for row in &table.rows {
                    let merged: Vec<String> = positions
                        .iter()
                        .map(|position| match position {
                            Some(index) => row.get(*index).cloned().unwrap_or_default(),
                            None => String::new(),
                        })
                        .collect();
                    combined.rows.push(merged);
                }
            }
            Ok(combined)
        }
    }
}

/// Full combine stage: scan folders, read every cleaned artifact, merge,
/// write the master file. Returns the combined row count.
pub fn run_combine(
    folders: &[&str],
    output: &Path,
    mode: MergeMode,
) -> Result<usize, Box<dyn Error>> {
    let files = find_cleaned_files(folders);
    if files.is_empty() {
        return Err(Box::new(CombineError::NoInputFiles));
    }

    let mut tables = Vec::new();
    for file in &files {
        match CsvTable::read(file) {
            Ok(table) => tables.push(table),
            Err(e) => {
                warn!(path = %file.display(), error = %e, "Failed to read cleaned file, skipping");
            }
        }
    }

    let combined = combine_tables(&tables, mode)?;
    combined.write(output)?;
    info!(
        path = %output.display(),
        rows = combined.rows.len(),
        files = files.len(),
        "Wrote combined master file"
    );
    Ok(combined.rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn table(headers: &[&str], rows: &[&[&str]]) -> CsvTable {
        let mut t = CsvTable::new(headers.iter().map(|h| h.to_string()).collect());
        for row in rows {
            t.rows.push(row.iter().map(|v| v.to_string()).collect());
        }
        t
    }

    #[test]
    fn test_union_merge_fills_absent_columns() {
        let news = table(&["timestamp", "title", "content"], &[&["t1", "judul", "isi"]]);
        let comments = table(
            &["timestamp", "comment_text"],
            &[&["t2", "mantap"]],
        );
        let combined = combine_tables(&[news, comments], MergeMode::Union).unwrap();
        assert_eq!(
            combined.headers,
            vec!["timestamp", "title", "content", "comment_text"]
        );
        assert_eq!(combined.rows[0], vec!["t1", "judul", "isi", ""]);
        assert_eq!(combined.rows[1], vec!["t2", "", "", "mantap"]);
    }

    #[test]
    fn test_union_keeps_first_seen_header_order() {
        let a = table(&["x", "y"], &[&["1", "2"]]);
        let b = table(&["y", "z"], &[&["3", "4"]]);
        let combined = combine_tables(&[a, b], MergeMode::Union).unwrap();
        assert_eq!(combined.headers, vec!["x", "y", "z"]);
        assert_eq!(combined.rows[1], vec!["", "3", "4"]);
    }

    #[test]
    fn test_strict_merge_rejects_mismatch() {
        let a = table(&["x", "y"], &[&["1", "2"]]);
        let b = table(&["y", "z"], &[&["3", "4"]]);
        let result = combine_tables(&[a, b], MergeMode::Strict);
        assert!(matches!(result, Err(CombineError::SchemaMismatch { .. })));
    }

    #[test]
    fn test_strict_merge_concatenates_identical_schemas() {
        let a = table(&["x", "y"], &[&["1", "2"]]);
        let b = table(&["x", "y"], &[&["3", "4"]]);
        let combined = combine_tables(&[a, b], MergeMode::Strict).unwrap();
        assert_eq!(combined.rows.len(), 2);
    }

    #[test]
    fn test_empty_input_is_an_error() {
        assert!(matches!(
            combine_tables(&[], MergeMode::Union),
            Err(CombineError::NoInputFiles)
        ));
    }

    #[test]
    fn test_run_combine_end_to_end() {
        let dir = tempdir().unwrap();
        let news_dir = dir.path().join("news_portal");
        std::fs::create_dir_all(&news_dir).unwrap();
        std::fs::write(
            news_dir.join("news_detik_cleaned.csv"),
            "timestamp,gemini_summary,content\nt1,ringkasan,isi\n",
        )
        .unwrap();
        // raw (non-cleaned) files are ignored
        std::fs::write(news_dir.join("news_detik.csv"), "timestamp,content\nt0,x\n").unwrap();

        let output = dir.path().join("combined/out.csv");
        let folders = [news_dir.to_str().unwrap(), "missing_folder"];
        let rows = run_combine(&folders, &output, MergeMode::Union).unwrap();
        assert_eq!(rows, 1);
        let combined = CsvTable::read(&output).unwrap();
        assert_eq!(combined.headers, vec!["timestamp", "gemini_summary", "content"]);
    }

    #[test]
    fn test_run_combine_with_no_cleaned_files_errors() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("out.csv");
        let folders = [dir.path().to_str().unwrap()];
        assert!(run_combine(&folders, &output, MergeMode::Union).is_err());
    }
}
