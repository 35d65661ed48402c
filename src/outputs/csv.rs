//! CSV artifact reading and writing.
//!
//! Two layers:
//! - Typed writers/readers for [`Article`] and [`Comment`] rows, whose
//!   column order is fixed by the struct field order.
//! - [`CsvTable`], a header-plus-string-rows representation for the stages
//!   that manipulate schemas dynamically (column insertion by the cleaning
//!   stage, header unions by the combiner).

use crate::models::{Article, Comment};
use csv::{ReaderBuilder, WriterBuilder};
use serde::Serialize;
use std::error::Error;
use std::path::Path;
use tracing::{info, warn};

fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<(), Box<dyn Error>> {
    ensure_parent_dir(path)?;
    let mut writer = WriterBuilder::new().from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write articles to `path`, overwriting any existing file.
///
/// An empty batch writes nothing at all (not even a header), matching the
/// behavior downstream stages expect when a site yielded no articles.
pub fn write_articles(path: &Path, articles: &[Article]) -> Result<(), Box<dyn Error>> {
    if articles.is_empty() {
        warn!(path = %path.display(), "No articles to save");
        return Ok(());
    }
    write_records(path, articles)?;
    info!(path = %path.display(), count = articles.len(), "Saved articles");
    Ok(())
}

pub fn read_articles(path: &Path) -> Result<Vec<Article>, Box<dyn Error>> {
    let mut reader = ReaderBuilder::new().from_path(path)?;
    let mut articles = Vec::new();
    for result in reader.deserialize() {
        articles.push(result?);
    }
    info!(path = %path.display(), count = articles.len(), "Loaded articles");
    Ok(articles)
}

/// Write comments to `path`, overwriting any existing file. Empty batches
/// write nothing.
pub fn write_comments(path: &Path, comments: &[Comment]) -> Result<(), Box<dyn Error>> {
    if comments.is_empty() {
        warn!(path = %path.display(), "No comments to save");
        return Ok(());
    }
    write_records(path, comments)?;
    info!(path = %path.display(), count = comments.len(), "Saved comments");
    Ok(())
}

pub fn read_comments(path: &Path) -> Result<Vec<Comment>, Box<dyn Error>> {
    let mut reader = ReaderBuilder::new().from_path(path)?;
    let mut comments = Vec::new();
    for result in reader.deserialize() {
        comments.push(result?);
    }
    Ok(comments)
}

/// A CSV file held as a header row plus string rows.
///
/// Rows are padded to the header width on read, so downstream code can index
/// columns without length checks.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn read(path: &Path) -> Result<Self, Box<dyn Error>> {
        let mut reader = ReaderBuilder::new().flexible(true).from_path(path)?;
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let width = headers.len();
        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(width, String::new());
            rows.push(row);
        }
        Ok(Self { headers, rows })
    }

    pub fn write(&self, path: &Path) -> Result<(), Box<dyn Error>> {
        ensure_parent_dir(path)?;
        let mut writer = WriterBuilder::new().from_path(path)?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    /// Insert a column at `index`, one value per row.
    ///
    /// `values` must have one entry per existing row.
    pub fn insert_column(&mut self, index: usize, name: &str, values: Vec<String>) {
        debug_assert_eq!(values.len(), self.rows.len());
        self.headers.insert(index, name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.insert(index, value);
        }
    }

    /// Append a column after the last one.
    pub fn push_column(&mut self, name: &str, values: Vec<String>) {
        let index = self.headers.len();
        self.insert_column(index, name, values);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_articles() -> Vec<Article> {
        vec![
            Article {
                timestamp: "2025-11-03 09:15:00".to_string(),
                keyword: "Indonesia Damai".to_string(),
                source: "detik".to_string(),
                title: "Deklarasi damai, ribuan hadir".to_string(),
                url: "https://www.detik.com/d-1".to_string(),
                content: "Baris satu.\nBaris \"dua\", dengan koma.".to_string(),
                paragraph_count: 2,
            },
            Article {
                timestamp: "2025-11-03 09:16:00".to_string(),
                keyword: "pemilu damai".to_string(),
                source: "detik".to_string(),
                title: "No title found".to_string(),
                url: "https://www.detik.com/d-2".to_string(),
                content: "No content found".to_string(),
                paragraph_count: 0,
            },
        ]
    }

    #[test]
    fn test_article_roundtrip_is_field_for_field_equal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("news.csv");
        let articles = sample_articles();
        write_articles(&path, &articles).unwrap();
        let back = read_articles(&path).unwrap();
        assert_eq!(articles, back);
    }

    #[test]
    fn test_comment_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("youtube.csv");
        let comments = vec![Comment {
            timestamp: "2025-11-03 09:15:00".to_string(),
            keyword: "toleransi".to_string(),
            source: "YouTube".to_string(),
            video_url: "https://www.youtube.com/watch?v=abc".to_string(),
            commenter_name: "Budi, Sang Penjaga".to_string(),
            comment_text: "Setuju!\nDamai itu indah".to_string(),
            comment_date: "2025-10-01T00:00:00Z".to_string(),
        }];
        write_comments(&path, &comments).unwrap();
        assert_eq!(read_comments(&path).unwrap(), comments);
    }

    #[test]
    fn test_empty_batch_writes_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        write_articles(&path, &[]).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_table_roundtrip_and_padding() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("table.csv");
        std::fs::write(&path, "a,b,c\n1,2,3\n4,5\n").unwrap();
        let table = CsvTable::read(&path).unwrap();
        assert_eq!(table.headers, vec!["a", "b", "c"]);
        assert_eq!(table.rows[1], vec!["4", "5", ""]);

        let out = dir.path().join("out.csv");
        table.write(&out).unwrap();
        assert_eq!(CsvTable::read(&out).unwrap(), table);
    }

    #[test]
    fn test_insert_column_before_named_column() {
        let mut table = CsvTable::new(vec!["a".to_string(), "content".to_string()]);
        table.rows.push(vec!["1".to_string(), "isi".to_string()]);
        let at = table.column_index("content").unwrap();
        table.insert_column(at, "gemini_summary", vec!["ringkasan".to_string()]);
        assert_eq!(table.headers, vec!["a", "gemini_summary", "content"]);
        assert_eq!(table.rows[0], vec!["1", "ringkasan", "isi"]);
    }

    #[test]
    fn test_writer_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/deeper/news.csv");
        write_articles(&path, &sample_articles()).unwrap();
        assert!(path.exists());
    }
}
