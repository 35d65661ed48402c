//! Data models for scraped articles, video comments, and sentiment results.
//!
//! This module defines the core data structures flowing through the pipeline:
//! - [`Article`]: one news article scraped from a configured site
//! - [`Comment`]: one top-level YouTube comment
//! - [`SentimentResult`]: 3-way sentiment label plus confidence
//!
//! The field order of [`Article`] and [`Comment`] matches the column order of
//! their CSV artifacts, so the structs serialize directly through the `csv`
//! crate without header remapping.

use serde::{Deserialize, Serialize};

/// Sentinel title used when a site's title rule matches nothing.
pub const NO_TITLE: &str = "No title found";

/// Sentinel content used when a site's content rule matches nothing.
pub const NO_CONTENT: &str = "No content found";

/// A news article scraped from one of the configured sites.
///
/// Produced by the article extractor and stamped with the search keyword by
/// the site scraper. Immutable once created.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Article {
    /// Local wall-clock time of the scrape, `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
    /// The search keyword that surfaced this article.
    pub keyword: String,
    /// Site name the article came from (e.g. `"detik"`).
    pub source: String,
    /// Article headline, or [`NO_TITLE`] when the title rule matched nothing.
    pub title: String,
    /// Absolute article URL.
    pub url: String,
    /// Body paragraphs joined with newlines, or [`NO_CONTENT`].
    pub content: String,
    /// Number of non-empty paragraphs that survived extraction.
    pub paragraph_count: usize,
}

/// A top-level comment collected from a YouTube video.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Comment {
    /// Local wall-clock time of the collection, `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
    /// The search keyword whose video search surfaced this comment.
    pub keyword: String,
    /// Always `"YouTube"`.
    pub source: String,
    /// Watch URL of the video the comment belongs to.
    pub video_url: String,
    /// Display name of the commenter.
    pub commenter_name: String,
    /// The comment text as returned by the API (plain text).
    pub comment_text: String,
    /// Publication date of the comment as reported by the API.
    pub comment_date: String,
}

/// A single sentiment classification.
///
/// `label` is one of `positive`, `neutral`, `negative`, or `error` when the
/// scorer failed for this row. `score` is the classifier confidence in
/// `[0, 1]`, `0.0` on error.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SentimentResult {
    pub label: String,
    pub score: f64,
}

impl SentimentResult {
    /// The degraded result substituted when scoring a row fails.
    pub fn error() -> Self {
        Self {
            label: "error".to_string(),
            score: 0.0,
        }
    }
}
