//! Dataset statistics and previews for crawled article CSVs.

use crate::models::Article;
use crate::utils::truncate_for_log;
use itertools::Itertools;
use std::collections::HashMap;
use std::fmt;

/// Summary numbers for one article dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetStats {
    pub total_articles: usize,
    /// (keyword, count), most frequent first.
    pub keyword_counts: Vec<(String, usize)>,
    /// (source, count), most frequent first.
    pub source_counts: Vec<(String, usize)>,
    pub avg_content_length: f64,
    pub avg_paragraph_count: f64,
}

/// Compute totals, per-keyword and per-source counts, and averages.
pub fn compute_stats(articles: &[Article]) -> DatasetStats {
    let mut keywords: HashMap<&str, usize> = HashMap::new();
    let mut sources: HashMap<&str, usize> = HashMap::new();
    let mut total_length = 0usize;
    let mut total_paragraphs = 0usize;
    for article in articles {
        *keywords.entry(&article.keyword).or_default() += 1;
        *sources.entry(&article.source).or_default() += 1;
        total_length += article.content.chars().count();
        total_paragraphs += article.paragraph_count;
    }

    let descending = |map: HashMap<&str, usize>| -> Vec<(String, usize)> {
        map.into_iter()
            .map(|(name, count)| (name.to_string(), count))
            .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
            .collect()
    };

    let total = articles.len();
    DatasetStats {
        total_articles: total,
        keyword_counts: descending(keywords),
        source_counts: descending(sources),
        avg_content_length: if total == 0 {
            0.0
        } else {
            total_length as f64 / total as f64
        },
        avg_paragraph_count: if total == 0 {
            0.0
        } else {
            total_paragraphs as f64 / total as f64
        },
    }
}

impl fmt::Display for DatasetStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total articles:      {}", self.total_articles)?;
        writeln!(f, "Avg content length:  {:.0} characters", self.avg_content_length)?;
        writeln!(f, "Avg paragraph count: {:.1}", self.avg_paragraph_count)?;
        writeln!(f, "\nArticles by keyword:")?;
        for (keyword, count) in &self.keyword_counts {
            writeln!(f, "  - {keyword}: {count}")?;
        }
        writeln!(f, "\nArticles by source:")?;
        for (source, count) in &self.source_counts {
            writeln!(f, "  - {source}: {count}")?;
        }
        Ok(())
    }
}

/// Articles whose keyword matches, case-insensitively.
pub fn filter_by_keyword<'a>(articles: &'a [Article], keyword: &str) -> Vec<&'a Article> {
    articles
        .iter()
        .filter(|article| article.keyword.eq_ignore_ascii_case(keyword))
        .collect()
}

/// Articles whose source matches, case-insensitively.
pub fn filter_by_source<'a>(articles: &'a [Article], source: &str) -> Vec<&'a Article> {
    articles
        .iter()
        .filter(|article| article.source.eq_ignore_ascii_case(source))
        .collect()
}

/// Formatted preview block for one article, content capped at 300 chars.
pub fn preview(article: &Article) -> String {
    format!(
        "Timestamp:  {}\nKeyword:    {}\nSource:     {}\nTitle:      {}\nURL:        {}\nParagraphs: {}\n\n{}",
        article.timestamp,
        article.keyword,
        article.source,
        article.title,
        article.url,
        article.paragraph_count,
        truncate_for_log(&article.content, 300),
    )
}
