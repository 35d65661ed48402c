//! Three-way sentiment scoring over the combined dataset.
//!
//! Scoring is delegated to a hosted text-classification endpoint serving the
//! IndoBERT sentiment model. The model reports raw class labels
//! (`LABEL_0/1/2`) which map to `positive`/`neutral`/`negative`; a row the
//! scorer cannot handle degrades to the `error` label with score 0.0 and the
//! batch keeps going.

use crate::models::SentimentResult;
use crate::outputs::csv::CsvTable;
use reqwest::Client;
use serde::Deserialize;
use std::error::Error;
use tracing::{info, instrument, warn};

/// Fine-tuned 3-class Indonesian sentiment model.
pub const SENTIMENT_MODEL: &str = "mdhugol/indonesia-bert-sentiment-classification";

/// Column of the combined artifact that gets scored.
pub const TEXT_COLUMN: &str = "gemini_summary";

/// Map a raw model label to its readable sentiment name.
///
/// The IndoBERT checkpoint reports `LABEL_0` = positive, `LABEL_1` =
/// neutral, `LABEL_2` = negative. Already-readable labels pass through.
pub fn map_label(raw: &str) -> String {
    match raw {
        "LABEL_0" | "positive" => "positive".to_string(),
        "LABEL_1" | "neutral" => "neutral".to_string(),
        "LABEL_2" | "negative" => "negative".to_string(),
        other => other.to_string(),
    }
}

/// Seam over the classification call.
pub trait ScoreSentiment {
    async fn score(&self, text: &str) -> Result<SentimentResult, Box<dyn Error>>;
}

#[derive(Debug, Deserialize)]
struct Classification {
    label: String,
    score: f64,
}

/// Client for a hosted inference endpoint in the Hugging Face
/// text-classification shape: `{"inputs": text}` in, a list of
/// `{label, score}` candidates out.
pub struct HttpSentimentClient {
    client: Client,
    endpoint: String,
    api_token: Option<String>,
}

impl HttpSentimentClient {
    pub fn new(endpoint: String, api_token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            api_token,
        }
    }

    /// Default hosted endpoint for [`SENTIMENT_MODEL`].
    pub fn default_endpoint() -> String {
        format!("https://api-inference.huggingface.co/models/{SENTIMENT_MODEL}")
    }
}

impl ScoreSentiment for HttpSentimentClient {
    async fn score(&self, text: &str) -> Result<SentimentResult, Box<dyn Error>> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "inputs": text }));
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(format!("sentiment endpoint returned status {status}").into());
        }

        // [[{label, score}, ...]], one candidate list per input
        let candidates: Vec<Vec<Classification>> = response.json().await?;
        let best = candidates
            .into_iter()
            .flatten()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .ok_or("sentiment endpoint returned no classifications")?;
        Ok(SentimentResult {
            label: map_label(&best.label),
            score: best.score,
        })
    }
}

/// Label distribution of a scored batch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SentimentSummary {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
    pub error: usize,
}

impl SentimentSummary {
    fn count(&mut self, label: &str) {
        match label {
            "positive" => self.positive += 1,
            "neutral" => self.neutral += 1,
            "negative" => self.negative += 1,
            _ => self.error += 1,
        }
    }
}

/// Score every row of the combined table on [`TEXT_COLUMN`].
///
/// Rows whose summary cell is empty are dropped first (they carry nothing to
/// score). The table gains `sentiment_label` and `sentiment_score` columns;
/// per-row scorer failures degrade to the error sentinel.
#[instrument(level = "info", skip_all, fields(rows = table.rows.len()))]
pub async fn score_table<S: ScoreSentiment>(
    scorer: &S,
    table: &mut CsvTable,
) -> Result<SentimentSummary, Box<dyn Error>> {
    let text_index = table
        .column_index(TEXT_COLUMN)
        .ok_or_else(|| format!("column `{TEXT_COLUMN}` not found in combined input"))?;

    table.rows.retain(|row| !row[text_index].trim().is_empty());

    let total = table.rows.len();
    let mut summary = SentimentSummary::default();
    let mut labels = Vec::with_capacity(total);
    let mut scores = Vec::with_capacity(total);
    for (index, row) in table.rows.iter().enumerate() {
        if (index + 1) % 10 == 0 {
            info!(row = index + 1, total, "Scoring sentiment");
        }
        let result = match scorer.score(&row[text_index]).await {
            Ok(result) => result,
            Err(e) => {
                warn!(row = index + 1, error = %e, "Scoring failed; degrading row");
                SentimentResult::error()
            }
        };
        summary.count(&result.label);
        labels.push(result.label);
        scores.push(result.score.to_string());
    }

    table.push_column("sentiment_label", labels);
    table.push_column("sentiment_score", scores);

    info!(
        positive = summary.positive,
        neutral = summary.neutral,
        negative = summary.negative,
        error = summary.error,
        "Sentiment scoring finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_mapping() {
        assert_eq!(map_label("LABEL_0"), "positive");
        assert_eq!(map_label("LABEL_1"), "neutral");
        assert_eq!(map_label("LABEL_2"), "negative");
        assert_eq!(map_label("positive"), "positive");
        assert_eq!(map_label("LABEL_9"), "LABEL_9");
    }

    struct KeywordScorer;

    impl ScoreSentiment for KeywordScorer {
        async fn score(&self, text: &str) -> Result<SentimentResult, Box<dyn Error>> {
            if text.contains("gagal") {
                return Err("model refused".into());
            }
            let label = if text.contains("damai") {
                "positive"
            } else {
                "neutral"
            };
            Ok(SentimentResult {
                label: label.to_string(),
                score: 0.9,
            })
        }
    }

    fn combined_table(summaries: &[&str]) -> CsvTable {
        let mut table = CsvTable::new(vec![
            "timestamp".to_string(),
            TEXT_COLUMN.to_string(),
            "content".to_string(),
        ]);
        for (i, summary) in summaries.iter().enumerate() {
            table.rows.push(vec![
                format!("t{i}"),
                summary.to_string(),
                "asli".to_string(),
            ]);
        }
        table
    }

    #[tokio::test]
    async fn test_score_table_appends_columns_and_counts() {
        let mut table = combined_table(&["indonesia damai", "berita biasa"]);
        let summary = score_table(&KeywordScorer, &mut table).await.unwrap();
        assert_eq!(
            table.headers,
            vec![
                "timestamp",
                TEXT_COLUMN,
                "content",
                "sentiment_label",
                "sentiment_score"
            ]
        );
        assert_eq!(table.rows[0][3], "positive");
        assert_eq!(table.rows[1][3], "neutral");
        assert_eq!(summary.positive, 1);
        assert_eq!(summary.neutral, 1);
        assert_eq!(summary.error, 0);
    }

    #[tokio::test]
    async fn test_score_table_degrades_failed_rows() {
        let mut table = combined_table(&["proses gagal di sini", "damai"]);
        let summary = score_table(&KeywordScorer, &mut table).await.unwrap();
        assert_eq!(table.rows[0][3], "error");
        assert_eq!(table.rows[0][4], "0");
        assert_eq!(summary.error, 1);
        assert_eq!(summary.positive, 1);
    }

    #[tokio::test]
    async fn test_score_table_drops_empty_summaries() {
        let mut table = combined_table(&["", "  ", "damai"]);
        score_table(&KeywordScorer, &mut table).await.unwrap();
        assert_eq!(table.rows.len(), 1);
    }

    #[tokio::test]
    async fn test_score_table_requires_summary_column() {
        let mut table = CsvTable::new(vec!["timestamp".to_string()]);
        assert!(score_table(&KeywordScorer, &mut table).await.is_err());
    }
}
