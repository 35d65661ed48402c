//! LLM-backed text cleaning with retry and sentinel degradation.
//!
//! Raw article bodies carry portal boilerplate ("SCROLL TO CONTINUE WITH
//! CONTENT", video embeds) and raw comments carry slang and emoji; both are
//! normalized by an LLM before sentiment scoring. Two backends speak the
//! same [`Clean`] interface:
//!
//! - [`GeminiClient`]: hosted Gemini `generateContent`, single attempt, a
//!   short sleep after each call to respect the API's rate tolerance.
//! - [`LocalLlmClient`]: an OpenAI-compatible local server (LM Studio), up
//!   to 3 attempts with a fixed 1-second backoff on transport errors or
//!   non-200 responses.
//!
//! Cleaning never fails upward: an exhausted backend yields a sentinel
//! string and the row loop moves on. The per-file runner inserts the result
//! column `gemini_summary` immediately before the content column, matching
//! what the combine and sentiment stages expect.

use crate::outputs::csv::CsvTable;
use reqwest::Client;
use serde_json::{Value, json};
use std::error::Error;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

/// Sentinel written when the hosted Gemini call fails.
pub const GEMINI_FAILURE: &str = "Error: Could not generate summary.";

/// Sentinel written when the local server fails all retry attempts.
pub const LOCAL_FAILURE: &str = "Error: Failed to process after multiple retries.";

/// Sentinel written for rows whose content is too short to clean.
pub const TOO_SHORT: &str = "Content too short or invalid.";

/// Rows at or under this many characters are not sent to the LLM.
pub const MIN_CONTENT_CHARS: usize = 10;

const LOCAL_MAX_ATTEMPTS: usize = 3;
const GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Default LM Studio endpoint and model.
pub const LOCAL_LLM_URL: &str = "http://127.0.0.1:1234/v1/chat/completions";
pub const LOCAL_LLM_MODEL: &str = "google/gemma-3-12b";

/// Which prompt template a piece of content gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    News,
    Comment,
}

/// Build the Indonesian cleaning prompt for one piece of content.
pub fn build_prompt(kind: ContentKind, content: &str) -> String {
    match kind {
        ContentKind::News => format!(
            "Anda adalah asisten AI yang bertugas membersihkan dan merangkum \
             artikel berita dari Indonesia.\n\
             Tugas Anda adalah membaca konten artikel berita yang diberikan, \
             mengabaikan teks non-berita seperti \"SCROLL TO CONTINUE WITH \
             CONTENT\", \"Tonton juga Video:\", atau \"[Gambas:Video 20detik]\".\n\n\
             Setelah itu, buatlah sebuah ringkasan berita yang netral, \
             informatif, dan jelas dalam satu paragraf (sekitar 3-5 kalimat).\n\n\
             Berikut adalah konten artikelnya:\n---\n{content}\n---\n\nRingkasan:"
        ),
        ContentKind::Comment => format!(
            "Anda adalah asisten AI yang bertugas membersihkan dan memperbaiki \
             tata bahasa komentar dari media sosial berbahasa Indonesia.\n\
             Tugas Anda adalah membaca komentar yang diberikan, lalu \
             menuliskannya kembali dengan ejaan dan tata bahasa yang benar. \
             JANGAN mengubah makna atau sentimen asli dari komentar tersebut.\n\
             Jika komentar menggunakan bahasa gaul atau singkatan (spt, yg, \
             kpn, dll), ubah menjadi kata yang baku.\n\
             Hapus semua emoji.\n\
             Output harus berupa teks komentar yang sudah bersih saja, tanpa \
             tambahan apa pun.\n\n\
             Berikut adalah komentarnya:\n---\n{content}\n---\n\n\
             Komentar yang sudah dibersihkan:"
        ),
    }
}

/// A single cleaning attempt against one backend.
pub trait CleanOnce {
    async fn clean_once(&self, prompt: &str) -> Result<String, Box<dyn Error>>;
}

/// Retry wrapper that degrades to a sentinel instead of failing.
///
/// Attempts run with a fixed `backoff` between them; the last failed
/// attempt gets no backoff.
pub struct RetryClean<T> {
    inner: T,
    max_attempts: usize,
    backoff: Duration,
    sentinel: &'static str,
}

impl<T: CleanOnce> RetryClean<T> {
    pub fn new(inner: T, max_attempts: usize, backoff: Duration, sentinel: &'static str) -> Self {
        Self {
            inner,
            max_attempts,
            backoff,
            sentinel,
        }
    }

    #[instrument(level = "debug", skip_all)]
    pub async fn clean(&self, prompt: &str) -> String {
        let t0 = Instant::now();
        for attempt in 1..=self.max_attempts {
            match self.inner.clean_once(prompt).await {
                Ok(text) => return text.trim().to_string(),
                Err(e) => {
                    warn!(
                        attempt,
                        max = self.max_attempts,
                        elapsed_ms = t0.elapsed().as_millis() as u64,
                        error = %e,
                        "Cleaning attempt failed"
                    );
                    if attempt < self.max_attempts {
                        sleep(self.backoff).await;
                    }
                }
            }
        }
        error!(
            attempts = self.max_attempts,
            "Cleaning failed on all attempts; writing sentinel"
        );
        self.sentinel.to_string()
    }
}

/// Hosted Gemini backend.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    /// Pause after each successful call, keeping under the API rate limit.
    post_delay: Duration,
}

impl GeminiClient {
    pub fn new(api_key: String, post_delay: Duration) -> Self {
        Self {
            client: Client::new(),
            api_key,
            post_delay,
        }
    }
}

impl CleanOnce for GeminiClient {
    async fn clean_once(&self, prompt: &str) -> Result<String, Box<dyn Error>> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{GEMINI_MODEL}:generateContent"
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(format!("Gemini API returned status {status}").into());
        }
        let value: Value = response.json().await?;
        let text = value["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or("Gemini response missing candidate text")?
            .to_string();
        sleep(self.post_delay).await;
        Ok(text)
    }
}

/// OpenAI-compatible local server backend (LM Studio).
pub struct LocalLlmClient {
    client: Client,
    url: String,
    model: String,
}

impl LocalLlmClient {
    pub fn new(url: String, model: String) -> Self {
        Self {
            client: Client::new(),
            url,
            model,
        }
    }
}

impl CleanOnce for LocalLlmClient {
    async fn clean_once(&self, prompt: &str) -> Result<String, Box<dyn Error>> {
        let payload = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": 0.7,
            "max_tokens": 500,
            "stream": false
        });
        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .timeout(Duration::from_secs(60))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(format!("local LLM server returned status {status}").into());
        }
        let value: Value = response.json().await?;
        let text = value["choices"][0]["message"]["content"]
            .as_str()
            .ok_or("local LLM response missing message content")?
            .to_string();
        Ok(text)
    }
}

/// Content cleaning, prompt selection included.
pub trait Clean {
    async fn clean(&self, content: &str, kind: ContentKind) -> String;
}

/// The runtime-selected cleaning backend.
pub enum Cleaner {
    Gemini(RetryClean<GeminiClient>),
    Local(RetryClean<LocalLlmClient>),
}

impl Cleaner {
    pub fn gemini(api_key: String, post_delay: Duration) -> Self {
        let client = GeminiClient::new(api_key, post_delay);
        Self::Gemini(RetryClean::new(client, 1, Duration::ZERO, GEMINI_FAILURE))
    }

    pub fn local(url: String, model: String, backoff: Duration) -> Self {
        let client = LocalLlmClient::new(url, model);
        Self::Local(RetryClean::new(
            client,
            LOCAL_MAX_ATTEMPTS,
            backoff,
            LOCAL_FAILURE,
        ))
    }
}

impl Clean for Cleaner {
    async fn clean(&self, content: &str, kind: ContentKind) -> String {
        let prompt = build_prompt(kind, content);
        match self {
            Cleaner::Gemini(inner) => inner.clean(&prompt).await,
            Cleaner::Local(inner) => inner.clean(&prompt).await,
        }
    }
}

/// One artifact the cleaning stage processes.
#[derive(Debug, Clone)]
pub struct CleanTarget {
    /// Human-readable name for logs.
    pub name: &'static str,
    pub input: &'static str,
    pub output: &'static str,
    /// Column whose text is sent to the LLM.
    pub content_column: &'static str,
    pub kind: ContentKind,
}

/// The artifacts the standard pipeline cleans.
pub fn default_clean_targets() -> Vec<CleanTarget> {
    vec![
        CleanTarget {
            name: "News Articles (Detik)",
            input: "news_portal/news_detik.csv",
            output: "news_portal/news_detik_cleaned.csv",
            content_column: "content",
            kind: ContentKind::News,
        },
        CleanTarget {
            name: "YouTube Comments",
            input: "social_media/youtube.csv",
            output: "social_media/youtube_cleaned.csv",
            content_column: "comment_text",
            kind: ContentKind::Comment,
        },
    ]
}

/// Clean every row of a table, inserting `gemini_summary` immediately
/// before the content column.
///
/// Rows whose content is [`MIN_CONTENT_CHARS`] characters or shorter get the
/// [`TOO_SHORT`] sentinel without an LLM call.
#[instrument(level = "info", skip_all, fields(rows = table.rows.len(), column = content_column))]
pub async fn clean_table<C: Clean>(
    cleaner: &C,
    table: &mut CsvTable,
    content_column: &str,
    kind: ContentKind,
) -> Result<(), Box<dyn Error>> {
    let content_index = table
        .column_index(content_column)
        .ok_or_else(|| format!("column `{content_column}` not found in input"))?;

    let total = table.rows.len();
    let mut summaries = Vec::with_capacity(total);
    for (index, row) in table.rows.iter().enumerate() {
        info!(row = index + 1, total, "Cleaning row");
        let content = &row[content_index];
        let summary = if content.chars().count() > MIN_CONTENT_CHARS {
            cleaner.clean(content, kind).await
        } else {
            TOO_SHORT.to_string()
        };
        summaries.push(summary);
    }

    table.insert_column(content_index, "gemini_summary", summaries);
    Ok(())
}
