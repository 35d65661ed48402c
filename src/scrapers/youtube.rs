//! YouTube comment collection through the Data API v3.
//!
//! Unlike the news portals, YouTube paginates by opaque continuation token
//! rather than page number: each `commentThreads.list` response carries a
//! `nextPageToken` that the next request echoes back. [`collect_comments`]
//! walks that chain, bounded by a max-results count, requesting at most
//! [`COMMENT_PAGE_SIZE`] items per call.
//!
//! API-level failures follow the crawler's recovery rule: log, keep what was
//! accumulated, and let the enclosing keyword loop continue.

use crate::config::ScrapingLimits;
use crate::models::Comment;
use crate::utils::now_stamp;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Largest page the commentThreads endpoint will serve.
pub const COMMENT_PAGE_SIZE: usize = 100;

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";

#[derive(Debug, Error)]
pub enum YouTubeError {
    #[error("YouTube API request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("YouTube API returned status {0}")]
    Status(StatusCode),
}

/// One comment as returned by the API, before being stamped into a
/// [`Comment`] row.
#[derive(Debug, Clone)]
pub struct RawComment {
    pub author: String,
    pub text: String,
    pub published_at: String,
}

/// One page of a video's comment stream.
#[derive(Debug)]
pub struct CommentPage {
    pub items: Vec<RawComment>,
    /// Continuation token for the next page; `None` means end of stream.
    pub next_token: Option<String>,
}

/// Seam over the paginated comment-listing operation.
pub trait ListCommentPages {
    async fn list_page(
        &self,
        video_id: &str,
        page_size: usize,
        token: Option<&str>,
    ) -> Result<CommentPage, YouTubeError>;
}

/// Seam over the full API surface the comment driver needs.
pub trait VideoApi: ListCommentPages {
    async fn search_videos(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<String>, YouTubeError>;
}

// Wire format of the two API endpoints. Only the fields this pipeline reads.

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThreadsResponse {
    #[serde(default)]
    items: Vec<CommentThread>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommentThread {
    snippet: CommentThreadSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThreadSnippet {
    top_level_comment: TopLevelComment,
}

#[derive(Debug, Deserialize)]
struct TopLevelComment {
    snippet: CommentSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentSnippet {
    author_display_name: String,
    text_display: String,
    published_at: String,
}

/// Data API v3 client authenticated by API key.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    client: Client,
    api_key: String,
}

impl YouTubeClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
        }
    }
}

impl ListCommentPages for YouTubeClient {
    async fn list_page(
        &self,
        video_id: &str,
        page_size: usize,
        token: Option<&str>,
    ) -> Result<CommentPage, YouTubeError> {
        let mut query: Vec<(&str, String)> = vec![
            ("part", "snippet".to_string()),
            ("videoId", video_id.to_string()),
            ("textFormat", "plainText".to_string()),
            ("maxResults", page_size.to_string()),
            ("key", self.api_key.clone()),
        ];
        if let Some(token) = token {
            query.push(("pageToken", token.to_string()));
        }

        let response = self
            .client
            .get(format!("{API_BASE}/commentThreads"))
            .query(&query)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(YouTubeError::Status(status));
        }

        let body: CommentThreadsResponse = response.json().await?;
        let items = body
            .items
            .into_iter()
            .map(|thread| {
                let snippet = thread.snippet.top_level_comment.snippet;
                RawComment {
                    author: snippet.author_display_name,
                    text: snippet.text_display,
                    published_at: snippet.published_at,
                }
            })
            .collect();
        Ok(CommentPage {
            items,
            next_token: body.next_page_token,
        })
    }
}

impl VideoApi for YouTubeClient {
    async fn search_videos(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<String>, YouTubeError> {
        let params: Vec<(&str, String)> = vec![
            ("part", "snippet".to_string()),
            ("q", query.to_string()),
            ("type", "video".to_string()),
            ("maxResults", max_results.to_string()),
            ("key", self.api_key.clone()),
        ];
        let response = self
            .client
            .get(format!("{API_BASE}/search"))
            .query(&params)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(YouTubeError::Status(status));
        }

        let body: SearchResponse = response.json().await?;
        Ok(body
            .items
            .into_iter()
            .filter_map(|item| item.id.video_id)
            .collect())
    }
}

/// Collect up to `max_results` comments from one video.
///
/// Each call requests `min(100, remaining)` items and carries the previous
/// response's continuation token. Stops at `max_results` or when the stream
/// ends; an API error ends collection with whatever was accumulated.
#[instrument(level = "info", skip_all, fields(%video_id, max_results))]
pub async fn collect_comments<L: ListCommentPages>(
    lister: &L,
    video_id: &str,
    max_results: usize,
) -> Vec<RawComment> {
    let mut comments: Vec<RawComment> = Vec::new();
    let mut token: Option<String> = None;

    while comments.len() < max_results {
        let page_size = COMMENT_PAGE_SIZE.min(max_results - comments.len());
        match lister.list_page(video_id, page_size, token.as_deref()).await {
            Ok(page) => {
                comments.extend(page.items);
                token = page.next_token;
                if token.is_none() {
                    break;
                }
            }
            Err(e) => {
                warn!(%video_id, error = %e, collected = comments.len(), "Comment page fetch failed; keeping partial results");
                break;
            }
        }
    }

    comments.truncate(max_results);
    info!(count = comments.len(), "Collected comments");
    comments
}

/// Run the comment collection across all configured YouTube keywords.
///
/// For each keyword: search for videos, then drain each video's comment
/// stream up to the per-video limit. A keyword whose search fails or finds
/// nothing is skipped; the loop always continues.
#[instrument(level = "info", skip_all, fields(keywords = keywords.len()))]
pub async fn collect_for_keywords<A: VideoApi>(
    api: &A,
    keywords: &[String],
    limits: &ScrapingLimits,
) -> Vec<Comment> {
    let mut rows: Vec<Comment> = Vec::new();

    for keyword in keywords {
        info!(%keyword, "Searching videos");
        let video_ids = match api.search_videos(keyword, limits.videos_per_keyword).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(%keyword, error = %e, "Video search failed; skipping keyword");
                continue;
            }
        };
        if video_ids.is_empty() {
            info!(%keyword, "No videos found");
            continue;
        }
        info!(%keyword, count = video_ids.len(), "Found videos");

        for video_id in &video_ids {
            let comments = collect_comments(api, video_id, limits.comments_per_video).await;
            let video_url = format!("https://www.youtube.com/watch?v={video_id}");
            for raw in comments {
                rows.push(Comment {
                    timestamp: now_stamp(),
                    keyword: keyword.clone(),
                    source: "YouTube".to_string(),
                    video_url: video_url.clone(),
                    commenter_name: raw.author,
                    comment_text: raw.text,
                    comment_date: raw.published_at,
                });
            }
        }
    }

    info!(total = rows.len(), "Comment collection finished");
    rows
}
