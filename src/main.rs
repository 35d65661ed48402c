//! # Kabar Damai
//!
//! A data-collection and sentiment pipeline for Indonesian-language coverage
//! of a social campaign theme. It crawls news portals and YouTube comments
//! keyword by keyword, normalizes the text through an LLM cleaning step,
//! merges every source into one dataset, and scores 3-way sentiment.
//!
//! ## Usage
//!
//! ```sh
//! kabar_damai crawl-news --target 1000
//! kabar_damai crawl-youtube
//! kabar_damai clean --backend gemini
//! kabar_damai combine
//! kabar_damai sentiment
//! kabar_damai inspect
//! ```
//!
//! ## Architecture
//!
//! The stages form a pipeline over CSV artifacts:
//! 1. **Crawl**: quota-scheduled collection across keywords × sources
//! 2. **Clean**: per-row LLM normalization (adds `gemini_summary`)
//! 3. **Combine**: merge cleaned artifacts into one master file
//! 4. **Sentiment**: label + confidence per row
//!
//! Every network call is sequential with fixed self-throttling delays;
//! partial results are kept whenever a source fails mid-collection.

use clap::Parser;
use itertools::Itertools;
use std::collections::HashMap;
use std::error::Error;
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod fetch;
mod models;
mod outputs;
mod scheduler;
mod scrapers;
mod sentiment;
mod sites;
mod stats;
mod utils;

use api::{Cleaner, clean_table, default_clean_targets};
use cli::{Cli, CleanBackendArg, Command};
use config::{CampaignConfig, Delays};
use fetch::{FETCH_TIMEOUT, HttpFetcher};
use outputs::csv::{CsvTable, read_articles, write_articles, write_comments};
use scheduler::{CrawlBudget, NewsScraper, run_schedule};
use scrapers::youtube::{YouTubeClient, collect_for_keywords};
use sentiment::{HttpSentimentClient, score_table};
use stats::{compute_stats, filter_by_keyword, filter_by_source, preview};
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    // .env credentials must be in place before clap reads env fallbacks
    dotenvy::dotenv().ok();

    let start_time = std::time::Instant::now();
    info!("kabar_damai starting up");

    let args = Cli::parse();
    let mut campaign = CampaignConfig::load(args.config.as_deref())?;

    match args.command {
        Command::CrawlNews {
            target,
            per_pair_cap,
            limit_keywords,
        } => {
            if let Some(n) = limit_keywords {
                campaign.limit_keywords(n);
            }
            let target = target.unwrap_or(campaign.limits.target_total_articles);
            let cap = per_pair_cap.unwrap_or(campaign.limits.articles_per_keyword_site);
            run_crawl_news(&campaign, target, cap).await?;
        }
        Command::CrawlYoutube {
            api_key,
            videos_per_keyword,
            comments_per_video,
            output,
            limit_keywords,
        } => {
            if let Some(n) = limit_keywords {
                campaign.limit_keywords(n);
            }
            if let Some(n) = videos_per_keyword {
                campaign.limits.videos_per_keyword = n;
            }
            if let Some(n) = comments_per_video {
                campaign.limits.comments_per_video = n;
            }
            run_crawl_youtube(&campaign, api_key, &output).await?;
        }
        Command::Clean {
            backend,
            gemini_api_key,
            local_url,
            local_model,
        } => {
            run_clean(backend, gemini_api_key, local_url, local_model).await?;
        }
        Command::Combine { merge_mode, output } => {
            let folders = ["news_portal", "social_media"];
            let rows =
                outputs::combine::run_combine(&folders, Path::new(&output), merge_mode.into())?;
            info!(rows, path = %output, "Combine stage complete");
        }
        Command::Sentiment {
            input,
            output,
            endpoint,
            api_token,
        } => {
            run_sentiment(&input, &output, endpoint, api_token).await?;
        }
        Command::Inspect {
            input,
            keyword,
            source,
        } => {
            run_inspect(&input, keyword.as_deref(), source.as_deref())?;
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}

/// Crawl every configured news portal, then write one CSV per site.
async fn run_crawl_news(
    campaign: &CampaignConfig,
    target: usize,
    per_pair_cap: usize,
) -> Result<(), Box<dyn Error>> {
    let sites = sites::builtin_sites();
    info!(
        keywords = campaign.news_keywords.len(),
        sites = sites.len(),
        target,
        per_pair_cap,
        "Starting news crawl"
    );

    if let Err(e) = ensure_writable_dir("news_portal").await {
        error!(error = %e, "news_portal directory is not writable");
        return Err(e);
    }

    let delays = Delays::standard();
    let fetcher = HttpFetcher::new(FETCH_TIMEOUT)?;
    let scraper = NewsScraper {
        fetcher: &fetcher,
        delays: &delays,
    };
    let mut budget = CrawlBudget::new(target, per_pair_cap);
    let by_site = run_schedule(
        &scraper,
        &campaign.news_keywords,
        sites,
        &mut budget,
        &delays,
    )
    .await;

    for site in sites {
        let articles = by_site
            .get(&site.name)
            .map(Vec::as_slice)
            .unwrap_or_default();
        write_articles(Path::new(&site.csv_file), articles)?;
    }

    let total: usize = by_site.values().map(Vec::len).sum();
    let achievement = if target == 0 {
        100.0
    } else {
        total as f64 / target as f64 * 100.0
    };
    info!(
        total,
        target,
        achievement = %format!("{achievement:.1}%"),
        "News crawl complete"
    );

    let mut keyword_counts: HashMap<&str, usize> = HashMap::new();
    for article in by_site.values().flatten() {
        *keyword_counts.entry(article.keyword.as_str()).or_default() += 1;
    }
    for (keyword, count) in keyword_counts
        .into_iter()
        .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)))
    {
        info!(%keyword, count, "Keyword yield");
    }

    Ok(())
}

/// Search videos per keyword and collect their comments into one CSV.
async fn run_crawl_youtube(
    campaign: &CampaignConfig,
    api_key: Option<String>,
    output: &str,
) -> Result<(), Box<dyn Error>> {
    let Some(api_key) = api_key.filter(|key| !key.is_empty()) else {
        error!("YOUTUBE_API_KEY not set; aborting before any work");
        return Err("missing YOUTUBE_API_KEY".into());
    };

    if let Some(parent) = Path::new(output).parent() {
        if let Some(parent) = parent.to_str().filter(|p| !p.is_empty()) {
            ensure_writable_dir(parent).await?;
        }
    }

    let client = YouTubeClient::new(api_key);
    let comments =
        collect_for_keywords(&client, &campaign.youtube_keywords, &campaign.limits).await;

    if comments.is_empty() {
        warn!("No comments collected");
        return Ok(());
    }
    write_comments(Path::new(output), &comments)?;
    Ok(())
}

/// Clean each known artifact with the chosen backend. Missing inputs are
/// skipped; the loop always visits every target.
async fn run_clean(
    backend: CleanBackendArg,
    gemini_api_key: Option<String>,
    local_url: String,
    local_model: String,
) -> Result<(), Box<dyn Error>> {
    let delays = Delays::standard();
    let cleaner = match backend {
        CleanBackendArg::Gemini => {
            let Some(key) = gemini_api_key.filter(|key| !key.is_empty()) else {
                error!("GEMINI_API_KEY not set; aborting before any work");
                return Err("missing GEMINI_API_KEY".into());
            };
            Cleaner::gemini(key, delays.llm)
        }
        CleanBackendArg::Local => {
            info!(url = %local_url, model = %local_model, "Using local LLM server");
            Cleaner::local(local_url, local_model, delays.llm)
        }
    };

    for target in default_clean_targets() {
        let input = Path::new(target.input);
        if !input.exists() {
            warn!(name = target.name, path = target.input, "Input file not found, skipping");
            continue;
        }

        info!(name = target.name, path = target.input, "Cleaning artifact");
        let mut table = match CsvTable::read(input) {
            Ok(table) => table,
            Err(e) => {
                warn!(name = target.name, error = %e, "Failed to read input, skipping");
                continue;
            }
        };
        if let Err(e) = clean_table(&cleaner, &mut table, target.content_column, target.kind).await
        {
            warn!(name = target.name, error = %e, "Cleaning failed, skipping");
            continue;
        }
        table.write(Path::new(target.output))?;
        info!(
            name = target.name,
            path = target.output,
            rows = table.rows.len(),
            "Cleaned artifact written"
        );
    }

    Ok(())
}

/// Score the combined dataset and write the final artifact.
async fn run_sentiment(
    input: &str,
    output: &str,
    endpoint: Option<String>,
    api_token: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let input_path = Path::new(input);
    if !input_path.exists() {
        error!(path = input, "Combined input not found; run the combine stage first");
        return Err("combined input not found".into());
    }

    info!(model = sentiment::SENTIMENT_MODEL, "Starting sentiment analysis");
    let mut table = CsvTable::read(input_path)?;
    let endpoint = endpoint.unwrap_or_else(HttpSentimentClient::default_endpoint);
    let scorer = HttpSentimentClient::new(endpoint, api_token);
    let summary = score_table(&scorer, &mut table).await?;
    table.write(Path::new(output))?;

    info!(
        path = output,
        rows = table.rows.len(),
        positive = summary.positive,
        neutral = summary.neutral,
        negative = summary.negative,
        error = summary.error,
        "Final sentiment artifact written"
    );
    Ok(())
}

/// Print statistics and previews for a crawled article CSV.
fn run_inspect(
    input: &str,
    keyword: Option<&str>,
    source: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    let mut articles = read_articles(Path::new(input))?;
    if let Some(source) = source {
        articles = filter_by_source(&articles, source)
            .into_iter()
            .cloned()
            .collect();
    }
    if articles.is_empty() {
        warn!(path = input, "No articles to inspect");
        return Ok(());
    }

    let stats = compute_stats(&articles);
    println!("{stats}");
    println!("First article:\n\n{}", preview(&articles[0]));

    if let Some(keyword) = keyword {
        let matching = filter_by_keyword(&articles, keyword);
        println!("\n{} articles for keyword '{keyword}'", matching.len());
        if let Some(first) = matching.first() {
            println!("\n{}", preview(first));
        }
    }

    Ok(())
}
