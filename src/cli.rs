//! Command-line interface definitions for Kabar Damai.
//!
//! One subcommand per pipeline stage, mirroring how the stages run in
//! practice: crawl → clean → combine → sentiment, with `inspect` for looking
//! at any crawl artifact. API keys can come from flags or the environment
//! (a `.env` file is loaded before parsing).

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for the Kabar Damai pipeline.
///
/// # Examples
///
/// ```sh
/// kabar_damai crawl-news --target 100 --per-pair-cap 10
/// kabar_damai crawl-youtube
/// kabar_damai clean --backend local
/// kabar_damai combine --merge-mode union
/// kabar_damai sentiment
/// kabar_damai inspect --keyword "pemilu damai"
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional campaign configuration YAML (keywords and limits)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Crawl the configured news portals keyword by keyword
    CrawlNews {
        /// Overall article target across all keywords and sites
        #[arg(long)]
        target: Option<usize>,

        /// Cap on articles per (keyword, site) pair
        #[arg(long)]
        per_pair_cap: Option<usize>,

        /// Only process the first N keywords (trial runs)
        #[arg(long)]
        limit_keywords: Option<usize>,
    },

    /// Search YouTube per keyword and collect video comments
    CrawlYoutube {
        /// YouTube Data API v3 key
        #[arg(long, env = "YOUTUBE_API_KEY")]
        api_key: Option<String>,

        /// Videos fetched per keyword
        #[arg(long)]
        videos_per_keyword: Option<usize>,

        /// Comments collected per video
        #[arg(long)]
        comments_per_video: Option<usize>,

        /// Output CSV path
        #[arg(long, default_value = "social_media/youtube.csv")]
        output: String,

        /// Only process the first N keywords (trial runs)
        #[arg(long)]
        limit_keywords: Option<usize>,
    },

    /// Clean crawled text with an LLM, adding a gemini_summary column
    Clean {
        /// Which LLM backend performs the cleaning
        #[arg(long, value_enum, default_value_t = CleanBackendArg::Gemini)]
        backend: CleanBackendArg,

        /// Gemini API key (required for the gemini backend)
        #[arg(long, env = "GEMINI_API_KEY")]
        gemini_api_key: Option<String>,

        /// Chat-completions endpoint of the local LLM server
        #[arg(long, default_value = crate::api::LOCAL_LLM_URL)]
        local_url: String,

        /// Model name loaded in the local LLM server
        #[arg(long, default_value = crate::api::LOCAL_LLM_MODEL)]
        local_model: String,
    },

    /// Merge all cleaned artifacts into one master CSV
    Combine {
        /// How to treat header differences between sources
        #[arg(long, value_enum, default_value_t = MergeModeArg::Union)]
        merge_mode: MergeModeArg,

        /// Output path of the combined master file
        #[arg(long, default_value = "combined_data/combined_all_sources_cleaned.csv")]
        output: String,
    },

    /// Score the combined dataset with the Indonesian sentiment model
    Sentiment {
        /// Combined input CSV (output of the combine stage)
        #[arg(long, default_value = "combined_data/combined_all_sources_cleaned.csv")]
        input: String,

        /// Output path with sentiment columns appended
        #[arg(long, default_value = "combined_data/final_sentiment_results.csv")]
        output: String,

        /// Inference endpoint; defaults to the hosted model endpoint
        #[arg(long)]
        endpoint: Option<String>,

        /// Bearer token for the inference endpoint
        #[arg(long, env = "HF_API_TOKEN")]
        api_token: Option<String>,
    },

    /// Show statistics and a preview of a crawled article CSV
    Inspect {
        /// Article CSV to inspect
        #[arg(long, default_value = "news_portal/news_detik.csv")]
        input: String,

        /// Also preview the first article matching this keyword
        #[arg(long)]
        keyword: Option<String>,

        /// Restrict statistics to one source before reporting
        #[arg(long)]
        source: Option<String>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanBackendArg {
    /// Hosted Gemini API
    Gemini,
    /// OpenAI-compatible local server (LM Studio)
    Local,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeModeArg {
    /// Header union; absent columns become empty cells
    Union,
    /// Fail on any header mismatch
    Strict,
}

impl From<MergeModeArg> for crate::outputs::combine::MergeMode {
    fn from(arg: MergeModeArg) -> Self {
        match arg {
            MergeModeArg::Union => Self::Union,
            MergeModeArg::Strict => Self::Strict,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crawl_news_flags() {
        let cli = Cli::parse_from([
            "kabar_damai",
            "crawl-news",
            "--target",
            "100",
            "--per-pair-cap",
            "10",
        ]);
        match cli.command {
            Command::CrawlNews {
                target,
                per_pair_cap,
                limit_keywords,
            } => {
                assert_eq!(target, Some(100));
                assert_eq!(per_pair_cap, Some(10));
                assert_eq!(limit_keywords, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_clean_defaults_to_gemini_backend() {
        let cli = Cli::parse_from(["kabar_damai", "clean"]);
        match cli.command {
            Command::Clean {
                backend,
                local_url,
                local_model,
                ..
            } => {
                assert_eq!(backend, CleanBackendArg::Gemini);
                assert_eq!(local_url, crate::api::LOCAL_LLM_URL);
                assert_eq!(local_model, crate::api::LOCAL_LLM_MODEL);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_combine_merge_mode_parses() {
        let cli = Cli::parse_from(["kabar_damai", "combine", "--merge-mode", "strict"]);
        match cli.command {
            Command::Combine { merge_mode, .. } => {
                assert_eq!(merge_mode, MergeModeArg::Strict);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::parse_from(["kabar_damai", "inspect", "--config", "campaign.yaml"]);
        assert_eq!(cli.config.as_deref(), Some("campaign.yaml"));
    }
}
