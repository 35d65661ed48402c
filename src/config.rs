//! Campaign configuration: search keywords, collection limits, and the
//! self-throttling delays used between network calls.
//!
//! The compiled-in defaults mirror the #WujudkanIndonesiaDamai monitoring
//! campaign. A YAML file with the same field names can override the keyword
//! lists and limits for a different campaign without recompiling.

use serde::Deserialize;
use std::error::Error;
use std::time::Duration;
use tracing::info;

/// Default keywords searched against the news portals.
pub const NEWS_KEYWORDS: &[&str] = &[
    // Kata kunci utama
    "Wujudkan Indonesia Damai",
    "Indonesia Damai",
    "Kampanye Damai",
    "Gerakan Indonesia Damai",
    // Persatuan dan anti-perpecahan
    "jaga persatuan bangsa",
    "persatuan dan kesatuan",
    "rekonsiliasi nasional",
    "anti provokasi",
    "stop adu domba",
    // Toleransi dan kerukunan
    "toleransi beragama",
    "kerukunan umat beragama",
    "dialog lintas agama",
    "moderasi beragama",
    // Anti-hoax dan suasana kondusif
    "anti hoax",
    "anti berita bohong",
    "ciptakan suasana sejuk",
    "pemilu damai",
    "pendinginan pasca pemilu",
    // Kombinasi dengan institusi
    "Wujudkan Indonesia Damai Polri",
    "kerukunan umat beragama Kemenag",
    "deklarasi damai tokoh masyarakat",
    "pemilu damai KPU Bawaslu",
    "kampanye anti hoax Kominfo",
];

/// Default search queries for the YouTube comment collection.
pub const YOUTUBE_KEYWORDS: &[&str] = &[
    "Webinar Wujudkan Indonesia Damai",
    "Deklarasi kampanye damai",
    "Pesan damai dari tokoh agama",
    "Polri ajak masyarakat jaga persatuan",
    "Liputan berita Indonesia Damai",
    "Podcast tentang toleransi di Indonesia",
    "Dialog kerukunan umat beragama",
    "Kampanye anti hoax Indonesia",
    "seruan indonesia damai",
    "ajakan jaga kerukunan",
    "himbauan pasca pemilu",
    "diskusi kebangsaan",
    "peran pemuda untuk perdamaian",
    "menjaga keutuhan NKRI",
    "stop politik identitas",
    "narasi persatuan bangsa",
    "indonesia rukun dan damai",
    "pentingnya toleransi antar umat",
    "kolaborasi membangun negeri",
    "kontra narasi hoaks",
    "menuju indonesia emas damai",
];

/// Collection limits controlling how much data each stage gathers.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScrapingLimits {
    /// Overall article target across all keywords and sites.
    pub target_total_articles: usize,
    /// Cap on articles per (keyword, site) pair.
    pub articles_per_keyword_site: usize,
    /// Videos fetched per YouTube keyword.
    pub videos_per_keyword: usize,
    /// Comments collected per video.
    pub comments_per_video: usize,
}

impl Default for ScrapingLimits {
    fn default() -> Self {
        Self {
            target_total_articles: 1000,
            articles_per_keyword_site: 30,
            videos_per_keyword: 3,
            comments_per_video: 50,
        }
    }
}

/// Keyword lists plus limits, with compiled-in campaign defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CampaignConfig {
    pub news_keywords: Vec<String>,
    pub youtube_keywords: Vec<String>,
    pub limits: ScrapingLimits,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            news_keywords: NEWS_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            youtube_keywords: YOUTUBE_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            limits: ScrapingLimits::default(),
        }
    }
}

impl CampaignConfig {
    /// Load the campaign configuration.
    ///
    /// With `path` set, reads a YAML file whose fields override the defaults;
    /// otherwise returns the compiled-in campaign.
    pub fn load(path: Option<&str>) -> Result<Self, Box<dyn Error>> {
        match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p)?;
                let config: CampaignConfig = serde_yaml::from_str(&raw)?;
                info!(
                    path = %p,
                    news_keywords = config.news_keywords.len(),
                    youtube_keywords = config.youtube_keywords.len(),
                    "Loaded campaign configuration"
                );
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    /// Keep only the first `n` keywords of each list. Used for trial runs.
    pub fn limit_keywords(&mut self, n: usize) {
        self.news_keywords.truncate(n);
        self.youtube_keywords.truncate(n);
    }
}

/// Fixed self-throttling delays between network calls.
///
/// These keep the crawler inside the informal rate tolerance of the external
/// services; they are not correctness mechanisms. Tests run with
/// [`Delays::zero`].
#[derive(Debug, Clone, Copy)]
pub struct Delays {
    /// Between search-result pages of one site.
    pub page: Duration,
    /// Between article fetches of one site.
    pub article: Duration,
    /// Between site invocations of the scheduler.
    pub site: Duration,
    /// After each LLM cleaning call.
    pub llm: Duration,
}

impl Delays {
    /// Production values.
    pub fn standard() -> Self {
        Self {
            page: Duration::from_secs(2),
            article: Duration::from_secs(1),
            site: Duration::from_secs(3),
            llm: Duration::from_secs(1),
        }
    }

    /// All-zero delays for tests.
    pub fn zero() -> Self {
        Self {
            page: Duration::ZERO,
            article: Duration::ZERO,
            site: Duration::ZERO,
            llm: Duration::ZERO,
        }
    }
}
