//! Quota-driven collection scheduling across keywords and sites.
//!
//! The scheduler owns the only mutable progress state of a crawl: the
//! running total of collected articles. It walks the keyword × site grid in
//! keyword-major order, hands each pair a quota bounded by both the per-pair
//! cap and the remaining global budget, and halts the moment the overall
//! target is met. The "target met" condition lives in one predicate
//! ([`CrawlBudget::target_met`]) evaluated at every loop boundary rather
//! than being re-derived at each nesting level.

use crate::config::Delays;
use crate::fetch::Fetch;
use crate::models::Article;
use crate::scrapers::news::scrape_site;
use crate::sites::SiteProfile;
use std::collections::HashMap;
use tokio::time::sleep;
use tracing::{info, instrument};

/// Global crawl budget: overall target, per-(keyword, site) cap, and the
/// running total. The total only grows by what a site scraper actually
/// yielded, so a dry source never inflates progress.
#[derive(Debug, Clone)]
pub struct CrawlBudget {
    target: usize,
    per_pair_cap: usize,
    total_collected: usize,
}

impl CrawlBudget {
    pub fn new(target: usize, per_pair_cap: usize) -> Self {
        Self {
            target,
            per_pair_cap,
            total_collected: 0,
        }
    }

    /// The halting predicate, checked at keyword start, site start, and
    /// after every site-scraper call.
    pub fn target_met(&self) -> bool {
        self.total_collected >= self.target
    }

    /// Quota for the next (keyword, site) pair: the per-pair cap, shrunk to
    /// whatever remains of the global target.
    pub fn next_quota(&self) -> usize {
        self.per_pair_cap
            .min(self.target.saturating_sub(self.total_collected))
    }

    /// Record the actual yield of a completed site-scraper call.
    pub fn record(&mut self, yielded: usize) {
        self.total_collected += yielded;
    }

    pub fn total_collected(&self) -> usize {
        self.total_collected
    }

    pub fn target(&self) -> usize {
        self.target
    }
}

/// Seam for one (keyword, site) scrape, so the schedule logic can be
/// exercised without network or markup.
pub trait ScrapeSite {
    async fn scrape(&self, keyword: &str, site: &SiteProfile, quota: usize) -> Vec<Article>;
}

/// Production scraper backed by the news-portal pipeline.
pub struct NewsScraper<'a, F: Fetch> {
    pub fetcher: &'a F,
    pub delays: &'a Delays,
}

impl<'a, F: Fetch> ScrapeSite for NewsScraper<'a, F> {
    async fn scrape(&self, keyword: &str, site: &SiteProfile, quota: usize) -> Vec<Article> {
        scrape_site(self.fetcher, keyword, site, quota, self.delays).await
    }
}

/// Walk keywords × sites until the budget's target is met, collecting each
/// site's articles in crawl order.
///
/// A pair is never revisited; a pair that yields nothing leaves the total
/// untouched and the walk moves on to the next pair.
#[instrument(level = "info", skip_all, fields(target = budget.target(), keywords = keywords.len(), sites = sites.len()))]
pub async fn run_schedule<S: ScrapeSite>(
    scraper: &S,
    keywords: &[String],
    sites: &[SiteProfile],
    budget: &mut CrawlBudget,
    delays: &Delays,
) -> HashMap<String, Vec<Article>> {
    let mut by_site: HashMap<String, Vec<Article>> = sites
        .iter()
        .map(|site| (site.name.clone(), Vec::new()))
        .collect();

    for (index, keyword) in keywords.iter().enumerate() {
        if budget.target_met() {
            info!(
                total = budget.total_collected(),
                "Target reached; stopping keyword loop"
            );
            break;
        }
        info!(
            keyword_index = index + 1,
            keyword_count = keywords.len(),
            %keyword,
            progress = budget.total_collected(),
            target = budget.target(),
            "Processing keyword"
        );

        for site in sites {
            if budget.target_met() {
                break;
            }
            let quota = budget.next_quota();
            if quota == 0 {
                break;
            }

            let articles = scraper.scrape(keyword, site, quota).await;
            budget.record(articles.len());
            info!(
                site = %site.name,
                yielded = articles.len(),
                quota,
                progress = budget.total_collected(),
                target = budget.target(),
                "Site scrape recorded"
            );
            if let Some(bucket) = by_site.get_mut(&site.name) {
                bucket.extend(articles);
            }

            sleep(delays.site).await;
        }
    }

    let total: usize = by_site.values().map(Vec::len).sum();
    info!(
        total,
        target = budget.target(),
        "Crawl schedule finished"
    );
    by_site
}
