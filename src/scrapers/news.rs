//! Keyword-driven news portal scraping.
//!
//! Three layers, composed per (keyword, site) pair:
//!
//! 1. [`collect_links`]: paginate the site's search endpoint and accumulate
//!    deduplicated article URLs until the backlog margin is reached.
//! 2. [`extract_article`]: fetch one URL and pull the title and body
//!    paragraphs through the site's selector rules.
//! 3. [`scrape_site`]: run both for one keyword, capped by a quota.
//!
//! Transport failures never propagate out of this module: a failed page
//! ends pagination with whatever was collected, and a failed article is
//! skipped. Partial results are expected output, not an error state.

use crate::config::Delays;
use crate::fetch::Fetch;
use crate::models::{Article, NO_CONTENT, NO_TITLE};
use crate::sites::SiteProfile;
use crate::utils::now_stamp;
use futures::stream::{self, StreamExt};
use scraper::Html;
use std::collections::HashSet;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Collect up to `needed` article URLs from the site's search results.
///
/// Pages run from 1 to the profile's `max_pages`. Pagination stops early
/// once `2 × needed` links are buffered (backlog margin against articles
/// that later fail extraction) or a page yields no result containers. The
/// buffered sequence is truncated to exactly `needed` before returning.
///
/// A transport failure on any page ends pagination immediately; links
/// already collected are kept.
#[instrument(level = "info", skip_all, fields(site = %profile.name, %keyword, needed))]
pub async fn collect_links<F: Fetch>(
    fetcher: &F,
    keyword: &str,
    profile: &SiteProfile,
    needed: usize,
    delays: &Delays,
) -> Vec<String> {
    let mut links: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for page in 1..=profile.max_pages {
        if links.len() >= needed * 2 {
            break;
        }

        let search_url = profile.search.render(keyword, page);
        debug!(page, max_pages = profile.max_pages, url = %search_url, "Fetching search page");

        let html = match fetcher.get_text(&search_url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(page, url = %search_url, error = %e, "Search page fetch failed; stopping pagination");
                break;
            }
        };

        let page_links = extract_page_links(&html, profile);
        if page_links.is_empty() {
            info!(page, "No result containers on page; end of results");
            break;
        }

        let mut new_on_page = 0usize;
        for link in page_links {
            if seen.insert(link.clone()) {
                links.push(link);
                new_on_page += 1;
            }
        }
        debug!(page, new_on_page, total = links.len(), "Accumulated links");

        sleep(delays.page).await;
    }

    links.truncate(needed);
    info!(count = links.len(), "Collected article links");
    links
}

/// Pull the candidate article URLs out of one search-result page.
///
/// One link per result container: the first element matching the profile's
/// link rule. Relative hrefs resolve against the profile's base URL.
fn extract_page_links(html: &str, profile: &SiteProfile) -> Vec<String> {
    let document = Html::parse_document(html);
    let container_selector = profile.container.selector();
    let link_selector = profile.link.selector();
    let base = Url::parse(&profile.base_url).ok();

    let mut links = Vec::new();
    for container in document.select(&container_selector) {
        let Some(anchor) = container.select(&link_selector).next() else {
            continue;
        };
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let absolute = match Url::parse(href) {
            Ok(url) => url.to_string(),
            Err(_) => match &base {
                Some(base) => match base.join(href) {
                    Ok(resolved) => resolved.to_string(),
                    Err(_) => continue,
                },
                None => continue,
            },
        };
        links.push(absolute);
    }
    links
}

/// Fetch one article URL and extract it through the site's rules.
///
/// Selector misses are not failures: a missing title or body degrades to the
/// sentinel values and the article is still returned, so downstream stages
/// always see a well-formed record. Only a transport failure yields `None`.
#[instrument(level = "debug", skip_all, fields(%url))]
pub async fn extract_article<F: Fetch>(
    fetcher: &F,
    url: &str,
    profile: &SiteProfile,
) -> Option<Article> {
    let html = match fetcher.get_text(url).await {
        Ok(html) => html,
        Err(e) => {
            warn!(%url, error = %e, "Article fetch failed; skipping");
            return None;
        }
    };
    Some(parse_article(&html, url, profile))
}

fn parse_article(html: &str, url: &str, profile: &SiteProfile) -> Article {
    let document = Html::parse_document(html);

    let title = document
        .select(&profile.title.selector())
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| NO_TITLE.to_string());

    let paragraph_selector = profile.paragraph.selector();
    let paragraphs: Vec<String> = match document.select(&profile.content.selector()).next() {
        Some(body) => body
            .select(&paragraph_selector)
            .map(|p| p.text().collect::<String>().trim().to_string())
            .filter(|text| !text.is_empty())
            .collect(),
        None => Vec::new(),
    };

    let paragraph_count = paragraphs.len();
    let content = if paragraphs.is_empty() {
        NO_CONTENT.to_string()
    } else {
        paragraphs.join("\n")
    };

    Article {
        timestamp: now_stamp(),
        keyword: String::new(),
        source: profile.name.clone(),
        title,
        url: url.to_string(),
        content,
        paragraph_count,
    }
}

/// Scrape one (keyword, site) pair: collect links, then extract articles in
/// order until `quota` articles have been produced.
///
/// The inter-article delay applies after every attempt, extracted or not.
/// Links left over once the quota is met are discarded.
#[instrument(level = "info", skip_all, fields(site = %profile.name, %keyword, quota))]
pub async fn scrape_site<F: Fetch>(
    fetcher: &F,
    keyword: &str,
    profile: &SiteProfile,
    quota: usize,
    delays: &Delays,
) -> Vec<Article> {
    let links = collect_links(fetcher, keyword, profile, quota, delays).await;
    if links.is_empty() {
        info!("No links collected; nothing to scrape");
        return Vec::new();
    }

    let articles: Vec<Article> = stream::iter(links)
        .then(|link| async move {
            let article = extract_article(fetcher, &link, profile).await;
            sleep(delays.article).await;
            article
        })
        .filter_map(std::future::ready)
        .map(|mut article| {
            article.keyword = keyword.to_string();
            article
        })
        .take(quota)
        .collect()
        .await;

    info!(count = articles.len(), quota, "Site scrape finished");
    articles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchError;
    use crate::sites::{ParagraphRule, SearchTemplate, SelectorRule};
    use std::collections::HashMap;

    struct FakeFetcher {
        pages: HashMap<String, String>,
    }

    impl FakeFetcher {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(url, html)| (url.to_string(), html.to_string()))
                    .collect(),
            }
        }
    }

    impl Fetch for FakeFetcher {
        async fn get_text(&self, url: &str) -> Result<String, FetchError> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::Connect(format!("no fixture for {url}")))
        }
    }

    fn test_profile(max_pages: usize) -> SiteProfile {
        SiteProfile::new(
            "contoh",
            "https://t.test",
            SearchTemplate::new("https://t.test/search?q={keyword}&page={page}").unwrap(),
            SelectorRule::tag("article"),
            SelectorRule::tag("a"),
            SelectorRule::tag("h1"),
            SelectorRule::with_class("div", "body"),
            ParagraphRule::tag("p"),
            max_pages,
            "out.csv",
        )
        .unwrap()
    }

    fn result_page(hrefs: &[&str]) -> String {
        let items: String = hrefs
            .iter()
            .map(|href| format!("<article><a href=\"{href}\">judul</a></article>"))
            .collect();
        format!("<html><body>{items}</body></html>")
    }

    #[tokio::test]
    async fn test_collect_links_dedups_and_truncates() {
        let fetcher = FakeFetcher::new(&[
            (
                "https://t.test/search?q=damai&page=1",
                &result_page(&["/a", "/b", "/a"]),
            ),
            (
                "https://t.test/search?q=damai&page=2",
                &result_page(&["/b", "/c", "/d"]),
            ),
        ]);
        let profile = test_profile(2);
        let links = collect_links(&fetcher, "damai", &profile, 3, &Delays::zero()).await;
        assert_eq!(
            links,
            vec![
                "https://t.test/a".to_string(),
                "https://t.test/b".to_string(),
                "https://t.test/c".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_collect_links_resolves_relative_against_base() {
        let fetcher = FakeFetcher::new(&[(
            "https://t.test/search?q=damai&page=1",
            &result_page(&["/berita/d-1", "https://other.test/x"]),
        )]);
        let profile = test_profile(1);
        let links = collect_links(&fetcher, "damai", &profile, 5, &Delays::zero()).await;
        assert_eq!(links[0], "https://t.test/berita/d-1");
        assert_eq!(links[1], "https://other.test/x");
    }

    #[tokio::test]
    async fn test_collect_links_stops_on_empty_page() {
        let fetcher = FakeFetcher::new(&[
            (
                "https://t.test/search?q=damai&page=1",
                &result_page(&["/a"]),
            ),
            (
                "https://t.test/search?q=damai&page=2",
                "<html><body><p>tidak ada hasil</p></body></html>",
            ),
            (
                "https://t.test/search?q=damai&page=3",
                &result_page(&["/never"]),
            ),
        ]);
        let profile = test_profile(3);
        let links = collect_links(&fetcher, "damai", &profile, 10, &Delays::zero()).await;
        assert_eq!(links, vec!["https://t.test/a".to_string()]);
    }

    #[tokio::test]
    async fn test_collect_links_keeps_partials_on_transport_failure() {
        // page 2 has no fixture, so the fake returns a connect error
        let fetcher = FakeFetcher::new(&[(
            "https://t.test/search?q=damai&page=1",
            &result_page(&["/a", "/b"]),
        )]);
        let profile = test_profile(4);
        let links = collect_links(&fetcher, "damai", &profile, 10, &Delays::zero()).await;
        assert_eq!(links.len(), 2);
    }

    #[tokio::test]
    async fn test_collect_links_zero_needed() {
        let fetcher = FakeFetcher::new(&[]);
        let profile = test_profile(3);
        let links = collect_links(&fetcher, "damai", &profile, 0, &Delays::zero()).await;
        assert!(links.is_empty());
    }

    #[tokio::test]
    async fn test_collect_links_stops_at_backlog_margin() {
        let fetcher = FakeFetcher::new(&[
            (
                "https://t.test/search?q=damai&page=1",
                &result_page(&["/a", "/b", "/c", "/d"]),
            ),
            (
                "https://t.test/search?q=damai&page=2",
                &result_page(&["/e", "/f"]),
            ),
        ]);
        let profile = test_profile(2);
        // 2 needed, page 1 already buffers 4 = 2×needed, page 2 never fetched
        let links = collect_links(&fetcher, "damai", &profile, 2, &Delays::zero()).await;
        assert_eq!(links.len(), 2);
        assert_eq!(links[0], "https://t.test/a");
    }

    #[tokio::test]
    async fn test_extract_article_full() {
        let html = "<html><body>\
            <h1> Deklarasi Damai </h1>\
            <div class=\"body\"><p>Satu.</p><p>  </p><p>Dua.</p></div>\
            </body></html>";
        let fetcher = FakeFetcher::new(&[("https://t.test/a", html)]);
        let profile = test_profile(1);
        let article = extract_article(&fetcher, "https://t.test/a", &profile)
            .await
            .unwrap();
        assert_eq!(article.title, "Deklarasi Damai");
        assert_eq!(article.content, "Satu.\nDua.");
        assert_eq!(article.paragraph_count, 2);
        assert_eq!(article.source, "contoh");
    }

    #[tokio::test]
    async fn test_extract_article_missing_title_uses_sentinel() {
        let html = "<html><body><div class=\"body\"><p>Isi.</p></div></body></html>";
        let fetcher = FakeFetcher::new(&[("https://t.test/a", html)]);
        let profile = test_profile(1);
        let article = extract_article(&fetcher, "https://t.test/a", &profile)
            .await
            .unwrap();
        assert_eq!(article.title, NO_TITLE);
        assert_eq!(article.paragraph_count, 1);
    }

    #[tokio::test]
    async fn test_extract_article_missing_body_uses_sentinel() {
        let html = "<html><body><h1>Judul</h1></body></html>";
        let fetcher = FakeFetcher::new(&[("https://t.test/a", html)]);
        let profile = test_profile(1);
        let article = extract_article(&fetcher, "https://t.test/a", &profile)
            .await
            .unwrap();
        assert_eq!(article.content, NO_CONTENT);
        assert_eq!(article.paragraph_count, 0);
    }

    #[tokio::test]
    async fn test_extract_article_transport_failure_is_absent() {
        let fetcher = FakeFetcher::new(&[]);
        let profile = test_profile(1);
        let article = extract_article(&fetcher, "https://t.test/gone", &profile).await;
        assert!(article.is_none());
    }

    #[tokio::test]
    async fn test_scrape_site_stops_at_quota_and_stamps_keyword() {
        let article_html = |n: usize| {
            format!(
                "<html><body><h1>Judul {n}</h1>\
                 <div class=\"body\"><p>Isi {n}.</p></div></body></html>"
            )
        };
        let page = result_page(&["/a/1", "/a/2", "/a/3", "/a/4"]);
        let fetcher = FakeFetcher::new(&[
            ("https://t.test/search?q=damai&page=1", page.as_str()),
            ("https://t.test/a/1", &article_html(1)),
            ("https://t.test/a/2", &article_html(2)),
            ("https://t.test/a/3", &article_html(3)),
            ("https://t.test/a/4", &article_html(4)),
        ]);
        let profile = test_profile(1);
        let articles = scrape_site(&fetcher, "damai", &profile, 2, &Delays::zero()).await;
        assert_eq!(articles.len(), 2);
        assert!(articles.iter().all(|a| a.keyword == "damai"));
        assert_eq!(articles[0].title, "Judul 1");
    }

    #[tokio::test]
    async fn test_scrape_site_no_links_returns_empty() {
        let fetcher = FakeFetcher::new(&[(
            "https://t.test/search?q=damai&page=1",
            "<html><body></body></html>",
        )]);
        let profile = test_profile(1);
        let articles = scrape_site(&fetcher, "damai", &profile, 5, &Delays::zero()).await;
        assert!(articles.is_empty());
    }

    #[tokio::test]
    async fn test_scrape_site_failed_article_yields_partial_quota() {
        let article_html = "<html><body><h1>J</h1>\
             <div class=\"body\"><p>Isi.</p></div></body></html>";
        let page = result_page(&["/a/1", "/a/2", "/a/3"]);
        // link set is truncated to the quota before extraction, so the
        // failing /a/2 is not backfilled from /a/3
        let fetcher = FakeFetcher::new(&[
            ("https://t.test/search?q=damai&page=1", page.as_str()),
            ("https://t.test/a/1", article_html),
            ("https://t.test/a/3", article_html),
        ]);
        let profile = test_profile(1);
        let articles = scrape_site(&fetcher, "damai", &profile, 2, &Delays::zero()).await;
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].url, "https://t.test/a/1");
    }
}
