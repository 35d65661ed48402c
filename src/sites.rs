//! Declarative per-site search and extraction profiles.
//!
//! A [`SiteProfile`] captures everything the crawler needs to know about one
//! news portal: how to build a search URL for a keyword and page number,
//! which elements hold result links, and which rules locate the title, the
//! content container, and the body paragraphs of an article page.
//!
//! Profiles are validated when constructed: a missing placeholder or an
//! unparseable selector fails here instead of halfway through a crawl.

use once_cell::sync::Lazy;
use scraper::Selector;
use thiserror::Error;

/// Profile construction failure.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile field `{0}` must not be empty")]
    EmptyField(&'static str),
    #[error("search template invalid: {0}")]
    BadTemplate(String),
    #[error("selector `{0}` does not parse")]
    BadSelector(String),
    #[error("max_pages must be at least 1")]
    NoPages,
}

/// Rule locating a single element: by id, else by class, else the bare tag.
#[derive(Debug, Clone)]
pub struct SelectorRule {
    pub tag: String,
    pub id: Option<String>,
    pub class: Option<String>,
}

impl SelectorRule {
    pub fn tag(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            id: None,
            class: None,
        }
    }

    pub fn with_id(tag: &str, id: &str) -> Self {
        Self {
            tag: tag.to_string(),
            id: Some(id.to_string()),
            class: None,
        }
    }

    pub fn with_class(tag: &str, class: &str) -> Self {
        Self {
            tag: tag.to_string(),
            id: None,
            class: Some(class.to_string()),
        }
    }

    /// CSS form of the rule. Id wins over class when both are present.
    pub fn css(&self) -> String {
        if let Some(id) = &self.id {
            format!("{}#{}", self.tag, id)
        } else if let Some(class) = &self.class {
            format!("{}.{}", self.tag, class)
        } else {
            self.tag.clone()
        }
    }

    /// Parsed selector for this rule.
    ///
    /// Parseability is checked at profile construction, so this does not
    /// fail afterwards.
    pub fn selector(&self) -> Selector {
        Selector::parse(&self.css()).expect("selector validated at profile construction")
    }

    fn validate(&self, field: &'static str) -> Result<(), ProfileError> {
        if self.tag.trim().is_empty() {
            return Err(ProfileError::EmptyField(field));
        }
        Selector::parse(&self.css()).map_err(|_| ProfileError::BadSelector(self.css()))?;
        Ok(())
    }
}

/// Rule locating the body paragraphs inside the content container: a bare
/// tag, optionally qualified by class.
#[derive(Debug, Clone)]
pub struct ParagraphRule {
    pub tag: String,
    pub class: Option<String>,
}

impl ParagraphRule {
    pub fn tag(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            class: None,
        }
    }

    pub fn with_class(tag: &str, class: &str) -> Self {
        Self {
            tag: tag.to_string(),
            class: Some(class.to_string()),
        }
    }

    pub fn css(&self) -> String {
        match &self.class {
            Some(class) => format!("{}.{}", self.tag, class),
            None => self.tag.clone(),
        }
    }

    pub fn selector(&self) -> Selector {
        Selector::parse(&self.css()).expect("selector validated at profile construction")
    }
}

/// Search URL template with `{keyword}` and optional `{page}` slots.
///
/// Three shapes are accepted: a fixed URL (no slots), keyword-only, or
/// keyword plus page number for portals with paginated search results.
#[derive(Debug, Clone)]
pub struct SearchTemplate {
    template: String,
    has_page: bool,
}

impl SearchTemplate {
    pub fn new(template: &str) -> Result<Self, ProfileError> {
        let keyword_slots = template.matches("{keyword}").count();
        let page_slots = template.matches("{page}").count();
        if keyword_slots > 1 || page_slots > 1 {
            return Err(ProfileError::BadTemplate(format!(
                "duplicate placeholder in `{template}`"
            )));
        }
        if page_slots == 1 && keyword_slots == 0 {
            return Err(ProfileError::BadTemplate(format!(
                "`{template}` has a {{page}} slot but no {{keyword}} slot"
            )));
        }
        Ok(Self {
            template: template.to_string(),
            has_page: page_slots == 1,
        })
    }

    /// Whether the portal's search supports a page number.
    pub fn paginated(&self) -> bool {
        self.has_page
    }

    /// Substitute `keyword` (percent-encoded, spaces as `+`) and, when
    /// supported, `page`.
    pub fn render(&self, keyword: &str, page: usize) -> String {
        let query = urlencoding::encode(keyword).replace("%20", "+");
        self.template
            .replace("{keyword}", &query)
            .replace("{page}", &page.to_string())
    }
}

/// Everything the crawler knows about one news portal.
#[derive(Debug, Clone)]
pub struct SiteProfile {
    /// Short site name used in logs and the `source` column.
    pub name: String,
    /// Base URL that relative article links resolve against.
    pub base_url: String,
    /// Search endpoint template.
    pub search: SearchTemplate,
    /// Rule matching one search-result container per article.
    pub container: SelectorRule,
    /// Rule matching the link element inside a container.
    pub link: SelectorRule,
    /// Rule locating the article headline.
    pub title: SelectorRule,
    /// Rule locating the article body container.
    pub content: SelectorRule,
    /// Rule matching paragraphs inside the body container.
    pub paragraph: ParagraphRule,
    /// Pagination bound for the search endpoint.
    pub max_pages: usize,
    /// CSV artifact this site's articles are written to.
    pub csv_file: String,
}

impl SiteProfile {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: &str,
        base_url: &str,
        search: SearchTemplate,
        container: SelectorRule,
        link: SelectorRule,
        title: SelectorRule,
        content: SelectorRule,
        paragraph: ParagraphRule,
        max_pages: usize,
        csv_file: &str,
    ) -> Result<Self, ProfileError> {
        if name.trim().is_empty() {
            return Err(ProfileError::EmptyField("name"));
        }
        if base_url.trim().is_empty() {
            return Err(ProfileError::EmptyField("base_url"));
        }
        if csv_file.trim().is_empty() {
            return Err(ProfileError::EmptyField("csv_file"));
        }
        if max_pages == 0 {
            return Err(ProfileError::NoPages);
        }
        container.validate("container")?;
        link.validate("link")?;
        title.validate("title")?;
        content.validate("content")?;
        Selector::parse(&paragraph.css())
            .map_err(|_| ProfileError::BadSelector(paragraph.css()))?;
        Ok(Self {
            name: name.to_string(),
            base_url: base_url.to_string(),
            search,
            container,
            link,
            title,
            content,
            paragraph,
            max_pages,
            csv_file: csv_file.to_string(),
        })
    }
}

/// detik.com: paginated site search, standard detail-page selectors.
fn detik() -> SiteProfile {
    SiteProfile::new(
        "detik",
        "https://www.detik.com",
        SearchTemplate::new("https://www.detik.com/search/searchall?query={keyword}&page={page}")
            .expect("builtin template"),
        SelectorRule::tag("article"),
        SelectorRule::tag("a"),
        SelectorRule::with_class("h1", "detail__title"),
        SelectorRule::with_class("div", "detail__body-text"),
        ParagraphRule::tag("p"),
        5,
        "news_portal/news_detik.csv",
    )
    .expect("builtin detik profile")
}

static BUILTIN_SITES: Lazy<Vec<SiteProfile>> = Lazy::new(|| vec![detik()]);

/// The compiled-in site profiles, in crawl order.
pub fn builtin_sites() -> &'static [SiteProfile] {
    &BUILTIN_SITES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_profiles_are_valid() {
        let sites = builtin_sites();
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].name, "detik");
        assert!(sites[0].search.paginated());
    }

    #[test]
    fn test_template_renders_keyword_and_page() {
        let template =
            SearchTemplate::new("https://example.test/search?q={keyword}&page={page}").unwrap();
        assert_eq!(
            template.render("pemilu damai", 3),
            "https://example.test/search?q=pemilu+damai&page=3"
        );
    }

    #[test]
    fn test_template_without_page_slot_ignores_page() {
        let template = SearchTemplate::new("https://example.test/search?q={keyword}").unwrap();
        assert!(!template.paginated());
        assert_eq!(
            template.render("damai", 7),
            "https://example.test/search?q=damai"
        );
    }

    #[test]
    fn test_template_fixed_url() {
        let template = SearchTemplate::new("https://example.test/terbaru").unwrap();
        assert_eq!(template.render("damai", 1), "https://example.test/terbaru");
    }

    #[test]
    fn test_template_page_without_keyword_rejected() {
        assert!(SearchTemplate::new("https://example.test/?page={page}").is_err());
    }

    #[test]
    fn test_template_duplicate_slot_rejected() {
        assert!(SearchTemplate::new("https://x.test/{keyword}/{keyword}").is_err());
    }

    #[test]
    fn test_selector_rule_precedence_id_over_class() {
        let rule = SelectorRule {
            tag: "h1".to_string(),
            id: Some("judul".to_string()),
            class: Some("detail__title".to_string()),
        };
        assert_eq!(rule.css(), "h1#judul");
    }

    #[test]
    fn test_profile_rejects_empty_name() {
        let result = SiteProfile::new(
            "",
            "https://example.test",
            SearchTemplate::new("https://example.test/?q={keyword}").unwrap(),
            SelectorRule::tag("article"),
            SelectorRule::tag("a"),
            SelectorRule::tag("h1"),
            SelectorRule::tag("div"),
            ParagraphRule::tag("p"),
            5,
            "out.csv",
        );
        assert!(matches!(result, Err(ProfileError::EmptyField("name"))));
    }

    #[test]
    fn test_profile_rejects_zero_pages() {
        let result = SiteProfile::new(
            "contoh",
            "https://example.test",
            SearchTemplate::new("https://example.test/?q={keyword}").unwrap(),
            SelectorRule::tag("article"),
            SelectorRule::tag("a"),
            SelectorRule::tag("h1"),
            SelectorRule::tag("div"),
            ParagraphRule::tag("p"),
            0,
            "out.csv",
        );
        assert!(matches!(result, Err(ProfileError::NoPages)));
    }
}
