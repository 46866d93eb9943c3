//! Search result extraction.
//!
//! Result pages change layout without notice, so extraction is a chain:
//! a structured CSS-selector pass first, then a regex pass over the raw
//! markup that never fails.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

/// Maximum links taken from one result page.
pub const MAX_LINKS: usize = 10;

/// A result link as found on the page, before URL decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLink {
    /// Visible link text
    pub title: String,
    /// `href` attribute
    pub href: String,
}

/// One strategy for pulling result links out of a search page.
pub trait ResultExtractor: Send + Sync {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Extract links; an empty vector means "no opinion".
    fn extract(&self, html: &str) -> Vec<RawLink>;
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn accept(title: &str, href: &str) -> Option<RawLink> {
    let title = collapse_whitespace(title);
    if href.is_empty() || title.chars().count() <= 2 {
        return None;
    }
    Some(RawLink {
        title,
        href: href.to_string(),
    })
}

/// CSS selectors for the known result layouts. The first selector with
/// any hit wins.
pub struct SelectorExtractor {
    selectors: Vec<Selector>,
}

impl Default for SelectorExtractor {
    fn default() -> Self {
        let selectors = ["a.result__a", r#"a[class*="result"]"#, ".result-title a", "h3 a"]
            .iter()
            .map(|s| Selector::parse(s).expect("valid selector"))
            .collect();
        Self { selectors }
    }
}

impl ResultExtractor for SelectorExtractor {
    fn name(&self) -> &'static str {
        "selector"
    }

    fn extract(&self, html: &str) -> Vec<RawLink> {
        let document = Html::parse_document(html);

        for selector in &self.selectors {
            let links: Vec<_> = document.select(selector).take(MAX_LINKS).collect();
            if links.is_empty() {
                continue;
            }
            return links
                .iter()
                .filter_map(|a| {
                    let href = a.value().attr("href").unwrap_or_default();
                    accept(&a.text().collect::<String>(), href)
                })
                .collect();
        }

        Vec::new()
    }
}

static RESULT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#"(?is)<a[^>]+class="result__a"[^>]+href="(?P<h>[^"]+)"[^>]*>(?P<t>.*?)</a>"#,
        r#"(?is)<a[^>]+href="(?P<h>[^"]+)"[^>]*class="[^"]*result[^"]*"[^>]*>(?P<t>.*?)</a>"#,
        r#"(?is)<h3[^>]*><a[^>]+href="(?P<h>[^"]+)"[^>]*>(?P<t>.*?)</a></h3>"#,
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

static TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^<]+?>").expect("valid regex"));

/// Regex fallback for markup the selectors do not understand.
#[derive(Debug, Default)]
pub struct RegexExtractor;

impl ResultExtractor for RegexExtractor {
    fn name(&self) -> &'static str {
        "regex"
    }

    fn extract(&self, html: &str) -> Vec<RawLink> {
        for pattern in RESULT_PATTERNS.iter() {
            let links: Vec<RawLink> = pattern
                .captures_iter(html)
                .take(MAX_LINKS)
                .filter_map(|caps| {
                    let title = TAGS.replace_all(&caps["t"], "");
                    accept(&title, &caps["h"])
                })
                .collect();
            if !links.is_empty() {
                return links;
            }
        }
        Vec::new()
    }
}

/// Ordered extractors; the first non-empty answer wins.
pub struct ExtractorChain {
    extractors: Vec<Box<dyn ResultExtractor>>,
}

impl Default for ExtractorChain {
    fn default() -> Self {
        Self::new(vec![
            Box::new(SelectorExtractor::default()),
            Box::new(RegexExtractor),
        ])
    }
}

impl ExtractorChain {
    /// Chain the given extractors in order.
    pub fn new(extractors: Vec<Box<dyn ResultExtractor>>) -> Self {
        Self { extractors }
    }

    /// Run the extractors until one yields links.
    pub fn extract(&self, html: &str) -> Vec<RawLink> {
        for extractor in &self.extractors {
            let links = extractor.extract(html);
            if !links.is_empty() {
                tracing::trace!(
                    extractor = extractor.name(),
                    links = links.len(),
                    "Extracted results"
                );
                return links;
            }
        }
        Vec::new()
    }
}
