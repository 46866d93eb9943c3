//! Company-name extraction from homepage HTML.
//!
//! Candidates are collected in priority order, cleaned, validated and
//! scored; the best survivor wins with earlier candidates winning ties.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

const META_NAMES: &[&str] = &["og:site_name", "application-name", "og:title", "twitter:title"];

const BRAND_SELECTORS: &[&str] = &[
    ".company-name",
    ".brand-name",
    ".logo-text",
    r#"[class*="company"]"#,
    r#"[class*="brand"]"#,
    "h1.title",
    "h1.name",
    ".site-title",
];

const NAV_SELECTORS: &[&str] = &["nav a", ".navbar a", ".menu a", "header a"];

const INVALID_TERMS: &[&str] = &[
    "404",
    "error",
    "not found",
    "loading",
    "please wait",
    "home",
    "index",
    "welcome",
    "login",
    "sign in",
    "menu",
    "search",
    "contact",
    "about",
    "services",
    "products",
];

const WEBSITE_WORDS: &[&str] = &["website", "site", "official", "home", "welcome"];

fn selectors(sources: &[&str]) -> Vec<Selector> {
    sources
        .iter()
        .map(|s| Selector::parse(s).expect("valid selector"))
        .collect()
}

static META: Lazy<Vec<Selector>> = Lazy::new(|| {
    META_NAMES
        .iter()
        .map(|name| {
            Selector::parse(&format!(r#"meta[property="{name}"], meta[name="{name}"]"#))
                .expect("valid selector")
        })
        .collect()
});
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").expect("valid selector"));
static BRAND: Lazy<Vec<Selector>> = Lazy::new(|| selectors(BRAND_SELECTORS));
static HEADINGS: Lazy<Vec<Selector>> = Lazy::new(|| selectors(&["h1", "h2"]));
static NAV: Lazy<Vec<Selector>> = Lazy::new(|| selectors(NAV_SELECTORS));

static CLEANUP: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\s*-\s*(Official Site|Home|Website|Company|Inc|LLC|Corp|Ltd)\b.*$",
        r"(?i)^(Welcome to|About|The)\s+",
        r"\s*\|.*$",
        r"\s+[-–—]\s+.*$",
        r"&#?[a-zA-Z0-9]+;",
        r"(?i)^\s*(Home|Index)\s*$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

static RAW_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#"(?is)<meta[^>]+(?:property="og:site_name"|name="application-name")[^>]+content="([^"]+)""#,
        r"(?is)<title[^>]*>([^<]+)</title>",
        r"(?is)<h1[^>]*>([^<]+)</h1>",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

static HAS_LETTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z]").expect("valid regex"));

fn text_of(element: scraper::ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ")
}

fn structured_candidates(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut candidates = Vec::new();

    for selector in META.iter() {
        if let Some(content) = document
            .select(selector)
            .find_map(|tag| tag.value().attr("content"))
        {
            if content.trim().chars().count() > 2 {
                candidates.push(content.trim().to_string());
            }
        }
    }

    if let Some(title) = document.select(&TITLE).next() {
        candidates.push(text_of(title));
    }

    for selector in BRAND.iter() {
        candidates.extend(document.select(selector).take(2).map(text_of));
    }

    for selector in HEADINGS.iter() {
        candidates.extend(document.select(selector).take(3).map(text_of));
    }

    for selector in NAV.iter() {
        candidates.extend(
            document
                .select(selector)
                .take(3)
                .map(text_of)
                .filter(|text| text.to_lowercase().contains("home")),
        );
    }

    candidates
}

fn raw_candidates(html: &str) -> Vec<String> {
    RAW_PATTERNS
        .iter()
        .flat_map(|pattern| pattern.captures_iter(html))
        .map(|caps| caps[1].trim().to_string())
        .collect()
}

/// Strip site boilerplate from a raw candidate.
pub fn clean_candidate(raw: &str) -> Option<String> {
    let mut candidate = raw.to_string();
    for pattern in CLEANUP.iter() {
        candidate = pattern.replace_all(&candidate, "").into_owned();
    }

    let cleaned = candidate.split_whitespace().collect::<Vec<_>>().join(" ");
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Whether a cleaned candidate looks like a company name.
pub fn is_valid_name(name: &str) -> bool {
    if name.chars().count() < 2 || !HAS_LETTER.is_match(name) {
        return false;
    }

    let lower = name.to_lowercase();
    let short = lower.chars().count() < 10;
    !INVALID_TERMS
        .iter()
        .any(|term| lower == *term || (short && lower.contains(term)))
}

fn is_title_case(text: &str) -> bool {
    let mut cased = false;
    let mut previous_cased = false;
    for c in text.chars() {
        if c.is_uppercase() {
            if previous_cased {
                return false;
            }
            previous_cased = true;
            cased = true;
        } else if c.is_lowercase() {
            if !previous_cased {
                return false;
            }
            previous_cased = true;
            cased = true;
        } else {
            previous_cased = false;
        }
    }
    cased
}

/// Heuristic quality score; higher is better.
pub fn score(name: &str) -> u32 {
    let len = name.chars().count();
    let lower = name.to_lowercase();
    let mut score = 0;

    if len < 30 {
        score += 2;
    }
    if len < 15 {
        score += 1;
    }
    if !WEBSITE_WORDS.iter().any(|word| lower.contains(word)) {
        score += 3;
    }
    if name.chars().next().is_some_and(char::is_uppercase) {
        score += 1;
    }
    if is_title_case(name) || name.chars().skip(1).any(char::is_uppercase) {
        score += 1;
    }
    score
}

/// Highest-scoring candidate; the earliest wins ties.
pub fn best_candidate<S: AsRef<str>>(candidates: &[S]) -> Option<&str> {
    let mut best: Option<(&str, u32)> = None;
    for candidate in candidates {
        let candidate = candidate.as_ref();
        let candidate_score = score(candidate);
        if best.map_or(true, |(_, top)| candidate_score > top) {
            best = Some((candidate, candidate_score));
        }
    }
    best.map(|(name, _)| name)
}

fn usable(candidates: Vec<String>) -> Vec<String> {
    candidates
        .iter()
        .filter_map(|raw| clean_candidate(raw))
        .filter(|name| is_valid_name(name))
        .collect()
}

/// Capitalised second-level label of a URL (`https://www.acme.co` -> `Acme`).
pub fn name_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    let host = host.strip_prefix("www.").unwrap_or(host);
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 {
        return None;
    }
    Some(capitalize(labels[labels.len() - 2]))
}

/// Uppercase the first character and lowercase the rest.
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Extract the company name from a homepage.
///
/// Falls back to the raw-markup patterns when the document yields nothing
/// usable, then to the page URL.
pub fn extract(html: &str, page_url: Option<&str>) -> Option<String> {
    let mut names = usable(structured_candidates(html));
    if names.is_empty() {
        names = usable(raw_candidates(html));
    }

    if let Some(best) = best_candidate(&names) {
        return Some(best.to_string());
    }
    page_url.and_then(name_from_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_candidate() {
        assert_eq!(clean_candidate("Acme - Official Site").as_deref(), Some("Acme"));
        assert_eq!(clean_candidate("Welcome to Acme Robotics").as_deref(), Some("Acme Robotics"));
        assert_eq!(clean_candidate("Acme | Industrial Robots").as_deref(), Some("Acme"));
        assert_eq!(clean_candidate("Acme — Robots for everyone").as_deref(), Some("Acme"));
        assert_eq!(clean_candidate("Coca-Cola").as_deref(), Some("Coca-Cola"));
        assert_eq!(clean_candidate("Smith &amp; Sons").as_deref(), Some("Smith Sons"));
        assert_eq!(clean_candidate("  Home  "), None);
    }

    #[test]
    fn test_is_valid_name() {
        assert!(is_valid_name("Acme Robotics"));
        assert!(!is_valid_name("Login"));
        assert!(!is_valid_name("Contact"));
        assert!(!is_valid_name("Menu bar"));
        assert!(!is_valid_name("404"));
        assert!(!is_valid_name("A"));
        // Longer names may contain a stop term
        assert!(is_valid_name("Acme Financial Services"));
    }

    #[test]
    fn test_scoring_prefers_clean_names() {
        assert_eq!(score("Acme Robotics"), 8);
        assert_eq!(score("Industrial automation"), 6);
        assert_eq!(score("the official website of acme robotics"), 0);

        let candidates = ["Industrial automation", "Acme Robotics", "Acme Robotics Inc"];
        assert_eq!(best_candidate(&candidates), Some("Acme Robotics"));
    }

    #[test]
    fn test_ties_keep_earliest() {
        let candidates = ["Globex", "Initech"];
        assert_eq!(best_candidate(&candidates), Some("Globex"));
    }

    #[test]
    fn test_extract_prefers_meta() {
        let html = r#"
            <html><head>
                <title>Acme Robotics | Home</title>
                <meta property="og:site_name" content="Acme Robotics">
            </head><body>
                <h1>Industrial automation for everyone</h1>
            </body></html>
        "#;
        assert_eq!(extract(html, None).as_deref(), Some("Acme Robotics"));
    }

    #[test]
    fn test_extract_falls_back_to_url() {
        let html = "<html><head><title>Loading</title></head><body></body></html>";
        assert_eq!(
            extract(html, Some("https://www.globex.co/landing")).as_deref(),
            Some("Globex")
        );
        assert_eq!(extract(html, None), None);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("acme"), "Acme");
        assert_eq!(capitalize("ACME-bank"), "Acme-bank");
        assert_eq!(capitalize(""), "");
    }
}
