//! Company/sector synthesis from the domain string alone.

use once_cell::sync::Lazy;
use regex::Regex;
use sectorlens_core::{CompanySector, UNKNOWN};

static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.\-_]+").expect("valid regex"));

const STOP_WORDS: &[&str] = &["com", "net", "org", "www", "mail", "email"];

const SECTOR_HINTS: &[(&str, &[&str])] = &[
    (
        "Technology",
        &["tech", "soft", "system", "data", "digital", "cyber", "cloud", "ai", "ml"],
    ),
    (
        "Finance",
        &["bank", "financial", "finance", "capital", "invest", "fund", "money"],
    ),
    (
        "Healthcare",
        &["health", "medical", "pharma", "bio", "care", "hospital", "clinic"],
    ),
    ("Retail", &["shop", "store", "retail", "market", "buy", "sell"]),
    (
        "Manufacturing",
        &["manufacturing", "industrial", "factory", "production", "auto", "motor"],
    ),
    ("Consulting", &["consulting", "advisory", "service", "solution"]),
];

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Meaningful words of a domain: split on `.`, `-`, `_`, without short
/// tokens and mail/TLD noise.
pub fn meaningful_words(domain: &str) -> Vec<String> {
    SEPARATORS
        .split(&domain.to_lowercase())
        .filter(|w| w.len() > 2 && !STOP_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}

/// First sector whose hint appears in `text`.
pub fn sniff_sector(text: &str) -> Option<&'static str> {
    let text = text.to_lowercase();
    SECTOR_HINTS
        .iter()
        .find(|(_, hints)| hints.iter().any(|hint| text.contains(hint)))
        .map(|(sector, _)| *sector)
}

/// Build a best-effort answer from the domain's own words.
pub fn synthesize(domain: &str) -> CompanySector {
    let words = meaningful_words(domain);
    if words.is_empty() {
        return CompanySector::unknown();
    }

    let company = words
        .iter()
        .map(|w| title_case(w))
        .collect::<Vec<_>>()
        .join(" ");
    let sector = sniff_sector(domain).unwrap_or(UNKNOWN);
    CompanySector::new(company, sector)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meaningful_words() {
        assert_eq!(meaningful_words("mail.acme-labs.com"), vec!["acme", "labs"]);
        assert_eq!(meaningful_words("a.b.co"), Vec::<String>::new());
    }

    #[test]
    fn test_synthesize() {
        let result = synthesize("bright-cloud.io");
        assert_eq!(result.company, "Bright Cloud");
        assert_eq!(result.sector, "Technology");

        let result = synthesize("first_capital.net");
        assert_eq!(result.company, "First Capital");
        assert_eq!(result.sector, "Finance");

        let result = synthesize("zebra.org");
        assert_eq!(result.company, "Zebra");
        assert_eq!(result.sector, UNKNOWN);
    }

    #[test]
    fn test_short_hints_count_toward_sector() {
        // "ai" and "ml" never survive as words but still name the sector
        let result = synthesize("ai-labs.com");
        assert_eq!(result.company, "Labs");
        assert_eq!(result.sector, "Technology");

        let result = synthesize("ml.vision.io");
        assert_eq!(result.company, "Vision");
        assert_eq!(result.sector, "Technology");
    }

    #[test]
    fn test_synthesize_nothing_meaningful() {
        assert_eq!(synthesize("mail.com"), CompanySector::unknown());
        assert_eq!(synthesize("ab.cd"), CompanySector::unknown());
    }

    #[test]
    fn test_sniff_order() {
        // Technology is checked before Consulting
        assert_eq!(sniff_sector("datasolution"), Some("Technology"));
        assert_eq!(sniff_sector("greenadvisory"), Some("Consulting"));
        assert_eq!(sniff_sector("zebra"), None);
    }
}
