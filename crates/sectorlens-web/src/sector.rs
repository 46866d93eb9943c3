//! Sector inference from names, page text and bare domains.

use once_cell::sync::Lazy;
use regex::Regex;
use sectorlens_core::{BUSINESS_SERVICES, UNKNOWN};
use std::collections::HashMap;

/// Well-known companies, matched on whole words of a name or domain label.
const KNOWN_COMPANIES: &[(&str, &str)] = &[
    ("gmail", "Technology"),
    ("google", "Technology"),
    ("apple", "Technology"),
    ("microsoft", "Technology"),
    ("facebook", "Technology"),
    ("meta", "Technology"),
    ("instagram", "Technology"),
    ("twitter", "Technology"),
    ("linkedin", "Technology"),
    ("github", "Technology"),
    ("adobe", "Technology"),
    ("oracle", "Technology"),
    ("salesforce", "Technology"),
    ("zoom", "Technology"),
    ("slack", "Technology"),
    ("dropbox", "Technology"),
    ("netflix", "Media & Entertainment"),
    ("spotify", "Media & Entertainment"),
    ("intel", "Technology"),
    ("nvidia", "Technology"),
    ("amd", "Technology"),
    ("ibm", "Technology"),
    ("hp", "Technology"),
    ("dell", "Technology"),
    ("amazon", "E-commerce"),
    ("shopify", "E-commerce"),
    ("ebay", "E-commerce"),
    ("alibaba", "E-commerce"),
    ("walmart", "Retail"),
    ("target", "Retail"),
    ("paypal", "Finance"),
    ("visa", "Finance"),
    ("mastercard", "Finance"),
    ("jpmorgan", "Finance"),
    ("goldman", "Finance"),
    ("citi", "Finance"),
    ("uber", "Transportation & Logistics"),
    ("tesla", "Automotive"),
    ("ford", "Automotive"),
    ("toyota", "Automotive"),
    ("bmw", "Automotive"),
    ("mercedes", "Automotive"),
    ("airbnb", "Hospitality & Travel"),
    ("booking", "Hospitality & Travel"),
    ("expedia", "Hospitality & Travel"),
    ("marriott", "Hospitality & Travel"),
    ("hilton", "Hospitality & Travel"),
    ("pfizer", "Healthcare"),
    ("johnson", "Healthcare"),
    ("merck", "Healthcare"),
    ("novartis", "Healthcare"),
    ("roche", "Healthcare"),
];

/// Weighted keyword phrases. Order matters: it breaks score ties.
const SECTOR_KEYWORDS: &[(&str, &str)] = &[
    ("software development", "Technology"),
    ("web development", "Technology"),
    ("mobile app", "Technology"),
    ("artificial intelligence", "Technology"),
    ("machine learning", "Technology"),
    ("data science", "Technology"),
    ("cloud computing", "Technology"),
    ("cybersecurity", "Technology"),
    ("blockchain", "Technology"),
    ("cryptocurrency", "Finance"),
    ("saas", "Technology"),
    ("tech", "Technology"),
    ("software", "Technology"),
    ("technology", "Technology"),
    ("information technology", "Technology"),
    ("it services", "Technology"),
    ("internet", "Technology"),
    ("cloud", "Technology"),
    ("digital", "Technology"),
    ("platform", "Technology"),
    ("app", "Technology"),
    ("api", "Technology"),
    ("programming", "Technology"),
    ("coding", "Technology"),
    ("development", "Technology"),
    ("financial services", "Finance"),
    ("investment banking", "Finance"),
    ("wealth management", "Finance"),
    ("asset management", "Finance"),
    ("private equity", "Finance"),
    ("venture capital", "Finance"),
    ("fintech", "Finance"),
    ("banking", "Finance"),
    ("bank", "Finance"),
    ("finance", "Finance"),
    ("insurance", "Finance"),
    ("investment", "Finance"),
    ("fund", "Finance"),
    ("capital", "Finance"),
    ("trading", "Finance"),
    ("securities", "Finance"),
    ("credit", "Finance"),
    ("loan", "Finance"),
    ("mortgage", "Finance"),
    ("payment", "Finance"),
    ("healthcare services", "Healthcare"),
    ("medical device", "Healthcare"),
    ("pharmaceutical", "Healthcare"),
    ("biotechnology", "Healthcare"),
    ("health insurance", "Healthcare"),
    ("telemedicine", "Healthcare"),
    ("clinical", "Healthcare"),
    ("hospital", "Healthcare"),
    ("clinic", "Healthcare"),
    ("health", "Healthcare"),
    ("medical", "Healthcare"),
    ("pharma", "Healthcare"),
    ("biotech", "Healthcare"),
    ("medicine", "Healthcare"),
    ("patient", "Healthcare"),
    ("therapy", "Healthcare"),
    ("diagnostic", "Healthcare"),
    ("e-commerce platform", "E-commerce"),
    ("online retail", "E-commerce"),
    ("marketplace", "E-commerce"),
    ("e-commerce", "E-commerce"),
    ("ecommerce", "E-commerce"),
    ("online store", "E-commerce"),
    ("retail", "Retail"),
    ("store", "Retail"),
    ("shop", "Retail"),
    ("shopping", "Retail"),
    ("merchandise", "Retail"),
    ("consumer goods", "Retail"),
    ("manufacturing", "Manufacturing"),
    ("production", "Manufacturing"),
    ("factory", "Manufacturing"),
    ("industrial", "Manufacturing"),
    ("automotive", "Manufacturing"),
    ("aerospace", "Manufacturing"),
    ("chemical", "Manufacturing"),
    ("materials", "Manufacturing"),
    ("assembly", "Manufacturing"),
    ("supply chain", "Transportation & Logistics"),
    ("management consulting", "Consulting"),
    ("business consulting", "Consulting"),
    ("strategy consulting", "Consulting"),
    ("it consulting", "Consulting"),
    ("consulting", "Consulting"),
    ("advisory", "Consulting"),
    ("professional services", "Consulting"),
    ("legal services", "Legal Services"),
    ("law firm", "Legal Services"),
    ("attorney", "Legal Services"),
    ("lawyer", "Legal Services"),
    ("media production", "Media & Entertainment"),
    ("content creation", "Media & Entertainment"),
    ("streaming", "Media & Entertainment"),
    ("broadcasting", "Media & Entertainment"),
    ("entertainment", "Media & Entertainment"),
    ("gaming", "Media & Entertainment"),
    ("publishing", "Media & Entertainment"),
    ("media", "Media & Entertainment"),
    ("news", "Media & Entertainment"),
    ("television", "Media & Entertainment"),
    ("radio", "Media & Entertainment"),
    ("film", "Media & Entertainment"),
    ("video", "Media & Entertainment"),
    ("educational technology", "Education"),
    ("online learning", "Education"),
    ("training", "Education"),
    ("education", "Education"),
    ("university", "Education"),
    ("school", "Education"),
    ("learning", "Education"),
    ("course", "Education"),
    ("academic", "Education"),
    ("real estate", "Real Estate"),
    ("property management", "Real Estate"),
    ("construction", "Real Estate"),
    ("architecture", "Real Estate"),
    ("property", "Real Estate"),
    ("building", "Real Estate"),
    ("logistics", "Transportation & Logistics"),
    ("shipping", "Transportation & Logistics"),
    ("delivery", "Transportation & Logistics"),
    ("transport", "Transportation & Logistics"),
    ("freight", "Transportation & Logistics"),
    ("warehouse", "Transportation & Logistics"),
    ("hospitality", "Hospitality & Travel"),
    ("hotel", "Hospitality & Travel"),
    ("travel", "Hospitality & Travel"),
    ("tourism", "Hospitality & Travel"),
    ("restaurant", "Food & Beverage"),
    ("food service", "Food & Beverage"),
    ("catering", "Food & Beverage"),
    ("renewable energy", "Energy"),
    ("solar energy", "Energy"),
    ("wind energy", "Energy"),
    ("oil and gas", "Energy"),
    ("utilities", "Energy"),
    ("energy", "Energy"),
    ("power", "Energy"),
    ("electricity", "Energy"),
    ("oil", "Energy"),
    ("gas", "Energy"),
    ("utility", "Energy"),
    ("telecommunications", "Telecommunications"),
    ("telecom", "Telecommunications"),
    ("mobile", "Telecommunications"),
    ("wireless", "Telecommunications"),
    ("network", "Telecommunications"),
    ("internet service", "Telecommunications"),
    ("non-profit", "Non-profit"),
    ("nonprofit", "Non-profit"),
    ("charity", "Non-profit"),
    ("foundation", "Non-profit"),
    ("government", "Government"),
    ("public sector", "Government"),
    ("agriculture", "Agriculture"),
    ("farming", "Agriculture"),
    ("food production", "Agriculture"),
    ("agribusiness", "Agriculture"),
];

/// Domain-name fragments per sector, checked in order.
const DOMAIN_HINTS: &[(&str, &[&str])] = &[
    (
        "Technology",
        &[
            "tech", "software", "app", "web", "digital", "cloud", "data", "ai", "cyber", "system",
            "platform", "analytics", "computing", "innovation", "lab", "dev", "code",
            "programming", "database", "network", "internet", "mobile", "saas",
        ],
    ),
    (
        "Finance",
        &[
            "bank", "finance", "invest", "capital", "fund", "pay", "credit", "loan", "insurance",
            "asset", "wealth", "trading", "financial", "money", "payment", "mortgage", "savings",
            "investment", "portfolio", "fintech",
        ],
    ),
    (
        "Healthcare",
        &[
            "health", "medical", "pharma", "bio", "clinic", "care", "hospital", "medicine",
            "therapy", "dental", "wellness", "fitness", "healthcare", "pharmaceutical", "biotech",
            "medtech", "diagnostic", "treatment",
        ],
    ),
    (
        "Retail",
        &[
            "shop", "store", "market", "buy", "sell", "commerce", "retail", "fashion", "clothing",
            "shoes", "jewelry", "grocery", "food", "restaurant", "cafe", "ecommerce",
            "marketplace", "shopping", "outlet", "boutique",
        ],
    ),
    (
        "Media & Entertainment",
        &[
            "media", "news", "tv", "radio", "video", "stream", "broadcast", "entertainment",
            "film", "music", "publishing", "content", "streaming", "production", "studio",
            "gaming", "game", "podcast", "blog", "magazine", "newspaper",
        ],
    ),
    (
        "Manufacturing",
        &[
            "manufacturing", "industrial", "factory", "production", "auto", "motor",
            "mechanical", "engineering", "construction", "materials", "chemical", "steel",
            "metal", "machinery", "equipment", "automotive", "aerospace",
        ],
    ),
    (
        "Energy",
        &[
            "energy", "oil", "gas", "petroleum", "renewable", "solar", "wind", "power",
            "electric", "utility", "nuclear", "coal", "fuel", "battery", "grid",
        ],
    ),
    (
        "Transportation & Logistics",
        &[
            "transport", "logistics", "shipping", "delivery", "airline", "aviation", "rail",
            "truck", "freight", "cargo", "supply", "chain", "warehouse", "distribution",
            "courier", "express",
        ],
    ),
    (
        "Real Estate",
        &[
            "real", "estate", "property", "housing", "rental", "mortgage", "construction",
            "development", "builder", "architect", "realty",
        ],
    ),
    (
        "Education",
        &[
            "education", "school", "university", "college", "learning", "training", "academic",
            "research", "institute", "educational", "teaching", "course",
        ],
    ),
    (
        "Consulting",
        &[
            "consult", "advisory", "strategy", "solutions", "management", "business",
            "professional", "services", "consulting", "advisor", "expert", "guidance",
        ],
    ),
    (
        "Government",
        &[
            "gov", "government", "public", "municipal", "federal", "state", "city", "nonprofit",
            "foundation", "charity", "organization", "association",
        ],
    ),
    (
        "Agriculture",
        &[
            "farm", "agriculture", "agricultural", "crop", "livestock", "dairy", "organic",
            "seed", "fertilizer", "irrigation", "harvest",
        ],
    ),
    (
        "Legal Services",
        &[
            "law", "legal", "attorney", "lawyer", "court", "justice", "litigation", "patent",
            "trademark", "compliance", "regulatory",
        ],
    ),
    (
        "Telecommunications",
        &[
            "telecom", "communication", "wireless", "cellular", "broadband", "internet",
            "network", "phone", "mobile", "satellite", "fiber",
        ],
    ),
    (
        "Hospitality & Travel",
        &[
            "hotel", "travel", "tourism", "hospitality", "resort", "vacation", "booking",
            "airline", "cruise", "restaurant", "catering",
        ],
    ),
];

/// Knowledge-graph labels mapped onto the taxonomy.
const SECTOR_ALIASES: &[(&str, &str)] = &[
    ("information technology", "Technology"),
    ("software company", "Technology"),
    ("technology company", "Technology"),
    ("internet company", "Technology"),
    ("financial services", "Finance"),
    ("banking", "Finance"),
    ("investment firm", "Finance"),
    ("healthcare company", "Healthcare"),
    ("pharmaceutical company", "Healthcare"),
    ("biotechnology company", "Healthcare"),
    ("retail company", "Retail"),
    ("e-commerce company", "E-commerce"),
    ("manufacturing company", "Manufacturing"),
    ("consulting firm", "Consulting"),
    ("media company", "Media & Entertainment"),
    ("entertainment company", "Media & Entertainment"),
];

/// Minimum keyword score for a confident answer.
const MIN_SCORE: f64 = 1.0;

static WORD_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));

/// Word of a keyword phrase -> sector of every phrase containing it, in table order.
static PHRASE_WORDS: Lazy<HashMap<&'static str, Vec<&'static str>>> = Lazy::new(|| {
    let mut index: HashMap<&'static str, Vec<&'static str>> = HashMap::new();
    for &(phrase, sector) in SECTOR_KEYWORDS {
        for word in phrase.split(' ') {
            index.entry(word).or_default().push(sector);
        }
    }
    index
});

/// Sector of the first well-known company named by one of `names`.
///
/// Each name is split into lowercase words; only whole words match.
pub fn known_company_sector(names: &[&str]) -> Option<&'static str> {
    let words: Vec<String> = names
        .iter()
        .flat_map(|name| {
            WORD_SPLIT
                .split(&name.to_lowercase())
                .filter(|w| !w.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect();

    KNOWN_COMPANIES
        .iter()
        .find(|(company, _)| words.iter().any(|w| w.as_str() == *company))
        .map(|(_, sector)| *sector)
}

/// Weighted keyword scoring over free text.
///
/// Each occurrence of a phrase adds `2 x words(phrase)`; each text word
/// found in a phrase adds 0.5. The first sector to reach the top score
/// wins, provided it reaches [`MIN_SCORE`].
pub fn score_keywords(text: &str) -> Option<&'static str> {
    let text = text.to_lowercase();
    let mut scores: Vec<(&'static str, f64)> = Vec::new();
    let mut add = |sector: &'static str, amount: f64| {
        match scores.iter_mut().find(|(s, _)| *s == sector) {
            Some((_, score)) => *score += amount,
            None => scores.push((sector, amount)),
        }
    };

    for &(phrase, sector) in SECTOR_KEYWORDS {
        let occurrences = text.matches(phrase).count();
        if occurrences > 0 {
            let words = phrase.split(' ').count();
            #[allow(clippy::cast_precision_loss)]
            add(sector, (occurrences * words * 2) as f64);
        }
    }

    for word in text.split_whitespace() {
        if let Some(sectors) = PHRASE_WORDS.get(word) {
            for &sector in sectors {
                add(sector, 0.5);
            }
        }
    }

    let mut best: Option<(&'static str, f64)> = None;
    for (sector, score) in scores {
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((sector, score));
        }
    }

    best.filter(|(_, score)| *score >= MIN_SCORE)
        .map(|(sector, _)| sector)
}

/// Known companies first, then keyword scoring.
pub fn infer_sector(text: &str, names: &[&str]) -> Option<&'static str> {
    known_company_sector(names).or_else(|| score_keywords(text))
}

/// Map a free-form industry label onto the taxonomy.
///
/// Unmapped labels are title-cased; a blank label is [`UNKNOWN`].
pub fn normalize_sector_name(label: &str) -> String {
    let lower = label.trim().to_lowercase();
    if lower.is_empty() {
        return UNKNOWN.to_string();
    }

    if let Some((_, sector)) = SECTOR_ALIASES.iter().find(|(alias, _)| lower.contains(alias)) {
        return (*sector).to_string();
    }

    lower
        .split_whitespace()
        .map(crate::company_name::capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Best guess from the domain string alone. Never [`UNKNOWN`].
pub fn guess_sector_from_domain(domain: &str) -> &'static str {
    let domain = domain.to_lowercase();

    if let Some(&(sector, _)) = DOMAIN_HINTS
        .iter()
        .find(|(_, hints)| hints.iter().any(|hint| domain.contains(hint)))
    {
        return sector;
    }

    if domain.ends_with(".edu") || domain.ends_with(".org") {
        "Education"
    } else if domain.ends_with(".gov") {
        "Government"
    } else if [".tech", ".app", ".dev", ".io"]
        .iter()
        .any(|tld| domain.contains(tld))
    {
        "Technology"
    } else {
        BUSINESS_SERVICES
    }
}
