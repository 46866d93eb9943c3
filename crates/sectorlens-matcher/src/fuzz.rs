//! String similarity metrics scored 0–100.
//!
//! `ratio` is the normalized indel similarity `2·LCS / (|a| + |b|)`. The
//! other metrics build on it: best-aligned substring, sorted tokens, and
//! token-set intersection. Tokens are split on any non-alphanumeric
//! character so `widgets-inc.com` tokenizes as `widgets inc com`.

use std::collections::BTreeSet;
use std::fmt;

/// The fuzzy metrics, in the order the matcher evaluates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuzzyMetric {
    /// Whole-string similarity
    Ratio,
    /// Best window of the longer string against the shorter
    PartialRatio,
    /// Similarity after sorting tokens
    TokenSortRatio,
    /// Similarity of token intersection and remainders
    TokenSetRatio,
}

impl FuzzyMetric {
    /// Evaluation order.
    pub const ALL: [Self; 4] = [
        Self::Ratio,
        Self::PartialRatio,
        Self::TokenSortRatio,
        Self::TokenSetRatio,
    ];

    /// Score `a` against `b`.
    #[must_use]
    pub fn score(self, a: &str, b: &str) -> f64 {
        match self {
            Self::Ratio => ratio(a, b),
            Self::PartialRatio => partial_ratio(a, b),
            Self::TokenSortRatio => token_sort_ratio(a, b),
            Self::TokenSetRatio => token_set_ratio(a, b),
        }
    }
}

impl fmt::Display for FuzzyMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ratio => "ratio",
            Self::PartialRatio => "partial_ratio",
            Self::TokenSortRatio => "token_sort_ratio",
            Self::TokenSetRatio => "token_set_ratio",
        };
        write!(f, "{s}")
    }
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[allow(clippy::cast_precision_loss)]
fn ratio_chars(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * lcs_len(a, b) as f64 / total as f64
}

/// Normalized indel similarity.
#[must_use]
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_chars(&a, &b)
}

/// Best `ratio` of the shorter string against every equal-length window of
/// the longer one.
#[must_use]
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };

    if short.is_empty() {
        return if long.is_empty() { 100.0 } else { 0.0 };
    }

    let mut best: f64 = 0.0;
    for window in long.windows(short.len()) {
        best = best.max(ratio_chars(&short, window));
        if best >= 100.0 {
            break;
        }
    }
    best
}

fn tokens(s: &str) -> Vec<String> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// `ratio` after sorting the tokens of both strings.
#[must_use]
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    let sorted = |s: &str| {
        let mut t = tokens(s);
        t.sort();
        t.join(" ")
    };
    ratio(&sorted(a), &sorted(b))
}

/// Token-set similarity: compares the shared tokens against each side's
/// shared-plus-remaining tokens and takes the best.
#[must_use]
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let set_a: BTreeSet<String> = tokens(a).into_iter().collect();
    let set_b: BTreeSet<String> = tokens(b).into_iter().collect();
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }

    let join = |items: Vec<&String>| {
        items
            .into_iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    };
    let common: Vec<&String> = set_a.intersection(&set_b).collect();
    let only_a: Vec<&String> = set_a.difference(&set_b).collect();
    let only_b: Vec<&String> = set_b.difference(&set_a).collect();

    if !common.is_empty() && (only_a.is_empty() || only_b.is_empty()) {
        return 100.0;
    }

    let sect = join(common);
    let diff_a = join(only_a);
    let diff_b = join(only_b);

    if sect.is_empty() {
        return ratio(&diff_a, &diff_b);
    }

    let combined_a = format!("{sect} {diff_a}");
    let combined_b = format!("{sect} {diff_b}");
    ratio(&sect, &combined_a)
        .max(ratio(&sect, &combined_b))
        .max(ratio(&combined_a, &combined_b))
}
