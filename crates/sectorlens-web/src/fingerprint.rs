use rand::Rng;

/// Desktop browser headers sent with every request.
#[derive(Debug, Clone)]
pub struct BrowserProfile {
    pub user_agent: &'static str,
    pub accept_language: &'static str,
}

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
];

const ACCEPT_LANGUAGES: &[&str] = &["en-US,en;q=0.9", "en-US,en;q=0.5", "en-GB,en;q=0.8"];

/// `Accept` header shared by every profile.
pub const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

impl BrowserProfile {
    /// Pick a random desktop profile.
    pub fn randomized() -> Self {
        let mut rng = rand::thread_rng();

        Self {
            user_agent: USER_AGENTS[rng.gen_range(0..USER_AGENTS.len())],
            accept_language: ACCEPT_LANGUAGES[rng.gen_range(0..ACCEPT_LANGUAGES.len())],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_randomized_profile() {
        let profile = BrowserProfile::randomized();
        assert!(profile.user_agent.starts_with("Mozilla/5.0"));
        assert!(profile.accept_language.starts_with("en"));
    }

    #[test]
    fn test_profile_variation() {
        // Probabilistic, but 20 identical draws out of 4 agents is very unlikely
        let profiles: Vec<_> = (0..20).map(|_| BrowserProfile::randomized()).collect();

        let first_ua = profiles[0].user_agent;
        let all_same = profiles.iter().all(|p| p.user_agent == first_ua);
        assert!(!all_same, "Expected variation in user agents");
    }
}
