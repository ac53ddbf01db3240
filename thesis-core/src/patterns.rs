//! Fixed term lists shared by the crawler, the ranker and the parsers.

/// Terms whose presence boosts a chunk in the general industry pass.
///
/// Matching is a case-insensitive substring test, see [`mentions`].
pub fn default_boost_keywords() -> Vec<String> {
    [
        // Investment language
        "focus", "invest", "investment", "strategy", "portfolio", "sector", "thesis",
        "acquire", "acquires", "grows", "grow", "business", "company",
        "holding", "model", "mission", "goal",
        // Healthcare
        "healthcare", "medtech", "medical devices", "pharmaceuticals", "biotech",
        // Technology
        "technology", "software", "cloud computing", "saas", "ai", "machine learning",
        "cybersecurity", "blockchain", "fintech", "insurtech",
        // Energy
        "energy", "renewable energy", "oil & gas", "utilities",
        // Industrials
        "industrial", "manufacturing", "automotive", "automotive components",
        "transportation", "logistics", "supply chain",
        // Consumer
        "consumer", "consumer goods", "fmcg", "ecommerce", "retail",
        "food & beverage", "hospitality", "travel", "tourism",
        "education", "edtech",
        "media", "digital media", "streaming", "gaming",
        "telecommunications", "5g", "iot", "internet of things",
        "real estate", "infrastructure", "construction",
        // Financial
        "financial services", "banking", "insurance", "wealth management",
        "mining", "metals", "chemicals",
        "advertising", "adtech", "martech",
        "hr tech", "human resources",
        "data centers", "cloud infrastructure", "hvac",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// URL fragments the crawler never follows.
pub fn default_exclude_keywords() -> Vec<String> {
    [
        // People and hiring
        "careers", "career", "jobs", "team", "people", "leadership",
        "advisor", "advisors", "culture",
        // Legal
        "privacy", "terms", "legal", "cookie",
        // Support
        "contact", "support", "help", "faq", "email",
        // Content feeds
        "blog", "news", "press", "media", "article", "report",
        "events", "webinar", "rss", "sitemap",
        // Accounts
        "login", "signup", "register", "subscribe",
        "branch",
        // Files
        ".pdf", ".jpg", ".jpeg", ".xlsx", ".mp4", ".mp3",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Bracketed spans containing any of these are model filler, not industries.
///
/// "private equity" guards against the model echoing the instruction text.
pub const INDUSTRY_FILLER: &[&str] = &[
    "no industry",
    "not stated",
    "implied",
    "not explicitly",
    "comment",
    "example",
    "private equity",
];

/// Checks whether lower-cased `text` contains lower-cased `term`.
///
/// Plain substring match at any position, so "invest" hits "investments"
/// and "ai" hits "maintain". An empty term never matches.
pub fn mentions(text: &str, term: &str) -> bool {
    !term.is_empty() && text.contains(term)
}
