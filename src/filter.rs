use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use url::Url;

/// A hyperlink found on the page, resolved against the page URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Absolute URL the link points to
    pub href: String,
    /// Host with any leading "www." removed
    pub host: String,
    /// Whether the host differs from the page's own host
    pub is_external: bool,
    /// Whether the link uses https
    pub is_https: bool,
}

/// Hosts and suffixes with a known reputation weight in `[0, 1]`
///
/// Checked in order; the first matching entry wins.
static HOST_REPUTATION: LazyLock<Vec<(&'static str, f64)>> = LazyLock::new(|| {
    vec![
        // Standards bodies and intergovernmental organisations
        ("w3.org", 1.0),
        ("ietf.org", 1.0),
        ("iso.org", 1.0),
        ("nist.gov", 1.0),
        ("who.int", 1.0),
        ("europa.eu", 0.95),
        ("ecma-international.org", 0.95),
        ("unicode.org", 0.95),
        // Reference works and research indexes
        ("doi.org", 0.9),
        ("arxiv.org", 0.85),
        ("pubmed.ncbi.nlm.nih.gov", 0.95),
        ("scholar.google.com", 0.8),
        ("wikipedia.org", 0.75),
        ("developer.mozilla.org", 0.85),
        ("github.com", 0.6),
        ("stackoverflow.com", 0.55),
        // Suffixes
        (".gov", 1.0),
        (".mil", 0.95),
        (".edu", 0.95),
        (".int", 0.9),
        (".ac.uk", 0.9),
        (".gov.uk", 1.0),
        (".org", 0.65),
    ]
});

/// Reputation assumed for hosts with no table entry
const DEFAULT_REPUTATION: f64 = 0.5;

/// Classifies hrefs relative to the page they appear on
#[derive(Debug, Clone)]
pub struct LinkClassifier {
    base_url: Option<Url>,
    page_host: Option<String>,
}

impl LinkClassifier {
    /// Create a classifier for the page at `page_url`
    ///
    /// An unparseable page URL leaves relative hrefs unresolvable and
    /// treats every absolute link as external.
    pub fn new(page_url: &str) -> Self {
        let base_url = Url::parse(page_url).ok();
        let page_host = base_url
            .as_ref()
            .and_then(|u| u.host_str())
            .map(normalize_host);

        if base_url.is_none() && !page_url.is_empty() {
            ::log::debug!("Page URL '{}' could not be parsed", page_url);
        }

        Self {
            base_url,
            page_host,
        }
    }

    /// Resolve and classify an href; `None` for unresolvable or non-web links
    pub fn classify(&self, href: &str) -> Option<Link> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }

        let resolved = match &self.base_url {
            Some(base) => base.join(href).ok()?,
            None => Url::parse(href).ok()?,
        };

        if !matches!(resolved.scheme(), "http" | "https") {
            return None;
        }

        let host = normalize_host(resolved.host_str()?);
        let is_external = match &self.page_host {
            Some(page_host) => *page_host != host,
            None => true,
        };

        Some(Link {
            is_https: resolved.scheme() == "https",
            href: resolved.to_string(),
            host,
            is_external,
        })
    }
}

/// Lowercases a host and strips a leading "www."
pub fn normalize_host(host: &str) -> String {
    let lower = host.to_ascii_lowercase();
    match lower.strip_prefix("www.") {
        Some(stripped) => stripped.to_string(),
        None => lower,
    }
}

/// Reputation weight of a linked host in `[0, 1]`
pub fn host_reputation(host: &str) -> f64 {
    let host = normalize_host(host);
    for (pattern, weight) in HOST_REPUTATION.iter() {
        let matched = if pattern.starts_with('.') {
            host.ends_with(pattern)
        } else {
            host == *pattern || host.ends_with(&format!(".{}", pattern))
        };
        if matched {
            return *weight;
        }
    }
    DEFAULT_REPUTATION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_and_external_links() {
        let classifier = LinkClassifier::new("https://www.example.com/blog/post");

        let internal = classifier.classify("/about").unwrap();
        assert!(!internal.is_external);
        assert_eq!(internal.href, "https://www.example.com/about");

        // Leading "www." is ignored on both sides
        let bare = classifier.classify("https://example.com/pricing").unwrap();
        assert!(!bare.is_external);

        let external = classifier.classify("http://nist.gov/report").unwrap();
        assert!(external.is_external);
        assert!(!external.is_https);
        assert_eq!(external.host, "nist.gov");
    }

    #[test]
    fn test_unresolvable_links_are_excluded() {
        let classifier = LinkClassifier::new("https://example.com/");
        assert!(classifier.classify("mailto:someone@example.com").is_none());
        assert!(classifier.classify("javascript:void(0)").is_none());
        assert!(classifier.classify("").is_none());
        assert!(classifier.classify("http://").is_none());
    }

    #[test]
    fn test_unparseable_page_url() {
        let classifier = LinkClassifier::new("not a url");
        assert!(classifier.classify("/relative").is_none());
        assert!(classifier.classify("https://example.com").unwrap().is_external);
    }

    #[test]
    fn test_host_reputation() {
        assert_eq!(host_reputation("www.w3.org"), 1.0);
        assert_eq!(host_reputation("data.census.gov"), 1.0);
        assert_eq!(host_reputation("cs.stanford.edu"), 0.95);
        assert_eq!(host_reputation("en.wikipedia.org"), 0.75);
        assert_eq!(host_reputation("randomblog.com"), DEFAULT_REPUTATION);
    }
}
