use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

static INLINE_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[[^\]]*\]\((https?://[^\s)]+)(?:\s+"[^"]*")?\)"#).unwrap()
});
static BARE_URL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://[^\s<>]+").unwrap());

const TRAILING_PUNCT: &[char] = &[')', ']', '"', '\''];

/// Query keys dropped during canonicalization, in addition to any `utm_*`.
const TRACKING_PARAMS: &[&str] = &[
    "fbclid", "gclid", "msclkid", "ref", "source", "campaign", "medium", "content", "term",
];

/// Collect every http(s) link in the markdown, canonicalized, deduplicated
/// and sorted by code point.
///
/// Inline `[text](url)` links are taken first; bare URLs are picked up only
/// when they are not part of an inline link.
pub fn extract_links(markdown: &str) -> Vec<String> {
    let mut links: BTreeSet<String> = BTreeSet::new();
    let mut inline_spans = Vec::new();

    for caps in INLINE_LINK_RE.captures_iter(markdown) {
        let (Some(whole), Some(url)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        inline_spans.push(whole.range());
        links.insert(canonicalize_url(url.as_str()));
    }

    for m in BARE_URL_RE.find_iter(markdown) {
        if inline_spans.iter().any(|span| span.contains(&m.start())) {
            continue;
        }
        let url = m.as_str().trim_end_matches(TRAILING_PUNCT);
        if url.ends_with("://") {
            continue;
        }
        links.insert(canonicalize_url(url));
    }

    links.into_iter().collect()
}

/// Strip tracking query parameters and re-serialize.
///
/// Strings that do not parse as URLs come back unchanged. The query is only
/// rewritten when a parameter was actually removed.
pub fn canonicalize_url(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw) else {
        return raw.to_string();
    };
    if url.query().is_none() {
        return url.into();
    }

    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    let kept: Vec<(&str, &str)> = pairs
        .iter()
        .filter(|(k, _)| !is_tracking_param(k))
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    if kept.len() == pairs.len() {
        return url.into();
    }

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }
    url.into()
}

fn is_tracking_param(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key.as_str())
}
