use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static HORIZONTAL_WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\S\n]+").unwrap());
static BLANK_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());
static SKIP_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[ \t]*\[?\bskip to (?:main content|main|content)\b\]?(?:\([^)\n]*\))?[ \t]*")
        .unwrap()
});

/// Canonicalize line endings and whitespace.
///
/// CR/CRLF become `\n`, every run of horizontal whitespace (tabs included)
/// becomes one space, each line is trimmed, and runs of blank lines collapse
/// to a single blank line. Idempotent.
pub fn normalize(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    let collapsed = HORIZONTAL_WS_RE.replace_all(&unified, " ");
    let stripped = collapsed
        .split('\n')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");
    BLANK_RUN_RE.replace_all(&stripped, "\n\n").trim().to_string()
}

/// Drop every non-blank line whose trimmed, lowercased text was already seen.
///
/// Blank lines are always kept.
pub fn dedupe_lines(text: &str) -> String {
    let mut seen: HashSet<String> = HashSet::new();
    text.split('\n')
        .filter(|line| {
            let key = line.trim().to_lowercase();
            key.is_empty() || seen.insert(key)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Strip "skip to content" style navigation links, bare or as a markdown
/// link, wherever they appear in a line.
///
/// Expects deduplicated text. A line left over after a link is cut out is
/// trimmed and deduplicated again, so the pass does not leave behind a
/// line a later [`dedupe_lines`] would remove.
pub fn remove_hidden(text: &str) -> String {
    if !SKIP_LINK_RE.is_match(text) {
        return text.to_string();
    }
    let stripped = SKIP_LINK_RE.replace_all(text, " ");
    let spaced = HORIZONTAL_WS_RE.replace_all(&stripped, " ");
    let trimmed = spaced
        .split('\n')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");
    BLANK_RUN_RE
        .replace_all(&dedupe_lines(&trimmed), "\n\n")
        .into_owned()
}
