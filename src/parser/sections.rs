use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(#{1,6})[ \t]+(.+)$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    /// Empty for text that precedes the first heading.
    pub heading: String,
    pub content: String,
}

/// Partition markdown into heading-delimited sections.
///
/// Matching is line-anchored and has no notion of code fences: a `# comment`
/// line inside a fenced block opens a new section.
pub fn split_sections(markdown: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut heading = String::new();
    let mut body_start = 0;
    let mut found = false;

    for caps in HEADING_RE.captures_iter(markdown) {
        let Some(whole) = caps.get(0) else { continue };
        let content = strip_blank_lines(&markdown[body_start..whole.start()]);
        push_section(&mut sections, std::mem::take(&mut heading), content);

        heading = caps[2].trim().to_string();
        body_start = whole.end();
        found = true;
    }

    let tail = strip_blank_lines(&markdown[body_start..]);
    if !found {
        return vec![Section {
            heading: String::new(),
            content: tail.to_string(),
        }];
    }
    push_section(&mut sections, heading, tail);

    sections
}

fn push_section(sections: &mut Vec<Section>, heading: String, content: &str) {
    if heading.is_empty() && content.is_empty() {
        return;
    }
    sections.push(Section {
        heading,
        content: content.to_string(),
    });
}

/// Remove leading and trailing whitespace-only lines, keeping the indentation
/// of the first content line.
fn strip_blank_lines(text: &str) -> &str {
    let Some(first) = text.find(|c: char| !c.is_whitespace()) else {
        return "";
    };
    let start = text[..first].rfind('\n').map_or(0, |i| i + 1);
    text[start..].trim_end()
}

// ── Tests ──
