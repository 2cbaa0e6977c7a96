use serde::Serialize;

use super::links::extract_links;
use super::optimize::optimize;
use super::sections::{split_sections, Section};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredResult {
    pub sections: Vec<Section>,
    pub links: Vec<String>,
    pub word_count: usize,
}

/// Optimize the markdown, then derive sections, links and word count from
/// the optimized text.
pub fn build_structured_result(markdown: &str) -> StructuredResult {
    from_optimized(&optimize(markdown))
}

pub(crate) fn from_optimized(optimized: &str) -> StructuredResult {
    StructuredResult {
        sections: split_sections(optimized),
        links: extract_links(optimized),
        word_count: word_count(optimized),
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_words() {
        assert_eq!(word_count("one two three"), 3);
        assert_eq!(word_count("  a   b   c  "), 3);
        assert_eq!(word_count("line\nbreak\ttab"), 3);
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count(" \n\t "), 0);
    }

    #[test]
    fn builds_from_raw_markdown() {
        let md = "[Skip to content](#main)\n# Intro\n\nRead [this](https://x.com/a?utm_medium=mail).\n\n# Intro\n\n## Next\nmore   words here";
        let result = build_structured_result(md);
        let headings: Vec<&str> = result.sections.iter().map(|s| s.heading.as_str()).collect();
        assert_eq!(headings, ["Intro", "Next"]);
        assert_eq!(result.links, ["https://x.com/a"]);
        // "# Intro" twice collapses to one line before counting.
        assert_eq!(result.word_count, 9);
    }

    #[test]
    fn empty_markdown() {
        let result = build_structured_result("");
        assert_eq!(result.sections.len(), 1);
        assert!(result.links.is_empty());
        assert_eq!(result.word_count, 0);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(build_structured_result("# A\nb")).unwrap();
        assert_eq!(json["wordCount"], 3);
        assert_eq!(json["sections"][0]["heading"], "A");
        assert_eq!(json["sections"][0]["content"], "b");
    }
}
