use std::fmt::Display;
use std::sync::LazyLock;

use regex::Regex;

use crate::document::{DocumentMetadata, MarkdownResult, Metadata, SocialPost};

static NEWLINES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r\n|\r|\n").unwrap());
static STATUS_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/status/(\d+)(?:[/?#]|$)").unwrap());

/// Prepend a `---` delimited metadata block to the result's markdown.
///
/// Fields without a value are left out entirely.
pub fn format_with_frontmatter(result: &MarkdownResult) -> String {
    let fields = match &result.metadata {
        Metadata::Document(doc) => document_fields(doc),
        Metadata::Social(post) => social_fields(post),
    };

    let mut out = String::from("---\n");
    for line in &fields.lines {
        out.push_str(line);
        out.push('\n');
    }
    out.push_str("---\n\n");
    out.push_str(&result.markdown);
    out
}

fn document_fields(doc: &DocumentMetadata) -> Fields {
    let mut f = Fields::default();
    f.text("source", doc.source_url.as_deref());
    f.text("canonical_url", doc.canonical_url.as_deref());
    f.text("title", doc.title.as_deref());
    f.text("description", doc.description.as_deref());
    f.text("image", doc.image.as_deref());
    f.text("author", doc.author.as_deref());
    f.text("published", doc.published_at.as_deref());
    f.text("language", doc.language.as_deref());
    f.text("content_hash", doc.content_hash.as_deref());
    f.number("word_count", doc.word_count);
    f
}

fn social_fields(post: &SocialPost) -> Fields {
    let post_id = post
        .post_id
        .clone()
        .or_else(|| post.source_url.as_deref().and_then(post_id_from_url));

    let mut f = Fields::default();
    f.text("platform", Some(post.platform.as_str()));
    f.text("source", post.source_url.as_deref());
    f.text("post_id", post_id.as_deref());
    f.text("image", post.image.as_deref());
    f.text("published", post.published_at.as_deref());
    f.text("language", post.language.as_deref());
    f.text("content_hash", post.content_hash.as_deref());

    let mut stats = Fields::default();
    for (key, value) in post.stats.entries() {
        stats.number(key, Some(value));
    }
    f.nested("stats", stats);

    let mut author = Fields::default();
    author.text("name", post.author.name.as_deref());
    author.text("handle", post.author.handle.as_deref());
    f.nested("author", author);
    f
}

/// Numeric post ID from a `/status/<digits>` path segment.
pub fn post_id_from_url(url: &str) -> Option<String> {
    STATUS_ID_RE.captures(url).map(|caps| caps[1].to_string())
}

/// Trim and turn each embedded newline into a space; quote values containing
/// a colon or starting with a double quote.
pub fn escape_value(value: &str) -> String {
    let flat = NEWLINES_RE.replace_all(value.trim(), " ");
    if flat.contains(':') || flat.starts_with('"') {
        format!("\"{}\"", flat.replace('"', "\\\""))
    } else {
        flat.into_owned()
    }
}

#[derive(Default)]
struct Fields {
    lines: Vec<String>,
}

impl Fields {
    fn text(&mut self, key: &str, value: Option<&str>) {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            self.lines.push(format!("{key}: {}", escape_value(value)));
        }
    }

    fn number(&mut self, key: &str, value: Option<impl Display>) {
        if let Some(value) = value {
            self.lines.push(format!("{key}: {value}"));
        }
    }

    fn nested(&mut self, key: &str, child: Fields) {
        if child.lines.is_empty() {
            return;
        }
        self.lines.push(format!("{key}:"));
        self.lines
            .extend(child.lines.into_iter().map(|line| format!("  {line}")));
    }
}
