pub mod chunks;
pub mod links;
pub mod normalize;
pub mod optimize;
pub mod sections;
pub mod structured;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::document::{MarkdownResult, Metadata};
use crate::frontmatter::{format_with_frontmatter, post_id_from_url};
use chunks::Chunk;

/// Pipeline: raw markdown → optimized body → sections, links, word count.
///
/// Fills in the content hash, the document word count and the social post
/// ID when the caller's metadata leaves them unset.
pub fn process(markdown: &str, metadata: Metadata) -> MarkdownResult {
    let optimized = optimize::optimize(markdown);
    let structured = structured::from_optimized(&optimized);
    let hash = content_hash(&optimized);

    let derived_id = metadata.source_url().and_then(post_id_from_url);
    let mut metadata = metadata;
    match &mut metadata {
        Metadata::Document(doc) => {
            doc.content_hash.get_or_insert(hash);
            doc.word_count.get_or_insert(structured.word_count);
        }
        Metadata::Social(post) => {
            post.content_hash.get_or_insert(hash);
            if post.post_id.is_none() {
                post.post_id = derived_id;
            }
        }
    }

    debug!(
        kind = ?metadata.kind(),
        sections = structured.sections.len(),
        links = structured.links.len(),
        words = structured.word_count,
        "processed markdown"
    );

    MarkdownResult {
        markdown: optimized,
        metadata,
        structured,
    }
}

/// Frontmatter-wrap the result and split it into chunks (0 = one chunk).
pub fn render(result: &MarkdownResult, chunk_size: usize) -> Vec<Chunk> {
    chunks::chunk_by_size(&format_with_frontmatter(result), chunk_size)
}

/// Lowercase hex SHA-256 of the text.
pub fn content_hash(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentMetadata, SocialPost};

    #[test]
    fn hash_is_stable_hex() {
        assert_eq!(
            content_hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(content_hash("a"), content_hash("a"));
        assert_ne!(content_hash("a"), content_hash("b"));
    }

    #[test]
    fn document_gets_hash_and_word_count() {
        let result = process("  # Hi \n\n\nthere  friend", Metadata::default());
        assert_eq!(result.markdown, "# Hi\n\nthere friend");
        let Metadata::Document(doc) = &result.metadata else { panic!("expected document") };
        assert_eq!(doc.word_count, Some(4));
        assert_eq!(doc.content_hash.as_deref(), Some(content_hash(&result.markdown).as_str()));
    }

    #[test]
    fn caller_values_win() {
        let meta = Metadata::Document(DocumentMetadata {
            content_hash: Some("given".into()),
            word_count: Some(99),
            ..Default::default()
        });
        let result = process("one two", meta);
        let Metadata::Document(doc) = &result.metadata else { panic!("expected document") };
        assert_eq!(doc.content_hash.as_deref(), Some("given"));
        assert_eq!(doc.word_count, Some(99));
    }

    #[test]
    fn social_post_id_from_source() {
        let meta = Metadata::Social(SocialPost {
            platform: "x".into(),
            source_url: Some("https://x.com/someone/status/1789/".into()),
            ..Default::default()
        });
        let result = process("gm", meta);
        let Metadata::Social(post) = &result.metadata else { panic!("expected social") };
        assert_eq!(post.post_id.as_deref(), Some("1789"));
        assert!(post.content_hash.is_some());
    }

    #[test]
    fn documents_never_get_a_post_id() {
        let meta = Metadata::Document(DocumentMetadata {
            source_url: Some("https://x.com/someone/status/1789".into()),
            ..Default::default()
        });
        let result = process("gm", meta);
        let text = format_with_frontmatter(&result);
        assert!(!text.contains("post_id"));
    }

    #[test]
    fn render_wraps_then_chunks() {
        let meta = Metadata::Document(DocumentMetadata {
            title: Some("Doc".into()),
            ..Default::default()
        });
        let result = process("# A\n\n```\nfirst\n```\n\n# B\n\nsecond paragraph", meta);

        let whole = render(&result, 0);
        assert_eq!(whole.len(), 1);
        assert!(whole[0].content.starts_with("---\ntitle: Doc\n"));
        assert!(whole[0].content.ends_with("second paragraph"));

        let parts = render(&result, 40);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1].content, "```\nfirst\n```\n\n# B\n\nsecond paragraph");
        assert!(parts[0].content.starts_with("---"));
        assert!(parts.iter().all(|c| c.total == parts.len()));
        assert!(parts.last().unwrap().content.ends_with("second paragraph"));
    }

    #[test]
    fn social_fixture_end_to_end() {
        let md = std::fs::read_to_string("tests/fixtures/thread.md").unwrap();
        let meta = Metadata::Social(SocialPost {
            platform: "x".into(),
            source_url: Some("https://x.com/rustlang/status/1234567890".into()),
            ..Default::default()
        });
        let result = process(&md, meta);
        let text = format_with_frontmatter(&result);
        assert!(text.starts_with("---\nplatform: x\nsource: \"https://x.com/rustlang/status/1234567890\"\npost_id: 1234567890\n"));
        assert_eq!(result.structured.links, ["https://blog.rust-lang.org/releases/latest"]);
        assert_eq!(result.markdown.matches("Show more").count(), 1);
    }
}
