use serde::{Deserialize, Serialize};

use crate::parser::structured::StructuredResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Document,
    Social,
}

/// Metadata for a generic web page or article.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentMetadata {
    pub source_url: Option<String>,
    pub canonical_url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<String>,
    pub language: Option<String>,
    pub content_hash: Option<String>,
    pub word_count: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementStats {
    pub likes: Option<u64>,
    pub reposts: Option<u64>,
    pub replies: Option<u64>,
    pub quotes: Option<u64>,
    pub views: Option<u64>,
    pub bookmarks: Option<u64>,
}

impl EngagementStats {
    /// Stat name/value pairs in frontmatter order, absent ones skipped.
    pub fn entries(&self) -> Vec<(&'static str, u64)> {
        [
            ("likes", self.likes),
            ("reposts", self.reposts),
            ("replies", self.replies),
            ("quotes", self.quotes),
            ("views", self.views),
            ("bookmarks", self.bookmarks),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k, v)))
        .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostAuthor {
    pub name: Option<String>,
    pub handle: Option<String>,
}

/// Metadata for a single social media post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SocialPost {
    pub platform: String,
    pub source_url: Option<String>,
    pub post_id: Option<String>,
    pub image: Option<String>,
    pub published_at: Option<String>,
    pub language: Option<String>,
    pub content_hash: Option<String>,
    pub stats: EngagementStats,
    pub author: PostAuthor,
}

/// Source-specific metadata, tagged by `kind` when (de)serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Metadata {
    Document(DocumentMetadata),
    Social(SocialPost),
}

impl Metadata {
    pub fn kind(&self) -> SourceKind {
        match self {
            Metadata::Document(_) => SourceKind::Document,
            Metadata::Social(_) => SourceKind::Social,
        }
    }

    pub fn source_url(&self) -> Option<&str> {
        match self {
            Metadata::Document(doc) => doc.source_url.as_deref(),
            Metadata::Social(post) => post.source_url.as_deref(),
        }
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Metadata::Document(DocumentMetadata::default())
    }
}

/// A finished markdown body with its metadata and structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkdownResult {
    pub markdown: String,
    pub metadata: Metadata,
    #[serde(flatten)]
    pub structured: StructuredResult,
}

impl MarkdownResult {
    /// Wrap an already-final body without deriving structure from it.
    pub fn new(markdown: impl Into<String>, metadata: Metadata) -> Self {
        MarkdownResult {
            markdown: markdown.into(),
            metadata,
            structured: StructuredResult::default(),
        }
    }
}
