//! Turn already-extracted markdown into agent-friendly output: normalized
//! text, heading sections, canonical links, frontmatter, and size-bounded
//! chunks that never split a code block or table.

pub mod document;
pub mod frontmatter;
pub mod input;
pub mod parser;
pub mod settings;

pub use document::{
    DocumentMetadata, EngagementStats, MarkdownResult, Metadata, PostAuthor, SocialPost, SourceKind,
};
pub use frontmatter::format_with_frontmatter;
pub use parser::chunks::{chunk_by_size, Chunk};
pub use parser::links::{canonicalize_url, extract_links};
pub use parser::normalize::normalize;
pub use parser::optimize::optimize;
pub use parser::sections::{split_sections, Section};
pub use parser::structured::{build_structured_result, word_count, StructuredResult};
pub use parser::{process, render};
