// file: src/parser/mod.rs
// description: document parsing module exports
// reference: internal module structure

pub mod extract;
pub mod facts;
pub mod frontmatter;
pub mod markdown;
pub mod patterns;

pub use extract::{DocumentFormat, DocumentText, ExtractedText, extract_text, extract_uploads};
pub use facts::{Entity, EntityType, FactExtractor};
pub use frontmatter::{Frontmatter, FrontmatterParser};
pub use markdown::{Heading, MarkdownParser, ParsedMarkdown};
