// file: src/parser/markdown.rs
// description: markdown to plain text conversion with pulldown-cmark
// reference: https://docs.rs/pulldown-cmark

use pulldown_cmark::{Event, Parser, Tag, TagEnd};

pub struct MarkdownParser;

#[derive(Debug, Clone)]
pub struct ParsedMarkdown {
    pub plain_text: String,
    pub headings: Vec<Heading>,
}

#[derive(Debug, Clone)]
pub struct Heading {
    pub level: u32,
    pub text: String,
}

impl ParsedMarkdown {
    /// First top-most heading, used as a statute title when frontmatter has none.
    pub fn title(&self) -> Option<&str> {
        self.headings
            .iter()
            .min_by_key(|h| h.level)
            .map(|h| h.text.as_str())
            .filter(|t| !t.is_empty())
    }
}

impl MarkdownParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, content: &str) -> ParsedMarkdown {
        let mut plain_text = String::new();
        let mut headings = Vec::new();
        let mut current_heading: Option<(u32, String)> = None;

        for event in Parser::new(content) {
            match event {
                Event::Start(Tag::Heading { level, .. }) => {
                    current_heading = Some((level as u32, String::new()));
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some((level, text)) = current_heading.take() {
                        headings.push(Heading {
                            level,
                            text: text.trim().to_string(),
                        });
                    }
                    plain_text.push('\n');
                }
                Event::End(TagEnd::Paragraph) | Event::End(TagEnd::Item) => {
                    plain_text.push('\n');
                }
                Event::Text(text) | Event::Code(text) => {
                    if let Some((_, ref mut heading_text)) = current_heading {
                        heading_text.push_str(&text);
                    }
                    plain_text.push_str(&text);
                }
                Event::SoftBreak | Event::HardBreak => {
                    plain_text.push(' ');
                }
                _ => {}
            }
        }

        let plain_text = plain_text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        ParsedMarkdown {
            plain_text,
            headings,
        }
    }
}

impl Default for MarkdownParser {
    fn default() -> Self {
        Self::new()
    }
}
