//! Plain-text renderer for model output
//!
//! Models decorate short answers with emphasis, bullets, headings, and inline
//! code. Rendering through a CommonMark parser drops that markup while keeping
//! the literal text.

use pulldown_cmark::{Event, Parser, Tag};

pub struct Renderer;

impl Renderer {
    /// Renders markdown to plain text, stripping all formatting.
    /// Line and paragraph breaks collapse to single spaces.
    pub fn to_plain_text(markdown: &str) -> String {
        let mut output = String::new();
        for event in Parser::new(markdown) {
            match event {
                Event::Text(text) | Event::Code(text) => output.push_str(&text),
                Event::SoftBreak | Event::HardBreak => output.push(' '),
                Event::End(
                    Tag::Paragraph
                    | Tag::Heading(..)
                    | Tag::Item
                    | Tag::BlockQuote
                    | Tag::CodeBlock(_),
                ) => output.push(' '),
                _ => {}
            }
        }
        output.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_emphasis() {
        assert_eq!(Renderer::to_plain_text("**Type:** ABC"), "Type: ABC");
    }

    #[test]
    fn strips_list_and_heading_markers() {
        assert_eq!(Renderer::to_plain_text("- Answer: `CO2`"), "Answer: CO2");
        assert_eq!(Renderer::to_plain_text("### Result: Good"), "Result: Good");
        assert_eq!(Renderer::to_plain_text("> Final answer: 2024"), "Final answer: 2024");
    }

    #[test]
    fn inline_emphasis_inside_a_word_stays_joined() {
        assert_eq!(Renderer::to_plain_text("**A**BC"), "ABC");
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(Renderer::to_plain_text("Type: ABC"), "Type: ABC");
        assert_eq!(Renderer::to_plain_text("   "), "");
    }
}
