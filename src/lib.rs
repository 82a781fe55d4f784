//! Render parsed Markdown into attributed rich text.
//!
//! The pipeline: markdown text → generic parse tree ([`ParseNode`]) →
//! document model ([`Block`]/[`Inline`]) → attributed-text buffer
//! ([`AttributedText`]), a sequence of text runs carrying fonts, colors,
//! paragraph geometry and markdown-kind tags for downstream hit-testing
//! and styling. No layout happens here; a host typesetting layer
//! consumes the runs.

mod ast;
mod attr;
mod error;
mod font;
mod kind;
mod parser;
mod render;
mod style;

pub use ast::{Block, Inline, ListKind, MAX_DEPTH};
pub use attr::{
    AttributedText, Attributes, Color, LineBreakMode, ParagraphStyle, Run, TabStop,
};
pub use error::{Error, Result};
pub use font::{CharCellMetrics, Font, FontTraits, TextMeasurer};
pub use kind::MarkdownKind;
pub use parser::{ListData, NodeType, ParseNode};
pub use render::{LinkVerifier, Renderer, SchemeVerifier};
pub use style::{
    AccentStyle, BaseStyle, CodeStyle, HeadingStyle, LinkStyle, ListStyle, QuoteStyle, StyleSheet,
};

/// Parse markdown text into a document tree.
pub fn parse(markdown: &str) -> Result<Block> {
    Block::from_node(&parser::parse(markdown))
}

/// Render markdown to an attributed-text buffer using the default
/// measurement and link-verification capabilities.
pub fn render(markdown: &str, style: &StyleSheet) -> Result<AttributedText> {
    let doc = parse(markdown)?;
    let renderer = Renderer::new(style, &CharCellMetrics, &SchemeVerifier);
    Ok(renderer.render_document(&doc))
}
