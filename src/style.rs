//! Style configuration and attribute resolution.
//!
//! A [`StyleSheet`] is a plain value object: construct one, load one
//! from TOML, or take the documented defaults. Nothing here mutates
//! during rendering; the one lazily-derived value (the minimum list
//! prefix column width) is memoized behind a `OnceCell` so a sheet
//! shared across threads stays safe.

use std::fs;
use std::path::Path;

use once_cell::sync::OnceCell;
use serde::Deserialize;

use crate::ast::{Block, Inline};
use crate::attr::{Attributes, Color, ParagraphStyle};
use crate::font::{Font, TextMeasurer};
use crate::kind::MarkdownKind;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StyleSheet {
    pub base: BaseStyle,
    pub bold: AccentStyle,
    pub italic: AccentStyle,
    pub code: CodeStyle,
    pub h1: HeadingStyle,
    pub h2: HeadingStyle,
    pub h3: HeadingStyle,
    pub quote: QuoteStyle,
    pub list: ListStyle,
    pub links: LinkStyle,

    #[serde(skip)]
    min_prefix_width: OnceCell<f32>,
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self {
            base: BaseStyle::default(),
            bold: AccentStyle::default(),
            italic: AccentStyle::default(),
            code: CodeStyle::default(),
            h1: HeadingStyle {
                size: 24.0,
                color: Color::BLACK,
            },
            h2: HeadingStyle {
                size: 18.0,
                color: Color::BLACK,
            },
            h3: HeadingStyle {
                size: 14.0,
                color: Color::BLACK,
            },
            quote: QuoteStyle::default(),
            list: ListStyle::default(),
            links: LinkStyle::default(),
            min_prefix_width: OnceCell::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BaseStyle {
    pub family: String,
    pub size: f32,
    pub color: Color,
    pub paragraph_spacing: f32,
}

impl Default for BaseStyle {
    fn default() -> Self {
        Self {
            family: "Helvetica".to_string(),
            size: 12.0,
            color: Color::BLACK,
            paragraph_spacing: 8.0,
        }
    }
}

/// Optional color override for bold or italic ranges.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct AccentStyle {
    pub color: Option<Color>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CodeStyle {
    pub family: String,
    pub size: f32,
    pub color: Color,
}

impl Default for CodeStyle {
    fn default() -> Self {
        Self {
            family: "Menlo".to_string(),
            size: 11.0,
            color: Color::rgb(0.2, 0.2, 0.2),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HeadingStyle {
    pub size: f32,
    pub color: Color,
}

impl Default for HeadingStyle {
    // Level sizes are set in `StyleSheet::default`; this covers a bare
    // `[h1]`-style section with only one key present.
    fn default() -> Self {
        Self {
            size: 24.0,
            color: Color::BLACK,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct QuoteStyle {
    pub color: Color,
    pub indent: f32,
}

impl Default for QuoteStyle {
    fn default() -> Self {
        Self {
            color: Color::rgb(0.4, 0.4, 0.4),
            indent: 20.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ListStyle {
    /// Minimum width of the prefix column, in points.
    pub indent: f32,
    /// Gap between the prefix column and the content column.
    pub prefix_spacing: f32,
    /// Spacing after each item's paragraph.
    pub item_spacing: f32,
    pub prefix_color: Color,
}

impl Default for ListStyle {
    fn default() -> Self {
        Self {
            indent: 18.0,
            prefix_spacing: 8.0,
            item_spacing: 4.0,
            prefix_color: Color::rgb(0.4, 0.4, 0.4),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct LinkStyle {
    /// When true, only links that pass detection and the openability
    /// check render as links; everything else falls back to literal
    /// `[text](url)` syntax.
    pub validate: bool,
}

impl StyleSheet {
    /// Load a stylesheet from a TOML file, or return defaults if the
    /// file is missing or malformed.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// The base body font.
    pub fn base_font(&self) -> Font {
        Font::new(self.base.family.clone(), self.base.size)
    }

    /// The monospaced code font.
    pub fn code_font(&self) -> Font {
        Font::monospace(self.code.family.clone(), self.code.size)
    }

    pub fn heading(&self, level: u8) -> &HeadingStyle {
        match level {
            0 | 1 => &self.h1,
            2 => &self.h2,
            _ => &self.h3,
        }
    }

    /// Minimum list prefix column width: never narrower than a
    /// two-digit ordered prefix under the base font. Computed once per
    /// sheet and cached.
    pub fn min_prefix_width(&self, measurer: &dyn TextMeasurer) -> f32 {
        *self
            .min_prefix_width
            .get_or_init(|| measurer.width("99.", &self.base_font()).max(self.list.indent))
    }

    fn base_paragraph(&self) -> ParagraphStyle {
        ParagraphStyle {
            spacing_after: self.base.paragraph_spacing,
            ..Default::default()
        }
    }

    /// Static attribute bundle for a block node, or `None` when the
    /// node contributes no attributes of its own (document, list and
    /// its items, thematic break).
    pub fn attributes_for_block(&self, block: &Block) -> Option<Attributes> {
        match block {
            Block::Document(_)
            | Block::List { .. }
            | Block::ListItem { .. }
            | Block::ThematicBreak => None,
            // No color here: enclosing quotes still get to tint their
            // paragraphs, and the final render pass resolves anything
            // left unset to the base color.
            Block::Paragraph(_) => Some(Attributes {
                paragraph: Some(self.base_paragraph()),
                ..Default::default()
            }),
            Block::Heading { level, .. } => {
                let heading = self.heading(*level);
                Some(Attributes {
                    kind: MarkdownKind::heading(*level),
                    font: Some(self.base_font().sized(heading.size)),
                    color: Some(heading.color),
                    paragraph: Some(ParagraphStyle {
                        spacing_before: self.base.paragraph_spacing,
                        spacing_after: self.base.paragraph_spacing,
                        ..Default::default()
                    }),
                    ..Default::default()
                })
            }
            Block::BlockQuote(_) => Some(Attributes {
                kind: MarkdownKind::QUOTE,
                color: Some(self.quote.color),
                paragraph: Some(ParagraphStyle {
                    head_indent: self.quote.indent,
                    first_line_head_indent: self.quote.indent,
                    spacing_after: self.base.paragraph_spacing,
                    ..Default::default()
                }),
                ..Default::default()
            }),
            // Html and custom blocks keep their markup visible as code.
            Block::CodeBlock(_) | Block::HtmlBlock(_) | Block::CustomBlock(_) => {
                Some(self.code_bundle(Some(self.base_paragraph())))
            }
        }
    }

    /// Static attribute bundle for an inline node, or `None` for nodes
    /// that contribute nothing themselves (text, breaks, link, image).
    pub fn attributes_for_inline(&self, inline: &Inline) -> Option<Attributes> {
        match inline {
            Inline::Text(_)
            | Inline::SoftBreak
            | Inline::LineBreak
            | Inline::Link { .. }
            | Inline::Image { .. } => None,
            Inline::Code(_) | Inline::Html(_) | Inline::Custom(_) => {
                Some(self.code_bundle(None))
            }
            Inline::Emphasis(_) => Some(Attributes {
                kind: MarkdownKind::ITALIC,
                color: self.italic.color,
                ..Default::default()
            }),
            Inline::Strong(_) => Some(Attributes {
                kind: MarkdownKind::BOLD,
                color: self.bold.color,
                ..Default::default()
            }),
        }
    }

    fn code_bundle(&self, paragraph: Option<ParagraphStyle>) -> Attributes {
        Attributes {
            kind: MarkdownKind::CODE,
            font: Some(self.code_font()),
            color: Some(self.code.color),
            paragraph,
            ..Default::default()
        }
    }
}
