//! Recursive tree-to-buffer rendering.
//!
//! Depth-first and single-pass: children render first and concatenate
//! in document order, the node's own static bundle fills in on top
//! (kind flags union; font and color only where a child has not already
//! claimed them; paragraph style overwrites), then node-specific
//! post-processing runs. The list algorithm re-seats nested list
//! geometry with an explicit snapshot/overwrite/restore sequence since
//! paragraph-style application is range-wide.

use tracing::warn;
use url::Url;

use crate::ast::{Block, Inline, ListKind};
use crate::attr::{AttributedText, Attributes, ParagraphStyle, TabStop};
use crate::font::{Font, TextMeasurer};
use crate::kind::MarkdownKind;
use crate::style::StyleSheet;

/// Link validation capability: syntax detection and an openability
/// check, both injectable.
pub trait LinkVerifier {
    /// Extract a candidate URL from raw link text, or `None` when the
    /// text cannot be a URL at all.
    fn detect(&self, raw: &str) -> Option<String>;

    /// Whether the host could open this URL.
    fn can_open(&self, url: &str) -> bool;
}

/// Default verifier: anything without whitespace is a syntactic
/// candidate (relative references included); openability requires an
/// absolute URL with a scheme the host is expected to handle.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemeVerifier;

impl LinkVerifier for SchemeVerifier {
    fn detect(&self, raw: &str) -> Option<String> {
        let raw = raw.trim();
        if raw.is_empty() || raw.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return None;
        }
        Some(raw.to_string())
    }

    fn can_open(&self, url: &str) -> bool {
        Url::parse(url)
            .map(|u| matches!(u.scheme(), "http" | "https" | "mailto" | "tel" | "file"))
            .unwrap_or(false)
    }
}

/// Renders a document tree into an attributed-text buffer.
pub struct Renderer<'a> {
    style: &'a StyleSheet,
    measurer: &'a dyn TextMeasurer,
    links: &'a dyn LinkVerifier,
}

impl<'a> Renderer<'a> {
    pub fn new(
        style: &'a StyleSheet,
        measurer: &'a dyn TextMeasurer,
        links: &'a dyn LinkVerifier,
    ) -> Self {
        Self {
            style,
            measurer,
            links,
        }
    }

    /// Render a tree to a finished buffer. Runs that no node claimed a
    /// font or color for resolve to the base style, so every run in the
    /// result is fully specified.
    pub fn render_document(&self, block: &Block) -> AttributedText {
        let mut buf = self.render_block(block).unwrap_or_default();
        let base_font = self.style.base_font();
        let base_color = self.style.base.color;
        buf.apply_all(|attrs| {
            if attrs.font.is_none() {
                attrs.font = Some(base_font.clone());
            }
            if attrs.color.is_none() {
                attrs.color = Some(base_color);
            }
        });
        buf
    }

    /// Render one block; `None` means the node contributes no text.
    pub fn render_block(&self, block: &Block) -> Option<AttributedText> {
        match block {
            Block::Document(children) => self.render_blocks(children),
            Block::BlockQuote(children) => {
                let mut buf = self.render_blocks(children)?;
                self.apply_bundle(&mut buf, self.style.attributes_for_block(block));
                Some(buf)
            }
            Block::List { items, kind } => self.render_list(items, *kind),
            Block::ListItem { children, .. } => self.render_blocks(children),
            Block::CodeBlock(text) | Block::HtmlBlock(text) | Block::CustomBlock(text) => {
                if text.is_empty() {
                    return None;
                }
                let mut buf = AttributedText::plain(text.clone());
                self.apply_bundle(&mut buf, self.style.attributes_for_block(block));
                Some(buf)
            }
            Block::Paragraph(children) => {
                let mut buf = self.render_inlines(children)?;
                buf.push("\n", Attributes::default());
                self.apply_bundle(&mut buf, self.style.attributes_for_block(block));
                Some(buf)
            }
            Block::Heading { children, level } => {
                let mut buf = self.render_inlines(children)?;
                let size = self.style.heading(*level).size;
                self.transform_fonts(&mut buf, |font| font.bold_sized(size));
                buf.push("\n", Attributes::default());
                self.apply_bundle(&mut buf, self.style.attributes_for_block(block));
                Some(buf)
            }
            Block::ThematicBreak => None,
        }
    }

    /// Render one inline; `None` means the node contributes no text.
    pub fn render_inline(&self, inline: &Inline) -> Option<AttributedText> {
        match inline {
            Inline::Text(text) => {
                (!text.is_empty()).then(|| AttributedText::plain(text.clone()))
            }
            Inline::SoftBreak => Some(AttributedText::plain(" ")),
            Inline::LineBreak => Some(AttributedText::plain("\n")),
            Inline::Code(text) | Inline::Html(text) | Inline::Custom(text) => {
                if text.is_empty() {
                    return None;
                }
                let mut buf = AttributedText::plain(text.clone());
                self.apply_bundle(&mut buf, self.style.attributes_for_inline(inline));
                Some(buf)
            }
            Inline::Emphasis(children) => {
                let mut buf = self.render_inlines(children)?;
                self.transform_fonts(&mut buf, Font::italic);
                self.apply_bundle(&mut buf, self.style.attributes_for_inline(inline));
                Some(buf)
            }
            Inline::Strong(children) => {
                let mut buf = self.render_inlines(children)?;
                self.transform_fonts(&mut buf, Font::bold);
                self.apply_bundle(&mut buf, self.style.attributes_for_inline(inline));
                Some(buf)
            }
            Inline::Link { children, url, .. } => self.render_link(children, url.as_deref()),
            // Images degrade to their alt text.
            Inline::Image { children, .. } => self.render_inlines(children),
        }
    }

    fn render_blocks(&self, children: &[Block]) -> Option<AttributedText> {
        self.concat(children.iter().map(|child| self.render_block(child)))
    }

    fn render_inlines(&self, children: &[Inline]) -> Option<AttributedText> {
        self.concat(children.iter().map(|child| self.render_inline(child)))
    }

    // Fold-left concatenation: absent children are skipped, order is
    // preserved exactly.
    fn concat(
        &self,
        pieces: impl Iterator<Item = Option<AttributedText>>,
    ) -> Option<AttributedText> {
        let mut buf = AttributedText::new();
        for piece in pieces.flatten() {
            buf.extend(piece);
        }
        (!buf.is_empty()).then_some(buf)
    }

    // Static bundle over the whole buffer: kind unions, font and color
    // fill only where unset, paragraph style overwrites.
    fn apply_bundle(&self, buf: &mut AttributedText, bundle: Option<Attributes>) {
        let Some(bundle) = bundle else { return };
        buf.apply_all(|attrs| {
            attrs.kind |= bundle.kind;
            if attrs.font.is_none() {
                attrs.font = bundle.font.clone();
            }
            if attrs.color.is_none() {
                attrs.color = bundle.color;
            }
            if bundle.paragraph.is_some() {
                attrs.paragraph = bundle.paragraph.clone();
            }
        });
    }

    // Font transform over the whole buffer. Runs without a font start
    // from the base font. Link ranges are left alone: links render in
    // the plain style no matter what surrounds them.
    fn transform_fonts(&self, buf: &mut AttributedText, transform: impl Fn(&Font) -> Font) {
        let base = self.style.base_font();
        buf.apply_all(|attrs| {
            if attrs.kind.contains(MarkdownKind::LINK) {
                return;
            }
            attrs.font = Some(transform(attrs.font.as_ref().unwrap_or(&base)));
        });
    }

    fn render_link(&self, children: &[Inline], url: Option<&str>) -> Option<AttributedText> {
        let content = self.render_inlines(children);
        let raw = url.unwrap_or("");
        let candidate = self.links.detect(raw);
        let validate = self.style.links.validate;

        let accepted = match &candidate {
            Some(candidate) => !validate || self.links.can_open(candidate),
            None => false,
        };

        if accepted {
            let mut buf = content?;
            let attrs = Attributes {
                kind: MarkdownKind::LINK,
                link: candidate,
                ..Default::default()
            };
            // Full overwrite: a link range drops whatever bold, italic
            // or code styling its children carried.
            buf.set_attributes(0..buf.len(), &attrs);
            Some(buf)
        } else if validate {
            warn!(url = raw, "unopenable link, falling back to literal syntax");
            let text = content.map(|buf| buf.plain_text()).unwrap_or_default();
            Some(AttributedText::plain(format!("[{text}]({raw})")))
        } else {
            // Without validation, an undetectable URL just renders its
            // children unstyled.
            content
        }
    }

    // The list algorithm. Each item becomes `prefix \t content` with a
    // hanging indent at the content column; the prefix right-aligns
    // against the shared prefix margin.
    fn render_list(&self, items: &[Block], kind: ListKind) -> Option<AttributedText> {
        let base_font = self.style.base_font();

        // Prefix widths only grow with the item index, so the last
        // item's prefix is the widest the list will need.
        let last_prefix = items.iter().rev().find_map(|item| match item {
            Block::ListItem { prefix, .. } => Some(prefix.as_str()),
            _ => None,
        })?;
        let margin = self
            .style
            .min_prefix_width(self.measurer)
            .max(self.measurer.width(last_prefix, &base_font));
        let rule = margin + self.style.list.prefix_spacing;

        let mut out = AttributedText::new();
        for item in items {
            let Block::ListItem { children, prefix } = item else {
                continue;
            };
            let Some(mut buf) = self.render_blocks(children) else {
                continue;
            };

            buf.insert_front("\t", Attributes::default());
            buf.insert_front(
                prefix.clone(),
                Attributes {
                    kind: kind.kind(),
                    font: Some(base_font.clone()),
                    color: Some(self.style.list.prefix_color),
                    ..Default::default()
                },
            );

            // Right-align the prefix against the margin. Bullets also
            // discount a trailing dot's width so they line up with the
            // last digit of numbered items, not with their dot.
            let mut first_line = margin - self.measurer.width(prefix, &base_font);
            if prefix == "•" {
                first_line -= self.measurer.width(".", &base_font);
            }
            let paragraph = ParagraphStyle {
                spacing_after: self.style.list.item_spacing,
                head_indent: rule,
                first_line_head_indent: first_line,
                tab_stops: vec![TabStop { location: rule }],
                ..Default::default()
            };

            // Nested lists inside this item already carry their own
            // geometry; snapshot it, tag and overwrite the whole item,
            // then put each captured style back shifted into the
            // content column.
            let nested = buf.snapshot_where(|attrs| {
                attrs.kind.is_list() && attrs.paragraph.is_some()
            });
            let whole = 0..buf.len();
            buf.add_kind(whole.clone(), kind.kind());
            buf.apply(whole, |attrs| attrs.paragraph = Some(paragraph.clone()));
            for (range, attrs) in nested {
                if let Some(style) = attrs.paragraph {
                    let shifted = style.indented_by(rule);
                    buf.apply(range, |attrs| attrs.paragraph = Some(shifted.clone()));
                }
            }

            out.extend(buf);
        }
        (!out.is_empty()).then_some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::CharCellMetrics;

    fn render(markdown: &str) -> AttributedText {
        render_with(markdown, &StyleSheet::default())
    }

    fn render_with(markdown: &str, style: &StyleSheet) -> AttributedText {
        let doc = Block::from_node(&crate::parser::parse(markdown)).unwrap();
        Renderer::new(style, &CharCellMetrics, &SchemeVerifier).render_document(&doc)
    }

    fn validating_sheet() -> StyleSheet {
        toml::from_str("[links]\nvalidate = true").unwrap()
    }

    // With the default 12pt base font every column is 6pt wide, the
    // prefix margin floor is width("99.") = 18pt and the content
    // column sits at 18 + 8 = 26pt.

    #[test]
    fn empty_document_renders_empty() {
        let buf = render("");
        assert!(buf.is_empty());
        assert_eq!(buf.plain_text(), "");
    }

    #[test]
    fn sibling_order_is_preserved() {
        let buf = render("one *two* **three** `four`");
        assert_eq!(buf.plain_text(), "one two three four\n");
    }

    #[test]
    fn paragraph_appends_one_line_break() {
        let buf = render("hello");
        assert_eq!(buf.plain_text(), "hello\n");
        let attrs = buf.attributes_at(0).unwrap();
        assert_eq!(attrs.font.as_ref().unwrap().family, "Helvetica");
        assert_eq!(attrs.paragraph.as_ref().unwrap().spacing_after, 8.0);
    }

    #[test]
    fn emphasis_and_strong_compose() {
        let buf = render("***both***");
        let attrs = buf.attributes_at(0).unwrap();
        assert_eq!(attrs.kind, MarkdownKind::BOLD | MarkdownKind::ITALIC);
        let font = attrs.font.as_ref().unwrap();
        assert!(font.is_bold());
        assert!(font.is_italic());
        assert_eq!(font.size, 12.0);
    }

    #[test]
    fn strong_inside_code_keeps_monospace() {
        let buf = render("**`x`**");
        let attrs = buf.attributes_at(0).unwrap();
        assert!(attrs.kind.contains(MarkdownKind::BOLD | MarkdownKind::CODE));
        let font = attrs.font.as_ref().unwrap();
        assert!(font.is_bold());
        assert!(font.is_monospace());
    }

    #[test]
    fn heading_bolds_and_resizes() {
        let buf = render("# *Title*");
        let attrs = buf.attributes_at(0).unwrap();
        assert!(attrs.kind.contains(MarkdownKind::H1 | MarkdownKind::ITALIC));
        let font = attrs.font.as_ref().unwrap();
        assert!(font.is_bold());
        assert!(font.is_italic());
        assert_eq!(font.size, 24.0);
        assert_eq!(buf.plain_text(), "Title\n");
    }

    #[test]
    fn quote_colors_and_indents() {
        let buf = render("> words");
        let attrs = buf.attributes_at(0).unwrap();
        assert!(attrs.kind.contains(MarkdownKind::QUOTE));
        assert_eq!(attrs.color, Some(StyleSheet::default().quote.color));
        assert_eq!(attrs.paragraph.as_ref().unwrap().head_indent, 20.0);
    }

    #[test]
    fn code_block_is_monospaced_literal() {
        let buf = render("```\nlet x = 1;\n```");
        assert_eq!(buf.plain_text(), "let x = 1;\n");
        let attrs = buf.attributes_at(0).unwrap();
        assert_eq!(attrs.kind, MarkdownKind::CODE);
        assert!(attrs.font.as_ref().unwrap().is_monospace());
    }

    #[test]
    fn html_block_renders_as_code() {
        let buf = render("<div>\nraw\n</div>\n");
        let attrs = buf.attributes_at(0).unwrap();
        assert_eq!(attrs.kind, MarkdownKind::CODE);
        assert!(buf.plain_text().contains("<div>"));
    }

    #[test]
    fn thematic_break_contributes_nothing() {
        let buf = render("before\n\n---\n\nafter");
        assert_eq!(buf.plain_text(), "before\nafter\n");
    }

    #[test]
    fn image_degrades_to_alt_text() {
        let buf = render("![alt text](image.png)");
        assert_eq!(buf.plain_text(), "alt text\n");
        assert!(buf.ranges_containing(MarkdownKind::LINK).is_empty());
    }

    #[test]
    fn link_without_validation_gets_link_attributes() {
        let buf = render("[click](https://example.com)");
        let ranges = buf.ranges_containing(MarkdownKind::LINK);
        assert_eq!(ranges, vec![0..5]);
        let attrs = buf.attributes_at(0).unwrap();
        assert_eq!(attrs.link.as_deref(), Some("https://example.com"));
    }

    #[test]
    fn link_overwrites_inner_bold() {
        let buf = render("[**click**](https://example.com)");
        let attrs = buf.attributes_at(0).unwrap();
        assert_eq!(attrs.kind, MarkdownKind::LINK);
        assert!(!attrs.font.as_ref().unwrap().is_bold());
    }

    #[test]
    fn link_inside_emphasis_stays_plain() {
        let buf = render("*[click](https://example.com)*");
        let attrs = buf.attributes_at(0).unwrap();
        assert!(attrs.kind.contains(MarkdownKind::LINK));
        assert!(!attrs.font.as_ref().unwrap().is_italic());
    }

    #[test]
    fn unopenable_link_falls_back_to_literal() {
        let buf = render_with("[click](bad://url)", &validating_sheet());
        assert_eq!(buf.plain_text(), "[click](bad://url)\n");
        assert!(buf.ranges_containing(MarkdownKind::LINK).is_empty());
        let attrs = buf.attributes_at(0).unwrap();
        assert_eq!(attrs.kind, MarkdownKind::empty());
        let font = attrs.font.as_ref().unwrap();
        assert!(!font.is_bold());
        assert!(!font.is_italic());
    }

    #[test]
    fn openable_link_passes_validation() {
        let buf = render_with("[click](https://example.com)", &validating_sheet());
        assert_eq!(buf.plain_text(), "click\n");
        assert_eq!(buf.ranges_containing(MarkdownKind::LINK), vec![0..5]);
    }

    #[test]
    fn list_items_carry_prefix_tab_and_kind() {
        let buf = render("1. one\n2. two");
        assert_eq!(buf.plain_text(), "1.\tone\n2.\ttwo\n");
        let ranges = buf.ranges_containing(MarkdownKind::ORDERED_LIST);
        assert_eq!(ranges, vec![0..buf.len()]);
    }

    #[test]
    fn last_item_governs_prefix_margin() {
        // Items 8..=11: the two-digit "11." sets the margin at 18pt,
        // so "8." (12pt wide) gets a 6pt first-line indent.
        let buf = render("8. a\n9. b\n10. c\n11. d");
        let first = buf.attributes_at(0).unwrap().paragraph.clone().unwrap();
        assert_eq!(first.first_line_head_indent, 18.0 - 12.0);
        assert_eq!(first.head_indent, 26.0);
        assert_eq!(first.tab_stops, vec![TabStop { location: 26.0 }]);

        // Three-digit prefixes push the margin past the floor.
        let buf = render("99. a\n100. b");
        let first = buf.attributes_at(0).unwrap().paragraph.clone().unwrap();
        // margin = width("100.") = 24, prefix "99." is 18 wide
        assert_eq!(first.first_line_head_indent, 24.0 - 18.0);
        assert_eq!(first.head_indent, 24.0 + 8.0);
    }

    #[test]
    fn bullet_correction_discounts_a_dot() {
        let buf = render("- a");
        let paragraph = buf.attributes_at(0).unwrap().paragraph.clone().unwrap();
        // margin 18 − width("•") 6 − width(".") 6
        assert_eq!(paragraph.first_line_head_indent, 6.0);
        assert_eq!(paragraph.head_indent, 26.0);
    }

    #[test]
    fn item_spacing_comes_from_the_list_section() {
        let buf = render("- a");
        let paragraph = buf.attributes_at(0).unwrap().paragraph.clone().unwrap();
        assert_eq!(paragraph.spacing_after, 4.0);
    }

    #[test]
    fn nested_list_geometry_shifts_by_rule() {
        let buf = render("- outer\n  - inner");
        assert_eq!(buf.plain_text(), "•\touter\n•\tinner\n");

        // Outer item line keeps the unshifted geometry.
        let outer = buf.attributes_at(0).unwrap().paragraph.clone().unwrap();
        assert_eq!(outer.head_indent, 26.0);
        assert_eq!(outer.tab_stops, vec![TabStop { location: 26.0 }]);

        // The nested item's geometry moved right by rule = 26.
        let inner_start = buf.plain_text().find("inner").unwrap();
        let inner = buf
            .attributes_at(inner_start)
            .unwrap()
            .paragraph
            .clone()
            .unwrap();
        assert_eq!(inner.head_indent, 26.0 + 26.0);
        assert_eq!(inner.tab_stops, vec![TabStop { location: 52.0 }]);
        assert_eq!(inner.first_line_head_indent, 6.0 + 26.0);
    }

    #[test]
    fn nested_list_keeps_both_kind_flags() {
        let buf = render("1. outer\n   - inner");
        let inner_start = buf.plain_text().find('•').unwrap();
        let attrs = buf.attributes_at(inner_start).unwrap();
        assert!(attrs.kind.contains(MarkdownKind::ORDERED_LIST));
        assert!(attrs.kind.contains(MarkdownKind::UNORDERED_LIST));
    }

    #[test]
    fn prefix_takes_the_configured_color() {
        let buf = render("- a");
        let sheet = StyleSheet::default();
        assert_eq!(
            buf.attributes_at(0).unwrap().color,
            Some(sheet.list.prefix_color)
        );
        // content after the tab keeps the base color
        let content = buf.plain_text().find('a').unwrap();
        assert_eq!(buf.attributes_at(content).unwrap().color, Some(sheet.base.color));
    }

    #[test]
    fn every_run_is_fully_resolved() {
        let buf = render("# H\n\n> q\n\n- item\n\n`code`");
        for run in buf.runs() {
            assert!(run.attrs.font.is_some(), "unresolved font in {:?}", run.text);
            assert!(run.attrs.color.is_some(), "unresolved color in {:?}", run.text);
        }
    }

    #[test]
    fn scheme_verifier_detects_and_checks() {
        let v = SchemeVerifier;
        assert_eq!(v.detect("  https://x.io "), Some("https://x.io".into()));
        assert_eq!(v.detect("not a url"), None);
        assert_eq!(v.detect(""), None);
        assert!(v.can_open("https://x.io"));
        assert!(v.can_open("mailto:a@b.c"));
        assert!(!v.can_open("bad://x"));
        assert!(!v.can_open("#fragment"));
    }
}
