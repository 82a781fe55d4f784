//! Generic parse tree built from the CommonMark parser's event stream.
//!
//! The rest of the crate treats the parser as a black box: it consumes a
//! [`ParseNode`] tree carrying a closed type vocabulary, optional literal
//! text, ordered children and list metadata. This module is the one
//! place that knows the events come from pulldown-cmark.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use tracing::debug;

/// Closed vocabulary of parse node types (the cmark node model).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Document,
    BlockQuote,
    List,
    Item,
    CodeBlock,
    HtmlBlock,
    CustomBlock,
    Paragraph,
    Heading,
    ThematicBreak,
    Text,
    SoftBreak,
    LineBreak,
    Code,
    HtmlInline,
    CustomInline,
    Emph,
    Strong,
    Link,
    Image,
}

impl NodeType {
    /// True for node types that occur in inline content.
    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            NodeType::Text
                | NodeType::SoftBreak
                | NodeType::LineBreak
                | NodeType::Code
                | NodeType::HtmlInline
                | NodeType::CustomInline
                | NodeType::Emph
                | NodeType::Strong
                | NodeType::Link
                | NodeType::Image
        )
    }
}

/// List metadata carried by `List` nodes only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListData {
    pub ordered: bool,
    /// Start index of an ordered list; 1 for unordered lists.
    pub start: u64,
}

/// One node of the generic parse tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseNode {
    pub node_type: NodeType,
    pub literal: Option<String>,
    pub children: Vec<ParseNode>,
    pub list: Option<ListData>,
    pub heading_level: Option<u8>,
    pub url: Option<String>,
    pub title: Option<String>,
}

impl ParseNode {
    pub fn new(node_type: NodeType) -> Self {
        Self {
            node_type,
            literal: None,
            children: Vec::new(),
            list: None,
            heading_level: None,
            url: None,
            title: None,
        }
    }

    /// A leaf node carrying literal text.
    pub fn literal(node_type: NodeType, text: impl Into<String>) -> Self {
        Self {
            literal: Some(text.into()),
            ..Self::new(node_type)
        }
    }

    fn push_literal(&mut self, text: &str) {
        self.literal.get_or_insert_with(String::new).push_str(text);
    }
}

/// Parse markdown into a generic node tree rooted at a `Document`.
pub fn parse(markdown: &str) -> ParseNode {
    let parser = Parser::new_ext(markdown, Options::empty());
    let mut stack: Vec<ParseNode> = vec![ParseNode::new(NodeType::Document)];

    for event in parser {
        process_event(event, &mut stack);
    }

    // Stray End events never pop the root, so the document is always here.
    let mut root = stack.swap_remove(0);
    // Unclosed containers (should not happen with a balanced stream).
    while let Some(node) = stack.pop() {
        root.children.push(node);
    }
    debug!(children = root.children.len(), "parsed document");
    root
}

fn process_event(event: Event, stack: &mut Vec<ParseNode>) {
    match event {
        Event::Start(tag) => stack.push(open_node(tag)),

        Event::End(tag) => {
            if stack.len() < 2 {
                return;
            }
            if let Some(mut node) = stack.pop() {
                if matches!(tag, TagEnd::Item) {
                    node.children = wrap_loose_inlines(node.children);
                }
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(node);
                }
            }
        }

        Event::Text(text) => {
            if let Some(top) = stack.last_mut() {
                // Code and html blocks collect their literal directly.
                if matches!(top.node_type, NodeType::CodeBlock | NodeType::HtmlBlock) {
                    top.push_literal(&text);
                } else {
                    top.children
                        .push(ParseNode::literal(NodeType::Text, text.into_string()));
                }
            }
        }

        Event::Code(code) => {
            if let Some(top) = stack.last_mut() {
                top.children
                    .push(ParseNode::literal(NodeType::Code, code.into_string()));
            }
        }

        Event::Html(html) => {
            if let Some(top) = stack.last_mut() {
                if top.node_type == NodeType::HtmlBlock {
                    top.push_literal(&html);
                } else {
                    top.children
                        .push(ParseNode::literal(NodeType::HtmlBlock, html.into_string()));
                }
            }
        }

        Event::InlineHtml(html) => {
            if let Some(top) = stack.last_mut() {
                top.children
                    .push(ParseNode::literal(NodeType::HtmlInline, html.into_string()));
            }
        }

        Event::SoftBreak => push_leaf(stack, ParseNode::new(NodeType::SoftBreak)),
        Event::HardBreak => push_leaf(stack, ParseNode::new(NodeType::LineBreak)),
        Event::Rule => push_leaf(stack, ParseNode::new(NodeType::ThematicBreak)),

        // Footnotes, math and task markers are outside the vocabulary.
        _ => {}
    }
}

fn push_leaf(stack: &mut Vec<ParseNode>, node: ParseNode) {
    if let Some(top) = stack.last_mut() {
        top.children.push(node);
    }
}

fn open_node(tag: Tag) -> ParseNode {
    match tag {
        Tag::Paragraph => ParseNode::new(NodeType::Paragraph),
        Tag::Heading { level, .. } => {
            let mut node = ParseNode::new(NodeType::Heading);
            node.heading_level = Some(heading_level_to_u8(level));
            node
        }
        Tag::BlockQuote(_) => ParseNode::new(NodeType::BlockQuote),
        Tag::CodeBlock(_) => ParseNode::new(NodeType::CodeBlock),
        Tag::HtmlBlock => ParseNode::new(NodeType::HtmlBlock),
        Tag::List(start) => {
            let mut node = ParseNode::new(NodeType::List);
            node.list = Some(ListData {
                ordered: start.is_some(),
                start: start.unwrap_or(1),
            });
            node
        }
        Tag::Item => ParseNode::new(NodeType::Item),
        Tag::Emphasis => ParseNode::new(NodeType::Emph),
        Tag::Strong => ParseNode::new(NodeType::Strong),
        Tag::Link {
            dest_url, title, ..
        } => {
            let mut node = ParseNode::new(NodeType::Link);
            node.url = Some(dest_url.into_string());
            let title = title.into_string();
            node.title = (!title.is_empty()).then_some(title);
            node
        }
        Tag::Image {
            dest_url, title, ..
        } => {
            let mut node = ParseNode::new(NodeType::Image);
            node.url = Some(dest_url.into_string());
            let title = title.into_string();
            node.title = (!title.is_empty()).then_some(title);
            node
        }
        // Tags outside the enabled option set (tables, footnotes,
        // metadata) still need a container so the stream stays balanced.
        _ => ParseNode::new(NodeType::CustomBlock),
    }
}

// Tight list items carry their inline content directly; wrap each
// consecutive inline run in a paragraph so items always hold blocks.
fn wrap_loose_inlines(children: Vec<ParseNode>) -> Vec<ParseNode> {
    let mut out = Vec::with_capacity(children.len());
    let mut inline_run: Vec<ParseNode> = Vec::new();
    for child in children {
        if child.node_type.is_inline() {
            inline_run.push(child);
        } else {
            flush_inline_run(&mut inline_run, &mut out);
            out.push(child);
        }
    }
    flush_inline_run(&mut inline_run, &mut out);
    out
}

fn flush_inline_run(run: &mut Vec<ParseNode>, out: &mut Vec<ParseNode>) {
    if !run.is_empty() {
        let mut paragraph = ParseNode::new(NodeType::Paragraph);
        paragraph.children = std::mem::take(run);
        out.push(paragraph);
    }
}

fn heading_level_to_u8(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_and_paragraph() {
        let doc = parse("# Title\n\nBody text.");
        assert_eq!(doc.node_type, NodeType::Document);
        assert_eq!(doc.children.len(), 2);
        assert_eq!(doc.children[0].node_type, NodeType::Heading);
        assert_eq!(doc.children[0].heading_level, Some(1));
        assert_eq!(doc.children[1].node_type, NodeType::Paragraph);
        assert_eq!(
            doc.children[1].children[0].literal.as_deref(),
            Some("Body text.")
        );
    }

    #[test]
    fn code_block_collects_literal() {
        let doc = parse("```\nlet x = 1;\nlet y = 2;\n```");
        let code = &doc.children[0];
        assert_eq!(code.node_type, NodeType::CodeBlock);
        assert_eq!(code.literal.as_deref(), Some("let x = 1;\nlet y = 2;\n"));
    }

    #[test]
    fn ordered_list_metadata() {
        let doc = parse("3. one\n4. two");
        let list = &doc.children[0];
        assert_eq!(list.node_type, NodeType::List);
        assert_eq!(
            list.list,
            Some(ListData {
                ordered: true,
                start: 3
            })
        );
        assert_eq!(list.children.len(), 2);
        assert_eq!(list.children[0].node_type, NodeType::Item);
    }

    #[test]
    fn tight_item_inlines_get_wrapped() {
        let doc = parse("- one\n- two");
        let item = &doc.children[0].children[0];
        assert_eq!(item.children.len(), 1);
        assert_eq!(item.children[0].node_type, NodeType::Paragraph);
    }

    #[test]
    fn nested_list_shape() {
        let doc = parse("- outer\n  - inner");
        let outer_item = &doc.children[0].children[0];
        // paragraph for "outer", then the nested list
        assert_eq!(outer_item.children.len(), 2);
        assert_eq!(outer_item.children[0].node_type, NodeType::Paragraph);
        assert_eq!(outer_item.children[1].node_type, NodeType::List);
    }

    #[test]
    fn emphasis_nesting() {
        let doc = parse("***both***");
        let para = &doc.children[0];
        let emph = &para.children[0];
        assert_eq!(emph.node_type, NodeType::Emph);
        assert_eq!(emph.children[0].node_type, NodeType::Strong);
    }

    #[test]
    fn link_url_and_title() {
        let doc = parse("[text](https://example.com \"a title\")");
        let link = &doc.children[0].children[0];
        assert_eq!(link.node_type, NodeType::Link);
        assert_eq!(link.url.as_deref(), Some("https://example.com"));
        assert_eq!(link.title.as_deref(), Some("a title"));
    }

    #[test]
    fn soft_and_hard_breaks() {
        let doc = parse("one\ntwo  \nthree");
        let para = &doc.children[0];
        let kinds: Vec<NodeType> = para.children.iter().map(|c| c.node_type).collect();
        assert!(kinds.contains(&NodeType::SoftBreak));
        assert!(kinds.contains(&NodeType::LineBreak));
    }
}
