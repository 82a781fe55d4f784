//! The document model: closed Block/Inline sum types plus conversion
//! from the generic parse tree.
//!
//! Conversion is strict: a node type that is not valid for its position
//! aborts with an error instead of silently dropping content. List
//! children are special-cased so every item gets its prefix string bound
//! at construction time; a list-item node anywhere else is an error.

use std::fmt;

use crate::error::{Error, Result};
use crate::kind::MarkdownKind;
use crate::parser::{ListData, NodeType, ParseNode};

/// Conversion refuses trees nesting deeper than this.
pub const MAX_DEPTH: usize = 128;

/// Ordered or unordered list, with the ordered start index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Ordered { start: u64 },
    Unordered,
}

impl ListKind {
    fn from_data(data: Option<ListData>) -> Self {
        match data {
            Some(ListData { ordered: true, start }) => ListKind::Ordered { start },
            _ => ListKind::Unordered,
        }
    }

    /// The marker string for the item at a zero-based index.
    pub fn prefix(&self, index: usize) -> String {
        match self {
            ListKind::Ordered { start } => format!("{}.", start + index as u64),
            ListKind::Unordered => "•".to_string(),
        }
    }

    /// The markdown-kind flag tagging ranges of this list.
    pub fn kind(&self) -> MarkdownKind {
        match self {
            ListKind::Ordered { .. } => MarkdownKind::ORDERED_LIST,
            ListKind::Unordered => MarkdownKind::UNORDERED_LIST,
        }
    }
}

/// Block-level node. Owned exclusively by its parent; no sharing.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Document(Vec<Block>),
    BlockQuote(Vec<Block>),
    List {
        items: Vec<Block>,
        kind: ListKind,
    },
    /// Always a child of `List`; the prefix is bound at construction.
    ListItem {
        children: Vec<Block>,
        prefix: String,
    },
    CodeBlock(String),
    HtmlBlock(String),
    CustomBlock(String),
    Paragraph(Vec<Inline>),
    Heading {
        children: Vec<Inline>,
        level: u8,
    },
    ThematicBreak,
}

/// Inline node.
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text(String),
    SoftBreak,
    LineBreak,
    Code(String),
    Html(String),
    Custom(String),
    Emphasis(Vec<Inline>),
    Strong(Vec<Inline>),
    Link {
        children: Vec<Inline>,
        title: Option<String>,
        url: Option<String>,
    },
    Image {
        children: Vec<Inline>,
        title: Option<String>,
        url: Option<String>,
    },
}

impl Block {
    /// Convert a generic parse node into a block.
    pub fn from_node(node: &ParseNode) -> Result<Self> {
        Self::convert(node, 0)
    }

    fn convert(node: &ParseNode, depth: usize) -> Result<Self> {
        if depth > MAX_DEPTH {
            return Err(Error::TooDeep(MAX_DEPTH));
        }
        let block = match node.node_type {
            NodeType::Document => Block::Document(Self::convert_children(node, depth)?),
            NodeType::BlockQuote => Block::BlockQuote(Self::convert_children(node, depth)?),
            NodeType::List => {
                let kind = ListKind::from_data(node.list);
                let mut items = Vec::with_capacity(node.children.len());
                for (index, child) in node.children.iter().enumerate() {
                    if child.node_type != NodeType::Item {
                        return Err(Error::InvalidNode {
                            node: child.node_type,
                            context: "a list item",
                        });
                    }
                    items.push(Block::ListItem {
                        children: Self::convert_children(child, depth + 1)?,
                        prefix: kind.prefix(index),
                    });
                }
                Block::List { items, kind }
            }
            // Items are only built through their parent list above.
            NodeType::Item => return Err(Error::OrphanListItem),
            NodeType::CodeBlock => Block::CodeBlock(node.literal.clone().unwrap_or_default()),
            NodeType::HtmlBlock => Block::HtmlBlock(node.literal.clone().unwrap_or_default()),
            NodeType::CustomBlock => Block::CustomBlock(node.literal.clone().unwrap_or_default()),
            NodeType::Paragraph => Block::Paragraph(Inline::convert_children(node, depth)?),
            NodeType::Heading => Block::Heading {
                children: Inline::convert_children(node, depth)?,
                level: node.heading_level.unwrap_or(1).min(3),
            },
            NodeType::ThematicBreak => Block::ThematicBreak,
            other => {
                return Err(Error::InvalidNode {
                    node: other,
                    context: "a block",
                });
            }
        };
        Ok(block)
    }

    fn convert_children(node: &ParseNode, depth: usize) -> Result<Vec<Block>> {
        node.children
            .iter()
            .map(|child| Self::convert(child, depth + 1))
            .collect()
    }
}

impl Inline {
    /// Convert a generic parse node into an inline.
    pub fn from_node(node: &ParseNode) -> Result<Self> {
        Self::convert(node, 0)
    }

    fn convert(node: &ParseNode, depth: usize) -> Result<Self> {
        if depth > MAX_DEPTH {
            return Err(Error::TooDeep(MAX_DEPTH));
        }
        let inline = match node.node_type {
            NodeType::Text => Inline::Text(node.literal.clone().unwrap_or_default()),
            NodeType::SoftBreak => Inline::SoftBreak,
            NodeType::LineBreak => Inline::LineBreak,
            NodeType::Code => Inline::Code(node.literal.clone().unwrap_or_default()),
            NodeType::HtmlInline => Inline::Html(node.literal.clone().unwrap_or_default()),
            NodeType::CustomInline => Inline::Custom(node.literal.clone().unwrap_or_default()),
            NodeType::Emph => Inline::Emphasis(Self::convert_children(node, depth)?),
            NodeType::Strong => Inline::Strong(Self::convert_children(node, depth)?),
            NodeType::Link => Inline::Link {
                children: Self::convert_children(node, depth)?,
                title: node.title.clone(),
                url: node.url.clone(),
            },
            NodeType::Image => Inline::Image {
                children: Self::convert_children(node, depth)?,
                title: node.title.clone(),
                url: node.url.clone(),
            },
            other => {
                return Err(Error::InvalidNode {
                    node: other,
                    context: "an inline",
                });
            }
        };
        Ok(inline)
    }

    fn convert_children(node: &ParseNode, depth: usize) -> Result<Vec<Inline>> {
        node.children
            .iter()
            .map(|child| Self::convert(child, depth + 1))
            .collect()
    }
}

// Human-readable tree dumps, one node per line, two-space indent.

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.dump(f, 0)
    }
}

impl Block {
    fn dump(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let pad = "  ".repeat(indent);
        match self {
            Block::Document(children) => {
                writeln!(f, "{pad}document")?;
                for child in children {
                    child.dump(f, indent + 1)?;
                }
            }
            Block::BlockQuote(children) => {
                writeln!(f, "{pad}block-quote")?;
                for child in children {
                    child.dump(f, indent + 1)?;
                }
            }
            Block::List { items, kind } => {
                match kind {
                    ListKind::Ordered { start } => writeln!(f, "{pad}list ordered start={start}")?,
                    ListKind::Unordered => writeln!(f, "{pad}list unordered")?,
                }
                for item in items {
                    item.dump(f, indent + 1)?;
                }
            }
            Block::ListItem { children, prefix } => {
                writeln!(f, "{pad}item {prefix:?}")?;
                for child in children {
                    child.dump(f, indent + 1)?;
                }
            }
            Block::CodeBlock(text) => writeln!(f, "{pad}code-block {text:?}")?,
            Block::HtmlBlock(text) => writeln!(f, "{pad}html-block {text:?}")?,
            Block::CustomBlock(text) => writeln!(f, "{pad}custom-block {text:?}")?,
            Block::Paragraph(children) => {
                writeln!(f, "{pad}paragraph")?;
                for child in children {
                    child.dump(f, indent + 1)?;
                }
            }
            Block::Heading { children, level } => {
                writeln!(f, "{pad}heading level={level}")?;
                for child in children {
                    child.dump(f, indent + 1)?;
                }
            }
            Block::ThematicBreak => writeln!(f, "{pad}thematic-break")?,
        }
        Ok(())
    }
}

impl fmt::Display for Inline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.dump(f, 0)
    }
}

impl Inline {
    fn dump(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let pad = "  ".repeat(indent);
        match self {
            Inline::Text(text) => writeln!(f, "{pad}text {text:?}")?,
            Inline::SoftBreak => writeln!(f, "{pad}soft-break")?,
            Inline::LineBreak => writeln!(f, "{pad}line-break")?,
            Inline::Code(text) => writeln!(f, "{pad}code {text:?}")?,
            Inline::Html(text) => writeln!(f, "{pad}html {text:?}")?,
            Inline::Custom(text) => writeln!(f, "{pad}custom {text:?}")?,
            Inline::Emphasis(children) => {
                writeln!(f, "{pad}emphasis")?;
                for child in children {
                    child.dump(f, indent + 1)?;
                }
            }
            Inline::Strong(children) => {
                writeln!(f, "{pad}strong")?;
                for child in children {
                    child.dump(f, indent + 1)?;
                }
            }
            Inline::Link { children, url, .. } => {
                writeln!(f, "{pad}link url={:?}", url.as_deref().unwrap_or(""))?;
                for child in children {
                    child.dump(f, indent + 1)?;
                }
            }
            Inline::Image { children, url, .. } => {
                writeln!(f, "{pad}image url={:?}", url.as_deref().unwrap_or(""))?;
                for child in children {
                    child.dump(f, indent + 1)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    fn document(markdown: &str) -> Block {
        Block::from_node(&parser::parse(markdown)).unwrap()
    }

    #[test]
    fn converts_basic_document() {
        let doc = document("# Title\n\nBody.");
        let Block::Document(children) = &doc else {
            panic!("expected document");
        };
        assert_eq!(children.len(), 2);
        assert!(matches!(
            children[0],
            Block::Heading { level: 1, .. }
        ));
        assert!(matches!(children[1], Block::Paragraph(_)));
    }

    #[test]
    fn heading_levels_clamp_to_three() {
        let doc = document("##### Deep");
        let Block::Document(children) = &doc else {
            panic!("expected document");
        };
        assert!(matches!(children[0], Block::Heading { level: 3, .. }));
    }

    #[test]
    fn ordered_prefixes_count_from_start() {
        let doc = document("3. one\n4. two");
        let Block::Document(children) = &doc else {
            panic!("expected document");
        };
        let Block::List { items, kind } = &children[0] else {
            panic!("expected list");
        };
        assert_eq!(*kind, ListKind::Ordered { start: 3 });
        let prefixes: Vec<&str> = items
            .iter()
            .map(|item| match item {
                Block::ListItem { prefix, .. } => prefix.as_str(),
                _ => panic!("expected item"),
            })
            .collect();
        assert_eq!(prefixes, vec!["3.", "4."]);
    }

    #[test]
    fn unordered_prefix_is_bullet() {
        assert_eq!(ListKind::Unordered.prefix(0), "•");
        assert_eq!(ListKind::Unordered.prefix(7), "•");
        assert_eq!(ListKind::Ordered { start: 1 }.prefix(10), "11.");
    }

    #[test]
    fn orphan_item_is_fatal() {
        let item = ParseNode::new(NodeType::Item);
        assert!(matches!(
            Block::from_node(&item),
            Err(Error::OrphanListItem)
        ));
    }

    #[test]
    fn non_item_inside_list_is_fatal() {
        let mut list = ParseNode::new(NodeType::List);
        list.children.push(ParseNode::new(NodeType::Paragraph));
        assert!(matches!(
            Block::from_node(&list),
            Err(Error::InvalidNode { .. })
        ));
    }

    #[test]
    fn inline_node_is_not_a_block() {
        let text = ParseNode::literal(NodeType::Text, "plain");
        assert!(matches!(
            Block::from_node(&text),
            Err(Error::InvalidNode { .. })
        ));
    }

    #[test]
    fn block_node_is_not_an_inline() {
        let para = ParseNode::new(NodeType::Paragraph);
        assert!(matches!(
            Inline::from_node(&para),
            Err(Error::InvalidNode { .. })
        ));
    }

    #[test]
    fn depth_ceiling_is_enforced() {
        let mut node = ParseNode::new(NodeType::Paragraph);
        for _ in 0..(MAX_DEPTH + 2) {
            let mut quote = ParseNode::new(NodeType::BlockQuote);
            quote.children.push(node);
            node = quote;
        }
        assert!(matches!(
            Block::from_node(&node),
            Err(Error::TooDeep(_))
        ));
    }

    #[test]
    fn dump_shape() {
        let doc = document("# Hi\n\n- a");
        let dump = doc.to_string();
        assert_eq!(
            dump,
            "document\n  heading level=1\n    text \"Hi\"\n  list unordered\n    item \"•\"\n      paragraph\n        text \"a\"\n"
        );
    }
}
