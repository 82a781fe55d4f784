use thiserror::Error;

use crate::parser::NodeType;

/// Errors produced while building the document model.
///
/// Construction errors indicate a contract violation between the parser
/// and the AST model and abort conversion; rendering itself never fails.
#[derive(Error, Debug)]
pub enum Error {
    /// A parse node appeared in a position its type is not valid for.
    #[error("node type {node:?} is not valid as {context}")]
    InvalidNode {
        node: NodeType,
        context: &'static str,
    },

    /// A list-item node was encountered outside its parent list.
    #[error("list item outside of a list")]
    OrphanListItem,

    /// The parse tree nests deeper than the conversion ceiling.
    #[error("document nesting exceeds limit of {0}")]
    TooDeep(usize),
}

/// Result type alias using the crate error.
pub type Result<T> = std::result::Result<T, Error>;
