//! Twine parser: token stream to a postorder parse tree.
//!
//! - [`node`]: the dense postorder node store with O(1) subtree ranges
//! - [`grammar`]: the line-oriented statement/expression parser
//!
//! The parser's output pairs the node store with a statement list: each
//! statement names its subtree root, indentation level, and line, which is
//! what the checker's block-context machinery consumes.

pub mod node;

mod grammar;

pub use grammar::{parse, Parse, Stmt};
