//! Block and match contexts: multi-line constructs in progress.
//!
//! Statements arrive one line at a time, so record declarations, record
//! literals, nested record initializers, and match expressions each park
//! their in-progress state on an explicit stack while their indented child
//! lines stream in. A context closes when a statement arrives at or above
//! the level that opened it.

use twine_common::ids::{InstId, NodeId, StringId, TypeId};

/// How one record-literal field has been provided so far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    /// `field = expr` line; `None` when the expression failed to check
    /// (the field still counts as present, to avoid cascades).
    Inst(Option<InstId>),
    /// The field is being filled by a nested record initializer.
    Nested,
}

/// A multi-line construct in progress on the block stack.
#[derive(Debug)]
pub enum BlockContext {
    /// `Name:` record declaration collecting `field: Type` lines.
    TypeDecl {
        name: StringId,
        node: NodeId,
        fields: Vec<(StringId, TypeId, NodeId)>,
        child_level: u32,
    },
    /// `name: RecordType` collecting `field = expr` lines.
    RecordLiteral {
        /// The binding name; flattened symbols are `{base}_{field}`.
        base: StringId,
        node: NodeId,
        ty: TypeId,
        /// One slot per declared field, in field order.
        inits: Vec<Option<FieldValue>>,
        child_level: u32,
    },
    /// `field: RecordType` inside a record-literal block, collecting its
    /// own `field = expr` lines one level deeper.
    NestedRecordInit {
        /// Flattened path so far, e.g. `p_inner`; deeper nesting extends it.
        path: StringId,
        node: NodeId,
        ty: TypeId,
        inits: Vec<Option<FieldValue>>,
        child_level: u32,
    },
}

impl BlockContext {
    /// The indentation level this context expects its child lines at.
    pub fn child_level(&self) -> u32 {
        match self {
            BlockContext::TypeDecl { child_level, .. }
            | BlockContext::RecordLiteral { child_level, .. }
            | BlockContext::NestedRecordInit { child_level, .. } => *child_level,
        }
    }
}

/// A match expression in progress. At most one is active at a time:
/// matches do not nest in this language.
#[derive(Debug)]
pub struct MatchContext {
    /// The checked scrutinee; `None` when the scrutinee failed to check,
    /// in which case arms are still walked but nothing is emitted.
    pub scrutinee: Option<InstId>,
    pub scrutinee_ty: TypeId,
    /// The binding's declared type; every arm body must produce it.
    pub expected: TypeId,
    /// `(pattern node, checked body)` per arm, in source order.
    pub arms: Vec<(NodeId, Option<InstId>)>,
    /// Name of the binding receiving the match result.
    pub binding: StringId,
    /// The binding statement's node.
    pub node: NodeId,
    /// The `match` expression node, for diagnostics.
    pub match_node: NodeId,
    pub child_level: u32,
}
