//! The postorder parse-node store.
//!
//! Nodes are stored in postorder: every child precedes its parent, and a
//! node's `subtree_size` is 1 plus the sum of its children's. The direct
//! children of a node are recovered by walking backward from the node,
//! subtracting each child's `subtree_size` to find the previous sibling —
//! which makes child iteration rightmost-first. Callers that need source
//! order use [`NodeStore::children_lr`].

use serde::Serialize;

use twine_common::ids::{NodeId, TokenId};

/// Every kind of parse node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeKind {
    // ── Expressions ────────────────────────────────────────────────────
    /// Integer literal. Token: the literal.
    IntLiteral,
    /// Float literal. Token: the literal.
    FloatLiteral,
    /// Name reference. Token: the identifier.
    Identifier,
    /// `~expr` / `-expr`. Token: the operator. One child.
    UnaryExpr,
    /// Binary operation. Token: the operator. Children: lhs, rhs.
    BinaryExpr,
    /// Relational chain `a < b <= c` with two or more comparators.
    /// Token: the first comparator. Children: all operands.
    CompareChain,
    /// Parenthesized expression. Transparent to the checker. One child.
    ParenExpr,
    /// `base.field`. Token: the field identifier. One child: the base.
    FieldAccess,
    /// `base[index]`. Token: the `[`. Children: base, index.
    IndexAccess,
    /// `[e1, e2, …]`. Token: the `[`. Children: the elements.
    ListLiteral,
    /// `callee(args…)`. Token: the `(`. Children: callee, then arguments.
    FuncCall,
    /// `match scrutinee` as a binding initializer. Token: the `match`
    /// keyword. One child: the scrutinee.
    MatchExpr,

    // ── Type syntax ────────────────────────────────────────────────────
    /// Primitive type keyword. Token: the keyword.
    PrimType,
    /// User type name. Token: the identifier.
    NamedType,
    /// `Elem[size]`. Token: the size literal. One child: the element type.
    ListType,
    /// `base<min=…, max=…>`. Token: the base keyword. Children: the base
    /// type, then the bound nodes.
    RefinedType,
    /// `min=value`. Token: the `min` identifier. One child: the value.
    MinBound,
    /// `max=value`. Token: the `max` identifier. One child: the value.
    MaxBound,
    /// `(P1, P2) -> R`. Token: the arrow. Children: parameters, then the
    /// return type last.
    FuncType,

    // ── Statements ─────────────────────────────────────────────────────
    /// `name: Type` or `name: Type = init`. Token: the name. Children:
    /// the type node, then the initializer when present.
    Binding,
    /// `name = value`. Token: the name. One child: the value.
    Assign,
    /// `Name:` record declaration header. Token: the name. No children.
    TypeDecl,
    /// Lambda definition `name = (p: T, …): R -> body`. Token: the name.
    /// Children: parameters, return type, body.
    FuncDef,
    /// One lambda parameter `p: T`. Token: the name. One child: the type.
    Param,
    /// `pattern -> body` line. Token: the arrow. Children: pattern, body.
    MatchArm,
    /// `panic` statement. Token: the keyword. No children.
    Panic,

    // ── Patterns ───────────────────────────────────────────────────────
    /// Integer literal pattern. Token: the literal.
    LiteralPattern,
    /// `_`. Token: the underscore.
    WildcardPattern,
    /// Identifier pattern binding the scrutinee. Token: the identifier.
    BindingPattern,
    /// `p1 | p2 | …`. Token: the first `|`. Children: the alternatives.
    OrPattern,
}

/// A parse node: kind, source anchor, and postorder subtree size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParseNode {
    pub kind: NodeKind,
    pub token: TokenId,
    pub subtree_size: u32,
}

/// Dense postorder node store.
#[derive(Debug, Default)]
pub struct NodeStore {
    nodes: Vec<ParseNode>,
}

impl NodeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node. Children must already have been appended.
    pub fn add(&mut self, kind: NodeKind, token: TokenId, subtree_size: u32) -> NodeId {
        debug_assert!(subtree_size >= 1, "a subtree contains at least its root");
        debug_assert!(
            subtree_size as usize <= self.nodes.len() + 1,
            "subtree size {} exceeds store length {}",
            subtree_size,
            self.nodes.len() + 1,
        );
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(ParseNode {
            kind,
            token,
            subtree_size,
        });
        id
    }

    /// Look up a node by id.
    ///
    /// # Panics
    ///
    /// Panics if the id was not produced by this store.
    pub fn get(&self, id: NodeId) -> &ParseNode {
        &self.nodes[id.index()]
    }

    /// Number of nodes in the store.
    pub fn count(&self) -> usize {
        self.nodes.len()
    }

    /// The subtree of `id` as a `(start, count)` index range, in O(1).
    pub fn subtree_range(&self, id: NodeId) -> (NodeId, u32) {
        let size = self.get(id).subtree_size;
        (NodeId(id.0 + 1 - size), size)
    }

    /// Iterate the direct children of `id`, rightmost-first.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        let (start, _) = self.subtree_range(id);
        Children {
            store: self,
            cursor: id.0,
            low: start.0,
        }
    }

    /// The direct children of `id` in source (left-to-right) order.
    pub fn children_lr(&self, id: NodeId) -> Vec<NodeId> {
        let mut kids: Vec<NodeId> = self.children(id).collect();
        kids.reverse();
        kids
    }

    /// Iterate the whole subtree of `id` in postorder (the node itself
    /// comes last).
    pub fn subtree(&self, id: NodeId) -> impl Iterator<Item = NodeId> {
        let (start, count) = self.subtree_range(id);
        (start.0..start.0 + count).map(NodeId)
    }
}

/// Rightmost-first iterator over a node's direct children.
pub struct Children<'a> {
    store: &'a NodeStore,
    cursor: u32,
    low: u32,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.cursor <= self.low {
            return None;
        }
        let child = NodeId(self.cursor - 1);
        self.cursor -= self.store.get(child).subtree_size;
        Some(child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build the tree for `1 + 2` by hand:
    /// index 0: IntLiteral(1), index 1: IntLiteral(2), index 2: BinaryExpr.
    fn small_tree() -> (NodeStore, NodeId) {
        let mut store = NodeStore::new();
        store.add(NodeKind::IntLiteral, TokenId(0), 1);
        store.add(NodeKind::IntLiteral, TokenId(2), 1);
        let root = store.add(NodeKind::BinaryExpr, TokenId(1), 3);
        (store, root)
    }

    #[test]
    fn subtree_range_is_constant_time_arithmetic() {
        let (store, root) = small_tree();
        let (start, count) = store.subtree_range(root);
        assert_eq!(start, NodeId(0));
        assert_eq!(count, 3);
    }

    #[test]
    fn children_iterate_rightmost_first() {
        let (store, root) = small_tree();
        let kids: Vec<NodeId> = store.children(root).collect();
        assert_eq!(kids, vec![NodeId(1), NodeId(0)]);
    }

    #[test]
    fn children_lr_restores_source_order() {
        let (store, root) = small_tree();
        assert_eq!(store.children_lr(root), vec![NodeId(0), NodeId(1)]);
    }

    #[test]
    fn subtree_iterates_postorder_with_root_last() {
        let (store, root) = small_tree();
        let ids: Vec<NodeId> = store.subtree(root).collect();
        assert_eq!(ids, vec![NodeId(0), NodeId(1), NodeId(2)]);
    }

    #[test]
    fn nested_children_walk_skips_whole_subtrees() {
        // `(1 + 2) * 3`: Paren wraps the BinaryExpr subtree.
        let mut store = NodeStore::new();
        store.add(NodeKind::IntLiteral, TokenId(1), 1);
        store.add(NodeKind::IntLiteral, TokenId(3), 1);
        store.add(NodeKind::BinaryExpr, TokenId(2), 3);
        store.add(NodeKind::ParenExpr, TokenId(0), 4);
        store.add(NodeKind::IntLiteral, TokenId(6), 1);
        let root = store.add(NodeKind::BinaryExpr, TokenId(5), 6);

        let kids = store.children_lr(root);
        assert_eq!(kids, vec![NodeId(3), NodeId(4)]);
        assert_eq!(store.get(kids[0]).kind, NodeKind::ParenExpr);
        assert_eq!(store.get(kids[1]).kind, NodeKind::IntLiteral);
    }

    #[test]
    fn subtree_sizes_sum_to_store_count_for_roots() {
        let (store, root) = small_tree();
        assert_eq!(store.get(root).subtree_size as usize, store.count());
    }
}
