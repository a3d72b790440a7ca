//! Line-oriented grammar parser.
//!
//! Statements are one line each; indentation structure arrives as
//! `Indent`/`Dedent` tokens and is recorded per statement rather than
//! nested into the tree, so the checker's block-context stack can track
//! record literals and match arms across lines. Nodes are emitted directly
//! in postorder: every `parse_*` function emits its children before
//! finishing its own node.
//!
//! Recovery is per line: a failed statement reports one diagnostic and the
//! parser skips to the next line.

use twine_common::diag::{DiagCode, Diagnostic, Diagnostics};
use twine_common::ids::{NodeId, StringId, TokenId};
use twine_common::intern::StringInterner;
use twine_common::token::{Token, TokenKind, TokenList};

use crate::node::{NodeKind, NodeStore};

/// One top-level-ordered statement: the root of a postorder subtree plus
/// the indentation level and line it appeared on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stmt {
    pub node: NodeId,
    pub level: u32,
    pub line: u32,
}

/// Parser output: the node store and the statement list in source order.
#[derive(Debug)]
pub struct Parse {
    pub nodes: NodeStore,
    pub stmts: Vec<Stmt>,
}

/// Parse a token stream into statements.
pub fn parse(tokens: &TokenList, interner: &StringInterner, diags: &mut Diagnostics) -> Parse {
    let mut parser = Parser {
        tokens,
        interner,
        diags,
        nodes: NodeStore::new(),
        stmts: Vec::new(),
        pos: 0,
        level: 0,
    };
    parser.run();
    Parse {
        nodes: parser.nodes,
        stmts: parser.stmts,
    }
}

struct Parser<'a> {
    tokens: &'a TokenList,
    interner: &'a StringInterner,
    diags: &'a mut Diagnostics,
    nodes: NodeStore,
    stmts: Vec<Stmt>,
    pos: usize,
    level: u32,
}

impl Parser<'_> {
    fn run(&mut self) {
        loop {
            match self.peek_kind() {
                TokenKind::Indent(level) | TokenKind::Dedent(level) => {
                    self.level = level;
                    self.pos += 1;
                }
                TokenKind::Newline => self.pos += 1,
                TokenKind::Eof => break,
                _ => {
                    let line = self.current().line;
                    let level = self.level;
                    match self.parse_statement() {
                        Some(node) => {
                            self.stmts.push(Stmt { node, level, line });
                            self.expect_line_end();
                        }
                        None => self.skip_to_line_end(),
                    }
                }
            }
        }
    }

    // ── Token access ───────────────────────────────────────────────────

    fn current(&self) -> &Token {
        self.tokens.get(TokenId::new(self.pos))
    }

    fn peek_kind(&self) -> TokenKind {
        self.current().kind
    }

    fn peek_kind_at(&self, offset: usize) -> TokenKind {
        let idx = (self.pos + offset).min(self.tokens.count() - 1);
        self.tokens.get(TokenId::new(idx)).kind
    }

    fn bump(&mut self) -> TokenId {
        let id = TokenId::new(self.pos);
        debug_assert!(self.pos < self.tokens.count() - 1, "cannot bump past Eof");
        self.pos += 1;
        id
    }

    fn at_line_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Eof)
    }

    // ── Diagnostics and recovery ───────────────────────────────────────

    fn diag_here(&self, code: DiagCode) -> Diagnostic {
        let tok = self.current();
        Diagnostic::new(code, tok.line, tok.column).with_token(TokenId::new(self.pos))
    }

    fn unexpected_here(&mut self) {
        let found = self.peek_kind().describe();
        let diag = self.diag_here(DiagCode::UnexpectedToken).with_arg("found", found);
        self.diags.push(diag);
    }

    /// Report `expected {what}` (or an end-of-line diagnostic) at the
    /// current token and fail.
    fn fail_expecting<T>(&mut self, what: &'static str) -> Option<T> {
        if self.at_line_end() {
            let diag = self.diag_here(DiagCode::UnexpectedEndOfLine);
            self.diags.push(diag);
        } else {
            let found = self.peek_kind().describe();
            let diag = self
                .diag_here(DiagCode::ExpectedToken)
                .with_arg("expected", what)
                .with_arg("found", found);
            self.diags.push(diag);
        }
        None
    }

    /// Consume the given token or report and fail.
    fn expect(&mut self, want: TokenKind, what: &'static str) -> Option<TokenId> {
        if self.peek_kind() == want {
            return Some(self.bump());
        }
        self.fail_expecting(what)
    }

    fn expect_ident(&mut self, what: &'static str) -> Option<TokenId> {
        if matches!(self.peek_kind(), TokenKind::Ident(_)) {
            return Some(self.bump());
        }
        self.fail_expecting(what)
    }

    fn expect_line_end(&mut self) {
        if !self.at_line_end() {
            self.unexpected_here();
        }
        self.skip_to_line_end();
    }

    fn skip_to_line_end(&mut self) {
        while !self.at_line_end() {
            self.pos += 1;
        }
        if self.peek_kind() == TokenKind::Newline {
            self.pos += 1;
        }
    }

    // ── Node emission ──────────────────────────────────────────────────

    /// Finish a node whose children were emitted starting at `mark`
    /// (the node-store count before the first child).
    fn finish_node(&mut self, kind: NodeKind, token: TokenId, mark: usize) -> NodeId {
        let size = (self.nodes.count() - mark + 1) as u32;
        self.nodes.add(kind, token, size)
    }

    /// Start index of an already-emitted node's subtree, for wrapping it
    /// into a new parent.
    fn start_of(&self, node: NodeId) -> usize {
        self.nodes.subtree_range(node).0.index()
    }

    // ── Statements ─────────────────────────────────────────────────────

    fn parse_statement(&mut self) -> Option<NodeId> {
        match self.peek_kind() {
            TokenKind::KwPanic => {
                let tok = self.bump();
                Some(self.nodes.add(NodeKind::Panic, tok, 1))
            }
            TokenKind::Ident(name) => match self.peek_kind_at(1) {
                TokenKind::Colon => self.parse_binding_or_type_decl(name),
                TokenKind::Eq => self.parse_assign_or_func_def(),
                TokenKind::Arrow | TokenKind::Pipe => self.parse_match_arm(),
                _ => {
                    // Report at the token after the name; a bare name is
                    // not a statement.
                    self.bump();
                    self.fail_expecting("`:`, `=`, or `->`")
                }
            },
            TokenKind::IntLiteral(_) | TokenKind::Underscore => self.parse_match_arm(),
            _ => {
                self.unexpected_here();
                None
            }
        }
    }

    /// `Name:` (type declaration header), `name: Type`, `name: Type = init`.
    fn parse_binding_or_type_decl(&mut self, name: StringId) -> Option<NodeId> {
        let name_tok = self.bump();
        self.bump(); // `:`

        let is_upper = self
            .interner
            .get(name)
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_uppercase());
        if is_upper && self.at_line_end() {
            return Some(self.nodes.add(NodeKind::TypeDecl, name_tok, 1));
        }

        let mark = self.nodes.count();
        self.parse_type()?;

        if self.peek_kind() == TokenKind::Eq {
            self.bump();
            if self.peek_kind() == TokenKind::KwMatch {
                let match_tok = self.bump();
                let scrut_mark = self.nodes.count();
                self.parse_expr()?;
                self.finish_node(NodeKind::MatchExpr, match_tok, scrut_mark);
            } else {
                self.parse_expr()?;
            }
        }
        Some(self.finish_node(NodeKind::Binding, name_tok, mark))
    }

    /// `name = value` (assignment / record field init) or a lambda
    /// definition `name = (p: T, …): R -> body`.
    fn parse_assign_or_func_def(&mut self) -> Option<NodeId> {
        if self.is_lambda_head() {
            return self.parse_func_def();
        }
        let name_tok = self.bump();
        self.bump(); // `=`
        let mark = self.nodes.count();
        self.parse_expr()?;
        Some(self.finish_node(NodeKind::Assign, name_tok, mark))
    }

    /// A lambda follows `name =` when `(` opens a parameter list: either
    /// `()` or `(ident:` — both continue with a `:` return annotation.
    fn is_lambda_head(&self) -> bool {
        if self.peek_kind_at(2) != TokenKind::LParen {
            return false;
        }
        match self.peek_kind_at(3) {
            TokenKind::RParen => self.peek_kind_at(4) == TokenKind::Colon,
            TokenKind::Ident(_) => self.peek_kind_at(4) == TokenKind::Colon,
            _ => false,
        }
    }

    fn parse_func_def(&mut self) -> Option<NodeId> {
        let name_tok = self.bump();
        self.bump(); // `=`
        let mark = self.nodes.count();
        self.bump(); // `(`

        while self.peek_kind() != TokenKind::RParen {
            let param_tok = self.expect_ident("a parameter name")?;
            self.expect(TokenKind::Colon, "`:`")?;
            let param_mark = self.nodes.count();
            self.parse_type()?;
            self.finish_node(NodeKind::Param, param_tok, param_mark);
            if self.peek_kind() == TokenKind::Comma {
                self.bump();
            } else {
                break;
            }
        }
        self.expect(TokenKind::RParen, "`)`")?;
        self.expect(TokenKind::Colon, "`:`")?;
        self.parse_type()?;
        self.expect(TokenKind::Arrow, "`->`")?;
        self.parse_expr()?;
        Some(self.finish_node(NodeKind::FuncDef, name_tok, mark))
    }

    // ── Patterns ───────────────────────────────────────────────────────

    fn parse_match_arm(&mut self) -> Option<NodeId> {
        let mark = self.nodes.count();
        self.parse_pattern_atom()?;
        let mut alternatives = 1u32;
        let mut first_pipe = None;
        while self.peek_kind() == TokenKind::Pipe {
            let pipe = self.bump();
            first_pipe.get_or_insert(pipe);
            self.parse_pattern_atom()?;
            alternatives += 1;
        }
        if alternatives > 1 {
            let pipe = first_pipe.expect("or-pattern has a pipe");
            self.finish_node(NodeKind::OrPattern, pipe, mark);
        }
        let arrow = self.expect(TokenKind::Arrow, "`->`")?;
        self.parse_expr()?;
        Some(self.finish_node(NodeKind::MatchArm, arrow, mark))
    }

    fn parse_pattern_atom(&mut self) -> Option<NodeId> {
        match self.peek_kind() {
            TokenKind::IntLiteral(_) => {
                let tok = self.bump();
                Some(self.nodes.add(NodeKind::LiteralPattern, tok, 1))
            }
            TokenKind::Underscore => {
                let tok = self.bump();
                Some(self.nodes.add(NodeKind::WildcardPattern, tok, 1))
            }
            TokenKind::Ident(_) => {
                let tok = self.bump();
                Some(self.nodes.add(NodeKind::BindingPattern, tok, 1))
            }
            _ => self.fail_expecting("a pattern"),
        }
    }

    // ── Types ──────────────────────────────────────────────────────────

    fn parse_type(&mut self) -> Option<NodeId> {
        let mut ty = match self.peek_kind() {
            TokenKind::KwI32 | TokenKind::KwI64 | TokenKind::KwF32 | TokenKind::KwF64 => {
                let tok = self.bump();
                let prim = self.nodes.add(NodeKind::PrimType, tok, 1);
                if self.peek_kind() == TokenKind::Lt {
                    self.parse_refinement(tok, prim)?
                } else {
                    prim
                }
            }
            TokenKind::Ident(_) => {
                let tok = self.bump();
                self.nodes.add(NodeKind::NamedType, tok, 1)
            }
            TokenKind::LParen => self.parse_func_type()?,
            _ => return self.fail_expecting("a type"),
        };

        while self.peek_kind() == TokenKind::LBracket {
            self.bump();
            let size_tok = match self.peek_kind() {
                TokenKind::IntLiteral(_) => self.bump(),
                _ => return self.fail_expecting("a list size"),
            };
            self.expect(TokenKind::RBracket, "`]`")?;
            let mark = self.start_of(ty);
            ty = self.finish_node(NodeKind::ListType, size_tok, mark);
        }
        Some(ty)
    }

    /// `<min=…, max=…>` after an integer primitive.
    fn parse_refinement(&mut self, base_tok: TokenId, base: NodeId) -> Option<NodeId> {
        let mark = self.start_of(base);
        self.bump(); // `<`
        loop {
            let key_kind = match self.peek_kind() {
                TokenKind::Ident(name) => match self.interner.get(name) {
                    "min" => NodeKind::MinBound,
                    "max" => NodeKind::MaxBound,
                    _ => return self.fail_expecting("`min` or `max`"),
                },
                _ => return self.fail_expecting("`min` or `max`"),
            };
            let key_tok = self.bump();
            self.expect(TokenKind::Eq, "`=`")?;

            let value_mark = self.nodes.count();
            if self.peek_kind() == TokenKind::Minus {
                let minus = self.bump();
                let lit = match self.peek_kind() {
                    TokenKind::IntLiteral(_) => self.bump(),
                    _ => return self.fail_expecting("an integer bound"),
                };
                self.nodes.add(NodeKind::IntLiteral, lit, 1);
                self.finish_node(NodeKind::UnaryExpr, minus, value_mark);
            } else {
                let lit = match self.peek_kind() {
                    TokenKind::IntLiteral(_) => self.bump(),
                    _ => return self.fail_expecting("an integer bound"),
                };
                self.nodes.add(NodeKind::IntLiteral, lit, 1);
            }
            self.finish_node(key_kind, key_tok, value_mark);

            if self.peek_kind() == TokenKind::Comma {
                self.bump();
            } else {
                break;
            }
        }
        self.expect(TokenKind::Gt, "`>`")?;
        Some(self.finish_node(NodeKind::RefinedType, base_tok, mark))
    }

    /// `(P1, P2) -> R`.
    fn parse_func_type(&mut self) -> Option<NodeId> {
        let mark = self.nodes.count();
        self.bump(); // `(`
        while self.peek_kind() != TokenKind::RParen {
            self.parse_type()?;
            if self.peek_kind() == TokenKind::Comma {
                self.bump();
            } else {
                break;
            }
        }
        self.expect(TokenKind::RParen, "`)`")?;
        let arrow = self.expect(TokenKind::Arrow, "`->`")?;
        self.parse_type()?;
        Some(self.finish_node(NodeKind::FuncType, arrow, mark))
    }

    // ── Expressions ────────────────────────────────────────────────────

    fn parse_expr(&mut self) -> Option<NodeId> {
        self.parse_or()
    }

    fn parse_left_assoc(
        &mut self,
        next: fn(&mut Self) -> Option<NodeId>,
        accepts: fn(TokenKind) -> bool,
    ) -> Option<NodeId> {
        let mut lhs = next(self)?;
        while accepts(self.peek_kind()) {
            let op = self.bump();
            next(self)?;
            let mark = self.start_of(lhs);
            lhs = self.finish_node(NodeKind::BinaryExpr, op, mark);
        }
        Some(lhs)
    }

    fn parse_or(&mut self) -> Option<NodeId> {
        self.parse_left_assoc(Self::parse_and, |k| k == TokenKind::PipePipe)
    }

    fn parse_and(&mut self) -> Option<NodeId> {
        self.parse_left_assoc(Self::parse_cmp, |k| k == TokenKind::AmpAmp)
    }

    /// Relational chain: one comparator makes an ordinary `BinaryExpr`,
    /// two or more collapse into a single `CompareChain` over all operands.
    fn parse_cmp(&mut self) -> Option<NodeId> {
        let first = self.parse_bitor()?;
        let mut operands = 1u32;
        let mut first_op = None;
        while is_comparison(self.peek_kind()) {
            let op = self.bump();
            first_op.get_or_insert(op);
            self.parse_bitor()?;
            operands += 1;
        }
        match operands {
            1 => Some(first),
            2 => {
                let op = first_op.expect("comparison has an operator");
                let mark = self.start_of(first);
                Some(self.finish_node(NodeKind::BinaryExpr, op, mark))
            }
            _ => {
                let op = first_op.expect("chain has an operator");
                let mark = self.start_of(first);
                Some(self.finish_node(NodeKind::CompareChain, op, mark))
            }
        }
    }

    fn parse_bitor(&mut self) -> Option<NodeId> {
        self.parse_left_assoc(Self::parse_bitxor, |k| k == TokenKind::Pipe)
    }

    fn parse_bitxor(&mut self) -> Option<NodeId> {
        self.parse_left_assoc(Self::parse_bitand, |k| k == TokenKind::Caret)
    }

    fn parse_bitand(&mut self) -> Option<NodeId> {
        self.parse_left_assoc(Self::parse_shift, |k| k == TokenKind::Amp)
    }

    fn parse_shift(&mut self) -> Option<NodeId> {
        self.parse_left_assoc(Self::parse_add, |k| {
            matches!(k, TokenKind::Shl | TokenKind::Shr | TokenKind::ShrUnsigned)
        })
    }

    fn parse_add(&mut self) -> Option<NodeId> {
        self.parse_left_assoc(Self::parse_mul, |k| {
            matches!(k, TokenKind::Plus | TokenKind::Minus)
        })
    }

    fn parse_mul(&mut self) -> Option<NodeId> {
        self.parse_left_assoc(Self::parse_unary, |k| {
            matches!(
                k,
                TokenKind::Star | TokenKind::Slash | TokenKind::Percent | TokenKind::PercentPercent
            )
        })
    }

    fn parse_unary(&mut self) -> Option<NodeId> {
        match self.peek_kind() {
            TokenKind::Minus | TokenKind::Tilde => {
                let op = self.bump();
                let mark = self.nodes.count();
                self.parse_unary()?;
                Some(self.finish_node(NodeKind::UnaryExpr, op, mark))
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Option<NodeId> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek_kind() {
                TokenKind::Dot => {
                    self.bump();
                    let field = self.expect_ident("a field name")?;
                    let mark = self.start_of(expr);
                    expr = self.finish_node(NodeKind::FieldAccess, field, mark);
                }
                TokenKind::LBracket => {
                    let bracket = self.bump();
                    self.parse_expr()?;
                    self.expect(TokenKind::RBracket, "`]`")?;
                    let mark = self.start_of(expr);
                    expr = self.finish_node(NodeKind::IndexAccess, bracket, mark);
                }
                TokenKind::LParen => {
                    let paren = self.bump();
                    while self.peek_kind() != TokenKind::RParen {
                        self.parse_expr()?;
                        if self.peek_kind() == TokenKind::Comma {
                            self.bump();
                        } else {
                            break;
                        }
                    }
                    self.expect(TokenKind::RParen, "`)`")?;
                    let mark = self.start_of(expr);
                    expr = self.finish_node(NodeKind::FuncCall, paren, mark);
                }
                _ => break,
            }
        }
        Some(expr)
    }

    fn parse_primary(&mut self) -> Option<NodeId> {
        match self.peek_kind() {
            TokenKind::IntLiteral(_) => {
                let tok = self.bump();
                Some(self.nodes.add(NodeKind::IntLiteral, tok, 1))
            }
            TokenKind::FloatLiteral(_) => {
                let tok = self.bump();
                Some(self.nodes.add(NodeKind::FloatLiteral, tok, 1))
            }
            TokenKind::Ident(_) => {
                let tok = self.bump();
                Some(self.nodes.add(NodeKind::Identifier, tok, 1))
            }
            TokenKind::LParen => {
                let paren = self.bump();
                let mark = self.nodes.count();
                self.parse_expr()?;
                self.expect(TokenKind::RParen, "`)`")?;
                Some(self.finish_node(NodeKind::ParenExpr, paren, mark))
            }
            TokenKind::LBracket => {
                let bracket = self.bump();
                let mark = self.nodes.count();
                while self.peek_kind() != TokenKind::RBracket {
                    self.parse_expr()?;
                    if self.peek_kind() == TokenKind::Comma {
                        self.bump();
                    } else {
                        break;
                    }
                }
                self.expect(TokenKind::RBracket, "`]`")?;
                Some(self.finish_node(NodeKind::ListLiteral, bracket, mark))
            }
            _ => {
                if self.at_line_end() {
                    let diag = self.diag_here(DiagCode::UnexpectedEndOfLine);
                    self.diags.push(diag);
                } else {
                    let found = self.peek_kind().describe();
                    let diag = self
                        .diag_here(DiagCode::ExpectedToken)
                        .with_arg("expected", "an expression")
                        .with_arg("found", found);
                    self.diags.push(diag);
                }
                None
            }
        }
    }
}

fn is_comparison(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Lt
            | TokenKind::Gt
            | TokenKind::LtEq
            | TokenKind::GtEq
            | TokenKind::EqEq
            | TokenKind::NotEq
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use twine_lexer::{tokenize, IndentMode};

    fn parse_source(source: &str) -> (Parse, Diagnostics) {
        let mut interner = StringInterner::new();
        let mut diags = Diagnostics::new();
        let lexed = tokenize(source, IndentMode::Detect, &mut interner, &mut diags);
        let parse = parse(&lexed.tokens, &interner, &mut diags);
        (parse, diags)
    }

    fn stmt_kinds(parse: &Parse) -> Vec<NodeKind> {
        parse
            .stmts
            .iter()
            .map(|s| parse.nodes.get(s.node).kind)
            .collect()
    }

    #[test]
    fn binding_with_initializer() {
        let (parse, diags) = parse_source("x: i32 = 1 + 2");
        assert!(!diags.has_errors(), "got {:?}", diags.codes());
        assert_eq!(stmt_kinds(&parse), vec![NodeKind::Binding]);

        let root = parse.stmts[0].node;
        let kids = parse.nodes.children_lr(root);
        assert_eq!(kids.len(), 2);
        assert_eq!(parse.nodes.get(kids[0]).kind, NodeKind::PrimType);
        assert_eq!(parse.nodes.get(kids[1]).kind, NodeKind::BinaryExpr);
    }

    #[test]
    fn postorder_sizes_are_consistent() {
        let (parse, diags) = parse_source("x: i32 = (1 + 2) * f(3, 4)");
        assert!(!diags.has_errors(), "got {:?}", diags.codes());
        // Every node's subtree size is 1 + the sum of its children's.
        for i in 0..parse.nodes.count() {
            let id = twine_common::ids::NodeId::new(i);
            let children_sum: u32 = parse
                .nodes
                .children(id)
                .map(|c| parse.nodes.get(c).subtree_size)
                .sum();
            assert_eq!(parse.nodes.get(id).subtree_size, children_sum + 1);
        }
        // The statement subtree covers the whole store.
        let root = parse.stmts[0].node;
        assert_eq!(parse.nodes.get(root).subtree_size as usize, parse.nodes.count());
    }

    #[test]
    fn type_decl_header_and_fields() {
        let (parse, diags) = parse_source("Point:\n\tx: i32\n\ty: i32");
        assert!(!diags.has_errors(), "got {:?}", diags.codes());
        assert_eq!(
            stmt_kinds(&parse),
            vec![NodeKind::TypeDecl, NodeKind::Binding, NodeKind::Binding]
        );
        assert_eq!(parse.stmts[0].level, 0);
        assert_eq!(parse.stmts[1].level, 1);
    }

    #[test]
    fn uppercase_name_with_type_is_a_binding() {
        let (parse, diags) = parse_source("Total: i32 = 5");
        assert!(!diags.has_errors());
        assert_eq!(stmt_kinds(&parse), vec![NodeKind::Binding]);
    }

    #[test]
    fn assignment_statement() {
        let (parse, diags) = parse_source("x = 5");
        assert!(!diags.has_errors());
        assert_eq!(stmt_kinds(&parse), vec![NodeKind::Assign]);
    }

    #[test]
    fn lambda_definition_shape() {
        let (parse, diags) = parse_source("add = (a: i32, b: i32): i32 -> a + b");
        assert!(!diags.has_errors(), "got {:?}", diags.codes());
        assert_eq!(stmt_kinds(&parse), vec![NodeKind::FuncDef]);

        let root = parse.stmts[0].node;
        let kids = parse.nodes.children_lr(root);
        assert_eq!(kids.len(), 4); // two params, return type, body
        assert_eq!(parse.nodes.get(kids[0]).kind, NodeKind::Param);
        assert_eq!(parse.nodes.get(kids[1]).kind, NodeKind::Param);
        assert_eq!(parse.nodes.get(kids[2]).kind, NodeKind::PrimType);
        assert_eq!(parse.nodes.get(kids[3]).kind, NodeKind::BinaryExpr);
    }

    #[test]
    fn zero_parameter_lambda() {
        let (parse, diags) = parse_source("five = (): i32 -> 5");
        assert!(!diags.has_errors(), "got {:?}", diags.codes());
        let root = parse.stmts[0].node;
        let kids = parse.nodes.children_lr(root);
        assert_eq!(kids.len(), 2); // return type, body
    }

    #[test]
    fn parenthesized_value_is_assignment_not_lambda() {
        let (parse, diags) = parse_source("x = (1 + 2)");
        assert!(!diags.has_errors());
        assert_eq!(stmt_kinds(&parse), vec![NodeKind::Assign]);
    }

    #[test]
    fn forward_declaration_type() {
        let (parse, diags) = parse_source("add: (i32, i32) -> i32");
        assert!(!diags.has_errors(), "got {:?}", diags.codes());
        let root = parse.stmts[0].node;
        let kids = parse.nodes.children_lr(root);
        assert_eq!(kids.len(), 1);
        assert_eq!(parse.nodes.get(kids[0]).kind, NodeKind::FuncType);
        let fkids = parse.nodes.children_lr(kids[0]);
        assert_eq!(fkids.len(), 3); // two params + return
    }

    #[test]
    fn refined_type_bounds() {
        let (parse, diags) = parse_source("y: i32<min=-5, max=100> = 0");
        assert!(!diags.has_errors(), "got {:?}", diags.codes());
        let root = parse.stmts[0].node;
        let kids = parse.nodes.children_lr(root);
        assert_eq!(parse.nodes.get(kids[0]).kind, NodeKind::RefinedType);
        let rkids = parse.nodes.children_lr(kids[0]);
        assert_eq!(rkids.len(), 3); // base, min, max
        assert_eq!(parse.nodes.get(rkids[0]).kind, NodeKind::PrimType);
        assert_eq!(parse.nodes.get(rkids[1]).kind, NodeKind::MinBound);
        assert_eq!(parse.nodes.get(rkids[2]).kind, NodeKind::MaxBound);
        // The min bound wraps a negated literal.
        let min_kids = parse.nodes.children_lr(rkids[1]);
        assert_eq!(parse.nodes.get(min_kids[0]).kind, NodeKind::UnaryExpr);
    }

    #[test]
    fn list_type_and_literal() {
        let (parse, diags) = parse_source("xs: i32[3] = [1, 2, 3]");
        assert!(!diags.has_errors(), "got {:?}", diags.codes());
        let root = parse.stmts[0].node;
        let kids = parse.nodes.children_lr(root);
        assert_eq!(parse.nodes.get(kids[0]).kind, NodeKind::ListType);
        assert_eq!(parse.nodes.get(kids[1]).kind, NodeKind::ListLiteral);
        assert_eq!(parse.nodes.children_lr(kids[1]).len(), 3);
    }

    #[test]
    fn match_binding_and_arms() {
        let (parse, diags) = parse_source("r: i32 = match k\n\t0 -> 10\n\t1 | 2 -> 20\n\t_ -> 0");
        assert!(!diags.has_errors(), "got {:?}", diags.codes());
        assert_eq!(
            stmt_kinds(&parse),
            vec![
                NodeKind::Binding,
                NodeKind::MatchArm,
                NodeKind::MatchArm,
                NodeKind::MatchArm,
            ]
        );
        // The binding's initializer is a MatchExpr.
        let root = parse.stmts[0].node;
        let kids = parse.nodes.children_lr(root);
        assert_eq!(parse.nodes.get(kids[1]).kind, NodeKind::MatchExpr);
        // The second arm's pattern is an or-pattern of two literals.
        let arm = parse.stmts[2].node;
        let akids = parse.nodes.children_lr(arm);
        assert_eq!(parse.nodes.get(akids[0]).kind, NodeKind::OrPattern);
        assert_eq!(parse.nodes.children_lr(akids[0]).len(), 2);
    }

    #[test]
    fn compare_chain_collapses_operands() {
        let (parse, diags) = parse_source("c: i32 = 1 < 2");
        assert!(!diags.has_errors());
        let root = parse.stmts[0].node;
        let kids = parse.nodes.children_lr(root);
        assert_eq!(parse.nodes.get(kids[1]).kind, NodeKind::BinaryExpr);

        let (parse, diags) = parse_source("c: i32 = 1 < 2 <= 3");
        assert!(!diags.has_errors());
        let root = parse.stmts[0].node;
        let kids = parse.nodes.children_lr(root);
        assert_eq!(parse.nodes.get(kids[1]).kind, NodeKind::CompareChain);
        assert_eq!(parse.nodes.children_lr(kids[1]).len(), 3);
    }

    #[test]
    fn field_and_index_access() {
        let (parse, diags) = parse_source("q: i32 = p.inner.val + xs[1]");
        assert!(!diags.has_errors(), "got {:?}", diags.codes());
        let root = parse.stmts[0].node;
        let kids = parse.nodes.children_lr(root);
        let plus = kids[1];
        let pkids = parse.nodes.children_lr(plus);
        assert_eq!(parse.nodes.get(pkids[0]).kind, NodeKind::FieldAccess);
        assert_eq!(parse.nodes.get(pkids[1]).kind, NodeKind::IndexAccess);
    }

    #[test]
    fn panic_statement() {
        let (parse, diags) = parse_source("panic");
        assert!(!diags.has_errors());
        assert_eq!(stmt_kinds(&parse), vec![NodeKind::Panic]);
    }

    #[test]
    fn error_recovery_skips_to_next_line() {
        let (parse, diags) = parse_source("x: = 5\ny: i32 = 1");
        assert!(diags.has_errors());
        // The bad line is dropped; the good line still parses.
        assert_eq!(stmt_kinds(&parse), vec![NodeKind::Binding]);
        assert_eq!(parse.stmts[0].line, 2);
    }

    #[test]
    fn trailing_garbage_reports_once() {
        let (parse, diags) = parse_source("x: i32 = 1 2");
        assert_eq!(diags.codes(), vec!["TWPARSE001"]);
        assert_eq!(stmt_kinds(&parse), vec![NodeKind::Binding]);
    }

    #[test]
    fn unary_operators_nest() {
        let (parse, diags) = parse_source("x: i32 = ~-1");
        assert!(!diags.has_errors());
        let root = parse.stmts[0].node;
        let kids = parse.nodes.children_lr(root);
        assert_eq!(parse.nodes.get(kids[1]).kind, NodeKind::UnaryExpr);
        let inner = parse.nodes.children_lr(kids[1]);
        assert_eq!(parse.nodes.get(inner[0]).kind, NodeKind::UnaryExpr);
    }
}
