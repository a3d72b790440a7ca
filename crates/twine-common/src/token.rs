use serde::Serialize;

use crate::ids::{StringId, TokenId};
use crate::intern::StringInterner;

/// A token produced by the Twine lexer.
///
/// Locations are 1-indexed; columns count characters from the start of the
/// line. Payloads (indent levels, interned identifier/literal texts) live
/// inside the [`TokenKind`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub line: u32,
    pub column: u32,
}

impl Token {
    /// Create a new token.
    pub fn new(kind: TokenKind, line: u32, column: u32) -> Self {
        Self { kind, line, column }
    }

    /// Character width of the token's source text, for diagnostic spans.
    ///
    /// Synthetic tokens (indentation, newline, EOF) report width 1.
    pub fn width(&self, interner: &StringInterner) -> u32 {
        match self.kind {
            TokenKind::Ident(id) | TokenKind::IntLiteral(id) | TokenKind::FloatLiteral(id) => {
                interner.get(id).chars().count().max(1) as u32
            }
            TokenKind::KwMatch | TokenKind::KwPanic => 5,
            TokenKind::KwI32 | TokenKind::KwI64 | TokenKind::KwF32 | TokenKind::KwF64 => 3,
            TokenKind::ShrUnsigned => 3,
            TokenKind::PercentPercent
            | TokenKind::Shl
            | TokenKind::Shr
            | TokenKind::LtEq
            | TokenKind::GtEq
            | TokenKind::EqEq
            | TokenKind::NotEq
            | TokenKind::AmpAmp
            | TokenKind::PipePipe
            | TokenKind::Arrow => 2,
            _ => 1,
        }
    }
}

/// Every kind of token in the Twine language.
///
/// Structural tokens carry the indentation level they establish; identifier
/// and literal tokens carry their interned text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum TokenKind {
    // ── Structural ─────────────────────────────────────────────────────
    /// Indentation increased to the carried level.
    Indent(u32),
    /// Indentation decreased to the carried level.
    Dedent(u32),
    /// End of a line that had content or changed the indentation level.
    Newline,
    /// End of file.
    Eof,

    // ── Keywords ───────────────────────────────────────────────────────
    KwMatch,
    KwPanic,
    KwI32,
    KwI64,
    KwF32,
    KwF64,

    // ── Identifiers and literals ───────────────────────────────────────
    /// Identifier, e.g. `total`, `Point`.
    Ident(StringId),
    /// Integer literal (no decimal point), e.g. `42`, `1e3`.
    IntLiteral(StringId),
    /// Float literal (with decimal point), e.g. `3.14`, `1.5e-2`.
    FloatLiteral(StringId),
    /// A lone `_`.
    Underscore,

    // ── Punctuation ────────────────────────────────────────────────────
    /// `:`
    Colon,
    /// `=`
    Eq,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,

    // ── Operators ──────────────────────────────────────────────────────
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `%%`
    PercentPercent,
    /// `&`
    Amp,
    /// `|`
    Pipe,
    /// `^`
    Caret,
    /// `~`
    Tilde,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `>>>`
    ShrUnsigned,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    LtEq,
    /// `>=`
    GtEq,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `&&`
    AmpAmp,
    /// `||`
    PipePipe,
    /// `->`
    Arrow,

    /// Invalid/unexpected input. Used for error recovery.
    Error,
}

impl TokenKind {
    /// Human-readable description for diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Indent(_) => "an indent",
            TokenKind::Dedent(_) => "a dedent",
            TokenKind::Newline => "end of line",
            TokenKind::Eof => "end of file",
            TokenKind::KwMatch => "`match`",
            TokenKind::KwPanic => "`panic`",
            TokenKind::KwI32 => "`i32`",
            TokenKind::KwI64 => "`i64`",
            TokenKind::KwF32 => "`f32`",
            TokenKind::KwF64 => "`f64`",
            TokenKind::Ident(_) => "an identifier",
            TokenKind::IntLiteral(_) => "an integer literal",
            TokenKind::FloatLiteral(_) => "a float literal",
            TokenKind::Underscore => "`_`",
            TokenKind::Colon => "`:`",
            TokenKind::Eq => "`=`",
            TokenKind::Comma => "`,`",
            TokenKind::Dot => "`.`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::Plus => "`+`",
            TokenKind::Minus => "`-`",
            TokenKind::Star => "`*`",
            TokenKind::Slash => "`/`",
            TokenKind::Percent => "`%`",
            TokenKind::PercentPercent => "`%%`",
            TokenKind::Amp => "`&`",
            TokenKind::Pipe => "`|`",
            TokenKind::Caret => "`^`",
            TokenKind::Tilde => "`~`",
            TokenKind::Shl => "`<<`",
            TokenKind::Shr => "`>>`",
            TokenKind::ShrUnsigned => "`>>>`",
            TokenKind::Lt => "`<`",
            TokenKind::Gt => "`>`",
            TokenKind::LtEq => "`<=`",
            TokenKind::GtEq => "`>=`",
            TokenKind::EqEq => "`==`",
            TokenKind::NotEq => "`!=`",
            TokenKind::AmpAmp => "`&&`",
            TokenKind::PipePipe => "`||`",
            TokenKind::Arrow => "`->`",
            TokenKind::Error => "invalid input",
        }
    }
}

/// Look up a keyword from its string representation.
///
/// Returns `Some(TokenKind)` if the string is a Twine keyword, `None`
/// otherwise. The lexer calls this after scanning an identifier-shaped
/// token, so keywords and identifiers share a single scan path.
pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
    match s {
        "match" => Some(TokenKind::KwMatch),
        "panic" => Some(TokenKind::KwPanic),
        "i32" => Some(TokenKind::KwI32),
        "i64" => Some(TokenKind::KwI64),
        "f32" => Some(TokenKind::KwF32),
        "f64" => Some(TokenKind::KwF64),
        _ => None,
    }
}

/// The token store: a dense, append-only vector indexed by [`TokenId`].
#[derive(Debug, Default)]
pub struct TokenList {
    tokens: Vec<Token>,
}

impl TokenList {
    /// Create an empty token store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a token, returning its id.
    pub fn add(&mut self, token: Token) -> TokenId {
        let id = TokenId::new(self.tokens.len());
        self.tokens.push(token);
        id
    }

    /// Look up a token by id.
    ///
    /// # Panics
    ///
    /// Panics if the id was not produced by this store.
    pub fn get(&self, id: TokenId) -> &Token {
        &self.tokens[id.index()]
    }

    /// Number of tokens in the store.
    pub fn count(&self) -> usize {
        self.tokens.len()
    }

    /// All tokens in emission order.
    pub fn as_slice(&self) -> &[Token] {
        &self.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_from_str_recognizes_all_keywords() {
        let keywords = [
            ("match", TokenKind::KwMatch),
            ("panic", TokenKind::KwPanic),
            ("i32", TokenKind::KwI32),
            ("i64", TokenKind::KwI64),
            ("f32", TokenKind::KwF32),
            ("f64", TokenKind::KwF64),
        ];
        for (s, expected) in &keywords {
            assert_eq!(keyword_from_str(s), Some(*expected));
        }
    }

    #[test]
    fn keyword_from_str_rejects_non_keywords() {
        assert_eq!(keyword_from_str("foo"), None);
        assert_eq!(keyword_from_str(""), None);
        assert_eq!(keyword_from_str("Match"), None); // case-sensitive
        assert_eq!(keyword_from_str("i16"), None);
    }

    #[test]
    fn token_store_round_trips() {
        let mut tokens = TokenList::new();
        let id = tokens.add(Token::new(TokenKind::Colon, 1, 4));
        assert_eq!(tokens.count(), 1);
        let tok = tokens.get(id);
        assert_eq!(tok.kind, TokenKind::Colon);
        assert_eq!((tok.line, tok.column), (1, 4));
    }

    #[test]
    fn token_width_uses_interned_text() {
        let mut interner = StringInterner::new();
        let id = interner.intern("total");
        let tok = Token::new(TokenKind::Ident(id), 1, 1);
        assert_eq!(tok.width(&interner), 5);
        assert_eq!(Token::new(TokenKind::ShrUnsigned, 1, 1).width(&interner), 3);
        assert_eq!(Token::new(TokenKind::Arrow, 1, 1).width(&interner), 2);
        assert_eq!(Token::new(TokenKind::Colon, 1, 1).width(&interner), 1);
    }
}
