//! Twine lexer: source text to tokens under the indentation discipline.
//!
//! The lexer is line-oriented. Each non-blank line is classified
//! (leading-whitespace run, indentation level), synthetic `Indent`/`Dedent`
//! tokens are emitted for level changes, and the line's content is scanned
//! into lexical tokens. Comments are `#`-delimited: a `#` opens a comment
//! that runs to the next `#` on the line or to end of line, so code and
//! comment segments alternate.
//!
//! Malformed indentation produces diagnostics but never stops the lexer;
//! the token stream is always completed, with enough synthetic dedents at
//! end of file to return to level zero.

mod cursor;
mod indent;

pub use indent::IndentKind;

use cursor::Cursor;
use indent::{analyze_leading, LeadingRun};
use twine_common::diag::{DiagCode, Diagnostic, Diagnostics};
use twine_common::intern::StringInterner;
use twine_common::token::{keyword_from_str, Token, TokenKind, TokenList};

/// How the file-wide indentation character is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndentMode {
    /// The first indented line fixes the file-wide indentation character.
    Detect,
    /// Tabs by default; a leading `"use spaces"` line switches the file to
    /// spaces, applying retroactively to the lines before it.
    Directive,
}

/// Outcome of tokenization. `succeeded` means no errors were added to the
/// diagnostic sink while lexing.
pub struct LexResult {
    pub tokens: TokenList,
    pub succeeded: bool,
}

/// Tokenize the entire source.
///
/// Tokens land in the returned store; problems land in `diags`. A leading
/// UTF-8 BOM is stripped before any other processing.
pub fn tokenize(
    source: &str,
    mode: IndentMode,
    interner: &mut StringInterner,
    diags: &mut Diagnostics,
) -> LexResult {
    let errors_before = diags.error_count();
    let lexer = Lexer::new(mode, interner, diags);
    let tokens = lexer.run(source);
    LexResult {
        succeeded: diags.error_count() == errors_before,
        tokens,
    }
}

struct Lexer<'a> {
    interner: &'a mut StringInterner,
    diags: &'a mut Diagnostics,
    tokens: TokenList,
    mode: IndentMode,
    /// File-wide indentation character, once established.
    kind: Option<IndentKind>,
    /// Space-mode indentation unit (spaces per level), once established.
    unit: Option<u32>,
    /// Current indentation level.
    level: u32,
    /// Raw indent count of the previous non-blank line (space mode).
    prev_count: u32,
}

impl<'a> Lexer<'a> {
    fn new(mode: IndentMode, interner: &'a mut StringInterner, diags: &'a mut Diagnostics) -> Self {
        Self {
            interner,
            diags,
            tokens: TokenList::new(),
            mode,
            kind: None,
            unit: None,
            level: 0,
            prev_count: 0,
        }
    }

    fn run(mut self, source: &str) -> TokenList {
        let source = source.strip_prefix('\u{feff}').unwrap_or(source);

        // Directive mode defaults to tabs. If a `use spaces` line exists,
        // it switches the whole file to spaces: earlier lines are buffered
        // by this prescan and thus processed under the directive's type.
        let mut directive_line = None;
        if self.mode == IndentMode::Directive {
            self.kind = Some(IndentKind::Tab);
            for (i, raw) in source.split('\n').enumerate() {
                if is_directive_line(trim_line_ending(raw)) {
                    directive_line = Some(i);
                    self.kind = Some(IndentKind::Space);
                    break;
                }
            }
        }

        let mut last_line = 1u32;
        for (i, raw) in source.split('\n').enumerate() {
            let line_no = (i + 1) as u32;
            last_line = line_no;
            if directive_line == Some(i) {
                continue;
            }
            self.lex_line(trim_line_ending(raw), line_no);
        }

        // Close all open levels, then finish the stream.
        while self.level > 0 {
            self.level -= 1;
            self.tokens
                .add(Token::new(TokenKind::Dedent(self.level), last_line, 1));
        }
        self.tokens.add(Token::new(TokenKind::Eof, last_line, 1));
        self.tokens
    }

    // ── Per-line processing ────────────────────────────────────────────

    fn lex_line(&mut self, line: &str, line_no: u32) {
        let run = analyze_leading(line);
        // The run is all ASCII, so its char count equals its byte count.
        let content = &line[run.len() as usize..];
        if line_is_blank(content) {
            // Blank and comment-only lines are invisible to indentation.
            return;
        }

        let count = self.indent_count(&run, line_no);
        let level = self.level_for(count, line_no);
        let level_changed = level != self.level;
        self.emit_indentation(level, line_no);

        let had_content = self.scan_content(line, run.len(), line_no);
        if had_content || level_changed {
            let col = line.chars().count() as u32 + 1;
            self.tokens.add(Token::new(TokenKind::Newline, line_no, col));
        }
    }

    /// Validate the leading run and return the effective indent count
    /// (characters of the file-wide kind).
    fn indent_count(&mut self, run: &LeadingRun, line_no: u32) -> u32 {
        if run.is_empty() {
            return 0;
        }
        let first = run.first.expect("non-empty run has a first kind");

        if run.is_mixed() {
            let column = run.mixed_column.expect("mixed run has an offender");
            self.diags
                .push(Diagnostic::new(DiagCode::MixedIndentation, line_no, column));
        }

        // Establish the file-wide kind on the first indented line (detect
        // mode). A mixed run contributes its dominant kind.
        let file_kind = match self.kind {
            Some(k) => k,
            None => {
                let k = if run.is_mixed() {
                    run.dominant().expect("non-empty run has a dominant kind")
                } else {
                    first
                };
                self.kind = Some(k);
                k
            }
        };

        if first != file_kind {
            self.diags.push(
                Diagnostic::new(DiagCode::IndentTypeMismatch, line_no, 1)
                    .with_arg("found", first.name())
                    .with_arg("expected", file_kind.name()),
            );
        }

        match file_kind {
            IndentKind::Tab => run.tabs,
            IndentKind::Space => run.spaces,
        }
    }

    /// Convert an indent count to a level, enforcing the space-unit rules.
    fn level_for(&mut self, count: u32, line_no: u32) -> u32 {
        match self.kind {
            Some(IndentKind::Space) => self.space_level(count, line_no),
            // Tab mode (or no indentation seen yet): one tab per level.
            _ => count,
        }
    }

    fn space_level(&mut self, count: u32, line_no: u32) -> u32 {
        let prev = self.prev_count;
        self.prev_count = count;
        if count == 0 {
            return 0;
        }

        // The first positive delta between successive non-blank lines
        // defines the file's indentation unit.
        let unit = match self.unit {
            Some(u) => u,
            None => {
                let u = if count > prev { count - prev } else { count };
                self.unit = Some(u);
                u
            }
        };

        if count > prev && count - prev != unit {
            self.diags.push(
                Diagnostic::new(DiagCode::InconsistentSpaceUnit, line_no, prev + 1)
                    .with_arg("count", count.to_string())
                    .with_arg("unit", unit.to_string()),
            );
        } else if count < prev && count % unit != 0 {
            let valid: Vec<String> = (0..prev).step_by(unit as usize).map(|v| v.to_string()).collect();
            self.diags.push(
                Diagnostic::new(DiagCode::MisalignedDedent, line_no, 1)
                    .with_arg("count", count.to_string())
                    .with_arg("valid", valid.join(", ")),
            );
        }

        count / unit
    }

    /// Emit synthetic tokens to move from the current level to `target`.
    ///
    /// Levels move one token at a time in both directions, so indent and
    /// dedent emissions pair up and the stream stays balanced through EOF.
    fn emit_indentation(&mut self, target: u32, line_no: u32) {
        if target > self.level {
            if target > self.level + 1 {
                self.diags.push(
                    Diagnostic::new(DiagCode::IndentJump, line_no, self.jump_column())
                        .with_arg("from", self.level.to_string())
                        .with_arg("to", target.to_string()),
                );
            }
            for l in self.level + 1..=target {
                let col = match self.kind {
                    Some(IndentKind::Space) => (l - 1) * self.unit.unwrap_or(1) + 1,
                    _ => l,
                };
                self.tokens
                    .add(Token::new(TokenKind::Indent(l), line_no, col));
            }
        } else if target < self.level {
            let mut l = self.level;
            while l > target {
                l -= 1;
                self.tokens.add(Token::new(TokenKind::Dedent(l), line_no, 1));
            }
        }
        self.level = target;
    }

    /// Column of the first indentation character beyond the permitted
    /// one-level increase.
    fn jump_column(&self) -> u32 {
        match self.kind {
            Some(IndentKind::Space) => (self.level + 1) * self.unit.unwrap_or(1) + 1,
            _ => self.level + 2,
        }
    }

    // ── Content scanning ───────────────────────────────────────────────

    /// Scan one line's content into tokens. Returns whether any token was
    /// produced (comment-only tails produce none).
    fn scan_content(&mut self, line: &str, skip: u32, line_no: u32) -> bool {
        let mut cursor = Cursor::new(line);
        for _ in 0..skip {
            cursor.advance();
        }

        let mut had_content = false;
        loop {
            cursor.eat_while(|c| c == ' ' || c == '\t');
            let Some(c) = cursor.peek() else { break };
            if c == '#' {
                // Comment runs to the next `#` or end of line; code and
                // comment segments alternate.
                cursor.advance();
                cursor.eat_while(|c| c != '#');
                cursor.advance();
                continue;
            }
            had_content = true;
            self.scan_token(&mut cursor, c, line_no);
        }
        had_content
    }

    fn scan_token(&mut self, cursor: &mut Cursor<'_>, c: char, line_no: u32) {
        let column = cursor.column();
        let kind = match c {
            '0'..='9' => self.scan_number(cursor),
            c if is_ident_start(c) => self.scan_ident(cursor),
            ':' => self.single(cursor, TokenKind::Colon),
            ',' => self.single(cursor, TokenKind::Comma),
            '.' => self.single(cursor, TokenKind::Dot),
            '(' => self.single(cursor, TokenKind::LParen),
            ')' => self.single(cursor, TokenKind::RParen),
            '[' => self.single(cursor, TokenKind::LBracket),
            ']' => self.single(cursor, TokenKind::RBracket),
            '+' => self.single(cursor, TokenKind::Plus),
            '*' => self.single(cursor, TokenKind::Star),
            '/' => self.single(cursor, TokenKind::Slash),
            '^' => self.single(cursor, TokenKind::Caret),
            '~' => self.single(cursor, TokenKind::Tilde),
            '=' => self.one_or_two(cursor, '=', TokenKind::EqEq, TokenKind::Eq),
            '-' => self.one_or_two(cursor, '>', TokenKind::Arrow, TokenKind::Minus),
            '%' => self.one_or_two(cursor, '%', TokenKind::PercentPercent, TokenKind::Percent),
            '&' => self.one_or_two(cursor, '&', TokenKind::AmpAmp, TokenKind::Amp),
            '|' => self.one_or_two(cursor, '|', TokenKind::PipePipe, TokenKind::Pipe),
            '<' => self.scan_lt(cursor),
            '>' => self.scan_gt(cursor),
            '!' => self.one_or_two(cursor, '=', TokenKind::NotEq, TokenKind::Error),
            _ => self.single(cursor, TokenKind::Error),
        };
        self.tokens.add(Token::new(kind, line_no, column));
    }

    fn single(&mut self, cursor: &mut Cursor<'_>, kind: TokenKind) -> TokenKind {
        cursor.advance();
        kind
    }

    /// Consume one character, then `second` if it follows, picking between
    /// the two-character and one-character token kinds.
    fn one_or_two(
        &mut self,
        cursor: &mut Cursor<'_>,
        second: char,
        two: TokenKind,
        one: TokenKind,
    ) -> TokenKind {
        cursor.advance();
        if cursor.peek() == Some(second) {
            cursor.advance();
            two
        } else {
            one
        }
    }

    /// `<` -> `Lt`, `<=` -> `LtEq`, `<<` -> `Shl`
    fn scan_lt(&mut self, cursor: &mut Cursor<'_>) -> TokenKind {
        cursor.advance();
        match cursor.peek() {
            Some('<') => {
                cursor.advance();
                TokenKind::Shl
            }
            Some('=') => {
                cursor.advance();
                TokenKind::LtEq
            }
            _ => TokenKind::Lt,
        }
    }

    /// `>` -> `Gt`, `>=` -> `GtEq`, `>>` -> `Shr`, `>>>` -> `ShrUnsigned`
    fn scan_gt(&mut self, cursor: &mut Cursor<'_>) -> TokenKind {
        cursor.advance();
        match cursor.peek() {
            Some('>') => {
                cursor.advance();
                if cursor.peek() == Some('>') {
                    cursor.advance();
                    TokenKind::ShrUnsigned
                } else {
                    TokenKind::Shr
                }
            }
            Some('=') => {
                cursor.advance();
                TokenKind::GtEq
            }
            _ => TokenKind::Gt,
        }
    }

    /// Scan a number literal. A decimal point makes it a float; an exponent
    /// alone does not change the classification.
    fn scan_number(&mut self, cursor: &mut Cursor<'_>) -> TokenKind {
        let start = cursor.byte_pos();
        cursor.eat_while(|c| c.is_ascii_digit());

        let mut is_float = false;
        if cursor.peek() == Some('.') && cursor.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            cursor.advance();
            cursor.eat_while(|c| c.is_ascii_digit());
        }

        // Exponent: `e`/`E`, optional sign, digits. Only consumed when the
        // digits actually follow, so `1e` stays an int followed by an ident.
        if matches!(cursor.peek(), Some('e' | 'E')) {
            let has_digits = match cursor.peek_next() {
                Some(d) if d.is_ascii_digit() => true,
                Some('+' | '-') => cursor.peek_nth(2).is_some_and(|d| d.is_ascii_digit()),
                _ => false,
            };
            if has_digits {
                cursor.advance();
                if matches!(cursor.peek(), Some('+' | '-')) {
                    cursor.advance();
                }
                cursor.eat_while(|c| c.is_ascii_digit());
            }
        }

        let text = cursor.slice(start, cursor.byte_pos());
        let id = self.interner.intern(text);
        if is_float {
            TokenKind::FloatLiteral(id)
        } else {
            TokenKind::IntLiteral(id)
        }
    }

    /// Scan an identifier, keyword, or lone underscore.
    fn scan_ident(&mut self, cursor: &mut Cursor<'_>) -> TokenKind {
        let start = cursor.byte_pos();
        cursor.advance();
        cursor.eat_while(is_ident_continue);
        let text = cursor.slice(start, cursor.byte_pos());
        if text == "_" {
            return TokenKind::Underscore;
        }
        match keyword_from_str(text) {
            Some(kind) => kind,
            None => TokenKind::Ident(self.interner.intern(text)),
        }
    }
}

// ── Helpers ────────────────────────────────────────────────────────────

fn trim_line_ending(raw: &str) -> &str {
    raw.strip_suffix('\r').unwrap_or(raw)
}

/// The `use spaces` directive line, quoted either way.
fn is_directive_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed == "\"use spaces\"" || trimmed == "'use spaces'"
}

/// Whether a line's content (leading whitespace already stripped) carries
/// no code: empty, whitespace, or comments only.
fn line_is_blank(content: &str) -> bool {
    // `#` opens a comment ending at the next `#` or end of line, so the
    // even-indexed segments of a `#`-split are code.
    content
        .split('#')
        .step_by(2)
        .all(|segment| segment.trim().is_empty())
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
