//! Diagnostic codes, records, and the per-compilation sink.
//!
//! Every user-facing problem is a [`Diagnostic`]: a code from the fixed
//! catalog, a severity, a 1-indexed location, and interpolation arguments.
//! Message templates live on the code, so a code always renders the same
//! shape of message; `{name}` placeholders are filled from the arguments.
//!
//! Programmer errors (invalid ids, broken parse-tree invariants) are
//! assertions, never diagnostics.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::ids::{NodeId, TokenId};

/// Diagnostic severity. The checking core emits `Error` and `Warning`;
/// `Note` is reserved for secondary labels at the reporting boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// The diagnostic catalog. One variant per code the compiler can emit.
///
/// Lexical codes are `TWLEX*`, parser codes `TWPARSE*`, checking codes
/// `TWCHECK*`. The numbering is part of the compiler's external contract
/// and never changes meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagCode {
    /// TWLEX001: a leading whitespace run mixes tabs and spaces.
    MixedIndentation,
    /// TWLEX002: a space-mode indent step differs from the file's unit.
    InconsistentSpaceUnit,
    /// TWLEX003: a space-mode dedent lands off the unit grid.
    MisalignedDedent,
    /// TWLEX004: indentation jumped more than one level in a single line.
    IndentJump,
    /// TWLEX005: a line indents with the opposite character than the file.
    IndentTypeMismatch,
    /// TWPARSE001: a token that no statement or expression form accepts.
    UnexpectedToken,
    /// TWPARSE002: a specific token was required.
    ExpectedToken,
    /// TWPARSE003: the line ended mid-construct.
    UnexpectedEndOfLine,
    /// TWCHECK010: structural mismatch (declarations, arity, redefinition).
    SignatureMismatch,
    /// TWCHECK012: an expression's type differs from the expected type.
    TypeMismatch,
    /// TWCHECK013: a name that resolves to nothing in scope.
    UnknownName,
    /// TWCHECK014: an integer literal outside its base primitive's range.
    IntOutOfRange,
    /// TWCHECK016: a literal or value of the wrong kind for its context.
    LiteralKindMismatch,
    /// TWCHECK017: a float constant that overflows f32.
    F32Overflow,
    /// TWCHECK018: a literal pattern against a non-integer scrutinee.
    NonIntegerLiteralPattern,
    /// TWCHECK019: a match arm with no enclosing match expression.
    ArmOutsideMatch,
    /// TWCHECK020: a match whose last arm is not a catch-all.
    NonExhaustiveMatch,
    /// TWCHECK021: an integer-only operator applied to non-integers.
    NonIntegerOperand,
    /// TWCHECK022: binary/chain operands of differing types.
    OperandTypeMismatch,
    /// TWCHECK024: a logical operator applied to non-integers.
    NonIntegerLogicalOperand,
    /// TWCHECK027: a record literal missing a declared field.
    MissingRecordField,
    /// TWCHECK028: a record literal naming an undeclared field.
    UnknownRecordField,
    /// TWCHECK029: a field declared or initialized twice.
    DuplicateField,
    /// TWCHECK030: a field access naming no field of the record.
    NoSuchField,
    /// TWCHECK031: a field/index access on a non-record, non-list value.
    InvalidAccessBase,
    /// TWCHECK034: a constant list index outside the list's size.
    IndexOutOfRange,
    /// TWCHECK035: a list index that is not an integer literal.
    NonConstantIndex,
    /// TWCHECK036: a list type declared with a non-positive size.
    NonPositiveListSize,
    /// TWCHECK037: a list literal whose length differs from the type's size.
    ListSizeMismatch,
    /// TWCHECK040: refinement constraints on a non-integer base.
    RefinementOnNonInteger,
    /// TWCHECK041: a constant that violates a refinement bound.
    ConstraintViolation,
}

impl DiagCode {
    /// The stable catalog code, e.g. `"TWCHECK012"`.
    pub fn as_str(self) -> &'static str {
        match self {
            DiagCode::MixedIndentation => "TWLEX001",
            DiagCode::InconsistentSpaceUnit => "TWLEX002",
            DiagCode::MisalignedDedent => "TWLEX003",
            DiagCode::IndentJump => "TWLEX004",
            DiagCode::IndentTypeMismatch => "TWLEX005",
            DiagCode::UnexpectedToken => "TWPARSE001",
            DiagCode::ExpectedToken => "TWPARSE002",
            DiagCode::UnexpectedEndOfLine => "TWPARSE003",
            DiagCode::SignatureMismatch => "TWCHECK010",
            DiagCode::TypeMismatch => "TWCHECK012",
            DiagCode::UnknownName => "TWCHECK013",
            DiagCode::IntOutOfRange => "TWCHECK014",
            DiagCode::LiteralKindMismatch => "TWCHECK016",
            DiagCode::F32Overflow => "TWCHECK017",
            DiagCode::NonIntegerLiteralPattern => "TWCHECK018",
            DiagCode::ArmOutsideMatch => "TWCHECK019",
            DiagCode::NonExhaustiveMatch => "TWCHECK020",
            DiagCode::NonIntegerOperand => "TWCHECK021",
            DiagCode::OperandTypeMismatch => "TWCHECK022",
            DiagCode::NonIntegerLogicalOperand => "TWCHECK024",
            DiagCode::MissingRecordField => "TWCHECK027",
            DiagCode::UnknownRecordField => "TWCHECK028",
            DiagCode::DuplicateField => "TWCHECK029",
            DiagCode::NoSuchField => "TWCHECK030",
            DiagCode::InvalidAccessBase => "TWCHECK031",
            DiagCode::IndexOutOfRange => "TWCHECK034",
            DiagCode::NonConstantIndex => "TWCHECK035",
            DiagCode::NonPositiveListSize => "TWCHECK036",
            DiagCode::ListSizeMismatch => "TWCHECK037",
            DiagCode::RefinementOnNonInteger => "TWCHECK040",
            DiagCode::ConstraintViolation => "TWCHECK041",
        }
    }

    /// The message template. `{name}` placeholders are interpolated from
    /// the diagnostic's arguments.
    pub fn template(self) -> &'static str {
        match self {
            DiagCode::MixedIndentation => "leading whitespace mixes tabs and spaces",
            DiagCode::InconsistentSpaceUnit => {
                "indent of {count} spaces is not one step of {unit} from the previous line"
            }
            DiagCode::MisalignedDedent => {
                "dedent to {count} spaces does not align with any enclosing level"
            }
            DiagCode::IndentJump => "indentation jumps from level {from} to level {to}",
            DiagCode::IndentTypeMismatch => {
                "line indented with {found}s in a file indented with {expected}s"
            }
            DiagCode::UnexpectedToken => "unexpected {found}",
            DiagCode::ExpectedToken => "expected {expected}, found {found}",
            DiagCode::UnexpectedEndOfLine => "unexpected end of line",
            DiagCode::SignatureMismatch => "{detail}",
            DiagCode::TypeMismatch => "expected {expected}, found {found}",
            DiagCode::UnknownName => "unknown name `{name}`",
            DiagCode::IntOutOfRange => "integer literal {value} is out of range for {type}",
            DiagCode::LiteralKindMismatch => "expected {expected}, found {found}",
            DiagCode::F32Overflow => "value {value} overflows {type}",
            DiagCode::NonIntegerLiteralPattern => {
                "literal pattern requires an integer scrutinee, found {type}"
            }
            DiagCode::ArmOutsideMatch => "match arm outside a match expression",
            DiagCode::NonExhaustiveMatch => "match is not exhaustive",
            DiagCode::NonIntegerOperand => {
                "operator {op} requires integer operands, found {type}"
            }
            DiagCode::OperandTypeMismatch => "operand types differ: {left} and {right}",
            DiagCode::NonIntegerLogicalOperand => {
                "logical {op} requires integer operands, found {type}"
            }
            DiagCode::MissingRecordField => "missing field `{field}` of {record}",
            DiagCode::UnknownRecordField => "{record} has no field `{field}`",
            DiagCode::DuplicateField => "duplicate field `{field}`",
            DiagCode::NoSuchField => "no field `{field}` on {type}",
            DiagCode::InvalidAccessBase => "cannot index or access fields of {type}",
            DiagCode::IndexOutOfRange => "index {index} is out of range for {type}",
            DiagCode::NonConstantIndex => "list index must be an integer literal",
            DiagCode::NonPositiveListSize => {
                "list size must be a positive integer, found {size}"
            }
            DiagCode::ListSizeMismatch => {
                "list literal has {found} elements, {type} needs {expected}"
            }
            DiagCode::RefinementOnNonInteger => {
                "refinement constraints require an integer base, found {type}"
            }
            DiagCode::ConstraintViolation => "value {value} violates {bound}={limit}",
        }
    }

    /// Optional help text shown after the excerpt. Interpolated like the
    /// message template.
    pub fn help(self) -> Option<&'static str> {
        match self {
            DiagCode::MixedIndentation => {
                Some("use a single indentation character throughout the file")
            }
            DiagCode::MisalignedDedent => Some("valid dedent columns are {valid}"),
            DiagCode::IndentJump => Some("indent at most one level per line"),
            DiagCode::NonExhaustiveMatch => {
                Some("add a trailing `_` arm or a binding arm to cover remaining values")
            }
            DiagCode::NonConstantIndex => {
                Some("list elements are addressed at compile time; use a literal index")
            }
            _ => None,
        }
    }

    /// Default severity for the code. Every cataloged code is currently an
    /// error; the severity field on [`Diagnostic`] allows the boundary to
    /// downgrade.
    pub fn severity(self) -> Severity {
        Severity::Error
    }
}

impl Serialize for DiagCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Fill `{name}` placeholders in a template from key/value arguments.
///
/// Unknown placeholders are left verbatim so a template typo is visible
/// rather than silently dropped.
pub fn interpolate(template: &str, args: &[(&'static str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let key = &after[..close];
                match args.iter().find(|(k, _)| *k == key) {
                    Some((_, value)) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// A coded, located, argument-interpolated diagnostic.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub code: DiagCode,
    pub severity: Severity,
    pub line: u32,
    pub column: u32,
    pub args: Vec<(&'static str, String)>,
    pub token: Option<TokenId>,
    pub node: Option<NodeId>,
}

impl Diagnostic {
    /// Create a diagnostic at a source location with the code's default
    /// severity.
    pub fn new(code: DiagCode, line: u32, column: u32) -> Self {
        Self {
            code,
            severity: code.severity(),
            line,
            column,
            args: Vec::new(),
            token: None,
            node: None,
        }
    }

    /// Attach an interpolation argument.
    pub fn with_arg(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.args.push((key, value.into()));
        self
    }

    /// Attach the token the diagnostic points at.
    pub fn with_token(mut self, token: TokenId) -> Self {
        self.token = Some(token);
        self
    }

    /// Attach the parse node the diagnostic points at.
    pub fn with_node(mut self, node: NodeId) -> Self {
        self.node = Some(node);
        self
    }

    /// The rendered message: the code's template with arguments filled in.
    pub fn message(&self) -> String {
        interpolate(self.code.template(), &self.args)
    }

    /// The rendered help text, if the code defines one.
    pub fn help(&self) -> Option<String> {
        self.code.help().map(|h| interpolate(h, &self.args))
    }
}

/// The per-compilation diagnostic sink. Order is emission order and is a
/// deterministic function of the input.
#[derive(Debug, Default)]
pub struct Diagnostics {
    diags: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a diagnostic.
    pub fn push(&mut self, diag: Diagnostic) {
        self.diags.push(diag);
    }

    /// All diagnostics in emission order.
    pub fn all(&self) -> &[Diagnostic] {
        &self.diags
    }

    /// Number of diagnostics recorded.
    pub fn len(&self) -> usize {
        self.diags.len()
    }

    /// Whether the sink is empty.
    pub fn is_empty(&self) -> bool {
        self.diags.is_empty()
    }

    /// Number of `Error`-severity diagnostics.
    pub fn error_count(&self) -> usize {
        self.diags
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    /// Whether any `Error`-severity diagnostic accumulated.
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// The catalog codes in emission order. Convenient for tests.
    pub fn codes(&self) -> Vec<&'static str> {
        self.diags.iter().map(|d| d.code.as_str()).collect()
    }
}
