//! Token model for C/AL.
//!
//! `TokenKind` covers both surface syntaxes of the language: the declarative
//! object syntax (sections, field records) and the procedural code syntax
//! (BEGIN/END blocks). Keywords are recognized ASCII-case-insensitively after
//! identifier scan; the stored token value always preserves original casing.

use serde::Serialize;

/// Source position of a token: 1-based line/column plus byte offsets into the
/// source buffer (`end` exclusive). Editor-protocol 0-based conversion happens
/// at the diagnostics boundary, never here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub start: u32,
    pub end: u32,
}

impl Position {
    pub fn new(line: u32, column: u32, start: u32, end: u32) -> Self {
        Self {
            line,
            column,
            start,
            end,
        }
    }

    /// Length of the covered source span in code units.
    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// A single token. `value` is the cooked value: string literals exclude the
/// enclosing `'` and collapse the `''` escape, quoted identifiers exclude the
/// enclosing `"`. For every other kind it is the raw lexeme.
///
/// `message` is set only on `Unknown` tokens and is pre-sanitized; the raw
/// content of an unknown token stays in `value` and is internal-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub position: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            value: value.into(),
            position,
            message: None,
        }
    }

    pub fn unknown(value: impl Into<String>, position: Position, message: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Unknown,
            value: value.into(),
            position,
            message: Some(message.into()),
        }
    }

    pub fn eof(position: Position) -> Self {
        Self::new(TokenKind::Eof, "", position)
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

/// All token kinds. Structural tokens first, then operators, then the
/// contiguous keyword block, then literals and specials, then the `__LAST`
/// sentinel used for bounds checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[repr(u16)]
pub enum TokenKind {
    // --- Structural ---
    LeftBrace = 0,
    RightBrace,
    LeftBracket,
    RightBracket,
    LeftParen,
    RightParen,
    Semicolon,
    Comma,
    Colon,
    /// `::` scope qualifier (`Customer::New`).
    DoubleColon,
    Dot,
    /// `..` range operator.
    DotDot,
    /// `@` sequence-number marker (`Name@1000`).
    At,

    // --- Operators ---
    /// `:=`
    Assign,
    /// `+=`
    PlusAssign,
    /// `-=`
    MinusAssign,
    /// `*=`
    MultAssign,
    /// `/=`
    DivAssign,
    Plus,
    Minus,
    Multiply,
    Divide,
    Equal,
    /// `<>`
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,

    // --- Keywords (contiguous; bounds used by `is_keyword`) ---
    Begin,
    End,
    If,
    Then,
    Else,
    Case,
    Of,
    For,
    To,
    Downto,
    Do,
    While,
    Repeat,
    Until,
    With,
    Exit,
    Asserterror,
    And,
    Or,
    Not,
    Xor,
    Div,
    Mod,
    In,
    Var,
    Procedure,
    Function,
    Trigger,
    Event,
    Local,
    Array,
    Object,
    Table,
    Form,
    Page,
    Report,
    Dataport,
    Xmlport,
    Codeunit,
    Menusuite,
    Query,
    /// `OBJECT-PROPERTIES`, merged from three source tokens during scan.
    ObjectProperties,
    Properties,
    Fields,
    Keys,
    FieldGroups,
    Code,
    Controls,
    Actions,
    Elements,
    Dataset,
    RequestPage,
    Labels,
    Rdldata,
    Sections,
    DataItems,
    Menunodes,
    Wordlayout,
    Temporary,
    RunOnClient,
    WithEvents,
    InDataSet,
    SecurityFiltering,
    True,
    False,

    // --- Literals and specials ---
    Identifier,
    /// `"…"` identifier; value excludes the quotes.
    QuotedIdentifier,
    Integer,
    Decimal,
    /// `'…'` literal; value excludes the quotes, `''` collapsed to `'`.
    StringLiteral,
    /// `010196D`
    Date,
    /// `120000T`
    Time,
    /// `010196DT`
    DateTime,
    /// Raw text of a property value or record cell.
    PropertyValue,
    Unknown,
    Eof,

    #[doc(hidden)]
    __LAST,
}

impl TokenKind {
    pub fn is_keyword(self) -> bool {
        (self as u16) >= (TokenKind::Begin as u16) && (self as u16) <= (TokenKind::False as u16)
    }

    /// Section-introducing keywords; these dispatch section parsing and act as
    /// section-layer recovery boundaries.
    pub fn is_section_keyword(self) -> bool {
        token_sets::SECTION_KEYWORDS.contains(self)
    }

    pub fn is_object_kind(self) -> bool {
        token_sets::OBJECT_KINDS.contains(self)
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::Integer
                | TokenKind::Decimal
                | TokenKind::StringLiteral
                | TokenKind::Date
                | TokenKind::Time
                | TokenKind::DateTime
                | TokenKind::True
                | TokenKind::False
        )
    }

    pub fn is_operator(self) -> bool {
        (self as u16) >= (TokenKind::Assign as u16)
            && (self as u16) <= (TokenKind::GreaterOrEqual as u16)
    }
}

/// Sorted keyword table: uppercase spelling → kind. Lookup upcases the
/// candidate on the fly, so no allocation happens per identifier.
static KEYWORDS: &[(&str, TokenKind)] = &[
    ("ACTIONS", TokenKind::Actions),
    ("AND", TokenKind::And),
    ("ARRAY", TokenKind::Array),
    ("ASSERTERROR", TokenKind::Asserterror),
    ("BEGIN", TokenKind::Begin),
    ("CASE", TokenKind::Case),
    ("CODE", TokenKind::Code),
    ("CODEUNIT", TokenKind::Codeunit),
    ("CONTROLS", TokenKind::Controls),
    ("DATAITEMS", TokenKind::DataItems),
    ("DATAPORT", TokenKind::Dataport),
    ("DATASET", TokenKind::Dataset),
    ("DIV", TokenKind::Div),
    ("DO", TokenKind::Do),
    ("DOWNTO", TokenKind::Downto),
    ("ELEMENTS", TokenKind::Elements),
    ("ELSE", TokenKind::Else),
    ("END", TokenKind::End),
    ("EVENT", TokenKind::Event),
    ("EXIT", TokenKind::Exit),
    ("FALSE", TokenKind::False),
    ("FIELDGROUPS", TokenKind::FieldGroups),
    ("FIELDS", TokenKind::Fields),
    ("FOR", TokenKind::For),
    ("FORM", TokenKind::Form),
    ("FUNCTION", TokenKind::Function),
    ("IF", TokenKind::If),
    ("IN", TokenKind::In),
    ("INDATASET", TokenKind::InDataSet),
    ("KEYS", TokenKind::Keys),
    ("LABELS", TokenKind::Labels),
    ("LOCAL", TokenKind::Local),
    ("MENUNODES", TokenKind::Menunodes),
    ("MENUSUITE", TokenKind::Menusuite),
    ("MOD", TokenKind::Mod),
    ("NOT", TokenKind::Not),
    ("OBJECT", TokenKind::Object),
    ("OBJECT-PROPERTIES", TokenKind::ObjectProperties),
    ("OF", TokenKind::Of),
    ("OR", TokenKind::Or),
    ("PAGE", TokenKind::Page),
    ("PROCEDURE", TokenKind::Procedure),
    ("PROPERTIES", TokenKind::Properties),
    ("QUERY", TokenKind::Query),
    ("RDLDATA", TokenKind::Rdldata),
    ("REPEAT", TokenKind::Repeat),
    ("REPORT", TokenKind::Report),
    ("REQUESTPAGE", TokenKind::RequestPage),
    ("RUNONCLIENT", TokenKind::RunOnClient),
    ("SECTIONS", TokenKind::Sections),
    ("SECURITYFILTERING", TokenKind::SecurityFiltering),
    ("TABLE", TokenKind::Table),
    ("TEMPORARY", TokenKind::Temporary),
    ("THEN", TokenKind::Then),
    ("TO", TokenKind::To),
    ("TRIGGER", TokenKind::Trigger),
    ("TRUE", TokenKind::True),
    ("UNTIL", TokenKind::Until),
    ("VAR", TokenKind::Var),
    ("WHILE", TokenKind::While),
    ("WITH", TokenKind::With),
    ("WITHEVENTS", TokenKind::WithEvents),
    ("WORDLAYOUT", TokenKind::Wordlayout),
    ("XMLPORT", TokenKind::Xmlport),
    ("XOR", TokenKind::Xor),
];

fn cmp_ignore_ascii_case(candidate: &str, keyword: &str) -> std::cmp::Ordering {
    let mut a = candidate.bytes().map(|b| b.to_ascii_uppercase());
    let mut b = keyword.bytes();
    loop {
        match (a.next(), b.next()) {
            (Some(x), Some(y)) => match x.cmp(&y) {
                std::cmp::Ordering::Equal => continue,
                other => return other,
            },
            (None, None) => return std::cmp::Ordering::Equal,
            (None, Some(_)) => return std::cmp::Ordering::Less,
            (Some(_), None) => return std::cmp::Ordering::Greater,
        }
    }
}

/// ASCII-case-insensitive exact match against the keyword table. Record-method
/// names like `MODIFY` are deliberately absent: they stay identifiers.
pub fn lookup_keyword(ident: &str) -> Option<TokenKind> {
    KEYWORDS
        .binary_search_by(|(kw, _)| cmp_ignore_ascii_case(ident, kw).reverse())
        .ok()
        .map(|i| KEYWORDS[i].1)
}

/// Const bitset of `TokenKind`s for O(1) membership testing. Four words cover
/// every discriminant below `__LAST`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TokenSet([u64; 4]);

impl TokenSet {
    pub const EMPTY: TokenSet = TokenSet([0; 4]);

    pub const fn new(kinds: &[TokenKind]) -> Self {
        let mut bits = [0u64; 4];
        let mut i = 0;
        while i < kinds.len() {
            let kind = kinds[i] as u16;
            assert!(kind < 256, "TokenKind value exceeds TokenSet capacity");
            bits[(kind / 64) as usize] |= 1 << (kind % 64);
            i += 1;
        }
        TokenSet(bits)
    }

    pub const fn single(kind: TokenKind) -> Self {
        Self::new(&[kind])
    }

    pub const fn contains(&self, kind: TokenKind) -> bool {
        let kind = kind as u16;
        if kind >= 256 {
            return false;
        }
        self.0[(kind / 64) as usize] & (1 << (kind % 64)) != 0
    }

    pub const fn union(self, other: TokenSet) -> TokenSet {
        TokenSet([
            self.0[0] | other.0[0],
            self.0[1] | other.0[1],
            self.0[2] | other.0[2],
            self.0[3] | other.0[3],
        ])
    }
}

impl std::fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut list = f.debug_set();
        let mut i = 0u16;
        while i < TokenKind::__LAST as u16 {
            let kind = TokenKind::from_raw(i);
            if self.contains(kind) {
                list.entry(&kind);
            }
            i += 1;
        }
        list.finish()
    }
}

impl TokenKind {
    /// Inverse of the `repr(u16)` discriminant. Panics on out-of-range input.
    pub(crate) fn from_raw(raw: u16) -> TokenKind {
        assert!(raw < TokenKind::__LAST as u16);
        // SAFETY: bounds-checked above, and TokenKind is repr(u16) with
        // discriminants 0..__LAST.
        unsafe { std::mem::transmute::<u16, TokenKind>(raw) }
    }
}

/// Pre-defined token sets: the parser's boundary layers and FIRST sets.
pub mod token_sets {
    use super::TokenKind::*;
    use super::TokenSet;

    /// Declaration-layer boundary: recovery never crosses these into the next
    /// procedure, trigger, or event.
    pub const DECLARATION_BOUNDARY: TokenSet =
        TokenSet::new(&[Procedure, Function, Trigger, Event, Var, Local]);

    /// Section-layer boundary.
    pub const SECTION_KEYWORDS: TokenSet = TokenSet::new(&[
        ObjectProperties,
        Properties,
        Fields,
        Keys,
        FieldGroups,
        Code,
        Controls,
        Actions,
        Elements,
        Dataset,
        RequestPage,
        Labels,
        Rdldata,
        Sections,
        DataItems,
        Menunodes,
        Wordlayout,
    ]);

    /// Statement-layer boundary. `Else` only acts as one inside IF/CASE; the
    /// parser checks that context before honoring it.
    pub const STATEMENT_BOUNDARY: TokenSet = TokenSet::new(&[Semicolon, End, Until, Else]);

    pub const OBJECT_KINDS: TokenSet = TokenSet::new(&[
        Table, Codeunit, Page, Report, Query, Xmlport, Menusuite, Form, Dataport,
    ]);

    pub const EXPR_FIRST: TokenSet = TokenSet::new(&[
        Identifier,
        QuotedIdentifier,
        Integer,
        Decimal,
        StringLiteral,
        Date,
        Time,
        DateTime,
        True,
        False,
        LeftParen,
        LeftBracket,
        Plus,
        Minus,
        Not,
    ]);

    pub const STATEMENT_FIRST: TokenSet = EXPR_FIRST.union(TokenSet::new(&[
        Begin,
        If,
        Case,
        For,
        While,
        Repeat,
        With,
        Exit,
        Asserterror,
    ]));

    /// Tokens that cannot start an expression; seeing one right after `..`
    /// produces the expected-range-expression error.
    pub const RANGE_BLOCKERS: TokenSet =
        TokenSet::new(&[RightParen, Comma, Colon, End, Semicolon, RightBracket]);

    pub const ASSIGNMENT_OPS: TokenSet =
        TokenSet::new(&[Assign, PlusAssign, MinusAssign, MultAssign, DivAssign]);

    /// Comparison operators (single precedence tier).
    pub const COMPARISON_OPS: TokenSet = TokenSet::new(&[
        Equal,
        NotEqual,
        Less,
        LessOrEqual,
        Greater,
        GreaterOrEqual,
        In,
    ]);

    pub const ADDITIVE_OPS: TokenSet = TokenSet::new(&[Plus, Minus]);
    pub const MULTIPLICATIVE_OPS: TokenSet = TokenSet::new(&[Multiply, Divide, Div, Mod]);
}
