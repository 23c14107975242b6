//! Context-stack lexer for C/AL.
//!
//! The scanner is hand-written because the token stream is a function of
//! state, not just of the input: a `{` is a block-comment opener inside
//! BEGIN…END, a record delimiter inside FIELDS/KEYS/…, and a structural brace
//! everywhere else; property values and record cells are raw text in which
//! `'` and `//` have no lexical meaning. [`context::ContextTracker`] carries
//! that state in parallel with tokenization and validates a clean exit after
//! the scan.
//!
//! The scan never fails. Malformed input produces `Unknown` tokens and
//! clean-exit violations; offsets and line/column bookkeeping stay exact so
//! downstream diagnostics can range correctly.

mod clean_exit;
mod context;
mod trace;

#[cfg(test)]
mod lexer_tests;

pub use clean_exit::{CleanExitReport, CleanExitViolation};
pub use context::{FieldColumn, LexContext};
pub use trace::{TraceCallback, TraceError, TraceOutcome, TraceTicket};

use context::ContextTracker;
use trace::TraceState;

use crate::token::{Position, Token, TokenKind, lookup_keyword};

/// Options for a tokenization session.
#[derive(Default)]
pub struct LexOptions {
    /// Per-token observer; see [`trace`] for the failure contract.
    pub trace: Option<TraceCallback>,
    /// Suppresses only the CONTEXT_UNDERFLOW violation. Report RDLDATA
    /// payloads close more braces than they open; everything else stays
    /// strict.
    pub allow_rdldata_underflow: bool,
}

/// Reusable lexer instance. Each `tokenize` call is an independent session;
/// per-session trace state (disable flag, deferred tickets) resets at entry.
pub struct Lexer {
    trace: TraceState,
    allow_rdldata_underflow: bool,
}

impl Default for Lexer {
    fn default() -> Self {
        Self::new()
    }
}

impl Lexer {
    pub fn new() -> Self {
        Self::with_options(LexOptions::default())
    }

    pub fn with_options(options: LexOptions) -> Self {
        Self {
            trace: TraceState::new(options.trace),
            allow_rdldata_underflow: options.allow_rdldata_underflow,
        }
    }

    /// Scans `source` into tokens plus the clean-exit report. Pure with
    /// respect to the source: identical input yields identical output.
    pub fn tokenize(&mut self, source: &str) -> (Vec<Token>, CleanExitReport) {
        self.trace.begin_session();
        let mut scanner = Scanner::new(source);
        let mut traced = 0;
        loop {
            let more = scanner.step();
            while traced < scanner.tokens.len() {
                self.trace.observe(&scanner.tokens[traced]);
                traced += 1;
            }
            if !more {
                break;
            }
        }
        let report = scanner.finish(self.allow_rdldata_underflow);
        while traced < scanner.tokens.len() {
            self.trace.observe(&scanner.tokens[traced]);
            traced += 1;
        }
        self.trace.end_session();
        (scanner.tokens, report)
    }

    #[cfg(test)]
    pub(crate) fn trace_disabled(&self) -> bool {
        self.trace.is_disabled()
    }

    #[cfg(test)]
    pub(crate) fn session(&self) -> u64 {
        self.trace.session()
    }
}

/// One-shot convenience over a fresh [`Lexer`].
pub fn tokenize(source: &str) -> (Vec<Token>, CleanExitReport) {
    Lexer::new().tokenize(source)
}

#[derive(Clone, Copy)]
struct Mark {
    line: u32,
    col: u32,
    pos: usize,
}

struct Scanner<'src> {
    src: &'src str,
    bytes: &'src [u8],
    pos: usize,
    line: u32,
    col: u32,
    tokens: Vec<Token>,
    ctx: ContextTracker,
    prev_kind: Option<TokenKind>,
}

impl<'src> Scanner<'src> {
    fn new(src: &'src str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
            tokens: Vec::new(),
            ctx: ContextTracker::new(),
            prev_kind: None,
        }
    }

    fn finish(&mut self, allow_rdldata_underflow: bool) -> CleanExitReport {
        let end = Position::new(self.line, self.col, self.pos as u32, self.pos as u32);
        self.tokens.push(Token::eof(end));
        self.ctx.finish(allow_rdldata_underflow, end)
    }

    // --- low-level cursor ---

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, n: usize) -> Option<u8> {
        self.bytes.get(self.pos + n).copied()
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// Advances over `n` bytes of ASCII. Only call when the bytes are known
    /// to be single-unit and not line terminators.
    fn advance_ascii(&mut self, n: usize) {
        self.pos += n;
        self.col += n as u32;
    }

    /// Advances over one character of arbitrary width.
    fn advance_char(&mut self) {
        let len = self.src[self.pos..]
            .chars()
            .next()
            .map_or(1, char::len_utf8);
        self.pos += len;
        self.col += len as u32;
    }

    /// Consumes `\r\n`, `\n` or lone `\r`; line +1, column back to 1.
    fn consume_newline(&mut self) {
        match self.peek() {
            Some(b'\r') => {
                self.pos += 1;
                if self.peek() == Some(b'\n') {
                    self.pos += 1;
                }
            }
            Some(b'\n') => self.pos += 1,
            _ => return,
        }
        self.line += 1;
        self.col = 1;
    }

    fn mark(&self) -> Mark {
        Mark {
            line: self.line,
            col: self.col,
            pos: self.pos,
        }
    }

    fn position_from(&self, mark: Mark) -> Position {
        Position::new(mark.line, mark.col, mark.pos as u32, self.pos as u32)
    }

    fn push_token(&mut self, token: Token) {
        self.ctx.observe(token.kind);
        match token.kind {
            // CASE blocks close with END just like BEGIN blocks, so both
            // push the code context.
            TokenKind::Begin | TokenKind::Case => self.ctx.on_begin(),
            TokenKind::End => self.ctx.on_end(),
            _ => {}
        }
        self.prev_kind = Some(token.kind);
        self.tokens.push(token);
    }

    // --- trivia ---

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(b' ') | Some(b'\t') => self.advance_ascii(1),
                Some(b'\r') | Some(b'\n') => self.consume_newline(),
                Some(b'/') if self.peek_at(1) == Some(b'/') => self.skip_line_comment(),
                Some(b'/') if self.peek_at(1) == Some(b'*') => self.skip_block_comment(),
                Some(b'{') if self.ctx.brace_is_comment() => self.skip_brace_comment(),
                _ => break,
            }
        }
    }

    fn skip_inline_ws(&mut self) {
        loop {
            match self.peek() {
                Some(b' ') | Some(b'\t') => self.advance_ascii(1),
                Some(b'\r') | Some(b'\n') => self.consume_newline(),
                _ => break,
            }
        }
    }

    fn skip_line_comment(&mut self) {
        self.advance_ascii(2);
        while let Some(b) = self.peek() {
            if b == b'\r' || b == b'\n' {
                break;
            }
            self.advance_char();
        }
    }

    fn skip_block_comment(&mut self) {
        let start = self.mark();
        self.advance_ascii(2);
        loop {
            match self.peek() {
                None => {
                    let raw = self.src[start.pos..self.pos].to_string();
                    let position = self.position_from(start);
                    self.push_token(Token::unknown(raw, position, "unterminated block comment"));
                    return;
                }
                Some(b'*') if self.peek_at(1) == Some(b'/') => {
                    self.advance_ascii(2);
                    return;
                }
                Some(b'\r') | Some(b'\n') => self.consume_newline(),
                Some(_) => self.advance_char(),
            }
        }
    }

    /// `{ … }` comment inside BEGIN…END. Produces no token; `{` and `}` do
    /// not nest, the first `}` closes.
    fn skip_brace_comment(&mut self) {
        let start = self.mark();
        self.advance_ascii(1);
        loop {
            match self.peek() {
                None => {
                    let raw = self.src[start.pos..self.pos].to_string();
                    let position = self.position_from(start);
                    self.push_token(Token::unknown(raw, position, "unterminated block comment"));
                    return;
                }
                Some(b'}') => {
                    self.advance_ascii(1);
                    return;
                }
                Some(b'\r') | Some(b'\n') => self.consume_newline(),
                Some(_) => self.advance_char(),
            }
        }
    }

    // --- main loop ---

    /// Produces zero or more tokens; returns `false` at end of input.
    fn step(&mut self) -> bool {
        if self.ctx.in_property_value {
            self.skip_inline_ws();
            if self.at_eof() {
                return false;
            }
            self.scan_property_value();
            return true;
        }

        self.skip_trivia();
        let Some(b) = self.peek() else {
            return false;
        };

        if self.ctx.in_record()
            && matches!(
                self.ctx.field_def_column,
                FieldColumn::Id | FieldColumn::Enabled | FieldColumn::Name | FieldColumn::Type
            )
            && !matches!(b, b';' | b'{' | b'}')
        {
            if self.looks_like_property_pair() {
                self.ctx.field_def_column = FieldColumn::Properties;
            } else {
                self.scan_record_cell();
                return true;
            }
        }

        self.scan_token();
        true
    }

    // --- raw scans (property values, record cells) ---

    /// Raw text after `=` in a property position, up to a `;` at zero
    /// paren/bracket nesting or a brace. The terminator is not consumed.
    /// `'` and `//` inside the value are plain characters.
    fn scan_property_value(&mut self) {
        let start = self.mark();
        let mut parens = 0i32;
        let mut brackets = 0i32;
        loop {
            match self.peek() {
                None => {
                    self.ctx.incomplete_property = true;
                    break;
                }
                Some(b';') if parens <= 0 && brackets <= 0 => break,
                Some(b'{') | Some(b'}') if brackets <= 0 => break,
                Some(b'(') => {
                    parens += 1;
                    self.advance_ascii(1);
                }
                Some(b')') => {
                    parens -= 1;
                    self.advance_ascii(1);
                }
                Some(b'[') => {
                    brackets += 1;
                    self.advance_ascii(1);
                }
                Some(b']') => {
                    brackets -= 1;
                    self.advance_ascii(1);
                }
                Some(b'\r') | Some(b'\n') => self.consume_newline(),
                Some(_) => self.advance_char(),
            }
        }
        self.ctx.in_property_value = false;
        let value = self.src[start.pos..self.pos].trim();
        if !value.is_empty() {
            let value = value.to_string();
            let position = self.position_from(start);
            self.push_token(Token::new(TokenKind::PropertyValue, value, position));
        }
    }

    /// Raw record cell (id / enabled / name / type columns). Cells like
    /// `No.` or `Currency Code` are single values, not token sequences; an
    /// all-digit cell becomes an Integer.
    fn scan_record_cell(&mut self) {
        let start = self.mark();
        let mut brackets = 0i32;
        loop {
            match self.peek() {
                None => break,
                Some(b';') | Some(b'{') | Some(b'}') if brackets <= 0 => break,
                Some(b'[') => {
                    brackets += 1;
                    self.advance_ascii(1);
                }
                Some(b']') => {
                    brackets -= 1;
                    self.advance_ascii(1);
                }
                Some(b'\r') | Some(b'\n') => self.consume_newline(),
                Some(_) => self.advance_char(),
            }
        }
        let value = self.src[start.pos..self.pos].trim();
        if value.is_empty() {
            return;
        }
        let kind = if value.bytes().all(|b| b.is_ascii_digit()) {
            TokenKind::Integer
        } else {
            TokenKind::PropertyValue
        };
        let value = value.to_string();
        let position = self.position_from(start);
        self.push_token(Token::new(kind, value, position));
    }

    /// Lookahead: does the upcoming cell text read as `Name =` (one or more
    /// words, then `=`)? If so the record switched to its properties cell.
    fn looks_like_property_pair(&self) -> bool {
        let mut i = self.pos;
        let mut seen_word = false;
        while let Some(&b) = self.bytes.get(i) {
            match b {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' => {
                    seen_word = true;
                    i += 1;
                }
                b' ' | b'\t' => i += 1,
                b'=' => return seen_word,
                _ => return false,
            }
        }
        false
    }

    // --- token scans ---

    fn scan_token(&mut self) {
        let b = self.peek().expect("scan_token called at EOF");
        match b {
            b'{' => {
                let prev = self.prev_kind;
                let token = self.simple_token(TokenKind::LeftBrace, 1);
                self.ctx.open_brace(prev);
                self.push_token(token);
            }
            b'}' => {
                let token = self.simple_token(TokenKind::RightBrace, 1);
                self.ctx.close_brace();
                self.push_token(token);
            }
            b'[' => {
                let token = self.simple_token(TokenKind::LeftBracket, 1);
                self.ctx.bracket_depth += 1;
                self.push_token(token);
            }
            b']' => {
                let token = self.simple_token(TokenKind::RightBracket, 1);
                self.ctx.bracket_depth -= 1;
                self.push_token(token);
            }
            b'(' => {
                let token = self.simple_token(TokenKind::LeftParen, 1);
                self.push_token(token);
            }
            b')' => {
                let token = self.simple_token(TokenKind::RightParen, 1);
                self.push_token(token);
            }
            b';' => {
                let token = self.simple_token(TokenKind::Semicolon, 1);
                self.push_token(token);
                if self.ctx.in_record() && self.ctx.field_def_column < FieldColumn::Properties {
                    self.ctx.advance_column();
                }
            }
            b',' => {
                let token = self.simple_token(TokenKind::Comma, 1);
                self.push_token(token);
            }
            b':' => {
                let token = match self.peek_at(1) {
                    Some(b'=') => self.simple_token(TokenKind::Assign, 2),
                    Some(b':') => self.simple_token(TokenKind::DoubleColon, 2),
                    _ => self.simple_token(TokenKind::Colon, 1),
                };
                self.push_token(token);
            }
            b'.' => {
                let token = if self.peek_at(1) == Some(b'.') {
                    self.simple_token(TokenKind::DotDot, 2)
                } else {
                    self.simple_token(TokenKind::Dot, 1)
                };
                self.push_token(token);
            }
            b'@' => {
                let token = self.simple_token(TokenKind::At, 1);
                self.push_token(token);
            }
            b'+' => {
                let token = if self.peek_at(1) == Some(b'=') {
                    self.simple_token(TokenKind::PlusAssign, 2)
                } else {
                    self.simple_token(TokenKind::Plus, 1)
                };
                self.push_token(token);
            }
            b'-' => {
                let token = if self.peek_at(1) == Some(b'=') {
                    self.simple_token(TokenKind::MinusAssign, 2)
                } else {
                    self.simple_token(TokenKind::Minus, 1)
                };
                self.push_token(token);
            }
            b'*' => {
                let token = if self.peek_at(1) == Some(b'=') {
                    self.simple_token(TokenKind::MultAssign, 2)
                } else {
                    self.simple_token(TokenKind::Multiply, 1)
                };
                self.push_token(token);
            }
            b'/' => {
                let token = if self.peek_at(1) == Some(b'=') {
                    self.simple_token(TokenKind::DivAssign, 2)
                } else {
                    self.simple_token(TokenKind::Divide, 1)
                };
                self.push_token(token);
            }
            b'=' => self.scan_equal(),
            b'<' => {
                let token = match self.peek_at(1) {
                    Some(b'=') => self.simple_token(TokenKind::LessOrEqual, 2),
                    Some(b'>') => self.simple_token(TokenKind::NotEqual, 2),
                    _ => self.simple_token(TokenKind::Less, 1),
                };
                self.push_token(token);
            }
            b'>' => {
                let token = if self.peek_at(1) == Some(b'=') {
                    self.simple_token(TokenKind::GreaterOrEqual, 2)
                } else {
                    self.simple_token(TokenKind::Greater, 1)
                };
                self.push_token(token);
            }
            b'\'' => self.scan_string(),
            b'"' => self.scan_quoted_identifier(),
            b'0'..=b'9' => self.scan_number(),
            b'A'..=b'Z' | b'a'..=b'z' | b'_' => self.scan_identifier(),
            _ => self.scan_unknown_char(),
        }
    }

    fn simple_token(&mut self, kind: TokenKind, len: usize) -> Token {
        let start = self.mark();
        self.advance_ascii(len);
        let value = self.src[start.pos..self.pos].to_string();
        Token::new(kind, value, self.position_from(start))
    }

    /// `=` plus the property-value mode decision: in a property position the
    /// value is raw text, unless its first word is BEGIN or VAR, in which
    /// case it is trigger code and lexes normally.
    fn scan_equal(&mut self) {
        let token = self.simple_token(TokenKind::Equal, 1);
        let in_property_position = self.ctx.top() == LexContext::Properties
            || (self.ctx.in_record()
                && matches!(
                    self.ctx.field_def_column,
                    FieldColumn::Properties | FieldColumn::Triggers
                ));
        self.push_token(token);
        if in_property_position {
            if self.value_starts_code() {
                if self.ctx.in_record() {
                    self.ctx.field_def_column = FieldColumn::Triggers;
                }
            } else {
                self.ctx.in_property_value = true;
            }
        }
    }

    fn value_starts_code(&self) -> bool {
        let mut i = self.pos;
        while matches!(self.bytes.get(i), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            i += 1;
        }
        let start = i;
        while matches!(self.bytes.get(i), Some(b) if b.is_ascii_alphabetic()) {
            i += 1;
        }
        let word = &self.src[start..i];
        word.eq_ignore_ascii_case("BEGIN") || word.eq_ignore_ascii_case("VAR")
    }

    /// `'…'` string literal; `''` is a literal apostrophe. Line terminators
    /// inside advance the line counter. EOF inside yields an Unknown token.
    fn scan_string(&mut self) {
        let start = self.mark();
        self.advance_ascii(1);
        let mut value = String::new();
        loop {
            match self.peek() {
                None => {
                    let raw = self.src[start.pos..self.pos].to_string();
                    let position = self.position_from(start);
                    self.push_token(Token::unknown(raw, position, "unterminated string literal"));
                    return;
                }
                Some(b'\'') => {
                    if self.peek_at(1) == Some(b'\'') {
                        value.push('\'');
                        self.advance_ascii(2);
                    } else {
                        self.advance_ascii(1);
                        break;
                    }
                }
                Some(b'\r') | Some(b'\n') => {
                    value.push('\n');
                    self.consume_newline();
                }
                Some(_) => {
                    let c = self.src[self.pos..].chars().next().expect("in bounds");
                    value.push(c);
                    self.advance_char();
                }
            }
        }
        let position = self.position_from(start);
        self.push_token(Token::new(TokenKind::StringLiteral, value, position));
    }

    /// `"…"` quoted identifier; same escape and EOF rules as strings.
    fn scan_quoted_identifier(&mut self) {
        let start = self.mark();
        self.advance_ascii(1);
        let mut value = String::new();
        loop {
            match self.peek() {
                None => {
                    let raw = self.src[start.pos..self.pos].to_string();
                    let position = self.position_from(start);
                    self.push_token(Token::unknown(
                        raw,
                        position,
                        "unterminated quoted identifier",
                    ));
                    return;
                }
                Some(b'"') => {
                    if self.peek_at(1) == Some(b'"') {
                        value.push('"');
                        self.advance_ascii(2);
                    } else {
                        self.advance_ascii(1);
                        break;
                    }
                }
                Some(b'\r') | Some(b'\n') => {
                    value.push('\n');
                    self.consume_newline();
                }
                Some(_) => {
                    let c = self.src[self.pos..].chars().next().expect("in bounds");
                    value.push(c);
                    self.advance_char();
                }
            }
        }
        let position = self.position_from(start);
        self.push_token(Token::new(TokenKind::QuotedIdentifier, value, position));
    }

    /// Integer, decimal, or date/time literal (`010196D`, `120000T`,
    /// `010196DT`). `1..5` scans as Integer DotDot Integer.
    fn scan_number(&mut self) {
        let start = self.mark();
        while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
            self.advance_ascii(1);
        }
        let mut kind = TokenKind::Integer;
        if self.peek() == Some(b'.') && matches!(self.peek_at(1), Some(b) if b.is_ascii_digit()) {
            self.advance_ascii(1);
            while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
                self.advance_ascii(1);
            }
            kind = TokenKind::Decimal;
        } else {
            match self.peek() {
                Some(b'D') | Some(b'd') => {
                    if matches!(self.peek_at(1), Some(b'T') | Some(b't'))
                        && !Self::is_ident_byte(self.peek_at(2))
                    {
                        self.advance_ascii(2);
                        kind = TokenKind::DateTime;
                    } else if !Self::is_ident_byte(self.peek_at(1)) {
                        self.advance_ascii(1);
                        kind = TokenKind::Date;
                    }
                }
                Some(b'T') | Some(b't') => {
                    if !Self::is_ident_byte(self.peek_at(1)) {
                        self.advance_ascii(1);
                        kind = TokenKind::Time;
                    }
                }
                _ => {}
            }
        }
        let value = self.src[start.pos..self.pos].to_string();
        let position = self.position_from(start);
        self.push_token(Token::new(kind, value, position));
    }

    fn is_ident_byte(b: Option<u8>) -> bool {
        matches!(b, Some(b) if b.is_ascii_alphanumeric() || b == b'_')
    }

    /// Identifier or keyword; `OBJECT-PROPERTIES` merges across the hyphen.
    fn scan_identifier(&mut self) {
        let start = self.mark();
        while matches!(self.peek(), Some(b) if b.is_ascii_alphanumeric() || b == b'_') {
            self.advance_ascii(1);
        }
        let text = &self.src[start.pos..self.pos];

        if text.eq_ignore_ascii_case("OBJECT") && self.peek() == Some(b'-') {
            let mut i = self.pos + 1;
            while matches!(self.bytes.get(i), Some(b) if b.is_ascii_alphabetic()) {
                i += 1;
            }
            if self.src[self.pos + 1..i].eq_ignore_ascii_case("PROPERTIES") {
                let extra = i - self.pos;
                self.advance_ascii(extra);
                let value = self.src[start.pos..self.pos].to_string();
                let position = self.position_from(start);
                self.push_token(Token::new(TokenKind::ObjectProperties, value, position));
                return;
            }
        }

        let kind = lookup_keyword(text).unwrap_or(TokenKind::Identifier);
        let value = text.to_string();
        let position = self.position_from(start);
        self.push_token(Token::new(kind, value, position));
    }

    /// Anything unrecognized becomes a single-character Unknown token whose
    /// message cites the code point, never the character itself.
    fn scan_unknown_char(&mut self) {
        let start = self.mark();
        let c = self.src[self.pos..].chars().next().expect("in bounds");
        self.advance_char();
        let position = self.position_from(start);
        self.push_token(Token::unknown(
            c.to_string(),
            position,
            format!("unexpected character U+{:04X}", c as u32),
        ));
    }
}
