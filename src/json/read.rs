//! Streaming JSON reader.
//!
//! A recursive-descent parser over UTF-8 bytes producing [`Value`]s. The
//! grammar is standard JSON extended with `NaN`, `Infinity` and
//! `-Infinity` numeric literals.
//!
//! In partial mode (`allow_partial`), running out of input is not an
//! error: the reader returns the deepest fully-formed prefix. A truncated
//! trailing string or number token is dropped, and an unterminated
//! object/array yields only its completed entries; the in-progress entry
//! is discarded rather than included half-formed. Partial mode tolerates
//! nothing else: a syntax error is a syntax error at any position.

use alloc::{
    string::String,
    sync::Arc,
    vec::Vec,
};
use core::fmt;

use crate::{
    intern::{CacheMode, StringCache},
    value::{Map, Value},
};

/// A source position, for parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number, in characters.
    pub col: usize,
    /// Byte offset into the input.
    pub offset: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// This type represents all possible errors that can occur when parsing
/// JSON input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub position: Position,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.position, self.kind)
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseErrorKind {
    /// The input ended mid-token or mid-container.
    UnexpectedEof,
    UnexpectedCharacter(char),
    ExpectedValue,
    /// Object keys must be strings.
    ExpectedKey,
    ExpectedColon,
    ExpectedCommaOrEnd {
        /// `"array"` or `"object"`.
        container: &'static str,
    },
    InvalidNumber,
    InvalidLiteral,
    InvalidEscape(&'static str),
    ControlCharacter(u8),
    InvalidUtf8,
    TrailingCharacters,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::UnexpectedEof => f.write_str("unexpected end of input"),
            ParseErrorKind::UnexpectedCharacter(c) => write!(f, "unexpected character {c:?}"),
            ParseErrorKind::ExpectedValue => f.write_str("expected a value"),
            ParseErrorKind::ExpectedKey => f.write_str("expected a string key"),
            ParseErrorKind::ExpectedColon => f.write_str("expected `:` after object key"),
            ParseErrorKind::ExpectedCommaOrEnd { container } => {
                write!(f, "expected `,` or end of {container}")
            }
            ParseErrorKind::InvalidNumber => f.write_str("invalid number"),
            ParseErrorKind::InvalidLiteral => f.write_str("invalid literal"),
            ParseErrorKind::InvalidEscape(msg) => f.write_str(msg),
            ParseErrorKind::ControlCharacter(b) => {
                write!(f, "control character 0x{b:02x} in string, must be escaped")
            }
            ParseErrorKind::InvalidUtf8 => f.write_str("invalid UTF-8 in string"),
            ParseErrorKind::TrailingCharacters => f.write_str("non-whitespace trailing characters"),
        }
    }
}

/// Parse JSON bytes with default settings: no partial tolerance, strings
/// interned through the process-wide cache.
pub fn parse(bytes: &[u8]) -> Result<Value, ParseError> {
    parse_with(bytes, false, StringCache::global(), CacheMode::All)
}

/// Parse JSON bytes.
///
/// `allow_partial` enables the truncated-input tolerance documented on
/// this module; `cache`/`mode` control string interning.
pub fn parse_with(
    bytes: &[u8],
    allow_partial: bool,
    cache: &StringCache,
    mode: CacheMode,
) -> Result<Value, ParseError> {
    let mut reader = Reader {
        bytes,
        offset: 0,
        partial: allow_partial,
        cache,
        mode,
        num_at_eof: false,
    };
    reader.document()
}

struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
    partial: bool,
    cache: &'a StringCache,
    mode: CacheMode,
    /// Whether the most recently parsed number token ran to the very end
    /// of the input. Such a number may be truncated, so containers drop it
    /// in partial mode.
    num_at_eof: bool,
}

impl<'a> Reader<'a> {
    fn document(&mut self) -> Result<Value, ParseError> {
        self.skip_ws();
        let value = self.value(false)?;
        self.skip_ws();
        if self.offset < self.bytes.len() {
            return Err(self.err(ParseErrorKind::TrailingCharacters));
        }
        Ok(value)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.offset).copied()
    }

    fn bump(&mut self) {
        self.offset += 1;
    }

    fn skip_ws(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek() {
            self.bump();
        }
    }

    fn err(&self, kind: ParseErrorKind) -> ParseError {
        self.err_at(kind, self.offset)
    }

    fn err_at(&self, kind: ParseErrorKind, offset: usize) -> ParseError {
        ParseError {
            kind,
            position: position_of(self.bytes, offset),
        }
    }

    /// Parse one value. `key` selects key-position interning.
    fn value(&mut self, key: bool) -> Result<Value, ParseError> {
        self.num_at_eof = false;
        match self.peek() {
            None => Err(self.err(ParseErrorKind::UnexpectedEof)),
            Some(b'{') => self.object(),
            Some(b'[') => self.array(),
            Some(b'"') => Ok(Value::String(self.string(key)?)),
            Some(b't') => self.keyword(b"true", Value::Bool(true)),
            Some(b'f') => self.keyword(b"false", Value::Bool(false)),
            Some(b'n') => self.keyword(b"null", Value::Null),
            Some(b'N') => self.keyword(b"NaN", Value::from(f64::NAN)),
            Some(b'I') => self.keyword(b"Infinity", Value::from(f64::INFINITY)),
            Some(b'-') => {
                if self.bytes.get(self.offset + 1) == Some(&b'I') {
                    self.bump();
                    self.keyword(b"Infinity", Value::from(f64::NEG_INFINITY))
                } else {
                    self.number()
                }
            }
            Some(b'0'..=b'9') => self.number(),
            Some(c) if c < 0x80 => Err(self.err(ParseErrorKind::UnexpectedCharacter(char::from(c)))),
            Some(_) => Err(self.err(ParseErrorKind::ExpectedValue)),
        }
    }

    /// Match a keyword literal. A proper prefix cut off by the end of the
    /// input reports `UnexpectedEof` so partial mode can truncate there.
    fn keyword(&mut self, word: &'static [u8], value: Value) -> Result<Value, ParseError> {
        let start = self.offset;
        for (i, expected) in word.iter().enumerate() {
            match self.bytes.get(start + i) {
                None => return Err(self.err_at(ParseErrorKind::UnexpectedEof, self.bytes.len())),
                Some(b) if b == expected => {}
                Some(_) => return Err(self.err_at(ParseErrorKind::InvalidLiteral, start)),
            }
        }
        // The literal must not run into an identifier tail (`nullx`).
        if let Some(b) = self.bytes.get(start + word.len()) {
            if b.is_ascii_alphanumeric() || *b == b'_' {
                return Err(self.err_at(ParseErrorKind::InvalidLiteral, start));
            }
        }
        self.offset = start + word.len();
        Ok(value)
    }

    fn number(&mut self) -> Result<Value, ParseError> {
        let start = self.offset;
        let mut is_float = false;

        if self.peek() == Some(b'-') {
            self.bump();
        }

        // Integer part: a single zero, or a nonzero digit run.
        match self.peek() {
            None => return Err(self.err(ParseErrorKind::UnexpectedEof)),
            Some(b'0') => {
                self.bump();
                if let Some(b'0'..=b'9') = self.peek() {
                    return Err(self.err_at(ParseErrorKind::InvalidNumber, start));
                }
            }
            Some(b'1'..=b'9') => {
                while let Some(b'0'..=b'9') = self.peek() {
                    self.bump();
                }
            }
            Some(_) => return Err(self.err_at(ParseErrorKind::InvalidNumber, start)),
        }

        if self.peek() == Some(b'.') {
            is_float = true;
            self.bump();
            match self.peek() {
                None => return Err(self.err(ParseErrorKind::UnexpectedEof)),
                Some(b'0'..=b'9') => {
                    while let Some(b'0'..=b'9') = self.peek() {
                        self.bump();
                    }
                }
                Some(_) => return Err(self.err_at(ParseErrorKind::InvalidNumber, start)),
            }
        }

        if let Some(b'e' | b'E') = self.peek() {
            is_float = true;
            self.bump();
            if let Some(b'+' | b'-') = self.peek() {
                self.bump();
            }
            match self.peek() {
                None => return Err(self.err(ParseErrorKind::UnexpectedEof)),
                Some(b'0'..=b'9') => {
                    while let Some(b'0'..=b'9') = self.peek() {
                        self.bump();
                    }
                }
                Some(_) => return Err(self.err_at(ParseErrorKind::InvalidNumber, start)),
            }
        }

        self.num_at_eof = self.offset == self.bytes.len();

        // The scanned range is ASCII digits/sign/dot/exponent only.
        let text = core::str::from_utf8(&self.bytes[start..self.offset])
            .map_err(|_| self.err_at(ParseErrorKind::InvalidNumber, start))?;

        if is_float {
            let v: f64 = text
                .parse()
                .map_err(|_| self.err_at(ParseErrorKind::InvalidNumber, start))?;
            Ok(Value::from(v))
        } else if let Ok(v) = text.parse::<i64>() {
            Ok(Value::Int(v))
        } else {
            // Integer overflow falls back to the float representation.
            let v: f64 = text
                .parse()
                .map_err(|_| self.err_at(ParseErrorKind::InvalidNumber, start))?;
            Ok(Value::from(v))
        }
    }

    /// Decode a string literal, consuming the surrounding quotes.
    fn string(&mut self, key: bool) -> Result<Arc<str>, ParseError> {
        debug_assert_eq!(self.peek(), Some(b'"'));
        self.bump();

        let mut decoded: Option<String> = None;
        let mut chunk_start = self.offset;

        loop {
            match self.peek() {
                None => return Err(self.err(ParseErrorKind::UnexpectedEof)),
                Some(b'"') => {
                    let chunk = self.utf8_chunk(chunk_start)?;
                    self.bump();
                    let text: &str = match &mut decoded {
                        None => chunk,
                        Some(buf) => {
                            buf.push_str(chunk);
                            buf
                        }
                    };
                    return Ok(self.shared(text, key));
                }
                Some(b'\\') => {
                    let chunk = self.utf8_chunk(chunk_start)?;
                    let buf = decoded.get_or_insert_with(String::new);
                    buf.push_str(chunk);
                    self.bump();
                    let c = self.escape()?;
                    buf.push(c);
                    chunk_start = self.offset;
                }
                Some(b) if b < 0x20 => {
                    return Err(self.err(ParseErrorKind::ControlCharacter(b)));
                }
                Some(_) => self.bump(),
            }
        }
    }

    /// Validate the raw bytes scanned since `start` as UTF-8.
    fn utf8_chunk(&self, start: usize) -> Result<&'a str, ParseError> {
        core::str::from_utf8(&self.bytes[start..self.offset])
            .map_err(|e| self.err_at(ParseErrorKind::InvalidUtf8, start + e.valid_up_to()))
    }

    /// Decode one escape sequence; the backslash is already consumed.
    fn escape(&mut self) -> Result<char, ParseError> {
        let c = match self.peek() {
            None => return Err(self.err(ParseErrorKind::UnexpectedEof)),
            Some(b) => b,
        };
        self.bump();
        match c {
            b'"' => Ok('"'),
            b'\\' => Ok('\\'),
            b'/' => Ok('/'),
            b'b' => Ok('\u{8}'),
            b'f' => Ok('\u{c}'),
            b'n' => Ok('\n'),
            b'r' => Ok('\r'),
            b't' => Ok('\t'),
            b'u' => self.unicode_escape(),
            _ => Err(self.err_at(
                ParseErrorKind::InvalidEscape("unknown escape sequence"),
                self.offset - 1,
            )),
        }
    }

    fn unicode_escape(&mut self) -> Result<char, ParseError> {
        let first = self.hex4()?;
        if (0xD800..0xDC00).contains(&first) {
            // High surrogate: a low surrogate escape must follow.
            if self.peek() == Some(b'\\') && self.bytes.get(self.offset + 1) == Some(&b'u') {
                self.bump();
                self.bump();
                let second = self.hex4()?;
                if !(0xDC00..0xE000).contains(&second) {
                    return Err(self.err(ParseErrorKind::InvalidEscape("unpaired surrogate")));
                }
                let code = 0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00);
                return char::from_u32(code)
                    .ok_or_else(|| self.err(ParseErrorKind::InvalidEscape("invalid codepoint")));
            }
            if self.offset >= self.bytes.len() {
                return Err(self.err(ParseErrorKind::UnexpectedEof));
            }
            return Err(self.err(ParseErrorKind::InvalidEscape("unpaired surrogate")));
        }
        if (0xDC00..0xE000).contains(&first) {
            return Err(self.err(ParseErrorKind::InvalidEscape("unpaired surrogate")));
        }
        char::from_u32(first)
            .ok_or_else(|| self.err(ParseErrorKind::InvalidEscape("invalid codepoint")))
    }

    fn hex4(&mut self) -> Result<u32, ParseError> {
        let mut code = 0u32;
        for _ in 0..4 {
            let digit = match self.peek() {
                None => return Err(self.err(ParseErrorKind::UnexpectedEof)),
                Some(b) => char::from(b)
                    .to_digit(16)
                    .ok_or_else(|| self.err(ParseErrorKind::InvalidEscape("invalid hex digit")))?,
            };
            self.bump();
            code = code * 16 + digit;
        }
        Ok(code)
    }

    fn shared(&self, text: &str, key: bool) -> Arc<str> {
        let cache_it = match self.mode {
            CacheMode::All => true,
            CacheMode::Keys => key,
            CacheMode::None => false,
        };
        if cache_it {
            self.cache.intern(text)
        } else {
            Arc::from(text)
        }
    }

    fn array(&mut self) -> Result<Value, ParseError> {
        debug_assert_eq!(self.peek(), Some(b'['));
        self.bump();
        let mut items = Vec::new();

        self.skip_ws();
        if self.peek() == Some(b']') {
            self.bump();
            return Ok(Value::seq(items));
        }

        loop {
            self.skip_ws();
            match self.value(false) {
                Ok(v) => {
                    if self.partial && core::mem::take(&mut self.num_at_eof) {
                        // Possibly-truncated trailing number: drop it.
                        break;
                    }
                    items.push(v);
                }
                Err(e) if self.partial && e.kind == ParseErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e),
            }

            self.skip_ws();
            match self.peek() {
                Some(b',') => self.bump(),
                Some(b']') => {
                    self.bump();
                    break;
                }
                None if self.partial => break,
                None => return Err(self.err(ParseErrorKind::UnexpectedEof)),
                Some(_) => {
                    return Err(self.err(ParseErrorKind::ExpectedCommaOrEnd { container: "array" }))
                }
            }
        }

        self.num_at_eof = false;
        Ok(Value::seq(items))
    }

    fn object(&mut self) -> Result<Value, ParseError> {
        debug_assert_eq!(self.peek(), Some(b'{'));
        self.bump();
        let mut map = Map::new();

        self.skip_ws();
        if self.peek() == Some(b'}') {
            self.bump();
            return Ok(Value::map(map));
        }

        loop {
            self.skip_ws();
            let key = match self.peek() {
                None if self.partial => break,
                None => return Err(self.err(ParseErrorKind::UnexpectedEof)),
                Some(b'"') => match self.string(true) {
                    Ok(key) => key,
                    Err(e) if self.partial && e.kind == ParseErrorKind::UnexpectedEof => break,
                    Err(e) => return Err(e),
                },
                Some(_) => return Err(self.err(ParseErrorKind::ExpectedKey)),
            };

            self.skip_ws();
            match self.peek() {
                Some(b':') => self.bump(),
                None if self.partial => break,
                None => return Err(self.err(ParseErrorKind::UnexpectedEof)),
                Some(_) => return Err(self.err(ParseErrorKind::ExpectedColon)),
            }

            self.skip_ws();
            match self.value(false) {
                Ok(v) => {
                    if self.partial && core::mem::take(&mut self.num_at_eof) {
                        break;
                    }
                    map.insert(Value::String(key), v);
                }
                Err(e) if self.partial && e.kind == ParseErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e),
            }

            self.skip_ws();
            match self.peek() {
                Some(b',') => self.bump(),
                Some(b'}') => {
                    self.bump();
                    break;
                }
                None if self.partial => break,
                None => return Err(self.err(ParseErrorKind::UnexpectedEof)),
                Some(_) => {
                    return Err(self.err(ParseErrorKind::ExpectedCommaOrEnd {
                        container: "object",
                    }))
                }
            }
        }

        self.num_at_eof = false;
        Ok(Value::map(map))
    }
}

fn position_of(bytes: &[u8], offset: usize) -> Position {
    let offset = offset.min(bytes.len());
    let prefix = &bytes[..offset];
    let line = 1 + prefix.iter().filter(|&&b| b == b'\n').count();
    let line_start = prefix
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |p| p + 1);
    let col = 1 + String::from_utf8_lossy(&prefix[line_start..]).chars().count();
    Position { line, col, offset }
}
