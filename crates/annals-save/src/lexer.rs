use logos::Logos;
use std::fmt;
use std::ops::Range;

/// Token type for save-member text.
///
/// The grammar has no keywords — `yes`, `no`, and every game-defined symbol
/// are all `Token::Ident`. Boolean interpretation happens above the parser,
/// never here.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Block opener `{`.
    Open,
    /// Block closer `}`.
    Close,
    /// Pair separator `=`.
    Eq,
    /// Double-quoted string with the surrounding quotes dropped. The format
    /// has no embedded-quote escaping, so the content is taken verbatim.
    Quoted(String),
    /// Bare identifier: digits/underscores then at least one word character
    /// that is not a digit, then trailing word characters (`fallen_empire`,
    /// `trait_resilient`, `x25a`).
    Ident(String),
    /// Integer literal, optionally negative.
    Int(i64),
    /// Float literal. A trailing dot is allowed (`5.` is five).
    Float(f64),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Open => write!(f, "{{"),
            Token::Close => write!(f, "}}"),
            Token::Eq => write!(f, "="),
            Token::Quoted(s) => write!(f, "\"{s}\""),
            Token::Ident(s) => write!(f, "{s}"),
            Token::Int(n) => write!(f, "{n}"),
            Token::Float(n) => write!(f, "{n}"),
        }
    }
}

/// Source location of a token: byte range plus 1-based line number.
///
/// Byte offsets feed diagnostics rendering; the line number is what error
/// messages quote, since save members routinely run to millions of bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// Byte offset of the first byte of the token.
    pub start: usize,
    /// Byte offset one past the last byte of the token.
    pub end: usize,
    /// 1-based line the token starts on.
    pub line: u32,
}

impl Span {
    /// The byte range of this span, as consumed by diagnostics rendering.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// A fatal lexing failure: some position in the member matched no token
/// class. Save parsing is fail-fast, so the first such error aborts the
/// member.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("lex error at line {}: {message}", .span.line)]
pub struct LexError {
    /// Location of the offending input.
    pub span: Span,
    /// Human-readable description of what failed to lex.
    pub message: String,
}

/// Internal logos token — classification only. Conversion to the owned
/// [`Token`] happens in the iterator so that errors can carry line numbers.
///
/// Whitespace is exactly spaces, tabs, and newlines; anything else (a stray
/// carriage return, say) is an error rather than silently skipped.
#[derive(Logos, Debug)]
#[logos(skip r"[ \t\n]+")]
enum RawToken {
    #[token("{")]
    Open,

    #[token("}")]
    Close,

    #[token("=")]
    Eq,

    #[regex(r#""[^"]*""#)]
    Quoted,

    #[regex(r"[0-9_]*[a-zA-Z_]+[a-zA-Z0-9_]*")]
    Ident,

    #[regex(r"-?[0-9]+\.[0-9]*")]
    Float,

    #[regex(r"-?[0-9]+")]
    Int,
}

/// Streaming lexer over one save member.
///
/// Lazily yields `(Token, Span)` pairs; the stream is finite and can be
/// restarted from scratch by constructing a new `Lexer` over the same source.
pub struct Lexer<'src> {
    raw: logos::Lexer<'src, RawToken>,
    line_starts: Vec<usize>,
}

impl<'src> Lexer<'src> {
    /// Create a lexer over the full text of a save member.
    pub fn new(source: &'src str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            raw: RawToken::lexer(source),
            line_starts,
        }
    }

    /// 1-based line number containing the given byte offset.
    pub fn line_at(&self, offset: usize) -> u32 {
        self.line_starts.partition_point(|start| *start <= offset) as u32
    }

    fn span_here(&self) -> Span {
        let range = self.raw.span();
        Span {
            start: range.start,
            end: range.end,
            line: self.line_at(range.start),
        }
    }

    fn error_here(&self, message: impl Into<String>) -> LexError {
        LexError {
            span: self.span_here(),
            message: message.into(),
        }
    }
}

impl fmt::Debug for Lexer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lexer")
            .field("offset", &self.raw.span().start)
            .field("lines", &self.line_starts.len())
            .finish()
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<(Token, Span), LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.raw.next()?;
        let item = match result {
            Ok(raw) => {
                let token = match raw {
                    RawToken::Open => Token::Open,
                    RawToken::Close => Token::Close,
                    RawToken::Eq => Token::Eq,
                    RawToken::Quoted => {
                        let slice = self.raw.slice();
                        Token::Quoted(slice[1..slice.len() - 1].to_string())
                    }
                    RawToken::Ident => Token::Ident(self.raw.slice().to_string()),
                    RawToken::Int => match self.raw.slice().parse::<i64>() {
                        Ok(n) => Token::Int(n),
                        Err(_) => {
                            let raw = self.raw.slice();
                            return Some(Err(
                                self.error_here(format!("integer out of range: {raw}"))
                            ));
                        }
                    },
                    RawToken::Float => match self.raw.slice().parse::<f64>() {
                        Ok(n) => Token::Float(n),
                        Err(_) => {
                            let raw = self.raw.slice();
                            return Some(Err(
                                self.error_here(format!("invalid float literal: {raw}"))
                            ));
                        }
                    },
                };
                Ok((token, self.span_here()))
            }
            Err(()) => {
                let fragment = self.raw.slice().to_string();
                Err(self.error_here(format!("unrecognized input: {fragment:?}")))
            }
        };
        Some(item)
    }
}
