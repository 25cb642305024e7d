//! Lexical analysis
use super::{
    cursor::{Cursor, EOF_CHAR},
    tokens::{token_kind, Span, Symbol, Token, TokenKind},
};

pub struct Lexer<'a> {
    /// Character scanner
    cursor: Cursor<'a>,
    /// Keep reference to the source so the parser can
    /// slice fragments from it.
    original: &'a str,
    /// Start absolute byte position of the current token
    /// in the source.
    start_pos: u32,
    /// Line where the current token starts.
    start_line: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(source_code: &'a str) -> Self {
        let mut cursor = Cursor::new(source_code);

        // Initial state of the cursor is a non-existant EOF char,
        // so prime it to point at the first character.
        cursor.next();

        let start_pos = cursor.offset();
        let start_line = cursor.line();

        Self {
            cursor,
            original: source_code,
            start_pos,
            start_line,
        }
    }

    /// Original source code that was passed in during construction.
    pub fn source_code(&self) -> &'a str {
        self.original
    }

    /// Skip whitespace and comments, then report whether
    /// there is any token text left before the end of the source.
    pub fn has_more(&mut self) -> bool {
        self.skip_trivia();
        !self.cursor.at_end()
    }

    /// Scan the source characters and construct the next token.
    ///
    /// Each call starts with the cursor pointing at the start of the
    /// remaining source, and leaves it pointing at the first character
    /// after the token it built.
    ///
    /// Once the source is exhausted, every call returns an EOF token.
    pub fn next_token(&mut self) -> Token {
        self.skip_trivia();
        self.start_token();

        match self.cursor.current() {
            EOF_CHAR if self.cursor.at_end() => self.make_token(TokenKind::EOF),
            '"' => self.consume_string(),
            c => match Symbol::parse(c) {
                Some(symbol) => self.make_token(TokenKind::Symbol(symbol)),
                None => self.consume_word(),
            },
        }
    }

    /// Indicates whether the lexer is at the end of the source.
    ///
    /// Note that source can contain '\0' characters but not be at
    /// the actual end.
    pub fn at_end(&self) -> bool {
        self.cursor.at_end()
    }

    /// Create a span using the starting position of the current token,
    /// and the current offset of the cursor.
    fn make_span(&mut self) -> Span {
        let start = self.start_pos;
        let end = if self.cursor.at_end() {
            self.cursor.offset()
        } else {
            self.cursor.peek_offset()
        };

        debug_assert!(end >= start);
        Span::new(start, end - start)
    }

    /// Primes the lexer to consume the next token.
    fn start_token(&mut self) {
        self.start_pos = self.cursor.offset();
        self.start_line = self.cursor.line();
    }

    /// Build a token from the text between the position stored by
    /// `start_token` and the current cursor position.
    ///
    /// Also positions the cursor for the next iteration.
    fn make_token(&mut self, kind: TokenKind) -> Token {
        let token = Token {
            span: self.make_span(),
            kind,
            line: self.start_line,
        };

        self.cursor.next();
        debug_assert_eq!(self.cursor.offset(), token.span.end());

        token
    }
}

/// Trivia and specialised tokens.
impl<'a> Lexer<'a> {
    fn skip_trivia(&mut self) {
        loop {
            let c = self.cursor.current();
            if c.is_whitespace() {
                self.cursor.next();
            } else if c == '/' && self.cursor.peek() == '/' {
                self.skip_line_comment();
            } else if c == '/' && self.cursor.peek() == '*' {
                self.skip_block_comment();
            } else {
                break;
            }
        }
    }

    /// Erase comment up to, but not including, the trailing newline.
    fn skip_line_comment(&mut self) {
        while !self.cursor.at_end() && self.cursor.current() != '\n' {
            self.cursor.next();
        }
    }

    /// Erase a block comment including its closing `*/`.
    ///
    /// An unterminated comment swallows the rest of the source.
    fn skip_block_comment(&mut self) {
        debug_assert_eq!(self.cursor.current(), '/');
        // Step over "/*" so "/*/" doesn't close itself.
        self.cursor.next();
        self.cursor.next();

        while !self.cursor.at_end() {
            if self.cursor.current() == '*' && self.cursor.peek() == '/' {
                self.cursor.next();
                self.cursor.next();
                return;
            }
            self.cursor.next();
        }
    }

    /// String literal from the opening quote to the next quote.
    ///
    /// There are no escape sequences. Newlines are consumed so the
    /// whole literal is reported as one malformed token.
    fn consume_string(&mut self) -> Token {
        debug_assert_eq!(self.cursor.current(), '"');

        loop {
            let at_last = self.cursor.peek_offset() as usize >= self.original.len();
            if at_last {
                break;
            }
            if self.cursor.next() == '"' {
                break;
            }
        }

        let kind = token_kind(self.make_span().fragment(self.original));
        self.make_token(kind)
    }

    /// Run of characters up to the next whitespace, symbol or quote.
    fn consume_word(&mut self) -> Token {
        while is_word_continue(self.cursor.peek()) {
            self.cursor.next();
        }

        let kind = token_kind(self.make_span().fragment(self.original));
        self.make_token(kind)
    }
}

fn is_word_continue(c: char) -> bool {
    !(c == EOF_CHAR || c == '"' || c.is_whitespace() || Symbol::parse(c).is_some())
}

impl<'a> IntoIterator for Lexer<'a> {
    type Item = Token;
    type IntoIter = LexerIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        LexerIter {
            lexer: self,
            done: false,
        }
    }
}

/// Convenience iterator that wraps the lexer.
///
/// Yields one EOF token, then ends.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct LexerIter<'a> {
    // Track end so an EOF token is emitted once.
    done: bool,
    lexer: Lexer<'a>,
}

impl<'a> Iterator for LexerIter<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let token = self.lexer.next_token();
        if token.kind == TokenKind::EOF {
            self.done = true;
        }
        Some(token)
    }
}
