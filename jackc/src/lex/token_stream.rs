//! Token stream with one token of look ahead.
use super::{Lexer, Span, Token, TokenKind};

/// Buffered stream of tokens.
///
/// Tokens are lazily lexed. Consuming the current token triggers
/// the internal lexer to scan the next one. At the end of the source
/// the stream keeps yielding EOF tokens.
pub struct TokenStream<'a> {
    lexer: Lexer<'a>,
    /// Keep reference to the source so the parser can
    /// slice fragments from it.
    original: &'a str,
    /// Look ahead token.
    current: Token,
}

impl<'a> TokenStream<'a> {
    pub fn new(mut lexer: Lexer<'a>) -> Self {
        let current = lexer.next_token();
        Self {
            original: lexer.source_code(),
            lexer,
            current,
        }
    }

    pub fn source_code(&self) -> &'a str {
        self.original
    }

    /// Helper function to extract the span's string fragment
    /// from the original source code.
    #[inline]
    pub fn span_fragment(&self, span: &Span) -> &'a str {
        span.fragment(self.original)
    }

    /// Consumes the current token regardless of type.
    pub fn next_token(&mut self) -> Token {
        let next = self.lexer.next_token();
        std::mem::replace(&mut self.current, next)
    }

    /// Consumes the current token if it matches the given token kind.
    ///
    /// Does not consume the token if the kinds do not match.
    pub fn match_token(&mut self, token_kind: TokenKind) -> bool {
        let is_match = self.current.kind == token_kind;
        if is_match {
            let _ = self.next_token(); // discard
        }
        is_match
    }

    /// Return the current token without advancing the cursor.
    #[inline]
    pub fn peek(&self) -> &Token {
        &self.current
    }

    /// Return the current token kind without advancing the cursor.
    #[inline]
    pub fn peek_kind(&self) -> TokenKind {
        self.current.kind
    }

    /// Text of the current token.
    #[inline]
    pub fn peek_fragment(&self) -> &'a str {
        self.current.span.fragment(self.original)
    }

    #[inline]
    pub fn at_end(&self) -> bool {
        self.current.kind == TokenKind::EOF
    }

    /// Drain the remaining tokens without looking at them.
    pub fn skip_to_end(&mut self) {
        while !self.at_end() {
            let _ = self.next_token();
        }
    }
}
