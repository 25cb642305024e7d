//! Tokenizer for Jack source text.
mod cursor;
mod lexer;
mod token_stream;
mod tokens;

pub use self::{
    lexer::{Lexer, LexerIter},
    token_stream::TokenStream,
    tokens::{token_kind, Keyword, Malformed, Span, Symbol, Token, TokenKind, MAX_INT},
};
