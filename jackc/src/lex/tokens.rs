//! Tokens

use std::fmt;

/// Largest integer constant the target machine's 15-bit words can hold.
pub const MAX_INT: u32 = 32767;

#[derive(Debug, Clone)]
pub struct Token {
    pub span: Span,
    pub kind: TokenKind,
    /// Source line the token starts on, counting from 1.
    pub line: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[rustfmt::skip]
pub enum TokenKind {
    /// Reserved identifiers
    Keyword(Keyword),
    /// Single character punctuation or operator
    Symbol(Symbol),
    /// Number literal within [0, 32767]
    Integer,
    /// String literal, including both quotes
    String,
    Ident,

    // ------------------------------------------------------------------------
    // Special
    /// Token that could not be classified as anything legal.
    ///
    /// The lexer never fails, the parser decides how to report these.
    Malformed(Malformed),
    /// End-of-file
    EOF,
}

impl TokenKind {
    #[inline]
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        *self == TokenKind::Keyword(keyword)
    }

    #[inline]
    pub fn is_symbol(&self, symbol: Symbol) -> bool {
        *self == TokenKind::Symbol(symbol)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Keyword(keyword) => write!(f, "keyword '{keyword}'"),
            Self::Symbol(symbol) => write!(f, "symbol '{symbol}'"),
            Self::Integer => write!(f, "integer constant"),
            Self::String => write!(f, "string constant"),
            Self::Ident => write!(f, "identifier"),
            Self::Malformed(malformed) => write!(f, "{malformed}"),
            Self::EOF => write!(f, "end-of-file"),
        }
    }
}

/// Lexical error tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Malformed {
    /// Contains a newline, or is missing its closing quote.
    String,
    /// Starts with a digit but contains something other than digits.
    Integer,
    /// All digits, but larger than [`MAX_INT`].
    IntegerOutOfBounds,
    /// Contains characters outside of `\w`.
    Identifier,
}

impl fmt::Display for Malformed {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::String => write!(f, "malformed string constant (contains double quotes and/or newlines)"),
            Self::Integer => write!(f, "malformed integer constant (contains non-digits)"),
            Self::IntegerOutOfBounds => write!(f, "integer constant is out of bounds (max. value = {MAX_INT})"),
            Self::Identifier => write!(f, "malformed identifier"),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Span {
    pub index: u32,
    pub size: u32,
}

impl Span {
    pub fn new(index: u32, size: u32) -> Self {
        Self { index, size }
    }

    #[inline]
    pub fn fragment<'a>(&self, text: &'a str) -> &'a str {
        &text[(self.index as usize)..(self.end() as usize)]
    }

    /// Ending index of the span, exclusive.
    #[inline]
    pub fn end(&self) -> u32 {
        self.index + self.size
    }
}

/// Reserved keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[rustfmt::skip]
pub enum Keyword {
    // ------------------------------------------------------------------------
    // Declarations
    Class,        // class
    Constructor,  // constructor
    Function,     // function
    Method,       // method
    Field,        // field
    Static,       // static
    Var,          // var

    // ------------------------------------------------------------------------
    // Types
    Int,          // int
    Char,         // char
    Boolean,      // boolean
    Void,         // void

    // ------------------------------------------------------------------------
    // Constants
    True,         // true
    False,        // false
    Null,         // null
    This,         // this

    // ------------------------------------------------------------------------
    // Statements
    Let,          // let
    Do,           // do
    If,           // if
    Else,         // else
    While,        // while
    Return,       // return
}

impl Keyword {
    #[rustfmt::skip]
    pub fn parse(text: impl AsRef<str>) -> Option<Self> {
        match text.as_ref() {
            "class"       => Some(Self::Class),
            "constructor" => Some(Self::Constructor),
            "function"    => Some(Self::Function),
            "method"      => Some(Self::Method),
            "field"       => Some(Self::Field),
            "static"      => Some(Self::Static),
            "var"         => Some(Self::Var),
            // ----------------------------------------------------------------
            "int"         => Some(Self::Int),
            "char"        => Some(Self::Char),
            "boolean"     => Some(Self::Boolean),
            "void"        => Some(Self::Void),
            // ----------------------------------------------------------------
            "true"        => Some(Self::True),
            "false"       => Some(Self::False),
            "null"        => Some(Self::Null),
            "this"        => Some(Self::This),
            // ----------------------------------------------------------------
            "let"         => Some(Self::Let),
            "do"          => Some(Self::Do),
            "if"          => Some(Self::If),
            "else"        => Some(Self::Else),
            "while"       => Some(Self::While),
            "return"      => Some(Self::Return),
            _ => None,
        }
    }

    #[rustfmt::skip]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Class       => "class",
            Self::Constructor => "constructor",
            Self::Function    => "function",
            Self::Method      => "method",
            Self::Field       => "field",
            Self::Static      => "static",
            Self::Var         => "var",
            Self::Int         => "int",
            Self::Char        => "char",
            Self::Boolean     => "boolean",
            Self::Void        => "void",
            Self::True        => "true",
            Self::False       => "false",
            Self::Null        => "null",
            Self::This        => "this",
            Self::Let         => "let",
            Self::Do          => "do",
            Self::If          => "if",
            Self::Else        => "else",
            Self::While       => "while",
            Self::Return      => "return",
        }
    }

    /// Built-in primitive types, which are never class names.
    #[inline]
    pub fn is_primitive_type(&self) -> bool {
        matches!(self, Self::Int | Self::Char | Self::Boolean)
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[rustfmt::skip]
pub enum Symbol {
    LeftBrace,    // {
    RightBrace,   // }
    LeftParen,    // (
    RightParen,   // )
    LeftBracket,  // [
    RightBracket, // ]
    Dot,          // .
    Comma,        // ,
    Semicolon,    // ;
    Plus,         // +
    Minus,        // -
    Star,         // *
    Slash,        // /
    Amp,          // &
    Pipe,         // |
    Less,         // <
    Greater,      // >
    Eq,           // =
    Tilde,        // ~
}

impl Symbol {
    #[rustfmt::skip]
    pub fn parse(c: char) -> Option<Self> {
        match c {
            '{' => Some(Self::LeftBrace),
            '}' => Some(Self::RightBrace),
            '(' => Some(Self::LeftParen),
            ')' => Some(Self::RightParen),
            '[' => Some(Self::LeftBracket),
            ']' => Some(Self::RightBracket),
            '.' => Some(Self::Dot),
            ',' => Some(Self::Comma),
            ';' => Some(Self::Semicolon),
            '+' => Some(Self::Plus),
            '-' => Some(Self::Minus),
            '*' => Some(Self::Star),
            '/' => Some(Self::Slash),
            '&' => Some(Self::Amp),
            '|' => Some(Self::Pipe),
            '<' => Some(Self::Less),
            '>' => Some(Self::Greater),
            '=' => Some(Self::Eq),
            '~' => Some(Self::Tilde),
            _ => None,
        }
    }

    #[rustfmt::skip]
    pub fn as_char(&self) -> char {
        match self {
            Self::LeftBrace    => '{',
            Self::RightBrace   => '}',
            Self::LeftParen    => '(',
            Self::RightParen   => ')',
            Self::LeftBracket  => '[',
            Self::RightBracket => ']',
            Self::Dot          => '.',
            Self::Comma        => ',',
            Self::Semicolon    => ';',
            Self::Plus         => '+',
            Self::Minus        => '-',
            Self::Star         => '*',
            Self::Slash        => '/',
            Self::Amp          => '&',
            Self::Pipe         => '|',
            Self::Less         => '<',
            Self::Greater      => '>',
            Self::Eq           => '=',
            Self::Tilde        => '~',
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Classify a complete token fragment.
///
/// Never fails. Illegal fragments are tagged [`TokenKind::Malformed`]
/// so the parser can produce a precise diagnostic.
pub fn token_kind(text: &str) -> TokenKind {
    if let Some(keyword) = Keyword::parse(text) {
        return TokenKind::Keyword(keyword);
    }

    let mut chars = text.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return TokenKind::Malformed(Malformed::Identifier),
    };

    if chars.as_str().is_empty() {
        if let Some(symbol) = Symbol::parse(first) {
            return TokenKind::Symbol(symbol);
        }
    }

    if first == '"' {
        // Exactly two quotes (opening and closing) and no newlines.
        let inner_ok = text.len() >= 2
            && text.ends_with('"')
            && !text[1..text.len() - 1].contains(|c| c == '"' || c == '\n');
        return if inner_ok {
            TokenKind::String
        } else {
            TokenKind::Malformed(Malformed::String)
        };
    }

    if first.is_ascii_digit() {
        if !text.chars().all(|c| c.is_ascii_digit()) {
            return TokenKind::Malformed(Malformed::Integer);
        }
        return match text.parse::<u32>() {
            Ok(value) if value <= MAX_INT => TokenKind::Integer,
            _ => TokenKind::Malformed(Malformed::IntegerOutOfBounds),
        };
    }

    if text.chars().all(is_word_char) {
        TokenKind::Ident
    } else {
        TokenKind::Malformed(Malformed::Identifier)
    }
}

/// Character class `\w`.
#[inline]
pub(crate) fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
