//! Result and errors.
use crate::{
    lex::{Keyword, Malformed, Symbol},
    registry::{Site, SubroutineKind},
};
use itertools::Itertools;
use smol_str::SmolStr;
use std::{
    fmt::{self, Display, Formatter},
    io,
    path::PathBuf,
    str::Utf8Error,
};

pub type JackResult<T> = std::result::Result<T, JackError>;

#[derive(Debug)]
pub enum JackError {
    /// Problems that only show once every file in the unit was scanned.
    Unit(Vec<UnitError>),
    /// Source path holds no `.jack` files.
    NoSources(PathBuf),
    Io(io::Error),
    Utf8(Utf8Error),
    Fmt(fmt::Error),
}

impl Display for JackError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit(errs) => write!(f, "{}", errs.iter().join("\n")),
            Self::NoSources(path) => write!(f, "no .jack files found in {}", path.display()),
            Self::Io(err) => write!(f, "{}", err),
            Self::Utf8(err) => write!(f, "source is not valid UTF-8: {}", err),
            Self::Fmt(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for JackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Utf8(err) => Some(err),
            Self::Fmt(err) => Some(err),
            Self::Unit(_) | Self::NoSources(_) => None,
        }
    }
}

impl From<io::Error> for JackError {
    fn from(err: io::Error) -> Self {
        JackError::Io(err)
    }
}

impl From<Utf8Error> for JackError {
    fn from(err: Utf8Error) -> Self {
        JackError::Utf8(err)
    }
}

impl From<fmt::Error> for JackError {
    fn from(err: fmt::Error) -> Self {
        JackError::Fmt(err)
    }
}

/// Error local to one source file, located at the offending token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    /// Class name of the file, which is the file's base name.
    pub file: SmolStr,
    pub line: u32,
    /// Source text of the offending token.
    pub fragment: String,
    pub kind: ErrorKind,
}

impl Display for CompileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.jack:{}: ", self.file, self.line)?;

        let frag = &self.fragment;
        match &self.kind {
            ErrorKind::Lexical(malformed) => write!(f, "{}: {}", malformed, frag),
            ErrorKind::Expected(expected) => {
                if frag.is_empty() {
                    write!(f, "expected {}, found end-of-file", expected)
                } else {
                    write!(f, "expected {}, found '{}'", expected, frag)
                }
            }
            ErrorKind::DuplicateVariable => write!(f, "variable '{}' is already defined", frag),
            ErrorKind::UndefinedVariable => write!(f, "variable '{}' is not defined", frag),
            ErrorKind::ClassNameMismatch => {
                write!(f, "class '{}' must be declared in a file named {}.jack", frag, frag)
            }
            ErrorKind::ImplicitCallInFunction => write!(
                f,
                "subroutine '{}' can't be called without a receiver inside a function",
                frag
            ),
            ErrorKind::DuplicateSubroutine(name, previous) => write!(
                f,
                "subroutine '{}' is already declared, first declared at {}",
                name, previous
            ),
        }
    }
}

impl std::error::Error for CompileError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Token that doesn't classify as anything legal.
    Lexical(Malformed),
    /// Grammar violation.
    Expected(Expected),
    DuplicateVariable,
    UndefinedVariable,
    /// Class declared in a file with a different base name.
    ClassNameMismatch,
    /// Call of the form `name(...)` where there is no `this`.
    ImplicitCallInFunction,
    /// Qualified subroutine name declared twice in the unit,
    /// with the site of the first declaration.
    DuplicateSubroutine(SmolStr, Site),
}

/// What the parser was looking for when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    Keyword(Keyword),
    Symbol(Symbol),
    /// `int`, `char`, `boolean` or a class name.
    Type,
    Identifier,
    Term,
    Statement,
    /// `static`, `field`, `constructor`, `function`, `method` or `}`.
    ClassMember,
    /// Class variables must precede subroutines.
    Subroutine,
    EndOfFile,
}

impl Display for Expected {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyword(keyword) => write!(f, "keyword '{}'", keyword),
            Self::Symbol(symbol) => write!(f, "symbol '{}'", symbol),
            Self::Type => write!(f, "a type"),
            Self::Identifier => write!(f, "an identifier"),
            Self::Term => write!(f, "a term"),
            Self::Statement => write!(f, "a statement"),
            Self::ClassMember => write!(f, "a class variable or subroutine declaration"),
            Self::Subroutine => write!(f, "a subroutine declaration"),
            Self::EndOfFile => write!(f, "end-of-file"),
        }
    }
}

/// Problem that spans files, reported by unit validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
    /// Class was used but no file declared it.
    UndeclaredClass { class: SmolStr, site: Site },
    /// Subroutine was called but never declared.
    UndeclaredSubroutine { subroutine: SmolStr, site: Site },
    /// Call and declaration disagree on the number of arguments.
    ArgCountMismatch {
        subroutine: SmolStr,
        expected: u16,
        found: u16,
        site: Site,
    },
    /// Call convention doesn't fit the kind of subroutine.
    KindMismatch {
        subroutine: SmolStr,
        expected: SubroutineKind,
        found: SubroutineKind,
        site: Site,
    },
}

impl Display for UnitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::UndeclaredClass { class, site } => {
                write!(f, "{}: class '{}' is never declared", site, class)
            }
            Self::UndeclaredSubroutine { subroutine, site } => {
                write!(f, "{}: subroutine '{}' is never declared", site, subroutine)
            }
            Self::ArgCountMismatch {
                subroutine,
                expected,
                found,
                site,
            } => write!(
                f,
                "{}: subroutine '{}' takes {} argument(s), but {} were given",
                site, subroutine, expected, found
            ),
            Self::KindMismatch {
                subroutine,
                expected,
                found,
                site,
            } => write!(
                f,
                "{}: subroutine '{}' is a {}, but is called as a {}",
                site, subroutine, expected, found
            ),
        }
    }
}

impl std::error::Error for UnitError {}
