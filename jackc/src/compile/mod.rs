//! Single pass parser and code generator.
//!
//! Each grammar production is a method on [`CodeGen`] that consumes its
//! tokens and emits VM instructions as soon as a construct is recognised.
//! There is no syntax tree.
mod class;
mod expr;
mod stmts;

use crate::{
    error::{CompileError, ErrorKind, Expected},
    lex::{Keyword, Lexer, Symbol, Token, TokenKind, TokenStream},
    registry::{Registry, Site, SubroutineKind},
    symbol::{self, SymbolTable},
    vm::Instr,
};
use smol_str::SmolStr;

/// Result of compiling one source file.
#[derive(Debug)]
pub struct FileOutput {
    /// Class name, taken from the file's base name.
    pub class: SmolStr,
    /// Instructions emitted before compilation finished or stopped.
    pub code: Vec<Instr>,
    /// The first local error, if any.
    ///
    /// When set, `code` is incomplete and must not be written out.
    pub error: Option<CompileError>,
}

impl FileOutput {
    #[inline]
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Compile the source of one class into VM code.
///
/// Classes and subroutines that the file uses or declares are recorded
/// in the registry, which is shared by every file of the unit.
pub fn compile_file(class: &str, source: &str, registry: &mut Registry) -> FileOutput {
    log::debug!("compiling {}", class);

    let mut codegen = CodeGen::new(class, Lexer::new(source), registry);
    let error = codegen.compile_class().err();

    if let Some(ref err) = error {
        log::error!("{}", err);
        // Remaining tokens are no longer meaningful.
        codegen.stream.skip_to_end();
    }

    log::trace!("{}: emitted {} instructions", class, codegen.code.len());

    FileOutput {
        class: SmolStr::new(class),
        code: codegen.code,
        error,
    }
}

/// Subroutine currently being compiled.
struct SubroutineCtx {
    name: SmolStr,
    kind: SubroutineKind,
    is_void: bool,
}

/// Per-subroutine label suffixes, one sequence per construct.
#[derive(Default)]
struct LabelCounter {
    if_count: u32,
    while_count: u32,
}

/// Code generator for a single file.
pub(crate) struct CodeGen<'a, 'r> {
    stream: TokenStream<'a>,
    /// Unit-wide records, outliving this file.
    registry: &'r mut Registry,
    /// Class name the file must declare.
    file: SmolStr,
    /// Statics and fields.
    class_scope: SymbolTable,
    /// Arguments and locals of the current subroutine.
    sub_scope: SymbolTable,
    subroutine: Option<SubroutineCtx>,
    labels: LabelCounter,
    /// Resulting generated code.
    code: Vec<Instr>,
}

impl<'a, 'r> CodeGen<'a, 'r> {
    pub(crate) fn new(file: &str, lexer: Lexer<'a>, registry: &'r mut Registry) -> Self {
        Self {
            stream: TokenStream::new(lexer),
            registry,
            file: SmolStr::new(file),
            class_scope: SymbolTable::new(),
            sub_scope: SymbolTable::new(),
            subroutine: None,
            labels: LabelCounter::default(),
            code: vec![],
        }
    }

    #[inline]
    fn emit(&mut self, instr: Instr) {
        self.code.push(instr)
    }

    fn site(&self, token: &Token) -> Site {
        Site::new(self.file.clone(), token.line)
    }

    #[inline]
    fn fragment(&self, token: &Token) -> &'a str {
        self.stream.span_fragment(&token.span)
    }

    #[inline(never)]
    #[cold]
    fn error(&self, token: &Token, kind: ErrorKind) -> CompileError {
        CompileError {
            file: self.file.clone(),
            line: token.line,
            fragment: self.fragment(token).to_string(),
            kind,
        }
    }

    /// Error for a token that doesn't fit the grammar.
    ///
    /// Malformed tokens are reported as lexical errors, since
    /// that is the real problem.
    #[inline(never)]
    #[cold]
    fn unexpected(&self, token: &Token, expected: Expected) -> CompileError {
        match token.kind {
            TokenKind::Malformed(malformed) => self.error(token, ErrorKind::Lexical(malformed)),
            _ => self.error(token, ErrorKind::Expected(expected)),
        }
    }

    fn expect_symbol(&mut self, symbol: Symbol) -> Result<Token, CompileError> {
        if self.stream.peek_kind().is_symbol(symbol) {
            Ok(self.stream.next_token())
        } else {
            Err(self.unexpected(self.stream.peek(), Expected::Symbol(symbol)))
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<Token, CompileError> {
        if self.stream.peek_kind().is_keyword(keyword) {
            Ok(self.stream.next_token())
        } else {
            Err(self.unexpected(self.stream.peek(), Expected::Keyword(keyword)))
        }
    }

    fn expect_ident(&mut self) -> Result<(Token, SmolStr), CompileError> {
        if self.stream.peek_kind() == TokenKind::Ident {
            let token = self.stream.next_token();
            let name = SmolStr::new(self.fragment(&token));
            Ok((token, name))
        } else {
            Err(self.unexpected(self.stream.peek(), Expected::Identifier))
        }
    }

    #[inline]
    fn peek_symbol(&self, symbol: Symbol) -> bool {
        self.stream.peek_kind().is_symbol(symbol)
    }

    /// Qualified name of a subroutine in the file's class.
    fn qualify(&self, name: &str) -> SmolStr {
        qualify(&self.file, name)
    }

    /// Resolve a variable, innermost scope first.
    fn lookup(&self, name: &str) -> Option<&symbol::Symbol> {
        symbol::lookup(&self.sub_scope, &self.class_scope, name)
    }

    /// Unique label for a branch target within the current subroutine.
    fn label(&self, construct: &str, index: u32) -> SmolStr {
        let sub = self.subroutine.as_ref().map(|s| s.name.as_str()).unwrap_or_default();
        SmolStr::from(format!("{}.{}.{}.{}", self.file, sub, construct, index))
    }
}

fn qualify(class: &str, name: &str) -> SmolStr {
    SmolStr::from(format!("{}.{}", class, name))
}
