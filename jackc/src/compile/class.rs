//! Class, class variable and subroutine declarations.
use super::{CodeGen, LabelCounter, SubroutineCtx};
use crate::{
    constants::MEMORY_ALLOC,
    error::{CompileError, ErrorKind, Expected},
    lex::{Keyword, Symbol, TokenKind},
    registry::{AlreadyDeclared, SubroutineKind},
    symbol::SymbolKind,
    vm::{Instr, Segment},
};
use smol_str::SmolStr;

impl<'a, 'r> CodeGen<'a, 'r> {
    /// `class className { classVarDec* subroutineDec* }` followed by end-of-file.
    pub(super) fn compile_class(&mut self) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::Class)?;

        let (name_token, name) = self.expect_ident()?;
        if name != self.file {
            return Err(self.error(&name_token, ErrorKind::ClassNameMismatch));
        }
        let site = self.site(&name_token);
        self.registry.declare_class(&name, site);

        self.expect_symbol(Symbol::LeftBrace)?;

        let mut in_subroutines = false;
        loop {
            match self.stream.peek_kind() {
                TokenKind::Keyword(Keyword::Static | Keyword::Field) if !in_subroutines => {
                    self.compile_class_var_dec()?;
                }
                TokenKind::Keyword(Keyword::Constructor | Keyword::Function | Keyword::Method) => {
                    in_subroutines = true;
                    self.compile_subroutine_dec()?;
                }
                TokenKind::Symbol(Symbol::RightBrace) => break,
                _ => {
                    let expected = if in_subroutines {
                        Expected::Subroutine
                    } else {
                        Expected::ClassMember
                    };
                    return Err(self.unexpected(self.stream.peek(), expected));
                }
            }
        }

        self.expect_symbol(Symbol::RightBrace)?;

        if !self.stream.at_end() {
            return Err(self.unexpected(self.stream.peek(), Expected::EndOfFile));
        }

        Ok(())
    }

    /// `(static | field) type varName (, varName)* ;`
    fn compile_class_var_dec(&mut self) -> Result<(), CompileError> {
        let kind = match self.stream.next_token().kind {
            TokenKind::Keyword(Keyword::Static) => SymbolKind::Static,
            _ => SymbolKind::Field,
        };

        let ty = self.compile_type()?;
        loop {
            let (token, name) = self.expect_ident()?;
            if !self.class_scope.define(name, ty.clone(), kind) {
                return Err(self.error(&token, ErrorKind::DuplicateVariable));
            }

            if !self.stream.match_token(TokenKind::Symbol(Symbol::Comma)) {
                break;
            }
        }

        self.expect_symbol(Symbol::Semicolon)?;
        Ok(())
    }

    /// `int | char | boolean | className`
    ///
    /// Class names are recorded as used, so the unit can check
    /// that some file declares them.
    fn compile_type(&mut self) -> Result<SmolStr, CompileError> {
        match self.stream.peek_kind() {
            TokenKind::Keyword(keyword) if keyword.is_primitive_type() => {
                self.stream.next_token();
                Ok(SmolStr::new(keyword.as_str()))
            }
            TokenKind::Ident => {
                let (token, name) = self.expect_ident()?;
                let site = self.site(&token);
                self.registry.use_class(&name, site);
                Ok(name)
            }
            _ => Err(self.unexpected(self.stream.peek(), Expected::Type)),
        }
    }

    /// `(constructor | function | method) (void | type) subroutineName ( parameterList ) subroutineBody`
    fn compile_subroutine_dec(&mut self) -> Result<(), CompileError> {
        let kind = match self.stream.next_token().kind {
            TokenKind::Keyword(Keyword::Constructor) => SubroutineKind::Constructor,
            TokenKind::Keyword(Keyword::Method) => SubroutineKind::Method,
            _ => SubroutineKind::Function,
        };

        let is_void = self.stream.match_token(TokenKind::Keyword(Keyword::Void));
        if !is_void {
            self.compile_type()?;
        }

        let (name_token, name) = self.expect_ident()?;

        self.sub_scope.start_subroutine();
        self.labels = LabelCounter::default();
        self.subroutine = Some(SubroutineCtx {
            name: name.clone(),
            kind,
            is_void,
        });

        // Receiver is the hidden first argument of a method.
        if kind == SubroutineKind::Method {
            self.sub_scope.define("this", self.file.clone(), SymbolKind::Argument);
        }

        self.expect_symbol(Symbol::LeftParen)?;
        self.compile_parameter_list()?;
        self.expect_symbol(Symbol::RightParen)?;

        let qualified = self.qualify(&name);
        let n_args = self.sub_scope.var_count(SymbolKind::Argument);
        let site = self.site(&name_token);
        let declared = self.registry.declare_subroutine(&qualified, kind, n_args, site);
        if let Err(AlreadyDeclared { previous }) = declared {
            return Err(self.error(&name_token, ErrorKind::DuplicateSubroutine(qualified, previous)));
        }

        self.compile_subroutine_body(qualified, kind)
    }

    /// `((type varName) (, type varName)*)?`
    fn compile_parameter_list(&mut self) -> Result<(), CompileError> {
        if self.peek_symbol(Symbol::RightParen) {
            return Ok(());
        }

        loop {
            let ty = self.compile_type()?;
            let (token, name) = self.expect_ident()?;
            if !self.sub_scope.define(name, ty, SymbolKind::Argument) {
                return Err(self.error(&token, ErrorKind::DuplicateVariable));
            }

            if !self.stream.match_token(TokenKind::Symbol(Symbol::Comma)) {
                break;
            }
        }

        Ok(())
    }

    /// `{ varDec* statements }`
    fn compile_subroutine_body(&mut self, qualified: SmolStr, kind: SubroutineKind) -> Result<(), CompileError> {
        self.expect_symbol(Symbol::LeftBrace)?;

        while self.stream.peek_kind().is_keyword(Keyword::Var) {
            self.compile_var_dec()?;
        }

        // Local count is only known after every `var`.
        let n_locals = self.sub_scope.var_count(SymbolKind::Local);
        self.emit(Instr::Function(qualified, n_locals));

        match kind {
            SubroutineKind::Constructor => {
                let n_fields = self.class_scope.var_count(SymbolKind::Field);
                self.emit(Instr::Push(Segment::Constant, n_fields));
                self.emit(Instr::Call(MEMORY_ALLOC.into(), 1));
                self.emit(Instr::Pop(Segment::Pointer, 0));
            }
            SubroutineKind::Method => {
                self.emit(Instr::Push(Segment::Argument, 0));
                self.emit(Instr::Pop(Segment::Pointer, 0));
            }
            SubroutineKind::Function => {}
        }

        self.compile_statements()?;
        self.expect_symbol(Symbol::RightBrace)?;
        Ok(())
    }

    /// `var type varName (, varName)* ;`
    fn compile_var_dec(&mut self) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::Var)?;

        let ty = self.compile_type()?;
        loop {
            let (token, name) = self.expect_ident()?;
            if !self.sub_scope.define(name, ty.clone(), SymbolKind::Local) {
                return Err(self.error(&token, ErrorKind::DuplicateVariable));
            }

            if !self.stream.match_token(TokenKind::Symbol(Symbol::Comma)) {
                break;
            }
        }

        self.expect_symbol(Symbol::Semicolon)?;
        Ok(())
    }
}
