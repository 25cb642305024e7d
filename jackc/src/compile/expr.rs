//! Expressions, terms and subroutine calls.
use super::{qualify, CodeGen};
use crate::{
    constants::{STRING_APPEND_CHAR, STRING_NEW},
    error::{CompileError, ErrorKind, Expected},
    lex::{Keyword, Malformed, Symbol, Token, TokenKind, MAX_INT},
    registry::SubroutineKind,
    vm::{Command, Instr, Segment},
};
use smol_str::SmolStr;

/// How a binary operator is compiled.
#[derive(Debug, Clone, Copy)]
enum BinaryOp {
    /// Applied right after its right operand.
    Multiply,
    Divide,
    /// Right operand is negated, then added like a deferred `+`.
    Subtract,
    /// Held on the operator stack until the expression ends.
    Deferred(Command),
}

#[rustfmt::skip]
fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Symbol(symbol) => match symbol {
            Symbol::Star    => Some(BinaryOp::Multiply),
            Symbol::Slash   => Some(BinaryOp::Divide),
            Symbol::Minus   => Some(BinaryOp::Subtract),
            Symbol::Plus    => Some(BinaryOp::Deferred(Command::Add)),
            Symbol::Amp     => Some(BinaryOp::Deferred(Command::And)),
            Symbol::Pipe    => Some(BinaryOp::Deferred(Command::Or)),
            Symbol::Less    => Some(BinaryOp::Deferred(Command::Lt)),
            Symbol::Greater => Some(BinaryOp::Deferred(Command::Gt)),
            Symbol::Eq      => Some(BinaryOp::Deferred(Command::Eq)),
            _ => None,
        },
        _ => None,
    }
}

impl<'a, 'r> CodeGen<'a, 'r> {
    /// `term (op term)*`
    ///
    /// Deferred operators are unwound last in first out once the
    /// final term is compiled, so `a - b - c` computes `a + (-b) + (-c)`.
    pub(super) fn compile_expression(&mut self) -> Result<(), CompileError> {
        let mut pending: Vec<Command> = vec![];

        self.compile_term()?;

        while let Some(op) = binary_op(self.stream.peek_kind()) {
            self.stream.next_token();
            self.compile_term()?;

            match op {
                BinaryOp::Multiply => self.emit(Instr::Multiply),
                BinaryOp::Divide => self.emit(Instr::Divide),
                BinaryOp::Subtract => {
                    self.emit(Instr::Arithmetic(Command::Neg));
                    pending.push(Command::Add);
                }
                BinaryOp::Deferred(command) => pending.push(command),
            }
        }

        while let Some(command) = pending.pop() {
            self.emit(Instr::Arithmetic(command));
        }

        Ok(())
    }

    fn compile_term(&mut self) -> Result<(), CompileError> {
        let token = self.stream.peek().clone();

        match token.kind {
            TokenKind::Integer => {
                self.stream.next_token();
                let value = self
                    .fragment(&token)
                    .parse::<u16>()
                    .map_err(|_| self.error(&token, ErrorKind::Lexical(Malformed::IntegerOutOfBounds)))?;
                self.emit(Instr::Push(Segment::Constant, value));
            }
            TokenKind::String => {
                self.stream.next_token();
                self.compile_string(&token)?;
            }
            TokenKind::Keyword(Keyword::True) => {
                self.stream.next_token();
                self.emit(Instr::Push(Segment::Constant, 0));
                self.emit(Instr::Arithmetic(Command::Not));
            }
            TokenKind::Keyword(Keyword::False | Keyword::Null) => {
                self.stream.next_token();
                self.emit(Instr::Push(Segment::Constant, 0));
            }
            TokenKind::Keyword(Keyword::This) => {
                self.stream.next_token();
                self.emit(Instr::Push(Segment::Pointer, 0));
            }
            TokenKind::Ident => {
                let (token, name) = self.expect_ident()?;
                match self.stream.peek_kind() {
                    TokenKind::Symbol(Symbol::LeftBracket) => self.compile_array_read(&token, &name)?,
                    TokenKind::Symbol(Symbol::LeftParen | Symbol::Dot) => {
                        self.compile_subroutine_call(&token, name)?
                    }
                    _ => self.compile_var_read(&token, &name)?,
                }
            }
            TokenKind::Symbol(Symbol::LeftParen) => {
                self.stream.next_token();
                self.compile_expression()?;
                self.expect_symbol(Symbol::RightParen)?;
            }
            TokenKind::Symbol(Symbol::Minus) => {
                self.stream.next_token();
                self.compile_term()?;
                self.emit(Instr::Arithmetic(Command::Neg));
            }
            TokenKind::Symbol(Symbol::Tilde) => {
                self.stream.next_token();
                self.compile_term()?;
                self.emit(Instr::Arithmetic(Command::Not));
            }
            _ => return Err(self.unexpected(&token, Expected::Term)),
        }

        Ok(())
    }

    /// Builds the string at runtime, one character at a time.
    fn compile_string(&mut self, token: &Token) -> Result<(), CompileError> {
        let text = self.fragment(token);
        // Strip the quotes.
        let content = &text[1..text.len() - 1];

        let mut codes = Vec::with_capacity(content.len());
        for c in content.chars() {
            let code = c as u32;
            if code > MAX_INT {
                return Err(self.error(token, ErrorKind::Lexical(Malformed::String)));
            }
            codes.push(code as u16);
        }

        let len = u16::try_from(codes.len())
            .map_err(|_| self.error(token, ErrorKind::Lexical(Malformed::String)))?;

        self.emit(Instr::Push(Segment::Constant, len));
        self.emit(Instr::Call(STRING_NEW.into(), 1));
        for code in codes {
            self.emit(Instr::Push(Segment::Constant, code));
            self.emit(Instr::Call(STRING_APPEND_CHAR.into(), 2));
        }

        Ok(())
    }

    fn compile_var_read(&mut self, token: &Token, name: &str) -> Result<(), CompileError> {
        match self.lookup(name) {
            Some(var) => {
                let instr = Instr::Push(var.kind.segment(), var.index);
                self.emit(instr);
                Ok(())
            }
            None => Err(self.error(token, ErrorKind::UndefinedVariable)),
        }
    }

    /// `varName [ expression ]`
    fn compile_array_read(&mut self, token: &Token, name: &str) -> Result<(), CompileError> {
        self.compile_var_read(token, name)?;
        self.expect_symbol(Symbol::LeftBracket)?;
        self.compile_expression()?;
        self.expect_symbol(Symbol::RightBracket)?;

        self.emit(Instr::Arithmetic(Command::Add));
        self.emit(Instr::Pop(Segment::Pointer, 1));
        self.emit(Instr::Push(Segment::That, 0));
        Ok(())
    }

    /// `subroutineName ( expressionList )`, or
    /// `(className | varName) . subroutineName ( expressionList )`.
    ///
    /// The first identifier has already been consumed.
    pub(super) fn compile_subroutine_call(&mut self, token: &Token, name: SmolStr) -> Result<(), CompileError> {
        let site = self.site(token);

        // Implicit receiver.
        if self.peek_symbol(Symbol::LeftParen) {
            let in_function = self
                .subroutine
                .as_ref()
                .map(|s| s.kind == SubroutineKind::Function)
                .unwrap_or(true);
            if in_function {
                return Err(self.error(token, ErrorKind::ImplicitCallInFunction));
            }

            self.emit(Instr::Push(Segment::Pointer, 0));
            let n_args = self.compile_call_args()? + 1;

            let qualified = self.qualify(&name);
            self.registry.call_subroutine(&qualified, SubroutineKind::Method, n_args, site);
            self.emit(Instr::Call(qualified, n_args));
            return Ok(());
        }

        self.expect_symbol(Symbol::Dot)?;
        let (_, subroutine) = self.expect_ident()?;

        let receiver = self.lookup(&name).map(|var| (var.ty.clone(), var.kind.segment(), var.index));
        let (qualified, kind, n_args) = match receiver {
            Some((class, segment, index)) => {
                self.emit(Instr::Push(segment, index));
                let n_args = self.compile_call_args()? + 1;
                (qualify(&class, &subroutine), SubroutineKind::Method, n_args)
            }
            None => {
                self.registry.use_class(&name, site.clone());
                let n_args = self.compile_call_args()?;
                (qualify(&name, &subroutine), SubroutineKind::Function, n_args)
            }
        };

        self.registry.call_subroutine(&qualified, kind, n_args, site);
        self.emit(Instr::Call(qualified, n_args));
        Ok(())
    }

    /// `( expressionList )`, returning the number of expressions.
    fn compile_call_args(&mut self) -> Result<u16, CompileError> {
        self.expect_symbol(Symbol::LeftParen)?;
        let n_args = self.compile_expression_list()?;
        self.expect_symbol(Symbol::RightParen)?;
        Ok(n_args)
    }

    /// `(expression (, expression)*)?`
    fn compile_expression_list(&mut self) -> Result<u16, CompileError> {
        if self.peek_symbol(Symbol::RightParen) {
            return Ok(0);
        }

        let mut count = 1;
        self.compile_expression()?;
        while self.stream.match_token(TokenKind::Symbol(Symbol::Comma)) {
            self.compile_expression()?;
            count += 1;
        }

        Ok(count)
    }
}
