//! Statements.
use super::CodeGen;
use crate::{
    error::{CompileError, ErrorKind, Expected},
    lex::{Keyword, Symbol, TokenKind},
    vm::{Command, Instr, Segment},
};

impl<'a, 'r> CodeGen<'a, 'r> {
    /// Statements up to, but not including, the closing `}`.
    pub(super) fn compile_statements(&mut self) -> Result<(), CompileError> {
        loop {
            match self.stream.peek_kind() {
                TokenKind::Keyword(Keyword::Let) => self.compile_let()?,
                TokenKind::Keyword(Keyword::Do) => self.compile_do()?,
                TokenKind::Keyword(Keyword::If) => self.compile_if()?,
                TokenKind::Keyword(Keyword::While) => self.compile_while()?,
                TokenKind::Keyword(Keyword::Return) => self.compile_return()?,
                TokenKind::Symbol(Symbol::RightBrace) => return Ok(()),
                _ => return Err(self.unexpected(self.stream.peek(), Expected::Statement)),
            }
        }
    }

    /// `let varName ([ expression ])? = expression ;`
    fn compile_let(&mut self) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::Let)?;

        let (token, name) = self.expect_ident()?;
        let (segment, index) = match self.lookup(&name) {
            Some(var) => (var.kind.segment(), var.index),
            None => return Err(self.error(&token, ErrorKind::UndefinedVariable)),
        };

        if self.stream.match_token(TokenKind::Symbol(Symbol::LeftBracket)) {
            // Element address.
            self.emit(Instr::Push(segment, index));
            self.compile_expression()?;
            self.expect_symbol(Symbol::RightBracket)?;
            self.emit(Instr::Arithmetic(Command::Add));

            self.expect_symbol(Symbol::Eq)?;
            self.compile_expression()?;
            self.expect_symbol(Symbol::Semicolon)?;

            // The value may itself have used `that`, so park it
            // while the address is loaded.
            self.emit(Instr::Pop(Segment::Temp, 0));
            self.emit(Instr::Pop(Segment::Pointer, 1));
            self.emit(Instr::Push(Segment::Temp, 0));
            self.emit(Instr::Pop(Segment::That, 0));
        } else {
            self.expect_symbol(Symbol::Eq)?;
            self.compile_expression()?;
            self.expect_symbol(Symbol::Semicolon)?;
            self.emit(Instr::Pop(segment, index));
        }

        Ok(())
    }

    /// `do subroutineCall ;`
    fn compile_do(&mut self) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::Do)?;

        let (token, name) = self.expect_ident()?;
        self.compile_subroutine_call(&token, name)?;
        self.expect_symbol(Symbol::Semicolon)?;

        // Discard the return value.
        self.emit(Instr::Pop(Segment::Temp, 0));
        Ok(())
    }

    /// `if ( expression ) { statements } (else { statements })?`
    fn compile_if(&mut self) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::If)?;

        let index = self.labels.if_count;
        self.labels.if_count += 1;
        let else_label = self.label("IfStatementELSE", index);
        let end_label = self.label("IfStatementEND", index);

        self.expect_symbol(Symbol::LeftParen)?;
        self.compile_expression()?;
        self.expect_symbol(Symbol::RightParen)?;
        self.emit(Instr::Arithmetic(Command::Not));
        self.emit(Instr::IfGoto(else_label.clone()));

        self.expect_symbol(Symbol::LeftBrace)?;
        self.compile_statements()?;
        self.expect_symbol(Symbol::RightBrace)?;
        self.emit(Instr::Goto(end_label.clone()));

        self.emit(Instr::Label(else_label));
        if self.stream.match_token(TokenKind::Keyword(Keyword::Else)) {
            self.expect_symbol(Symbol::LeftBrace)?;
            self.compile_statements()?;
            self.expect_symbol(Symbol::RightBrace)?;
        }
        self.emit(Instr::Label(end_label));

        Ok(())
    }

    /// `while ( expression ) { statements }`
    fn compile_while(&mut self) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::While)?;

        let index = self.labels.while_count;
        self.labels.while_count += 1;
        let loop_label = self.label("WhileLOOP", index);
        let end_label = self.label("WhileEND_LOOP", index);

        self.emit(Instr::Label(loop_label.clone()));
        self.expect_symbol(Symbol::LeftParen)?;
        self.compile_expression()?;
        self.expect_symbol(Symbol::RightParen)?;
        self.emit(Instr::Arithmetic(Command::Not));
        self.emit(Instr::IfGoto(end_label.clone()));

        self.expect_symbol(Symbol::LeftBrace)?;
        self.compile_statements()?;
        self.expect_symbol(Symbol::RightBrace)?;

        self.emit(Instr::Goto(loop_label));
        self.emit(Instr::Label(end_label));

        Ok(())
    }

    /// `return expression? ;`
    fn compile_return(&mut self) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::Return)?;

        if !self.peek_symbol(Symbol::Semicolon) {
            self.compile_expression()?;
        }
        self.expect_symbol(Symbol::Semicolon)?;

        // Every call leaves exactly one value on the caller's stack.
        let is_void = self.subroutine.as_ref().map(|s| s.is_void).unwrap_or(false);
        if is_void {
            self.emit(Instr::Push(Segment::Constant, 0));
        }
        self.emit(Instr::Return);

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::{
        compile::compile_file,
        error::{ErrorKind, Expected},
        registry::Registry,
        vm::{to_vm_string, Instr},
    };

    fn compile_ok(class: &str, source: &str) -> String {
        let mut registry = Registry::new();
        let output = compile_file(class, source, &mut registry);
        assert!(output.is_ok(), "{:?}", output.error);
        to_vm_string(&output.code)
    }

    #[test]
    fn test_if_else() {
        let vm = compile_ok(
            "Main",
            "class Main {
                function int sign(int n) {
                    if (n < 0) { return 1; } else { return 0; }
                }
            }",
        );
        assert_eq!(
            vm,
            "\
function Main.sign 0
push argument 0
push constant 0
lt
not
if-goto Main.sign.IfStatementELSE.0
push constant 1
return
goto Main.sign.IfStatementEND.0
label Main.sign.IfStatementELSE.0
push constant 0
return
label Main.sign.IfStatementEND.0
"
        );
    }

    #[test]
    fn test_while() {
        let vm = compile_ok(
            "Main",
            "class Main {
                function void spin() {
                    var int i;
                    while (i < 10) { let i = i + 1; }
                    return;
                }
            }",
        );
        assert_eq!(
            vm,
            "\
function Main.spin 1
label Main.spin.WhileLOOP.0
push local 0
push constant 10
lt
not
if-goto Main.spin.WhileEND_LOOP.0
push local 0
push constant 1
add
pop local 0
goto Main.spin.WhileLOOP.0
label Main.spin.WhileEND_LOOP.0
push constant 0
return
"
        );
    }

    #[test]
    fn test_labels_per_construct_and_subroutine() {
        let mut registry = Registry::new();
        let output = compile_file(
            "Main",
            "class Main {
                function void a() {
                    while (true) { if (true) { } }
                    if (false) { } else { }
                    while (false) { }
                    return;
                }
                function void b() {
                    if (true) { }
                    return;
                }
            }",
            &mut registry,
        );
        assert!(output.is_ok(), "{:?}", output.error);

        let labels = output
            .code
            .iter()
            .filter_map(|instr| match instr {
                Instr::Label(label) => Some(label.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>();

        assert_eq!(
            labels,
            vec![
                "Main.a.WhileLOOP.0",
                "Main.a.IfStatementELSE.0",
                "Main.a.IfStatementEND.0",
                "Main.a.WhileEND_LOOP.0",
                "Main.a.IfStatementELSE.1",
                "Main.a.IfStatementEND.1",
                "Main.a.WhileLOOP.1",
                "Main.a.WhileEND_LOOP.1",
                "Main.b.IfStatementELSE.0",
                "Main.b.IfStatementEND.0",
            ]
        );
    }

    #[test]
    fn test_array_assignment() {
        let vm = compile_ok(
            "Main",
            "class Main {
                function void set(Array a, int i) {
                    let a[i] = a[i + 1];
                    return;
                }
            }",
        );
        assert_eq!(
            vm,
            "\
function Main.set 0
push argument 0
push argument 1
add
push argument 0
push argument 1
push constant 1
add
add
pop pointer 1
push that 0
pop temp 0
pop pointer 1
push temp 0
pop that 0
push constant 0
return
"
        );
    }

    #[test]
    fn test_undefined_variable() {
        let mut registry = Registry::new();
        let output = compile_file(
            "Main",
            "class Main {\n function void f() {\n let y = 1;\n return;\n }\n}",
            &mut registry,
        );
        let err = output.error.expect("undefined variable");
        assert_eq!(err.kind, ErrorKind::UndefinedVariable);
        assert_eq!(err.fragment, "y");
        assert_eq!(err.line, 3);
    }

    #[test]
    fn test_missing_statement() {
        let mut registry = Registry::new();
        let output = compile_file(
            "Main",
            "class Main { function void f() { var int x; x = 1; return; } }",
            &mut registry,
        );
        let err = output.error.expect("missing let");
        assert_eq!(err.kind, ErrorKind::Expected(Expected::Statement));
        assert_eq!(err.fragment, "x");
    }
}
