use jackc::{
    prelude::*,
    registry::Site,
    vm::{Command, Segment},
    ErrorKind,
};

const COUNTER_MAIN: &str = include_str!("../programs/counter/Main.jack");
const COUNTER: &str = include_str!("../programs/counter/Counter.jack");

const SQUARE_MAIN: &str = include_str!("../programs/square/Main.jack");
const SQUARE: &str = include_str!("../programs/square/Square.jack");
const SQUARE_GAME: &str = include_str!("../programs/square/SquareGame.jack");

/// Evaluate straight-line VM code of a function, returning its result.
fn eval(code: &[Instr], args: &[i16]) -> i16 {
    let mut stack: Vec<i16> = vec![];

    for instr in code {
        match instr {
            Instr::Function(..) => {}
            Instr::Push(Segment::Argument, index) => stack.push(args[*index as usize]),
            Instr::Push(Segment::Constant, value) => stack.push(*value as i16),
            Instr::Arithmetic(Command::Neg) => {
                let a = stack.pop().unwrap();
                stack.push(a.wrapping_neg());
            }
            Instr::Arithmetic(Command::Not) => {
                let a = stack.pop().unwrap();
                stack.push(!a);
            }
            Instr::Arithmetic(command) => {
                let b = stack.pop().unwrap();
                let a = stack.pop().unwrap();
                let result = match command {
                    Command::Add => a.wrapping_add(b),
                    Command::Sub => a.wrapping_sub(b),
                    Command::And => a & b,
                    Command::Or => a | b,
                    Command::Eq => -((a == b) as i16),
                    Command::Gt => -((a > b) as i16),
                    Command::Lt => -((a < b) as i16),
                    Command::Neg | Command::Not => unreachable!(),
                };
                stack.push(result);
            }
            Instr::Multiply => {
                let b = stack.pop().unwrap();
                let a = stack.pop().unwrap();
                stack.push(a.wrapping_mul(b));
            }
            Instr::Divide => {
                let b = stack.pop().unwrap();
                let a = stack.pop().unwrap();
                stack.push(a / b);
            }
            Instr::Return => return stack.pop().unwrap(),
            other => panic!("unsupported instruction: {}", other),
        }
    }

    panic!("function did not return")
}

fn eval_expression(expression: &str, args: &[i16]) -> i16 {
    let source = format!(
        "class Main {{ function int f(int a, int b, int c) {{ return {}; }} }}",
        expression
    );
    let output = compile_unit(CompilerConf::default(), [("Main", source.as_str())]);
    let file = &output.files[0];
    assert!(file.is_ok(), "{:?}", file.error);
    eval(&file.code, args)
}

fn unit_errors(output: &UnitOutput) -> Vec<UnitError> {
    match &output.validation {
        Ok(_) => vec![],
        Err(JackError::Unit(errors)) => errors.clone(),
        Err(err) => panic!("unexpected error: {}", err),
    }
}

#[test]
fn test_main_round_trip() {
    let output = compile_unit(
        CompilerConf::default(),
        [("Main", "class Main { function void main() { return; } }")],
    );
    assert!(output.is_ok());
    assert_eq!(
        to_vm_string(&output.files[0].code),
        "function Main.main 0\npush constant 0\nreturn\n"
    );
    assert_eq!(output.files[0].code.len(), 3);
}

#[test]
fn test_subtraction_is_left_to_right() {
    assert_eq!(eval_expression("a - b - c", &[10, 3, 2]), 5);
    assert_eq!(eval_expression("(a - b) - (c - 1)", &[10, 3, 2]), 6);
    assert_eq!(eval_expression("a - b * c", &[10, 3, 2]), 4);
    assert_eq!(eval_expression("a + b * c", &[10, 3, 2]), 16);
    assert_eq!(eval_expression("a * b + c", &[10, 3, 2]), 32);
    assert_eq!(eval_expression("a / c - b", &[10, 3, 2]), 2);
    assert_eq!(eval_expression("-a + b", &[10, 3, 2]), -7);
    assert_eq!(eval_expression("(a > b) & (b > c)", &[10, 3, 2]), -1);
}

#[test]
fn test_counter_unit() {
    let output = compile_unit(
        CompilerConf::default(),
        [("Main", COUNTER_MAIN), ("Counter", COUNTER)],
    );
    for file in &output.files {
        assert!(file.is_ok(), "{:?}", file.error);
    }
    assert!(output.is_ok(), "{:?}", unit_errors(&output));

    let counter = to_vm_string(&output.files[1].code);
    assert!(counter.starts_with(
        "\
function Counter.new 0
push constant 2
call Memory.alloc 1
pop pointer 0
push constant 0
pop this 0
push argument 0
pop this 1
"
    ));
    // Statics are addressed through the static segment.
    assert!(counter.contains("push static 0\npush constant 1\nadd\npop static 0\n"));
    // Implicit receiver inside a method.
    assert!(counter.contains("push pointer 0\ncall Counter.done 1\nnot\n"));

    let main = to_vm_string(&output.files[0].code);
    assert!(main.contains("push constant 10\ncall Counter.new 1\npop local 0\n"));
    assert!(main.contains("push local 0\ncall Counter.done 1\nnot\nnot\nif-goto Main.main.WhileEND_LOOP.0\n"));
}

#[test]
fn test_square_unit() {
    let output = compile_unit(
        CompilerConf::default(),
        [("Main", SQUARE_MAIN), ("Square", SQUARE), ("SquareGame", SQUARE_GAME)],
    );
    for file in &output.files {
        assert!(file.is_ok(), "{:?}", file.error);
    }
    assert!(output.is_ok(), "{:?}", unit_errors(&output));

    let game = to_vm_string(&output.files[2].code);
    assert!(game.contains("function SquareGame.run 2\n"));
    assert!(game.contains("label SquareGame.run.WhileLOOP.2\n"));
    assert!(game.contains("if-goto SquareGame.run.IfStatementELSE.6\n"));
    assert!(game.contains("push this 0\ncall Square.moveUp 1\npop temp 0\n"));
}

#[test]
fn test_order_independence() {
    let forward = compile_unit(
        CompilerConf::default(),
        [("Main", SQUARE_MAIN), ("Square", SQUARE), ("SquareGame", SQUARE_GAME)],
    );
    let backward = compile_unit(
        CompilerConf::default(),
        [("SquareGame", SQUARE_GAME), ("Square", SQUARE), ("Main", SQUARE_MAIN)],
    );

    for file in &forward.files {
        let other = backward
            .files
            .iter()
            .find(|f| f.class == file.class)
            .expect("same files");
        assert_eq!(file.code, other.code, "{}", file.class);
    }
    assert_eq!(forward.is_ok(), backward.is_ok());
    assert_eq!(unit_errors(&forward), unit_errors(&backward));
}

#[test]
fn test_order_independence_with_conflicts() {
    const MAIN: &str = "class Main {
    function void main() {
        var Widget w;
        let w = Widget.make(1, 2);
        do w.spin();
        do Gadget.run();
        return;
    }
}";
    const WIDGET: &str = "class Widget {
    function Widget make(int size) {
        return null;
    }
    function void spin() {
        return;
    }
}";

    let forward = compile_unit(CompilerConf::default(), [("Main", MAIN), ("Widget", WIDGET)]);
    let backward = compile_unit(CompilerConf::default(), [("Widget", WIDGET), ("Main", MAIN)]);

    assert!(forward.files.iter().all(FileOutput::is_ok));
    assert!(backward.files.iter().all(FileOutput::is_ok));

    let errors = unit_errors(&forward);
    assert_eq!(errors, unit_errors(&backward));
    assert_eq!(
        errors,
        vec![
            UnitError::UndeclaredClass {
                class: "Gadget".into(),
                site: Site::new("Main", 6),
            },
            UnitError::UndeclaredSubroutine {
                subroutine: "Gadget.run".into(),
                site: Site::new("Main", 6),
            },
            UnitError::ArgCountMismatch {
                subroutine: "Widget.make".into(),
                expected: 1,
                found: 2,
                site: Site::new("Main", 4),
            },
            UnitError::KindMismatch {
                subroutine: "Widget.spin".into(),
                expected: jackc::registry::SubroutineKind::Function,
                found: jackc::registry::SubroutineKind::Method,
                site: Site::new("Main", 5),
            },
            UnitError::ArgCountMismatch {
                subroutine: "Widget.spin".into(),
                expected: 0,
                found: 1,
                site: Site::new("Main", 5),
            },
        ]
    );

    // Two callers disagree with each other, only one with the declaration.
    const SHORT: &str = "class A { function void f() { do Foo.bar(1, 2); return; } }";
    const FULL: &str = "class B { function void f() { do Foo.bar(1, 2, 3); return; } }";
    const FOO: &str = "class Foo { function void bar(int x, int y, int z) { return; } }";

    let forward = compile_unit(CompilerConf::default(), [("A", SHORT), ("B", FULL), ("Foo", FOO)]);
    let backward = compile_unit(CompilerConf::default(), [("Foo", FOO), ("B", FULL), ("A", SHORT)]);
    let errors = unit_errors(&forward);
    assert_eq!(errors, unit_errors(&backward));
    assert_eq!(
        errors,
        vec![UnitError::ArgCountMismatch {
            subroutine: "Foo.bar".into(),
            expected: 3,
            found: 2,
            site: Site::new("A", 1),
        }]
    );

    // Undeclared names are reported at the smallest site.
    const FIRST: &str = "class A { function void f() { do Widget.make(); return; } }";
    const SECOND: &str = "class B {\n function void f() { do Widget.make(); return; } }";

    let forward = compile_unit(CompilerConf::default(), [("A", FIRST), ("B", SECOND)]);
    let backward = compile_unit(CompilerConf::default(), [("B", SECOND), ("A", FIRST)]);
    let errors = unit_errors(&forward);
    assert_eq!(errors, unit_errors(&backward));
    assert_eq!(
        errors,
        vec![
            UnitError::UndeclaredClass {
                class: "Widget".into(),
                site: Site::new("A", 1),
            },
            UnitError::UndeclaredSubroutine {
                subroutine: "Widget.make".into(),
                site: Site::new("A", 1),
            },
        ]
    );
}

#[test]
fn test_undeclared_class_only_at_unit_end() {
    let mut compiler = Compiler::default();
    let output = compiler.compile_file(
        "Main",
        "class Main {
            function void main() {
                var Widget w;
                let w = Widget.new();
                return;
            }
        }",
    );
    // The file on its own is fine.
    assert!(output.is_ok());

    match compiler.finish() {
        Err(JackError::Unit(errors)) => {
            assert_eq!(
                errors,
                vec![
                    UnitError::UndeclaredClass {
                        class: "Widget".into(),
                        site: Site::new("Main", 3),
                    },
                    UnitError::UndeclaredSubroutine {
                        subroutine: "Widget.new".into(),
                        site: Site::new("Main", 4),
                    },
                ]
            );
        }
        other => panic!("expected unit errors, got {:?}", other),
    }
}

#[test]
fn test_arity_mismatch_only_at_unit_end() {
    let mut compiler = Compiler::default();
    let main = compiler.compile_file(
        "Main",
        "class Main { function void main() { do Util.sum(1, 2, 3); return; } }",
    );
    let util = compiler.compile_file(
        "Util",
        "class Util { function int sum(int a, int b) { return a + b; } }",
    );
    assert!(main.is_ok());
    assert!(util.is_ok());

    let err = compiler.finish().expect_err("arity mismatch");
    assert_eq!(
        err.to_string(),
        "Main.jack:1: subroutine 'Util.sum' takes 2 argument(s), but 3 were given"
    );
}

#[test]
fn test_error_stops_emission() {
    let mut compiler = Compiler::default();
    let broken = compiler.compile_file(
        "Main",
        "class Main {
            function void ok() { return; }
            function void broken() {
                let x = 1;
                return;
            }
            function void later() { return; }
        }",
    );
    let err = broken.error.as_ref().expect("undefined variable");
    assert_eq!(err.kind, ErrorKind::UndefinedVariable);
    assert_eq!(err.line, 4);
    assert_eq!(err.to_string(), "Main.jack:4: variable 'x' is not defined");
    assert_eq!(
        to_vm_string(&broken.code),
        "function Main.ok 0\npush constant 0\nreturn\nfunction Main.broken 0\n"
    );
    // Nothing after the error reaches the registry.
    assert!(compiler.registry().subroutine("Main.later").is_none());

    // The next file starts from a clean state.
    let next = compiler.compile_file("Other", "class Other { function void f() { return; } }");
    assert!(next.is_ok());
}

#[test]
fn test_lexical_error_reported() {
    let output = compile_unit(
        CompilerConf::default(),
        [(
            "Main",
            "class Main {\n  function int f() {\n    return 99999;\n  }\n}\n",
        )],
    );
    let err = output.files[0].error.as_ref().expect("out of bounds");
    assert_eq!(
        err.to_string(),
        "Main.jack:3: integer constant is out of bounds (max. value = 32767): 99999"
    );
    assert!(!output.is_ok());
}
