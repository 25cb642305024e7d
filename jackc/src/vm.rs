//! Stack machine instructions.
use smol_str::SmolStr;
use std::fmt;

/// Virtual memory segments addressable by `push` and `pop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Argument,
    Local,
    Static,
    This,
    That,
    Pointer,
    Temp,
    Constant,
}

impl Segment {
    #[rustfmt::skip]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Argument => "argument",
            Self::Local    => "local",
            Self::Static   => "static",
            Self::This     => "this",
            Self::That     => "that",
            Self::Pointer  => "pointer",
            Self::Temp     => "temp",
            Self::Constant => "constant",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arithmetic and logic commands operating on the top of the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl Command {
    #[rustfmt::skip]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Neg => "neg",
            Self::Eq  => "eq",
            Self::Gt  => "gt",
            Self::Lt  => "lt",
            Self::And => "and",
            Self::Or  => "or",
            Self::Not => "not",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of VM code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    Push(Segment, u16),
    Pop(Segment, u16),
    Arithmetic(Command),
    /// The machine has no multiply instruction, so this calls the
    /// operating system's `Math.multiply`.
    Multiply,
    /// Calls `Math.divide`.
    Divide,
    Label(SmolStr),
    Goto(SmolStr),
    IfGoto(SmolStr),
    /// Qualified subroutine name and number of arguments on the stack.
    Call(SmolStr, u16),
    /// Qualified subroutine name and number of locals.
    Function(SmolStr, u16),
    Return,
}

/// Outputs instruction as VM text.
impl fmt::Display for Instr {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Instr::Push(segment, index)  => write!(f, "push {} {}", segment, index),
            Instr::Pop(segment, index)   => write!(f, "pop {} {}", segment, index),
            Instr::Arithmetic(command)   => write!(f, "{}", command),
            Instr::Multiply              => write!(f, "call Math.multiply 2"),
            Instr::Divide                => write!(f, "call Math.divide 2"),
            Instr::Label(label)          => write!(f, "label {}", label),
            Instr::Goto(label)           => write!(f, "goto {}", label),
            Instr::IfGoto(label)         => write!(f, "if-goto {}", label),
            Instr::Call(name, n_args)    => write!(f, "call {} {}", name, n_args),
            Instr::Function(name, n_locals) => write!(f, "function {} {}", name, n_locals),
            Instr::Return                => write!(f, "return"),
        }
    }
}

/// Write code one instruction per line.
pub fn write_vm<W: fmt::Write>(out: &mut W, code: &[Instr]) -> fmt::Result {
    for instr in code {
        writeln!(out, "{}", instr)?;
    }
    Ok(())
}

/// Render code into a new string.
pub fn to_vm_string(code: &[Instr]) -> String {
    let mut out = String::new();
    // Writing into a String never fails.
    let _ = write_vm(&mut out, code);
    out
}
