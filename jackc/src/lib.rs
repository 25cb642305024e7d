pub mod compile;
pub mod constants;
mod error;
pub mod lex;
pub mod registry;
pub mod symbol;
mod unit;
pub mod vm;

/// Version of the compiler crate.
pub const IMPL_VERSION: &str = env!("CARGO_PKG_VERSION");

pub use self::{
    error::{CompileError, ErrorKind, Expected, JackError, JackResult, UnitError},
    unit::{compile_unit, Compiler, CompilerConf, UnitOutput},
};

pub mod prelude {
    pub use super::{
        compile::FileOutput,
        error::{CompileError, JackError, JackResult, UnitError},
        unit::{compile_unit, Compiler, CompilerConf, UnitOutput},
        vm::{to_vm_string, write_vm, Instr},
    };
}
