//! Compilation of a whole unit of source files.
use crate::{
    compile::{compile_file, FileOutput},
    constants::LIBRARY_CLASSES,
    error::{JackError, JackResult},
    registry::Registry,
};
use smol_str::SmolStr;

/// Compiler configuration parameters.
#[derive(Debug, Clone)]
pub struct CompilerConf {
    /// Classes provided by the runtime. References to them and their
    /// subroutines are never reported as undeclared.
    pub library_classes: Vec<SmolStr>,
}

impl Default for CompilerConf {
    fn default() -> Self {
        Self {
            library_classes: LIBRARY_CLASSES.iter().map(|name| SmolStr::new(name)).collect(),
        }
    }
}

/// Compiles the files of one unit and checks the references between them.
///
/// Files are compiled in the order they are given. The registries
/// live as long as the compiler, while each file's scopes and code
/// buffer are dropped once the file is done.
pub struct Compiler {
    conf: CompilerConf,
    registry: Registry,
    files: usize,
}

impl Compiler {
    pub fn new(conf: CompilerConf) -> Self {
        Self {
            conf,
            registry: Registry::new(),
            files: 0,
        }
    }

    /// Configuration that was used to instantiate the compiler.
    pub fn config(&self) -> &CompilerConf {
        &self.conf
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Compile one source file.
    ///
    /// `class` is the file's base name, which the source must declare.
    pub fn compile_file(&mut self, class: &str, source: &str) -> FileOutput {
        self.files += 1;
        compile_file(class, source, &mut self.registry)
    }

    /// Check the unit after its last file, consuming the compiler.
    ///
    /// Every outstanding problem is logged and returned, not just the first.
    pub fn finish(self) -> JackResult<Registry> {
        let errors = self.registry.validate(&self.conf.library_classes);
        log::debug!("validated {} file(s), {} unit error(s)", self.files, errors.len());

        if errors.is_empty() {
            Ok(self.registry)
        } else {
            for err in &errors {
                log::error!("{}", err);
            }
            Err(JackError::Unit(errors))
        }
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Compiler::new(CompilerConf::default())
    }
}

/// Output of [`compile_unit`].
#[derive(Debug)]
pub struct UnitOutput {
    pub files: Vec<FileOutput>,
    /// Result of validating the unit's cross-file references.
    pub validation: JackResult<Registry>,
}

impl UnitOutput {
    /// True when every file compiled and the unit validated.
    pub fn is_ok(&self) -> bool {
        self.files.iter().all(FileOutput::is_ok) && self.validation.is_ok()
    }
}

/// Compile `(class name, source)` pairs in order as one unit.
pub fn compile_unit<'s, I>(conf: CompilerConf, sources: I) -> UnitOutput
where
    I: IntoIterator<Item = (&'s str, &'s str)>,
{
    let mut compiler = Compiler::new(conf);
    let files = sources
        .into_iter()
        .map(|(class, source)| compiler.compile_file(class, source))
        .collect();

    UnitOutput {
        files,
        validation: compiler.finish(),
    }
}
