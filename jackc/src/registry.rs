//! Cross-file registries of classes and subroutines.
//!
//! Files may reference classes and subroutines that are declared in
//! files compiled later. Every use and declaration is recorded here,
//! and the whole unit is checked once the last file has been scanned.
//! Checks only run at validation, so their results don't depend on
//! the order the files were compiled in.
use crate::error::UnitError;
use itertools::Itertools;
use smol_str::SmolStr;
use std::{collections::BTreeMap, fmt};

/// Location in a compilation unit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Site {
    /// Class name of the file.
    pub file: SmolStr,
    pub line: u32,
}

impl Site {
    pub fn new(file: impl Into<SmolStr>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.jack:{}", self.file, self.line)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassState {
    NotYetDeclared,
    Declared,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassEntry {
    pub state: ClassState,
    /// Declaration site, or the smallest use site while undeclared.
    pub site: Site,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SubroutineKind {
    Constructor,
    Function,
    Method,
}

impl SubroutineKind {
    /// Whether a call made with the `called` convention can reach a
    /// subroutine recorded as `self`.
    ///
    /// Constructors are called like functions, through the class name.
    pub fn accepts(self, called: SubroutineKind) -> bool {
        self == called || (self == Self::Constructor && called == Self::Function)
    }
}

impl fmt::Display for SubroutineKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Constructor => write!(f, "constructor"),
            Self::Function => write!(f, "function"),
            Self::Method => write!(f, "method"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Usage {
    /// Only calls have been seen so far.
    Called,
    Declared,
}

/// Shape of one call or declaration.
///
/// Ordered by site first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Signature {
    pub site: Site,
    /// Number of arguments, including the receiver of a method.
    pub n_args: u16,
    pub kind: SubroutineKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubroutineEntry {
    pub declaration: Option<Signature>,
    /// Every call seen so far, before or after the declaration.
    pub calls: Vec<Signature>,
}

impl SubroutineEntry {
    #[inline]
    pub fn usage(&self) -> Usage {
        match self.declaration {
            Some(_) => Usage::Declared,
            None => Usage::Called,
        }
    }

    /// Declaration, or the call at the smallest site while undeclared.
    ///
    /// Calls are checked against this.
    pub fn reference(&self) -> Option<&Signature> {
        self.declaration.as_ref().or_else(|| self.calls.iter().min())
    }
}

/// Returned when a subroutine is declared a second time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlreadyDeclared {
    pub previous: Site,
}

/// Registries shared by every file of one compilation unit.
#[derive(Debug, Default)]
pub struct Registry {
    classes: BTreeMap<SmolStr, ClassEntry>,
    subroutines: BTreeMap<SmolStr, SubroutineEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a class name was used as a type or call receiver.
    pub fn use_class(&mut self, name: &str, site: Site) {
        match self.classes.get_mut(name) {
            Some(entry) => {
                if entry.state == ClassState::NotYetDeclared && site < entry.site {
                    entry.site = site;
                }
            }
            None => {
                self.classes.insert(
                    SmolStr::new(name),
                    ClassEntry {
                        state: ClassState::NotYetDeclared,
                        site,
                    },
                );
            }
        }
    }

    /// Record that a file declares the class.
    pub fn declare_class(&mut self, name: &str, site: Site) {
        self.classes.insert(
            SmolStr::new(name),
            ClassEntry {
                state: ClassState::Declared,
                site,
            },
        );
    }

    /// Record a call of `Class.subroutine`.
    pub fn call_subroutine(&mut self, name: &str, kind: SubroutineKind, n_args: u16, site: Site) {
        self.subroutines
            .entry(SmolStr::new(name))
            .or_default()
            .calls
            .push(Signature { site, n_args, kind });
    }

    /// Record the declaration of `Class.subroutine`.
    pub fn declare_subroutine(
        &mut self,
        name: &str,
        kind: SubroutineKind,
        n_args: u16,
        site: Site,
    ) -> Result<(), AlreadyDeclared> {
        let entry = self.subroutines.entry(SmolStr::new(name)).or_default();
        if let Some(ref previous) = entry.declaration {
            return Err(AlreadyDeclared {
                previous: previous.site.clone(),
            });
        }

        entry.declaration = Some(Signature { site, n_args, kind });
        Ok(())
    }

    #[inline]
    pub fn class(&self, name: &str) -> Option<&ClassEntry> {
        self.classes.get(name)
    }

    #[inline]
    pub fn subroutine(&self, name: &str) -> Option<&SubroutineEntry> {
        self.subroutines.get(name)
    }

    pub fn classes(&self) -> impl Iterator<Item = (&SmolStr, &ClassEntry)> {
        self.classes.iter()
    }

    pub fn subroutines(&self) -> impl Iterator<Item = (&SmolStr, &SubroutineEntry)> {
        self.subroutines.iter()
    }

    /// Check the unit after its last file.
    ///
    /// Classes in `library` are provided by the runtime, so they and
    /// their subroutines don't need a declaration. Every call is checked
    /// against the subroutine's [`reference`](SubroutineEntry::reference).
    /// Reports everything outstanding, ordered by name within each category.
    pub fn validate(&self, library: &[SmolStr]) -> Vec<UnitError> {
        let is_library = |class: &str| library.iter().any(|lib| lib == class);
        let mut errors = vec![];
        let mut conflicts = vec![];

        for (name, entry) in &self.classes {
            if entry.state == ClassState::NotYetDeclared && !is_library(name) {
                errors.push(UnitError::UndeclaredClass {
                    class: name.clone(),
                    site: entry.site.clone(),
                });
            }
        }

        for (name, entry) in &self.subroutines {
            let class = name.split('.').next().unwrap_or_default();
            let reference = match entry.reference() {
                Some(reference) => reference,
                None => continue,
            };

            if entry.declaration.is_none() && !is_library(class) {
                errors.push(UnitError::UndeclaredSubroutine {
                    subroutine: name.clone(),
                    site: reference.site.clone(),
                });
                continue;
            }

            for call in entry.calls.iter().sorted() {
                check_call(&mut conflicts, name, reference, call);
            }
        }

        conflicts.sort_by(|a, b| conflict_key(a).cmp(&conflict_key(b)));
        errors.extend(conflicts);

        errors
    }
}

fn check_call(conflicts: &mut Vec<UnitError>, name: &SmolStr, reference: &Signature, call: &Signature) {
    if !reference.kind.accepts(call.kind) {
        conflicts.push(UnitError::KindMismatch {
            subroutine: name.clone(),
            expected: reference.kind,
            found: call.kind,
            site: call.site.clone(),
        });
    }

    if reference.n_args != call.n_args {
        conflicts.push(UnitError::ArgCountMismatch {
            subroutine: name.clone(),
            expected: reference.n_args,
            found: call.n_args,
            site: call.site.clone(),
        });
    }
}

fn conflict_key(err: &UnitError) -> (&str, &Site, u8) {
    match err {
        UnitError::KindMismatch { subroutine, site, .. } => (subroutine.as_str(), site, 0),
        UnitError::ArgCountMismatch { subroutine, site, .. } => (subroutine.as_str(), site, 1),
        UnitError::UndeclaredClass { class, site } => (class.as_str(), site, 2),
        UnitError::UndeclaredSubroutine { subroutine, site } => (subroutine.as_str(), site, 3),
    }
}
