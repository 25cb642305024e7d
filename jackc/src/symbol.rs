//! Variable scopes.
use crate::vm::Segment;
use smol_str::SmolStr;
use std::collections::BTreeMap;

/// Storage class of a named variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// Class-level, shared by all instances.
    Static,
    /// Class-level, one per instance.
    Field,
    /// Subroutine-level parameter.
    Argument,
    /// Subroutine-level `var`.
    Local,
}

impl SymbolKind {
    const COUNT: usize = 4;

    /// Memory segment the variable lives in.
    #[rustfmt::skip]
    pub fn segment(self) -> Segment {
        match self {
            Self::Static   => Segment::Static,
            Self::Field    => Segment::This,
            Self::Argument => Segment::Argument,
            Self::Local    => Segment::Local,
        }
    }

    #[inline]
    fn slot(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: SmolStr,
    /// Declared type, either a primitive type name or a class name.
    pub ty: SmolStr,
    pub kind: SymbolKind,
    /// Position among symbols of the same kind, starting at 0.
    pub index: u16,
}

/// One level of variable scope.
///
/// A class keeps two of these: one for statics and fields that
/// lives as long as the class, and one for arguments and locals
/// that is cleared at every subroutine declaration.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: BTreeMap<SmolStr, Symbol>,
    counts: [u16; SymbolKind::COUNT],
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new variable, assigning it the next index of its kind.
    ///
    /// Returns `false` and leaves the table untouched when the
    /// name is already defined in this scope.
    pub fn define(&mut self, name: impl Into<SmolStr>, ty: impl Into<SmolStr>, kind: SymbolKind) -> bool {
        let name = name.into();
        if self.symbols.contains_key(&name) {
            return false;
        }

        let index = self.counts[kind.slot()];
        self.counts[kind.slot()] += 1;

        self.symbols.insert(
            name.clone(),
            Symbol {
                name,
                ty: ty.into(),
                kind,
                index,
            },
        );
        true
    }

    /// Forget all symbols and restart the argument and local counters.
    pub fn start_subroutine(&mut self) {
        self.symbols.clear();
        self.counts[SymbolKind::Argument.slot()] = 0;
        self.counts[SymbolKind::Local.slot()] = 0;
    }

    #[inline]
    pub fn get_symbol(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    #[inline]
    pub fn name_exists(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    /// Kind of the named variable, `None` when undefined.
    #[inline]
    pub fn kind_of(&self, name: &str) -> Option<SymbolKind> {
        self.get_symbol(name).map(|s| s.kind)
    }

    #[inline]
    pub fn type_of(&self, name: &str) -> Option<&str> {
        self.get_symbol(name).map(|s| s.ty.as_str())
    }

    #[inline]
    pub fn index_of(&self, name: &str) -> Option<u16> {
        self.get_symbol(name).map(|s| s.index)
    }

    /// Number of variables of the given kind defined so far.
    #[inline]
    pub fn var_count(&self, kind: SymbolKind) -> u16 {
        self.counts[kind.slot()]
    }
}

/// Resolve a name in the subroutine scope first, then the class scope.
pub fn lookup<'a>(subroutine: &'a SymbolTable, class: &'a SymbolTable, name: &str) -> Option<&'a Symbol> {
    subroutine.get_symbol(name).or_else(|| class.get_symbol(name))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_indices_per_kind() {
        let mut table = SymbolTable::new();
        assert!(table.define("a", "int", SymbolKind::Static));
        assert!(table.define("b", "int", SymbolKind::Field));
        assert!(table.define("c", "Point", SymbolKind::Static));
        assert!(table.define("d", "boolean", SymbolKind::Field));
        assert!(table.define("e", "char", SymbolKind::Field));

        assert_eq!(table.index_of("a"), Some(0));
        assert_eq!(table.index_of("c"), Some(1));
        assert_eq!(table.index_of("b"), Some(0));
        assert_eq!(table.index_of("d"), Some(1));
        assert_eq!(table.index_of("e"), Some(2));
        assert_eq!(table.var_count(SymbolKind::Field), 3);
        assert_eq!(table.var_count(SymbolKind::Static), 2);
        assert_eq!(table.type_of("c"), Some("Point"));
        assert_eq!(table.kind_of("d"), Some(SymbolKind::Field));
    }

    #[test]
    fn test_redefinition_is_rejected() {
        let mut table = SymbolTable::new();
        assert!(table.define("x", "int", SymbolKind::Local));
        assert!(!table.define("x", "char", SymbolKind::Local));
        assert!(!table.define("x", "int", SymbolKind::Argument));

        assert_eq!(table.type_of("x"), Some("int"));
        assert_eq!(table.var_count(SymbolKind::Local), 1);
        assert_eq!(table.var_count(SymbolKind::Argument), 0);
    }

    #[test]
    fn test_start_subroutine_resets() {
        let mut table = SymbolTable::new();
        table.define("this", "Point", SymbolKind::Argument);
        table.define("dx", "int", SymbolKind::Argument);
        table.define("tmp", "int", SymbolKind::Local);

        table.start_subroutine();
        assert!(!table.name_exists("dx"));
        assert_eq!(table.kind_of("tmp"), None);
        assert_eq!(table.var_count(SymbolKind::Argument), 0);
        assert_eq!(table.var_count(SymbolKind::Local), 0);

        table.define("n", "int", SymbolKind::Argument);
        assert_eq!(table.index_of("n"), Some(0));
    }

    #[test]
    fn test_nearest_scope_wins() {
        let mut class = SymbolTable::new();
        let mut subroutine = SymbolTable::new();
        class.define("x", "int", SymbolKind::Field);
        class.define("y", "int", SymbolKind::Field);
        subroutine.define("x", "char", SymbolKind::Local);

        let x = lookup(&subroutine, &class, "x").map(|s| (s.kind, s.index));
        assert_eq!(x, Some((SymbolKind::Local, 0)));
        let y = lookup(&subroutine, &class, "y").map(|s| (s.kind, s.index));
        assert_eq!(y, Some((SymbolKind::Field, 1)));
        assert!(lookup(&subroutine, &class, "z").is_none());
    }
}
