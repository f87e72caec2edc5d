//! Symbol indexer: collects the names declared by the src files.

use crate::models::declaration::{DeclKind, DeclarationModel};
use std::collections::HashSet;

/// Distinct top-level names found across all src files.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SymbolSet {
    names: HashSet<String>,
}

impl SymbolSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a name. Empty names (unnamed nodes) are ignored.
    pub fn insert(&mut self, name: &str) -> bool {
        if name.is_empty() {
            return false;
        }
        self.names.insert(name.to_string())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names in ascending order, for reproducible trace output.
    pub fn sorted(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.names.iter().map(String::as_str).collect();
        out.sort_unstable();
        out
    }
}

impl<'a> FromIterator<&'a str> for SymbolSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut set = SymbolSet::new();
        for name in iter {
            set.insert(name);
        }
        set
    }
}

/// Build one symbol set from every model. Imports and the package clause
/// are skipped; every other bound name is recorded, `_` and `init` included.
pub fn build_symbol_set<'a, I>(models: I) -> SymbolSet
where
    I: IntoIterator<Item = &'a DeclarationModel>,
{
    let mut set = SymbolSet::new();
    for model in models {
        for decl in model.declarations() {
            if decl.kind() == DeclKind::Other {
                continue;
            }
            for name in decl.names() {
                set.insert(name);
            }
        }
    }
    set
}
