//! Declaration-level view of a Go source file.
//!
//! A `DeclarationModel` keeps the original text plus an immutable layout of
//! every top-level statement. Pruning only touches the ordered list of
//! `Declaration`s; the renderer compares that list against the layout to
//! decide what to cut or rewrite, so retained declarations come out
//! byte-identical.

use std::ops::Range;
use std::path::{Path, PathBuf};

pub type Span = Range<usize>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qualifier {
    Const,
    Var,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// What a declaration binds, and therefore how pruning treats it.
pub enum DeclKind {
    /// Function or method, by bare name.
    Function,
    /// One type spec or alias.
    TypeDef,
    /// One const/var spec, possibly binding several names.
    ValueGroup(Qualifier),
    /// Package clause, imports, anything pruning must leave alone.
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name {
    text: String,
    slot: usize,
}

impl Name {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Position of this identifier in the original spec.
    pub fn slot(&self) -> usize {
        self.slot
    }
}

#[derive(Debug, Clone)]
pub struct Declaration {
    kind: DeclKind,
    names: Vec<Name>,
    id: usize,
}

impl Declaration {
    pub(crate) fn new(id: usize, kind: DeclKind, names: Vec<String>) -> Self {
        let names = names
            .into_iter()
            .enumerate()
            .map(|(slot, text)| Name { text, slot })
            .collect();
        Declaration { kind, names, id }
    }

    pub fn kind(&self) -> DeclKind {
        self.kind
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(Name::as_str)
    }

    pub(crate) fn bound(&self) -> &[Name] {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Identifier of this declaration in the model layout.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Keep only the names for which `keep` returns true. Returns how many
    /// names were dropped. Order of the kept names is preserved.
    pub fn retain_names<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&str) -> bool,
    {
        let before = self.names.len();
        self.names.retain(|n| keep(&n.text));
        before - self.names.len()
    }
}

/// Identifier and initializer spans of a value spec.
#[derive(Debug, Clone, Default)]
pub(crate) struct Binding {
    pub names: Vec<Span>,
    pub values: Vec<Span>,
}

/// Where a declaration lives in the original text.
#[derive(Debug, Clone)]
pub(crate) struct Member {
    /// Bytes removed when the declaration is deleted, including attached
    /// doc comments and the trailing newline.
    pub extent: Span,
    /// Bytes of the spec itself, rewritten when names are dropped.
    pub spec: Span,
    pub binding: Option<Binding>,
}

/// One top-level statement and the declarations it holds.
#[derive(Debug, Clone)]
pub(crate) struct Statement {
    pub extent: Span,
    /// Parenthesized block (`const ( ... )`).
    pub grouped: bool,
    pub members: Vec<usize>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Layout {
    pub statements: Vec<Statement>,
    /// Indexed by declaration id.
    pub members: Vec<Member>,
}

#[derive(Debug, Clone)]
pub struct DeclarationModel {
    path: PathBuf,
    source: String,
    declarations: Vec<Declaration>,
    layout: Layout,
}

impl DeclarationModel {
    pub(crate) fn new(
        path: PathBuf,
        source: String,
        declarations: Vec<Declaration>,
        layout: Layout,
    ) -> Self {
        DeclarationModel {
            path,
            source,
            declarations,
            layout,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub(crate) fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Filter-and-rebuild pass over the declarations in file order.
    ///
    /// `f` may return the declaration unchanged, return it with fewer names,
    /// or drop it by returning `None`. Survivors keep their relative order.
    pub fn rebuild<F>(&mut self, f: F)
    where
        F: FnMut(Declaration) -> Option<Declaration>,
    {
        let old = std::mem::take(&mut self.declarations);
        self.declarations = old.into_iter().filter_map(f).collect();
    }

    /// True when the declaration list no longer matches the parsed layout.
    pub fn is_modified(&self) -> bool {
        self.declarations.len() != self.layout.members.len()
            || self.declarations.iter().any(|d| {
                self.layout.members[d.id]
                    .binding
                    .as_ref()
                    .map_or(false, |b| b.names.len() != d.names.len())
            })
    }
}
