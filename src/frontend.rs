//! Go front-end: parses source text into a `DeclarationModel` with
//! tree-sitter and renders a pruned model back into source text.
//!
//! Rendering splices the original text instead of pretty-printing:
//! - Deleted declarations are cut together with the `//` comment lines
//!   directly above them and the rest of their last line.
//! - A cut never leaves more than one blank line behind.
//! - A value spec that lost names is regenerated from its kept identifiers
//!   (and kept initializers when they pair one-to-one with names).
//! - Everything else is copied byte for byte.
//!
//! The rendered text is parsed again; if it does not parse, pruning produced
//! something the layout cannot express and a `RenderError` is returned.

use crate::errors::{ParseError, RenderError};
use crate::models::declaration::{
    Binding, DeclKind, Declaration, DeclarationModel, Layout, Member, Qualifier, Span, Statement,
};
use std::fs;
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser, Tree};

/// Read and parse a Go source file.
pub fn parse(path: &Path) -> Result<DeclarationModel, ParseError> {
    let source = fs::read_to_string(path).map_err(|source| ParseError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_source(path, source)
}

/// Parse Go source text that is attributed to `path` in errors.
pub fn parse_source(path: &Path, source: String) -> Result<DeclarationModel, ParseError> {
    let tree = syntax_tree(path, &source)?;
    let mut builder = ModelBuilder::new(&source);
    builder.collect(tree.root_node());
    let (declarations, layout) = builder.finish();
    Ok(DeclarationModel::new(
        path.to_path_buf(),
        source,
        declarations,
        layout,
    ))
}

/// Render a (possibly pruned) model back to Go source text.
pub fn render(model: &DeclarationModel) -> Result<String, RenderError> {
    let edits = plan_edits(model)?;
    let text = apply_edits(model.path(), model.source(), &edits)?;
    syntax_tree(model.path(), &text).map_err(|e| RenderError::Malformed {
        path: model.path().to_path_buf(),
        detail: e.to_string(),
    })?;
    Ok(text)
}

fn syntax_tree(path: &Path, source: &str) -> Result<Tree, ParseError> {
    let grammar_error = |message: String| ParseError::Grammar {
        path: path.to_path_buf(),
        message,
    };
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_go::LANGUAGE.into())
        .map_err(|e| grammar_error(e.to_string()))?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| grammar_error("parser returned no tree".to_string()))?;
    let root = tree.root_node();
    if root.has_error() {
        let at = first_error(root).unwrap_or(root);
        let pos = at.start_position();
        let near = if at.is_missing() {
            format!("missing {}", at.kind())
        } else {
            snippet(node_text(at, source))
        };
        return Err(ParseError::Syntax {
            path: path.to_path_buf(),
            line: pos.row + 1,
            column: pos.column + 1,
            near,
        });
    }
    Ok(tree)
}

/// Locate the innermost problem: follow the first erroneous child down
/// the tree. An ERROR node without erroneous children points at its last
/// child, the token where recovery gave up.
fn first_error(root: Node) -> Option<Node> {
    if !root.has_error() {
        return None;
    }
    let mut cur = root;
    loop {
        let mut cursor = cur.walk();
        let next = cur
            .children(&mut cursor)
            .find(|c| c.is_error() || c.is_missing() || c.has_error());
        match next {
            Some(child) => cur = child,
            None => break,
        }
    }
    if cur.is_error() && cur.child_count() > 0 {
        return cur.child(cur.child_count() - 1).or(Some(cur));
    }
    Some(cur)
}

fn snippet(text: &str) -> String {
    let line = text.lines().next().unwrap_or("");
    let mut out: String = line.chars().take(24).collect();
    if out.len() < line.len() {
        out.push_str("...");
    }
    out
}

fn node_text<'a>(node: Node, src: &'a str) -> &'a str {
    node.utf8_text(src.as_bytes()).unwrap_or("")
}

fn span(node: Node) -> Span {
    node.start_byte()..node.end_byte()
}

struct ModelBuilder<'s> {
    src: &'s str,
    declarations: Vec<Declaration>,
    layout: Layout,
}

impl<'s> ModelBuilder<'s> {
    fn new(src: &'s str) -> Self {
        ModelBuilder {
            src,
            declarations: Vec::new(),
            layout: Layout::default(),
        }
    }

    fn finish(self) -> (Vec<Declaration>, Layout) {
        (self.declarations, self.layout)
    }

    fn collect(&mut self, root: Node) {
        let mut cursor = root.walk();
        let statements: Vec<Node> = root
            .named_children(&mut cursor)
            .filter(|n| n.kind() != "comment")
            .collect();
        for (i, node) in statements.iter().enumerate() {
            let floor = if i == 0 {
                0
            } else {
                statements[i - 1].end_byte()
            };
            let ceil = statements
                .get(i + 1)
                .map_or(self.src.len(), |n| n.start_byte());
            let stmt_extent = extent(self.src, span(*node), floor, ceil);
            self.statement(*node, stmt_extent);
        }
    }

    fn statement(&mut self, node: Node, extent: Span) {
        match node.kind() {
            // Methods are keyed by their bare name, receiver ignored.
            "function_declaration" | "method_declaration" => {
                let name = node
                    .child_by_field_name("name")
                    .map(|n| node_text(n, self.src).to_string())
                    .unwrap_or_default();
                self.single(node, extent, DeclKind::Function, vec![name], None);
            }
            "type_declaration" => {
                self.grouped(node, extent, "type", &["type_spec", "type_alias"], DeclKind::TypeDef);
            }
            "const_declaration" => {
                let kind = DeclKind::ValueGroup(Qualifier::Const);
                self.grouped(node, extent, "const", &["const_spec"], kind);
            }
            "var_declaration" => {
                let kind = DeclKind::ValueGroup(Qualifier::Var);
                self.grouped(node, extent, "var", &["var_spec"], kind);
            }
            "import_declaration" => {
                let names = specs(node, &["import_spec"])
                    .into_iter()
                    .map(|spec| import_name(spec, self.src))
                    .collect();
                self.single(node, extent, DeclKind::Other, names, None);
            }
            "package_clause" => {
                let mut cursor = node.walk();
                let names = node
                    .named_children(&mut cursor)
                    .filter(|n| n.kind() == "package_identifier")
                    .map(|n| node_text(n, self.src).to_string())
                    .collect();
                self.single(node, extent, DeclKind::Other, names, None);
            }
            _ => self.single(node, extent, DeclKind::Other, Vec::new(), None),
        }
    }

    /// A statement holding exactly one declaration.
    fn single(
        &mut self,
        node: Node,
        extent: Span,
        kind: DeclKind,
        names: Vec<String>,
        binding: Option<Binding>,
    ) {
        let id = self.push(kind, names, extent.clone(), span(node), binding);
        self.layout.statements.push(Statement {
            extent,
            grouped: false,
            members: vec![id],
        });
    }

    /// `type`, `const` and `var` statements, parenthesized or not.
    fn grouped(
        &mut self,
        node: Node,
        stmt_extent: Span,
        keyword: &str,
        kinds: &[&str],
        kind: DeclKind,
    ) {
        let text = node_text(node, self.src);
        let grouped = text
            .strip_prefix(keyword)
            .map_or(false, |rest| rest.trim_start().starts_with('('));
        let found = specs(node, kinds);
        let mut members = Vec::with_capacity(found.len());
        for (i, spec) in found.iter().enumerate() {
            let (names, binding) = match kind {
                DeclKind::ValueGroup(_) => {
                    let (names, binding) = value_binding(*spec, self.src);
                    (names, Some(binding))
                }
                _ => {
                    let name = spec
                        .child_by_field_name("name")
                        .map(|n| node_text(n, self.src).to_string())
                        .unwrap_or_default();
                    (vec![name], None)
                }
            };
            let member_extent = if grouped {
                let floor = if i == 0 {
                    node.start_byte()
                } else {
                    found[i - 1].end_byte()
                };
                let ceil = found.get(i + 1).map_or(node.end_byte(), |n| n.start_byte());
                extent(self.src, span(*spec), floor, ceil)
            } else {
                stmt_extent.clone()
            };
            members.push(self.push(kind, names, member_extent, span(*spec), binding));
        }
        self.layout.statements.push(Statement {
            extent: stmt_extent,
            grouped,
            members,
        });
    }

    fn push(
        &mut self,
        kind: DeclKind,
        names: Vec<String>,
        extent: Span,
        spec: Span,
        binding: Option<Binding>,
    ) -> usize {
        let id = self.layout.members.len();
        self.layout.members.push(Member {
            extent,
            spec,
            binding,
        });
        self.declarations.push(Declaration::new(id, kind, names));
        id
    }
}

/// Spec nodes directly under a declaration or inside its `*_spec_list`.
fn specs<'t>(node: Node<'t>, kinds: &[&str]) -> Vec<Node<'t>> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if kinds.contains(&child.kind()) {
            out.push(child);
        } else if child.kind().ends_with("_spec_list") {
            let mut inner = child.walk();
            out.extend(
                child
                    .named_children(&mut inner)
                    .filter(|c| kinds.contains(&c.kind())),
            );
        }
    }
    out
}

fn value_binding(spec: Node, src: &str) -> (Vec<String>, Binding) {
    let mut cursor = spec.walk();
    let idents: Vec<Node> = spec
        .children_by_field_name("name", &mut cursor)
        .filter(|n| n.kind() == "identifier")
        .collect();
    let values: Vec<Span> = match spec.child_by_field_name("value") {
        Some(list) => {
            let mut inner = list.walk();
            let vals: Vec<Span> = list
                .named_children(&mut inner)
                .filter(|n| n.kind() != "comment")
                .map(span)
                .collect();
            vals
        }
        None => Vec::new(),
    };
    let names = idents
        .iter()
        .map(|n| node_text(*n, src).to_string())
        .collect();
    let binding = Binding {
        names: idents.iter().map(|n| span(*n)).collect(),
        values,
    };
    (names, binding)
}

fn import_name(spec: Node, src: &str) -> String {
    if let Some(alias) = spec.child_by_field_name("name") {
        return node_text(alias, src).to_string();
    }
    let path = spec
        .child_by_field_name("path")
        .map(|n| node_text(n, src))
        .unwrap_or("");
    let path = path.trim_matches(|c| c == '"' || c == '`');
    path.rsplit('/').next().unwrap_or(path).to_string()
}

fn line_start(src: &str, pos: usize) -> usize {
    src[..pos].rfind('\n').map_or(0, |i| i + 1)
}

/// Extend `s` to cover the comment lines directly above it (no blank line
/// in between) and the remainder of its last line, within `floor..ceil`.
fn extent(src: &str, s: Span, floor: usize, ceil: usize) -> Span {
    leading(src, s.start, floor)..trailing(src, s.end, ceil)
}

fn leading(src: &str, start: usize, floor: usize) -> usize {
    let ls = line_start(src, start);
    if ls < floor || !src[ls..start].trim().is_empty() {
        return start;
    }
    let mut cur = ls;
    while cur > floor {
        let prev = line_start(src, cur - 1);
        if prev < floor {
            break;
        }
        let line = src[prev..cur - 1].trim();
        if line.starts_with("//") {
            cur = prev;
        } else if line.ends_with("*/") {
            match block_comment_start(src, floor, cur) {
                Some(open) => cur = open,
                None => break,
            }
        } else {
            break;
        }
    }
    cur
}

/// Line start of the `/*` opening a block comment that ends right before
/// `cur`, when the comment begins on its own line.
fn block_comment_start(src: &str, floor: usize, cur: usize) -> Option<usize> {
    let open = floor + src[floor..cur].rfind("/*")?;
    let ls = line_start(src, open);
    if ls < floor || !src[ls..open].trim().is_empty() {
        return None;
    }
    Some(ls)
}

fn trailing(src: &str, end: usize, ceil: usize) -> usize {
    let rest = &src[end..ceil.max(end)];
    let (line, newline) = match rest.find('\n') {
        Some(nl) => (&rest[..nl], true),
        None => (rest, false),
    };
    let tail = line.trim_start_matches([' ', '\t', ';']);
    if tail.trim_end().is_empty() || tail.starts_with("//") {
        end + line.len() + usize::from(newline)
    } else {
        end + (line.len() - tail.len())
    }
}

struct Edit {
    span: Span,
    /// `None` cuts the span.
    replacement: Option<String>,
}

fn plan_edits(model: &DeclarationModel) -> Result<Vec<Edit>, RenderError> {
    let layout = model.layout();
    let mut retained: Vec<Option<&Declaration>> = vec![None; layout.members.len()];
    for decl in model.declarations() {
        if let Some(slot) = retained.get_mut(decl.id()) {
            *slot = Some(decl);
        }
    }
    let mut edits = Vec::new();
    for stmt in &layout.statements {
        let kept = stmt.members.iter().filter(|id| retained[**id].is_some()).count();
        if kept == 0 && !stmt.members.is_empty() {
            edits.push(Edit {
                span: stmt.extent.clone(),
                replacement: None,
            });
            continue;
        }
        for id in &stmt.members {
            let member = &layout.members[*id];
            match retained[*id] {
                None => edits.push(Edit {
                    span: member.extent.clone(),
                    replacement: None,
                }),
                Some(decl) => {
                    if let Some(binding) = member.binding.as_ref() {
                        if decl.bound().len() != binding.names.len() {
                            let text = respec(model, member, binding, decl)?;
                            edits.push(Edit {
                                span: member.spec.clone(),
                                replacement: Some(text),
                            });
                        }
                    }
                }
            }
        }
    }
    edits.sort_by_key(|e| e.span.start);
    Ok(edits)
}

/// Regenerate a value spec that lost some of its names.
fn respec(
    model: &DeclarationModel,
    member: &Member,
    binding: &Binding,
    decl: &Declaration,
) -> Result<String, RenderError> {
    let src = model.source();
    let (first, last) = match (binding.names.first(), binding.names.last()) {
        (Some(f), Some(l)) if !decl.is_empty() => (f.clone(), l.clone()),
        _ => {
            return Err(RenderError::EmptyValueSpec {
                path: model.path().to_path_buf(),
            })
        }
    };
    let kept: Vec<usize> = decl.bound().iter().map(|n| n.slot()).collect();
    let paired = binding.values.len() == binding.names.len();
    let names: Vec<&str> = if paired || binding.values.is_empty() {
        decl.names().collect()
    } else {
        // Multi-value initializer: keep arity, blank out dropped slots.
        (0..binding.names.len())
            .map(|slot| match decl.bound().iter().find(|n| n.slot() == slot) {
                Some(n) => n.as_str(),
                None => "_",
            })
            .collect()
    };
    let mut out = String::new();
    out.push_str(&src[member.spec.start..first.start]);
    out.push_str(&names.join(", "));
    match (binding.values.first(), binding.values.last()) {
        (Some(vfirst), Some(vlast)) if paired => {
            out.push_str(&src[last.end..vfirst.start]);
            let values: Vec<&str> = kept.iter().map(|i| &src[binding.values[*i].clone()]).collect();
            out.push_str(&values.join(", "));
            out.push_str(&src[vlast.end..member.spec.end]);
        }
        _ => out.push_str(&src[last.end..member.spec.end]),
    }
    Ok(out)
}

fn apply_edits(path: &Path, src: &str, edits: &[Edit]) -> Result<String, RenderError> {
    let mut out = String::with_capacity(src.len());
    let mut pos = 0;
    let mut squeeze = false;
    for edit in edits {
        if edit.span.start < pos {
            return Err(RenderError::OverlappingEdits {
                path: PathBuf::from(path),
                at: edit.span.start,
            });
        }
        push_gap(&mut out, &src[pos..edit.span.start], squeeze);
        match edit.replacement.as_deref() {
            Some(text) => {
                out.push_str(text);
                squeeze = false;
            }
            None => squeeze = true,
        }
        pos = edit.span.end;
    }
    let rest = &src[pos..];
    push_gap(&mut out, rest, squeeze);
    if squeeze && rest.trim().is_empty() {
        while out.ends_with("\n\n") {
            out.pop();
        }
    }
    Ok(out)
}

fn push_gap(out: &mut String, gap: &str, squeeze: bool) {
    if squeeze && (out.is_empty() || out.ends_with("\n\n") || out.ends_with("(\n")) {
        out.push_str(skip_blank_lines(gap));
    } else {
        out.push_str(gap);
    }
}

fn skip_blank_lines(mut s: &str) -> &str {
    while let Some(nl) = s.find('\n') {
        if s[..nl].trim().is_empty() {
            s = &s[nl + 1..];
        } else {
            break;
        }
    }
    s
}
