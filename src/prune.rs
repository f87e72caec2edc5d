//! Declaration pruner: drops target declarations whose names are indexed.
//!
//! Single pass in file order. Functions and types go whole; value specs
//! lose the indexed names and disappear once nothing is left. Imports and
//! the package clause are never looked at.

use crate::index::SymbolSet;
use crate::models::declaration::{DeclKind, DeclarationModel};

/// Prune `model` in place against `symbols`, returning the number of
/// symbols removed.
pub fn prune(model: &mut DeclarationModel, symbols: &SymbolSet) -> usize {
    let mut removed = 0;
    model.rebuild(|mut decl| match decl.kind() {
        DeclKind::Other => Some(decl),
        DeclKind::Function | DeclKind::TypeDef => {
            if decl.names().next().map_or(false, |n| symbols.contains(n)) {
                removed += 1;
                None
            } else {
                Some(decl)
            }
        }
        DeclKind::ValueGroup(_) => {
            removed += decl.retain_names(|name| !symbols.contains(name));
            if decl.is_empty() {
                None
            } else {
                Some(decl)
            }
        }
    });
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::{parse_source, render};
    use crate::index::build_symbol_set;
    use std::path::Path;

    fn model(src: &str) -> DeclarationModel {
        parse_source(Path::new("target.go"), src.to_string()).unwrap()
    }

    fn set(names: &[&str]) -> SymbolSet {
        names.iter().copied().collect()
    }

    #[test]
    fn test_value_group_keeps_unindexed_names_in_order() {
        let mut m = model("package p\n\nvar a, b, c = 1, 2, 3\n");
        let removed = prune(&mut m, &set(&["b"]));
        assert_eq!(removed, 1);
        let names: Vec<_> = m.declarations()[1].names().collect();
        assert_eq!(names, vec!["a", "c"]);
        assert_eq!(render(&m).unwrap(), "package p\n\nvar a, c = 1, 3\n");
    }

    #[test]
    fn test_fully_indexed_value_group_is_deleted() {
        let mut m = model("package p\n\nconst x, y = 1, 2\n\nconst z = 3\n");
        let removed = prune(&mut m, &set(&["x", "y"]));
        assert_eq!(removed, 2);
        assert_eq!(m.declarations().len(), 2);
        assert_eq!(render(&m).unwrap(), "package p\n\nconst z = 3\n");
    }

    #[test]
    fn test_imports_are_never_pruned() {
        let mut m = model("package p\n\nimport (\n\t\"fmt\"\n\tos \"os\"\n)\n\nvar v = fmt.Sprint(os.Args)\n");
        let removed = prune(&mut m, &set(&["fmt", "os", "p"]));
        assert_eq!(removed, 0);
        assert!(!m.is_modified());
    }

    #[test]
    fn test_functions_and_types_removed_whole() {
        let src = "package p\n\ntype T int\n\ntype (\n\tU string\n\tV = U\n)\n\nfunc F() {}\n\nfunc (T) F() {}\n";
        let mut m = model(src);
        let removed = prune(&mut m, &set(&["T", "V", "F"]));
        assert_eq!(removed, 4);
        assert_eq!(render(&m).unwrap(), "package p\n\ntype (\n\tU string\n)\n");
    }

    #[test]
    fn test_methods_match_by_bare_name() {
        let reference = model("package p\n\ntype U int\n\nfunc (U) String() string { return \"\" }\n");
        let symbols = build_symbol_set([&reference]);
        let mut m = model(
            "package p\n\ntype T int\n\nfunc String() {}\n\nfunc (t *T) String() string { return \"\" }\n",
        );
        assert_eq!(prune(&mut m, &symbols), 2);
        assert_eq!(render(&m).unwrap(), "package p\n\ntype T int\n");
    }

    #[test]
    fn test_init_and_blank_are_pruned_like_any_name() {
        let reference = model("package p\n\nvar _ = 1\n\nfunc init() {}\n");
        let symbols = build_symbol_set([&reference]);
        let mut m = model("package p\n\nvar _ = 2\n\nfunc init() {}\n\nfunc Keep() {}\n");
        assert_eq!(prune(&mut m, &symbols), 2);
        assert_eq!(render(&m).unwrap(), "package p\n\nfunc Keep() {}\n");
    }

    #[test]
    fn test_no_match_leaves_model_untouched() {
        let src = "package p\n\nfunc A() {}\n";
        let mut m = model(src);
        assert_eq!(prune(&mut m, &set(&["B"])), 0);
        assert!(!m.is_modified());
        assert_eq!(render(&m).unwrap(), src);
    }

    #[test]
    fn test_second_pass_is_a_no_op() {
        let symbols = set(&["a", "F"]);
        let mut m = model("package p\n\nvar a, b = 1, 2\n\nfunc F() {}\n\nfunc G() {}\n");
        assert_eq!(prune(&mut m, &symbols), 2);
        let once = render(&m).unwrap();
        let mut again = model(&once);
        assert_eq!(prune(&mut again, &symbols), 0);
        assert_eq!(render(&again).unwrap(), once);
    }
}
