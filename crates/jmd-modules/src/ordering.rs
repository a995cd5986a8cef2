use std::cmp::Ordering;
use std::fmt;

use jmd_core::{Finding, FindingKind, ModuleName, Severity};

use crate::{DirectiveKind, ModuleDeclaration};

/// A directive block whose entries are not in the canonical order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderViolation {
    pub kind: DirectiveKind,
    pub actual: Vec<ModuleName>,
    pub expected: Vec<ModuleName>,
}

impl OrderViolation {
    pub fn into_finding(self, module: ModuleName) -> Finding {
        Finding::new(FindingKind::DirectiveOrder, Severity::Fatal, self.to_string())
            .with_module(module)
    }
}

impl fmt::Display for OrderViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let literal = self.kind.literal();
        writeln!(
            f,
            "'{literal}' are not declared in alphabetical order. Please use this order:"
        )?;
        for name in &self.expected {
            writeln!(f, "    {literal} {name};")?;
        }
        Ok(())
    }
}

/// Check that every directive block lists modules of the build first (those starting with
/// `own_prefix`), then everything else, each group in alphabetical order of the source text.
pub fn check_directive_order(
    decl: &ModuleDeclaration,
    own_prefix: Option<&str>,
) -> Vec<OrderViolation> {
    DirectiveKind::ALL
        .into_iter()
        .filter_map(|kind| {
            let actual: Vec<ModuleName> = decl
                .requires_of_kind(kind)
                .map(|r| r.target.clone())
                .collect();
            let mut expected = actual.clone();
            expected.sort_by(|a, b| compare_entries(a.as_str(), b.as_str(), own_prefix));
            (actual != expected).then_some(OrderViolation {
                kind,
                actual,
                expected,
            })
        })
        .collect()
}

fn compare_entries(a: &str, b: &str, own_prefix: Option<&str>) -> Ordering {
    if let Some(prefix) = own_prefix {
        match (a.starts_with(prefix), b.starts_with(prefix)) {
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        }
    }
    // Compared as written, terminator included: `a.b;` sorts before `a;`.
    let a = a.bytes().chain(std::iter::once(b';'));
    let b = b.bytes().chain(std::iter::once(b';'));
    a.cmp(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn module(name: &str) -> ModuleName {
        ModuleName::parse(name).unwrap()
    }

    #[test]
    fn own_modules_first_then_alphabetical() {
        let decl = ModuleDeclaration::builder(module("org.example.app"))
            .requires(module("org.slf4j"))
            .requires(module("org.example.core"))
            .requires(module("com.google.gson"))
            .requires_static(module("org.jspecify"))
            .build();

        let violations = check_directive_order(&decl, Some("org.example."));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, DirectiveKind::Requires);
        assert_eq!(
            violations[0]
                .expected
                .iter()
                .map(ModuleName::as_str)
                .collect::<Vec<_>>(),
            vec!["org.example.core", "com.google.gson", "org.slf4j"]
        );
        assert_eq!(
            violations[0].to_string(),
            "'requires' are not declared in alphabetical order. Please use this order:\n    requires org.example.core;\n    requires com.google.gson;\n    requires org.slf4j;\n"
        );
    }

    #[test]
    fn sorted_blocks_pass() {
        let decl = ModuleDeclaration::builder(module("a"))
            .requires_transitive(module("b"))
            .requires(module("org.slf4j.simple"))
            .requires(module("org.slf4j"))
            .build();
        assert!(check_directive_order(&decl, None).is_empty());
    }

    #[test]
    fn violation_becomes_fatal_finding() {
        let decl = ModuleDeclaration::builder(module("a"))
            .requires(module("z"))
            .requires(module("b"))
            .build();
        let finding = check_directive_order(&decl, None)
            .remove(0)
            .into_finding(module("a"));
        assert_eq!(finding.kind, FindingKind::DirectiveOrder);
        assert!(finding.is_fatal());
    }
}
