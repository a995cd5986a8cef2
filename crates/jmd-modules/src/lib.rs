//! Java Platform Module System (JPMS) declarations.
//!
//! A [`ModuleDeclaration`] is read from a `module-info.java` unit (see [`reader`]) or built
//! programmatically with [`ModuleDeclaration::builder`]. Declarations are immutable once built and
//! only carry what dependency derivation needs: `requires` in source order, service types from
//! `uses`, `provides` with their implementations, and build-only directives that have no
//! `module-info` syntax.

use std::collections::{BTreeMap, BTreeSet};

use jmd_core::ModuleName;
use serde::{Deserialize, Serialize};

pub mod jdk;
pub mod naming;
pub mod ordering;
pub mod parse;
pub mod reader;
pub mod render;

pub use parse::{parse_module_info, ModuleInfoParseError, ParsedModuleInfo};
pub use reader::{ModuleInfoReader, ReadError, MODULE_INFO_FILE};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDeclaration {
    pub name: ModuleName,
    #[serde(default)]
    pub is_open: bool,
    #[serde(default)]
    pub requires: Vec<RequiresDirective>,
    #[serde(default)]
    pub uses: BTreeSet<String>,
    /// Service type to implementation classes, in source order.
    #[serde(default)]
    pub provides: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub build_only: Vec<BuildOnlyDirective>,
}

impl ModuleDeclaration {
    pub fn builder(name: ModuleName) -> ModuleDeclarationBuilder {
        ModuleDeclarationBuilder {
            decl: ModuleDeclaration {
                name,
                is_open: false,
                requires: Vec::new(),
                uses: BTreeSet::new(),
                provides: BTreeMap::new(),
                build_only: Vec::new(),
            },
        }
    }

    /// All module names this declaration depends on, in declaration order (duplicates removed).
    pub fn required_modules(&self) -> Vec<&ModuleName> {
        let mut seen = BTreeSet::new();
        self.requires
            .iter()
            .map(|r| &r.target)
            .chain(self.build_only.iter().map(|d| &d.target))
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// Service types named by `uses` and `provides` directives.
    pub fn service_types(&self) -> impl Iterator<Item = &str> {
        self.uses.iter().chain(self.provides.keys()).map(String::as_str)
    }

    /// Requires directives of one [`DirectiveKind`], in source order.
    pub fn requires_of_kind(
        &self,
        kind: DirectiveKind,
    ) -> impl Iterator<Item = &RequiresDirective> {
        self.requires.iter().filter(move |r| r.kind() == kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequiresDirective {
    pub target: ModuleName,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_transitive: bool,
    /// `requires /*runtime*/ x;`: a requirement that only exists at runtime.
    #[serde(default)]
    pub is_runtime: bool,
}

impl RequiresDirective {
    pub fn new(target: ModuleName) -> Self {
        Self {
            target,
            is_static: false,
            is_transitive: false,
            is_runtime: false,
        }
    }

    /// `static` wins over the runtime marker, the runtime marker wins over `transitive`.
    pub fn kind(&self) -> DirectiveKind {
        match (self.is_static, self.is_runtime, self.is_transitive) {
            (true, _, true) => DirectiveKind::RequiresStaticTransitive,
            (true, _, false) => DirectiveKind::RequiresStatic,
            (false, true, _) => DirectiveKind::RequiresRuntime,
            (false, false, true) => DirectiveKind::RequiresTransitive,
            (false, false, false) => DirectiveKind::Requires,
        }
    }
}

/// The flavours of `requires` a `module-info.java` can spell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DirectiveKind {
    Requires,
    RequiresTransitive,
    RequiresStatic,
    RequiresStaticTransitive,
    RequiresRuntime,
}

impl DirectiveKind {
    pub const ALL: [DirectiveKind; 5] = [
        DirectiveKind::Requires,
        DirectiveKind::RequiresTransitive,
        DirectiveKind::RequiresStatic,
        DirectiveKind::RequiresStaticTransitive,
        DirectiveKind::RequiresRuntime,
    ];

    /// Source spelling without the module name, e.g. `requires static transitive`.
    pub fn literal(self) -> &'static str {
        match self {
            DirectiveKind::Requires => "requires",
            DirectiveKind::RequiresTransitive => "requires transitive",
            DirectiveKind::RequiresStatic => "requires static",
            DirectiveKind::RequiresStaticTransitive => "requires static transitive",
            DirectiveKind::RequiresRuntime => "requires /*runtime*/",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildOnlyKind {
    RuntimeOnly,
    AnnotationProcessor,
}

/// A dependency that cannot be expressed in `module-info.java`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildOnlyDirective {
    pub kind: BuildOnlyKind,
    pub target: ModuleName,
}

/// Programmatic replacement for a `module-info.java` unit.
#[derive(Debug, Clone)]
pub struct ModuleDeclarationBuilder {
    decl: ModuleDeclaration,
}

impl ModuleDeclarationBuilder {
    pub fn open(mut self) -> Self {
        self.decl.is_open = true;
        self
    }

    pub fn requires(self, target: ModuleName) -> Self {
        self.directive(RequiresDirective::new(target))
    }

    pub fn requires_transitive(self, target: ModuleName) -> Self {
        self.directive(RequiresDirective {
            is_transitive: true,
            ..RequiresDirective::new(target)
        })
    }

    pub fn requires_static(self, target: ModuleName) -> Self {
        self.directive(RequiresDirective {
            is_static: true,
            ..RequiresDirective::new(target)
        })
    }

    pub fn requires_static_transitive(self, target: ModuleName) -> Self {
        self.directive(RequiresDirective {
            is_static: true,
            is_transitive: true,
            ..RequiresDirective::new(target)
        })
    }

    pub fn requires_runtime(self, target: ModuleName) -> Self {
        self.directive(RequiresDirective {
            is_runtime: true,
            ..RequiresDirective::new(target)
        })
    }

    pub fn directive(mut self, directive: RequiresDirective) -> Self {
        self.decl.requires.push(directive);
        self
    }

    pub fn uses(mut self, service: impl Into<String>) -> Self {
        self.decl.uses.insert(service.into());
        self
    }

    pub fn provides<I>(mut self, service: impl Into<String>, implementations: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.decl
            .provides
            .entry(service.into())
            .or_default()
            .extend(implementations.into_iter().map(Into::into));
        self
    }

    pub fn runtime_only(mut self, target: ModuleName) -> Self {
        self.decl.build_only.push(BuildOnlyDirective {
            kind: BuildOnlyKind::RuntimeOnly,
            target,
        });
        self
    }

    pub fn annotation_processor(mut self, target: ModuleName) -> Self {
        self.decl.build_only.push(BuildOnlyDirective {
            kind: BuildOnlyKind::AnnotationProcessor,
            target,
        });
        self
    }

    pub fn build(self) -> ModuleDeclaration {
        self.decl
    }
}
