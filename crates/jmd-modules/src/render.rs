use jmd_core::ModuleName;

use crate::DirectiveKind;

/// Block order used when writing a `module-info.java`.
pub const RENDER_ORDER: [DirectiveKind; 5] = [
    DirectiveKind::RequiresTransitive,
    DirectiveKind::Requires,
    DirectiveKind::RequiresStaticTransitive,
    DirectiveKind::RequiresStatic,
    DirectiveKind::RequiresRuntime,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderEntry {
    Module(ModuleName),
    /// A dependency no module name is known for, kept as a comment.
    Unmapped(String),
}

/// Render a `module-info.java` with one block per directive kind. Empty blocks are omitted.
pub fn render_module_info(
    name: &ModuleName,
    blocks: &[(DirectiveKind, Vec<RenderEntry>)],
) -> String {
    let mut out = format!("module {name} {{\n");
    for kind in RENDER_ORDER {
        let entries: Vec<&RenderEntry> = blocks
            .iter()
            .filter(|(k, _)| *k == kind)
            .flat_map(|(_, entries)| entries)
            .collect();
        if entries.is_empty() {
            continue;
        }
        for entry in entries {
            match entry {
                RenderEntry::Module(module) => {
                    out.push_str(&format!("    {} {module};\n", kind.literal()));
                }
                RenderEntry::Unmapped(raw) => {
                    out.push_str(&format!("    // {} {raw};\n", kind.literal()));
                }
            }
        }
        out.push('\n');
    }
    out.push_str("}\n");
    out
}
