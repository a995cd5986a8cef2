//! Naming conventions that tie projects and source sets to module names and capabilities.

pub const MAIN_SOURCE_SET: &str = "main";

/// `("my-lib", "main")` → `my.lib`, `("my-lib", "testFixtures")` → `my.lib.test.fixtures`.
pub fn source_set_to_module_name(project: &str, source_set: &str) -> String {
    if source_set == MAIN_SOURCE_SET {
        return to_dotted_case(project);
    }
    format!("{}.{}", to_dotted_case(project), to_dotted_case(source_set))
}

/// Capability suffix of a non-main source set (`testFixtures` → `test-fixtures`).
pub fn source_set_capability_suffix(source_set: &str) -> Option<String> {
    (source_set != MAIN_SOURCE_SET).then(|| to_kebab_case(source_set))
}

/// The part of `module` in front of the project (and source set) name, i.e. the prefix shared by
/// all modules of the build. `Some("")` when the module is named exactly like the project.
pub fn own_module_prefix(module: &str, project: &str, source_set: &str) -> Option<String> {
    if module == project {
        return Some(String::new());
    }
    let qualified = source_set_to_module_name(project, source_set);
    if let Some(prefix) = module.strip_suffix(&format!(".{qualified}")) {
        return Some(prefix.to_string());
    }
    module
        .strip_suffix(&format!(".{project}"))
        .map(ToString::to_string)
}

/// `camelCase` and `kebab-case` to `dotted.case`.
pub fn to_dotted_case(name: &str) -> String {
    split_words(&name.replace('-', ".")).join(".")
}

/// `camelCase` to `kebab-case`.
pub fn to_kebab_case(name: &str) -> String {
    split_words(name).join("-")
}

// Splits before an upper-case letter that follows a non-upper-case one, and before the last
// capital of an acronym that starts a new word (`HTTPServer` → `http`, `server`).
fn split_words(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (idx, &c) in chars.iter().enumerate() {
        if idx > 0 && c.is_uppercase() && !current.is_empty() {
            let prev = chars[idx - 1];
            let next_is_lower = chars.get(idx + 1).is_some_and(|n| n.is_lowercase());
            let separator_before = prev == '.' || prev == '-';
            if !separator_before && (!prev.is_uppercase() || next_is_lower) {
                words.push(std::mem::take(&mut current));
            }
        }
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}
