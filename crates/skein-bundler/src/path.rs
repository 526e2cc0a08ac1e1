//! Module path canonicalization and import specifier resolution.
//!
//! Resolution is purely lexical: no existence checks, no filesystem probing.
//! Fetch failures are handled later by the graph builder.

use std::fmt;

use serde::Serialize;

/// Canonical, project-relative identifier for a module.
///
/// Contains no `./` segments and no `../` segments; it is the unique key
/// for a module within one build.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ModulePath(String);

impl ModulePath {
    /// Wrap an already-canonical path.
    pub fn new(path: impl Into<String>) -> Self {
        ModulePath(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Directory portion of the path; empty for root-level modules.
    pub fn directory(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[..idx],
            None => "",
        }
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of resolving an import specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Project-local module, canonicalized.
    Module(ModulePath),
    /// Absolute URL, data URI, or protocol-relative specifier. External
    /// imports are excluded from traversal and left untouched by the
    /// transformer.
    External,
}

/// Resolve an import specifier against the module that contains it.
///
/// Relative specifiers resolve against the importer's directory; `.` is a
/// no-op, `..` pops one segment (clamped at the project root), and a leading
/// `/` resolves from the project root.
pub fn resolve(specifier: &str, importer: &ModulePath) -> Resolution {
    if is_external(specifier) {
        return Resolution::External;
    }
    let base = if specifier.starts_with('/') {
        ""
    } else {
        importer.directory()
    };
    Resolution::Module(ModulePath(join(base, specifier)))
}

/// Resolve an entry specifier. The entry's "importer" is the project root.
pub fn resolve_entry(specifier: &str) -> ModulePath {
    ModulePath(join("", specifier))
}

fn join(dir: &str, specifier: &str) -> String {
    let mut segments: Vec<&str> = dir.split('/').filter(|s| !s.is_empty()).collect();
    for seg in specifier.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// Absolute URLs (`https://…`, `data:…`), and protocol-relative `//…`
/// specifiers are external.
fn is_external(specifier: &str) -> bool {
    if specifier.starts_with("//") {
        return true;
    }
    let head = specifier.split('/').next().unwrap_or("");
    match head.find(':') {
        Some(pos) if pos > 0 => {
            let scheme = &head[..pos];
            scheme
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'))
        }
        _ => false,
    }
}
