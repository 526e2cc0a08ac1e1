//! Module transformer.
//!
//! Pure string rewrite over a module's raw source, using the exact spans
//! recorded by the scanner: import statements become registry lookups,
//! export statements become plain local declarations, and live-binding
//! accessors are appended for every recorded export.

use std::fmt::Write;
use std::ops::Range;

use rustc_hash::FxHashSet;

use crate::graph::ModuleNode;
use crate::scan::{ExportRewrite, ImportBinding, ImportForm, ImportRecord};

/// Rewrite one module's source. Imports of external specifiers and anything
/// the scanner could not parse are left untouched.
pub fn transform(node: &ModuleNode) -> String {
    let source = &node.raw_source;
    let mut edits: Vec<(Range<usize>, String)> = Vec::new();

    for record in &node.imports {
        if let Some(replacement) = import_replacement(record) {
            edits.push((record.span.clone(), replacement));
        }
    }
    for site in &node.export_sites {
        let replacement = match site.rewrite {
            ExportRewrite::DefaultAssign => "__exports.default =".to_string(),
            ExportRewrite::StripKeyword | ExportRewrite::RemoveStatement => String::new(),
        };
        edits.push((site.span.clone(), replacement));
    }
    edits.sort_by_key(|(range, _)| range.start);

    let mut out = String::with_capacity(source.len());
    let mut pos = 0;
    for (range, replacement) in &edits {
        if range.start < pos {
            continue;
        }
        out.push_str(&source[pos..range.start]);
        out.push_str(replacement);
        pos = range.end;
    }
    out.push_str(&source[pos..]);

    append_accessors(node, &mut out);
    out
}

/// Registry lookup expression for a module path.
fn registry_lookup(path: &str) -> String {
    format!("__registry__[{path:?}]")
}

fn import_replacement(record: &ImportRecord) -> Option<String> {
    // External imports (unresolved specifiers) are never rewritten.
    let target = record.resolved.as_ref()?;
    let lookup = registry_lookup(target.as_str());
    let local = record.local.as_deref().unwrap_or("_");
    let replacement = match record.form {
        // The dependency already executed earlier in resolution order.
        ImportForm::SideEffect => String::new(),
        ImportForm::Namespace => format!("const {local} = {lookup};"),
        ImportForm::Default => format!("const {local} = {lookup}.default;"),
        ImportForm::Named => {
            format!("const {{{}}} = {lookup};", destructure_pattern(&record.bindings))
        }
        ImportForm::DefaultAndNamed => format!(
            "const {local} = {lookup}.default; const {{{}}} = {lookup};",
            destructure_pattern(&record.bindings)
        ),
    };
    Some(replacement)
}

fn destructure_pattern(bindings: &[ImportBinding]) -> String {
    bindings
        .iter()
        .map(|binding| {
            if binding.imported == binding.local {
                binding.imported.clone()
            } else {
                format!("{}: {}", binding.imported, binding.local)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Define a getter (and a setter when mutable) on `__exports` for every
/// recorded export, deduplicated by exported alias (first occurrence wins).
/// A dependent reading the export after the module reassigns the local
/// observes the new value, not a snapshot taken at import time.
fn append_accessors(node: &ModuleNode, out: &mut String) {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    let mut accessors = String::new();
    for site in &node.export_sites {
        for record in &site.records {
            if !seen.insert(record.alias.as_str()) {
                continue;
            }
            if record.mutable {
                let _ = writeln!(
                    accessors,
                    "Object.defineProperty(__exports, {:?}, {{ enumerable: true, get: () => {}, set: (__v) => {{ {} = __v; }} }});",
                    record.alias, record.local, record.local
                );
            } else {
                let _ = writeln!(
                    accessors,
                    "Object.defineProperty(__exports, {:?}, {{ enumerable: true, get: () => {} }});",
                    record.alias, record.local
                );
            }
        }
    }
    if !accessors.is_empty() {
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&accessors);
    }
}
