//! Bundle assembler.
//!
//! Emits one self-contained, immediately-invoked unit from the ordered,
//! transformed modules of a [`DependencyGraph`]. The produced text references
//! nothing beyond host built-ins; execution is entirely the caller's concern.

use std::fmt::Write;

use crate::graph::{DependencyGraph, Warning};
use crate::path::ModulePath;

/// The finished build product: one block of executable source plus the
/// warnings accumulated while constructing the graph. Transient; rebuilt
/// from scratch on every request.
#[derive(Debug, Clone)]
pub struct Bundle {
    pub text: String,
    pub warnings: Vec<Warning>,
}

/// Assemble the ordered, transformed modules into one executable unit.
///
/// Every path in the resolution order gets its (initially empty) export
/// object registered up front, so a mid-cycle reader destructures an
/// existing object and observes `undefined` for exports not yet assigned
/// instead of failing hard. Initializers then run in resolution order,
/// each exactly once; the entry body executes last, inline, with the
/// fully-populated registry in scope. Output is byte-identical across
/// rebuilds of identical input.
pub fn assemble(graph: &DependencyGraph, entry: &ModulePath) -> Bundle {
    let mut text = String::new();
    text.push_str("(function () {\n\"use strict\";\nconst __registry__ = Object.create(null);\n");
    for path in &graph.resolution_order {
        let _ = writeln!(text, "__registry__[{:?}] = {{}};", path.as_str());
    }

    for path in &graph.resolution_order {
        if path == entry {
            continue;
        }
        let Some(body) = graph.get(path).and_then(|node| node.transformed.as_deref()) else {
            continue;
        };
        let _ = write!(text, "\n// --- {path} ---\n(function (__exports) {{\n");
        push_body(&mut text, body);
        let _ = writeln!(text, "}})(__registry__[{:?}]);", path.as_str());
    }

    if let Some(body) = graph.get(entry).and_then(|node| node.transformed.as_deref()) {
        let _ = write!(
            text,
            "\n// --- {entry} (entry) ---\nconst __exports = __registry__[{:?}];\n",
            entry.as_str()
        );
        push_body(&mut text, body);
    }
    text.push_str("})();\n");

    Bundle {
        text,
        warnings: graph.warnings.clone(),
    }
}

fn push_body(text: &mut String, body: &str) {
    text.push_str(body);
    if !body.ends_with('\n') {
        text.push('\n');
    }
}
