//! Dependency graph construction.
//!
//! Depth-first traversal from an entry module, driving the resolver and
//! scanner per module and producing a cycle-tolerant topological resolution
//! order. Unreadable modules degrade to warnings; only an unreadable entry
//! fails the build.

use rustc_hash::FxHashMap;
use serde::Serialize;
use thiserror::Error;

use crate::path::{self, ModulePath, Resolution};
use crate::scan::{self, ExportSite, ImportRecord};
use crate::source::ModuleSource;
use crate::transform;

/// Errors that can fail a whole build.
///
/// Everything else degrades gracefully into [`Warning`]s.
#[derive(Debug, Error)]
pub enum BundleError {
    /// The entry module's content could not be fetched.
    #[error("entry module is unreadable: {0}")]
    EntryUnreadable(ModulePath),
}

/// Why a module produced a warning instead of a bundle slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningReason {
    /// The module's content could not be fetched from the source.
    #[error("unreadable")]
    Unreadable,
}

/// A non-fatal problem recorded during a build, intended for display by the
/// caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub path: ModulePath,
    pub reason: WarningReason,
}

/// Lifecycle state of a module within one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    /// Referenced but not yet materialized in the graph.
    Unvisited,
    /// Currently on the traversal stack; an import of a Visiting module is a
    /// cycle back-edge.
    Visiting,
    /// Scanned, dependencies settled, transformed.
    Resolved,
    /// Content fetch failed; excluded from the resolution order.
    Failed,
}

/// One module in the graph.
#[derive(Debug, Clone)]
pub struct ModuleNode {
    pub path: ModulePath,
    pub raw_source: String,
    pub imports: Vec<ImportRecord>,
    pub export_sites: Vec<ExportSite>,
    /// Rewritten source; `None` until the node resolves.
    pub transformed: Option<String>,
    pub state: ModuleState,
}

impl ModuleNode {
    fn failed(path: ModulePath) -> Self {
        Self {
            path,
            raw_source: String::new(),
            imports: Vec::new(),
            export_sites: Vec::new(),
            transformed: None,
            state: ModuleState::Failed,
        }
    }
}

/// The complete dependency graph for one build.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    nodes: FxHashMap<ModulePath, ModuleNode>,
    /// Dependency-before-dependent order. Each resolved path appears exactly
    /// once; Failed modules are excluded. The entry is last.
    pub resolution_order: Vec<ModulePath>,
    pub warnings: Vec<Warning>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &ModulePath) -> Option<&ModuleNode> {
        self.nodes.get(path)
    }

    /// State of a path; [`ModuleState::Unvisited`] when no node exists yet.
    pub fn state_of(&self, path: &ModulePath) -> ModuleState {
        self.nodes
            .get(path)
            .map_or(ModuleState::Unvisited, |node| node.state)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Builds a [`DependencyGraph`] by depth-first traversal from an entry.
///
/// Holds a per-build content cache so a given path is fetched at most once.
/// Nothing survives a build call; every invocation starts fresh.
pub struct GraphBuilder<'a, S: ModuleSource> {
    source: &'a S,
    graph: DependencyGraph,
    content_cache: FxHashMap<ModulePath, Option<String>>,
}

impl<'a, S: ModuleSource> GraphBuilder<'a, S> {
    /// Build the graph rooted at `entry`.
    ///
    /// `entry_source`, when given, pre-seeds the entry's content (an
    /// unsaved editor buffer); the source is never consulted for it.
    pub fn build(
        source: &'a S,
        entry: &ModulePath,
        entry_source: Option<&str>,
    ) -> Result<DependencyGraph, BundleError> {
        let mut builder = Self {
            source,
            graph: DependencyGraph::new(),
            content_cache: FxHashMap::default(),
        };
        if let Some(text) = entry_source {
            builder
                .content_cache
                .insert(entry.clone(), Some(text.to_string()));
        }
        builder.visit(entry.clone());
        if builder.graph.state_of(entry) == ModuleState::Failed {
            return Err(BundleError::EntryUnreadable(entry.clone()));
        }
        Ok(builder.graph)
    }

    fn fetch(&mut self, path: &ModulePath) -> Option<String> {
        if let Some(cached) = self.content_cache.get(path) {
            return cached.clone();
        }
        let content = self.source.read(path);
        self.content_cache.insert(path.clone(), content.clone());
        content
    }

    fn visit(&mut self, path: ModulePath) {
        let Some(raw) = self.fetch(&path) else {
            self.graph
                .nodes
                .insert(path.clone(), ModuleNode::failed(path.clone()));
            self.graph.warnings.push(Warning {
                path,
                reason: WarningReason::Unreadable,
            });
            return;
        };

        let mut imports = scan::scan_imports(&raw);
        let export_sites = scan::scan_exports(&raw);
        for record in &mut imports {
            if let Resolution::Module(target) = path::resolve(&record.specifier, &path) {
                record.resolved = Some(target);
            }
        }
        let dependencies: Vec<ModulePath> =
            imports.iter().filter_map(|r| r.resolved.clone()).collect();

        self.graph.nodes.insert(
            path.clone(),
            ModuleNode {
                path: path.clone(),
                raw_source: raw,
                imports,
                export_sites,
                transformed: None,
                state: ModuleState::Visiting,
            },
        );

        for dependency in dependencies {
            // Visiting targets are cycle back-edges: stop recursing, let the
            // registry's partial-initialization behavior handle them at run
            // time. Resolved and Failed targets are already settled.
            if self.graph.state_of(&dependency) == ModuleState::Unvisited {
                self.visit(dependency);
            }
        }

        if let Some(node) = self.graph.nodes.get_mut(&path) {
            let transformed = transform::transform(node);
            node.transformed = Some(transformed);
            node.state = ModuleState::Resolved;
        }
        self.graph.resolution_order.push(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use std::cell::RefCell;

    fn entry(path: &str) -> ModulePath {
        ModulePath::new(path)
    }

    fn index_of(graph: &DependencyGraph, path: &str) -> usize {
        graph
            .resolution_order
            .iter()
            .position(|p| p.as_str() == path)
            .unwrap_or_else(|| panic!("{path} not in resolution order"))
    }

    #[test]
    fn test_dependency_before_dependent() {
        let source: MemorySource = [
            ("main.js", "import { greet } from './lib.js'; greet();"),
            ("lib.js", "export function greet() {}"),
        ]
        .into_iter()
        .collect();

        let graph = GraphBuilder::build(&source, &entry("main.js"), None).unwrap();
        assert_eq!(graph.resolution_order.len(), 2);
        assert!(index_of(&graph, "lib.js") < index_of(&graph, "main.js"));
        assert!(graph.warnings.is_empty());
    }

    #[test]
    fn test_diamond_dependency() {
        let source: MemorySource = [
            (
                "main.js",
                "import { a } from './a.js'; import { b } from './b.js';",
            ),
            ("a.js", "import { v } from './shared.js'; export const a = v;"),
            ("b.js", "import { v } from './shared.js'; export const b = v;"),
            ("shared.js", "export const v = 42;"),
        ]
        .into_iter()
        .collect();

        let graph = GraphBuilder::build(&source, &entry("main.js"), None).unwrap();
        assert_eq!(graph.resolution_order.len(), 4);
        assert!(index_of(&graph, "shared.js") < index_of(&graph, "a.js"));
        assert!(index_of(&graph, "shared.js") < index_of(&graph, "b.js"));
        assert_eq!(index_of(&graph, "main.js"), 3);
    }

    #[test]
    fn test_cycle_is_tolerated() {
        let source: MemorySource = [
            ("a.js", "import { y } from './b.js'; export let x = 1;"),
            ("b.js", "import { x } from './a.js'; export let y = 2;"),
        ]
        .into_iter()
        .collect();

        let graph = GraphBuilder::build(&source, &entry("a.js"), None).unwrap();
        assert_eq!(graph.resolution_order.len(), 2);
        assert_eq!(index_of(&graph, "b.js"), 0);
        assert_eq!(index_of(&graph, "a.js"), 1);
        assert!(graph.warnings.is_empty());
    }

    #[test]
    fn test_self_import_is_tolerated() {
        let source: MemorySource = [("a.js", "import { x } from './a.js'; export let x = 1;")]
            .into_iter()
            .collect();

        let graph = GraphBuilder::build(&source, &entry("a.js"), None).unwrap();
        assert_eq!(graph.resolution_order.len(), 1);
    }

    #[test]
    fn test_missing_import_warns_but_builds() {
        let source: MemorySource = [
            (
                "main.js",
                "import { gone } from './missing.js'; import { ok } from './lib.js';",
            ),
            ("lib.js", "export const ok = 1;"),
        ]
        .into_iter()
        .collect();

        let graph = GraphBuilder::build(&source, &entry("main.js"), None).unwrap();
        assert_eq!(graph.warnings.len(), 1);
        assert_eq!(graph.warnings[0].path.as_str(), "missing.js");
        assert_eq!(graph.warnings[0].reason, WarningReason::Unreadable);
        assert_eq!(graph.state_of(&entry("missing.js")), ModuleState::Failed);
        // The failed module is excluded from the order; the rest bundles.
        assert_eq!(graph.resolution_order.len(), 2);
        assert!(index_of(&graph, "lib.js") < index_of(&graph, "main.js"));
    }

    #[test]
    fn test_entry_unreadable_is_fatal() {
        let source = MemorySource::new();
        let result = GraphBuilder::build(&source, &entry("main.js"), None);
        assert!(matches!(result, Err(BundleError::EntryUnreadable(_))));
    }

    #[test]
    fn test_preseeded_entry_skips_source() {
        let source: MemorySource = [("lib.js", "export const x = 1;")].into_iter().collect();
        let graph = GraphBuilder::build(
            &source,
            &entry("scratch.js"),
            Some("import { x } from './lib.js';"),
        )
        .unwrap();
        assert_eq!(graph.resolution_order.len(), 2);
        assert_eq!(index_of(&graph, "scratch.js"), 1);
    }

    #[test]
    fn test_external_imports_are_not_traversed() {
        let source: MemorySource = [(
            "main.js",
            "import 'https://cdn.example.com/lib.js';\nconsole.log(1);",
        )]
        .into_iter()
        .collect();

        let graph = GraphBuilder::build(&source, &entry("main.js"), None).unwrap();
        assert_eq!(graph.resolution_order.len(), 1);
        assert!(graph.warnings.is_empty());
    }

    #[test]
    fn test_content_fetched_at_most_once_per_path() {
        struct CountingSource {
            inner: MemorySource,
            reads: RefCell<Vec<String>>,
        }
        impl ModuleSource for CountingSource {
            fn read(&self, path: &ModulePath) -> Option<String> {
                self.reads.borrow_mut().push(path.as_str().to_string());
                self.inner.read(path)
            }
        }

        let source = CountingSource {
            inner: [
                (
                    "main.js",
                    "import { a } from './a.js'; import { b } from './b.js';",
                ),
                ("a.js", "import { v } from './shared.js'; export const a = 1;"),
                ("b.js", "import { v } from './shared.js'; export const b = 2;"),
                ("shared.js", "export const v = 42;"),
            ]
            .into_iter()
            .collect(),
            reads: RefCell::new(Vec::new()),
        };

        let graph = GraphBuilder::build(&source, &entry("main.js"), None).unwrap();
        assert_eq!(graph.resolution_order.len(), 4);
        let reads = source.reads.borrow();
        let shared_reads = reads.iter().filter(|p| *p == "shared.js").count();
        assert_eq!(shared_reads, 1);
    }

    #[test]
    fn test_warning_serializes_for_display() {
        let warning = Warning {
            path: ModulePath::new("missing.js"),
            reason: WarningReason::Unreadable,
        };
        let json = serde_json::to_string(&warning).unwrap();
        assert_eq!(json, r#"{"path":"missing.js","reason":"unreadable"}"#);
    }
}
