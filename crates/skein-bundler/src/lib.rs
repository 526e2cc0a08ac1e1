//! Runtime module bundler/linker.
//!
//! Given source modules held in a virtual filesystem ([`ModuleSource`]) and
//! an entry module (possibly unsaved, in-memory text), discovers the
//! transitive dependency graph, linearizes it cycle-tolerantly, and rewrites
//! each module's import/export syntax into one self-executing unit that runs
//! with no external module loader, while preserving live-binding semantics:
//! an export's observed value always reflects the exporting module's most
//! recent assignment, not a value captured at import time.
//!
//! The pipeline: [`path`] resolves specifiers, [`scan`] extracts
//! import/export records, [`graph`] drives the depth-first traversal,
//! [`transform`] rewrites each module, and [`assemble`] emits the final
//! [`Bundle`]. Execution of the produced text (a sandboxed preview surface,
//! a REPL) is entirely the caller's concern.
//!
//! ```
//! use skein_bundler::{Bundler, MemorySource};
//!
//! let source: MemorySource = [
//!     ("lib.js", "export function greet() { console.log('hi'); }"),
//!     ("main.js", "import { greet } from './lib.js'; greet();"),
//! ]
//! .into_iter()
//! .collect();
//!
//! let bundle = Bundler::new(source).bundle("main.js").unwrap();
//! assert!(bundle.warnings.is_empty());
//! assert!(bundle.text.contains("__registry__[\"lib.js\"]"));
//! ```

pub mod assemble;
pub mod graph;
pub mod path;
pub mod scan;
pub mod source;
pub mod transform;

pub use assemble::{assemble, Bundle};
pub use graph::{
    BundleError, DependencyGraph, GraphBuilder, ModuleNode, ModuleState, Warning, WarningReason,
};
pub use path::{resolve, resolve_entry, ModulePath, Resolution};
pub use scan::{
    scan_exports, scan_imports, ExportRecord, ExportRewrite, ExportSite, ImportBinding,
    ImportForm, ImportRecord,
};
pub use source::{MemorySource, ModuleSource};
pub use transform::transform;

/// Facade tying the pipeline together over one module source.
///
/// Holds no state across builds: every call rebuilds the graph and bundle
/// from scratch, so concurrent or superseded builds cannot contaminate each
/// other. Serializing trigger requests is the caller's responsibility.
pub struct Bundler<S: ModuleSource> {
    source: S,
}

impl<S: ModuleSource> Bundler<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Bundle starting from `entry`, reading all content through the source.
    ///
    /// The only fatal condition is an unreadable entry; everything else
    /// degrades into [`Bundle::warnings`].
    pub fn bundle(&self, entry: &str) -> Result<Bundle, BundleError> {
        let entry_path = path::resolve_entry(entry);
        let graph = GraphBuilder::build(&self.source, &entry_path, None)?;
        Ok(assemble::assemble(&graph, &entry_path))
    }

    /// Bundle with pre-seeded entry text (an unsaved editor buffer); the
    /// source is never consulted for the entry itself.
    pub fn bundle_with_source(&self, entry: &str, entry_source: &str) -> Result<Bundle, BundleError> {
        let entry_path = path::resolve_entry(entry);
        let graph = GraphBuilder::build(&self.source, &entry_path, Some(entry_source))?;
        Ok(assemble::assemble(&graph, &entry_path))
    }
}
