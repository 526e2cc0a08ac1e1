//! Read access to the virtual filesystem a build pulls modules from.

use rustc_hash::FxHashMap;

use crate::path::ModulePath;

/// Provides raw module text by canonical path.
///
/// `None` means "not found"; implementations never panic for a missing
/// module. The graph builder reads each path at most once per build.
pub trait ModuleSource {
    fn read(&self, path: &ModulePath) -> Option<String>;
}

/// In-memory module map, the analogue of an editor's unsaved workspace.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: FxHashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) a module's text.
    pub fn insert(&mut self, path: impl Into<String>, text: impl Into<String>) -> &mut Self {
        self.files.insert(path.into(), text.into());
        self
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl<P: Into<String>, T: Into<String>> FromIterator<(P, T)> for MemorySource {
    fn from_iter<I: IntoIterator<Item = (P, T)>>(iter: I) -> Self {
        let mut source = MemorySource::new();
        for (path, text) in iter {
            source.insert(path, text);
        }
        source
    }
}

impl ModuleSource for MemorySource {
    fn read(&self, path: &ModulePath) -> Option<String> {
        self.files.get(path.as_str()).cloned()
    }
}
