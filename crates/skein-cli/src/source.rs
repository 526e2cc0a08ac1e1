//! Directory-backed module source.

use std::fs;
use std::path::PathBuf;

use skein_bundler::{ModulePath, ModuleSource};

/// Reads modules from a project directory. The directory plays the role of
/// the virtual filesystem: module paths are joined onto the root, and any
/// read failure means "not found".
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ModuleSource for DirSource {
    fn read(&self, path: &ModulePath) -> Option<String> {
        // Canonical module paths contain no `..` segments, so the join
        // cannot escape the root.
        fs::read_to_string(self.root.join(path.as_str())).ok()
    }
}
