//! `skein graph` — print the resolution order for an entry module.

use std::path::Path;

use skein_bundler::{resolve_entry, GraphBuilder};

use crate::output::{resolve_color_choice, StyledOutput};
use crate::source::DirSource;

pub fn execute(entry: &str, root: &Path, color: &str) -> anyhow::Result<()> {
    let source = DirSource::new(root);
    let entry_path = resolve_entry(entry);
    let graph = GraphBuilder::build(&source, &entry_path, None)?;

    for (index, path) in graph.resolution_order.iter().enumerate() {
        println!("{index:>3}  {path}");
    }

    let mut out = StyledOutput::new(resolve_color_choice(color));
    for warning in &graph.warnings {
        out.warning("warning");
        out.plain(&format!(": {}: {}\n", warning.path, warning.reason));
    }
    Ok(())
}
