//! `skein bundle` — produce one self-executing unit from an entry module.

use std::fs;
use std::path::Path;

use skein_bundler::Bundler;

use crate::output::{resolve_color_choice, StyledOutput};
use crate::source::DirSource;

pub fn execute(
    entry: &str,
    root: &Path,
    output: Option<&Path>,
    json: bool,
    color: &str,
) -> anyhow::Result<()> {
    let bundler = Bundler::new(DirSource::new(root));
    let bundle = bundler.bundle(entry)?;

    let mut out = StyledOutput::new(resolve_color_choice(color));
    if json {
        eprintln!("{}", serde_json::to_string(&bundle.warnings)?);
    } else {
        for warning in &bundle.warnings {
            out.warning("warning");
            out.plain(&format!(": {}: {}\n", warning.path, warning.reason));
        }
    }

    match output {
        Some(file) => {
            fs::write(file, &bundle.text)?;
            out.success("bundled");
            out.plain(&format!(": {} -> {}\n", entry, file.display()));
        }
        None => print!("{}", bundle.text),
    }
    Ok(())
}
