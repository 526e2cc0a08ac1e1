//! skein unified CLI tool
//!
//! Command-line interface over the bundler core: produce a self-executing
//! bundle from an entry module, or inspect its resolution order.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod output;
mod source;

#[derive(Parser)]
#[command(name = "skein")]
#[command(about = "Runtime module bundler", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bundle an entry module and its dependencies into one executable unit
    Bundle {
        /// Entry module, relative to the project root
        entry: String,
        /// Project root directory
        #[arg(long, default_value = ".")]
        root: PathBuf,
        /// Write the bundle here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print warnings as JSON on stderr
        #[arg(long)]
        json: bool,
        /// Colored output: auto, always, never
        #[arg(long, default_value = "auto")]
        color: String,
    },

    /// Print the resolution order for an entry module
    Graph {
        /// Entry module, relative to the project root
        entry: String,
        /// Project root directory
        #[arg(long, default_value = ".")]
        root: PathBuf,
        /// Colored output: auto, always, never
        #[arg(long, default_value = "auto")]
        color: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Bundle {
            entry,
            root,
            output,
            json,
            color,
        } => commands::bundle::execute(&entry, &root, output.as_deref(), json, &color),
        Commands::Graph { entry, root, color } => commands::graph::execute(&entry, &root, &color),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
