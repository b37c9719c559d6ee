//! Command line arguments

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "csskit")]
#[command(about = "Parse and reprint CSS with source maps")]
#[command(version)]
#[command(
    long_about = "Parses every input stylesheet, prints it back and writes its source map.\n\
\n\
Examples:\n  \
csskit a.css -o out/a.css --map file      # Write out/a.css and out/a.css.map\n  \
csskit 'src/**/*.css' -o out --map inline # Several files into a directory\n  \
csskit a.css --prev-map a.css.map         # Chain onto an existing map"
)]
pub struct Cli {
    /// Input files or glob patterns
    #[arg(required = true)]
    pub inputs: Vec<String>,

    /// Output file, or output directory when there are several inputs
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Source map mode
    #[arg(long, value_enum)]
    pub map: Option<MapMode>,

    /// Do not add a sourceMappingURL annotation
    #[arg(long)]
    pub no_annotation: bool,

    /// Do not embed the input CSS in the map
    #[arg(long)]
    pub no_sources_content: bool,

    /// Previous source map of the inputs
    #[arg(long, value_name = "PATH")]
    pub prev_map: Option<PathBuf>,

    /// JSON file with default processing options
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Cut unclosed strings and comments at the end of input instead of failing
    #[arg(long)]
    pub ignore_errors: bool,

    /// Verbose output (can be used multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapMode {
    /// Embed the map into the CSS as a data URI
    Inline,
    /// Write the map next to the output file
    File,
    /// Do not generate a map
    None,
}
