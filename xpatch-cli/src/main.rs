//! XML structural diff and patch tool CLI.

use std::fs::File;
use std::io::{self, BufWriter, Write};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use xml_patch::{parse_file, PatchOpsWriter, XmlDiff, XmlMerge, XmlPrinter};

/// XML structural diff and patch tool
#[derive(Parser)]
#[command(name = "xpatch")]
#[command(version)]
#[command(about = "XML structural diff and patch tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a patch document describing the differences between two XML files
    #[command(visible_alias = "d")]
    Diff {
        /// Baseline file
        file1: String,
        /// Modified file
        file2: String,
        /// Output file (default: stdout)
        output: Option<String>,

        /// Match child elements by id/name key regardless of document order
        #[arg(short = 'u', long)]
        unordered: bool,
    },

    /// Apply a patch document to a baseline XML file
    #[command(visible_alias = "m")]
    Merge {
        /// Baseline file
        baseline: String,
        /// Patch file produced by the diff command
        patchfile: String,
        /// Output file (default: stdout)
        output: Option<String>,
    },
}

fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Diff {
            file1,
            file2,
            output,
            unordered,
        } => run_diff(&file1, &file2, output.as_deref(), unordered),
        Commands::Merge {
            baseline,
            patchfile,
            output,
        } => run_merge(&baseline, &patchfile, output.as_deref()),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::ExitCode::FAILURE
        }
    }
}

/// Opens the output file, or stdout when none is given.
fn open_output(output_path: Option<&str>) -> io::Result<Box<dyn Write>> {
    Ok(match output_path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout()),
    })
}

/// Generates a patch document from two XML files.
fn run_diff(
    file1: &str,
    file2: &str,
    output_path: Option<&str>,
    unordered: bool,
) -> Result<std::process::ExitCode, Box<dyn std::error::Error>> {
    let tree1 = parse_file(file1)?;
    let tree2 = parse_file(file2)?;

    let mut differ = XmlDiff::new();
    differ.set_ordered(!unordered);

    let output = open_output(output_path)?;
    let mut sink = PatchOpsWriter::new(output);
    differ.diff(&tree1, &tree2, &mut sink)?;

    eprintln!("Diff complete.");
    Ok(std::process::ExitCode::SUCCESS)
}

/// Applies a patch document to a baseline file.
fn run_merge(
    baseline_path: &str,
    patch_path: &str,
    output_path: Option<&str>,
) -> Result<std::process::ExitCode, Box<dyn std::error::Error>> {
    let baseline = parse_file(baseline_path)?;
    let patch = parse_file(patch_path)?;

    let mut merger = XmlMerge::new();
    let errors = merger.merge(&baseline, &patch)?;

    // The mutated baseline is written out even when operations failed;
    // a non-zero error count means the output may be incomplete
    let output = open_output(output_path)?;
    let mut printer = XmlPrinter::new(output);
    printer.print(&baseline)?;

    if errors > 0 {
        eprintln!("Merge complete with {} errors.", errors);
        Ok(std::process::ExitCode::FAILURE)
    } else {
        eprintln!("Merge complete.");
        Ok(std::process::ExitCode::SUCCESS)
    }
}
