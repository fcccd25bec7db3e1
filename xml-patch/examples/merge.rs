//! Example: Apply a patch document to a baseline XML file
//!
//! Usage: cargo run --example merge <baseline.xml> <patch.xml>

use std::env;
use std::io;

use xml_patch::{parse_file, XmlMerge, XmlPrinter};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    if args.len() != 3 {
        eprintln!("Usage: {} <baseline.xml> <patch.xml>", args[0]);
        std::process::exit(1);
    }

    let baseline_file = &args[1];
    let patch_file = &args[2];

    eprintln!("Parsing baseline: {}", baseline_file);
    let baseline = parse_file(baseline_file)?;

    eprintln!("Parsing patch: {}", patch_file);
    let patch = parse_file(patch_file)?;

    eprintln!("Applying patch...");
    let mut merger = XmlMerge::new();
    let errors = merger.merge(&baseline, &patch)?;

    let mut printer = XmlPrinter::new(io::stdout());
    printer.print(&baseline)?;

    if errors > 0 {
        eprintln!("Merge complete with {} errors.", errors);
    } else {
        eprintln!("Merge complete.");
    }
    Ok(())
}
