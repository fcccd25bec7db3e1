//! Example: Generate a patch document between two XML files
//!
//! Usage: cargo run --example diff <baseline.xml> <modified.xml>

use std::env;
use std::io;

use xml_patch::{parse_file, PatchOpsWriter, XmlDiff};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    if args.len() != 3 {
        eprintln!("Usage: {} <baseline.xml> <modified.xml>", args[0]);
        std::process::exit(1);
    }

    let baseline_file = &args[1];
    let modified_file = &args[2];

    eprintln!("Parsing baseline: {}", baseline_file);
    let baseline = parse_file(baseline_file)?;

    eprintln!("Parsing modified: {}", modified_file);
    let modified = parse_file(modified_file)?;

    eprintln!("Generating patch...");
    let mut sink = PatchOpsWriter::new(io::stdout());
    XmlDiff::new().diff(&baseline, &modified, &mut sink)?;

    eprintln!("Diff complete.");
    Ok(())
}
