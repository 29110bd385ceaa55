#![forbid(unsafe_code)]

use anyhow::{Context, Result, bail};
use std::env;
use std::path::Path;
use vsfs_block::FileByteDevice;
use vsfs_check::{CheckCategory, CheckReport, FsckOutcome};

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        print_usage();
        bail!("missing <image-path> argument");
    };
    if path == "--help" || path == "-h" {
        print_usage();
        return Ok(());
    }
    let remaining: Vec<String> = args.collect();
    let json = remaining.iter().any(|arg| arg == "--json");
    if remaining.iter().any(|arg| arg != "--json") {
        print_usage();
        bail!("unexpected extra arguments");
    }

    let device = FileByteDevice::open_rw(Path::new(&path))
        .with_context(|| format!("failed to open file system image {path}"))?;
    let outcome = vsfs_check::run(&device)
        .with_context(|| format!("check/repair cycle failed on {path}"))?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&outcome).context("serialize outcome")?
        );
    } else {
        print_report(&outcome);
    }

    // Exit 0 on a completed cycle, whether or not errors remain.
    Ok(())
}

fn print_usage() {
    println!("vsfsck — VSFS file system consistency checker\n");
    println!("USAGE:");
    println!("  vsfsck <image-path> [--json]");
}

fn print_pass(report: &CheckReport, error_word: &str) {
    for finding in &report.findings {
        println!("Error: {finding}");
    }
    println!();
    for category in CheckCategory::ALL {
        let status = if report.passed(category) {
            "OK"
        } else {
            error_word
        };
        println!("{}: {status}", category.label());
    }
}

fn print_report(outcome: &FsckOutcome) {
    println!("Checking VSFS file system consistency...");
    print_pass(&outcome.initial, "ERRORS FOUND");
    println!("\nTotal errors found: {}", outcome.original_errors());

    let Some(repair) = &outcome.repair else {
        println!("\nNo errors found. File system is consistent.");
        return;
    };

    println!("\nAttempting to fix errors...");
    println!("Errors fixed: {}", repair.fixes);

    println!("\nRe-checking file system for remaining errors...");
    print_pass(&repair.recheck, "ERRORS REMAIN");
    println!("\nOriginal errors: {}", outcome.original_errors());
    println!("Remaining errors: {}", outcome.remaining_errors());

    if outcome.is_consistent() {
        println!("\nAll errors successfully fixed. File system is now consistent.");
    } else {
        println!("\nSome errors could not be fixed automatically. Manual intervention may be required.");
    }
}
