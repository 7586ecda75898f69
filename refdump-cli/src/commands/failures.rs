use std::path::Path;

use anyhow::bail;
use serde::Serialize;

use refdump::dump::summary::{SummaryBatch, SummaryOptions};

use crate::{app::GlobalOptions, commands::common::load_dump, output::print_output};

#[derive(Debug, Serialize)]
struct FailuresOutput {
    failures: Vec<String>,
    count: usize,
    parsed: usize,
    unsupported: usize,
}

pub fn run(path: &Path, include_system: bool, opts: &GlobalOptions) -> anyhow::Result<()> {
    let dump = load_dump(path)?;

    let mut options = SummaryOptions::csharp();
    options.filter.skip_system_types = !include_system;
    let batch = SummaryBatch::build(&dump, &options);

    let failures = batch.failures.sorted();
    let output = FailuresOutput {
        count: failures.len(),
        failures,
        parsed: batch.summaries.len(),
        unsupported: batch.unsupported,
    };

    print_output(&output, opts, |out| {
        for name in &out.failures {
            println!("{name}");
        }
        if out.count > 0 {
            println!();
        }
        println!(
            "{} parsed, {} unsupported, {} failed.",
            out.parsed, out.unsupported, out.count
        );
    })?;

    if output.count > 0 {
        bail!("{} type name(s) failed to parse", output.count);
    }
    Ok(())
}
