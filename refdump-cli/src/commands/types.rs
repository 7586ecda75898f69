use std::path::Path;

use serde::Serialize;

use refdump::dump::summary::SummaryBatch;

use crate::{
    app::GlobalOptions,
    commands::common::{load_dump, Style},
    output::{print_output, Align, TabWriter},
};

pub struct TypesOptions<'a> {
    pub namespace: Option<&'a str>,
    pub include_system: bool,
    pub include_arrays: bool,
    pub style: &'a str,
}

#[derive(Debug, Serialize)]
struct TypeRow {
    original: String,
    name: String,
    parent: Option<String>,
    fields: usize,
}

#[derive(Debug, Serialize)]
struct TypesOutput {
    types: Vec<TypeRow>,
    count: usize,
    unsupported: usize,
    failed: usize,
}

pub fn run(path: &Path, options: &TypesOptions, opts: &GlobalOptions) -> anyhow::Result<()> {
    let mut style = Style::parse(options.style)?;
    style.options.filter.skip_system_types = !options.include_system;
    style.options.filter.skip_arrays = !options.include_arrays;

    let dump = load_dump(path)?;
    let batch = SummaryBatch::build(&dump, &style.options);
    let renderer = style.renderer();

    let types: Vec<TypeRow> = batch
        .summaries
        .iter()
        .filter(|summary| {
            options
                .namespace
                .map_or(true, |ns| summary.name.root_namespace() == ns)
        })
        .map(|summary| TypeRow {
            original: summary.original_name.clone(),
            name: renderer.render(&summary.name),
            parent: summary.parent.as_ref().map(|parent| parent.display.clone()),
            fields: summary.fields.len(),
        })
        .collect();

    let output = TypesOutput {
        count: types.len(),
        types,
        unsupported: batch.unsupported,
        failed: batch.failures.len(),
    };

    print_output(&output, opts, |out| {
        let mut tw = TabWriter::new(&[
            ("Name", Align::Left),
            ("Base", Align::Left),
            ("Fields", Align::Right),
        ]);
        for row in &out.types {
            tw.row(vec![
                row.name.clone(),
                row.parent.clone().unwrap_or_else(|| "-".to_string()),
                row.fields.to_string(),
            ]);
        }
        if !tw.is_empty() {
            tw.print();
            println!();
        }
        println!(
            "{} type(s) listed, {} unsupported.",
            out.count, out.unsupported
        );
        if out.failed > 0 {
            println!(
                "{} type name(s) failed to parse, see `refdump failures`.",
                out.failed
            );
        }
    })
}
