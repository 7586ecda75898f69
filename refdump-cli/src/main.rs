mod app;
mod commands;
mod output;

use clap::Parser;

use crate::app::{Cli, Command};

fn main() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        eprintln!("\nCancelled.");
        std::process::exit(130);
    })
    .expect("failed to set Ctrl+C handler");

    let cli = Cli::parse();

    // Show refdump info+ on stderr unless --json; --verbose enables debug; RUST_LOG overrides
    if !cli.global.json {
        let level = if cli.global.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        };
        env_logger::Builder::new()
            .filter_module("refdump", level)
            .parse_default_env()
            .target(env_logger::Target::Stderr)
            .format_timestamp(None)
            .format_module_path(false)
            .format_target(false)
            .init();
    }

    match &cli.command {
        Command::Types {
            path,
            namespace,
            include_system,
            include_arrays,
            style,
        } => commands::types::run(
            path,
            &commands::types::TypesOptions {
                namespace: namespace.as_deref(),
                include_system: *include_system,
                include_arrays: *include_arrays,
                style,
            },
            &cli.global,
        ),
        Command::Parse {
            name,
            dump,
            scope,
            definition,
        } => commands::parse::run(
            name,
            dump.as_deref(),
            scope.as_deref(),
            *definition,
            &cli.global,
        ),
        Command::Failures {
            path,
            include_system,
        } => commands::failures::run(path, *include_system, &cli.global),
    }
}
