use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// refdump - parse and render the mangled CLR type names of reflection dumps
#[derive(Debug, Parser)]
#[command(name = "refdump", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared across all subcommands.
#[derive(Debug, Parser)]
pub struct GlobalOptions {
    /// Emit output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose (debug-level) logging output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse every eligible type of a dump and list its rendered name and base type.
    Types {
        /// Path to the JSON reflection dump.
        #[arg(value_name = "DUMP")]
        path: PathBuf,

        /// Show only types in this namespace.
        #[arg(short, long)]
        namespace: Option<String>,

        /// Include System.* types.
        #[arg(long)]
        include_system: bool,

        /// Include array types.
        #[arg(long)]
        include_arrays: bool,

        /// Rendering style: csharp or plain.
        #[arg(short, long, default_value = "csharp")]
        style: String,
    },

    /// Parse a single type name and print its structure.
    Parse {
        /// The mangled type name, e.g. 'System.Collections.Generic.List`1<app.Item>'.
        #[arg(value_name = "NAME")]
        name: String,

        /// Dump whose type names are used to tell namespaces from enclosing types.
        #[arg(short, long, value_name = "DUMP")]
        dump: Option<PathBuf>,

        /// Declaring type that `!N` references resolve against.
        #[arg(short, long, value_name = "TYPE")]
        scope: Option<String>,

        /// Parse as a type definition key (plain `<...>` instantiations are rejected).
        #[arg(long)]
        definition: bool,
    },

    /// List the type names of a dump that fail to parse. Exits non-zero if there are any.
    Failures {
        /// Path to the JSON reflection dump.
        #[arg(value_name = "DUMP")]
        path: PathBuf,

        /// Include System.* types.
        #[arg(long)]
        include_system: bool,
    },
}
