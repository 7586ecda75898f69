//! Per-entry summaries of a dump.
//!
//! [`summarize_entry`] decides whether a dump entry is worth emitting, parses its key as a type
//! definition and parses its member types with the entry itself as the containing scope, so
//! `!N` in a field type resolves to the entry's own generic parameter.
//!
//! [`SummaryBatch`] does this for a whole dump in parallel. Unsupported names are counted and
//! dropped; malformed names are collected in a [`FailureLog`] for the final report.
//!
//! # Examples
//!
//! ```rust
//! use refdump::dump::{summary::{SummaryBatch, SummaryOptions}, Dump};
//!
//! let dump = Dump::from_str(r#"{
//!     "app.Inventory`1[[T, application, Version=0.0.0.0, Culture=neutral, PublicKeyToken=null]]": {
//!         "address": "0x10",
//!         "parent": "System.Object",
//!         "is_generic_type": true,
//!         "is_generic_type_definition": true,
//!         "fields": { "_Items": { "type": "!0[]", "id": 0 } }
//!     }
//! }"#)?;
//!
//! let batch = SummaryBatch::build(&dump, &SummaryOptions::csharp());
//! let inventory = &batch.summaries[0];
//! assert_eq!(inventory.name.to_string(), "app.Inventory<T>");
//! assert_eq!(inventory.fields[0].member.display, "T[]");
//! assert!(batch.failures.is_empty());
//! # Ok::<(), refdump::Error>(())
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashSet;
use rayon::prelude::*;

use crate::{
    dump::{Dump, DumpFilter, TypeEntry},
    typename::{
        display_fallback, parse_definition_name, parse_type_name, render, NameTable, ShortNames,
        TypeName,
    },
    ParseOutcome, Result,
};

/// A member type string together with its parsed form and display text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberType {
    /// The type string as it appears in the dump
    pub original: Option<String>,
    /// The parsed type, `None` if the string could not be parsed
    pub parsed: Option<TypeName>,
    /// Fully-qualified display text, or the fallback text for unparsed strings
    pub display: String,
}

impl MemberType {
    /// Parse `type_string` with `containing` as the scope for `!N` references.
    pub fn resolve<T: NameTable + ?Sized>(
        type_string: Option<&str>,
        table: &T,
        containing: &TypeName,
        short_names: &ShortNames,
    ) -> MemberType {
        let parsed = type_string
            .filter(|text| !text.is_empty())
            .and_then(|text| match parse_type_name(text, table, Some(containing)) {
                Ok(parsed) => Some(parsed),
                Err(error) => {
                    log::debug!("Member type '{}' kept unparsed: {}", text, error);
                    None
                }
            });

        let display = match &parsed {
            Some(node) => render(node, true, true, short_names),
            None => display_fallback(type_string, short_names),
        };

        MemberType {
            original: type_string.map(str::to_string),
            parsed,
            display,
        }
    }
}

/// One field of a summarised type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSummary {
    /// Field name
    pub name: String,
    /// Attribute flags as reported by the dumper
    pub flags: Option<String>,
    /// The field's type
    pub member: MemberType,
}

/// A dump entry that parsed as a type definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSummary {
    /// The dump key
    pub original_name: String,
    /// The parsed key
    pub name: TypeName,
    /// Base type, if the entry has one
    pub parent: Option<MemberType>,
    /// Fields in declaration order
    pub fields: Vec<FieldSummary>,
}

fn is_compiler_generated_key(name: &str) -> bool {
    name.starts_with('<')
        || name.contains("DisplayClass")
        || name.contains("<>")
        || name.contains(".<")
        || name.contains("<!0>")
}

/// Summarise one dump entry.
///
/// Returns `Ok(None)` for entries that are skipped without parsing: compiler-generated types,
/// closed generic instantiations and types without a runtime address.
///
/// # Errors
/// Returns the parse error of the entry's key. Member types never fail the summary; they fall
/// back to [`display_fallback`] text.
pub fn summarize_entry<T: NameTable + ?Sized>(
    name: &str,
    entry: &TypeEntry,
    table: &T,
    short_names: &ShortNames,
) -> Result<Option<TypeSummary>> {
    if is_compiler_generated_key(name) || entry.is_instantiation() || !entry.has_address() {
        log::trace!("Skipping '{}'", name);
        return Ok(None);
    }

    let node = parse_definition_name(name, table)?;

    let parent = entry
        .parent
        .as_deref()
        .map(|parent| MemberType::resolve(Some(parent), table, &node, short_names));

    let fields = entry
        .sorted_fields()
        .into_iter()
        .map(|(field_name, field)| FieldSummary {
            name: field_name.to_string(),
            flags: field.flags.clone(),
            member: MemberType::resolve(field.type_name.as_deref(), table, &node, short_names),
        })
        .collect();

    Ok(Some(TypeSummary {
        original_name: name.to_string(),
        name: node,
        parent,
        fields,
    }))
}

/// Returns `true` for a lowercase `via` type that shadows an uppercase one of the same name.
///
/// `via.quaternion` and `via.Quaternion` cannot both be written to a case-insensitive file
/// system; the lowercase one is dropped.
#[must_use]
pub fn shadows_native_type<T: NameTable + ?Sized>(node: &TypeName, table: &T) -> bool {
    if node.is_nested() || node.namespace != "via" {
        return false;
    }

    let mut chars = node.name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => table.contains(&format!(
            "via.{}{}",
            first.to_ascii_uppercase(),
            chars.as_str()
        )),
        _ => false,
    }
}

/// Set of type names that failed to parse, safe to fill from many threads.
#[derive(Debug, Default)]
pub struct FailureLog {
    names: DashSet<String>,
}

impl FailureLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        FailureLog::default()
    }

    /// Record a failed name. Returns `false` if it was already recorded.
    pub fn record(&self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    /// Number of distinct failed names
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if nothing failed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns `true` if `name` was recorded.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// The failed names in lexical order.
    #[must_use]
    pub fn sorted(&self) -> Vec<String> {
        let mut names: Vec<String> = self.names.iter().map(|name| name.key().clone()).collect();
        names.sort();
        names
    }
}

/// Which entries to summarise and how to display member types.
#[derive(Debug, Clone, Default)]
pub struct SummaryOptions {
    /// Key filter applied before parsing
    pub filter: DumpFilter,
    /// Aliases used for member type display
    pub short_names: ShortNames,
    /// Drop lowercase `via` types shadowing an uppercase one
    pub skip_shadowed: bool,
}

impl SummaryOptions {
    /// Options for C# declarations.
    #[must_use]
    pub fn csharp() -> Self {
        SummaryOptions {
            filter: DumpFilter::csharp(),
            short_names: ShortNames::csharp(),
            skip_shadowed: true,
        }
    }

    /// Options for Lua annotations.
    #[must_use]
    pub fn lua() -> Self {
        SummaryOptions {
            filter: DumpFilter::lua(),
            short_names: ShortNames::new(),
            skip_shadowed: false,
        }
    }
}

/// Summaries of every eligible entry of a dump.
#[derive(Debug, Default)]
pub struct SummaryBatch {
    /// Parsed entries, ordered by original name
    pub summaries: Vec<TypeSummary>,
    /// Keys that are malformed
    pub failures: FailureLog,
    /// Keys that use unsupported constructs
    pub unsupported: usize,
    /// Entries skipped without parsing, or filtered after parsing
    pub skipped: usize,
}

impl SummaryBatch {
    /// Summarise `dump` against its own name table.
    #[must_use]
    pub fn build(dump: &Dump, options: &SummaryOptions) -> SummaryBatch {
        let table = dump.name_table();
        SummaryBatch::build_with(dump, &table, options)
    }

    /// Summarise `dump` against an externally built name table.
    ///
    /// The table must already contain every name; it is only read.
    #[must_use]
    pub fn build_with<T: NameTable + Sync + ?Sized>(
        dump: &Dump,
        table: &T,
        options: &SummaryOptions,
    ) -> SummaryBatch {
        let failures = FailureLog::new();
        let unsupported = AtomicUsize::new(0);
        let skipped = AtomicUsize::new(0);

        let entries: Vec<(&str, &TypeEntry)> = dump.eligible(&options.filter).collect();
        let mut summaries: Vec<TypeSummary> = entries
            .par_iter()
            .filter_map(|(name, entry)| {
                match summarize_entry(name, entry, table, &options.short_names) {
                    Ok(Some(summary))
                        if options.skip_shadowed && shadows_native_type(&summary.name, table) =>
                    {
                        log::debug!("Skipping '{}', it shadows a native type", name);
                        skipped.fetch_add(1, Ordering::Relaxed);
                        None
                    }
                    Ok(Some(summary)) => Some(summary),
                    Ok(None) => {
                        skipped.fetch_add(1, Ordering::Relaxed);
                        None
                    }
                    Err(error) => {
                        match error.outcome() {
                            ParseOutcome::Unsupported => {
                                log::debug!("Skipping '{}': {}", name, error);
                                unsupported.fetch_add(1, Ordering::Relaxed);
                            }
                            ParseOutcome::Malformed => {
                                log::warn!("Failed to parse type name '{}': {}", name, error);
                                failures.record(*name);
                            }
                        }
                        None
                    }
                }
            })
            .collect();

        summaries.sort_by(|a, b| a.original_name.cmp(&b.original_name));

        SummaryBatch {
            summaries,
            failures,
            unsupported: unsupported.into_inner(),
            skipped: skipped.into_inner(),
        }
    }

    /// Look up the summary of a dump key.
    #[must_use]
    pub fn get(&self, original_name: &str) -> Option<&TypeSummary> {
        self.summaries
            .binary_search_by(|summary| summary.original_name.as_str().cmp(original_name))
            .ok()
            .map(|index| &self.summaries[index])
    }
}
