// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
//#![deny(unsafe_code)]
// - 'dump/mod.rs' uses mmap to map the dump file into memory

//! # refdump
//!
//! Parsing and rendering of the mangled CLR type names found in runtime reflection dumps.
//!
//! Game-engine reflection dumps describe every type by a single string such as
//! `System.Collections.Generic.Dictionary`2[[System.Int32, System, ...],[app.Foo, ...]]` or
//! `app.Outer`1.Nested<app.Arg>`. `refdump` turns these strings into a structured
//! [`TypeName`] tree (namespace, enclosing types, generic arguments, array flag) and renders the
//! tree back into readable declarations.
//!
//! ## Features
//!
//! - **Both generic syntaxes** - assembly-qualified `[[...]]` and plain `<...>` argument lists,
//!   arbitrarily nested
//! - **Namespace disambiguation** - `a.b.c` is split into namespace and enclosing types using a
//!   table of known type names
//! - **Back-reference resolution** - `!0` in a member type resolves against the declaring type
//! - **Recoverable failures** - [`ParseOutcome::Unsupported`] for unmodeled constructs,
//!   [`ParseOutcome::Malformed`] for grammar violations
//! - **Parallel batch processing** - whole dumps are summarised with `rayon`
//!
//! ## Quick Start
//!
//! ```rust
//! use refdump::prelude::*;
//!
//! let table = KnownTypes::from_iter(["app.Outer"]);
//! let nested = parse_type_name("app.Outer.Inner[]", &table, None)?;
//! assert_eq!(nested.name, "Inner");
//! assert!(nested.is_array);
//!
//! let aliases = ShortNames::csharp();
//! let list = parse_type_name("System.Collections.Generic.List`1<System.Int32>", &table, None)?;
//! assert_eq!(
//!     render(&list, false, false, &aliases),
//!     "List<int>"
//! );
//! # Ok::<(), refdump::Error>(())
//! ```
//!
//! ### Processing a Dump
//!
//! ```rust,no_run
//! use refdump::dump::{summary::{SummaryBatch, SummaryOptions}, Dump};
//!
//! let dump = Dump::from_file("il2cpp_dump.json")?;
//! let batch = SummaryBatch::build(&dump, &SummaryOptions::csharp());
//!
//! for summary in &batch.summaries {
//!     println!("{} : {:?}", summary.name, summary.parent.as_ref().map(|p| &p.display));
//! }
//! for failed in batch.failures.sorted() {
//!     eprintln!("failed: {failed}");
//! }
//! # Ok::<(), refdump::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`](Result):
//!
//! ```rust
//! use refdump::{parse_type_name, Error, KnownTypes};
//!
//! match parse_type_name("app.Foo`1[[app.Bar", &KnownTypes::new(), None) {
//!     Ok(name) => println!("parsed {name}"),
//!     Err(Error::Unsupported(reason)) => println!("skipped: {reason}"),
//!     Err(Error::Malformed { message, .. }) => println!("malformed: {message}"),
//!     Err(e) => println!("other error: {e}"),
//! }
//! ```
//!
//! ## Development and Testing
//!
//! ```bash
//! cargo test
//! cargo bench --bench typename
//! cargo +nightly fuzz run typename --release
//! ```
#[macro_use]
pub(crate) mod error;

/// Convenient re-exports of the most commonly used types and functions.
///
/// # Example
///
/// ```rust
/// use refdump::prelude::*;
///
/// let table = KnownTypes::new();
/// let name = parse_type_name("app.Item[]", &table, None)?;
/// assert_eq!(name.to_string(), "app.Item[]");
/// # Ok::<(), refdump::Error>(())
/// ```
pub mod prelude;

/// Type-name model, grammar parser and renderer
///
/// # Key Types
///
/// - [`typename::TypeName`] - A parsed type reference
/// - [`typename::TypeNameParser`] - Configurable parser entry point
/// - [`typename::NameTable`] - Known-type lookup used for namespace disambiguation
/// - [`typename::Renderer`] - Display string generation
///
/// # Examples
///
/// ```rust
/// use refdump::typename::{KnownTypes, TypeNameParser};
///
/// let table = KnownTypes::new();
/// let pair = TypeNameParser::new(&table)
///     .parse("System.Collections.Generic.KeyValuePair`2<System.String,app.Item>")?;
/// assert_eq!(pair.generic_args.len(), 2);
/// # Ok::<(), refdump::Error>(())
/// ```
pub mod typename;

/// Reflection dump model, filtering and batch summaries
pub mod dump;

/// `refdump` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `refdump` Error type
///
/// [`Error::outcome`] classifies parse failures into [`ParseOutcome`]s.
pub use error::{Error, ParseOutcome};

pub use typename::{
    parse_definition_name, parse_type_name, render, KnownTypes, NameTable, RenderFlags, Renderer,
    ShortNames, TypeName, TypeNameParser,
};

pub use dump::Dump;
