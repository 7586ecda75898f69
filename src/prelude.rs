//! # refdump Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and functions
//! from the refdump library.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all refdump operations
pub use crate::Error;

/// Classification of parse failures
pub use crate::ParseOutcome;

/// The result type used throughout refdump
pub use crate::Result;

// ================================================================================================
// Type Names
// ================================================================================================

/// Parsed type names and back-reference markers
pub use crate::typename::{GenericParam, GenericParamKind, TypeName};

/// Known-type tables
pub use crate::typename::{KnownTypes, NameTable};

/// Parser entry points
pub use crate::typename::{parse_definition_name, parse_type_name, TypeNameParser};

/// Rendering
pub use crate::typename::{
    display_fallback, filename_stem, render, GlobalPrefix, RenderFlags, Renderer, ShortNames,
};

// ================================================================================================
// Dumps
// ================================================================================================

/// Dump model and filtering
pub use crate::dump::{Dump, DumpFilter, FieldEntry, TypeEntry};

/// Batch summaries
pub use crate::dump::summary::{
    summarize_entry, FailureLog, MemberType, SummaryBatch, SummaryOptions, TypeSummary,
};
