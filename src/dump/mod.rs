//! Reflection dump ingestion.
//!
//! A dump is a JSON object keyed by mangled type name. Each value describes one runtime type:
//!
//! ```json
//! {
//!   "app.Outer`1[[T, application, Version=0.0.0.0, Culture=neutral, PublicKeyToken=null]]": {
//!     "address": "0x14a2b3c40",
//!     "parent": "System.Object",
//!     "is_generic_type": true,
//!     "is_generic_type_definition": true,
//!     "fields": {
//!       "_Items": { "type": "!0[]", "flags": "Private", "id": 0 }
//!     }
//!   }
//! }
//! ```
//!
//! Keys not described here are ignored. [`Dump::name_table`] turns the key set into the
//! [`KnownTypes`] table the parser needs, and [`summary`] turns entries into parsed summaries.
//!
//! # Examples
//!
//! ```rust
//! use refdump::dump::{Dump, DumpFilter};
//!
//! let dump = Dump::from_str(r#"{
//!     "app.Outer": { "address": "0x10", "parent": "System.Object" },
//!     "app.Outer.Inner": { "address": "0x20", "parent": "System.ValueType" },
//!     "System.Int32": { "address": "0x30", "parent": "System.ValueType" }
//! }"#)?;
//!
//! let table = dump.name_table();
//! assert!(table.len() >= 3);
//!
//! let filter = DumpFilter::csharp();
//! let app_only: Vec<&str> = dump
//!     .eligible(&filter)
//!     .map(|(name, _)| name)
//!     .collect();
//! assert_eq!(app_only, ["app.Outer", "app.Outer.Inner"]);
//! # Ok::<(), refdump::Error>(())
//! ```

pub mod summary;

use std::{collections::BTreeMap, fs, path::Path};

use memmap2::Mmap;
use serde::{Deserialize, Serialize};

use crate::{typename::KnownTypes, Error::Error, Result};

/// Names the runtime reports without a dump entry of their own.
const IMPLICIT_TYPES: [&str; 2] = ["System.Object", "System.ValueType"];

/// One field of a dumped type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldEntry {
    /// Mangled field type, may contain `!N` back-references
    #[serde(rename = "type", default)]
    pub type_name: Option<String>,
    /// Attribute flags as reported by the dumper, e.g. `Private | Static`
    #[serde(default)]
    pub flags: Option<String>,
    /// Declaration order
    #[serde(default)]
    pub id: Option<u32>,
}

/// One dumped type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeEntry {
    /// Runtime address of the type, missing for types that were never loaded
    #[serde(default)]
    pub address: Option<String>,
    /// Mangled name of the base type
    #[serde(default)]
    pub parent: Option<String>,
    /// The type is generic (definition or instantiation)
    #[serde(default)]
    pub is_generic_type: bool,
    /// The type is an open generic definition
    #[serde(default)]
    pub is_generic_type_definition: bool,
    /// Fields by name
    #[serde(default)]
    pub fields: Option<BTreeMap<String, FieldEntry>>,
}

impl TypeEntry {
    /// Returns `true` if the entry has a non-empty runtime address.
    #[must_use]
    pub fn has_address(&self) -> bool {
        self.address.as_deref().is_some_and(|address| !address.is_empty())
    }

    /// Returns `true` for closed instantiations of a generic type.
    #[must_use]
    pub fn is_instantiation(&self) -> bool {
        self.is_generic_type && !self.is_generic_type_definition
    }

    /// Fields ordered by declaration id, then name.
    #[must_use]
    pub fn sorted_fields(&self) -> Vec<(&str, &FieldEntry)> {
        let mut fields: Vec<(&str, &FieldEntry)> = self
            .fields
            .iter()
            .flatten()
            .map(|(name, field)| (name.as_str(), field))
            .collect();
        fields.sort_by_key(|(name, field)| (field.id.unwrap_or(u32::MAX), *name));
        fields
    }
}

/// Which dump keys are worth parsing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DumpFilter {
    /// Skip `System.*` and `Internal.Runtime.CompilerServices.Unsafe`
    pub skip_system_types: bool,
    /// Skip array types (`[]` suffix)
    pub skip_arrays: bool,
}

impl DumpFilter {
    /// Filter used for C# declarations: system types and arrays are skipped.
    #[must_use]
    pub fn csharp() -> Self {
        DumpFilter {
            skip_system_types: true,
            skip_arrays: true,
        }
    }

    /// Filter used for Lua annotations: everything but arrays is kept.
    #[must_use]
    pub fn lua() -> Self {
        DumpFilter {
            skip_system_types: false,
            skip_arrays: true,
        }
    }

    /// Returns `true` if `name` passes the filter.
    ///
    /// Empty keys and keys that are bare generic parameters (`!0`) never pass.
    #[must_use]
    pub fn accepts(&self, name: &str) -> bool {
        if name.is_empty() || name.starts_with('!') {
            return false;
        }

        if self.skip_system_types
            && (name.starts_with("System.") || name == "Internal.Runtime.CompilerServices.Unsafe")
        {
            return false;
        }

        !(self.skip_arrays && name.ends_with("[]"))
    }
}

/// A parsed reflection dump.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dump {
    entries: BTreeMap<String, TypeEntry>,
}

impl Dump {
    /// Load a dump from disk.
    ///
    /// # Arguments
    /// * `path` - Path of the JSON dump
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened, [`crate::Error::Error`] if
    /// it cannot be mapped, and [`crate::Error::Json`] if the content is not a dump.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Dump> {
        let path = path.as_ref();
        let file = fs::File::open(path)?;

        let mmap = unsafe { Mmap::map(&file) }.map_err(|error| Error(error.to_string()))?;
        let dump = Dump::from_slice(&mmap)?;

        log::debug!("Loaded {} types from {}", dump.len(), path.display());
        Ok(dump)
    }

    /// Parse a dump from raw JSON bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::Json`] if the content is not a dump.
    pub fn from_slice(data: &[u8]) -> Result<Dump> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Parse a dump from a JSON string.
    ///
    /// # Errors
    /// Returns [`crate::Error::Json`] if the content is not a dump.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(data: &str) -> Result<Dump> {
        Ok(serde_json::from_str(data)?)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the dump has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by its mangled name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TypeEntry> {
        self.entries.get(name)
    }

    /// All entries, ordered by name
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypeEntry)> {
        self.entries
            .iter()
            .map(|(name, entry)| (name.as_str(), entry))
    }

    /// Entries whose names pass `filter`, ordered by name.
    pub fn eligible<'a>(
        &'a self,
        filter: &'a DumpFilter,
    ) -> impl Iterator<Item = (&'a str, &'a TypeEntry)> + 'a {
        self.iter().filter(|(name, _)| filter.accepts(name))
    }

    /// Every dumped name plus the implicit base types, for namespace disambiguation.
    #[must_use]
    pub fn name_table(&self) -> KnownTypes {
        let mut table: KnownTypes = self.entries.keys().cloned().collect();
        table.extend(IMPLICIT_TYPES);
        table
    }
}

impl FromIterator<(String, TypeEntry)> for Dump {
    fn from_iter<I: IntoIterator<Item = (String, TypeEntry)>>(iter: I) -> Self {
        Dump {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typename::NameTable;

    const DUMP: &str = r#"{
        "app.Player": {
            "address": "0x1000",
            "parent": "System.Object",
            "is_generic_type": false,
            "is_generic_type_definition": false,
            "fields": {
                "_Health": { "type": "System.Single", "flags": "Private", "id": 1 },
                "_Name": { "type": "System.String", "flags": "Private", "id": 0 }
            },
            "methods": {}
        },
        "app.Player[]": { "address": "0x1010", "parent": "System.Array" },
        "System.Int32": { "address": "0x2000", "parent": "System.ValueType" },
        "Internal.Runtime.CompilerServices.Unsafe": { "address": "0x3000" },
        "!0": {},
        "": {}
    }"#;

    #[test]
    fn test_from_str_ignores_unknown_keys() {
        let dump = Dump::from_str(DUMP).unwrap();
        assert_eq!(dump.len(), 6);

        let player = dump.get("app.Player").unwrap();
        assert!(player.has_address());
        assert!(!player.is_instantiation());
        assert_eq!(player.parent.as_deref(), Some("System.Object"));

        let fields: Vec<&str> = player.sorted_fields().iter().map(|(name, _)| *name).collect();
        assert_eq!(fields, ["_Name", "_Health"]);

        let generic_param = dump.get("!0").unwrap();
        assert!(!generic_param.has_address());
        assert!(generic_param.sorted_fields().is_empty());
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(Dump::from_str("[1, 2]"), Err(crate::Error::Json(_))));
        assert!(matches!(
            Dump::from_slice(b"{\"app.X\": {\"is_generic_type\": 3}}"),
            Err(crate::Error::Json(_))
        ));
    }

    #[test]
    fn test_from_file_missing() {
        let result = Dump::from_file("this/path/does/not/exist.json");
        assert!(matches!(result, Err(crate::Error::FileError(_))));
    }

    #[test]
    fn test_filters() {
        let dump = Dump::from_str(DUMP).unwrap();

        let everything = DumpFilter::default();
        let names: Vec<&str> = dump.eligible(&everything).map(|(name, _)| name).collect();
        assert_eq!(
            names,
            [
                "Internal.Runtime.CompilerServices.Unsafe",
                "System.Int32",
                "app.Player",
                "app.Player[]"
            ]
        );

        let csharp = DumpFilter::csharp();
        let names: Vec<&str> = dump.eligible(&csharp).map(|(name, _)| name).collect();
        assert_eq!(names, ["app.Player"]);

        let lua = DumpFilter::lua();
        assert!(lua.accepts("System.Int32"));
        assert!(!lua.accepts("app.Player[]"));
        assert!(!lua.accepts("!!1"));
    }

    #[test]
    fn test_name_table_includes_implicit_types() {
        let dump = Dump::from_str(DUMP).unwrap();
        let table = dump.name_table();
        assert!(table.contains("app.Player"));
        assert!(table.contains("System.Object"));
        assert!(table.contains("System.ValueType"));
        assert!(!table.contains("app"));
    }
}
