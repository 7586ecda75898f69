//! Known-type side table consulted while splitting dotted names.
//!
//! A dotted prefix such as `app.Outer` is ambiguous: it may be a namespace, or a type that
//! `app.Outer.Inner` is nested in. The parser asks a [`NameTable`] which it is. The table must be
//! complete before parsing starts and is never mutated by the parser.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Exact-match lookup of fully-qualified dotted type names.
pub trait NameTable {
    /// Returns `true` if `fullname` is a registered type.
    fn contains(&self, fullname: &str) -> bool;
}

impl<T: NameTable + ?Sized> NameTable for &T {
    fn contains(&self, fullname: &str) -> bool {
        (**self).contains(fullname)
    }
}

impl NameTable for HashSet<String> {
    fn contains(&self, fullname: &str) -> bool {
        HashSet::contains(self, fullname)
    }
}

impl NameTable for BTreeSet<String> {
    fn contains(&self, fullname: &str) -> bool {
        BTreeSet::contains(self, fullname)
    }
}

impl<V> NameTable for HashMap<String, V> {
    fn contains(&self, fullname: &str) -> bool {
        self.contains_key(fullname)
    }
}

impl<V> NameTable for BTreeMap<String, V> {
    fn contains(&self, fullname: &str) -> bool {
        self.contains_key(fullname)
    }
}

/// Owned set of known type names.
#[derive(Debug, Clone, Default)]
pub struct KnownTypes {
    names: HashSet<String>,
}

impl KnownTypes {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        KnownTypes::default()
    }

    /// Register a type name. Returns `false` if it was already present.
    pub fn insert(&mut self, fullname: impl Into<String>) -> bool {
        self.names.insert(fullname.into())
    }

    /// Number of registered names
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if no names are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate over the registered names in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl NameTable for KnownTypes {
    fn contains(&self, fullname: &str) -> bool {
        self.names.contains(fullname)
    }
}

impl<S: Into<String>> FromIterator<S> for KnownTypes {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        KnownTypes {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<S: Into<String>> Extend<S> for KnownTypes {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.names.extend(iter.into_iter().map(Into::into));
    }
}
