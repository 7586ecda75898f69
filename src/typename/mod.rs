//! Mangled CLR type-name parsing and rendering.
//!
//! Reflection dumps describe every type by a single string in the CLR naming grammar, for example
//! `System.Collections.Generic.Dictionary`2[[System.Int32, System, Version=1.0.0.0, ...],[...]]`.
//! This module turns such strings into a [`TypeName`] tree and renders that tree back into
//! readable, optionally shortened, declarations.
//!
//! # Key Components
//!
//! - [`TypeName`] - The parsed node: namespace, simple name, enclosing type, generic arguments
//! - [`NameTable`] / [`KnownTypes`] - Side table of known types, used to tell namespaces from
//!   enclosing types
//! - [`TypeNameParser`] / [`parse_type_name`] - The recursive-descent parser
//! - [`Renderer`] - Turns a [`TypeName`] back into a string under [`RenderFlags`]
//!
//! # Grammar Overview
//!
//! | Form                                   | Example                                        |
//! |----------------------------------------|------------------------------------------------|
//! | Dotted name                            | `app.Outer.Inner`                              |
//! | Bracketed (assembly qualified) generic | `List`1[[System.String, mscorlib]]`            |
//! | Plain generic                          | `List`1<System.String>`                        |
//! | Nested type of a generic               | `List`1.Enumerator<app.Item>`                  |
//! | Array suffix                           | `app.Item[]`                                   |
//! | Generic parameter back-reference       | `!0`, `!!1`, `!2[]`                            |
//!
//! # Examples
//!
//! ```rust
//! use refdump::typename::{parse_type_name, KnownTypes};
//!
//! let table = KnownTypes::from_iter(["app.Outer"]);
//! let inner = parse_type_name("app.Outer.Inner", &table, None)?;
//!
//! assert_eq!(inner.name, "Inner");
//! assert_eq!(inner.namespace, "");
//! assert_eq!(inner.enclosing.as_ref().unwrap().namespace, "app");
//! assert_eq!(inner.to_string(), "app.Outer.Inner");
//! # Ok::<(), refdump::Error>(())
//! ```
//!
//! # Thread Safety
//!
//! Parsing only reads the [`NameTable`]; a single table can be shared by any number of threads
//! parsing independent names. [`TypeName`] values are plain owned data.

mod cursor;
mod parser;
mod render;
mod table;

use std::fmt;

use strum::Display;

pub use cursor::Cursor;
pub use parser::{
    parse_definition_name, parse_type_name, TypeNameParser, MAX_NESTING_DEPTH,
    MAX_RECURSION_DEPTH, TRUNCATED_NAME_LENGTH,
};
pub use render::{
    display_fallback, filename_stem, render, GlobalPrefix, RenderFlags, Renderer, ShortNames,
};
pub use table::{KnownTypes, NameTable};

/// Which declaration a generic parameter back-reference points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum GenericParamKind {
    /// `!N` - a parameter of the declaring type
    #[strum(serialize = "!")]
    Type,
    /// `!!N` - a parameter of the declaring method
    #[strum(serialize = "!!")]
    Method,
}

/// A generic parameter back-reference that could not be substituted.
///
/// Nodes carrying this marker are placeholders named `T` + index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GenericParam {
    /// Position of the parameter in the owning declaration
    pub index: u32,
    /// Whether the parameter belongs to a type or a method
    pub kind: GenericParamKind,
}

impl fmt::Display for GenericParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind, self.index)
    }
}

/// A parsed, fully-qualified type reference.
///
/// The namespace is hoisted to the outermost node of an enclosing chain: for `app.Outer.Inner`
/// (with `app.Outer` known) the returned node is `Inner` with an empty namespace, and its
/// `enclosing` node is `Outer` in namespace `app`.
///
/// Generic arguments are stored on the declaration that owns them. For
/// `List`1.Enumerator<app.Item>` the argument sits on `List`, and `Enumerator` sees it through
/// [`TypeName::effective_generic_args`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TypeName {
    /// Namespace, empty for nested types
    pub namespace: String,
    /// Simple name, without arity or array markers
    pub name: String,
    /// The type this one is nested in
    pub enclosing: Option<Box<TypeName>>,
    /// Generic arguments declared on this node
    pub generic_args: Vec<TypeName>,
    /// `T[]`; deeper ranks collapse into this flag
    pub is_array: bool,
    /// Set when this node stands in for an unresolved `!N` / `!!N`
    pub generic_param: Option<GenericParam>,
}

impl TypeName {
    /// Create a plain, non-generic, top-level type name.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        TypeName {
            namespace: namespace.into(),
            name: name.into(),
            ..TypeName::default()
        }
    }

    /// Create the `T<index>` placeholder for a back-reference that has nothing to resolve to.
    #[must_use]
    pub fn placeholder(param: GenericParam) -> Self {
        TypeName {
            name: format!("T{}", param.index),
            generic_param: Some(param),
            ..TypeName::default()
        }
    }

    /// Create a type nested inside `enclosing`.
    pub fn nested(enclosing: TypeName, name: impl Into<String>) -> Self {
        TypeName {
            name: name.into(),
            enclosing: Some(Box::new(enclosing)),
            ..TypeName::default()
        }
    }

    /// Returns this node with the array flag added on top of any flag it already carries.
    #[must_use]
    pub fn with_array(mut self, is_array: bool) -> Self {
        self.is_array |= is_array;
        self
    }

    /// The generic arguments visible to this node: its own, or the closest enclosing type's.
    #[must_use]
    pub fn effective_generic_args(&self) -> &[TypeName] {
        if !self.generic_args.is_empty() {
            return &self.generic_args;
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.effective_generic_args(),
            None => &[],
        }
    }

    /// Enclosing types, outermost first.
    #[must_use]
    pub fn enclosing_chain(&self) -> Vec<&TypeName> {
        let mut chain = Vec::new();
        let mut current = self.enclosing.as_deref();
        while let Some(enclosing) = current {
            chain.push(enclosing);
            current = enclosing.enclosing.as_deref();
        }
        chain.reverse();
        chain
    }

    /// The namespace of the outermost enclosing type (or of this node, if it is top-level).
    #[must_use]
    pub fn root_namespace(&self) -> &str {
        match &self.enclosing {
            Some(enclosing) => enclosing.root_namespace(),
            None => &self.namespace,
        }
    }

    /// Returns `true` if this node is a `T<index>` placeholder.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.generic_param.is_some()
    }

    /// Returns `true` if this node is nested in another type.
    #[must_use]
    pub fn is_nested(&self) -> bool {
        self.enclosing.is_some()
    }

    /// Returns the full name (Namespace.Enclosing.Name), without generic arguments.
    #[must_use]
    pub fn fullname(&self) -> String {
        let mut fullname = String::new();
        let namespace = self.root_namespace();
        if !namespace.is_empty() {
            fullname.push_str(namespace);
            fullname.push('.');
        }
        for enclosing in self.enclosing_chain() {
            fullname.push_str(&enclosing.name);
            fullname.push('.');
        }
        fullname.push_str(&self.name);
        fullname
    }

    /// Render this node, see [`render`].
    #[must_use]
    pub fn render(
        &self,
        include_namespace: bool,
        include_enclosing: bool,
        short_names: &ShortNames,
    ) -> String {
        render(self, include_namespace, include_enclosing, short_names)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Renderer::new(RenderFlags::QUALIFIED).render(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generic(namespace: &str, name: &str, args: Vec<TypeName>) -> TypeName {
        TypeName {
            generic_args: args,
            ..TypeName::new(namespace, name)
        }
    }

    #[test]
    fn test_effective_generic_args_inherited() {
        let outer = generic(
            "System.Collections.Generic",
            "List",
            vec![TypeName::new("app", "Item")],
        );
        let enumerator = TypeName::nested(outer, "Enumerator");
        let current = TypeName::nested(enumerator, "Current");

        assert!(current.generic_args.is_empty());
        assert_eq!(current.effective_generic_args().len(), 1);
        assert_eq!(current.effective_generic_args()[0].name, "Item");
    }

    #[test]
    fn test_effective_generic_args_own_list_wins() {
        let outer = generic("app", "Outer", vec![TypeName::new("app", "A")]);
        let mut inner = TypeName::nested(outer, "Inner");
        inner.generic_args = vec![TypeName::new("app", "B"), TypeName::new("app", "C")];

        let names: Vec<&str> = inner
            .effective_generic_args()
            .iter()
            .map(|arg| arg.name.as_str())
            .collect();
        assert_eq!(names, ["B", "C"]);

        assert!(TypeName::new("app", "Plain").effective_generic_args().is_empty());
    }

    #[test]
    fn test_enclosing_chain_and_namespace() {
        let outer = TypeName::new("app", "Outer");
        let middle = TypeName::nested(outer, "Middle");
        let inner = TypeName::nested(middle, "Inner");

        let chain: Vec<&str> = inner
            .enclosing_chain()
            .iter()
            .map(|node| node.name.as_str())
            .collect();
        assert_eq!(chain, ["Outer", "Middle"]);
        assert_eq!(inner.root_namespace(), "app");
        assert_eq!(inner.namespace, "");
        assert_eq!(inner.fullname(), "app.Outer.Middle.Inner");
        assert!(inner.is_nested());
    }

    #[test]
    fn test_with_array_composes() {
        let already = TypeName::new("app", "Item").with_array(true);
        assert!(already.clone().with_array(false).is_array);
        assert!(TypeName::new("app", "Item").with_array(true).is_array);
        assert!(!TypeName::new("app", "Item").with_array(false).is_array);
    }

    #[test]
    fn test_placeholder() {
        let param = GenericParam {
            index: 3,
            kind: GenericParamKind::Method,
        };
        let node = TypeName::placeholder(param);
        assert_eq!(node.name, "T3");
        assert!(node.is_placeholder());
        assert_eq!(param.to_string(), "!!3");
        assert_eq!(
            GenericParam {
                index: 0,
                kind: GenericParamKind::Type
            }
            .to_string(),
            "!0"
        );
    }
}
