//! Rendering of parsed [`TypeName`] trees back into display strings.
//!
//! Rendering is a pure function of the node and a [`Renderer`] configuration:
//!
//! - [`RenderFlags::NAMESPACE`] prefixes the namespace of the outermost type
//! - [`RenderFlags::ENCLOSING`] prefixes every enclosing type (with its own generic arguments)
//! - [`RenderFlags::GLOBAL_PREFIX`] prepends the [`GlobalPrefix`] token for namespaces that would
//!   otherwise be ambiguous in the target language
//!
//! A [`ShortNames`] table replaces well-known types by short aliases (`System.Int32` becomes
//! `int` under [`ShortNames::csharp`]). The lookup always uses the fully-qualified name, whatever
//! parts the flags select.
//!
//! # Examples
//!
//! ```rust
//! use refdump::typename::{parse_type_name, KnownTypes, RenderFlags, Renderer, ShortNames};
//!
//! let table = KnownTypes::new();
//! let dict = parse_type_name(
//!     "System.Collections.Generic.Dictionary`2<System.Int32,System.String[]>",
//!     &table,
//!     None,
//! )?;
//!
//! let aliases = ShortNames::csharp();
//! let renderer = Renderer::new(RenderFlags::QUALIFIED).with_short_names(&aliases);
//! assert_eq!(
//!     renderer.render(&dict),
//!     "System.Collections.Generic.Dictionary<int, string[]>"
//! );
//! # Ok::<(), refdump::Error>(())
//! ```

use std::collections::{HashMap, HashSet};

use bitflags::bitflags;

use crate::typename::TypeName;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// Which parts of a type name to render
    pub struct RenderFlags: u8 {
        /// Prefix the namespace
        const NAMESPACE = 0x01;
        /// Prefix the chain of enclosing types
        const ENCLOSING = 0x02;
        /// Prepend the disambiguation token for namespaces listed in [`GlobalPrefix`]
        const GLOBAL_PREFIX = 0x04;
        /// Namespace and enclosing types, the fully-qualified form
        const QUALIFIED = Self::NAMESPACE.bits() | Self::ENCLOSING.bits();
    }
}

/// Substitution table from fully-qualified names to short aliases.
#[derive(Debug, Clone, Default)]
pub struct ShortNames {
    aliases: HashMap<String, String>,
}

impl ShortNames {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        ShortNames::default()
    }

    /// The C# keyword aliases of the primitive types.
    #[must_use]
    pub fn csharp() -> Self {
        [
            ("System.Boolean", "bool"),
            ("System.Single", "float"),
            ("System.Double", "double"),
            ("System.Int16", "short"),
            ("System.UInt16", "ushort"),
            ("System.Int32", "int"),
            ("System.UInt32", "uint"),
            ("System.Int64", "long"),
            ("System.UInt64", "ulong"),
            ("System.SByte", "sbyte"),
            ("System.Byte", "byte"),
            ("System.String", "string"),
        ]
        .into_iter()
        .collect()
    }

    /// Add or replace an alias.
    pub fn insert(&mut self, fullname: impl Into<String>, alias: impl Into<String>) {
        self.aliases.insert(fullname.into(), alias.into());
    }

    /// Look up the alias of `fullname`.
    #[must_use]
    pub fn get(&self, fullname: &str) -> Option<&str> {
        self.aliases.get(fullname).map(String::as_str)
    }

    /// Number of aliases
    #[must_use]
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    /// Returns `true` if the table has no aliases
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ShortNames {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        ShortNames {
            aliases: iter
                .into_iter()
                .map(|(fullname, alias)| (fullname.into(), alias.into()))
                .collect(),
        }
    }
}

/// Token prepended to namespaces that clash with a nested namespace of the same name.
#[derive(Debug, Clone, Default)]
pub struct GlobalPrefix {
    token: String,
    namespaces: HashSet<String>,
}

impl GlobalPrefix {
    /// Create a prefix with no namespaces registered.
    pub fn new(token: impl Into<String>) -> Self {
        GlobalPrefix {
            token: token.into(),
            namespaces: HashSet::new(),
        }
    }

    /// `global::` for `AISituation`, which collides with `app.AISituation`.
    #[must_use]
    pub fn csharp() -> Self {
        let mut prefix = GlobalPrefix::new("global::");
        prefix.insert("AISituation");
        prefix
    }

    /// Register a namespace that needs the prefix.
    pub fn insert(&mut self, namespace: impl Into<String>) -> bool {
        self.namespaces.insert(namespace.into())
    }

    /// The prefix token
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns the token if `namespace` needs it.
    #[must_use]
    pub fn for_namespace(&self, namespace: &str) -> Option<&str> {
        self.namespaces
            .contains(namespace)
            .then_some(self.token.as_str())
    }
}

/// Configured type-name renderer.
///
/// Generic arguments are rendered with the same configuration as the type that owns them.
#[derive(Debug, Clone, Copy)]
pub struct Renderer<'a> {
    flags: RenderFlags,
    short_names: Option<&'a ShortNames>,
    global_prefix: Option<&'a GlobalPrefix>,
}

impl<'a> Renderer<'a> {
    /// Create a renderer without substitutions.
    #[must_use]
    pub fn new(flags: RenderFlags) -> Self {
        Renderer {
            flags,
            short_names: None,
            global_prefix: None,
        }
    }

    /// Substitute aliases from `short_names`.
    #[must_use]
    pub fn with_short_names(mut self, short_names: &'a ShortNames) -> Self {
        self.short_names = Some(short_names);
        self
    }

    /// Prepend `prefix` under [`RenderFlags::GLOBAL_PREFIX`].
    #[must_use]
    pub fn with_global_prefix(mut self, prefix: &'a GlobalPrefix) -> Self {
        self.global_prefix = Some(prefix);
        self
    }

    /// The active flags
    #[must_use]
    pub fn flags(&self) -> RenderFlags {
        self.flags
    }

    /// Render `node` under this configuration.
    ///
    /// With [`RenderFlags::ENCLOSING`] the namespace is taken from the outermost enclosing type;
    /// without it, from the node itself (which is empty for nested types).
    #[must_use]
    pub fn render(&self, node: &TypeName) -> String {
        let include_namespace = self.flags.contains(RenderFlags::NAMESPACE);
        let include_enclosing = self.flags.contains(RenderFlags::ENCLOSING);

        let namespace = if include_enclosing {
            node.root_namespace()
        } else {
            node.namespace.as_str()
        };

        let mut base = String::new();
        if include_namespace && !namespace.is_empty() {
            base.push_str(namespace);
            base.push('.');
        }
        if include_enclosing {
            for enclosing in node.enclosing_chain() {
                base.push_str(&enclosing.name);
                self.push_generic_args(&mut base, enclosing);
                base.push('.');
            }
        }
        base.push_str(&node.name);

        let alias = self
            .short_names
            .and_then(|names| names.get(&node.fullname()));
        let mut rendered = match alias {
            Some(alias) => alias.to_string(),
            None => match self.global_token(namespace) {
                Some(token) if include_namespace && !namespace.is_empty() => {
                    format!("{token}{base}")
                }
                _ => base,
            },
        };

        self.push_generic_args(&mut rendered, node);
        if node.is_array {
            rendered.push_str("[]");
        }
        rendered
    }

    fn global_token(&self, namespace: &str) -> Option<&'a str> {
        if !self.flags.contains(RenderFlags::QUALIFIED | RenderFlags::GLOBAL_PREFIX) {
            return None;
        }
        self.global_prefix
            .and_then(|prefix| prefix.for_namespace(namespace))
    }

    fn push_generic_args(&self, out: &mut String, node: &TypeName) {
        if node.generic_args.is_empty() {
            return;
        }

        let args: Vec<String> = node.generic_args.iter().map(|arg| self.render(arg)).collect();
        out.push('<');
        out.push_str(&args.join(", "));
        out.push('>');
    }
}

/// Render `node` with the two path flags and a short-name table.
///
/// # Examples
///
/// ```rust
/// use refdump::typename::{render, ShortNames, TypeName};
///
/// let int = TypeName::new("System", "Int32");
/// assert_eq!(render(&int, true, true, &ShortNames::csharp()), "int");
/// assert_eq!(render(&int, false, false, &ShortNames::csharp()), "int");
/// assert_eq!(render(&int, false, false, &ShortNames::new()), "Int32");
/// ```
#[must_use]
pub fn render(
    node: &TypeName,
    include_namespace: bool,
    include_enclosing: bool,
    short_names: &ShortNames,
) -> String {
    let mut flags = RenderFlags::empty();
    flags.set(RenderFlags::NAMESPACE, include_namespace);
    flags.set(RenderFlags::ENCLOSING, include_enclosing);
    Renderer::new(flags).with_short_names(short_names).render(node)
}

/// File-name friendly form of a type: enclosing types joined with `__`, no namespace.
#[must_use]
pub fn filename_stem(node: &TypeName) -> String {
    match &node.enclosing {
        Some(enclosing) => format!("{}__{}", filename_stem(enclosing), node.name),
        None => node.name.clone(),
    }
}

/// Best-effort display text for a type string that could not be parsed.
///
/// Missing types render as `object?`, aliased names as their alias, generic parameter
/// references as a commented `object`. Otherwise each arity marker (backtick plus one digit)
/// is removed.
#[must_use]
pub fn display_fallback(type_string: Option<&str>, short_names: &ShortNames) -> String {
    let Some(type_string) = type_string.filter(|text| !text.is_empty()) else {
        return "object?".to_string();
    };

    if let Some(alias) = short_names.get(type_string) {
        return alias.to_string();
    }

    if type_string.starts_with('!') {
        return format!("object /* Invalid type: {type_string} */");
    }

    let mut display = String::with_capacity(type_string.len());
    let mut chars = type_string.chars();
    while let Some(current) = chars.next() {
        if current == '`' {
            chars.next();
        } else {
            display.push(current);
        }
    }
    display
}
