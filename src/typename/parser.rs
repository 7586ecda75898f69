//! Recursive-descent parser for mangled CLR type names.
//!
//! # Grammar Regions
//!
//! 1. **Base name** - everything up to the first arity marker. Dotted segments are split into
//!    namespace and enclosing types by walking prefixes from longest to shortest against the
//!    [`NameTable`]: known prefixes become enclosing types, the first unknown one is the namespace.
//! 2. **Back-references** - `!N` resolves against the containing scope's effective generic
//!    arguments, `!!N` (method parameters) always becomes a `T<N>` placeholder.
//! 3. **Bracketed arguments** - `` `N[[Name, Assembly...],[Name`M[[...]], Assembly...]] ``.
//! 4. **Plain arguments** - `` `N<Arg,Arg> ``, and `` `N.Nested<Arg> `` where the arguments
//!    belong to the outer type.
//! 5. **Array suffixes** - `[]`, with `[][]` collapsed into a single array flag.
//! 6. **Truncation** - dumps cut names at [`TRUNCATED_NAME_LENGTH`] characters; such names are
//!    closed after their last complete bracketed element.
//!
//! # Failure Policy
//!
//! Grammar violations are [`crate::Error::Malformed`]. Constructs that are recognised but not
//! modeled (compiler-generated closures, generic types nested in generic types, bracketed lists
//! inside plain lists, array ranks beyond two) are [`crate::Error::Unsupported`].
//!
//! # Examples
//!
//! ```rust
//! use refdump::typename::{parse_type_name, KnownTypes};
//!
//! let table = KnownTypes::new();
//! let list = parse_type_name("System.Collections.Generic.List`1<System.String>", &table, None)?;
//!
//! assert_eq!(list.namespace, "System.Collections.Generic");
//! assert_eq!(list.name, "List");
//! assert_eq!(list.generic_args[0].namespace, "System");
//! assert_eq!(list.generic_args[0].name, "String");
//! # Ok::<(), refdump::Error>(())
//! ```

use std::borrow::Cow;

use crate::{
    typename::{
        cursor::{Cursor, END_OF_INPUT},
        GenericParam, GenericParamKind, NameTable, TypeName,
    },
    Result,
};

/// Maximum nesting depth of generic argument lists
pub const MAX_RECURSION_DEPTH: usize = 64;

/// Maximum number of enclosing types above a nested type
pub const MAX_NESTING_DEPTH: usize = 64;

/// Length at which the dump tool hard-wraps type names
pub const TRUNCATED_NAME_LENGTH: usize = 1023;

/// `T[][]` is accepted and collapsed, anything deeper is not modeled
const MAX_ARRAY_SUFFIXES: usize = 2;

/// Outcome of looking up a `!N` / `!!N` back-reference.
#[derive(Debug)]
enum BackReference {
    /// The reference names an argument of the containing scope
    Resolved(TypeName),
    /// Nothing to resolve against, use `T<index>`
    Placeholder(GenericParam),
}

impl BackReference {
    fn into_type_name(self) -> TypeName {
        match self {
            BackReference::Resolved(resolved) => resolved,
            BackReference::Placeholder(param) => TypeName::placeholder(param),
        }
    }
}

/// Which argument-list syntax encloses the construct being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListContext {
    /// The outermost name
    Root,
    /// An element of a `[[...]]` list
    Bracketed,
    /// An argument of a `<...>` list
    Plain,
}

/// Configured entry point for parsing type names.
///
/// # Examples
///
/// ```rust
/// use refdump::typename::{KnownTypes, TypeName, TypeNameParser};
///
/// let table = KnownTypes::new();
/// let holder = TypeName {
///     generic_args: vec![TypeName::new("app", "Item")],
///     ..TypeName::new("app", "Holder")
/// };
///
/// let parser = TypeNameParser::new(&table).with_containing(Some(&holder));
/// let field = parser.parse("System.Collections.Generic.List`1<!0>")?;
/// assert_eq!(field.to_string(), "System.Collections.Generic.List<app.Item>");
/// # Ok::<(), refdump::Error>(())
/// ```
pub struct TypeNameParser<'a, T: NameTable + ?Sized> {
    table: &'a T,
    containing: Option<&'a TypeName>,
    definitions_only: bool,
}

impl<'a, T: NameTable + ?Sized> TypeNameParser<'a, T> {
    /// Create a parser that splits namespaces using `table`.
    #[must_use]
    pub fn new(table: &'a T) -> Self {
        TypeNameParser {
            table,
            containing: None,
            definitions_only: false,
        }
    }

    /// Set the declaration that `!N` back-references resolve against.
    #[must_use]
    pub fn with_containing(mut self, containing: Option<&'a TypeName>) -> Self {
        self.containing = containing;
        self
    }

    /// Reject top-level `<...>` instantiation syntax as unsupported.
    ///
    /// Dump keys for generic definitions use the bracketed form; plain-form keys are
    /// instantiations that have no declaration of their own.
    #[must_use]
    pub fn definitions_only(mut self, enabled: bool) -> Self {
        self.definitions_only = enabled;
        self
    }

    /// Parse one type name.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for grammar violations and
    /// [`crate::Error::Unsupported`] for constructs that are deliberately not modeled.
    pub fn parse(&self, name: &str) -> Result<TypeName> {
        if name.is_empty() {
            return Err(malformed_error!("Empty type name"));
        }

        if is_compiler_generated(name) {
            return Err(unsupported_error!("Compiler-generated type '{}'", name));
        }

        let text = truncate_dump_name(name)?;
        let mut grammar = Grammar {
            cursor: Cursor::new(&text, self.containing),
            table: self.table,
            definitions_only: self.definitions_only,
            truncated: matches!(text, Cow::Owned(_)),
            depth: 0,
        };

        let parsed = grammar.parse_root()?;
        if grammar.cursor.has_more_data() {
            return Err(malformed_error!(
                "Unexpected trailing text '{}' in '{}'",
                grammar.cursor.rest(),
                name
            ));
        }

        Ok(parsed)
    }
}

/// Parse `name`, resolving `!N` against `containing` when given.
///
/// # Errors
/// See [`TypeNameParser::parse`].
pub fn parse_type_name<T: NameTable + ?Sized>(
    name: &str,
    table: &T,
    containing: Option<&TypeName>,
) -> Result<TypeName> {
    TypeNameParser::new(table)
        .with_containing(containing)
        .parse(name)
}

/// Parse a type-definition key from a dump; plain `<...>` instantiations are unsupported.
///
/// # Errors
/// See [`TypeNameParser::parse`].
pub fn parse_definition_name<T: NameTable + ?Sized>(name: &str, table: &T) -> Result<TypeName> {
    TypeNameParser::new(table).definitions_only(true).parse(name)
}

fn is_compiler_generated(name: &str) -> bool {
    name.contains("c__DisplayClass") || name.contains(".<>c")
}

/// Close a name the dump cut off at [`TRUNCATED_NAME_LENGTH`] after its last complete element.
fn truncate_dump_name(name: &str) -> Result<Cow<'_, str>> {
    if name.len() != TRUNCATED_NAME_LENGTH || !name.contains('`') {
        return Ok(Cow::Borrowed(name));
    }

    let Some(cut) = name.rfind("],[") else {
        return Err(malformed_error!(
            "Truncated type name '{}' has no complete generic argument",
            name
        ));
    };

    log::trace!("Closing truncated type name after offset {}", cut);
    Ok(Cow::Owned(format!("{}]", &name[..=cut])))
}

/// Split `[]` suffixes off a name segment.
fn split_array_suffix(segment: &str) -> Result<(&str, bool)> {
    let mut rest = segment;
    let mut ranks = 0;
    while let Some(stripped) = rest.strip_suffix("[]") {
        rest = stripped;
        ranks += 1;
    }

    if ranks > MAX_ARRAY_SUFFIXES {
        return Err(unsupported_error!(
            "Array of rank {} in '{}'",
            ranks,
            segment
        ));
    }

    Ok((rest, ranks > 0))
}

/// Parse state for a single name.
struct Grammar<'c, T: NameTable + ?Sized> {
    cursor: Cursor<'c>,
    table: &'c T,
    definitions_only: bool,
    truncated: bool,
    depth: usize,
}

impl<T: NameTable + ?Sized> Grammar<'_, T> {
    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_RECURSION_DEPTH {
            return Err(malformed_error!(
                "Generic arguments nested deeper than {} levels in '{}'",
                MAX_RECURSION_DEPTH,
                self.cursor.text()
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn parse_root(&mut self) -> Result<TypeName> {
        let text = self.cursor.text();
        let Some(tick) = text.find('`') else {
            return self.parse_base_name(text.len());
        };

        let base = self.parse_base_name(tick)?;
        let arity = self.parse_arity()?;
        let mut root = self.parse_generic_tail(base, arity, ListContext::Root)?;
        self.parse_array_suffix(&mut root)?;
        Ok(root)
    }

    /// Parse the dotted name between the cursor and `end`.
    fn parse_base_name(&mut self, end: usize) -> Result<TypeName> {
        let start = self.cursor.pos();
        let Some(region) = self.cursor.text().get(start..end) else {
            return Err(malformed_error!(
                "Invalid name range {}..{} in '{}'",
                start,
                end,
                self.cursor.text()
            ));
        };
        self.cursor.seek(end)?;

        if region.contains(['<', '>']) {
            return Err(unsupported_error!(
                "Generic arguments without an arity marker in '{}'",
                self.cursor.text()
            ));
        }

        let (qualifier, simple) = match region.rsplit_once('.') {
            Some((qualifier, simple)) => (Some(qualifier), simple),
            None => (None, region),
        };

        if simple.starts_with('!') {
            return self.resolve_back_reference(simple);
        }

        let (simple, is_array) = split_array_suffix(simple)?;
        if simple.is_empty() {
            return Err(malformed_error!(
                "Empty name segment in '{}'",
                self.cursor.text()
            ));
        }

        let segments: Vec<&str> = qualifier.map(|q| q.split('.').collect()).unwrap_or_default();
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(malformed_error!(
                "Empty name segment in '{}'",
                self.cursor.text()
            ));
        }

        let mut split = segments.len();
        while split > 0 && self.table.contains(&segments[..split].join(".")) {
            split -= 1;
        }
        self.check_nesting(segments.len() - split)?;

        let namespace = segments[..split].join(".");
        let node = match segments[split..].split_first() {
            Some((outermost, rest)) => {
                let outer = rest.iter().fold(
                    TypeName::new(namespace, *outermost),
                    |enclosing, segment| TypeName::nested(enclosing, *segment),
                );
                TypeName::nested(outer, simple)
            }
            None => TypeName::new(namespace, simple),
        };

        Ok(node.with_array(is_array))
    }

    /// Turn `!N`, `!!N`, `!N[]`, `!N&` into a node.
    fn resolve_back_reference(&self, token: &str) -> Result<TypeName> {
        let (reference, is_array) = split_array_suffix(token.trim_end_matches('&'))?;
        let reference = reference.trim_end_matches('&');

        let (kind, digits) = match reference.strip_prefix("!!") {
            Some(digits) => (GenericParamKind::Method, digits),
            None => (GenericParamKind::Type, &reference[1..]),
        };

        let index = digits.parse::<u32>().map_err(|_| {
            malformed_error!(
                "Invalid generic parameter reference '{}' in '{}'",
                token,
                self.cursor.text()
            )
        })?;

        let param = GenericParam { index, kind };
        let reference = match kind {
            GenericParamKind::Method => BackReference::Placeholder(param),
            GenericParamKind::Type => self.lookup_type_param(param),
        };

        Ok(reference.into_type_name().with_array(is_array))
    }

    fn lookup_type_param(&self, param: GenericParam) -> BackReference {
        let scope = self
            .cursor
            .containing()
            .or_else(|| self.cursor.in_progress());

        match scope.and_then(|scope| scope.effective_generic_args().get(param.index as usize)) {
            Some(resolved) => BackReference::Resolved(resolved.clone()),
            None => {
                log::debug!(
                    "No generic argument for {} in '{}', using placeholder",
                    param,
                    self.cursor.text()
                );
                BackReference::Placeholder(param)
            }
        }
    }

    /// Consume `` `N `` and return N.
    fn parse_arity(&mut self) -> Result<usize> {
        if !self.cursor.eat("`") {
            return Err(malformed_error!(
                "Expected arity marker at offset {} in '{}'",
                self.cursor.pos(),
                self.cursor.text()
            ));
        }

        let start = self.cursor.pos();
        let count = self
            .cursor
            .rest()
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        if count == 0 {
            return Err(malformed_error!(
                "Arity marker without digits in '{}'",
                self.cursor.text()
            ));
        }

        let digits = &self.cursor.text()[start..start + count];
        self.cursor.seek(start + count)?;
        digits.parse::<usize>().map_err(|_| {
            malformed_error!("Invalid arity '{}' in '{}'", digits, self.cursor.text())
        })
    }

    /// Everything after an arity marker: an argument list, or `.Nested` followed by one.
    fn parse_generic_tail(
        &mut self,
        base: TypeName,
        arity: usize,
        context: ListContext,
    ) -> Result<TypeName> {
        if self.cursor.peek() == '.' {
            return self.parse_nested_in_generic(base, arity, context);
        }

        let mut node = base;
        let args = self.parse_argument_list(&node, arity, context)?;
        node.generic_args = args;
        Ok(node)
    }

    fn parse_argument_list(
        &mut self,
        owner: &TypeName,
        arity: usize,
        context: ListContext,
    ) -> Result<Vec<TypeName>> {
        match self.cursor.peek() {
            '[' if context == ListContext::Plain => Err(unsupported_error!(
                "Bracketed generic arguments inside a plain argument list in '{}'",
                self.cursor.text()
            )),
            '[' => self.parse_bracketed_list(arity),
            '<' if context == ListContext::Root && self.definitions_only => Err(
                unsupported_error!("'{}' is a generic instantiation", self.cursor.text()),
            ),
            '<' => self.parse_plain_list(owner, arity),
            END_OF_INPUT => Err(malformed_error!(
                "Missing generic argument list in '{}'",
                self.cursor.text()
            )),
            other => Err(malformed_error!(
                "Unexpected '{}' at offset {} after arity marker in '{}'",
                other,
                self.cursor.pos(),
                self.cursor.text()
            )),
        }
    }

    /// `` Outer`N.Nested<...> `` - the arguments belong to `Outer`.
    fn parse_nested_in_generic(
        &mut self,
        outer: TypeName,
        arity: usize,
        context: ListContext,
    ) -> Result<TypeName> {
        self.cursor.advance()?;
        let start = self.cursor.pos();
        let end = self.cursor.expect_any(&['`', '[', '<'])?;
        if self.cursor.char_at(end) == '`' {
            return Err(unsupported_error!(
                "Generic type nested inside a generic type in '{}'",
                self.cursor.text()
            ));
        }

        let nested = &self.cursor.text()[start..end];
        if nested.split('.').any(str::is_empty) {
            return Err(malformed_error!(
                "Empty nested type name in '{}'",
                self.cursor.text()
            ));
        }
        self.check_nesting(outer.enclosing_chain().len() + nested.split('.').count())?;
        self.cursor.seek(end)?;

        let mut outer = outer;
        let args = self.parse_argument_list(&outer, arity, context)?;
        outer.generic_args = args;

        Ok(nested
            .split('.')
            .fold(outer, |enclosing, segment| TypeName::nested(enclosing, segment)))
    }

    fn parse_bracketed_list(&mut self, arity: usize) -> Result<Vec<TypeName>> {
        self.enter()?;
        let args = self.parse_bracketed_elements(arity);
        self.leave();
        args
    }

    fn parse_bracketed_elements(&mut self, arity: usize) -> Result<Vec<TypeName>> {
        if !self.cursor.rest().starts_with("[[") {
            // `KeyValuePair`2[app.Key,app.Value]` - arguments are not modeled
            let close = self.cursor.expect_any(&[']'])?;
            log::trace!(
                "Skipping single-bracket generic arguments in '{}'",
                self.cursor.text()
            );
            self.cursor.seek(close + 1)?;
            return Ok(Vec::new());
        }

        self.cursor.advance()?;
        let mut args = Vec::new();
        loop {
            if self.cursor.peek() != '[' {
                return Err(malformed_error!(
                    "Expected '[' at offset {} in '{}'",
                    self.cursor.pos(),
                    self.cursor.text()
                ));
            }

            args.push(self.parse_bracketed_element()?);

            match self.cursor.peek() {
                ',' => {
                    self.cursor.advance()?;
                    self.cursor.skip_spaces();
                }
                ']' => {
                    self.cursor.advance()?;
                    break;
                }
                other => {
                    return Err(malformed_error!(
                        "Unexpected '{}' after generic argument at offset {} in '{}'",
                        other,
                        self.cursor.pos(),
                        self.cursor.text()
                    ))
                }
            }
        }

        self.check_arity(arity, args.len())?;
        Ok(args)
    }

    /// `[Name, Assembly...]` or `[Name`N[[...]], Assembly...]`
    fn parse_bracketed_element(&mut self) -> Result<TypeName> {
        self.cursor.advance()?;
        let sep = self.expect_element_name_end()?;
        let mut element = self.parse_base_name(sep)?;

        if self.cursor.peek() == '`' {
            let arity = self.parse_arity()?;
            element = self.parse_generic_tail(element, arity, ListContext::Bracketed)?;
            self.parse_array_suffix(&mut element)?;
        }

        // `, System, Version=1.0.0.0, Culture=neutral, PublicKeyToken=null]`
        let close = self.cursor.expect_any(&[']'])?;
        self.cursor.seek(close + 1)?;
        Ok(element)
    }

    /// End of the name inside `[Name, Assembly]`; a `[]` array marker belongs to the name.
    fn expect_element_name_end(&self) -> Result<usize> {
        let text = self.cursor.text();
        let mut from = self.cursor.pos();
        while let Some(found) = text[from..].find(['`', ',', ']']) {
            let at = from + found;
            if text[at..].starts_with(']') && text[..at].ends_with('[') {
                from = at + 1;
                continue;
            }
            return Ok(at);
        }

        Err(malformed_error!(
            "Unterminated generic argument after offset {} in '{}'",
            self.cursor.pos(),
            text
        ))
    }

    fn parse_plain_list(&mut self, owner: &TypeName, arity: usize) -> Result<Vec<TypeName>> {
        self.enter()?;
        let saved = self.cursor.swap_in_progress(Some(owner.clone()));
        let args = self.parse_plain_elements(arity);
        self.cursor.swap_in_progress(saved);
        self.leave();
        args
    }

    fn parse_plain_elements(&mut self, arity: usize) -> Result<Vec<TypeName>> {
        self.cursor.advance()?;
        if self.cursor.eat(">") {
            // `Comparer`1<>` - an unbound generic definition
            return Ok(Vec::new());
        }

        let mut args = Vec::new();
        loop {
            self.cursor.skip_spaces();
            args.push(self.parse_plain_argument()?);
            self.cursor.skip_spaces();

            match self.cursor.peek() {
                ',' => self.cursor.advance()?,
                '>' => {
                    self.cursor.advance()?;
                    break;
                }
                END_OF_INPUT => {
                    return Err(malformed_error!(
                        "Unterminated generic argument list in '{}'",
                        self.cursor.text()
                    ))
                }
                other => {
                    return Err(malformed_error!(
                        "Unexpected '{}' at offset {} in '{}'",
                        other,
                        self.cursor.pos(),
                        self.cursor.text()
                    ))
                }
            }
        }

        self.check_arity(arity, args.len())?;
        Ok(args)
    }

    fn parse_plain_argument(&mut self) -> Result<TypeName> {
        let start = self.cursor.pos();
        let sep = self.cursor.expect_any(&['`', ',', '>'])?;
        if sep == start {
            if self.cursor.char_at(sep) == '`' {
                return Err(malformed_error!(
                    "Arity marker without a name in '{}'",
                    self.cursor.text()
                ));
            }
            // `Dictionary`2<Key,>`
            return Ok(TypeName::new("", "object"));
        }

        let mut argument = self.parse_base_name(sep)?;
        if self.cursor.peek() == '`' {
            let arity = self.parse_arity()?;
            argument = self.parse_generic_tail(argument, arity, ListContext::Plain)?;
            self.parse_array_suffix(&mut argument)?;
        }

        Ok(argument)
    }

    fn parse_array_suffix(&mut self, node: &mut TypeName) -> Result<()> {
        let mut ranks = 0;
        while self.cursor.rest().starts_with("[]") {
            if ranks == MAX_ARRAY_SUFFIXES {
                return Err(unsupported_error!(
                    "Array of rank {} in '{}'",
                    ranks + 1,
                    self.cursor.text()
                ));
            }
            self.cursor.eat("[]");
            ranks += 1;
        }

        if ranks > 1 {
            log::trace!("Collapsing jagged array in '{}'", self.cursor.text());
        }
        node.is_array |= ranks > 0;
        Ok(())
    }

    fn check_nesting(&self, enclosing: usize) -> Result<()> {
        if enclosing > MAX_NESTING_DEPTH {
            return Err(malformed_error!(
                "Type nested {} levels deep, the limit is {}, in '{}'",
                enclosing,
                MAX_NESTING_DEPTH,
                self.cursor.text()
            ));
        }
        Ok(())
    }

    fn check_arity(&self, arity: usize, found: usize) -> Result<()> {
        if found != arity && !self.truncated {
            return Err(malformed_error!(
                "Declared arity {} but found {} generic arguments in '{}'",
                arity,
                found,
                self.cursor.text()
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        typename::{KnownTypes, ShortNames},
        ParseOutcome,
    };

    const QUAL: &str = "System, Version=1.0.0.0, Culture=neutral, PublicKeyToken=null";

    fn parse(name: &str) -> Result<TypeName> {
        parse_type_name(name, &KnownTypes::new(), None)
    }

    fn outcome(result: Result<TypeName>) -> ParseOutcome {
        result.expect_err("parse should fail").outcome()
    }

    fn holder(args: Vec<TypeName>) -> TypeName {
        TypeName {
            generic_args: args,
            ..TypeName::new("app", "Holder")
        }
    }

    #[test]
    fn test_plain_dotted_names_round_trip() {
        let names = [
            "Sub.Name",
            "NS.Sub.Name",
            "via.gui.Control",
            "app.quest.action.QuestActionBase",
            "System.Object",
            "Global",
        ];

        for name in names {
            let parsed = parse(name).unwrap();
            assert!(parsed.enclosing.is_none());
            assert_eq!(parsed.render(true, true, &ShortNames::new()), name);
        }
    }

    #[test]
    fn test_list_of_string() {
        let list = parse("System.Collections.Generic.List`1<System.String>").unwrap();
        assert_eq!(list.namespace, "System.Collections.Generic");
        assert_eq!(list.name, "List");
        assert_eq!(list.generic_args.len(), 1);
        assert_eq!(list.generic_args[0].name, "String");
        assert_eq!(list.generic_args[0].namespace, "System");
        assert!(!list.is_array);
    }

    #[test]
    fn test_name_table_splits_nested_types() {
        let table = KnownTypes::from_iter(["app.Outer"]);
        let inner = parse_type_name("app.Outer.Inner", &table, None).unwrap();
        assert_eq!(inner.name, "Inner");
        assert_eq!(inner.namespace, "");
        let outer = inner.enclosing.as_ref().unwrap();
        assert_eq!(outer.name, "Outer");
        assert_eq!(outer.namespace, "app");
        assert!(outer.enclosing.is_none());

        let table = KnownTypes::from_iter(["app.A", "app.A.B"]);
        let c = parse_type_name("app.A.B.C", &table, None).unwrap();
        let chain: Vec<&str> = c.enclosing_chain().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(chain, ["A", "B"]);
        assert_eq!(c.root_namespace(), "app");
        assert_eq!(c.enclosing.as_ref().unwrap().namespace, "");
        assert_eq!(c.to_string(), "app.A.B.C");
    }

    #[test]
    fn test_name_table_knows_every_prefix() {
        let table = KnownTypes::from_iter(["a", "a.b"]);
        let c = parse_type_name("a.b.c", &table, None).unwrap();
        assert_eq!(c.root_namespace(), "");
        assert_eq!(c.enclosing_chain().len(), 2);
        assert_eq!(c.to_string(), "a.b.c");
    }

    #[test]
    fn test_bracketed_arguments() {
        let name = format!(
            "System.Collections.Generic.Dictionary`2[[System.Int32, {QUAL}],[app.Foo, application, Version=0.0.0.0, Culture=neutral, PublicKeyToken=null]]"
        );
        let dict = parse(&name).unwrap();
        assert_eq!(dict.name, "Dictionary");
        assert_eq!(dict.generic_args.len(), 2);
        assert_eq!(dict.generic_args[0].fullname(), "System.Int32");
        assert_eq!(dict.generic_args[1].fullname(), "app.Foo");
        assert_eq!(
            dict.to_string(),
            "System.Collections.Generic.Dictionary<System.Int32, app.Foo>"
        );
    }

    #[test]
    fn test_nested_bracketed_arguments() {
        let name = format!(
            "System.Collections.Generic.List`1[[System.ValueTuple`3[[System.UInt32, {QUAL}],[System.Boolean, {QUAL}],[System.Boolean, {QUAL}]], {QUAL}]]"
        );
        let list = parse(&name).unwrap();
        let tuple = &list.generic_args[0];
        assert_eq!(tuple.name, "ValueTuple");
        assert_eq!(tuple.generic_args.len(), 3);
        assert_eq!(tuple.generic_args[2].name, "Boolean");
    }

    #[test]
    fn test_bracketed_definition_parameters() {
        let name = "app.CharacterBindController.Module`1[[TParameter, application, Version=0.0.0.0, Culture=neutral, PublicKeyToken=null]]";
        let table = KnownTypes::from_iter(["app.CharacterBindController"]);
        let module = parse_definition_name(name, &table).unwrap();
        assert_eq!(module.name, "Module");
        assert_eq!(module.enclosing.as_ref().unwrap().name, "CharacterBindController");
        assert_eq!(module.generic_args[0].name, "TParameter");
        assert_eq!(module.generic_args[0].namespace, "");
    }

    #[test]
    fn test_arity_mismatch_is_malformed() {
        let bracketed = format!("app.Pair`2[[System.Int32, {QUAL}]]");
        assert_eq!(outcome(parse(&bracketed)), ParseOutcome::Malformed);
        assert_eq!(
            outcome(parse("app.Pair`2<System.Int32>")),
            ParseOutcome::Malformed
        );
        assert_eq!(
            outcome(parse("app.Single`1<System.Int32,System.Int64>")),
            ParseOutcome::Malformed
        );
    }

    #[test]
    fn test_large_arity() {
        let args: Vec<String> = (0..13).map(|i| format!("app.Arg{i}")).collect();
        let name = format!("app.AIBlackBoardCollection`13<{}>", args.join(","));
        let collection = parse(&name).unwrap();
        assert_eq!(collection.generic_args.len(), 13);
        assert_eq!(collection.generic_args[12].name, "Arg12");
    }

    #[test]
    fn test_empty_plain_list() {
        let comparer = parse("System.Collections.Generic.Comparer`1<>").unwrap();
        assert_eq!(comparer.name, "Comparer");
        assert!(comparer.generic_args.is_empty());
    }

    #[test]
    fn test_empty_plain_argument_is_object() {
        let dict =
            parse("System.Collections.Generic.Dictionary`2<AISituation.IAISituationAgent,>")
                .unwrap();
        assert_eq!(dict.generic_args.len(), 2);
        assert_eq!(dict.generic_args[0].fullname(), "AISituation.IAISituationAgent");
        assert_eq!(dict.generic_args[1].fullname(), "object");
    }

    #[test]
    fn test_back_reference_resolves_against_containing_scope() {
        let table = KnownTypes::new();
        let item = TypeName::new("app", "Item");
        let scope = holder(vec![item.clone()]);

        let resolved = parse_type_name("!0", &table, Some(&scope)).unwrap();
        assert_eq!(resolved, item);

        let array = parse_type_name("!0[]", &table, Some(&scope)).unwrap();
        assert_eq!(array, item.clone().with_array(true));

        let by_ref = parse_type_name("!0&", &table, Some(&scope)).unwrap();
        assert_eq!(by_ref, item);

        let out_of_range = parse_type_name("!5", &table, Some(&scope)).unwrap();
        assert_eq!(out_of_range.name, "T5");
        assert_eq!(
            out_of_range.generic_param,
            Some(GenericParam {
                index: 5,
                kind: GenericParamKind::Type
            })
        );
    }

    #[test]
    fn test_back_reference_composes_array_flag() {
        let table = KnownTypes::new();
        let scope = holder(vec![TypeName::new("app", "Item").with_array(true)]);

        let plain = parse_type_name("!0", &table, Some(&scope)).unwrap();
        assert!(plain.is_array);
        let jagged = parse_type_name("!0[][]", &table, Some(&scope)).unwrap();
        assert!(jagged.is_array);
        assert_eq!(jagged.name, "Item");
    }

    #[test]
    fn test_back_reference_through_enclosing_scope() {
        let table = KnownTypes::new();
        let enumerator = TypeName::nested(holder(vec![TypeName::new("app", "Item")]), "Enumerator");
        let current = parse_type_name("!0", &table, Some(&enumerator)).unwrap();
        assert_eq!(current.fullname(), "app.Item");
    }

    #[test]
    fn test_back_reference_placeholders() {
        let table = KnownTypes::new();
        let scope = holder(vec![TypeName::new("app", "Item")]);

        let method = parse_type_name("!!1", &table, Some(&scope)).unwrap();
        assert_eq!(method.name, "T1");
        assert_eq!(method.generic_param.unwrap().kind, GenericParamKind::Method);

        let method_array = parse_type_name("!!0[]", &table, Some(&scope)).unwrap();
        assert_eq!(method_array.name, "T0");
        assert!(method_array.is_array);

        let unscoped = parse("!2").unwrap();
        assert_eq!(unscoped.name, "T2");
        assert!(unscoped.is_placeholder());

        assert_eq!(outcome(parse("!x")), ParseOutcome::Malformed);
        assert_eq!(outcome(parse("!")), ParseOutcome::Malformed);
    }

    #[test]
    fn test_back_reference_inside_arguments() {
        let table = KnownTypes::new();
        let scope = holder(vec![TypeName::new("app", "Key"), TypeName::new("app", "Value")]);

        let dict = parse_type_name(
            "System.Collections.Generic.Dictionary`2<!1,System.Collections.Generic.List`1<!0[]>>",
            &table,
            Some(&scope),
        )
        .unwrap();
        assert_eq!(
            dict.to_string(),
            "System.Collections.Generic.Dictionary<app.Value, System.Collections.Generic.List<app.Key[]>>"
        );

        let unscoped = parse("System.Collections.Generic.List`1<!0>").unwrap();
        assert_eq!(unscoped.generic_args[0].name, "T0");
    }

    #[test]
    fn test_nested_type_of_generic_plain() {
        let enumerator = parse("app.Outer`1.Nested<app.Arg>").unwrap();
        assert_eq!(enumerator.name, "Nested");
        assert!(enumerator.generic_args.is_empty());
        let outer = enumerator.enclosing.as_ref().unwrap();
        assert_eq!(outer.name, "Outer");
        assert_eq!(outer.generic_args, vec![TypeName::new("app", "Arg")]);
        assert_eq!(enumerator.effective_generic_args().len(), 1);
        assert_eq!(enumerator.root_namespace(), "app");
        assert_eq!(enumerator.to_string(), "app.Outer<app.Arg>.Nested");
    }

    #[test]
    fn test_nested_type_of_generic_bracketed() {
        let name = format!(
            "System.Collections.Generic.Dictionary`2.Entry[[System.Int32, {QUAL}],[app.QuestDeliverManager.Context, {QUAL}]][]"
        );
        let entry = parse(&name).unwrap();
        assert_eq!(entry.name, "Entry");
        assert!(entry.is_array);
        let dict = entry.enclosing.as_ref().unwrap();
        assert_eq!(dict.name, "Dictionary");
        assert!(!dict.is_array);
        assert_eq!(dict.generic_args.len(), 2);
    }

    #[test]
    fn test_nested_type_of_generic_inside_arguments() {
        let name = "app.Wrapper`1<System.Collections.Generic.List`1.Enumerator<app.AISituationObject>>";
        let wrapper = parse(name).unwrap();
        let enumerator = &wrapper.generic_args[0];
        assert_eq!(enumerator.name, "Enumerator");
        assert_eq!(
            enumerator.enclosing.as_ref().unwrap().generic_args[0].name,
            "AISituationObject"
        );
    }

    #[test]
    fn test_unsupported_constructs() {
        let cases = [
            "app.Outer`1.Inner`1<app.A,app.B>",
            "app.EPVExpertMonsterSpell.<>c",
            "app.Foo.<>c__DisplayClass12_0",
            "System.Array.InternalEnumerator<app.Item>",
            "app.Item[][][]",
        ];
        for name in cases {
            assert_eq!(outcome(parse(name)), ParseOutcome::Unsupported, "{name}");
        }

        let bracketed_in_plain = format!(
            "System.Collections.Generic.Dictionary`2<app.GeneratorID,System.Collections.Generic.List`1[[app.EnvironmentLoadManager.LocalCellData, {QUAL}]][]>"
        );
        assert_eq!(outcome(parse(&bracketed_in_plain)), ParseOutcome::Unsupported);
    }

    #[test]
    fn test_definitions_only() {
        let table = KnownTypes::new();
        assert_eq!(
            outcome(parse_definition_name("app.AIBlackBoardBase`1<app.AITarget>", &table)),
            ParseOutcome::Unsupported
        );
        assert_eq!(
            outcome(parse_definition_name("System.Collections.Generic.List`1.Enumerator<app.X>", &table)),
            ParseOutcome::Unsupported
        );
        let definition = format!("via.gui.GUIPath`1[[T, {QUAL}]]");
        assert!(parse_definition_name(&definition, &table).is_ok());
    }

    #[test]
    fn test_array_suffixes() {
        let item = parse("app.Item[]").unwrap();
        assert!(item.is_array);
        assert_eq!(item.name, "Item");

        let jagged = parse("app.Item[][]").unwrap();
        assert!(jagged.is_array);
        assert_eq!(jagged, item);

        let list = parse("System.Collections.Generic.List`1<app.Item>[][]").unwrap();
        assert!(list.is_array);
        assert!(!list.generic_args[0].is_array);

        let element = format!("System.Collections.Generic.List`1[[System.String[], {QUAL}]]");
        let list = parse(&element).unwrap();
        assert!(list.generic_args[0].is_array);
        assert_eq!(list.generic_args[0].name, "String");
    }

    #[test]
    fn test_single_bracket_form_is_skipped() {
        let pair = parse(
            "System.Collections.Generic.KeyValuePair`2[app.CharacterID,app.CharacterLookAt][][]",
        )
        .unwrap();
        assert_eq!(pair.name, "KeyValuePair");
        assert!(pair.generic_args.is_empty());
        assert!(pair.is_array);
    }

    #[test]
    fn test_truncated_name_keeps_complete_elements() {
        let mut name = String::from("app.AIBlackBoardCollection`40[");
        for i in 0..40 {
            if i > 0 {
                name.push(',');
            }
            name.push_str(&format!(
                "[app.Element{i}, application, Version=0.0.0.0, Culture=neutral, PublicKeyToken=null]"
            ));
        }
        name.push(']');
        assert!(name.len() > TRUNCATED_NAME_LENGTH);
        name.truncate(TRUNCATED_NAME_LENGTH);
        assert!(!name.ends_with("]]"));

        let complete = name.matches("],[").count();
        let collection = parse(&name).unwrap();
        assert_eq!(collection.name, "AIBlackBoardCollection");
        assert_eq!(collection.generic_args.len(), complete);
        assert_eq!(collection.generic_args[0].name, "Element0");
        assert_eq!(
            collection.generic_args[complete - 1].name,
            format!("Element{}", complete - 1)
        );

        // the same cut at any other length is just broken input
        name.pop();
        assert_eq!(outcome(parse(&name)), ParseOutcome::Malformed);
    }

    #[test]
    fn test_malformed_inputs() {
        let cases = [
            "",
            "app.Foo`1",
            "app.Foo`<app.Bar>",
            "app.Foo`1[[app.Bar",
            "app.Foo`1<app.Bar",
            "app.Foo`1[[app.Bar, asm]]junk",
            "app.Foo`1<app.Bar>extra",
            "app.Foo`1?",
            "app..Foo`1.<app.Bar>",
            "app.",
        ];
        for name in cases {
            assert_eq!(outcome(parse(name)), ParseOutcome::Malformed, "{name}");
        }
    }

    #[test]
    fn test_recursion_depth_is_capped() {
        let depth = MAX_RECURSION_DEPTH + 10;
        let name = format!("{}app.X{}", "app.Box`1<".repeat(depth), ">".repeat(depth));
        assert_eq!(outcome(parse(&name)), ParseOutcome::Malformed);

        let shallow = format!("{}app.X{}", "app.Box`1<".repeat(8), ">".repeat(8));
        assert!(parse(&shallow).is_ok());
    }

    #[test]
    fn test_nesting_depth_is_capped() {
        let deep = format!("app.Outer`1.{}Leaf<app.A>", "N.".repeat(200_000));
        assert_eq!(outcome(parse(&deep)), ParseOutcome::Malformed);

        let levels = MAX_NESTING_DEPTH + 1;
        let table: KnownTypes = (1..=levels)
            .map(|depth| format!("app{}", ".N".repeat(depth)))
            .collect();
        let dotted = format!("app.{}Leaf", "N.".repeat(levels));
        let error = parse_type_name(&dotted, &table, None).unwrap_err();
        assert_eq!(error.outcome(), ParseOutcome::Malformed);

        let nested = format!("app.Outer`1.{}Leaf<app.A>", "N.".repeat(MAX_NESTING_DEPTH - 1));
        let leaf = parse(&nested).unwrap();
        assert_eq!(leaf.enclosing_chain().len(), MAX_NESTING_DEPTH);
        assert_eq!(leaf.root_namespace(), "app");
        assert_eq!(leaf.effective_generic_args().len(), 1);
    }

    #[test]
    fn test_huge_arity_is_rejected_without_allocating() {
        let names = [
            "app.X`99999999999999999<app.A>",
            "app.X`10000000000<app.A>",
            "app.X`10000000000[[app.A, asm]]",
            "app.X`99999999999999999[[app.A, asm],[app.B, asm]]",
        ];
        for name in names {
            assert_eq!(outcome(parse(name)), ParseOutcome::Malformed, "{name}");
        }
    }
}
