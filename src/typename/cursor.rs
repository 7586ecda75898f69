//! Position-tracking scanner over a type-name string.
//!
//! [`Cursor`] is the text counterpart of a byte-stream parser: immutable input, a mutable
//! offset, and bounds-checked navigation. On top of that it carries the two generic scopes the
//! grammar needs:
//!
//! - the **containing scope**, the declaration whose generic parameters `!N` refers to
//!   (for example the class that owns the field whose type is being parsed), and
//! - the **in-progress scope**, the generic type whose argument list is currently being read.
//!
//! The in-progress scope is swapped in and out around each argument list with
//! [`Cursor::swap_in_progress`], so nested lists restore their parent's scope on the way out.
//!
//! All offsets are byte offsets into the original string.

use crate::{typename::TypeName, Result};

/// Sentinel returned by [`Cursor::peek`] at the end of the input.
pub const END_OF_INPUT: char = '\0';

/// A cursor over the text of one type name.
///
/// # Examples
///
/// ```rust
/// use refdump::typename::Cursor;
///
/// let mut cursor = Cursor::new("List`1<X>", None);
/// let tick = cursor.expect_any(&['`'])?;
/// assert_eq!(tick, 4);
///
/// cursor.seek(tick)?;
/// assert_eq!(cursor.peek(), '`');
/// assert!(cursor.eat("`1"));
/// assert_eq!(cursor.rest(), "<X>");
/// # Ok::<(), refdump::Error>(())
/// ```
pub struct Cursor<'a> {
    /// The text being parsed
    text: &'a str,
    /// Current byte offset within the text
    position: usize,
    /// Declaration that `!N` back-references resolve against
    containing: Option<&'a TypeName>,
    /// Generic type whose argument list is being parsed right now
    in_progress: Option<TypeName>,
}

impl<'a> Cursor<'a> {
    /// Create a new cursor at the start of `text`.
    ///
    /// # Arguments
    /// * `text` - The type name to scan
    /// * `containing` - The declaration `!N` references resolve against, if any
    #[must_use]
    pub fn new(text: &'a str, containing: Option<&'a TypeName>) -> Self {
        Cursor {
            text,
            position: 0,
            containing,
            in_progress: None,
        }
    }

    /// The full text, independent of the current position
    #[must_use]
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Length of the text in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Returns `true` if the text is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Current byte offset
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Returns `true` if there is unread text left.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.text.len()
    }

    /// The unread remainder of the text
    #[must_use]
    pub fn rest(&self) -> &'a str {
        &self.text[self.position..]
    }

    /// The character at the current position, or [`END_OF_INPUT`].
    #[must_use]
    pub fn peek(&self) -> char {
        self.rest().chars().next().unwrap_or(END_OF_INPUT)
    }

    /// The character at an absolute offset, or [`END_OF_INPUT`].
    #[must_use]
    pub fn char_at(&self, pos: usize) -> char {
        self.text
            .get(pos..)
            .and_then(|tail| tail.chars().next())
            .unwrap_or(END_OF_INPUT)
    }

    /// Move the cursor to an absolute offset.
    ///
    /// Seeking to the very end of the text is allowed.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `pos` is past the end or not on a character boundary.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.text.len() || !self.text.is_char_boundary(pos) {
            return Err(malformed_error!(
                "Offset {} is outside of '{}'",
                pos,
                self.text
            ));
        }

        self.position = pos;
        Ok(())
    }

    /// Move the cursor forward by one character.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the cursor is already at the end.
    pub fn advance(&mut self) -> Result<()> {
        match self.rest().chars().next() {
            Some(current) => self.seek(self.position + current.len_utf8()),
            None => Err(malformed_error!("Unexpected end of '{}'", self.text)),
        }
    }

    /// Consume `token` if the remainder starts with it.
    pub fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.position += token.len();
            true
        } else {
            false
        }
    }

    /// Skip any spaces at the current position.
    pub fn skip_spaces(&mut self) {
        while self.peek() == ' ' {
            self.position += 1;
        }
    }

    /// Absolute offset of the next occurrence of any of `candidates`, starting at the cursor.
    #[must_use]
    pub fn find_any(&self, candidates: &[char]) -> Option<usize> {
        self.rest()
            .find(|c: char| candidates.contains(&c))
            .map(|offset| self.position + offset)
    }

    /// Like [`Cursor::find_any`], but a missing delimiter fails the parse.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if none of `candidates` occurs in the remainder.
    pub fn expect_any(&self, candidates: &[char]) -> Result<usize> {
        self.find_any(candidates).ok_or_else(|| {
            malformed_error!(
                "Expected one of {:?} after offset {} in '{}'",
                candidates,
                self.position,
                self.text
            )
        })
    }

    /// The declaration `!N` back-references resolve against.
    #[must_use]
    pub fn containing(&self) -> Option<&'a TypeName> {
        self.containing
    }

    /// The generic type whose argument list is being parsed right now.
    #[must_use]
    pub fn in_progress(&self) -> Option<&TypeName> {
        self.in_progress.as_ref()
    }

    /// Install a new in-progress scope and return the previous one, so callers can restore it.
    pub fn swap_in_progress(&mut self, scope: Option<TypeName>) -> Option<TypeName> {
        std::mem::replace(&mut self.in_progress, scope)
    }
}
