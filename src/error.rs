use strum::Display;
use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! unsupported_error {
    ($msg:expr) => {
        crate::Error::Unsupported($msg.to_string())
    };

    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Unsupported(format!($fmt, $($arg)*))
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Two variants matter to the type-name parser: [`Error::Malformed`] for strings that violate the
/// grammar, and [`Error::Unsupported`] for strings that use a construct the parser recognises but
/// deliberately does not model. Callers that batch many names usually report the first kind and
/// silently drop the second, see [`Error::outcome`].
///
/// # Examples
///
/// ```rust
/// use refdump::{parse_type_name, Error, KnownTypes, ParseOutcome};
///
/// let table = KnownTypes::default();
/// let error = parse_type_name("app.Outer`1.Inner`1<app.A,app.B>", &table, None).unwrap_err();
/// assert_eq!(error.outcome(), ParseOutcome::Unsupported);
///
/// match parse_type_name("app.Foo`2<app.Bar>", &table, None) {
///     Ok(name) => println!("parsed {name}"),
///     Err(Error::Unsupported(_)) => {}
///     Err(error) => eprintln!("bad type name: {error}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The type name violates a structural expectation of the grammar.
    ///
    /// The error includes the source location where the malformation was detected for
    /// debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// The type name uses a construct that is recognised but not modeled.
    ///
    /// Compiler-generated closure types and generic types nested inside generic containers
    /// end up here. These are expected in real dumps and are not worth surfacing.
    #[error("Unsupported - {0}")]
    Unsupported(String),

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// The dump document is not valid JSON or does not match the expected layout.
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),
}

/// Classification of a failed parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ParseOutcome {
    /// A recognised but intentionally unmodeled construct, skip the entry.
    #[strum(serialize = "unsupported")]
    Unsupported,
    /// A structural violation, record the original string for diagnostics.
    #[strum(serialize = "malformed")]
    Malformed,
}

impl Error {
    /// Classifies this error into the two outcomes callers distinguish.
    ///
    /// Everything that is not [`Error::Unsupported`] counts as malformed.
    #[must_use]
    pub fn outcome(&self) -> ParseOutcome {
        match self {
            Error::Unsupported(_) => ParseOutcome::Unsupported,
            _ => ParseOutcome::Malformed,
        }
    }

    /// Returns `true` if this error denotes an unmodeled construct rather than a real failure.
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        self.outcome() == ParseOutcome::Unsupported
    }
}
