use std::fmt;

use crate::iri::EscapeError;

/// Well-formedness problems reported by the token source.
///
/// Positions are byte offsets into the input text.
#[derive(Debug)]
pub enum ParseError {
    /// The underlying tokenizer rejected the input.
    Parser(xmlparser::Error),
    /// A prefix was used that has no namespace declaration in scope.
    UnknownPrefix(String, usize),
    /// An entity reference without a terminating `;`.
    UnclosedEntity(String, usize),
    /// An entity reference that is neither predefined nor a valid
    /// character reference.
    InvalidEntity(String, usize),
    /// A close tag that doesn't match the open element: expected name,
    /// actual name, position.
    InvalidCloseTag(String, String, usize),
    /// The input ended while this element was still open.
    UnclosedTag(String),
    /// The input bytes could not be decoded as text.
    Encoding(String),
}

impl ParseError {
    /// The byte offset of the problem, if known.
    pub fn position(&self) -> Option<usize> {
        match self {
            ParseError::UnknownPrefix(_, pos)
            | ParseError::UnclosedEntity(_, pos)
            | ParseError::InvalidEntity(_, pos)
            | ParseError::InvalidCloseTag(_, _, pos) => Some(*pos),
            ParseError::Parser(_) | ParseError::UnclosedTag(_) | ParseError::Encoding(_) => None,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Parser(e) => write!(f, "{}", e),
            ParseError::UnknownPrefix(prefix, pos) => {
                write!(f, "unknown namespace prefix '{}' at {}", prefix, pos)
            }
            ParseError::UnclosedEntity(entity, pos) => {
                write!(f, "unclosed entity reference '&{}' at {}", entity, pos)
            }
            ParseError::InvalidEntity(entity, pos) => {
                write!(f, "invalid entity reference '&{};' at {}", entity, pos)
            }
            ParseError::InvalidCloseTag(expected, actual, pos) => {
                write!(f, "expected '</{}>', not '</{}>' at {}", expected, actual, pos)
            }
            ParseError::UnclosedTag(name) => write!(f, "unexpected end of input in <{}>", name),
            ParseError::Encoding(label) => write!(f, "cannot decode input as {}", label),
        }
    }
}

/// Errors raised while reading, tracking or writing XML.
#[derive(Debug)]
pub enum Error {
    /// The token source reported a syntax problem mid-stream.
    MalformedInput(ParseError),
    /// A string could not be parsed as an IRI.
    MalformedIri { iri: String, reason: &'static str },
    /// A percent-encoded reference contains an invalid `%XX` triple.
    Escape(EscapeError),
    /// Strict validation found a namespace with no bound prefix in scope.
    UnmappedNamespace(String),
    /// The dispatcher received an event it cannot route.
    UnhandledEventKind(String),
    /// The output sink failed.
    Io(std::io::Error),
}

impl Error {
    pub(crate) fn malformed_iri(iri: &str, reason: &'static str) -> Self {
        Error::MalformedIri {
            iri: iri.to_string(),
            reason,
        }
    }

    /// The parse error, if this is malformed input.
    pub fn parse_error(&self) -> Option<&ParseError> {
        match self {
            Error::MalformedInput(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MalformedInput(e) => write!(f, "XML syntax error: {}", e),
            Error::MalformedIri { iri, reason } => write!(f, "malformed IRI {:?}: {}", iri, reason),
            Error::Escape(e) => write!(f, "{}", e),
            Error::UnmappedNamespace(uri) => write!(f, "unmapped namespace prefix: {}", uri),
            Error::UnhandledEventKind(kind) => write!(f, "unhandled event kind: {}", kind),
            Error::Io(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::MalformedInput(ParseError::Parser(e)) => Some(e),
            Error::Escape(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParseError> for Error {
    #[inline]
    fn from(e: ParseError) -> Self {
        Error::MalformedInput(e)
    }
}

impl From<xmlparser::Error> for Error {
    #[inline]
    fn from(e: xmlparser::Error) -> Self {
        Error::MalformedInput(ParseError::Parser(e))
    }
}

impl From<EscapeError> for Error {
    #[inline]
    fn from(e: EscapeError) -> Self {
        Error::Escape(e)
    }
}

impl From<std::io::Error> for Error {
    #[inline]
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
