use std::borrow::Cow;

use encoding_rs::Encoding;
use xhtmlchardet::detect;

use crate::error::{Error, ParseError};

pub(crate) fn encoding(data: &[u8], hint: Option<String>) -> Option<&'static Encoding> {
    let mut cursor = std::io::Cursor::new(data);
    let charsets = detect(&mut cursor, hint).ok()?;
    // no encoding detected
    let label = if charsets.is_empty() {
        "UTF-8"
    } else {
        &charsets[0]
    };
    Encoding::for_label(label.as_bytes())
}

/// Decode XML bytes to text, sniffing the encoding from a byte order mark
/// or the XML declaration. Input without either is taken to be UTF-8.
///
/// The encoding declaration itself is left in the text as is.
pub fn decode(data: &[u8]) -> Result<Cow<str>, Error> {
    let encoding = encoding(data, None).unwrap_or(encoding_rs::UTF_8);
    let (text, actual, malformed) = encoding.decode(data);
    if malformed {
        return Err(ParseError::Encoding(actual.name().to_string()).into());
    }
    Ok(text)
}
