use std::borrow::Cow;
use std::fmt;

/// The URI component a string is escaped for. Each component has its own
/// set of reserved characters that may appear literally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Path,
    UserPassword,
    QueryComponent,
    Fragment,
}

/// A malformed `%XX` escape. Holds up to three characters starting at the
/// offending `%`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscapeError(String);

impl EscapeError {
    fn at(s: &str) -> Self {
        EscapeError(s.chars().take(3).collect())
    }

    /// The offending characters.
    pub fn sequence(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EscapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid URL escape {:?}", self.0)
    }
}

impl std::error::Error for EscapeError {}

const UPPER_HEX: &[u8; 16] = b"0123456789ABCDEF";

#[inline]
fn is_unreserved(c: u8) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, b'-' | b'_' | b'.' | b'~')
}

/// Whether `c` must be escaped when it appears in the given component,
/// according to RFC 3986.
pub(crate) fn should_escape(c: u8, mode: Encoding) -> bool {
    // §2.3 unreserved characters
    if is_unreserved(c) {
        return false;
    }
    match c {
        // §2.2 reserved characters
        b'$' | b'&' | b'+' | b',' | b'/' | b':' | b';' | b'=' | b'?' | b'@' => match mode {
            // §3.3: the path is handled as a whole, so only ? needs escaping
            Encoding::Path => c == b'?',
            // §3.2.1: : separates user and password
            Encoding::UserPassword => matches!(c, b'@' | b'/' | b':'),
            // §3.4
            Encoding::QueryComponent => true,
            // §4.1: the grammar allows everything
            Encoding::Fragment => false,
        },
        _ => true,
    }
}

#[inline]
fn unhex(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

// decode the escape starting at s[i], which is '%'
#[inline]
fn decode_at(s: &str, i: usize) -> Result<u8, EscapeError> {
    let bytes = s.as_bytes();
    let hi = bytes.get(i + 1).copied().and_then(unhex);
    let lo = bytes.get(i + 2).copied().and_then(unhex);
    match (hi, lo) {
        (Some(hi), Some(lo)) => Ok(hi << 4 | lo),
        _ => Err(EscapeError::at(&s[i..])),
    }
}

/// Decode `%XX` escapes. In query components `+` decodes to a space.
///
/// Decoded bytes that don't form valid UTF-8 are replaced by U+FFFD.
pub fn unescape(s: &str, mode: Encoding) -> Result<Cow<str>, EscapeError> {
    let bytes = s.as_bytes();
    let mut count = 0;
    let mut has_plus = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                decode_at(s, i)?;
                count += 1;
                i += 3;
            }
            b'+' => {
                has_plus |= mode == Encoding::QueryComponent;
                i += 1;
            }
            _ => i += 1,
        }
    }
    if count == 0 && !has_plus {
        return Ok(Cow::Borrowed(s));
    }

    let mut t = Vec::with_capacity(bytes.len() - 2 * count);
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                t.push(decode_at(s, i)?);
                i += 3;
            }
            b'+' if mode == Encoding::QueryComponent => {
                t.push(b' ');
                i += 1;
            }
            c => {
                t.push(c);
                i += 1;
            }
        }
    }
    Ok(match String::from_utf8(t) {
        Ok(decoded) => Cow::Owned(decoded),
        Err(e) => Cow::Owned(String::from_utf8_lossy(e.as_bytes()).into_owned()),
    })
}

/// Escape every byte that the component doesn't allow literally. In query
/// components a space becomes `+`.
pub fn escape(s: &str, mode: Encoding) -> Cow<str> {
    if !s.bytes().any(|c| should_escape(c, mode)) {
        return Cow::Borrowed(s);
    }
    let mut t = String::with_capacity(s.len() + 8);
    for c in s.bytes() {
        if c == b' ' && mode == Encoding::QueryComponent {
            t.push('+');
        } else if should_escape(c, mode) {
            push_escaped(&mut t, c);
        } else {
            t.push(c as char);
        }
    }
    Cow::Owned(t)
}

#[inline]
fn push_escaped(t: &mut String, c: u8) {
    t.push('%');
    t.push(UPPER_HEX[(c >> 4) as usize] as char);
    t.push(UPPER_HEX[(c & 15) as usize] as char);
}

/// Normalize the escaping of an IRI component: escapes of unreserved
/// characters are decoded, other escapes are upper-cased, and ASCII
/// characters the component doesn't allow are escaped. Non-ASCII
/// characters are kept as they are.
pub(crate) fn normalize(s: &str, mode: Encoding) -> Result<Cow<str>, EscapeError> {
    let needs_work = s
        .bytes()
        .any(|c| c == b'%' || (c.is_ascii() && should_escape(c, mode)));
    if !needs_work {
        return Ok(Cow::Borrowed(s));
    }
    let mut t = String::with_capacity(s.len() + 8);
    let mut chars = s.char_indices();
    while let Some((i, c)) = chars.next() {
        if c == '%' {
            let b = decode_at(s, i)?;
            if is_unreserved(b) {
                t.push(b as char);
            } else {
                push_escaped(&mut t, b);
            }
            // both hex digits are ASCII
            chars.next();
            chars.next();
        } else if c.is_ascii() && should_escape(c as u8, mode) {
            push_escaped(&mut t, c as u8);
        } else {
            t.push(c);
        }
    }
    Ok(Cow::Owned(t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", Encoding::Path, "")]
    #[case("abc", Encoding::Path, "abc")]
    #[case("1%41", Encoding::Path, "1A")]
    #[case("1%41%42%43", Encoding::Path, "1ABC")]
    #[case("%4a", Encoding::Path, "J")]
    #[case("%6F", Encoding::Path, "o")]
    #[case("a+b", Encoding::Path, "a+b")]
    #[case("a+b", Encoding::QueryComponent, "a b")]
    #[case("a%20b", Encoding::QueryComponent, "a b")]
    #[case("ros%C3%A9", Encoding::Path, "rosé")]
    fn test_unescape(#[case] input: &str, #[case] mode: Encoding, #[case] expected: &str) {
        assert_eq!(unescape(input, mode).unwrap(), expected);
    }

    #[rstest]
    #[case("%", "%")]
    #[case("%a", "%a")]
    #[case("%1", "%1")]
    #[case("123%45%6", "%6")]
    #[case("%zzzzz", "%zz")]
    fn test_unescape_error(#[case] input: &str, #[case] sequence: &str) {
        let err = unescape(input, Encoding::Path).unwrap_err();
        assert_eq!(err.sequence(), sequence);
    }

    #[rstest]
    #[case("", Encoding::Path, "")]
    #[case("abc", Encoding::Path, "abc")]
    #[case("one two", Encoding::QueryComponent, "one+two")]
    #[case("one two", Encoding::Path, "one%20two")]
    #[case("10%", Encoding::Path, "10%25")]
    #[case("a/b?c", Encoding::Path, "a/b%3Fc")]
    #[case("a/b?c", Encoding::QueryComponent, "a%2Fb%3Fc")]
    #[case("u@h:p", Encoding::UserPassword, "u%40h%3Ap")]
    #[case("a/b?c#d", Encoding::Fragment, "a/b?c%23d")]
    #[case("é", Encoding::Path, "%C3%A9")]
    fn test_escape(#[case] input: &str, #[case] mode: Encoding, #[case] expected: &str) {
        assert_eq!(escape(input, mode), expected);
    }

    #[test]
    fn test_escape_unescape_query() {
        let s = "a b&c=d/é";
        let escaped = escape(s, Encoding::QueryComponent);
        assert_eq!(unescape(&escaped, Encoding::QueryComponent).unwrap(), s);
    }

    #[rstest]
    #[case("/a/b", "/a/b")]
    #[case("/%7euser/", "/~user/")]
    #[case("/a%2fb", "/a%2Fb")]
    #[case("/a b", "/a%20b")]
    #[case("/~Dürst/", "/~Dürst/")]
    #[case("/x?y", "/x%3Fy")]
    fn test_normalize_path(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize(input, Encoding::Path).unwrap(), expected);
    }

    #[test]
    fn test_normalize_rejects_bad_escape() {
        let err = normalize("/a%g0", Encoding::Path).unwrap_err();
        assert_eq!(err.sequence(), "%g0");
    }
}
