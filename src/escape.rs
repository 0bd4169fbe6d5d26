//! Re-encoding of text for output.
//!
//! Attribute values and character data have different escaping rules. In
//! both cases characters outside the XML `Char` production are replaced by
//! U+FFFD rather than written raw.
use std::borrow::Cow;
use std::io;

/// Which escaping policy to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Quotes, `&`, `<` and the whitespace characters TAB, LF and CR are
    /// escaped. `>` is left alone.
    AttributeValue,
    /// Only `&`, `<`, `>` and CR are escaped.
    CharacterData,
}

// numeric references are shorter than &quot; and &apos;
const ESC_QUOT: &str = "&#34;";
const ESC_APOS: &str = "&#39;";
const ESC_AMP: &str = "&amp;";
const ESC_LT: &str = "&lt;";
const ESC_GT: &str = "&gt;";
const ESC_TAB: &str = "&#x9;";
const ESC_NL: &str = "&#xA;";
const ESC_CR: &str = "&#xD;";
const ESC_FFFD: &str = "\u{FFFD}";

/// Whether `c` is allowed by the `Char` production of XML 1.0, section 2.2.
///
/// Surrogate code points are excluded, although a Rust `char` can never
/// hold one.
#[inline]
pub fn is_in_character_range(c: char) -> bool {
    matches!(c,
        '\u{9}' | '\u{A}' | '\u{D}'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

#[inline]
fn replacement(c: char, kind: NodeKind) -> Option<&'static str> {
    let esc = match (kind, c) {
        (NodeKind::AttributeValue, '"') => ESC_QUOT,
        (NodeKind::AttributeValue, '\'') => ESC_APOS,
        (NodeKind::AttributeValue, '\t') => ESC_TAB,
        (NodeKind::AttributeValue, '\n') => ESC_NL,
        (NodeKind::CharacterData, '>') => ESC_GT,
        (_, '&') => ESC_AMP,
        (_, '<') => ESC_LT,
        (_, '\r') => ESC_CR,
        (_, c) if !is_in_character_range(c) => ESC_FFFD,
        _ => return None,
    };
    Some(esc)
}

/// Write the escaped form of `s` to `w`.
///
/// Runs of characters that need no escaping are written in one piece.
pub fn escape_node_value<W: io::Write + ?Sized>(
    w: &mut W,
    s: &str,
    kind: NodeKind,
) -> io::Result<()> {
    let mut last = 0;
    for (i, c) in s.char_indices() {
        if let Some(esc) = replacement(c, kind) {
            w.write_all(s[last..i].as_bytes())?;
            w.write_all(esc.as_bytes())?;
            last = i + c.len_utf8();
        }
    }
    w.write_all(s[last..].as_bytes())
}

/// The escaped form of `s`, borrowed if nothing needed escaping.
pub fn escape_to_string(s: &str, kind: NodeKind) -> Cow<str> {
    let first = s.char_indices().find(|(_, c)| replacement(*c, kind).is_some());
    let Some((start, _)) = first else {
        return Cow::Borrowed(s);
    };
    let mut result = String::with_capacity(s.len() + 8);
    result.push_str(&s[..start]);
    for c in s[start..].chars() {
        match replacement(c, kind) {
            Some(esc) => result.push_str(esc),
            None => result.push(c),
        }
    }
    Cow::Owned(result)
}
