use std::borrow::Cow;

use crate::error::ParseError;
use crate::escape::is_in_character_range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Text,
    Attribute,
}

/// Decode references in character data and normalize line ends.
pub(crate) fn parse_text(content: &str, position: usize) -> Result<Cow<str>, ParseError> {
    parse_entities(content, position, Context::Text)
}

/// Decode references in an attribute value and normalize literal
/// whitespace to spaces.
pub(crate) fn parse_attribute(content: &str, position: usize) -> Result<Cow<str>, ParseError> {
    parse_entities(content, position, Context::Attribute)
}

/// Normalize `\r\n` and lone `\r` to `\n`, leaving references alone. Used for
/// CDATA sections.
pub(crate) fn normalize_line_ends(content: &str) -> Cow<str> {
    if !content.contains('\r') {
        return Cow::Borrowed(content);
    }
    Cow::Owned(content.replace("\r\n", "\n").replace('\r', "\n"))
}

fn parse_entities(
    content: &str,
    position: usize,
    context: Context,
) -> Result<Cow<str>, ParseError> {
    let needs_work = |c: char| {
        c == '&' || c == '\r' || (context == Context::Attribute && (c == '\t' || c == '\n'))
    };
    if !content.contains(needs_work) {
        return Ok(Cow::Borrowed(content));
    }

    let mut result = String::with_capacity(content.len());
    let mut chars = content.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '&' => {
                let rest = &content[i + 1..];
                let Some(end) = rest.find(';') else {
                    return Err(ParseError::UnclosedEntity(rest.to_string(), position + i));
                };
                let entity = &rest[..end];
                let resolved = resolve_entity(entity)
                    .ok_or_else(|| ParseError::InvalidEntity(entity.to_string(), position + i))?;
                result.push(resolved);
                // skip past the ';'
                let after = i + 1 + end;
                while chars.next_if(|(j, _)| *j <= after).is_some() {}
            }
            '\r' => {
                chars.next_if(|(_, c)| *c == '\n');
                result.push(if context == Context::Attribute {
                    ' '
                } else {
                    '\n'
                });
            }
            '\t' | '\n' if context == Context::Attribute => result.push(' '),
            c => result.push(c),
        }
    }
    Ok(Cow::Owned(result))
}

fn resolve_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "apos" => Some('\''),
        "gt" => Some('>'),
        "lt" => Some('<'),
        "quot" => Some('"'),
        _ => {
            let reference = entity.strip_prefix('#')?;
            let code = match reference.strip_prefix('x') {
                Some(hex) if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) => {
                    u32::from_str_radix(hex, 16).ok()?
                }
                None if !reference.is_empty() && reference.bytes().all(|b| b.is_ascii_digit()) => {
                    reference.parse().ok()?
                }
                _ => return None,
            };
            char::from_u32(code).filter(|c| is_in_character_range(*c))
        }
    }
}
