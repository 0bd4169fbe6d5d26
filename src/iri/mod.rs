//! Generic IRI parsing, resolution and serialization, following RFC 3986.
//!
//! Components are stored as they were written. Percent-escapes are
//! validated when parsing and normalized when serializing.
mod percent;

pub use percent::{escape, unescape, Encoding, EscapeError};

use crate::error::Error;
use percent::normalize;

/// A parsed IRI or IRI reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Iri {
    scheme: String,
    user_info: Option<String>,
    // present whenever the authority is, even if empty (`file:///`)
    host: Option<String>,
    path: String,
    query: Option<String>,
    fragment: Option<String>,
}

fn is_scheme(s: &str) -> bool {
    let mut bytes = s.bytes();
    matches!(bytes.next(), Some(c) if c.is_ascii_alphabetic())
        && bytes.all(|c| c.is_ascii_alphanumeric() || matches!(c, b'+' | b'-' | b'.'))
}

fn valid_host(host: &str) -> bool {
    if host
        .chars()
        .any(|c| c.is_whitespace() || "<>\"{}|\\^`".contains(c))
    {
        return false;
    }
    // the port, if any, comes after a bracketed IPv6 literal
    let port_start = if host.starts_with('[') {
        match host.find(']') {
            Some(end) => end + 1,
            None => return false,
        }
    } else {
        0
    };
    let rest = &host[port_start..];
    match rest.rfind(':') {
        Some(colon) => {
            (port_start == 0 || colon == 0) && rest[colon + 1..].bytes().all(|c| c.is_ascii_digit())
        }
        None => port_start == 0 || rest.is_empty(),
    }
}

impl Iri {
    /// Parse an IRI reference, absolute or relative.
    pub fn parse(raw: &str) -> Result<Iri, Error> {
        if raw.chars().any(|c| c < ' ' || c == '\x7f') {
            return Err(Error::malformed_iri(raw, "invalid control character"));
        }
        let mut iri = Iri::default();

        let (rest, fragment) = match raw.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment)),
            None => (raw, None),
        };
        iri.fragment = fragment.map(str::to_string);
        let (mut rest, query) = match rest.split_once('?') {
            Some((rest, query)) => (rest, Some(query)),
            None => (rest, None),
        };
        iri.query = query.map(str::to_string);

        let scheme_end = rest
            .find([':', '/'])
            .filter(|i| rest.as_bytes()[*i] == b':');
        if let Some(colon) = scheme_end {
            if colon == 0 {
                return Err(Error::malformed_iri(raw, "missing protocol scheme"));
            }
            if is_scheme(&rest[..colon]) {
                iri.scheme = rest[..colon].to_ascii_lowercase();
                rest = &rest[colon + 1..];
            }
        }

        if let Some(after) = rest.strip_prefix("//") {
            let end = after.find('/').unwrap_or(after.len());
            let authority = &after[..end];
            let host = match authority.rsplit_once('@') {
                Some((user_info, host)) => {
                    unescape(user_info, Encoding::UserPassword)
                        .map_err(|_| Error::malformed_iri(raw, "invalid escape in user info"))?;
                    iri.user_info = Some(user_info.to_string());
                    host
                }
                None => authority,
            };
            if !valid_host(host) {
                return Err(Error::malformed_iri(raw, "invalid host or port"));
            }
            iri.host = Some(host.to_string());
            rest = &after[end..];
        } else if iri.scheme.is_empty() {
            let first_segment = rest.split('/').next().unwrap_or("");
            if first_segment.contains(':') {
                return Err(Error::malformed_iri(
                    raw,
                    "first path segment in URL cannot contain colon",
                ));
            }
        }

        unescape(rest, Encoding::Path)
            .map_err(|_| Error::malformed_iri(raw, "invalid escape in path"))?;
        iri.path = rest.to_string();
        Ok(iri)
    }

    /// An IRI is absolute if it has a scheme.
    pub fn is_absolute(&self) -> bool {
        !self.scheme.is_empty()
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn user_info(&self) -> Option<&str> {
        self.user_info.as_deref()
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    fn has_authority(&self) -> bool {
        self.host.is_some()
    }

    // a reference that at most carries a fragment points at the current document
    fn is_same_document(&self) -> bool {
        self.scheme.is_empty()
            && !self.has_authority()
            && self.path.is_empty()
            && self.query.as_deref().unwrap_or("").is_empty()
    }

    /// Resolve `reference` against this IRI as base, per RFC 3986 section
    /// 5.2.2.
    ///
    /// A reference that only carries a fragment (or nothing at all) resolves
    /// to the base itself, fragment included.
    pub fn resolve_reference(&self, reference: &Iri) -> Iri {
        if reference.is_same_document() {
            return self.clone();
        }
        let mut target = Iri {
            fragment: reference.fragment.clone(),
            ..Iri::default()
        };
        if reference.is_absolute() {
            target.scheme = reference.scheme.clone();
            target.user_info = reference.user_info.clone();
            target.host = reference.host.clone();
            target.path = remove_dot_segments(&reference.path);
            target.query = reference.query.clone();
            return target;
        }
        target.scheme = self.scheme.clone();
        if reference.has_authority() {
            target.user_info = reference.user_info.clone();
            target.host = reference.host.clone();
            target.path = remove_dot_segments(&reference.path);
            target.query = reference.query.clone();
            return target;
        }
        target.user_info = self.user_info.clone();
        target.host = self.host.clone();
        if reference.path.is_empty() {
            target.path = self.path.clone();
            target.query = reference.query.clone().or_else(|| self.query.clone());
        } else {
            target.path = if reference.path.starts_with('/') {
                remove_dot_segments(&reference.path)
            } else {
                remove_dot_segments(&self.merge(&reference.path))
            };
            target.query = reference.query.clone();
        }
        target
    }

    // section 5.2.3
    fn merge(&self, path: &str) -> String {
        if self.has_authority() && self.path.is_empty() {
            return format!("/{}", path);
        }
        match self.path.rfind('/') {
            Some(slash) => format!("{}{}", &self.path[..=slash], path),
            None => path.to_string(),
        }
    }

    /// Reassemble the IRI into a string.
    ///
    /// The path and user info have their escaping normalized; the query and
    /// fragment are written as they are.
    pub fn serialize(&self) -> Result<String, Error> {
        let mut buf = String::with_capacity(self.path.len() + 32);
        if !self.scheme.is_empty() {
            buf.push_str(&self.scheme);
            buf.push(':');
        }
        if let Some(host) = &self.host {
            buf.push_str("//");
            if let Some(user_info) = &self.user_info {
                match user_info.split_once(':') {
                    Some((user, password)) => {
                        buf.push_str(&normalize(user, Encoding::UserPassword)?);
                        buf.push(':');
                        buf.push_str(&normalize(password, Encoding::UserPassword)?);
                    }
                    None => buf.push_str(&normalize(user_info, Encoding::UserPassword)?),
                }
                buf.push('@');
            }
            buf.push_str(host);
        }
        buf.push_str(&normalize(&self.path, Encoding::Path)?);
        if let Some(query) = &self.query {
            buf.push('?');
            buf.push_str(query);
        }
        if let Some(fragment) = &self.fragment {
            buf.push('#');
            buf.push_str(fragment);
        }
        Ok(buf)
    }
}

// section 5.2.4
fn remove_dot_segments(path: &str) -> String {
    let mut input = path;
    let mut output: Vec<&str> = Vec::new();
    while !input.is_empty() {
        if let Some(rest) = input.strip_prefix("../") {
            input = rest;
        } else if let Some(rest) = input.strip_prefix("./") {
            input = rest;
        } else if input.starts_with("/./") {
            input = &input[2..];
        } else if input == "/." {
            input = "/";
        } else if input.starts_with("/../") {
            input = &input[3..];
            output.pop();
        } else if input == "/.." {
            input = "/";
            output.pop();
        } else if input == "." || input == ".." {
            input = "";
        } else {
            // move the first segment, with its leading slash, to the output
            let start = usize::from(input.starts_with('/'));
            let end = input[start..]
                .find('/')
                .map(|i| i + start)
                .unwrap_or(input.len());
            output.push(&input[..end]);
            input = &input[end..];
        }
    }
    output.concat()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const BASE: &str = "http://a/b/c/d;p?q";

    fn resolve(base: &str, reference: &str) -> String {
        let base = Iri::parse(base).unwrap();
        let reference = Iri::parse(reference).unwrap();
        base.resolve_reference(&reference).serialize().unwrap()
    }

    // RFC 3986 section 5.4.1
    #[rstest]
    #[case("g:h", "g:h")]
    #[case("g", "http://a/b/c/g")]
    #[case("./g", "http://a/b/c/g")]
    #[case("g/", "http://a/b/c/g/")]
    #[case("/g", "http://a/g")]
    #[case("//g", "http://g")]
    #[case("?y", "http://a/b/c/d;p?y")]
    #[case("g?y", "http://a/b/c/g?y")]
    #[case("g#s", "http://a/b/c/g#s")]
    #[case("g?y#s", "http://a/b/c/g?y#s")]
    #[case(";x", "http://a/b/c/;x")]
    #[case("g;x", "http://a/b/c/g;x")]
    #[case("g;x?y#s", "http://a/b/c/g;x?y#s")]
    #[case("", "http://a/b/c/d;p?q")]
    #[case(".", "http://a/b/c/")]
    #[case("./", "http://a/b/c/")]
    #[case("..", "http://a/b/")]
    #[case("../", "http://a/b/")]
    #[case("../g", "http://a/b/g")]
    #[case("../..", "http://a/")]
    #[case("../../", "http://a/")]
    #[case("../../g", "http://a/g")]
    fn test_resolve_normal(#[case] reference: &str, #[case] expected: &str) {
        assert_eq!(resolve(BASE, reference), expected);
    }

    // RFC 3986 section 5.4.2
    #[rstest]
    #[case("../../../g", "http://a/g")]
    #[case("../../../../g", "http://a/g")]
    #[case("/./g", "http://a/g")]
    #[case("/../g", "http://a/g")]
    #[case("g.", "http://a/b/c/g.")]
    #[case(".g", "http://a/b/c/.g")]
    #[case("g..", "http://a/b/c/g..")]
    #[case("..g", "http://a/b/c/..g")]
    #[case("./../g", "http://a/b/g")]
    #[case("./g/.", "http://a/b/c/g/")]
    #[case("g/./h", "http://a/b/c/g/h")]
    #[case("g/../h", "http://a/b/c/h")]
    #[case("g;x=1/./y", "http://a/b/c/g;x=1/y")]
    #[case("g;x=1/../y", "http://a/b/c/y")]
    fn test_resolve_abnormal(#[case] reference: &str, #[case] expected: &str) {
        assert_eq!(resolve(BASE, reference), expected);
    }

    #[test]
    fn test_fragment_only_is_same_document() {
        // unlike plain RFC 3986, the base comes back untouched
        assert_eq!(resolve(BASE, "#s"), BASE);
        assert_eq!(
            resolve("http://example.org/doc#top", "#other"),
            "http://example.org/doc#top"
        );
    }

    #[test]
    fn test_parse_components() {
        let iri = Iri::parse("http://user:pw@example.org:8080/a/b?x=1#frag").unwrap();
        assert_eq!(iri.scheme(), "http");
        assert_eq!(iri.user_info(), Some("user:pw"));
        assert_eq!(iri.host(), Some("example.org:8080"));
        assert_eq!(iri.path(), "/a/b");
        assert_eq!(iri.query(), Some("x=1"));
        assert_eq!(iri.fragment(), Some("frag"));
        assert!(iri.is_absolute());
        assert_eq!(
            iri.serialize().unwrap(),
            "http://user:pw@example.org:8080/a/b?x=1#frag"
        );
    }

    #[rstest]
    #[case("")]
    #[case("b/")]
    #[case("rosé")]
    #[case("/pnas/109/1/1.full.html")]
    #[case("mailto:joe@example.org")]
    #[case("urn:isbn:0451450523")]
    #[case("file:///etc/hosts")]
    #[case("http://[::1]:80/")]
    #[case("http://www.example.org/~Dürst/")]
    fn test_parse_serialize_unchanged(#[case] raw: &str) {
        assert_eq!(Iri::parse(raw).unwrap().serialize().unwrap(), raw);
    }

    #[test]
    fn test_scheme_is_lowercased() {
        let iri = Iri::parse("HTTP://example.org/").unwrap();
        assert_eq!(iri.serialize().unwrap(), "http://example.org/");
    }

    #[test]
    fn test_relative() {
        let iri = Iri::parse("../a?b").unwrap();
        assert!(!iri.is_absolute());
        assert_eq!(iri.path(), "../a");
    }

    #[rstest]
    #[case("example.org")]
    #[case("a")]
    #[case("example.org:8080")]
    #[case("example.org:")]
    #[case("[::1]")]
    #[case("[::1]:80")]
    #[case("")]
    fn test_valid_host(#[case] host: &str) {
        assert!(valid_host(host));
        let iri = Iri::parse(&format!("http://{}/x", host)).unwrap();
        assert_eq!(iri.serialize().unwrap(), format!("http://{}/x", host));
    }

    #[rstest]
    #[case("[::1")]
    #[case("[::1]x")]
    #[case("[::1]x:80")]
    #[case("exa mple.org")]
    fn test_invalid_host(#[case] host: &str) {
        assert!(!valid_host(host));
    }

    #[rstest]
    #[case(":foo")]
    #[case("1a:b")]
    #[case("http://exa mple.org/")]
    #[case("http://example.org:8o/")]
    #[case("http://example.org/%zz")]
    #[case("a\nb")]
    fn test_malformed(#[case] raw: &str) {
        assert!(matches!(
            Iri::parse(raw),
            Err(Error::MalformedIri { .. })
        ));
    }

    #[test]
    fn test_remove_dot_segments() {
        assert_eq!(remove_dot_segments("/a/b/c/./../../g"), "/a/g");
        assert_eq!(remove_dot_segments("mid/content=5/../6"), "mid/6");
    }
}
