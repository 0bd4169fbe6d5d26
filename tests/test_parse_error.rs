use xmltransform::{transform, Error, IdentityTransform, ParseError, Reader};

fn first_error(xml: &str) -> Error {
    Reader::new(xml)
        .find_map(Result::err)
        .expect("input should be rejected")
}

#[test]
fn test_parse_invalid_close_tag() {
    let err = first_error(r#"<doc></a></doc>"#);
    assert!(matches!(
        err,
        Error::MalformedInput(ParseError::InvalidCloseTag(..))
    ));
    assert_eq!(err.parse_error().and_then(ParseError::position), Some(5));
}

#[test]
fn test_parse_invalid_close_tag_prefix() {
    let err = first_error(r#"<doc xmlns:a="http://example.com"></a:doc></doc>"#);
    match err {
        Error::MalformedInput(ParseError::InvalidCloseTag(expected, actual, position)) => {
            assert_eq!(expected, "doc");
            assert_eq!(actual, "a:doc");
            assert_eq!(position, 34);
        }
        _ => unreachable!(),
    }
}

#[test]
fn test_unknown_prefix() {
    let err = first_error(r#"<doc><a:p/></doc>"#);
    assert!(matches!(
        err,
        Error::MalformedInput(ParseError::UnknownPrefix(prefix, 5)) if prefix == "a"
    ));
}

#[test]
fn test_unknown_attribute_prefix() {
    let err = first_error(r#"<doc a:b="c"/>"#);
    assert!(matches!(
        err,
        Error::MalformedInput(ParseError::UnknownPrefix(prefix, 5)) if prefix == "a"
    ));
}

#[test]
fn test_xmlparser_error() {
    let err = first_error(r#"<doc><"#);
    assert!(matches!(err, Error::MalformedInput(ParseError::Parser(_))));
}

#[test]
fn test_unclosed_element() {
    let err = first_error(r#"<doc><a></a>"#);
    assert!(matches!(
        err,
        Error::MalformedInput(ParseError::UnclosedTag(name)) if name == "doc"
    ));
}

#[test]
fn test_invalid_entity() {
    let err = first_error(r#"<doc>&nbsp;</doc>"#);
    assert!(matches!(
        err,
        Error::MalformedInput(ParseError::InvalidEntity(entity, 5)) if entity == "nbsp"
    ));
}

#[test]
fn test_invalid_entity_in_attribute() {
    let err = first_error(r#"<doc a="&bogus;"/>"#);
    assert!(matches!(
        err,
        Error::MalformedInput(ParseError::InvalidEntity(entity, 8)) if entity == "bogus"
    ));
}

#[test]
fn test_error_display() {
    let err = first_error(r#"<doc></a></doc>"#);
    assert_eq!(
        err.to_string(),
        "XML syntax error: expected '</doc>', not '</a>' at 5"
    );
}

#[test]
fn test_partial_output_is_flushed() {
    let mut output = Vec::new();
    let mut handler = IdentityTransform::new(&mut output, "").unwrap();
    let err = transform("<doc><a>text</b></doc>", &mut handler).unwrap_err();
    assert!(matches!(
        err,
        Error::MalformedInput(ParseError::InvalidCloseTag(..))
    ));
    drop(handler);
    assert_eq!(String::from_utf8(output).unwrap(), "<doc><a>text");
}

#[test]
fn test_unclosed_tag() {
    let err = first_error(r#"<a><b></a>"#);
    assert!(matches!(
        err,
        Error::MalformedInput(ParseError::InvalidCloseTag(expected, actual, 6))
            if expected == "b" && actual == "a"
    ));
}

#[test]
fn test_unclosed_tag_at_end() {
    let err = first_error(r#"<a>"#);
    assert!(matches!(
        err,
        Error::MalformedInput(ParseError::UnclosedTag(name)) if name == "a"
    ));
}
