use std::io::{self, Write};

use xmltransform::{
    transform, transform_bytes, Dispatcher, Error, IdentityTransform, Parameters, ParseError,
    Reader, State,
};

// a sink that records writes and counts flushes
#[derive(Debug, Default)]
struct Sink {
    written: Vec<u8>,
    flushes: usize,
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushes += 1;
        Ok(())
    }
}

#[test]
fn test_flushed_once_on_done() {
    let mut sink = Sink::default();
    let mut handler = IdentityTransform::new(&mut sink, "").unwrap();
    transform("<a><b/></a>", &mut handler).unwrap();
    drop(handler);
    assert_eq!(sink.flushes, 1);
    assert_eq!(sink.written, b"<a><b></b></a>");
}

#[test]
fn test_flushed_once_on_abort() {
    let mut sink = Sink::default();
    let handler = IdentityTransform::new(&mut sink, "").unwrap();
    let mut dispatcher = Dispatcher::new(Reader::new("<a><b></a>"), handler);
    let err = dispatcher.run().unwrap_err();
    assert!(matches!(
        err,
        Error::MalformedInput(ParseError::InvalidCloseTag(..))
    ));
    assert_eq!(dispatcher.state(), State::Aborted);
    drop(dispatcher);
    assert_eq!(sink.flushes, 1);
    assert_eq!(sink.written, b"<a><b>");
}

#[test]
fn test_abort_on_malformed_base() {
    let mut output = Vec::new();
    let mut handler = IdentityTransform::new(&mut output, "http://example.org/").unwrap();
    let err = transform(r#"<a><b xml:base="http://exa mple/"/></a>"#, &mut handler).unwrap_err();
    assert!(matches!(err, Error::MalformedIri { .. }));
    drop(handler);
    assert_eq!(output, b"<a>");
}

#[test]
fn test_check_namespaces_accepts_bound() {
    let mut output = Vec::new();
    let handler = IdentityTransform::with_parameters(
        &mut output,
        Parameters {
            check_namespaces: true,
            ..Default::default()
        },
    )
    .unwrap();
    transform(r#"<p:a xmlns:p="urn:p" p:b="1" xml:lang="en"/>"#, handler).unwrap();
    assert_eq!(
        String::from_utf8(output).unwrap(),
        "<p:a xmlns:p='urn:p' p:b='1' xml:lang='en'></p:a>"
    );
}

#[test]
fn test_transform_bytes_latin1() {
    let mut output = Vec::new();
    let handler = IdentityTransform::new(&mut output, "").unwrap();
    transform_bytes(
        b"<?xml version=\"1.0\" encoding=\"iso-8859-1\"?><a t=\"caf\xe9\">ros\xe9</a>",
        handler,
    )
    .unwrap();
    insta::assert_snapshot!(
        String::from_utf8(output).unwrap(),
        @r#"<?xml version="1.0" encoding="UTF-8"?><a t='café'>rosé</a>"#
    );
}

#[test]
fn test_transform_bytes_output_reads_back() {
    let mut output = Vec::new();
    let handler = IdentityTransform::new(&mut output, "").unwrap();
    transform_bytes(
        b"<?xml version=\"1.0\" encoding=\"iso-8859-1\"?><a>ros\xe9</a>",
        handler,
    )
    .unwrap();
    let mut again = Vec::new();
    let handler = IdentityTransform::new(&mut again, "").unwrap();
    transform_bytes(&output, handler).unwrap();
    assert_eq!(again, output);
}
