//! The identity transform: writes the events it receives back out as XML.
//!
//! The output is equivalent to the input but not necessarily identical:
//! empty element tags are expanded, attribute values are always quoted with
//! `'`, and text is re-escaped.
use std::io::{self, BufWriter, Write};

use crate::base::XmlBase;
use crate::error::Error;
use crate::escape::{escape_node_value, NodeKind};
use crate::event::{EndElement, ProcInst, StartElement};
use crate::name::{Name, XMLNS_NAMESPACE, XML_NAMESPACE};
use crate::namespace::NamespaceScope;
use crate::transform::{Handler, Recovery};

/// Configuration of an [`IdentityTransform`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Parameters {
    /// The base IRI of the document, which may be empty.
    pub base_uri: String,
    /// Fail on element or attribute namespaces that have no prefix bound in
    /// scope, instead of writing the namespace URI in place of a prefix.
    pub check_namespaces: bool,
}

/// A [`Handler`] that re-serializes every event to a writer.
///
/// Output is buffered until [`Handler::flush`], which the dispatcher calls
/// once at the end of a traversal.
pub struct IdentityTransform<W: Write> {
    writer: BufWriter<W>,
    namespaces: NamespaceScope,
    base: XmlBase,
    check_namespaces: bool,
}

impl<W: Write> IdentityTransform<W> {
    /// Create an identity transform with an initial base IRI.
    pub fn new(writer: W, base_uri: &str) -> Result<Self, Error> {
        Self::with_parameters(
            writer,
            Parameters {
                base_uri: base_uri.to_string(),
                ..Default::default()
            },
        )
    }

    pub fn with_parameters(writer: W, parameters: Parameters) -> Result<Self, Error> {
        Ok(Self {
            writer: BufWriter::new(writer),
            namespaces: NamespaceScope::new(),
            base: XmlBase::new(&parameters.base_uri)?,
            check_namespaces: parameters.check_namespaces,
        })
    }

    /// The namespace bindings in scope at the current element.
    pub fn namespaces(&self) -> &NamespaceScope {
        &self.namespaces
    }

    /// The base IRI in effect at the current element.
    pub fn base(&self) -> &XmlBase {
        &self.base
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> Result<W, Error> {
        self.writer
            .into_inner()
            .map_err(|e| Error::Io(e.into_error()))
    }

    fn write_element_name(&mut self, name: &Name) -> io::Result<()> {
        let prefix = if name.namespace.is_empty() {
            Some("")
        } else {
            self.namespaces.element_prefix(&name.namespace)
        };
        write_name(&mut self.writer, prefix, name)
    }
}

fn write_name<W: Write>(w: &mut W, prefix: Option<&str>, name: &Name) -> io::Result<()> {
    match prefix {
        Some("") => {}
        Some(prefix) => write!(w, "{}:", prefix)?,
        // no prefix is bound; the namespace itself stands in for one
        None => write!(w, "{}:", name.namespace)?,
    }
    w.write_all(name.local.as_bytes())
}

impl<W: Write> Handler for IdentityTransform<W> {
    fn start_element(&mut self, element: &StartElement) -> Result<(), Error> {
        self.namespaces.push(element);
        self.base.push(element)?;
        if self.check_namespaces {
            self.namespaces.check(element)?;
        }

        self.writer.write_all(b"<")?;
        self.write_element_name(&element.name)?;
        for attribute in &element.attributes {
            self.writer.write_all(b" ")?;
            let name = &attribute.name;
            let prefix = match name.namespace.as_ref() {
                "" => Some(""),
                XML_NAMESPACE => Some("xml"),
                XMLNS_NAMESPACE => Some("xmlns"),
                namespace => self.namespaces.attribute_prefix(namespace),
            };
            write_name(&mut self.writer, prefix, name)?;
            self.writer.write_all(b"='")?;
            escape_node_value(&mut self.writer, &attribute.value, NodeKind::AttributeValue)?;
            self.writer.write_all(b"'")?;
        }
        self.writer.write_all(b">")?;
        Ok(())
    }

    fn end_element(&mut self, element: &EndElement) -> Result<(), Error> {
        self.writer.write_all(b"</")?;
        self.write_element_name(&element.name)?;
        self.writer.write_all(b">")?;
        self.base.pop();
        self.namespaces.pop();
        Ok(())
    }

    fn char_data(&mut self, text: &str) -> Result<(), Error> {
        escape_node_value(&mut self.writer, text, NodeKind::CharacterData)?;
        Ok(())
    }

    fn comment(&mut self, body: &str) -> Result<(), Error> {
        write!(self.writer, "<!--{}-->", body)?;
        Ok(())
    }

    fn directive(&mut self, body: &str) -> Result<(), Error> {
        write!(self.writer, "<!{}>", body)?;
        Ok(())
    }

    fn proc_inst(&mut self, proc_inst: &ProcInst) -> Result<(), Error> {
        write!(
            self.writer,
            "<?{} {}?>",
            proc_inst.target, proc_inst.instruction
        )?;
        Ok(())
    }

    fn error(&mut self, _error: &Error) -> Recovery {
        Recovery::Abort
    }

    fn flush(&mut self) -> Result<(), Error> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::Attribute;
    use crate::transform::transform;

    fn identity(xml: &str) -> String {
        let mut output = Vec::new();
        let mut handler = IdentityTransform::new(&mut output, "").unwrap();
        transform(xml, &mut handler).unwrap();
        drop(handler);
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_prefixes_kept() {
        assert_eq!(
            identity(r#"<a:a xmlns:a="urn:x"><a:b/></a:a>"#),
            "<a:a xmlns:a='urn:x'><a:b></a:b></a:a>"
        );
    }

    #[test]
    fn test_default_namespace() {
        assert_eq!(
            identity(r#"<a xmlns="urn:x" b="1"><c xml:lang="en"/></a>"#),
            "<a xmlns='urn:x' b='1'><c xml:lang='en'></c></a>"
        );
    }

    #[test]
    fn test_attribute_prefix_skips_default() {
        assert_eq!(
            identity(r#"<a xmlns="urn:x" xmlns:p="urn:x" p:b="1"/>"#),
            "<a xmlns='urn:x' xmlns:p='urn:x' p:b='1'></a>"
        );
    }

    #[test]
    fn test_escaping() {
        assert_eq!(
            identity("<a b=\"&quot;'&#9;&gt;\">&lt;&amp;&gt;\"'</a>"),
            "<a b='&#34;&#39;&#x9;>'>&lt;&amp;&gt;\"'</a>"
        );
    }

    #[test]
    fn test_misc() {
        assert_eq!(
            identity(r#"<?xml version="1.0"?><!DOCTYPE a><a><!-- c --><?pi data?></a>"#),
            r#"<?xml version="1.0"?><!DOCTYPE a><a><!-- c --><?pi data?></a>"#
        );
    }

    #[test]
    fn test_unbound_namespace_fallback() {
        let mut output = Vec::new();
        let mut handler = IdentityTransform::new(&mut output, "").unwrap();
        let element = StartElement::new(
            Name::new("urn:x", "a"),
            vec![Attribute::new(Name::new("urn:y", "b"), "1")],
        );
        handler.start_element(&element).unwrap();
        handler.end_element(&element.end()).unwrap();
        handler.flush().unwrap();
        drop(handler);
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "<urn:x:a urn:y:b='1'></urn:x:a>"
        );
    }

    #[test]
    fn test_check_namespaces() {
        let mut handler = IdentityTransform::with_parameters(
            Vec::new(),
            Parameters {
                check_namespaces: true,
                ..Default::default()
            },
        )
        .unwrap();
        let element = StartElement::new(Name::new("urn:x", "a"), vec![]);
        let err = handler.start_element(&element).unwrap_err();
        assert!(matches!(err, Error::UnmappedNamespace(uri) if uri == "urn:x"));
        // the element was still entered
        assert_eq!(handler.namespaces().depth(), 1);
        assert_eq!(handler.base().depth(), 1);
    }

    #[test]
    fn test_trackers_follow_document() {
        let mut handler = IdentityTransform::new(Vec::new(), "http://example.org/").unwrap();
        let element = StartElement::new(
            Name::local("a"),
            vec![
                Attribute::new(Name::new(XMLNS_NAMESPACE, "p"), "urn:p"),
                Attribute::new(Name::new(XML_NAMESPACE, "base"), "sub/"),
            ],
        );
        handler.start_element(&element).unwrap();
        assert_eq!(handler.namespaces().prefix("urn:p"), "p");
        assert_eq!(
            handler.base().resolve("x").unwrap(),
            "http://example.org/sub/x"
        );
        handler.end_element(&element.end()).unwrap();
        assert_eq!(handler.namespaces().prefix("urn:p"), "");
        assert_eq!(handler.base().resolve("x").unwrap(), "http://example.org/x");
        let output = handler.into_inner().unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "<a xmlns:p='urn:p' xml:base='sub/'></a>"
        );
    }

    #[test]
    fn test_malformed_base_uri() {
        assert!(matches!(
            IdentityTransform::new(Vec::new(), ":nope"),
            Err(Error::MalformedIri { .. })
        ));
    }
}
