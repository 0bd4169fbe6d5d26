use std::borrow::Cow;

use crate::name::{Attribute, Name};

/// An element open tag, with its attributes in document order.
///
/// Namespace declarations are included as attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StartElement<'a> {
    pub name: Name<'a>,
    pub attributes: Vec<Attribute<'a>>,
}

impl<'a> StartElement<'a> {
    pub fn new(name: Name<'a>, attributes: Vec<Attribute<'a>>) -> Self {
        Self { name, attributes }
    }

    /// The value of the first attribute with this name.
    pub fn attribute(&self, namespace: &str, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attribute| attribute.name.is(namespace, local))
            .map(|attribute| attribute.value.as_ref())
    }

    /// The matching close tag.
    pub fn end(&self) -> EndElement<'a> {
        EndElement {
            name: self.name.clone(),
        }
    }
}

/// An element close tag.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EndElement<'a> {
    pub name: Name<'a>,
}

/// A processing instruction, `<?target instruction?>`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProcInst<'a> {
    pub target: Cow<'a, str>,
    pub instruction: Cow<'a, str>,
}

/// A structural event of an XML token stream, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Event<'a> {
    StartElement(StartElement<'a>),
    EndElement(EndElement<'a>),
    /// Character data with references already decoded.
    CharData(Cow<'a, str>),
    /// The body of `<!--...-->`.
    Comment(Cow<'a, str>),
    /// The body of `<!...>`, such as a DOCTYPE.
    Directive(Cow<'a, str>),
    ProcInst(ProcInst<'a>),
}

impl<'a> Event<'a> {
    /// A short name for the kind of event, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::StartElement(_) => "StartElement",
            Event::EndElement(_) => "EndElement",
            Event::CharData(_) => "CharData",
            Event::Comment(_) => "Comment",
            Event::Directive(_) => "Directive",
            Event::ProcInst(_) => "ProcInst",
        }
    }
}
