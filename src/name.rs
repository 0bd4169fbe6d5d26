use std::borrow::Cow;
use std::fmt::{Display, Formatter};

/// The namespace bound to the reserved `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
/// The namespace of `xmlns:*` declaration attributes.
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

/// A qualified name: namespace URI plus local name.
///
/// An empty namespace means the name isn't in a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Name<'a> {
    pub namespace: Cow<'a, str>,
    pub local: Cow<'a, str>,
}

impl<'a> Name<'a> {
    /// Create a name in a namespace.
    pub fn new(namespace: impl Into<Cow<'a, str>>, local: impl Into<Cow<'a, str>>) -> Self {
        Self {
            namespace: namespace.into(),
            local: local.into(),
        }
    }

    /// Create a name that isn't in any namespace.
    pub fn local(local: impl Into<Cow<'a, str>>) -> Self {
        Self::new("", local)
    }

    pub(crate) fn is(&self, namespace: &str, local: &str) -> bool {
        self.namespace == namespace && self.local == local
    }

    /// Detach the name from the input it borrows from.
    pub fn into_owned(self) -> Name<'static> {
        Name {
            namespace: Cow::Owned(self.namespace.into_owned()),
            local: Cow::Owned(self.local.into_owned()),
        }
    }
}

impl<'a> Display for Name<'a> {
    // Clark notation, `{namespace}local`
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.local)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.local)
        }
    }
}

/// An attribute of a start tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attribute<'a> {
    pub name: Name<'a>,
    pub value: Cow<'a, str>,
}

impl<'a> Attribute<'a> {
    pub fn new(name: Name<'a>, value: impl Into<Cow<'a, str>>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }

    /// Namespace declarations, either `xmlns="..."` or `xmlns:p="..."`.
    ///
    /// Returns the declared prefix (empty for the default namespace).
    pub fn declared_prefix(&self) -> Option<&str> {
        if self.name.namespace == XMLNS_NAMESPACE {
            Some(&self.name.local)
        } else if self.name.is("", "xmlns") {
            Some("")
        } else {
            None
        }
    }

    pub fn into_owned(self) -> Attribute<'static> {
        Attribute {
            name: self.name.into_owned(),
            value: Cow::Owned(self.value.into_owned()),
        }
    }
}
