use std::fmt::{Display, Formatter};

use crate::error::Error;
use crate::event::StartElement;
use crate::name::Attribute;
use crate::namespace::NamespaceScope;

/// The path of open elements, as prefixed names.
///
/// ```rust
/// use xmltransform::{Attribute, Name, StartElement, XmlPath, XMLNS_NAMESPACE};
///
/// let mut path = XmlPath::new();
/// path.push(&StartElement::new(
///     Name::new("urn:atom", "feed"),
///     vec![Attribute::new(Name::new(XMLNS_NAMESPACE, "atom"), "urn:atom")],
/// ));
/// path.push(&StartElement::new(Name::local("entry"), vec![]));
/// assert_eq!(path.to_string(), "/atom:feed/entry");
/// assert_eq!(path.peek(), "entry");
/// ```
#[derive(Debug, Default)]
pub struct XmlPath {
    namespaces: NamespaceScope,
    steps: Vec<String>,
}

impl XmlPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter an element.
    pub fn push(&mut self, element: &StartElement) {
        self.namespaces.push(element);
        let prefix = self.namespaces.prefix(&element.name.namespace);
        let step = if prefix.is_empty() {
            element.name.local.to_string()
        } else {
            format!("{}:{}", prefix, element.name.local)
        };
        self.steps.push(step);
    }

    /// Leave the current element. Does nothing at the root.
    pub fn pop(&mut self) {
        if self.steps.pop().is_some() {
            self.namespaces.pop();
        }
    }

    /// The current step, or `/` at the root.
    pub fn peek(&self) -> &str {
        self.steps.last().map_or("/", String::as_str)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// See [`NamespaceScope::check`].
    pub fn check(&self, element: &StartElement) -> Result<(), Error> {
        self.namespaces.check(element)
    }

    /// See [`NamespaceScope::in_scope_xmlns`].
    pub fn in_scope_xmlns(&self) -> Vec<Attribute<'static>> {
        self.namespaces.in_scope_xmlns()
    }

    /// See [`NamespaceScope::prefix`].
    pub fn prefix(&self, uri: &str) -> &str {
        self.namespaces.prefix(uri)
    }
}

impl Display for XmlPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.steps.is_empty() {
            return f.write_str("/");
        }
        for step in &self.steps {
            write!(f, "/{}", step)?;
        }
        Ok(())
    }
}
