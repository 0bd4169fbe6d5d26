//! Tracking of namespace prefix bindings while streaming through a document.
//!
//! Call [`NamespaceScope::push`] for every element open event before
//! looking up prefixes for it, and [`NamespaceScope::pop`] for every element
//! close event after you're done with it.
use ahash::HashMap;
use tracing::trace;

use crate::error::Error;
use crate::event::StartElement;
use crate::name::{Attribute, Name, XMLNS_NAMESPACE, XML_NAMESPACE};

/// The merged view of all namespace bindings visible at a point in the
/// document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    // prefix to namespace; the empty prefix is the default namespace
    prefixes: HashMap<String, String>,
    // namespace to prefixes, closest declaration first
    uris: HashMap<String, Vec<String>>,
}

impl Scope {
    /// The namespace bound to `prefix`, if any.
    pub fn namespace(&self, prefix: &str) -> Option<&str> {
        self.prefixes
            .get(prefix)
            .map(String::as_str)
            .filter(|uri| !uri.is_empty())
    }

    /// All prefixes bound to `uri`. The first was declared closest to the
    /// current element.
    pub fn prefixes(&self, uri: &str) -> &[String] {
        self.uris.get(uri).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether any prefix is bound to `uri`.
    pub fn contains_namespace(&self, uri: &str) -> bool {
        self.uris.contains_key(uri)
    }

    /// The number of bound prefixes.
    pub fn len(&self) -> usize {
        self.prefixes.values().filter(|uri| !uri.is_empty()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Prefix and namespace pairs, sorted by prefix.
    pub fn bindings(&self) -> Vec<(&str, &str)> {
        let mut bindings: Vec<(&str, &str)> = self
            .prefixes
            .iter()
            .filter(|(_, uri)| !uri.is_empty())
            .map(|(prefix, uri)| (prefix.as_str(), uri.as_str()))
            .collect();
        bindings.sort_unstable();
        bindings
    }

    fn overlay(&self, declared: &[(String, String)]) -> Scope {
        let mut scope = self.clone();
        for (prefix, uri) in declared {
            if let Some(old) = scope.prefixes.insert(prefix.clone(), uri.clone()) {
                // the prefix no longer refers to the old namespace
                if let Some(prefixes) = scope.uris.get_mut(&old) {
                    prefixes.retain(|p| p != prefix);
                    if prefixes.is_empty() {
                        scope.uris.remove(&old);
                    }
                }
            }
        }
        for (prefix, uri) in declared.iter().rev() {
            if uri.is_empty() {
                continue;
            }
            scope
                .uris
                .entry(uri.clone())
                .or_default()
                .insert(0, prefix.clone());
        }
        scope
    }
}

#[derive(Debug)]
struct Frame {
    // declarations made by the element that opened this frame
    declared: Vec<(String, String)>,
    scope: Scope,
    // the number of open elements sharing this frame
    depth: usize,
}

/// A stack of namespace declarations.
///
/// A frame is only created for elements that declare namespaces; other
/// elements bump the depth of the current frame.
#[derive(Debug, Default)]
pub struct NamespaceScope {
    frames: Vec<Frame>,
}

impl NamespaceScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter an element, taking in its namespace declarations.
    pub fn push(&mut self, element: &StartElement) {
        let mut declared: Vec<(String, String)> = Vec::new();
        for attribute in &element.attributes {
            if let Some(prefix) = attribute.declared_prefix() {
                if !declared.iter().any(|(p, _)| p == prefix) {
                    declared.push((prefix.to_string(), attribute.value.to_string()));
                }
            }
        }

        if declared.is_empty() {
            match self.frames.last_mut() {
                Some(frame) => frame.depth += 1,
                None => self.frames.push(Frame {
                    declared,
                    scope: Scope::default(),
                    depth: 1,
                }),
            }
            return;
        }

        let scope = match self.frames.last() {
            Some(frame) => frame.scope.overlay(&declared),
            None => Scope::default().overlay(&declared),
        };
        trace!(element = %element.name, declared = declared.len(), "namespace frame pushed");
        self.frames.push(Frame {
            declared,
            scope,
            depth: 1,
        });
    }

    /// Leave the current element. Popping an empty stack does nothing.
    pub fn pop(&mut self) {
        let Some(frame) = self.frames.last_mut() else {
            return;
        };
        frame.depth = frame.depth.saturating_sub(1);
        if frame.depth == 0 {
            if let Some(frame) = self.frames.pop() {
                if !frame.declared.is_empty() {
                    trace!(declared = frame.declared.len(), "namespace frame popped");
                }
            }
        }
    }

    /// The bindings visible in the current element, if any element is open.
    pub fn in_scope(&self) -> Option<&Scope> {
        self.frames.last().map(|frame| &frame.scope)
    }

    /// The namespace bound to `prefix` in the current element.
    ///
    /// The `xml` prefix is always bound.
    pub fn namespace(&self, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(XML_NAMESPACE);
        }
        self.in_scope()?.namespace(prefix)
    }

    /// The prefix for `uri`: the first one declared on the closest element
    /// that binds it. Returns the empty string if `uri` isn't bound, or if
    /// it is the default namespace.
    pub fn prefix(&self, uri: &str) -> &str {
        self.element_prefix(uri).unwrap_or("")
    }

    /// The prefix to use for an element in `uri`. `Some("")` means the
    /// namespace is the default namespace.
    pub fn element_prefix(&self, uri: &str) -> Option<&str> {
        if uri == XML_NAMESPACE {
            return Some("xml");
        }
        self.in_scope()?
            .prefixes(uri)
            .first()
            .map(String::as_str)
    }

    /// The prefix to use for an attribute in `uri`. The default namespace
    /// doesn't apply to attributes, so this is never empty.
    pub fn attribute_prefix(&self, uri: &str) -> Option<&str> {
        if uri == XML_NAMESPACE {
            return Some("xml");
        }
        self.in_scope()?
            .prefixes(uri)
            .iter()
            .map(String::as_str)
            .find(|prefix| !prefix.is_empty())
    }

    /// Verify that the namespaces of an element and its attributes are all
    /// bound in the current scope. Call this after [`NamespaceScope::push`].
    pub fn check(&self, element: &StartElement) -> Result<(), Error> {
        let names = std::iter::once(&element.name)
            .chain(element.attributes.iter().map(|attribute| &attribute.name));
        for name in names {
            let namespace = name.namespace.as_ref();
            if namespace.is_empty() || namespace == XML_NAMESPACE || namespace == XMLNS_NAMESPACE
            {
                continue;
            }
            let bound = self
                .in_scope()
                .is_some_and(|scope| scope.contains_namespace(namespace));
            if !bound {
                return Err(Error::UnmappedNamespace(namespace.to_string()));
            }
        }
        Ok(())
    }

    /// The current bindings as `xmlns` attributes, so that a subtree can be
    /// serialized on its own.
    pub fn in_scope_xmlns(&self) -> Vec<Attribute<'static>> {
        let Some(scope) = self.in_scope() else {
            return Vec::new();
        };
        scope
            .bindings()
            .into_iter()
            .map(|(prefix, uri)| {
                let name = if prefix.is_empty() {
                    Name::local("xmlns")
                } else {
                    Name::new(XMLNS_NAMESPACE, prefix.to_string())
                };
                Attribute::new(name, uri.to_string())
            })
            .collect()
    }

    /// The number of open elements.
    pub fn depth(&self) -> usize {
        self.frames.iter().map(|frame| frame.depth).sum()
    }

    /// The number of frames: one per open element that declared
    /// namespaces, plus a root frame if the outermost element declared none.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}
