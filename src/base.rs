//! Tracking of the effective `xml:base` while streaming through a document.
//!
//! Call [`XmlBase::push`] for every element open event before resolving any
//! reference in it, and [`XmlBase::pop`] for every element close event after
//! you're done with the element.
use tracing::trace;

use crate::error::Error;
use crate::event::StartElement;
use crate::iri::Iri;
use crate::name::XML_NAMESPACE;

#[derive(Debug)]
struct BaseFrame {
    iri: Iri,
    // serialized form, to spot repeated identical bases
    serialized: String,
    depth: usize,
}

/// A stack of resolved base IRIs.
///
/// The initial base given at construction is never removed, so there is
/// always a base to resolve against.
#[derive(Debug)]
pub struct XmlBase {
    root: BaseFrame,
    frames: Vec<BaseFrame>,
}

impl XmlBase {
    /// Create a resolver with an initial base, which may be empty.
    pub fn new(base_uri: &str) -> Result<Self, Error> {
        let iri = Iri::parse(base_uri)?;
        let serialized = iri.serialize()?;
        Ok(Self {
            root: BaseFrame {
                iri,
                serialized,
                depth: 0,
            },
            frames: Vec::new(),
        })
    }

    fn top(&self) -> &BaseFrame {
        self.frames.last().unwrap_or(&self.root)
    }

    fn top_mut(&mut self) -> &mut BaseFrame {
        self.frames.last_mut().unwrap_or(&mut self.root)
    }

    /// Enter an element, taking in its `xml:base` attribute if it has one.
    ///
    /// The element is accounted for even if its `xml:base` turns out to be
    /// malformed, so the matching [`XmlBase::pop`] stays balanced.
    pub fn push(&mut self, element: &StartElement) -> Result<(), Error> {
        let Some(raw) = element.attribute(XML_NAMESPACE, "base") else {
            self.top_mut().depth += 1;
            return Ok(());
        };
        let frame = match self.resolve_frame(raw) {
            Ok(frame) => frame,
            Err(e) => {
                self.top_mut().depth += 1;
                return Err(e);
            }
        };
        if frame.serialized == self.top().serialized {
            self.top_mut().depth += 1;
            return Ok(());
        }
        trace!(base = %frame.serialized, "xml:base pushed");
        self.frames.push(frame);
        Ok(())
    }

    fn resolve_frame(&self, raw: &str) -> Result<BaseFrame, Error> {
        let mut iri = Iri::parse(raw)?;
        if !iri.is_absolute() {
            iri = self.top().iri.resolve_reference(&iri);
        }
        let serialized = iri.serialize()?;
        Ok(BaseFrame {
            iri,
            serialized,
            depth: 1,
        })
    }

    /// Leave the current element.
    pub fn pop(&mut self) {
        match self.frames.last_mut() {
            Some(frame) => {
                frame.depth -= 1;
                if frame.depth == 0 {
                    self.frames.pop();
                    trace!(base = %self.top().serialized, "xml:base popped");
                }
            }
            None => self.root.depth = self.root.depth.saturating_sub(1),
        }
    }

    /// Resolve a possibly relative reference against the current base.
    pub fn resolve(&self, reference: &str) -> Result<String, Error> {
        let iri = Iri::parse(reference)?;
        if iri.is_absolute() {
            return iri.serialize();
        }
        self.top().iri.resolve_reference(&iri).serialize()
    }

    /// The current base.
    pub fn url(&self) -> &Iri {
        &self.top().iri
    }

    /// The number of open elements.
    pub fn depth(&self) -> usize {
        self.root.depth + self.frames.iter().map(|frame| frame.depth).sum::<usize>()
    }
}
