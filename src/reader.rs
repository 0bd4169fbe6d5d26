//! A namespace-resolving token source on top of `xmlparser`.
use std::borrow::Cow;
use std::iter::FusedIterator;

use xmlparser::{ElementEnd, StrSpan, Token, Tokenizer};

use crate::entity::{normalize_line_ends, parse_attribute, parse_text};
use crate::error::{Error, ParseError};
use crate::event::{EndElement, Event, ProcInst, StartElement};
use crate::name::{Attribute, Name, XMLNS_NAMESPACE};
use crate::namespace::NamespaceScope;

struct PendingAttribute<'a> {
    prefix: &'a str,
    local: &'a str,
    value: Cow<'a, str>,
    position: usize,
}

struct PendingElement<'a> {
    prefix: &'a str,
    local: &'a str,
    position: usize,
    attributes: Vec<PendingAttribute<'a>>,
}

fn qname(prefix: &str, local: &str) -> String {
    if prefix.is_empty() {
        local.to_string()
    } else {
        format!("{}:{}", prefix, local)
    }
}

// the inside of `<!...>`
fn directive_body(markup: &str) -> &str {
    let markup = markup.strip_prefix("<!").unwrap_or(markup);
    markup.strip_suffix('>').unwrap_or(markup)
}

// the instruction of `<?xml ...?>`
fn declaration_body(markup: &str) -> &str {
    let markup = markup.strip_prefix("<?xml").unwrap_or(markup);
    markup.strip_suffix("?>").unwrap_or(markup).trim_start()
}

/// Reads XML text as a stream of [`Event`]s.
///
/// Element and attribute names come out with their namespace URIs resolved;
/// namespace declarations are reported as attributes too. Empty element tags
/// produce a start and an end event. The iterator ends at the end of input,
/// and stops for good after reporting an error.
///
/// ```rust
/// use xmltransform::{Event, Reader};
///
/// let mut reader = Reader::new(r#"<a:doc xmlns:a="urn:x"/>"#);
/// match reader.next() {
///     Some(Ok(Event::StartElement(element))) => {
///         assert_eq!(element.name.namespace, "urn:x");
///         assert_eq!(element.name.local, "doc");
///     }
///     _ => unreachable!(),
/// }
/// ```
pub struct Reader<'a> {
    text: &'a str,
    tokenizer: Tokenizer<'a>,
    namespaces: NamespaceScope,
    open: Vec<(&'a str, &'a str)>,
    pending: Option<PendingElement<'a>>,
    queued: Option<Event<'a>>,
    dtd_start: Option<usize>,
    done: bool,
}

impl<'a> Reader<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            tokenizer: Tokenizer::from(text),
            namespaces: NamespaceScope::new(),
            open: Vec::new(),
            pending: None,
            queued: None,
            dtd_start: None,
            done: false,
        }
    }

    fn next_event(&mut self) -> Result<Option<Event<'a>>, Error> {
        loop {
            let Some(token) = self.tokenizer.next() else {
                if let Some((prefix, local)) = self.open.last() {
                    return Err(ParseError::UnclosedTag(qname(prefix, local)).into());
                }
                return Ok(None);
            };
            let token = token?;
            // markup inside an internal subset is part of the doctype directive
            if self.dtd_start.is_some()
                && matches!(
                    token,
                    Token::Comment { .. } | Token::ProcessingInstruction { .. }
                )
            {
                continue;
            }
            let event = match token {
                Token::Declaration { span, .. } => Event::ProcInst(ProcInst {
                    target: Cow::Borrowed("xml"),
                    instruction: Cow::Borrowed(declaration_body(span.as_str())),
                }),
                Token::ProcessingInstruction {
                    target, content, ..
                } => Event::ProcInst(ProcInst {
                    target: Cow::Borrowed(target.as_str()),
                    instruction: Cow::Borrowed(content.map_or("", |content| content.as_str())),
                }),
                Token::Comment { text, .. } => Event::Comment(Cow::Borrowed(text.as_str())),
                Token::EmptyDtd { span, .. } => {
                    Event::Directive(Cow::Borrowed(directive_body(span.as_str())))
                }
                Token::DtdStart { span, .. } => {
                    self.dtd_start = Some(span.start());
                    continue;
                }
                Token::EntityDeclaration { .. } => continue,
                Token::DtdEnd { span } => {
                    let start = self.dtd_start.take().unwrap_or(span.start());
                    let markup = &self.text[start..span.end()];
                    Event::Directive(Cow::Borrowed(directive_body(markup)))
                }
                Token::ElementStart {
                    prefix,
                    local,
                    span,
                } => {
                    self.pending = Some(PendingElement {
                        prefix: prefix.as_str(),
                        local: local.as_str(),
                        position: span.start(),
                        attributes: Vec::new(),
                    });
                    continue;
                }
                Token::Attribute {
                    prefix,
                    local,
                    value,
                    span,
                } => {
                    self.attribute(prefix, local, value, span)?;
                    continue;
                }
                Token::ElementEnd { end, span } => match end {
                    ElementEnd::Open => {
                        let element = self.open_element()?;
                        Event::StartElement(element)
                    }
                    ElementEnd::Empty => {
                        let element = self.open_element()?;
                        self.open.pop();
                        self.namespaces.pop();
                        self.queued = Some(Event::EndElement(element.end()));
                        Event::StartElement(element)
                    }
                    ElementEnd::Close(prefix, local) => {
                        Event::EndElement(self.close_element(prefix, local, span)?)
                    }
                },
                Token::Text { text } => Event::CharData(parse_text(text.as_str(), text.start())?),
                Token::Cdata { text, .. } => Event::CharData(normalize_line_ends(text.as_str())),
            };
            return Ok(Some(event));
        }
    }

    fn attribute(
        &mut self,
        prefix: StrSpan<'a>,
        local: StrSpan<'a>,
        value: StrSpan<'a>,
        span: StrSpan<'a>,
    ) -> Result<(), Error> {
        let Some(pending) = self.pending.as_mut() else {
            return Err(Error::UnhandledEventKind("attribute outside of a start tag".into()));
        };
        pending.attributes.push(PendingAttribute {
            prefix: prefix.as_str(),
            local: local.as_str(),
            value: parse_attribute(value.as_str(), value.start())?,
            position: span.start(),
        });
        Ok(())
    }

    fn open_element(&mut self) -> Result<StartElement<'a>, Error> {
        let Some(pending) = self.pending.take() else {
            return Err(Error::UnhandledEventKind("end of a start tag that wasn't opened".into()));
        };

        // declarations are recognized by syntax alone; other namespaces are
        // resolved once the declarations are in scope
        let attributes = pending
            .attributes
            .iter()
            .map(|attribute| {
                let name = match (attribute.prefix, attribute.local) {
                    ("xmlns", local) => Name::new(XMLNS_NAMESPACE, local),
                    (_, local) => Name::local(local),
                };
                Attribute::new(name, attribute.value.clone())
            })
            .collect();
        let mut element = StartElement::new(Name::local(pending.local), attributes);
        self.namespaces.push(&element);
        self.open.push((pending.prefix, pending.local));

        element.name.namespace = self.element_namespace(pending.prefix, pending.position)?;
        for (attribute, raw) in element.attributes.iter_mut().zip(&pending.attributes) {
            if raw.prefix.is_empty() || raw.prefix == "xmlns" {
                continue;
            }
            let namespace = self
                .namespaces
                .namespace(raw.prefix)
                .ok_or_else(|| ParseError::UnknownPrefix(raw.prefix.to_string(), raw.position))?;
            attribute.name.namespace = Cow::Owned(namespace.to_string());
        }
        Ok(element)
    }

    fn element_namespace(&self, prefix: &str, position: usize) -> Result<Cow<'a, str>, Error> {
        match self.namespaces.namespace(prefix) {
            Some(namespace) => Ok(Cow::Owned(namespace.to_string())),
            None if prefix.is_empty() => Ok(Cow::Borrowed("")),
            None => Err(ParseError::UnknownPrefix(prefix.to_string(), position).into()),
        }
    }

    fn close_element(
        &mut self,
        prefix: StrSpan<'a>,
        local: StrSpan<'a>,
        span: StrSpan<'a>,
    ) -> Result<EndElement<'a>, Error> {
        let (prefix, local) = (prefix.as_str(), local.as_str());
        match self.open.last() {
            Some(&(open_prefix, open_local)) if open_prefix == prefix && open_local == local => {}
            Some(&(open_prefix, open_local)) => {
                return Err(ParseError::InvalidCloseTag(
                    qname(open_prefix, open_local),
                    qname(prefix, local),
                    span.start(),
                )
                .into())
            }
            None => {
                return Err(ParseError::InvalidCloseTag(
                    String::new(),
                    qname(prefix, local),
                    span.start(),
                )
                .into())
            }
        }
        let namespace = self.element_namespace(prefix, span.start())?;
        self.open.pop();
        self.namespaces.pop();
        Ok(EndElement {
            name: Name::new(namespace, local),
        })
    }
}

impl<'a> Iterator for Reader<'a> {
    type Item = Result<Event<'a>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(event) = self.queued.take() {
            return Some(Ok(event));
        }
        if self.done {
            return None;
        }
        match self.next_event() {
            Ok(Some(event)) => Some(Ok(event)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<'a> FusedIterator for Reader<'a> {}
