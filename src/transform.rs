//! Driving a [`Handler`] with the events of a token source.
use tracing::{debug, warn};

use crate::encoding::decode;
use crate::error::Error;
use crate::event::{EndElement, Event, ProcInst, StartElement};
use crate::reader::Reader;

/// What to do after an error, as decided by [`Handler::error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Stop the traversal and report the error.
    Abort,
    /// Skip the failed event and go on with the next one.
    Continue,
}

/// The state of a [`Dispatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running,
    /// The end of the input was reached.
    Done,
    /// The handler chose to abort after an error.
    Aborted,
}

/// A consumer of dispatched events.
///
/// Every fallible step of a traversal, whether it fails in the token source
/// or in one of the event methods, is passed to [`Handler::error`], which
/// alone decides whether to go on. [`Handler::flush`] is called exactly
/// once, as the last call of a traversal.
pub trait Handler {
    fn start_element(&mut self, element: &StartElement) -> Result<(), Error>;
    fn end_element(&mut self, element: &EndElement) -> Result<(), Error>;
    fn char_data(&mut self, text: &str) -> Result<(), Error>;
    fn comment(&mut self, body: &str) -> Result<(), Error>;
    fn directive(&mut self, body: &str) -> Result<(), Error>;
    fn proc_inst(&mut self, proc_inst: &ProcInst) -> Result<(), Error>;
    fn error(&mut self, error: &Error) -> Recovery;
    fn flush(&mut self) -> Result<(), Error>;
}

impl<H: Handler + ?Sized> Handler for &mut H {
    fn start_element(&mut self, element: &StartElement) -> Result<(), Error> {
        (**self).start_element(element)
    }

    fn end_element(&mut self, element: &EndElement) -> Result<(), Error> {
        (**self).end_element(element)
    }

    fn char_data(&mut self, text: &str) -> Result<(), Error> {
        (**self).char_data(text)
    }

    fn comment(&mut self, body: &str) -> Result<(), Error> {
        (**self).comment(body)
    }

    fn directive(&mut self, body: &str) -> Result<(), Error> {
        (**self).directive(body)
    }

    fn proc_inst(&mut self, proc_inst: &ProcInst) -> Result<(), Error> {
        (**self).proc_inst(proc_inst)
    }

    fn error(&mut self, error: &Error) -> Recovery {
        (**self).error(error)
    }

    fn flush(&mut self) -> Result<(), Error> {
        (**self).flush()
    }
}

fn dispatch<H: Handler>(handler: &mut H, event: &Event) -> Result<(), Error> {
    match event {
        Event::StartElement(element) => handler.start_element(element),
        Event::EndElement(element) => handler.end_element(element),
        Event::CharData(text) => handler.char_data(text),
        Event::Comment(body) => handler.comment(body),
        Event::Directive(body) => handler.directive(body),
        Event::ProcInst(proc_inst) => handler.proc_inst(proc_inst),
    }
}

/// A single pass over a token source.
///
/// The source is any iterator of events, such as a [`Reader`]; `None` marks
/// the end of the input.
pub struct Dispatcher<S, H> {
    source: S,
    handler: H,
    state: State,
}

impl<'a, S, H> Dispatcher<S, H>
where
    S: Iterator<Item = Result<Event<'a>, Error>>,
    H: Handler,
{
    pub fn new(source: S, handler: H) -> Self {
        Self {
            source,
            handler,
            state: State::Running,
        }
    }

    /// Run the traversal to completion.
    ///
    /// On abort the error that caused it is returned; a failing flush at that
    /// point is only logged. Once the dispatcher has stopped, running it
    /// again does nothing.
    pub fn run(&mut self) -> Result<(), Error> {
        if self.state != State::Running {
            return Ok(());
        }
        debug!("transform started");
        while let Some(next) = self.source.next() {
            let result = next.and_then(|event| dispatch(&mut self.handler, &event));
            let Err(error) = result else {
                continue;
            };
            match self.handler.error(&error) {
                Recovery::Continue => warn!(%error, "continuing after error"),
                Recovery::Abort => {
                    self.state = State::Aborted;
                    debug!(%error, "transform aborted");
                    if let Err(flush_error) = self.handler.flush() {
                        warn!(error = %flush_error, "flush failed after abort");
                    }
                    return Err(error);
                }
            }
        }
        self.state = State::Done;
        debug!("transform done");
        self.handler.flush()
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn into_handler(self) -> H {
        self.handler
    }
}

/// Parse `text` and send its events to `handler`.
///
/// ```rust
/// use xmltransform::{transform, IdentityTransform};
///
/// let mut output = Vec::new();
/// let mut identity = IdentityTransform::new(&mut output, "").unwrap();
/// transform(r#"<a href="x">&amp;</a>"#, &mut identity).unwrap();
/// drop(identity);
/// assert_eq!(String::from_utf8(output).unwrap(), "<a href='x'>&amp;</a>");
/// ```
pub fn transform<H: Handler>(text: &str, handler: H) -> Result<(), Error> {
    Dispatcher::new(Reader::new(text), handler).run()
}

// the value of the `encoding` pseudo-attribute, as a byte range
fn declared_encoding(instruction: &str) -> Option<(usize, usize)> {
    let start = instruction.find("encoding")? + "encoding".len();
    let rest = &instruction[start..];
    let after_eq = rest.trim_start().strip_prefix('=')?.trim_start();
    let quote = after_eq.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let value_start = start + (rest.len() - after_eq.len()) + 1;
    let value_len = instruction[value_start..].find(quote)?;
    Some((value_start, value_start + value_len))
}

// text handed to the handler is UTF-8 whatever the bytes were encoded in
fn utf8_declaration(event: Event) -> Event {
    match event {
        Event::ProcInst(proc_inst) if proc_inst.target == "xml" => {
            match declared_encoding(&proc_inst.instruction) {
                Some((start, end)) => {
                    let instruction = format!(
                        "{}UTF-8{}",
                        &proc_inst.instruction[..start],
                        &proc_inst.instruction[end..]
                    );
                    Event::ProcInst(ProcInst {
                        target: proc_inst.target,
                        instruction: instruction.into(),
                    })
                }
                None => Event::ProcInst(proc_inst),
            }
        }
        event => event,
    }
}

/// Like [`transform`], but decode the bytes first.
///
/// The text is decoded to UTF-8, so the `encoding` of the XML declaration is
/// rewritten to match. A decoding failure is reported to the handler like
/// any other error.
pub fn transform_bytes<H: Handler>(data: &[u8], handler: H) -> Result<(), Error> {
    match decode(data) {
        Ok(text) => {
            let events = Reader::new(&text).map(|event| event.map(utf8_declaration));
            Dispatcher::new(events, handler).run()
        }
        Err(e) => Dispatcher::new(std::iter::once(Err::<Event, _>(e)), handler).run(),
    }
}
