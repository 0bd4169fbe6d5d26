#![forbid(unsafe_code)]
//! Streaming re-serialization of XML.
//!
//! A [`Dispatcher`] pulls [`Event`]s from a token source such as [`Reader`]
//! and hands them to a [`Handler`]. [`IdentityTransform`] is a handler that
//! writes the document back out, keeping track of namespace prefixes with
//! [`NamespaceScope`] and of `xml:base` with [`XmlBase`].

mod base;
mod encoding;
mod entity;
mod error;
pub mod escape;
mod event;
mod identity;
pub mod iri;
mod name;
mod namespace;
mod path;
mod reader;
mod transform;

pub use base::XmlBase;
pub use encoding::decode;
pub use error::{Error, ParseError};
pub use escape::{escape_node_value, escape_to_string, is_in_character_range, NodeKind};
pub use event::{EndElement, Event, ProcInst, StartElement};
pub use identity::{IdentityTransform, Parameters};
pub use iri::{EscapeError, Iri};
pub use name::{Attribute, Name, XMLNS_NAMESPACE, XML_NAMESPACE};
pub use namespace::{NamespaceScope, Scope};
pub use path::XmlPath;
pub use reader::Reader;
pub use transform::{transform, transform_bytes, Dispatcher, Handler, Recovery, State};
