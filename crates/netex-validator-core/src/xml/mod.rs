//! Parses a byte buffer into a navigable tree that retains source line
//! numbers, built once per file and handed to the XPath evaluator.

mod model;
mod parser;

pub use model::{Attribute, NodeRef, XmlElement, XmlTree};
pub use parser::{ParseError, parse};
