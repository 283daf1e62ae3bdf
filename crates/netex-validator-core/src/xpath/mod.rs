//! A hand-written evaluator for the documented XPath 1.0-compatible subset
//! (`spec.md` §4.2): enough to express every rule shipped in the registry,
//! deliberately not a general XPath 2.0/XSLT engine.

pub mod ast;
pub mod eval;
pub mod parser;
pub mod value;

pub use eval::{Hit, evaluate};
pub use parser::{XPathError, compile};
pub use value::XPathValue;
