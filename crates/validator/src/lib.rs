//! crucible-validator: structural document validator.
//!
//! Checks an arbitrary nested JSON document against a declarative profile:
//! cardinality, datatype dispatch, fixed/pattern values, terminology
//! bindings, and extension matching. Findings are returned as data --
//! errors, warnings, and informational messages -- never raised; the walk
//! is total over any well-formed profile tree.

pub mod engine;
pub mod findings;
pub mod profile;
pub mod resolve;
pub mod terminology;
pub mod types;

pub use engine::{validate, validate_text};
pub use findings::Findings;
pub use profile::{Binding, BindingStrength, ElementNode, FlatElement, Max, Profile};
pub use terminology::ValueSetIndex;
pub use types::{PrimitiveKind, TypeCategory, TypeRegistry};
