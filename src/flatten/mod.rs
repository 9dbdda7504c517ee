//! Flattening content trees into path-addressed entries and back
//!
//! [`TreeFlattener`] turns a [`ContentTree`](crate::ContentTree) into a
//! [`FlatEntrySet`](crate::FlatEntrySet), unwrapping string leaves that hold
//! serialized JSON sub-documents along the way. [`structurize`] is the inverse:
//! it rebuilds a tree from entries, choosing list or object at every level from
//! the kind of segment below it.

pub mod flattener;
pub mod structurize;

pub use flattener::{reserialize, Boundary, FlattenLimits, Flattened, TreeFlattener};
pub use structurize::{structurize, structurize_within};
