//! Order revision chains
//!
//! - [`edit`] - Typed order edits parsed from client JSON
//! - [`index`] - Arena index with forward links over revisions
//! - [`resolver`] - Stable identity, latest version, revise and delete

pub mod edit;
pub mod index;
pub mod resolver;

pub use edit::{parse_edits, NewOrder, OrderEdit, ParsedEdits};
pub use index::ChainIndex;
pub use resolver::{ChainResolver, ResolvedOrder};
