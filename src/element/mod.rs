//! Element boundaries and selections
//!
//! - `span`: `Region`, a document slice with its absolute offset
//! - `boundary`: end-tag resolution under nesting, split, direct children
//! - `matched`: `MatchedSet`, the offset-keyed result of a query

pub mod boundary;
pub mod matched;
pub mod span;

pub use boundary::{children, element_at, split_element, Child, ElementParts};
pub use matched::MatchedSet;
pub use span::Region;
