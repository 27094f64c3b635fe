//! CSS-like selectors over raw markup
//!
//! - `lexer`: character classification
//! - `compiler`: selector string to `CompiledSelector`, plus the plan cache
//! - `condition`: the attribute condition language used by predicates
//! - `engine`: executes a plan against a document or a selection

pub mod compiler;
pub mod condition;
pub mod engine;
pub mod lexer;

pub use compiler::{
    compile, compile_cached, Alternative, AttributePredicate, Combinator, CompiledSelector,
    SelectorError, Step, SELECTOR_CACHE_CAPACITY,
};
pub use condition::{Condition, ConditionError, Operator};
pub use engine::{query, query_condition, query_str, Context, Scope};
