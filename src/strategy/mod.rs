//! Query Strategy Module
//!
//! The engine itself is sequential; batches of independent queries fan out
//! here.

pub mod parallel;

pub use parallel::{query_documents, query_map, query_parallel};
