//! Parallel Query Evaluation
//!
//! Uses Rayon to run independent queries at once. Each query owns its scan
//! state, so nothing is shared between workers apart from the selector cache.

use crate::element::MatchedSet;
use crate::selector::{compile_cached, query, CompiledSelector, Context, SelectorError};
use rayon::prelude::*;

/// Evaluate several selectors over one document in parallel
///
/// Results keep the order of `selectors`.
pub fn query_parallel<'a>(doc: &'a str, selectors: &[&str]) -> Vec<Result<MatchedSet<'a>, SelectorError>> {
    selectors
        .par_iter()
        .map(|selector| {
            let compiled = compile_cached(selector)?;
            Ok(query(doc, &Context::Document, &compiled))
        })
        .collect()
}

/// Evaluate one compiled selector over many documents in parallel
pub fn query_documents<'a>(docs: &[&'a str], selector: &CompiledSelector) -> Vec<MatchedSet<'a>> {
    docs.par_iter()
        .map(|doc| query(doc, &Context::Document, selector))
        .collect()
}

/// Evaluate keyed selectors over one document, failing on the first
/// invalid selector
pub fn query_map<'a>(doc: &'a str, queries: &[(&str, &str)]) -> Result<Vec<(String, MatchedSet<'a>)>, SelectorError> {
    queries
        .par_iter()
        .map(|(key, selector)| {
            let compiled = compile_cached(selector)?;
            Ok((key.to_string(), query(doc, &Context::Document, &compiled)))
        })
        .collect()
}
