//! NIF entry points
//!
//! Invalid selectors come back as `{:error, reason}`; missing elements as
//! `nil`. Nothing raises apart from argument decoding.

use crate::core::attributes;
use crate::core::tags;
use crate::document::Selection;
use crate::element::{self, MatchedSet};
use crate::extract;
use crate::resource::{DocumentRef, DocumentResource, SelectorRef, SelectorResource};
use crate::selector::{compile_cached, query as run_query, query_condition as run_condition, Condition, Context};
use crate::strategy::parallel;
use crate::term::{
    attributes_to_term, error_tuple, extracted_to_term, form_to_term, matches_to_term, ok_tuple, parts_to_term,
    str_to_binary, tables_to_term,
};
use rustler::{Encoder, Env, NifResult, ResourceArc, Term};

// ============================================================================
// Documents and Selectors
// ============================================================================

/// Keep a document on the Rust side for repeated queries
#[rustler::nif]
fn parse(source: &str) -> DocumentRef {
    ResourceArc::new(DocumentResource::new(source.to_string()))
}

/// Compile a selector once (returns {:ok, ref} or {:error, reason})
#[rustler::nif]
fn compile_selector<'a>(env: Env<'a>, selector: &str) -> NifResult<Term<'a>> {
    match compile_cached(selector) {
        Ok(compiled) => {
            let arc = ResourceArc::new(SelectorResource::new(compiled));
            Ok(ok_tuple(env, arc.encode(env)))
        }
        Err(e) => Ok(error_tuple(env, e)),
    }
}

// ============================================================================
// Queries
// ============================================================================

/// Query the whole document
#[rustler::nif]
fn query<'a>(env: Env<'a>, doc_ref: DocumentRef, selector: &str) -> NifResult<Term<'a>> {
    let compiled = match compile_cached(selector) {
        Ok(compiled) => compiled,
        Err(e) => return Ok(error_tuple(env, e)),
    };
    let found = run_query(&doc_ref.source, &Context::Document, &compiled);
    Ok(matches_to_term(env, &found))
}

/// Query the whole document with a precompiled selector
#[rustler::nif]
fn query_compiled<'a>(env: Env<'a>, doc_ref: DocumentRef, selector_ref: SelectorRef) -> NifResult<Term<'a>> {
    let found = run_query(&doc_ref.source, &Context::Document, &selector_ref.compiled);
    Ok(matches_to_term(env, &found))
}

/// Re-query inside the elements starting at `offsets`
#[rustler::nif]
fn query_within<'a>(env: Env<'a>, doc_ref: DocumentRef, offsets: Vec<usize>, selector: &str) -> NifResult<Term<'a>> {
    let compiled = match compile_cached(selector) {
        Ok(compiled) => compiled,
        Err(e) => return Ok(error_tuple(env, e)),
    };
    let scope = doc_ref.elements_at(offsets);
    let found = run_query(&doc_ref.source, &Context::Matches(&scope), &compiled);
    Ok(matches_to_term(env, &found))
}

/// Elements whose attributes satisfy a condition expression
#[rustler::nif]
fn query_condition<'a>(env: Env<'a>, doc_ref: DocumentRef, condition: &str) -> NifResult<Term<'a>> {
    let condition = match Condition::parse(condition) {
        Ok(condition) => condition,
        Err(e) => return Ok(error_tuple(env, e)),
    };
    let found = run_condition(&doc_ref.source, &Context::Document, &condition);
    Ok(matches_to_term(env, &found))
}

/// Execute multiple queries in parallel
#[rustler::nif(schedule = "DirtyCpu")]
fn query_parallel<'a>(env: Env<'a>, doc_ref: DocumentRef, selectors: Vec<&str>) -> NifResult<Term<'a>> {
    let results = parallel::query_parallel(&doc_ref.source, &selectors);

    let mut list = Term::list_new_empty(env);
    for result in results.into_iter().rev() {
        let term = match result {
            Ok(found) => matches_to_term(env, &found),
            Err(e) => error_tuple(env, e),
        };
        list = list.list_prepend(term);
    }
    Ok(list)
}

// ============================================================================
// Element Helpers
// ============================================================================

/// {start_tag, content, end_tag}, or nil when not a closed element
#[rustler::nif]
fn split_element<'a>(env: Env<'a>, markup: &str) -> NifResult<Term<'a>> {
    Ok(match element::split_element(markup) {
        Some(parts) => parts_to_term(env, &parts),
        None => rustler::types::atom::nil().encode(env),
    })
}

#[rustler::nif]
fn extract_attributes<'a>(env: Env<'a>, markup: &str, validate: bool) -> NifResult<Term<'a>> {
    let attrs = attributes::extract_attributes(markup, validate);
    Ok(attributes_to_term(env, &attrs))
}

#[rustler::nif]
fn tag_name(start_tag: &str) -> Option<String> {
    tags::tag_name(start_tag)
}

#[rustler::nif]
fn is_void_tag(name: &str) -> bool {
    tags::is_void_tag(name)
}

#[rustler::nif]
fn is_known_tag(name: &str) -> bool {
    tags::is_known_tag(name)
}

#[rustler::nif]
fn strip_tags<'a>(env: Env<'a>, markup: &str) -> NifResult<Term<'a>> {
    Ok(str_to_binary(env, &extract::strip_tags(markup)))
}

// ============================================================================
// Extraction
// ============================================================================

/// Tree (or flattened values) of one element
#[rustler::nif]
fn extract_tree<'a>(env: Env<'a>, markup: &str, value_only: bool) -> NifResult<Term<'a>> {
    let extracted = extract::extract(markup, value_only);
    Ok(extracted_to_term(env, &extracted))
}

/// Form fields of the document; `selector` replaces the default controls
#[rustler::nif]
fn extract_form<'a>(env: Env<'a>, doc_ref: DocumentRef, selector: Option<&str>) -> NifResult<Term<'a>> {
    let fields = extract::extract_form(&Selection::new(&doc_ref.source), selector);
    Ok(form_to_term(env, &fields))
}

/// Tables inside the elements at `offsets`, or the whole document for nil
#[rustler::nif]
fn extract_tables<'a>(
    env: Env<'a>,
    doc_ref: DocumentRef,
    offsets: Option<Vec<usize>>,
    value_only: bool,
) -> NifResult<Term<'a>> {
    let source = doc_ref.source.as_str();
    let selection = match offsets {
        Some(offsets) => Selection::from_matches(source, MatchedSet::from_offsets(source, offsets)),
        None => Selection::new(source),
    };
    let tables = extract::extract_tables(&selection, value_only);
    Ok(tables_to_term(env, &tables))
}
