//! Core markup scanning primitives
//!
//! This module contains the building blocks every query is made of:
//! - Scanner: SIMD-accelerated literal search using memchr
//! - Tags: start-tag grammar and the void/known tag tables
//! - Attributes: attribute list tokenizing into an `AttributeMap`
//! - Locator: tag, attribute and condition searches over a document region

pub mod attributes;
pub mod locator;
pub mod scanner;
pub mod tags;
