//! HTTP request handlers.
//!
//! Thin translators: each handler calls the matching operation in
//! [`crate::ops`] and renders the result as an HTTP response. No state or
//! invariants live here.

pub mod bucket;
pub mod object;
