//! HTTP surface and quotation rendering for camquote.
//!
//! - `api`: axum routes for inventory, extraction and PDF download
//! - `bootstrap`: wires config, storage and the extractor chain into
//!   [`AppState`](bootstrap::AppState)
//! - `health`: readiness report for storage and the provider chain
//! - `pdf`: the quotation renderer

pub mod api;
pub mod bootstrap;
pub mod health;
pub mod pdf;
