//! # Ward PostgREST
//!
//! HTTP implementation of [`ward_core::PatientsBackend`] for a PostgREST-compatible hosted
//! database.
//!
//! Handles:
//! - request construction (table URLs, filters, ordering, nested selects)
//! - API key and schema headers
//! - decoding rows and PostgREST error bodies into [`ward_core::BackendError`]

#![warn(rust_2018_idioms)]

mod client;
pub mod query;

pub use client::PostgrestBackend;
