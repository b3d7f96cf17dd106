//! # Lancea
//!
//! A minimal single-directory full-text search library for Rust.
//!
//! ## Features
//!
//! - Pure Rust implementation
//! - Inverted index with positional postings
//! - Flexible text analysis pipeline
//! - Pluggable storage backends
//! - Boolean, term, and phrase queries
//! - TF-IDF scoring
//! - Keyword highlighting

pub mod analysis;
pub mod document;
pub mod engine;
pub mod error;
pub mod index;
pub mod query;
pub mod search;
pub mod storage;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
