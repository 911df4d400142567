//! Core library for bookfinder
//!
//! This crate implements the **Functional Core** of the bookfinder application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! - **`bookfinder_core`** (this crate): Pure transformation functions with zero I/O
//! - **`bookfinder`**: HTTP calls, the API server, terminal output (the Imperative Shell)
//!
//! Everything here is deterministic and tested with fixture data, no mocking
//! required.
//!
//! # Module Organization
//!
//! - [`query`]: Free-form query tokenizing and parsing into a [`query::SearchRequest`]
//! - [`render`]: Search responses to terminal lines
//! - [`books`]: Wire types for the search API and Open Library
//! - [`catalog`]: Filtering, sorting and paging used by the search API
//! - [`pagination`]: Page arithmetic shared by the renderer and the catalog
//!
//! # Example Usage
//!
//! ```rust
//! use bookfinder_core::books::SearchResponse;
//! use bookfinder_core::query::parse_query;
//! use bookfinder_core::render::render;
//!
//! let request = parse_query(r#""Dune" year>1960 page=1"#).unwrap();
//! let rendered = render(&SearchResponse::default(), &request).unwrap();
//!
//! assert_eq!(rendered.lines.len(), 1);
//! ```

pub mod books;
pub mod catalog;
pub mod pagination;
pub mod query;
pub mod render;
