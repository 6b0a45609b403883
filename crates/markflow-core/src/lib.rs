//! # Markflow Core
//!
//! Shared logic for Markflow: data models, the error taxonomy, HTML
//! metadata extraction, entity normalization, the store abstraction,
//! view logic (sort / filter / frequency ranking), and the demo
//! authentication provider.
//!
//! This crate contains no tokio, sqlx, reqwest, or filesystem I/O. The
//! application crate wires these pieces to SQLite, HTTP, and the CLI.

pub mod auth;
pub mod categories;
pub mod error;
pub mod extract;
pub mod models;
pub mod normalize;
pub mod store;
pub mod view;
pub mod visits;
