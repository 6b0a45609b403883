//! # Markflow
//!
//! A personal bookmark manager: save links with a name, description,
//! category, and 0–5 star rating, scrape page metadata to prefill the
//! form, and browse the collection by category, search term, and sort
//! order.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌────────────────┐   ┌──────────┐
//! │  Page fetch │──▶│ BookmarkService │──▶│  SQLite  │
//! │  + seeding  │   │ normalize+view  │   │  store   │
//! └─────────────┘   └───────┬────────┘   └──────────┘
//!                           │
//!                 ┌─────────┴─────────┐
//!                 ▼                   ▼
//!            ┌──────────┐       ┌──────────┐
//!            │   CLI    │       │   HTTP   │
//!            │(markflow)│       │  (axum)  │
//!            └──────────┘       └──────────┘
//! ```
//!
//! Domain types, extraction, normalization, and view logic live in the
//! `markflow-core` crate; this crate adds I/O.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite `BookmarkStore` |
//! | [`fetch`] | Page-metadata fetch |
//! | [`seed`] | First-load demo dataset |
//! | [`service`] | Request handling shared by CLI and server |
//! | [`server`] | JSON HTTP API |
//! | [`export`] | JSON export |
//! | [`visits`] | Per-device visit log |

pub mod config;
pub mod db;
pub mod export;
pub mod fetch;
pub mod migrate;
pub mod seed;
pub mod server;
pub mod service;
pub mod sqlite_store;
pub mod visits;
