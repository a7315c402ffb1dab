//! Viaduct — a Prometheus Remote Write 2.0 relay.
//!
//! Receives snappy-compressed remote-write batches, rewrites their
//! symbol-interned label sets through two lookup-backed stages (pod metadata
//! enrichment, view duplication) and forwards the result to a remote
//! collector.
//!
//! ## Architecture
//!
//! - **api** - HTTP receive surface (`POST /api/v1/write`)
//! - **domain** - symbol table, label codec, the two stages, pipeline host,
//!   forwarder
//! - **data** - lookup stores (SQLite, PostgreSQL, in-memory)
//! - **wire** - Remote Write 2.0 message types and snappy framing
//! - **core** - CLI, configuration, shutdown coordination

pub mod api;
pub mod app;
pub mod core;
pub mod data;
pub mod domain;
pub mod wire;
