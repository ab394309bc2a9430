//! # s1kit Architecture
//!
//! s1kit is a **UI-agnostic library** for working with Studio One exports: it
//! imports the keyboard shortcuts table, the plugin registry and the preset
//! database, keeps them in a flat key-value store, and turns them back into macro
//! documents, reports and controller sticker sheets. The `s1kit` binary is one
//! client of it.
//!
//! ## The Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Parses arguments, formats output, handles terminal I/O   │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Thin facade over commands, owns the plugin name index    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - Business logic, returns CmdResult with leveled messages  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Core: parse/, tiering, query, lookup, macros, sticker,     │
//! │  report                                                     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - KeyValueStore trait with a capacity ceiling              │
//! │  - FsStore (production), MemStore (testing)                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Data Flow
//!
//! Raw export bytes go through a parser into flat records. Commands and plugins
//! are stored as one list each; presets go through [`tiering`], which falls back
//! to a combined and a compressed representation when the store runs out of room.
//! [`query`] reads a category back from whichever tier holds it. [`macros`] and
//! [`report`] turn records into documents handed to a [`report::DocumentSink`].
//!
//! ## Key Principle: No I/O Assumptions in Core
//!
//! From `api.rs` inward, code never writes to stdout/stderr, never exits the
//! process, and never assumes a terminal. Diagnostics go through `tracing`.
//!
//! ## Testing Strategy
//!
//! 1. **Commands and core modules**: unit tests against [`store::memory::MemStore`]
//! 2. **API**: dispatch tests
//! 3. **CLI**: end-to-end tests in `tests/` driving the binary
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade, entry point for all operations
//! - [`commands`]: Business logic for each command
//! - [`parse`]: Shortcuts, plugin registry and preset database parsers
//! - [`tiering`]: Preset persistence under a capacity ceiling
//! - [`query`]: Tier resolution, filtering, sorting and pagination
//! - [`lookup`]: classId to plugin name index
//! - [`macros`]: Macro document emitter
//! - [`sticker`]: Controller layouts and sheet geometry
//! - [`report`]: Report tables, renderers and document sinks
//! - [`store`]: Storage abstraction and implementations
//! - [`model`]: Core record types
//! - [`config`]: Configuration management
//! - [`error`]: Error types
//! - `cli`: Argument parsing and terminal rendering for the binary (not part of the lib API)

pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod lookup;
pub mod macros;
pub mod model;
pub mod parse;
pub mod query;
pub mod report;
pub mod sticker;
pub mod store;
pub mod tiering;
