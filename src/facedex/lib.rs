//! # Facedex Architecture
//!
//! Facedex is the core of a face-detection photo browser. Source documents are JSON files
//! produced by a detector: a nested tree mirroring the filesystem, with one node per
//! image carrying its face scores and a `like` flag. The core indexes those trees for
//! browsing, flips `like` flags on request, and writes documents back in the
//! background.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Client (HTTP routes, or the thin CLI in main.rs)           │
//! │  - Owns sessions, renders pages, maps errors to statuses    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - One instance per process, shared by reference            │
//! │  - Owns the cache, the replace pipeline and the write queue │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs, index.rs, transform.rs)      │
//! │  - Pure logic over documents and indexes                    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/, queue.rs)                           │
//! │  - StorageBackend trait: FsBackend, InMemoryBackend         │
//! │  - DocumentCache and the single-consumer PersistQueue       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Data Flow
//!
//! ```text
//! disk ──load──▶ apply rules ──▶ cache ──build_index──▶ pages, image lookup
//!                                  │
//!                               set_liked
//!                                  │
//!                                  ▼
//!                   snapshot ──queue──▶ reverse rules ──save──▶ disk
//! ```
//!
//! ## Key Principle: No I/O Assumptions in Core
//!
//! From `api.rs` inward, code never writes to stdout/stderr and never exits the process.
//! Diagnostics go through `tracing`; the binary decides where they end up.
//!
//! ## Module Overview
//!
//! - [`api`]: The facade, entry point for all operations
//! - [`commands`]: Like/unlike resolution, browsing, source selection, loading
//! - [`index`]: Tree walk producing the category and file indexes
//! - [`transform`]: Reversible path substitution over whole documents
//! - [`queue`]: Background persistence
//! - [`store`]: Storage abstraction, implementations and the document cache
//! - [`model`]: Core data types
//! - [`paths`]: Lexical path helpers
//! - [`config`]: Configuration management
//! - [`error`]: Error types

pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod index;
pub mod model;
pub mod paths;
pub mod queue;
pub mod store;
pub mod transform;
