//! # fabx
//!
//! Textual and faceted search engine for fabric product catalogs.
//!
//! Clients submit loosely structured queries mixing exact filters, numeric
//! ranges, comparison operators, multi-valued lists and free-text
//! composition expressions (e.g. `"cotton>30% + spandex"`). fabx compiles
//! them into a coarse storage-level filter plus a precise in-memory
//! refinement pass, then ranks and paginates the results.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use fabx::prelude::*;
//! use serde_json::json;
//!
//! # async fn run() {
//! let store = Arc::new(MemoryStore::default());
//! let engine = SearchEngine::new(store, FieldCatalog::default(), SearchPolicy::default());
//!
//! let query = json!({
//!     "weight": "200-300",
//!     "elem": "cotton>50%",
//!     "limit": 10,
//! });
//! let result = engine.search(query.as_object().unwrap()).await;
//! println!("{} matches", result.total);
//! # }
//! ```
//!
//! ## Crate Structure
//!
//! - `fabx-core` - criterion parsing, coarse filters, composition and text
//!   evaluation, ranking
//! - `fabx-store` - the record store trait and the in-memory reference store
//! - `fabx-engine` - the query orchestrator (search / batch / detail)

// Re-export core types
pub use fabx_core::{
    compile_strict, composition, parse_criterion, rank_key, textmatch, CoarseFilter, CompareOp,
    CompiledFilter, Criterion, Error, FieldCatalog, FieldPredicate, RankKey, Record, Result,
};

// Re-export store
pub use fabx_store::{Attachment, AttachmentKind, MemoryStore, RecordStore};

// Re-export engine
pub use fabx_engine::{
    DetailResponse, OperatingMode, Query, SearchEngine, SearchPolicy, SearchResponse,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Attachment, AttachmentKind, CoarseFilter, CompareOp, Criterion, Error, FieldCatalog,
        FieldPredicate, MemoryStore, Query, RankKey, Record, RecordStore, Result, SearchEngine,
        SearchPolicy, SearchResponse,
    };
}
