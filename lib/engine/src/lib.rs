//! Query orchestrator for the fabx search engine.
//!
//! Ties the core primitives together: a query is compiled into a coarse
//! storage filter, candidates are fetched from the [`RecordStore`]
//! collaborator, refined precisely in memory, ranked, paginated and
//! projected. Batch execution runs one concurrent unit of work per query
//! and preserves input order.
//!
//! [`RecordStore`]: fabx_store::RecordStore

pub mod enrich;
pub mod search;

pub use search::{
    DetailResponse, OperatingMode, Query, SearchEngine, SearchPolicy, SearchResponse,
};
