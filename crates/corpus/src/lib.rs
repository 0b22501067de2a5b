//! Ingestion-and-retrieval pipeline over heterogeneous sources.
//!
//! Merges a static documentation file, a database audit log, and an incident
//! tracker into one queryable vector index with per-entry provenance. The
//! pipeline is an explicit, passed-around object with a `rebuild`/`query`
//! lifecycle, so multiple indices can coexist in one process.

pub mod index;
pub mod normalize;
pub mod pipeline;
pub mod router;
pub mod snapshot;
pub mod sources;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use index::MemoryIndex;
pub use normalize::Normalizer;
pub use pipeline::Pipeline;
pub use router::{QueryOptions, QueryRouter};
pub use types::{
    IndexedEntry, Provenance, QueryResult, RawUnit, RebuildReport, SearchHit, SourceBatch,
    SourceOutcome, SourceRecord, SourceStatus, SourceType,
};
